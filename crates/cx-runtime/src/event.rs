//! The wire message delivered to handlers.

use crate::value::Value;
use std::time::SystemTime;

/// The event name every hub routes failures to.
pub const ERROR_EVENT: &str = "error";

/// The structured message delivered to every handler.
///
/// The payload is a [`Value`] — a copy, never a reference into entity
/// internals — so handler inputs are serializable and decoupled from the
/// emitter.
#[derive(Debug, Clone)]
pub struct CxEvent {
    /// Full dot-joined event name
    pub name: String,
    /// Structured payload
    pub payload: Value,
    /// Emission instant
    pub timestamp: SystemTime,
}

impl CxEvent {
    /// Build an event stamped with the current instant.
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
            timestamp: SystemTime::now(),
        }
    }

    /// Reflect this event into a value for handler parameter binding:
    /// `{ name, payload, timestamp }` with the timestamp in epoch
    /// milliseconds.
    pub fn to_value(&self) -> Value {
        let millis = self
            .timestamp
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        crate::value::map_of([
            ("name", Value::Str(self.name.clone())),
            ("payload", self.payload.clone()),
            ("timestamp", Value::Int(millis)),
        ])
    }
}

/// A resolved follow-up item attached to an emission.
///
/// The parser's `HandlerItem` holds expressions; by the time an emission
/// reaches the hub its chain items carry evaluated extra payloads.
#[derive(Debug, Clone)]
pub struct ChainItem {
    /// Full name of the follow-up event
    pub event: String,
    /// Evaluated extra payload to deep-merge over the base (item keys win)
    pub extra: Option<Value>,
}

impl ChainItem {
    /// A chain item with no extra payload.
    pub fn bare(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            extra: None,
        }
    }

    /// A chain item with an extra payload map.
    pub fn with_extra(event: impl Into<String>, extra: Value) -> Self {
        Self {
            event: event.into(),
            extra: Some(extra),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::map_of;

    #[test]
    fn event_reflects_to_value() {
        let event = CxEvent::new("a.b", map_of([("x", Value::Int(1))]));
        let reflected = event.to_value();
        assert_eq!(reflected.get("name"), Some(&Value::Str("a.b".into())));
        assert_eq!(
            reflected.get("payload").and_then(|p| p.get("x")),
            Some(&Value::Int(1))
        );
        assert!(matches!(reflected.get("timestamp"), Some(Value::Int(_))));
    }
}
