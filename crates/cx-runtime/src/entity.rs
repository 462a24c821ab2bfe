//! Conscious entity instances and their lifecycle.

use crate::error::{Result, RuntimeError};
use crate::hub::HandlerTable;
use crate::value::Value;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::fmt;

/// Unique identifier for an entity instance, e.g. `Greeter#1`.
///
/// Instance ids are plain strings so they can travel inside payloads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub String);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle states, in transition order. Transitions are strictly
/// monotonic; no state is ever revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Lifecycle {
    /// Instance exists; realize() has not run
    Constructed,
    /// realize() has completed
    Realized,
    /// Realized and receiving events
    Active,
    /// Terminal: handlers deregistered, parked work cancelled
    Disposed,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Lifecycle::Constructed => "constructed",
            Lifecycle::Realized => "realized",
            Lifecycle::Active => "active",
            Lifecycle::Disposed => "disposed",
        };
        write!(f, "{}", s)
    }
}

/// A live conscious entity instance.
///
/// Owns the instance's local handler table and declared fields. Fields are
/// mutated only from handler bodies executing for this instance — a
/// documented convention, not a static check.
pub struct EntityState {
    /// Instance id
    pub id: EntityId,
    /// Declaring entity type name
    pub type_name: String,
    lifecycle: Mutex<Lifecycle>,
    /// Local handler table (this instance's `on` registrations)
    pub handlers: HandlerTable,
    /// Declared fields
    pub fields: Mutex<IndexMap<String, Value>>,
}

impl EntityState {
    /// Create a freshly constructed instance.
    pub fn new(id: EntityId, type_name: impl Into<String>) -> Self {
        Self {
            id,
            type_name: type_name.into(),
            lifecycle: Mutex::new(Lifecycle::Constructed),
            handlers: HandlerTable::new(),
            fields: Mutex::new(IndexMap::new()),
        }
    }

    /// Current lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        *self.lifecycle.lock()
    }

    /// Advance to a later lifecycle state.
    ///
    /// Fails with a lifecycle error if `next` is not strictly later than the
    /// current state.
    pub fn advance(&self, next: Lifecycle) -> Result<()> {
        let mut current = self.lifecycle.lock();
        if next <= *current {
            return Err(RuntimeError::Lifecycle {
                entity: self.id.0.clone(),
                message: format!("cannot transition from {} to {}", *current, next),
            });
        }
        tracing::debug!(entity = %self.id, from = %*current, to = %next, "lifecycle transition");
        *current = next;
        Ok(())
    }

    /// Whether this instance has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.lifecycle() == Lifecycle::Disposed
    }

    /// Fail with a lifecycle error if the instance is disposed.
    pub fn require_live(&self) -> Result<()> {
        if self.is_disposed() {
            Err(RuntimeError::disposed(self.id.0.clone()))
        } else {
            Ok(())
        }
    }

    /// Read a field value.
    pub fn field(&self, name: &str) -> Option<Value> {
        self.fields.lock().get(name).cloned()
    }

    /// Write a field value.
    pub fn set_field(&self, name: impl Into<String>, value: Value) {
        self.fields.lock().insert(name.into(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity() -> EntityState {
        EntityState::new(EntityId::from("T#1"), "T")
    }

    #[test]
    fn transitions_are_monotonic() {
        let e = entity();
        assert_eq!(e.lifecycle(), Lifecycle::Constructed);
        e.advance(Lifecycle::Realized).unwrap();
        e.advance(Lifecycle::Active).unwrap();
        e.advance(Lifecycle::Disposed).unwrap();
        assert!(e.is_disposed());
    }

    #[test]
    fn no_state_is_revisited() {
        let e = entity();
        e.advance(Lifecycle::Active).unwrap();
        let err = e.advance(Lifecycle::Realized).unwrap_err();
        assert_eq!(err.kind(), "lifecycle");
    }

    #[test]
    fn disposal_can_happen_early() {
        let e = entity();
        // Constructed → Disposed skips intermediate states but stays forward.
        e.advance(Lifecycle::Disposed).unwrap();
        assert!(e.require_live().is_err());
    }

    #[test]
    fn fields_read_write() {
        let e = entity();
        assert_eq!(e.field("n"), None);
        e.set_field("n", Value::Int(3));
        assert_eq!(e.field("n"), Some(Value::Int(3)));
    }
}
