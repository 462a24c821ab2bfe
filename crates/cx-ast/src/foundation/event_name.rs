//! Hierarchical event names.
//!
//! Event names are dot-separated identifier sequences of arbitrary depth:
//! `sensor.reading.updated`, `ai.think.result`, `error`. Dispatch equality is
//! exact string equality on the full name — there is no prefix or wildcard
//! matching anywhere in the language.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An ordered, non-empty sequence of identifier parts naming an event.
///
/// # Examples
///
/// ```
/// # use cx_ast::EventName;
/// let name = EventName::from_dotted("sensor.reading");
/// assert_eq!(name.parts(), &["sensor", "reading"]);
/// assert_eq!(name.full_name(), "sensor.reading");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventName {
    parts: Vec<String>,
}

impl EventName {
    /// Create an event name from its parts.
    ///
    /// # Panics
    /// Panics if `parts` is empty or any part is an empty string; the parser
    /// never produces either.
    pub fn new(parts: Vec<String>) -> Self {
        assert!(!parts.is_empty(), "event name must have at least one part");
        assert!(
            parts.iter().all(|p| !p.is_empty()),
            "event name parts must be non-empty"
        );
        Self { parts }
    }

    /// Parse an event name from a dot-separated string.
    pub fn from_dotted(s: &str) -> Self {
        Self::new(s.split('.').map(String::from).collect())
    }

    /// Get the ordered identifier parts.
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Get the number of parts.
    pub fn depth(&self) -> usize {
        self.parts.len()
    }

    /// The dot-joined full name used as the dispatch key.
    pub fn full_name(&self) -> String {
        self.parts.join(".")
    }

    /// Append a part, producing a new name.
    pub fn append(&self, part: impl Into<String>) -> Self {
        let mut parts = self.parts.clone();
        parts.push(part.into());
        Self::new(parts)
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts.join("."))
    }
}

impl From<&str> for EventName {
    fn from(s: &str) -> Self {
        Self::from_dotted(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_dotted() {
        let name = EventName::from_dotted("a.b.c");
        assert_eq!(name.parts(), &["a", "b", "c"]);
        assert_eq!(name.depth(), 3);
        assert_eq!(name.full_name(), "a.b.c");
    }

    #[test]
    fn test_single_part() {
        let name = EventName::from_dotted("error");
        assert_eq!(name.depth(), 1);
        assert_eq!(name.full_name(), "error");
    }

    #[test]
    fn test_equality_is_exact() {
        // No prefix relationship exists between these names.
        assert_ne!(EventName::from_dotted("a.b"), EventName::from_dotted("a.b.c"));
        assert_eq!(
            EventName::from_dotted("a.b.c"),
            EventName::from_dotted("a.b.c")
        );
    }

    #[test]
    fn test_append() {
        let name = EventName::from_dotted("ai.think").append("result");
        assert_eq!(name.full_name(), "ai.think.result");
    }

    #[test]
    #[should_panic(expected = "at least one part")]
    fn test_empty_rejected() {
        let _ = EventName::new(vec![]);
    }
}
