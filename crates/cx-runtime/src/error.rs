//! Runtime errors.

use crate::value::Value;
use thiserror::Error;

/// Runtime result type.
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Runtime errors.
///
/// The dispatch variants (`Lifecycle`, `Backpressure`, `DispatchDepth`) are
/// fatal to the causal chain that raised them, never to the process: a
/// synchronous `emit` surfaces them to its call site, and the queue pump
/// routes them to the owning entity's `error` event.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("entity `{entity}`: {message}")]
    Lifecycle { entity: String, message: String },

    #[error("pending queue full ({limit}) while posting `{event}`")]
    Backpressure { event: String, limit: usize },

    #[error("dispatch depth limit {limit} exceeded while emitting `{event}`")]
    DispatchDepth { event: String, limit: u32 },

    #[error("unknown entity instance `{0}`")]
    UnknownEntity(String),

    #[error("script threw: {0}")]
    Thrown(Value),

    #[error("type error: {0}")]
    Type(String),

    #[error("undefined name `{0}`")]
    Undefined(String),

    #[error("duplicate declaration of `{0}`")]
    Duplicate(String),

    #[error("`{name}` expects {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: usize,
        got: usize,
    },
}

impl RuntimeError {
    /// A lifecycle error for an operation against a disposed entity.
    pub fn disposed(entity: impl Into<String>) -> Self {
        RuntimeError::Lifecycle {
            entity: entity.into(),
            message: "entity is disposed".to_string(),
        }
    }

    /// Short machine-readable kind tag, used when an error is reflected into
    /// a payload (the `error` event, catch bindings).
    pub fn kind(&self) -> &'static str {
        match self {
            RuntimeError::Lifecycle { .. } => "lifecycle",
            RuntimeError::Backpressure { .. } => "backpressure",
            RuntimeError::DispatchDepth { .. } => "dispatch_depth",
            RuntimeError::UnknownEntity(_) => "unknown_entity",
            RuntimeError::Thrown(_) => "thrown",
            RuntimeError::Type(_) => "type",
            RuntimeError::Undefined(_) => "undefined",
            RuntimeError::Duplicate(_) => "duplicate",
            RuntimeError::Arity { .. } => "arity",
        }
    }
}
