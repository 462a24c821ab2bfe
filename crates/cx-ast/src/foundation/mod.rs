//! Source tracking and naming primitives shared by the front-end and runtime.

mod event_name;
mod span;

pub use event_name::EventName;
pub use span::{SourceFile, Span};
