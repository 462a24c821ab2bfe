// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Event dispatch runtime for the Cx language.
//!
//! The runtime owns three things:
//!
//! - the **event hub** ([`hub::EventHub`]) — two-tier handler tables
//!   (per-entity local + global), registration-order dispatch, declarative
//!   handler chains with deep-merged payloads, a bounded pending queue, and
//!   parked continuations for long-latency work;
//! - the **entity lifecycle** ([`entity`]) — `Constructed → Realized →
//!   Active → Disposed`, strictly monotonic, with disposal cancelling
//!   everything the entity still owns;
//! - the **interpreter** ([`interp::Runtime`]) — a tree-walking evaluator
//!   that turns `on`/`emit`/`realize` syntax into hub operations.
//!
//! Hubs are explicitly constructed and injected — never process-wide — so
//! isolated runtimes can run side by side.
//!
//! # Examples
//!
//! ```
//! use cx_runtime::{HubConfig, Runtime};
//!
//! let runtime = Runtime::new(HubConfig::default());
//! let program = cx_parser::parse(
//!     "on greet (e) { emit greeted {}; } emit greet {};",
//!     None,
//! ).unwrap();
//! runtime.load(&program).unwrap();
//! ```

pub mod entity;
pub mod error;
pub mod event;
pub mod hub;
pub mod interp;
pub mod output;
pub mod value;

pub use entity::{EntityId, EntityState, Lifecycle};
pub use error::{Result, RuntimeError};
pub use event::{ChainItem, CxEvent, ERROR_EVENT};
pub use hub::{CompletionSender, DispatchCtx, EventHub, HandlerFn, HubConfig, ParkToken, Scope};
pub use interp::Runtime;
pub use output::OutputSink;
pub use value::{map_of, Value};
