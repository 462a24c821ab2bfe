//! Test harness for end-to-end Cx execution.
//!
//! Wraps the full pipeline — parse → load → dispatch — behind a few
//! methods so integration tests read as scenarios.

use cx_runtime::{HubConfig, OutputSink, Result, Runtime, Value};
use parking_lot::Mutex;
use std::sync::Arc;

/// A loaded program plus captured output.
pub struct TestHarness {
    runtime: Arc<Runtime>,
    lines: Arc<Mutex<Vec<String>>>,
}

impl TestHarness {
    /// Parse and load `source` with default hub limits.
    ///
    /// # Panics
    /// Panics on parse or load errors — harness callers test runtime
    /// behavior, not front-end failures.
    pub fn from_source(source: &str) -> Self {
        Self::with_config(HubConfig::default(), source)
    }

    /// Parse and load `source` with explicit hub limits.
    pub fn with_config(config: HubConfig, source: &str) -> Self {
        // Dispatch logs land in the test writer when a test fails.
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let (sink, lines) = OutputSink::capture();
        let runtime = Runtime::with_output(config, sink);

        let program = match cx_parser::parse(source, Some("test.cx")) {
            Ok(program) => program,
            Err(errors) => {
                let report: Vec<String> = errors.iter().map(ToString::to_string).collect();
                panic!("parse failed:\n{}", report.join("\n"));
            }
        };
        runtime.load(&program).expect("program load failed");

        Self { runtime, lines }
    }

    /// The underlying runtime.
    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    /// Emit a global event with an empty payload.
    pub fn emit(&self, event: &str) -> Result<()> {
        self.runtime.emit(event, Value::empty_map())
    }

    /// Emit a global event with a payload.
    pub fn emit_with(&self, event: &str, payload: Value) -> Result<()> {
        self.runtime.emit(event, payload)
    }

    /// Drain the pending queue.
    pub fn pump(&self) -> usize {
        self.runtime.run_until_idle()
    }

    /// Everything the program printed so far.
    pub fn printed(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}
