//! Output sink for the `print` builtin.
//!
//! Scripts print through a pluggable slot so embedding hosts and tests can
//! capture lines instead of writing to the process stdout.

use parking_lot::Mutex;
use std::sync::Arc;

/// Where `print` lines go.
#[derive(Clone)]
pub enum OutputSink {
    /// Write lines to the process stdout
    Stdout,
    /// Collect lines into a shared buffer
    Capture(Arc<Mutex<Vec<String>>>),
}

impl OutputSink {
    /// A capturing sink plus the shared buffer it fills.
    pub fn capture() -> (Self, Arc<Mutex<Vec<String>>>) {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        (OutputSink::Capture(buffer.clone()), buffer)
    }

    /// Emit one line.
    pub fn line(&self, text: String) {
        match self {
            OutputSink::Stdout => println!("{}", text),
            OutputSink::Capture(buffer) => buffer.lock().push(text),
        }
    }
}

impl Default for OutputSink {
    fn default() -> Self {
        OutputSink::Stdout
    }
}
