//! Output sinks for raw process text

use std::sync::{Arc, Mutex, PoisonError};

/// Receives process output as it arrives
///
/// Writes come from a single reader loop per process, in arrival order.
pub trait OutputSink: Send + Sync {
    /// Append a chunk of decoded output
    fn append(&self, text: &str);

    /// Discard previously shown output, called at the start of a run
    fn clear(&self) {}
}

impl<T: OutputSink + ?Sized> OutputSink for Arc<T> {
    fn append(&self, text: &str) {
        (**self).append(text)
    }

    fn clear(&self) {
        (**self).clear()
    }
}

/// Drops all output
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn append(&self, _text: &str) {}
}

/// Collects output in memory
#[derive(Debug, Default)]
pub struct BufferSink {
    buffer: Mutex<String>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything appended since the last clear
    pub fn contents(&self) -> String {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl OutputSink for BufferSink {
    fn append(&self, text: &str) {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_str(text);
    }

    fn clear(&self) {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
