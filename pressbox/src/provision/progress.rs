//! Caller-facing progress reporting

use progress_stream::ProgressEvent;
use tracing::{error, info};

/// Receives the progress records of one run
pub trait ProgressSink: Send {
    fn emit(&mut self, event: &ProgressEvent);
}

/// Sink discarding every record, for runs without a caller
#[derive(Debug, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&mut self, _event: &ProgressEvent) {}
}

impl ProgressSink for Vec<ProgressEvent> {
    fn emit(&mut self, event: &ProgressEvent) {
        self.push(event.clone());
    }
}

/// Owns the run-wide step counter and forwards records to a sink.
///
/// Every record is mirrored to `tracing`.
pub struct ProgressReporter<'a> {
    sink: &'a mut dyn ProgressSink,
    step: u32,
    total_steps: u32,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(sink: &'a mut dyn ProgressSink, total_steps: u32) -> Self {
        Self {
            sink,
            step: 0,
            total_steps,
        }
    }

    /// Step of the last record, 0 before the first one
    pub fn step(&self) -> u32 {
        self.step
    }

    pub fn total_steps(&self) -> u32 {
        self.total_steps
    }

    /// Emit the next in-progress record
    pub fn announce(&mut self, action: &str, text: &str) {
        self.step += 1;
        info!("[{}/{}] {}", self.step, self.total_steps, text);
        self.sink
            .emit(&ProgressEvent::progress(action, self.step, self.total_steps, text));
    }

    /// Emit the terminal success record
    pub fn ready(&mut self, text: &str, sandbox_url: &str) {
        self.step += 1;
        info!("[{}/{}] {} {}", self.step, self.total_steps, text, sandbox_url);
        self.sink.emit(&ProgressEvent::ready(
            self.step,
            self.total_steps,
            text,
            sandbox_url,
        ));
    }

    /// Emit the terminal failure record at the current step
    pub fn error(&mut self, text: &str) {
        error!("[{}/{}] {}", self.step, self.total_steps, text);
        self.sink
            .emit(&ProgressEvent::error(self.step, self.total_steps, text));
    }
}
