//! Record encoder
//!
//! Serializes events as newline-terminated JSON and appends them to an
//! append-only channel that is closed exactly once, right after the terminal
//! record.

use crate::errors::StreamError;
use crate::event::ProgressEvent;

/// Byte separating two records on the wire
pub const RECORD_DELIMITER: u8 = b'\n';

/// Encode one event as a self-delimited record
pub fn encode_record(event: &ProgressEvent) -> Result<String, StreamError> {
    let mut line = serde_json::to_string(event)?;
    line.push(RECORD_DELIMITER as char);
    Ok(line)
}

/// Destination for encoded records
pub trait RecordChannel {
    /// Append one record. Returns false when the receiving side is gone.
    fn append(&mut self, record: String) -> bool;

    /// Close the channel. Called at most once by [`StreamEncoder`].
    fn close(&mut self) {}
}

impl RecordChannel for Vec<String> {
    fn append(&mut self, record: String) -> bool {
        self.push(record);
        true
    }
}

/// Stateful encoder enforcing monotonic steps and the terminal-record and
/// close-once rules
#[derive(Debug)]
pub struct StreamEncoder<C: RecordChannel> {
    channel: C,
    total_steps: u32,
    last_step: Option<u32>,
    closed: bool,
}

impl<C: RecordChannel> StreamEncoder<C> {
    /// Create an encoder writing to `channel`
    pub fn new(channel: C, total_steps: u32) -> Self {
        Self {
            channel,
            total_steps,
            last_step: None,
            closed: false,
        }
    }

    pub fn total_steps(&self) -> u32 {
        self.total_steps
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Access the underlying channel
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Encode and append an event, closing the channel after a terminal one
    ///
    /// A receiver that has gone away does not make this fail: the producer
    /// keeps running and its records are dropped.
    pub fn push(&mut self, event: &ProgressEvent) -> Result<(), StreamError> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        if let Some(last) = self.last_step {
            if event.step < last {
                return Err(StreamError::StepRegression {
                    last,
                    step: event.step,
                });
            }
        }

        let record = encode_record(event)?;
        self.channel.append(record);
        self.last_step = Some(event.step);

        if event.is_terminal() {
            self.close();
        }
        Ok(())
    }

    /// Terminate the stream after an uncaught failure
    ///
    /// If nothing has been emitted yet the synthesized error carries step 0,
    /// otherwise the step of the last record. No-op once closed.
    pub fn abort(&mut self, message: &str) {
        if self.closed {
            return;
        }

        let step = self.last_step.unwrap_or(0);
        let event = ProgressEvent::error(step, self.total_steps, message);
        if let Ok(record) = encode_record(&event) {
            self.channel.append(record);
        }
        self.close();
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.channel.close();
        }
    }
}
