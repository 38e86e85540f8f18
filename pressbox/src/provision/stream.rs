//! Progress sink writing NDJSON records to a channel

use progress_stream::{ProgressEvent, RecordChannel, StreamEncoder};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::provision::progress::ProgressSink;

/// Sending half of a record channel. Closing drops the sender.
#[derive(Debug)]
pub struct SenderChannel {
    sender: Option<UnboundedSender<String>>,
}

impl RecordChannel for SenderChannel {
    fn append(&mut self, record: String) -> bool {
        match &self.sender {
            Some(sender) => sender.send(record).is_ok(),
            None => false,
        }
    }

    fn close(&mut self) {
        self.sender = None;
    }
}

/// Sink encoding records onto an unbounded channel
///
/// A consumer that goes away only stops reading; the run continues. If the
/// sink is dropped before a terminal record, an error record is synthesized.
#[derive(Debug)]
pub struct ChannelSink {
    encoder: StreamEncoder<SenderChannel>,
}

impl ChannelSink {
    /// Create a sink and the receiver its records arrive on
    pub fn new(total_steps: u32) -> (Self, UnboundedReceiver<String>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let channel = SenderChannel {
            sender: Some(sender),
        };
        (
            Self {
                encoder: StreamEncoder::new(channel, total_steps),
            },
            receiver,
        )
    }

    /// Terminate the stream with an error record, unless already closed
    pub fn abort(&mut self, message: &str) {
        self.encoder.abort(message);
    }

    pub fn is_closed(&self) -> bool {
        self.encoder.is_closed()
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&mut self, event: &ProgressEvent) {
        if let Err(e) = self.encoder.push(event) {
            warn!("Dropping progress record {:?}: {}", event.action, e);
        }
    }
}

impl Drop for ChannelSink {
    fn drop(&mut self) {
        if !self.encoder.is_closed() {
            debug!("Progress sink dropped before a terminal record");
            self.encoder.abort("Error: provisioning stopped unexpectedly");
        }
    }
}
