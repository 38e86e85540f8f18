//! Stream consumer
//!
//! Drives caller-visible state from a progress byte stream: a growing log of
//! records plus a terminal outcome.

use crate::decoder::RecordDecoder;
use crate::errors::StreamError;
use crate::event::{EventKind, ProgressEvent};

/// Consumer state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumerState {
    /// Nothing received yet
    Idle,

    /// At least one in-progress record received
    Running,

    /// Terminal success
    Ready { sandbox_url: String },

    /// Terminal failure
    Failed { message: String },
}

/// Incremental consumer of a progress stream
#[derive(Debug)]
pub struct StreamConsumer {
    decoder: RecordDecoder,
    state: ConsumerState,
    log: Vec<ProgressEvent>,
}

impl StreamConsumer {
    pub fn new() -> Self {
        Self {
            decoder: RecordDecoder::new(),
            state: ConsumerState::Idle,
            log: Vec::new(),
        }
    }

    pub fn state(&self) -> &ConsumerState {
        &self.state
    }

    /// Every record dispatched so far, in arrival order
    pub fn log(&self) -> &[ProgressEvent] {
        &self.log
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            ConsumerState::Ready { .. } | ConsumerState::Failed { .. }
        )
    }

    pub fn sandbox_url(&self) -> Option<&str> {
        match &self.state {
            ConsumerState::Ready { sandbox_url } => Some(sandbox_url),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            ConsumerState::Failed { message } => Some(message),
            _ => None,
        }
    }

    /// Feed one network chunk. Returns the records dispatched by it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<ProgressEvent> {
        let records = self.decoder.push(chunk);
        records
            .into_iter()
            .filter_map(|record| self.handle(record))
            .collect()
    }

    /// Signal end of stream. Returns the record flushed from the tail, if any.
    ///
    /// A stream that ends without a terminal record is a failure.
    pub fn close(&mut self) -> Vec<ProgressEvent> {
        let dispatched: Vec<ProgressEvent> = self
            .decoder
            .finish()
            .and_then(|record| self.handle(record))
            .into_iter()
            .collect();

        if !self.is_terminal() {
            self.state = ConsumerState::Failed {
                message: "Stream ended before the sandbox was ready".to_string(),
            };
        }
        dispatched
    }

    /// Record a transport failure
    pub fn fail(&mut self, message: impl Into<String>) {
        if !self.is_terminal() {
            self.state = ConsumerState::Failed {
                message: message.into(),
            };
        }
    }

    fn handle(&mut self, record: Result<ProgressEvent, StreamError>) -> Option<ProgressEvent> {
        match record {
            Ok(event) => self.dispatch(event),
            Err(e) => {
                self.fail(format!("Malformed progress record: {}", e));
                None
            }
        }
    }

    fn dispatch(&mut self, event: ProgressEvent) -> Option<ProgressEvent> {
        // Nothing may follow the terminal record
        if self.is_terminal() {
            return None;
        }

        self.state = match event.kind() {
            EventKind::Ready => match event.sandbox_url.as_deref() {
                Some(url) if !url.is_empty() => ConsumerState::Ready {
                    sandbox_url: url.to_string(),
                },
                _ => ConsumerState::Failed {
                    message: "Ready record carried no sandbox URL".to_string(),
                },
            },
            EventKind::Error => ConsumerState::Failed {
                message: event.text.clone(),
            },
            EventKind::Progress => ConsumerState::Running,
        };

        self.log.push(event.clone());
        Some(event)
    }
}

impl Default for StreamConsumer {
    fn default() -> Self {
        Self::new()
    }
}
