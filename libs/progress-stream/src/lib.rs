//! Progress stream protocol
//!
//! Newline-delimited JSON records describing a sandbox provisioning run,
//! plus the incremental decoder and consumer used on the receiving side.

pub mod consumer;
pub mod decoder;
pub mod encoder;
pub mod errors;
pub mod event;

pub use consumer::{ConsumerState, StreamConsumer};
pub use decoder::RecordDecoder;
pub use encoder::{encode_record, RecordChannel, StreamEncoder, RECORD_DELIMITER};
pub use errors::StreamError;
pub use event::{action, EventKind, ProgressEvent};
