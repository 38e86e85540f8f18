//! Incremental record decoder
//!
//! Chunks may split a record anywhere, including inside a multi-byte UTF-8
//! sequence, so the buffer holds raw bytes and is only decoded per complete
//! record.

use crate::encoder::RECORD_DELIMITER;
use crate::errors::StreamError;
use crate::event::ProgressEvent;

/// Reassembles records from arbitrarily chunked bytes
#[derive(Debug, Default)]
pub struct RecordDecoder {
    buffer: Vec<u8>,
}

impl RecordDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes received but not yet terminated by a delimiter
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// Append a chunk and return every record it completed, in order
    ///
    /// Empty fragments are skipped. A malformed record yields an `Err` entry
    /// in its position without affecting the records around it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<ProgressEvent, StreamError>> {
        self.buffer.extend_from_slice(chunk);

        let mut records = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == RECORD_DELIMITER) {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(record) = parse_record(&line[..pos]) {
                records.push(record);
            }
        }
        records
    }

    /// Flush the trailing fragment once the stream has closed
    pub fn finish(&mut self) -> Option<Result<ProgressEvent, StreamError>> {
        let rest = std::mem::take(&mut self.buffer);
        parse_record(&rest)
    }
}

fn parse_record(bytes: &[u8]) -> Option<Result<ProgressEvent, StreamError>> {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text.trim(),
        Err(e) => return Some(Err(e.into())),
    };

    if text.is_empty() {
        return None;
    }

    Some(serde_json::from_str(text).map_err(StreamError::from))
}
