//! Line decoder
//!
//! Splits a chunked byte stream into complete lines, keeping the trailing
//! partial line as carry-over until its newline arrives, then classifies
//! each line as a message, the end sentinel or something to skip.
//!
//! Both body framings the backend uses are accepted:
//! - newline-delimited JSON, one object per line
//! - server-sent events, `data: <json>` lines ending with `data: [DONE]`
//!
//! Splitting happens on raw bytes so a multi-byte character cut by a chunk
//! boundary is reassembled before UTF-8 decoding.

use htree_model::StreamMessage;

/// SSE end-of-stream payload
pub const DONE_SENTINEL: &str = "[DONE]";

/// Incremental newline splitter with carry-over
#[derive(Debug, Default, Clone)]
pub struct LineDecoder {
    carry: Vec<u8>,
}

impl LineDecoder {
    /// Create empty decoder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every line it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.carry.extend_from_slice(chunk);
        let Some(last_newline) = self.carry.iter().rposition(|b| *b == b'\n') else {
            return Vec::new();
        };

        let rest = self.carry.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.carry, rest);
        complete[..complete.len() - 1]
            .split(|b| *b == b'\n')
            .map(decode_line)
            .collect()
    }

    /// Bytes held back waiting for a newline
    #[inline]
    #[must_use]
    pub fn pending(&self) -> usize {
        self.carry.len()
    }

    /// Take the carry-over as a final line, if any
    ///
    /// Only meaningful at a clean end of stream; after an abort or error the
    /// carry-over is a truncated line and should be discarded instead.
    pub fn finish(&mut self) -> Option<String> {
        if self.carry.is_empty() {
            return None;
        }
        let line = decode_line(&std::mem::take(&mut self.carry));
        (!line.trim().is_empty()).then_some(line)
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Classified line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A decoded message
    Message(StreamMessage),
    /// SSE end-of-stream sentinel
    Done,
    /// Blank line, SSE comment or non-data SSE field
    Skip,
    /// Payload that is not valid JSON
    Malformed(String),
}

/// Classify one complete line
#[must_use]
pub fn classify(line: &str) -> Frame {
    let line = line.trim();
    if line.is_empty() || line.starts_with(':') {
        return Frame::Skip;
    }

    let payload = match line.strip_prefix("data:") {
        Some(data) => data.trim_start(),
        None if is_sse_field(line) => return Frame::Skip,
        None => line,
    };
    if payload.is_empty() {
        return Frame::Skip;
    }
    if payload == DONE_SENTINEL {
        return Frame::Done;
    }

    match serde_json::from_str::<StreamMessage>(payload) {
        Ok(message) => Frame::Message(message),
        Err(err) => Frame::Malformed(err.to_string()),
    }
}

fn is_sse_field(line: &str) -> bool {
    ["event:", "id:", "retry:"].iter().any(|field| line.starts_with(field))
}
