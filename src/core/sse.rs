//! Decoding of the line-oriented streaming response.
//!
//! The streaming endpoint answers with newline-delimited events of the form
//! `data: {"completion": "..."}`. Each such event becomes one text fragment.
//! Anything else is logged and skipped, the stream keeps going.

use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::{Buf, Bytes, BytesMut};
use futures::Stream;
use tracing::{error, warn};

use super::error::{ClientError, MalformedStreamEvent, TransportError};

const DATA_PREFIX: &str = "data: ";

/// Body chunks as handed over by the transport.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// Interprets one non-empty line of the streaming body.
///
/// `Ok(None)` means the line was a well-formed event without a `completion` field.
pub fn parse_event_line(line: &str) -> Result<Option<String>, MalformedStreamEvent> {
    let malformed = |reason: String| MalformedStreamEvent {
        line: line.to_string(),
        reason,
    };

    let payload = line
        .strip_prefix(DATA_PREFIX)
        .ok_or_else(|| malformed("missing `data: ` marker".to_string()))?;

    let event: serde_json::Value =
        serde_json::from_str(payload).map_err(|e| malformed(format!("invalid JSON: {e}")))?;

    match event.get("completion") {
        None => Ok(None),
        Some(serde_json::Value::String(text)) => Ok(Some(text.clone())),
        Some(other) => Err(malformed(format!("`completion` is not a string: {other}"))),
    }
}

/// Splits a byte stream into lines without decoding partial lines.
#[derive(Debug, Default)]
pub(crate) struct LineDecoder {
    buffer: BytesMut,
}

impl LineDecoder {
    pub(crate) fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Next complete line, without its `\n` or `\r\n` terminator.
    pub(crate) fn next_line(&mut self) -> Option<Bytes> {
        let pos = self.buffer.iter().position(|b| *b == b'\n')?;
        let mut line = self.buffer.split_to(pos).freeze();
        self.buffer.advance(1);
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }
        Some(line)
    }

    /// Whatever is left once the body has ended.
    pub(crate) fn finish(&mut self) -> Option<Bytes> {
        if self.buffer.is_empty() {
            return None;
        }
        let mut line = self.buffer.split().freeze();
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }
        Some(line)
    }

    pub(crate) fn clear(&mut self) {
        self.buffer.clear();
    }
}

/// Lazily produced text fragments of one streaming generation.
///
/// The body is only read when the consumer polls for the next fragment.
/// A transport failure is yielded once, after which the stream ends.
/// Each `stream_generate` call opens a new connection and a new stream.
pub struct FragmentStream {
    body: ByteStream,
    decoder: LineDecoder,
    body_done: bool,
    tail_taken: bool,
    failed: bool,
}

impl FragmentStream {
    pub fn new(body: ByteStream) -> Self {
        Self {
            body,
            decoder: LineDecoder::default(),
            body_done: false,
            tail_taken: false,
            failed: false,
        }
    }

    fn next_buffered_line(&mut self) -> Option<Bytes> {
        if let Some(line) = self.decoder.next_line() {
            return Some(line);
        }
        if self.body_done && !self.tail_taken {
            self.tail_taken = true;
            return self.decoder.finish();
        }
        None
    }
}

/// Same as [`parse_event_line`], for a raw line that may not be valid UTF-8.
fn decode_line(raw: &[u8]) -> Result<Option<String>, MalformedStreamEvent> {
    let line = std::str::from_utf8(raw).map_err(|e| MalformedStreamEvent {
        line: String::from_utf8_lossy(raw).into_owned(),
        reason: format!("invalid UTF-8: {e}"),
    })?;
    parse_event_line(line)
}

fn fragment_from_line(raw: &[u8]) -> Option<String> {
    if raw.is_empty() {
        return None;
    }

    match decode_line(raw) {
        Ok(fragment) => fragment,
        Err(e) => {
            warn!(line = %e.line, reason = %e.reason, "Failed to parse streaming response");
            None
        }
    }
}

impl Stream for FragmentStream {
    type Item = Result<String, ClientError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if this.failed {
                return Poll::Ready(None);
            }

            while let Some(raw) = this.next_buffered_line() {
                if let Some(fragment) = fragment_from_line(&raw) {
                    return Poll::Ready(Some(Ok(fragment)));
                }
            }

            if this.body_done {
                return Poll::Ready(None);
            }

            match ready!(this.body.as_mut().poll_next(cx)) {
                Some(Ok(chunk)) => this.decoder.push(&chunk),
                Some(Err(e)) => {
                    error!(error = %e, "Error streaming from Claude");
                    this.failed = true;
                    this.decoder.clear();
                    return Poll::Ready(Some(Err(ClientError::Transport(e))));
                }
                None => this.body_done = true,
            }
        }
    }
}
