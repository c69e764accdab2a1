//! Server-Sent Events encoding and decoding, shared by the streamable HTTP
//! batch response and the legacy SSE transport (and handy for test clients).
//!
//! Wire grammar per event:
//!
//! ```text
//! (":"<comment>"\n")? ("id: "<id>"\n")? ("data: "<chunk>"\n")+
//! ("event: "<name>"\n")? ("retry: "<ms>"\n")? "\n"
//! ```
//!
//! The decoder tolerates leading whitespace, treats lines starting with `:`
//! as comments, and accepts events without an id.

use std::fmt::{self, Write as _};
use std::io::BufRead;

use thiserror::Error;

/// One SSE event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    /// Optional event id line.
    pub id: Option<String>,
    /// Payload; split on `\n` into one `data:` line per chunk when encoded.
    pub data: String,
    /// Optional event name (`message`, `endpoint`, …).
    pub event: Option<String>,
    /// Optional reconnection delay in milliseconds.
    pub retry: Option<String>,
}

impl SseEvent {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    pub fn with_retry(mut self, retry: impl Into<String>) -> Self {
        self.retry = Some(retry.into());
        self
    }

    /// Writes the event in wire format. An event without data writes nothing.
    pub fn marshal_to<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        if self.data.is_empty() {
            return Ok(());
        }
        if let Some(id) = &self.id {
            writeln!(out, "id: {id}")?;
        }
        for chunk in self.data.split('\n') {
            writeln!(out, "data: {chunk}")?;
        }
        if let Some(event) = &self.event {
            writeln!(out, "event: {event}")?;
        }
        if let Some(retry) = &self.retry {
            writeln!(out, "retry: {retry}")?;
        }
        writeln!(out)
    }
}

/// A comment-only frame, used for keep-alives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseCommentEvent {
    pub comment: String,
}

impl SseCommentEvent {
    pub fn new(comment: impl Into<String>) -> Self {
        Self {
            comment: comment.into(),
        }
    }

    /// Writes the comment frame. An empty comment writes nothing.
    pub fn marshal_to<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        if self.comment.is_empty() {
            return Ok(());
        }
        write!(out, ": {}\n\n", self.comment)
    }
}

/// Decoding failures.
#[derive(Debug, Error)]
pub enum SseDecodeError {
    /// The stream ended before any event content was read.
    #[error("end of stream")]
    Eof,

    /// An event terminated without any `data:` line.
    #[error("no data found in event")]
    MissingData,

    #[error("i/o failure while decoding event: {0}")]
    Io(#[from] std::io::Error),
}

/// Decodes the next event from `reader`.
///
/// Consumes lines until the blank-line terminator. Multiple `data:` lines are
/// concatenated (the encoder's split is not reversed; JSON payloads never
/// contain raw newlines, so round-trips are exact for them).
pub fn decode_event<R: BufRead>(reader: &mut R) -> Result<SseEvent, SseDecodeError> {
    let mut event = SseEvent::default();
    let mut read_partial_event = false;

    loop {
        let mut line = String::new();
        let read = reader.read_line(&mut line)?;
        if read == 0 {
            if !read_partial_event {
                return Err(SseDecodeError::Eof);
            }
            break;
        }

        let line = line.trim();
        if line.is_empty() {
            break; // end of event
        }
        if line.starts_with(':') {
            continue; // comment line
        }

        if let Some((field, value)) = line.split_once(':') {
            let value = value.trim();
            if !value.is_empty() {
                match field.trim() {
                    "data" => event.data.push_str(value),
                    "id" => event.id = Some(value.to_string()),
                    "event" => event.event = Some(value.to_string()),
                    "retry" => event.retry = Some(value.to_string()),
                    _ => {}
                }
            }
        }

        read_partial_event = true;
    }

    if event.data.is_empty() {
        return Err(SseDecodeError::MissingData);
    }
    Ok(event)
}
