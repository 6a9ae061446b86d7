//! Stream-part line format.
//!
//! Each record is one line: a single-digit kind code, `:`, a JSON payload
//! and `\n`.
//!
//! | Code | Kind | Payload |
//! |------|------|---------|
//! | `0` | text | JSON string |
//! | `1` | function_call | `{"function_call": {...}}` object |
//! | `2` | data | JSON array |

use relay_ai_streaming::OutputEvent;
use serde_json::Value;
use thiserror::Error;

/// HTTP headers for a plain text response.
pub const TEXT_STREAM_HEADERS: &[(&str, &str)] = &[("content-type", "text/plain; charset=utf-8")];

/// HTTP headers for an envelope-encoded response.
pub const STREAM_DATA_HEADERS: &[(&str, &str)] = &[
    ("content-type", "text/plain; charset=utf-8"),
    ("x-experimental-stream-data", "true"),
];

/// Kind of a stream part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamPartKind {
    /// Text fragment.
    Text,
    /// Completed function call.
    FunctionCall,
    /// Out-of-band data.
    Data,
}

impl StreamPartKind {
    /// Single-character wire code.
    #[must_use]
    pub fn code(&self) -> char {
        match self {
            Self::Text => '0',
            Self::FunctionCall => '1',
            Self::Data => '2',
        }
    }

    /// Kind for a wire code.
    #[must_use]
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            '0' => Some(Self::Text),
            '1' => Some(Self::FunctionCall),
            '2' => Some(Self::Data),
            _ => None,
        }
    }

    /// Protocol name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::FunctionCall => "function_call",
            Self::Data => "data",
        }
    }
}

/// A decoded stream part.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamPart {
    /// Part kind.
    pub kind: StreamPartKind,
    /// JSON payload.
    pub value: Value,
}

/// Errors from [`parse_stream_part`].
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The line has no `:` after the code.
    #[error("Stream part has no separator: {0}")]
    MissingSeparator(String),

    /// Unknown kind code.
    #[error("Unknown stream part code: {0}")]
    UnknownCode(String),

    /// Payload is not JSON.
    #[error("Invalid stream part payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Payload has the wrong JSON type for its kind.
    #[error("Stream part '{kind}' expects {expected}")]
    UnexpectedPayload {
        /// Part kind name.
        kind: &'static str,
        /// Expected JSON type.
        expected: &'static str,
    },
}

/// Format one stream part line.
pub fn format_stream_part(kind: StreamPartKind, value: &Value) -> String {
    format!("{}:{}\n", kind.code(), value)
}

/// Format an output event as a stream part line.
pub fn encode_event(event: &OutputEvent) -> String {
    match event {
        OutputEvent::Text(text) => format_stream_part(StreamPartKind::Text, &Value::String(text.clone())),
        OutputEvent::FunctionCall(value) => format_stream_part(StreamPartKind::FunctionCall, value),
        OutputEvent::Data(Value::Array(values)) => {
            format_stream_part(StreamPartKind::Data, &Value::Array(values.clone()))
        }
        OutputEvent::Data(value) => {
            format_stream_part(StreamPartKind::Data, &Value::Array(vec![value.clone()]))
        }
    }
}

/// Parse one stream part line. A trailing newline is optional.
pub fn parse_stream_part(line: &str) -> Result<StreamPart, ProtocolError> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let (code, payload) = line
        .split_once(':')
        .ok_or_else(|| ProtocolError::MissingSeparator(line.to_string()))?;

    let mut chars = code.chars();
    let kind = match (chars.next(), chars.next()) {
        (Some(c), None) => StreamPartKind::from_code(c),
        _ => None,
    }
    .ok_or_else(|| ProtocolError::UnknownCode(code.to_string()))?;

    let value: Value = serde_json::from_str(payload)?;
    let expected = match kind {
        StreamPartKind::Text if !value.is_string() => Some("a string"),
        StreamPartKind::Data if !value.is_array() => Some("an array"),
        _ => None,
    };
    if let Some(expected) = expected {
        return Err(ProtocolError::UnexpectedPayload {
            kind: kind.name(),
            expected,
        });
    }

    Ok(StreamPart { kind, value })
}
