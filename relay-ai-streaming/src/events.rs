//! Output events.

use serde_json::Value;

/// Kind of an [`OutputEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    /// Plain text.
    Text,
    /// A completed function call.
    FunctionCall,
    /// Out-of-band data.
    Data,
}

/// One unit of the normalized output stream.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputEvent {
    /// Plain text fragment.
    Text(String),
    /// A completed function call: the decoded `{"function_call": ...}`
    /// object, or the raw buffered text as a JSON string if it was malformed.
    FunctionCall(Value),
    /// Out-of-band data.
    Data(Value),
}

impl OutputEvent {
    /// Kind tag.
    #[must_use]
    pub fn kind(&self) -> OutputKind {
        match self {
            Self::Text(_) => OutputKind::Text,
            Self::FunctionCall(_) => OutputKind::FunctionCall,
            Self::Data(_) => OutputKind::Data,
        }
    }

    /// Text content, if this is a text event.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}
