//! Provider chunk shapes and classification.
//!
//! A provider streams either delta-style chat chunks or legacy completion
//! chunks. Classification looks at the first choice: a `delta` field means
//! chat, a `text` field means legacy. Anything else is a stream-fatal error.

use crate::error::{StreamError, StreamResult};
use relay_ai_core::FunctionCall;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Finish reason reported on the last choice of a completion.
pub type FinishReason = String;

/// Delta carried by a chat chunk choice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatDelta {
    /// Incremental text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Incremental function call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    /// Author role, usually only on the first chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// A choice within a chat chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatChoice {
    /// Incremental update.
    #[serde(default)]
    pub delta: ChatDelta,
    /// Set on the final chunk of a completion.
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
    /// Choice index.
    #[serde(default)]
    pub index: u32,
}

/// A delta-style chat completion chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatChunk {
    /// Completion ID.
    #[serde(default)]
    pub id: String,
    /// Unix creation time.
    #[serde(default)]
    pub created: u64,
    /// Model name.
    #[serde(default)]
    pub model: String,
    /// Choices.
    pub choices: Vec<ChatChoice>,
    /// Side-channel conversation ID (some proxies only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    /// Side-channel parent message ID (some proxies only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_message_id: Option<String>,
}

/// A choice within a legacy completion chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyChoice {
    /// Incremental text.
    pub text: String,
    /// Set on the final chunk of a completion.
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
    /// Choice index.
    #[serde(default)]
    pub index: u32,
    /// Token log probabilities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<Value>,
}

/// A legacy completion chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyChunk {
    /// Completion ID.
    #[serde(default)]
    pub id: String,
    /// Unix creation time.
    #[serde(default)]
    pub created: u64,
    /// Model name.
    #[serde(default)]
    pub model: String,
    /// Choices.
    pub choices: Vec<LegacyChoice>,
}

/// Shape of a provider chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkShape {
    /// Delta-style chat chunk.
    Chat,
    /// Legacy completion chunk.
    Legacy,
}

impl ChunkShape {
    /// Human-readable name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Legacy => "legacy",
        }
    }
}

/// A classified provider chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderChunk {
    /// Delta-style chat chunk.
    Chat(ChatChunk),
    /// Legacy completion chunk.
    Legacy(LegacyChunk),
}

impl ProviderChunk {
    /// Shape tag.
    #[must_use]
    pub fn shape(&self) -> ChunkShape {
        match self {
            Self::Chat(_) => ChunkShape::Chat,
            Self::Legacy(_) => ChunkShape::Legacy,
        }
    }

    /// Finish reason of the first choice.
    #[must_use]
    pub fn finish_reason(&self) -> Option<&str> {
        match self {
            Self::Chat(chunk) => chunk.choices.first()?.finish_reason.as_deref(),
            Self::Legacy(chunk) => chunk.choices.first()?.finish_reason.as_deref(),
        }
    }
}

/// Determine the shape of one decoded event.
///
/// Returns `Ok(None)` for Azure content-filter events, which carry
/// `prompt_filter_results` and an empty `choices` array.
pub fn chunk_shape(event: &Value) -> StreamResult<Option<ChunkShape>> {
    let choices = event
        .get("choices")
        .and_then(Value::as_array)
        .ok_or_else(|| StreamError::Classification(format!("no choices array in {}", event)))?;

    let Some(first) = choices.first() else {
        if event.get("prompt_filter_results").is_some() {
            return Ok(None);
        }
        return Err(StreamError::Classification(format!(
            "empty choices array in {}",
            event
        )));
    };

    if first.get("delta").is_some() {
        Ok(Some(ChunkShape::Chat))
    } else if first.get("text").is_some() {
        Ok(Some(ChunkShape::Legacy))
    } else {
        Err(StreamError::Classification(format!(
            "first choice has neither delta nor text: {}",
            first
        )))
    }
}

/// Decode one event into its typed view.
pub fn classify(event: Value) -> StreamResult<Option<ProviderChunk>> {
    match chunk_shape(&event)? {
        Some(ChunkShape::Chat) => Ok(Some(ProviderChunk::Chat(serde_json::from_value(event)?))),
        Some(ChunkShape::Legacy) => Ok(Some(ProviderChunk::Legacy(serde_json::from_value(event)?))),
        None => Ok(None),
    }
}

/// Per-stream classifier that also enforces a single shape per stream.
#[derive(Debug, Default)]
pub struct ChunkClassifier {
    shape: Option<ChunkShape>,
}

impl ChunkClassifier {
    /// Create a new classifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shape locked in by the first classified event.
    #[must_use]
    pub fn shape(&self) -> Option<ChunkShape> {
        self.shape
    }

    /// Classify the next event of the stream.
    pub fn classify(&mut self, event: Value) -> StreamResult<Option<ProviderChunk>> {
        let Some(chunk) = classify(event)? else {
            return Ok(None);
        };

        match self.shape {
            None => self.shape = Some(chunk.shape()),
            Some(shape) if shape != chunk.shape() => {
                return Err(StreamError::Classification(format!(
                    "{} chunk in a {} stream",
                    chunk.shape().as_str(),
                    shape.as_str()
                )));
            }
            Some(_) => {}
        }

        Ok(Some(chunk))
    }
}
