//! Text extraction.
//!
//! Turns classified chunks into one linear text stream. A streamed
//! function call is rendered inline as a JSON object literal whose
//! `arguments` value is an escaped JSON string, so the concatenated text
//! of the call parses as `{"function_call": {"name": ..., "arguments": ...}}`.

use crate::chunk::{ChunkClassifier, ProviderChunk};
use crate::error::StreamResult;
use crate::source::EventSource;
use futures::stream::BoxStream;
use futures::{future, StreamExt, TryStreamExt};

/// Prefix of the inline JSON literal that opens a function call.
pub const FUNCTION_CALL_PREFIX: &str = r#"{"function_call":"#;

/// Text that closes the inline function call literal.
pub const FUNCTION_CALL_SUFFIX: &str = r#""}}"#;

/// Stream of extracted, non-empty text fragments.
pub type TextStream = BoxStream<'static, StreamResult<String>>;

/// Escape text for inclusion inside a JSON string literal.
///
/// Backslash is escaped first so later escapes are not doubled.
pub fn escape_json_fragment(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '/' => escaped.push_str("\\/"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            '\u{000c}' => escaped.push_str("\\f"),
            '\u{0008}' => escaped.push_str("\\b"),
            c if c < '\u{0020}' => escaped.push_str(&format!("\\u{:04x}", c as u32)),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Removes leading whitespace until the first non-empty text is seen.
#[derive(Debug)]
pub struct StartTrimmer {
    at_stream_start: bool,
}

impl Default for StartTrimmer {
    fn default() -> Self {
        Self {
            at_stream_start: true,
        }
    }
}

impl StartTrimmer {
    /// Create a new trimmer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Trim `text` if nothing has been emitted yet.
    pub fn trim(&mut self, text: String) -> String {
        if !self.at_stream_start {
            return text;
        }
        let trimmed = text.trim_start();
        if trimmed.is_empty() {
            return String::new();
        }
        self.at_stream_start = false;
        if trimmed.len() == text.len() {
            text
        } else {
            trimmed.to_string()
        }
    }
}

/// Per-stream text extractor.
#[derive(Debug, Default)]
pub struct TextExtractor {
    trimmer: StartTrimmer,
    is_function_streaming_in: bool,
}

impl TextExtractor {
    /// Create a new extractor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a function call literal is currently open.
    #[must_use]
    pub fn is_function_streaming_in(&self) -> bool {
        self.is_function_streaming_in
    }

    /// Extract the text for one chunk. Returns `None` when there is nothing
    /// to emit.
    pub fn extract(&mut self, chunk: &ProviderChunk) -> Option<String> {
        let text = match chunk {
            ProviderChunk::Chat(chunk) => {
                let choice = chunk.choices.first()?;
                let call = choice.delta.function_call.as_ref();
                let mut call_text = String::new();

                if let Some(name) = call.and_then(|c| c.name.as_deref()) {
                    if !self.is_function_streaming_in {
                        self.is_function_streaming_in = true;
                        call_text.push_str(&format!(
                            r#"{{"function_call": {{"name": "{}", "arguments": ""#,
                            escape_json_fragment(name)
                        ));
                    }
                }

                if let Some(arguments) = call.and_then(|c| c.arguments.as_deref()) {
                    call_text.push_str(&escape_json_fragment(arguments));
                }

                if self.is_function_streaming_in
                    && matches!(
                        choice.finish_reason.as_deref(),
                        Some("function_call") | Some("stop")
                    )
                {
                    self.is_function_streaming_in = false;
                    call_text.push_str(FUNCTION_CALL_SUFFIX);
                }

                if !call_text.is_empty() {
                    return Some(call_text);
                }

                match (&choice.delta.content, &chunk.conversation_id, &chunk.parent_message_id) {
                    (Some(content), Some(conversation_id), Some(parent_message_id)) => {
                        let side_channel = serde_json::json!({
                            "conversation_id": conversation_id,
                            "parent_message_id": parent_message_id,
                        });
                        format!("{} {}", content, side_channel)
                    }
                    (Some(content), _, _) => content.clone(),
                    (None, _, _) => String::new(),
                }
            }
            ProviderChunk::Legacy(chunk) => chunk.choices.first()?.text.clone(),
        };

        let text = self.trimmer.trim(text);
        (!text.is_empty()).then_some(text)
    }
}

/// Classify and extract an upstream source into a text stream.
///
/// One classifier and one extractor are owned by the returned stream;
/// each call starts fresh state.
pub fn text_stream(source: EventSource) -> TextStream {
    let mut classifier = ChunkClassifier::new();
    let mut extractor = TextExtractor::new();

    source
        .into_events()
        .try_filter_map(move |event| {
            let text = classifier
                .classify(event)
                .map(|chunk| chunk.and_then(|chunk| extractor.extract(&chunk)));
            future::ready(text)
        })
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::classify;
    use crate::error::StreamError;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::{json, Value};

    fn chunk(event: Value) -> ProviderChunk {
        classify(event).unwrap().unwrap()
    }

    fn extract_all(extractor: &mut TextExtractor, events: Vec<Value>) -> Vec<String> {
        events
            .into_iter()
            .filter_map(|event| extractor.extract(&chunk(event)))
            .collect()
    }

    #[rstest]
    #[case("plain", "plain")]
    #[case(r"a\b", r"a\\b")]
    #[case("</script>", r"<\/script>")]
    #[case(r#"say "hi""#, r#"say \"hi\""#)]
    #[case("l1\nl2\r\tx\u{000c}", r"l1\nl2\r\tx\f")]
    #[case(r#"\""#, r#"\\\""#)]
    fn test_escape_json_fragment(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(escape_json_fragment(input), expected);
    }

    #[rstest]
    #[case("back\\slash")]
    #[case("quote \" and / slash")]
    #[case("controls \n\r\t\u{000c}\u{0008}\u{0001}")]
    #[case("unicode \u{e9}\u{1f600}")]
    #[case("\\\"\\n literal escapes")]
    fn test_escape_round_trips_through_json(#[case] input: &str) {
        let literal = format!("\"{}\"", escape_json_fragment(input));
        let decoded: String = serde_json::from_str(&literal).unwrap();
        assert_eq!(decoded, input);
    }

    #[test]
    fn test_start_trimmer_trims_until_first_text() {
        let mut trimmer = StartTrimmer::new();
        assert_eq!(trimmer.trim("\n\n".into()), "");
        assert_eq!(trimmer.trim("  Hi ".into()), "Hi ");
        assert_eq!(trimmer.trim("  there".into()), "  there");
    }

    #[test]
    fn test_extract_plain_content() {
        let mut extractor = TextExtractor::new();
        let texts = extract_all(
            &mut extractor,
            vec![
                json!({"choices": [{"delta": {"role": "assistant", "content": ""}}]}),
                json!({"choices": [{"delta": {"content": "\n\nHel"}}]}),
                json!({"choices": [{"delta": {"content": "lo"}}]}),
                json!({"choices": [{"delta": {}, "finish_reason": "stop"}]}),
            ],
        );

        assert_eq!(texts, vec!["Hel", "lo"]);
    }

    #[test]
    fn test_extract_function_call_literal() {
        let mut extractor = TextExtractor::new();
        let texts = extract_all(
            &mut extractor,
            vec![
                json!({"choices": [{"delta": {"role": "assistant", "content": null, "function_call": {"name": "get_current_weather", "arguments": ""}}}]}),
                json!({"choices": [{"delta": {"function_call": {"arguments": "{\n"}}}]}),
                json!({"choices": [{"delta": {"function_call": {"arguments": "\"location\": \"Boston, MA\""}}}]}),
                json!({"choices": [{"delta": {"function_call": {"arguments": "\n}"}}}]}),
                json!({"choices": [{"delta": {}, "finish_reason": "function_call"}]}),
            ],
        );

        assert!(!extractor.is_function_streaming_in());
        let joined = texts.concat();
        assert_eq!(
            joined,
            r#"{"function_call": {"name": "get_current_weather", "arguments": "{\n\"location\": \"Boston, MA\"\n}"}}"#
        );

        let parsed: Value = serde_json::from_str(&joined).unwrap();
        let arguments: Value =
            serde_json::from_str(parsed["function_call"]["arguments"].as_str().unwrap()).unwrap();
        assert_eq!(arguments, json!({"location": "Boston, MA"}));
    }

    #[test]
    fn test_whole_call_in_one_delta() {
        let mut extractor = TextExtractor::new();
        let texts = extract_all(
            &mut extractor,
            vec![
                json!({"choices": [{"delta": {"function_call": {"name": "f", "arguments": "{\"a\":1}"}}}]}),
                json!({"choices": [{"delta": {}, "finish_reason": "function_call"}]}),
            ],
        );

        assert_eq!(
            texts.concat(),
            r#"{"function_call": {"name": "f", "arguments": "{\"a\":1}"}}"#
        );
    }

    #[test]
    fn test_finish_reason_on_last_argument_chunk() {
        let mut extractor = TextExtractor::new();
        let texts = extract_all(
            &mut extractor,
            vec![
                json!({"choices": [{"delta": {"function_call": {"name": "f", "arguments": ""}}}]}),
                json!({"choices": [{"delta": {"function_call": {"arguments": "{\"a\":1}"}}, "finish_reason": "function_call"}]}),
            ],
        );

        assert!(!extractor.is_function_streaming_in());
        let parsed: Value = serde_json::from_str(&texts.concat()).unwrap();
        assert_eq!(parsed["function_call"]["name"], "f");
        assert_eq!(parsed["function_call"]["arguments"], "{\"a\":1}");
    }

    #[test]
    fn test_single_chunk_call_with_finish() {
        let mut extractor = TextExtractor::new();
        let texts = extract_all(
            &mut extractor,
            vec![json!({"choices": [{
                "delta": {"function_call": {"name": "f", "arguments": "{}"}},
                "finish_reason": "function_call"
            }]})],
        );

        assert_eq!(
            texts,
            vec![r#"{"function_call": {"name": "f", "arguments": "{}"}}"#]
        );
    }

    #[test]
    fn test_stop_without_function_call_emits_nothing() {
        let mut extractor = TextExtractor::new();
        let texts = extract_all(
            &mut extractor,
            vec![json!({"choices": [{"delta": {}, "finish_reason": "stop"}]})],
        );
        assert!(texts.is_empty());
    }

    #[test]
    fn test_side_channel_ids_are_appended() {
        let mut extractor = TextExtractor::new();
        let texts = extract_all(
            &mut extractor,
            vec![json!({
                "choices": [{"delta": {"content": "Hi"}}],
                "conversation_id": "c-1",
                "parent_message_id": "m-1"
            })],
        );

        assert_eq!(
            texts,
            vec![r#"Hi {"conversation_id":"c-1","parent_message_id":"m-1"}"#]
        );
    }

    #[test]
    fn test_side_channel_requires_both_ids() {
        let mut extractor = TextExtractor::new();
        let texts = extract_all(
            &mut extractor,
            vec![json!({
                "choices": [{"delta": {"content": "Hi"}}],
                "conversation_id": "c-1"
            })],
        );

        assert_eq!(texts, vec!["Hi"]);
    }

    #[test]
    fn test_extract_legacy_text() {
        let mut extractor = TextExtractor::new();
        let texts = extract_all(
            &mut extractor,
            vec![
                json!({"choices": [{"text": "\n", "index": 0, "finish_reason": null}]}),
                json!({"choices": [{"text": "Once", "index": 0, "finish_reason": null}]}),
                json!({"choices": [{"text": " upon", "index": 0, "finish_reason": "length"}]}),
            ],
        );

        assert_eq!(texts, vec!["Once", " upon"]);
    }

    #[tokio::test]
    async fn test_text_stream_fails_fast_on_unknown_shape() {
        let source = EventSource::from_values(vec![
            json!({"choices": [{"delta": {"content": "ok"}}]}),
            json!({"unexpected": true}),
            json!({"choices": [{"delta": {"content": "never"}}]}),
        ]);
        let mut stream = text_stream(source);

        assert_eq!(stream.next().await.unwrap().unwrap(), "ok");
        assert!(matches!(
            stream.next().await,
            Some(Err(StreamError::Classification(_)))
        ));
    }
}
