//! Function-call aggregation.
//!
//! [`FunctionCallStream`] sits on top of the extracted text stream. If the
//! first text fragment opens an inline function call, everything up to the
//! end of the upstream is buffered; the completed call is then emitted or
//! handed to a [`FunctionCallHandler`]. A handler may answer with a
//! continuation, in which case the upstream source is swapped for the new
//! one and pulling resumes behind the same `Stream`. Continuations never
//! nest on the call stack, however deep the function-call chain goes.

use crate::callbacks::{CallbackDriver, StreamCallbacks};
use crate::error::{StreamError, StreamResult};
use crate::events::OutputEvent;
use crate::extract::{text_stream, TextStream, FUNCTION_CALL_PREFIX};
use crate::handler::{FunctionCallHandler, FunctionCallOutcome, MessageBuilder};
use crate::source::EventSource;
use futures::future::BoxFuture;
use futures::{ready, FutureExt, Stream, StreamExt};
use relay_ai_core::{FunctionCall, FunctionCallPayload, Message};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::{debug, error, warn};

/// Aggregation state for one upstream stream segment.
///
/// A continuation starts a fresh state seeded with the function-call
/// messages built so far.
#[derive(Debug, Clone)]
pub struct AggregationState {
    /// No text has been seen yet.
    pub is_first_chunk: bool,
    /// A function call is being buffered.
    pub is_function_streaming_in: bool,
    /// Buffered function call text.
    pub aggregated_response: String,
    /// All text seen in this segment.
    pub aggregated_final_text: String,
    /// Function-call messages from earlier continuations.
    pub pending_messages: Vec<Message>,
}

impl Default for AggregationState {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl AggregationState {
    /// Create a fresh state.
    pub fn new(pending_messages: Vec<Message>) -> Self {
        Self {
            is_first_chunk: true,
            is_function_streaming_in: false,
            aggregated_response: String::new(),
            aggregated_final_text: String::new(),
            pending_messages,
        }
    }
}

/// A buffered function call that parsed cleanly.
struct ParsedCall {
    event: Value,
    payload: FunctionCallPayload,
    call: FunctionCall,
}

#[derive(Deserialize)]
struct CallEnvelope {
    function_call: CallBody,
}

#[derive(Deserialize)]
struct CallBody {
    name: String,
    arguments: String,
}

fn parse_function_call(raw: &str) -> StreamResult<ParsedCall> {
    let event: Value = serde_json::from_str(raw)?;
    let envelope = CallEnvelope::deserialize(&event)?;
    let arguments: Value = serde_json::from_str(&envelope.function_call.arguments)?;

    Ok(ParsedCall {
        payload: FunctionCallPayload::new(envelope.function_call.name.clone(), arguments),
        call: FunctionCall::new(envelope.function_call.name, envelope.function_call.arguments),
        event,
    })
}

enum Phase {
    Start,
    Streaming,
    Handling {
        outcome: BoxFuture<'static, anyhow::Result<FunctionCallOutcome>>,
        call_event: Value,
    },
    Done,
}

/// The function-call aggregating output stream.
///
/// Yields [`OutputEvent`]s. `on_final` fires exactly once: when the
/// stream ends, when it fails, or when it is dropped early.
pub struct FunctionCallStream {
    source: Option<TextStream>,
    state: AggregationState,
    phase: Phase,
    handler: Option<Arc<dyn FunctionCallHandler>>,
    driver: CallbackDriver,
    continuations: usize,
}

impl fmt::Debug for FunctionCallStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionCallStream")
            .field("state", &self.state)
            .field("has_handler", &self.handler.is_some())
            .field("continuations", &self.continuations)
            .finish()
    }
}

impl FunctionCallStream {
    /// Create a stream over an upstream source.
    pub fn new(source: EventSource) -> Self {
        Self {
            source: Some(text_stream(source)),
            state: AggregationState::default(),
            phase: Phase::Start,
            handler: None,
            driver: CallbackDriver::new(StreamCallbacks::default()),
            continuations: 0,
        }
    }

    /// Set the lifecycle callbacks.
    #[must_use]
    pub fn with_callbacks(mut self, callbacks: StreamCallbacks) -> Self {
        self.driver = CallbackDriver::new(callbacks);
        self
    }

    /// Set the function-call handler.
    #[must_use]
    pub fn with_handler(self, handler: impl FunctionCallHandler + 'static) -> Self {
        self.with_shared_handler(Arc::new(handler))
    }

    /// Set a shared function-call handler.
    #[must_use]
    pub fn with_shared_handler(mut self, handler: Arc<dyn FunctionCallHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// State of the current segment.
    pub fn state(&self) -> &AggregationState {
        &self.state
    }

    /// Number of continuations spliced in so far.
    pub fn continuations(&self) -> usize {
        self.continuations
    }

    fn push_text(&mut self, text: String) -> Option<OutputEvent> {
        self.driver.token(&text);
        self.state.aggregated_final_text.push_str(&text);

        if self.state.is_first_chunk {
            self.state.is_first_chunk = false;
            if text.starts_with(FUNCTION_CALL_PREFIX) {
                debug!("function call detected, buffering");
                self.state.is_function_streaming_in = true;
                self.state.aggregated_response.push_str(&text);
                return None;
            }
        }

        if self.state.is_function_streaming_in {
            self.state.aggregated_response.push_str(&text);
            None
        } else {
            Some(OutputEvent::Text(text))
        }
    }

    /// Upstream ended. Returns an event to emit, or `None` to keep polling
    /// (the phase says whether anything is left).
    fn flush(&mut self) -> Option<StreamResult<OutputEvent>> {
        self.source = None;
        self.driver.completion(&self.state.aggregated_final_text);

        if !self.state.is_function_streaming_in {
            self.finish();
            return None;
        }
        self.state.is_function_streaming_in = false;

        let raw = std::mem::take(&mut self.state.aggregated_response);
        let parsed = match parse_function_call(&raw) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(error = %err, "malformed function call, emitting raw text");
                self.finish();
                return Some(Ok(OutputEvent::FunctionCall(Value::String(raw))));
            }
        };

        let Some(handler) = self.handler.clone() else {
            self.finish();
            return Some(Ok(OutputEvent::FunctionCall(parsed.event)));
        };

        debug!(name = %parsed.payload.name, "invoking function call handler");
        let builder = MessageBuilder::new(self.state.pending_messages.clone(), parsed.call);
        let payload = parsed.payload;
        self.phase = Phase::Handling {
            outcome: async move { handler.on_function_call(payload, builder).await }.boxed(),
            call_event: parsed.event,
        };
        None
    }

    fn finish(&mut self) {
        self.phase = Phase::Done;
        self.source = None;
        let text = std::mem::take(&mut self.state.aggregated_final_text);
        self.state = AggregationState::default();
        self.driver.finish(&text);
    }
}

impl Stream for FunctionCallStream {
    type Item = StreamResult<OutputEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            match &mut this.phase {
                Phase::Start => {
                    this.driver.start();
                    this.phase = Phase::Streaming;
                }
                Phase::Streaming => {
                    let Some(source) = this.source.as_mut() else {
                        this.finish();
                        return Poll::Ready(None);
                    };

                    match ready!(source.poll_next_unpin(cx)) {
                        Some(Ok(text)) => {
                            if let Some(event) = this.push_text(text) {
                                return Poll::Ready(Some(Ok(event)));
                            }
                        }
                        Some(Err(err)) => {
                            warn!(error = %err, "upstream stream failed");
                            this.finish();
                            return Poll::Ready(Some(Err(err)));
                        }
                        None => {
                            if let Some(item) = this.flush() {
                                return Poll::Ready(Some(item));
                            }
                        }
                    }
                }
                Phase::Handling {
                    outcome,
                    call_event,
                } => {
                    let result = ready!(outcome.poll_unpin(cx));
                    let call_event = std::mem::take(call_event);

                    match result {
                        Ok(FunctionCallOutcome::Emit) => {
                            this.finish();
                            return Poll::Ready(Some(Ok(OutputEvent::FunctionCall(call_event))));
                        }
                        Ok(FunctionCallOutcome::Text(text)) => {
                            this.finish();
                            return Poll::Ready(Some(Ok(OutputEvent::Text(text))));
                        }
                        Ok(FunctionCallOutcome::Continue(continuation)) => {
                            this.continuations += 1;
                            debug!(depth = this.continuations, "splicing continuation stream");
                            this.source = Some(text_stream(continuation.source));
                            this.state = AggregationState::new(continuation.messages);
                            this.phase = Phase::Streaming;
                        }
                        Err(err) => {
                            error!(error = %err, "function call handler failed");
                            this.finish();
                            return Poll::Ready(Some(Err(StreamError::Handler(err.to_string()))));
                        }
                    }
                }
                Phase::Done => return Poll::Ready(None),
            }
        }
    }
}

impl Drop for FunctionCallStream {
    fn drop(&mut self) {
        if !self.driver.is_finalized() {
            debug!("output stream dropped before completion");
            self.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::OutputKind;
    use crate::handler::Continuation;
    use futures::stream::{self, BoxStream};
    use pretty_assertions::assert_eq;
    use relay_ai_core::Role;
    use rstest::rstest;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn content(text: &str) -> Value {
        json!({"id": "c", "created": 0, "model": "gpt-4", "choices": [{"index": 0, "delta": {"content": text}, "finish_reason": null}]})
    }

    fn call_name(name: &str) -> Value {
        json!({"choices": [{"index": 0, "delta": {"role": "assistant", "content": null, "function_call": {"name": name, "arguments": ""}}}]})
    }

    fn call_args(arguments: &str) -> Value {
        json!({"choices": [{"index": 0, "delta": {"function_call": {"arguments": arguments}}}]})
    }

    fn finish(reason: &str) -> Value {
        json!({"choices": [{"index": 0, "delta": {}, "finish_reason": reason}]})
    }

    fn weather_call() -> Vec<Value> {
        vec![
            call_name("get_weather"),
            call_args("{\"city\": "),
            call_args("\"Oslo\\\\Norway\", \"note\": \"a/b\\n\"}"),
            finish("function_call"),
        ]
    }

    /// Upstream that records when it is released.
    struct TrackedSource {
        inner: BoxStream<'static, StreamResult<Value>>,
        released: Arc<AtomicBool>,
    }

    impl Stream for TrackedSource {
        type Item = StreamResult<Value>;

        fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
            self.inner.poll_next_unpin(cx)
        }
    }

    impl Drop for TrackedSource {
        fn drop(&mut self) {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    fn tracked(events: Vec<Value>, stay_open: bool) -> (EventSource, Arc<AtomicBool>) {
        let released = Arc::new(AtomicBool::new(false));
        let items = stream::iter(events.into_iter().map(Ok));
        let inner = if stay_open {
            items.chain(stream::pending()).boxed()
        } else {
            items.boxed()
        };
        let source = EventSource::from_events(TrackedSource {
            inner,
            released: released.clone(),
        });
        (source, released)
    }

    #[derive(Default)]
    struct Recorder {
        starts: AtomicUsize,
        tokens: Mutex<Vec<String>>,
        completions: Mutex<Vec<String>>,
        finals: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn callbacks(self: &Arc<Self>) -> StreamCallbacks {
            let (r1, r2, r3, r4) = (self.clone(), self.clone(), self.clone(), self.clone());
            StreamCallbacks::new()
                .with_on_start(move || {
                    r1.starts.fetch_add(1, Ordering::SeqCst);
                })
                .with_on_token(move |t| r2.tokens.lock().unwrap().push(t.to_string()))
                .with_on_completion(move |t| r3.completions.lock().unwrap().push(t.to_string()))
                .with_on_final(move |t| r4.finals.lock().unwrap().push(t.to_string()))
        }

        fn finals(&self) -> Vec<String> {
            self.finals.lock().unwrap().clone()
        }
    }

    async fn collect(stream: FunctionCallStream) -> Vec<StreamResult<OutputEvent>> {
        stream.collect().await
    }

    fn ok_events(items: Vec<StreamResult<OutputEvent>>) -> Vec<OutputEvent> {
        items.into_iter().map(|item| item.unwrap()).collect()
    }

    #[tokio::test]
    async fn test_plain_text_passthrough() {
        let recorder = Arc::new(Recorder::default());
        let source = EventSource::from_values(vec![content("Hel"), content("lo"), finish("stop")]);
        let stream = FunctionCallStream::new(source).with_callbacks(recorder.callbacks());

        let events = ok_events(collect(stream).await);

        assert_eq!(
            events,
            vec![
                OutputEvent::Text("Hel".to_string()),
                OutputEvent::Text("lo".to_string())
            ]
        );
        assert_eq!(recorder.starts.load(Ordering::SeqCst), 1);
        assert_eq!(*recorder.tokens.lock().unwrap(), vec!["Hel", "lo"]);
        assert_eq!(*recorder.completions.lock().unwrap(), vec!["Hello"]);
        assert_eq!(recorder.finals(), vec!["Hello"]);
    }

    #[tokio::test]
    async fn test_function_call_without_handler_is_emitted_whole() {
        let recorder = Arc::new(Recorder::default());
        let source = EventSource::from_values(weather_call());
        let stream = FunctionCallStream::new(source).with_callbacks(recorder.callbacks());

        let events = ok_events(collect(stream).await);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), OutputKind::FunctionCall);
        let OutputEvent::FunctionCall(value) = &events[0] else {
            panic!("expected function call");
        };
        assert_eq!(value["function_call"]["name"], "get_weather");
        let arguments: Value =
            serde_json::from_str(value["function_call"]["arguments"].as_str().unwrap()).unwrap();
        assert_eq!(arguments, json!({"city": "Oslo\\Norway", "note": "a/b\n"}));

        let finals = recorder.finals();
        assert_eq!(finals.len(), 1);
        assert!(finals[0].starts_with(FUNCTION_CALL_PREFIX));
    }

    #[rstest]
    #[case::separate_finish(vec![
        json!({"choices": [{"delta": {"function_call": {"name": "f", "arguments": "{\"a\":1}"}}}]}),
        finish("function_call"),
    ])]
    #[case::finish_with_arguments(vec![
        call_name("f"),
        json!({"choices": [{"delta": {"function_call": {"arguments": "{\"a\":1}"}}, "finish_reason": "function_call"}]}),
    ])]
    #[tokio::test]
    async fn test_packed_call_chunks_reach_handler(#[case] events: Vec<Value>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let calls_in_handler = calls.clone();
        let handler = move |call: FunctionCallPayload, _messages: MessageBuilder| {
            let calls = calls_in_handler.clone();
            async move {
                calls.lock().unwrap().push(call);
                anyhow::Ok(FunctionCallOutcome::Text("done".to_string()))
            }
        };

        let stream = FunctionCallStream::new(EventSource::from_values(events)).with_handler(handler);
        let events = ok_events(collect(stream).await);

        assert_eq!(events, vec![OutputEvent::Text("done".to_string())]);
        assert_eq!(
            *calls.lock().unwrap(),
            vec![FunctionCallPayload::new("f", json!({"a": 1}))]
        );
    }

    #[tokio::test]
    async fn test_handler_receives_decoded_call_and_can_decline() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in_handler = seen.clone();
        let handler = move |call: FunctionCallPayload, messages: MessageBuilder| {
            let seen = seen_in_handler.clone();
            async move {
                seen.lock().unwrap().push((call, messages.call().clone()));
                anyhow::Ok(FunctionCallOutcome::Emit)
            }
        };

        let stream = FunctionCallStream::new(EventSource::from_values(weather_call()))
            .with_handler(handler);
        let events = ok_events(collect(stream).await);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (payload, call) = &seen[0];
        assert_eq!(payload.name, "get_weather");
        assert_eq!(payload.arguments, json!({"city": "Oslo\\Norway", "note": "a/b\n"}));
        assert_eq!(call.name.as_deref(), Some("get_weather"));

        let OutputEvent::FunctionCall(value) = &events[0] else {
            panic!("expected function call");
        };
        let emitted: Value =
            serde_json::from_str(value["function_call"]["arguments"].as_str().unwrap()).unwrap();
        assert_eq!(emitted, payload.arguments);
    }

    #[tokio::test]
    async fn test_handler_text_replaces_call() {
        let handler = |_call: FunctionCallPayload, _messages: MessageBuilder| async move {
            anyhow::Ok(FunctionCallOutcome::Text("It is sunny.".to_string()))
        };

        let stream = FunctionCallStream::new(EventSource::from_values(weather_call()))
            .with_handler(handler);

        assert_eq!(
            ok_events(collect(stream).await),
            vec![OutputEvent::Text("It is sunny.".to_string())]
        );
    }

    #[tokio::test]
    async fn test_continuation_is_spliced_into_output() {
        let recorder = Arc::new(Recorder::default());
        let built = Arc::new(Mutex::new(Vec::new()));
        let built_in_handler = built.clone();
        let handler = move |_call: FunctionCallPayload, messages: MessageBuilder| {
            let built = built_in_handler.clone();
            async move {
                let messages = messages.build(&json!({"temperature": 4}))?;
                built.lock().unwrap().extend(messages.clone());
                let source = EventSource::from_values(vec![
                    content("It is "),
                    content("4 degrees."),
                    finish("stop"),
                ]);
                anyhow::Ok(FunctionCallOutcome::Continue(Continuation::new(messages, source)))
            }
        };

        let stream = FunctionCallStream::new(EventSource::from_values(weather_call()))
            .with_callbacks(recorder.callbacks())
            .with_handler(handler);
        let events = ok_events(collect(stream).await);

        assert_eq!(
            events,
            vec![
                OutputEvent::Text("It is ".to_string()),
                OutputEvent::Text("4 degrees.".to_string())
            ]
        );
        assert_eq!(recorder.starts.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.finals(), vec!["It is 4 degrees."]);
        assert_eq!(recorder.completions.lock().unwrap().len(), 2);

        let built = built.lock().unwrap();
        assert_eq!(built.len(), 2);
        assert_eq!(built[0].role, Role::Assistant);
        assert_eq!(built[1], Message::function("get_weather", r#"{"temperature":4}"#));
    }

    #[tokio::test]
    async fn test_chained_continuations_accumulate_messages() {
        let calls = Arc::new(AtomicUsize::new(0));
        let priors = Arc::new(Mutex::new(Vec::new()));
        let (calls_in, priors_in) = (calls.clone(), priors.clone());
        let handler = move |call: FunctionCallPayload, messages: MessageBuilder| {
            let (calls, priors) = (calls_in.clone(), priors_in.clone());
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                priors.lock().unwrap().push(messages.prior().len());
                let built = messages.build(&json!({"call": call.name}))?;
                let next = if n == 0 {
                    vec![call_name("second"), call_args("{}"), finish("function_call")]
                } else {
                    vec![content("done"), finish("stop")]
                };
                anyhow::Ok(FunctionCallOutcome::Continue(Continuation::new(
                    built,
                    EventSource::from_values(next),
                )))
            }
        };

        let stream = FunctionCallStream::new(EventSource::from_values(weather_call()))
            .with_handler(handler);
        let events = ok_events(collect(stream).await);

        assert_eq!(events, vec![OutputEvent::Text("done".to_string())]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(*priors.lock().unwrap(), vec![0, 2]);
    }

    #[tokio::test]
    async fn test_function_call_after_text_is_plain_text() {
        let source = EventSource::from_values(vec![
            content("Sure. "),
            call_name("get_weather"),
            call_args("{}"),
            finish("function_call"),
        ]);
        let stream = FunctionCallStream::new(source);
        let text: String = ok_events(collect(stream).await)
            .iter()
            .filter_map(|event| event.as_text().map(str::to_string))
            .collect();

        assert_eq!(
            text,
            r#"Sure. {"function_call": {"name": "get_weather", "arguments": "{}"}}"#
        );
    }

    #[tokio::test]
    async fn test_unterminated_call_is_emitted_raw() {
        let recorder = Arc::new(Recorder::default());
        let source = EventSource::from_values(vec![call_name("f"), call_args("{\"a\":1}")]);
        let stream = FunctionCallStream::new(source)
            .with_callbacks(recorder.callbacks())
            .with_handler(|_call: FunctionCallPayload, _messages: MessageBuilder| async move {
                anyhow::Ok(FunctionCallOutcome::Text("unreachable".to_string()))
            });

        let events = ok_events(collect(stream).await);

        assert_eq!(
            events,
            vec![OutputEvent::FunctionCall(Value::String(
                r#"{"function_call": {"name": "f", "arguments": "{\"a\":1}"#.to_string()
            ))]
        );
        assert_eq!(recorder.finals().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_arguments_are_emitted_raw() {
        let source = EventSource::from_values(vec![
            call_name("f"),
            call_args("{not json"),
            finish("function_call"),
        ]);
        let events = ok_events(collect(FunctionCallStream::new(source)).await);

        assert!(matches!(&events[..], [OutputEvent::FunctionCall(Value::String(_))]));
    }

    #[tokio::test]
    async fn test_handler_failure_ends_stream_and_finalizes() {
        let recorder = Arc::new(Recorder::default());
        let handler = |_call: FunctionCallPayload, _messages: MessageBuilder| async move {
            Err::<FunctionCallOutcome, _>(anyhow::anyhow!("weather service down"))
        };

        let stream = FunctionCallStream::new(EventSource::from_values(weather_call()))
            .with_callbacks(recorder.callbacks())
            .with_handler(handler);
        let items = collect(stream).await;

        assert_eq!(items.len(), 1);
        assert!(matches!(&items[0], Err(StreamError::Handler(msg)) if msg.contains("weather service down")));
        let finals = recorder.finals();
        assert_eq!(finals.len(), 1);
        assert!(finals[0].starts_with(FUNCTION_CALL_PREFIX));
    }

    #[tokio::test]
    async fn test_classification_error_is_fatal() {
        let recorder = Arc::new(Recorder::default());
        let source = EventSource::from_values(vec![
            content("Hi"),
            json!({"error": "bad"}),
            content("never"),
        ]);
        let stream = FunctionCallStream::new(source).with_callbacks(recorder.callbacks());
        let items = collect(stream).await;

        assert_eq!(items.len(), 2);
        assert!(matches!(items[1], Err(StreamError::Classification(_))));
        assert_eq!(recorder.finals(), vec!["Hi"]);
    }

    #[tokio::test]
    async fn test_cancellation_releases_upstream_and_finalizes() {
        let recorder = Arc::new(Recorder::default());
        let (source, released) = tracked(vec![content("Hel"), content("lo")], true);
        let mut stream = FunctionCallStream::new(source).with_callbacks(recorder.callbacks());

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first, OutputEvent::Text("Hel".to_string()));
        assert!(!released.load(Ordering::SeqCst));

        drop(stream);

        assert!(released.load(Ordering::SeqCst));
        assert_eq!(recorder.finals(), vec!["Hel"]);
    }

    #[test]
    fn test_open_upstream_stays_pending() {
        let (source, released) = tracked(vec![content("  ")], true);
        let mut stream = tokio_test::task::spawn(FunctionCallStream::new(source));

        tokio_test::assert_pending!(stream.poll_next());
        assert!(!released.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_upstream_released_when_exhausted() {
        let (source, released) = tracked(vec![content("a"), finish("stop")], false);
        let mut stream = FunctionCallStream::new(source);

        while stream.next().await.is_some() {}

        assert!(released.load(Ordering::SeqCst));
        assert_eq!(stream.continuations(), 0);
    }

    #[tokio::test]
    async fn test_drop_before_poll_still_finalizes() {
        let recorder = Arc::new(Recorder::default());
        let stream = FunctionCallStream::new(EventSource::from_values(vec![content("x")]))
            .with_callbacks(recorder.callbacks());

        drop(stream);

        assert_eq!(recorder.starts.load(Ordering::SeqCst), 0);
        assert_eq!(recorder.finals(), vec![""]);
    }
}
