//! Relay one chat completion to stdout, answering `get_weather` calls
//! with a canned result.
//!
//! ```text
//! OPENAI_API_KEY=sk-... RUST_LOG=relay_ai=debug cargo run --example chat -- "Weather in Oslo?"
//! ```

use relay_ai::prelude::*;
use serde_json::json;
use std::io::Write;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("relay_ai=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let prompt = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "What is the weather in Oslo?".to_string());

    let dispatcher: Arc<dyn Dispatcher> = Arc::new(OpenAIDispatcher::from_env());
    let request = ChatRequest::new("gpt-3.5-turbo-0613", vec![Message::user(prompt)])
        .with_functions(vec![json!({
            "name": "get_weather",
            "description": "Current weather for a city",
            "parameters": {
                "type": "object",
                "properties": {"city": {"type": "string"}},
                "required": ["city"]
            }
        })]);

    let handler = DispatchingHandler::new(dispatcher.clone(), request.clone(), |call| async move {
        match call.name.as_str() {
            "get_weather" => anyhow::Ok(Some(json!({
                "city": call.arguments["city"].clone(),
                "temperature": 4,
                "unit": "celsius"
            }))),
            _ => Ok(None),
        }
    });

    let (data, rx) = StreamData::channel();
    data.append(&json!({"prompt_tokens_hint": request.messages.len()}))?;
    data.close();

    let response = relay(dispatcher.as_ref(), request, |stream| {
        stream
            .with_mode(StreamMode::Envelope)
            .with_handler(handler)
            .with_data(rx)
            .with_callbacks(StreamCallbacks::new().with_on_final(|text| {
                tracing::info!(chars = text.len(), "completion finished");
            }))
    })
    .await;

    if response.is_error() {
        eprintln!("upstream error ({}):", response.status());
    }

    let mut body = response.into_body();
    let mut stdout = std::io::stdout();
    while let Some(chunk) = body.next().await {
        stdout.write_all(&chunk?)?;
        stdout.flush()?;
    }
    writeln!(stdout)?;

    Ok(())
}
