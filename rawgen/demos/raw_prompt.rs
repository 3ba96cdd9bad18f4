//! Send one raw prompt to an OpenAI-compatible server.
//!
//! ```sh
//! RAWGEN_BASE_URL=http://127.0.0.1:5000/v1 RAWGEN_MODEL=llama3 \
//!     cargo run --example raw_prompt -- "Once upon a time"
//! ```
//!
//! Set `RAWGEN_CUSTOM_URL` (and optionally `RAWGEN_CUSTOM_KEY`) to switch to
//! custom mode and post straight to that URL.

use rawgen::prelude::*;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rawgen=debug,raw_prompt=info".into()),
        )
        .init();

    let prompt = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let base_url =
        std::env::var("RAWGEN_BASE_URL").unwrap_or_else(|_| "http://127.0.0.1:5000/v1".into());
    let model = std::env::var("RAWGEN_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());

    let settings = Arc::new(MemorySettingsStore::new());
    if let Ok(url) = std::env::var("RAWGEN_CUSTOM_URL") {
        let mut generator = GeneratorSettings::load(settings.as_ref());
        generator.api_mode = ApiMode::Custom;
        generator.custom_api_url = url;
        generator.custom_api_key = std::env::var("RAWGEN_CUSTOM_KEY").ok().map(Into::into);
        generator.save(settings.as_ref());
    }

    let host = StaticHost::new(BackendId::Chat).with_params(
        GenerationParams::default()
            .with_model(model)
            .with_max_length(200)
            .with_temperature(0.7),
    );

    let dispatcher = Dispatcher::builder(HttpTransport::new())
        .layer(TimeoutLayer::new(Duration::from_secs(120)))
        .layer(LoggingLayer::new())
        .registry(default_registry(base_url))
        .host(Arc::new(host))
        .settings(settings)
        .finish()?;

    match dispatcher.submit(&prompt).await {
        Ok(GenerationResult::Succeeded { text }) => println!("{}", text),
        Ok(other) => println!("{:?}", other),
        Err(e) => eprintln!("not submitted: {}", e),
    }

    Ok(())
}
