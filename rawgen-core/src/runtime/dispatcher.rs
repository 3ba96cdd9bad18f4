//! Dispatcher implementation.
//!
//! The dispatcher turns a raw prompt into exactly one backend call and a
//! classified `GenerationResult`, keeping the state machine and the output
//! sink consistent whatever happens in between.

use crate::error::GenError;
use crate::host::{HostRuntime, Output, OutputSink, TracingSink};
use crate::layer::Layer;
use crate::registry::BackendRegistry;
use crate::settings::{ApiMode, GeneratorSettings, MemorySettingsStore, SettingsStore};
use crate::state::StateMachine;
use crate::transport::Transport;
use crate::types::*;
use std::sync::Arc;
use tracing::Instrument;

/// Type-erased transport that can be shared across threads
type BoxedTransport = Arc<dyn Transport>;

pub const EMPTY_PROMPT_WARNING: &str = "Please enter a prompt.";
pub const EMPTY_RESULT_NOTICE: &str = "Generation succeeded, but no text could be extracted.";
pub const CANCELLED_NOTICE: &str = "Generation cancelled.";

/// Builder for composing a dispatcher.
///
/// Layers wrap the transport with static dispatch while building; the
/// finished dispatcher holds a single type-erased transport.
///
/// # Example
///
/// ```ignore
/// let dispatcher = Dispatcher::builder(HttpTransport::new())
///     .layer(LoggingLayer::new())
///     .registry(rawgen_backend::default_registry("http://127.0.0.1:5000/v1"))
///     .host(Arc::new(host))
///     .sink(Arc::new(sink))
///     .finish()?;
/// ```
pub struct DispatcherBuilder<T> {
    transport: T,
    registry: BackendRegistry,
    host: Option<Arc<dyn HostRuntime>>,
    settings: Option<Arc<dyn SettingsStore>>,
    sink: Option<Arc<dyn OutputSink>>,
}

impl<T: Transport> DispatcherBuilder<T> {
    /// Create a new builder with a transport
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            registry: BackendRegistry::new(),
            host: None,
            settings: None,
            sink: None,
        }
    }

    /// Add a layer to wrap the transport
    pub fn layer<L>(self, layer: L) -> DispatcherBuilder<L::LayeredTransport>
    where
        L: Layer<T>,
    {
        DispatcherBuilder {
            transport: layer.layer(self.transport),
            registry: self.registry,
            host: self.host,
            settings: self.settings,
            sink: self.sink,
        }
    }

    /// Set the backend registry
    pub fn registry(mut self, registry: BackendRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Set the host runtime (required)
    pub fn host(mut self, host: Arc<dyn HostRuntime>) -> Self {
        self.host = Some(host);
        self
    }

    /// Set the settings store; defaults to an empty in-memory store
    pub fn settings(mut self, settings: Arc<dyn SettingsStore>) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Set the output sink; defaults to logging only
    pub fn sink(mut self, sink: Arc<dyn OutputSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Finish building and create a Dispatcher
    pub fn finish(self) -> Result<Dispatcher, GenError> {
        let host = self
            .host
            .ok_or_else(|| GenError::configuration("host runtime is required"))?;

        if self.registry.backends().is_empty() {
            tracing::warn!("dispatcher built with an empty backend registry");
        }

        Ok(Dispatcher {
            transport: Arc::new(self.transport),
            registry: self.registry,
            host,
            settings: self
                .settings
                .unwrap_or_else(|| Arc::new(MemorySettingsStore::new())),
            sink: self.sink.unwrap_or_else(|| Arc::new(TracingSink)),
            state: StateMachine::new(),
        })
    }
}

/// Dispatch controller.
///
/// Owns the generation state and the output sink; `submit` is the only
/// entry point.
pub struct Dispatcher {
    transport: BoxedTransport,
    registry: BackendRegistry,
    host: Arc<dyn HostRuntime>,
    settings: Arc<dyn SettingsStore>,
    sink: Arc<dyn OutputSink>,
    state: StateMachine,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("backends", &self.registry.backends())
            .field("state", &self.state.current())
            .finish()
    }
}

impl Dispatcher {
    /// Create a new builder
    pub fn builder<T: Transport>(transport: T) -> DispatcherBuilder<T> {
        DispatcherBuilder::new(transport)
    }

    /// Current generation state
    pub fn state(&self) -> GenerationState {
        self.state.current()
    }

    /// Submit a raw prompt.
    ///
    /// Returns `Err` when the submission is not accepted: an empty prompt,
    /// an unregistered backend, or another submission still in flight.
    /// Nothing touches the network in those cases and the state is left
    /// as it was. Accepted submissions always settle in a terminal state
    /// and come back as `Ok`.
    pub async fn submit(&self, prompt: &str) -> Result<GenerationResult, GenError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            tracing::warn!("empty prompt rejected");
            self.sink
                .render(Output::Warning(EMPTY_PROMPT_WARNING.to_string()));
            return Err(GenError::validation("prompt is empty"));
        }

        let settings = GeneratorSettings::load(self.settings.as_ref());
        let backend = match settings.api_mode {
            ApiMode::Host => self.host.current_backend(),
            ApiMode::Custom => BackendId::Custom,
        };
        if !self.registry.contains(backend) {
            tracing::warn!(%backend, "no adapter registered");
            let err = GenError::from(backend);
            self.sink.render(Output::Warning(format!(
                "No adapter is registered for the {} backend.",
                backend
            )));
            return Err(err);
        }

        let Some(in_flight) = self.state.begin(self.sink.as_ref()) else {
            tracing::warn!("generation already in progress, submission rejected");
            return Err(GenError::Busy);
        };
        self.sink.render(Output::Progress);

        let mut request = GenerationRequest::new(prompt, backend)
            .with_cancel(self.host.cancellation_token().child_token());
        if settings.api_mode == ApiMode::Custom {
            request.override_endpoint = Some(settings.custom_api_url);
            request.credential = settings.custom_api_key;
        }

        let span = tracing::info_span!(
            "generation",
            request_id = %uuid::Uuid::new_v4(),
            backend = %backend,
        );
        let result = self.run(&request).instrument(span).await;

        self.render(&result);
        in_flight.finish(&result);
        Ok(result)
    }

    async fn run(&self, request: &GenerationRequest) -> GenerationResult {
        match self.execute(request).await {
            Ok(Some(text)) => {
                tracing::info!(chars = text.len(), "generation succeeded");
                GenerationResult::Succeeded { text }
            }
            Ok(None) => {
                tracing::info!("generation succeeded without extractable text");
                GenerationResult::EmptyResult
            }
            Err(GenError::Cancelled) => {
                tracing::info!("generation cancelled");
                GenerationResult::Cancelled
            }
            Err(err) => {
                tracing::error!("generation failed: {}", err);
                GenerationResult::from_error(&err)
            }
        }
    }

    async fn execute(&self, request: &GenerationRequest) -> Result<Option<String>, GenError> {
        let adapter = self.registry.lookup(request.backend)?;
        let params = self.host.generation_params();

        let mut payload = adapter.build_payload(request, &params)?;
        payload.merge_ambient(self.host.ambient_headers());
        tracing::debug!(endpoint = %payload.endpoint, "sending generation request");

        // Whichever side loses the race is dropped, so a late response is never observed.
        let body = tokio::select! {
            biased;
            _ = request.cancel.cancelled() => return Err(GenError::Cancelled),
            body = self.transport.send(payload, &request.cancel) => body?,
        };

        Ok(adapter.extract(&body))
    }

    fn render(&self, result: &GenerationResult) {
        let output = match result {
            GenerationResult::Succeeded { text } => Output::Markup(self.host.format(text)),
            GenerationResult::EmptyResult => Output::Notice(EMPTY_RESULT_NOTICE.to_string()),
            GenerationResult::Failed { message, .. } => {
                Output::Error(format!("API call failed. Error: {}", message))
            }
            GenerationResult::Cancelled => Output::Notice(CANCELLED_NOTICE.to_string()),
        };
        self.sink.render(output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::BackendAdapter;
    use crate::extract::{self, extract_text};
    use crate::host::StaticHost;
    use crate::settings::{API_MODE_KEY, CUSTOM_API_URL_KEY};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Notify;
    use tokio_util::sync::CancellationToken;

    #[derive(Debug)]
    struct TestAdapter(BackendId);

    impl BackendAdapter for TestAdapter {
        fn backend(&self) -> BackendId {
            self.0
        }

        fn build_payload(
            &self,
            req: &GenerationRequest,
            _params: &GenerationParams,
        ) -> Result<Payload, GenError> {
            let endpoint = match self.0 {
                BackendId::Custom => req
                    .endpoint()
                    .ok_or_else(|| GenError::validation("custom endpoint is not configured"))?,
                _ => "http://backend.test/generate",
            };
            Ok(Payload::json(endpoint, json!({ "prompt": req.prompt }))
                .with_header("X-Adapter", "test"))
        }

        fn extract(&self, body: &ResponseBody) -> Option<String> {
            extract_text(body, &[extract::CHOICE_MESSAGE, extract::TEXT])
        }
    }

    #[derive(Debug, Clone)]
    enum Reply {
        Body(ResponseBody),
        Status(u16, &'static str),
    }

    /// Transport that answers from a script and can be held open.
    #[derive(Debug)]
    struct ScriptedTransport {
        reply: Reply,
        calls: AtomicUsize,
        sent: Mutex<Vec<Payload>>,
        entered: Notify,
        gate: Option<Notify>,
    }

    impl ScriptedTransport {
        fn new(reply: Reply) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
                sent: Mutex::new(Vec::new()),
                entered: Notify::new(),
                gate: None,
            }
        }

        fn gated(reply: Reply) -> Self {
            Self {
                gate: Some(Notify::new()),
                ..Self::new(reply)
            }
        }
    }

    #[async_trait]
    impl Transport for Arc<ScriptedTransport> {
        async fn send(
            &self,
            payload: Payload,
            _cancel: &CancellationToken,
        ) -> Result<ResponseBody, GenError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.sent.lock().unwrap().push(payload);
            self.entered.notify_one();
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            match &self.reply {
                Reply::Body(body) => Ok(body.clone()),
                Reply::Status(status, message) => Err(GenError::http(*status, *message)),
            }
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Busy(bool),
        Render(Output),
    }

    #[derive(Debug, Default)]
    struct RecordingSink(Mutex<Vec<Event>>);

    impl RecordingSink {
        fn events(&self) -> Vec<Event> {
            self.0.lock().unwrap().clone()
        }
    }

    impl OutputSink for RecordingSink {
        fn set_busy(&self, busy: bool) {
            self.0.lock().unwrap().push(Event::Busy(busy));
        }

        fn render(&self, output: Output) {
            self.0.lock().unwrap().push(Event::Render(output));
        }
    }

    fn registry() -> BackendRegistry {
        BackendRegistry::new()
            .with(TestAdapter(BackendId::Chat))
            .with(TestAdapter(BackendId::Custom))
    }

    fn dispatcher(
        transport: &Arc<ScriptedTransport>,
        host: StaticHost,
        sink: &Arc<RecordingSink>,
    ) -> Dispatcher {
        Dispatcher::builder(transport.clone())
            .registry(registry())
            .host(Arc::new(host))
            .sink(sink.clone())
            .finish()
            .unwrap()
    }

    fn chat_reply(text: &str) -> Reply {
        Reply::Body(ResponseBody::Json(
            json!({"choices": [{"message": {"content": text}}]}),
        ))
    }

    #[tokio::test]
    async fn success_goes_through_in_flight_once() {
        let transport = Arc::new(ScriptedTransport::new(chat_reply("hello")));
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = dispatcher(&transport, StaticHost::new(BackendId::Chat), &sink);

        let result = dispatcher.submit("  say hi ").await.unwrap();

        assert_eq!(
            result,
            GenerationResult::Succeeded {
                text: "hello".to_string()
            }
        );
        assert_eq!(dispatcher.state(), GenerationState::Succeeded);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            sink.events(),
            vec![
                Event::Busy(true),
                Event::Render(Output::Progress),
                Event::Render(Output::Markup("hello".to_string())),
                Event::Busy(false),
            ]
        );
        assert_eq!(
            transport.sent.lock().unwrap()[0].body,
            json!({"prompt": "say hi"})
        );
    }

    #[tokio::test]
    async fn blank_prompt_never_reaches_transport() {
        let transport = Arc::new(ScriptedTransport::new(chat_reply("unused")));
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = dispatcher(&transport, StaticHost::new(BackendId::Chat), &sink);

        for prompt in ["", "   ", "\n\t"] {
            let err = dispatcher.submit(prompt).await.unwrap_err();
            assert!(matches!(err, GenError::Validation(_)));
        }

        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
        assert_eq!(dispatcher.state(), GenerationState::Idle);
        assert!(sink.events().iter().all(|e| !matches!(e, Event::Busy(_))));
    }

    #[tokio::test]
    async fn unregistered_backend_is_rejected_before_transport() {
        let transport = Arc::new(ScriptedTransport::new(chat_reply("unused")));
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = dispatcher(&transport, StaticHost::new(BackendId::Completion), &sink);

        let err = dispatcher.submit("prompt").await.unwrap_err();

        assert!(matches!(err, GenError::UnsupportedBackend(_)));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
        assert_eq!(dispatcher.state(), GenerationState::Idle);
        assert_eq!(
            sink.events(),
            vec![Event::Render(Output::Warning(
                "No adapter is registered for the completion backend.".to_string()
            ))]
        );
    }

    #[tokio::test]
    async fn blank_custom_endpoint_fails_without_transport() {
        let transport = Arc::new(ScriptedTransport::new(chat_reply("unused")));
        let sink = Arc::new(RecordingSink::default());
        let settings = MemorySettingsStore::new()
            .with(API_MODE_KEY, "custom")
            .with(CUSTOM_API_URL_KEY, "   ");
        let dispatcher = Dispatcher::builder(transport.clone())
            .registry(registry())
            .host(Arc::new(StaticHost::new(BackendId::Chat)))
            .settings(Arc::new(settings))
            .sink(sink.clone())
            .finish()
            .unwrap();

        let result = dispatcher.submit("prompt").await.unwrap();

        assert!(matches!(
            result,
            GenerationResult::Failed {
                kind: FailureKind::Validation,
                ..
            }
        ));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
        assert_eq!(dispatcher.state(), GenerationState::Failed);
        assert_eq!(sink.events().last(), Some(&Event::Busy(false)));
    }

    #[tokio::test]
    async fn http_error_is_classified() {
        let transport = Arc::new(ScriptedTransport::new(Reply::Status(500, "x")));
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = dispatcher(&transport, StaticHost::new(BackendId::Chat), &sink);

        let result = dispatcher.submit("prompt").await.unwrap();

        assert_eq!(
            result,
            GenerationResult::Failed {
                kind: FailureKind::Http { status: 500 },
                message: "x".to_string(),
            }
        );
        assert_eq!(dispatcher.state(), GenerationState::Failed);
        assert!(sink
            .events()
            .contains(&Event::Render(Output::Error("API call failed. Error: x".to_string()))));
    }

    #[tokio::test]
    async fn unrecognized_body_is_empty_result_not_failure() {
        let transport = Arc::new(ScriptedTransport::new(Reply::Body(ResponseBody::Json(
            json!({"id": "cmpl-1", "usage": {"total_tokens": 3}}),
        ))));
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = dispatcher(&transport, StaticHost::new(BackendId::Chat), &sink);

        let result = dispatcher.submit("prompt").await.unwrap();

        assert_eq!(result, GenerationResult::EmptyResult);
        assert_eq!(dispatcher.state(), GenerationState::Succeeded);
        assert!(sink
            .events()
            .contains(&Event::Render(Output::Notice(EMPTY_RESULT_NOTICE.to_string()))));
    }

    #[tokio::test]
    async fn ambient_headers_are_merged_under_adapter_headers() {
        let transport = Arc::new(ScriptedTransport::new(chat_reply("ok")));
        let sink = Arc::new(RecordingSink::default());
        let host = StaticHost::new(BackendId::Chat)
            .with_header("X-CSRF-Token", "csrf")
            .with_header("x-adapter", "host");
        let dispatcher = dispatcher(&transport, host, &sink);

        dispatcher.submit("prompt").await.unwrap();

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent[0].headers["X-CSRF-Token"], "csrf");
        assert_eq!(sent[0].headers["X-Adapter"], "test");
        assert!(!sent[0].headers.contains_key("x-adapter"));
    }

    #[tokio::test]
    async fn cancellation_wins_and_late_reply_is_discarded() {
        let transport = Arc::new(ScriptedTransport::gated(chat_reply("too late")));
        let sink = Arc::new(RecordingSink::default());
        let cancel = CancellationToken::new();
        let host = StaticHost::new(BackendId::Chat).with_cancel(cancel.clone());
        let dispatcher = Arc::new(dispatcher(&transport, host, &sink));

        let running = {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move { dispatcher.submit("prompt").await })
        };

        transport.entered.notified().await;
        assert_eq!(dispatcher.state(), GenerationState::InFlight);
        cancel.cancel();

        let result = running.await.unwrap().unwrap();
        assert_eq!(result, GenerationResult::Cancelled);
        assert_eq!(dispatcher.state(), GenerationState::Failed);
        let settled = sink.events();

        if let Some(gate) = &transport.gate {
            gate.notify_one();
        }
        tokio::task::yield_now().await;

        assert_eq!(sink.events(), settled);
        assert_eq!(dispatcher.state(), GenerationState::Failed);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert!(settled.contains(&Event::Render(Output::Notice(CANCELLED_NOTICE.to_string()))));
        assert_eq!(settled.last(), Some(&Event::Busy(false)));
    }

    #[tokio::test]
    async fn second_submit_while_in_flight_is_rejected() {
        let transport = Arc::new(ScriptedTransport::gated(chat_reply("first")));
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = Arc::new(dispatcher(&transport, StaticHost::new(BackendId::Chat), &sink));

        let first = {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move { dispatcher.submit("one").await })
        };
        transport.entered.notified().await;

        let err = dispatcher.submit("two").await.unwrap_err();
        assert!(matches!(err, GenError::Busy));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);

        let gate = transport.gate.as_ref().unwrap();
        gate.notify_one();
        let result = first.await.unwrap().unwrap();
        assert!(matches!(result, GenerationResult::Succeeded { .. }));
        assert_eq!(dispatcher.state(), GenerationState::Succeeded);

        // Next submission runs the full sequence again.
        gate.notify_one();
        let again = dispatcher.submit("three").await.unwrap();
        assert!(matches!(again, GenerationResult::Succeeded { .. }));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);

        let busy: Vec<_> = sink
            .events()
            .into_iter()
            .filter(|e| matches!(e, Event::Busy(_)))
            .collect();
        assert_eq!(
            busy,
            vec![
                Event::Busy(true),
                Event::Busy(false),
                Event::Busy(true),
                Event::Busy(false)
            ]
        );
    }

    #[tokio::test]
    async fn dropped_submission_releases_busy() {
        let transport = Arc::new(ScriptedTransport::gated(chat_reply("never")));
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = dispatcher(&transport, StaticHost::new(BackendId::Chat), &sink);

        let outcome = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            dispatcher.submit("prompt"),
        )
        .await;

        assert!(outcome.is_err());
        assert_eq!(dispatcher.state(), GenerationState::Failed);
        assert_eq!(sink.events().last(), Some(&Event::Busy(false)));
    }

    #[test]
    fn finish_requires_host() {
        let transport = Arc::new(ScriptedTransport::new(chat_reply("unused")));
        let err = Dispatcher::builder(transport).finish().unwrap_err();
        assert!(matches!(err, GenError::Configuration(_)));
    }
}
