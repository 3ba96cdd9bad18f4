//! Chat-style backend using async-openai request types.
//!
//! The prompt becomes a single user-role message; nothing else is added to
//! the conversation.

use crate::{authorize, join_url};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
};
use rawgen_core::adapter::BackendAdapter;
use rawgen_core::error::GenError;
use rawgen_core::extract::{self, extract_text, TextPath};
use rawgen_core::types::*;

/// Lookup order for chat responses
const TEXT_PATHS: &[TextPath] = &[
    extract::CHOICE_MESSAGE,
    extract::CHOICE_TEXT,
    extract::TEXT,
    extract::MESSAGE_BLOCK,
    extract::MESSAGE_CONTENT,
    extract::CONTENT_BLOCK,
];

/// Adapter for OpenAI-compatible `/chat/completions` endpoints
#[derive(Debug, Clone)]
pub struct ChatAdapter {
    base_url: String,
    default_model: Option<String>,
}

impl ChatAdapter {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            default_model: None,
        }
    }

    /// Model used when the host parameters do not name one
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    /// Default endpoint
    pub fn endpoint(&self) -> String {
        join_url(&self.base_url, "chat/completions")
    }

    /// Build CreateChatCompletionRequest from a prompt and host parameters
    fn build_request(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<CreateChatCompletionRequest, GenError> {
        let model = params
            .model
            .as_deref()
            .or(self.default_model.as_deref())
            .ok_or_else(|| GenError::validation("chat backend requires a model name"))?;

        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt.to_string())
            .build()
            .map_err(|e| GenError::validation(format!("Failed to build user message: {}", e)))?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(model)
            .messages(vec![ChatCompletionRequestMessage::User(message)])
            .stream(false);

        if let Some(max_tokens) = params.max_length {
            builder.max_tokens(max_tokens);
        }
        if let Some(temperature) = params.temperature {
            builder.temperature(temperature);
        }
        if let Some(top_p) = params.top_p {
            builder.top_p(top_p);
        }

        builder
            .build()
            .map_err(|e| GenError::validation(format!("Failed to build request: {}", e)))
    }
}

impl BackendAdapter for ChatAdapter {
    fn backend(&self) -> BackendId {
        BackendId::Chat
    }

    fn build_payload(
        &self,
        req: &GenerationRequest,
        params: &GenerationParams,
    ) -> Result<Payload, GenError> {
        let request = self.build_request(&req.prompt, params)?;
        let body = serde_json::to_value(&request)?;
        let endpoint = req
            .endpoint()
            .map(str::to_string)
            .unwrap_or_else(|| self.endpoint());

        tracing::trace!(model = %request.model, "chat payload built");
        Ok(authorize(
            Payload::json(endpoint, body),
            req.credential.as_ref(),
        ))
    }

    fn extract(&self, body: &ResponseBody) -> Option<String> {
        extract_text(body, TEXT_PATHS)
    }
}
