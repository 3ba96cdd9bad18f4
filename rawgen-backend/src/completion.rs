//! Completion-style backend: the prompt is sent verbatim.

use crate::{authorize, join_url};
use rawgen_core::adapter::BackendAdapter;
use rawgen_core::error::GenError;
use rawgen_core::extract::{self, extract_text, TextPath};
use rawgen_core::types::*;
use serde::Serialize;

/// Lookup order for completion responses
const TEXT_PATHS: &[TextPath] = &[
    extract::CHOICE_TEXT,
    extract::RESULT_TEXT,
    extract::TEXT,
    extract::CONTENT,
    extract::RESPONSE,
    extract::OUTPUT,
    extract::CHOICE_MESSAGE,
];

/// Request body shared by completion-style backends
#[derive(Debug, Serialize)]
pub(crate) struct CompletionBody<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    stream: bool,
}

impl<'a> CompletionBody<'a> {
    pub(crate) fn new(prompt: &'a str, params: &'a GenerationParams) -> Self {
        Self {
            prompt,
            model: params.model.as_deref(),
            max_tokens: params.max_length,
            temperature: params.temperature,
            top_p: params.top_p,
            stream: false,
        }
    }

    pub(crate) fn to_json(&self) -> Result<serde_json::Value, GenError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Adapter for OpenAI-style `/completions` endpoints and text-generation
/// servers that speak the same dialect.
#[derive(Debug, Clone)]
pub struct CompletionAdapter {
    base_url: String,
}

impl CompletionAdapter {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Default endpoint
    pub fn endpoint(&self) -> String {
        join_url(&self.base_url, "completions")
    }
}

impl BackendAdapter for CompletionAdapter {
    fn backend(&self) -> BackendId {
        BackendId::Completion
    }

    fn build_payload(
        &self,
        req: &GenerationRequest,
        params: &GenerationParams,
    ) -> Result<Payload, GenError> {
        let endpoint = req
            .endpoint()
            .map(str::to_string)
            .unwrap_or_else(|| self.endpoint());
        let body = CompletionBody::new(&req.prompt, params).to_json()?;

        Ok(authorize(
            Payload::json(endpoint, body),
            req.credential.as_ref(),
        ))
    }

    fn extract(&self, body: &ResponseBody) -> Option<String> {
        extract_text(body, TEXT_PATHS)
    }
}
