//! Custom-endpoint backend: caller-supplied URL and credential.

use crate::authorize;
use crate::completion::CompletionBody;
use rawgen_core::adapter::BackendAdapter;
use rawgen_core::error::GenError;
use rawgen_core::extract::{self, extract_text, TextPath};
use rawgen_core::types::*;

/// Custom endpoints can answer in any dialect, so every known shape is tried
const TEXT_PATHS: &[TextPath] = &[
    extract::CHOICE_MESSAGE,
    extract::CHOICE_TEXT,
    extract::RESULT_TEXT,
    extract::TEXT,
    extract::CONTENT,
    extract::RESPONSE,
    extract::OUTPUT,
    extract::MESSAGE,
    extract::MESSAGE_CONTENT,
    extract::CONTENT_BLOCK,
    extract::MESSAGE_BLOCK,
];

/// Posts a completion-style body to whatever URL the user configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomAdapter;

impl CustomAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl BackendAdapter for CustomAdapter {
    fn backend(&self) -> BackendId {
        BackendId::Custom
    }

    fn build_payload(
        &self,
        req: &GenerationRequest,
        params: &GenerationParams,
    ) -> Result<Payload, GenError> {
        let endpoint = req
            .endpoint()
            .ok_or_else(|| GenError::validation("custom API URL is not configured"))?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use serde_json::json;

    #[test]
    fn blank_endpoint_is_rejected() {
        for endpoint in [None, Some(""), Some("   ")] {
            let mut req = GenerationRequest::new("prompt", BackendId::Custom);
            req.override_endpoint = endpoint.map(str::to_string);

            let err = CustomAdapter::new()
                .build_payload(&req, &GenerationParams::default())
                .unwrap_err();

            assert!(matches!(err, GenError::Validation(_)));
        }
    }

    #[test]
    fn posts_to_custom_url_with_credential() {
        let req = GenerationRequest::new("prompt", BackendId::Custom)
            .with_endpoint(" https://my.proxy/v1/completions ")
            .with_credential(SecretString::from("key-123"));
        let params = GenerationParams::default().with_max_length(50);

        let payload = CustomAdapter::new().build_payload(&req, &params).unwrap();

        assert_eq!(payload.endpoint, "https://my.proxy/v1/completions");
        assert_eq!(payload.headers["Authorization"], "Bearer key-123");
        assert_eq!(
            payload.body,
            json!({"prompt": "prompt", "max_tokens": 50, "stream": false})
        );
    }

    #[test]
    fn no_credential_no_auth_header() {
        let req = GenerationRequest::new("prompt", BackendId::Custom).with_endpoint("http://h");
        let payload = CustomAdapter::new()
            .build_payload(&req, &GenerationParams::default())
            .unwrap();
        assert!(!payload.headers.contains_key("Authorization"));
    }

    #[test]
    fn extracts_any_known_shape() {
        let adapter = CustomAdapter::new();
        assert_eq!(
            adapter
                .extract(&ResponseBody::Json(json!({"message": "from proxy"})))
                .as_deref(),
            Some("from proxy")
        );
        assert_eq!(
            adapter
                .extract(&ResponseBody::Json(json!({"results": [{"text": "kobold"}]})))
                .as_deref(),
            Some("kobold")
        );
        assert_eq!(
            adapter.extract(&ResponseBody::Json(json!({"status": "ok"}))),
            None
        );
    }
}
