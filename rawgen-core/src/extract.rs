//! Response text extraction helpers.
//!
//! Backends disagree on where the generated text lives. Each adapter lists
//! the [`TextPath`]s it understands in priority order and [`extract_text`]
//! returns the first one that yields non-blank text.

use crate::types::ResponseBody;
use serde_json::Value;

/// One step into a JSON document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Key(&'static str),
    Index(usize),
}

/// A location in a response document that may carry generated text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextPath(pub &'static [Segment]);

use Segment::{Index, Key};

/// `{"text": ".."}`
pub const TEXT: TextPath = TextPath(&[Key("text")]);
/// `{"content": ".."}`
pub const CONTENT: TextPath = TextPath(&[Key("content")]);
/// `{"response": ".."}`
pub const RESPONSE: TextPath = TextPath(&[Key("response")]);
/// `{"output": ".."}`
pub const OUTPUT: TextPath = TextPath(&[Key("output")]);
/// `{"message": ".."}`
pub const MESSAGE: TextPath = TextPath(&[Key("message")]);
/// `{"choices": [{"message": {"content": ".."}}]}`
pub const CHOICE_MESSAGE: TextPath =
    TextPath(&[Key("choices"), Index(0), Key("message"), Key("content")]);
/// `{"choices": [{"text": ".."}]}`
pub const CHOICE_TEXT: TextPath = TextPath(&[Key("choices"), Index(0), Key("text")]);
/// `{"results": [{"text": ".."}]}`
pub const RESULT_TEXT: TextPath = TextPath(&[Key("results"), Index(0), Key("text")]);
/// `{"content": [{"text": ".."}]}`
pub const CONTENT_BLOCK: TextPath = TextPath(&[Key("content"), Index(0), Key("text")]);
/// `{"message": {"content": [{"text": ".."}]}}`
pub const MESSAGE_BLOCK: TextPath =
    TextPath(&[Key("message"), Key("content"), Index(0), Key("text")]);
/// `{"message": {"content": ".."}}`
pub const MESSAGE_CONTENT: TextPath = TextPath(&[Key("message"), Key("content")]);

impl TextPath {
    /// Follow the path and return the string found there, if any
    pub fn resolve<'a>(&self, value: &'a Value) -> Option<&'a str> {
        self.0
            .iter()
            .try_fold(value, |current, segment| match segment {
                Key(key) => current.get(*key),
                Index(index) => current.get(*index),
            })?
            .as_str()
    }
}

/// Extract text from a body using the given lookup order.
///
/// Bare strings (plain-text bodies or a JSON string) are taken as-is.
/// Blank text counts as no text.
pub fn extract_text(body: &ResponseBody, paths: &[TextPath]) -> Option<String> {
    let text = match body {
        ResponseBody::Text(text) => Some(text.as_str()),
        ResponseBody::Json(Value::String(text)) => Some(text.as_str()),
        ResponseBody::Json(value) => paths
            .iter()
            .filter_map(|path| path.resolve(value))
            .find(|text| !text.trim().is_empty()),
    }?;

    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
