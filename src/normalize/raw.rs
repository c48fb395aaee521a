//! Input shapes after key reconciliation.
//!
//! Every field is optional here; presence and consistency are checked by the
//! normalizer so that all problems are reported together.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ValidationErrors;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawPage {
    pub id: Option<Value>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub objectives: Option<Vec<Value>>,
    pub start_button_text: Option<String>,
    pub audio_id: Option<String>,
    pub caption_id: Option<String>,
    pub image_url: Option<String>,
    pub media: Option<Vec<Value>>,
    pub knowledge_check: Option<Value>,
    /// Assessment only.
    pub questions: Option<Vec<Value>>,
    /// Assessment only.
    pub pass_mark: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawQuestion {
    pub kind: Option<String>,
    pub prompt: Option<String>,
    pub options: Option<Vec<Value>>,
    pub correct_answer: Option<Value>,
    pub explanation: Option<String>,
    pub correct_feedback: Option<String>,
    pub incorrect_feedback: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawMedia {
    pub id: Option<Value>,
    pub kind: Option<String>,
    pub url: Option<String>,
    pub embed_url: Option<String>,
    pub storage_id: Option<String>,
    pub title: Option<String>,
    pub is_youtube: Option<bool>,
}

/// Deserialize a reconciled object, recording a shape error on failure.
pub(crate) fn decode<T: DeserializeOwned>(
    map: Map<String, Value>,
    path: &str,
    page: Option<&str>,
    errors: &mut ValidationErrors,
) -> Option<T> {
    match serde_json::from_value(Value::Object(map)) {
        Ok(value) => Some(value),
        Err(e) => {
            errors.push(path, page, format!("malformed value: {e}"));
            None
        }
    }
}

/// Scalar as trimmed text. Strings, numbers and booleans qualify.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Trimmed, non-empty text.
pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
