//! Per-request inputs and the response draft.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Read-only view of the incoming request, as seen by content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Upper-case HTTP method.
    pub method: String,
    /// Request path, without the query string.
    pub path: String,
    /// Decoded query parameters (last value wins).
    pub query: Map<String, Value>,
    /// Header values keyed by lower-case name.
    pub headers: Map<String, Value>,
    /// Parsed body: JSON, form fields, text, or null.
    pub body: Value,
    /// Files from a multipart body, keyed by form field name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub files: BTreeMap<String, UploadedFile>,
}

/// One file part of a `multipart/form-data` body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Form field the file was sent under.
    pub field: String,
    /// File name supplied by the client.
    pub filename: String,
    /// Declared content type, if any.
    pub content_type: Option<String>,
    /// Size in bytes.
    pub size: usize,
    /// Raw contents.
    pub data: Vec<u8>,
}

impl RequestContext {
    /// Context for a bodiless request.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into().to_uppercase(),
            path: path.into(),
            body: Value::Null,
            ..Self::default()
        }
    }

    /// JSON view handed to scripts and templates.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Opaque session object.
///
/// Populating and persisting it belongs to outer middleware, which can place
/// one in the request extensions; content only ever reads it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionState(pub Map<String, Value>);

impl SessionState {
    /// JSON view handed to scripts and templates.
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

/// Everything code artifacts wrote to the outgoing response.
///
/// Status and headers apply to whatever response the cascade ends up
/// producing; once `finalized` is set the body is final and the resolver
/// emits the draft as-is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseDraft {
    /// Status code override.
    pub status: Option<u16>,
    /// Extra headers, in the order they were set.
    pub headers: Vec<(String, String)>,
    /// Content type chosen by the script.
    pub content_type: Option<String>,
    /// Body written by the script.
    pub body: Option<String>,
    /// Set once a script sent, redirected or ended the response.
    pub finalized: bool,
}

impl ResponseDraft {
    /// Replace any header with the same (case-insensitive) name.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
    }

    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
