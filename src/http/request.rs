//! Request handling and extraction.
//!
//! # Responsibilities
//! - Generate unique request IDs (UUID v4)
//! - Turn an axum request into the content-facing `RequestContext`
//! - Parse query strings and bodies (JSON, url-encoded forms, multipart, text)
//! - Pick up a `SessionState` left in the extensions by outer middleware
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Body limit enforced while reading, on top of the Content-Length check
//! - Repeated query or form keys keep the last value
//! - Multipart text fields land in `body`, file parts in `files`

use std::collections::BTreeMap;

use axum::body::Body;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{FromRequest, Multipart};
use axum::http::{header, HeaderMap, HeaderValue, Request, StatusCode};
use serde_json::{Map, Value};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::cascade::context::{RequestContext, SessionState, UploadedFile};

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates a fresh UUID v4 for every request without an ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Request ID from the headers, for log fields.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Error type for request extraction.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Body error: {0}")]
    Body(#[source] axum::Error),
    #[error("Invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),
    #[error("Invalid multipart request: {0}")]
    Boundary(#[from] MultipartRejection),
}

impl RequestError {
    /// Status code sent back for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            RequestError::Body(_) => StatusCode::PAYLOAD_TOO_LARGE,
            RequestError::Json(_) | RequestError::Boundary(_) => StatusCode::BAD_REQUEST,
            RequestError::Multipart(e) => e.status(),
        }
    }
}

/// Build the content-facing view of `request`.
pub async fn extract(
    request: Request<Body>,
    max_body_size: usize,
) -> Result<(RequestContext, SessionState), RequestError> {
    let session = request
        .extensions()
        .get::<SessionState>()
        .cloned()
        .unwrap_or_default();

    let mut context = RequestContext::new(request.method().as_str(), request.uri().path());
    if let Some(query) = request.uri().query() {
        context.query = parse_form(query.as_bytes());
    }
    context.headers = header_map(request.headers());

    if mime_type(request.headers()) == "multipart/form-data" {
        let (fields, files) = read_multipart(request).await?;
        context.body = Value::Object(fields);
        context.files = files;
    } else {
        let (parts, body) = request.into_parts();
        let bytes = axum::body::to_bytes(body, max_body_size)
            .await
            .map_err(RequestError::Body)?;
        context.body = parse_body(&parts.headers, &bytes)?;
    }

    Ok((context, session))
}

/// Split a multipart body into text fields and uploaded files.
///
/// The size cap comes from the `DefaultBodyLimit` set on the router.
async fn read_multipart(
    request: Request<Body>,
) -> Result<(Map<String, Value>, BTreeMap<String, UploadedFile>), RequestError> {
    let mut multipart = Multipart::from_request(request, &()).await?;
    let mut fields = Map::new();
    let mut files = BTreeMap::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().map(str::to_string);
        match filename {
            Some(filename) => {
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?.to_vec();
                files.insert(
                    name.clone(),
                    UploadedFile {
                        field: name,
                        filename,
                        content_type,
                        size: data.len(),
                        data,
                    },
                );
            }
            None => {
                let value = field.text().await?;
                fields.insert(name, Value::String(value));
            }
        }
    }

    Ok((fields, files))
}

/// Decode `a=1&b=2` pairs into a JSON object.
pub fn parse_form(input: &[u8]) -> Map<String, Value> {
    url::form_urlencoded::parse(input)
        .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
        .collect()
}

/// Header values keyed by lower-case name; repeated headers are comma-joined.
fn header_map(headers: &HeaderMap) -> Map<String, Value> {
    let mut map = Map::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        // HeaderName is already lower-case
        match map.get_mut(name.as_str()) {
            Some(Value::String(existing)) => {
                existing.push_str(", ");
                existing.push_str(&value);
            }
            _ => {
                map.insert(name.as_str().to_string(), Value::String(value));
            }
        }
    }
    map
}

/// Lower-case media type without parameters.
fn mime_type(headers: &HeaderMap) -> String {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .unwrap_or_default()
}

fn parse_body(headers: &HeaderMap, bytes: &[u8]) -> Result<Value, RequestError> {
    if bytes.is_empty() {
        return Ok(Value::Null);
    }

    match mime_type(headers).as_str() {
        "application/json" => Ok(serde_json::from_slice(bytes)?),
        "application/x-www-form-urlencoded" => Ok(Value::Object(parse_form(bytes))),
        _ => Ok(Value::String(String::from_utf8_lossy(bytes).into_owned())),
    }
}
