//! Response building.
//!
//! # Responsibilities
//! - Turn a `Resolution` into an HTTP response
//! - Apply status, headers and content type written by scripts
//! - Map load errors to 500 and request errors to their status
//!
//! # Design Decisions
//! - Script-written headers that are not valid HTTP are dropped with a warning
//! - Error bodies are fixed strings; details only go to the log

use axum::body::Body;
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::cascade::{ResponseDraft, Resolution};
use crate::http::request::RequestError;

/// Body sent when the cascade fails to load content.
pub const INTERNAL_ERROR: &str = "500 - Internal Server Error";

const HTML: &str = "text/html; charset=utf-8";
const JSON: &str = "application/json";

/// Build the HTTP response for a resolved cascade.
pub fn from_resolution(resolution: Resolution) -> Response {
    match resolution {
        Resolution::Finalized(draft) => {
            let body = draft.body.clone().unwrap_or_default();
            let default_type = if body.is_empty() { None } else { Some(HTML) };
            build(&draft, body, default_type)
        }
        Resolution::NotFound(message) => (StatusCode::NOT_FOUND, message).into_response(),
        Resolution::Json { body, draft } => build(&draft, body, Some(JSON)),
        Resolution::Html { body, draft } => build(&draft, body, Some(HTML)),
    }
}

/// Plain 500 for a failed cascade.
pub fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR).into_response()
}

/// Response for a request that could not be extracted.
pub fn request_error(err: &RequestError) -> Response {
    let status = err.status();
    let body = format!(
        "{} - {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Bad Request")
    );
    (status, body).into_response()
}

fn build(draft: &ResponseDraft, body: String, default_type: Option<&str>) -> Response {
    let status = draft
        .status
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::OK);

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    if let Some(content_type) = draft.content_type.as_deref().or(default_type) {
        if let Ok(value) = HeaderValue::from_str(content_type) {
            headers.insert(header::CONTENT_TYPE, value);
        }
    }
    for (name, value) in &draft.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!(header = %name, "Dropping invalid response header"),
        }
    }

    response
}
