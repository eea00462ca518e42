//! Thin adapter between HTTP requests/responses and the CloudEvents model.
//!
//! Decoding supports both content modes of the HTTP protocol binding:
//! structured (`application/cloudevents+json` bodies, decoded through the
//! SDK's canonical serde representation) and binary (`ce-*` attribute
//! headers with the raw body as event data). Responses are always emitted
//! in structured mode.

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use chrono::{DateTime, Utc};
use cloudevents::event::{EventBuilderError, ExtensionValue};
use cloudevents::{Event, EventBuilder, EventBuilderV10};
use thiserror::Error;

/// Media type of structured-mode CloudEvents bodies.
pub const CLOUDEVENTS_JSON: &str = "application/cloudevents+json";

/// Header prefix carrying event attributes in binary content mode.
const CE_PREFIX: &str = "ce-";

/// Errors raised while decoding an HTTP request into an event.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The structured-mode body was not a valid CloudEvents JSON object.
    #[error("malformed structured-mode payload: {0}")]
    Structured(#[from] serde_json::Error),

    /// A required binary-mode attribute header was absent.
    #[error("missing required attribute header: {0}")]
    MissingAttribute(&'static str),

    /// An attribute header carried bytes that are not valid UTF-8.
    #[error("attribute header {0} is not valid UTF-8")]
    NonUtf8Attribute(String),

    /// The event declared a spec version this receiver does not handle.
    #[error("unsupported specversion: {0}")]
    UnsupportedSpecVersion(String),

    /// The `ce-time` header was not a valid RFC 3339 timestamp.
    #[error("malformed time attribute: {0}")]
    Time(#[from] chrono::ParseError),

    /// The collected attributes did not assemble into a valid event.
    #[error("event assembly failed: {0}")]
    Build(#[from] EventBuilderError),
}

/// Decodes an HTTP request into an event.
///
/// A body with an `application/cloudevents+json` content type is treated
/// as structured mode; anything else is treated as binary mode.
pub fn to_event(headers: &HeaderMap, body: &[u8]) -> Result<Event, DecodeError> {
    if content_type(headers).is_some_and(|ct| ct.starts_with(CLOUDEVENTS_JSON)) {
        return Ok(serde_json::from_slice(body)?);
    }
    binary_to_event(headers, body)
}

/// Serializes `event` as a structured-mode HTTP response.
pub fn to_response(event: &Event) -> Response {
    match serde_json::to_vec(event) {
        Ok(body) => {
            let mut response = Response::new(Body::from(body));
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(CLOUDEVENTS_JSON),
            );
            response
        }
        Err(e) => {
            tracing::error!("failed to serialize response event: {e}");
            let mut response = Response::new(Body::empty());
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    }
}

fn binary_to_event(headers: &HeaderMap, body: &[u8]) -> Result<Event, DecodeError> {
    let specversion = required(headers, "ce-specversion")?;
    if specversion != "1.0" {
        return Err(DecodeError::UnsupportedSpecVersion(specversion.to_string()));
    }

    let mut builder = EventBuilderV10::new()
        .id(required(headers, "ce-id")?)
        .source(required(headers, "ce-source")?)
        .ty(required(headers, "ce-type")?);

    if let Some(time) = optional(headers, "ce-time")? {
        builder = builder.time(DateTime::parse_from_rfc3339(time)?.with_timezone(&Utc));
    }
    if let Some(subject) = optional(headers, "ce-subject")? {
        builder = builder.subject(subject);
    }

    for (name, value) in headers {
        let Some(ext) = name.as_str().strip_prefix(CE_PREFIX) else {
            continue;
        };
        if matches!(
            ext,
            "specversion" | "id" | "source" | "type" | "time" | "subject" | "dataschema"
        ) {
            continue;
        }
        let value = value
            .to_str()
            .map_err(|_| DecodeError::NonUtf8Attribute(name.as_str().to_string()))?;
        builder = builder.extension(ext, ExtensionValue::String(value.to_string()));
    }

    if !body.is_empty() {
        let datacontenttype = content_type(headers).unwrap_or("application/json").to_string();
        builder = match optional(headers, "ce-dataschema")? {
            Some(schema) => builder.data_with_schema(datacontenttype, schema, body.to_vec()),
            None => builder.data(datacontenttype, body.to_vec()),
        };
    }

    Ok(builder.build()?)
}

fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
}

fn required<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, DecodeError> {
    optional(headers, name)?.ok_or(DecodeError::MissingAttribute(name))
}

fn optional<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, DecodeError> {
    match headers.get(name) {
        Some(value) => value
            .to_str()
            .map(Some)
            .map_err(|_| DecodeError::NonUtf8Attribute(name.to_string())),
        None => Ok(None),
    }
}
