//! The per-event receiver callback and its payload normalization.
//!
//! Every request the dispatcher does not claim lands in
//! [`receive_handler`]: the request is decoded into a CloudEvent, logged,
//! recorded into the shared history, and echoed back with its JSON payload
//! normalized.

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::Extension;
use cloudevents::event::Data;
use cloudevents::{AttributesReader, Event};
use std::sync::Arc;

use crate::codec;
use crate::AppState;

/// Fallback handler wrapping the receiver callback.
///
/// Decode failures and payload normalization failures both map to
/// `400 Bad Request` with an empty body; a normalization failure still
/// leaves the event recorded in the history.
pub async fn receive_handler(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let event = match codec::to_event(&headers, &body) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("rejected undecodable event: {e}");
            return status_only(StatusCode::BAD_REQUEST);
        }
    };

    match handle_event(&state, event) {
        Ok(reply) => codec::to_response(&reply),
        Err(e) => {
            tracing::warn!("event payload failed normalization: {e}");
            status_only(StatusCode::BAD_REQUEST)
        }
    }
}

/// The receiver callback: logs, records, and normalizes one decoded event.
///
/// Recording is synchronous and shares the history's lock with reads, so
/// the event is visible to `/eventz` before the response goes out.
fn handle_event(state: &AppState, event: Event) -> Result<Event, serde_json::Error> {
    tracing::debug!(
        id = %event.id(),
        source = %event.source(),
        ty = %event.ty(),
        "received event"
    );
    println!("\n🚀  received CloudEvent\n{event}");

    state.history.record(event.clone());

    normalize(event)
}

/// Round-trips a JSON payload through a generic decode, re-typing it as
/// JSON data with an `application/json` content type.
///
/// Events declaring a non-JSON content type bypass normalization and are
/// returned unchanged; a declared-JSON payload that fails to parse is an
/// error.
fn normalize(mut event: Event) -> Result<Event, serde_json::Error> {
    if !is_json_content_type(event.datacontenttype()) {
        return Ok(event);
    }

    let value: serde_json::Value = match event.data() {
        Some(Data::Binary(bytes)) => serde_json::from_slice(bytes)?,
        Some(Data::String(s)) => serde_json::from_str(s)?,
        Some(Data::Json(v)) => v.clone(),
        None => return Ok(event),
    };

    event.set_data("application/json", value);
    Ok(event)
}

/// JSON media types per the CloudEvents JSON format: `application/json`,
/// `text/json`, any `+json` suffix, or an undeclared content type.
fn is_json_content_type(datacontenttype: Option<&str>) -> bool {
    match datacontenttype {
        None => true,
        Some(ct) => {
            let essence = ct.split(';').next().unwrap_or(ct).trim();
            essence == "application/json" || essence == "text/json" || essence.ends_with("+json")
        }
    }
}

fn status_only(status: StatusCode) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}
