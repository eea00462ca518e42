//! Dispatcher middleware for the reserved service endpoints.
//!
//! Intercepts two fixed request URIs ahead of the CloudEvents receiver:
//! `/healthz` for liveness probes and `/eventz` for dumping the recent
//! event history. Every other request is forwarded unchanged to the
//! inner handler.

use axum::{
    body::Body,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::AppState;

/// HTTP path of the health endpoint used for probing the service.
pub const HEALTHZ_PATH: &str = "/healthz";

/// HTTP path of the event history endpoint used for retrieving recently received events.
pub const EVENTZ_PATH: &str = "/eventz";

/// Serves the two reserved paths ahead of the event receiver.
///
/// Matching is exact string equality on the request URI, regardless of
/// method; `/healthz?verbose=1` is not `/healthz` and falls through.
pub async fn dispatch_middleware(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    match req.uri().path_and_query().map(|pq| pq.as_str()) {
        Some(HEALTHZ_PATH) => Ok(healthz()),
        Some(EVENTZ_PATH) => {
            let state = req
                .extensions()
                .get::<Arc<AppState>>()
                .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?
                .clone();
            Ok(eventz(&state))
        }
        _ => Ok(next.run(req).await),
    }
}

/// `204 No Content`, empty body. No side effects, never fails.
fn healthz() -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;
    response
}

/// `200 OK` with the history snapshot as a JSON array of events, or `500`
/// with an empty body if the snapshot cannot be serialized.
fn eventz(state: &AppState) -> Response {
    match serde_json::to_vec(&state.history.snapshot()) {
        Ok(body) => {
            let mut response = Response::new(Body::from(body));
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
            response
        }
        Err(e) => {
            tracing::error!("failed to serialize event history: {e}");
            let mut response = Response::new(Body::empty());
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cepass_history::EventHistory;
    use cloudevents::{EventBuilder, EventBuilderV10};

    #[test]
    fn healthz_has_no_body() {
        let response = healthz();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[test]
    fn eventz_serializes_the_snapshot() {
        let state = AppState {
            history: EventHistory::new(10),
        };
        state.history.record(
            EventBuilderV10::new()
                .id("e1")
                .ty("dev.cepass.test")
                .source("urn:cepass:tests")
                .build()
                .unwrap(),
        );

        let response = eventz(&state);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
