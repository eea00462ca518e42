//! Integration tests for the reserved `/healthz` and `/eventz` endpoints.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use cepass_history::EventHistory;
use cepass_server::{app, AppState};
use cloudevents::{AttributesReader, Event, EventBuilder, EventBuilderV10};
use tower::ServiceExt;

fn test_app(limit: usize) -> (axum::Router, EventHistory) {
    let history = EventHistory::new(limit);
    let app = app(AppState {
        history: history.clone(),
    });
    (app, history)
}

fn test_event(id: &str) -> Event {
    EventBuilderV10::new()
        .id(id)
        .ty("dev.cepass.test")
        .source("urn:cepass:tests")
        .data("application/json", serde_json::json!({ "id": id }))
        .build()
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

#[tokio::test]
async fn healthz_returns_no_content() {
    let (app, _) = test_app(100);

    let response = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn healthz_intercepts_any_method() {
    let (app, history) = test_app(100);
    history.record(test_event("e1"));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/healthz")
                .body(Body::from("ignored"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn healthz_with_query_is_not_intercepted() {
    let (app, _) = test_app(100);

    // Matching is on the exact request URI; a query string falls through to
    // the receiver, which rejects the non-event request.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthz?verbose=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn eventz_starts_as_empty_array() {
    let (app, _) = test_app(100);

    let response = app
        .oneshot(Request::builder().uri("/eventz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );

    let events: Vec<Event> = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(events.is_empty());
}

#[tokio::test]
async fn eventz_returns_recorded_events_in_order() {
    let (app, history) = test_app(100);
    for id in ["e1", "e2", "e3"] {
        history.record(test_event(id));
    }

    let response = app
        .oneshot(Request::builder().uri("/eventz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let events: Vec<Event> = serde_json::from_slice(&body_bytes(response).await).unwrap();
    let ids: Vec<&str> = events.iter().map(|e| e.id()).collect();
    assert_eq!(ids, vec!["e1", "e2", "e3"]);
}

#[tokio::test]
async fn eventz_is_bounded_after_150_events() {
    let (app, history) = test_app(100);
    for i in 1..=150 {
        history.record(test_event(&format!("e{i}")));
    }

    let response = app
        .oneshot(Request::builder().uri("/eventz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let events: Vec<Event> = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(events.len(), 100);
    assert_eq!(events.first().unwrap().id(), "e51");
    assert_eq!(events.last().unwrap().id(), "e150");
}
