use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use slavarr::api::{AppState, router};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    router(Arc::new(AppState::new(None)))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_webhook_acknowledges_event() {
    let response = app()
        .oneshot(post(r#"{"eventType":"Grab","movie":{"id":1}}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["received"], true);
    assert_eq!(json["event"], "Grab");
}

#[tokio::test]
async fn test_webhook_without_event_type() {
    let response = app().oneshot(post(r#"{"series":{}}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["event"], "unknown");
}

#[tokio::test]
async fn test_webhook_rejects_invalid_json() {
    let response = app().oneshot(post("not json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid JSON body");
}

#[tokio::test]
async fn test_healthz_and_metrics() {
    let app = app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["ok"], true);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"Metrics not enabled or failed to initialize");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let mut request = post(r#"{"eventType":"Test"}"#);
    request
        .headers_mut()
        .insert("x-request-id", "abc-123".parse().unwrap());

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");

    let response = app().oneshot(post("{}")).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}
