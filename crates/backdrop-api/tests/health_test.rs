//! Probe, OpenAPI and middleware integration tests.

mod helpers;

use helpers::{setup_test_app, setup_test_app_with_key};

#[tokio::test]
async fn test_liveness() {
    let app = setup_test_app().await;
    let response = app.client().get("/live").await;
    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "alive");
}

#[tokio::test]
async fn test_health_reports_removal_configuration() {
    let app = setup_test_app().await;
    let body: serde_json::Value = app.client().get("/health").await.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["removal_configured"], true);

    let app = setup_test_app_with_key(None).await;
    let body: serde_json::Value = app.client().get("/health").await.json();
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["removal_configured"], false);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = setup_test_app().await;
    let response = app.client().get("/api/openapi.json").await;
    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert!(body["paths"]["/api/change-bg"].is_object());
    assert!(body["paths"]["/api/remove-bg"].is_object());
}

#[tokio::test]
async fn test_request_id_is_echoed_or_generated() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/live")
        .add_header("X-Request-ID", "req-123")
        .await;
    assert_eq!(response.header("x-request-id"), "req-123");

    let response = app.client().get("/live").await;
    let generated = response.header("x-request-id");
    assert_eq!(generated.to_str().unwrap().len(), 36);
}
