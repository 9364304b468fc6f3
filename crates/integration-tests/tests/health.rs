//! Liveness, readiness and response headers.

use axum::http::StatusCode;
use succulent_shop_integration_tests::TestApp;

#[tokio::test]
async fn test_liveness_and_readiness() {
    let app = TestApp::new().await;

    let live = app.send("GET", "/health", None, None).await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(live.body, "ok");

    let ready = app.send("GET", "/health/ready", None, None).await;
    assert_eq!(ready.status, StatusCode::OK);
}

#[tokio::test]
async fn test_every_response_carries_request_id_and_nosniff() {
    let app = TestApp::new().await;
    let response = app.send("GET", "/api/v1/products", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.headers.contains_key("x-request-id"));
    assert_eq!(response.headers["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn test_unknown_product_is_json_404() {
    let app = TestApp::new().await;
    let response = app.send("GET", "/api/v1/products/999", None, None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["status"], 404);
    assert_eq!(response.body["message"], "Product not found with id: 999");
}
