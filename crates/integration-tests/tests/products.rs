//! Product import, multipart create and photo serving.

use axum::http::StatusCode;
use serde_json::json;
use succulent_shop_integration_tests::{TestApp, decor, multipart_request};

const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

#[tokio::test]
async fn test_bulk_import_reports_partial_failure() {
    let app = TestApp::new().await;
    let response = app
        .send(
            "POST",
            "/api/v1/products/bulk",
            None,
            Some(json!([
                decor("Clay saucer", "4.00"),
                { "productName": "X", "productType": "DECOR", "price": "1.00" },
                decor("Cork mat", "3.50"),
            ])),
        )
        .await;

    assert_eq!(response.status, StatusCode::MULTI_STATUS, "{}", response.body);
    assert_eq!(response.body["totalRequested"], 3);
    assert_eq!(response.body["successfulImports"], 2);
    assert_eq!(
        response.body["message"],
        "Partial import completed with 1 errors"
    );
    let errors = response.body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(
        errors[0]
            .as_str()
            .unwrap()
            .starts_with("Error importing product at index 1:")
    );

    let listed = app.send("GET", "/api/v1/products", None, None).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body["totalElements"], 2);
}

#[tokio::test]
async fn test_price_with_too_many_digits_is_refused() {
    let app = TestApp::new().await;
    let response = app
        .send(
            "POST",
            "/api/v1/products/bulk",
            None,
            Some(json!([
                decor("Odd cents", "1.999"),
                decor("Gold pot", "50000000000000000000000000000"),
            ])),
        )
        .await;

    assert_eq!(response.status, StatusCode::MULTI_STATUS, "{}", response.body);
    assert_eq!(response.body["successfulImports"], 0);
    for error in response.body["errors"].as_array().unwrap() {
        assert!(
            error
                .as_str()
                .unwrap()
                .ends_with("Price must have at most 6 digits and 2 decimal places"),
            "{error}"
        );
    }
}

#[tokio::test]
async fn test_bulk_import_rejects_empty_list() {
    let app = TestApp::new().await;
    let response = app
        .send("POST", "/api/v1/products/bulk", None, Some(json!([])))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Products list cannot be empty");
}

#[tokio::test]
async fn test_create_with_photo_then_fetch_photo() {
    let app = TestApp::new().await;
    let request = multipart_request(
        "POST",
        "/api/v1/products",
        None,
        "product",
        &decor("Hanging planter", "22.00"),
        Some(("planter.png", "image/png", PNG)),
    );
    let created = app.call(request).await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    let photo = created.body["photo"].as_str().unwrap().to_owned();
    assert!(photo.ends_with(".png"));

    let served = app
        .send("GET", &format!("/api/v1/products/photos/{photo}"), None, None)
        .await;
    assert_eq!(served.status, StatusCode::OK);
    assert_eq!(served.headers["content-type"], "image/png");
    assert_eq!(served.headers["cache-control"], "max-age=31536000");
}

#[tokio::test]
async fn test_multipart_without_product_part_is_rejected() {
    let app = TestApp::new().await;
    let request = multipart_request(
        "POST",
        "/api/v1/products",
        None,
        "something",
        &decor("Hanging planter", "22.00"),
        None,
    );
    let response = app.call(request).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Missing 'product' part");
}

#[tokio::test]
async fn test_search_uses_sale_price() {
    let app = TestApp::new().await;
    let imported = app
        .send(
            "POST",
            "/api/v1/products/bulk",
            None,
            Some(json!([decor("Glass dome", "50.00"), decor("Brass mister", "45.00")])),
        )
        .await;
    let dome = imported.body["importedProducts"][0]["id"].as_i64().unwrap();
    app.send(
        "PATCH",
        &format!("/api/v1/products/{dome}/sale-status?onSale=true"),
        None,
        None,
    )
    .await;

    let cheap = app
        .send("GET", "/api/v1/products/search?maxPrice=42", None, None)
        .await;
    assert_eq!(cheap.status, StatusCode::OK, "{}", cheap.body);
    let content = cheap.body["content"].as_array().unwrap();
    assert_eq!(content.len(), 1);
    assert_eq!(content[0]["id"], dome);
    assert_eq!(content[0]["price"], "40.00");
}
