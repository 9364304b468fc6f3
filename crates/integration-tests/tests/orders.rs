//! Order placement, totals and the status lifecycle over HTTP.

use axum::http::StatusCode;
use serde_json::{Value, json};
use succulent_shop_core::Role;
use succulent_shop_integration_tests::{TestApp, decor};

async fn import(app: &TestApp, items: Vec<Value>) -> Vec<i64> {
    let response = app
        .send("POST", "/api/v1/products/bulk", None, Some(Value::Array(items)))
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.body["importedProducts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_small_order_pays_delivery() {
    let app = TestApp::new().await;
    let user = app.account("buyer@shop.test", Role::User).await;
    let ids = import(&app, vec![decor("Stone pot", "12.50"), decor("Pebbles", "7.50")]).await;

    let response = app
        .send(
            "POST",
            "/api/v1/orders",
            None,
            Some(json!({
                "userId": user.id,
                "productsIds": ids,
                "address": "Aloe 12, Split",
                "deliveryMethod": "EXPRESS_DELIVERY"
            })),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    assert_eq!(response.body["status"], "ORDERED");
    assert_eq!(response.body["subtotal"], "20.00");
    assert_eq!(response.body["deliveryCost"], "8.00");
    assert_eq!(response.body["total"], "28.00");
    assert_eq!(response.body["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_sale_price_is_charged_and_large_order_ships_free() {
    let app = TestApp::new().await;
    let user = app.account("big@shop.test", Role::User).await;
    let ids = import(&app, vec![decor("Terrarium", "125.00")]).await;

    let sale = app
        .send(
            "PATCH",
            &format!("/api/v1/products/{}/sale-status?onSale=true", ids[0]),
            None,
            None,
        )
        .await;
    assert_eq!(sale.status, StatusCode::OK);
    assert_eq!(sale.body["price"], "100.00");
    assert_eq!(sale.body["basePrice"], "125.00");

    let order = app
        .send(
            "POST",
            "/api/v1/orders",
            None,
            Some(json!({
                "userId": user.id,
                "productsIds": ids,
                "address": "Aloe 12, Split",
                "deliveryMethod": "STANDARD_DELIVERY"
            })),
        )
        .await;
    assert_eq!(order.status, StatusCode::CREATED, "{}", order.body);
    assert_eq!(order.body["total"], order.body["subtotal"]);
    assert_eq!(order.body["subtotal"], "100.00");
}

#[tokio::test]
async fn test_invalid_order_lists_every_problem() {
    let app = TestApp::new().await;
    let response = app.send("POST", "/api/v1/orders", None, Some(json!({}))).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let errors = response.body["errors"].as_array().unwrap();
    assert!(errors.contains(&json!("User ID cannot be null")));
    assert!(errors.contains(&json!("Order must contain at least one product")));
    assert!(errors.contains(&json!("Delivery method cannot be empty")));
}

#[tokio::test]
async fn test_status_moves_forward_only() {
    let app = TestApp::new().await;
    let user = app.account("flow@shop.test", Role::User).await;
    let ids = import(&app, vec![decor("Watering can", "30.00")]).await;
    let order = app
        .send(
            "POST",
            "/api/v1/orders",
            None,
            Some(json!({
                "userId": user.id,
                "productsIds": ids,
                "address": "Aloe 12, Split",
                "deliveryMethod": "STANDARD_DELIVERY"
            })),
        )
        .await;
    let id = order.body["id"].as_i64().unwrap();
    let status_uri = format!("/api/v1/orders/{id}/status");

    let skipped = app
        .send("PATCH", &status_uri, None, Some(json!({ "status": "DELIVERED" })))
        .await;
    assert_eq!(skipped.status, StatusCode::BAD_REQUEST);

    let processing = app
        .send("PATCH", &status_uri, None, Some(json!({ "status": "PROCESSING" })))
        .await;
    assert_eq!(processing.status, StatusCode::OK);
    assert_eq!(processing.body["status"], "PROCESSING");
    assert!(
        processing.body["updateLog"]
            .as_str()
            .unwrap()
            .contains("PROCESSING")
    );

    let unknown = app
        .send("PATCH", &status_uri, None, Some(json!({ "status": "LOST" })))
        .await;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);
    assert_eq!(unknown.body["message"], "Invalid order status value");
}

#[tokio::test]
async fn test_deleting_an_order_needs_admin() {
    let app = TestApp::new().await;
    app.account("clerk@shop.test", Role::Employee).await;
    app.account("boss@shop.test", Role::Admin).await;
    let user = app.account("gone@shop.test", Role::User).await;
    let ids = import(&app, vec![decor("Moss ball", "9.00")]).await;
    let order = app
        .send(
            "POST",
            "/api/v1/orders",
            None,
            Some(json!({
                "userId": user.id,
                "productsIds": ids,
                "address": "Aloe 12, Split",
                "deliveryMethod": "STANDARD_DELIVERY"
            })),
        )
        .await;
    let uri = format!("/api/v1/orders/{}", order.body["id"]);

    let anonymous = app.send("DELETE", &uri, None, None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let clerk = app.login("clerk@shop.test").await;
    let forbidden = app.send("DELETE", &uri, Some(&clerk), None).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let boss = app.login("boss@shop.test").await;
    let deleted = app.send("DELETE", &uri, Some(&boss), None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let gone = app.send("GET", &uri, None, None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}
