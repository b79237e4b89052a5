use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt; // for collect()
use common_observability::InventoryMetrics;
use inventory_service::item_store::MemoryItemStore;
use inventory_service::{build_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt; // for oneshot

fn app() -> Router {
    build_router(AppState::in_memory(), &["http://localhost:3000".to_string()])
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Option<String>, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let code = resp
        .headers()
        .get("X-Error-Code")
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, code, value)
}

fn rice() -> Value {
    json!({
        "itemName": "Rice",
        "category": "Grains",
        "quantityAvailable": 10,
        "unitOfMeasurement": "kg",
        "reorderLevel": 5
    })
}

async fn create(app: &Router, body: Value) -> Value {
    let (status, _, resp) = call(app, "POST", "/api/inventory", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{resp}");
    resp["data"].clone()
}

#[tokio::test]
async fn rice_lifecycle_over_http() {
    let app = app();
    let item = create(&app, rice()).await;
    assert_eq!(item["stockStatus"], "Available");
    assert_eq!(item["lastRestockedDate"], Value::Null);
    let id = item["id"].as_str().unwrap().to_string();

    let (status, _, body) = call(&app, "POST", &format!("/api/inventory/{id}/use"), Some(json!({"quantityUsed": 6}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Rice quantity reduced by 6 kg");
    assert_eq!(body["data"]["quantityAvailable"], 4.0);
    assert_eq!(body["data"]["stockStatus"], "Low Stock");

    let (status, code, body) = call(&app, "POST", &format!("/api/inventory/{id}/use"), Some(json!({"quantityUsed": 5}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(code.as_deref(), Some("insufficient_stock"));
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Insufficient quantity. Available: 4 kg, Requested: 5 kg");

    let (_, _, body) = call(&app, "POST", &format!("/api/inventory/{id}/use"), Some(json!({"quantityUsed": 4}))).await;
    assert_eq!(body["data"]["quantityAvailable"], 0.0);
    assert_eq!(body["data"]["stockStatus"], "Out of Stock");

    let (status, _, body) = call(&app, "POST", &format!("/api/inventory/{id}/reorder"), Some(json!({"quantityToAdd": 20}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Rice reordered successfully. Added 20 kg");
    assert_eq!(body["data"]["quantityAvailable"], 20.0);
    assert_eq!(body["data"]["stockStatus"], "Available");
    assert!(body["data"]["lastRestockedDate"].is_string());
}

#[tokio::test]
async fn list_returns_items_in_insertion_order() {
    let app = app();
    create(&app, rice()).await;
    let mut milk = rice();
    milk["itemName"] = json!("Milk");
    milk["category"] = json!("Dairy");
    milk["unitOfMeasurement"] = json!("liters");
    create(&app, milk).await;

    let (status, _, body) = call(&app, "GET", "/items", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "All inventory items retrieved successfully");
    let names: Vec<&str> = body["data"].as_array().unwrap().iter().map(|i| i["itemName"].as_str().unwrap()).collect();
    assert_eq!(names, ["Rice", "Milk"]);
}

#[tokio::test]
async fn both_prefixes_serve_the_same_records() {
    let app = app();
    let item = create(&app, rice()).await;
    let id = item["id"].as_str().unwrap();
    let (status, _, body) = call(&app, "GET", &format!("/items/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Inventory item retrieved successfully");
    assert_eq!(body["data"], item);
}

#[tokio::test]
async fn create_rejects_missing_and_invalid_fields() {
    let app = app();
    let (status, code, body) = call(&app, "POST", "/items", Some(json!({"itemName": "Rice", "category": "Grains"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(code.as_deref(), Some("missing_fields"));
    assert_eq!(body["message"], "Please provide all required fields");

    let mut meat = rice();
    meat["category"] = json!("Meat");
    let (status, code, _) = call(&app, "POST", "/items", Some(meat)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(code.as_deref(), Some("invalid_category"));

    let mut bad_unit = rice();
    bad_unit["unitOfMeasurement"] = json!("tons");
    let (_, code, _) = call(&app, "POST", "/items", Some(bad_unit)).await;
    assert_eq!(code.as_deref(), Some("invalid_unit"));

    let (_, _, body) = call(&app, "GET", "/items", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn zero_quantity_item_is_out_of_stock() {
    let app = app();
    let mut empty = rice();
    empty["quantityAvailable"] = json!(0);
    let item = create(&app, empty).await;
    assert_eq!(item["stockStatus"], "Out of Stock");
}

#[tokio::test]
async fn invalid_quantities_are_rejected() {
    let app = app();
    let id = create(&app, rice()).await["id"].as_str().unwrap().to_string();
    for body in [json!({}), json!({"quantityUsed": 0}), json!({"quantityUsed": -2})] {
        let (status, code, resp) = call(&app, "POST", &format!("/items/{id}/use"), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code.as_deref(), Some("invalid_quantity"));
        assert_eq!(resp["message"], "Please provide valid quantityUsed");
    }
    let (_, _, resp) = call(&app, "POST", &format!("/items/{id}/reorder"), Some(json!({"quantityToAdd": 0}))).await;
    assert_eq!(resp["message"], "Please provide valid quantityToAdd");
}

#[tokio::test]
async fn reorder_cannot_overflow_quantity() {
    let app = app();
    let mut huge = rice();
    huge["quantityAvailable"] = json!(1e308);
    let id = create(&app, huge).await["id"].as_str().unwrap().to_string();

    let (status, code, body) = call(&app, "POST", &format!("/items/{id}/reorder"), Some(json!({"quantityToAdd": 1e308}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(code.as_deref(), Some("invalid_quantity"));
    assert_eq!(body["success"], false);

    let (status, _, body) = call(&app, "GET", &format!("/items/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["quantityAvailable"], 1e308);
}

#[tokio::test]
async fn edit_rederives_status_and_clears_optional_fields() {
    let app = app();
    let mut body = rice();
    body["supplier"] = json!("Acme Grains");
    body["price"] = json!(2.5);
    let id = create(&app, body).await["id"].as_str().unwrap().to_string();

    let (status, _, resp) = call(&app, "PUT", &format!("/items/{id}"), Some(json!({"reorderLevel": 12, "supplier": null}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["message"], "Inventory item updated successfully");
    assert_eq!(resp["data"]["stockStatus"], "Low Stock");
    assert_eq!(resp["data"]["supplier"], Value::Null);
    assert_eq!(resp["data"]["price"], 2.5);
    assert_eq!(resp["data"]["itemName"], "Rice");
    assert_eq!(resp["data"]["version"], 2);

    let (status, code, _) = call(&app, "PUT", &format!("/items/{id}"), Some(json!({"unitOfMeasurement": "tons"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(code.as_deref(), Some("invalid_unit"));
}

#[tokio::test]
async fn delete_returns_removed_record_then_not_found() {
    let app = app();
    let item = create(&app, rice()).await;
    let id = item["id"].as_str().unwrap();

    let (status, _, body) = call(&app, "DELETE", &format!("/items/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Inventory item deleted successfully");
    assert_eq!(body["data"]["id"], item["id"]);

    let (status, code, body) = call(&app, "DELETE", &format!("/items/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(code.as_deref(), Some("item_not_found"));
    assert_eq!(body["message"], "Inventory item not found");
}

#[tokio::test]
async fn unknown_and_malformed_ids_are_not_found() {
    let app = app();
    for uri in ["/items/not-a-uuid", "/items/00000000-0000-0000-0000-000000000000"] {
        let (status, code, body) = call(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(code.as_deref(), Some("item_not_found"));
        assert_eq!(body["success"], false);
    }
    let (status, _, _) = call(&app, "POST", "/items/not-a-uuid/reorder", Some(json!({"quantityToAdd": 1}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = app();
    let req = Request::builder()
        .method("POST")
        .uri("/items")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "invalid_body");
}

#[tokio::test]
async fn unknown_route_uses_error_envelope() {
    let app = app();
    let (status, code, body) = call(&app, "GET", "/api/nothing-here", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(code.as_deref(), Some("route_not_found"));
    assert_eq!(body, json!({"success": false, "code": "route_not_found", "message": "Route not found"}));
}

#[tokio::test]
async fn health_and_collections() {
    let app = app();
    for uri in ["/healthz", "/api/health"] {
        let (status, _, body) = call(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "message": "Server is running"}));
    }
    let (status, _, body) = call(&app, "GET", "/api/debug/collections", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"collections": ["inventories"]}));
}

#[tokio::test]
async fn metrics_count_mutations_and_errors() {
    let app = app();
    let id = create(&app, rice()).await["id"].as_str().unwrap().to_string();
    call(&app, "POST", &format!("/items/{id}/use"), Some(json!({"quantityUsed": 50}))).await;
    call(&app, "GET", "/items/not-a-uuid", None).await;

    let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let text = String::from_utf8(resp.into_body().collect().await.unwrap().to_bytes().to_vec()).unwrap();
    assert!(text.contains(r#"inventory_item_mutations_total{operation="create"} 1"#), "{text}");
    assert!(text.contains("inventory_insufficient_stock_total 1"), "{text}");
    assert!(
        text.contains(r#"http_errors_total{code="insufficient_stock",service="inventory-service",status="400"} 1"#),
        "{text}"
    );
    assert!(text.contains(r#"code="item_not_found""#), "{text}");
}

#[tokio::test]
async fn concurrent_consumes_are_not_lost() {
    // Every lost race means another consume landed, so 20 attempts always suffice.
    let state = AppState::new(
        std::sync::Arc::new(MemoryItemStore::new()),
        std::sync::Arc::new(InventoryMetrics::new()),
        20,
    );
    let app = build_router(state, &[]);
    let mut body = rice();
    body["quantityAvailable"] = json!(100);
    let id = create(&app, body).await["id"].as_str().unwrap().to_string();

    let calls = (0..20).map(|_| {
        let app = app.clone();
        let uri = format!("/items/{id}/use");
        async move { call(&app, "POST", &uri, Some(json!({"quantityUsed": 1}))).await.0 }
    });
    let statuses = futures::future::join_all(calls).await;
    assert!(statuses.iter().all(|s| *s == StatusCode::OK), "{statuses:?}");

    let (_, _, body) = call(&app, "GET", &format!("/items/{id}"), None).await;
    assert_eq!(body["data"]["quantityAvailable"], 80.0);
}
