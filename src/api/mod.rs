//! JSON HTTP surface. Handlers only extract, delegate and wrap.

pub mod caller;
pub mod cart;
pub mod error;
pub mod extract;
pub mod orders;
pub mod registry;

use axum::routing::{get, post, put};
use axum::{Json, Router};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use crate::services::Backoffice;

/// The router with request tracing and CORS applied, as served by the binary.
pub fn app(backoffice: Backoffice) -> Router {
    router(backoffice).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()))
}

pub fn router(app: Backoffice) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "opensase-backoffice"})) }))
        .route("/api/v1/catalogs", get(registry::list_catalogs).post(registry::create_catalog))
        .route("/api/v1/catalogs/:id", get(registry::get_catalog).put(registry::update_catalog).delete(registry::delete_catalog))
        .route("/api/v1/catalogs/:id/items", get(registry::catalog_items))
        .route("/api/v1/suppliers", get(registry::list_suppliers).post(registry::create_supplier))
        .route("/api/v1/suppliers/:id", get(registry::get_supplier).put(registry::update_supplier).delete(registry::delete_supplier))
        .route("/api/v1/items", get(registry::list_items).post(registry::create_item))
        .route("/api/v1/items/:id", get(registry::get_item).put(registry::update_item).delete(registry::delete_item))
        .route("/api/v1/cart", get(cart::get_cart).delete(cart::clear_cart))
        .route("/api/v1/cart/items", post(cart::add_to_cart))
        .route("/api/v1/cart/items/:item_id", put(cart::update_cart_quantity).delete(cart::remove_from_cart))
        .route("/api/v1/checkout", post(orders::checkout))
        .route("/api/v1/orders", get(orders::my_orders))
        .route("/api/v1/admin/orders", get(orders::all_orders))
        .route("/api/v1/orders/:id", get(orders::get_order))
        .route("/api/v1/orders/:id/cancel", post(orders::cancel_order))
        .route("/api/v1/orders/:id/status", put(orders::update_status))
        .route("/api/v1/orders/:id/lines", post(orders::edit_lines))
        .route("/api/v1/orders/:id/lines/:line_id", put(orders::update_line_quantity).delete(orders::remove_line))
        .with_state(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::LogPublisher;
    use crate::store::MemoryStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_app() -> Router { app(Backoffice::new(Arc::new(MemoryStore::new()), Arc::new(LogPublisher))) }

    async fn call(app: &Router, method: &str, uri: &str, who: Option<(&str, &str)>, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some((user, roles)) = who {
            req = req.header("x-user-id", user).header("x-user-roles", roles);
        }
        let req = match body {
            Some(body) => req.header("content-type", "application/json").body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        }.unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    const ADMIN: Option<(&str, &str)> = Some(("root", "ADMIN"));
    const ALICE: Option<(&str, &str)> = Some(("alice", "USER"));
    const BOB: Option<(&str, &str)> = Some(("bob", "USER"));

    async fn seed_item(app: &Router, price: &str) -> String {
        let (_, supplier) = call(app, "POST", "/api/v1/suppliers", ADMIN, Some(json!({"name": "Acme"}))).await;
        let (_, catalog) = call(app, "POST", "/api/v1/catalogs", ADMIN, Some(json!({"name": "Tools"}))).await;
        let (status, item) = call(app, "POST", "/api/v1/items", ADMIN, Some(json!({
            "name": "Wrench", "part_number": "WR-1", "lead_time_days": 2, "price": price,
            "supplier_id": supplier["id"], "catalog_id": catalog["id"],
        }))).await;
        assert_eq!(status, StatusCode::CREATED);
        item["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(&test_app(), "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_registry_requires_admin() {
        let app = test_app();
        let (status, _) = call(&app, "POST", "/api/v1/catalogs", ALICE, Some(json!({"name": "X"}))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = call(&app, "GET", "/api/v1/suppliers", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = call(&app, "POST", "/api/v1/catalogs", ADMIN, Some(json!({"name": ""}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_checkout_flow() {
        let app = test_app();
        let item = seed_item(&app, "10.00").await;

        let (status, body) = call(&app, "POST", "/api/v1/checkout", ALICE, Some(json!({
            "customer_name": "Alice", "phone": "1", "address": "2 Elm St"
        }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "cart is empty");

        let (status, cart) = call(&app, "POST", "/api/v1/cart/items", ALICE, Some(json!({"item_id": item, "quantity": 3}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cart["total"], "30.00");

        let (status, order) = call(&app, "POST", "/api/v1/checkout", ALICE, Some(json!({
            "customer_name": "Alice", "phone": "1", "address": "2 Elm St"
        }))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(order["status"], "Pending");
        let id = order["id"].as_str().unwrap().to_string();

        let (_, cart) = call(&app, "GET", "/api/v1/cart", ALICE, None).await;
        assert_eq!(cart["lines"], json!([]));

        let (status, _) = call(&app, "GET", &format!("/api/v1/orders/{id}"), BOB, None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, order) = call(&app, "POST", &format!("/api/v1/orders/{id}/cancel"), ALICE, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(order["status"], "Cancelled");

        let (status, body) = call(&app, "PUT", &format!("/api/v1/orders/{id}/status"), ADMIN, Some(json!({"status": "Shipped"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("Cancelled"));
    }

    #[tokio::test]
    async fn test_line_edits_over_http() {
        let app = test_app();
        let item = seed_item(&app, "4.50").await;
        call(&app, "POST", "/api/v1/cart/items", ALICE, Some(json!({"item_id": item, "quantity": 2}))).await;
        let (_, order) = call(&app, "POST", "/api/v1/checkout", ALICE, Some(json!({
            "customer_name": "Alice", "phone": "1", "address": "2 Elm St"
        }))).await;
        let id = order["id"].as_str().unwrap();
        let line = order["lines"][0]["id"].as_str().unwrap();

        let (status, _) = call(&app, "PUT", &format!("/api/v1/orders/{id}/lines/{line}"), ALICE, Some(json!({"quantity": 0}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, order) = call(&app, "PUT", &format!("/api/v1/orders/{id}/lines/{line}"), ALICE, Some(json!({"quantity": 4}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(order["total"], "18.00");

        let (status, outcome) = call(&app, "DELETE", &format!("/api/v1/orders/{id}/lines/{line}"), ALICE, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["outcome"], "deleted");

        let (status, _) = call(&app, "GET", &format!("/api/v1/orders/{id}"), ADMIN, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_input_gets_json_error() {
        let app = test_app();
        let (status, body) = call(&app, "GET", "/api/v1/orders/not-a-uuid", ALICE, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = call(&app, "POST", "/api/v1/cart/items", ALICE, Some(json!({"quantity": 1}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].is_string());

        let (_, supplier) = call(&app, "POST", "/api/v1/suppliers", ADMIN, Some(json!({"name": "Acme"}))).await;
        let (_, catalog) = call(&app, "POST", "/api/v1/catalogs", ADMIN, Some(json!({"name": "Tools"}))).await;
        let (status, body) = call(&app, "POST", "/api/v1/items", ADMIN, Some(json!({
            "name": "Shim", "part_number": "SH-1", "lead_time_days": 1, "price": "0.125",
            "supplier_id": supplier["id"], "catalog_id": catalog["id"],
        }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("two decimal places"));
        let (_, items) = call(&app, "GET", "/api/v1/items", None, None).await;
        assert_eq!(items, json!([]));
    }
}
