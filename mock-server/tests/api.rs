use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::state::{DEMO_EMAIL, DEMO_PASSWORD};
use mock_server::{app, seeded_db, Db, MockService, Product, PurchaseOrder};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

/// Session headers for the demo account, obtained through the auth router.
struct Login {
    access_token: String,
    refresh_token: String,
    organization_id: String,
}

impl Login {
    fn request(&self, method: &str, uri: &str, body: &str) -> Request<String> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(http::header::CONTENT_TYPE, "application/json")
            .header(http::header::AUTHORIZATION, format!("Bearer {}", self.access_token))
            .header("X-Organization-ID", &self.organization_id)
            .body(body.to_string())
            .unwrap()
    }
}

/// Value of the `refresh_token` pair in the response's `Set-Cookie`.
fn refresh_cookie(response: &axum::response::Response) -> String {
    let cookie = response
        .headers()
        .get(http::header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    let pair = cookie.split(';').next().unwrap();
    pair.strip_prefix("refresh_token=").unwrap().to_string()
}

async fn login(db: &Db) -> Login {
    let body = format!(r#"{{"email":"{DEMO_EMAIL}","password":"{DEMO_PASSWORD}"}}"#);
    let resp = app(MockService::Auth, db.clone())
        .oneshot(json_request("POST", "/api/v1/auth/login", &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let refresh_token = refresh_cookie(&resp);
    let json: Value = body_json(resp).await;
    Login {
        access_token: json["access_token"].as_str().unwrap().to_string(),
        refresh_token,
        organization_id: json["user"]["organization_id"].as_str().unwrap().to_string(),
    }
}

// --- auth ---

#[tokio::test]
async fn login_returns_tokens_and_user() {
    let db = seeded_db();
    let body = format!(r#"{{"email":"{DEMO_EMAIL}","password":"{DEMO_PASSWORD}"}}"#);
    let resp = app(MockService::Auth, db)
        .oneshot(json_request("POST", "/api/v1/auth/login", &body))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp.headers()[http::header::SET_COOKIE].to_str().unwrap().to_string();
    assert!(cookie.starts_with("refresh_token=rt_"));
    assert!(cookie.contains("HttpOnly"));
    let json: Value = body_json(resp).await;
    assert!(json["access_token"].as_str().unwrap().starts_with("at_"));
    assert!(json.get("refresh_token").is_none());
    assert_eq!(json["token_type"], "Bearer");
    assert_eq!(json["user"]["email"], DEMO_EMAIL);
    assert!(json["user"].get("password").is_none());
}

#[tokio::test]
async fn login_wrong_password_returns_401() {
    let resp = app(MockService::Auth, seeded_db())
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/login",
            r#"{"email":"demo@example.com","password":"wrong"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let json: Value = body_json(resp).await;
    assert_eq!(json["error"], "invalid credentials");
}

#[tokio::test]
async fn refresh_from_body_rotates_both_tokens() {
    let db = seeded_db();
    let session = login(&db).await;
    let body = format!(r#"{{"refresh_token":"{}"}}"#, session.refresh_token);

    let resp = app(MockService::Auth, db.clone())
        .oneshot(json_request("POST", "/api/v1/auth/refresh", &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_ne!(refresh_cookie(&resp), session.refresh_token);
    let json: Value = body_json(resp).await;
    assert_ne!(json["access_token"], session.access_token.as_str());

    // the old refresh token is spent
    let resp = app(MockService::Auth, db.clone())
        .oneshot(json_request("POST", "/api/v1/auth/refresh", &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // and so is the access token issued with it
    let resp = app(MockService::Catalog, db)
        .oneshot(session.request("GET", "/api/v1/products", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_prefers_cookie_over_body() {
    let db = seeded_db();
    let session = login(&db).await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/refresh")
        .header(http::header::COOKIE, format!("refresh_token={}", session.refresh_token))
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(r#"{"refresh_token":"rt_stale"}"#.to_string())
        .unwrap();

    let resp = app(MockService::Auth, db).oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json: Value = body_json(resp).await;
    assert!(json["access_token"].as_str().unwrap().starts_with("at_"));
}

#[tokio::test]
async fn refresh_without_token_returns_400() {
    let resp = app(MockService::Auth, seeded_db())
        .oneshot(json_request("POST", "/api/v1/auth/refresh", "{}"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn logout_revokes_access_token() {
    let db = seeded_db();
    let session = login(&db).await;

    let resp = app(MockService::Auth, db.clone())
        .oneshot(session.request("POST", "/api/v1/auth/logout", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(refresh_cookie(&resp), "");
    assert!(body_bytes(resp).await.is_empty());

    let resp = app(MockService::Catalog, db)
        .oneshot(session.request("GET", "/api/v1/products", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- access control ---

#[tokio::test]
async fn catalog_without_token_returns_401() {
    let resp = app(MockService::Catalog, seeded_db())
        .oneshot(Request::builder().uri("/api/v1/products").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn catalog_without_org_header_returns_403() {
    let db = seeded_db();
    let session = login(&db).await;
    let resp = app(MockService::Catalog, db)
        .oneshot(
            Request::builder()
                .uri("/api/v1/products")
                .header(http::header::AUTHORIZATION, format!("Bearer {}", session.access_token))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn health_needs_no_auth() {
    for service in MockService::ALL {
        let resp = app(service, seeded_db())
            .oneshot(Request::builder().uri("/health").body(String::new()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json: Value = body_json(resp).await;
        assert_eq!(json["service"], service.name());
    }
}

// --- catalog ---

#[tokio::test]
async fn list_products_paginates() {
    let db = seeded_db();
    let session = login(&db).await;

    let resp = app(MockService::Catalog, db.clone())
        .oneshot(session.request("GET", "/api/v1/products?page=1&page_size=5", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json: Value = body_json(resp).await;
    let total = json["total"].as_u64().unwrap() as usize;
    let first: Vec<Product> = serde_json::from_value(json["products"].clone()).unwrap();
    assert_eq!(first.len(), 5);

    let resp = app(MockService::Catalog, db)
        .oneshot(session.request("GET", "/api/v1/products?page=2&page_size=5", ""))
        .await
        .unwrap();
    let json: Value = body_json(resp).await;
    let second: Vec<Product> = serde_json::from_value(json["products"].clone()).unwrap();
    assert_eq!(first.len() + second.len(), total);
    assert!(second.iter().all(|p| first.iter().all(|f| f.id != p.id)));
}

#[tokio::test]
async fn list_products_far_past_the_end_is_empty() {
    let db = seeded_db();
    let session = login(&db).await;

    let uri = format!("/api/v1/products?page={}&page_size=5", usize::MAX);
    let resp = app(MockService::Catalog, db)
        .oneshot(session.request("GET", &uri, ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json: Value = body_json(resp).await;
    assert!(json["products"].as_array().unwrap().is_empty());
    assert_eq!(json["total"], 8);
}

#[tokio::test]
async fn list_products_filters_by_status() {
    let db = seeded_db();
    let session = login(&db).await;
    let resp = app(MockService::Catalog, db)
        .oneshot(session.request("GET", "/api/v1/products?status=discontinued", ""))
        .await
        .unwrap();
    let json: Value = body_json(resp).await;
    assert_eq!(json["products"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn create_product_returns_201_then_conflicts() {
    let db = seeded_db();
    let session = login(&db).await;
    let body = r#"{"sku":"NEW-1","name":"New Part","category":"Demo","unit_of_measure":"units"}"#;

    let resp = app(MockService::Catalog, db.clone())
        .oneshot(session.request("POST", "/api/v1/products", body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let product: Product = body_json(resp).await;
    assert_eq!(product.status, "active");

    let resp = app(MockService::Catalog, db.clone())
        .oneshot(session.request("GET", &format!("/api/v1/products/{}", product.id), ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app(MockService::Catalog, db)
        .oneshot(session.request("POST", "/api/v1/products", body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn get_product_unknown_returns_404() {
    let db = seeded_db();
    let session = login(&db).await;
    let resp = app(MockService::Catalog, db)
        .oneshot(session.request(
            "GET",
            "/api/v1/products/00000000-0000-0000-0000-000000000000",
            "",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- buffers ---

#[tokio::test]
async fn buffer_is_wrapped_and_calculation_counted() {
    let db = seeded_db();
    let session = login(&db).await;
    let product_id = db.read().await.products[0].id;

    let resp = app(MockService::Buffers, db.clone())
        .oneshot(session.request("GET", &format!("/api/v1/buffers/{product_id}"), ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json: Value = body_json(resp).await;
    assert_eq!(json["buffer"]["product_id"], product_id.to_string());
    assert_eq!(json["buffer"]["calculations"], 0);

    let resp = app(MockService::Buffers, db)
        .oneshot(session.request("POST", &format!("/api/v1/buffers/{product_id}/calculate"), ""))
        .await
        .unwrap();
    let json: Value = body_json(resp).await;
    assert_eq!(json["buffer"]["calculations"], 1);
}

// --- purchase orders ---

#[tokio::test]
async fn purchase_order_lifecycle() {
    let db = seeded_db();
    let session = login(&db).await;
    let product_id = db.read().await.products[0].id;
    let on_order_before = db.read().await.buffers[&product_id].on_order;

    let body = format!(
        r#"{{"po_number":"PO-1","supplier_id":"s-1","order_date":"2024-05-01","expected_arrival_date":"2024-05-15","line_items":[{{"product_id":"{product_id}","quantity":10,"unit_cost":2.5}}]}}"#
    );
    let resp = app(MockService::Execution, db.clone())
        .oneshot(session.request("POST", "/api/v1/purchase-orders", &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: PurchaseOrder = body_json(resp).await;
    assert_eq!(order.status, "pending");
    assert_eq!(order.total_amount, 25.0);
    assert_eq!(db.read().await.buffers[&product_id].on_order, on_order_before + 10.0);

    let resp = app(MockService::Execution, db.clone())
        .oneshot(session.request("GET", "/api/v1/purchase-orders?status=pending", ""))
        .await
        .unwrap();
    let json: Value = body_json(resp).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let resp = app(MockService::Execution, db.clone())
        .oneshot(session.request("POST", &format!("/api/v1/purchase-orders/{}/cancel", order.id), ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cancelled: PurchaseOrder = body_json(resp).await;
    assert_eq!(cancelled.status, "cancelled");
    assert_eq!(db.read().await.buffers[&product_id].on_order, on_order_before);

    let resp = app(MockService::Execution, db)
        .oneshot(session.request("POST", &format!("/api/v1/purchase-orders/{}/cancel", order.id), ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn purchase_order_without_lines_returns_400() {
    let db = seeded_db();
    let session = login(&db).await;
    let resp = app(MockService::Execution, db)
        .oneshot(session.request(
            "POST",
            "/api/v1/purchase-orders",
            r#"{"po_number":"PO-2","supplier_id":"s-1","order_date":"2024-05-01","expected_arrival_date":"2024-05-15","line_items":[]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn purchase_order_with_malformed_date_returns_400() {
    let db = seeded_db();
    let session = login(&db).await;
    let product_id = db.read().await.products[0].id;

    let body = format!(
        r#"{{"po_number":"PO-3","supplier_id":"s-1","order_date":"2024-05-01","expected_arrival_date":"soon","line_items":[{{"product_id":"{product_id}","quantity":1,"unit_cost":1.0}}]}}"#
    );
    let resp = app(MockService::Execution, db.clone())
        .oneshot(session.request("POST", "/api/v1/purchase-orders", &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json: Value = body_json(resp).await;
    assert_eq!(json["error"], "expected_arrival_date must be a YYYY-MM-DD date");
    assert!(db.read().await.purchase_orders.is_empty());
}

#[tokio::test]
async fn purchase_order_for_foreign_product_leaves_its_buffer_alone() {
    let db = seeded_db();
    let session = login(&db).await;
    let foreign = db
        .write()
        .await
        .add_product(uuid::Uuid::new_v4(), "ALIEN-1", "Other Org Part", "Misc", "units");

    let body = format!(
        r#"{{"po_number":"PO-4","supplier_id":"s-1","order_date":"2024-05-01","expected_arrival_date":"2024-05-15","line_items":[{{"product_id":"{}","quantity":10,"unit_cost":1.0}}]}}"#,
        foreign.id
    );
    let resp = app(MockService::Execution, db.clone())
        .oneshot(session.request("POST", "/api/v1/purchase-orders", &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(db.read().await.buffers[&foreign.id].on_order, 0.0);
}

#[tokio::test]
async fn purchase_order_echoes_extra_line_item_fields() {
    let db = seeded_db();
    let session = login(&db).await;
    let product_id = db.read().await.products[0].id;

    let body = format!(
        r#"{{"po_number":"PO-5","supplier_id":"s-1","order_date":"2024-05-01","expected_arrival_date":"2024-05-15","line_items":[{{"product_id":"{product_id}","quantity":2,"unit_cost":3.0,"notes":"rush"}}]}}"#
    );
    let resp = app(MockService::Execution, db)
        .oneshot(session.request("POST", "/api/v1/purchase-orders", &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let json: Value = body_json(resp).await;
    assert_eq!(json["line_items"][0]["notes"], "rush");
    assert_eq!(json["order_date"], "2024-05-01");
}

// --- analytics & notifications ---

#[tokio::test]
async fn snapshot_reports_rates() {
    let db = seeded_db();
    let session = login(&db).await;
    let resp = app(MockService::Analytics, db)
        .oneshot(session.request("GET", "/api/v1/analytics/snapshot", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json: Value = body_json(resp).await;
    let service_level = json["service_level"].as_f64().unwrap();
    let stockout_rate = json["stockout_rate"].as_f64().unwrap();
    assert!((service_level + stockout_rate - 1.0).abs() < 1e-9);
    assert!(json["zones"]["below_red"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn notifications_unread_filter_and_mark_read() {
    let db = seeded_db();
    let session = login(&db).await;

    let resp = app(MockService::Notifications, db.clone())
        .oneshot(session.request("GET", "/api/v1/notifications?unread_only=true", ""))
        .await
        .unwrap();
    let json: Value = body_json(resp).await;
    let unread = json["notifications"].as_array().unwrap().clone();
    assert!(unread.iter().all(|n| n["status"] == "unread"));

    let resp = app(MockService::Notifications, db.clone())
        .oneshot(session.request("GET", "/api/v1/notifications?unread_only=false", ""))
        .await
        .unwrap();
    let json: Value = body_json(resp).await;
    assert!(json["notifications"].as_array().unwrap().len() > unread.len());

    let id = unread[0]["id"].as_str().unwrap();
    let resp = app(MockService::Notifications, db.clone())
        .oneshot(session.request("PATCH", &format!("/api/v1/notifications/{id}"), r#"{"status":"read"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app(MockService::Notifications, db)
        .oneshot(session.request("GET", "/api/v1/notifications/unread-count", ""))
        .await
        .unwrap();
    let json: Value = body_json(resp).await;
    assert_eq!(json["unread_count"].as_u64().unwrap() as usize, unread.len() - 1);
}
