//! In-process mock of the six GIIA platform services.
//!
//! Every service gets its own `Router` over one shared `Db`, so a token
//! issued by the auth router is accepted by the catalog router and so on.
//! Tests bind each router to its own listener; the binary binds the
//! default ports 8081-8086.

use std::sync::Arc;

use axum::{
    http::{HeaderMap, StatusCode},
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

mod auth;
mod buffers;
mod catalog;
mod execution;
mod insights;
pub mod state;

pub use state::{Account, BufferState, Notification, Platform, Product, PurchaseOrder};

pub type Db = Arc<RwLock<Platform>>;

/// Error responses carry `{"error": "..."}`.
pub type ApiResult<T> = Result<T, (StatusCode, Json<Value>)>;

pub const ORGANIZATION_HEADER: &str = "x-organization-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockService {
    Auth,
    Catalog,
    Buffers,
    Execution,
    Analytics,
    Notifications,
}

impl MockService {
    pub const ALL: [MockService; 6] = [
        MockService::Auth,
        MockService::Catalog,
        MockService::Buffers,
        MockService::Execution,
        MockService::Analytics,
        MockService::Notifications,
    ];

    pub fn default_port(self) -> u16 {
        match self {
            MockService::Auth => 8081,
            MockService::Catalog => 8082,
            MockService::Buffers => 8083,
            MockService::Execution => 8084,
            MockService::Analytics => 8085,
            MockService::Notifications => 8086,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MockService::Auth => "auth",
            MockService::Catalog => "catalog",
            MockService::Buffers => "buffers",
            MockService::Execution => "execution",
            MockService::Analytics => "analytics",
            MockService::Notifications => "notifications",
        }
    }
}

pub fn seeded_db() -> Db {
    Arc::new(RwLock::new(Platform::seeded()))
}

pub fn app(service: MockService, db: Db) -> Router {
    let routes = match service {
        MockService::Auth => Router::new()
            .route("/api/v1/auth/login", post(auth::login))
            .route("/api/v1/auth/refresh", post(auth::refresh))
            .route("/api/v1/auth/logout", post(auth::logout)),
        MockService::Catalog => Router::new()
            .route(
                "/api/v1/products",
                get(catalog::list_products).post(catalog::create_product),
            )
            .route("/api/v1/products/{id}", get(catalog::get_product)),
        MockService::Buffers => Router::new()
            .route("/api/v1/buffers/{product_id}", get(buffers::get_buffer))
            .route(
                "/api/v1/buffers/{product_id}/calculate",
                post(buffers::calculate_buffer),
            ),
        MockService::Execution => Router::new()
            .route(
                "/api/v1/purchase-orders",
                get(execution::list_purchase_orders).post(execution::create_purchase_order),
            )
            .route("/api/v1/purchase-orders/{id}", get(execution::get_purchase_order))
            .route(
                "/api/v1/purchase-orders/{id}/cancel",
                post(execution::cancel_purchase_order),
            ),
        MockService::Analytics => {
            Router::new().route("/api/v1/analytics/snapshot", get(insights::snapshot))
        }
        MockService::Notifications => Router::new()
            .route("/api/v1/notifications", get(insights::list_notifications))
            .route("/api/v1/notifications/unread-count", get(insights::unread_count))
            .route("/api/v1/notifications/{id}", patch(insights::update_notification)),
    };
    let name = service.name();
    routes
        .route("/health", get(move || async move { Json(json!({"status": "ok", "service": name})) }))
        .with_state(db)
}

pub async fn run(service: MockService, db: Db, listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app(service, db)).await
}

/// Serve every service on its listener until one of them fails.
pub async fn serve_all(db: Db, listeners: Vec<(MockService, TcpListener)>) -> Result<(), std::io::Error> {
    let mut tasks = tokio::task::JoinSet::new();
    for (service, listener) in listeners {
        tasks.spawn(run(service, db.clone(), listener));
    }
    while let Some(joined) = tasks.join_next().await {
        joined.map_err(std::io::Error::other)??;
    }
    Ok(())
}

pub(crate) fn error(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message })))
}

/// Resolve the caller from `Authorization: Bearer` and check that
/// `X-Organization-ID` names the caller's organization.
pub(crate) fn authorize(platform: &Platform, headers: &HeaderMap) -> ApiResult<Account> {
    let token = bearer_token(headers)
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "missing bearer token"))?;
    let account = platform
        .access_tokens
        .get(token)
        .and_then(|id| platform.account(*id))
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "invalid or expired token"))?;
    let org = headers
        .get(ORGANIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok());
    if org != Some(account.organization_id) {
        return Err(error(StatusCode::FORBIDDEN, "organization mismatch"));
    }
    Ok(account.clone())
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
