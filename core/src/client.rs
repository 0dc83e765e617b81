//! Request builder and response parser for the GIIA platform services.
//!
//! # Design
//! `GiiaClient` holds the endpoint layout and the `Session`. Each operation
//! is split into a `build_*` method that produces an `HttpRequest` and a
//! `parse_*` method that consumes an `HttpResponse`. Nothing here performs
//! I/O; `PlatformClient` pairs these with a `Transport`.
//!
//! Session transitions live in the parse step: `parse_login` and
//! `parse_refresh_token` only touch the session once the response has been
//! accepted and decoded, so failures leave it as it was.

use chrono::{Days, NaiveDate};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use urlencoding::encode;

use crate::config::{ClientConfig, Service};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::session::Session;
use crate::types::{
    Buffer, BufferEnvelope, Credentials, DataPage, LineItem, LoginResponse, NewProduct,
    NewPurchaseOrder, NotificationPage, Product, ProductPage, TokenResponse, UnreadCount, User,
};

pub const ORGANIZATION_HEADER: &str = "X-Organization-ID";

/// Cookie the auth service sets to carry the refresh token.
pub const REFRESH_COOKIE: &str = "refresh_token";

#[derive(Debug, Clone)]
pub struct GiiaClient {
    config: ClientConfig,
    session: Session,
}

impl GiiaClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            session: Session::default(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    // Auth

    pub fn build_login(&self, email: &str, password: &str) -> Result<HttpRequest, ApiError> {
        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let request = self.bare_request(HttpMethod::Post, Service::Auth, "/api/v1/auth/login");
        with_json_body(request, &credentials)
    }

    /// The refresh token is taken from the body when present, otherwise
    /// from the `refresh_token` cookie.
    pub fn parse_login(&mut self, response: HttpResponse) -> Result<User, ApiError> {
        let mut login: LoginResponse = decode(&response)?;
        if login.refresh_token.is_none() {
            login.refresh_token = response.set_cookie(REFRESH_COOKIE).map(str::to_string);
        }
        log::info!("logged in as {} ({})", login.user.email, login.user.organization_id);
        Ok(self.session.establish(login))
    }

    /// Sends the held refresh token, or an empty object when there is none.
    pub fn build_refresh_token(&self) -> Result<HttpRequest, ApiError> {
        let mut body = serde_json::Map::new();
        if let Some(refresh) = self.session.refresh_token() {
            body.insert("refresh_token".to_string(), Value::String(refresh.to_string()));
        }
        let request = self.bare_request(HttpMethod::Post, Service::Auth, "/api/v1/auth/refresh");
        with_json_body(request, &body)
    }

    pub fn parse_refresh_token(&mut self, response: HttpResponse) -> Result<String, ApiError> {
        let mut tokens: TokenResponse = decode(&response)?;
        if tokens.refresh_token.is_none() {
            tokens.refresh_token = response.set_cookie(REFRESH_COOKIE).map(str::to_string);
        }
        Ok(self.session.replace_access_token(tokens))
    }

    pub fn build_logout(&self) -> HttpRequest {
        self.request(HttpMethod::Post, Service::Auth, "/api/v1/auth/logout")
    }

    pub fn clear_session(&mut self) {
        self.session.clear();
    }

    // Catalog

    pub fn build_list_products(&self, page: u32, page_size: u32, status: Option<&str>) -> HttpRequest {
        let mut request = self.request(HttpMethod::Get, Service::Catalog, "/api/v1/products");
        request.query.push(("page".to_string(), page.to_string()));
        request.query.push(("page_size".to_string(), page_size.to_string()));
        if let Some(status) = status.filter(|s| !s.is_empty()) {
            request.query.push(("status".to_string(), status.to_string()));
        }
        request
    }

    pub fn parse_list_products(&self, response: HttpResponse) -> Result<Vec<Product>, ApiError> {
        let page: ProductPage = decode(&response)?;
        Ok(page.products)
    }

    pub fn build_get_product(&self, product_id: &str) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            Service::Catalog,
            &format!("/api/v1/products/{}", encode(product_id)),
        )
    }

    pub fn parse_get_product(&self, response: HttpResponse) -> Result<Product, ApiError> {
        decode(&response)
    }

    pub fn build_create_product(&self, input: &NewProduct) -> Result<HttpRequest, ApiError> {
        let request = self.request(HttpMethod::Post, Service::Catalog, "/api/v1/products");
        with_json_body(request, input)
    }

    pub fn parse_create_product(&self, response: HttpResponse) -> Result<Product, ApiError> {
        decode(&response)
    }

    // Buffers

    pub fn build_get_buffer(&self, product_id: &str) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            Service::Buffers,
            &format!("/api/v1/buffers/{}", encode(product_id)),
        )
    }

    pub fn build_calculate_buffer(&self, product_id: &str) -> HttpRequest {
        self.request(
            HttpMethod::Post,
            Service::Buffers,
            &format!("/api/v1/buffers/{}/calculate", encode(product_id)),
        )
    }

    /// Shared by `get_buffer` and `calculate_buffer`.
    pub fn parse_buffer(&self, response: HttpResponse, product_id: &str) -> Result<Buffer, ApiError> {
        let envelope: BufferEnvelope = decode(&response)?;
        Ok(Buffer::from_record(envelope.buffer, product_id))
    }

    // Purchase orders

    /// Order date is today in local time.
    pub fn build_create_purchase_order(
        &self,
        po_number: &str,
        supplier_id: &str,
        line_items: Vec<LineItem>,
        expected_days: u32,
    ) -> Result<HttpRequest, ApiError> {
        let today = chrono::Local::now().date_naive();
        self.build_create_purchase_order_on(po_number, supplier_id, line_items, expected_days, today)
    }

    pub fn build_create_purchase_order_on(
        &self,
        po_number: &str,
        supplier_id: &str,
        line_items: Vec<LineItem>,
        expected_days: u32,
        order_date: NaiveDate,
    ) -> Result<HttpRequest, ApiError> {
        let expected_arrival_date = order_date
            .checked_add_days(Days::new(u64::from(expected_days)))
            .ok_or_else(|| {
                ApiError::Serialization(format!(
                    "arrival date {expected_days} days after {order_date} is out of range"
                ))
            })?;
        let order = NewPurchaseOrder {
            po_number: po_number.to_string(),
            supplier_id: supplier_id.to_string(),
            order_date,
            expected_arrival_date,
            line_items,
        };
        let request = self.request(HttpMethod::Post, Service::Execution, "/api/v1/purchase-orders");
        with_json_body(request, &order)
    }

    pub fn build_list_purchase_orders(&self, status: Option<&str>) -> HttpRequest {
        let mut request = self.request(HttpMethod::Get, Service::Execution, "/api/v1/purchase-orders");
        if let Some(status) = status.filter(|s| !s.is_empty()) {
            request.query.push(("status".to_string(), status.to_string()));
        }
        request
    }

    pub fn parse_list_purchase_orders(&self, response: HttpResponse) -> Result<Vec<Value>, ApiError> {
        let page: DataPage = decode(&response)?;
        Ok(page.data)
    }

    pub fn build_get_purchase_order(&self, order_id: &str) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            Service::Execution,
            &format!("/api/v1/purchase-orders/{}", encode(order_id)),
        )
    }

    pub fn build_cancel_purchase_order(&self, order_id: &str) -> HttpRequest {
        self.request(
            HttpMethod::Post,
            Service::Execution,
            &format!("/api/v1/purchase-orders/{}/cancel", encode(order_id)),
        )
    }

    // Analytics

    pub fn build_get_kpi_snapshot(&self) -> HttpRequest {
        self.request(HttpMethod::Get, Service::Analytics, "/api/v1/analytics/snapshot")
    }

    // Notifications

    pub fn build_get_notifications(&self, unread_only: bool) -> HttpRequest {
        let mut request = self.request(HttpMethod::Get, Service::Notifications, "/api/v1/notifications");
        request.query.push(("unread_only".to_string(), unread_only.to_string()));
        request
    }

    pub fn parse_notifications(&self, response: HttpResponse) -> Result<Vec<Value>, ApiError> {
        let page: NotificationPage = decode(&response)?;
        Ok(page.notifications)
    }

    pub fn build_get_unread_count(&self) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            Service::Notifications,
            "/api/v1/notifications/unread-count",
        )
    }

    pub fn parse_unread_count(&self, response: HttpResponse) -> Result<u64, ApiError> {
        let count: UnreadCount = decode(&response)?;
        Ok(count.unread_count)
    }

    pub fn build_mark_notification_read(&self, notification_id: &str) -> Result<HttpRequest, ApiError> {
        let request = self.request(
            HttpMethod::Patch,
            Service::Notifications,
            &format!("/api/v1/notifications/{}", encode(notification_id)),
        );
        with_json_body(request, &serde_json::json!({ "status": "read" }))
    }

    // Shared

    pub fn build_health_check(&self, service: Service) -> HttpRequest {
        self.bare_request(HttpMethod::Get, service, "/health")
    }

    /// Decode any 2xx body as raw JSON. Used by operations that hand the
    /// server's record back untouched.
    pub fn parse_json(&self, response: HttpResponse) -> Result<Value, ApiError> {
        decode(&response)
    }

    /// Accept any 2xx response and discard the body.
    pub fn parse_empty(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    /// Request carrying the session headers that are currently held.
    fn request(&self, method: HttpMethod, service: Service, path: &str) -> HttpRequest {
        let mut request = self.bare_request(method, service, path);
        if let Some(token) = self.session.access_token() {
            request
                .headers
                .push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        if let Some(org) = self.session.organization_id() {
            request
                .headers
                .push((ORGANIZATION_HEADER.to_string(), org.to_string()));
        }
        request
    }

    fn bare_request(&self, method: HttpMethod, service: Service, path: &str) -> HttpRequest {
        HttpRequest {
            method,
            url: format!("{}{path}", self.config.service_url(service)),
            query: Vec::new(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: None,
        }
    }
}

fn with_json_body<T: Serialize + ?Sized>(
    mut request: HttpRequest,
    payload: &T,
) -> Result<HttpRequest, ApiError> {
    let body = serde_json::to_string(payload).map_err(|e| ApiError::Serialization(e.to_string()))?;
    request.body = Some(body);
    Ok(request)
}

/// Any non-2xx status is an `Http` error carrying the raw status and body.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    check_status(response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}
