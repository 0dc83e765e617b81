//! Blocking client that runs each `GiiaClient` operation over a `Transport`.
//!
//! Every method is `build_*` → `Transport::execute` → `parse_*`, one request
//! per call. Errors from any stage are returned unchanged. The one exception
//! is `logout`, which always clears the session and only logs a failed
//! server call.

use serde_json::Value;

use crate::client::GiiaClient;
use crate::config::{ClientConfig, Service};
use crate::error::ApiError;
use crate::session::Session;
use crate::transport::{Transport, UreqTransport};
use crate::types::{Buffer, LineItem, NewProduct, Product, User};

/// Not meant for concurrent use; callers serialize access or keep one
/// client per thread.
pub struct PlatformClient<T: Transport = UreqTransport> {
    inner: GiiaClient,
    transport: T,
}

impl PlatformClient<UreqTransport> {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }

    /// Client configured from `GIIA_API_URL`.
    pub fn from_env() -> Self {
        Self::new(ClientConfig::from_env())
    }
}

impl<T: Transport> PlatformClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            inner: GiiaClient::new(config),
            transport,
        }
    }

    pub fn session(&self) -> &Session {
        self.inner.session()
    }

    pub fn config(&self) -> &ClientConfig {
        self.inner.config()
    }

    pub fn login(&mut self, email: &str, password: &str) -> Result<User, ApiError> {
        let request = self.inner.build_login(email, password)?;
        let response = self.transport.execute(request)?;
        self.inner.parse_login(response)
    }

    pub fn refresh_token(&mut self) -> Result<String, ApiError> {
        let request = self.inner.build_refresh_token()?;
        let response = self.transport.execute(request)?;
        self.inner.parse_refresh_token(response)
    }

    pub fn logout(&mut self) {
        let request = self.inner.build_logout();
        let outcome = self
            .transport
            .execute(request)
            .and_then(|response| self.inner.parse_empty(response));
        if let Err(e) = outcome {
            log::warn!("logout request failed, clearing local session anyway: {e}");
        }
        self.inner.clear_session();
        log::info!("session cleared");
    }

    pub fn list_products(
        &self,
        page: u32,
        page_size: u32,
        status: Option<&str>,
    ) -> Result<Vec<Product>, ApiError> {
        let request = self.inner.build_list_products(page, page_size, status);
        self.inner.parse_list_products(self.transport.execute(request)?)
    }

    pub fn get_product(&self, product_id: &str) -> Result<Product, ApiError> {
        let request = self.inner.build_get_product(product_id);
        self.inner.parse_get_product(self.transport.execute(request)?)
    }

    pub fn create_product(
        &self,
        sku: &str,
        name: &str,
        category: &str,
        unit_of_measure: &str,
    ) -> Result<Product, ApiError> {
        let input = NewProduct {
            sku: sku.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            unit_of_measure: unit_of_measure.to_string(),
        };
        let request = self.inner.build_create_product(&input)?;
        self.inner.parse_create_product(self.transport.execute(request)?)
    }

    pub fn get_buffer(&self, product_id: &str) -> Result<Buffer, ApiError> {
        let request = self.inner.build_get_buffer(product_id);
        self.inner.parse_buffer(self.transport.execute(request)?, product_id)
    }

    pub fn calculate_buffer(&self, product_id: &str) -> Result<Buffer, ApiError> {
        let request = self.inner.build_calculate_buffer(product_id);
        self.inner.parse_buffer(self.transport.execute(request)?, product_id)
    }

    pub fn create_purchase_order(
        &self,
        po_number: &str,
        supplier_id: &str,
        line_items: Vec<LineItem>,
        expected_days: u32,
    ) -> Result<Value, ApiError> {
        let request =
            self.inner
                .build_create_purchase_order(po_number, supplier_id, line_items, expected_days)?;
        self.inner.parse_json(self.transport.execute(request)?)
    }

    pub fn list_purchase_orders(&self, status: Option<&str>) -> Result<Vec<Value>, ApiError> {
        let request = self.inner.build_list_purchase_orders(status);
        self.inner.parse_list_purchase_orders(self.transport.execute(request)?)
    }

    pub fn get_purchase_order(&self, order_id: &str) -> Result<Value, ApiError> {
        let request = self.inner.build_get_purchase_order(order_id);
        self.inner.parse_json(self.transport.execute(request)?)
    }

    pub fn cancel_purchase_order(&self, order_id: &str) -> Result<Value, ApiError> {
        let request = self.inner.build_cancel_purchase_order(order_id);
        self.inner.parse_json(self.transport.execute(request)?)
    }

    pub fn get_kpi_snapshot(&self) -> Result<Value, ApiError> {
        let request = self.inner.build_get_kpi_snapshot();
        self.inner.parse_json(self.transport.execute(request)?)
    }

    pub fn get_notifications(&self, unread_only: bool) -> Result<Vec<Value>, ApiError> {
        let request = self.inner.build_get_notifications(unread_only);
        self.inner.parse_notifications(self.transport.execute(request)?)
    }

    pub fn get_unread_count(&self) -> Result<u64, ApiError> {
        let request = self.inner.build_get_unread_count();
        self.inner.parse_unread_count(self.transport.execute(request)?)
    }

    pub fn mark_notification_read(&self, notification_id: &str) -> Result<(), ApiError> {
        let request = self.inner.build_mark_notification_read(notification_id)?;
        self.inner.parse_empty(self.transport.execute(request)?)
    }

    pub fn health_check(&self, service: Service) -> Result<(), ApiError> {
        let request = self.inner.build_health_check(service);
        self.inner.parse_empty(self.transport.execute(request)?)
    }
}
