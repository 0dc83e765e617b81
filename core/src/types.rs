//! Records and payloads exchanged with the platform services.
//!
//! # Design
//! Missing or `null` optional fields decode to fixed defaults instead of
//! failing: empty strings for descriptive text, `"active"` for product
//! status, `"unknown"` for buffer zones and `0` for buffer numerics.
//! Identity fields (`id`, `sku`, `email`, ...) stay required.
//!
//! Records are value snapshots. Nothing here refers back to the client.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_PRODUCT_STATUS: &str = "active";
pub const UNKNOWN_ZONE: &str = "unknown";

/// Treat an explicit JSON `null` the same as an absent key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn default_status() -> String {
    DEFAULT_PRODUCT_STATUS.to_string()
}

fn status_or_active<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_status))
}

/// Authenticated user returned by login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_name: String,
    pub organization_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub roles: BTreeSet<String>,
}

/// Catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub sku: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub unit_of_measure: String,
    #[serde(default = "default_status", deserialize_with = "status_or_active")]
    pub status: String,
}

/// Buffer zone derived from the raw label reported by the buffer engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Green,
    Yellow,
    Red,
    BelowRed,
    Unknown,
}

impl Zone {
    pub fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "green" => Zone::Green,
            "yellow" => Zone::Yellow,
            "red" => Zone::Red,
            "below_red" => Zone::BelowRed,
            _ => Zone::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Zone::Green => "green",
            Zone::Yellow => "yellow",
            Zone::Red => "red",
            Zone::BelowRed => "below_red",
            Zone::Unknown => UNKNOWN_ZONE,
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// DDMRP buffer snapshot for one product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Buffer {
    pub product_id: String,
    pub zone: String,
    pub net_flow_position: f64,
    pub buffer_penetration: f64,
    pub red_zone: f64,
    pub yellow_zone: f64,
    pub green_zone: f64,
}

impl Buffer {
    pub fn zone_kind(&self) -> Zone {
        Zone::from_label(&self.zone)
    }

    /// Fill a `Buffer` from its wire form. `product_id` is used when the
    /// server omits one.
    pub(crate) fn from_record(record: BufferRecord, product_id: &str) -> Self {
        Self {
            product_id: record.product_id.unwrap_or_else(|| product_id.to_string()),
            zone: record.zone.unwrap_or_else(|| UNKNOWN_ZONE.to_string()),
            net_flow_position: record.net_flow_position,
            buffer_penetration: record.buffer_penetration,
            red_zone: record.red_zone,
            yellow_zone: record.yellow_zone,
            green_zone: record.green_zone,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BufferRecord {
    #[serde(default)]
    product_id: Option<String>,
    #[serde(default)]
    zone: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    net_flow_position: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    buffer_penetration: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    red_zone: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    yellow_zone: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    green_zone: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BufferEnvelope {
    #[serde(default, deserialize_with = "null_as_default")]
    pub buffer: BufferRecord,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductPage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DataPage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NotificationPage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub notifications: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UnreadCount {
    #[serde(default, deserialize_with = "null_as_default")]
    pub unread_count: u64,
}

/// Body of a successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: User,
}

/// Body of a successful token refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Login payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Payload for creating a catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub category: String,
    pub unit_of_measure: String,
}

/// One line of a purchase order. `extra` is sent inline next to the three
/// typed fields, for servers that accept more per-line data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: String,
    pub quantity: u64,
    pub unit_cost: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LineItem {
    pub fn new(product_id: impl Into<String>, quantity: u64, unit_cost: f64) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            unit_cost,
            extra: Map::new(),
        }
    }

    /// Attach an additional field. Must not reuse one of the typed names.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }
}

/// Payload for creating a purchase order. Dates serialize as `YYYY-MM-DD`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPurchaseOrder {
    pub po_number: String,
    pub supplier_id: String,
    pub order_date: NaiveDate,
    pub expected_arrival_date: NaiveDate,
    pub line_items: Vec<LineItem>,
}
