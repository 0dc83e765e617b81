//! In-memory platform state shared by every mock service.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEMO_EMAIL: &str = "demo@example.com";
pub const DEMO_PASSWORD: &str = "password";
pub const TOKEN_TTL_SECS: u64 = 900;
pub const REFRESH_TTL_SECS: u64 = 7 * 24 * 60 * 60;
pub const REFRESH_COOKIE: &str = "refresh_token";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub organization_id: Uuid,
    pub roles: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub category: String,
    pub unit_of_measure: String,
    pub status: String,
    pub organization_id: Uuid,
}

/// Stock levels and zone thresholds for one product.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BufferState {
    pub product_id: Uuid,
    pub on_hand: f64,
    pub on_order: f64,
    pub qualified_demand: f64,
    pub red_zone: f64,
    pub yellow_zone: f64,
    pub green_zone: f64,
    pub calculations: u32,
}

impl BufferState {
    pub fn net_flow_position(&self) -> f64 {
        self.on_hand + self.on_order - self.qualified_demand
    }

    pub fn top_of_green(&self) -> f64 {
        self.red_zone + self.yellow_zone + self.green_zone
    }

    /// Share of the buffer consumed, 0 when full and 1 when empty or below.
    pub fn penetration(&self) -> f64 {
        let top = self.top_of_green();
        if top <= 0.0 {
            return 0.0;
        }
        ((top - self.net_flow_position()) / top).clamp(0.0, 1.0)
    }

    pub fn zone(&self) -> &'static str {
        let nfp = self.net_flow_position();
        if nfp > self.red_zone + self.yellow_zone {
            "green"
        } else if nfp > self.red_zone {
            "yellow"
        } else if nfp > 0.0 {
            "red"
        } else {
            "below_red"
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: Uuid,
    pub quantity: u64,
    pub unit_cost: f64,
    /// Any further fields the caller sent, echoed back unchanged.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub po_number: String,
    pub supplier_id: String,
    pub organization_id: Uuid,
    pub status: String,
    pub order_date: NaiveDate,
    pub expected_arrival_date: NaiveDate,
    pub line_items: Vec<LineItem>,
    pub total_amount: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub priority: String,
    pub status: String,
}

/// A live refresh token and the access token it was issued alongside.
#[derive(Clone, Debug)]
pub struct RefreshGrant {
    pub account_id: Uuid,
    pub access_token: String,
}

/// Everything the six services read and write.
#[derive(Debug, Default)]
pub struct Platform {
    pub accounts: Vec<Account>,
    /// access token → account id
    pub access_tokens: HashMap<String, Uuid>,
    pub refresh_tokens: HashMap<String, RefreshGrant>,
    pub products: Vec<Product>,
    pub buffers: HashMap<Uuid, BufferState>,
    pub purchase_orders: Vec<PurchaseOrder>,
    pub notifications: Vec<Notification>,
}

impl Platform {
    /// One demo account, a small catalog with a buffer per product, and a
    /// few notifications.
    pub fn seeded() -> Self {
        let organization_id = Uuid::new_v4();
        let account = Account {
            id: Uuid::new_v4(),
            email: DEMO_EMAIL.to_string(),
            password: DEMO_PASSWORD.to_string(),
            first_name: "Demo".to_string(),
            last_name: "User".to_string(),
            organization_id,
            roles: vec!["admin".to_string(), "planner".to_string()],
        };

        let mut platform = Platform {
            accounts: vec![account],
            ..Platform::default()
        };

        // (sku, name, category, on_hand, demand)
        let catalog = [
            ("BOLT-M8", "M8 Hex Bolt", "Fasteners", 900.0, 300.0),
            ("NUT-M8", "M8 Hex Nut", "Fasteners", 520.0, 300.0),
            ("WASH-M8", "M8 Washer", "Fasteners", 200.0, 300.0),
            ("BRKT-01", "Steel Bracket", "Structural", 160.0, 100.0),
            ("PLATE-02", "Mounting Plate", "Structural", 40.0, 20.0),
            ("GEAR-12", "12T Spur Gear", "Drivetrain", 75.0, 60.0),
            ("BELT-V4", "V-Belt A42", "Drivetrain", 12.0, 30.0),
            ("OIL-5L", "Gear Oil 5L", "Consumables", 60.0, 15.0),
        ];
        for (sku, name, category, on_hand, demand) in catalog {
            let product = platform.add_product(organization_id, sku, name, category, "units");
            if let Some(buffer) = platform.buffers.get_mut(&product.id) {
                buffer.on_hand = on_hand;
                buffer.qualified_demand = demand;
            }
        }

        platform.notifications = vec![
            notification("Buffer below red zone", "V-Belt A42 needs replenishment", "critical", "unread"),
            notification("Buffer in yellow zone", "M8 Hex Nut is trending down", "high", "unread"),
            notification("Weekly digest ready", "Your inventory digest is available", "info", "read"),
        ];
        platform
    }

    pub fn account(&self, id: Uuid) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    /// Insert a product together with an empty buffer sized from defaults.
    pub fn add_product(
        &mut self,
        organization_id: Uuid,
        sku: &str,
        name: &str,
        category: &str,
        unit_of_measure: &str,
    ) -> Product {
        let product = Product {
            id: Uuid::new_v4(),
            sku: sku.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            unit_of_measure: unit_of_measure.to_string(),
            status: "active".to_string(),
            organization_id,
        };
        self.buffers.insert(
            product.id,
            BufferState {
                product_id: product.id,
                on_hand: 0.0,
                on_order: 0.0,
                qualified_demand: 0.0,
                red_zone: 100.0,
                yellow_zone: 150.0,
                green_zone: 200.0,
                calculations: 0,
            },
        );
        self.products.push(product.clone());
        product
    }

    pub fn issue_tokens(&mut self, account_id: Uuid) -> (String, String) {
        let access = format!("at_{}", Uuid::new_v4().simple());
        let refresh = format!("rt_{}", Uuid::new_v4().simple());
        self.access_tokens.insert(access.clone(), account_id);
        self.refresh_tokens.insert(
            refresh.clone(),
            RefreshGrant {
                account_id,
                access_token: access.clone(),
            },
        );
        (access, refresh)
    }

    /// Exchange a refresh token for a new pair. The presented refresh token
    /// and the access token issued with it both stop working.
    pub fn rotate_tokens(&mut self, refresh_token: &str) -> Option<(String, String)> {
        let grant = self.refresh_tokens.remove(refresh_token)?;
        self.access_tokens.remove(&grant.access_token);
        Some(self.issue_tokens(grant.account_id))
    }

    /// Products of `organization_id` only.
    pub fn owns_product(&self, organization_id: Uuid, product_id: Uuid) -> bool {
        self.products
            .iter()
            .any(|p| p.id == product_id && p.organization_id == organization_id)
    }
}

fn notification(title: &str, message: &str, priority: &str, status: &str) -> Notification {
    Notification {
        id: Uuid::new_v4(),
        title: title.to_string(),
        message: message.to_string(),
        priority: priority.to_string(),
        status: status.to_string(),
    }
}
