use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::state::{LineItem, PurchaseOrder};
use crate::{authorize, error, ApiResult, Db};

fn parse_date(field: &str, value: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        error(
            StatusCode::BAD_REQUEST,
            &format!("{field} must be a YYYY-MM-DD date"),
        )
    })
}

#[derive(Deserialize)]
pub struct CreatePurchaseOrder {
    pub po_number: String,
    pub supplier_id: String,
    pub order_date: String,
    pub expected_arrival_date: String,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

#[derive(Deserialize)]
pub struct OrderQuery {
    pub status: Option<String>,
}

pub async fn create_purchase_order(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreatePurchaseOrder>,
) -> ApiResult<(StatusCode, Json<PurchaseOrder>)> {
    let mut platform = db.write().await;
    let account = authorize(&platform, &headers)?;

    if input.po_number.trim().is_empty() || input.supplier_id.trim().is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "po_number and supplier_id are required"));
    }
    if input.line_items.is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "at least one line item is required"));
    }
    let order_date = parse_date("order_date", &input.order_date)?;
    let expected_arrival_date = parse_date("expected_arrival_date", &input.expected_arrival_date)?;
    if expected_arrival_date < order_date {
        return Err(error(StatusCode::BAD_REQUEST, "expected_arrival_date precedes order_date"));
    }
    if let Some(item) = input
        .line_items
        .iter()
        .find(|item| !platform.owns_product(account.organization_id, item.product_id))
    {
        return Err(error(
            StatusCode::BAD_REQUEST,
            &format!("unknown product {}", item.product_id),
        ));
    }
    if platform
        .purchase_orders
        .iter()
        .any(|po| po.organization_id == account.organization_id && po.po_number == input.po_number)
    {
        return Err(error(StatusCode::CONFLICT, "po_number already exists"));
    }

    for item in &input.line_items {
        if let Some(buffer) = platform.buffers.get_mut(&item.product_id) {
            buffer.on_order += item.quantity as f64;
        }
    }
    let total_amount = input
        .line_items
        .iter()
        .map(|item| item.quantity as f64 * item.unit_cost)
        .sum();
    let order = PurchaseOrder {
        id: Uuid::new_v4(),
        po_number: input.po_number,
        supplier_id: input.supplier_id,
        organization_id: account.organization_id,
        status: "pending".to_string(),
        order_date,
        expected_arrival_date,
        line_items: input.line_items,
        total_amount,
    };
    platform.purchase_orders.push(order.clone());
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list_purchase_orders(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<OrderQuery>,
) -> ApiResult<Json<Value>> {
    let platform = db.read().await;
    let account = authorize(&platform, &headers)?;
    let orders: Vec<&PurchaseOrder> = platform
        .purchase_orders
        .iter()
        .filter(|po| po.organization_id == account.organization_id)
        .filter(|po| query.status.as_deref().map_or(true, |s| po.status == s))
        .collect();
    Ok(Json(json!({ "data": orders, "total": orders.len() })))
}

pub async fn get_purchase_order(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PurchaseOrder>> {
    let platform = db.read().await;
    let account = authorize(&platform, &headers)?;
    platform
        .purchase_orders
        .iter()
        .find(|po| po.id == id && po.organization_id == account.organization_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "purchase order not found"))
}

/// Only pending orders can be cancelled; their quantities leave on-order.
pub async fn cancel_purchase_order(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PurchaseOrder>> {
    let mut platform = db.write().await;
    let account = authorize(&platform, &headers)?;
    let order = platform
        .purchase_orders
        .iter_mut()
        .find(|po| po.id == id && po.organization_id == account.organization_id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "purchase order not found"))?;
    if order.status != "pending" {
        return Err(error(StatusCode::CONFLICT, "only pending orders can be cancelled"));
    }
    order.status = "cancelled".to_string();
    let order = order.clone();

    for item in &order.line_items {
        if let Some(buffer) = platform.buffers.get_mut(&item.product_id) {
            buffer.on_order = (buffer.on_order - item.quantity as f64).max(0.0);
        }
    }
    Ok(Json(order))
}
