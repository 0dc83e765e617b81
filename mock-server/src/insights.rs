//! Analytics and notification endpoints. Both only read what the other
//! services wrote, apart from marking notifications read.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::state::Notification;
use crate::{authorize, error, ApiResult, Db};

#[derive(Deserialize)]
pub struct NotificationQuery {
    pub unread_only: Option<String>,
}

#[derive(Deserialize)]
pub struct NotificationUpdate {
    pub status: String,
}

pub async fn snapshot(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    let platform = db.read().await;
    let account = authorize(&platform, &headers)?;

    let buffers: Vec<_> = platform
        .products
        .iter()
        .filter(|p| p.organization_id == account.organization_id)
        .filter_map(|p| platform.buffers.get(&p.id))
        .collect();
    let count = |zone: &str| buffers.iter().filter(|b| b.zone() == zone).count();
    let (green, yellow, red, below_red) = (count("green"), count("yellow"), count("red"), count("below_red"));

    let total = buffers.len();
    let stockout_rate = if total == 0 {
        0.0
    } else {
        below_red as f64 / total as f64
    };
    let average_penetration = if total == 0 {
        0.0
    } else {
        buffers.iter().map(|b| b.penetration()).sum::<f64>() / total as f64
    };
    let open_purchase_orders = platform
        .purchase_orders
        .iter()
        .filter(|po| po.organization_id == account.organization_id && po.status == "pending")
        .count();

    Ok(Json(json!({
        "organization_id": account.organization_id,
        "total_products": total,
        "zones": {
            "green": green,
            "yellow": yellow,
            "red": red,
            "below_red": below_red,
        },
        "service_level": 1.0 - stockout_rate,
        "stockout_rate": stockout_rate,
        "average_buffer_penetration": average_penetration,
        "open_purchase_orders": open_purchase_orders,
    })))
}

pub async fn list_notifications(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<NotificationQuery>,
) -> ApiResult<Json<Value>> {
    let platform = db.read().await;
    authorize(&platform, &headers)?;
    let unread_only = query.unread_only.as_deref() == Some("true");
    let notifications: Vec<&Notification> = platform
        .notifications
        .iter()
        .filter(|n| !unread_only || n.status == "unread")
        .collect();
    Ok(Json(json!({
        "notifications": notifications,
        "total": notifications.len(),
    })))
}

pub async fn unread_count(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    let platform = db.read().await;
    authorize(&platform, &headers)?;
    let unread = platform
        .notifications
        .iter()
        .filter(|n| n.status == "unread")
        .count();
    Ok(Json(json!({ "unread_count": unread })))
}

pub async fn update_notification(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(input): Json<NotificationUpdate>,
) -> ApiResult<Json<Notification>> {
    let mut platform = db.write().await;
    authorize(&platform, &headers)?;
    if input.status != "read" && input.status != "unread" {
        return Err(error(StatusCode::BAD_REQUEST, "status must be read or unread"));
    }
    let notification = platform
        .notifications
        .iter_mut()
        .find(|n| n.id == id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "notification not found"))?;
    notification.status = input.status;
    Ok(Json(notification.clone()))
}
