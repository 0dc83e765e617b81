use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::state::{BufferState, Platform};
use crate::{authorize, error, ApiResult, Db};

fn buffer_json(buffer: &BufferState) -> Value {
    json!({
        "buffer": {
            "product_id": buffer.product_id,
            "zone": buffer.zone(),
            "net_flow_position": buffer.net_flow_position(),
            "buffer_penetration": buffer.penetration(),
            "red_zone": buffer.red_zone,
            "yellow_zone": buffer.yellow_zone,
            "green_zone": buffer.green_zone,
            "on_hand": buffer.on_hand,
            "on_order": buffer.on_order,
            "qualified_demand": buffer.qualified_demand,
            "calculations": buffer.calculations,
        }
    })
}

fn owned_buffer<'a>(
    platform: &'a mut Platform,
    organization_id: Uuid,
    product_id: Uuid,
) -> ApiResult<&'a mut BufferState> {
    let owned = platform
        .products
        .iter()
        .any(|p| p.id == product_id && p.organization_id == organization_id);
    if !owned {
        return Err(error(StatusCode::NOT_FOUND, "product not found"));
    }
    platform
        .buffers
        .get_mut(&product_id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "buffer not found"))
}

pub async fn get_buffer(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(product_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let mut platform = db.write().await;
    let account = authorize(&platform, &headers)?;
    let buffer = owned_buffer(&mut platform, account.organization_id, product_id)?;
    Ok(Json(buffer_json(buffer)))
}

/// Recomputes the derived figures and counts the recalculation.
pub async fn calculate_buffer(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(product_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let mut platform = db.write().await;
    let account = authorize(&platform, &headers)?;
    let buffer = owned_buffer(&mut platform, account.organization_id, product_id)?;
    buffer.calculations += 1;
    Ok(Json(buffer_json(buffer)))
}
