use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::state::Product;
use crate::{authorize, error, ApiResult, Db};

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;

#[derive(Deserialize)]
pub struct ProductQuery {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateProduct {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub unit_of_measure: String,
}

pub async fn list_products(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<ProductQuery>,
) -> ApiResult<Json<Value>> {
    let platform = db.read().await;
    let account = authorize(&platform, &headers)?;

    let page = query.page.unwrap_or(1).max(1);
    let page_size = query
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let matching: Vec<&Product> = platform
        .products
        .iter()
        .filter(|p| p.organization_id == account.organization_id)
        .filter(|p| query.status.as_deref().map_or(true, |s| p.status == s))
        .collect();
    let products: Vec<&Product> = matching
        .iter()
        .skip(page.saturating_sub(1).saturating_mul(page_size))
        .take(page_size)
        .copied()
        .collect();

    Ok(Json(json!({
        "products": products,
        "total": matching.len(),
        "page": page,
        "page_size": page_size,
    })))
}

pub async fn get_product(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Product>> {
    let platform = db.read().await;
    let account = authorize(&platform, &headers)?;
    platform
        .products
        .iter()
        .find(|p| p.id == id && p.organization_id == account.organization_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "product not found"))
}

pub async fn create_product(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreateProduct>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let mut platform = db.write().await;
    let account = authorize(&platform, &headers)?;
    if input.sku.trim().is_empty() || input.name.trim().is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "sku and name are required"));
    }
    if platform
        .products
        .iter()
        .any(|p| p.organization_id == account.organization_id && p.sku == input.sku)
    {
        return Err(error(StatusCode::CONFLICT, "sku already exists"));
    }
    let product = platform.add_product(
        account.organization_id,
        &input.sku,
        &input.name,
        &input.category,
        &input.unit_of_measure,
    );
    Ok((StatusCode::CREATED, Json(product)))
}
