//! HTTP handlers for current stock views

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use shared::DerivedStock;
use uuid::Uuid;

use super::query_params;
use crate::error::AppResult;
use crate::services::ingredient_stock::{DerivedStockFilters, DerivedStockResponse};
use crate::services::product_stock::ProductStockView;
use crate::services::{IngredientStockService, ProductStockService};
use crate::AppState;

/// Derived stock of all ingredients
pub async fn list_ingredient_stock(
    State(state): State<AppState>,
    query: Result<Query<DerivedStockFilters>, QueryRejection>,
) -> AppResult<Json<DerivedStockResponse>> {
    let filters = query_params(query)?;
    let service = IngredientStockService::new(state.db);
    let stock = service.list_derived_stock(&filters).await?;
    Ok(Json(stock))
}

/// Derived stock of one ingredient
pub async fn get_ingredient_stock(
    State(state): State<AppState>,
    Path(ingredient_id): Path<Uuid>,
) -> AppResult<Json<DerivedStock>> {
    let service = IngredientStockService::new(state.db);
    let stock = service.get_derived_stock(ingredient_id).await?;
    Ok(Json(stock))
}

/// Materialized stock of all products
pub async fn list_product_stock(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ProductStockView>>> {
    let service = ProductStockService::new(state.db);
    let stock = service.list_stock().await?;
    Ok(Json(stock))
}

/// Materialized stock of one product
pub async fn get_product_stock(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ProductStockView>> {
    let service = ProductStockService::new(state.db);
    let stock = service.get_stock(product_id).await?;
    Ok(Json(stock))
}
