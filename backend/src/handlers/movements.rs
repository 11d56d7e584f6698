//! HTTP handlers for the ingredient and product ledgers

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::Utc;
use shared::{IngredientMovementType, PaginatedResponse, ProductMovementType};
use uuid::Uuid;

use super::{json_body, page_from, query_params};
use crate::error::AppResult;
use crate::services::ingredient_ledger::{IngredientMovement, MovementStats, MovementStatsQuery};
use crate::services::ledger::{AppendMovementInput, MovementFilters, UpdateAnnotationsInput};
use crate::services::product_stock::{
    AppendProductMovementInput, ProductMovement, ProductMovementOutcome,
};
use crate::services::{IngredientLedgerService, ProductStockService};
use crate::AppState;

// ============================================================================
// Ingredient ledger
// ============================================================================

/// Record an ingredient movement
pub async fn append_ingredient_movement(
    State(state): State<AppState>,
    body: Result<Json<AppendMovementInput>, JsonRejection>,
) -> AppResult<(StatusCode, Json<IngredientMovement>)> {
    let input = json_body(body)?;
    let service = IngredientLedgerService::new(state.db);
    let movement = service.append_movement(input).await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

/// List ingredient movements
pub async fn list_ingredient_movements(
    State(state): State<AppState>,
    query: Result<Query<MovementFilters>, QueryRejection>,
) -> AppResult<Json<PaginatedResponse<IngredientMovement>>> {
    let filters = query_params(query)?;
    let page = page_from(&state, filters.limit, filters.offset);
    let service = IngredientLedgerService::new(state.db);
    let movements = service.list_movements(&filters, page).await?;
    Ok(Json(movements))
}

/// Get an ingredient movement
pub async fn get_ingredient_movement(
    State(state): State<AppState>,
    Path(movement_id): Path<Uuid>,
) -> AppResult<Json<IngredientMovement>> {
    let service = IngredientLedgerService::new(state.db);
    let movement = service.get_movement(movement_id).await?;
    Ok(Json(movement))
}

/// Update the annotations of an ingredient movement
pub async fn update_ingredient_movement(
    State(state): State<AppState>,
    Path(movement_id): Path<Uuid>,
    body: Result<Json<UpdateAnnotationsInput<IngredientMovementType>>, JsonRejection>,
) -> AppResult<Json<IngredientMovement>> {
    let input = json_body(body)?;
    let service = IngredientLedgerService::new(state.db);
    let movement = service.update_movement(movement_id, input).await?;
    Ok(Json(movement))
}

/// Movement statistics for a period or an explicit date range
pub async fn ingredient_movement_stats(
    State(state): State<AppState>,
    query: Result<Query<MovementStatsQuery>, QueryRejection>,
) -> AppResult<Json<MovementStats>> {
    let query = query_params(query)?;
    let range = shared::resolve_stats_range(
        query.period,
        query.start_date,
        query.end_date,
        Utc::now().date_naive(),
    );
    let service = IngredientLedgerService::new(state.db);
    let stats = service.movement_stats(range).await?;
    Ok(Json(stats))
}

// ============================================================================
// Product ledger
// ============================================================================

/// Record a product movement, updating stock unless opted out
pub async fn append_product_movement(
    State(state): State<AppState>,
    body: Result<Json<AppendProductMovementInput>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ProductMovementOutcome>)> {
    let input = json_body(body)?;
    let service = ProductStockService::new(state.db);
    let outcome = service.append_movement(input).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// List product movements
pub async fn list_product_movements(
    State(state): State<AppState>,
    query: Result<Query<MovementFilters>, QueryRejection>,
) -> AppResult<Json<PaginatedResponse<ProductMovement>>> {
    let filters = query_params(query)?;
    let page = page_from(&state, filters.limit, filters.offset);
    let service = ProductStockService::new(state.db);
    let movements = service.list_movements(&filters, page).await?;
    Ok(Json(movements))
}

/// Get a product movement
pub async fn get_product_movement(
    State(state): State<AppState>,
    Path(movement_id): Path<Uuid>,
) -> AppResult<Json<ProductMovement>> {
    let service = ProductStockService::new(state.db);
    let movement = service.get_movement(movement_id).await?;
    Ok(Json(movement))
}

/// Update the annotations of a product movement
pub async fn update_product_movement(
    State(state): State<AppState>,
    Path(movement_id): Path<Uuid>,
    body: Result<Json<UpdateAnnotationsInput<ProductMovementType>>, JsonRejection>,
) -> AppResult<Json<ProductMovement>> {
    let input = json_body(body)?;
    let service = ProductStockService::new(state.db);
    let movement = service.update_movement(movement_id, input).await?;
    Ok(Json(movement))
}
