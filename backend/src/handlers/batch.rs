//! HTTP handlers for the batch stock registry

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::{json_body, query_params};
use crate::error::AppResult;
use crate::services::batch_stock::{
    BatchEntryInput, BatchFilters, BatchListResponse, BatchStockEntry,
};
use crate::services::BatchStockService;
use crate::AppState;

fn batch_service(state: AppState) -> BatchStockService {
    BatchStockService::new(state.db, state.config.stock.expiry_horizon_days)
}

/// Register a received batch
pub async fn create_batch(
    State(state): State<AppState>,
    body: Result<Json<BatchEntryInput>, JsonRejection>,
) -> AppResult<(StatusCode, Json<BatchStockEntry>)> {
    let input = json_body(body)?;
    let batch = batch_service(state).create_batch(input).await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

/// List batches with status annotations and a summary
pub async fn list_batches(
    State(state): State<AppState>,
    query: Result<Query<BatchFilters>, QueryRejection>,
) -> AppResult<Json<BatchListResponse>> {
    let filters = query_params(query)?;
    let batches = batch_service(state).list_batches(&filters).await?;
    Ok(Json(batches))
}

/// Get one batch
pub async fn get_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<BatchStockEntry>> {
    let batch = batch_service(state).get_batch(batch_id).await?;
    Ok(Json(batch))
}

/// Replace a batch with the full entry in the body
pub async fn replace_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
    body: Result<Json<BatchEntryInput>, JsonRejection>,
) -> AppResult<Json<BatchStockEntry>> {
    let input = json_body(body)?;
    let batch = batch_service(state).replace_batch(batch_id, input).await?;
    Ok(Json(batch))
}

/// Delete a batch
pub async fn delete_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    batch_service(state).delete_batch(batch_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
