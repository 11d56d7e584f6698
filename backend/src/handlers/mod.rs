//! HTTP handlers for the kitchen inventory API

pub mod batch;
pub mod catalog;
pub mod health;
pub mod movements;
pub mod stock;

pub use batch::*;
pub use catalog::*;
pub use health::*;
pub use movements::*;
pub use stock::*;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::Json;
use shared::Pagination;

use crate::error::{AppError, AppResult};
use crate::AppState;

/// Unwrap a JSON body, reporting a malformed one as a validation error
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::validation("body", rejection.body_text()))
}

/// Unwrap a query string, reporting a malformed one as a validation error
pub(crate) fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> AppResult<T> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| AppError::validation("query", rejection.body_text()))
}

/// Page bounds from the request, limited by the configured sizes
pub(crate) fn page_from(state: &AppState, limit: Option<i64>, offset: Option<i64>) -> Pagination {
    Pagination::clamped(
        limit,
        offset,
        state.config.stock.default_page_size,
        state.config.stock.max_page_size,
    )
}
