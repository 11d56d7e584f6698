//! Route definitions for the kitchen inventory API

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/ingredient-movements", ingredient_movement_routes())
        .nest("/ingredient-stock", ingredient_stock_routes())
        .nest("/product-movements", product_movement_routes())
        .nest("/product-stock", product_stock_routes())
        .nest("/batch-stock", batch_stock_routes())
        .nest("/ingredients", ingredient_routes())
        .nest("/products", product_routes())
}

/// Ingredient ledger routes
fn ingredient_movement_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(handlers::append_ingredient_movement).get(handlers::list_ingredient_movements),
        )
        .route("/stats", get(handlers::ingredient_movement_stats))
        .route(
            "/:movement_id",
            get(handlers::get_ingredient_movement).put(handlers::update_ingredient_movement),
        )
}

/// Derived ingredient stock routes
fn ingredient_stock_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_ingredient_stock))
        .route("/:ingredient_id", get(handlers::get_ingredient_stock))
}

/// Product ledger routes
fn product_movement_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(handlers::append_product_movement).get(handlers::list_product_movements),
        )
        .route(
            "/:movement_id",
            get(handlers::get_product_movement).put(handlers::update_product_movement),
        )
}

/// Materialized product stock routes
fn product_stock_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_product_stock))
        .route("/:product_id", get(handlers::get_product_stock))
}

/// Batch stock registry routes
fn batch_stock_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_batches).post(handlers::create_batch))
        .route(
            "/:batch_id",
            get(handlers::get_batch)
                .put(handlers::replace_batch)
                .delete(handlers::delete_batch),
        )
}

/// Ingredient catalog routes
fn ingredient_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_ingredients).post(handlers::create_ingredient))
        .route("/:ingredient_id", get(handlers::get_ingredient))
}

/// Product catalog routes
fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_products).post(handlers::create_product))
        .route("/:product_id", get(handlers::get_product))
}
