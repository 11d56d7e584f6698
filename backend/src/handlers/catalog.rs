//! HTTP handlers for ingredients and products

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::json_body;
use crate::error::AppResult;
use crate::services::catalog::{CreateIngredientInput, CreateProductInput, Ingredient, Product};
use crate::services::CatalogService;
use crate::AppState;

/// Register an ingredient
pub async fn create_ingredient(
    State(state): State<AppState>,
    body: Result<Json<CreateIngredientInput>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Ingredient>)> {
    let input = json_body(body)?;
    let service = CatalogService::new(state.db);
    let ingredient = service.create_ingredient(input).await?;
    Ok((StatusCode::CREATED, Json(ingredient)))
}

/// List ingredients
pub async fn list_ingredients(State(state): State<AppState>) -> AppResult<Json<Vec<Ingredient>>> {
    let service = CatalogService::new(state.db);
    let ingredients = service.list_ingredients().await?;
    Ok(Json(ingredients))
}

/// Get an ingredient
pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(ingredient_id): Path<Uuid>,
) -> AppResult<Json<Ingredient>> {
    let service = CatalogService::new(state.db);
    let ingredient = service.get_ingredient(ingredient_id).await?;
    Ok(Json(ingredient))
}

/// Register a product
pub async fn create_product(
    State(state): State<AppState>,
    body: Result<Json<CreateProductInput>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let input = json_body(body)?;
    let service = CatalogService::new(state.db);
    let product = service.create_product(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// List products
pub async fn list_products(State(state): State<AppState>) -> AppResult<Json<Vec<Product>>> {
    let service = CatalogService::new(state.db);
    let products = service.list_products().await?;
    Ok(Json(products))
}

/// Get a product
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Product>> {
    let service = CatalogService::new(state.db);
    let product = service.get_product(product_id).await?;
    Ok(Json(product))
}
