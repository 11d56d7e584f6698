//! Catalog service for the subjects the ledgers refer to
//!
//! Ingredients carry the static reference cost used to value outbound
//! movements. Products carry structured allergen, nutrition and social media
//! blocks stored as JSONB.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{AllergenInfo, NutritionInfo, SocialMediaLinks, StockSubject};
use sqlx::{types::Json, FromRow, PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Catalog service for ingredients and products
#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
}

/// A raw ingredient tracked by the ingredient ledger
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub unit: String,
    pub category: Option<String>,
    pub cost_per_unit: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Ingredient> for StockSubject {
    fn from(i: Ingredient) -> Self {
        StockSubject {
            id: i.id,
            name: i.name,
            unit: i.unit,
            category: i.category,
            cost_per_unit: i.cost_per_unit,
        }
    }
}

/// Input for registering an ingredient
#[derive(Debug, Deserialize, Validate)]
pub struct CreateIngredientInput {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 20, message = "Unit must be 1-20 characters"))]
    pub unit: String,
    #[validate(length(max = 100, message = "Category must be at most 100 characters"))]
    pub category: Option<String>,
    pub cost_per_unit: Option<Decimal>,
}

/// A sellable product tracked by the product ledger
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub unit: String,
    pub price: Option<Decimal>,
    pub allergens: Option<AllergenInfo>,
    pub nutrition: Option<NutritionInfo>,
    pub social_media: Option<SocialMediaLinks>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    unit: String,
    price: Option<Decimal>,
    allergens: Option<Json<AllergenInfo>>,
    nutrition: Option<Json<NutritionInfo>>,
    social_media: Option<Json<SocialMediaLinks>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            unit: row.unit,
            price: row.price,
            allergens: row.allergens.map(|j| j.0),
            nutrition: row.nutrition.map(|j| j.0),
            social_media: row.social_media.map(|j| j.0),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Input for registering a product
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 20, message = "Unit must be 1-20 characters"))]
    pub unit: Option<String>,
    pub price: Option<Decimal>,
    pub allergens: Option<AllergenInfo>,
    pub nutrition: Option<NutritionInfo>,
    pub social_media: Option<SocialMediaLinks>,
}

const INGREDIENT_COLUMNS: &str =
    "id, name, unit, category, cost_per_unit, created_at, updated_at";

const PRODUCT_COLUMNS: &str =
    "id, name, unit, price, allergens, nutrition, social_media, created_at, updated_at";

/// Fetch an ingredient inside an open transaction, or fail referentially
pub(crate) async fn require_ingredient(
    conn: &mut PgConnection,
    ingredient_id: Uuid,
) -> AppResult<Ingredient> {
    sqlx::query_as::<_, Ingredient>(&format!(
        "SELECT {} FROM ingredients WHERE id = $1",
        INGREDIENT_COLUMNS
    ))
    .bind(ingredient_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::referential("Ingredient", ingredient_id))
}

/// Check a product exists inside an open transaction, or fail referentially
pub(crate) async fn require_product(conn: &mut PgConnection, product_id: Uuid) -> AppResult<()> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
        .bind(product_id)
        .fetch_one(&mut *conn)
        .await?;

    if !exists {
        return Err(AppError::referential("Product", product_id));
    }
    Ok(())
}

impl CatalogService {
    /// Create a new CatalogService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Register an ingredient
    pub async fn create_ingredient(&self, input: CreateIngredientInput) -> AppResult<Ingredient> {
        input.validate()?;
        shared::validate_cost(input.cost_per_unit)?;

        let ingredient = sqlx::query_as::<_, Ingredient>(&format!(
            r#"
            INSERT INTO ingredients (name, unit, category, cost_per_unit)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            INGREDIENT_COLUMNS
        ))
        .bind(input.name.trim())
        .bind(input.unit.trim())
        .bind(&input.category)
        .bind(input.cost_per_unit)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(ingredient_id = %ingredient.id, "Ingredient registered");
        Ok(ingredient)
    }

    /// Get an ingredient by ID
    pub async fn get_ingredient(&self, ingredient_id: Uuid) -> AppResult<Ingredient> {
        sqlx::query_as::<_, Ingredient>(&format!(
            "SELECT {} FROM ingredients WHERE id = $1",
            INGREDIENT_COLUMNS
        ))
        .bind(ingredient_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ingredient".to_string()))
    }

    /// List ingredients by name
    pub async fn list_ingredients(&self) -> AppResult<Vec<Ingredient>> {
        let ingredients = sqlx::query_as::<_, Ingredient>(&format!(
            "SELECT {} FROM ingredients ORDER BY name ASC, id ASC",
            INGREDIENT_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(ingredients)
    }

    /// Register a product
    pub async fn create_product(&self, input: CreateProductInput) -> AppResult<Product> {
        input.validate()?;
        shared::validate_cost(input.price).map_err(|_| {
            AppError::validation(
                "price",
                "Price must be non-negative with at most 4 decimal places",
            )
        })?;

        let unit = input.unit.as_deref().map(str::trim).unwrap_or("pcs");

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            INSERT INTO products (name, unit, price, allergens, nutrition, social_media)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(input.name.trim())
        .bind(unit)
        .bind(input.price)
        .bind(input.allergens.map(Json))
        .bind(input.nutrition.map(Json))
        .bind(input.social_media.map(Json))
        .fetch_one(&self.db)
        .await?;

        tracing::info!(product_id = %row.id, "Product registered");
        Ok(row.into())
    }

    /// Get a product by ID
    pub async fn get_product(&self, product_id: Uuid) -> AppResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE id = $1",
            PRODUCT_COLUMNS
        ))
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(row.into())
    }

    /// List products by name
    pub async fn list_products(&self) -> AppResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products ORDER BY name ASC, id ASC",
            PRODUCT_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }
}
