//! Product ledger with a materialized current-stock row per product
//!
//! Each append and its stock increment commit or roll back together. The
//! increment is one `INSERT .. ON CONFLICT DO UPDATE` statement that adds the
//! signed delta and clamps at zero, so concurrent appends for one product
//! serialize on that product's row instead of racing a read and a write.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{MaterializedStock, PaginatedResponse, Pagination, ProductMovementType};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::catalog::require_product;
use crate::services::ledger::{
    AppendMovementInput, LedgerStore, MovementFilters, MovementRecord, ProductLedger,
    UpdateAnnotationsInput,
};

/// A movement on the product ledger
pub type ProductMovement = MovementRecord<ProductMovementType>;

/// Product ledger and materialized stock service
#[derive(Clone)]
pub struct ProductStockService {
    db: PgPool,
    store: LedgerStore<ProductLedger>,
}

/// Request body for appending a product movement
#[derive(Debug, Clone, Deserialize)]
pub struct AppendProductMovementInput {
    #[serde(flatten)]
    pub movement: AppendMovementInput,
    /// Keep the materialized stock in step with the ledger
    #[serde(default = "default_auto_update")]
    pub auto_update_stock: bool,
}

fn default_auto_update() -> bool {
    true
}

/// Result of a product append
#[derive(Debug, Clone, Serialize)]
pub struct ProductMovementOutcome {
    pub id: Uuid,
    pub movement: ProductMovement,
    /// Stock after the increment, absent when auto-update was turned off
    pub stock: Option<MaterializedStock>,
}

/// Materialized stock joined with the product name
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductStockView {
    pub product_id: Uuid,
    pub name: String,
    pub unit: String,
    pub quantity: Decimal,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, FromRow)]
struct StockRow {
    product_id: Uuid,
    quantity: Decimal,
    updated_at: DateTime<Utc>,
}

impl From<StockRow> for MaterializedStock {
    fn from(row: StockRow) -> Self {
        MaterializedStock {
            subject_id: row.product_id,
            quantity: row.quantity,
            updated_at: Some(row.updated_at),
        }
    }
}

impl ProductStockService {
    /// Create a new ProductStockService instance
    pub fn new(db: PgPool) -> Self {
        Self {
            store: LedgerStore::new(db.clone()),
            db,
        }
    }

    /// Add a signed delta to a product's stock, clamped at zero.
    ///
    /// Runs on the caller's transaction; a product without a stock row starts
    /// from zero.
    pub async fn apply_delta(
        conn: &mut PgConnection,
        product_id: Uuid,
        delta: Decimal,
    ) -> AppResult<MaterializedStock> {
        let row = sqlx::query_as::<_, StockRow>(
            r#"
            INSERT INTO product_stock (product_id, quantity, updated_at)
            VALUES ($1, GREATEST(0, $2::numeric), NOW())
            ON CONFLICT (product_id) DO UPDATE
            SET quantity = GREATEST(0, product_stock.quantity + $2::numeric),
                updated_at = NOW()
            RETURNING product_id, quantity, updated_at
            "#,
        )
        .bind(product_id)
        .bind(delta)
        .fetch_one(&mut *conn)
        .await?;

        Ok(row.into())
    }

    /// Append a product movement and, unless opted out, update the stock row
    pub async fn append_movement(
        &self,
        input: AppendProductMovementInput,
    ) -> AppResult<ProductMovementOutcome> {
        let AppendProductMovementInput {
            movement,
            auto_update_stock,
        } = input;

        let required = movement.required::<ProductMovementType>()?;
        shared::validate_product_quantity(required.quantity)?;

        let mut tx = self.db.begin().await?;

        require_product(&mut *tx, required.subject_id).await?;

        let cost_per_unit = movement.cost_per_unit;
        let new_movement = movement.into_new_movement(required, cost_per_unit)?;
        let record = LedgerStore::<ProductLedger>::insert(&mut *tx, &new_movement).await?;

        let stock = if auto_update_stock {
            let delta = record.movement_type.signed_delta(record.quantity);
            Some(Self::apply_delta(&mut *tx, record.subject_id, delta).await?)
        } else {
            None
        };

        tx.commit().await?;

        tracing::info!(
            movement_id = %record.id,
            product_id = %record.subject_id,
            movement_type = %record.movement_type,
            quantity = %record.quantity,
            stock = ?stock.as_ref().map(|s| s.quantity),
            "Product movement recorded"
        );

        Ok(ProductMovementOutcome {
            id: record.id,
            movement: record,
            stock,
        })
    }

    /// Get a product movement by ID
    pub async fn get_movement(&self, movement_id: Uuid) -> AppResult<ProductMovement> {
        self.store.get(movement_id).await
    }

    /// List product movements, newest first
    pub async fn list_movements(
        &self,
        filters: &MovementFilters,
        page: Pagination,
    ) -> AppResult<PaginatedResponse<ProductMovement>> {
        self.store.list(filters, page).await
    }

    /// Update the reason or notes of a product movement
    pub async fn update_movement(
        &self,
        movement_id: Uuid,
        input: UpdateAnnotationsInput<ProductMovementType>,
    ) -> AppResult<ProductMovement> {
        self.store.update_annotations(movement_id, input).await
    }

    /// Current stock of one product; a product never stocked reads as zero
    pub async fn get_stock(&self, product_id: Uuid) -> AppResult<ProductStockView> {
        sqlx::query_as::<_, ProductStockView>(
            r#"
            SELECT p.id AS product_id, p.name, p.unit,
                   COALESCE(s.quantity, 0) AS quantity, s.updated_at
            FROM products p
            LEFT JOIN product_stock s ON s.product_id = p.id
            WHERE p.id = $1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    /// Current stock of every product
    pub async fn list_stock(&self) -> AppResult<Vec<ProductStockView>> {
        let rows = sqlx::query_as::<_, ProductStockView>(
            r#"
            SELECT p.id AS product_id, p.name, p.unit,
                   COALESCE(s.quantity, 0) AS quantity, s.updated_at
            FROM products p
            LEFT JOIN product_stock s ON s.product_id = p.id
            ORDER BY p.name ASC, p.id ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        tracing::debug!(rows = rows.len(), "Listed product stock");
        Ok(rows)
    }
}
