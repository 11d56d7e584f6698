//! Derived ingredient stock, aggregated on demand from the ingredient ledger
//!
//! Nothing here is stored. Listing runs one grouped aggregate so every row is
//! computed from the same snapshot; the single-ingredient view folds the
//! ledger entries in Rust with the same rules.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    DerivedStock, IngredientMovementType, LedgerEntry, LedgerTotals, StatusTag, StockSubject,
    StockSummary,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::catalog::CatalogService;
use crate::services::ledger::contains_pattern;

/// On-demand stock projection over the ingredient ledger
#[derive(Clone)]
pub struct IngredientStockService {
    db: PgPool,
}

/// Filters for the derived stock listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DerivedStockFilters {
    /// Case-insensitive substring of the ingredient name
    pub search: Option<String>,
    pub category: Option<String>,
    pub status: Option<StatusTag>,
}

/// Derived stock listing with its summary
#[derive(Debug, Clone, Serialize)]
pub struct DerivedStockResponse {
    pub stock: Vec<DerivedStock>,
    pub summary: StockSummary,
}

#[derive(Debug, FromRow)]
struct AggregateRow {
    id: Uuid,
    name: String,
    unit: String,
    category: Option<String>,
    cost_per_unit: Option<Decimal>,
    current_quantity: Decimal,
    total_purchases: Decimal,
    total_used: Decimal,
    current_value: Decimal,
    purchase_cost_sum: Decimal,
    costed_purchase_count: i64,
    movement_count: i64,
    last_movement_at: Option<DateTime<Utc>>,
}

impl From<AggregateRow> for DerivedStock {
    fn from(row: AggregateRow) -> Self {
        let totals = LedgerTotals {
            current_quantity: row.current_quantity,
            total_purchases: row.total_purchases,
            total_used: row.total_used,
            current_value: row.current_value,
            purchase_cost_sum: row.purchase_cost_sum,
            costed_purchase_count: row.costed_purchase_count,
            movement_count: row.movement_count,
            last_movement_at: row.last_movement_at,
        };
        let subject = StockSubject {
            id: row.id,
            name: row.name,
            unit: row.unit,
            category: row.category,
            cost_per_unit: row.cost_per_unit,
        };
        DerivedStock::project(subject, &totals)
    }
}

#[derive(Debug, FromRow)]
struct EntryRow {
    movement_type: String,
    quantity: Decimal,
    cost_per_unit: Option<Decimal>,
    created_at: DateTime<Utc>,
}

impl TryFrom<EntryRow> for LedgerEntry {
    type Error = AppError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        let movement_type = row
            .movement_type
            .parse::<IngredientMovementType>()
            .map_err(|e| AppError::Internal(format!("corrupt ledger entry: {}", e)))?;
        Ok(LedgerEntry {
            movement_type,
            quantity: row.quantity,
            cost_per_unit: row.cost_per_unit,
            created_at: row.created_at,
        })
    }
}

// Signed contribution of a movement, mirroring shared::ingredient_contribution
const CONTRIBUTION_SQL: &str = r#"
    CASE
        WHEN m.movement_type IN ('purchase', 'adjustment') THEN m.quantity
        WHEN m.movement_type IN ('sale', 'waste', 'production') THEN -m.quantity
        ELSE 0
    END
"#;

impl IngredientStockService {
    /// Create a new IngredientStockService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Current stock of every ingredient matching the filters, with a summary
    pub async fn list_derived_stock(
        &self,
        filters: &DerivedStockFilters,
    ) -> AppResult<DerivedStockResponse> {
        let search = filters
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(contains_pattern);

        let sql = format!(
            r#"
            SELECT i.id, i.name, i.unit, i.category, i.cost_per_unit,
                   COALESCE(SUM({contribution}), 0) AS current_quantity,
                   COALESCE(SUM(m.quantity) FILTER (WHERE m.movement_type = 'purchase'), 0)
                       AS total_purchases,
                   COALESCE(SUM(m.quantity) FILTER (
                       WHERE m.movement_type IN ('sale', 'waste', 'production')
                   ), 0) AS total_used,
                   COALESCE(SUM(({contribution}) * COALESCE(m.cost_per_unit, 0)), 0)
                       AS current_value,
                   COALESCE(SUM(m.cost_per_unit) FILTER (
                       WHERE m.movement_type = 'purchase' AND m.cost_per_unit IS NOT NULL
                   ), 0) AS purchase_cost_sum,
                   COUNT(m.id) FILTER (
                       WHERE m.movement_type = 'purchase' AND m.cost_per_unit IS NOT NULL
                   ) AS costed_purchase_count,
                   COUNT(m.id) AS movement_count,
                   MAX(m.created_at) AS last_movement_at
            FROM ingredients i
            LEFT JOIN ingredient_movements m ON m.ingredient_id = i.id
            WHERE ($1::text IS NULL OR i.name ILIKE $1 ESCAPE '\')
              AND ($2::text IS NULL OR i.category = $2)
            GROUP BY i.id, i.name, i.unit, i.category, i.cost_per_unit
            ORDER BY i.name ASC, i.id ASC
            "#,
            contribution = CONTRIBUTION_SQL
        );

        let rows = sqlx::query_as::<_, AggregateRow>(&sql)
            .bind(search)
            .bind(&filters.category)
            .fetch_all(&self.db)
            .await?;

        let stock: Vec<DerivedStock> = rows
            .into_iter()
            .map(DerivedStock::from)
            .filter(|row| filters.status.map_or(true, |status| row.status == status))
            .collect();
        let summary = StockSummary::from_rows(&stock);

        tracing::debug!(rows = stock.len(), "Derived ingredient stock");

        Ok(DerivedStockResponse { stock, summary })
    }

    /// Current stock of one ingredient, folded from its full ledger
    pub async fn get_derived_stock(&self, ingredient_id: Uuid) -> AppResult<DerivedStock> {
        let ingredient = CatalogService::new(self.db.clone())
            .get_ingredient(ingredient_id)
            .await?;

        let entries = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT movement_type, quantity, cost_per_unit, created_at
            FROM ingredient_movements
            WHERE ingredient_id = $1
            "#,
        )
        .bind(ingredient_id)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(LedgerEntry::try_from)
        .collect::<AppResult<Vec<_>>>()?;

        let totals = LedgerTotals::from_entries(&entries);
        Ok(DerivedStock::project(ingredient.into(), &totals))
    }
}
