//! Ingredient ledger service: recording raw stock movements and reporting on them

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    round_money, DateRange, IngredientMovementType, PaginatedResponse, Pagination, StatsPeriod,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::catalog::require_ingredient;
use crate::services::ledger::{
    start_of_day, AppendMovementInput, IngredientLedger, LedgerStore, MovementFilters,
    MovementRecord, UpdateAnnotationsInput,
};

/// A movement on the ingredient ledger
pub type IngredientMovement = MovementRecord<IngredientMovementType>;

/// Ingredient ledger service
#[derive(Clone)]
pub struct IngredientLedgerService {
    db: PgPool,
    store: LedgerStore<IngredientLedger>,
}

/// Query for movement statistics
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovementStatsQuery {
    pub period: Option<StatsPeriod>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Totals for one movement type within the window
#[derive(Debug, Clone, Serialize)]
pub struct TypeStats {
    #[serde(rename = "type")]
    pub movement_type: IngredientMovementType,
    pub count: i64,
    pub total_quantity: Decimal,
    pub total_value: Decimal,
}

/// Totals across all types within the window
#[derive(Debug, Clone, Serialize)]
pub struct StatsSummary {
    pub total_movements: i64,
    pub total_value: Decimal,
}

/// Movement statistics response
#[derive(Debug, Clone, Serialize)]
pub struct MovementStats {
    pub range: DateRange,
    pub stats_by_type: Vec<TypeStats>,
    pub summary: StatsSummary,
}

#[derive(Debug, FromRow)]
struct TypeStatsRow {
    movement_type: String,
    count: i64,
    total_quantity: Decimal,
    total_value: Decimal,
}

impl IngredientLedgerService {
    /// Create a new IngredientLedgerService instance
    pub fn new(db: PgPool) -> Self {
        Self {
            store: LedgerStore::new(db.clone()),
            db,
        }
    }

    /// Append a movement to an ingredient's ledger
    pub async fn append_movement(
        &self,
        input: AppendMovementInput,
    ) -> AppResult<IngredientMovement> {
        let required = input.required::<IngredientMovementType>()?;
        shared::validate_ingredient_quantity(required.movement_type, required.quantity)?;

        let mut tx = self.db.begin().await?;

        let ingredient = require_ingredient(&mut *tx, required.subject_id).await?;

        // Outbound movements without their own cost take the ingredient's reference cost
        let cost_per_unit = shared::movement_unit_cost(
            required.movement_type,
            input.cost_per_unit,
            ingredient.cost_per_unit,
        );

        let movement = input.into_new_movement(required, cost_per_unit)?;
        let record = LedgerStore::<IngredientLedger>::insert(&mut tx, &movement).await?;

        tx.commit().await?;

        tracing::info!(
            movement_id = %record.id,
            ingredient_id = %record.subject_id,
            movement_type = %record.movement_type,
            quantity = %record.quantity,
            "Ingredient movement recorded"
        );

        Ok(record)
    }

    /// Get an ingredient movement by ID
    pub async fn get_movement(&self, movement_id: Uuid) -> AppResult<IngredientMovement> {
        self.store.get(movement_id).await
    }

    /// List ingredient movements, newest first
    pub async fn list_movements(
        &self,
        filters: &MovementFilters,
        page: Pagination,
    ) -> AppResult<PaginatedResponse<IngredientMovement>> {
        self.store.list(filters, page).await
    }

    /// Update the reason or notes of a movement
    pub async fn update_movement(
        &self,
        movement_id: Uuid,
        input: UpdateAnnotationsInput<IngredientMovementType>,
    ) -> AppResult<IngredientMovement> {
        self.store.update_annotations(movement_id, input).await
    }

    /// Movement counts, quantities and values per type over a date range
    pub async fn movement_stats(&self, range: DateRange) -> AppResult<MovementStats> {
        if range.end < range.start {
            return Err(AppError::validation(
                "end_date",
                "End date must not be before start date",
            ));
        }

        let rows = sqlx::query_as::<_, TypeStatsRow>(
            r#"
            SELECT movement_type,
                   COUNT(*) AS count,
                   COALESCE(SUM(quantity), 0) AS total_quantity,
                   COALESCE(SUM(total_cost), 0) AS total_value
            FROM ingredient_movements
            WHERE created_at >= $1 AND created_at < $2
            GROUP BY movement_type
            ORDER BY movement_type
            "#,
        )
        .bind(start_of_day(range.start))
        .bind(start_of_day(range.end_exclusive()))
        .fetch_all(&self.db)
        .await?;

        let mut stats_by_type = Vec::with_capacity(rows.len());
        for row in rows {
            let movement_type = row.movement_type.parse::<IngredientMovementType>().map_err(|e| {
                AppError::Internal(format!("corrupt movement type in stats: {}", e))
            })?;
            stats_by_type.push(TypeStats {
                movement_type,
                count: row.count,
                total_quantity: row.total_quantity,
                total_value: round_money(row.total_value),
            });
        }

        let summary = StatsSummary {
            total_movements: stats_by_type.iter().map(|s| s.count).sum(),
            total_value: round_money(stats_by_type.iter().map(|s| s.total_value).sum()),
        };

        Ok(MovementStats {
            range,
            stats_by_type,
            summary,
        })
    }
}
