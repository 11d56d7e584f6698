//! Batch stock registry
//!
//! Batches are edited in place: create, whole-row replace and hard delete.
//! None of these write to a ledger.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{BatchLevels, BatchSummary, SeverityOrdered, StatusTag};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::catalog::require_ingredient;

/// Batch stock service
#[derive(Clone)]
pub struct BatchStockService {
    db: PgPool,
    expiry_horizon_days: i64,
}

/// A stored batch
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BatchRecord {
    pub id: Uuid,
    pub ingredient_id: Uuid,
    pub batch_code: Option<String>,
    pub quantity: Decimal,
    pub unit: String,
    pub reserved_quantity: Decimal,
    pub min_threshold: Decimal,
    pub max_threshold: Option<Decimal>,
    pub cost_per_unit: Option<Decimal>,
    pub supplier: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct BatchListRow {
    #[sqlx(flatten)]
    record: BatchRecord,
    ingredient_name: String,
    reference_cost_per_unit: Option<Decimal>,
}

/// A batch annotated with its status, availability and value
#[derive(Debug, Clone, Serialize)]
pub struct BatchStockEntry {
    #[serde(flatten)]
    pub batch: BatchRecord,
    pub ingredient_name: String,
    pub available_quantity: Decimal,
    pub value: Decimal,
    pub status: StatusTag,
}

impl BatchStockEntry {
    fn annotate(
        batch: BatchRecord,
        ingredient_name: String,
        reference_cost: Option<Decimal>,
        today: NaiveDate,
        horizon_days: i64,
    ) -> Self {
        let status = shared::classify_batch_status(
            batch.quantity,
            batch.min_threshold,
            batch.expiry_date,
            today,
            horizon_days,
        );
        Self {
            available_quantity: shared::available_quantity(batch.quantity, batch.reserved_quantity),
            value: shared::round_money(shared::batch_value(
                batch.quantity,
                batch.cost_per_unit,
                reference_cost,
            )),
            status,
            ingredient_name,
            batch,
        }
    }
}

impl SeverityOrdered for BatchStockEntry {
    fn status(&self) -> StatusTag {
        self.status
    }

    fn expiry_date(&self) -> Option<NaiveDate> {
        self.batch.expiry_date
    }

    fn subject_name(&self) -> &str {
        &self.ingredient_name
    }
}

/// Full batch entry, used for both create and replace
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BatchEntryInput {
    pub ingredient_id: Uuid,
    #[validate(length(max = 64, message = "Batch code must be at most 64 characters"))]
    pub batch_code: Option<String>,
    pub quantity: Decimal,
    #[validate(length(min = 1, max = 20, message = "Unit must be 1-20 characters"))]
    pub unit: String,
    #[serde(default)]
    pub reserved_quantity: Decimal,
    #[serde(default)]
    pub min_threshold: Decimal,
    pub max_threshold: Option<Decimal>,
    pub cost_per_unit: Option<Decimal>,
    #[validate(length(max = 200, message = "Supplier must be at most 200 characters"))]
    pub supplier: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    #[validate(length(max = 100, message = "Location must be at most 100 characters"))]
    pub location: Option<String>,
    pub notes: Option<String>,
}

impl BatchEntryInput {
    fn check(&self) -> AppResult<()> {
        self.validate()?;
        if self.unit.trim().is_empty() {
            return Err(AppError::validation("unit", "Unit is required"));
        }
        shared::validate_batch_levels(&BatchLevels {
            quantity: self.quantity,
            reserved_quantity: self.reserved_quantity,
            min_threshold: self.min_threshold,
            max_threshold: self.max_threshold,
            cost_per_unit: self.cost_per_unit,
        })?;
        Ok(())
    }
}

/// Filters for listing batches
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchFilters {
    pub ingredient_id: Option<Uuid>,
    pub status: Option<StatusTag>,
}

/// Batch listing with its summary
#[derive(Debug, Clone, Serialize)]
pub struct BatchListResponse {
    pub batches: Vec<BatchStockEntry>,
    pub summary: BatchSummary,
}

const BATCH_COLUMNS: &str = "id, ingredient_id, batch_code, quantity, unit, reserved_quantity, \
     min_threshold, max_threshold, cost_per_unit, supplier, purchase_date, expiry_date, \
     location, notes, created_at, updated_at";

const BATCH_LIST_SELECT: &str = r#"
    SELECT b.id, b.ingredient_id, b.batch_code, b.quantity, b.unit, b.reserved_quantity,
           b.min_threshold, b.max_threshold, b.cost_per_unit, b.supplier, b.purchase_date,
           b.expiry_date, b.location, b.notes, b.created_at, b.updated_at,
           i.name AS ingredient_name, i.cost_per_unit AS reference_cost_per_unit
    FROM batch_stock b
    JOIN ingredients i ON i.id = b.ingredient_id
"#;

impl BatchStockService {
    /// Create a new BatchStockService instance
    pub fn new(db: PgPool, expiry_horizon_days: i64) -> Self {
        Self {
            db,
            expiry_horizon_days,
        }
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    fn annotate_row(&self, row: BatchListRow, today: NaiveDate) -> BatchStockEntry {
        BatchStockEntry::annotate(
            row.record,
            row.ingredient_name,
            row.reference_cost_per_unit,
            today,
            self.expiry_horizon_days,
        )
    }

    /// Register a received batch
    pub async fn create_batch(&self, input: BatchEntryInput) -> AppResult<BatchStockEntry> {
        input.check()?;

        let mut tx = self.db.begin().await?;

        let ingredient = require_ingredient(&mut *tx, input.ingredient_id).await?;

        let batch = sqlx::query_as::<_, BatchRecord>(&format!(
            r#"
            INSERT INTO batch_stock (
                ingredient_id, batch_code, quantity, unit, reserved_quantity, min_threshold,
                max_threshold, cost_per_unit, supplier, purchase_date, expiry_date, location, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            BATCH_COLUMNS
        ))
        .bind(input.ingredient_id)
        .bind(&input.batch_code)
        .bind(input.quantity)
        .bind(input.unit.trim())
        .bind(input.reserved_quantity)
        .bind(input.min_threshold)
        .bind(input.max_threshold)
        .bind(input.cost_per_unit)
        .bind(&input.supplier)
        .bind(input.purchase_date)
        .bind(input.expiry_date)
        .bind(&input.location)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            batch_id = %batch.id,
            ingredient_id = %batch.ingredient_id,
            quantity = %batch.quantity,
            "Batch registered"
        );

        Ok(BatchStockEntry::annotate(
            batch,
            ingredient.name,
            ingredient.cost_per_unit,
            Self::today(),
            self.expiry_horizon_days,
        ))
    }

    /// Get one batch by ID
    pub async fn get_batch(&self, batch_id: Uuid) -> AppResult<BatchStockEntry> {
        let row = sqlx::query_as::<_, BatchListRow>(&format!("{} WHERE b.id = $1", BATCH_LIST_SELECT))
            .bind(batch_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;

        Ok(self.annotate_row(row, Self::today()))
    }

    /// List batches, most urgent first, with a summary of the listed rows
    pub async fn list_batches(&self, filters: &BatchFilters) -> AppResult<BatchListResponse> {
        let rows = sqlx::query_as::<_, BatchListRow>(&format!(
            "{} WHERE ($1::uuid IS NULL OR b.ingredient_id = $1)",
            BATCH_LIST_SELECT
        ))
        .bind(filters.ingredient_id)
        .fetch_all(&self.db)
        .await?;

        let today = Self::today();
        let mut batches: Vec<BatchStockEntry> = rows
            .into_iter()
            .map(|row| self.annotate_row(row, today))
            .filter(|entry| filters.status.map_or(true, |status| entry.status == status))
            .collect();
        shared::sort_by_severity(&mut batches);

        let mut summary = BatchSummary::default();
        for entry in &batches {
            summary.record(entry.status, entry.value);
        }

        tracing::debug!(rows = batches.len(), "Listed batches");

        Ok(BatchListResponse {
            batches,
            summary: summary.finish(),
        })
    }

    /// Replace every editable field of a batch
    pub async fn replace_batch(
        &self,
        batch_id: Uuid,
        input: BatchEntryInput,
    ) -> AppResult<BatchStockEntry> {
        input.check()?;

        let mut tx = self.db.begin().await?;

        let ingredient = require_ingredient(&mut *tx, input.ingredient_id).await?;

        let batch = sqlx::query_as::<_, BatchRecord>(&format!(
            r#"
            UPDATE batch_stock
            SET ingredient_id = $2, batch_code = $3, quantity = $4, unit = $5,
                reserved_quantity = $6, min_threshold = $7, max_threshold = $8,
                cost_per_unit = $9, supplier = $10, purchase_date = $11, expiry_date = $12,
                location = $13, notes = $14, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            BATCH_COLUMNS
        ))
        .bind(batch_id)
        .bind(input.ingredient_id)
        .bind(&input.batch_code)
        .bind(input.quantity)
        .bind(input.unit.trim())
        .bind(input.reserved_quantity)
        .bind(input.min_threshold)
        .bind(input.max_threshold)
        .bind(input.cost_per_unit)
        .bind(&input.supplier)
        .bind(input.purchase_date)
        .bind(input.expiry_date)
        .bind(&input.location)
        .bind(&input.notes)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;

        tx.commit().await?;

        tracing::info!(batch_id = %batch.id, quantity = %batch.quantity, "Batch replaced");

        Ok(BatchStockEntry::annotate(
            batch,
            ingredient.name,
            ingredient.cost_per_unit,
            Self::today(),
            self.expiry_horizon_days,
        ))
    }

    /// Delete a batch permanently
    pub async fn delete_batch(&self, batch_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM batch_stock WHERE id = $1")
            .bind(batch_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Batch".to_string()));
        }

        tracing::info!(batch_id = %batch_id, "Batch deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(quantity: i64, min_threshold: i64, expiry_date: Option<NaiveDate>) -> BatchRecord {
        BatchRecord {
            id: Uuid::new_v4(),
            ingredient_id: Uuid::new_v4(),
            batch_code: Some("B-001".to_string()),
            quantity: Decimal::from(quantity),
            unit: "kg".to_string(),
            reserved_quantity: Decimal::from(2),
            min_threshold: Decimal::from(min_threshold),
            max_threshold: None,
            cost_per_unit: None,
            supplier: None,
            purchase_date: None,
            expiry_date,
            location: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_annotate_uses_reference_cost_when_batch_has_none() {
        let entry = BatchStockEntry::annotate(
            record(40, 10, None),
            "Flour".to_string(),
            Some(Decimal::new(125, 2)),
            date(2025, 3, 1),
            30,
        );

        assert_eq!(entry.status, StatusTag::Ok);
        assert_eq!(entry.available_quantity, Decimal::from(38));
        assert_eq!(entry.value, Decimal::from(50));
    }

    #[test]
    fn test_annotate_critical_below_threshold() {
        let entry = BatchStockEntry::annotate(
            record(5, 10, None),
            "Sugar".to_string(),
            None,
            date(2025, 3, 1),
            30,
        );

        assert_eq!(entry.status, StatusTag::Critical);
        assert_eq!(entry.value, Decimal::ZERO);
    }

    #[test]
    fn test_sorted_listing_puts_expired_before_low() {
        let today = date(2025, 3, 1);
        let mut entries = vec![
            BatchStockEntry::annotate(record(14, 10, None), "Butter".into(), None, today, 30),
            BatchStockEntry::annotate(
                record(100, 10, Some(date(2025, 2, 20))),
                "Milk".into(),
                None,
                today,
                30,
            ),
            BatchStockEntry::annotate(record(0, 10, None), "Eggs".into(), None, today, 30),
        ];
        shared::sort_by_severity(&mut entries);

        let names: Vec<_> = entries.iter().map(|e| e.ingredient_name.as_str()).collect();
        assert_eq!(names, vec!["Eggs", "Milk", "Butter"]);
    }

    #[test]
    fn test_input_rejects_max_below_min() {
        let input = BatchEntryInput {
            ingredient_id: Uuid::new_v4(),
            batch_code: None,
            quantity: Decimal::from(5),
            unit: "kg".to_string(),
            reserved_quantity: Decimal::ZERO,
            min_threshold: Decimal::from(10),
            max_threshold: Some(Decimal::from(5)),
            cost_per_unit: None,
            supplier: None,
            purchase_date: None,
            expiry_date: None,
            location: None,
            notes: None,
        };

        match input.check() {
            Err(AppError::Validation { field, .. }) => assert_eq!(field, "max_threshold"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
