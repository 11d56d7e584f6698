//! Append-only movement ledger storage
//!
//! The ingredient and product ledgers share one record layout and one set of
//! storage rules; [`LedgerKind`] supplies the table, the subject column and the
//! movement type enumeration for each.

use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use shared::{
    check_protected_fields, DateRange, IngredientMovementType, LedgerRuleError, MovementReference,
    PaginatedResponse, Pagination, PaginationMeta, ProductMovementType, ProtectedFields,
    RequestedProtectedFields,
};
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Storage layout of one ledger
pub trait LedgerKind: Send + Sync + 'static {
    type MovementType: Copy
        + PartialEq
        + Display
        + FromStr<Err = LedgerRuleError>
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static;

    /// Ledger table name
    const TABLE: &'static str;

    /// Column holding the subject id
    const SUBJECT_COLUMN: &'static str;

    fn type_str(movement_type: Self::MovementType) -> &'static str;
}

/// Raw ingredients: purchase, sale, waste, adjustment, transfer, production
pub struct IngredientLedger;

impl LedgerKind for IngredientLedger {
    type MovementType = IngredientMovementType;
    const TABLE: &'static str = "ingredient_movements";
    const SUBJECT_COLUMN: &'static str = "ingredient_id";

    fn type_str(movement_type: IngredientMovementType) -> &'static str {
        movement_type.as_str()
    }
}

/// Sellable products: in, out, adjustment
pub struct ProductLedger;

impl LedgerKind for ProductLedger {
    type MovementType = ProductMovementType;
    const TABLE: &'static str = "product_movements";
    const SUBJECT_COLUMN: &'static str = "product_id";

    fn type_str(movement_type: ProductMovementType) -> &'static str {
        movement_type.as_str()
    }
}

/// A stored movement
#[derive(Debug, Clone, Serialize)]
pub struct MovementRecord<T> {
    pub id: Uuid,
    pub subject_id: Uuid,
    #[serde(rename = "type")]
    pub movement_type: T,
    pub quantity: Decimal,
    pub unit: String,
    pub cost_per_unit: Option<Decimal>,
    pub total_cost: Option<Decimal>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub reference: MovementReference,
    pub location_from: Option<String>,
    pub location_to: Option<String>,
    pub batch_code: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub supplier: Option<String>,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct MovementRow {
    id: Uuid,
    subject_id: Uuid,
    movement_type: String,
    quantity: Decimal,
    unit: String,
    cost_per_unit: Option<Decimal>,
    total_cost: Option<Decimal>,
    reason: Option<String>,
    notes: Option<String>,
    reference_type: Option<String>,
    reference_id: Option<String>,
    location_from: Option<String>,
    location_to: Option<String>,
    batch_code: Option<String>,
    expiry_date: Option<NaiveDate>,
    supplier: Option<String>,
    user_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl MovementRow {
    fn into_record<T: FromStr<Err = LedgerRuleError>>(self) -> AppResult<MovementRecord<T>> {
        let movement_type = self.movement_type.parse::<T>().map_err(|e| {
            AppError::Internal(format!("movement {} has a corrupt type: {}", self.id, e))
        })?;

        Ok(MovementRecord {
            id: self.id,
            subject_id: self.subject_id,
            movement_type,
            quantity: self.quantity,
            unit: self.unit,
            cost_per_unit: self.cost_per_unit,
            total_cost: self.total_cost,
            reason: self.reason,
            notes: self.notes,
            reference: MovementReference {
                reference_type: self.reference_type,
                id: self.reference_id,
            },
            location_from: self.location_from,
            location_to: self.location_to,
            batch_code: self.batch_code,
            expiry_date: self.expiry_date,
            supplier: self.supplier,
            user_id: self.user_id,
            created_at: self.created_at,
        })
    }
}

/// A validated movement ready to be appended
#[derive(Debug, Clone)]
pub struct NewMovement<T> {
    pub subject_id: Uuid,
    pub movement_type: T,
    pub quantity: Decimal,
    pub unit: String,
    pub cost_per_unit: Option<Decimal>,
    pub total_cost: Option<Decimal>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub reference: MovementReference,
    pub location_from: Option<String>,
    pub location_to: Option<String>,
    pub batch_code: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub supplier: Option<String>,
    pub user_id: Option<Uuid>,
}

/// Filters for listing movements; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovementFilters {
    #[serde(alias = "ingredient_id", alias = "product_id")]
    pub subject_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub movement_type: Option<String>,
    /// Case-insensitive substring of the supplier
    pub supplier: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Annotation update; protected fields may be resent but not changed
#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
pub struct UpdateAnnotationsInput<T> {
    pub reason: Option<String>,
    pub notes: Option<String>,
    #[serde(alias = "ingredient_id", alias = "product_id")]
    pub subject_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub movement_type: Option<T>,
    pub quantity: Option<Decimal>,
}

impl<T: Copy> UpdateAnnotationsInput<T> {
    fn requested_protected(&self) -> RequestedProtectedFields<T> {
        RequestedProtectedFields {
            subject_id: self.subject_id,
            movement_type: self.movement_type,
            quantity: self.quantity,
        }
    }
}

/// Request body for appending a movement to either ledger
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppendMovementInput {
    #[serde(alias = "ingredient_id", alias = "product_id")]
    pub subject_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub movement_type: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit: Option<String>,
    pub cost_per_unit: Option<Decimal>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub reference: Option<MovementReference>,
    pub location_from: Option<String>,
    pub location_to: Option<String>,
    pub batch_code: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub supplier: Option<String>,
    pub user_id: Option<Uuid>,
}

/// Required fields of an append request, parsed
#[derive(Debug, Clone, PartialEq)]
pub struct RequiredMovementFields<T> {
    pub subject_id: Uuid,
    pub movement_type: T,
    pub quantity: Decimal,
    pub unit: String,
}

impl AppendMovementInput {
    /// Check presence and shape of subject, type, quantity and unit
    pub fn required<T: FromStr<Err = LedgerRuleError>>(&self) -> AppResult<RequiredMovementFields<T>> {
        let subject_id = self
            .subject_id
            .ok_or_else(|| AppError::validation("subject_id", "Subject is required"))?;
        let movement_type = self
            .movement_type
            .as_deref()
            .ok_or_else(|| AppError::validation("type", "Movement type is required"))?
            .parse::<T>()?;
        let quantity = self
            .quantity
            .ok_or_else(|| AppError::validation("quantity", "Quantity is required"))?;
        let unit = self.unit.as_deref().unwrap_or_default();
        shared::validate_unit(unit)?;
        shared::validate_cost(self.cost_per_unit)?;

        Ok(RequiredMovementFields {
            subject_id,
            movement_type,
            quantity,
            unit: unit.trim().to_string(),
        })
    }

    /// Combine the parsed required fields with the optional ones.
    ///
    /// `cost_per_unit` may differ from the requested cost when a reference cost
    /// was stamped, so it is checked again here along with the derived total.
    pub fn into_new_movement<T>(
        self,
        required: RequiredMovementFields<T>,
        cost_per_unit: Option<Decimal>,
    ) -> AppResult<NewMovement<T>> {
        shared::validate_cost(cost_per_unit)?;
        let total_cost = shared::movement_total_cost(required.quantity, cost_per_unit);
        shared::validate_total_cost(total_cost)?;

        Ok(NewMovement {
            subject_id: required.subject_id,
            movement_type: required.movement_type,
            quantity: required.quantity,
            unit: required.unit,
            total_cost,
            cost_per_unit,
            reason: self.reason,
            notes: self.notes,
            reference: self.reference.unwrap_or_default(),
            location_from: self.location_from,
            location_to: self.location_to,
            batch_code: self.batch_code,
            expiry_date: self.expiry_date,
            supplier: self.supplier,
            user_id: self.user_id,
        })
    }
}

/// `ILIKE` pattern matching `text` anywhere, with wildcards in `text` taken literally
pub(crate) fn contains_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Midnight UTC at the start of a calendar date
pub(crate) fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Storage access for one ledger
pub struct LedgerStore<K: LedgerKind> {
    db: PgPool,
    _kind: PhantomData<K>,
}

impl<K: LedgerKind> Clone for LedgerStore<K> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: LedgerKind> LedgerStore<K> {
    pub fn new(db: PgPool) -> Self {
        Self {
            db,
            _kind: PhantomData,
        }
    }

    fn select_columns() -> String {
        format!(
            "id, {} AS subject_id, movement_type, quantity, unit, cost_per_unit, total_cost, \
             reason, notes, reference_type, reference_id, location_from, location_to, \
             batch_code, expiry_date, supplier, user_id, created_at",
            K::SUBJECT_COLUMN
        )
    }

    /// Append a movement on an open transaction.
    ///
    /// The caller validates the movement and owns commit or rollback.
    pub async fn insert(
        conn: &mut PgConnection,
        movement: &NewMovement<K::MovementType>,
    ) -> AppResult<MovementRecord<K::MovementType>> {
        let sql = format!(
            r#"
            INSERT INTO {} (
                {}, movement_type, quantity, unit, cost_per_unit, total_cost, reason, notes,
                reference_type, reference_id, location_from, location_to, batch_code,
                expiry_date, supplier, user_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {}
            "#,
            K::TABLE,
            K::SUBJECT_COLUMN,
            Self::select_columns()
        );

        let row = sqlx::query_as::<_, MovementRow>(&sql)
            .bind(movement.subject_id)
            .bind(K::type_str(movement.movement_type))
            .bind(movement.quantity)
            .bind(&movement.unit)
            .bind(movement.cost_per_unit)
            .bind(movement.total_cost)
            .bind(&movement.reason)
            .bind(&movement.notes)
            .bind(&movement.reference.reference_type)
            .bind(&movement.reference.id)
            .bind(&movement.location_from)
            .bind(&movement.location_to)
            .bind(&movement.batch_code)
            .bind(movement.expiry_date)
            .bind(&movement.supplier)
            .bind(movement.user_id)
            .fetch_one(&mut *conn)
            .await?;

        row.into_record()
    }

    /// Get one movement by ID
    pub async fn get(&self, movement_id: Uuid) -> AppResult<MovementRecord<K::MovementType>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            Self::select_columns(),
            K::TABLE
        );

        sqlx::query_as::<_, MovementRow>(&sql)
            .bind(movement_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Movement".to_string()))?
            .into_record()
    }

    /// List movements, newest first, one page at a time
    pub async fn list(
        &self,
        filters: &MovementFilters,
        page: Pagination,
    ) -> AppResult<PaginatedResponse<MovementRecord<K::MovementType>>> {
        let movement_type = filters
            .movement_type
            .as_deref()
            .map(str::parse::<K::MovementType>)
            .transpose()?;

        let range = match (filters.start_date, filters.end_date) {
            (Some(start), Some(end)) if end < start => {
                return Err(AppError::validation(
                    "end_date",
                    "End date must not be before start date",
                ));
            }
            (start, end) => (start, end),
        };

        let mut count_query = QueryBuilder::<Postgres>::new(format!(
            "SELECT COUNT(*) FROM {} WHERE TRUE",
            K::TABLE
        ));
        Self::push_filters(&mut count_query, filters, movement_type, range);
        let total_items: i64 = count_query
            .build_query_scalar::<i64>()
            .fetch_one(&self.db)
            .await?;

        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM {} WHERE TRUE",
            Self::select_columns(),
            K::TABLE
        ));
        Self::push_filters(&mut query, filters, movement_type, range);
        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);

        let rows = query
            .build_query_as::<MovementRow>()
            .fetch_all(&self.db)
            .await?;

        let records = rows
            .into_iter()
            .map(MovementRow::into_record::<K::MovementType>)
            .collect::<AppResult<Vec<_>>>()?;

        tracing::debug!(
            table = K::TABLE,
            returned = records.len(),
            total_items,
            "Listed movements"
        );

        Ok(PaginatedResponse {
            pagination: PaginationMeta::new(page, records.len(), total_items),
            records,
        })
    }

    fn push_filters(
        query: &mut QueryBuilder<'_, Postgres>,
        filters: &MovementFilters,
        movement_type: Option<K::MovementType>,
        (start, end): (Option<NaiveDate>, Option<NaiveDate>),
    ) {
        if let Some(subject_id) = filters.subject_id {
            query
                .push(format!(" AND {} = ", K::SUBJECT_COLUMN))
                .push_bind(subject_id);
        }
        if let Some(t) = movement_type {
            query
                .push(" AND movement_type = ")
                .push_bind(K::type_str(t));
        }
        if let Some(supplier) = filters.supplier.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query
                .push(" AND supplier ILIKE ")
                .push_bind(contains_pattern(supplier))
                .push(" ESCAPE '\\'");
        }
        if let Some(start) = start {
            query.push(" AND created_at >= ").push_bind(start_of_day(start));
        }
        if let Some(end) = end {
            let exclusive = DateRange { start: end, end }.end_exclusive();
            query.push(" AND created_at < ").push_bind(start_of_day(exclusive));
        }
    }

    /// Change the annotation fields of a movement.
    ///
    /// Subject, type and quantity are fixed at append time; a request that
    /// would change any of them is rejected without writing anything.
    pub async fn update_annotations(
        &self,
        movement_id: Uuid,
        input: UpdateAnnotationsInput<K::MovementType>,
    ) -> AppResult<MovementRecord<K::MovementType>> {
        let mut tx = self.db.begin().await?;

        let select = format!(
            "SELECT {} FROM {} WHERE id = $1 FOR UPDATE",
            Self::select_columns(),
            K::TABLE
        );
        let existing = sqlx::query_as::<_, MovementRow>(&select)
            .bind(movement_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Movement".to_string()))?
            .into_record::<K::MovementType>()?;

        let stored = ProtectedFields {
            subject_id: existing.subject_id,
            movement_type: existing.movement_type,
            quantity: existing.quantity,
        };
        if let Err(err) = check_protected_fields(&stored, &input.requested_protected()) {
            tracing::warn!(movement_id = %movement_id, "Rejected change to a protected movement field");
            return Err(err.into());
        }

        let update = format!(
            r#"
            UPDATE {}
            SET reason = COALESCE($1, reason), notes = COALESCE($2, notes)
            WHERE id = $3
            RETURNING {}
            "#,
            K::TABLE,
            Self::select_columns()
        );
        let row = sqlx::query_as::<_, MovementRow>(&update)
            .bind(&input.reason)
            .bind(&input.notes)
            .bind(movement_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(movement_id = %movement_id, table = K::TABLE, "Movement annotations updated");
        row.into_record()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: AppError) -> String {
        match err {
            AppError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_append_body_accepts_subject_alias() {
        let input: AppendMovementInput = serde_json::from_value(serde_json::json!({
            "ingredient_id": "7c9e6679-7425-40de-944b-e07fc1f90ae7",
            "type": "sale",
            "quantity": "2.5",
            "unit": " kg ",
            "reference": {"type": "order", "id": "A-17"}
        }))
        .unwrap();

        let required = input.required::<IngredientMovementType>().unwrap();
        assert_eq!(required.movement_type, IngredientMovementType::Sale);
        assert_eq!(required.unit, "kg");

        let movement = input
            .into_new_movement(required, Some(Decimal::new(400, 2)))
            .unwrap();
        assert_eq!(movement.total_cost, Some(Decimal::from(10)));
        assert_eq!(movement.reference.id.as_deref(), Some("A-17"));
    }

    #[test]
    fn test_missing_and_malformed_fields() {
        let base = AppendMovementInput {
            subject_id: Some(Uuid::new_v4()),
            movement_type: Some("in".to_string()),
            quantity: Some(Decimal::ONE),
            unit: Some("pcs".to_string()),
            ..Default::default()
        };
        assert!(base.required::<ProductMovementType>().is_ok());

        let no_subject = AppendMovementInput { subject_id: None, ..base.clone() };
        assert_eq!(field_of(no_subject.required::<ProductMovementType>().unwrap_err()), "subject_id");

        // Product types are not ingredient types
        assert_eq!(field_of(base.required::<IngredientMovementType>().unwrap_err()), "type");

        let no_unit = AppendMovementInput { unit: Some("  ".to_string()), ..base.clone() };
        assert_eq!(field_of(no_unit.required::<ProductMovementType>().unwrap_err()), "unit");

        let negative_cost = AppendMovementInput {
            cost_per_unit: Some(Decimal::NEGATIVE_ONE),
            ..base
        };
        assert_eq!(
            field_of(negative_cost.required::<ProductMovementType>().unwrap_err()),
            "cost_per_unit"
        );
    }

    #[test]
    fn test_stamped_cost_checked_against_storage() {
        let input = AppendMovementInput {
            subject_id: Some(Uuid::new_v4()),
            movement_type: Some("purchase".to_string()),
            quantity: Some(Decimal::from(99_999_999_999i64)),
            unit: Some("kg".to_string()),
            ..Default::default()
        };
        let required = input.required::<IngredientMovementType>().unwrap();

        let err = input
            .clone()
            .into_new_movement(required.clone(), Some(Decimal::from(1_000)))
            .unwrap_err();
        assert_eq!(field_of(err), "cost_per_unit");

        let err = input
            .into_new_movement(required, Some(Decimal::new(1, 5)))
            .unwrap_err();
        assert_eq!(field_of(err), "cost_per_unit");
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("mill"), "%mill%");
        assert_eq!(contains_pattern("100%_rye"), "%100\\%\\_rye%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_update_body_parses_protected_fields() {
        let input: UpdateAnnotationsInput<ProductMovementType> =
            serde_json::from_value(serde_json::json!({
                "reason": "recount",
                "type": "out",
                "quantity": 3
            }))
            .unwrap();

        let requested = input.requested_protected();
        assert_eq!(requested.movement_type, Some(ProductMovementType::Out));
        assert_eq!(requested.quantity, Some(Decimal::from(3)));
        assert_eq!(requested.subject_id, None);
    }
}
