//! Stock projections over the movement ledgers
//!
//! Ingredient stock is derived on demand by folding every movement of an
//! ingredient. Product stock is materialized and moved by clamped deltas.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    classify_ingredient_status, IngredientMovementType, LedgerEntry, ProductMovementType,
    StatusTag,
};
use crate::types::round_money;

/// Signed effect of an ingredient movement on stock on hand.
///
/// Purchases add, consumption subtracts, adjustments apply their own sign and
/// transfers leave the total unchanged.
pub fn ingredient_contribution(movement_type: IngredientMovementType, quantity: Decimal) -> Decimal {
    match movement_type {
        IngredientMovementType::Purchase => quantity,
        IngredientMovementType::Adjustment => quantity,
        IngredientMovementType::Sale
        | IngredientMovementType::Waste
        | IngredientMovementType::Production => -quantity,
        IngredientMovementType::Transfer => Decimal::ZERO,
    }
}

/// Running sums over an ingredient's ledger
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerTotals {
    pub current_quantity: Decimal,
    pub total_purchases: Decimal,
    pub total_used: Decimal,
    pub current_value: Decimal,
    /// Sum of unit costs over costed purchases
    pub purchase_cost_sum: Decimal,
    pub costed_purchase_count: i64,
    pub movement_count: i64,
    pub last_movement_at: Option<DateTime<Utc>>,
}

impl LedgerTotals {
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a LedgerEntry>,
    {
        entries.into_iter().fold(Self::default(), |mut totals, entry| {
            totals.accumulate(entry);
            totals
        })
    }

    /// Fold one movement into the totals
    pub fn accumulate(&mut self, entry: &LedgerEntry) {
        let contribution = ingredient_contribution(entry.movement_type, entry.quantity);
        self.current_quantity += contribution;
        self.current_value += contribution * entry.cost_per_unit.unwrap_or(Decimal::ZERO);

        match entry.movement_type {
            IngredientMovementType::Purchase => {
                self.total_purchases += entry.quantity;
                if let Some(cost) = entry.cost_per_unit {
                    self.purchase_cost_sum += cost;
                    self.costed_purchase_count += 1;
                }
            }
            t if t.is_consumption() => self.total_used += entry.quantity,
            _ => {}
        }

        self.movement_count += 1;
        self.last_movement_at = match self.last_movement_at {
            Some(last) if last >= entry.created_at => Some(last),
            _ => Some(entry.created_at),
        };
    }

    /// Unweighted mean of purchase unit costs
    pub fn avg_cost(&self) -> Decimal {
        if self.costed_purchase_count == 0 {
            return Decimal::ZERO;
        }
        self.purchase_cost_sum / Decimal::from(self.costed_purchase_count)
    }
}

/// Catalog details shown next to a derived stock row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSubject {
    pub id: Uuid,
    pub name: String,
    pub unit: String,
    pub category: Option<String>,
    /// Static reference cost kept on the ingredient
    pub cost_per_unit: Option<Decimal>,
}

/// Current stock of one ingredient, computed from its ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedStock {
    pub subject_id: Uuid,
    pub name: String,
    pub unit: String,
    pub category: Option<String>,
    pub reference_cost_per_unit: Option<Decimal>,
    pub current_quantity: Decimal,
    pub total_purchases: Decimal,
    pub total_used: Decimal,
    pub avg_cost: Decimal,
    pub current_value: Decimal,
    pub last_movement_at: Option<DateTime<Utc>>,
    pub status: StatusTag,
}

impl DerivedStock {
    pub fn project(subject: StockSubject, totals: &LedgerTotals) -> Self {
        Self {
            subject_id: subject.id,
            name: subject.name,
            unit: subject.unit,
            category: subject.category,
            reference_cost_per_unit: subject.cost_per_unit,
            current_quantity: totals.current_quantity,
            total_purchases: totals.total_purchases,
            total_used: totals.total_used,
            avg_cost: round_money(totals.avg_cost()),
            current_value: round_money(totals.current_value),
            last_movement_at: totals.last_movement_at,
            status: classify_ingredient_status(totals.current_quantity),
        }
    }
}

/// Counts and totals over a derived stock listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockSummary {
    pub total: i64,
    pub critical: i64,
    pub low: i64,
    pub out_of_stock: i64,
    pub ok: i64,
    pub total_value: Decimal,
    pub total_quantity: Decimal,
}

impl StockSummary {
    pub fn from_rows(rows: &[DerivedStock]) -> Self {
        let mut summary = rows.iter().fold(Self::default(), |mut s, row| {
            s.total += 1;
            match row.status {
                StatusTag::Critical => s.critical += 1,
                StatusTag::Low => s.low += 1,
                StatusTag::OutOfStock => s.out_of_stock += 1,
                _ => s.ok += 1,
            }
            s.total_value += row.current_value;
            s.total_quantity += row.current_quantity;
            s
        });
        // Quantities keep their stored precision; only money is rounded
        summary.total_value = round_money(summary.total_value);
        summary
    }
}

/// Stored current stock of a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterializedStock {
    pub subject_id: Uuid,
    pub quantity: Decimal,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Apply a delta to materialized stock, never going below zero
pub fn apply_clamped_delta(existing: Decimal, delta: Decimal) -> Decimal {
    (existing + delta).max(Decimal::ZERO)
}

/// Replay product movements through the clamped increment, in order
pub fn replay_product_movements<I>(movements: I) -> Decimal
where
    I: IntoIterator<Item = (ProductMovementType, Decimal)>,
{
    movements
        .into_iter()
        .fold(Decimal::ZERO, |stock, (movement_type, quantity)| {
            apply_clamped_delta(stock, movement_type.signed_delta(quantity))
        })
}
