//! Cost bases and valuation rules
//!
//! Two cost bases coexist and are never merged:
//! - the average purchase cost, an unweighted mean over the ingredient ledger
//!   (see [`super::LedgerTotals::avg_cost`])
//! - the reference cost stored on the ingredient itself, used to value
//!   outbound movements and batches that carry no cost of their own

use rust_decimal::{Decimal, RoundingStrategy};

use super::IngredientMovementType;
use crate::validation::COST_SCALE;

/// Unit cost to record on a new ingredient movement.
///
/// An explicit cost always wins. Outbound movements without one are valued at
/// the ingredient's reference cost; inbound and neutral movements stay uncosted.
pub fn movement_unit_cost(
    movement_type: IngredientMovementType,
    given: Option<Decimal>,
    reference_cost: Option<Decimal>,
) -> Option<Decimal> {
    match given {
        Some(cost) => Some(cost),
        None if movement_type.is_consumption() => reference_cost,
        None => None,
    }
}

/// Total cost of a movement, when its unit cost is known, at stored precision
pub fn movement_total_cost(quantity: Decimal, cost_per_unit: Option<Decimal>) -> Option<Decimal> {
    cost_per_unit.map(|cost| {
        (quantity.abs() * cost)
            .round_dp_with_strategy(COST_SCALE, RoundingStrategy::MidpointAwayFromZero)
    })
}

/// Value of a batch at its own cost, falling back to the reference cost
pub fn batch_value(
    quantity: Decimal,
    batch_cost: Option<Decimal>,
    reference_cost: Option<Decimal>,
) -> Decimal {
    batch_cost
        .or(reference_cost)
        .map(|cost| quantity * cost)
        .unwrap_or(Decimal::ZERO)
}

/// Quantity of a batch not held in reserve
pub fn available_quantity(quantity: Decimal, reserved_quantity: Decimal) -> Decimal {
    quantity - reserved_quantity
}
