//! Validation rules for ledger commands and batch entries
//!
//! These checks run before any write; a failure means nothing was stored.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::IngredientMovementType;

/// Rule violations detected without touching storage
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerRuleError {
    #[error("{field}: {message}")]
    Invalid {
        field: &'static str,
        message: &'static str,
    },

    #[error("unknown movement type: {0}")]
    UnknownMovementType(String),

    #[error("{0} cannot be changed after a movement is recorded")]
    ImmutableField(&'static str),
}

impl LedgerRuleError {
    fn invalid(field: &'static str, message: &'static str) -> Self {
        LedgerRuleError::Invalid { field, message }
    }
}

// ============================================================================
// Storage Precision
// ============================================================================

/// Decimal places kept for quantities and thresholds
pub const QUANTITY_SCALE: u32 = 3;

/// Decimal places kept for unit and total costs
pub const COST_SCALE: u32 = 4;

/// Whether a value is stored exactly by a `NUMERIC(precision, scale)` column
pub fn fits_numeric(value: Decimal, precision: u32, scale: u32) -> bool {
    if value.normalize().scale() > scale {
        return false;
    }
    let integer_digits = precision.saturating_sub(scale).min(18);
    value.abs() < Decimal::from(10i64.pow(integer_digits))
}

fn check_quantity_precision(field: &'static str, quantity: Decimal) -> Result<(), LedgerRuleError> {
    if quantity.normalize().scale() > QUANTITY_SCALE {
        return Err(LedgerRuleError::invalid(
            field,
            "Quantity allows at most 3 decimal places",
        ));
    }
    if !fits_numeric(quantity, 14, QUANTITY_SCALE) {
        return Err(LedgerRuleError::invalid(field, "Quantity is too large"));
    }
    Ok(())
}

// ============================================================================
// Movement Validations
// ============================================================================

/// Validate the quantity of an ingredient movement.
///
/// Zero is never a movement. Adjustments may be negative; every other type
/// must be strictly positive.
pub fn validate_ingredient_quantity(
    movement_type: IngredientMovementType,
    quantity: Decimal,
) -> Result<(), LedgerRuleError> {
    check_quantity_precision("quantity", quantity)?;
    if quantity.is_zero() {
        return Err(LedgerRuleError::invalid("quantity", "Quantity must not be zero"));
    }
    if !movement_type.is_signed() && quantity < Decimal::ZERO {
        return Err(LedgerRuleError::invalid(
            "quantity",
            "Quantity must be positive for this movement type",
        ));
    }
    Ok(())
}

/// Validate the quantity of a product movement
pub fn validate_product_quantity(quantity: Decimal) -> Result<(), LedgerRuleError> {
    check_quantity_precision("quantity", quantity)?;
    if quantity.is_zero() {
        return Err(LedgerRuleError::invalid("quantity", "Quantity must not be zero"));
    }
    Ok(())
}

/// Validate a unit of measure label
pub fn validate_unit(unit: &str) -> Result<(), LedgerRuleError> {
    let trimmed = unit.trim();
    if trimmed.is_empty() {
        return Err(LedgerRuleError::invalid("unit", "Unit is required"));
    }
    if trimmed.len() > 20 {
        return Err(LedgerRuleError::invalid("unit", "Unit must be at most 20 characters"));
    }
    Ok(())
}

/// Validate an optional unit cost
pub fn validate_cost(cost_per_unit: Option<Decimal>) -> Result<(), LedgerRuleError> {
    match cost_per_unit {
        Some(cost) if cost < Decimal::ZERO => Err(LedgerRuleError::invalid(
            "cost_per_unit",
            "Cost per unit cannot be negative",
        )),
        Some(cost) if cost.normalize().scale() > COST_SCALE => Err(LedgerRuleError::invalid(
            "cost_per_unit",
            "Cost per unit allows at most 4 decimal places",
        )),
        Some(cost) if !fits_numeric(cost, 14, COST_SCALE) => Err(LedgerRuleError::invalid(
            "cost_per_unit",
            "Cost per unit is too large",
        )),
        _ => Ok(()),
    }
}

/// Validate the total cost derived from quantity and unit cost
pub fn validate_total_cost(total_cost: Option<Decimal>) -> Result<(), LedgerRuleError> {
    match total_cost {
        Some(total) if !fits_numeric(total, 16, COST_SCALE) => Err(LedgerRuleError::invalid(
            "cost_per_unit",
            "Total cost of the movement is too large",
        )),
        _ => Ok(()),
    }
}

// ============================================================================
// Batch Validations
// ============================================================================

/// Quantities and thresholds carried by a batch entry
#[derive(Debug, Clone, Copy)]
pub struct BatchLevels {
    pub quantity: Decimal,
    pub reserved_quantity: Decimal,
    pub min_threshold: Decimal,
    pub max_threshold: Option<Decimal>,
    pub cost_per_unit: Option<Decimal>,
}

/// Validate batch quantities and thresholds
pub fn validate_batch_levels(levels: &BatchLevels) -> Result<(), LedgerRuleError> {
    check_quantity_precision("quantity", levels.quantity)?;
    check_quantity_precision("reserved_quantity", levels.reserved_quantity)?;
    check_quantity_precision("min_threshold", levels.min_threshold)?;
    if let Some(max) = levels.max_threshold {
        check_quantity_precision("max_threshold", max)?;
    }
    if levels.quantity < Decimal::ZERO {
        return Err(LedgerRuleError::invalid("quantity", "Quantity cannot be negative"));
    }
    if levels.reserved_quantity < Decimal::ZERO {
        return Err(LedgerRuleError::invalid(
            "reserved_quantity",
            "Reserved quantity cannot be negative",
        ));
    }
    if levels.min_threshold < Decimal::ZERO {
        return Err(LedgerRuleError::invalid(
            "min_threshold",
            "Minimum threshold cannot be negative",
        ));
    }
    if let Some(max) = levels.max_threshold {
        if max < levels.min_threshold {
            return Err(LedgerRuleError::invalid(
                "max_threshold",
                "Maximum threshold must not be below the minimum threshold",
            ));
        }
    }
    validate_cost(levels.cost_per_unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::from(n)
    }

    #[test]
    fn test_zero_quantity_rejected_for_every_type() {
        for t in IngredientMovementType::ALL {
            assert!(validate_ingredient_quantity(t, Decimal::ZERO).is_err());
        }
        assert!(validate_product_quantity(Decimal::ZERO).is_err());
    }

    #[test]
    fn test_negative_quantity_only_for_adjustment() {
        assert!(validate_ingredient_quantity(IngredientMovementType::Adjustment, dec(-5)).is_ok());
        assert!(validate_ingredient_quantity(IngredientMovementType::Purchase, dec(-5)).is_err());
        assert!(validate_ingredient_quantity(IngredientMovementType::Sale, dec(-5)).is_err());
        assert!(validate_ingredient_quantity(IngredientMovementType::Sale, dec(5)).is_ok());
    }

    #[test]
    fn test_sub_precision_quantity_rejected() {
        let tiny = Decimal::new(4, 4); // 0.0004
        let ragged = Decimal::new(10004, 4); // 1.0004

        for quantity in [tiny, ragged] {
            assert_eq!(
                validate_ingredient_quantity(IngredientMovementType::Purchase, quantity),
                Err(LedgerRuleError::Invalid {
                    field: "quantity",
                    message: "Quantity allows at most 3 decimal places",
                })
            );
            assert!(validate_product_quantity(quantity).is_err());
        }

        // Trailing zeros are not extra precision
        assert!(validate_product_quantity(Decimal::new(10000, 4)).is_ok());
        assert!(validate_product_quantity(Decimal::new(1001, 3)).is_ok());
    }

    #[test]
    fn test_oversized_values_rejected() {
        let too_big = Decimal::from(100_000_000_000i64);
        assert!(validate_product_quantity(too_big).is_err());
        assert!(validate_product_quantity(too_big - Decimal::ONE).is_ok());
        assert!(validate_cost(Some(Decimal::from(10_000_000_000i64))).is_err());
        assert!(validate_cost(Some(Decimal::new(12345, 5))).is_err());
        assert!(validate_total_cost(Some(Decimal::from(1_000_000_000_000i64))).is_err());
        assert!(validate_total_cost(Some(Decimal::new(9_999, 0))).is_ok());
    }

    #[test]
    fn test_unit_required() {
        assert!(validate_unit("kg").is_ok());
        assert!(validate_unit("   ").is_err());
        assert!(validate_unit("").is_err());
    }

    #[test]
    fn test_cost_validation() {
        assert!(validate_cost(None).is_ok());
        assert!(validate_cost(Some(Decimal::ZERO)).is_ok());
        assert!(validate_cost(Some(Decimal::new(250, 2))).is_ok());
        assert!(validate_cost(Some(dec(-1))).is_err());
    }

    #[test]
    fn test_batch_levels() {
        let ok = BatchLevels {
            quantity: dec(5),
            reserved_quantity: Decimal::ZERO,
            min_threshold: dec(10),
            max_threshold: Some(dec(100)),
            cost_per_unit: None,
        };
        assert!(validate_batch_levels(&ok).is_ok());

        let inverted = BatchLevels {
            max_threshold: Some(dec(5)),
            ..ok
        };
        assert_eq!(
            validate_batch_levels(&inverted),
            Err(LedgerRuleError::Invalid {
                field: "max_threshold",
                message: "Maximum threshold must not be below the minimum threshold",
            })
        );

        let negative = BatchLevels {
            quantity: dec(-1),
            ..ok
        };
        assert!(validate_batch_levels(&negative).is_err());
    }
}
