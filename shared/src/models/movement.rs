//! Movement ledger models
//!
//! Two independent ledgers exist: the ingredient ledger (raw stock, projected
//! on demand) and the product ledger (sellable stock, projected into a
//! materialized row). Their type enumerations are not interchangeable.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::LedgerRuleError;

/// Movement types recorded on the ingredient ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngredientMovementType {
    Purchase,
    Sale,
    Waste,
    Adjustment,
    Transfer,
    Production,
}

impl IngredientMovementType {
    pub const ALL: [IngredientMovementType; 6] = [
        IngredientMovementType::Purchase,
        IngredientMovementType::Sale,
        IngredientMovementType::Waste,
        IngredientMovementType::Adjustment,
        IngredientMovementType::Transfer,
        IngredientMovementType::Production,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IngredientMovementType::Purchase => "purchase",
            IngredientMovementType::Sale => "sale",
            IngredientMovementType::Waste => "waste",
            IngredientMovementType::Adjustment => "adjustment",
            IngredientMovementType::Transfer => "transfer",
            IngredientMovementType::Production => "production",
        }
    }

    /// Types that draw stock down and count towards `total_used`
    pub fn is_consumption(&self) -> bool {
        matches!(
            self,
            IngredientMovementType::Sale
                | IngredientMovementType::Waste
                | IngredientMovementType::Production
        )
    }

    /// Only adjustments carry a sign; every other type must be positive.
    pub fn is_signed(&self) -> bool {
        matches!(self, IngredientMovementType::Adjustment)
    }
}

impl std::str::FromStr for IngredientMovementType {
    type Err = LedgerRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IngredientMovementType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| LedgerRuleError::UnknownMovementType(s.to_string()))
    }
}

impl std::fmt::Display for IngredientMovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Movement types recorded on the product ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductMovementType {
    In,
    Out,
    Adjustment,
}

impl ProductMovementType {
    pub const ALL: [ProductMovementType; 3] = [
        ProductMovementType::In,
        ProductMovementType::Out,
        ProductMovementType::Adjustment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductMovementType::In => "in",
            ProductMovementType::Out => "out",
            ProductMovementType::Adjustment => "adjustment",
        }
    }

    /// Signed change this movement applies to materialized stock.
    ///
    /// `in` and `out` are interpreted by magnitude; an adjustment is taken as given.
    pub fn signed_delta(&self, quantity: Decimal) -> Decimal {
        match self {
            ProductMovementType::In => quantity.abs(),
            ProductMovementType::Out => -quantity.abs(),
            ProductMovementType::Adjustment => quantity,
        }
    }
}

impl std::str::FromStr for ProductMovementType {
    type Err = LedgerRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProductMovementType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| LedgerRuleError::UnknownMovementType(s.to_string()))
    }
}

impl std::fmt::Display for ProductMovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What caused a movement (an order, a recipe run, a stock count, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MovementReference {
    #[serde(rename = "type")]
    pub reference_type: Option<String>,
    pub id: Option<String>,
}

/// The slice of an ingredient movement the projector needs
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub movement_type: IngredientMovementType,
    pub quantity: Decimal,
    pub cost_per_unit: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

/// Protected fields of a stored movement, as they are now
#[derive(Debug, Clone, PartialEq)]
pub struct ProtectedFields<T> {
    pub subject_id: Uuid,
    pub movement_type: T,
    pub quantity: Decimal,
}

/// Protected fields a caller sent along with an annotation update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestedProtectedFields<T> {
    pub subject_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub movement_type: Option<T>,
    pub quantity: Option<Decimal>,
}

impl<T> Default for RequestedProtectedFields<T> {
    fn default() -> Self {
        Self {
            subject_id: None,
            movement_type: None,
            quantity: None,
        }
    }
}

/// Reject an update that would change subject, type or quantity.
///
/// Resending a protected field with its stored value is not a change.
pub fn check_protected_fields<T: PartialEq>(
    stored: &ProtectedFields<T>,
    requested: &RequestedProtectedFields<T>,
) -> Result<(), LedgerRuleError> {
    if matches!(requested.subject_id, Some(id) if id != stored.subject_id) {
        return Err(LedgerRuleError::ImmutableField("subject_id"));
    }
    if matches!(&requested.movement_type, Some(t) if *t != stored.movement_type) {
        return Err(LedgerRuleError::ImmutableField("type"));
    }
    if matches!(requested.quantity, Some(q) if q != stored.quantity) {
        return Err(LedgerRuleError::ImmutableField("quantity"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_ingredient_types_round_trip_through_str() {
        for t in IngredientMovementType::ALL {
            assert_eq!(IngredientMovementType::from_str(t.as_str()).unwrap(), t);
        }
        assert!(IngredientMovementType::from_str("in").is_err());
    }

    #[test]
    fn test_product_types_are_not_ingredient_types() {
        assert!(ProductMovementType::from_str("purchase").is_err());
        assert!(ProductMovementType::from_str("out").is_ok());
    }

    #[test]
    fn test_signed_delta() {
        let ten = Decimal::from(10);
        assert_eq!(ProductMovementType::In.signed_delta(ten), ten);
        assert_eq!(ProductMovementType::In.signed_delta(-ten), ten);
        assert_eq!(ProductMovementType::Out.signed_delta(ten), -ten);
        assert_eq!(ProductMovementType::Out.signed_delta(-ten), -ten);
        assert_eq!(ProductMovementType::Adjustment.signed_delta(-ten), -ten);
    }

    #[test]
    fn test_protected_fields_only_reason_changed() {
        let stored = ProtectedFields {
            subject_id: Uuid::nil(),
            movement_type: IngredientMovementType::Sale,
            quantity: Decimal::from(30),
        };
        assert!(check_protected_fields(&stored, &RequestedProtectedFields::default()).is_ok());

        let same = RequestedProtectedFields {
            subject_id: Some(Uuid::nil()),
            movement_type: Some(IngredientMovementType::Sale),
            quantity: Some(Decimal::from(30)),
        };
        assert!(check_protected_fields(&stored, &same).is_ok());
    }

    #[test]
    fn test_protected_fields_quantity_change_rejected() {
        let stored = ProtectedFields {
            subject_id: Uuid::nil(),
            movement_type: IngredientMovementType::Sale,
            quantity: Decimal::from(30),
        };
        let requested = RequestedProtectedFields {
            quantity: Some(Decimal::from(31)),
            ..Default::default()
        };
        assert_eq!(
            check_protected_fields(&stored, &requested),
            Err(LedgerRuleError::ImmutableField("quantity"))
        );
    }
}
