//! Stock alert classification
//!
//! Status tags are always derived from current quantity, thresholds and expiry;
//! they are never stored.

use std::cmp::Ordering;

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Quantity at or below which an ingredient is critical
pub const INGREDIENT_CRITICAL_LEVEL: i64 = 10;

/// Quantity at or below which an ingredient is low
pub const INGREDIENT_LOW_LEVEL: i64 = 50;

/// Days ahead of today in which a batch counts as expiring
pub const DEFAULT_EXPIRY_HORIZON_DAYS: i64 = 30;

/// Alert classification for a stock row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTag {
    OutOfStock,
    Critical,
    Low,
    Expired,
    Expiring,
    Ok,
}

impl StatusTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusTag::OutOfStock => "out_of_stock",
            StatusTag::Critical => "critical",
            StatusTag::Low => "low",
            StatusTag::Expired => "expired",
            StatusTag::Expiring => "expiring",
            StatusTag::Ok => "ok",
        }
    }

    /// Sort rank for batch lists; 1 is the most urgent.
    ///
    /// Expired and expiring batches rank ahead of low ones.
    pub fn severity_rank(&self) -> u8 {
        match self {
            StatusTag::OutOfStock => 1,
            StatusTag::Critical => 2,
            StatusTag::Expired => 3,
            StatusTag::Expiring => 4,
            StatusTag::Low => 5,
            StatusTag::Ok => 6,
        }
    }
}

impl std::fmt::Display for StatusTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify an aggregated ingredient quantity against the fixed levels
pub fn classify_ingredient_status(quantity: Decimal) -> StatusTag {
    if quantity <= Decimal::ZERO {
        StatusTag::OutOfStock
    } else if quantity <= Decimal::from(INGREDIENT_CRITICAL_LEVEL) {
        StatusTag::Critical
    } else if quantity <= Decimal::from(INGREDIENT_LOW_LEVEL) {
        StatusTag::Low
    } else {
        StatusTag::Ok
    }
}

/// Classify a batch against its own thresholds and expiry date.
///
/// Quantity rules win over expiry rules: an empty batch is out of stock even
/// when it has also expired.
pub fn classify_batch_status(
    quantity: Decimal,
    min_threshold: Decimal,
    expiry_date: Option<NaiveDate>,
    today: NaiveDate,
    horizon_days: i64,
) -> StatusTag {
    if quantity <= Decimal::ZERO {
        return StatusTag::OutOfStock;
    }
    if quantity <= min_threshold {
        return StatusTag::Critical;
    }
    if quantity <= min_threshold * Decimal::new(15, 1) {
        return StatusTag::Low;
    }
    // A horizon past the last representable date marks nothing as expiring
    let horizon_end = u64::try_from(horizon_days)
        .ok()
        .and_then(|days| today.checked_add_days(Days::new(days)));
    match expiry_date {
        Some(expiry) if expiry <= today => StatusTag::Expired,
        Some(expiry) if horizon_end.map_or(false, |end| expiry <= end) => StatusTag::Expiring,
        _ => StatusTag::Ok,
    }
}

/// Rows that can be ordered in a batch stock list
pub trait SeverityOrdered {
    fn status(&self) -> StatusTag;
    fn expiry_date(&self) -> Option<NaiveDate>;
    fn subject_name(&self) -> &str;
}

/// Severity rank, then earliest expiry (undated last), then name
pub fn compare_by_severity<T: SeverityOrdered>(a: &T, b: &T) -> Ordering {
    a.status()
        .severity_rank()
        .cmp(&b.status().severity_rank())
        .then_with(|| match (a.expiry_date(), b.expiry_date()) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.subject_name().cmp(b.subject_name()))
}

/// Sort rows most urgent first
pub fn sort_by_severity<T: SeverityOrdered>(rows: &mut [T]) {
    rows.sort_by(compare_by_severity);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_ingredient_levels() {
        assert_eq!(classify_ingredient_status(Decimal::from(-3)), StatusTag::OutOfStock);
        assert_eq!(classify_ingredient_status(Decimal::ZERO), StatusTag::OutOfStock);
        assert_eq!(classify_ingredient_status(Decimal::new(1, 2)), StatusTag::Critical);
        assert_eq!(classify_ingredient_status(Decimal::from(10)), StatusTag::Critical);
        assert_eq!(classify_ingredient_status(Decimal::new(1001, 2)), StatusTag::Low);
        assert_eq!(classify_ingredient_status(Decimal::from(50)), StatusTag::Low);
        assert_eq!(classify_ingredient_status(Decimal::new(5001, 2)), StatusTag::Ok);
    }

    #[test]
    fn test_batch_quantity_rules() {
        let today = day(2025, 3, 1);
        let min = Decimal::from(10);
        assert_eq!(classify_batch_status(Decimal::from(5), min, None, today, 30), StatusTag::Critical);
        assert_eq!(classify_batch_status(Decimal::ZERO, min, None, today, 30), StatusTag::OutOfStock);
        assert_eq!(
            classify_batch_status(Decimal::ZERO, Decimal::ZERO, None, today, 30),
            StatusTag::OutOfStock
        );
        assert_eq!(classify_batch_status(Decimal::from(15), min, None, today, 30), StatusTag::Low);
        assert_eq!(classify_batch_status(Decimal::from(16), min, None, today, 30), StatusTag::Ok);
    }

    #[test]
    fn test_batch_expiry_rules() {
        let today = day(2025, 3, 1);
        let min = Decimal::from(10);
        let qty = Decimal::from(100);
        assert_eq!(classify_batch_status(qty, min, Some(today), today, 30), StatusTag::Expired);
        assert_eq!(
            classify_batch_status(qty, min, Some(day(2025, 3, 31)), today, 30),
            StatusTag::Expiring
        );
        assert_eq!(
            classify_batch_status(qty, min, Some(day(2025, 4, 1)), today, 30),
            StatusTag::Ok
        );
        // Low stock wins over expiry
        assert_eq!(
            classify_batch_status(Decimal::from(12), min, Some(day(2024, 1, 1)), today, 30),
            StatusTag::Low
        );
    }

    #[test]
    fn test_out_of_range_horizon_does_not_panic() {
        let today = day(2025, 3, 1);
        let min = Decimal::from(10);
        let qty = Decimal::from(100);
        let soon = Some(day(2025, 3, 5));

        assert_eq!(classify_batch_status(qty, min, soon, today, i64::MAX), StatusTag::Ok);
        assert_eq!(classify_batch_status(qty, min, soon, today, -1), StatusTag::Ok);
        assert_eq!(
            classify_batch_status(qty, min, soon, NaiveDate::MAX, i32::MAX.into()),
            StatusTag::Expired
        );
    }

    #[test]
    fn test_severity_ranks_put_expiry_ahead_of_low() {
        assert!(StatusTag::Expired.severity_rank() < StatusTag::Low.severity_rank());
        assert!(StatusTag::Expiring.severity_rank() < StatusTag::Low.severity_rank());
        assert!(StatusTag::Critical.severity_rank() < StatusTag::Expired.severity_rank());
    }

    struct Row(StatusTag, Option<NaiveDate>, &'static str);

    impl SeverityOrdered for Row {
        fn status(&self) -> StatusTag {
            self.0
        }
        fn expiry_date(&self) -> Option<NaiveDate> {
            self.1
        }
        fn subject_name(&self) -> &str {
            self.2
        }
    }

    #[test]
    fn test_sort_by_severity_then_expiry_then_name() {
        let mut rows = vec![
            Row(StatusTag::Ok, None, "Basil"),
            Row(StatusTag::Low, Some(day(2025, 5, 1)), "Flour"),
            Row(StatusTag::Expiring, None, "Milk"),
            Row(StatusTag::Critical, None, "Butter"),
            Row(StatusTag::Critical, Some(day(2025, 4, 1)), "Yeast"),
            Row(StatusTag::Critical, Some(day(2025, 4, 1)), "Eggs"),
            Row(StatusTag::OutOfStock, None, "Salt"),
        ];
        sort_by_severity(&mut rows);
        let names: Vec<&str> = rows.iter().map(|r| r.2).collect();
        assert_eq!(names, ["Salt", "Eggs", "Yeast", "Butter", "Milk", "Flour", "Basil"]);
    }

    proptest! {
        /// Quantity rules decide before expiry is looked at
        #[test]
        fn prop_quantity_rules_ignore_expiry(
            qty in -50i64..50,
            min in 0i64..40,
            expiry_offset in -400i64..400,
        ) {
            let today = day(2025, 3, 1);
            let quantity = Decimal::from(qty);
            let min = Decimal::from(min);
            let expiry = Some(today + chrono::Duration::days(expiry_offset));

            let dated = classify_batch_status(quantity, min, expiry, today, 30);
            let undated = classify_batch_status(quantity, min, None, today, 30);

            if quantity <= min * Decimal::new(15, 1) {
                prop_assert_eq!(dated, undated);
            } else {
                prop_assert!(matches!(
                    dated,
                    StatusTag::Expired | StatusTag::Expiring | StatusTag::Ok
                ));
            }
        }
    }
}
