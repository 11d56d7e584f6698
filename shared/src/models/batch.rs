//! Batch stock summary model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::StatusTag;
use crate::types::round_money;

/// Counts per status and total value over a batch listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: i64,
    pub out_of_stock: i64,
    pub critical: i64,
    pub low: i64,
    pub expired: i64,
    pub expiring: i64,
    pub ok: i64,
    pub total_value: Decimal,
}

impl BatchSummary {
    pub fn record(&mut self, status: StatusTag, value: Decimal) {
        self.total += 1;
        match status {
            StatusTag::OutOfStock => self.out_of_stock += 1,
            StatusTag::Critical => self.critical += 1,
            StatusTag::Low => self.low += 1,
            StatusTag::Expired => self.expired += 1,
            StatusTag::Expiring => self.expiring += 1,
            StatusTag::Ok => self.ok += 1,
        }
        self.total_value += value;
    }

    /// Round money totals once every row is recorded
    pub fn finish(mut self) -> Self {
        self.total_value = round_money(self.total_value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_rounds_once_at_the_end() {
        let mut summary = BatchSummary::default();
        summary.record(StatusTag::Critical, Decimal::new(1004, 3));
        summary.record(StatusTag::Expired, Decimal::new(1004, 3));
        summary.record(StatusTag::Ok, Decimal::new(1004, 3));
        let summary = summary.finish();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.expired, 1);
        assert_eq!(summary.ok, 1);
        // 3.012, not 1.00 * 3
        assert_eq!(summary.total_value, Decimal::new(301, 2));
    }
}
