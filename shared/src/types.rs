//! Common types used across the service

use chrono::{Duration, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Round a money or quantity figure for reporting (2 decimals)
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Limit/offset pagination parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    /// Build pagination from optional request values, clamped to sane bounds
    pub fn clamped(limit: Option<i64>, offset: Option<i64>, default_limit: i64, max_limit: i64) -> Self {
        Self {
            limit: limit.unwrap_or(default_limit).clamp(1, max_limit.max(1)),
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub records: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationMeta {
    pub limit: i64,
    pub offset: i64,
    pub total_items: i64,
    pub has_more: bool,
}

impl PaginationMeta {
    pub fn new(page: Pagination, returned: usize, total_items: i64) -> Self {
        Self {
            limit: page.limit,
            offset: page.offset,
            total_items,
            has_more: page.offset + (returned as i64) < total_items,
        }
    }
}

/// Inclusive calendar date range for queries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// First day after the range, for half-open timestamp comparisons
    pub fn end_exclusive(&self) -> NaiveDate {
        self.end.succ_opt().unwrap_or(NaiveDate::MAX)
    }
}

/// Reporting window for movement statistics
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StatsPeriod {
    Today,
    Week,
    #[default]
    Month,
    Year,
}

impl StatsPeriod {
    /// Range ending today covering the period, today included
    pub fn range_ending(&self, today: NaiveDate) -> DateRange {
        let days_back = match self {
            StatsPeriod::Today => 0,
            StatsPeriod::Week => 6,
            StatsPeriod::Month => 29,
            StatsPeriod::Year => 364,
        };
        DateRange {
            start: today - Duration::days(days_back),
            end: today,
        }
    }
}

/// Pick the stats window: an explicit complete range wins over a period
pub fn resolve_stats_range(
    period: Option<StatsPeriod>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> DateRange {
    match (start, end) {
        (Some(start), Some(end)) => DateRange { start, end },
        _ => period.unwrap_or_default().range_ending(today),
    }
}
