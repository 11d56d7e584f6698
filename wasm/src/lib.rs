//! WebAssembly module for the kitchen inventory service
//!
//! Gives client code the same stock rules the backend applies:
//! - Status classification for ingredients and batches
//! - The ingredient ledger fold
//! - The clamped product stock increment
//! - Movement validation before submit

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    apply_clamped_delta, classify_batch_status, classify_ingredient_status, round_money,
    IngredientMovementType, LedgerEntry, LedgerTotals, ProductMovementType,
};
use wasm_bindgen::prelude::*;

/// Ledger entry as client code sends it
#[derive(Debug, Deserialize)]
struct EntryJson {
    #[serde(rename = "type")]
    movement_type: IngredientMovementType,
    quantity: Decimal,
    cost_per_unit: Option<Decimal>,
    created_at: DateTime<Utc>,
}

impl From<EntryJson> for LedgerEntry {
    fn from(entry: EntryJson) -> Self {
        LedgerEntry {
            movement_type: entry.movement_type,
            quantity: entry.quantity,
            cost_per_unit: entry.cost_per_unit,
            created_at: entry.created_at,
        }
    }
}

fn to_decimal(field: &str, value: f64) -> Result<Decimal, JsValue> {
    Decimal::try_from(value).map_err(|_| reject(format!("{} is not a usable number: {}", field, value)))
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

fn reject(message: String) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::warn_1(&JsValue::from_str(&message));
    JsValue::from_str(&message)
}

#[cfg(target_arch = "wasm32")]
fn client_today() -> Option<NaiveDate> {
    let now = js_sys::Date::new_0();
    NaiveDate::from_ymd_opt(
        now.get_utc_full_year() as i32,
        now.get_utc_month() + 1,
        now.get_utc_date(),
    )
}

#[cfg(not(target_arch = "wasm32"))]
fn client_today() -> Option<NaiveDate> {
    Some(Utc::now().date_naive())
}

/// Status of an aggregated ingredient quantity
#[wasm_bindgen]
pub fn classify_ingredient_stock(quantity: f64) -> Result<String, JsValue> {
    Ok(classify_ingredient_status(to_decimal("quantity", quantity)?).to_string())
}

/// Status of a batch; dates are `YYYY-MM-DD`, `today` defaults to the client's UTC date
#[wasm_bindgen]
pub fn classify_batch_stock(
    quantity: f64,
    min_threshold: f64,
    expiry_date: Option<String>,
    today: Option<String>,
    horizon_days: Option<i32>,
) -> Result<String, JsValue> {
    let parse = |s: &str| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| reject(format!("Invalid date {}: {}", s, e)))
    };

    let expiry = expiry_date.as_deref().map(parse).transpose()?;
    let today = match today.as_deref() {
        Some(s) => parse(s)?,
        None => client_today().ok_or_else(|| reject("Could not read the current date".into()))?,
    };
    let horizon = horizon_days
        .map(i64::from)
        .unwrap_or(shared::DEFAULT_EXPIRY_HORIZON_DAYS);

    let status = classify_batch_status(
        to_decimal("quantity", quantity)?,
        to_decimal("min_threshold", min_threshold)?,
        expiry,
        today,
        horizon,
    );
    Ok(status.to_string())
}

/// Fold a JSON array of ingredient movements into current stock figures
#[wasm_bindgen]
pub fn project_ingredient_ledger(entries_json: &str) -> Result<String, JsValue> {
    let entries: Vec<EntryJson> = serde_json::from_str(entries_json)
        .map_err(|e| reject(format!("Invalid ledger JSON: {}", e)))?;
    let entries: Vec<LedgerEntry> = entries.into_iter().map(LedgerEntry::from).collect();

    let totals = LedgerTotals::from_entries(&entries);
    let projection = serde_json::json!({
        "current_quantity": totals.current_quantity,
        "total_purchases": totals.total_purchases,
        "total_used": totals.total_used,
        "avg_cost": round_money(totals.avg_cost()),
        "current_value": round_money(totals.current_value),
        "last_movement_at": totals.last_movement_at,
        "status": classify_ingredient_status(totals.current_quantity),
    });

    Ok(projection.to_string())
}

/// Product stock after one movement, never below zero
#[wasm_bindgen]
pub fn product_stock_after(current: f64, movement_type: &str, quantity: f64) -> Result<f64, JsValue> {
    let movement_type = movement_type
        .parse::<ProductMovementType>()
        .map_err(|e| reject(e.to_string()))?;
    let delta = movement_type.signed_delta(to_decimal("quantity", quantity)?);
    Ok(to_f64(apply_clamped_delta(to_decimal("current", current)?, delta)))
}

/// Check an ingredient movement before it is sent; returns the problem, if any
#[wasm_bindgen]
pub fn check_ingredient_movement(movement_type: &str, quantity: f64, unit: &str) -> Option<String> {
    let movement_type = match movement_type.parse::<IngredientMovementType>() {
        Ok(t) => t,
        Err(e) => return Some(e.to_string()),
    };
    let Ok(quantity) = Decimal::try_from(quantity) else {
        return Some(format!("quantity is not a usable number: {}", quantity));
    };
    shared::validate_ingredient_quantity(movement_type, quantity)
        .and_then(|_| shared::validate_unit(unit))
        .err()
        .map(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_ingredient_stock() {
        assert_eq!(classify_ingredient_stock(0.0).unwrap(), "out_of_stock");
        assert_eq!(classify_ingredient_stock(10.0).unwrap(), "critical");
        assert_eq!(classify_ingredient_stock(50.0).unwrap(), "low");
        assert_eq!(classify_ingredient_stock(50.5).unwrap(), "ok");
    }

    #[test]
    fn test_classify_batch_stock() {
        let today = Some("2025-03-01".to_string());
        assert_eq!(
            classify_batch_stock(5.0, 10.0, None, today.clone(), None).unwrap(),
            "critical"
        );
        assert_eq!(
            classify_batch_stock(0.0, 10.0, None, today.clone(), None).unwrap(),
            "out_of_stock"
        );
        assert_eq!(
            classify_batch_stock(100.0, 10.0, Some("2025-03-20".into()), today.clone(), None)
                .unwrap(),
            "expiring"
        );
        assert_eq!(
            classify_batch_stock(100.0, 10.0, Some("2025-03-20".into()), today.clone(), Some(7))
                .unwrap(),
            "ok"
        );
        assert_eq!(
            classify_batch_stock(100.0, 10.0, Some("2025-03-20".into()), today, Some(i32::MAX))
                .unwrap(),
            "ok"
        );
    }

    #[test]
    fn test_project_ingredient_ledger() {
        let ledger = r#"[
            {"type": "purchase", "quantity": "100", "cost_per_unit": "2.00", "created_at": "2025-03-01T08:00:00Z"},
            {"type": "sale", "quantity": 30, "cost_per_unit": 2.0, "created_at": "2025-03-01T12:00:00Z"},
            {"type": "transfer", "quantity": 5, "created_at": "2025-03-01T13:00:00Z"}
        ]"#;

        let projection: serde_json::Value =
            serde_json::from_str(&project_ingredient_ledger(ledger).unwrap()).unwrap();

        assert_eq!(projection["status"], "ok");
        assert_eq!(projection["current_quantity"], "70");
        assert_eq!(projection["current_value"], "140.00");
        assert_eq!(projection["last_movement_at"], "2025-03-01T13:00:00Z");
    }

    #[test]
    fn test_product_stock_after() {
        assert_eq!(product_stock_after(5.0, "in", 10.0).unwrap(), 15.0);
        assert_eq!(product_stock_after(5.0, "out", 10.0).unwrap(), 0.0);
        assert_eq!(product_stock_after(5.0, "adjustment", -2.0).unwrap(), 3.0);
    }

    #[test]
    fn test_check_ingredient_movement() {
        assert_eq!(check_ingredient_movement("purchase", 10.0, "kg"), None);
        assert_eq!(check_ingredient_movement("adjustment", -3.0, "kg"), None);
        assert!(check_ingredient_movement("purchase", -3.0, "kg").is_some());
        assert!(check_ingredient_movement("purchase", 0.0, "kg").is_some());
        assert!(check_ingredient_movement("in", 1.0, "kg").is_some());
        assert!(check_ingredient_movement("waste", 1.0, "").is_some());
        assert!(check_ingredient_movement("purchase", f64::NAN, "kg").is_some());
        assert!(check_ingredient_movement("purchase", 0.0004, "kg").is_some());
    }
}
