//! Weighted similarity scoring between two candidate records.

use std::collections::HashMap;

use crate::model::{FieldValue, TradeRecord};
use crate::similarity;

/// Weighted aggregate similarity between two candidate records.
///
/// A field contributes only when both records carry it; absent fields
/// reduce the attainable maximum rather than being penalized. The result
/// is a plain weighted sum, bounded by the configured weights.
pub fn score(a: &TradeRecord, b: &TradeRecord, weights: &HashMap<String, f64>) -> f64 {
    let weight = |key: &str| weights.get(key).copied().unwrap_or(0.0);
    let mut total = 0.0;

    // Trade date: exact agreement or nothing.
    if let (Some(da), Some(db)) = (a.trade_date, b.trade_date) {
        if da == db {
            total += weight("trade_date");
        }
    }

    // Party name: buyer falling back to seller, resolved per side.
    if let (Some(na), Some(nb)) = (a.party_name(), b.party_name()) {
        total += weight("counterparty") * similarity::ratio(na, nb);
    }

    if let (Some(FieldValue::Number(qa)), Some(FieldValue::Number(qb))) =
        (&a.notional_quantity, &b.notional_quantity)
    {
        total += weight("notional") * notional_subscore(*qa, *qb);
    }

    if let (Some(ca), Some(cb)) = (&a.currency, &b.currency) {
        if ca.eq_ignore_ascii_case(cb) {
            total += weight("currency");
        }
    }

    if let (Some(ka), Some(kb)) = (&a.commodity_type, &b.commodity_type) {
        total += weight("commodity") * similarity::ratio(ka, kb);
    }

    total
}

/// Step function over the percentage difference, computed against the
/// first value as reference. A zero reference agrees only with zero.
fn notional_subscore(a: f64, b: f64) -> f64 {
    if a == 0.0 {
        return if b == 0.0 { 1.0 } else { 0.0 };
    }
    let pct_diff = (a - b).abs() / a.abs();
    if pct_diff <= 0.001 {
        1.0
    } else if pct_diff <= 0.01 {
        0.9
    } else if pct_diff <= 0.05 {
        0.5
    } else {
        (1.0 - pct_diff).max(0.0)
    }
}
