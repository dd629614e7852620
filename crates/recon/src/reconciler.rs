//! Field-by-field reconciliation of a matched pair.

use std::collections::BTreeMap;

use crate::config::ReconcilerConfig;
use crate::model::{FieldComparison, FieldValue, TradeRecord, Verdict};
use crate::similarity;

// ---------------------------------------------------------------------------
// Field table
// ---------------------------------------------------------------------------

/// Comparison rule for a reconciliation field, decided up front rather
/// than per value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Byte-for-byte (dates, currency).
    Exact,
    /// Percentage difference against a per-field tolerance.
    Numeric,
    /// Similarity ratio against the string threshold.
    Fuzzy,
}

/// The fixed set of reconciled fields, in report order.
pub const RECON_FIELDS: &[(&str, FieldKind)] = &[
    ("trade_date", FieldKind::Exact),
    ("effective_date", FieldKind::Exact),
    ("termination_date", FieldKind::Exact),
    ("notional_quantity", FieldKind::Numeric),
    ("notional_unit", FieldKind::Fuzzy),
    ("fixed_price", FieldKind::Numeric),
    ("currency", FieldKind::Exact),
    ("price_unit", FieldKind::Fuzzy),
    ("commodity_type", FieldKind::Fuzzy),
    ("settlement_type", FieldKind::Fuzzy),
    ("business_day_convention", FieldKind::Fuzzy),
];

pub fn is_recon_field(name: &str) -> bool {
    RECON_FIELDS.iter().any(|(field, _)| *field == name)
}

pub fn is_numeric_field(name: &str) -> bool {
    RECON_FIELDS
        .iter()
        .any(|(field, kind)| *field == name && *kind == FieldKind::Numeric)
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// Compare a matched pair over the fixed field set. Fields absent on both
/// sides emit no result; every emitted mismatch or absence carries a
/// reason string for the audit trail.
pub fn reconcile(
    a: &TradeRecord,
    b: &TradeRecord,
    config: &ReconcilerConfig,
) -> BTreeMap<String, FieldComparison> {
    let mut results = BTreeMap::new();

    for &(field, kind) in RECON_FIELDS {
        let va = field_value(a, field);
        let vb = field_value(b, field);

        let comparison = match (va, vb) {
            (None, None) => continue,
            (Some(va), Some(vb)) => compare_present(field, kind, va, vb, config),
            (va, vb) => FieldComparison {
                field: field.to_string(),
                value_a: va,
                value_b: vb,
                verdict: Verdict::Missing,
                reason: Some("field missing in one source".into()),
            },
        };
        results.insert(field.to_string(), comparison);
    }

    results
}

/// Typed value of a named field, falling back to the extras map for inputs
/// that failed coercion at ingestion.
fn field_value(record: &TradeRecord, field: &str) -> Option<FieldValue> {
    let value = match field {
        "trade_date" => record.trade_date.map(FieldValue::Date),
        "effective_date" => record.effective_date.map(FieldValue::Date),
        "termination_date" => record.termination_date.map(FieldValue::Date),
        "notional_quantity" => record.notional_quantity.clone(),
        "notional_unit" => record.notional_unit.clone().map(FieldValue::Text),
        "fixed_price" => record.fixed_price.clone(),
        "currency" => record.currency.clone().map(FieldValue::Text),
        "price_unit" => record.price_unit.clone().map(FieldValue::Text),
        "commodity_type" => record.commodity_type.clone().map(FieldValue::Text),
        "settlement_type" => record.settlement_type.clone().map(FieldValue::Text),
        "business_day_convention" => {
            record.business_day_convention.clone().map(FieldValue::Text)
        }
        _ => None,
    };
    value.or_else(|| record.extras.get(field).map(|raw| FieldValue::Text(raw.clone())))
}

fn compare_present(
    field: &str,
    kind: FieldKind,
    a: FieldValue,
    b: FieldValue,
    config: &ReconcilerConfig,
) -> FieldComparison {
    match kind {
        FieldKind::Numeric => match (a.as_number(), b.as_number()) {
            (Some(na), Some(nb)) => {
                compare_numeric(field, na, nb, config.tolerance_for(field))
            }
            // Unparsable on at least one side: opaque comparison.
            _ => compare_opaque(field, a, b),
        },
        FieldKind::Exact => compare_exact(field, a, b),
        FieldKind::Fuzzy => match (a, b) {
            (FieldValue::Text(ta), FieldValue::Text(tb)) => {
                compare_fuzzy(field, ta, tb, config.string_threshold)
            }
            (a, b) => compare_opaque(field, a, b),
        },
    }
}

fn compare_numeric(field: &str, a: f64, b: f64, tolerance: f64) -> FieldComparison {
    let value_a = Some(FieldValue::Number(a));
    let value_b = Some(FieldValue::Number(b));

    if a == 0.0 {
        return if b == 0.0 {
            FieldComparison {
                field: field.to_string(),
                value_a,
                value_b,
                verdict: Verdict::Matched,
                reason: None,
            }
        } else {
            FieldComparison {
                field: field.to_string(),
                value_a,
                value_b,
                verdict: Verdict::Mismatched,
                reason: Some("values differ and reference value is zero".into()),
            }
        };
    }

    // Percentage difference is computed against the first value as
    // reference, so swapping the sides changes the reported number.
    let pct_diff = (a - b).abs() / a.abs();
    if pct_diff <= tolerance {
        FieldComparison {
            field: field.to_string(),
            value_a,
            value_b,
            verdict: Verdict::Matched,
            reason: None,
        }
    } else {
        FieldComparison {
            field: field.to_string(),
            value_a,
            value_b,
            verdict: Verdict::Mismatched,
            reason: Some(format!(
                "difference {:.2}% exceeds tolerance {:.2}%",
                pct_diff * 100.0,
                tolerance * 100.0
            )),
        }
    }
}

fn compare_exact(field: &str, a: FieldValue, b: FieldValue) -> FieldComparison {
    let matched = match (&a, &b) {
        (FieldValue::Date(da), FieldValue::Date(db)) => da == db,
        _ => a.render() == b.render(),
    };
    let reason = if matched {
        None
    } else {
        Some(format!("values differ: {} vs {}", a.render(), b.render()))
    };
    FieldComparison {
        field: field.to_string(),
        value_a: Some(a),
        value_b: Some(b),
        verdict: if matched {
            Verdict::Matched
        } else {
            Verdict::Mismatched
        },
        reason,
    }
}

fn compare_fuzzy(field: &str, a: String, b: String, threshold: f64) -> FieldComparison {
    let ratio = similarity::ratio(&a, &b);
    let matched = ratio >= threshold;
    let reason = if matched {
        None
    } else {
        Some(format!(
            "similarity {:.0}% below threshold {:.0}%",
            ratio * 100.0,
            threshold * 100.0
        ))
    };
    FieldComparison {
        field: field.to_string(),
        value_a: Some(FieldValue::Text(a)),
        value_b: Some(FieldValue::Text(b)),
        verdict: if matched {
            Verdict::Matched
        } else {
            Verdict::Mismatched
        },
        reason,
    }
}

/// Mixed or unparsable values: string-representation equality.
fn compare_opaque(field: &str, a: FieldValue, b: FieldValue) -> FieldComparison {
    let matched = a.render() == b.render();
    let reason = if matched {
        None
    } else {
        Some(format!("values differ: {} vs {}", a.render(), b.render()))
    };
    FieldComparison {
        field: field.to_string(),
        value_a: Some(a),
        value_b: Some(b),
        verdict: if matched {
            Verdict::Matched
        } else {
            Verdict::Mismatched
        },
        reason,
    }
}
