//! Coarse candidate bucketing.
//!
//! The bucket key is intentionally lossy (date / currency / $1000-granular
//! notional / commodity) so near-duplicates with minor formatting
//! differences still co-bucket; precision comes from the scorer, not from
//! this step.

use crate::config::MatcherConfig;
use crate::model::{FieldValue, TradeRecord};
use crate::store::RecordStore;

/// Sentinel key for records carrying none of the bucketing attributes.
pub const UNKNOWN_KEY: &str = "UNKNOWN";

const KEY_DELIMITER: char = '|';

/// Build the approximate bucketing key for a record: whichever of trade
/// date, currency, notional bucket and commodity are present, joined in
/// fixed order.
pub fn bucket_key(record: &TradeRecord) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(date) = record.trade_date {
        parts.push(date.format("%Y-%m-%d").to_string());
    }
    if let Some(ref currency) = record.currency {
        parts.push(currency.clone());
    }
    if let Some(FieldValue::Number(notional)) = record.notional_quantity {
        parts.push(format!("N{}K", (notional / 1000.0).floor() as i64));
    }
    if let Some(ref commodity) = record.commodity_type {
        parts.push(commodity.clone());
    }
    if parts.is_empty() {
        UNKNOWN_KEY.to_string()
    } else {
        parts.join(&KEY_DELIMITER.to_string())
    }
}

/// True when `key` contains every component (substring containment, not
/// key equality — tolerates partial attribute presence on either side).
pub fn key_contains_components(key: &str, components: &[String]) -> bool {
    components.iter().all(|c| key.contains(c.as_str()))
}

/// Candidate records of the opposite source for one record.
///
/// A usable key narrows by component containment against each candidate's
/// own bucket key; the sentinel falls back to an unfiltered slice of
/// pending records.
pub fn find_candidates(
    record: &TradeRecord,
    store: &dyn RecordStore,
    config: &MatcherConfig,
) -> Vec<TradeRecord> {
    let key = bucket_key(record);
    let opposite = record.source.opposite();

    if key == UNKNOWN_KEY {
        let mut pending = store.fetch_pending(opposite);
        pending.truncate(config.fallback_limit);
        return pending;
    }

    let components: Vec<String> = key
        .split(KEY_DELIMITER)
        .map(str::to_string)
        .collect();
    store.find_candidates(&components, opposite, config.candidate_limit)
}
