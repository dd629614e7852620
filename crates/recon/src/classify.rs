//! Overall status classification for one matched pair's field results.

use std::collections::BTreeMap;

use crate::model::{FieldComparison, ReconStatus, Verdict};

/// Classify per-field verdicts into one overall status.
///
/// Strict priority: any critical-field disagreement or absence wins, then
/// any disagreement at all (critical fields are not excluded from this
/// check), then full agreement. Pure and total over the result map.
pub fn classify(
    results: &BTreeMap<String, FieldComparison>,
    critical_fields: &[String],
) -> ReconStatus {
    let disagrees =
        |c: &FieldComparison| matches!(c.verdict, Verdict::Mismatched | Verdict::Missing);

    let critical_hit = critical_fields
        .iter()
        .any(|field| results.get(field).map_or(false, |c| disagrees(c)));
    if critical_hit {
        return ReconStatus::CriticalMismatch;
    }

    if results.values().any(|c| disagrees(c)) {
        return ReconStatus::PartiallyMatched;
    }

    ReconStatus::FullyMatched
}
