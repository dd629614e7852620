//! Match decision: pick the best candidate, apply the threshold and the
//! conflict band, commit through the store.

use std::cmp::Ordering;

use crate::config::MatcherConfig;
use crate::model::{
    MatchOutcome, MatchRecord, MatchStatus, ScoredCandidate, Source, TradeRecord,
};
use crate::store::RecordStore;

/// Decide the fate of one record given its scored candidates, committing
/// the result through the store.
///
/// Candidates must already be scored (higher is better). Records no longer
/// pending on either side make this a no-op, so re-running a batch over
/// partially processed input is safe.
pub fn decide_and_commit(
    record: &TradeRecord,
    scored: &[(TradeRecord, f64)],
    config: &MatcherConfig,
    store: &dyn RecordStore,
) -> MatchOutcome {
    if record.status != MatchStatus::Pending {
        return MatchOutcome::Skipped;
    }

    let mut ranked: Vec<&(TradeRecord, f64)> = scored
        .iter()
        .filter(|(candidate, _)| candidate.status == MatchStatus::Pending)
        .collect();

    if ranked.is_empty() {
        return mark_unmatched(record, store);
    }

    // Highest score first; ties broken by record id for determinism.
    ranked.sort_by(|x, y| {
        y.1
            .partial_cmp(&x.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| x.0.record_id.cmp(&y.0.record_id))
    });

    let (best, best_score) = (&ranked[0].0, ranked[0].1);
    if best_score < config.threshold {
        return mark_unmatched(record, store);
    }

    // Near-ties are ambiguous: hold them for manual review instead of
    // silently committing the top candidate.
    if ranked.len() > 1 && best_score - ranked[1].1 <= config.conflict_band {
        let candidates: Vec<ScoredCandidate> = ranked
            .iter()
            .take_while(|(_, s)| best_score - s <= config.conflict_band)
            .map(|(candidate, s)| ScoredCandidate {
                record_id: candidate.record_id.clone(),
                score: *s,
            })
            .collect();
        log::warn!(
            "ambiguous match for {}: {} candidates within {} of top score {:.4}",
            record.record_id,
            candidates.len(),
            config.conflict_band,
            best_score
        );
        return MatchOutcome::Ambiguous { candidates };
    }

    let (bank, counterparty) = match record.source {
        Source::Bank => (record, best),
        Source::Counterparty => (best, record),
    };
    let match_record = MatchRecord::new(bank, counterparty, best_score);

    if store.commit_match(&match_record) {
        MatchOutcome::Matched(match_record)
    } else {
        // Lost the race: one side transitioned since the snapshot.
        MatchOutcome::Skipped
    }
}

fn mark_unmatched(record: &TradeRecord, store: &dyn RecordStore) -> MatchOutcome {
    if store.mark_unmatched(&record.record_id) {
        MatchOutcome::Unmatched
    } else {
        MatchOutcome::Skipped
    }
}
