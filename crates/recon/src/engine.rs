use std::collections::HashMap;

use crate::bucket;
use crate::classify::classify;
use crate::config::{EngineConfig, MatcherConfig, ReconcilerConfig};
use crate::error::ReconError;
use crate::matcher::decide_and_commit;
use crate::model::{
    MatchOutcome, MatchingSummary, ReconReport, ReconStatus, Source, TradeRecord,
};
use crate::reconciler::reconcile;
use crate::report::build_report;
use crate::scorer;
use crate::store::RecordStore;

/// One matching pass: every pending bank record is bucketed, scored and
/// decided. Safe to re-run over partially processed input; records that
/// already reached a terminal state are skipped.
pub fn run_matching(store: &dyn RecordStore, config: &MatcherConfig) -> MatchingSummary {
    let mut summary = MatchingSummary::default();

    for record in store.fetch_pending(Source::Bank) {
        let candidates = bucket::find_candidates(&record, store, config);
        let scored: Vec<(TradeRecord, f64)> = candidates
            .into_iter()
            .map(|candidate| {
                let s = scorer::score(&record, &candidate, &config.weights);
                (candidate, s)
            })
            .collect();

        match decide_and_commit(&record, &scored, config, store) {
            MatchOutcome::Matched(_) => summary.matched += 1,
            MatchOutcome::Ambiguous { .. } => summary.ambiguous += 1,
            MatchOutcome::Unmatched => summary.unmatched += 1,
            MatchOutcome::Skipped => summary.skipped += 1,
        }
    }

    log::debug!(
        "matching pass: {} matched, {} unmatched, {} ambiguous, {} skipped",
        summary.matched,
        summary.unmatched,
        summary.ambiguous,
        summary.skipped
    );
    summary
}

/// Reconcile every committed match still awaiting field comparison.
/// Returns the number of pairs reconciled in this pass.
pub fn run_reconciliation(store: &dyn RecordStore, config: &ReconcilerConfig) -> usize {
    let mut reconciled = 0;

    for m in store.match_records() {
        if m.recon_status != ReconStatus::Pending {
            continue;
        }
        let Some((bank, counterparty)) = store.get_pair(&m.match_id) else {
            continue;
        };
        let results = reconcile(&bank, &counterparty, config);
        let status = classify(&results, &config.critical_fields);
        store.set_reconciliation(&m.match_id, status, results);
        reconciled += 1;
    }

    log::debug!("reconciliation pass: {reconciled} pairs classified");
    reconciled
}

/// Full pipeline: match, reconcile, report.
pub fn run(store: &dyn RecordStore, config: &EngineConfig) -> ReconReport {
    run_matching(store, &config.matcher);
    run_reconciliation(store, &config.reconciler);
    build_report(&store.match_records())
}

/// Load trade records from CSV. A `record_id` column is required; every
/// other column maps to a known attribute or lands in `extras`. Empty
/// cells are treated as absent.
pub fn load_csv_records(source: Source, csv_data: &str) -> Result<Vec<TradeRecord>, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReconError::Io(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let id_idx = headers
        .iter()
        .position(|h| h == "record_id")
        .ok_or_else(|| ReconError::MissingColumn {
            source: source.to_string(),
            column: "record_id".into(),
        })?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| ReconError::Io(e.to_string()))?;
        let record_id = row.get(id_idx).unwrap_or("").to_string();

        let mut fields: HashMap<String, String> = HashMap::new();
        for (i, header) in headers.iter().enumerate() {
            if i == id_idx {
                continue;
            }
            if let Some(value) = row.get(i) {
                if !value.trim().is_empty() {
                    fields.insert(header.clone(), value.to_string());
                }
            }
        }

        records.push(TradeRecord::from_fields(record_id, source, &fields));
    }

    Ok(records)
}
