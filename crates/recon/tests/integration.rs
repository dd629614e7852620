//! End-to-end scenarios: CSV input through matching, reconciliation and
//! reporting.

use std::sync::Arc;

use tradematch_recon::config::EngineConfig;
use tradematch_recon::engine::{load_csv_records, run, run_matching};
use tradematch_recon::matcher::decide_and_commit;
use tradematch_recon::model::{
    MatchOutcome, MatchStatus, ReconStatus, Source, TradeRecord, Verdict,
};
use tradematch_recon::reconciler::reconcile;
use tradematch_recon::store::{InMemoryStore, RecordStore};

const CONFIG_TOML: &str = r#"
[matcher]
threshold = 0.85
conflict_band = 0.02

[matcher.weights]
trade_date   = 0.25
counterparty = 0.20
notional     = 0.25
currency     = 0.15
commodity    = 0.15

[reconciler]
critical_fields = ["notional_quantity", "fixed_price", "currency"]
string_threshold = 0.8

[reconciler.tolerances]
notional_quantity = 0.001
fixed_price       = 0.001
"#;

const BANK_CSV: &str = "\
record_id,trade_date,notional_quantity,currency,commodity_type,fixed_price,settlement_type,buyer
B-100,2024-01-15,1000000,USD,CRUDE_OIL,75.50,Physical,Globex Trading
B-200,2024-02-10,2000000,USD,NATGAS,3.25,Physical,Globex Trading
B-300,2024-03-05,1000000,EUR,POWER,100.00,Physical,Initech Energy
B-400,2024-04-01,3000000,GBP,POWER,80.00,Physical,Initech Energy
B-500,2024-05-20,500000,USD,GOLD,1900.00,Physical,Globex Trading
";

const COUNTERPARTY_CSV: &str = "\
record_id,trade_date,notional_quantity,currency,commodity_type,fixed_price,settlement_type,buyer
C-100,2024-01-15,1000000,USD,CRUDE_OIL,75.50,Physical,Globex Trading
C-200,2024-02-10,2000000,USD,NATGAS,3.25,Cash,Globex Trading
C-300,2024-03-05,1000000,EUR,POWER,105.00,Physical,Initech Energy
C-500A,2024-05-20,500000,USD,GOLD,1900.00,Physical,Globex Trading
C-500B,2024-05-20,500000,USD,GOLD,1900.00,Physical,Globex Trading
C-900,2024-09-09,100000,JPY,SILVER,23.00,Physical,Umbrella Corp
";

fn seeded_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    store.insert_all(load_csv_records(Source::Bank, BANK_CSV).unwrap());
    store.insert_all(load_csv_records(Source::Counterparty, COUNTERPARTY_CSV).unwrap());
    store
}

#[test]
fn mixed_batch_end_to_end() {
    let store = seeded_store();
    let config = EngineConfig::from_toml(CONFIG_TOML).unwrap();

    let report = run(&store, &config);

    // B-100/C-100 agree everywhere; B-200/C-200 disagree on settlement
    // type only; B-300/C-300 disagree on a critical price.
    assert_eq!(report.summary.total_matches, 3);
    assert_eq!(report.summary.fully_matched, 1);
    assert_eq!(report.summary.partially_matched, 1);
    assert_eq!(report.summary.critical_mismatches, 1);
    assert_eq!(report.summary.pending, 0);
    assert!((report.summary.average_score - 1.0).abs() < 1e-9);

    // No counterpart at all.
    assert_eq!(
        store.get_record("B-400").unwrap().status,
        MatchStatus::Unmatched
    );
    // Two identical counterparty candidates: held for review, not committed.
    assert_eq!(
        store.get_record("B-500").unwrap().status,
        MatchStatus::Pending
    );
    assert_eq!(
        store.get_record("C-500A").unwrap().status,
        MatchStatus::Pending
    );
    // Never offered to anything.
    assert_eq!(
        store.get_record("C-900").unwrap().status,
        MatchStatus::Pending
    );
}

#[test]
fn perfect_pair_scores_one_and_fully_matches() {
    let store = InMemoryStore::new();
    store.insert_all(
        load_csv_records(
            Source::Bank,
            "record_id,trade_date,notional_quantity,currency,commodity_type\n\
             B-1,2024-01-15,1000000,USD,CRUDE_OIL\n",
        )
        .unwrap(),
    );
    store.insert_all(
        load_csv_records(
            Source::Counterparty,
            "record_id,trade_date,notional_quantity,currency,commodity_type\n\
             C-1,2024-01-15,1000000,USD,CRUDE_OIL\n",
        )
        .unwrap(),
    );

    // Default weights sum to 1.0 over exactly these four attributes.
    let report = run(&store, &EngineConfig::default());
    assert_eq!(report.summary.total_matches, 1);
    assert_eq!(report.summary.fully_matched, 1);
    assert!((report.details[0].similarity_score - 1.0).abs() < 1e-12);
}

#[test]
fn critical_mismatch_reports_the_percentage_difference() {
    let store = seeded_store();
    let config = EngineConfig::from_toml(CONFIG_TOML).unwrap();
    let report = run(&store, &config);

    let detail = report
        .details
        .iter()
        .find(|d| d.bank_record_id == "B-300")
        .unwrap();
    assert_eq!(detail.status, ReconStatus::CriticalMismatch);

    let results = detail.field_results.as_ref().unwrap();
    let price = &results["fixed_price"];
    assert_eq!(price.verdict, Verdict::Mismatched);
    let reason = price.reason.as_deref().unwrap();
    assert!(reason.contains("5.00%"), "reason was: {reason}");
    assert!(reason.contains("0.10%"), "reason was: {reason}");
}

#[test]
fn settlement_drift_is_partial_not_critical() {
    let store = seeded_store();
    let config = EngineConfig::from_toml(CONFIG_TOML).unwrap();
    let report = run(&store, &config);

    let detail = report
        .details
        .iter()
        .find(|d| d.bank_record_id == "B-200")
        .unwrap();
    assert_eq!(detail.status, ReconStatus::PartiallyMatched);
    let results = detail.field_results.as_ref().unwrap();
    assert_eq!(results["settlement_type"].verdict, Verdict::Mismatched);
    assert_eq!(results["currency"].verdict, Verdict::Matched);
}

#[test]
fn near_tie_inside_conflict_band_is_held_for_review() {
    let store = InMemoryStore::new();
    store.insert(TradeRecord::new("B-1", Source::Bank));
    store.insert(TradeRecord::new("C-1", Source::Counterparty));
    store.insert(TradeRecord::new("C-2", Source::Counterparty));

    let mut config = EngineConfig::default();
    config.matcher.threshold = 0.90;
    config.matcher.conflict_band = 0.02;

    let scored = vec![
        (store.get_record("C-1").unwrap(), 0.91),
        (store.get_record("C-2").unwrap(), 0.89),
    ];
    let outcome = decide_and_commit(
        &store.get_record("B-1").unwrap(),
        &scored,
        &config.matcher,
        &store,
    );

    match outcome {
        MatchOutcome::Ambiguous { candidates } => {
            assert_eq!(candidates.len(), 2);
            assert!((candidates[0].score - 0.91).abs() < 1e-12);
        }
        other => panic!("expected Ambiguous, got {other:?}"),
    }
    assert!(store.match_records().is_empty());
    assert_eq!(
        store.get_record("B-1").unwrap().status,
        MatchStatus::Pending
    );
}

#[test]
fn tolerance_comparison_is_reference_side_relative() {
    let fields_a = [("notional_quantity", "100")];
    let fields_b = [("notional_quantity", "200")];
    let a = TradeRecord::from_fields(
        "B-1",
        Source::Bank,
        &fields_a
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    );
    let b = TradeRecord::from_fields(
        "C-1",
        Source::Counterparty,
        &fields_b
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    );

    let config = EngineConfig::default();
    let forward = reconcile(&a, &b, &config.reconciler);
    let backward = reconcile(&b, &a, &config.reconciler);

    let fwd = forward["notional_quantity"].reason.as_deref().unwrap();
    let bwd = backward["notional_quantity"].reason.as_deref().unwrap();
    assert_ne!(fwd, bwd);
    assert!(fwd.contains("100.00%"), "reason was: {fwd}");
    assert!(bwd.contains("50.00%"), "reason was: {bwd}");
}

#[test]
fn rerunning_a_finished_batch_is_a_noop() {
    let store = seeded_store();
    let config = EngineConfig::from_toml(CONFIG_TOML).unwrap();

    let first = run_matching(&store, &config.matcher);
    assert_eq!(first.matched, 3);
    assert_eq!(first.unmatched, 1);
    assert_eq!(first.ambiguous, 1);

    let second = run_matching(&store, &config.matcher);
    assert_eq!(second.matched, 0);
    assert_eq!(second.unmatched, 0);
    // The ambiguous record is still pending and still ambiguous.
    assert_eq!(second.ambiguous, 1);
    assert_eq!(store.match_records().len(), 3);
}

#[test]
fn parallel_matching_commits_each_pair_once() {
    let store = Arc::new(seeded_store());
    let config = EngineConfig::from_toml(CONFIG_TOML).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            let matcher = config.matcher.clone();
            std::thread::spawn(move || run_matching(&*store, &matcher))
        })
        .collect();

    let total_matched: usize = handles
        .into_iter()
        .map(|h| h.join().unwrap().matched)
        .sum();

    // Whichever workers win the per-record race, each pair commits once.
    assert_eq!(total_matched, 3);
    assert_eq!(store.match_records().len(), 3);
    assert_eq!(
        store.get_record("B-400").unwrap().status,
        MatchStatus::Unmatched
    );
}

#[test]
fn report_serializes_for_the_storage_collaborator() {
    let store = seeded_store();
    let config = EngineConfig::from_toml(CONFIG_TOML).unwrap();
    let report = run(&store, &config);

    let json = report.to_json().unwrap();
    assert!(json.contains("\"total_matches\": 3"));
    assert!(json.contains("\"critical_mismatch\""));
    assert!(json.contains("M-B-100-C-100"));
}
