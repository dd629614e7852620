//! Record store seam.
//!
//! The engine drives persistence through this narrow trait; the in-memory
//! implementation backs the batch drivers and the test suite.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::bucket;
use crate::model::{
    FieldComparison, MatchRecord, MatchStatus, ReconStatus, Source, TradeRecord,
};

/// Persistence operations the engine needs. Implementations must make the
/// PENDING → {MATCHED, UNMATCHED} transitions at-most-once per record,
/// even under concurrent callers.
pub trait RecordStore: Send + Sync {
    /// All records of `source` still awaiting a match decision, in stable
    /// record-id order.
    fn fetch_pending(&self, source: Source) -> Vec<TradeRecord>;

    /// Pending records of `source` whose bucket key contains every
    /// component, capped at `limit`.
    fn find_candidates(
        &self,
        components: &[String],
        source: Source,
        limit: usize,
    ) -> Vec<TradeRecord>;

    fn get_record(&self, record_id: &str) -> Option<TradeRecord>;

    /// Both records of a committed match (bank first).
    fn get_pair(&self, match_id: &str) -> Option<(TradeRecord, TradeRecord)>;

    /// Commit a match: both records move PENDING → MATCHED and the match
    /// record is inserted, as one atomic step. Returns false (changing
    /// nothing) if either record is no longer pending.
    fn commit_match(&self, record: &MatchRecord) -> bool;

    /// PENDING → UNMATCHED. Returns false if the record was not pending.
    fn mark_unmatched(&self, record_id: &str) -> bool;

    /// Attach reconciliation results to a committed match.
    fn set_reconciliation(
        &self,
        match_id: &str,
        status: ReconStatus,
        results: BTreeMap<String, FieldComparison>,
    ) -> bool;

    /// Every committed match, in stable match-id order.
    fn match_records(&self) -> Vec<MatchRecord>;
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

/// Reference store: one mutex over the record and match maps. Conditional
/// transitions run under the lock, which is what gives the at-most-once
/// guarantee when a batch is processed by parallel workers.
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    records: BTreeMap<String, TradeRecord>,
    matches: BTreeMap<String, MatchRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Insert a record; an existing record with the same id is replaced.
    pub fn insert(&self, record: TradeRecord) {
        let mut inner = self.inner.lock().unwrap();
        inner.records.insert(record.record_id.clone(), record);
    }

    pub fn insert_all(&self, records: Vec<TradeRecord>) {
        let mut inner = self.inner.lock().unwrap();
        for record in records {
            inner.records.insert(record.record_id.clone(), record);
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for InMemoryStore {
    fn fetch_pending(&self, source: Source) -> Vec<TradeRecord> {
        let inner = self.inner.lock().unwrap();
        inner
            .records
            .values()
            .filter(|r| r.source == source && r.status == MatchStatus::Pending)
            .cloned()
            .collect()
    }

    fn find_candidates(
        &self,
        components: &[String],
        source: Source,
        limit: usize,
    ) -> Vec<TradeRecord> {
        let inner = self.inner.lock().unwrap();
        inner
            .records
            .values()
            .filter(|r| r.source == source && r.status == MatchStatus::Pending)
            .filter(|r| bucket::key_contains_components(&bucket::bucket_key(r), components))
            .take(limit)
            .cloned()
            .collect()
    }

    fn get_record(&self, record_id: &str) -> Option<TradeRecord> {
        let inner = self.inner.lock().unwrap();
        inner.records.get(record_id).cloned()
    }

    fn get_pair(&self, match_id: &str) -> Option<(TradeRecord, TradeRecord)> {
        let inner = self.inner.lock().unwrap();
        let m = inner.matches.get(match_id)?;
        let bank = inner.records.get(&m.bank_record_id)?.clone();
        let counterparty = inner.records.get(&m.counterparty_record_id)?.clone();
        Some((bank, counterparty))
    }

    fn commit_match(&self, record: &MatchRecord) -> bool {
        let mut inner = self.inner.lock().unwrap();

        let both_pending = [&record.bank_record_id, &record.counterparty_record_id]
            .iter()
            .all(|id| {
                inner
                    .records
                    .get(*id)
                    .is_some_and(|r| r.status == MatchStatus::Pending)
            });
        if !both_pending {
            return false;
        }

        for id in [&record.bank_record_id, &record.counterparty_record_id] {
            let r = inner.records.get_mut(id).unwrap();
            r.status = MatchStatus::Matched;
            r.match_id = Some(record.match_id.clone());
        }
        inner.matches.insert(record.match_id.clone(), record.clone());
        true
    }

    fn mark_unmatched(&self, record_id: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.records.get_mut(record_id) {
            Some(r) if r.status == MatchStatus::Pending => {
                r.status = MatchStatus::Unmatched;
                true
            }
            _ => false,
        }
    }

    fn set_reconciliation(
        &self,
        match_id: &str,
        status: ReconStatus,
        results: BTreeMap<String, FieldComparison>,
    ) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.matches.get_mut(match_id) {
            Some(m) => {
                m.recon_status = status;
                m.field_results = Some(results);
                true
            }
            None => false,
        }
    }

    fn match_records(&self) -> Vec<MatchRecord> {
        let inner = self.inner.lock().unwrap();
        inner.matches.values().cloned().collect()
    }
}
