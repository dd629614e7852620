//! Batch report aggregation.

use crate::error::ReconError;
use crate::model::{MatchRecord, ReconReport, ReconStatus, ReportDetail, ReportSummary};

/// Roll a batch of match records up into summary counts plus a flat
/// detail list. No filtering is applied; callers pre-filter by status or
/// date if they need a narrower report.
pub fn build_report(records: &[MatchRecord]) -> ReconReport {
    let mut fully_matched = 0;
    let mut partially_matched = 0;
    let mut critical_mismatches = 0;
    let mut pending = 0;
    let mut score_sum = 0.0;
    let mut details = Vec::with_capacity(records.len());

    for record in records {
        match record.recon_status {
            ReconStatus::FullyMatched => fully_matched += 1,
            ReconStatus::PartiallyMatched => partially_matched += 1,
            ReconStatus::CriticalMismatch => critical_mismatches += 1,
            ReconStatus::Pending => pending += 1,
        }
        score_sum += record.similarity_score;

        details.push(ReportDetail {
            match_id: record.match_id.clone(),
            bank_record_id: record.bank_record_id.clone(),
            counterparty_record_id: record.counterparty_record_id.clone(),
            similarity_score: record.similarity_score,
            status: record.recon_status,
            field_results: record.field_results.clone(),
        });
    }

    let average_score = if records.is_empty() {
        0.0
    } else {
        score_sum / records.len() as f64
    };

    ReconReport {
        summary: ReportSummary {
            total_matches: records.len(),
            fully_matched,
            partially_matched,
            critical_mismatches,
            pending,
            average_score,
        },
        details,
    }
}

impl ReconReport {
    /// JSON form handed to the report-storage collaborator.
    pub fn to_json(&self) -> Result<String, ReconError> {
        serde_json::to_string_pretty(self).map_err(|e| ReconError::Json(e.to_string()))
    }
}
