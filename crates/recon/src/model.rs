use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Which side of the reconciliation a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Bank,
    Counterparty,
}

impl Source {
    pub fn opposite(self) -> Source {
        match self {
            Self::Bank => Self::Counterparty,
            Self::Counterparty => Self::Bank,
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bank => write!(f, "bank"),
            Self::Counterparty => write!(f, "counterparty"),
        }
    }
}

/// Lifecycle of a record within a matching run.
///
/// Pending → Matched (carrying a match id) or Pending → Unmatched; both
/// transitions happen at most once and nothing ever leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    Matched,
    Unmatched,
}

/// An attribute value after one-time coercion at ingestion.
///
/// Numeric-looking input becomes `Number`; anything unparsable stays `Text`
/// so later comparison degrades to string equality instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Date(NaiveDate),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Canonical string form, used for opaque comparison and reasons.
    pub fn render(&self) -> String {
        match self {
            Self::Number(n) => format!("{n}"),
            Self::Text(t) => t.clone(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

/// A single trade record from either source, coerced to typed attributes.
#[derive(Debug, Clone, Serialize)]
pub struct TradeRecord {
    pub record_id: String,
    pub source: Source,
    pub trade_date: Option<NaiveDate>,
    pub effective_date: Option<NaiveDate>,
    pub termination_date: Option<NaiveDate>,
    pub notional_quantity: Option<FieldValue>,
    pub notional_unit: Option<String>,
    pub fixed_price: Option<FieldValue>,
    pub currency: Option<String>,
    pub price_unit: Option<String>,
    pub commodity_type: Option<String>,
    pub settlement_type: Option<String>,
    pub business_day_convention: Option<String>,
    pub buyer: Option<String>,
    pub seller: Option<String>,
    pub status: MatchStatus,
    pub match_id: Option<String>,
    /// Raw inputs that did not map to a known attribute, plus known
    /// attributes whose value failed coercion.
    pub extras: HashMap<String, String>,
}

impl TradeRecord {
    pub fn new(record_id: impl Into<String>, source: Source) -> Self {
        Self {
            record_id: record_id.into(),
            source,
            trade_date: None,
            effective_date: None,
            termination_date: None,
            notional_quantity: None,
            notional_unit: None,
            fixed_price: None,
            currency: None,
            price_unit: None,
            commodity_type: None,
            settlement_type: None,
            business_day_convention: None,
            buyer: None,
            seller: None,
            status: MatchStatus::Pending,
            match_id: None,
            extras: HashMap::new(),
        }
    }

    /// Build a record from raw string fields, coercing each known attribute
    /// exactly once. Unparsable dates land in `extras` as text; unparsable
    /// numerics keep their slot but stay `Text`.
    pub fn from_fields(
        record_id: impl Into<String>,
        source: Source,
        fields: &HashMap<String, String>,
    ) -> Self {
        let mut record = Self::new(record_id, source);
        for (name, raw) in fields {
            record.set_field(name, raw);
        }
        record
    }

    /// Party name used for counterparty scoring: buyer, falling back to
    /// seller.
    pub fn party_name(&self) -> Option<&str> {
        self.buyer.as_deref().or(self.seller.as_deref())
    }

    fn set_field(&mut self, name: &str, raw: &str) {
        match name {
            "trade_date" | "effective_date" | "termination_date" => {
                match parse_date(raw) {
                    Some(date) => {
                        let slot = match name {
                            "trade_date" => &mut self.trade_date,
                            "effective_date" => &mut self.effective_date,
                            _ => &mut self.termination_date,
                        };
                        *slot = Some(date);
                    }
                    None => {
                        self.extras.insert(name.to_string(), raw.to_string());
                    }
                }
            }
            "notional_quantity" | "fixed_price" => {
                let value = match parse_number(raw) {
                    Some(n) => FieldValue::Number(n),
                    None => FieldValue::Text(raw.to_string()),
                };
                if name == "notional_quantity" {
                    self.notional_quantity = Some(value);
                } else {
                    self.fixed_price = Some(value);
                }
            }
            "notional_unit" => self.notional_unit = Some(raw.to_string()),
            "currency" => self.currency = Some(raw.to_string()),
            "price_unit" => self.price_unit = Some(raw.to_string()),
            "commodity_type" => self.commodity_type = Some(raw.to_string()),
            "settlement_type" => self.settlement_type = Some(raw.to_string()),
            "business_day_convention" => {
                self.business_day_convention = Some(raw.to_string())
            }
            "buyer" => self.buyer = Some(raw.to_string()),
            "seller" => self.seller = Some(raw.to_string()),
            _ => {
                self.extras.insert(name.to_string(), raw.to_string());
            }
        }
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Thousands separators are common in trade files; strip them before
/// parsing.
fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

// ---------------------------------------------------------------------------
// Matches
// ---------------------------------------------------------------------------

/// Reconciliation status of a committed match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconStatus {
    Pending,
    FullyMatched,
    PartiallyMatched,
    CriticalMismatch,
}

impl std::fmt::Display for ReconStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::FullyMatched => write!(f, "fully_matched"),
            Self::PartiallyMatched => write!(f, "partially_matched"),
            Self::CriticalMismatch => write!(f, "critical_mismatch"),
        }
    }
}

/// The committed pairing of one bank and one counterparty record.
///
/// Created once per successful match; reconciliation fills in the status
/// and per-field results later. Never deleted.
#[derive(Debug, Clone, Serialize)]
pub struct MatchRecord {
    pub match_id: String,
    pub bank_record_id: String,
    pub counterparty_record_id: String,
    /// Similarity score at the time of match, kept for audit.
    pub similarity_score: f64,
    pub recon_status: ReconStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_results: Option<BTreeMap<String, FieldComparison>>,
}

impl MatchRecord {
    /// The id is derived from the record pair so reruns over the same
    /// inputs produce identical output.
    pub fn new(bank: &TradeRecord, counterparty: &TradeRecord, score: f64) -> Self {
        Self {
            match_id: format!("M-{}-{}", bank.record_id, counterparty.record_id),
            bank_record_id: bank.record_id.clone(),
            counterparty_record_id: counterparty.record_id.clone(),
            similarity_score: score,
            recon_status: ReconStatus::Pending,
            field_results: None,
        }
    }
}

/// Outcome of one match decision.
#[derive(Debug, Clone)]
pub enum MatchOutcome {
    /// Committed.
    Matched(MatchRecord),
    /// The best candidates scored within the conflict band of each other;
    /// held for manual review, nothing committed.
    Ambiguous { candidates: Vec<ScoredCandidate> },
    /// No candidate reached the threshold; record marked unmatched.
    Unmatched,
    /// Record was no longer pending; nothing to do.
    Skipped,
}

/// A candidate id with its similarity score.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    pub record_id: String,
    pub score: f64,
}

// ---------------------------------------------------------------------------
// Field comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Matched,
    Mismatched,
    Missing,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Matched => write!(f, "matched"),
            Self::Mismatched => write!(f, "mismatched"),
            Self::Missing => write!(f, "missing"),
        }
    }
}

/// Outcome of comparing one field across a matched pair. Immutable.
#[derive(Debug, Clone, Serialize)]
pub struct FieldComparison {
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_a: Option<FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_b: Option<FieldValue>,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Summary + Report
// ---------------------------------------------------------------------------

/// Counts from one matching pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchingSummary {
    pub matched: usize,
    pub unmatched: usize,
    pub ambiguous: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub total_matches: usize,
    pub fully_matched: usize,
    pub partially_matched: usize,
    pub critical_mismatches: usize,
    pub pending: usize,
    pub average_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportDetail {
    pub match_id: String,
    pub bank_record_id: String,
    pub counterparty_record_id: String,
    pub similarity_score: f64,
    pub status: ReconStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_results: Option<BTreeMap<String, FieldComparison>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconReport {
    pub summary: ReportSummary,
    pub details: Vec<ReportDetail>,
}
