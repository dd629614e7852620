//! `tradematch-recon` — Trade matching and reconciliation engine.
//!
//! Pairs trade records from two independent sources (bank and
//! counterparty), scores candidate pairs, commits matches above a
//! threshold, then reconciles matched pairs field by field. Pure engine
//! crate: no CLI or transport dependencies.

pub mod bucket;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod model;
pub mod reconciler;
pub mod report;
pub mod scorer;
pub mod similarity;
pub mod store;

pub use config::EngineConfig;
pub use engine::run;
pub use error::ReconError;
pub use model::{MatchOutcome, MatchRecord, ReconReport, ReconStatus, TradeRecord};
pub use store::{InMemoryStore, RecordStore};
