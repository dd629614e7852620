use std::collections::HashMap;

use serde::Deserialize;

use crate::error::ReconError;
use crate::reconciler;

/// Fallback numeric tolerance (0.1%) for fields without an explicit entry.
pub const DEFAULT_TOLERANCE: f64 = 0.001;

/// Attribute keys the scorer understands.
pub const WEIGHT_KEYS: &[&str] =
    &["trade_date", "counterparty", "notional", "currency", "commodity"];

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Engine configuration: matching on one side, reconciliation on the other.
/// Passed explicitly into every entry point; the engine holds no global
/// state.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub matcher: MatcherConfig,
    #[serde(default)]
    pub reconciler: ReconcilerConfig,
}

impl EngineConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: EngineConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        self.matcher.validate()?;
        self.reconciler.validate()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Matcher
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct MatcherConfig {
    /// Minimum score for an automatic match commit.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Margin within which the two best candidates are ambiguous rather
    /// than a clear winner.
    #[serde(default = "default_conflict_band")]
    pub conflict_band: f64,
    /// Per-attribute score weights. Must not sum above 1.0.
    #[serde(default = "default_weights")]
    pub weights: HashMap<String, f64>,
    /// Cap on bucketed candidate lookups.
    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: usize,
    /// Cap on the unfiltered fallback when a record has no bucketable
    /// attributes.
    #[serde(default = "default_fallback_limit")]
    pub fallback_limit: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            conflict_band: default_conflict_band(),
            weights: default_weights(),
            candidate_limit: default_candidate_limit(),
            fallback_limit: default_fallback_limit(),
        }
    }
}

impl MatcherConfig {
    pub fn validate(&self) -> Result<(), ReconError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ReconError::ConfigValidation(format!(
                "threshold must be in [0, 1], got {}",
                self.threshold
            )));
        }
        if self.conflict_band < 0.0 {
            return Err(ReconError::ConfigValidation(format!(
                "conflict_band must be non-negative, got {}",
                self.conflict_band
            )));
        }
        let mut sum = 0.0;
        for (key, weight) in &self.weights {
            if !WEIGHT_KEYS.contains(&key.as_str()) {
                return Err(ReconError::UnknownField {
                    key: key.clone(),
                    context: "matcher.weights",
                });
            }
            if !(0.0..=1.0).contains(weight) {
                return Err(ReconError::ConfigValidation(format!(
                    "weight '{key}' must be in [0, 1], got {weight}"
                )));
            }
            sum += weight;
        }
        if sum > 1.0 + 1e-9 {
            return Err(ReconError::ConfigValidation(format!(
                "weights sum to {sum:.4}, must not exceed 1.0"
            )));
        }
        if self.candidate_limit == 0 || self.fallback_limit == 0 {
            return Err(ReconError::ConfigValidation(
                "candidate limits must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn weight(&self, key: &str) -> f64 {
        self.weights.get(key).copied().unwrap_or(0.0)
    }
}

fn default_threshold() -> f64 {
    0.85
}

fn default_conflict_band() -> f64 {
    0.02
}

fn default_weights() -> HashMap<String, f64> {
    HashMap::from([
        ("trade_date".into(), 0.30),
        ("notional".into(), 0.30),
        ("currency".into(), 0.20),
        ("commodity".into(), 0.20),
    ])
}

fn default_candidate_limit() -> usize {
    20
}

fn default_fallback_limit() -> usize {
    50
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconcilerConfig {
    /// Per-field numeric tolerance as a fraction (0.001 = 0.1%).
    #[serde(default)]
    pub tolerances: HashMap<String, f64>,
    /// Fields whose disagreement forces the strongest mismatch status.
    #[serde(default = "default_critical_fields")]
    pub critical_fields: Vec<String>,
    /// Minimum similarity ratio for fuzzy string fields.
    #[serde(default = "default_string_threshold")]
    pub string_threshold: f64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            tolerances: HashMap::new(),
            critical_fields: default_critical_fields(),
            string_threshold: default_string_threshold(),
        }
    }
}

impl ReconcilerConfig {
    pub fn validate(&self) -> Result<(), ReconError> {
        for (field, tolerance) in &self.tolerances {
            if !reconciler::is_numeric_field(field) {
                return Err(ReconError::UnknownField {
                    key: field.clone(),
                    context: "reconciler.tolerances",
                });
            }
            if *tolerance < 0.0 {
                return Err(ReconError::ConfigValidation(format!(
                    "tolerance for '{field}' must be non-negative, got {tolerance}"
                )));
            }
        }
        for field in &self.critical_fields {
            if !reconciler::is_recon_field(field) {
                return Err(ReconError::UnknownField {
                    key: field.clone(),
                    context: "reconciler.critical_fields",
                });
            }
        }
        if !(0.0..=1.0).contains(&self.string_threshold) {
            return Err(ReconError::ConfigValidation(format!(
                "string_threshold must be in [0, 1], got {}",
                self.string_threshold
            )));
        }
        Ok(())
    }

    pub fn tolerance_for(&self, field: &str) -> f64 {
        self.tolerances
            .get(field)
            .copied()
            .unwrap_or(DEFAULT_TOLERANCE)
    }
}

fn default_critical_fields() -> Vec<String> {
    vec![
        "notional_quantity".into(),
        "fixed_price".into(),
        "currency".into(),
    ]
}

fn default_string_threshold() -> f64 {
    0.8
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn parse_full_config() {
        let input = r#"
[matcher]
threshold = 0.9
conflict_band = 0.03
candidate_limit = 10

[matcher.weights]
trade_date   = 0.25
counterparty = 0.20
notional     = 0.25
currency     = 0.15
commodity    = 0.15

[reconciler]
string_threshold = 0.75
critical_fields = ["notional_quantity", "currency"]

[reconciler.tolerances]
notional_quantity = 0.005
fixed_price       = 0.001
"#;
        let config = EngineConfig::from_toml(input).unwrap();
        assert_eq!(config.matcher.threshold, 0.9);
        assert_eq!(config.matcher.candidate_limit, 10);
        assert_eq!(config.matcher.fallback_limit, 50);
        assert_eq!(config.matcher.weight("counterparty"), 0.20);
        assert_eq!(config.reconciler.tolerance_for("notional_quantity"), 0.005);
        assert_eq!(config.reconciler.tolerance_for("fixed_price"), 0.001);
        assert_eq!(config.reconciler.critical_fields.len(), 2);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config.matcher.threshold, 0.85);
        assert_eq!(config.matcher.conflict_band, 0.02);
        assert_eq!(config.matcher.candidate_limit, 20);
        assert_eq!(config.reconciler.string_threshold, 0.8);
        assert_eq!(config.reconciler.tolerance_for("fixed_price"), 0.001);
        let sum: f64 = config.matcher.weights.values().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn reject_unknown_weight_key() {
        let input = r#"
[matcher.weights]
settlement = 0.5
"#;
        let err = EngineConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("settlement"));
    }

    #[test]
    fn reject_weight_sum_above_one() {
        let input = r#"
[matcher.weights]
trade_date = 0.6
notional   = 0.6
"#;
        let err = EngineConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("must not exceed 1.0"));
    }

    #[test]
    fn reject_bad_threshold() {
        let input = "[matcher]\nthreshold = 1.5\n";
        let err = EngineConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("threshold"));
    }

    #[test]
    fn reject_tolerance_on_non_numeric_field() {
        let input = r#"
[reconciler.tolerances]
commodity_type = 0.01
"#;
        let err = EngineConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("commodity_type"));
    }

    #[test]
    fn reject_unknown_critical_field() {
        let input = r#"
[reconciler]
critical_fields = ["notional"]
"#;
        let err = EngineConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("notional"));
    }
}
