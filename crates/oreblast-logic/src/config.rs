//! Recovery scoring configuration.
//!
//! Everything a caller can tune about a blast cycle: where normalization
//! stats come from, whether density is log-scaled, how hard the blast hits,
//! material weights, classification thresholds, and the session score weight.
//!
//! ```
//! use oreblast_logic::config::{validate_config, RecoveryConfig};
//!
//! let config = RecoveryConfig::from_json(r#"{ "blastForceNormalized": 0.25 }"#).unwrap();
//! assert_eq!(config.thresholds.recovered, 0.6);
//! assert!(validate_config(&config).is_empty());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Fixed blast penalty coefficient `k` in `1 / (1 + k * force)`.
pub const BLAST_PENALTY_K: f64 = 2.0;

pub const DEFAULT_WEIGHT_HARDNESS: f64 = 0.6;
pub const DEFAULT_WEIGHT_DENSITY: f64 = 0.4;
pub const DEFAULT_RECOVERED_THRESHOLD: f64 = 0.6;
pub const DEFAULT_DILUTED_THRESHOLD: f64 = 0.2;
pub const DEFAULT_RECOVERY_WEIGHT: f64 = 10.0;

/// Which cell population normalization stats are computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsScope {
    /// Only the cells affected by the current blasts.
    #[default]
    Local,
    /// Caller-supplied reference stats.
    Global,
}

/// Material factor weights. Expected to sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MaterialWeights {
    pub material_hardness: f64,
    pub material_density: f64,
}

impl Default for MaterialWeights {
    fn default() -> Self {
        Self {
            material_hardness: DEFAULT_WEIGHT_HARDNESS,
            material_density: DEFAULT_WEIGHT_DENSITY,
        }
    }
}

/// Score cutoffs for classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Thresholds {
    /// Scores at or above this are recovered.
    pub recovered: f64,
    /// Scores below this are lost.
    pub diluted: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            recovered: DEFAULT_RECOVERED_THRESHOLD,
            diluted: DEFAULT_DILUTED_THRESHOLD,
        }
    }
}

/// Full configuration surface for a blast cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecoveryConfig {
    pub stats_scope: StatsScope,
    /// Log-transform density before computing stats.
    pub use_log_density: bool,
    /// Applied blast force, 0..=1.
    pub blast_force_normalized: f64,
    pub weights: MaterialWeights,
    pub thresholds: Thresholds,
    /// Multiplier on (recovery rate - dilution rate) for the session score.
    pub recovery_weight: f64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            stats_scope: StatsScope::Local,
            use_log_density: true,
            blast_force_normalized: 0.0,
            weights: MaterialWeights::default(),
            thresholds: Thresholds::default(),
            recovery_weight: DEFAULT_RECOVERY_WEIGHT,
        }
    }
}

impl RecoveryConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Blast force outside 0..=1 or not finite.
    BlastForceOutOfRange(f64),
    /// A material weight is negative or not finite.
    InvalidWeight(&'static str, f64),
    /// Material weights do not sum to 1.
    WeightSumInvalid(f64),
    /// A threshold is outside 0..=1 or not finite.
    ThresholdOutOfRange(&'static str, f64),
    /// Diluted threshold is above the recovered threshold.
    ThresholdsInverted { recovered: f64, diluted: f64 },
    /// Recovery weight is not finite.
    InvalidRecoveryWeight(f64),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::BlastForceOutOfRange(v) => {
                write!(f, "blastForceNormalized {} must be within 0..=1", v)
            }
            ConfigError::InvalidWeight(name, v) => {
                write!(f, "weight {} = {} must be finite and non-negative", name, v)
            }
            ConfigError::WeightSumInvalid(sum) => {
                write!(f, "material weights sum to {:.4}, expected 1", sum)
            }
            ConfigError::ThresholdOutOfRange(name, v) => {
                write!(f, "threshold {} = {} must be within 0..=1", name, v)
            }
            ConfigError::ThresholdsInverted { recovered, diluted } => write!(
                f,
                "diluted threshold {} exceeds recovered threshold {}",
                diluted, recovered
            ),
            ConfigError::InvalidRecoveryWeight(v) => {
                write!(f, "recoveryWeight {} must be finite", v)
            }
        }
    }
}

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

fn in_unit_range(v: f64) -> bool {
    v.is_finite() && (0.0..=1.0).contains(&v)
}

/// Validate a configuration, returning all errors found.
pub fn validate_config(config: &RecoveryConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if !in_unit_range(config.blast_force_normalized) {
        errors.push(ConfigError::BlastForceOutOfRange(
            config.blast_force_normalized,
        ));
    }

    let w = &config.weights;
    let mut weights_ok = true;
    for (name, value) in [
        ("materialHardness", w.material_hardness),
        ("materialDensity", w.material_density),
    ] {
        if !value.is_finite() || value < 0.0 {
            errors.push(ConfigError::InvalidWeight(name, value));
            weights_ok = false;
        }
    }
    let sum = w.material_hardness + w.material_density;
    if weights_ok && (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        errors.push(ConfigError::WeightSumInvalid(sum));
    }

    let t = &config.thresholds;
    let mut thresholds_ok = true;
    for (name, value) in [("recovered", t.recovered), ("diluted", t.diluted)] {
        if !in_unit_range(value) {
            errors.push(ConfigError::ThresholdOutOfRange(name, value));
            thresholds_ok = false;
        }
    }
    if thresholds_ok && t.diluted > t.recovered {
        errors.push(ConfigError::ThresholdsInverted {
            recovered: t.recovered,
            diluted: t.diluted,
        });
    }

    if !config.recovery_weight.is_finite() {
        errors.push(ConfigError::InvalidRecoveryWeight(config.recovery_weight));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let errors = validate_config(&RecoveryConfig::default());
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }

    #[test]
    fn test_defaults() {
        let c = RecoveryConfig::default();
        assert_eq!(c.stats_scope, StatsScope::Local);
        assert!((c.weights.material_hardness - 0.6).abs() < 1e-12);
        assert!((c.weights.material_density - 0.4).abs() < 1e-12);
        assert!((c.thresholds.recovered - 0.6).abs() < 1e-12);
        assert!((c.thresholds.diluted - 0.2).abs() < 1e-12);
        assert!((c.recovery_weight - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_force_out_of_range() {
        let c = RecoveryConfig {
            blast_force_normalized: 1.5,
            ..RecoveryConfig::default()
        };
        assert!(validate_config(&c).contains(&ConfigError::BlastForceOutOfRange(1.5)));
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let c = RecoveryConfig {
            weights: MaterialWeights {
                material_hardness: 0.7,
                material_density: 0.7,
            },
            ..RecoveryConfig::default()
        };
        let errors = validate_config(&c);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ConfigError::WeightSumInvalid(_)));
    }

    #[test]
    fn test_negative_weight_skips_sum_check() {
        let c = RecoveryConfig {
            weights: MaterialWeights {
                material_hardness: -0.2,
                material_density: 1.2,
            },
            ..RecoveryConfig::default()
        };
        let errors = validate_config(&c);
        assert_eq!(
            errors,
            vec![ConfigError::InvalidWeight("materialHardness", -0.2)]
        );
    }

    #[test]
    fn test_inverted_thresholds() {
        let c = RecoveryConfig {
            thresholds: Thresholds {
                recovered: 0.3,
                diluted: 0.5,
            },
            ..RecoveryConfig::default()
        };
        assert!(matches!(
            validate_config(&c)[0],
            ConfigError::ThresholdsInverted { .. }
        ));
    }

    #[test]
    fn test_collects_multiple_errors() {
        let c = RecoveryConfig {
            blast_force_normalized: f64::NAN,
            recovery_weight: f64::INFINITY,
            ..RecoveryConfig::default()
        };
        assert_eq!(validate_config(&c).len(), 2);
    }

    #[test]
    fn test_json_partial_uses_defaults() {
        let c = RecoveryConfig::from_json(
            r#"{ "statsScope": "global", "thresholds": { "recovered": 0.7 } }"#,
        )
        .unwrap();
        assert_eq!(c.stats_scope, StatsScope::Global);
        assert!((c.thresholds.recovered - 0.7).abs() < 1e-12);
        assert!((c.thresholds.diluted - 0.2).abs() < 1e-12);
        assert!(c.use_log_density);
    }

    #[test]
    fn test_json_rejects_unknown_scope() {
        assert!(RecoveryConfig::from_json(r#"{ "statsScope": "regional" }"#).is_err());
    }

    #[test]
    fn test_json_roundtrip_preserves_config() {
        let c = RecoveryConfig {
            use_log_density: false,
            blast_force_normalized: 0.4,
            ..RecoveryConfig::default()
        };
        let back = RecoveryConfig::from_json(&c.to_json().unwrap()).unwrap();
        assert_eq!(back, c);
    }
}
