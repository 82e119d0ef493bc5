//! Engine configuration
//!
//! Tunable knobs of the scorers and detectors, the base-grade policy and any
//! additional tier-table rows. Loadable from TOML. The band thresholds, the
//! Dabt cap and the MUTAWATIR thresholds are constants and not configurable.

use crate::ConfigError;
use sanad_domain::SourceTier;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Longest temporal decay window accepted, in days
pub const MAX_TEMPORAL_DAYS: u64 = 36_500;

/// How the starting grade is derived
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BaseGradePolicy {
    /// Floor of the single anchoring primary source
    #[default]
    TierFloor,
    /// Lowest floor of any primary-eligible source consumed in the chain
    ChainMinimum,
}

/// Data-quality temporal decay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DabtConfig {
    /// Days between fact and retrieval that still earn full temporal credit
    pub temporal_full_credit_days: u64,

    /// Days at which temporal credit reaches zero
    pub temporal_zero_credit_days: u64,
}

impl Default for DabtConfig {
    fn default() -> Self {
        Self {
            temporal_full_credit_days: 90,
            temporal_zero_credit_days: 730,
        }
    }
}

/// Independence key and collusion weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TawaturConfig {
    /// Width of the retrieval-time bucket in the independence key (seconds)
    pub time_bucket_secs: u64,

    /// Weight of system concentration
    pub system_weight: f64,

    /// Weight of temporal clustering
    pub temporal_weight: f64,

    /// Weight of chain overlap
    pub overlap_weight: f64,
}

impl Default for TawaturConfig {
    fn default() -> Self {
        Self {
            time_bucket_secs: 3600,
            system_weight: 0.4,
            temporal_weight: 0.3,
            overlap_weight: 0.3,
        }
    }
}

/// Peer comparison tolerances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShudhudhConfig {
    /// Relative difference accepted as rounding
    pub relative_tolerance: f64,

    /// Peers needed to form a majority consensus
    pub min_majority: usize,
}

impl Default for ShudhudhConfig {
    fn default() -> Self {
        Self {
            relative_tolerance: 0.005,
            min_majority: 2,
        }
    }
}

/// One additional row of the tier table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRule {
    /// Exact system id, or `*` for any system
    pub system_id: String,

    /// Exact document type
    pub document_type: String,

    /// Tier assigned
    pub tier: SourceTier,
}

/// Configuration for the grading engine
///
/// # Examples
///
/// ```
/// use sanad_engine::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.tawatur.time_bucket_secs, 3600);
///
/// let config = EngineConfig::strict();
/// assert!(config.shudhudh.relative_tolerance < 0.005);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Base grade formulation
    #[serde(default)]
    pub base_grade_policy: BaseGradePolicy,

    /// Data-quality scoring
    #[serde(default)]
    pub dabt: DabtConfig,

    /// Independence analysis
    #[serde(default)]
    pub tawatur: TawaturConfig,

    /// Peer comparison
    #[serde(default)]
    pub shudhudh: ShudhudhConfig,

    /// Rows added to the built-in tier table
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_rules: Vec<SourceRule>,
}

impl EngineConfig {
    /// Strict configuration (faster temporal decay, wider time buckets,
    /// tighter rounding tolerance)
    pub fn strict() -> Self {
        Self {
            dabt: DabtConfig {
                temporal_full_credit_days: 30,
                temporal_zero_credit_days: 365,
            },
            tawatur: TawaturConfig {
                time_bucket_secs: 14_400,
                ..TawaturConfig::default()
            },
            shudhudh: ShudhudhConfig {
                relative_tolerance: 0.001,
                min_majority: 2,
            },
            base_grade_policy: BaseGradePolicy::TierFloor,
            source_rules: Vec::new(),
        }
    }

    /// Lenient configuration (wider tolerances, slower temporal decay)
    pub fn lenient() -> Self {
        Self {
            dabt: DabtConfig {
                temporal_full_credit_days: 180,
                temporal_zero_credit_days: 1095,
            },
            tawatur: TawaturConfig {
                time_bucket_secs: 900,
                ..TawaturConfig::default()
            },
            shudhudh: ShudhudhConfig {
                relative_tolerance: 0.01,
                min_majority: 2,
            },
            base_grade_policy: BaseGradePolicy::TierFloor,
            source_rules: Vec::new(),
        }
    }

    /// Check every value is in range
    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.dabt;
        if d.temporal_zero_credit_days > MAX_TEMPORAL_DAYS {
            return Err(ConfigError::Invalid(format!(
                "dabt.temporal_zero_credit_days must not exceed {}, got {}",
                MAX_TEMPORAL_DAYS, d.temporal_zero_credit_days
            )));
        }
        if d.temporal_zero_credit_days <= d.temporal_full_credit_days {
            return Err(ConfigError::Invalid(
                "dabt.temporal_zero_credit_days must exceed temporal_full_credit_days".to_string(),
            ));
        }

        let t = &self.tawatur;
        if t.time_bucket_secs == 0 {
            return Err(ConfigError::Invalid(
                "tawatur.time_bucket_secs must be positive".to_string(),
            ));
        }
        let weights = [t.system_weight, t.temporal_weight, t.overlap_weight];
        if weights.iter().any(|w| *w < 0.0 || !w.is_finite()) {
            return Err(ConfigError::Invalid(
                "tawatur weights must be non-negative".to_string(),
            ));
        }
        let total: f64 = weights.iter().sum();
        if (total - 1.0).abs() > 1e-9 {
            return Err(ConfigError::Invalid(format!(
                "tawatur weights must sum to 1.0, got {}",
                total
            )));
        }

        let s = &self.shudhudh;
        if !(0.0..0.5).contains(&s.relative_tolerance) {
            return Err(ConfigError::Invalid(format!(
                "shudhudh.relative_tolerance must be within [0, 0.5), got {}",
                s.relative_tolerance
            )));
        }
        if s.min_majority < 2 {
            return Err(ConfigError::Invalid(
                "shudhudh.min_majority must be at least 2".to_string(),
            ));
        }

        for rule in &self.source_rules {
            if rule.system_id.trim().is_empty() || rule.document_type.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "source rule '{}/{}' has an empty field",
                    rule.system_id, rule.document_type
                )));
            }
        }

        Ok(())
    }

    /// Parse and validate from a TOML string
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
        assert!(EngineConfig::strict().validate().is_ok());
        assert!(EngineConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_default_values() {
        let config = EngineConfig::default();
        assert_eq!(config.dabt.temporal_full_credit_days, 90);
        assert_eq!(config.dabt.temporal_zero_credit_days, 730);
        assert_eq!(config.tawatur.time_bucket_secs, 3600);
        assert_eq!(config.base_grade_policy, BaseGradePolicy::TierFloor);
        assert!(config.source_rules.is_empty());
    }

    #[test]
    fn test_strict_is_stricter() {
        let strict = EngineConfig::strict();
        let default = EngineConfig::default();
        assert!(strict.shudhudh.relative_tolerance < default.shudhudh.relative_tolerance);
        assert!(strict.dabt.temporal_zero_credit_days < default.dabt.temporal_zero_credit_days);
        assert!(strict.tawatur.time_bucket_secs > default.tawatur.time_bucket_secs);
        // Presets never change the base-grade formulation
        assert_eq!(strict.base_grade_policy, BaseGradePolicy::TierFloor);
        assert_eq!(EngineConfig::lenient().base_grade_policy, BaseGradePolicy::TierFloor);
    }

    #[test]
    fn test_fixed_thresholds_are_not_configurable() {
        let err = EngineConfig::from_toml("[dabt]\ncap_threshold = 0.6\n").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
        let err = EngineConfig::from_toml("[tawatur]\nmin_clusters = 4\n").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn test_rejects_huge_decay_window() {
        let mut config = EngineConfig::default();
        config.dabt.temporal_zero_credit_days = u64::MAX / 86_400 + 1;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.dabt.temporal_zero_credit_days = MAX_TEMPORAL_DAYS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml = r#"
            base_grade_policy = "CHAIN_MINIMUM"

            [tawatur]
            time_bucket_secs = 600
            system_weight = 0.5
            temporal_weight = 0.25
            overlap_weight = 0.25

            [[source_rules]]
            system_id = "*"
            document_type = "lender_report"
            tier = "TIER2"
        "#;

        let config = EngineConfig::from_toml(toml).unwrap();
        assert_eq!(config.base_grade_policy, BaseGradePolicy::ChainMinimum);
        assert_eq!(config.tawatur.time_bucket_secs, 600);
        assert_eq!(config.dabt, DabtConfig::default());
        assert_eq!(config.source_rules.len(), 1);
        assert_eq!(config.source_rules[0].tier, SourceTier::Tier2);
    }

    #[test]
    fn test_rejects_bad_weights() {
        let mut config = EngineConfig::default();
        config.tawatur.overlap_weight = 0.5;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_inverted_decay_window() {
        let mut config = EngineConfig::default();
        config.dabt.temporal_full_credit_days = 800;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = EngineConfig::strict();
        let rendered = config.to_toml().unwrap();
        assert_eq!(EngineConfig::from_toml(&rendered).unwrap(), config);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "[shudhudh]\nrelative_tolerance = 0.02\nmin_majority = 3\n").unwrap();
        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config.shudhudh.min_majority, 3);

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            EngineConfig::from_file(&missing),
            Err(ConfigError::FileRead(_))
        ));
    }
}
