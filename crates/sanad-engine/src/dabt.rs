//! Dabt (data quality) scoring
//!
//! Four independent dimensions, each in [0, 1]. A dimension whose inputs are
//! absent scores exactly 0.0; the absence is reported, never guessed around.

use crate::config::DabtConfig;
use sanad_domain::{DabtBand, EvidenceItem, PreparerKind, VerificationStatus};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Composite at or above which the band is EXCELLENT
pub const EXCELLENT_THRESHOLD: f64 = 0.85;

/// Composite at or above which the band is GOOD
pub const GOOD_THRESHOLD: f64 = 0.65;

/// Composite at or above which the band is FAIR
pub const FAIR_THRESHOLD: f64 = 0.50;

/// Composite below which the grade is capped at B
pub const DABT_CAP_THRESHOLD: f64 = 0.50;

const SECS_PER_DAY: u64 = 86_400;
const LOSSY_STEP_PENALTY: f64 = 0.15;
const PRIOR_ERROR_PENALTY: f64 = 0.1;

/// One of the four quality dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DabtDimension {
    /// Expected fields present, citation locator
    Documentation,
    /// Verification and lossy transforms
    Fidelity,
    /// Distance between fact and retrieval
    Temporal,
    /// Track record of whoever prepared the document
    Preparer,
}

impl DabtDimension {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            DabtDimension::Documentation => "DOCUMENTATION",
            DabtDimension::Fidelity => "FIDELITY",
            DabtDimension::Temporal => "TEMPORAL",
            DabtDimension::Preparer => "PREPARER",
        }
    }
}

impl fmt::Display for DabtDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dimension scored 0.0 because its inputs were absent
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("Evidence {evidence_id} has no {dimension} inputs; dimension scored 0.0")]
pub struct MissingDimensionError {
    /// Evidence item scored
    pub evidence_id: String,
    /// Dimension without inputs
    pub dimension: DabtDimension,
}

/// Score of one evidence item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DabtScore {
    /// Documentation completeness
    pub documentation: f64,
    /// Transmission fidelity
    pub fidelity: f64,
    /// Temporal proximity
    pub temporal: f64,
    /// Preparer reliability
    pub preparer: f64,
    /// Arithmetic mean of the four
    pub composite: f64,
    /// Band of the composite
    pub band: DabtBand,
    /// Dimensions scored 0.0 for lack of inputs
    pub missing: Vec<MissingDimensionError>,
}

/// Scores evidence items
#[derive(Debug, Clone)]
pub struct DabtScorer {
    config: DabtConfig,
}

impl Default for DabtScorer {
    fn default() -> Self {
        Self::new(DabtConfig::default())
    }
}

impl DabtScorer {
    /// Create a scorer with the given thresholds
    pub fn new(config: DabtConfig) -> Self {
        Self { config }
    }

    /// Score one item
    pub fn score(&self, item: &EvidenceItem) -> DabtScore {
        let quality = item.quality();
        let mut missing = Vec::new();
        let mut absent = |dimension| {
            missing.push(MissingDimensionError {
                evidence_id: item.evidence_id().to_string(),
                dimension,
            });
            0.0
        };

        let documentation = match &quality.documentation {
            Some(doc) if doc.fields_expected > 0 => {
                let present = doc.fields_present.min(doc.fields_expected) as f64;
                let ratio = present / doc.fields_expected as f64;
                let locator = if doc.citation_locator { 1.0 } else { 0.0 };
                0.8 * ratio + 0.2 * locator
            }
            _ => absent(DabtDimension::Documentation),
        };

        let fidelity = match &quality.fidelity {
            Some(facts) => {
                let base = match item.verification_status() {
                    VerificationStatus::Verified => 1.0,
                    VerificationStatus::PartiallyVerified => 0.7,
                    VerificationStatus::Unverified => 0.4,
                };
                (base - LOSSY_STEP_PENALTY * facts.lossy_steps as f64).max(0.0)
            }
            None => absent(DabtDimension::Fidelity),
        };

        let temporal = match quality.fact_time {
            Some(fact_time) => self.temporal_credit(fact_time.abs_diff(item.retrieval_time())),
            None => absent(DabtDimension::Temporal),
        };

        let preparer = match &quality.preparer {
            Some(facts) => {
                let base = match facts.kind {
                    PreparerKind::Auditor | PreparerKind::Regulator => 1.0,
                    PreparerKind::Advisor => 0.8,
                    PreparerKind::Automated => 0.7,
                    PreparerKind::Management => 0.6,
                    PreparerKind::Unknown => 0.3,
                };
                (base - PRIOR_ERROR_PENALTY * facts.prior_errors as f64).max(0.0)
            }
            None => absent(DabtDimension::Preparer),
        };

        let composite = (documentation + fidelity + temporal + preparer) / 4.0;
        DabtScore {
            documentation,
            fidelity,
            temporal,
            preparer,
            composite,
            band: Self::band(composite),
            missing,
        }
    }

    fn temporal_credit(&self, gap_secs: u64) -> f64 {
        let full = self.config.temporal_full_credit_days.saturating_mul(SECS_PER_DAY);
        let zero = self.config.temporal_zero_credit_days.saturating_mul(SECS_PER_DAY);
        if gap_secs <= full {
            1.0
        } else if gap_secs >= zero {
            0.0
        } else if zero <= full {
            0.0
        } else {
            (zero - gap_secs) as f64 / (zero - full) as f64
        }
    }

    /// Band of a composite score
    pub fn band(composite: f64) -> DabtBand {
        if composite >= EXCELLENT_THRESHOLD {
            DabtBand::Excellent
        } else if composite >= GOOD_THRESHOLD {
            DabtBand::Good
        } else if composite >= FAIR_THRESHOLD {
            DabtBand::Fair
        } else {
            DabtBand::Poor
        }
    }

    /// Whether a composite caps the grade at B
    pub fn caps_grade(composite: f64) -> bool {
        composite < DABT_CAP_THRESHOLD
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use sanad_domain::{
        DabtInputs, DocumentationFacts, EvidenceRecord, FidelityFacts, PreparerFacts, SourceTier,
    };

    proptest! {
        #[test]
        fn prop_scores_stay_in_unit_interval(
            expected in 0u32..50,
            present in 0u32..60,
            locator in any::<bool>(),
            lossy in 0u32..10,
            gap_days in 0u64..2000,
            errors in 0u32..20,
        ) {
            let record = EvidenceRecord::new(
                "ev", "s", "d", "o", "a", 1_000_000_000, VerificationStatus::Unverified,
            )
            .with_quality(DabtInputs {
                documentation: Some(DocumentationFacts {
                    fields_expected: expected,
                    fields_present: present,
                    citation_locator: locator,
                }),
                fidelity: Some(FidelityFacts { transform_steps: lossy, lossy_steps: lossy }),
                fact_time: Some(1_000_000_000 - gap_days * SECS_PER_DAY),
                preparer: Some(PreparerFacts { kind: PreparerKind::Advisor, prior_errors: errors }),
            });
            let score = DabtScorer::default().score(&EvidenceItem::new(record, SourceTier::Tier3));
            for v in [score.documentation, score.fidelity, score.temporal, score.preparer, score.composite] {
                prop_assert!((0.0..=1.0).contains(&v));
            }
        }
    }
}
