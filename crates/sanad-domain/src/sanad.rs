//! Sanad module - the graded provenance record of one claim

use crate::{
    COIEvaluation, ClaimId, Defect, ExplanationTrail, Grade, LedgerEntry, Lineage, Materiality,
    ReconciliationStep, Severity, SourceTier, TransmissionChain, SANAD_ID_NAMESPACE,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Deterministic identifier of one grading outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SanadId(uuid::Uuid);

impl SanadId {
    /// Derive the id from the claim and a digest of its input snapshot
    pub fn derive(claim_id: ClaimId, snapshot_digest: &str) -> Self {
        let name = format!("sanad/{}/{}", claim_id, snapshot_digest);
        Self(uuid::Uuid::new_v5(&SANAD_ID_NAMESPACE, name.as_bytes()))
    }
}

impl fmt::Display for SanadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Data-quality band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DabtBand {
    /// Composite below the fair threshold
    Poor,
    /// Composite at or above the fair threshold
    Fair,
    /// Composite at or above the good threshold
    Good,
    /// Composite at or above the excellent threshold
    Excellent,
}

impl fmt::Display for DabtBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DabtBand::Poor => "POOR",
            DabtBand::Fair => "FAIR",
            DabtBand::Good => "GOOD",
            DabtBand::Excellent => "EXCELLENT",
        })
    }
}

/// Corroboration status from independence analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CorroborationStatus {
    /// No evidence
    None,
    /// Exactly one independent cluster
    Ahad1,
    /// Two or more clusters that do not qualify as mutawatir
    Ahad2,
    /// Enough independent, non-colluding clusters
    Mutawatir,
}

impl CorroborationStatus {
    /// Whether this status can upgrade a grade
    pub fn allows_upgrade(&self) -> bool {
        matches!(self, CorroborationStatus::Mutawatir)
    }
}

impl fmt::Display for CorroborationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CorroborationStatus::None => "NONE",
            CorroborationStatus::Ahad1 => "AHAD_1",
            CorroborationStatus::Ahad2 => "AHAD_2",
            CorroborationStatus::Mutawatir => "MUTAWATIR",
        })
    }
}

/// Outcome of peer/consensus comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyOutcome {
    /// The claim has no asserted value
    NotApplicable,
    /// No comparable peer values
    NoPeers,
    /// Every comparable peer agrees without reconciliation
    Consistent,
    /// Every comparable peer agrees after reconciliation
    Reconciled {
        /// Strongest heuristic needed
        step: ReconciliationStep,
    },
    /// Disagreement that does not meet the anomaly rule (surfaced, not graded)
    Contradiction {
        /// Peers that disagree
        peer_ids: Vec<String>,
    },
    /// Lower-tier value contradicting consensus
    Anomaly {
        /// Peers forming the consensus
        peer_ids: Vec<String>,
    },
}

/// Everything the engine concluded about one claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanadGradeResult {
    /// Identifier of this grading outcome
    pub sanad_id: SanadId,

    /// Claim graded
    pub claim_id: ClaimId,

    /// Final grade
    pub grade: Grade,

    /// Tier of the anchoring primary evidence, if any is primary-eligible
    pub source_tier: Option<SourceTier>,

    /// Starting grade derived from the tier
    pub source_tier_floor: Grade,

    /// Composite Dabt score of the anchoring evidence
    pub dabt_composite: f64,

    /// Band of the composite
    pub dabt_band: DabtBand,

    /// Corroboration status
    pub corroboration_status: CorroborationStatus,

    /// Number of independent evidence clusters
    pub independent_clusters: usize,

    /// Collusion risk in [0, 1]
    pub collusion_risk: f64,

    /// Peer comparison outcome
    pub anomaly: AnomalyOutcome,

    /// Conflict-of-interest evaluations
    pub coi_evaluations: Vec<COIEvaluation>,

    /// Defects in detection order, with the status their ledger entries give
    pub defects: Vec<Defect>,

    /// Ledger entries behind `defects`, including every disposition applied
    pub ledger: Vec<LedgerEntry>,

    /// Why the grade is what it is
    pub explanation_trail: ExplanationTrail,

    /// Materiality copied from the claim
    pub materiality: Materiality,

    /// Lineage copied from the claim
    pub lineage: Lineage,

    /// Whether dependent calculations may be re-graded automatically
    pub auto_regrade_eligible: bool,
}

impl SanadGradeResult {
    /// Whether any defect is FATAL, whatever its status
    ///
    /// Such a result is always graded D.
    pub fn has_fatal(&self) -> bool {
        self.defects.iter().any(|d| d.severity == Severity::Fatal)
    }

    /// Whether any open defect is FATAL
    pub fn has_open_fatal(&self) -> bool {
        self.defects
            .iter()
            .any(|d| d.is_open() && d.severity == Severity::Fatal)
    }

    /// Whether the orchestration layer should enter its stop state
    ///
    /// True for a material claim (HIGH or CRITICAL) carrying an open FATAL
    /// defect. A waived or cured FATAL defect still pins the grade to D but
    /// no longer calls for a stop. The engine only reports this; it never
    /// halts anything.
    pub fn triggers_stop(&self) -> bool {
        self.materiality.is_material() && self.has_open_fatal()
    }

    /// Open defects of a given severity
    pub fn open_defects(&self, severity: Severity) -> impl Iterator<Item = &Defect> {
        self.defects
            .iter()
            .filter(move |d| d.is_open() && d.severity == severity)
    }
}

/// Aggregate provenance record of one claim
///
/// Created once per grading invocation and never modified; re-grading
/// produces a new `Sanad`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sanad {
    /// Chain the grade was computed over
    pub chain: TransmissionChain,

    /// Grading outcome
    pub result: SanadGradeResult,
}

impl Sanad {
    /// Bind a chain to its grading outcome
    pub fn new(chain: TransmissionChain, result: SanadGradeResult) -> Self {
        Self { chain, result }
    }

    /// Identifier
    pub fn id(&self) -> SanadId {
        self.result.sanad_id
    }

    /// Final grade
    pub fn grade(&self) -> Grade {
        self.result.grade
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanad_id_is_deterministic() {
        let claim = ClaimId::from_value(11);
        assert_eq!(SanadId::derive(claim, "abc"), SanadId::derive(claim, "abc"));
        assert_ne!(SanadId::derive(claim, "abc"), SanadId::derive(claim, "abd"));
    }

    #[test]
    fn test_band_order() {
        assert!(DabtBand::Excellent > DabtBand::Good);
        assert!(DabtBand::Fair > DabtBand::Poor);
    }

    #[test]
    fn test_only_mutawatir_upgrades() {
        assert!(CorroborationStatus::Mutawatir.allows_upgrade());
        assert!(!CorroborationStatus::Ahad2.allows_upgrade());
        assert!(!CorroborationStatus::None.allows_upgrade());
    }

    #[test]
    fn test_anomaly_outcome_wire_format() {
        let json = serde_json::to_string(&AnomalyOutcome::Reconciled {
            step: ReconciliationStep::UnitConversion,
        })
        .unwrap();
        assert_eq!(json, r#"{"outcome":"RECONCILED","step":"UNIT_CONVERSION"}"#);
    }
}
