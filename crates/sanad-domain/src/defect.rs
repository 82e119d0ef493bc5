//! Defect module - structured findings that lower or pin a grade

use crate::ClaimId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Namespace for deterministic (UUIDv5) identifiers minted by the engine
pub const SANAD_ID_NAMESPACE: uuid::Uuid = uuid::Uuid::from_u128(0x5a4a_d000_6a1d_4e0b_9c2f_d1f1_90e5_7ab3);

/// Deterministic defect identifier
///
/// Derived from the claim, the defect kind and the locus of the finding, so
/// grading the same snapshot twice yields the same ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefectId(uuid::Uuid);

impl DefectId {
    /// Derive the id of a finding
    pub fn derive(claim_id: ClaimId, kind: DefectKind, locus: &str) -> Self {
        let name = format!("defect/{}/{}/{}", claim_id, kind.as_str(), locus);
        Self(uuid::Uuid::new_v5(&SANAD_ID_NAMESPACE, name.as_bytes()))
    }

    /// Parse from a UUID string
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid defect id: {}", e))
    }
}

impl fmt::Display for DefectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Severity of a defect; FATAL dominates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Recorded, never changes the grade
    Minor,
    /// Downgrades one level
    Major,
    /// Pins the grade to D
    Fatal,
}

impl Severity {
    /// Get the severity as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Minor => "MINOR",
            Severity::Major => "MAJOR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of defect kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DefectKind {
    /// Unresolved reference, or not exactly one root / terminal
    BrokenChain,
    /// Provenance inconsistent with its declared predecessor, or a cycle
    ChainGrafting,
    /// A step happens before something it depends on
    ChronologyImpossible,
    /// Source content and value changed silently between observations
    VersionDrift,
    /// Lower-tier value contradicts consensus and cannot be reconciled
    Anomaly,
    /// Internal inconsistency reported by extraction
    Inconsistency,
    /// Source too old for the fact it supports
    StaleSource,
    /// Non-essential metadata missing
    MissingMetadata,
}

impl DefectKind {
    /// All kinds
    pub const ALL: [DefectKind; 8] = [
        DefectKind::BrokenChain,
        DefectKind::ChainGrafting,
        DefectKind::ChronologyImpossible,
        DefectKind::VersionDrift,
        DefectKind::Anomaly,
        DefectKind::Inconsistency,
        DefectKind::StaleSource,
        DefectKind::MissingMetadata,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            DefectKind::BrokenChain => "BROKEN_CHAIN",
            DefectKind::ChainGrafting => "CHAIN_GRAFTING",
            DefectKind::ChronologyImpossible => "CHRONOLOGY_IMPOSSIBLE",
            DefectKind::VersionDrift => "VERSION_DRIFT",
            DefectKind::Anomaly => "ANOMALY",
            DefectKind::Inconsistency => "INCONSISTENCY",
            DefectKind::StaleSource => "STALE_SOURCE",
            DefectKind::MissingMetadata => "MISSING_METADATA",
        }
    }

    /// Severity every defect of this kind carries
    pub fn severity(&self) -> Severity {
        match self {
            DefectKind::BrokenChain
            | DefectKind::ChainGrafting
            | DefectKind::ChronologyImpossible => Severity::Fatal,
            DefectKind::VersionDrift
            | DefectKind::Anomaly
            | DefectKind::Inconsistency
            | DefectKind::StaleSource => Severity::Major,
            DefectKind::MissingMetadata => Severity::Minor,
        }
    }

    /// Protocol that cures a defect of this kind
    pub fn cure_protocol(&self) -> CureProtocol {
        match self {
            DefectKind::BrokenChain | DefectKind::ChainGrafting => CureProtocol::ReconstructChain,
            DefectKind::ChronologyImpossible => CureProtocol::RequireReaudit,
            DefectKind::VersionDrift | DefectKind::StaleSource | DefectKind::MissingMetadata => {
                CureProtocol::RequestSource
            }
            DefectKind::Anomaly | DefectKind::Inconsistency => CureProtocol::HumanArbitration,
        }
    }
}

impl fmt::Display for DefectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of cure protocols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CureProtocol {
    /// Rebuild the provenance chain from the artifacts
    ReconstructChain,
    /// Obtain the source document again (or a newer one)
    RequestSource,
    /// Have the timeline re-audited
    RequireReaudit,
    /// A human decides between conflicting values
    HumanArbitration,
}

/// Lifecycle of a defect: OPEN → CURED | WAIVED, one-way
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DefectStatus {
    /// Outstanding; affects the grade
    Open,
    /// Resolved by following the cure protocol
    Cured,
    /// Accepted by an accountable human
    Waived,
}

impl DefectStatus {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DefectStatus::Open)
    }

    /// Apply a disposition
    ///
    /// # Errors
    /// Only OPEN defects can be cured or waived.
    pub fn transition(self, action: DispositionAction) -> Result<DefectStatus, TransitionError> {
        match (self, action) {
            (DefectStatus::Open, DispositionAction::Cure) => Ok(DefectStatus::Cured),
            (DefectStatus::Open, DispositionAction::Waive) => Ok(DefectStatus::Waived),
            (current, action) => Err(TransitionError { current, action }),
        }
    }
}

impl fmt::Display for DefectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DefectStatus::Open => "OPEN",
            DefectStatus::Cured => "CURED",
            DefectStatus::Waived => "WAIVED",
        })
    }
}

/// Human disposition of a defect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispositionAction {
    /// The cure protocol was followed
    Cure,
    /// The defect is accepted as is
    Waive,
}

/// Refused status transition
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Cannot {action:?} a defect in status {current}")]
pub struct TransitionError {
    /// Status at the time of the request
    pub current: DefectStatus,
    /// Requested action
    pub action: DispositionAction,
}

/// A structured defect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defect {
    /// Deterministic identifier
    pub defect_id: DefectId,

    /// Kind
    pub kind: DefectKind,

    /// Severity (fixed by kind)
    pub severity: Severity,

    /// Evidence items involved
    pub evidence_refs: Vec<String>,

    /// Transmission nodes involved
    #[serde(default)]
    pub node_refs: Vec<String>,

    /// Human-readable finding
    pub description: String,

    /// How to cure it
    pub cure_protocol: CureProtocol,

    /// Lifecycle status
    pub status: DefectStatus,
}

impl Defect {
    /// Create an OPEN defect; severity and cure protocol follow the kind
    pub fn open(
        claim_id: ClaimId,
        kind: DefectKind,
        locus: &str,
        description: impl Into<String>,
    ) -> Self {
        Self {
            defect_id: DefectId::derive(claim_id, kind, locus),
            kind,
            severity: kind.severity(),
            evidence_refs: Vec::new(),
            node_refs: Vec::new(),
            description: description.into(),
            cure_protocol: kind.cure_protocol(),
            status: DefectStatus::Open,
        }
    }

    /// Attach evidence references
    pub fn with_evidence(mut self, refs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.evidence_refs.extend(refs.into_iter().map(Into::into));
        self
    }

    /// Attach node references
    pub fn with_nodes(mut self, refs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.node_refs.extend(refs.into_iter().map(Into::into));
        self
    }

    /// Whether the defect still affects the grade
    pub fn is_open(&self) -> bool {
        self.status == DefectStatus::Open
    }
}

/// A defect reported by the extraction layer alongside the snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefectReport {
    /// Kind
    pub kind: DefectKind,

    /// Evidence items involved
    #[serde(default)]
    pub evidence_refs: Vec<String>,

    /// Human-readable finding
    pub description: String,
}

/// A cure or waiver recorded against a defect by an earlier grading round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disposition {
    /// Defect the disposition applies to
    pub defect_id: DefectId,

    /// Cure or waive
    pub action: DispositionAction,

    /// Accountable actor
    pub actor_id: String,

    /// Why
    pub reason: String,
}

/// What a ledger entry records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerEvent {
    /// A defect was found at grading time
    Raised {
        /// The defect as found
        defect: Defect,
    },
    /// A defect changed status
    Disposed {
        /// Cure or waive
        action: DispositionAction,
        /// Status before
        from: DefectStatus,
        /// Status after
        to: DefectStatus,
        /// Accountable actor
        actor_id: String,
        /// Why
        reason: String,
    },
}

/// One append-only ledger record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Position in the ledger, starting at 0
    pub sequence: u64,

    /// Defect the entry is about
    pub defect_id: DefectId,

    /// What happened
    #[serde(flatten)]
    pub event: LedgerEvent,
}
