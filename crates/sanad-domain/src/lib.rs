//! Sanad Domain Layer
//!
//! Value types for evidentiary trust grading: claims, evidence, provenance
//! chains, defects and the graded result. Nothing here computes a grade;
//! the engine crate does that over these types.
//!
//! ## Key Concepts
//!
//! - **Claim**: A metric assertion destined for an investment memo
//! - **Evidence**: An immutable item backing a claim, classified into a source tier
//! - **Transmission chain**: The provenance graph from evidence to claim
//! - **Defect**: A structured finding that lowers or pins the grade
//! - **Sanad**: The graded provenance record, with its explanation trail
//!
//! ## Architecture
//!
//! - Only serde, uuid and thiserror as dependencies
//! - All types are plain data and `Send + Sync`
//! - Trait definitions for the audit collaborator

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chain;
pub mod claim;
pub mod coi;
pub mod defect;
pub mod evidence;
pub mod explanation;
pub mod grade;
pub mod metric;
pub mod sanad;
pub mod snapshot;
pub mod tier;
pub mod traits;

// Re-exports for convenience
pub use chain::{
    ChainBuildError, NodeIndex, NodeRef, OutputRef, TransformKind, TransmissionChain,
    TransmissionNode, UnresolvedRef,
};
pub use claim::{Claim, ClaimId, Lineage, Materiality};
pub use coi::{COIEvaluation, ConflictFlag, ConflictSeverity, Disclosure};
pub use defect::{
    CureProtocol, Defect, DefectId, DefectKind, DefectReport, DefectStatus, Disposition,
    DispositionAction, LedgerEntry, LedgerEvent, Severity, TransitionError, SANAD_ID_NAMESPACE,
};
pub use evidence::{
    DabtInputs, DocumentationFacts, EvidenceItem, EvidenceRecord, FidelityFacts, PreparerFacts,
    PreparerKind, VerificationStatus,
};
pub use explanation::{ExplanationStep, ExplanationTrail, RuleId, TrailError};
pub use grade::Grade;
pub use metric::{
    reconcile, Comparison, Dimension, MetricValue, ReconciliationStep, Scale, TimeWindow,
};
pub use sanad::{AnomalyOutcome, CorroborationStatus, DabtBand, Sanad, SanadGradeResult, SanadId};
pub use snapshot::{ClaimSnapshot, PeerValue};
pub use tier::{SourceDescriptor, SourceTier};
pub use traits::{AuditRecord, AuditSink, MemoryAuditSink};
