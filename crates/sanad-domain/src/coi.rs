//! Conflict-of-interest flags and evaluations

use serde::{Deserialize, Serialize};

/// Whether a conflict was disclosed by the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Disclosure {
    /// Declared by the source
    Disclosed,
    /// Found independently
    Undisclosed,
}

/// Severity of a conflict of interest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictSeverity {
    /// Minor relationship
    Low,
    /// Material relationship
    Medium,
    /// Direct financial interest in the claim
    High,
}

/// A conflict attached to an evidence item
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConflictFlag {
    /// The conflicted party (e.g., "placement_agent:xyz"); flags naming the
    /// same party describe the same conflict
    pub party: String,

    /// Disclosure state
    pub disclosure: Disclosure,

    /// Severity
    pub severity: ConflictSeverity,
}

impl ConflictFlag {
    /// Create a new conflict flag
    pub fn new(party: impl Into<String>, disclosure: Disclosure, severity: ConflictSeverity) -> Self {
        Self {
            party: party.into(),
            disclosure,
            severity,
        }
    }
}

/// Outcome of evaluating one conflict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct COIEvaluation {
    /// The conflicted party
    pub party: String,

    /// Evidence items carrying the conflict
    pub evidence_refs: Vec<String>,

    /// Disclosure state
    pub disclosure: Disclosure,

    /// Severity
    pub severity: ConflictSeverity,

    /// Whether the conflict is cured (no cap applies)
    pub cured: bool,

    /// Why the conflict is or is not cured
    pub rationale: String,
}
