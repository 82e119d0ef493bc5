//! Source tier module - ordered reliability tiers for evidence sources

use crate::Grade;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reliability tier of an evidence source
///
/// Tiers are ordered from most reliable (`Tier1`) to least (`Tier6`):
/// - Tier1..Tier4: admissible as primary evidence, each with a grade floor
/// - Tier5, Tier6: support-only; they can corroborate but never anchor a grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceTier {
    /// Audited or independently attested records
    Tier1,
    /// Signed, reviewed or system-of-record documents
    Tier2,
    /// Internal management records
    Tier3,
    /// Company-prepared presentation material
    Tier4,
    /// Third-party publications (support-only)
    Tier5,
    /// Anecdotal or unverifiable material (support-only)
    Tier6,
}

impl SourceTier {
    /// All tiers, most reliable first
    pub const ALL: [SourceTier; 6] = [
        SourceTier::Tier1,
        SourceTier::Tier2,
        SourceTier::Tier3,
        SourceTier::Tier4,
        SourceTier::Tier5,
        SourceTier::Tier6,
    ];

    /// Tier number, 1 (best) through 6
    pub fn number(&self) -> u8 {
        match self {
            SourceTier::Tier1 => 1,
            SourceTier::Tier2 => 2,
            SourceTier::Tier3 => 3,
            SourceTier::Tier4 => 4,
            SourceTier::Tier5 => 5,
            SourceTier::Tier6 => 6,
        }
    }

    /// Build a tier from its number
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(SourceTier::Tier1),
            2 => Some(SourceTier::Tier2),
            3 => Some(SourceTier::Tier3),
            4 => Some(SourceTier::Tier4),
            5 => Some(SourceTier::Tier5),
            6 => Some(SourceTier::Tier6),
            _ => None,
        }
    }

    /// Grade floor granted by this tier, `None` below the D threshold
    pub fn grade_floor(&self) -> Option<Grade> {
        match self {
            SourceTier::Tier1 => Some(Grade::A),
            SourceTier::Tier2 => Some(Grade::B),
            SourceTier::Tier3 => Some(Grade::C),
            SourceTier::Tier4 => Some(Grade::D),
            SourceTier::Tier5 | SourceTier::Tier6 => None,
        }
    }

    /// Whether evidence of this tier may anchor a claim's grade
    pub fn is_primary_eligible(&self) -> bool {
        self.grade_floor().is_some()
    }

    /// Whether this tier counts as top-tier (1 or 2) for conflict cures
    pub fn is_top_tier(&self) -> bool {
        matches!(self, SourceTier::Tier1 | SourceTier::Tier2)
    }

    /// Whether this tier is strictly more reliable than `other`
    pub fn outranks(&self, other: SourceTier) -> bool {
        self.number() < other.number()
    }
}

impl fmt::Display for SourceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tier {}", self.number())
    }
}

/// Raw description of where a piece of evidence came from
///
/// The pair `(system_id, document_type)` is the lookup key for tier
/// classification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Originating system or connector (e.g., "netsuite", "docusign", "data_room")
    pub system_id: String,

    /// Document or connector type (e.g., "audited_financial_statement")
    pub document_type: String,
}

impl SourceDescriptor {
    /// Create a new source descriptor
    pub fn new(system_id: impl Into<String>, document_type: impl Into<String>) -> Self {
        Self {
            system_id: system_id.into(),
            document_type: document_type.into(),
        }
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.system_id, self.document_type)
    }
}
