//! Evidence module - the source observations backing a claim

use crate::{ConflictFlag, MetricValue, SourceDescriptor, SourceTier};
use serde::{Deserialize, Serialize};

/// How far an evidence item has been checked against its source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    /// Matched against the original artifact
    Verified,
    /// Some fields matched, others not checked
    PartiallyVerified,
    /// Taken as extracted
    Unverified,
}

/// Who prepared the underlying document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PreparerKind {
    /// Independent auditor
    Auditor,
    /// Regulator or public registry
    Regulator,
    /// Third-party advisor (bank, consultant)
    Advisor,
    /// Company management
    Management,
    /// System-generated export
    Automated,
    /// Preparer not identified
    Unknown,
}

/// Documentation completeness facts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentationFacts {
    /// Fields the document type is expected to carry
    pub fields_expected: u32,
    /// Fields actually present
    pub fields_present: u32,
    /// Whether a page/cell locator points back into the artifact
    #[serde(default)]
    pub citation_locator: bool,
}

/// Transmission fidelity facts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FidelityFacts {
    /// Transformation steps between the artifact and the extracted value
    pub transform_steps: u32,
    /// Steps that lose information (OCR, summarization, manual re-keying)
    pub lossy_steps: u32,
}

/// Preparer reliability facts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparerFacts {
    /// Preparer category
    pub kind: PreparerKind,
    /// Known prior errors attributed to this preparer
    #[serde(default)]
    pub prior_errors: u32,
}

/// Metadata feeding the four Dabt dimensions
///
/// Every field is optional: a dimension with missing inputs scores 0.0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DabtInputs {
    /// Documentation completeness inputs
    #[serde(default)]
    pub documentation: Option<DocumentationFacts>,
    /// Transmission fidelity inputs
    #[serde(default)]
    pub fidelity: Option<FidelityFacts>,
    /// When the asserted fact was true (seconds since Unix epoch)
    #[serde(default)]
    pub fact_time: Option<u64>,
    /// Preparer inputs
    #[serde(default)]
    pub preparer: Option<PreparerFacts>,
}

/// Raw evidence as delivered in a snapshot, before tier classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    /// Identifier, unique within the snapshot
    pub evidence_id: String,

    /// Originating system or connector
    pub source_system: String,

    /// Document or connector type
    pub document_type: String,

    /// Upstream origin (e.g., the issuing entity); independence key component
    pub upstream_origin_id: String,

    /// Artifact identifier (file, record); independence key component
    pub artifact_id: String,

    /// Retrieval time (seconds since Unix epoch)
    pub retrieval_time: u64,

    /// Verification status
    pub verification_status: VerificationStatus,

    /// Hash of the artifact content at retrieval
    #[serde(default)]
    pub content_hash: Option<String>,

    /// Value this observation asserts for the claim's metric
    #[serde(default)]
    pub asserted_value: Option<MetricValue>,

    /// Conflict-of-interest flags
    #[serde(default)]
    pub conflicts: Vec<ConflictFlag>,

    /// Data-quality metadata
    #[serde(default)]
    pub quality: DabtInputs,
}

impl EvidenceRecord {
    /// Create a record with the required fields
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        evidence_id: impl Into<String>,
        source_system: impl Into<String>,
        document_type: impl Into<String>,
        upstream_origin_id: impl Into<String>,
        artifact_id: impl Into<String>,
        retrieval_time: u64,
        verification_status: VerificationStatus,
    ) -> Self {
        Self {
            evidence_id: evidence_id.into(),
            source_system: source_system.into(),
            document_type: document_type.into(),
            upstream_origin_id: upstream_origin_id.into(),
            artifact_id: artifact_id.into(),
            retrieval_time,
            verification_status,
            content_hash: None,
            asserted_value: None,
            conflicts: Vec::new(),
            quality: DabtInputs::default(),
        }
    }

    /// Source descriptor used for tier classification
    pub fn descriptor(&self) -> SourceDescriptor {
        SourceDescriptor::new(self.source_system.clone(), self.document_type.clone())
    }

    /// Set the content hash
    pub fn with_content_hash(mut self, hash: impl Into<String>) -> Self {
        self.content_hash = Some(hash.into());
        self
    }

    /// Set the asserted value
    pub fn with_value(mut self, value: MetricValue) -> Self {
        self.asserted_value = Some(value);
        self
    }

    /// Attach a conflict flag
    pub fn with_conflict(mut self, conflict: ConflictFlag) -> Self {
        self.conflicts.push(conflict);
        self
    }

    /// Set the data-quality metadata
    pub fn with_quality(mut self, quality: DabtInputs) -> Self {
        self.quality = quality;
        self
    }
}

/// Classified evidence item
///
/// Immutable once created: the tier is assigned by the classifier and the
/// record cannot be changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvidenceItem {
    record: EvidenceRecord,
    source_tier: SourceTier,
}

impl EvidenceItem {
    /// Bind a record to its classified tier
    pub fn new(record: EvidenceRecord, source_tier: SourceTier) -> Self {
        Self {
            record,
            source_tier,
        }
    }

    /// Evidence identifier
    pub fn evidence_id(&self) -> &str {
        &self.record.evidence_id
    }

    /// Originating system
    pub fn source_system(&self) -> &str {
        &self.record.source_system
    }

    /// Upstream origin
    pub fn upstream_origin_id(&self) -> &str {
        &self.record.upstream_origin_id
    }

    /// Artifact identifier
    pub fn artifact_id(&self) -> &str {
        &self.record.artifact_id
    }

    /// Retrieval time (seconds since Unix epoch)
    pub fn retrieval_time(&self) -> u64 {
        self.record.retrieval_time
    }

    /// Classified tier
    pub fn source_tier(&self) -> SourceTier {
        self.source_tier
    }

    /// Verification status
    pub fn verification_status(&self) -> VerificationStatus {
        self.record.verification_status
    }

    /// Content hash, if known
    pub fn content_hash(&self) -> Option<&str> {
        self.record.content_hash.as_deref()
    }

    /// Asserted value, if any
    pub fn asserted_value(&self) -> Option<&MetricValue> {
        self.record.asserted_value.as_ref()
    }

    /// Conflict flags
    pub fn conflicts(&self) -> &[ConflictFlag] {
        &self.record.conflicts
    }

    /// Data-quality metadata
    pub fn quality(&self) -> &DabtInputs {
        &self.record.quality
    }

    /// The underlying record
    pub fn record(&self) -> &EvidenceRecord {
        &self.record
    }
}
