//! Claim snapshot - the read-only input of one grading call

use crate::{Claim, DefectReport, Disposition, EvidenceRecord, MetricValue, SourceTier, TransmissionNode};
use serde::{Deserialize, Serialize};

/// A value asserted for the same metric by another claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerValue {
    /// Identifier of the peer claim or observation
    pub peer_id: String,

    /// The peer's value
    pub value: MetricValue,

    /// Tier of the peer's anchoring source
    pub source_tier: SourceTier,
}

impl PeerValue {
    /// Create a new peer value
    pub fn new(peer_id: impl Into<String>, value: MetricValue, source_tier: SourceTier) -> Self {
        Self {
            peer_id: peer_id.into(),
            value,
            source_tier,
        }
    }
}

/// Everything needed to grade one claim
///
/// Assembled by the ingestion layer; every id it references must already be
/// consistent. The engine performs no lookups beyond this snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSnapshot {
    /// The claim
    pub claim: Claim,

    /// Evidence backing the claim
    pub evidence: Vec<EvidenceRecord>,

    /// Provenance chain, in declaration order
    #[serde(default)]
    pub chain: Vec<TransmissionNode>,

    /// Peer values of the same metric
    #[serde(default)]
    pub peers: Vec<PeerValue>,

    /// Defects reported by the extraction layer
    #[serde(default)]
    pub reported_defects: Vec<DefectReport>,

    /// Cures and waivers recorded by earlier grading rounds
    #[serde(default)]
    pub dispositions: Vec<Disposition>,
}

impl ClaimSnapshot {
    /// A snapshot with only a claim and its evidence
    pub fn new(claim: Claim, evidence: Vec<EvidenceRecord>) -> Self {
        Self {
            claim,
            evidence,
            chain: Vec::new(),
            peers: Vec::new(),
            reported_defects: Vec::new(),
            dispositions: Vec::new(),
        }
    }

    /// Set the provenance chain
    pub fn with_chain(mut self, chain: Vec<TransmissionNode>) -> Self {
        self.chain = chain;
        self
    }

    /// Set the peer values
    pub fn with_peers(mut self, peers: Vec<PeerValue>) -> Self {
        self.peers = peers;
        self
    }

    /// Add a defect reported upstream
    pub fn with_reported_defect(mut self, report: DefectReport) -> Self {
        self.reported_defects.push(report);
        self
    }

    /// Add a prior disposition
    pub fn with_disposition(mut self, disposition: Disposition) -> Self {
        self.dispositions.push(disposition);
        self
    }
}
