//! Shared fixtures for engine integration tests

#![allow(dead_code)]

use sanad_domain::{
    Claim, ClaimId, ClaimSnapshot, DabtInputs, DefectKind, DefectReport, DocumentationFacts,
    EvidenceRecord, FidelityFacts, Lineage, Materiality, NodeRef, OutputRef, PreparerFacts,
    PreparerKind, TransformKind, TransmissionNode, VerificationStatus,
};

/// Retrieval time of the first evidence item
pub const T0: u64 = 1_700_000_000;

/// Two independence buckets apart at the default bucket width
pub const GAP: u64 = 7_200;

pub fn claim_id() -> ClaimId {
    ClaimId::from_value(0x5a4a_d000_0000_0001)
}

pub fn claim() -> Claim {
    Claim::new(claim_id(), "revenue.arr", Materiality::High, Lineage::Primary)
}

/// Metadata that scores 1.0 on every Dabt dimension
pub fn complete_quality(retrieved: u64) -> DabtInputs {
    DabtInputs {
        documentation: Some(DocumentationFacts {
            fields_expected: 10,
            fields_present: 10,
            citation_locator: true,
        }),
        fidelity: Some(FidelityFacts {
            transform_steps: 1,
            lossy_steps: 0,
        }),
        fact_time: Some(retrieved),
        preparer: Some(PreparerFacts {
            kind: PreparerKind::Auditor,
            prior_errors: 0,
        }),
    }
}

/// A verified record with complete metadata
pub fn record(id: &str, system: &str, document_type: &str, retrieved: u64) -> EvidenceRecord {
    EvidenceRecord::new(
        id,
        system,
        document_type,
        format!("origin-{}", id),
        format!("{}.pdf", id),
        retrieved,
        VerificationStatus::Verified,
    )
    .with_quality(complete_quality(retrieved))
}

/// Anchor record at T0 plus corroborators in distinct systems and buckets
pub fn corroborated(anchor: EvidenceRecord, corroborators: usize) -> Vec<EvidenceRecord> {
    let mut records = vec![anchor];
    for n in 1..=corroborators {
        records.push(record(
            &format!("bank-{}", n),
            &format!("bank_{}", n),
            "bank_statement",
            T0 + GAP * n as u64,
        ));
    }
    records
}

/// Single-root, single-terminal chain from `evidence` to the claim
pub fn linear_chain(evidence: &[&str]) -> Vec<TransmissionNode> {
    let after = T0 + GAP * 10;
    vec![
        TransmissionNode::new(
            "extract",
            evidence.iter().map(|e| NodeRef::Evidence(e.to_string())).collect(),
            OutputRef::Value("revenue.arr/raw".into()),
            TransformKind::Extraction,
            "extractor:v2",
            after,
        ),
        TransmissionNode::new(
            "assert",
            vec![NodeRef::Node("extract".into())],
            OutputRef::Claim(claim_id()),
            TransformKind::Citation,
            "analyst:ana",
            after + 60,
        ),
    ]
}

pub fn report(kind: DefectKind, evidence: &str, description: &str) -> DefectReport {
    DefectReport {
        kind,
        evidence_refs: vec![evidence.to_string()],
        description: description.to_string(),
    }
}

/// Tier 2 anchor with two Tier 1 corroborators outside the chain
pub fn mutawatir_tier2_snapshot() -> ClaimSnapshot {
    let anchor = record("gl", "netsuite", "general_ledger", T0);
    ClaimSnapshot::new(claim(), corroborated(anchor, 2)).with_chain(linear_chain(&["gl"]))
}
