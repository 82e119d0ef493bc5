//! Snapshot validation
//!
//! Structural checks that reject a snapshot outright. Anything that is a
//! finding about the evidence (a broken chain, a stale source) is left to
//! the detectors.

use crate::InvalidInputError;
use sanad_domain::ClaimSnapshot;
use std::collections::BTreeSet;

/// Validate a snapshot before grading
pub fn validate_snapshot(snapshot: &ClaimSnapshot) -> Result<(), InvalidInputError> {
    let claim = &snapshot.claim;

    // 1. Claim identity
    if claim.claim_id.is_nil() {
        return Err(InvalidInputError::NilClaimId);
    }
    if claim.metric_key.trim().is_empty() {
        return Err(InvalidInputError::EmptyMetricKey(claim.claim_id.to_string()));
    }

    // 2. Finite values
    if let Some(value) = &claim.asserted_value {
        if !value.is_finite() {
            return Err(InvalidInputError::NonFiniteValue(format!("claim {}", claim.claim_id)));
        }
    }
    for record in &snapshot.evidence {
        if let Some(value) = &record.asserted_value {
            if !value.is_finite() {
                return Err(InvalidInputError::NonFiniteValue(format!(
                    "evidence {}",
                    record.evidence_id
                )));
            }
        }
    }

    // 3. Evidence ids
    let mut seen = BTreeSet::new();
    for (pos, record) in snapshot.evidence.iter().enumerate() {
        if record.evidence_id.trim().is_empty() {
            return Err(InvalidInputError::EmptyEvidenceId(pos));
        }
        if !seen.insert(record.evidence_id.as_str()) {
            return Err(InvalidInputError::DuplicateEvidenceId(record.evidence_id.clone()));
        }
    }

    // 4. Peers
    let mut peers = BTreeSet::new();
    for peer in &snapshot.peers {
        if peer.peer_id.trim().is_empty() || !peers.insert(peer.peer_id.as_str()) {
            return Err(InvalidInputError::InvalidPeerId(peer.peer_id.clone()));
        }
        if !peer.value.is_finite() {
            return Err(InvalidInputError::NonFiniteValue(format!("peer {}", peer.peer_id)));
        }
    }

    // 5. Prior dispositions
    for disposition in &snapshot.dispositions {
        if disposition.actor_id.trim().is_empty() || disposition.reason.trim().is_empty() {
            return Err(InvalidInputError::IncompleteDisposition(disposition.defect_id));
        }
    }

    Ok(())
}
