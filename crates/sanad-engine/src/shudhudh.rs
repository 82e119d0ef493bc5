//! Shudhudh (anomaly) detection
//!
//! The claim's value is compared with peer values of the same metric.
//! Reconciliation is always attempted first; an anomaly needs both a failed
//! reconciliation and a consensus that outranks the claim.

use crate::config::ShudhudhConfig;
use sanad_domain::{reconcile, AnomalyOutcome, Comparison, MetricValue, PeerValue, ReconciliationStep, SourceTier};

/// Detects anomalous claim values
#[derive(Debug, Clone)]
pub struct ShudhudhDetector {
    config: ShudhudhConfig,
}

impl Default for ShudhudhDetector {
    fn default() -> Self {
        Self::new(ShudhudhConfig::default())
    }
}

fn step_rank(step: ReconciliationStep) -> u8 {
    match step {
        ReconciliationStep::Exact => 0,
        ReconciliationStep::UnitConversion => 1,
        ReconciliationStep::TimeWindowAlignment => 2,
        ReconciliationStep::RoundingTolerance => 3,
    }
}

/// Most reliable tier of a set, if any
fn best_tier(tiers: impl Iterator<Item = SourceTier>) -> Option<SourceTier> {
    tiers.min()
}

impl ShudhudhDetector {
    /// Create a detector with the given tolerances
    pub fn new(config: ShudhudhConfig) -> Self {
        Self { config }
    }

    /// Compare a claim value against its peers
    ///
    /// `claim_tier` is the tier of the claim's anchoring source; `None`
    /// (no primary-eligible source) ranks below every tier.
    pub fn detect(
        &self,
        claim_value: Option<&MetricValue>,
        claim_tier: Option<SourceTier>,
        peers: &[PeerValue],
    ) -> AnomalyOutcome {
        let Some(value) = claim_value else {
            return AnomalyOutcome::NotApplicable;
        };

        let mut sorted: Vec<&PeerValue> = peers.iter().collect();
        sorted.sort_by(|a, b| a.peer_id.cmp(&b.peer_id));

        let mut agreeing: Vec<(&PeerValue, ReconciliationStep)> = Vec::new();
        let mut disagreeing: Vec<&PeerValue> = Vec::new();
        for peer in sorted {
            match reconcile(value, &peer.value, self.config.relative_tolerance) {
                Comparison::Agrees(step) => agreeing.push((peer, step)),
                Comparison::Contradicts => disagreeing.push(peer),
                Comparison::Incomparable(reason) => {
                    tracing::debug!(peer = %peer.peer_id, %reason, "Peer value excluded");
                }
            }
        }

        if agreeing.is_empty() && disagreeing.is_empty() {
            return AnomalyOutcome::NoPeers;
        }

        if disagreeing.is_empty() {
            let strongest = agreeing
                .iter()
                .map(|(_, step)| *step)
                .max_by_key(|s| step_rank(*s))
                .unwrap_or(ReconciliationStep::Exact);
            return match strongest {
                ReconciliationStep::Exact => AnomalyOutcome::Consistent,
                step => AnomalyOutcome::Reconciled { step },
            };
        }

        let consensus = self.consensus(&disagreeing);
        let claim_side = 1 + agreeing.len();
        // Worst tier stands in for "no primary source"
        let claim_best = best_tier(
            std::iter::once(claim_tier.unwrap_or(SourceTier::Tier6))
                .chain(agreeing.iter().map(|(p, _)| p.source_tier)),
        )
        .unwrap_or(SourceTier::Tier6);
        let consensus_best = best_tier(consensus.iter().map(|p| p.source_tier)).unwrap_or(SourceTier::Tier6);

        let higher_tier = consensus_best.outranks(claim_best);
        let majority = consensus.len() >= self.config.min_majority
            && consensus.len() > claim_side
            && !claim_best.outranks(consensus_best);

        if higher_tier || majority {
            AnomalyOutcome::Anomaly {
                peer_ids: consensus.iter().map(|p| p.peer_id.clone()).collect(),
            }
        } else {
            AnomalyOutcome::Contradiction {
                peer_ids: disagreeing.iter().map(|p| p.peer_id.clone()).collect(),
            }
        }
    }

    /// Largest mutually reconcilable group among the disagreeing peers
    ///
    /// Greedy in peer id order from each seed; ties go to the better tier,
    /// then to the earlier seed.
    fn consensus<'a>(&self, disagreeing: &[&'a PeerValue]) -> Vec<&'a PeerValue> {
        let mut best: Vec<&PeerValue> = Vec::new();
        for seed in disagreeing {
            let mut group = vec![*seed];
            for candidate in disagreeing {
                if candidate.peer_id == seed.peer_id {
                    continue;
                }
                let fits = group.iter().all(|member| {
                    reconcile(&member.value, &candidate.value, self.config.relative_tolerance).agrees()
                });
                if fits {
                    group.push(*candidate);
                }
            }
            let better = match group.len().cmp(&best.len()) {
                std::cmp::Ordering::Greater => true,
                std::cmp::Ordering::Equal => {
                    let g = best_tier(group.iter().map(|p| p.source_tier));
                    let b = best_tier(best.iter().map(|p| p.source_tier));
                    matches!((g, b), (Some(g), Some(b)) if g.outranks(b))
                }
                std::cmp::Ordering::Less => false,
            };
            if better {
                best = group;
            }
        }
        best.sort_by(|a, b| a.peer_id.cmp(&b.peer_id));
        best
    }
}
