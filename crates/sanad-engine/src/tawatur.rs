//! Tawatur (corroboration) analysis
//!
//! Groups evidence by independence key and scores how likely the groups
//! share a common origin after all.

use crate::config::TawaturConfig;
use sanad_domain::{CorroborationStatus, EvidenceItem, TransmissionChain};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Independent clusters needed for MUTAWATIR
pub const MUTAWATIR_MIN_CLUSTERS: usize = 3;

/// Highest collusion risk compatible with MUTAWATIR
pub const MUTAWATIR_MAX_COLLUSION_RISK: f64 = 0.30;

/// Two items with the same key are not independent
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndependenceKey {
    /// Originating system
    pub source_system: String,
    /// Upstream origin identifier
    pub upstream_origin_id: String,
    /// Artifact identifier
    pub artifact_id: String,
    /// `retrieval_time / time_bucket_secs`
    pub time_bucket: u64,
}

impl IndependenceKey {
    /// Key of an item
    pub fn of(item: &EvidenceItem, time_bucket_secs: u64) -> Self {
        Self {
            source_system: item.source_system().to_string(),
            upstream_origin_id: item.upstream_origin_id().to_string(),
            artifact_id: item.artifact_id().to_string(),
            time_bucket: item.retrieval_time() / time_bucket_secs.max(1),
        }
    }
}

/// Outcome of independence analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TawaturAssessment {
    /// Evidence ids per independence key
    pub clusters: BTreeMap<IndependenceKey, Vec<String>>,
    /// Largest share from one system, normalized
    pub system_concentration: f64,
    /// Largest share from one time bucket, normalized
    pub temporal_clustering: f64,
    /// Share of items passing through a node shared with another cluster
    pub chain_overlap: f64,
    /// Weighted combination of the three
    pub collusion_risk: f64,
    /// Corroboration status
    pub status: CorroborationStatus,
}

impl TawaturAssessment {
    /// Number of independent clusters
    pub fn independent_clusters(&self) -> usize {
        self.clusters.len()
    }
}

/// Analyzes corroboration
#[derive(Debug, Clone)]
pub struct TawaturAnalyzer {
    config: TawaturConfig,
}

impl Default for TawaturAnalyzer {
    fn default() -> Self {
        Self::new(TawaturConfig::default())
    }
}

/// `(max_group - 1) / (n - 1)`, 0 for n <= 1
fn concentration<K: Ord>(groups: impl Iterator<Item = K>) -> f64 {
    let mut counts: BTreeMap<K, usize> = BTreeMap::new();
    let mut n = 0usize;
    for key in groups {
        *counts.entry(key).or_default() += 1;
        n += 1;
    }
    if n <= 1 {
        return 0.0;
    }
    let max = counts.values().copied().max().unwrap_or(0);
    (max.saturating_sub(1)) as f64 / (n - 1) as f64
}

impl TawaturAnalyzer {
    /// Create an analyzer with the given thresholds
    pub fn new(config: TawaturConfig) -> Self {
        Self { config }
    }

    /// Independence key of an item under this configuration
    pub fn key(&self, item: &EvidenceItem) -> IndependenceKey {
        IndependenceKey::of(item, self.config.time_bucket_secs)
    }

    /// Analyze every item backing a claim
    pub fn analyze(&self, items: &[EvidenceItem], chain: &TransmissionChain) -> TawaturAssessment {
        let keys: Vec<IndependenceKey> = items.iter().map(|i| self.key(i)).collect();

        let mut clusters: BTreeMap<IndependenceKey, Vec<String>> = BTreeMap::new();
        for (item, key) in items.iter().zip(&keys) {
            clusters
                .entry(key.clone())
                .or_default()
                .push(item.evidence_id().to_string());
        }

        let system_concentration = concentration(items.iter().map(|i| i.source_system()));
        let temporal_clustering = concentration(keys.iter().map(|k| k.time_bucket));
        let chain_overlap = self.chain_overlap(items, &keys, chain);

        let collusion_risk = (self.config.system_weight * system_concentration
            + self.config.temporal_weight * temporal_clustering
            + self.config.overlap_weight * chain_overlap)
            .clamp(0.0, 1.0);

        let status = match clusters.len() {
            0 => CorroborationStatus::None,
            1 => CorroborationStatus::Ahad1,
            n if n >= MUTAWATIR_MIN_CLUSTERS && collusion_risk <= MUTAWATIR_MAX_COLLUSION_RISK => {
                CorroborationStatus::Mutawatir
            }
            _ => CorroborationStatus::Ahad2,
        };

        tracing::debug!(
            clusters = clusters.len(),
            collusion_risk,
            status = %status,
            "Tawatur analysis complete"
        );

        TawaturAssessment {
            clusters,
            system_concentration,
            temporal_clustering,
            chain_overlap,
            collusion_risk,
            status,
        }
    }

    fn chain_overlap(
        &self,
        items: &[EvidenceItem],
        keys: &[IndependenceKey],
        chain: &TransmissionChain,
    ) -> f64 {
        if items.is_empty() {
            return 0.0;
        }
        let key_of: BTreeMap<&str, &IndependenceKey> = items
            .iter()
            .zip(keys)
            .map(|(item, key)| (item.evidence_id(), key))
            .collect();

        let overlapping = items
            .iter()
            .zip(keys)
            .filter(|(item, key)| {
                chain
                    .consumers_of_evidence(item.evidence_id())
                    .into_iter()
                    .any(|node| {
                        let others: BTreeSet<&IndependenceKey> = chain
                            .node(node)
                            .evidence_inputs()
                            .filter_map(|id| key_of.get(id).copied())
                            .collect();
                        others.iter().any(|k| *k != *key)
                    })
            })
            .count();

        overlapping as f64 / items.len() as f64
    }
}
