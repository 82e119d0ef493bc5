//! I'lal (hidden defect) detection over the transmission chain
//!
//! Detection is exhaustive: every finding is recorded even when an earlier
//! one already pins the grade to D. Findings come out in a fixed order
//! (breaks, grafts, chronology, drift) so defect order is deterministic.

use sanad_domain::{
    reconcile, ClaimId, Defect, DefectKind, EvidenceItem, NodeIndex, OutputRef, TransformKind,
    TransmissionChain,
};
use std::collections::{BTreeMap, BTreeSet};

/// Inspects a chain for structural faults
#[derive(Debug, Clone, Default)]
pub struct IlalDetector;

impl IlalDetector {
    /// Create a detector
    pub fn new() -> Self {
        Self
    }

    /// Run every check
    pub fn detect(
        &self,
        claim_id: ClaimId,
        chain: &TransmissionChain,
        items: &[EvidenceItem],
    ) -> Vec<Defect> {
        let mut defects = Vec::new();
        defects.extend(self.breaks(claim_id, chain, items));
        defects.extend(self.grafts(claim_id, chain));
        defects.extend(self.chronology(claim_id, chain, items));
        defects.extend(self.version_drift(claim_id, chain, items));
        tracing::debug!(claim_id = %claim_id, findings = defects.len(), "Chain inspection complete");
        defects
    }

    /// Unresolved references, root and terminal count, terminal output
    pub fn breaks(
        &self,
        claim_id: ClaimId,
        chain: &TransmissionChain,
        items: &[EvidenceItem],
    ) -> Vec<Defect> {
        let mut defects = Vec::new();

        for unresolved in chain.unresolved() {
            let node = &chain.node(unresolved.node).node_id;
            defects.push(
                Defect::open(
                    claim_id,
                    DefectKind::BrokenChain,
                    &format!("unresolved/{}/{}", node, unresolved.reference),
                    format!("Node '{}' consumes unknown node '{}'", node, unresolved.reference),
                )
                .with_nodes([node.clone()]),
            );
        }

        let known: BTreeSet<&str> = items.iter().map(|i| i.evidence_id()).collect();
        for idx in chain.indices() {
            let node = chain.node(idx);
            for evidence in node.evidence_inputs() {
                if !known.contains(evidence) {
                    defects.push(
                        Defect::open(
                            claim_id,
                            DefectKind::BrokenChain,
                            &format!("missing-evidence/{}/{}", node.node_id, evidence),
                            format!("Node '{}' consumes unknown evidence '{}'", node.node_id, evidence),
                        )
                        .with_nodes([node.node_id.clone()])
                        .with_evidence([evidence]),
                    );
                }
            }
        }

        if chain.is_empty() {
            defects.push(Defect::open(
                claim_id,
                DefectKind::BrokenChain,
                "roots/none",
                "Claim has no transmission chain",
            ));
            return defects;
        }

        let roots = chain.roots();
        match roots.len() {
            0 => defects.push(Defect::open(
                claim_id,
                DefectKind::BrokenChain,
                "roots/none",
                "Chain has no root node",
            )),
            1 => {}
            n => defects.push(
                Defect::open(
                    claim_id,
                    DefectKind::BrokenChain,
                    "roots/multiple",
                    format!("Chain has {} root nodes", n),
                )
                .with_nodes(self.node_ids(chain, &roots)),
            ),
        }

        let terminals = chain.terminals();
        match terminals.as_slice() {
            [] => defects.push(Defect::open(
                claim_id,
                DefectKind::BrokenChain,
                "terminals/none",
                "Chain has no terminal node",
            )),
            [terminal] => {
                let node = chain.node(*terminal);
                if node.output != OutputRef::Claim(claim_id) {
                    defects.push(
                        Defect::open(
                            claim_id,
                            DefectKind::BrokenChain,
                            &format!("terminal/{}", node.node_id),
                            format!("Terminal node '{}' does not produce the claim", node.node_id),
                        )
                        .with_nodes([node.node_id.clone()]),
                    );
                }
            }
            many => defects.push(
                Defect::open(
                    claim_id,
                    DefectKind::BrokenChain,
                    "terminals/multiple",
                    format!("Chain has {} terminal nodes", many.len()),
                )
                .with_nodes(self.node_ids(chain, many)),
            ),
        }

        defects
    }

    /// Cycles, duplicated outputs, and the claim consumed again
    pub fn grafts(&self, claim_id: ClaimId, chain: &TransmissionChain) -> Vec<Defect> {
        let mut defects = Vec::new();

        for (from, to) in chain.cycle_edges() {
            let from = &chain.node(from).node_id;
            let to = &chain.node(to).node_id;
            defects.push(
                Defect::open(
                    claim_id,
                    DefectKind::ChainGrafting,
                    &format!("cycle/{}/{}", from, to),
                    format!("Edge '{}' -> '{}' closes a cycle", from, to),
                )
                .with_nodes([from.clone(), to.clone()]),
            );
        }

        let mut producers: BTreeMap<&OutputRef, Vec<NodeIndex>> = BTreeMap::new();
        for idx in chain.indices() {
            producers.entry(&chain.node(idx).output).or_default().push(idx);
        }
        for (output, nodes) in producers {
            if nodes.len() < 2 {
                continue;
            }
            let label = match output {
                OutputRef::Claim(id) => format!("claim:{}", id),
                OutputRef::Value(v) => format!("value:{}", v),
            };
            let reappears_as_root = nodes.iter().any(|&n| chain.node(n).is_root());
            let detail = if reappears_as_root {
                "reappears as an unrelated root"
            } else {
                "is produced by several nodes"
            };
            defects.push(
                Defect::open(
                    claim_id,
                    DefectKind::ChainGrafting,
                    &format!("output/{}", label),
                    format!("Output '{}' {}", label, detail),
                )
                .with_nodes(self.node_ids(chain, &nodes)),
            );
        }

        for idx in chain.indices() {
            let node = chain.node(idx);
            if node.output == OutputRef::Claim(claim_id) && !chain.successors(idx).is_empty() {
                defects.push(
                    Defect::open(
                        claim_id,
                        DefectKind::ChainGrafting,
                        &format!("claim-consumed/{}", node.node_id),
                        format!("Claim produced by '{}' is consumed again", node.node_id),
                    )
                    .with_nodes(
                        std::iter::once(node.node_id.clone())
                            .chain(self.node_ids(chain, chain.successors(idx))),
                    ),
                );
            }
        }

        defects
    }

    /// Nodes happening before their predecessors or their evidence
    pub fn chronology(
        &self,
        claim_id: ClaimId,
        chain: &TransmissionChain,
        items: &[EvidenceItem],
    ) -> Vec<Defect> {
        let mut defects = Vec::new();
        let retrieved: BTreeMap<&str, u64> = items
            .iter()
            .map(|i| (i.evidence_id(), i.retrieval_time()))
            .collect();

        for idx in chain.indices() {
            let node = chain.node(idx);
            for &pred in chain.predecessors(idx) {
                let before = chain.node(pred);
                if node.occurred_at < before.occurred_at {
                    defects.push(
                        Defect::open(
                            claim_id,
                            DefectKind::ChronologyImpossible,
                            &format!("order/{}/{}", before.node_id, node.node_id),
                            format!(
                                "Node '{}' at {} precedes its predecessor '{}' at {}",
                                node.node_id, node.occurred_at, before.node_id, before.occurred_at
                            ),
                        )
                        .with_nodes([before.node_id.clone(), node.node_id.clone()]),
                    );
                }
            }
            for evidence in node.evidence_inputs() {
                if let Some(&at) = retrieved.get(evidence) {
                    if node.occurred_at < at {
                        defects.push(
                            Defect::open(
                                claim_id,
                                DefectKind::ChronologyImpossible,
                                &format!("retrieval/{}/{}", evidence, node.node_id),
                                format!(
                                    "Node '{}' at {} precedes retrieval of '{}' at {}",
                                    node.node_id, node.occurred_at, evidence, at
                                ),
                            )
                            .with_nodes([node.node_id.clone()])
                            .with_evidence([evidence]),
                        );
                    }
                }
            }
        }

        defects
    }

    /// Silent content and value changes within one logical source
    pub fn version_drift(
        &self,
        claim_id: ClaimId,
        chain: &TransmissionChain,
        items: &[EvidenceItem],
    ) -> Vec<Defect> {
        let mut by_source: BTreeMap<(&str, &str), Vec<&EvidenceItem>> = BTreeMap::new();
        for item in items {
            by_source
                .entry((item.source_system(), item.upstream_origin_id()))
                .or_default()
                .push(item);
        }

        let corrected: BTreeSet<&str> = chain
            .nodes()
            .iter()
            .filter(|n| n.transform_kind == TransformKind::Correction)
            .flat_map(|n| n.evidence_inputs())
            .collect();

        let mut defects = Vec::new();
        for ((system, origin), mut observations) in by_source {
            observations.sort_by(|a, b| {
                a.retrieval_time()
                    .cmp(&b.retrieval_time())
                    .then_with(|| a.evidence_id().cmp(b.evidence_id()))
            });
            for pair in observations.windows(2) {
                let (earlier, later) = (pair[0], pair[1]);
                let (Some(h1), Some(h2)) = (earlier.content_hash(), later.content_hash()) else {
                    continue;
                };
                let (Some(v1), Some(v2)) = (earlier.asserted_value(), later.asserted_value()) else {
                    continue;
                };
                if h1 == h2 || reconcile(v1, v2, 0.0).agrees() {
                    continue;
                }
                if corrected.contains(later.evidence_id()) {
                    continue;
                }
                defects.push(
                    Defect::open(
                        claim_id,
                        DefectKind::VersionDrift,
                        &format!("drift/{}/{}/{}", system, origin, later.evidence_id()),
                        format!(
                            "Source {}/{} changed from {} to {} without a correction",
                            system, origin, v1, v2
                        ),
                    )
                    .with_evidence([earlier.evidence_id(), later.evidence_id()]),
                );
            }
        }
        defects
    }

    fn node_ids(&self, chain: &TransmissionChain, nodes: &[NodeIndex]) -> Vec<String> {
        nodes.iter().map(|&n| chain.node(n).node_id.clone()).collect()
    }
}
