//! Transmission chain - the provenance graph of a claim
//!
//! Nodes live in an arena and refer to each other through [`NodeIndex`]
//! handles. Input references that name a missing node are kept aside as
//! unresolved rather than dropped, so structural faults (breaks, cycles,
//! grafts) are plain traversals over indices.

use crate::ClaimId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// A reference consumed by a transmission node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeRef {
    /// Output of a prior node
    Node(String),
    /// An evidence item from the snapshot
    Evidence(String),
    /// An external calculation or reference table
    External(String),
}

/// What a transmission node produces
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutputRef {
    /// The claim being graded
    Claim(ClaimId),
    /// An intermediate value
    Value(String),
}

/// Kind of transformation a node applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransformKind {
    /// Value read out of an artifact
    Extraction,
    /// Units, currency or period normalized
    Normalization,
    /// Several inputs combined
    Aggregation,
    /// Derived by formula
    Calculation,
    /// Explicit correction of an earlier observation
    Correction,
    /// Quoted from another document
    Citation,
}

/// One step in a claim's provenance chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransmissionNode {
    /// Identifier, unique within the chain
    pub node_id: String,

    /// What this step consumed
    pub inputs: Vec<NodeRef>,

    /// What this step produced
    pub output: OutputRef,

    /// Transformation applied
    pub transform_kind: TransformKind,

    /// Person or system performing the step
    pub actor_or_system: String,

    /// When the step happened (seconds since Unix epoch)
    pub occurred_at: u64,
}

impl TransmissionNode {
    /// Create a new node
    pub fn new(
        node_id: impl Into<String>,
        inputs: Vec<NodeRef>,
        output: OutputRef,
        transform_kind: TransformKind,
        actor_or_system: impl Into<String>,
        occurred_at: u64,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            inputs,
            output,
            transform_kind,
            actor_or_system: actor_or_system.into(),
            occurred_at,
        }
    }

    /// Evidence ids this node consumes directly
    pub fn evidence_inputs(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().filter_map(|r| match r {
            NodeRef::Evidence(id) => Some(id.as_str()),
            _ => None,
        })
    }

    /// Node ids this node declares as predecessors
    pub fn node_inputs(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().filter_map(|r| match r {
            NodeRef::Node(id) => Some(id.as_str()),
            _ => None,
        })
    }

    /// Whether this node declares no node predecessors
    pub fn is_root(&self) -> bool {
        self.node_inputs().next().is_none()
    }
}

/// Handle into the chain arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeIndex(u32);

impl NodeIndex {
    /// Position in the arena
    pub fn get(&self) -> usize {
        self.0 as usize
    }
}

/// A node input naming a node that is not in the chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedRef {
    /// Node declaring the reference
    pub node: NodeIndex,
    /// The missing node id
    pub reference: String,
}

/// Errors that make a chain structurally unusable (malformed input)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainBuildError {
    /// Two nodes share an id
    #[error("Duplicate transmission node id: {0}")]
    DuplicateNodeId(String),

    /// A node has an empty id
    #[error("Transmission node at position {0} has an empty id")]
    EmptyNodeId(usize),
}

/// Arena-backed provenance graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TransmissionNode>", into = "Vec<TransmissionNode>")]
pub struct TransmissionChain {
    nodes: Vec<TransmissionNode>,
    by_id: BTreeMap<String, NodeIndex>,
    predecessors: Vec<Vec<NodeIndex>>,
    successors: Vec<Vec<NodeIndex>>,
    unresolved: Vec<(NodeIndex, String)>,
}

impl TransmissionChain {
    /// Build the arena from nodes in declaration order
    ///
    /// # Errors
    /// Returns an error if a node id is empty or duplicated. Unresolved
    /// references and cycles are *not* errors here; they are findings for
    /// the chain detector.
    pub fn build(nodes: Vec<TransmissionNode>) -> Result<Self, ChainBuildError> {
        let mut by_id = BTreeMap::new();
        for (pos, node) in nodes.iter().enumerate() {
            if node.node_id.trim().is_empty() {
                return Err(ChainBuildError::EmptyNodeId(pos));
            }
            if by_id.insert(node.node_id.clone(), NodeIndex(pos as u32)).is_some() {
                return Err(ChainBuildError::DuplicateNodeId(node.node_id.clone()));
            }
        }

        let mut predecessors = vec![Vec::new(); nodes.len()];
        let mut successors = vec![Vec::new(); nodes.len()];
        let mut unresolved = Vec::new();

        for (pos, node) in nodes.iter().enumerate() {
            let this = NodeIndex(pos as u32);
            for input in node.node_inputs() {
                match by_id.get(input) {
                    Some(&pred) => {
                        if !predecessors[pos].contains(&pred) {
                            predecessors[pos].push(pred);
                            successors[pred.get()].push(this);
                        }
                    }
                    None => unresolved.push((this, input.to_string())),
                }
            }
        }

        Ok(Self {
            nodes,
            by_id,
            predecessors,
            successors,
            unresolved,
        })
    }

    /// An empty chain
    pub fn empty() -> Self {
        Self {
            nodes: Vec::new(),
            by_id: BTreeMap::new(),
            predecessors: Vec::new(),
            successors: Vec::new(),
            unresolved: Vec::new(),
        }
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the chain has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All handles in declaration order
    pub fn indices(&self) -> impl Iterator<Item = NodeIndex> {
        (0..self.nodes.len() as u32).map(NodeIndex)
    }

    /// Node behind a handle
    pub fn node(&self, idx: NodeIndex) -> &TransmissionNode {
        &self.nodes[idx.get()]
    }

    /// All nodes in declaration order
    pub fn nodes(&self) -> &[TransmissionNode] {
        &self.nodes
    }

    /// Look up a node by id
    pub fn find(&self, node_id: &str) -> Option<NodeIndex> {
        self.by_id.get(node_id).copied()
    }

    /// Resolved predecessors of a node
    pub fn predecessors(&self, idx: NodeIndex) -> &[NodeIndex] {
        &self.predecessors[idx.get()]
    }

    /// Nodes consuming this node's output
    pub fn successors(&self, idx: NodeIndex) -> &[NodeIndex] {
        &self.successors[idx.get()]
    }

    /// Node references that do not resolve
    pub fn unresolved(&self) -> Vec<UnresolvedRef> {
        self.unresolved
            .iter()
            .map(|(node, reference)| UnresolvedRef {
                node: *node,
                reference: reference.clone(),
            })
            .collect()
    }

    /// Nodes that declare no node inputs
    pub fn roots(&self) -> Vec<NodeIndex> {
        self.indices().filter(|&i| self.node(i).is_root()).collect()
    }

    /// Nodes whose output nobody consumes
    pub fn terminals(&self) -> Vec<NodeIndex> {
        self.indices().filter(|&i| self.successors(i).is_empty()).collect()
    }

    /// Nodes consuming the given evidence item directly
    pub fn consumers_of_evidence(&self, evidence_id: &str) -> Vec<NodeIndex> {
        self.indices()
            .filter(|&i| self.node(i).evidence_inputs().any(|e| e == evidence_id))
            .collect()
    }

    /// Every node reachable downstream of `start` (excluding `start` unless
    /// it lies on a cycle)
    pub fn reachable_from(&self, start: NodeIndex) -> BTreeSet<NodeIndex> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<NodeIndex> = self.successors(start).to_vec();
        while let Some(next) = stack.pop() {
            if seen.insert(next) {
                stack.extend_from_slice(self.successors(next));
            }
        }
        seen
    }

    /// Edges `(from, to)` that close a cycle, found by depth-first search
    /// in declaration order
    pub fn cycle_edges(&self) -> Vec<(NodeIndex, NodeIndex)> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Active,
            Done,
        }

        let mut marks = vec![Mark::New; self.nodes.len()];
        let mut back_edges = Vec::new();

        for start in self.indices() {
            if marks[start.get()] != Mark::New {
                continue;
            }
            // (node, next successor position)
            let mut stack: Vec<(NodeIndex, usize)> = vec![(start, 0)];
            marks[start.get()] = Mark::Active;

            while let Some(frame) = stack.last_mut() {
                let (node, pos) = *frame;
                let succs = self.successors(node);
                if pos < succs.len() {
                    frame.1 += 1;
                    let next = succs[pos];
                    match marks[next.get()] {
                        Mark::New => {
                            marks[next.get()] = Mark::Active;
                            stack.push((next, 0));
                        }
                        Mark::Active => back_edges.push((node, next)),
                        Mark::Done => {}
                    }
                } else {
                    marks[node.get()] = Mark::Done;
                    stack.pop();
                }
            }
        }

        back_edges
    }

    /// Whether the resolved graph is acyclic
    pub fn is_acyclic(&self) -> bool {
        self.cycle_edges().is_empty()
    }

    /// Number of weakly connected components over resolved edges
    pub fn component_count(&self) -> usize {
        let mut seen = vec![false; self.nodes.len()];
        let mut components = 0;
        for start in self.indices() {
            if seen[start.get()] {
                continue;
            }
            components += 1;
            let mut stack = vec![start];
            seen[start.get()] = true;
            while let Some(n) = stack.pop() {
                for &m in self.predecessors(n).iter().chain(self.successors(n)) {
                    if !seen[m.get()] {
                        seen[m.get()] = true;
                        stack.push(m);
                    }
                }
            }
        }
        components
    }
}

impl TryFrom<Vec<TransmissionNode>> for TransmissionChain {
    type Error = ChainBuildError;

    fn try_from(nodes: Vec<TransmissionNode>) -> Result<Self, Self::Error> {
        Self::build(nodes)
    }
}

impl From<TransmissionChain> for Vec<TransmissionNode> {
    fn from(chain: TransmissionChain) -> Self {
        chain.nodes
    }
}

impl Default for TransmissionChain {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, inputs: Vec<NodeRef>, at: u64) -> TransmissionNode {
        TransmissionNode::new(
            id,
            inputs,
            OutputRef::Value(format!("{}-out", id)),
            TransformKind::Extraction,
            "extractor:v1",
            at,
        )
    }

    fn n(id: &str) -> NodeRef {
        NodeRef::Node(id.to_string())
    }

    fn e(id: &str) -> NodeRef {
        NodeRef::Evidence(id.to_string())
    }

    #[test]
    fn test_linear_chain() {
        let chain = TransmissionChain::build(vec![
            node("a", vec![e("ev-1")], 10),
            node("b", vec![n("a")], 20),
            node("c", vec![n("b")], 30),
        ])
        .unwrap();

        assert_eq!(chain.roots(), vec![NodeIndex(0)]);
        assert_eq!(chain.terminals(), vec![NodeIndex(2)]);
        assert!(chain.is_acyclic());
        assert_eq!(chain.component_count(), 1);
        assert!(chain.unresolved().is_empty());
        assert_eq!(chain.reachable_from(NodeIndex(0)).len(), 2);
    }

    #[test]
    fn test_unresolved_reference_is_kept() {
        let chain = TransmissionChain::build(vec![
            node("a", vec![e("ev-1")], 10),
            node("b", vec![n("a"), n("ghost")], 20),
        ])
        .unwrap();

        let unresolved = chain.unresolved();
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].reference, "ghost");
        assert_eq!(unresolved[0].node, NodeIndex(1));
    }

    #[test]
    fn test_cycle_detection() {
        let chain = TransmissionChain::build(vec![
            node("a", vec![e("ev-1")], 10),
            node("b", vec![n("a"), n("c")], 20),
            node("c", vec![n("b")], 30),
        ])
        .unwrap();

        assert!(!chain.is_acyclic());
        assert_eq!(chain.cycle_edges().len(), 1);
    }

    #[test]
    fn test_self_loop_is_cycle() {
        let chain = TransmissionChain::build(vec![node("a", vec![e("ev-1"), n("a")], 10)]).unwrap();
        assert_eq!(chain.cycle_edges(), vec![(NodeIndex(0), NodeIndex(0))]);
        assert!(chain.roots().is_empty());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = TransmissionChain::build(vec![node("a", vec![], 1), node("a", vec![], 2)]);
        assert_eq!(result, Err(ChainBuildError::DuplicateNodeId("a".to_string())));
    }

    #[test]
    fn test_empty_id_rejected() {
        let result = TransmissionChain::build(vec![node(" ", vec![], 1)]);
        assert_eq!(result, Err(ChainBuildError::EmptyNodeId(0)));
    }

    #[test]
    fn test_components() {
        let chain = TransmissionChain::build(vec![
            node("a", vec![e("ev-1")], 10),
            node("b", vec![e("ev-2")], 10),
        ])
        .unwrap();
        assert_eq!(chain.component_count(), 2);
        assert_eq!(chain.roots().len(), 2);
    }

    #[test]
    fn test_consumers_of_evidence() {
        let chain = TransmissionChain::build(vec![
            node("a", vec![e("ev-1"), e("ev-2")], 10),
            node("b", vec![n("a"), e("ev-2")], 20),
        ])
        .unwrap();
        assert_eq!(chain.consumers_of_evidence("ev-2"), vec![NodeIndex(0), NodeIndex(1)]);
        assert!(chain.consumers_of_evidence("ev-9").is_empty());
    }

    #[test]
    fn test_serde_round_trip_rebuilds_arena() {
        let chain = TransmissionChain::build(vec![
            node("a", vec![e("ev-1")], 10),
            node("b", vec![n("a")], 20),
        ])
        .unwrap();
        let json = serde_json::to_string(&chain).unwrap();
        let back: TransmissionChain = serde_json::from_str(&json).unwrap();
        assert_eq!(back.successors(NodeIndex(0)), &[NodeIndex(1)]);
    }
}
