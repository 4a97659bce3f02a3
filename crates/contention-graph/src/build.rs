//! Resource-allocation graph construction from an edge list.
//!
//! # Edge Direction
//!
//! An edge `A → B` is taken exactly as given. By convention a
//! process → resource edge is a pending request and a resource → process
//! edge is a held allocation, but nothing here depends on that: every node
//! is an opaque string id.
//!
//! ## Ordering
//!
//! Nodes get petgraph indices in first-seen order and edges get edge
//! indices in first-seen order. Traversals that walk nodes by index and
//! successors by edge index are therefore reproducible for a given input.
//!
//! ## Duplicates
//!
//! Repeated `(from, to)` pairs collapse onto the first occurrence.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A directed `(from, to)` pair. Serializes as a two-element JSON array.
pub type Edge = (String, String);

/// Body of a `detect-deadlock` call: `{"resource_allocation": [[from, to], ...]}`.
///
/// A missing `resource_allocation` field is treated as an empty edge list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlockRequest {
    #[serde(default)]
    pub resource_allocation: Vec<Edge>,
}

// ---------------------------------------------------------------------------
// ResourceGraph
// ---------------------------------------------------------------------------

/// A directed resource-allocation graph built fresh from one edge list.
#[derive(Debug)]
pub struct ResourceGraph {
    /// Directed graph: nodes = ids, edges = request/allocation relations.
    pub graph: DiGraph<String, ()>,
    /// Mapping from node id to petgraph `NodeIndex`.
    pub node_map: HashMap<String, NodeIndex>,
    /// BLAKE3 hash of the deduplicated edge list, in first-seen order.
    pub content_hash: String,
}

impl ResourceGraph {
    /// Build a [`ResourceGraph`] from `(from, to)` pairs.
    #[instrument(skip_all, fields(edges = edges.len()))]
    pub fn from_edges(edges: &[Edge]) -> Self {
        let mut graph = DiGraph::<String, ()>::new();
        let mut node_map: HashMap<String, NodeIndex> = HashMap::new();
        let mut hasher = blake3::Hasher::new();

        for (from, to) in edges {
            let from_idx = *node_map
                .entry(from.clone())
                .or_insert_with(|| graph.add_node(from.clone()));
            let to_idx = *node_map
                .entry(to.clone())
                .or_insert_with(|| graph.add_node(to.clone()));

            // Avoid duplicate edges (petgraph allows them by default).
            if !graph.contains_edge(from_idx, to_idx) {
                graph.add_edge(from_idx, to_idx, ());
                hasher.update(from.as_bytes());
                hasher.update(b"\x00");
                hasher.update(to.as_bytes());
                hasher.update(b"\n");
            }
        }

        Self {
            graph,
            node_map,
            content_hash: format!("blake3:{}", hasher.finalize().to_hex()),
        }
    }

    /// Return the number of distinct nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of distinct edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Look up the `NodeIndex` for a node id.
    #[must_use]
    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }

    /// Return the id label for a node.
    #[must_use]
    pub fn node_id(&self, idx: NodeIndex) -> Option<&str> {
        self.graph.node_weight(idx).map(String::as_str)
    }

    /// Node ids in first-seen order.
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(String::as_str)
    }

    /// Deduplicated edges in first-seen order.
    #[must_use]
    pub fn edges(&self) -> Vec<Edge> {
        self.graph
            .edge_references()
            .map(|edge| {
                (
                    self.graph[edge.source()].clone(),
                    self.graph[edge.target()].clone(),
                )
            })
            .collect()
    }

    /// Outgoing neighbors of `node`, in the order their edges were first seen.
    ///
    /// petgraph yields adjacency most-recent-first, so this re-sorts by
    /// edge index.
    #[must_use]
    pub fn successors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut out: Vec<_> = self
            .graph
            .edges(node)
            .map(|edge| (edge.id(), edge.target()))
            .collect();
        out.sort_unstable_by_key(|(id, _)| *id);
        out.into_iter().map(|(_, target)| target).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges(pairs: &[(&str, &str)]) -> Vec<Edge> {
        pairs
            .iter()
            .map(|(a, b)| ((*a).to_string(), (*b).to_string()))
            .collect()
    }

    #[test]
    fn nodes_follow_first_seen_order() {
        let g = ResourceGraph::from_edges(&edges(&[("P2", "R1"), ("R1", "P1"), ("P1", "R9")]));
        let ids: Vec<&str> = g.node_ids().collect();
        assert_eq!(ids, vec!["P2", "R1", "P1", "R9"]);
    }

    #[test]
    fn duplicate_edges_collapse() {
        let g = ResourceGraph::from_edges(&edges(&[("P1", "R1"), ("P1", "R1"), ("R1", "P1")]));
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.edges(), edges(&[("P1", "R1"), ("R1", "P1")]));
    }

    #[test]
    fn successors_keep_insertion_order() {
        let g = ResourceGraph::from_edges(&edges(&[("A", "B"), ("A", "C"), ("A", "D")]));
        let a = g.node_index("A").expect("A exists");
        let names: Vec<&str> = g
            .successors(a)
            .into_iter()
            .filter_map(|idx| g.node_id(idx))
            .collect();
        assert_eq!(names, vec!["B", "C", "D"]);
    }

    #[test]
    fn content_hash_ignores_duplicates_but_not_order() {
        let a = ResourceGraph::from_edges(&edges(&[("P1", "R1"), ("R1", "P2")]));
        let b = ResourceGraph::from_edges(&edges(&[("P1", "R1"), ("P1", "R1"), ("R1", "P2")]));
        let c = ResourceGraph::from_edges(&edges(&[("R1", "P2"), ("P1", "R1")]));
        assert_eq!(a.content_hash, b.content_hash);
        assert_ne!(a.content_hash, c.content_hash);
        assert!(a.content_hash.starts_with("blake3:"));
    }

    #[test]
    fn request_body_defaults_to_no_edges() {
        let req: DeadlockRequest = serde_json::from_str("{}").expect("parse");
        assert!(req.resource_allocation.is_empty());

        let req: DeadlockRequest =
            serde_json::from_str(r#"{"resource_allocation": [["P1", "R1"]]}"#).expect("parse");
        assert_eq!(req.resource_allocation, edges(&[("P1", "R1")]));
    }

    #[test]
    fn three_element_pairs_are_rejected() {
        let parsed =
            serde_json::from_str::<DeadlockRequest>(r#"{"resource_allocation": [["P1", "R1", "x"]]}"#);
        assert!(parsed.is_err());
    }
}
