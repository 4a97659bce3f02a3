//! Deadlock detection over a resource-allocation graph.
//!
//! # Design
//!
//! - **Witness cycle**: [`find_cycle`] runs an iterative DFS from every
//!   unvisited node in first-seen order. The active path is kept as an
//!   explicit stack plus a node → path-position map, so when an edge reaches
//!   a node already on the path the cycle is the path slice from that node
//!   onward plus the closing edge. No call-stack recursion is involved.
//! - **Deadlocked sets**: [`find_deadlocked_sets`] reports every strongly
//!   connected component that contains a cycle, via Tarjan's SCC.
//! - **O(V+E)**: each node is entered once and each edge examined once.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use fixedbitset::FixedBitSet;
use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::build::{Edge, ResourceGraph};

/// Result of a `detect-deadlock` call.
///
/// Serializes to `{"deadlock_detected": bool, "cycle": [[from, to], ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlockReport {
    pub deadlock_detected: bool,
    pub cycle: Vec<Edge>,
}

impl DeadlockReport {
    /// Distinct nodes on the reported cycle, in traversal order.
    #[must_use]
    pub fn cycle_nodes(&self) -> Vec<&str> {
        self.cycle.iter().map(|(from, _)| from.as_str()).collect()
    }

    /// Report for an already-built graph.
    #[must_use]
    pub fn from_graph(graph: &ResourceGraph) -> Self {
        find_cycle(graph).map_or_else(Self::default, |cycle| Self {
            deadlock_detected: true,
            cycle,
        })
    }

    /// Returns `true` if the witness is a single node waiting on itself.
    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        matches!(self.cycle.as_slice(), [(from, to)] if from == to)
    }
}

/// Build the graph for `edges` and look for a wait-for cycle.
#[must_use]
pub fn detect_deadlock(edges: &[Edge]) -> DeadlockReport {
    DeadlockReport::from_graph(&ResourceGraph::from_edges(edges))
}

struct Frame {
    node: NodeIndex,
    successors: Vec<NodeIndex>,
    cursor: usize,
}

/// Find one cycle, as the ordered edges from its entry point back to itself.
///
/// Returns `None` when the graph is acyclic. Components are scanned in
/// first-seen order of their first node until a cycle turns up.
#[instrument(skip_all, fields(nodes = graph.node_count(), edges = graph.edge_count()))]
#[must_use]
pub fn find_cycle(graph: &ResourceGraph) -> Option<Vec<Edge>> {
    let g = &graph.graph;
    let mut visited = FixedBitSet::with_capacity(g.node_count());
    let mut path: Vec<NodeIndex> = Vec::new();
    let mut on_path: HashMap<NodeIndex, usize> = HashMap::new();
    let mut stack: Vec<Frame> = Vec::new();

    for start in g.node_indices() {
        if visited.put(start.index()) {
            continue;
        }
        on_path.insert(start, path.len());
        path.push(start);
        stack.push(Frame {
            node: start,
            successors: graph.successors(start),
            cursor: 0,
        });

        while let Some(frame) = stack.last_mut() {
            let current = frame.node;
            let Some(&next) = frame.successors.get(frame.cursor) else {
                stack.pop();
                path.pop();
                on_path.remove(&current);
                continue;
            };
            frame.cursor += 1;

            if let Some(&entry) = on_path.get(&next) {
                let mut cycle: Vec<Edge> = path[entry..]
                    .windows(2)
                    .map(|pair| (g[pair[0]].clone(), g[pair[1]].clone()))
                    .collect();
                cycle.push((g[current].clone(), g[next].clone()));
                debug!(length = cycle.len(), entry = g[next].as_str(), "cycle closed");
                return Some(cycle);
            }

            if !visited.put(next.index()) {
                on_path.insert(next, path.len());
                path.push(next);
                stack.push(Frame {
                    node: next,
                    successors: graph.successors(next),
                    cursor: 0,
                });
            }
        }
    }

    debug!("graph is acyclic");
    None
}

/// Every set of nodes caught in a wait-for cycle.
///
/// Each entry is the sorted member list of one strongly connected component
/// with more than one node, or a single node with a self-loop. Entries are
/// sorted.
#[must_use]
pub fn find_deadlocked_sets(graph: &ResourceGraph) -> Vec<Vec<String>> {
    let g = &graph.graph;
    let mut sets: Vec<Vec<String>> = tarjan_scc(g)
        .into_iter()
        .filter(|component| {
            component.len() > 1 || component.first().is_some_and(|&node| g.contains_edge(node, node))
        })
        .map(|component| {
            let mut ids: Vec<String> = component.into_iter().map(|idx| g[idx].clone()).collect();
            ids.sort_unstable();
            ids
        })
        .collect();

    sets.sort_unstable();
    sets
}
