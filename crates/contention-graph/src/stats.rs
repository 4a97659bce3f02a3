//! Summary counts for a resource-allocation graph.

use contention_core::{NodeRole, RoleConvention};
use serde::{Deserialize, Serialize};

use crate::build::ResourceGraph;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    /// Distinct edges; duplicates in the input are not counted.
    pub edge_count: usize,
    pub process_count: usize,
    pub resource_count: usize,
    pub unknown_count: usize,
}

impl GraphStats {
    #[must_use]
    pub fn from_graph(graph: &ResourceGraph, roles: &RoleConvention) -> Self {
        let mut stats = Self {
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            ..Self::default()
        };

        for id in graph.node_ids() {
            match roles.classify(id) {
                NodeRole::Process => stats.process_count += 1,
                NodeRole::Resource => stats.resource_count += 1,
                NodeRole::Unknown => stats.unknown_count += 1,
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_roles_and_distinct_edges() {
        let edges = vec![
            ("P1".to_string(), "R1".to_string()),
            ("P1".to_string(), "R1".to_string()),
            ("R1".to_string(), "P2".to_string()),
            ("P2".to_string(), "lock".to_string()),
        ];
        let graph = ResourceGraph::from_edges(&edges);

        assert_eq!(
            GraphStats::from_graph(&graph, &RoleConvention::default()),
            GraphStats {
                node_count: 4,
                edge_count: 3,
                process_count: 2,
                resource_count: 1,
                unknown_count: 1,
            }
        );
    }
}
