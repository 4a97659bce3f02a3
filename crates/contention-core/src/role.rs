//! Process/resource classification of graph node ids.
//!
//! Roles come from a naming convention (`P1` is a process, `R1` a resource)
//! and only feed presentation: Coffman-condition reports and human output.
//! Cycle detection never looks at them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What a resource-allocation graph node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    Process,
    Resource,
    Unknown,
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Process => "process",
            Self::Resource => "resource",
            Self::Unknown => "unknown",
        })
    }
}

/// Prefix convention used to classify node ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleConvention {
    #[serde(default = "default_process_prefix")]
    pub process_prefix: String,
    #[serde(default = "default_resource_prefix")]
    pub resource_prefix: String,
}

impl Default for RoleConvention {
    fn default() -> Self {
        Self {
            process_prefix: default_process_prefix(),
            resource_prefix: default_resource_prefix(),
        }
    }
}

impl RoleConvention {
    /// Classify `node`. Empty prefixes never match; when one prefix extends
    /// the other, the longer one wins.
    #[must_use]
    pub fn classify(&self, node: &str) -> NodeRole {
        let mut candidates = [
            (self.process_prefix.as_str(), NodeRole::Process),
            (self.resource_prefix.as_str(), NodeRole::Resource),
        ];
        candidates.sort_by_key(|(prefix, _)| std::cmp::Reverse(prefix.len()));

        candidates
            .into_iter()
            .find(|(prefix, _)| !prefix.is_empty() && node.starts_with(*prefix))
            .map_or(NodeRole::Unknown, |(_, role)| role)
    }
}

fn default_process_prefix() -> String {
    "P".to_string()
}

fn default_resource_prefix() -> String {
    "R".to_string()
}
