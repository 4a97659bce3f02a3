//! Coffman-condition report for a resource-allocation graph.
//!
//! The four necessary conditions for deadlock, read off a role-classified
//! edge list:
//!
//! | condition         | holds when                                           |
//! |-------------------|------------------------------------------------------|
//! | mutual exclusion  | some resource is held (resource → process edge)      |
//! | hold and wait     | some process holds a resource and requests another   |
//! | no preemption     | same as hold and wait; held units are never revoked  |
//! | circular wait     | the graph has a cycle                                |
//!
//! This is presentation: it depends on the role naming convention, and
//! `circular_wait` alone decides whether a deadlock was detected.

use std::collections::BTreeSet;

use contention_core::{NodeRole, RoleConvention};
use serde::{Deserialize, Serialize};

use crate::build::ResourceGraph;
use crate::cycles::find_cycle;

/// What one edge means under a role convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// process → resource: a pending request.
    Request,
    /// resource → process: a held allocation.
    Assignment,
    /// Anything else (process → process, unknown roles, …).
    Other,
}

impl EdgeKind {
    #[must_use]
    pub fn classify(roles: &RoleConvention, from: &str, to: &str) -> Self {
        match (roles.classify(from), roles.classify(to)) {
            (NodeRole::Process, NodeRole::Resource) => Self::Request,
            (NodeRole::Resource, NodeRole::Process) => Self::Assignment,
            _ => Self::Other,
        }
    }

    /// Human phrase for `from → to`, e.g. `P1 requests R1`.
    #[must_use]
    pub fn describe(self, from: &str, to: &str) -> String {
        match self {
            Self::Request => format!("{from} requests {to}"),
            Self::Assignment => format!("{from} is held by {to}"),
            Self::Other => format!("{from} -> {to}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoffmanConditions {
    pub mutual_exclusion: bool,
    pub hold_and_wait: bool,
    pub no_preemption: bool,
    pub circular_wait: bool,
    /// Processes that hold at least one resource while requesting another.
    pub holding_and_waiting: Vec<String>,
}

impl CoffmanConditions {
    #[must_use]
    pub fn analyze(graph: &ResourceGraph, roles: &RoleConvention) -> Self {
        let mut held_resources: BTreeSet<String> = BTreeSet::new();
        let mut holders: BTreeSet<String> = BTreeSet::new();
        let mut waiters: BTreeSet<String> = BTreeSet::new();

        for (from, to) in graph.edges() {
            match EdgeKind::classify(roles, &from, &to) {
                EdgeKind::Request => {
                    waiters.insert(from);
                }
                EdgeKind::Assignment => {
                    held_resources.insert(from);
                    holders.insert(to);
                }
                EdgeKind::Other => {}
            }
        }

        let holding_and_waiting: Vec<String> = holders.intersection(&waiters).cloned().collect();
        let hold_and_wait = !holding_and_waiting.is_empty();

        Self {
            mutual_exclusion: !held_resources.is_empty(),
            hold_and_wait,
            no_preemption: hold_and_wait,
            circular_wait: find_cycle(graph).is_some(),
            holding_and_waiting,
        }
    }

    /// Returns `true` when all four conditions hold at once.
    #[must_use]
    pub const fn all_hold(&self) -> bool {
        self.mutual_exclusion && self.hold_and_wait && self.no_preemption && self.circular_wait
    }
}
