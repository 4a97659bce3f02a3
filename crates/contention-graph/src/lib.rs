//! Resource-allocation graph analysis for contention.
//!
//! # Overview
//!
//! ```text
//! [[from, to], ...]
//!        ↓  build::ResourceGraph::from_edges()
//! ResourceGraph (DiGraph, first-seen order, duplicates collapsed)
//!        ├─ cycles::find_cycle()            one witness cycle
//!        ├─ cycles::find_deadlocked_sets()  every cyclic SCC
//!        ├─ conditions::CoffmanConditions   role-based presentation report
//!        └─ stats::GraphStats               node/edge/role counts
//! ```
//!
//! [`detect_deadlock`] is the one-call entry point producing the
//! `{deadlock_detected, cycle}` report.

pub mod build;
pub mod conditions;
pub mod cycles;
pub mod stats;

pub use build::{DeadlockRequest, Edge, ResourceGraph};
pub use conditions::{CoffmanConditions, EdgeKind};
pub use cycles::{DeadlockReport, detect_deadlock, find_cycle, find_deadlocked_sets};
pub use stats::GraphStats;
