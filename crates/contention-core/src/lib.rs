//! contention-core library.
//!
//! Allocation-state snapshots, the Banker's-algorithm safety checker and the
//! error taxonomy shared by the rest of the workspace.
//!
//! # Conventions
//!
//! - **Errors**: library failures are typed `thiserror` enums
//!   ([`error::AnalysisError`]); config loading uses `anyhow::Result`.
//! - **Logging**: `tracing` macros only. Analyzer entry points are
//!   `#[instrument]`ed with the snapshot dimensions.
//! - **Purity**: analyzers borrow their input and own every intermediate;
//!   no state survives a call.

pub mod config;
pub mod error;
pub mod model;
pub mod role;
pub mod safety;

pub use error::{AnalysisError, ErrorCode};
pub use model::{AllocationState, Matrix, ResourceVector, SafetyRequest};
pub use role::{NodeRole, RoleConvention};
pub use safety::{
    ReplayError, RequestViolation, SafetyVerdict, check_safety, check_state, replay_sequence,
    search_state, tentative_grant,
};
