//! Deadlock avoidance via the Banker's algorithm.
//!
//! # Overview
//!
//! [`check_safety`] decides whether granting one pending request leaves the
//! system in a safe state, i.e. one from which every process can still run
//! to completion in some order without exceeding the free units.
//!
//! # Steps
//!
//! 1. Bounds gate: a request above the process's maximum claim or above the
//!    free units is [`SafetyVerdict::Denied`]. Nothing is simulated.
//! 2. Tentative grant on private copies (see [`tentative_grant`]).
//! 3. Safe-sequence search: `work` starts from the free units as submitted
//!    (before the grant) while needs and returned allocations use the
//!    granted rows (see [`search_state`]). Repeated passes scan the
//!    processes in index order. Within one pass every process whose need
//!    fits in `work` is admitted, its allocation is returned to `work`, and
//!    it joins the sequence. A pass that admits nobody ends the search.
//!
//! Caller snapshots are only borrowed. A [`SafetyVerdict::Deadlock`] never
//! leaves a half-granted world behind.

use std::fmt;

use fixedbitset::FixedBitSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{AnalysisError, ErrorCode};
use crate::model::{AllocationState, SafetyRequest};

// ---------------------------------------------------------------------------
// Verdicts
// ---------------------------------------------------------------------------

/// Outcome of a safety check.
///
/// Serializes to the wire shape `{"status": ..., "sequence"?: [...], "reason"?: "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum SafetyVerdict {
    /// Every process can finish; `sequence` is one completion order.
    #[serde(rename = "Safe")]
    Safe { sequence: Vec<usize> },

    /// The request broke a bound and was not simulated.
    #[serde(rename = "Denied")]
    Denied {
        reason: String,
        #[serde(skip)]
        violation: Option<RequestViolation>,
    },

    /// No further process can be guaranteed to finish; `sequence` holds the
    /// processes admitted before the search stalled.
    #[serde(rename = "Deadlock detected")]
    Deadlock { sequence: Vec<usize> },
}

impl SafetyVerdict {
    fn denied(violation: RequestViolation) -> Self {
        Self::Denied {
            reason: violation.to_string(),
            violation: Some(violation),
        }
    }

    /// Wire status string.
    #[must_use]
    pub const fn status(&self) -> &'static str {
        match self {
            Self::Safe { .. } => "Safe",
            Self::Denied { .. } => "Denied",
            Self::Deadlock { .. } => "Deadlock detected",
        }
    }

    #[must_use]
    pub const fn is_safe(&self) -> bool {
        matches!(self, Self::Safe { .. })
    }

    /// Completion order, full for `Safe` and partial for `Deadlock`.
    #[must_use]
    pub fn sequence(&self) -> Option<&[usize]> {
        match self {
            Self::Safe { sequence } | Self::Deadlock { sequence } => Some(sequence),
            Self::Denied { .. } => None,
        }
    }
}

/// Which bound a denied request broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestViolation {
    /// `request[resource] > max[process][resource]`.
    ExceedsMaxClaim {
        process: usize,
        resource: usize,
        requested: u64,
        max_claim: u64,
    },
    /// `request[resource] > available[resource]`.
    ExceedsAvailable {
        process: usize,
        resource: usize,
        requested: u64,
        available: u64,
    },
}

impl fmt::Display for RequestViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::ExceedsMaxClaim {
                process,
                resource,
                requested,
                max_claim,
            } => write!(
                f,
                "request exceeds maximum claim: process {process} asks for {requested} units of resource {resource} but claims at most {max_claim}"
            ),
            Self::ExceedsAvailable {
                process,
                resource,
                requested,
                available,
            } => write!(
                f,
                "request exceeds available resources: process {process} asks for {requested} units of resource {resource} but only {available} are free"
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Run the Banker's algorithm for one pending request.
///
/// # Errors
///
/// Returns an [`AnalysisError`] when the snapshot is malformed (misaligned
/// lengths, process index out of range) or the grant would overflow an
/// allocation. Denied requests and deadlocks are `Ok` verdicts.
#[instrument(
    skip_all,
    fields(
        processes = snapshot.state.process_count(),
        resources = snapshot.state.resource_count(),
        process = snapshot.process,
    )
)]
pub fn check_safety(snapshot: &SafetyRequest) -> Result<SafetyVerdict, AnalysisError> {
    snapshot.validate()?;

    if let Some(violation) = find_violation(snapshot) {
        debug!(%violation, "request denied");
        return Ok(SafetyVerdict::denied(violation));
    }

    let verdict = find_safe_sequence(&search_state(snapshot)?);
    debug!(status = verdict.status(), "safety check complete");
    Ok(verdict)
}

/// Run the safe-sequence search on a state with no pending request.
///
/// # Errors
///
/// Returns an [`AnalysisError`] when the state is malformed.
#[instrument(
    skip_all,
    fields(processes = state.process_count(), resources = state.resource_count())
)]
pub fn check_state(state: &AllocationState) -> Result<SafetyVerdict, AnalysisError> {
    state.validate()?;
    let verdict = find_safe_sequence(state);
    debug!(status = verdict.status(), "state check complete");
    Ok(verdict)
}

/// The state after granting `snapshot.request`, built on private copies.
///
/// `available` shrinks by the request and the requesting row grows by it.
/// Meant to be called once the bounds gate has passed; `available`
/// saturates at zero otherwise.
///
/// # Errors
///
/// Returns a shape error from [`SafetyRequest::validate`], or
/// [`AnalysisError::Overflow`] when an allocation would exceed `u64::MAX`.
pub fn tentative_grant(snapshot: &SafetyRequest) -> Result<AllocationState, AnalysisError> {
    snapshot.validate()?;

    let mut granted = snapshot.state.clone();
    let process = snapshot.process;

    for (resource, &requested) in snapshot.request.iter().enumerate() {
        granted.available[resource] = granted.available[resource].saturating_sub(requested);
        let held = &mut granted.allocation[process][resource];
        *held = held
            .checked_add(requested)
            .ok_or(AnalysisError::Overflow { process, resource })?;
    }

    Ok(granted)
}

/// The state the safe-sequence search of [`check_safety`] runs on.
///
/// Allocation rows are the granted ones from [`tentative_grant`];
/// `available` is the caller's vector from before the grant. A `Safe`
/// sequence replays against this state with [`replay_sequence`].
///
/// # Errors
///
/// Same as [`tentative_grant`].
pub fn search_state(snapshot: &SafetyRequest) -> Result<AllocationState, AnalysisError> {
    let granted = tentative_grant(snapshot)?;
    Ok(AllocationState {
        available: snapshot.state.available.clone(),
        ..granted
    })
}

// ---------------------------------------------------------------------------
// Algorithm internals
// ---------------------------------------------------------------------------

/// First bound the request breaks, scanning resources in index order.
///
/// For one resource the maximum claim is checked before availability.
fn find_violation(snapshot: &SafetyRequest) -> Option<RequestViolation> {
    let process = snapshot.process;
    let claims = &snapshot.state.max[process];

    snapshot
        .request
        .iter()
        .enumerate()
        .find_map(|(resource, &requested)| {
            let max_claim = claims[resource];
            let available = snapshot.state.available[resource];
            if requested > max_claim {
                Some(RequestViolation::ExceedsMaxClaim {
                    process,
                    resource,
                    requested,
                    max_claim,
                })
            } else if requested > available {
                Some(RequestViolation::ExceedsAvailable {
                    process,
                    resource,
                    requested,
                    available,
                })
            } else {
                None
            }
        })
}

fn find_safe_sequence(state: &AllocationState) -> SafetyVerdict {
    let processes = state.process_count();
    let need = state.need();
    let mut work = state.available.clone();
    let mut finished = FixedBitSet::with_capacity(processes);
    let mut sequence = Vec::with_capacity(processes);
    let mut pass = 0_usize;

    while sequence.len() < processes {
        pass += 1;
        let mut progressed = false;

        for process in 0..processes {
            if finished.contains(process) || !covers(&work, &need[process]) {
                continue;
            }

            for (free, held) in work.iter_mut().zip(&state.allocation[process]) {
                *free = free.saturating_add(*held);
            }
            finished.insert(process);
            sequence.push(process);
            progressed = true;
            debug!(pass, process, "process can run to completion");
        }

        if !progressed {
            debug!(pass, finished = sequence.len(), "no runnable process left");
            return SafetyVerdict::Deadlock { sequence };
        }
    }

    SafetyVerdict::Safe { sequence }
}

fn covers(work: &[u64], need: &[u64]) -> bool {
    need.iter().zip(work).all(|(needed, free)| needed <= free)
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

/// Why a completion sequence does not replay against a state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    #[error(transparent)]
    Invalid(#[from] AnalysisError),

    #[error("step {step}: process {process} does not exist")]
    UnknownProcess { step: usize, process: usize },

    #[error("step {step}: process {process} already completed")]
    RepeatedProcess { step: usize, process: usize },

    #[error(
        "step {step}: process {process} needs {needed} units of resource {resource} but only {free} are free"
    )]
    NeedNotCovered {
        step: usize,
        process: usize,
        resource: usize,
        needed: u64,
        free: u64,
    },
}

impl ReplayError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Invalid(err) => err.error_code(),
            _ => ErrorCode::InvalidSequence,
        }
    }
}

/// Replay a completion order against `state`.
///
/// Each process must have its remaining need covered by the free units
/// accumulated so far at the moment it is admitted. A prefix of a full order
/// (as carried by [`SafetyVerdict::Deadlock`]) replays as well.
///
/// # Errors
///
/// Returns the first step that fails, or [`ReplayError::Invalid`] for a
/// malformed state.
pub fn replay_sequence(state: &AllocationState, sequence: &[usize]) -> Result<(), ReplayError> {
    state.validate()?;

    let mut work = state.available.clone();
    let mut finished = FixedBitSet::with_capacity(state.process_count());

    for (step, &process) in sequence.iter().enumerate() {
        if process >= state.process_count() {
            return Err(ReplayError::UnknownProcess { step, process });
        }
        if finished.put(process) {
            return Err(ReplayError::RepeatedProcess { step, process });
        }

        let need = state.need_of(process);
        if let Some((resource, (&needed, &free))) = need
            .iter()
            .zip(&work)
            .enumerate()
            .find(|(_, (needed, free))| needed > free)
        {
            return Err(ReplayError::NeedNotCovered {
                step,
                process,
                resource,
                needed,
                free,
            });
        }

        for (free, held) in work.iter_mut().zip(&state.allocation[process]) {
            *free = free.saturating_add(*held);
        }
    }

    Ok(())
}
