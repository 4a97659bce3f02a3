//! Allocation-state snapshots consumed by the safety checker.
//!
//! # Shape
//!
//! A snapshot is `R` resource types and `P` processes:
//!
//! ```text
//! available   [R]
//! max         [P][R]   maximum claim per process
//! allocation  [P][R]   units currently held per process
//! request     [R]      pending request (SafetyRequest only)
//! process     0..P     index of the requesting process
//! ```
//!
//! Every vector is index-aligned on resource type. [`AllocationState::validate`]
//! and [`SafetyRequest::validate`] reject misaligned input up front so the
//! analyzers never compute on data that does not line up.
//!
//! `allocation[p][r] <= max[p][r]` is a caller invariant. It is not checked;
//! [`AllocationState::need`] saturates at zero when it is broken.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Units per resource type, index-aligned across a snapshot.
pub type ResourceVector = Vec<u64>;

/// One [`ResourceVector`] per process.
pub type Matrix = Vec<ResourceVector>;

// ---------------------------------------------------------------------------
// AllocationState
// ---------------------------------------------------------------------------

/// Available units plus per-process claims and holdings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationState {
    /// Free units of each resource type.
    pub available: ResourceVector,
    /// Maximum claim of each process.
    pub max: Matrix,
    /// Units each process currently holds.
    pub allocation: Matrix,
}

impl AllocationState {
    /// Number of resource types (`R`).
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.available.len()
    }

    /// Number of processes (`P`).
    #[must_use]
    pub fn process_count(&self) -> usize {
        self.max.len()
    }

    /// Check that every row lines up with `available`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::ProcessCountMismatch`] when `max` and
    /// `allocation` have different row counts, and
    /// [`AnalysisError::RowLengthMismatch`] for the first row whose length is
    /// not `R`.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.max.len() != self.allocation.len() {
            return Err(AnalysisError::ProcessCountMismatch {
                max_rows: self.max.len(),
                allocation_rows: self.allocation.len(),
            });
        }

        let expected = self.resource_count();
        for (matrix, rows) in [("max", &self.max), ("allocation", &self.allocation)] {
            if let Some((process, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != expected)
            {
                return Err(AnalysisError::RowLengthMismatch {
                    matrix,
                    process,
                    expected,
                    actual: row.len(),
                });
            }
        }

        Ok(())
    }

    /// Remaining possible need of one process: `max[p] - allocation[p]`.
    ///
    /// Entries saturate at zero. Panics if `process` is out of range; call
    /// [`validate`](Self::validate) first.
    #[must_use]
    pub fn need_of(&self, process: usize) -> ResourceVector {
        self.max[process]
            .iter()
            .zip(&self.allocation[process])
            .map(|(claim, held)| claim.saturating_sub(*held))
            .collect()
    }

    /// The full need matrix.
    #[must_use]
    pub fn need(&self) -> Matrix {
        (0..self.process_count()).map(|p| self.need_of(p)).collect()
    }

    /// Content fingerprint, stable across runs and platforms.
    ///
    /// Two states with the same dimensions and values always produce the
    /// same `blake3:<hex>` string.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"state\x00");
        self.hash_into(&mut hasher);
        format!("blake3:{}", hasher.finalize().to_hex())
    }

    fn hash_into(&self, hasher: &mut blake3::Hasher) {
        hash_vector(hasher, &self.available);
        for matrix in [&self.max, &self.allocation] {
            hasher.update(&(matrix.len() as u64).to_le_bytes());
            for row in matrix {
                hash_vector(hasher, row);
            }
        }
    }
}

fn hash_vector(hasher: &mut blake3::Hasher, vector: &[u64]) {
    hasher.update(&(vector.len() as u64).to_le_bytes());
    for units in vector {
        hasher.update(&units.to_le_bytes());
    }
}

// ---------------------------------------------------------------------------
// SafetyRequest
// ---------------------------------------------------------------------------

/// A full safety-check snapshot: state plus one pending request.
///
/// Field names match the `check-safety` request body:
/// `{available, max, allocation, request, process}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyRequest {
    #[serde(flatten)]
    pub state: AllocationState,
    /// Units requested per resource type.
    pub request: ResourceVector,
    /// Index of the requesting process.
    pub process: usize,
}

impl SafetyRequest {
    /// Validate the state, the request length and the process index.
    ///
    /// # Errors
    ///
    /// Any shape error from [`AllocationState::validate`], plus
    /// [`AnalysisError::ResourceCountMismatch`] and
    /// [`AnalysisError::ProcessOutOfRange`].
    pub fn validate(&self) -> Result<(), AnalysisError> {
        self.state.validate()?;

        if self.request.len() != self.state.resource_count() {
            return Err(AnalysisError::ResourceCountMismatch {
                field: "request",
                expected: self.state.resource_count(),
                actual: self.request.len(),
            });
        }

        if self.process >= self.state.process_count() {
            return Err(AnalysisError::ProcessOutOfRange {
                process: self.process,
                processes: self.state.process_count(),
            });
        }

        Ok(())
    }

    /// Content fingerprint covering the state, the request and the process.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"request\x00");
        self.state.hash_into(&mut hasher);
        hash_vector(&mut hasher, &self.request);
        hasher.update(&(self.process as u64).to_le_bytes());
        format!("blake3:{}", hasher.finalize().to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn textbook_state() -> AllocationState {
        AllocationState {
            available: vec![3, 3, 2],
            max: vec![vec![7, 5, 3], vec![3, 2, 2], vec![9, 0, 2]],
            allocation: vec![vec![0, 1, 0], vec![2, 0, 0], vec![3, 0, 2]],
        }
    }

    #[test]
    fn need_subtracts_allocation_from_claim() {
        let state = textbook_state();
        assert_eq!(
            state.need(),
            vec![vec![7, 4, 3], vec![1, 2, 2], vec![6, 0, 0]]
        );
    }

    #[test]
    fn need_saturates_when_allocation_exceeds_claim() {
        let state = AllocationState {
            available: vec![0],
            max: vec![vec![1]],
            allocation: vec![vec![4]],
        };
        assert_eq!(state.need_of(0), vec![0]);
    }

    #[test]
    fn validate_rejects_row_count_mismatch() {
        let mut state = textbook_state();
        state.allocation.pop();
        assert_eq!(
            state.validate(),
            Err(AnalysisError::ProcessCountMismatch {
                max_rows: 3,
                allocation_rows: 2
            })
        );
    }

    #[test]
    fn validate_reports_first_short_row() {
        let mut state = textbook_state();
        state.allocation[1] = vec![2, 0];
        assert_eq!(
            state.validate(),
            Err(AnalysisError::RowLengthMismatch {
                matrix: "allocation",
                process: 1,
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn request_validation_checks_length_then_index() {
        let mut snapshot = SafetyRequest {
            state: textbook_state(),
            request: vec![1, 0],
            process: 7,
        };
        assert!(matches!(
            snapshot.validate(),
            Err(AnalysisError::ResourceCountMismatch { field: "request", expected: 3, actual: 2 })
        ));

        snapshot.request.push(2);
        assert_eq!(
            snapshot.validate(),
            Err(AnalysisError::ProcessOutOfRange {
                process: 7,
                processes: 3
            })
        );
    }

    #[test]
    fn request_body_uses_flat_field_names() {
        let body = r#"{
            "available": [3, 3, 2],
            "max": [[7, 5, 3], [3, 2, 2], [9, 0, 2]],
            "allocation": [[0, 1, 0], [2, 0, 0], [3, 0, 2]],
            "request": [1, 0, 2],
            "process": 1
        }"#;
        let snapshot: SafetyRequest = serde_json::from_str(body).expect("parse");
        assert_eq!(snapshot.state, textbook_state());
        assert_eq!(snapshot.request, vec![1, 0, 2]);
        assert_eq!(snapshot.process, 1);
    }

    #[test]
    fn negative_units_do_not_decode() {
        let body = r#"{"available": [-1], "max": [[1]], "allocation": [[0]], "request": [0], "process": 0}"#;
        assert!(serde_json::from_str::<SafetyRequest>(body).is_err());
    }

    #[test]
    fn fingerprint_is_stable_and_shape_sensitive() {
        let a = textbook_state();
        assert_eq!(a.fingerprint(), textbook_state().fingerprint());
        assert!(a.fingerprint().starts_with("blake3:"));

        // Same flattened numbers, different row split.
        let b = AllocationState {
            available: vec![3, 3],
            max: vec![vec![2, 7], vec![5, 3]],
            allocation: vec![vec![3, 2], vec![2, 9]],
        };
        assert_ne!(a.fingerprint(), b.fingerprint());

        let snapshot = SafetyRequest {
            state: a,
            request: vec![1, 0, 2],
            process: 1,
        };
        let other = SafetyRequest {
            process: 0,
            ..snapshot.clone()
        };
        assert_ne!(snapshot.fingerprint(), other.fingerprint());
    }
}
