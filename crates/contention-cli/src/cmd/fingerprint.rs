//! `contend fingerprint`: stable content hash of a request body.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use contention_core::{AllocationState, AnalysisError, SafetyRequest};
use contention_graph::{DeadlockRequest, ResourceGraph};
use serde::Serialize;

use crate::input::{decode, load_body};
use crate::output::{OutputMode, pretty_kv, pretty_section, reject, render_mode};

/// Which body shape to hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintKind {
    /// `check-safety` body: state, request and process.
    #[default]
    Safety,
    /// `check-state` body: state only.
    State,
    /// `detect-deadlock` body: deduplicated edge list in first-seen order.
    Graph,
}

impl FingerprintKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Safety => "safety",
            Self::State => "state",
            Self::Graph => "graph",
        }
    }
}

/// Arguments for `contend fingerprint`.
#[derive(Args, Debug, Default)]
pub struct FingerprintArgs {
    /// JSON body to hash; `-` or absent reads stdin.
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Body shape.
    #[arg(long, value_enum, default_value_t = FingerprintKind::Safety)]
    pub kind: FingerprintKind,
}

#[derive(Debug, Serialize)]
struct FingerprintOutput {
    kind: FingerprintKind,
    fingerprint: String,
}

/// Execute `contend fingerprint`.
///
/// Hashes are computed on the decoded body, so whitespace and key order
/// do not matter. Bodies are not shape-checked.
pub fn run_fingerprint(args: &FingerprintArgs, output: OutputMode) -> anyhow::Result<()> {
    let body = load_body(args.file.as_deref(), output)?;
    let fingerprint = match fingerprint_body(args.kind, &body) {
        Ok(fingerprint) => fingerprint,
        Err(err) => return reject(output, err),
    };

    let payload = FingerprintOutput {
        kind: args.kind,
        fingerprint,
    };
    render_mode(
        output,
        &payload,
        |p, w| writeln!(w, "{}", p.fingerprint),
        |p, w| {
            pretty_section(w, "Fingerprint")?;
            pretty_kv(w, "kind", p.kind.as_str())?;
            pretty_kv(w, "hash", &p.fingerprint)
        },
    )
}

fn fingerprint_body(kind: FingerprintKind, body: &str) -> Result<String, AnalysisError> {
    Ok(match kind {
        FingerprintKind::Safety => decode::<SafetyRequest>(body)?.fingerprint(),
        FingerprintKind::State => decode::<AllocationState>(body)?.fingerprint(),
        FingerprintKind::Graph => {
            let request: DeadlockRequest = decode(body)?;
            ResourceGraph::from_edges(&request.resource_allocation).content_hash
        }
    })
}
