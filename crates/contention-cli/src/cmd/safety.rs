//! `contend check-safety` and `contend check-state`: Banker's-algorithm verdicts.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use contention_core::{AllocationState, SafetyRequest, SafetyVerdict, check_safety, check_state};
use tracing::info;

use crate::input::{decode, load_body};
use crate::output::{OutputMode, pretty_kv, pretty_section, reject, render_mode};

/// Arguments for `contend check-safety`.
#[derive(Args, Debug, Default)]
pub struct CheckSafetyArgs {
    /// JSON body `{available, max, allocation, request, process}`; `-` or absent reads stdin.
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

/// Arguments for `contend check-state`.
#[derive(Args, Debug, Default)]
pub struct CheckStateArgs {
    /// JSON body `{available, max, allocation}`; `-` or absent reads stdin.
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

/// Execute `contend check-safety`.
///
/// Every verdict, Denied and deadlock included, is a successful run.
pub fn run_check_safety(args: &CheckSafetyArgs, output: OutputMode) -> anyhow::Result<()> {
    let body = load_body(args.file.as_deref(), output)?;
    let snapshot: SafetyRequest = match decode(&body) {
        Ok(snapshot) => snapshot,
        Err(err) => return reject(output, err),
    };

    let verdict = match check_safety(&snapshot) {
        Ok(verdict) => verdict,
        Err(err) => return reject(output, err),
    };
    info!(status = verdict.status(), process = snapshot.process, "safety check");

    render_verdict(output, &verdict)
}

/// Execute `contend check-state`: the safety search on a state with no
/// pending request.
pub fn run_check_state(args: &CheckStateArgs, output: OutputMode) -> anyhow::Result<()> {
    let body = load_body(args.file.as_deref(), output)?;
    let state: AllocationState = match decode(&body) {
        Ok(state) => state,
        Err(err) => return reject(output, err),
    };

    let verdict = match check_state(&state) {
        Ok(verdict) => verdict,
        Err(err) => return reject(output, err),
    };
    info!(status = verdict.status(), "state check");

    render_verdict(output, &verdict)
}

fn render_verdict(output: OutputMode, verdict: &SafetyVerdict) -> anyhow::Result<()> {
    render_mode(output, verdict, render_verdict_text, render_verdict_pretty)
}

fn format_sequence(sequence: &[usize]) -> String {
    if sequence.is_empty() {
        return "(none)".to_string();
    }
    sequence
        .iter()
        .map(|p| format!("P{p}"))
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn render_verdict_text(verdict: &SafetyVerdict, w: &mut dyn Write) -> std::io::Result<()> {
    match verdict {
        SafetyVerdict::Safe { sequence } | SafetyVerdict::Deadlock { sequence } => {
            let joined = sequence
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            writeln!(w, "{}  sequence={joined}", verdict.status())
        }
        SafetyVerdict::Denied { reason, .. } => writeln!(w, "Denied  {reason}"),
    }
}

fn render_verdict_pretty(verdict: &SafetyVerdict, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Safety check")?;
    pretty_kv(w, "status", verdict.status())?;
    match verdict {
        SafetyVerdict::Safe { sequence } => pretty_kv(w, "sequence", format_sequence(sequence)),
        SafetyVerdict::Deadlock { sequence } => {
            pretty_kv(w, "finished", format_sequence(sequence))?;
            writeln!(w)?;
            writeln!(w, "No remaining process can be guaranteed to finish.")
        }
        SafetyVerdict::Denied { reason, .. } => pretty_kv(w, "reason", reason),
    }
}
