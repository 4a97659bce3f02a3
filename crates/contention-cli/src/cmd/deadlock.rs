//! `contend detect-deadlock`: cycle detection on a resource-allocation graph.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use contention_core::config::ProjectConfig;
use contention_core::RoleConvention;
use contention_graph::{
    CoffmanConditions, DeadlockReport, DeadlockRequest, EdgeKind, GraphStats, ResourceGraph,
    find_deadlocked_sets,
};
use serde::Serialize;
use tracing::info;

use crate::input::{decode, load_body};
use crate::output::{OutputMode, pretty_kv, pretty_section, reject, render_mode};

/// Arguments for `contend detect-deadlock`.
#[derive(Args, Debug, Default)]
pub struct DetectDeadlockArgs {
    /// JSON body `{"resource_allocation": [[from, to], ...]}`; `-` or absent reads stdin.
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Add the Coffman-condition report.
    #[arg(long)]
    pub conditions: bool,

    /// List every deadlocked set (cyclic strongly connected component).
    #[arg(long)]
    pub all: bool,
}

/// The deadlock report plus the optional sections asked for.
///
/// Without either section this serializes to exactly
/// `{"deadlock_detected", "cycle"}`.
#[derive(Debug, Serialize)]
struct DeadlockOutput {
    #[serde(flatten)]
    report: DeadlockReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    conditions: Option<CoffmanConditions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deadlocked_sets: Option<Vec<Vec<String>>>,
    #[serde(skip)]
    stats: GraphStats,
}

/// Execute `contend detect-deadlock`.
///
/// `--conditions` and `--all` are OR'd with the `[report]` defaults in the
/// project config.
pub fn run_detect_deadlock(
    args: &DetectDeadlockArgs,
    output: OutputMode,
    project: &ProjectConfig,
) -> anyhow::Result<()> {
    let body = load_body(args.file.as_deref(), output)?;
    let request: DeadlockRequest = match decode(&body) {
        Ok(request) => request,
        Err(err) => return reject(output, err),
    };

    let payload = analyze(
        &request,
        &project.roles,
        args.conditions || project.report.conditions,
        args.all || project.report.all_cycles,
    );
    info!(
        deadlock = payload.report.deadlock_detected,
        cycle_len = payload.report.cycle.len(),
        "deadlock detection"
    );

    render_mode(output, &payload, render_deadlock_text, |report, w| {
        render_deadlock_pretty(report, &project.roles, w)
    })
}

fn analyze(
    request: &DeadlockRequest,
    roles: &RoleConvention,
    with_conditions: bool,
    with_sets: bool,
) -> DeadlockOutput {
    let graph = ResourceGraph::from_edges(&request.resource_allocation);
    DeadlockOutput {
        report: DeadlockReport::from_graph(&graph),
        conditions: with_conditions.then(|| CoffmanConditions::analyze(&graph, roles)),
        deadlocked_sets: with_sets.then(|| find_deadlocked_sets(&graph)),
        stats: GraphStats::from_graph(&graph, roles),
    }
}

fn render_deadlock_text(payload: &DeadlockOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if payload.report.deadlock_detected {
        // Close the loop on the starting node.
        let mut nodes = payload.report.cycle_nodes();
        if let Some(first) = nodes.first().copied() {
            nodes.push(first);
        }
        writeln!(w, "deadlock  cycle={}", nodes.join(" -> "))?;
    } else {
        writeln!(w, "no-deadlock")?;
    }

    if let Some(conditions) = &payload.conditions {
        writeln!(
            w,
            "conditions  mutual_exclusion={} hold_and_wait={} no_preemption={} circular_wait={}",
            conditions.mutual_exclusion,
            conditions.hold_and_wait,
            conditions.no_preemption,
            conditions.circular_wait
        )?;
    }

    if let Some(sets) = &payload.deadlocked_sets {
        for set in sets {
            writeln!(w, "set  {}", set.join(","))?;
        }
    }
    Ok(())
}

fn render_deadlock_pretty(
    payload: &DeadlockOutput,
    roles: &RoleConvention,
    w: &mut dyn Write,
) -> std::io::Result<()> {
    pretty_section(w, "Deadlock detection")?;
    if !payload.report.deadlock_detected {
        pretty_kv(w, "status", "no deadlock")?;
    } else if payload.report.is_self_loop() {
        pretty_kv(w, "status", "deadlock (self-loop)")?;
    } else {
        pretty_kv(w, "status", "deadlock")?;
    }
    let stats = &payload.stats;
    pretty_kv(
        w,
        "graph",
        format!(
            "{} nodes, {} edges ({} processes, {} resources, {} other)",
            stats.node_count,
            stats.edge_count,
            stats.process_count,
            stats.resource_count,
            stats.unknown_count
        ),
    )?;

    if payload.report.deadlock_detected {
        writeln!(w)?;
        writeln!(w, "Cycle")?;
        for (from, to) in &payload.report.cycle {
            let kind = EdgeKind::classify(roles, from, to);
            writeln!(w, "  {}", kind.describe(from, to))?;
        }
    }

    if let Some(conditions) = &payload.conditions {
        writeln!(w)?;
        writeln!(w, "Coffman conditions")?;
        let mark = |held: bool| if held { "yes" } else { "no" };
        writeln!(w, "  mutual exclusion  {}", mark(conditions.mutual_exclusion))?;
        writeln!(w, "  hold and wait     {}", mark(conditions.hold_and_wait))?;
        writeln!(w, "  no preemption     {}", mark(conditions.no_preemption))?;
        writeln!(w, "  circular wait     {}", mark(conditions.circular_wait))?;
        if !conditions.holding_and_waiting.is_empty() {
            writeln!(
                w,
                "  holding + waiting {}",
                conditions.holding_and_waiting.join(", ")
            )?;
        }
    }

    if let Some(sets) = &payload.deadlocked_sets {
        writeln!(w)?;
        writeln!(w, "Deadlocked sets ({})", sets.len())?;
        for (i, set) in sets.iter().enumerate() {
            writeln!(w, "  {}. {}", i + 1, set.join(" <-> "))?;
        }
    }
    Ok(())
}
