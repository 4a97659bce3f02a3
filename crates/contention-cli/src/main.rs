#![forbid(unsafe_code)]

mod cmd;
mod input;
mod output;

use clap::{Parser, Subcommand};
use contention_core::ErrorCode;
use contention_core::config::resolve_config;
use output::{CliError, OutputMode, render_error};
use std::env;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "contend: deadlock analysis for resource-allocation snapshots",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format.
    #[arg(long, value_enum, global = true)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// The format named on the command line, if any.
    fn cli_format(&self) -> Option<&'static str> {
        if self.json {
            Some(OutputMode::Json.as_str())
        } else {
            self.format.map(OutputMode::as_str)
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Avoidance",
        about = "Check whether granting a request keeps the system safe",
        long_about = "Run the Banker's algorithm for one pending request.\n\n\
                      Prints Safe with a completion order, Denied with the violated bound, \
                      or Deadlock detected with the processes admitted before the search stalled.",
        after_help = "EXAMPLES:\n    # Check a snapshot stored in a file\n    contend check-safety --file snapshot.json\n\n    # Pipe the body on stdin and emit JSON\n    cat snapshot.json | contend check-safety --json"
    )]
    CheckSafety(cmd::safety::CheckSafetyArgs),

    #[command(
        next_help_heading = "Avoidance",
        about = "Check whether a state is safe with no pending request",
        after_help = "EXAMPLES:\n    # Check the current state only\n    contend check-state --file state.json"
    )]
    CheckState(cmd::safety::CheckStateArgs),

    #[command(
        next_help_heading = "Detection",
        about = "Look for a wait-for cycle in a resource-allocation graph",
        long_about = "Report whether the graph contains a cycle, and one witness cycle as its ordered edges.",
        after_help = "EXAMPLES:\n    # Detect a deadlock\n    contend detect-deadlock --file graph.json\n\n    # Include Coffman conditions and every deadlocked set\n    contend detect-deadlock --file graph.json --conditions --all\n\n    # Emit machine-readable output\n    contend detect-deadlock --file graph.json --json"
    )]
    DetectDeadlock(cmd::deadlock::DetectDeadlockArgs),

    #[command(
        next_help_heading = "Utilities",
        about = "Print a stable content hash of a request body",
        after_help = "EXAMPLES:\n    # Hash a safety snapshot\n    contend fingerprint --file snapshot.json\n\n    # Hash an edge list\n    contend fingerprint --kind graph --file graph.json"
    )]
    Fingerprint(cmd::fingerprint::FingerprintArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("CONTEND_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "contention=debug,info"
        } else {
            "contention=info,warn"
        })
    });

    let format = env::var("CONTEND_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = env::current_dir()?;
    let config = match resolve_config(&project_root, cli.cli_format()) {
        Ok(config) => config,
        Err(err) => {
            let mode = cli.format.unwrap_or(if cli.json {
                OutputMode::Json
            } else {
                OutputMode::Text
            });
            render_error(
                mode,
                &CliError::from_code(ErrorCode::ConfigParseError, format!("{err:#}")),
            )?;
            return Err(err);
        }
    };
    let output = OutputMode::from_resolved(&config.resolved_output);
    debug!(output = output.as_str(), "resolved output mode");

    match cli.command {
        Commands::CheckSafety(ref args) => cmd::safety::run_check_safety(args, output),
        Commands::CheckState(ref args) => cmd::safety::run_check_state(args, output),
        Commands::DetectDeadlock(ref args) => {
            cmd::deadlock::run_detect_deadlock(args, output, &config.project)
        }
        Commands::Fingerprint(ref args) => cmd::fingerprint::run_fingerprint(args, output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn json_flag_parses_after_subcommand() {
        let cli = Cli::parse_from(["contend", "detect-deadlock", "--json"]);
        assert_eq!(cli.cli_format(), Some("json"));
    }

    #[test]
    fn json_flag_wins_over_format() {
        let cli = Cli::parse_from(["contend", "--format", "pretty", "--json", "check-state"]);
        assert_eq!(cli.cli_format(), Some("json"));
    }

    #[test]
    fn format_flag_parses_before_subcommand() {
        let cli = Cli::parse_from(["contend", "--format", "text", "check-safety"]);
        assert_eq!(cli.cli_format(), Some("text"));
        assert!(matches!(cli.command, Commands::CheckSafety(_)));
    }

    #[test]
    fn no_flag_leaves_format_to_config() {
        let cli = Cli::parse_from(["contend", "fingerprint", "--kind", "graph"]);
        assert_eq!(cli.cli_format(), None);
        assert!(matches!(
            cli.command,
            Commands::Fingerprint(cmd::fingerprint::FingerprintArgs {
                kind: cmd::fingerprint::FingerprintKind::Graph,
                ..
            })
        ));
    }

    #[test]
    fn detect_deadlock_flags_parse() {
        let cli = Cli::parse_from([
            "contend",
            "detect-deadlock",
            "--file",
            "graph.json",
            "--conditions",
            "--all",
        ]);
        let Commands::DetectDeadlock(args) = cli.command else {
            panic!("expected detect-deadlock");
        };
        assert!(args.conditions);
        assert!(args.all);
        assert_eq!(args.file.as_deref(), Some(std::path::Path::new("graph.json")));
    }
}
