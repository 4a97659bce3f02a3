//! Shared output layer for pretty/text/JSON parity across all commands.
//!
//! # Output mode resolution
//!
//! Precedence (highest wins):
//! 1. `--format` / hidden `--json` flag
//! 2. `CONTEND_FORMAT` env var → `"pretty"` | `"text"` | `"json"`
//! 3. `output` in the user config
//! 4. Default: [`OutputMode::Pretty`] if stdout is a TTY; [`OutputMode::Text`] if piped.
//!
//! The precedence itself lives in `contention_core::config`; this module maps
//! the resolved name onto [`OutputMode`] and does the writing.
//!
//! JSON output is the wire shape of the analysis result and nothing else, so
//! it can be fed straight to another program.

use clap::ValueEnum;
use contention_core::AnalysisError;
use contention_core::ErrorCode;
use serde::Serialize;
use std::io::{self, Write};

/// Shared width for human pretty separators.
pub const PRETTY_RULE_WIDTH: usize = 72;

/// Write a horizontal separator used by pretty human output.
pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Write a section heading followed by a separator.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// Render a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<12} {}", format!("{key}:"), value.as_ref())
}

/// The three output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Human-optimized output (sections, visual framing).
    Pretty,
    /// Token-efficient plain text for agents and pipes.
    Text,
    /// Machine-readable JSON in the analysis wire shape.
    Json,
}

impl OutputMode {
    /// Canonical name understood by the config resolver.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Text => "text",
            Self::Json => "json",
        }
    }

    /// Map a resolved config name back onto a mode. Unknown names read as text.
    pub fn from_resolved(name: &str) -> Self {
        match name {
            "pretty" => Self::Pretty,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// A structured error with optional suggestion and error code.
#[derive(Debug, Serialize)]
pub struct CliError {
    /// Human-readable error message.
    pub message: String,
    /// Optional suggestion for how to fix the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Machine-readable error code (e.g. "E2002").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    /// Create an error with a suggestion and error code.
    pub fn with_details(
        message: impl Into<String>,
        suggestion: impl Into<String>,
        error_code: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            suggestion: Some(suggestion.into()),
            error_code: Some(error_code.into()),
        }
    }

    /// Create an error carrying a stable [`ErrorCode`] and its hint.
    pub fn from_code(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: code.hint().map(str::to_string),
            error_code: Some(code.code().to_string()),
        }
    }
}

/// Convert an [`AnalysisError`] into a [`CliError`].
impl From<&AnalysisError> for CliError {
    fn from(err: &AnalysisError) -> Self {
        Self::with_details(
            err.to_string(),
            err.suggestion(),
            err.error_code().code(),
        )
    }
}

/// Render a serializable value to stdout in the requested format.
///
/// In JSON mode, the value is serialized with `serde_json`. Otherwise the
/// matching text or pretty closure writes the output.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Text => text_fn(value, &mut out)?,
        OutputMode::Pretty => pretty_fn(value, &mut out)?,
    }
    Ok(())
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    write_error(mode, error, &mut out)?;
    Ok(())
}

fn write_error(mode: OutputMode, error: &CliError, out: &mut dyn Write) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "error": error,
            });
            serde_json::to_writer_pretty(&mut *out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            writeln!(out, "error: {}", error.message)?;
            if let Some(ref suggestion) = error.suggestion {
                writeln!(out, "  suggestion: {suggestion}")?;
            }
        }
    }
    Ok(())
}

/// Render a malformed-input failure and turn it into the command's error.
pub fn reject<T>(mode: OutputMode, err: AnalysisError) -> anyhow::Result<T> {
    render_error(mode, &CliError::from(&err))?;
    Err(err.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_resolved_round_trips_canonical_names() {
        for mode in [OutputMode::Pretty, OutputMode::Text, OutputMode::Json] {
            assert_eq!(OutputMode::from_resolved(mode.as_str()), mode);
        }
        assert_eq!(OutputMode::from_resolved("yaml"), OutputMode::Text);
    }

    #[test]
    fn analysis_errors_carry_code_and_hint() {
        let err = AnalysisError::ProcessOutOfRange {
            process: 4,
            processes: 3,
        };
        let cli = CliError::from(&err);
        assert_eq!(cli.error_code.as_deref(), Some("E2003"));
        assert!(cli.message.contains("out of range"));
        assert!(cli.suggestion.is_some());
    }

    #[test]
    fn json_errors_are_wrapped() {
        let err = CliError::from_code(ErrorCode::InputReadFailed, "no such file");
        let mut out = Vec::new();
        write_error(OutputMode::Json, &err, &mut out).expect("render");

        let value: serde_json::Value = serde_json::from_slice(&out).expect("json");
        assert_eq!(value["error"]["message"], "no such file");
        assert_eq!(value["error"]["error_code"], "E1002");
    }

    #[test]
    fn text_errors_include_suggestion() {
        let err = CliError::with_details("bad", "try again", "E2001");
        let mut out = Vec::new();
        write_error(OutputMode::Text, &err, &mut out).expect("render");

        let rendered = String::from_utf8(out).expect("utf8");
        assert_eq!(rendered, "error: bad\n  suggestion: try again\n");
    }

    #[test]
    fn pretty_kv_aligns_keys() {
        let mut out = Vec::new();
        pretty_kv(&mut out, "status", "Safe").expect("render");
        assert_eq!(String::from_utf8(out).expect("utf8"), "status:      Safe\n");
    }
}
