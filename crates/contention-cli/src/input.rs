//! Request-body loading: `--file <path>`, or stdin when absent or `-`.

use std::io::Read;
use std::path::Path;

use anyhow::Context;
use contention_core::{AnalysisError, ErrorCode};
use serde::de::DeserializeOwned;

use crate::output::{CliError, OutputMode, render_error};

/// Read the raw JSON body for a command.
///
/// # Errors
///
/// Fails when the file or stdin cannot be read.
pub fn read_body(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(p) if p.as_os_str() != "-" => std::fs::read_to_string(p)
            .with_context(|| format!("failed to read {}", p.display())),
        _ => {
            let mut body = String::new();
            std::io::stdin()
                .read_to_string(&mut body)
                .context("failed to read request body from stdin")?;
            Ok(body)
        }
    }
}

/// Read the body and render an `E1002` error if that fails.
pub fn load_body(path: Option<&Path>, output: OutputMode) -> anyhow::Result<String> {
    match read_body(path) {
        Ok(body) => Ok(body),
        Err(err) => {
            render_error(
                output,
                &CliError::from_code(ErrorCode::InputReadFailed, format!("{err:#}")),
            )?;
            Err(err)
        }
    }
}

/// Decode a JSON body into a request type.
///
/// # Errors
///
/// [`AnalysisError::Malformed`] for anything `serde_json` rejects: invalid
/// JSON, missing fields, negative or non-numeric counts.
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T, AnalysisError> {
    Ok(serde_json::from_str(body)?)
}
