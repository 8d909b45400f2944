//! Shared output layer for text/JSON parity across CLI commands.
//!
//! Rendered fragments go to stdout (or `--out`); listings and reports go to
//! stdout through [`render`]; errors go to stderr through [`render_error`].

use std::io::{self, Write};

use deporder_core::config::ConfigError;
use deporder_core::{ErrorCode, OrderError, SourceError};
use serde::Serialize;

use crate::render::RenderError;

/// The output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Plain text for humans and pipes.
    Text,
    /// Machine-readable JSON.
    Json,
}

/// Render `value` to stdout, as JSON or through `human_fn`.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Text => {
            human_fn(value, &mut out)?;
        }
    }
    Ok(())
}

/// A structured CLI error.
#[derive(Debug, Clone, Serialize)]
pub struct CliError {
    /// Human-readable error message.
    pub message: String,
    /// Optional suggestion for how to fix the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Machine-readable error code (`E####`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    /// Build from any error, picking up a code and hint when a cause is one
    /// of the coded error types. Bare I/O errors stay uncoded.
    pub fn from_error(err: &anyhow::Error) -> Self {
        let code = err.chain().find_map(code_of);

        Self {
            message: format!("{err:#}"),
            suggestion: code.and_then(ErrorCode::hint).map(str::to_string),
            error_code: code.map(|code| code.code().to_string()),
        }
    }
}

fn code_of(cause: &(dyn std::error::Error + 'static)) -> Option<ErrorCode> {
    if let Some(err) = cause.downcast_ref::<OrderError>() {
        return Some(err.code());
    }
    if let Some(err) = cause.downcast_ref::<SourceError>() {
        return Some(err.code());
    }
    if let Some(err) = cause.downcast_ref::<ConfigError>() {
        return Some(err.code());
    }
    cause.downcast_ref::<RenderError>().and_then(RenderError::code)
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "error": error,
            });
            serde_json::to_writer_pretty(&mut out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Text => {
            writeln!(out, "error: {}", error.message)?;
            if let Some(suggestion) = &error.suggestion {
                writeln!(out, "hint: {suggestion}")?;
            }
        }
    }
    Ok(())
}
