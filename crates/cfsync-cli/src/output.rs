//! Shared output layer for pretty/text/JSON parity across all CLI commands.
//!
//! Every command handler receives an [`OutputMode`] and formats its output
//! accordingly: pretty output for humans, compact text for pipes, or stable JSON.
//!
//! # Output mode resolution
//!
//! Precedence (highest wins):
//! 1. `--format` / `--json` flag
//! 2. `FORMAT` env var → `"pretty"` | `"text"` | `"json"`
//! 3. Default: [`OutputMode::Pretty`] if stdout is a TTY; [`OutputMode::Text`] if piped.

use std::io::{self, IsTerminal, Write};

use cfsync_core::context::ContextError;
use cfsync_core::{CompareReport, CopyReport, Report, SyncError};
use clap::ValueEnum;
use serde::Serialize;

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
    writeln!(w, "{:<20} {}", format!("{key}:"), value.as_ref())
}

/// The three output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Human-optimized output (sections, visual framing).
    Pretty,
    /// Plain text lines for pipes.
    Text,
    /// Machine-readable JSON.
    Json,
}

/// Core resolution logic, separated from I/O for testability.
fn resolve_output_mode_inner(
    format_flag: Option<OutputMode>,
    json_flag: bool,
    format_env: Option<&str>,
    is_tty: bool,
) -> OutputMode {
    if let Some(mode) = format_flag {
        return mode;
    }

    if json_flag {
        return OutputMode::Json;
    }

    if let Some(val) = format_env {
        match val.to_lowercase().as_str() {
            "json" => return OutputMode::Json,
            "text" => return OutputMode::Text,
            "pretty" => return OutputMode::Pretty,
            _ => {} // unknown value: fall through to TTY detection
        }
    }

    if is_tty {
        OutputMode::Pretty
    } else {
        OutputMode::Text
    }
}

/// Resolve the output mode from CLI flags, environment, and TTY defaults.
pub fn resolve_output_mode(format_flag: Option<OutputMode>, json_flag: bool) -> OutputMode {
    let env_val = std::env::var("FORMAT").ok();
    let is_tty = io::stdout().is_terminal();
    resolve_output_mode_inner(format_flag, json_flag, env_val.as_deref(), is_tty)
}

/// Result types that render in every output mode.
pub trait Renderable: Serialize {
    /// Render for human consumption: sections, labels and separators.
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()>;

    /// Render as plain lines, one fact per line.
    fn render_text(&self, w: &mut dyn Write) -> io::Result<()>;

    /// Render as a pretty-printed JSON document.
    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *w, self)?;
        writeln!(w)
    }
}

/// Render `item` into `w` using the given output mode.
pub fn render_to<R: Renderable + ?Sized>(
    w: &mut dyn Write,
    item: &R,
    mode: OutputMode,
) -> io::Result<()> {
    match mode {
        OutputMode::Pretty => item.render_human(w),
        OutputMode::Text => item.render_text(w),
        OutputMode::Json => item.render_json(w),
    }
}

/// Render `item` to stdout.
pub fn render_item<R: Renderable + ?Sized>(item: &R, mode: OutputMode) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    render_to(&mut out, item, mode)
}

fn list(w: &mut dyn Write, label: &str, keys: &[String]) -> io::Result<()> {
    writeln!(w, "{label} ({}):", keys.len())?;
    for key in keys {
        writeln!(w, "  {key}")?;
    }
    Ok(())
}

impl Renderable for CompareReport {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        pretty_section(w, &format!("Compare {}", self.resource))?;
        pretty_kv(w, "Common", self.common.len().to_string())?;
        pretty_kv(w, "Missing in target", self.removed.len().to_string())?;
        pretty_kv(w, "Only in target", self.added.len().to_string())?;
        if !self.removed.is_empty() {
            writeln!(w)?;
            list(w, "− Missing in target", &self.removed)?;
        }
        if !self.added.is_empty() {
            writeln!(w)?;
            list(w, "+ Only in target", &self.added)?;
        }
        if self.is_identical() {
            writeln!(w)?;
            writeln!(w, "✓ Source and target {} match", self.resource)?;
        }
        Ok(())
    }

    fn render_text(&self, w: &mut dyn Write) -> io::Result<()> {
        for key in &self.common {
            writeln!(w, "= {key}")?;
        }
        for key in &self.removed {
            writeln!(w, "- {key}")?;
        }
        for key in &self.added {
            writeln!(w, "+ {key}")?;
        }
        Ok(())
    }
}

impl Renderable for CopyReport {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        pretty_section(w, &format!("Copy {}", self.resource))?;
        if self.nothing_to_copy {
            return writeln!(w, "✓ No {} to copy", self.resource);
        }
        pretty_kv(w, "Copied", self.succeeded.len().to_string())?;
        pretty_kv(w, "Failed", self.failed.len().to_string())?;
        if !self.failed.is_empty() {
            writeln!(w)?;
            writeln!(w, "✗ Failed to copy {} {}:", self.failed.len(), self.resource)?;
            for item in &self.failed {
                writeln!(w, "  {}: {}", item.key, item.reason)?;
            }
        }
        Ok(())
    }

    fn render_text(&self, w: &mut dyn Write) -> io::Result<()> {
        if self.nothing_to_copy {
            return writeln!(w, "nothing to copy");
        }
        for item in &self.succeeded {
            match &item.remote_id {
                Some(id) => writeln!(w, "copied {} {id}", item.key)?,
                None => writeln!(w, "copied {}", item.key)?,
            }
        }
        for item in &self.failed {
            writeln!(w, "failed {} {}", item.key, item.reason)?;
        }
        Ok(())
    }
}

impl Renderable for Report {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        match self {
            Self::Compare(report) => report.render_human(w),
            Self::Copy(report) => report.render_human(w),
        }
    }

    fn render_text(&self, w: &mut dyn Write) -> io::Result<()> {
        match self {
            Self::Compare(report) => report.render_text(w),
            Self::Copy(report) => report.render_text(w),
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
    /// Machine-readable error code (e.g. "E4001").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    /// Create a simple error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            error_code: None,
        }
    }
}

impl From<&SyncError> for CliError {
    fn from(err: &SyncError) -> Self {
        Self {
            message: err.to_string(),
            suggestion: err.hint().map(str::to_string),
            error_code: Some(err.code().to_string()),
        }
    }
}

impl From<&ContextError> for CliError {
    fn from(err: &ContextError) -> Self {
        let code = err.code();
        Self {
            message: err.to_string(),
            suggestion: code.hint().map(str::to_string),
            error_code: Some(code.to_string()),
        }
    }
}

/// Render an error into `w` in the requested format.
pub fn render_error_to(w: &mut dyn Write, mode: OutputMode, error: &CliError) -> io::Result<()> {
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "error": error,
            });
            serde_json::to_writer_pretty(&mut *w, &wrapper)?;
            writeln!(w)
        }
        OutputMode::Pretty | OutputMode::Text => {
            match &error.error_code {
                Some(code) => writeln!(w, "error[{code}]: {}", error.message)?,
                None => writeln!(w, "error: {}", error.message)?,
            }
            if let Some(suggestion) = &error.suggestion {
                writeln!(w, "  suggestion: {suggestion}")?;
            }
            Ok(())
        }
    }
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> io::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    render_error_to(&mut out, mode, error)
}
