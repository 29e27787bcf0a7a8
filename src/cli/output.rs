//! CLI output: terminal rendering, the output file and error mapping.

use crate::error::ShellError;
use crate::shell::{CommandOutput, OutputFormat};
use owo_colors::OwoColorize;
use std::fs::OpenOptions;
use std::io::{IsTerminal, Write};
use std::path::Path;

/// Render for stdout, styled only when stdout is a terminal.
pub fn render_for_terminal(output: &CommandOutput, format: OutputFormat) -> String {
    output.render_styled(format, std::io::stdout().is_terminal())
}

/// Append plain rendered output to `path`.
pub fn append_output_file(path: &Path, rendered: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", rendered)
}

/// Map a command error to the line shown to the user.
pub fn map_error(e: &ShellError) -> String {
    let styled = std::io::stderr().is_terminal();
    let label = format!("% {}", e.kind());
    if styled {
        format!("{} {}", label.red().bold(), e)
    } else {
        format!("{} {}", label, e)
    }
}
