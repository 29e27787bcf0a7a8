//! Command graph introspection.

use crate::error::ShellError;
use crate::graph::{check_tree, export_graph, fingerprint, validate_graph, ExportFormat};
use crate::shell::handlers::{CommandHandler, CommandOutcome, HandlerCtx};
use crate::shell::output::CommandOutput;
use async_trait::async_trait;
use std::path::Path;
use tracing::info;

pub struct ShowGraph;

#[async_trait]
impl CommandHandler for ShowGraph {
    async fn run(&self, ctx: &mut HandlerCtx<'_>) -> Result<CommandOutcome, ShellError> {
        ctx.no_args()?;
        let report = validate_graph(ctx.graph, ctx.registry);
        Ok(CommandOutcome::output(CommandOutput::Detail {
            title: "Command graph".to_string(),
            fields: vec![
                ("nodes".to_string(), ctx.graph.len().to_string()),
                ("handlers".to_string(), ctx.registry.len().to_string()),
                ("commands".to_string(), report.checked.to_string()),
                (
                    "unimplemented".to_string(),
                    report.unimplemented.len().to_string(),
                ),
                ("fingerprint".to_string(), fingerprint(ctx.graph)),
            ],
        }))
    }
}

/// Reports structural problems first, then paths without a handler.
pub struct ValidateGraph;

#[async_trait]
impl CommandHandler for ValidateGraph {
    async fn run(&self, ctx: &mut HandlerCtx<'_>) -> Result<CommandOutcome, ShellError> {
        ctx.no_args()?;
        let problems = check_tree(ctx.graph);
        let report = validate_graph(ctx.graph, ctx.registry);
        if problems.is_empty() && report.is_complete() {
            return Ok(CommandOutcome::output(CommandOutput::message(format!(
                "Command graph OK: {} commands, all implemented",
                report.checked
            ))));
        }
        let rows = problems
            .into_iter()
            .map(|p| vec!["structure".to_string(), p])
            .chain(
                report
                    .unimplemented
                    .into_iter()
                    .map(|p| vec!["unimplemented".to_string(), p]),
            )
            .collect::<Vec<_>>();
        Ok(CommandOutcome::output(CommandOutput::Table {
            title: format!("Command graph problems ({})", rows.len()),
            headers: vec!["Problem".to_string(), "Path".to_string()],
            rows,
        }))
    }
}

/// `export_graph [text|markdown|mermaid] [file]`
pub struct ExportGraph;

#[async_trait]
impl CommandHandler for ExportGraph {
    async fn run(&self, ctx: &mut HandlerCtx<'_>) -> Result<CommandOutcome, ShellError> {
        let (format, file) = match ctx.args {
            [] => (ExportFormat::default(), None),
            [format] => (parse_format(format, ctx.input)?, None),
            [format, file] => (parse_format(format, ctx.input)?, Some(file.as_str())),
            _ => {
                return Err(ShellError::invalid_argument(
                    "usage: export_graph [text|markdown|mermaid] [file]",
                    ctx.input,
                ))
            }
        };
        let body = export_graph(ctx.graph, format);
        match file {
            None => Ok(CommandOutcome::output(CommandOutput::Document {
                format: format.as_str().to_string(),
                body,
            })),
            Some(file) => {
                std::fs::write(Path::new(file), &body).map_err(|e| {
                    ShellError::invalid_argument(format!("cannot write {}: {}", file, e), ctx.input)
                })?;
                info!(file, format = format.as_str(), "Exported command graph");
                Ok(CommandOutcome::output(CommandOutput::message(format!(
                    "Wrote {} graph to {}",
                    format.as_str(),
                    file
                ))))
            }
        }
    }
}

fn parse_format(raw: &str, input: &str) -> Result<ExportFormat, ShellError> {
    raw.parse()
        .map_err(|e: String| ShellError::invalid_argument(e, input))
}
