//! Leaving contexts and saving output.

use crate::error::ShellError;
use crate::shell::handlers::{CommandHandler, CommandOutcome, HandlerCtx, Transition};
use crate::shell::output::CommandOutput;
use async_trait::async_trait;
use std::fs::OpenOptions;
use std::io::Write;
use tracing::info;

pub struct Exit;

#[async_trait]
impl CommandHandler for Exit {
    async fn run(&self, ctx: &mut HandlerCtx<'_>) -> Result<CommandOutcome, ShellError> {
        ctx.no_args()?;
        if ctx.stack.depth() == 0 {
            return Err(ShellError::CannotExitRoot);
        }
        Ok(CommandOutcome::with_transition(
            CommandOutput::Empty,
            Transition::Pop,
        ))
    }
}

pub struct End;

#[async_trait]
impl CommandHandler for End {
    async fn run(&self, ctx: &mut HandlerCtx<'_>) -> Result<CommandOutcome, ShellError> {
        ctx.no_args()?;
        Ok(CommandOutcome::with_transition(
            CommandOutput::Empty,
            Transition::PopToRoot,
        ))
    }
}

/// `write <file>`: append the last data output, rendered without color.
pub struct WriteOutput;

#[async_trait]
impl CommandHandler for WriteOutput {
    async fn run(&self, ctx: &mut HandlerCtx<'_>) -> Result<CommandOutcome, ShellError> {
        let [file] = ctx.args else {
            return Err(ShellError::invalid_argument("usage: write <file>", ctx.input));
        };
        let Some(last) = ctx.last_output else {
            return Err(ShellError::not_found("no output to write yet", ctx.input));
        };
        let rendered = last.render(ctx.options.output_format);
        let io_error = |e: std::io::Error| {
            ShellError::invalid_argument(format!("cannot write {}: {}", file, e), ctx.input)
        };
        let mut out = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file)
            .map_err(io_error)?;
        writeln!(out, "{}", rendered).map_err(io_error)?;
        info!(file = %file, "Wrote output");
        Ok(CommandOutcome::output(CommandOutput::message(format!(
            "Wrote output to {}",
            file
        ))))
    }
}
