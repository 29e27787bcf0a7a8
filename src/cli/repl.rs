//! Interactive loop: rustyline prompt, watch mode and confirmations.

use crate::cli::output::{map_error, render_for_terminal};
use crate::cli::run::RunContext;
use crate::config::paths;
use crate::error::ShellError;
use crate::shell::{spawn_watch, CommandOutput, Dispatcher, OutputFormat, WatchHandle, WatchSink};
use dialoguer::Confirm;
use owo_colors::OwoColorize;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, ExternalPrinter};
use std::io::IsTerminal;
use std::time::Duration;
use tracing::{debug, info};

/// Prints watch ticks above the prompt without breaking the line being typed.
struct PrinterSink<P> {
    printer: P,
    format: OutputFormat,
}

impl<P: ExternalPrinter + Send + 'static> WatchSink for PrinterSink<P> {
    fn emit(&mut self, tick: u64, result: Result<CommandOutput, ShellError>) {
        let text = match result {
            Ok(output) => render_for_terminal(&output, self.format),
            Err(e) => map_error(&e),
        };
        if let Err(e) = self.printer.print(format!("{}\n", text)) {
            debug!(tick, error = %e, "Watch output dropped");
        }
    }
}

/// Fallback when the terminal offers no external printer.
struct StdoutSink {
    format: OutputFormat,
}

impl WatchSink for StdoutSink {
    fn emit(&mut self, _tick: u64, result: Result<CommandOutput, ShellError>) {
        match result {
            Ok(output) => println!("{}", render_for_terminal(&output, self.format)),
            Err(e) => eprintln!("{}", map_error(&e)),
        }
    }
}

pub(crate) fn run(ctx: &RunContext) -> Result<(), ShellError> {
    let mut editor = DefaultEditor::new()
        .map_err(|e| ShellError::Config(format!("Failed to start line editor: {}", e)))?;
    let history = paths::history_path();
    if let Some(path) = &history {
        let _ = editor.load_history(path);
    }
    let styled = std::io::stdout().is_terminal();
    let mut watch: Option<WatchHandle> = None;

    info!("Interactive session started");
    loop {
        let prompt = {
            let session = ctx.session.blocking_lock();
            let prompt = format!("{} ", session.prompt());
            if styled {
                prompt.cyan().bold().to_string()
            } else {
                prompt
            }
        };
        let line = match editor.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                stop_watch(ctx, &mut watch);
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(ShellError::Config(format!("Line editor failed: {}", e))),
        };

        // Any input cancels a running watch before the next command starts.
        stop_watch(ctx, &mut watch);

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(line);
        if matches!(line, "quit" | "q") {
            break;
        }

        let resolved = {
            let session = ctx.session.blocking_lock();
            ctx.dispatcher
                .resolve_line(&session, line)
                .ok()
                .flatten()
                .map(|(node, _)| (node.label.clone(), Dispatcher::watchable(node)))
        };
        let (label, watchable) = resolved.unwrap_or_default();
        if label == "clear_cache" && !confirm_clear() {
            println!("Cancelled.");
            continue;
        }

        match ctx.execute(line) {
            Ok(output) => {
                ctx.print(&output);
                if watchable {
                    watch = start_watch(ctx, &mut editor, line);
                }
            }
            Err(e) => eprintln!("{}", map_error(&e)),
        }
    }

    stop_watch(ctx, &mut watch);
    if let Some(path) = &history {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = editor.save_history(path);
    }
    info!("Interactive session ended");
    Ok(())
}

fn confirm_clear() -> bool {
    if !std::io::stdin().is_terminal() {
        return true;
    }
    Confirm::new()
        .with_prompt("Clear cached inventory?")
        .default(false)
        .interact()
        .unwrap_or(false)
}

fn start_watch(ctx: &RunContext, editor: &mut DefaultEditor, line: &str) -> Option<WatchHandle> {
    let (interval, format) = {
        let session = ctx.session.blocking_lock();
        (session.options.watch_interval?, session.options.output_format)
    };
    let interval = Duration::from_secs(interval);
    let _guard = ctx.runtime.enter();
    let handle = match editor.create_external_printer() {
        Ok(printer) => spawn_watch(
            ctx.dispatcher.clone(),
            ctx.session.clone(),
            line.to_string(),
            interval,
            PrinterSink { printer, format },
        ),
        Err(e) => {
            debug!(error = %e, "No external printer; watch prints to stdout");
            spawn_watch(
                ctx.dispatcher.clone(),
                ctx.session.clone(),
                line.to_string(),
                interval,
                StdoutSink { format },
            )
        }
    };
    info!(line, interval_secs = interval.as_secs(), "Watch started");
    Some(handle)
}

fn stop_watch(ctx: &RunContext, watch: &mut Option<WatchHandle>) {
    if let Some(handle) = watch.take() {
        let line = handle.line().to_string();
        let ticks = ctx.runtime.block_on(handle.stop());
        info!(line = %line, ticks, "Watch stopped");
    }
}
