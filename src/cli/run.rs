//! Wiring a configured session: provider, cache, dispatcher and runtime.

use crate::cache::{CacheStore, SledCachePersistence};
use crate::cli::output::{append_output_file, map_error, render_for_terminal};
use crate::config::ShellConfig;
use crate::error::ShellError;
use crate::inventory::{InventoryProvider, SnapshotInventory};
use crate::shell::{CommandOutput, Dispatcher, Session};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Everything a front end needs to run commands.
pub struct RunContext {
    pub(crate) runtime: Runtime,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) session: Arc<Mutex<Session>>,
    pub(crate) cache: Arc<CacheStore>,
}

impl RunContext {
    pub fn new(config: &ShellConfig) -> Result<Self, ShellError> {
        let runtime = Runtime::new()
            .map_err(|e| ShellError::Config(format!("Failed to start runtime: {}", e)))?;

        let provider: Arc<dyn InventoryProvider> = match &config.inventory.snapshot {
            Some(path) => Arc::new(
                SnapshotInventory::from_path(path)
                    .map_err(|e| ShellError::Config(format!("Failed to load snapshot: {}", e)))?,
            ),
            None => {
                warn!("No inventory snapshot configured; the topology is empty");
                Arc::new(SnapshotInventory::empty())
            }
        };

        let ttl = config.cache.ttl().map_err(ShellError::Config)?;
        let cache = if config.cache.persist {
            let path = config.cache.resolved_path().ok_or_else(|| {
                ShellError::Config("cannot determine a cache directory".to_string())
            })?;
            info!(path = %path.display(), "Opening persistent cache");
            CacheStore::with_persistence(SledCachePersistence::open(&path)?)?
        } else {
            CacheStore::in_memory()
        };
        let cache = Arc::new(
            cache
                .with_retry(config.cache.retry_policy())
                .with_default_ttl(ttl),
        );

        let dispatcher = Dispatcher::standard()?;
        let session = Session::new(provider, cache.clone(), config.session_options());
        Ok(Self {
            runtime,
            dispatcher,
            session: Arc::new(Mutex::new(session)),
            cache,
        })
    }

    /// Run one line and return the result; output-file appending included.
    pub fn execute(&self, line: &str) -> Result<CommandOutput, ShellError> {
        self.runtime.block_on(async {
            let mut session = self.session.lock().await;
            let output = self.dispatcher.execute(&mut session, line).await?;
            if let Some(path) = &session.options.output_file {
                if !matches!(output, CommandOutput::Empty) {
                    let rendered = output.render(session.options.output_format);
                    if let Err(e) = append_output_file(path, &rendered) {
                        warn!(path = %path.display(), error = %e, "Failed to append output file");
                    }
                }
            }
            Ok(output)
        })
    }

    pub fn print(&self, output: &CommandOutput) {
        let format = self.runtime.block_on(async { self.session.lock().await.options.output_format });
        let rendered = render_for_terminal(output, format);
        if !rendered.is_empty() {
            println!("{}", rendered);
        }
    }

    /// Non-interactive run. Every command runs; returns whether all succeeded.
    pub fn run_commands(&self, commands: &[String]) -> bool {
        let mut ok = true;
        for line in commands {
            match self.execute(line) {
                Ok(output) => self.print(&output),
                Err(e) => {
                    error!(line = %line, error = %e, "Command failed");
                    eprintln!("{}", map_error(&e));
                    ok = false;
                }
            }
        }
        ok
    }

    pub fn run_interactive(&self) -> Result<(), ShellError> {
        crate::cli::repl::run(self)
    }

    /// Write pending cache entries to disk.
    pub fn shutdown(&self) {
        if let Err(e) = self.cache.flush() {
            warn!(error = %e, "Failed to flush cache");
        }
    }
}
