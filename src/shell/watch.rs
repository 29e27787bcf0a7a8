//! Watch mode: re-run one command on a timer until cancelled.

use crate::error::ShellError;
use crate::shell::dispatch::Dispatcher;
use crate::shell::output::CommandOutput;
use crate::shell::session::Session;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Receives each tick's result. Implementations must print whole lines only.
pub trait WatchSink: Send + 'static {
    fn emit(&mut self, tick: u64, result: Result<CommandOutput, ShellError>);
}

/// Cooperative cancellation: checked between ticks, and wakes the sleep.
#[derive(Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    async fn sleep(&self, interval: Duration) {
        let notified = self.notify.notified();
        if self.is_cancelled() {
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = notified => {}
        }
    }
}

pub struct WatchHandle {
    line: String,
    cancel: CancelFlag,
    task: JoinHandle<u64>,
}

impl WatchHandle {
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Cancel and wait for the loop to finish its current tick. Returns ticks run.
    pub async fn stop(self) -> u64 {
        self.cancel.cancel();
        match self.task.await {
            Ok(ticks) => ticks,
            Err(e) => {
                debug!(error = %e, "Watch task ended abnormally");
                0
            }
        }
    }
}

/// Start re-running `line` every `interval`. The first run is the caller's; the
/// loop sleeps before each tick.
pub fn spawn_watch<S: WatchSink>(
    dispatcher: Dispatcher,
    session: Arc<Mutex<Session>>,
    line: String,
    interval: Duration,
    mut sink: S,
) -> WatchHandle {
    let cancel = CancelFlag::new();
    let flag = cancel.clone();
    let command = line.clone();
    let task = tokio::spawn(async move {
        let mut ticks = 0;
        loop {
            flag.sleep(interval).await;
            if flag.is_cancelled() {
                break;
            }
            ticks += 1;
            trace!(tick = ticks, line = %command, "Watch tick");
            let result = {
                let mut session = session.lock().await;
                dispatcher.execute(&mut session, &command).await
            };
            if flag.is_cancelled() {
                break;
            }
            sink.emit(ticks, result);
        }
        ticks
    });
    WatchHandle { line, cancel, task }
}
