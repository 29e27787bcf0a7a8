//! The interactive shell core: sessions, command dispatch and handlers.
//!
//! Front ends (the REPL, `--command` runs, tests) own a `Session` and feed lines to a
//! `Dispatcher`; rendering the returned `CommandOutput` is up to them.

pub mod dispatch;
pub mod handlers;
pub mod navigation;
pub mod output;
pub mod parse;
pub mod session;
pub mod watch;

pub use dispatch::Dispatcher;
pub use handlers::{CommandHandler, CommandOutcome, HandlerCtx, HandlerRegistry, Transition};
pub use output::{CommandOutput, OutputFormat};
pub use parse::{split_line, ParsedArgs};
pub use session::{Session, SessionOptions};
pub use watch::{spawn_watch, CancelFlag, WatchHandle, WatchSink};
