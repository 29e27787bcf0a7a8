//! CLI domain: argument parsing, the REPL and terminal output.
//! The shell core does the work; this layer only feeds it lines and prints results.

mod output;
mod parse;
mod repl;
mod run;

pub use output::{append_output_file, map_error, render_for_terminal};
pub use parse::Cli;
pub use run::RunContext;
