//! awsnet CLI Binary
//!
//! Interactive shell by default; `-c <command>` runs commands and exits.

use awsnet::cli::{Cli, RunContext};
use awsnet::config::{ConfigLoader, ShellConfig};
use awsnet::logging::init_logging;
use clap::Parser;
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{:#}", e);
            process::exit(2);
        }
    };

    if let Err(e) = init_logging(Some(&config.logging)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("awsnet starting");

    let context = match RunContext::new(&config) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Error initializing session: {}", e);
            eprintln!("{}", awsnet::cli::map_error(&e));
            process::exit(1);
        }
    };

    let code = if cli.is_interactive() {
        match context.run_interactive() {
            Ok(()) => 0,
            Err(e) => {
                error!("Interactive session failed: {}", e);
                eprintln!("{}", awsnet::cli::map_error(&e));
                1
            }
        }
    } else if context.run_commands(&cli.commands) {
        0
    } else {
        1
    };

    context.shutdown();
    process::exit(code);
}

/// Load layered config, apply flags, then validate everything at once.
fn load_config(cli: &Cli) -> anyhow::Result<ShellConfig> {
    let mut config = ConfigLoader::new()
        .explicit_file(cli.config.clone())
        .load()?;
    cli.apply(&mut config).map_err(anyhow::Error::msg)?;
    if let Err(errors) = config.validate() {
        let lines: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        anyhow::bail!("Configuration validation failed:\n{}", lines.join("\n"));
    }
    Ok(config)
}
