//! CLI parse: clap types for awsnet, and folding flags into the loaded config.

use crate::config::ShellConfig;
use crate::shell::OutputFormat;
use clap::Parser;
use std::path::PathBuf;

/// awsnet - context-sensitive shell for cloud network topology
#[derive(Parser, Debug, Default)]
#[command(name = "awsnet")]
#[command(version)]
#[command(about = "Explore cloud network topology and trace routes from an interactive shell")]
pub struct Cli {
    /// Credentials profile to query
    #[arg(long)]
    pub profile: Option<String>,

    /// Regions to query (comma-separated; default: all)
    #[arg(long, value_delimiter = ',')]
    pub regions: Vec<String>,

    /// Bypass the cache for every read
    #[arg(long)]
    pub no_cache: bool,

    /// JSON topology file to serve as the inventory
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Configuration file path (layered over the global config)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(long)]
    pub output_format: Option<String>,

    /// Run a command and exit; repeat to run several in order
    #[arg(short = 'c', long = "command")]
    pub commands: Vec<String>,

    /// Enable verbose logging (debug, mirrored to stderr)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Apply flags over `config`. Flags win over every other source.
    pub fn apply(&self, config: &mut ShellConfig) -> Result<(), String> {
        if let Some(profile) = &self.profile {
            config.session.profile = Some(profile.clone());
        }
        if !self.regions.is_empty() {
            config.session.regions = self
                .regions
                .iter()
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect();
        }
        if self.no_cache {
            config.session.no_cache = true;
        }
        if let Some(snapshot) = &self.snapshot {
            config.inventory.snapshot = Some(snapshot.clone());
        }
        if let Some(format) = &self.output_format {
            config.session.output_format = format.parse::<OutputFormat>()?;
        }

        let logging = &mut config.logging;
        if self.quiet {
            logging.enabled = false;
        }
        if self.verbose {
            logging.level = "debug".to_string();
            if logging.output == "file" {
                logging.output = "file+stderr".to_string();
            }
        }
        if let Some(level) = &self.log_level {
            logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            logging.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            logging.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            logging.file = Some(file.clone());
        }
        Ok(())
    }

    pub fn is_interactive(&self) -> bool {
        self.commands.is_empty()
    }
}
