//! Session options.

use crate::cache::{format_ttl, parse_ttl};
use crate::error::ShellError;
use crate::shell::handlers::{CommandHandler, CommandOutcome, HandlerCtx};
use crate::shell::output::{CommandOutput, OutputFormat};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

fn on_off(value: &str, input: &str) -> Result<bool, ShellError> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(ShellError::invalid_argument("expected on or off", input)),
    }
}

fn is_off(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "off" | "none" | "-")
}

fn valid_region(region: &str) -> bool {
    !region.is_empty()
        && region
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// `set <option> <value>`.
pub struct SetOption;

#[async_trait]
impl CommandHandler for SetOption {
    async fn run(&self, ctx: &mut HandlerCtx<'_>) -> Result<CommandOutcome, ShellError> {
        let option = ctx.node.label.clone();
        let value = match ctx.args {
            [value] => value.clone(),
            [] => {
                return Err(ShellError::invalid_argument(
                    format!("usage: set {} <value>", option),
                    ctx.input,
                ))
            }
            _ => ctx.args.join(" "),
        };
        let input = ctx.input;

        let message = match option.as_str() {
            "profile" => {
                if value.trim().is_empty() {
                    return Err(ShellError::invalid_argument("profile name is empty", input));
                }
                ctx.options.profile = Some(value.clone());
                ctx.pins.clear();
                format!("Profile set to {}", value)
            }
            "regions" => {
                if value.eq_ignore_ascii_case("all") {
                    ctx.options.regions.clear();
                    ctx.pins.clear();
                    "Regions cleared (all regions)".to_string()
                } else {
                    let regions: Vec<String> = value
                        .split(',')
                        .map(|r| r.trim().to_ascii_lowercase())
                        .filter(|r| !r.is_empty())
                        .collect();
                    if regions.is_empty() || !regions.iter().all(|r| valid_region(r)) {
                        return Err(ShellError::invalid_argument(
                            "expected a comma-separated list of regions, e.g. us-east-1,eu-west-1",
                            input,
                        ));
                    }
                    ctx.options.regions = regions;
                    ctx.pins.clear();
                    format!("Regions set to {}", ctx.options.regions.join(", "))
                }
            }
            "cache-ttl" => {
                let ttl = parse_ttl(&value).map_err(|e| ShellError::invalid_argument(e, input))?;
                ctx.inventory.cache().set_default_ttl(ttl);
                format!("Cache TTL set to {}", format_ttl(ttl))
            }
            "no-cache" => {
                ctx.options.no_cache = on_off(&value, input)?;
                format!(
                    "Cache bypass {}",
                    if ctx.options.no_cache { "on" } else { "off" }
                )
            }
            "output-format" => {
                let format: OutputFormat = value
                    .parse()
                    .map_err(|e: String| ShellError::invalid_argument(e, input))?;
                ctx.options.output_format = format;
                format!("Output format set to {}", format)
            }
            "output-file" => {
                if is_off(&value) {
                    ctx.options.output_file = None;
                    "Output file disabled".to_string()
                } else {
                    ctx.options.output_file = Some(PathBuf::from(&value));
                    format!("Appending output to {}", value)
                }
            }
            "watch" => {
                if is_off(&value) {
                    ctx.options.watch_interval = None;
                    "Watch mode off".to_string()
                } else {
                    let secs: u64 = value
                        .parse()
                        .ok()
                        .filter(|s| *s > 0)
                        .ok_or_else(|| {
                            ShellError::invalid_argument("expected seconds > 0 or off", input)
                        })?;
                    ctx.options.watch_interval = Some(secs);
                    format!("Watch mode on: the next show repeats every {}s", secs)
                }
            }
            other => {
                return Err(ShellError::not_implemented(
                    format!("option {} has no setter", other),
                    input,
                ))
            }
        };
        info!(option = %option, value = %value, "Session option changed");
        Ok(CommandOutcome::output(CommandOutput::message(message)))
    }
}

/// `show config` and `show running-config`.
pub struct ShowConfig {
    pub running: bool,
}

#[async_trait]
impl CommandHandler for ShowConfig {
    async fn run(&self, ctx: &mut HandlerCtx<'_>) -> Result<CommandOutcome, ShellError> {
        ctx.no_args()?;
        let options = &*ctx.options;
        let cache = ctx.inventory.cache();
        let fields = vec![
            (
                "profile".to_string(),
                options.profile.clone().unwrap_or_else(|| "default".to_string()),
            ),
            (
                "regions".to_string(),
                if options.regions.is_empty() {
                    "all".to_string()
                } else {
                    options.regions.join(",")
                },
            ),
            ("no-cache".to_string(), if options.no_cache { "on" } else { "off" }.to_string()),
            ("output-format".to_string(), options.output_format.to_string()),
            (
                "output-file".to_string(),
                options
                    .output_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "off".to_string()),
            ),
            (
                "watch".to_string(),
                options
                    .watch_interval
                    .map(|s| format!("{}s", s))
                    .unwrap_or_else(|| "off".to_string()),
            ),
            ("cache-ttl".to_string(), format_ttl(cache.default_ttl())),
            (
                "cache-persistent".to_string(),
                if cache.is_persistent() { "yes" } else { "no" }.to_string(),
            ),
            ("inventory".to_string(), ctx.inventory.provider_name().to_string()),
        ];

        if !self.running {
            return Ok(CommandOutcome::output(CommandOutput::Detail {
                title: "Session".to_string(),
                fields,
            }));
        }

        let body = toml::to_string_pretty(options)
            .map_err(|e| ShellError::Config(format!("failed to render options: {}", e)))?;
        let path = ctx.stack.path_label();
        Ok(CommandOutcome::output(CommandOutput::Sections {
            sections: vec![
                CommandOutput::Detail {
                    title: "Running config".to_string(),
                    fields,
                },
                CommandOutput::Detail {
                    title: "Context".to_string(),
                    fields: vec![
                        (
                            "path".to_string(),
                            if path.is_empty() { "root".to_string() } else { path },
                        ),
                        ("depth".to_string(), ctx.stack.depth().to_string()),
                    ],
                },
                CommandOutput::Document {
                    format: "toml".to_string(),
                    body,
                },
            ],
        }))
    }
}

pub struct ShowVersion;

#[async_trait]
impl CommandHandler for ShowVersion {
    async fn run(&self, ctx: &mut HandlerCtx<'_>) -> Result<CommandOutcome, ShellError> {
        ctx.no_args()?;
        Ok(CommandOutcome::output(CommandOutput::message(format!(
            "awsnet {}",
            env!("CARGO_PKG_VERSION")
        ))))
    }
}
