//! Configuration System
//!
//! Layered configuration for the shell: built-in defaults, then the global file, then
//! an explicit `--config` file, then `AWSNET__SECTION__KEY` environment variables.
//! Command-line flags are applied last by the binary.

use crate::cache::{parse_ttl, RetryPolicy};
use crate::logging::LoggingConfig;
use crate::shell::{OutputFormat, SessionOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

mod merge;
pub mod paths;
mod sources;

use merge::merge_policy;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShellConfig {
    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub inventory: InventoryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Initial session options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub profile: Option<String>,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub output_format: OutputFormat,
    #[serde(default)]
    pub no_cache: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// `15m`, `1h`, `2d`; a bare number is minutes.
    #[serde(default = "default_ttl")]
    pub ttl: String,
    /// Keep entries in a sled database between runs.
    #[serde(default = "default_true")]
    pub persist: bool,
    /// Database path; defaults to the cache directory.
    pub path: Option<PathBuf>,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_ttl() -> String {
    "15m".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    200
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: default_ttl(),
            persist: true,
            path: None,
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Result<Duration, String> {
        parse_ttl(&self.ttl)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    /// Configured path, else `$XDG_CACHE_HOME/awsnet/cache.sled`.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.path.clone().or_else(paths::default_cache_path)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// JSON topology file served by the snapshot provider.
    pub snapshot: Option<PathBuf>,
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Session(String),
    Cache(String),
    Inventory(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Session(msg) => write!(f, "Session: {}", msg),
            ValidationError::Cache(msg) => write!(f, "Cache: {}", msg),
            ValidationError::Inventory(msg) => write!(f, "Inventory: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ShellConfig {
    /// Validate the entire configuration, reporting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.session.profile.as_deref() == Some("") {
            errors.push(ValidationError::Session("profile cannot be empty".to_string()));
        }
        for region in &self.session.regions {
            if region.trim().is_empty() || region.contains(char::is_whitespace) {
                errors.push(ValidationError::Session(format!("invalid region '{}'", region)));
            }
        }

        if let Err(e) = self.cache.ttl() {
            errors.push(ValidationError::Cache(e));
        }
        if self.cache.max_attempts == 0 {
            errors.push(ValidationError::Cache("max_attempts must be at least 1".to_string()));
        }
        if self.cache.persist && self.cache.resolved_path().is_none() {
            errors.push(ValidationError::Cache(
                "persist is on but no cache path could be determined".to_string(),
            ));
        }

        if let Some(snapshot) = &self.inventory.snapshot {
            if !snapshot.exists() {
                errors.push(ValidationError::Inventory(format!(
                    "snapshot file {} does not exist",
                    snapshot.display()
                )));
            }
        }

        errors.extend(self.logging.problems().into_iter().map(ValidationError::Logging));

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Session options a new session starts with.
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            profile: self.session.profile.clone(),
            regions: self.session.regions.clone(),
            no_cache: self.session.no_cache,
            output_format: self.session.output_format,
            ..SessionOptions::default()
        }
    }
}

/// Loads `ShellConfig` through the layered sources.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    global_file: Option<PathBuf>,
    explicit_file: Option<PathBuf>,
    environment: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            global_file: paths::global_config_path(),
            explicit_file: None,
            environment: true,
        }
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace (or drop) the global file location.
    pub fn global_file(mut self, path: Option<PathBuf>) -> Self {
        self.global_file = path;
        self
    }

    pub fn explicit_file(mut self, path: Option<PathBuf>) -> Self {
        self.explicit_file = path;
        self
    }

    pub fn environment(mut self, enabled: bool) -> Self {
        self.environment = enabled;
        self
    }

    /// Defaults, global file, environment.
    pub fn load_default() -> Result<ShellConfig, config::ConfigError> {
        Self::new().load()
    }

    /// Defaults, global file, `path`, environment.
    pub fn load_from_file(path: &Path) -> Result<ShellConfig, config::ConfigError> {
        Self::new().explicit_file(Some(path.to_path_buf())).load()
    }

    pub fn load(&self) -> Result<ShellConfig, config::ConfigError> {
        let mut builder = merge_policy::builder_with_defaults()?;
        builder = sources::global_file::add_to_builder(builder, self.global_file.as_deref())?;
        if let Some(path) = &self.explicit_file {
            builder = sources::explicit_file::add_to_builder(builder, path)?;
        }
        if self.environment {
            builder = sources::environment::add_to_builder(builder);
        }
        let config: ShellConfig = builder.build()?.try_deserialize()?;
        debug!(
            explicit = ?self.explicit_file,
            persist = config.cache.persist,
            "Configuration loaded"
        );
        Ok(config)
    }
}
