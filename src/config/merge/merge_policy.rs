//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Later sources override earlier ones key by key; tables merge, lists replace.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("session.regions", Vec::<String>::new())?
        .set_default("session.output_format", "table")?
        .set_default("session.no_cache", false)?
        .set_default("cache.ttl", "15m")?
        .set_default("cache.persist", true)?
        .set_default("cache.max_attempts", 3)?
        .set_default("cache.retry_backoff_ms", 200)?
        .set_default("logging.enabled", true)?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "text")?
        .set_default("logging.output", "file")?
        .set_default("logging.color", true)
}
