//! Environment source: AWSNET__SECTION__KEY, e.g. `AWSNET__CACHE__TTL=1h`.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

pub const PREFIX: &str = "AWSNET";

/// `session.regions` is read as a comma-separated list.
pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(PREFIX)
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("session.regions")
            .try_parsing(true),
    )
}
