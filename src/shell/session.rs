//! Per-session state.

use crate::cache::CacheStore;
use crate::context::{ContextStack, SelectionPins};
use crate::inventory::{CachedInventory, InventoryProvider, InventoryScope};
use crate::shell::output::{CommandOutput, OutputFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Options changed with `set <option> <value>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionOptions {
    pub profile: Option<String>,
    pub regions: Vec<String>,
    pub no_cache: bool,
    pub output_format: OutputFormat,
    pub output_file: Option<PathBuf>,
    /// Seconds between watch ticks.
    pub watch_interval: Option<u64>,
}

/// One user's shell state. Commands run against it strictly one at a time.
pub struct Session {
    pub options: SessionOptions,
    pub stack: ContextStack,
    pub pins: SelectionPins,
    pub last_output: Option<CommandOutput>,
    cache: Arc<CacheStore>,
    provider: Arc<dyn InventoryProvider>,
}

impl Session {
    pub fn new(
        provider: Arc<dyn InventoryProvider>,
        cache: Arc<CacheStore>,
        options: SessionOptions,
    ) -> Self {
        Self {
            options,
            stack: ContextStack::new(),
            pins: SelectionPins::default(),
            last_output: None,
            cache,
            provider,
        }
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    pub fn provider(&self) -> &Arc<dyn InventoryProvider> {
        &self.provider
    }

    /// Inventory view for the current profile, regions and no-cache setting.
    pub fn inventory(&self) -> CachedInventory {
        CachedInventory::new(
            self.provider.clone(),
            self.cache.clone(),
            InventoryScope::new(self.options.profile.clone(), self.options.regions.clone()),
            self.options.no_cache,
        )
    }

    /// `awsnet>` at root, `awsnet/vpc:prod/rtb:rtb-1>` below it.
    pub fn prompt(&self) -> String {
        let path = self.stack.path_label();
        if path.is_empty() {
            "awsnet>".to_string()
        } else {
            format!("awsnet/{}>", path)
        }
    }
}
