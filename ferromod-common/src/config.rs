//! Configuration types for the module bridge

use crate::constants::DEFAULT_LOG_LEVEL;
use crate::error::{BridgeError, Result};
use ferromod_abi::LogLevel;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One module to load into the filter pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Name the proxy resolves to a module table
    pub name: String,
    /// Opaque configuration handed to the module's config constructor
    #[serde(default)]
    pub filter_config: String,
}

impl ModuleConfig {
    pub fn new(name: impl Into<String>, filter_config: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filter_config: filter_config.into(),
        }
    }
}

/// Bridge-wide configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Minimum level for records emitted by modules
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,
    /// Modules to load, in filter-chain order
    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
}

fn default_log_level() -> LogLevel {
    DEFAULT_LOG_LEVEL
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL,
            modules: Vec::new(),
        }
    }
}

impl BridgeConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(input: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.modules.len());
        for module in &self.modules {
            if module.name.trim().is_empty() {
                return Err(BridgeError::Config("module name is required".into()));
            }
            if !seen.insert(module.name.as_str()) {
                return Err(BridgeError::Config(format!(
                    "module '{}' is configured more than once",
                    module.name
                )));
            }
        }
        Ok(())
    }
}
