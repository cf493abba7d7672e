//! Embeddable module bridge with builder pattern.
//!
//! # Example
//!
//! ```rust,no_run
//! use ferromod::{Bridge, LogLevel};
//!
//! # fn example() -> ferromod::Result<()> {
//! let bridge = Bridge::builder()
//!     .log_level(LogLevel::Debug)
//!     .builtin("auth", r#"{"kind":"token_auth","tokens":["secret"]}"#)
//!     .builtin("headers", r#"{"kind":"header_rewrite","request":{"set":{"x-env":"prod"}}}"#)
//!     .build()?;
//!
//! let chain = bridge.new_filter_chain()?;
//! assert_eq!(chain.len(), 2);
//! # Ok(())
//! # }
//! ```

use ferromod_abi::{LogLevel, ModuleTableV1};
use ferromod_common::{BridgeConfig, BridgeError, ModuleConfig, Result};
use ferromod_host::{set_log_level, HttpFilter, ModuleRegistry};
use ferromod_observability::{init_observability, ObservabilityConfig};
use ferromod_sdk::builtin::BUILTIN_MODULE;
use std::collections::HashMap;
use tracing::{info, warn};

/// Loaded modules plus the order their filters run in.
///
/// Use [`Bridge::builder()`] to assemble one.
pub struct Bridge {
    registry: ModuleRegistry,
    chain: Vec<String>,
    log_level: LogLevel,
}

/// Builder for constructing a [`Bridge`].
#[derive(Debug, Default)]
pub struct BridgeBuilder {
    config: BridgeConfig,
    tables: HashMap<String, &'static ModuleTableV1>,
    observability: Option<ObservabilityConfig>,
}

impl Bridge {
    pub fn builder() -> BridgeBuilder {
        BridgeBuilder::default()
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Threshold applied to module logs when this bridge was built.
    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    /// Module names in filter-chain order.
    pub fn chain(&self) -> &[String] {
        &self.chain
    }

    /// Create the filter for one module.
    pub fn new_filter(&self, name: &str) -> Result<HttpFilter> {
        self.registry.new_filter(name)
    }

    /// Create one filter per module, in chain order, for a new stream.
    pub fn new_filter_chain(&self) -> Result<Vec<HttpFilter>> {
        self.chain
            .iter()
            .map(|name| self.registry.new_filter(name))
            .collect()
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("chain", &self.chain)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl BridgeBuilder {
    /// Start from a parsed configuration. Its modules are resolved against
    /// the tables registered with [`table`](Self::table).
    #[must_use]
    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.log_level = level;
        self
    }

    /// Install tracing and metrics before any module is loaded.
    #[must_use]
    pub fn observability(mut self, config: ObservabilityConfig) -> Self {
        self.observability = Some(config);
        self
    }

    /// Make `table` resolvable under `name` without adding it to the chain.
    #[must_use]
    pub fn table(mut self, name: impl Into<String>, table: &'static ModuleTableV1) -> Self {
        self.tables.insert(name.into(), table);
        self
    }

    /// Append a module to the chain.
    #[must_use]
    pub fn module(
        self,
        name: impl Into<String>,
        table: &'static ModuleTableV1,
        filter_config: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let mut builder = self.table(name.clone(), table);
        builder
            .config
            .modules
            .push(ModuleConfig::new(name, filter_config));
        builder
    }

    /// Append a bundled filter to the chain.
    #[must_use]
    pub fn builtin(self, name: impl Into<String>, filter_config: impl Into<String>) -> Self {
        self.module(name, &BUILTIN_MODULE, filter_config)
    }

    /// Load every module.
    ///
    /// The module log sink is process-wide: on success its threshold is set to
    /// the configured log level, replacing whatever an earlier bridge set.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, a module name has no
    /// table, or a module rejects its configuration.
    pub fn build(self) -> Result<Bridge> {
        if let Some(observability) = self.observability {
            // An embedding proxy usually owns the subscriber already.
            if let Err(e) = init_observability(observability) {
                warn!("Observability setup skipped: {:#}", e);
            }
        }

        let tables = self.tables;
        let registry =
            ModuleRegistry::load_from_config(&self.config, |name| tables.get(name).copied())?;
        let chain: Vec<String> = self.config.modules.into_iter().map(|m| m.name).collect();
        if chain.is_empty() {
            return Err(BridgeError::Config("no modules configured".into()));
        }
        let log_level = self.config.log_level;
        set_log_level(log_level);
        info!(modules = ?chain, %log_level, "Bridge ready");
        Ok(Bridge {
            registry,
            chain,
            log_level,
        })
    }
}
