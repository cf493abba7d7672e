use crate::filter::HttpFilter;
use crate::module::DynamicModule;
use ferromod_abi::ModuleTableV1;
use ferromod_common::{BridgeConfig, BridgeError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry manages all loaded modules
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, Arc<DynamicModule>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
        }
    }

    /// Load every module named in `config`.
    ///
    /// `resolver` maps a module name to its table; how tables are found
    /// (linked in, opened from disk) is up to the proxy. `config.log_level`
    /// is left to the caller; see [`set_log_level`](crate::set_log_level).
    pub fn load_from_config<F>(config: &BridgeConfig, resolver: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<&'static ModuleTableV1>,
    {
        config.validate()?;

        let mut registry = Self::new();
        for module in &config.modules {
            let table = resolver(&module.name)
                .ok_or_else(|| BridgeError::ModuleNotFound(module.name.clone()))?;
            registry.load(&module.name, table, module.filter_config.as_bytes())?;
        }
        Ok(registry)
    }

    /// Register an already loaded module
    pub fn register(&mut self, module: Arc<DynamicModule>) -> Result<()> {
        if self.modules.contains_key(module.name()) {
            return Err(BridgeError::DuplicateModule(module.name().to_string()));
        }
        tracing::info!("Registered module: {}", module.name());
        self.modules.insert(module.name().to_string(), module);
        Ok(())
    }

    /// Load a module and register it under `name`
    pub fn load(
        &mut self,
        name: &str,
        table: &'static ModuleTableV1,
        filter_config: &[u8],
    ) -> Result<Arc<DynamicModule>> {
        if self.modules.contains_key(name) {
            return Err(BridgeError::DuplicateModule(name.to_string()));
        }
        let module = DynamicModule::load(name, table, filter_config)?;
        self.register(Arc::clone(&module))?;
        Ok(module)
    }

    pub fn get(&self, name: &str) -> Option<Arc<DynamicModule>> {
        self.modules.get(name).cloned()
    }

    /// Remove a module. Filters created from it keep it loaded until they
    /// are destroyed.
    pub fn unload(&mut self, name: &str) -> Result<()> {
        self.modules
            .remove(name)
            .map(|module| {
                tracing::info!(
                    "Unregistered module: {} ({} references left)",
                    name,
                    Arc::strong_count(&module) - 1
                );
            })
            .ok_or_else(|| BridgeError::ModuleNotFound(name.to_string()))
    }

    /// Registered module names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Create a filter for a new stream bound to `name`.
    pub fn new_filter(&self, name: &str) -> Result<HttpFilter> {
        let module = self
            .get(name)
            .ok_or_else(|| BridgeError::ModuleNotFound(name.to_string()))?;
        Ok(HttpFilter::new(module))
    }
}
