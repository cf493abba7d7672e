//! A loaded module and its filter configuration

use crate::bridge::BRIDGE_V1;
use ferromod_abi::{ModuleConfigPtr, ModuleTableV1, ABI_VERSION};
use ferromod_common::{BridgeError, Result};
use std::sync::Arc;

/// One module bound to one filter configuration.
///
/// Filters hold an `Arc` to it, so the module's config object is destroyed
/// only after the last filter using it is gone.
pub struct DynamicModule {
    name: String,
    table: &'static ModuleTableV1,
    config: ModuleConfigPtr,
}

// SAFETY: the config object is created once and then only read by the module
// from whichever worker thread runs a stream; modules are required to make it
// thread-safe. The table is immutable and 'static.
unsafe impl Send for DynamicModule {}
// SAFETY: see above.
unsafe impl Sync for DynamicModule {}

impl DynamicModule {
    /// Check the module's ABI version and create its filter configuration.
    pub fn load(
        name: impl Into<String>,
        table: &'static ModuleTableV1,
        filter_config: &[u8],
    ) -> Result<Arc<Self>> {
        let name = name.into();
        if table.abi_version != ABI_VERSION {
            return Err(BridgeError::AbiVersionMismatch {
                expected: ABI_VERSION,
                found: table.abi_version,
            });
        }

        // SAFETY: the bridge table is 'static and the config bytes outlive the
        // call; the module copies whatever it keeps.
        let config = unsafe {
            (table.on_config_new)(
                &BRIDGE_V1,
                filter_config.as_ptr(),
                filter_config.len(),
            )
        };
        if config.is_null() {
            return Err(BridgeError::ModuleInit(format!(
                "module '{}' rejected its configuration",
                name
            )));
        }

        tracing::info!(module = %name, "Loaded module");
        Ok(Arc::new(Self {
            name,
            table,
            config,
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn table(&self) -> &'static ModuleTableV1 {
        self.table
    }

    pub(crate) fn config(&self) -> ModuleConfigPtr {
        self.config
    }
}

impl std::fmt::Debug for DynamicModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicModule")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Drop for DynamicModule {
    fn drop(&mut self) {
        // SAFETY: `config` came from this table's constructor and is destroyed
        // exactly once, after every filter holding this module is gone.
        unsafe { (self.table.on_config_destroy)(self.config) };
        tracing::info!(module = %self.name, "Unloaded module");
    }
}
