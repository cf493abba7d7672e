//! Common utilities and types for `FerroMod`

pub mod config;
pub mod constants;
pub mod error;

pub use config::{BridgeConfig, ModuleConfig};
pub use constants::{DEFAULT_LOG_LEVEL, LOCAL_REPLY_DETAILS, MODULE_LOG_TARGET};
pub use error::{BridgeError, Result};
