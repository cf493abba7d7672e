//! Error types for `FerroMod`
//!
//! Only module loading and configuration can fail. The per-request bridge
//! surface never reports errors: absent data is a null pointer and zero length.

use thiserror::Error;

/// Main error type for `FerroMod` operations
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Module was built against another ABI generation
    #[error("ABI version mismatch: host speaks v{expected}, module declares v{found}")]
    AbiVersionMismatch { expected: u32, found: u32 },

    /// Module refused its configuration
    #[error("Module initialization failed: {0}")]
    ModuleInit(String),

    /// No module registered under that name
    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    /// A module with the same name is already registered
    #[error("Module already registered: {0}")]
    DuplicateModule(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, BridgeError>;

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Serialization(err.to_string())
    }
}
