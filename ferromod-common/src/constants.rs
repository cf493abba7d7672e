//! Defaults shared by the host, the SDK and the observability crate.
//!
//! Use these constants instead of literals so defaults stay consistent
//! across crates.

use ferromod_abi::LogLevel;

/// Minimum level module log records must reach before they are forwarded.
pub const DEFAULT_LOG_LEVEL: LogLevel = LogLevel::Info;

/// `tracing` target under which module log records are emitted.
pub const MODULE_LOG_TARGET: &str = "ferromod::module";

/// Details string attached to local replies synthesized by a module.
pub const LOCAL_REPLY_DETAILS: &str = "dynamic_module";
