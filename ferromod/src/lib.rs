//! # `FerroMod`
//!
//! A bridge between an HTTP proxy's filter pipeline and dynamically loaded
//! filter modules.
//!
//! ## Overview
//!
//! The proxy drives one [`HttpFilter`] per module per stream. Each filter
//! lazily creates the module's per-stream object and forwards header and body
//! events to it. Modules call back into the proxy through a versioned table of
//! C functions to read and edit headers and bodies, send local replies, log,
//! and resume suspended streams from any thread.
//!
//! ## Features
//!
//! - **Stable ABI** - Versioned `#[repr(C)]` tables in both directions
//! - **Safe SDK** - Module authors implement two traits; no raw pointers
//! - **Thread-Safe Resume** - Continuations are posted to the stream's event loop
//! - **Observable** - `tracing` diagnostics and optional Prometheus metrics
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ferromod::prelude::*;
//! use ferromod::http::HeaderMap;
//!
//! # fn example() -> ferromod::Result<()> {
//! let bridge = Bridge::builder()
//!     .builtin("auth", r#"{"kind":"token_auth","tokens":["secret"]}"#)
//!     .build()?;
//!
//! let mut filter = bridge.new_filter("auth")?;
//! let mut headers = HeaderMap::new();
//! let status = filter.decode_headers(&mut headers, true);
//! # let _ = status;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`ferromod-abi`](abi) - Handle types, status enums and function tables
//! - [`ferromod-common`](common) - Shared configuration and errors
//! - [`ferromod-host`](host) - Proxy side of the bridge
//! - [`ferromod-sdk`](sdk) - Module side of the bridge and bundled filters
//! - [`ferromod-observability`](observability) - Tracing and metrics setup

pub mod bridge;

// Re-export subcrates
pub use ferromod_abi as abi;
pub use ferromod_common as common;
pub use ferromod_host as host;
pub use ferromod_observability as observability;
pub use ferromod_sdk as sdk;

pub use http;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::bridge::{Bridge, BridgeBuilder};
    pub use crate::common::{BridgeConfig, BridgeError, ModuleConfig, Result};
    pub use crate::host::{
        Buffer, Dispatcher, EventLoop, FilterCallbacks, HttpFilter, ModuleRegistry,
    };
    pub use crate::abi::{BodyStatus, HeadersStatus, LogLevel};
    pub use crate::observability::{ObservabilityConfig, TracingConfig};
}

// Convenience re-exports at crate root
pub use abi::{BodyStatus, HeadersStatus, LogLevel};
pub use bridge::{Bridge, BridgeBuilder};
pub use common::{BridgeConfig, BridgeError, ModuleConfig, Result};
pub use host::{Buffer, Dispatcher, EventLoop, FilterCallbacks, HttpFilter, ModuleRegistry};
pub use observability::{ObservabilityConfig, TracingConfig};
