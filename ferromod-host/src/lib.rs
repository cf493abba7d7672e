//! Proxy side of the FerroMod bridge
//!
//! Wires a proxy's HTTP filter pipeline to dynamic modules:
//!
//! - [`Buffer`] and `http::HeaderMap` are the body and header collections
//!   modules operate on through [`BRIDGE_V1`].
//! - [`HttpFilter`] drives one module instance per stream and owns the
//!   lifecycle and continuation rules.
//! - [`FilterCallbacks`] and [`Dispatcher`] are what the proxy supplies per
//!   stream.
//! - [`DynamicModule`] and [`ModuleRegistry`] handle loading.

pub mod bridge;
pub mod buffer;
pub mod callbacks;
pub mod dispatcher;
pub mod filter;
pub mod headers;
pub mod log;
pub mod module;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use bridge::BRIDGE_V1;
pub use buffer::Buffer;
pub use callbacks::FilterCallbacks;
pub use dispatcher::{Dispatcher, EventLoop, Task};
pub use filter::{ContinuationState, HttpFilter, Lifecycle};
pub use headers::HeaderMapExt;
pub use log::{log_sink, set_log_level, set_log_sink, LogRecord, LogSink, TracingSink};
pub use module::DynamicModule;
pub use registry::ModuleRegistry;
