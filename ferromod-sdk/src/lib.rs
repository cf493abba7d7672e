//! # FerroMod Module SDK
//!
//! Write HTTP filters that a proxy loads as dynamic modules. The SDK hides the
//! raw function tables behind safe wrappers and two traits.
//!
//! ## Features
//!
//! - **Safe Wrappers** - Header and body access with borrows tied to each hook
//! - **Async Resume** - [`ResumeHandle`] continues a suspended stream from any thread
//! - **Host Logging** - `log_info!` and friends respect the proxy's log threshold
//! - **Built-in Filters** - Logger, token auth, body rewrite, JSON validation,
//!   delay and header rewrite
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ferromod_sdk::{
//!     declare_module, FilterHandle, HeadersStatus, HttpFilter, HttpFilterInstance,
//!     RequestHeaders,
//! };
//!
//! struct Deny;
//!
//! impl HttpFilter for Deny {
//!     fn new_instance(&self, _: &mut FilterHandle) -> Option<Box<dyn HttpFilterInstance>> {
//!         Some(Box::new(DenyInstance))
//!     }
//! }
//!
//! struct DenyInstance;
//!
//! impl HttpFilterInstance for DenyInstance {
//!     fn on_request_headers(
//!         &mut self,
//!         filter: &mut FilterHandle,
//!         headers: &mut RequestHeaders<'_>,
//!         _end_stream: bool,
//!     ) -> HeadersStatus {
//!         if headers.get("x-blocked").is_some() {
//!             filter.send_response(403, &[("x-reason", "blocked")], b"forbidden");
//!             return HeadersStatus::StopIteration;
//!         }
//!         HeadersStatus::Continue
//!     }
//! }
//!
//! fn new_filter(_config: &str) -> Option<Box<dyn HttpFilter>> {
//!     Some(Box::new(Deny))
//! }
//!
//! declare_module!(new_filter);
//! ```

pub mod body;
pub mod builtin;
#[doc(hidden)]
pub mod ffi;
pub mod handle;
pub mod headers;
#[doc(hidden)]
pub mod log;
pub mod traits;

pub use ferromod_abi as abi;

pub use abi::{BodyStatus, HeadersStatus, LogLevel};
pub use body::{Body, BodyReader, RequestBody, ResponseBody};
pub use handle::{FilterHandle, ResumeHandle};
pub use headers::{Headers, RequestHeaders, ResponseHeaders};
pub use traits::{HttpFilter, HttpFilterInstance, NewHttpFilterFn};
