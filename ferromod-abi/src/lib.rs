//! `FerroMod` ABI
//!
//! This crate defines the C-callable surface shared by the proxy-side host
//! (`ferromod-host`) and dynamically loaded modules (`ferromod-sdk`). It holds
//! no logic: only handle types, `#[repr(C)]` enums and the two versioned
//! function tables.
//!
//! ```text
//!   proxy ──ModuleTableV1──▶ module      (entry points, module-owned)
//!   proxy ◀──BridgeTableV1── module      (callbacks, proxy-owned)
//! ```

pub mod constants;
pub mod handles;
pub mod table;
pub mod types;

pub use constants::ABI_VERSION;
pub use handles::{
    BodyHandle, FilterPtr, HeadersHandle, ModuleConfigPtr, ModuleFilterPtr, RequestBodyPtr,
    RequestHeadersPtr, ResponseBodyPtr, ResponseHeadersPtr,
};
pub use table::{BridgeTableV1, ModuleTableV1};
pub use types::{BodyStatus, Direction, HeaderPair, HeadersStatus, LogLevel, LogResult};
