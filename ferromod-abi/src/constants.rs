//! ABI constants

/// Current ABI generation.
///
/// Both tables carry this value; a host refuses modules built against a
/// different generation and modules refuse a host bridge of another one.
pub const ABI_VERSION: u32 = 1;

/// Symbol under which a dynamic library exports its [`ModuleTableV1`](crate::ModuleTableV1).
pub const MODULE_TABLE_SYMBOL: &str = "ferromod_module_v1";
