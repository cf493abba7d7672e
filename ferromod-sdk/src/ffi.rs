//! Entry-point shims behind [`declare_module!`](crate::declare_module)
//!
//! Each shim turns raw handles back into the module's objects and calls the
//! matching trait method. Nothing here is meant to be called directly.

use crate::body::Body;
use crate::handle::FilterHandle;
use crate::headers::Headers;
use crate::traits::{HttpFilter, HttpFilterInstance, NewHttpFilterFn};
use ferromod_abi::{
    BodyStatus, BridgeTableV1, FilterPtr, HeadersStatus, ModuleConfigPtr,
    ModuleFilterPtr, RequestBodyPtr, RequestHeadersPtr, ResponseBodyPtr, ResponseHeadersPtr,
    ABI_VERSION,
};
use std::ffi::c_void;
use std::sync::OnceLock;

static BRIDGE: OnceLock<&'static BridgeTableV1> = OnceLock::new();

/// The host bridge, once any configuration has been created.
pub(crate) fn bridge() -> Option<&'static BridgeTableV1> {
    BRIDGE.get().copied()
}

struct ModuleConfig {
    bridge: &'static BridgeTableV1,
    filter: Box<dyn HttpFilter>,
}

struct ModuleFilter {
    handle: FilterHandle,
    instance: Box<dyn HttpFilterInstance>,
}

/// Create a filter configuration through `factory`.
///
/// # Safety
/// `bridge` must be null or point at a table that lives for the rest of the
/// process. `config` must be readable for `len` bytes.
#[doc(hidden)]
pub unsafe fn init_module(
    bridge: *const BridgeTableV1,
    config: *const u8,
    len: usize,
    factory: NewHttpFilterFn,
) -> ModuleConfigPtr {
    // SAFETY: guaranteed by the caller.
    let Some(bridge) = (unsafe { bridge.as_ref() }) else {
        return ModuleConfigPtr::null();
    };
    if bridge.abi_version != ABI_VERSION {
        return ModuleConfigPtr::null();
    }
    BRIDGE.get_or_init(|| bridge);

    let bytes: &[u8] = if config.is_null() || len == 0 {
        &[]
    } else {
        // SAFETY: guaranteed by the caller.
        unsafe { std::slice::from_raw_parts(config, len) }
    };
    let Ok(config) = std::str::from_utf8(bytes) else {
        crate::log_error!("filter configuration is not valid UTF-8");
        return ModuleConfigPtr::null();
    };

    match factory(config) {
        Some(filter) => {
            let raw = Box::into_raw(Box::new(ModuleConfig { bridge, filter }));
            ModuleConfigPtr::from_raw(raw.cast::<c_void>())
        }
        None => ModuleConfigPtr::null(),
    }
}

/// # Safety
/// `config` must be null or come from [`init_module`], destroyed once.
#[doc(hidden)]
pub unsafe extern "C" fn on_config_destroy(config: ModuleConfigPtr) {
    if config.is_null() {
        return;
    }
    // SAFETY: the host hands back the pointer `init_module` leaked.
    let mut config = unsafe { Box::from_raw(config.as_raw().cast::<ModuleConfig>()) };
    config.filter.destroy();
}

/// # Safety
/// `config` must be a live configuration and `filter` a live host filter.
#[doc(hidden)]
pub unsafe extern "C" fn on_filter_new(
    config: ModuleConfigPtr,
    filter: FilterPtr,
) -> ModuleFilterPtr {
    // SAFETY: the configuration outlives every filter created from it.
    let Some(config) = (unsafe { config.as_raw().cast::<ModuleConfig>().as_ref() }) else {
        return ModuleFilterPtr::null();
    };
    let mut handle = FilterHandle::new(config.bridge, filter);
    match config.filter.new_instance(&mut handle) {
        Some(instance) => {
            let raw = Box::into_raw(Box::new(ModuleFilter { handle, instance }));
            ModuleFilterPtr::from_raw(raw.cast::<c_void>())
        }
        None => ModuleFilterPtr::null(),
    }
}

/// # Safety
/// `filter` must be null or a live object returned by [`on_filter_new`].
unsafe fn filter_mut<'a>(filter: ModuleFilterPtr) -> Option<&'a mut ModuleFilter> {
    // SAFETY: hooks for one stream never run concurrently.
    unsafe { filter.as_raw().cast::<ModuleFilter>().as_mut() }
}

/// # Safety
/// `filter` must be live; `headers` must be valid for the call.
#[doc(hidden)]
pub unsafe extern "C" fn on_request_headers(
    filter: ModuleFilterPtr,
    headers: RequestHeadersPtr,
    end_stream: bool,
) -> u32 {
    // SAFETY: guaranteed by the caller.
    let Some(ModuleFilter { handle, instance }) = (unsafe { filter_mut(filter) }) else {
        return HeadersStatus::Continue as u32;
    };
    // SAFETY: the headers are lent for this call only.
    let mut headers = unsafe { Headers::from_raw(handle.bridge(), headers) };
    instance.on_request_headers(handle, &mut headers, end_stream) as u32
}

/// # Safety
/// `filter` must be live; `body` must be valid for the call.
#[doc(hidden)]
pub unsafe extern "C" fn on_request_body(
    filter: ModuleFilterPtr,
    body: RequestBodyPtr,
    end_stream: bool,
) -> u32 {
    // SAFETY: guaranteed by the caller.
    let Some(ModuleFilter { handle, instance }) = (unsafe { filter_mut(filter) }) else {
        return BodyStatus::Continue as u32;
    };
    // SAFETY: the buffer is lent for this call only.
    let mut body = unsafe { Body::from_raw(handle.bridge(), body) };
    instance.on_request_body(handle, &mut body, end_stream) as u32
}

/// # Safety
/// `filter` must be live; `headers` must be valid for the call.
#[doc(hidden)]
pub unsafe extern "C" fn on_response_headers(
    filter: ModuleFilterPtr,
    headers: ResponseHeadersPtr,
    end_stream: bool,
) -> u32 {
    // SAFETY: guaranteed by the caller.
    let Some(ModuleFilter { handle, instance }) = (unsafe { filter_mut(filter) }) else {
        return HeadersStatus::Continue as u32;
    };
    // SAFETY: the headers are lent for this call only.
    let mut headers = unsafe { Headers::from_raw(handle.bridge(), headers) };
    instance.on_response_headers(handle, &mut headers, end_stream) as u32
}

/// # Safety
/// `filter` must be live; `body` must be valid for the call.
#[doc(hidden)]
pub unsafe extern "C" fn on_response_body(
    filter: ModuleFilterPtr,
    body: ResponseBodyPtr,
    end_stream: bool,
) -> u32 {
    // SAFETY: guaranteed by the caller.
    let Some(ModuleFilter { handle, instance }) = (unsafe { filter_mut(filter) }) else {
        return BodyStatus::Continue as u32;
    };
    // SAFETY: the buffer is lent for this call only.
    let mut body = unsafe { Body::from_raw(handle.bridge(), body) };
    instance.on_response_body(handle, &mut body, end_stream) as u32
}

/// # Safety
/// `filter` must be null or come from [`on_filter_new`], destroyed once.
#[doc(hidden)]
pub unsafe extern "C" fn on_filter_destroy(filter: ModuleFilterPtr) {
    if filter.is_null() {
        return;
    }
    // SAFETY: the host hands back the pointer `on_filter_new` leaked.
    let mut filter = unsafe { Box::from_raw(filter.as_raw().cast::<ModuleFilter>()) };
    let ModuleFilter { handle, instance } = &mut *filter;
    instance.destroy(handle);
    handle.invalidate();
}

/// Build the module table for `factory`.
///
/// Prefer [`declare_module!`](crate::declare_module), which also exports it.
#[doc(hidden)]
#[macro_export]
macro_rules! module_table {
    ($factory:expr) => {{
        unsafe extern "C" fn on_config_new(
            bridge: *const $crate::abi::BridgeTableV1,
            config: *const u8,
            len: usize,
        ) -> $crate::abi::ModuleConfigPtr {
            // SAFETY: the host passes its 'static bridge and a readable span.
            unsafe { $crate::ffi::init_module(bridge, config, len, $factory) }
        }

        $crate::abi::ModuleTableV1 {
            abi_version: $crate::abi::ABI_VERSION,
            on_config_new,
            on_config_destroy: $crate::ffi::on_config_destroy,
            on_filter_new: $crate::ffi::on_filter_new,
            on_request_headers: $crate::ffi::on_request_headers,
            on_request_body: $crate::ffi::on_request_body,
            on_response_headers: $crate::ffi::on_response_headers,
            on_response_body: $crate::ffi::on_response_body,
            on_filter_destroy: $crate::ffi::on_filter_destroy,
        }
    }};
}

/// Export a module whose filters are built by `factory`.
///
/// With one argument the table is exported under the symbol the proxy looks
/// up. With a name first it becomes an ordinary static, which is how several
/// modules share one binary.
///
/// ```ignore
/// fn new_filter(config: &str) -> Option<Box<dyn HttpFilter>> { /* ... */ }
/// ferromod_sdk::declare_module!(new_filter);
/// ```
#[macro_export]
macro_rules! declare_module {
    ($factory:expr) => {
        #[no_mangle]
        #[allow(non_upper_case_globals)]
        pub static ferromod_module_v1: $crate::abi::ModuleTableV1 =
            $crate::module_table!($factory);
    };
    ($name:ident, $factory:expr) => {
        pub static $name: $crate::abi::ModuleTableV1 = $crate::module_table!($factory);
    };
}

