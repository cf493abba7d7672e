//! Versioned function tables
//!
//! [`BridgeTableV1`] is owned by the host and handed to the module when a
//! filter configuration is created. [`ModuleTableV1`] is owned by the module
//! and read by the host when the module is loaded.
//!
//! Out-parameters (`*mut *const u8`, `*mut usize`) are written with a null
//! pointer and zero length whenever the requested data is absent.
//!
//! Statuses and log levels cross as raw `u32` values. The receiving side maps
//! them with `from_raw`, so an out-of-range value from a foreign module is
//! handled instead of being an invalid enum.

use crate::handles::{
    FilterPtr, ModuleConfigPtr, ModuleFilterPtr, RequestBodyPtr, RequestHeadersPtr,
    ResponseBodyPtr, ResponseHeadersPtr,
};
use crate::types::{HeaderPair, LogResult};

/// `get(headers, key, key_len, out_ptr, out_len) -> number of values under key`
pub type GetHeaderValueFn<H> =
    unsafe extern "C" fn(H, *const u8, usize, *mut *const u8, *mut usize) -> usize;

/// `get_nth(headers, key, key_len, out_ptr, out_len, nth)`
pub type GetHeaderValueNthFn<H> =
    unsafe extern "C" fn(H, *const u8, usize, *mut *const u8, *mut usize, usize);

/// `set(headers, key, key_len, value_or_null, value_len)`
pub type SetHeaderFn<H> = unsafe extern "C" fn(H, *const u8, usize, *const u8, usize);

pub type BodySlicesCountFn<B> = unsafe extern "C" fn(B) -> usize;

/// `slice(buffer, nth, out_ptr, out_len)`; slices are writable in place.
pub type BodySliceFn<B> = unsafe extern "C" fn(B, usize, *mut *mut u8, *mut usize);

pub type BodyLengthFn<B> = unsafe extern "C" fn(B) -> usize;

/// `append/prepend(buffer, data, data_len)`
pub type BodyWriteFn<B> = unsafe extern "C" fn(B, *const u8, usize);

pub type BodyDrainFn<B> = unsafe extern "C" fn(B, usize);

/// `copy_out(buffer, offset, length, dest)`
pub type BodyCopyOutFn<B> = unsafe extern "C" fn(B, usize, usize, *mut u8);

pub type ContinueFn = unsafe extern "C" fn(FilterPtr);

pub type GetBodyBufferFn<B> = unsafe extern "C" fn(FilterPtr) -> B;

/// `send_response(filter, status, headers, headers_len, body, body_len)`
pub type SendResponseFn =
    unsafe extern "C" fn(FilterPtr, u32, *const HeaderPair, usize, *const u8, usize);

/// `log(file, file_len, line, function, function_len, level, message, message_len)`
pub type LogFn = unsafe extern "C" fn(
    *const u8,
    usize,
    u32,
    *const u8,
    usize,
    u32,
    *const u8,
    usize,
) -> LogResult;

pub type LogEnabledFn = unsafe extern "C" fn(u32) -> bool;

/// Callbacks the host offers to modules.
#[repr(C)]
#[derive(Debug)]
pub struct BridgeTableV1 {
    pub abi_version: u32,

    pub get_request_header_value: GetHeaderValueFn<RequestHeadersPtr>,
    pub get_request_header_value_nth: GetHeaderValueNthFn<RequestHeadersPtr>,
    pub set_request_header: SetHeaderFn<RequestHeadersPtr>,
    pub get_response_header_value: GetHeaderValueFn<ResponseHeadersPtr>,
    pub get_response_header_value_nth: GetHeaderValueNthFn<ResponseHeadersPtr>,
    pub set_response_header: SetHeaderFn<ResponseHeadersPtr>,

    pub get_request_body_buffer_slices_count: BodySlicesCountFn<RequestBodyPtr>,
    pub get_request_body_buffer_slice: BodySliceFn<RequestBodyPtr>,
    pub get_request_body_buffer_length: BodyLengthFn<RequestBodyPtr>,
    pub append_request_body_buffer: BodyWriteFn<RequestBodyPtr>,
    pub prepend_request_body_buffer: BodyWriteFn<RequestBodyPtr>,
    pub drain_request_body_buffer: BodyDrainFn<RequestBodyPtr>,
    pub copy_out_request_body_buffer: BodyCopyOutFn<RequestBodyPtr>,

    pub get_response_body_buffer_slices_count: BodySlicesCountFn<ResponseBodyPtr>,
    pub get_response_body_buffer_slice: BodySliceFn<ResponseBodyPtr>,
    pub get_response_body_buffer_length: BodyLengthFn<ResponseBodyPtr>,
    pub append_response_body_buffer: BodyWriteFn<ResponseBodyPtr>,
    pub prepend_response_body_buffer: BodyWriteFn<ResponseBodyPtr>,
    pub drain_response_body_buffer: BodyDrainFn<ResponseBodyPtr>,
    pub copy_out_response_body_buffer: BodyCopyOutFn<ResponseBodyPtr>,

    pub continue_request: ContinueFn,
    pub continue_response: ContinueFn,
    pub get_request_body_buffer: GetBodyBufferFn<RequestBodyPtr>,
    pub get_response_body_buffer: GetBodyBufferFn<ResponseBodyPtr>,
    pub send_response: SendResponseFn,

    pub log: LogFn,
    pub log_enabled: LogEnabledFn,
}

/// Entry points a module exposes to the host.
///
/// `on_config_new` receives the host bridge and the opaque filter
/// configuration; returning null fails the load. Every other entry point
/// receives the object returned by its matching constructor. Header hooks
/// return a raw [`HeadersStatus`](crate::HeadersStatus), body hooks a raw
/// [`BodyStatus`](crate::BodyStatus).
#[repr(C)]
#[derive(Debug)]
pub struct ModuleTableV1 {
    pub abi_version: u32,

    pub on_config_new: unsafe extern "C" fn(*const BridgeTableV1, *const u8, usize) -> ModuleConfigPtr,
    pub on_config_destroy: unsafe extern "C" fn(ModuleConfigPtr),

    pub on_filter_new: unsafe extern "C" fn(ModuleConfigPtr, FilterPtr) -> ModuleFilterPtr,
    pub on_request_headers: unsafe extern "C" fn(ModuleFilterPtr, RequestHeadersPtr, bool) -> u32,
    pub on_request_body: unsafe extern "C" fn(ModuleFilterPtr, RequestBodyPtr, bool) -> u32,
    pub on_response_headers:
        unsafe extern "C" fn(ModuleFilterPtr, ResponseHeadersPtr, bool) -> u32,
    pub on_response_body: unsafe extern "C" fn(ModuleFilterPtr, ResponseBodyPtr, bool) -> u32,
    pub on_filter_destroy: unsafe extern "C" fn(ModuleFilterPtr),
}
