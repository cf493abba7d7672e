//! `extern "C"` implementations of [`BridgeTableV1`]
//!
//! Request and response accessors share one generic implementation per
//! operation, instantiated for each handle type. Every function tolerates
//! null handles and null pointers by treating them as "nothing here".

mod body;
mod filter;
mod headers;
mod log;

use ferromod_abi::{
    BridgeTableV1, RequestBodyPtr, RequestHeadersPtr, ResponseBodyPtr, ResponseHeadersPtr,
    ABI_VERSION,
};

/// The table handed to every module at config creation.
pub static BRIDGE_V1: BridgeTableV1 = BridgeTableV1 {
    abi_version: ABI_VERSION,

    get_request_header_value: headers::get_header_value::<RequestHeadersPtr>,
    get_request_header_value_nth: headers::get_header_value_nth::<RequestHeadersPtr>,
    set_request_header: headers::set_header::<RequestHeadersPtr>,
    get_response_header_value: headers::get_header_value::<ResponseHeadersPtr>,
    get_response_header_value_nth: headers::get_header_value_nth::<ResponseHeadersPtr>,
    set_response_header: headers::set_header::<ResponseHeadersPtr>,

    get_request_body_buffer_slices_count: body::slices_count::<RequestBodyPtr>,
    get_request_body_buffer_slice: body::slice::<RequestBodyPtr>,
    get_request_body_buffer_length: body::length::<RequestBodyPtr>,
    append_request_body_buffer: body::append::<RequestBodyPtr>,
    prepend_request_body_buffer: body::prepend::<RequestBodyPtr>,
    drain_request_body_buffer: body::drain::<RequestBodyPtr>,
    copy_out_request_body_buffer: body::copy_out::<RequestBodyPtr>,

    get_response_body_buffer_slices_count: body::slices_count::<ResponseBodyPtr>,
    get_response_body_buffer_slice: body::slice::<ResponseBodyPtr>,
    get_response_body_buffer_length: body::length::<ResponseBodyPtr>,
    append_response_body_buffer: body::append::<ResponseBodyPtr>,
    prepend_response_body_buffer: body::prepend::<ResponseBodyPtr>,
    drain_response_body_buffer: body::drain::<ResponseBodyPtr>,
    copy_out_response_body_buffer: body::copy_out::<ResponseBodyPtr>,

    continue_request: filter::continue_request,
    continue_response: filter::continue_response,
    get_request_body_buffer: filter::get_body_buffer::<RequestBodyPtr>,
    get_response_body_buffer: filter::get_body_buffer::<ResponseBodyPtr>,
    send_response: filter::send_response,

    log: log::log,
    log_enabled: log::log_enabled,
};

/// View a module-supplied span. Null means absent; a zero length with a
/// non-null pointer is the empty span.
///
/// # Safety
/// A non-null `data` must be valid for reads of `len` bytes for `'a`.
unsafe fn span<'a>(data: *const u8, len: usize) -> Option<&'a [u8]> {
    if data.is_null() {
        return None;
    }
    if len == 0 {
        return Some(&[]);
    }
    // SAFETY: guaranteed by the caller.
    Some(unsafe { std::slice::from_raw_parts(data, len) })
}

/// Store `value` through an out-parameter unless it is null.
///
/// # Safety
/// A non-null `out` must be valid for writes.
unsafe fn write_out<T>(out: *mut T, value: T) {
    if !out.is_null() {
        // SAFETY: guaranteed by the caller.
        unsafe { out.write(value) };
    }
}
