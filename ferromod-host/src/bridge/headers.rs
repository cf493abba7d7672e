use super::{span, write_out};
use crate::headers::HeaderMapExt;
use ferromod_abi::HeadersHandle;
use http::HeaderMap;
use std::ptr;

/// # Safety
/// A non-null handle must point at a `HeaderMap` lent for the current hook.
unsafe fn header_map<'a, H: HeadersHandle>(headers: H) -> Option<&'a mut HeaderMap> {
    // SAFETY: guaranteed by the caller.
    unsafe { headers.as_raw().cast::<HeaderMap>().as_mut() }
}

pub(super) unsafe extern "C" fn get_header_value<H: HeadersHandle>(
    headers: H,
    key: *const u8,
    key_len: usize,
    out_ptr: *mut *const u8,
    out_len: *mut usize,
) -> usize {
    // SAFETY: the module passes a handle from the current hook and a key span.
    let (map, key) = unsafe { (header_map(headers), span(key, key_len)) };
    let (value, count) = match (map, key) {
        (Some(map), Some(key)) => {
            let map: &HeaderMap = map;
            (map.nth_value(key, 0), map.value_count(key))
        }
        _ => (None, 0),
    };

    let (data, len) = value.map_or((ptr::null(), 0), |v| (v.as_ptr(), v.len()));
    // SAFETY: out-parameters are module-owned and writable, or null.
    unsafe {
        write_out(out_ptr, data);
        write_out(out_len, len);
    }
    count
}

pub(super) unsafe extern "C" fn get_header_value_nth<H: HeadersHandle>(
    headers: H,
    key: *const u8,
    key_len: usize,
    out_ptr: *mut *const u8,
    out_len: *mut usize,
    nth: usize,
) {
    // SAFETY: as in `get_header_value`.
    let (map, key) = unsafe { (header_map(headers), span(key, key_len)) };
    let value = match (map, key) {
        (Some(map), Some(key)) => {
            let map: &HeaderMap = map;
            map.nth_value(key, nth)
        }
        _ => None,
    };

    let (data, len) = value.map_or((ptr::null(), 0), |v| (v.as_ptr(), v.len()));
    // SAFETY: as in `get_header_value`.
    unsafe {
        write_out(out_ptr, data);
        write_out(out_len, len);
    }
}

pub(super) unsafe extern "C" fn set_header<H: HeadersHandle>(
    headers: H,
    key: *const u8,
    key_len: usize,
    value: *const u8,
    value_len: usize,
) {
    // SAFETY: as in `get_header_value`; `value` is null or a readable span.
    let (map, key, value) =
        unsafe { (header_map(headers), span(key, key_len), span(value, value_len)) };
    let (Some(map), Some(key)) = (map, key) else {
        return;
    };
    match value {
        Some(value) => map.replace_value(key, value),
        None => map.remove_all(key),
    }
}
