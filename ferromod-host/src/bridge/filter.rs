use super::span;
use crate::filter::FilterShared;
use ferromod_abi::{BodyHandle, Direction, FilterPtr, HeaderPair};
use http::header::{HeaderName, HeaderValue};
use std::ptr;
use std::sync::Arc;

/// Borrow the filter behind a handle.
///
/// # Safety
/// A non-null handle must come from a live `HttpFilter`.
unsafe fn filter_ref<'a>(filter: FilterPtr) -> Option<&'a FilterShared> {
    // SAFETY: guaranteed by the caller.
    unsafe { filter.as_raw().cast::<FilterShared>().cast_const().as_ref() }
}

/// Take a new strong reference to the filter behind a handle.
///
/// # Safety
/// As for [`filter_ref`]; the handle must be `Arc::as_ptr` of the shared state.
unsafe fn filter_arc(filter: FilterPtr) -> Option<Arc<FilterShared>> {
    let raw = filter.as_raw().cast::<FilterShared>().cast_const();
    if raw.is_null() {
        return None;
    }
    // SAFETY: `raw` came from `Arc::as_ptr` and the allocation is alive, so
    // bumping the count and rebuilding an `Arc` yields an owned reference.
    unsafe {
        Arc::increment_strong_count(raw);
        Some(Arc::from_raw(raw))
    }
}

unsafe fn continue_direction(filter: FilterPtr, direction: Direction) {
    // SAFETY: guaranteed by the caller.
    if let Some(shared) = unsafe { filter_arc(filter) } {
        shared.request_continue(direction);
    }
}

pub(super) unsafe extern "C" fn continue_request(filter: FilterPtr) {
    // SAFETY: the module only uses handles of filters it has not destroyed.
    unsafe { continue_direction(filter, Direction::Request) }
}

pub(super) unsafe extern "C" fn continue_response(filter: FilterPtr) {
    // SAFETY: as in `continue_request`.
    unsafe { continue_direction(filter, Direction::Response) }
}

pub(super) unsafe extern "C" fn get_body_buffer<B: BodyHandle>(filter: FilterPtr) -> B {
    // SAFETY: as in `continue_request`.
    let body = unsafe { filter_ref(filter) }.and_then(|f| f.body_buffer(B::DIRECTION));
    B::from_raw(body.map_or(ptr::null_mut(), |b| b.as_ptr().cast()))
}

pub(super) unsafe extern "C" fn send_response(
    filter: FilterPtr,
    status: u32,
    headers: *const HeaderPair,
    headers_len: usize,
    body: *const u8,
    body_len: usize,
) {
    // SAFETY: as in `continue_request`.
    let Some(shared) = (unsafe { filter_ref(filter) }) else {
        return;
    };

    let pairs: &[HeaderPair] = if headers.is_null() || headers_len == 0 {
        &[]
    } else {
        // SAFETY: the module passes `headers_len` valid pairs.
        unsafe { std::slice::from_raw_parts(headers, headers_len) }
    };

    let mut reply_headers = Vec::with_capacity(pairs.len());
    for pair in pairs {
        // SAFETY: each pair borrows module memory that outlives this call.
        let (key, value) =
            unsafe { (span(pair.key_ptr, pair.key_len), span(pair.value_ptr, pair.value_len)) };
        let Some(key) = key else { continue };
        match (
            HeaderName::from_bytes(key),
            HeaderValue::from_bytes(value.unwrap_or_default()),
        ) {
            (Ok(name), Ok(value)) => reply_headers.push((name, value)),
            _ => tracing::debug!(
                header = %String::from_utf8_lossy(key),
                "Dropping invalid local reply header"
            ),
        }
    }

    // SAFETY: the body span is null or readable for `body_len` bytes.
    let body = unsafe { span(body, body_len) }.unwrap_or_default();
    shared.send_response(status, &reply_headers, body);
}
