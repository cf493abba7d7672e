//! Header collection wrapper

use ferromod_abi::table::{GetHeaderValueFn, GetHeaderValueNthFn, SetHeaderFn};
use ferromod_abi::{BridgeTableV1, HeadersHandle, RequestHeadersPtr, ResponseHeadersPtr};
use std::marker::PhantomData;
use std::ptr;

/// Selects the bridge functions for one header direction.
pub trait HeadersAccess: HeadersHandle {
    fn get_fn(bridge: &BridgeTableV1) -> GetHeaderValueFn<Self>;
    fn get_nth_fn(bridge: &BridgeTableV1) -> GetHeaderValueNthFn<Self>;
    fn set_fn(bridge: &BridgeTableV1) -> SetHeaderFn<Self>;
}

impl HeadersAccess for RequestHeadersPtr {
    fn get_fn(bridge: &BridgeTableV1) -> GetHeaderValueFn<Self> {
        bridge.get_request_header_value
    }

    fn get_nth_fn(bridge: &BridgeTableV1) -> GetHeaderValueNthFn<Self> {
        bridge.get_request_header_value_nth
    }

    fn set_fn(bridge: &BridgeTableV1) -> SetHeaderFn<Self> {
        bridge.set_request_header
    }
}

impl HeadersAccess for ResponseHeadersPtr {
    fn get_fn(bridge: &BridgeTableV1) -> GetHeaderValueFn<Self> {
        bridge.get_response_header_value
    }

    fn get_nth_fn(bridge: &BridgeTableV1) -> GetHeaderValueNthFn<Self> {
        bridge.get_response_header_value_nth
    }

    fn set_fn(bridge: &BridgeTableV1) -> SetHeaderFn<Self> {
        bridge.set_response_header
    }
}

/// Headers lent to a hook.
///
/// Values returned by [`Headers::get`] borrow from `self`, and every mutator
/// takes `&mut self`, so a value can never be used after the collection
/// changes underneath it.
pub struct Headers<'a, H: HeadersAccess> {
    bridge: &'static BridgeTableV1,
    handle: H,
    _lent: PhantomData<&'a mut ()>,
}

pub type RequestHeaders<'a> = Headers<'a, RequestHeadersPtr>;
pub type ResponseHeaders<'a> = Headers<'a, ResponseHeadersPtr>;

impl<H: HeadersAccess> Headers<'_, H> {
    /// Wrap a handle supplied by the host.
    ///
    /// # Safety
    /// `handle` must be valid for the wrapper's lifetime.
    pub unsafe fn from_raw(bridge: &'static BridgeTableV1, handle: H) -> Self {
        Self {
            bridge,
            handle,
            _lent: PhantomData,
        }
    }

    fn lookup(&self, name: &[u8]) -> (Option<&[u8]>, usize) {
        let mut data = ptr::null();
        let mut len = 0;
        // SAFETY: the handle is valid for `self`; out-params are locals.
        let count = unsafe {
            (H::get_fn(self.bridge))(self.handle, name.as_ptr(), name.len(), &mut data, &mut len)
        };
        if data.is_null() {
            return (None, count);
        }
        // SAFETY: the host returned a span that lives until the next mutation,
        // which needs `&mut self`.
        (Some(unsafe { std::slice::from_raw_parts(data, len) }), count)
    }

    /// First value under `name`.
    pub fn get(&self, name: impl AsRef<[u8]>) -> Option<&[u8]> {
        self.lookup(name.as_ref()).0
    }

    /// First value under `name`, if it is UTF-8.
    pub fn get_str(&self, name: impl AsRef<[u8]>) -> Option<&str> {
        self.get(name).and_then(|v| std::str::from_utf8(v).ok())
    }

    /// Number of values under `name`.
    pub fn count(&self, name: impl AsRef<[u8]>) -> usize {
        self.lookup(name.as_ref()).1
    }

    /// Every value under `name`, in order.
    pub fn values(&self, name: impl AsRef<[u8]>) -> Vec<&[u8]> {
        let name = name.as_ref();
        let count = self.count(name);
        let mut values = Vec::with_capacity(count);
        for nth in 0..count {
            let mut data = ptr::null();
            let mut len = 0;
            // SAFETY: as in `lookup`.
            unsafe {
                (H::get_nth_fn(self.bridge))(
                    self.handle,
                    name.as_ptr(),
                    name.len(),
                    &mut data,
                    &mut len,
                    nth,
                );
            }
            if !data.is_null() {
                // SAFETY: as in `lookup`.
                values.push(unsafe { std::slice::from_raw_parts(data, len) });
            }
        }
        values
    }

    /// Replace every value under `name` with `value`.
    pub fn set(&mut self, name: impl AsRef<[u8]>, value: impl AsRef<[u8]>) {
        let (name, value) = (name.as_ref(), value.as_ref());
        // SAFETY: the handle is valid; the host copies both spans.
        unsafe {
            (H::set_fn(self.bridge))(
                self.handle,
                name.as_ptr(),
                name.len(),
                value.as_ptr(),
                value.len(),
            );
        }
    }

    /// Remove every value under `name`.
    pub fn remove(&mut self, name: impl AsRef<[u8]>) {
        let name = name.as_ref();
        // SAFETY: a null value asks the host to remove the name.
        unsafe {
            (H::set_fn(self.bridge))(self.handle, name.as_ptr(), name.len(), ptr::null(), 0);
        }
    }
}
