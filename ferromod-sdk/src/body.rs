//! Body buffer wrapper

use ferromod_abi::table::{
    BodyCopyOutFn, BodyDrainFn, BodyLengthFn, BodySliceFn, BodySlicesCountFn, BodyWriteFn,
    GetBodyBufferFn,
};
use ferromod_abi::{BodyHandle, BridgeTableV1, RequestBodyPtr, ResponseBodyPtr};
use std::io;
use std::marker::PhantomData;
use std::ptr;

/// Selects the bridge functions for one body direction.
pub trait BodyAccess: BodyHandle {
    fn slices_count_fn(bridge: &BridgeTableV1) -> BodySlicesCountFn<Self>;
    fn slice_fn(bridge: &BridgeTableV1) -> BodySliceFn<Self>;
    fn length_fn(bridge: &BridgeTableV1) -> BodyLengthFn<Self>;
    fn append_fn(bridge: &BridgeTableV1) -> BodyWriteFn<Self>;
    fn prepend_fn(bridge: &BridgeTableV1) -> BodyWriteFn<Self>;
    fn drain_fn(bridge: &BridgeTableV1) -> BodyDrainFn<Self>;
    fn copy_out_fn(bridge: &BridgeTableV1) -> BodyCopyOutFn<Self>;
    fn buffered_fn(bridge: &BridgeTableV1) -> GetBodyBufferFn<Self>;
}

macro_rules! impl_body_access {
    ($handle:ty, $count:ident, $slice:ident, $len:ident, $append:ident, $prepend:ident, $drain:ident, $copy:ident, $buffered:ident) => {
        impl BodyAccess for $handle {
            fn slices_count_fn(bridge: &BridgeTableV1) -> BodySlicesCountFn<Self> {
                bridge.$count
            }
            fn slice_fn(bridge: &BridgeTableV1) -> BodySliceFn<Self> {
                bridge.$slice
            }
            fn length_fn(bridge: &BridgeTableV1) -> BodyLengthFn<Self> {
                bridge.$len
            }
            fn append_fn(bridge: &BridgeTableV1) -> BodyWriteFn<Self> {
                bridge.$append
            }
            fn prepend_fn(bridge: &BridgeTableV1) -> BodyWriteFn<Self> {
                bridge.$prepend
            }
            fn drain_fn(bridge: &BridgeTableV1) -> BodyDrainFn<Self> {
                bridge.$drain
            }
            fn copy_out_fn(bridge: &BridgeTableV1) -> BodyCopyOutFn<Self> {
                bridge.$copy
            }
            fn buffered_fn(bridge: &BridgeTableV1) -> GetBodyBufferFn<Self> {
                bridge.$buffered
            }
        }
    };
}

impl_body_access!(
    RequestBodyPtr,
    get_request_body_buffer_slices_count,
    get_request_body_buffer_slice,
    get_request_body_buffer_length,
    append_request_body_buffer,
    prepend_request_body_buffer,
    drain_request_body_buffer,
    copy_out_request_body_buffer,
    get_request_body_buffer
);

impl_body_access!(
    ResponseBodyPtr,
    get_response_body_buffer_slices_count,
    get_response_body_buffer_slice,
    get_response_body_buffer_length,
    append_response_body_buffer,
    prepend_response_body_buffer,
    drain_response_body_buffer,
    copy_out_response_body_buffer,
    get_response_body_buffer
);

/// A body buffer owned by the host.
///
/// Slices handed out by [`Body::slices`] borrow `self` mutably, so they cannot
/// outlive the next append, prepend or drain.
pub struct Body<'a, B: BodyAccess> {
    bridge: &'static BridgeTableV1,
    handle: B,
    _lent: PhantomData<&'a mut ()>,
}

pub type RequestBody<'a> = Body<'a, RequestBodyPtr>;
pub type ResponseBody<'a> = Body<'a, ResponseBodyPtr>;

impl<B: BodyAccess> Body<'_, B> {
    /// Wrap a handle supplied by the host.
    ///
    /// # Safety
    /// `handle` must point at a buffer that stays alive for the wrapper's
    /// lifetime.
    pub unsafe fn from_raw(bridge: &'static BridgeTableV1, handle: B) -> Self {
        Self {
            bridge,
            handle,
            _lent: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        // SAFETY: the handle is valid for `self`.
        unsafe { (B::length_fn(self.bridge))(self.handle) }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn slice_count(&self) -> usize {
        // SAFETY: the handle is valid for `self`.
        unsafe { (B::slices_count_fn(self.bridge))(self.handle) }
    }

    /// The buffer's raw slices, writable in place.
    pub fn slices(&mut self) -> Vec<&mut [u8]> {
        let count = self.slice_count();
        let mut slices = Vec::with_capacity(count);
        for nth in 0..count {
            let mut data = ptr::null_mut();
            let mut len = 0;
            // SAFETY: the handle is valid; out-params are locals.
            unsafe { (B::slice_fn(self.bridge))(self.handle, nth, &mut data, &mut len) };
            if !data.is_null() {
                // SAFETY: slices are disjoint and live until the next
                // mutation, which needs another `&mut self`.
                slices.push(unsafe { std::slice::from_raw_parts_mut(data, len) });
            }
        }
        slices
    }

    /// Copy the whole body out.
    pub fn copy(&self) -> Vec<u8> {
        let mut out = vec![0; self.len()];
        self.copy_out(0, &mut out);
        out
    }

    /// Copy bytes starting at `offset` into `dest`. Returns how many bytes
    /// were available.
    pub fn copy_out(&self, offset: usize, dest: &mut [u8]) -> usize {
        let n = dest.len().min(self.len().saturating_sub(offset));
        if n == 0 {
            return 0;
        }
        // SAFETY: `dest` is writable for `n` bytes.
        unsafe { (B::copy_out_fn(self.bridge))(self.handle, offset, n, dest.as_mut_ptr()) };
        n
    }

    /// Sequential reader over the body.
    pub fn reader(&self) -> BodyReader<'_, B> {
        BodyReader {
            bridge: self.bridge,
            handle: self.handle,
            offset: 0,
            _body: PhantomData,
        }
    }

    pub fn append(&mut self, data: &[u8]) {
        // SAFETY: the host copies `data`.
        unsafe { (B::append_fn(self.bridge))(self.handle, data.as_ptr(), data.len()) };
    }

    pub fn prepend(&mut self, data: &[u8]) {
        // SAFETY: the host copies `data`.
        unsafe { (B::prepend_fn(self.bridge))(self.handle, data.as_ptr(), data.len()) };
    }

    /// Discard the first `n` bytes.
    pub fn drain(&mut self, n: usize) {
        // SAFETY: the handle is valid for `self`.
        unsafe { (B::drain_fn(self.bridge))(self.handle, n) };
    }

    /// Replace the whole body with `data`.
    pub fn replace(&mut self, data: &[u8]) {
        let len = self.len();
        self.drain(len);
        self.append(data);
    }
}

/// Implements [`io::Read`] over a body buffer.
pub struct BodyReader<'b, B: BodyAccess> {
    bridge: &'static BridgeTableV1,
    handle: B,
    offset: usize,
    _body: PhantomData<&'b ()>,
}

impl<B: BodyAccess> io::Read for BodyReader<'_, B> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // SAFETY: the reader borrows the body, so the handle is still valid.
        let body: Body<'_, B> = unsafe { Body::from_raw(self.bridge, self.handle) };
        let n = body.copy_out(self.offset, buf);
        self.offset += n;
        Ok(n)
    }
}
