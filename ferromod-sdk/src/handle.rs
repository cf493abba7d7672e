//! The module's view of its proxy-side filter

use crate::body::{Body, BodyAccess, RequestBody, ResponseBody};
use ferromod_abi::{BridgeTableV1, FilterPtr, HeaderPair, RequestBodyPtr, ResponseBodyPtr};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};

/// Tracks whether the proxy-side filter may still be addressed.
///
/// Cleared under the lock when the filter is destroyed, so a resume running
/// on another thread either completes before destruction or sees `false`.
#[derive(Debug)]
pub(crate) struct Liveness {
    alive: Mutex<bool>,
}

impl Liveness {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            alive: Mutex::new(true),
        })
    }

    fn with_alive(&self, f: impl FnOnce()) {
        let alive = self.alive.lock().unwrap_or_else(PoisonError::into_inner);
        if *alive {
            f();
        }
    }

    fn invalidate(&self) {
        *self.alive.lock().unwrap_or_else(PoisonError::into_inner) = false;
    }
}

/// Handle to the proxy-side filter for one stream.
///
/// Only usable on the stream's own thread; use [`FilterHandle::resume_handle`]
/// to resume processing from elsewhere.
pub struct FilterHandle {
    bridge: &'static BridgeTableV1,
    filter: FilterPtr,
    liveness: Arc<Liveness>,
    _not_send: PhantomData<*const ()>,
}

impl FilterHandle {
    pub(crate) fn new(bridge: &'static BridgeTableV1, filter: FilterPtr) -> Self {
        Self {
            bridge,
            filter,
            liveness: Liveness::new(),
            _not_send: PhantomData,
        }
    }

    pub(crate) fn bridge(&self) -> &'static BridgeTableV1 {
        self.bridge
    }

    pub(crate) fn invalidate(&self) {
        self.liveness.invalidate();
    }

    /// The raw handle, for code calling the bridge table directly.
    pub fn as_raw(&self) -> FilterPtr {
        self.filter
    }

    fn buffered<B: BodyAccess>(&mut self) -> Option<Body<'_, B>> {
        // SAFETY: the filter handle is live for as long as `self` is.
        let handle = unsafe { (B::buffered_fn(self.bridge))(self.filter) };
        if handle.as_raw().is_null() {
            return None;
        }
        // SAFETY: the buffer lives until the host next mutates it, which
        // cannot happen while this hook holds `&mut self`.
        Some(unsafe { Body::from_raw(self.bridge, handle) })
    }

    /// The request body buffered so far, if any.
    pub fn request_body(&mut self) -> Option<RequestBody<'_>> {
        self.buffered::<RequestBodyPtr>()
    }

    /// The response body buffered so far, if any.
    pub fn response_body(&mut self) -> Option<ResponseBody<'_>> {
        self.buffered::<ResponseBodyPtr>()
    }

    /// Reply locally with `status`, bypassing the rest of the pipeline.
    pub fn send_response<K, V>(&mut self, status: u16, headers: &[(K, V)], body: &[u8])
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let pairs: Vec<HeaderPair> = headers
            .iter()
            .map(|(k, v)| HeaderPair::new(k.as_ref(), v.as_ref()))
            .collect();
        // SAFETY: `pairs` and `body` borrow memory that outlives the call.
        unsafe {
            (self.bridge.send_response)(
                self.filter,
                u32::from(status),
                pairs.as_ptr(),
                pairs.len(),
                body.as_ptr(),
                body.len(),
            );
        }
    }

    pub fn continue_request(&self) {
        // SAFETY: the filter handle is live for as long as `self` is.
        unsafe { (self.bridge.continue_request)(self.filter) };
    }

    pub fn continue_response(&self) {
        // SAFETY: the filter handle is live for as long as `self` is.
        unsafe { (self.bridge.continue_response)(self.filter) };
    }

    /// A thread-safe handle that can only resume processing.
    pub fn resume_handle(&self) -> ResumeHandle {
        ResumeHandle {
            bridge: self.bridge,
            filter: self.filter,
            liveness: Arc::clone(&self.liveness),
        }
    }
}

impl std::fmt::Debug for FilterHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterHandle")
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

/// Resumes a suspended stream from any thread.
///
/// Calls after the filter has been destroyed do nothing.
#[derive(Debug, Clone)]
pub struct ResumeHandle {
    bridge: &'static BridgeTableV1,
    filter: FilterPtr,
    liveness: Arc<Liveness>,
}

impl ResumeHandle {
    pub fn continue_request(&self) {
        self.liveness.with_alive(|| {
            // SAFETY: the filter has not been destroyed and cannot be while
            // the liveness lock is held.
            unsafe { (self.bridge.continue_request)(self.filter) };
        });
    }

    pub fn continue_response(&self) {
        self.liveness.with_alive(|| {
            // SAFETY: as in `continue_request`.
            unsafe { (self.bridge.continue_response)(self.filter) };
        });
    }
}
