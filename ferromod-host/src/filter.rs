//! Per-stream filter bound to a dynamic module
//!
//! Lifecycle:
//!
//! ```text
//! Created -> Initialized -> {Decoding, Encoding}* -> Destroying -> Destroyed
//! ```
//!
//! The module's per-stream object is created lazily by the first hook of
//! either direction and never retried if the module returns null. On teardown
//! it is destroyed before the callback references are cleared, so the module
//! never runs against dead callbacks. Hooks after teardown pass through.
//!
//! Continuations may be requested from any thread. The request only posts a
//! task onto the stream's dispatcher; the task checks the per-direction latch
//! and whether callbacks are still live before resuming.

use crate::buffer::Buffer;
use crate::callbacks::FilterCallbacks;
use crate::dispatcher::Dispatcher;
use crate::module::DynamicModule;
use ferromod_abi::{
    BodyStatus, Direction, FilterPtr, HeadersStatus, ModuleFilterPtr, RequestBodyPtr,
    RequestHeadersPtr, ResponseBodyPtr, ResponseHeadersPtr,
};
use ferromod_common::LOCAL_REPLY_DETAILS;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

static NEXT_FILTER_ID: AtomicU64 = AtomicU64::new(1);

/// Filter lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Module object not yet instantiated
    Created,
    /// Instantiation attempted
    Initialized,
    /// Last hook was in the request direction
    Decoding,
    /// Last hook was in the response direction
    Encoding,
    Destroying,
    Destroyed,
}

impl Lifecycle {
    fn is_torn_down(self) -> bool {
        matches!(self, Lifecycle::Destroying | Lifecycle::Destroyed)
    }
}

/// Continuation state of one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContinuationState {
    #[default]
    Idle,
    /// A hook returned a stop status.
    Suspended,
    /// A resume was delivered; further requests are ignored until the next stop.
    ResumeRequested,
}

struct FilterState {
    lifecycle: Lifecycle,
    module_filter: ModuleFilterPtr,
    decoder: Option<Arc<dyn FilterCallbacks>>,
    encoder: Option<Arc<dyn FilterCallbacks>>,
    request: ContinuationState,
    response: ContinuationState,
}

// SAFETY: `module_filter` is only passed back to the module from the owning
// context (hooks and teardown). Continuation tasks that reach this state from
// other threads never touch it.
unsafe impl Send for FilterState {}

impl FilterState {
    fn callbacks(&self, direction: Direction) -> Option<&Arc<dyn FilterCallbacks>> {
        match direction {
            Direction::Request => self.decoder.as_ref(),
            Direction::Response => self.encoder.as_ref(),
        }
    }

    fn continuation_mut(&mut self, direction: Direction) -> &mut ContinuationState {
        match direction {
            Direction::Request => &mut self.request,
            Direction::Response => &mut self.response,
        }
    }

    fn continuation(&self, direction: Direction) -> ContinuationState {
        match direction {
            Direction::Request => self.request,
            Direction::Response => self.response,
        }
    }
}

/// State shared between the filter and pending continuation tasks.
///
/// `FilterPtr` handles given to the module point at this value.
pub(crate) struct FilterShared {
    id: u64,
    module: Arc<DynamicModule>,
    dispatcher: OnceLock<Dispatcher>,
    state: Mutex<FilterState>,
}

impl FilterShared {
    fn lock(&self) -> MutexGuard<'_, FilterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Post a resume for `direction` onto the stream's dispatcher.
    pub(crate) fn request_continue(self: &Arc<Self>, direction: Direction) {
        #[cfg(feature = "metrics")]
        if let Some(m) = ferromod_observability::bridge_metrics() {
            m.record_continuation(direction.as_str(), "requested");
        }

        let Some(dispatcher) = self.dispatcher.get() else {
            tracing::debug!(filter_id = self.id, %direction, "Continue before callbacks were set");
            return;
        };

        // The task must not keep the filter (and its module) alive.
        let shared = Arc::downgrade(self);
        let posted = dispatcher.post(move || match shared.upgrade() {
            Some(shared) => shared.deliver_continue(direction),
            None => tracing::trace!(%direction, "Continue for a dropped filter"),
        });
        if !posted {
            tracing::debug!(filter_id = self.id, %direction, "Dispatcher gone, continue dropped");
        }
    }

    /// Runs on the owning context.
    fn deliver_continue(&self, direction: Direction) {
        let callbacks = {
            let mut state = self.lock();
            if state.lifecycle.is_torn_down() {
                None
            } else {
                match state.callbacks(direction).cloned() {
                    Some(cb) if state.continuation(direction) != ContinuationState::ResumeRequested => {
                        *state.continuation_mut(direction) = ContinuationState::ResumeRequested;
                        Some(cb)
                    }
                    _ => None,
                }
            }
        };

        let Some(callbacks) = callbacks else {
            tracing::trace!(filter_id = self.id, %direction, "Continue suppressed");
            #[cfg(feature = "metrics")]
            if let Some(m) = ferromod_observability::bridge_metrics() {
                m.record_continuation(direction.as_str(), "suppressed");
            }
            return;
        };

        tracing::debug!(filter_id = self.id, %direction, "Resuming iteration");
        callbacks.continue_iteration();

        #[cfg(feature = "metrics")]
        if let Some(m) = ferromod_observability::bridge_metrics() {
            m.record_continuation(direction.as_str(), "delivered");
        }
    }

    /// Currently buffered body for `direction`, if its callbacks are live.
    pub(crate) fn body_buffer(&self, direction: Direction) -> Option<NonNull<Buffer>> {
        let callbacks = self.lock().callbacks(direction).cloned()?;
        callbacks.buffered_body()
    }

    /// Send a local reply through the decoder callbacks, else the encoder.
    pub(crate) fn send_response(
        &self,
        status: u32,
        headers: &[(HeaderName, HeaderValue)],
        body: &[u8],
    ) {
        let target = {
            let state = self.lock();
            state.decoder.clone().or_else(|| state.encoder.clone())
        };
        let Some(callbacks) = target else {
            tracing::debug!(filter_id = self.id, "Local reply without live callbacks");
            return;
        };

        let Some(status) = u16::try_from(status)
            .ok()
            .and_then(|s| StatusCode::from_u16(s).ok())
        else {
            tracing::warn!(
                filter_id = self.id,
                module = %self.module.name(),
                status,
                "Module sent local reply with invalid status"
            );
            return;
        };

        tracing::debug!(filter_id = self.id, status = status.as_u16(), "Sending local reply");

        #[cfg(feature = "metrics")]
        if let Some(m) = ferromod_observability::bridge_metrics() {
            m.record_local_reply(status.as_u16());
        }

        let apply = |map: &mut HeaderMap| {
            for (name, value) in headers {
                map.insert(name.clone(), value.clone());
            }
        };
        let modify: Option<&dyn Fn(&mut HeaderMap)> =
            if headers.is_empty() { None } else { Some(&apply) };
        callbacks.send_local_reply(status, body, modify, LOCAL_REPLY_DETAILS);
    }
}

/// The proxy-facing filter for one stream.
pub struct HttpFilter {
    shared: Arc<FilterShared>,
}

impl HttpFilter {
    pub fn new(module: Arc<DynamicModule>) -> Self {
        let id = NEXT_FILTER_ID.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(filter_id = id, module = %module.name(), "Filter created");

        #[cfg(feature = "metrics")]
        if let Some(m) = ferromod_observability::bridge_metrics() {
            m.record_filter_created();
        }

        Self {
            shared: Arc::new(FilterShared {
                id,
                module,
                dispatcher: OnceLock::new(),
                state: Mutex::new(FilterState {
                    lifecycle: Lifecycle::Created,
                    module_filter: ModuleFilterPtr::null(),
                    decoder: None,
                    encoder: None,
                    request: ContinuationState::Idle,
                    response: ContinuationState::Idle,
                }),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.shared.id
    }

    pub fn module(&self) -> &Arc<DynamicModule> {
        &self.shared.module
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.shared.lock().lifecycle
    }

    pub fn continuation_state(&self, direction: Direction) -> ContinuationState {
        self.shared.lock().continuation(direction)
    }

    /// The handle the module sees for this filter.
    pub fn as_ptr(&self) -> FilterPtr {
        FilterPtr::from_raw(Arc::as_ptr(&self.shared).cast_mut().cast())
    }

    pub fn set_decoder_callbacks(&mut self, callbacks: Arc<dyn FilterCallbacks>) {
        self.shared
            .dispatcher
            .get_or_init(|| callbacks.dispatcher());
        self.shared.lock().decoder = Some(callbacks);
    }

    pub fn set_encoder_callbacks(&mut self, callbacks: Arc<dyn FilterCallbacks>) {
        self.shared
            .dispatcher
            .get_or_init(|| callbacks.dispatcher());
        self.shared.lock().encoder = Some(callbacks);
    }

    pub fn decode_headers(&mut self, headers: &mut HeaderMap, end_stream: bool) -> HeadersStatus {
        let Some(module_filter) = self.enter(Lifecycle::Decoding) else {
            return HeadersStatus::Continue;
        };
        let handle = RequestHeadersPtr::from_raw(ptr::from_mut(headers).cast());
        let table = self.shared.module.table();
        // SAFETY: `module_filter` is live until teardown, which cannot run
        // while this `&mut self` borrow is held; `headers` outlives the call.
        let raw = unsafe { (table.on_request_headers)(module_filter, handle, end_stream) };
        let status = self.headers_status(raw);
        self.after_hook(Direction::Request, status.is_stop());
        status
    }

    pub fn decode_data(&mut self, data: &mut Buffer, end_stream: bool) -> BodyStatus {
        let Some(module_filter) = self.enter(Lifecycle::Decoding) else {
            return BodyStatus::Continue;
        };
        let handle = RequestBodyPtr::from_raw(ptr::from_mut(data).cast());
        let table = self.shared.module.table();
        // SAFETY: as in `decode_headers`; `data` outlives the call.
        let raw = unsafe { (table.on_request_body)(module_filter, handle, end_stream) };
        let status = self.body_status(raw);
        self.after_hook(Direction::Request, status.is_stop());
        status
    }

    pub fn encode_headers(&mut self, headers: &mut HeaderMap, end_stream: bool) -> HeadersStatus {
        let Some(module_filter) = self.enter(Lifecycle::Encoding) else {
            return HeadersStatus::Continue;
        };
        let handle = ResponseHeadersPtr::from_raw(ptr::from_mut(headers).cast());
        let table = self.shared.module.table();
        // SAFETY: as in `decode_headers`.
        let raw = unsafe { (table.on_response_headers)(module_filter, handle, end_stream) };
        let status = self.headers_status(raw);
        self.after_hook(Direction::Response, status.is_stop());
        status
    }

    pub fn encode_data(&mut self, data: &mut Buffer, end_stream: bool) -> BodyStatus {
        let Some(module_filter) = self.enter(Lifecycle::Encoding) else {
            return BodyStatus::Continue;
        };
        let handle = ResponseBodyPtr::from_raw(ptr::from_mut(data).cast());
        let table = self.shared.module.table();
        // SAFETY: as in `decode_headers`.
        let raw = unsafe { (table.on_response_body)(module_filter, handle, end_stream) };
        let status = self.body_status(raw);
        self.after_hook(Direction::Response, status.is_stop());
        status
    }

    /// Tear the filter down. Idempotent; also run on drop.
    pub fn on_destroy(&mut self) {
        let module_filter = {
            let mut state = self.shared.lock();
            if state.lifecycle.is_torn_down() {
                return;
            }
            state.lifecycle = Lifecycle::Destroying;
            std::mem::replace(&mut state.module_filter, ModuleFilterPtr::null())
        };

        if !module_filter.is_null() {
            let table = self.shared.module.table();
            // SAFETY: the object came from `on_filter_new` and is destroyed
            // once; callbacks are still set so the module may use them here.
            unsafe { (table.on_filter_destroy)(module_filter) };
        }

        {
            let mut state = self.shared.lock();
            state.decoder = None;
            state.encoder = None;
            state.lifecycle = Lifecycle::Destroyed;
        }

        tracing::trace!(filter_id = self.shared.id, "Filter destroyed");

        #[cfg(feature = "metrics")]
        if let Some(m) = ferromod_observability::bridge_metrics() {
            m.record_filter_destroyed();
        }
    }

    /// Instantiate the module object if needed and move to `phase`.
    /// Returns `None` when the hook must pass through.
    fn enter(&mut self, phase: Lifecycle) -> Option<ModuleFilterPtr> {
        let needs_instance = {
            let state = self.shared.lock();
            if state.lifecycle.is_torn_down() {
                return None;
            }
            state.lifecycle == Lifecycle::Created
        };

        if needs_instance {
            let table = self.shared.module.table();
            // SAFETY: the module config is alive for as long as `module` is,
            // and the filter handle stays valid until `on_filter_destroy`.
            let module_filter =
                unsafe { (table.on_filter_new)(self.shared.module.config(), self.as_ptr()) };

            if module_filter.is_null() {
                tracing::debug!(
                    filter_id = self.shared.id,
                    module = %self.shared.module.name(),
                    "Module declined to create a filter; passing through"
                );
            } else {
                #[cfg(feature = "metrics")]
                if let Some(m) = ferromod_observability::bridge_metrics() {
                    m.record_module_instance(self.shared.module.name());
                }
            }

            let mut state = self.shared.lock();
            state.module_filter = module_filter;
            state.lifecycle = Lifecycle::Initialized;
        }

        let mut state = self.shared.lock();
        if state.module_filter.is_null() {
            return None;
        }
        state.lifecycle = phase;
        Some(state.module_filter)
    }

    fn headers_status(&self, raw: u32) -> HeadersStatus {
        HeadersStatus::from_raw(raw).unwrap_or_else(|| {
            self.unknown_status(raw);
            HeadersStatus::Continue
        })
    }

    fn body_status(&self, raw: u32) -> BodyStatus {
        BodyStatus::from_raw(raw).unwrap_or_else(|| {
            self.unknown_status(raw);
            BodyStatus::Continue
        })
    }

    fn unknown_status(&self, raw: u32) {
        tracing::warn!(
            filter_id = self.shared.id,
            module = %self.shared.module.name(),
            status = raw,
            "Module returned an unknown status, continuing"
        );
    }

    fn after_hook(&self, direction: Direction, stopped: bool) {
        let mut state = self.shared.lock();
        let continuation = state.continuation_mut(direction);
        if stopped {
            *continuation = ContinuationState::Suspended;
        } else if *continuation == ContinuationState::Suspended {
            *continuation = ContinuationState::Idle;
        }
    }
}

impl Drop for HttpFilter {
    fn drop(&mut self) {
        self.on_destroy();
    }
}

impl std::fmt::Debug for HttpFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFilter")
            .field("id", &self.shared.id)
            .field("module", &self.shared.module.name())
            .field("lifecycle", &self.lifecycle())
            .finish()
    }
}
