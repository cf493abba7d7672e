//! In-crate test module and callbacks
//!
//! `TEST_MODULE` is a hand-written module table whose behavior is picked by
//! its configuration string: `continue`, `stop`, `null` (no per-stream
//! object) or `reject` (config creation fails). It records every entry point
//! it sees so tests can assert on call order.

use crate::bridge::BRIDGE_V1;
use crate::buffer::Buffer;
use crate::callbacks::FilterCallbacks;
use crate::dispatcher::Dispatcher;
use crate::module::DynamicModule;
use ferromod_abi::{
    BodyStatus, BridgeTableV1, FilterPtr, HeadersStatus, ModuleConfigPtr, ModuleFilterPtr,
    ModuleTableV1, RequestBodyPtr, RequestHeadersPtr, ResponseBodyPtr, ResponseHeadersPtr,
    ABI_VERSION,
};
use http::{HeaderMap, StatusCode};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

struct TestConfig {
    mode: String,
    events: Mutex<Vec<String>>,
}

impl TestConfig {
    fn record(&self, event: impl Into<String>) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.into());
    }
}

struct TestFilter {
    config: *const TestConfig,
    filter: FilterPtr,
}

static DESTROYED_CONFIGS: Mutex<Vec<String>> = Mutex::new(Vec::new());

pub(crate) fn config_destroyed(mode: &str) -> bool {
    DESTROYED_CONFIGS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .any(|m| m == mode)
}

/// Events recorded by the test module behind `module`.
pub(crate) fn module_events(module: &DynamicModule) -> Vec<String> {
    // SAFETY: every module built from `TEST_MODULE` owns a `TestConfig`.
    let config = unsafe { &*module.config().as_raw().cast::<TestConfig>() };
    config
        .events
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// # Safety
/// `filter` must come from `on_filter_new` and not be destroyed yet.
unsafe fn test_filter<'a>(filter: ModuleFilterPtr) -> (&'a TestFilter, &'a TestConfig) {
    // SAFETY: guaranteed by the caller.
    let f = unsafe { &*filter.as_raw().cast::<TestFilter>() };
    // SAFETY: the config outlives every filter created from it.
    let c = unsafe { &*f.config };
    (f, c)
}

unsafe extern "C" fn on_config_new(
    bridge: *const BridgeTableV1,
    config: *const u8,
    len: usize,
) -> ModuleConfigPtr {
    assert!(std::ptr::eq(bridge, &BRIDGE_V1));
    // SAFETY: the host passes a valid span.
    let mode = unsafe { std::slice::from_raw_parts(config, len) };
    let mode = String::from_utf8_lossy(mode).into_owned();
    if mode == "reject" {
        return ModuleConfigPtr::null();
    }
    let config = Box::new(TestConfig {
        mode,
        events: Mutex::new(Vec::new()),
    });
    ModuleConfigPtr::from_raw(Box::into_raw(config).cast())
}

unsafe extern "C" fn on_config_destroy(config: ModuleConfigPtr) {
    // SAFETY: created by `on_config_new`, destroyed once.
    let config = unsafe { Box::from_raw(config.as_raw().cast::<TestConfig>()) };
    DESTROYED_CONFIGS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(config.mode);
}

unsafe extern "C" fn on_filter_new(config: ModuleConfigPtr, filter: FilterPtr) -> ModuleFilterPtr {
    let config = config.as_raw().cast::<TestConfig>().cast_const();
    // SAFETY: config is live while the host holds the module.
    let c = unsafe { &*config };
    c.record("filter_new");
    if c.mode == "null" {
        return ModuleFilterPtr::null();
    }
    let f = Box::new(TestFilter { config, filter });
    ModuleFilterPtr::from_raw(Box::into_raw(f).cast())
}

/// Raw status for `mode`; `bogus` answers with a value no status maps to.
fn raw_status(config: &TestConfig, stop: u32) -> u32 {
    match config.mode.as_str() {
        "stop" => stop,
        "bogus" => 99,
        _ => 0,
    }
}

fn headers_status(config: &TestConfig) -> u32 {
    raw_status(config, HeadersStatus::StopIteration as u32)
}

fn body_status(config: &TestConfig) -> u32 {
    raw_status(config, BodyStatus::StopIterationAndBuffer as u32)
}

unsafe extern "C" fn on_request_headers(
    filter: ModuleFilterPtr,
    _headers: RequestHeadersPtr,
    _end_stream: bool,
) -> u32 {
    // SAFETY: the host only passes live filters.
    let (_, c) = unsafe { test_filter(filter) };
    c.record("request_headers");
    headers_status(c)
}

unsafe extern "C" fn on_request_body(
    filter: ModuleFilterPtr,
    _body: RequestBodyPtr,
    _end_stream: bool,
) -> u32 {
    // SAFETY: the host only passes live filters.
    let (_, c) = unsafe { test_filter(filter) };
    c.record("request_body");
    body_status(c)
}

unsafe extern "C" fn on_response_headers(
    filter: ModuleFilterPtr,
    _headers: ResponseHeadersPtr,
    _end_stream: bool,
) -> u32 {
    // SAFETY: the host only passes live filters.
    let (_, c) = unsafe { test_filter(filter) };
    c.record("response_headers");
    headers_status(c)
}

unsafe extern "C" fn on_response_body(
    filter: ModuleFilterPtr,
    _body: ResponseBodyPtr,
    _end_stream: bool,
) -> u32 {
    // SAFETY: the host only passes live filters.
    let (_, c) = unsafe { test_filter(filter) };
    c.record("response_body");
    body_status(c)
}

unsafe extern "C" fn on_filter_destroy(filter: ModuleFilterPtr) {
    // SAFETY: the host only passes live filters.
    let (f, c) = unsafe { test_filter(filter) };
    // SAFETY: the filter handle is valid during destroy.
    let body = unsafe { (BRIDGE_V1.get_request_body_buffer)(f.filter) };
    c.record(if body.is_null() {
        "filter_destroy:dead"
    } else {
        "filter_destroy:live"
    });
    // SAFETY: created by `on_filter_new`, destroyed once.
    drop(unsafe { Box::from_raw(filter.as_raw().cast::<TestFilter>()) });
}

pub(crate) static TEST_MODULE: ModuleTableV1 = ModuleTableV1 {
    abi_version: ABI_VERSION,
    on_config_new,
    on_config_destroy,
    on_filter_new,
    on_request_headers,
    on_request_body,
    on_response_headers,
    on_response_body,
    on_filter_destroy,
};

pub(crate) static WRONG_VERSION_MODULE: ModuleTableV1 = ModuleTableV1 {
    abi_version: 0,
    on_config_new,
    on_config_destroy,
    on_filter_new,
    on_request_headers,
    on_request_body,
    on_response_headers,
    on_response_body,
    on_filter_destroy,
};

/// A local reply captured by [`MockCallbacks`].
#[derive(Debug, Clone)]
pub(crate) struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub details: String,
}

/// Callbacks that count resumes and capture local replies.
pub(crate) struct MockCallbacks {
    dispatcher: Dispatcher,
    continues: AtomicUsize,
    body: Mutex<Option<Box<Buffer>>>,
    replies: Mutex<Vec<Reply>>,
}

impl MockCallbacks {
    pub(crate) fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            continues: AtomicUsize::new(0),
            body: Mutex::new(None),
            replies: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn set_body(&self, body: Buffer) {
        *self.body.lock().unwrap_or_else(PoisonError::into_inner) = Some(Box::new(body));
    }

    pub(crate) fn continues(&self) -> usize {
        self.continues.load(Ordering::SeqCst)
    }

    pub(crate) fn replies(&self) -> Vec<Reply> {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl FilterCallbacks for MockCallbacks {
    fn dispatcher(&self) -> Dispatcher {
        self.dispatcher.clone()
    }

    fn continue_iteration(&self) {
        self.continues.fetch_add(1, Ordering::SeqCst);
    }

    fn buffered_body(&self) -> Option<NonNull<Buffer>> {
        let mut body = self.body.lock().unwrap_or_else(PoisonError::into_inner);
        body.as_mut().map(|b| NonNull::from(&mut **b))
    }

    fn send_local_reply(
        &self,
        status: StatusCode,
        body: &[u8],
        modify_headers: Option<&dyn Fn(&mut HeaderMap)>,
        details: &str,
    ) {
        let mut headers = HeaderMap::new();
        if let Some(modify) = modify_headers {
            modify(&mut headers);
        }
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Reply {
                status,
                headers,
                body: body.to_vec(),
                details: details.to_string(),
            });
    }
}
