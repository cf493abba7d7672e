use crate::body::{RequestBody, ResponseBody};
use crate::handle::FilterHandle;
use crate::headers::{RequestHeaders, ResponseHeaders};
use ferromod_abi::{BodyStatus, HeadersStatus};

/// Constructor the module hands to [`declare_module!`](crate::declare_module).
///
/// Receives the filter configuration string; returning `None` rejects it.
pub type NewHttpFilterFn = fn(config: &str) -> Option<Box<dyn HttpFilter>>;

/// One filter configuration.
///
/// Created when the proxy loads the configuration and dropped when it unloads
/// it. Instances for different streams are created from any worker thread.
pub trait HttpFilter: Send + Sync {
    /// Create the per-stream instance. Returning `None` lets the stream pass
    /// through untouched.
    fn new_instance(&self, filter: &mut FilterHandle) -> Option<Box<dyn HttpFilterInstance>>;

    /// Called once before the configuration is dropped.
    fn destroy(&mut self) {}
}

/// Per-stream filter logic. Every hook defaults to `Continue`.
pub trait HttpFilterInstance {
    fn on_request_headers(
        &mut self,
        _filter: &mut FilterHandle,
        _headers: &mut RequestHeaders<'_>,
        _end_stream: bool,
    ) -> HeadersStatus {
        HeadersStatus::Continue
    }

    /// `body` is the frame being delivered. Once earlier frames were buffered
    /// it is the whole buffered body.
    fn on_request_body(
        &mut self,
        _filter: &mut FilterHandle,
        _body: &mut RequestBody<'_>,
        _end_stream: bool,
    ) -> BodyStatus {
        BodyStatus::Continue
    }

    fn on_response_headers(
        &mut self,
        _filter: &mut FilterHandle,
        _headers: &mut ResponseHeaders<'_>,
        _end_stream: bool,
    ) -> HeadersStatus {
        HeadersStatus::Continue
    }

    fn on_response_body(
        &mut self,
        _filter: &mut FilterHandle,
        _body: &mut ResponseBody<'_>,
        _end_stream: bool,
    ) -> BodyStatus {
        BodyStatus::Continue
    }

    /// Called once when the stream is torn down; the handle is still usable.
    fn destroy(&mut self, _filter: &mut FilterHandle) {}
}
