//! What the proxy supplies to a filter for one direction of a stream

use crate::buffer::Buffer;
use crate::dispatcher::Dispatcher;
use http::{HeaderMap, StatusCode};
use std::ptr::NonNull;

/// Proxy-side callbacks for one direction (decoder or encoder) of a stream.
///
/// All methods except [`FilterCallbacks::dispatcher`] are only called on the
/// stream's owning context.
pub trait FilterCallbacks: Send + Sync {
    /// Execution context owning the stream.
    fn dispatcher(&self) -> Dispatcher;

    /// Resume iteration after a hook returned a stop status.
    fn continue_iteration(&self);

    /// The body buffered so far for this direction. The pointer stays valid
    /// until the proxy next mutates or releases the buffer.
    fn buffered_body(&self) -> Option<NonNull<Buffer>>;

    /// Synthesize a complete response and stop the pipeline.
    ///
    /// `modify_headers`, when present, is applied to the reply headers before
    /// they are sent.
    fn send_local_reply(
        &self,
        status: StatusCode,
        body: &[u8],
        modify_headers: Option<&dyn Fn(&mut HeaderMap)>,
        details: &str,
    );
}
