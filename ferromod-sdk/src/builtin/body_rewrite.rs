use super::with_whole_body;
use crate::body::{Body, BodyAccess, RequestBody, ResponseBody};
use crate::handle::FilterHandle;
use crate::headers::{RequestHeaders, ResponseHeaders};
use crate::traits::{HttpFilter, HttpFilterInstance};
use ferromod_abi::{BodyStatus, HeadersStatus};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteDirection {
    #[default]
    Request,
    Response,
    Both,
}

impl RewriteDirection {
    fn request(self) -> bool {
        matches!(self, Self::Request | Self::Both)
    }

    fn response(self) -> bool {
        matches!(self, Self::Response | Self::Both)
    }
}

/// Rewrites the complete body once it has been buffered.
///
/// `replace` is applied first, then `prepend` and `append`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BodyRewriteConfig {
    #[serde(default)]
    pub direction: RewriteDirection,
    pub replace: Option<String>,
    pub prepend: Option<String>,
    pub append: Option<String>,
}

impl BodyRewriteConfig {
    fn apply<B: BodyAccess>(&self, body: &mut Body<'_, B>) {
        if let Some(replace) = &self.replace {
            body.replace(replace.as_bytes());
        }
        if let Some(prepend) = &self.prepend {
            body.prepend(prepend.as_bytes());
        }
        if let Some(append) = &self.append {
            body.append(append.as_bytes());
        }
    }
}

pub(super) struct BodyRewrite {
    config: Arc<BodyRewriteConfig>,
}

impl BodyRewrite {
    pub(super) fn new(config: BodyRewriteConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl HttpFilter for BodyRewrite {
    fn new_instance(&self, _filter: &mut FilterHandle) -> Option<Box<dyn HttpFilterInstance>> {
        Some(Box::new(BodyRewriteInstance {
            config: Arc::clone(&self.config),
        }))
    }
}

struct BodyRewriteInstance {
    config: Arc<BodyRewriteConfig>,
}

impl HttpFilterInstance for BodyRewriteInstance {
    fn on_request_headers(
        &mut self,
        _filter: &mut FilterHandle,
        headers: &mut RequestHeaders<'_>,
        _end_stream: bool,
    ) -> HeadersStatus {
        if self.config.direction.request() {
            // The rewritten length is unknown until the body is complete.
            headers.remove("content-length");
        }
        HeadersStatus::Continue
    }

    fn on_request_body(
        &mut self,
        filter: &mut FilterHandle,
        body: &mut RequestBody<'_>,
        end_stream: bool,
    ) -> BodyStatus {
        if !self.config.direction.request() {
            return BodyStatus::Continue;
        }
        if !end_stream {
            return BodyStatus::StopIterationAndBuffer;
        }
        with_whole_body(filter.request_body(), body, |whole| self.config.apply(whole));
        BodyStatus::Continue
    }

    fn on_response_headers(
        &mut self,
        _filter: &mut FilterHandle,
        headers: &mut ResponseHeaders<'_>,
        _end_stream: bool,
    ) -> HeadersStatus {
        if self.config.direction.response() {
            headers.remove("content-length");
        }
        HeadersStatus::Continue
    }

    fn on_response_body(
        &mut self,
        filter: &mut FilterHandle,
        body: &mut ResponseBody<'_>,
        end_stream: bool,
    ) -> BodyStatus {
        if !self.config.direction.response() {
            return BodyStatus::Continue;
        }
        if !end_stream {
            return BodyStatus::StopIterationAndBuffer;
        }
        with_whole_body(filter.response_body(), body, |whole| self.config.apply(whole));
        BodyStatus::Continue
    }
}
