use crate::handle::FilterHandle;
use crate::headers::{Headers, HeadersAccess, RequestHeaders, ResponseHeaders};
use crate::traits::{HttpFilter, HttpFilterInstance};
use ferromod_abi::HeadersStatus;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Header edits for one direction. Removals run before sets.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HeaderOps {
    #[serde(default)]
    pub set: BTreeMap<String, String>,
    #[serde(default)]
    pub remove: Vec<String>,
}

impl HeaderOps {
    fn apply<H: HeadersAccess>(&self, headers: &mut Headers<'_, H>) {
        for name in &self.remove {
            headers.remove(name);
        }
        for (name, value) in &self.set {
            headers.set(name, value);
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HeaderRewriteConfig {
    #[serde(default)]
    pub request: HeaderOps,
    #[serde(default)]
    pub response: HeaderOps,
}

pub(super) struct HeaderRewrite {
    config: Arc<HeaderRewriteConfig>,
}

impl HeaderRewrite {
    pub(super) fn new(config: HeaderRewriteConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl HttpFilter for HeaderRewrite {
    fn new_instance(&self, _filter: &mut FilterHandle) -> Option<Box<dyn HttpFilterInstance>> {
        Some(Box::new(HeaderRewriteInstance {
            config: Arc::clone(&self.config),
        }))
    }
}

struct HeaderRewriteInstance {
    config: Arc<HeaderRewriteConfig>,
}

impl HttpFilterInstance for HeaderRewriteInstance {
    fn on_request_headers(
        &mut self,
        _filter: &mut FilterHandle,
        headers: &mut RequestHeaders<'_>,
        _end_stream: bool,
    ) -> HeadersStatus {
        self.config.request.apply(headers);
        HeadersStatus::Continue
    }

    fn on_response_headers(
        &mut self,
        _filter: &mut FilterHandle,
        headers: &mut ResponseHeaders<'_>,
        _end_stream: bool,
    ) -> HeadersStatus {
        self.config.response.apply(headers);
        HeadersStatus::Continue
    }
}
