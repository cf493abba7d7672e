//! Static token authentication
//!
//! Rejects requests whose token header is missing or does not match one of
//! the configured tokens with a local `401`.

use crate::handle::FilterHandle;
use crate::headers::RequestHeaders;
use crate::traits::{HttpFilter, HttpFilterInstance};
use ferromod_abi::HeadersStatus;
use serde::Deserialize;
use std::sync::Arc;
use subtle::ConstantTimeEq;

fn default_header() -> String {
    "authorization".to_string()
}

#[allow(clippy::unnecessary_wraps)]
fn default_scheme() -> Option<String> {
    Some("Bearer".to_string())
}

fn default_strip() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenAuthConfig {
    #[serde(default = "default_header")]
    pub header: String,
    pub tokens: Vec<String>,
    /// Expected scheme prefix, e.g. `Bearer`. `null` compares the raw value.
    #[serde(default = "default_scheme")]
    pub scheme: Option<String>,
    /// Remove the token header before forwarding upstream.
    #[serde(default = "default_strip")]
    pub strip: bool,
}

impl TokenAuthConfig {
    fn extract<'v>(&self, value: &'v [u8]) -> Option<&'v [u8]> {
        let Some(scheme) = &self.scheme else {
            return Some(value);
        };
        let scheme = scheme.as_bytes();
        if value.len() <= scheme.len() || !value[..scheme.len()].eq_ignore_ascii_case(scheme) {
            return None;
        }
        let rest = &value[scheme.len()..];
        let token = rest.strip_prefix(b" ")?;
        Some(token.trim_ascii())
    }

    pub(crate) fn accepts(&self, value: &[u8]) -> bool {
        let Some(token) = self.extract(value) else {
            return false;
        };
        // Check every token so timing does not reveal which one matched.
        self.tokens
            .iter()
            .fold(0u8, |hit, t| hit | t.as_bytes().ct_eq(token).unwrap_u8())
            == 1
    }
}

pub(super) struct TokenAuth {
    config: Arc<TokenAuthConfig>,
}

impl TokenAuth {
    pub(super) fn new(config: TokenAuthConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl HttpFilter for TokenAuth {
    fn new_instance(&self, _filter: &mut FilterHandle) -> Option<Box<dyn HttpFilterInstance>> {
        Some(Box::new(TokenAuthInstance {
            config: Arc::clone(&self.config),
        }))
    }
}

struct TokenAuthInstance {
    config: Arc<TokenAuthConfig>,
}

impl HttpFilterInstance for TokenAuthInstance {
    fn on_request_headers(
        &mut self,
        filter: &mut FilterHandle,
        headers: &mut RequestHeaders<'_>,
        _end_stream: bool,
    ) -> HeadersStatus {
        let accepted = headers
            .get(&self.config.header)
            .is_some_and(|value| self.config.accepts(value));
        if !accepted {
            crate::log_debug!("rejecting request without a valid {}", self.config.header);
            let challenge = self.config.scheme.as_deref().unwrap_or("Token");
            filter.send_response(401, &[("www-authenticate", challenge)], b"unauthorized");
            return HeadersStatus::StopIteration;
        }
        if self.config.strip {
            headers.remove(&self.config.header);
        }
        HeadersStatus::Continue
    }
}
