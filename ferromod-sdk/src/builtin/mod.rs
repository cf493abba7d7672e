//! Filters bundled with the SDK
//!
//! The configuration string is JSON with a `kind` tag selecting the filter:
//!
//! ```json
//! {"kind": "token_auth", "tokens": ["secret"]}
//! {"kind": "header_rewrite", "request": {"set": {"x-env": "prod"}}}
//! ```
//!
//! [`BUILTIN_MODULE`] exposes them as a module table for in-process use.

mod auth;
mod body_rewrite;
mod delay;
mod header_rewrite;
mod json_validate;
mod logger;

pub use auth::TokenAuthConfig;
pub use body_rewrite::{BodyRewriteConfig, RewriteDirection};
pub use delay::DelayConfig;
pub use header_rewrite::{HeaderOps, HeaderRewriteConfig};
pub use json_validate::JsonValidateConfig;
pub use logger::LoggerConfig;

use crate::body::{Body, BodyAccess};
use crate::traits::HttpFilter;
use serde::Deserialize;

/// Configuration for one bundled filter.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuiltinConfig {
    Logger(LoggerConfig),
    TokenAuth(TokenAuthConfig),
    BodyRewrite(BodyRewriteConfig),
    JsonValidate(JsonValidateConfig),
    Delay(DelayConfig),
    HeaderRewrite(HeaderRewriteConfig),
}

impl BuiltinConfig {
    pub fn from_json(config: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(config)
    }

    pub fn into_filter(self) -> Box<dyn HttpFilter> {
        match self {
            Self::Logger(c) => Box::new(logger::Logger::new(c)),
            Self::TokenAuth(c) => Box::new(auth::TokenAuth::new(c)),
            Self::BodyRewrite(c) => Box::new(body_rewrite::BodyRewrite::new(c)),
            Self::JsonValidate(c) => Box::new(json_validate::JsonValidate::new(c)),
            Self::Delay(c) => Box::new(delay::Delay::new(c)),
            Self::HeaderRewrite(c) => Box::new(header_rewrite::HeaderRewrite::new(c)),
        }
    }
}

/// Factory for the bundled filters. Rejects configurations that do not parse.
pub fn new_builtin_filter(config: &str) -> Option<Box<dyn HttpFilter>> {
    match BuiltinConfig::from_json(config) {
        Ok(config) => Some(config.into_filter()),
        Err(e) => {
            crate::log_error!("invalid builtin filter configuration: {}", e);
            None
        }
    }
}

crate::declare_module!(BUILTIN_MODULE, new_builtin_filter);

/// Whole-body view for a hook running at end of stream: the buffered body
/// when earlier frames were held back, otherwise the frame itself.
fn with_whole_body<B: BodyAccess, R>(
    buffered: Option<Body<'_, B>>,
    frame: &mut Body<'_, B>,
    f: impl FnOnce(&mut Body<'_, B>) -> R,
) -> R {
    match buffered {
        Some(mut whole) => f(&mut whole),
        None => f(frame),
    }
}
