#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Integration tests for `FerroMod`
//!
//! These tests drive SDK modules through the host bridge end to end.

mod body_test;
mod builtin_test;
mod continuation_test;
mod lifecycle_test;
mod local_reply_test;
mod scripted;

use ferromod_host::{DynamicModule, HttpFilter};
use ferromod_sdk::builtin::BUILTIN_MODULE;
use ferromod_tests::TestStream;
use http::{HeaderMap, HeaderName, HeaderValue};

/// A filter bound to the scripted module with `config`.
pub fn scripted_filter(config: &str) -> HttpFilter {
    let module = DynamicModule::load("scripted", &scripted::SCRIPTED_MODULE, config.as_bytes())
        .expect("scripted module should accept its config");
    HttpFilter::new(module)
}

/// A stream through the scripted module with `config`.
pub fn scripted_stream(config: &str) -> TestStream {
    TestStream::new(scripted_filter(config))
}

/// A stream through one bundled filter.
pub fn builtin_stream(config: &str) -> TestStream {
    let module = DynamicModule::load("builtin", &BUILTIN_MODULE, config.as_bytes())
        .expect("builtin module should accept its config");
    TestStream::new(HttpFilter::new(module))
}

/// Build a header map from name/value pairs, keeping repeats.
pub fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        map.append(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    map
}
