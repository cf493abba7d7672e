//! Filter lifecycle tests
//!
//! Lazy instantiation, teardown ordering and behavior after teardown.

use crate::scripted::events;
use crate::{headers, scripted_filter, scripted_stream};
use ferromod_abi::{BodyStatus, HeadersStatus};
use ferromod_common::BridgeError;
use ferromod_host::{DynamicModule, Lifecycle, ModuleRegistry};
use ferromod_tests::TestStream;

#[test]
fn test_instance_created_on_first_hook() {
    let mut stream = scripted_stream("buffer:lazy");
    assert!(events("lazy").is_empty());
    assert_eq!(stream.filter().lifecycle(), Lifecycle::Created);

    let status = stream.request_headers(&mut headers(&[("host", "a")]), false);
    assert_eq!(status, HeadersStatus::Continue);
    assert_eq!(events("lazy"), vec!["new", "request_headers"]);
    assert_eq!(stream.filter().lifecycle(), Lifecycle::Decoding);

    stream.response_headers(&mut headers(&[]), true);
    assert_eq!(stream.filter().lifecycle(), Lifecycle::Encoding);
    assert_eq!(events("lazy").iter().filter(|e| *e == "new").count(), 1);
}

#[test]
fn test_null_instance_passes_through_without_retry() {
    let mut stream = scripted_stream("null:nullinst");

    assert_eq!(
        stream.request_headers(&mut headers(&[]), false),
        HeadersStatus::Continue
    );
    assert_eq!(stream.request_data(b"body", true), BodyStatus::Continue);
    assert_eq!(
        stream.response_headers(&mut headers(&[]), true),
        HeadersStatus::Continue
    );
    assert_eq!(stream.forwarded_request(), b"body");
    assert_eq!(events("nullinst"), vec!["new"]);
}

#[test]
fn test_module_destroyed_before_callbacks_cleared() {
    let mut stream = scripted_stream("buffer:teardown");
    stream.request_headers(&mut headers(&[]), false);
    assert_eq!(
        stream.request_data(b"ab", false),
        BodyStatus::StopIterationAndBuffer
    );

    stream.destroy();
    assert_eq!(events("teardown").last().map(String::as_str), Some("destroy:live"));
    assert_eq!(stream.filter().lifecycle(), Lifecycle::Destroyed);
}

#[test]
fn test_hooks_after_teardown_continue() {
    let mut stream = scripted_stream("buffer:after");
    stream.request_headers(&mut headers(&[]), false);
    stream.destroy();
    let before = events("after").len();

    assert_eq!(
        stream.request_headers(&mut headers(&[]), false),
        HeadersStatus::Continue
    );
    assert_eq!(stream.request_data(b"x", false), BodyStatus::Continue);
    assert_eq!(
        stream.response_headers(&mut headers(&[]), false),
        HeadersStatus::Continue
    );
    assert_eq!(events("after").len(), before);
}

#[test]
fn test_destroy_runs_once() {
    let mut stream = scripted_stream("buffer:once");
    stream.request_headers(&mut headers(&[]), true);
    stream.destroy();
    stream.destroy();
    drop(stream);

    let destroys = events("once")
        .iter()
        .filter(|e| e.starts_with("destroy:"))
        .count();
    assert_eq!(destroys, 1);
}

#[test]
fn test_destroy_without_callbacks_sees_no_body() {
    let mut stream = TestStream::detached(scripted_filter("buffer:detached"));
    stream.request_headers(&mut headers(&[]), true);
    stream.destroy();
    assert_eq!(
        events("detached").last().map(String::as_str),
        Some("destroy:dead")
    );
}

#[test]
fn test_rejected_config() {
    let err = DynamicModule::load(
        "scripted",
        &crate::scripted::SCRIPTED_MODULE,
        b"no-such-mode",
    )
    .unwrap_err();
    assert!(matches!(err, BridgeError::ModuleInit(_)));
}

#[test]
fn test_filter_outlives_unloaded_module() {
    let mut registry = ModuleRegistry::new();
    registry
        .load("scripted", &crate::scripted::SCRIPTED_MODULE, b"buffer:unload")
        .unwrap();
    let filter = registry.new_filter("scripted").unwrap();
    registry.unload("scripted").unwrap();
    assert!(registry.get("scripted").is_none());

    let mut stream = TestStream::new(filter);
    assert_eq!(
        stream.request_headers(&mut headers(&[]), true),
        HeadersStatus::Continue
    );
    assert_eq!(events("unload"), vec!["new", "request_headers"]);
}
