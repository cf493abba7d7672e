//! Continuation tests
//!
//! Resumes requested from other threads are marshalled onto the stream's
//! event loop and delivered at most once per suspension.

use crate::scripted::events;
use crate::{builtin_stream, headers, scripted_stream};
use ferromod_abi::{BodyStatus, Direction, HeadersStatus};
use ferromod_host::{ContinuationState, BRIDGE_V1};
use ferromod_tests::TestStream;
use std::time::Duration;

fn continue_request(stream: &TestStream) {
    // SAFETY: the stream keeps its filter alive.
    unsafe { (BRIDGE_V1.continue_request)(stream.filter().as_ptr()) };
}

#[test]
fn test_concurrent_resumes_deliver_once() {
    let mut stream = scripted_stream("resume:twice");
    assert_eq!(
        stream.request_headers(&mut headers(&[]), true),
        HeadersStatus::StopIteration
    );
    assert_eq!(stream.decoder().continues(), 0);

    assert_eq!(stream.run_pending(), 2);
    assert_eq!(stream.decoder().continues(), 1);
    assert_eq!(
        stream.filter().continuation_state(Direction::Request),
        ContinuationState::ResumeRequested
    );
}

#[test]
fn test_resume_after_teardown_is_dropped() {
    let mut stream = scripted_stream("resume:late");
    stream.request_headers(&mut headers(&[]), true);
    stream.destroy();

    stream.run_pending();
    assert_eq!(stream.decoder().continues(), 0);
    assert_eq!(events("late").last().map(String::as_str), Some("destroy:dead"));
}

#[test]
fn test_stop_rearms_after_resume() {
    let mut stream = scripted_stream("buffer:rearm");
    stream.request_headers(&mut headers(&[]), false);

    assert_eq!(
        stream.request_data(b"a", false),
        BodyStatus::StopIterationAndBuffer
    );
    assert_eq!(
        stream.filter().continuation_state(Direction::Request),
        ContinuationState::Suspended
    );
    continue_request(&stream);
    continue_request(&stream);
    stream.run_pending();
    assert_eq!(stream.decoder().continues(), 1);

    assert_eq!(
        stream.request_data(b"b", false),
        BodyStatus::StopIterationAndBuffer
    );
    assert_eq!(
        stream.filter().continuation_state(Direction::Request),
        ContinuationState::Suspended
    );
    continue_request(&stream);
    stream.run_pending();
    assert_eq!(stream.decoder().continues(), 2);
    assert_eq!(stream.buffered_request().as_deref(), Some(&b"ab"[..]));
}

#[test]
fn test_continue_response_uses_encoder() {
    let mut stream = scripted_stream("buffer:encoder");
    stream.response_headers(&mut headers(&[]), false);

    // SAFETY: the stream keeps its filter alive.
    unsafe { (BRIDGE_V1.continue_response)(stream.filter().as_ptr()) };
    stream.run_pending();
    assert_eq!(stream.encoder().continues(), 1);
    assert_eq!(stream.decoder().continues(), 0);
}

#[test]
fn test_continue_without_callbacks_is_ignored() {
    let mut stream = TestStream::detached(crate::scripted_filter("buffer:nocb"));
    stream.request_headers(&mut headers(&[]), false);
    continue_request(&stream);
    assert_eq!(stream.run_pending(), 0);
}

#[test]
fn test_delay_resumes_from_worker_thread() {
    let mut stream = builtin_stream(r#"{"kind":"delay","delay_ms":10}"#);
    assert_eq!(
        stream.request_headers(&mut headers(&[]), true),
        HeadersStatus::StopAllIterationAndBuffer
    );
    assert!(stream.run_next(Duration::from_secs(5)));
    assert_eq!(stream.decoder().continues(), 1);
}

#[test]
fn test_delay_after_destroy_never_resumes() {
    let mut stream = builtin_stream(r#"{"kind":"delay","delay_ms":50}"#);
    stream.request_headers(&mut headers(&[]), true);
    stream.destroy();

    assert!(!stream.run_next(Duration::from_millis(300)));
    assert_eq!(stream.decoder().continues(), 0);
}
