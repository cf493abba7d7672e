//! Local replies sent by modules

use crate::{headers, scripted_filter};
use ferromod_abi::HeadersStatus;
use ferromod_common::LOCAL_REPLY_DETAILS;
use ferromod_tests::TestStream;
use http::StatusCode;

#[test]
fn test_deny_through_decoder() {
    let mut stream = TestStream::detached(scripted_filter("deny:deny403"));
    stream.attach_decoder();

    let status = stream.request_headers(&mut headers(&[("x-blocked", "1")]), true);
    assert_eq!(status, HeadersStatus::StopIteration);

    let replies = stream.replies();
    assert_eq!(replies.len(), 1);
    let reply = &replies[0];
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.headers["x-reason"], "blocked");
    assert_eq!(reply.headers.len(), 1);
    assert!(reply.body.is_empty());
    assert_eq!(reply.details, LOCAL_REPLY_DETAILS);
}

#[test]
fn test_allowed_request_sends_nothing() {
    let mut stream = TestStream::new(scripted_filter("deny:allow"));
    let status = stream.request_headers(&mut headers(&[("host", "a")]), true);
    assert_eq!(status, HeadersStatus::Continue);
    assert!(stream.replies().is_empty());
}

#[test]
fn test_reply_through_encoder_only() {
    let mut stream = TestStream::detached(scripted_filter("response_reply:enc"));
    stream.attach_encoder();

    let status = stream.response_headers(&mut headers(&[]), false);
    assert_eq!(status, HeadersStatus::StopIteration);

    let replies = stream.replies();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(replies[0].headers["dog"], "cat");
    assert_eq!(replies[0].body, b"local response at response headers");
}

#[test]
fn test_reply_without_callbacks_is_dropped() {
    let mut stream = TestStream::detached(scripted_filter("deny:nocallbacks"));
    let status = stream.request_headers(&mut headers(&[("x-blocked", "1")]), true);
    assert_eq!(status, HeadersStatus::StopIteration);
    assert!(stream.replies().is_empty());
}
