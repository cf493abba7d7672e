//! Bundled filters driven through the host

use crate::{builtin_stream, headers};
use ferromod_abi::{BodyStatus, HeadersStatus};
use http::StatusCode;

const AUTH: &str = r#"{"kind":"token_auth","tokens":["valid-token"]}"#;

#[test]
fn test_token_auth_rejects_missing_token() {
    let mut stream = builtin_stream(AUTH);
    let status = stream.request_headers(&mut headers(&[("host", "a")]), true);
    assert_eq!(status, HeadersStatus::StopIteration);

    let replies = stream.replies();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].status, StatusCode::UNAUTHORIZED);
    assert_eq!(replies[0].headers["www-authenticate"], "Bearer");
    assert_eq!(replies[0].body, b"unauthorized");
}

#[test]
fn test_token_auth_rejects_wrong_token() {
    let mut stream = builtin_stream(AUTH);
    let mut map = headers(&[("authorization", "Bearer nope")]);
    assert_eq!(
        stream.request_headers(&mut map, true),
        HeadersStatus::StopIteration
    );
    assert_eq!(stream.replies().len(), 1);
}

#[test]
fn test_token_auth_accepts_and_strips() {
    let mut stream = builtin_stream(AUTH);
    let mut map = headers(&[("authorization", "Bearer valid-token"), ("host", "a")]);
    assert_eq!(
        stream.request_headers(&mut map, true),
        HeadersStatus::Continue
    );
    assert!(stream.replies().is_empty());
    assert!(!map.contains_key("authorization"));
    assert_eq!(map["host"], "a");
}

#[test]
fn test_body_rewrite_response() {
    let mut stream = builtin_stream(
        r#"{"kind":"body_rewrite","direction":"response","replace":"new","prepend":"<","append":">"}"#,
    );
    let mut map = headers(&[("content-length", "4")]);
    stream.response_headers(&mut map, false);
    assert!(!map.contains_key("content-length"));

    assert_eq!(
        stream.response_data(b"ol", false),
        BodyStatus::StopIterationAndBuffer
    );
    assert_eq!(stream.response_data(b"d!", true), BodyStatus::Continue);
    assert_eq!(stream.forwarded_response(), b"<new>");

    // Request direction is untouched.
    let mut req = headers(&[("content-length", "2")]);
    stream.request_headers(&mut req, false);
    assert_eq!(req["content-length"], "2");
    assert_eq!(stream.request_data(b"hi", true), BodyStatus::Continue);
    assert_eq!(stream.forwarded_request(), b"hi");
}

#[test]
fn test_body_rewrite_single_frame() {
    let mut stream = builtin_stream(r#"{"kind":"body_rewrite","append":"!"}"#);
    stream.request_headers(&mut headers(&[]), false);
    assert_eq!(stream.request_data(b"hey", true), BodyStatus::Continue);
    assert_eq!(stream.forwarded_request(), b"hey!");
}

#[test]
fn test_json_validate_accepts_split_body() {
    let mut stream =
        builtin_stream(r#"{"kind":"json_validate","required_fields":["foo"]}"#);
    stream.request_headers(&mut headers(&[]), false);
    assert_eq!(
        stream.request_data(br#"{"foo":"#, false),
        BodyStatus::StopIterationAndBuffer
    );
    assert_eq!(stream.request_data(b"1}", true), BodyStatus::Continue);
    assert_eq!(stream.forwarded_request(), br#"{"foo":1}"#);
    assert!(stream.replies().is_empty());
}

#[test]
fn test_json_validate_rejects_invalid() {
    let mut stream = builtin_stream(r#"{"kind":"json_validate"}"#);
    stream.request_headers(&mut headers(&[]), false);
    assert_eq!(
        stream.request_data(b"{oops", true),
        BodyStatus::StopIterationNoBuffer
    );
    assert!(stream.forwarded_request().is_empty());

    let replies = stream.replies();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].status, StatusCode::BAD_REQUEST);
    assert_eq!(replies[0].headers["content-type"], "text/plain");
    assert!(String::from_utf8_lossy(&replies[0].body).starts_with("invalid JSON"));
}

#[test]
fn test_json_validate_missing_field() {
    let mut stream =
        builtin_stream(r#"{"kind":"json_validate","required_fields":["foo"]}"#);
    stream.request_headers(&mut headers(&[]), false);
    stream.request_data(br#"{"bar":1}"#, true);
    let replies = stream.replies();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].body, b"missing field: foo");
}

#[test]
fn test_header_rewrite_both_directions() {
    let mut stream = builtin_stream(
        r#"{"kind":"header_rewrite",
            "request":{"set":{"x-env":"prod"},"remove":["x-debug"]},
            "response":{"set":{"server":"ferromod"}}}"#,
    );
    let mut req = headers(&[("x-debug", "1"), ("x-env", "dev")]);
    assert_eq!(stream.request_headers(&mut req, true), HeadersStatus::Continue);
    assert_eq!(req["x-env"], "prod");
    assert!(!req.contains_key("x-debug"));

    let mut resp = headers(&[("server", "upstream")]);
    stream.response_headers(&mut resp, true);
    assert_eq!(resp["server"], "ferromod");
}

#[test]
fn test_logger_passes_everything() {
    let mut stream = builtin_stream(r#"{"kind":"logger","body_sizes":true}"#);
    let mut req = headers(&[("host", "example.com")]);
    assert_eq!(stream.request_headers(&mut req, false), HeadersStatus::Continue);
    assert_eq!(stream.request_data(b"abc", true), BodyStatus::Continue);
    assert_eq!(
        stream.response_headers(&mut headers(&[]), false),
        HeadersStatus::Continue
    );
    assert_eq!(stream.response_data(b"ok", true), BodyStatus::Continue);
    assert_eq!(stream.forwarded_request(), b"abc");
    assert_eq!(stream.forwarded_response(), b"ok");
}
