//! Body access and buffering through the bridge

use crate::scripted::events;
use crate::{headers, scripted_stream};
use ferromod_abi::{BodyStatus, RequestBodyPtr};
use ferromod_host::{Buffer, BRIDGE_V1};
use ferromod_sdk::RequestBody;
use std::io::Read;

#[test]
fn test_buffered_body_rewritten_in_place() {
    let mut stream = scripted_stream("uppercase:upper");
    stream.request_headers(&mut headers(&[]), false);

    assert_eq!(
        stream.request_data(b"ab", false),
        BodyStatus::StopIterationAndBuffer
    );
    assert_eq!(stream.buffered_request().as_deref(), Some(&b"ab"[..]));
    assert!(stream.forwarded_request().is_empty());

    assert_eq!(stream.request_data(b"cd", true), BodyStatus::Continue);
    assert_eq!(stream.forwarded_request(), b"ABCD");
    assert!(stream.buffered_request().is_none());

    let bodies: Vec<_> = events("upper")
        .into_iter()
        .filter(|e| e.starts_with("request_body"))
        .collect();
    assert_eq!(bodies, vec!["request_body:2", "request_body:4"]);
}

#[test]
fn test_single_frame_without_buffer() {
    let mut stream = scripted_stream("uppercase:single");
    stream.request_headers(&mut headers(&[]), false);
    assert_eq!(stream.request_data(b"xy", true), BodyStatus::Continue);
    assert_eq!(stream.forwarded_request(), b"XY");
}

#[test]
fn test_response_body_passes_through() {
    let mut stream = scripted_stream("buffer:respbody");
    stream.response_headers(&mut headers(&[]), false);
    assert_eq!(stream.response_data(b"hello", true), BodyStatus::Continue);
    assert_eq!(stream.forwarded_response(), b"hello");
    assert!(events("respbody").contains(&"response_body:5".to_string()));
}

#[test]
fn test_copy_out_and_drain() {
    let mut buffer = Buffer::from_slices(["ab", "cd"]);
    {
        // SAFETY: the buffer outlives the wrapper.
        let mut body = unsafe {
            RequestBody::from_raw(
                &BRIDGE_V1,
                RequestBodyPtr::from_raw(std::ptr::from_mut(&mut buffer).cast()),
            )
        };
        assert_eq!(body.len(), 4);

        let mut dest = [0u8; 2];
        assert_eq!(body.copy_out(1, &mut dest), 2);
        assert_eq!(&dest, b"bc");

        let mut all = String::new();
        body.reader().read_to_string(&mut all).unwrap();
        assert_eq!(all, "abcd");

        body.drain(3);
        assert_eq!(body.len(), 1);
        assert_eq!(body.copy(), b"d");
    }
    assert_eq!(buffer.len(), 1);
}
