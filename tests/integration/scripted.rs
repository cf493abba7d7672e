//! A module written against the SDK whose behavior is picked by config
//!
//! The config string is `mode` or `mode:tag`. Every hook records an event
//! under the tag so tests running in parallel do not see each other's events.

use ferromod_sdk::{
    declare_module, log_debug, log_info, BodyStatus, FilterHandle, HeadersStatus, HttpFilter,
    HttpFilterInstance, RequestBody, RequestHeaders, ResponseBody, ResponseHeaders,
};
use std::sync::{Mutex, PoisonError};

static EVENTS: Mutex<Vec<(String, String)>> = Mutex::new(Vec::new());

fn record(tag: &str, event: impl Into<String>) {
    EVENTS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push((tag.to_string(), event.into()));
}

/// Events recorded under `tag`, in order.
pub fn events(tag: &str) -> Vec<String> {
    EVENTS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .filter(|(t, _)| t == tag)
        .map(|(_, e)| e.clone())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Buffer request bodies until end of stream.
    Buffer,
    /// Reply 403 to requests carrying `x-blocked`.
    Deny,
    /// Report what it sees under `X-A`, then overwrite it.
    Xa,
    /// Upper-case the complete request body in place.
    Uppercase,
    /// Stop, then resume twice from two threads.
    Resume,
    /// Create no per-stream object.
    Null,
    /// Reply 500 from the response headers hook.
    ResponseReply,
    /// Log at info and debug from the request headers hook.
    Log,
}

struct Scripted {
    mode: Mode,
    tag: String,
}

fn new_scripted(config: &str) -> Option<Box<dyn HttpFilter>> {
    let (mode, tag) = config.split_once(':').unwrap_or((config, config));
    let mode = match mode {
        "buffer" => Mode::Buffer,
        "deny" => Mode::Deny,
        "xa" => Mode::Xa,
        "uppercase" => Mode::Uppercase,
        "resume" => Mode::Resume,
        "null" => Mode::Null,
        "response_reply" => Mode::ResponseReply,
        "log" => Mode::Log,
        _ => return None,
    };
    Some(Box::new(Scripted {
        mode,
        tag: tag.to_string(),
    }))
}

declare_module!(SCRIPTED_MODULE, new_scripted);

impl HttpFilter for Scripted {
    fn new_instance(&self, _filter: &mut FilterHandle) -> Option<Box<dyn HttpFilterInstance>> {
        record(&self.tag, "new");
        if self.mode == Mode::Null {
            return None;
        }
        Some(Box::new(ScriptedInstance {
            mode: self.mode,
            tag: self.tag.clone(),
        }))
    }
}

fn uppercase(body: &mut RequestBody<'_>) {
    for slice in body.slices() {
        slice.make_ascii_uppercase();
    }
}

struct ScriptedInstance {
    mode: Mode,
    tag: String,
}

impl HttpFilterInstance for ScriptedInstance {
    fn on_request_headers(
        &mut self,
        filter: &mut FilterHandle,
        headers: &mut RequestHeaders<'_>,
        _end_stream: bool,
    ) -> HeadersStatus {
        record(&self.tag, "request_headers");
        match self.mode {
            Mode::Deny if headers.get("x-blocked").is_some() => {
                filter.send_response(403, &[("X-Reason", "blocked")], b"");
                HeadersStatus::StopIteration
            }
            Mode::Xa => {
                let first = headers.get_str("X-A").unwrap_or("-").to_string();
                let count = headers.count("X-A");
                let all: Vec<String> = headers
                    .values("x-a")
                    .iter()
                    .map(|v| String::from_utf8_lossy(v).into_owned())
                    .collect();
                headers.set("x-a-first", first);
                headers.set("x-a-count", count.to_string());
                headers.set("x-a-all", all.join(","));
                headers.set("X-A", "3");
                headers.remove("x-drop");
                HeadersStatus::Continue
            }
            Mode::Resume => {
                let resume = filter.resume_handle();
                let workers: Vec<_> = (0..2)
                    .map(|_| {
                        let resume = resume.clone();
                        std::thread::spawn(move || resume.continue_request())
                    })
                    .collect();
                for worker in workers {
                    let _ = worker.join();
                }
                HeadersStatus::StopIteration
            }
            Mode::Log => {
                log_info!("hello from {}", self.tag);
                log_debug!("debug from {}", self.tag);
                HeadersStatus::Continue
            }
            _ => HeadersStatus::Continue,
        }
    }

    fn on_request_body(
        &mut self,
        filter: &mut FilterHandle,
        body: &mut RequestBody<'_>,
        end_stream: bool,
    ) -> BodyStatus {
        record(&self.tag, format!("request_body:{}", body.len()));
        match self.mode {
            Mode::Buffer | Mode::Uppercase if !end_stream => BodyStatus::StopIterationAndBuffer,
            Mode::Uppercase => {
                match filter.request_body() {
                    Some(mut whole) => uppercase(&mut whole),
                    None => uppercase(body),
                }
                BodyStatus::Continue
            }
            _ => BodyStatus::Continue,
        }
    }

    fn on_response_headers(
        &mut self,
        filter: &mut FilterHandle,
        headers: &mut ResponseHeaders<'_>,
        _end_stream: bool,
    ) -> HeadersStatus {
        record(&self.tag, "response_headers");
        if self.mode == Mode::ResponseReply {
            filter.send_response(500, &[("dog", "cat")], b"local response at response headers");
            return HeadersStatus::StopIteration;
        }
        headers.set("x-scripted", self.tag.as_str());
        HeadersStatus::Continue
    }

    fn on_response_body(
        &mut self,
        _filter: &mut FilterHandle,
        body: &mut ResponseBody<'_>,
        _end_stream: bool,
    ) -> BodyStatus {
        record(&self.tag, format!("response_body:{}", body.len()));
        BodyStatus::Continue
    }

    fn destroy(&mut self, filter: &mut FilterHandle) {
        let live = filter.request_body().is_some();
        record(&self.tag, if live { "destroy:live" } else { "destroy:dead" });
    }
}
