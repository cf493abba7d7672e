use crate::body::{RequestBody, ResponseBody};
use crate::handle::FilterHandle;
use crate::headers::{RequestHeaders, ResponseHeaders};
use crate::traits::{HttpFilter, HttpFilterInstance};
use ferromod_abi::{BodyStatus, HeadersStatus};
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

fn default_request_headers() -> Vec<String> {
    vec!["host".to_string(), "user-agent".to_string()]
}

fn default_response_headers() -> Vec<String> {
    vec!["content-type".to_string()]
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggerConfig {
    /// Request headers to include in the log line.
    #[serde(default = "default_request_headers")]
    pub request_headers: Vec<String>,
    #[serde(default = "default_response_headers")]
    pub response_headers: Vec<String>,
    /// Also log total body sizes at end of stream.
    #[serde(default)]
    pub body_sizes: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            request_headers: default_request_headers(),
            response_headers: default_response_headers(),
            body_sizes: false,
        }
    }
}

pub(super) struct Logger {
    config: Arc<LoggerConfig>,
    next_id: AtomicU64,
}

impl Logger {
    pub(super) fn new(config: LoggerConfig) -> Self {
        Self {
            config: Arc::new(config),
            next_id: AtomicU64::new(1),
        }
    }
}

impl HttpFilter for Logger {
    fn new_instance(&self, _filter: &mut FilterHandle) -> Option<Box<dyn HttpFilterInstance>> {
        Some(Box::new(LoggerInstance {
            config: Arc::clone(&self.config),
            stream: self.next_id.fetch_add(1, Ordering::Relaxed),
            request_bytes: 0,
            response_bytes: 0,
        }))
    }
}

struct LoggerInstance {
    config: Arc<LoggerConfig>,
    stream: u64,
    request_bytes: usize,
    response_bytes: usize,
}

impl HttpFilterInstance for LoggerInstance {
    fn on_request_headers(
        &mut self,
        _filter: &mut FilterHandle,
        headers: &mut RequestHeaders<'_>,
        end_stream: bool,
    ) -> HeadersStatus {
        let fields: Vec<String> = self
            .config
            .request_headers
            .iter()
            .map(|name| format!("{}={}", name, headers.get_str(name).unwrap_or("-")))
            .collect();
        crate::log_info!(
            "stream {} request {} end_stream={}",
            self.stream,
            fields.join(" "),
            end_stream
        );
        HeadersStatus::Continue
    }

    fn on_request_body(
        &mut self,
        _filter: &mut FilterHandle,
        body: &mut RequestBody<'_>,
        end_stream: bool,
    ) -> BodyStatus {
        self.request_bytes += body.len();
        if self.config.body_sizes && end_stream {
            crate::log_info!("stream {} request body {} bytes", self.stream, self.request_bytes);
        }
        BodyStatus::Continue
    }

    fn on_response_headers(
        &mut self,
        _filter: &mut FilterHandle,
        headers: &mut ResponseHeaders<'_>,
        end_stream: bool,
    ) -> HeadersStatus {
        let fields: Vec<String> = self
            .config
            .response_headers
            .iter()
            .map(|name| format!("{}={}", name, headers.get_str(name).unwrap_or("-")))
            .collect();
        crate::log_info!(
            "stream {} response {} end_stream={}",
            self.stream,
            fields.join(" "),
            end_stream
        );
        HeadersStatus::Continue
    }

    fn on_response_body(
        &mut self,
        _filter: &mut FilterHandle,
        body: &mut ResponseBody<'_>,
        end_stream: bool,
    ) -> BodyStatus {
        self.response_bytes += body.len();
        if self.config.body_sizes && end_stream {
            crate::log_info!(
                "stream {} response body {} bytes",
                self.stream,
                self.response_bytes
            );
        }
        BodyStatus::Continue
    }

    fn destroy(&mut self, _filter: &mut FilterHandle) {
        crate::log_debug!("stream {} done", self.stream);
    }
}
