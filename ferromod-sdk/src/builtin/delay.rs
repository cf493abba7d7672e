//! Holds request headers for a fixed time, then resumes from a worker thread

use crate::handle::FilterHandle;
use crate::headers::RequestHeaders;
use crate::traits::{HttpFilter, HttpFilterInstance};
use ferromod_abi::HeadersStatus;
use serde::Deserialize;
use std::thread;
use std::time::Duration;

fn default_delay_ms() -> u64 {
    100
}

#[derive(Debug, Clone, Deserialize)]
pub struct DelayConfig {
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
        }
    }
}

pub(super) struct Delay {
    delay: Duration,
}

impl Delay {
    pub(super) fn new(config: DelayConfig) -> Self {
        Self {
            delay: Duration::from_millis(config.delay_ms),
        }
    }
}

impl HttpFilter for Delay {
    fn new_instance(&self, _filter: &mut FilterHandle) -> Option<Box<dyn HttpFilterInstance>> {
        Some(Box::new(DelayInstance { delay: self.delay }))
    }
}

struct DelayInstance {
    delay: Duration,
}

impl HttpFilterInstance for DelayInstance {
    fn on_request_headers(
        &mut self,
        filter: &mut FilterHandle,
        _headers: &mut RequestHeaders<'_>,
        _end_stream: bool,
    ) -> HeadersStatus {
        let resume = filter.resume_handle();
        let delay = self.delay;
        let spawned = thread::Builder::new()
            .name("ferromod-delay".to_string())
            .spawn(move || {
                thread::sleep(delay);
                resume.continue_request();
            });
        if let Err(e) = spawned {
            crate::log_warn!("failed to spawn delay thread: {}", e);
            return HeadersStatus::Continue;
        }
        HeadersStatus::StopAllIterationAndBuffer
    }
}
