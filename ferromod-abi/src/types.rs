//! Plain data types crossing the boundary

use serde::{Deserialize, Serialize};
use std::fmt;

/// Processing direction of a stream.
///
/// "Decode" on the proxy side is the request direction, "encode" the response one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Request,
    Response,
}

impl Direction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Request => "request",
            Direction::Response => "response",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a headers hook.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeadersStatus {
    /// Hand the headers to the next stage.
    Continue = 0,
    /// Hold the headers; body frames may still be delivered to the hook.
    StopIteration = 1,
    /// Hold the headers and buffer everything that follows until resumed.
    StopAllIterationAndBuffer = 2,
}

impl HeadersStatus {
    /// Map a raw status received over the boundary.
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(HeadersStatus::Continue),
            1 => Some(HeadersStatus::StopIteration),
            2 => Some(HeadersStatus::StopAllIterationAndBuffer),
            _ => None,
        }
    }

    /// Whether the status suspends the pipeline for its direction.
    pub const fn is_stop(self) -> bool {
        !matches!(self, HeadersStatus::Continue)
    }
}

/// Result of a body hook.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyStatus {
    Continue = 0,
    /// Hold this frame and keep buffering subsequent ones.
    StopIterationAndBuffer = 1,
    /// Hold iteration without buffering.
    StopIterationNoBuffer = 2,
}

impl BodyStatus {
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(BodyStatus::Continue),
            1 => Some(BodyStatus::StopIterationAndBuffer),
            2 => Some(BodyStatus::StopIterationNoBuffer),
            _ => None,
        }
    }

    pub const fn is_stop(self) -> bool {
        !matches!(self, BodyStatus::Continue)
    }
}

/// Severity of a module log record, ordered from most to least verbose.
#[repr(u32)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    #[default]
    Info = 2,
    #[serde(alias = "warning")]
    Warn = 3,
    Error = 4,
    Critical = 5,
    /// Threshold only: nothing is at or above `Off`.
    Off = 6,
}

impl LogLevel {
    /// Map a raw level received over the boundary.
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(LogLevel::Trace),
            1 => Some(LogLevel::Debug),
            2 => Some(LogLevel::Info),
            3 => Some(LogLevel::Warn),
            4 => Some(LogLevel::Error),
            5 => Some(LogLevel::Critical),
            6 => Some(LogLevel::Off),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
            LogLevel::Off => "off",
        }
    }

    /// Whether a record of `self` passes a sink whose minimum is `threshold`.
    pub fn passes(self, threshold: LogLevel) -> bool {
        self != LogLevel::Off && threshold != LogLevel::Off && self >= threshold
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the log bridge call.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogResult {
    Success = 0,
    /// The message pointer was null or the message empty.
    InvalidMemory = 1,
}

/// One header name/value pair owned by the module, used for local replies.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct HeaderPair {
    pub key_ptr: *const u8,
    pub key_len: usize,
    pub value_ptr: *const u8,
    pub value_len: usize,
}

impl HeaderPair {
    /// Borrow a pair of byte slices. The pair is only valid while both slices are.
    pub fn new(key: &[u8], value: &[u8]) -> Self {
        Self {
            key_ptr: key.as_ptr(),
            key_len: key.len(),
            value_ptr: value.as_ptr(),
            value_len: value.len(),
        }
    }
}
