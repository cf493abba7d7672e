//! Module log sink
//!
//! Records emitted by modules flow through one process-wide [`LogSink`]. The
//! default sink forwards to `tracing` under the `ferromod::module` target.

use ferromod_abi::LogLevel;
use ferromod_common::{DEFAULT_LOG_LEVEL, MODULE_LOG_TARGET};
use std::borrow::Cow;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

/// One log record, borrowed for the duration of the emit call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord<'a> {
    pub level: LogLevel,
    pub file: Cow<'a, str>,
    pub line: u32,
    pub function: Cow<'a, str>,
    pub message: Cow<'a, str>,
}

pub trait LogSink: Send + Sync {
    /// Records below this level are dropped before `emit`.
    fn min_level(&self) -> LogLevel;

    /// Adjust the minimum level. Sinks with a fixed level ignore this.
    fn set_min_level(&self, _level: LogLevel) {}

    fn emit(&self, record: &LogRecord<'_>);
}

/// Forwards module records to `tracing`.
#[derive(Debug)]
pub struct TracingSink {
    min_level: AtomicU32,
}

impl TracingSink {
    pub fn new(min_level: LogLevel) -> Self {
        Self {
            min_level: AtomicU32::new(min_level as u32),
        }
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_LEVEL)
    }
}

/// Map a raw level; anything out of range is treated as `Off`.
pub(crate) fn level_from_u32(raw: u32) -> LogLevel {
    LogLevel::from_raw(raw).unwrap_or(LogLevel::Off)
}

impl LogSink for TracingSink {
    fn min_level(&self) -> LogLevel {
        level_from_u32(self.min_level.load(Ordering::Relaxed))
    }

    fn set_min_level(&self, level: LogLevel) {
        self.min_level.store(level as u32, Ordering::Relaxed);
    }

    fn emit(&self, record: &LogRecord<'_>) {
        let file = record.file.as_ref();
        let function = record.function.as_ref();
        let line = record.line;
        let message = record.message.as_ref();
        match record.level {
            LogLevel::Trace => {
                tracing::trace!(target: MODULE_LOG_TARGET, file, line, function, "{}", message);
            }
            LogLevel::Debug => {
                tracing::debug!(target: MODULE_LOG_TARGET, file, line, function, "{}", message);
            }
            LogLevel::Info => {
                tracing::info!(target: MODULE_LOG_TARGET, file, line, function, "{}", message);
            }
            LogLevel::Warn => {
                tracing::warn!(target: MODULE_LOG_TARGET, file, line, function, "{}", message);
            }
            LogLevel::Error => {
                tracing::error!(target: MODULE_LOG_TARGET, file, line, function, "{}", message);
            }
            LogLevel::Critical => {
                tracing::error!(
                    target: MODULE_LOG_TARGET,
                    file,
                    line,
                    function,
                    critical = true,
                    "{}",
                    message
                );
            }
            LogLevel::Off => {}
        }
    }
}

static SINK: LazyLock<RwLock<Arc<dyn LogSink>>> =
    LazyLock::new(|| RwLock::new(Arc::new(TracingSink::default())));

/// The active sink.
pub fn log_sink() -> Arc<dyn LogSink> {
    Arc::clone(&SINK.read().unwrap_or_else(PoisonError::into_inner))
}

/// Replace the active sink, returning the previous one.
pub fn set_log_sink(sink: Arc<dyn LogSink>) -> Arc<dyn LogSink> {
    let mut guard = SINK.write().unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut *guard, sink)
}

/// Set the minimum level of the active sink.
pub fn set_log_level(level: LogLevel) {
    log_sink().set_min_level(level);
}

/// Emit `record` through `sink` if it passes the sink's threshold.
/// Returns whether the record was forwarded.
pub fn forward(sink: &dyn LogSink, record: &LogRecord<'_>) -> bool {
    if !record.level.passes(sink.min_level()) {
        return false;
    }

    #[cfg(feature = "metrics")]
    if let Some(m) = ferromod_observability::bridge_metrics() {
        m.record_module_log(record.level.as_str());
    }

    sink.emit(record);
    true
}
