use super::span;
use crate::log::{forward, level_from_u32, log_sink, LogRecord};
use ferromod_abi::LogResult;
use std::borrow::Cow;

/// # Safety
/// Non-null pointers must be readable for their lengths.
unsafe fn text<'a>(data: *const u8, len: usize) -> Cow<'a, str> {
    // SAFETY: guaranteed by the caller.
    unsafe { span(data, len) }.map_or(Cow::Borrowed(""), String::from_utf8_lossy)
}

#[allow(clippy::too_many_arguments)]
pub(super) unsafe extern "C" fn log(
    file: *const u8,
    file_len: usize,
    line: u32,
    function: *const u8,
    function_len: usize,
    level: u32,
    message: *const u8,
    message_len: usize,
) -> LogResult {
    // SAFETY: the module passes spans it owns for the duration of the call.
    let Some(message) = (unsafe { span(message, message_len) }).filter(|m| !m.is_empty()) else {
        return LogResult::InvalidMemory;
    };

    // SAFETY: as above.
    let record = unsafe {
        LogRecord {
            level: level_from_u32(level),
            file: text(file, file_len),
            line,
            function: text(function, function_len),
            message: String::from_utf8_lossy(message),
        }
    };
    forward(&*log_sink(), &record);
    LogResult::Success
}

pub(super) unsafe extern "C" fn log_enabled(level: u32) -> bool {
    level_from_u32(level).passes(log_sink().min_level())
}
