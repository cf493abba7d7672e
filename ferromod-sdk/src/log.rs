//! Logging through the host's sink
//!
//! Use the `log_*!` macros. They check the host's threshold before formatting,
//! so disabled records cost one call.

use crate::ffi::bridge;
use ferromod_abi::LogLevel;

/// Whether the host would keep a record at `level`.
#[doc(hidden)]
pub fn enabled(level: LogLevel) -> bool {
    // SAFETY: the table was checked at config creation.
    bridge().is_some_and(|b| unsafe { (b.log_enabled)(level as u32) })
}

#[doc(hidden)]
pub fn emit(level: LogLevel, file: &str, line: u32, function: &str, message: &str) {
    let Some(b) = bridge() else {
        return;
    };
    // SAFETY: every span borrows memory that outlives the call.
    unsafe {
        (b.log)(
            file.as_ptr(),
            file.len(),
            line,
            function.as_ptr(),
            function.len(),
            level as u32,
            message.as_ptr(),
            message.len(),
        );
    }
}

/// Log at an explicit level.
#[macro_export]
macro_rules! module_log {
    ($level:expr, $($arg:tt)*) => {{
        let level = $level;
        if $crate::log::enabled(level) {
            $crate::log::emit(
                level,
                ::std::file!(),
                ::std::line!(),
                ::std::module_path!(),
                &::std::format!($($arg)*),
            );
        }
    }};
}

#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => { $crate::module_log!($crate::abi::LogLevel::Trace, $($arg)*) };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => { $crate::module_log!($crate::abi::LogLevel::Debug, $($arg)*) };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => { $crate::module_log!($crate::abi::LogLevel::Info, $($arg)*) };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => { $crate::module_log!($crate::abi::LogLevel::Warn, $($arg)*) };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => { $crate::module_log!($crate::abi::LogLevel::Error, $($arg)*) };
}

#[macro_export]
macro_rules! log_critical {
    ($($arg:tt)*) => { $crate::module_log!($crate::abi::LogLevel::Critical, $($arg)*) };
}
