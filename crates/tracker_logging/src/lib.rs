#![deny(missing_docs)]
//! Shared logging utilities for the tracker workspace.
//!
//! This crate provides the `tracker_*` logging macros used across the codebase,
//! a per-thread task context that is prefixed to every line, and a minimal test
//! initializer for the global logger.

use std::cell::RefCell;

thread_local! {
    /// Task id the current thread is working on, if any.
    static TASK_CONTEXT: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Sets the task id for log lines emitted from the current thread.
/// Pass `None` once the thread no longer works on a task.
pub fn set_task_context(task_id: Option<&str>) {
    TASK_CONTEXT.with(|ctx| *ctx.borrow_mut() = task_id.map(str::to_owned));
}

/// Returns the task id set for the current thread, if any.
pub fn task_context() -> Option<String> {
    TASK_CONTEXT.with(|ctx| ctx.borrow().clone())
}

/// Prefix used by the logging macros: `[task <id>] ` or an empty string.
#[doc(hidden)]
pub fn context_prefix() -> String {
    task_context()
        .map(|id| format!("[task {id}] "))
        .unwrap_or_default()
}

#[doc(hidden)]
#[macro_export]
macro_rules! __tracker_log {
    ($level:expr, $($arg:tt)*) => {
        log::log!($level, "{}{}", $crate::context_prefix(), format_args!($($arg)*))
    };
}

/// `log::trace!` with the task prefix.
#[macro_export]
macro_rules! tracker_trace {
    ($($arg:tt)*) => { $crate::__tracker_log!(log::Level::Trace, $($arg)*) };
}

/// `log::debug!` with the task prefix.
#[macro_export]
macro_rules! tracker_debug {
    ($($arg:tt)*) => { $crate::__tracker_log!(log::Level::Debug, $($arg)*) };
}

/// `log::info!` with the task prefix.
#[macro_export]
macro_rules! tracker_info {
    ($($arg:tt)*) => { $crate::__tracker_log!(log::Level::Info, $($arg)*) };
}

/// `log::warn!` with the task prefix.
#[macro_export]
macro_rules! tracker_warn {
    ($($arg:tt)*) => { $crate::__tracker_log!(log::Level::Warn, $($arg)*) };
}

/// `log::error!` with the task prefix.
#[macro_export]
macro_rules! tracker_error {
    ($($arg:tt)*) => { $crate::__tracker_log!(log::Level::Error, $($arg)*) };
}

/// Terminal logger for tests; a no-op when a logger is already installed.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
