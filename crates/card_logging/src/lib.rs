#![deny(missing_docs)]
//! Shared logging utilities for the gptcard workspace.
//!
//! This crate provides the `card_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. Every line is
//! prefixed with the sequence number of the mutation batch being processed,
//! so log output can be correlated with what the host page just did.

use std::cell::Cell;

thread_local! {
    /// Thread-local storage for the current mutation batch sequence number.
    static BATCH_SEQ: Cell<u64> = const { Cell::new(0) };
}

/// Sets the mutation batch sequence number for the current thread.
/// The content script runtime calls this once per drained batch.
pub fn set_batch_seq(seq: u64) {
    BATCH_SEQ.with(|v| v.set(seq));
}

/// Retrieves the mutation batch sequence number for the current thread.
/// Returns 0 before the first batch has been drained.
pub fn batch_seq() -> u64 {
    BATCH_SEQ.with(|v| v.get())
}

/// Logs a trace-level message tagged with the current batch.
#[macro_export]
macro_rules! card_trace {
    ($($arg:tt)*) => {{
        log::trace!("[batch {}] {}", $crate::batch_seq(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message tagged with the current batch.
#[macro_export]
macro_rules! card_info {
    ($($arg:tt)*) => {{
        log::info!("[batch {}] {}", $crate::batch_seq(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message tagged with the current batch.
#[macro_export]
macro_rules! card_debug {
    ($($arg:tt)*) => {{
        log::debug!("[batch {}] {}", $crate::batch_seq(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message tagged with the current batch.
#[macro_export]
macro_rules! card_warn {
    ($($arg:tt)*) => {{
        log::warn!("[batch {}] {}", $crate::batch_seq(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message tagged with the current batch.
#[macro_export]
macro_rules! card_error {
    ($($arg:tt)*) => {{
        log::error!("[batch {}] {}", $crate::batch_seq(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Trace in debug builds so classifier decisions show up in failing tests.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Trace
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
