//! Logging sink shared by every component of a client.
//!
//! A [`ReportingHandler`] holds at most one logging callback. Setting the
//! callback and invoking it take the same lock, so replacing the callback waits
//! for an in-flight invocation to finish and vice versa. Every record is also
//! emitted as a `tracing` event under the `sfs_client` target.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::error::Error;

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogSeverity {
    Info,
    Warning,
    Error,
    Verbose,
}

impl fmt::Display for LogSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogSeverity::Info => write!(f, "Info"),
            LogSeverity::Warning => write!(f, "Warning"),
            LogSeverity::Error => write!(f, "Error"),
            LogSeverity::Verbose => write!(f, "Verbose"),
        }
    }
}

/// A single log record handed to the logging callback.
#[derive(Debug, Clone, Copy)]
pub struct LogData<'a> {
    pub severity: LogSeverity,
    pub message: &'a str,
    pub file: &'static str,
    pub line: u32,
    pub time: DateTime<Utc>,
}

pub type LoggingCallback = Box<dyn Fn(&LogData<'_>) + Send + 'static>;

/// Cloneable handle to a single shared callback slot.
///
/// Clones share the slot, so a callback set through one clone is seen by all.
#[derive(Clone, Default)]
pub struct ReportingHandler {
    callback: Arc<Mutex<Option<LoggingCallback>>>,
}

impl fmt::Debug for ReportingHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportingHandler")
            .field("callback", &"{ ... }")
            .finish()
    }
}

impl ReportingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the logging callback. Passing `None` disables callback logging.
    ///
    /// Blocks while another thread is inside the current callback.
    pub fn set_logging_callback(&self, callback: Option<LoggingCallback>) {
        *self.slot() = callback;
    }

    pub fn log(&self, severity: LogSeverity, message: &str, file: &'static str, line: u32) {
        match severity {
            LogSeverity::Error => tracing::error!(target: "sfs_client", file, line, "{message}"),
            LogSeverity::Warning => tracing::warn!(target: "sfs_client", file, line, "{message}"),
            LogSeverity::Info => tracing::info!(target: "sfs_client", file, line, "{message}"),
            LogSeverity::Verbose => tracing::debug!(target: "sfs_client", file, line, "{message}"),
        }

        let slot = self.slot();
        if let Some(callback) = slot.as_ref() {
            callback(&LogData {
                severity,
                message,
                file,
                line,
                time: Utc::now(),
            });
        }
    }

    /// Log a failure at the place it was detected.
    pub fn log_error(&self, err: &Error, file: &'static str, line: u32) {
        self.log(LogSeverity::Error, &err.to_string(), file, line);
    }

    fn slot(&self) -> MutexGuard<'_, Option<LoggingCallback>> {
        // A panicking callback must not disable logging for everyone else.
        self.callback.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

macro_rules! log_info {
    ($handler:expr, $($arg:tt)+) => {
        $handler.log($crate::reporting::LogSeverity::Info, &format!($($arg)+), file!(), line!())
    };
}

macro_rules! log_warning {
    ($handler:expr, $($arg:tt)+) => {
        $handler.log($crate::reporting::LogSeverity::Warning, &format!($($arg)+), file!(), line!())
    };
}

macro_rules! log_verbose {
    ($handler:expr, $($arg:tt)+) => {
        $handler.log($crate::reporting::LogSeverity::Verbose, &format!($($arg)+), file!(), line!())
    };
}

pub(crate) use {log_info, log_verbose, log_warning};
