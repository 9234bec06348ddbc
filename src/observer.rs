//! Leveled event sink for retrieve calls
//!
//! The orchestrator reports what it does through an [`Observer`] together with
//! the log level in effect for the call. [`TracingObserver`] forwards to
//! `tracing`; [`NoopObserver`] drops everything.

use tracing::{debug, error, info, warn};

use crate::config::LogLevel;

/// Event severity, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Verbose,
    Info,
    Warn,
    Error,
}

impl Severity {
    /// Whether an event of this severity passes `level`
    pub fn enabled_at(self, level: LogLevel) -> bool {
        let threshold = match level {
            LogLevel::Silent => return false,
            LogLevel::Error => Severity::Error,
            LogLevel::Warn => Severity::Warn,
            LogLevel::Info => Severity::Info,
            LogLevel::Verbose => Severity::Verbose,
        };
        self >= threshold
    }
}

/// Receives events emitted by retrieve calls
pub trait Observer: Send + Sync {
    fn event(&self, level: LogLevel, severity: Severity, url: &str, message: &str);
}

/// Observer that discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn event(&self, _level: LogLevel, _severity: Severity, _url: &str, _message: &str) {}
}

/// Observer that forwards events passing the call's log level to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn event(&self, level: LogLevel, severity: Severity, url: &str, message: &str) {
        if !severity.enabled_at(level) {
            return;
        }
        match severity {
            Severity::Verbose => debug!(url = url, "{}", message),
            Severity::Info => info!(url = url, "{}", message),
            Severity::Warn => warn!(url = url, "{}", message),
            Severity::Error => error!(url = url, "{}", message),
        }
    }
}
