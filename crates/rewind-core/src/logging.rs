// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Injected logger capability.
//!
//! The simulation kernel never throws and never prints; diagnostics flow
//! through an explicit logger value handed down from the host. Production
//! wiring typically uses [`FacadeLogger`] (backed by the `log` facade);
//! tests use [`RecordingLogger`] to assert on emitted diagnostics.

use std::cell::RefCell;

/// Severity of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Informational.
    Info,
    /// Unexpected but recoverable.
    Warn,
    /// Contract violation or data corruption.
    Error,
}

/// Logger capability passed through the collision and session layers.
pub trait Logger {
    /// Emits one diagnostic message at the given severity.
    fn log(&self, level: LogLevel, message: &str);

    /// Emits at [`LogLevel::Info`].
    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    /// Emits at [`LogLevel::Warn`].
    fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    /// Emits at [`LogLevel::Error`].
    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }
}

/// Logger that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _level: LogLevel, _message: &str) {}
}

/// Logger that forwards to the `log` crate facade.
///
/// The host picks the sink by installing whatever `log` backend it wants
/// (e.g. `env_logger`); the core stays sink-agnostic.
#[derive(Debug, Default, Clone, Copy)]
pub struct FacadeLogger;

impl Logger for FacadeLogger {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => log::info!("{message}"),
            LogLevel::Warn => log::warn!("{message}"),
            LogLevel::Error => log::error!("{message}"),
        }
    }
}

/// Logger that records messages in memory for test assertions.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    entries: RefCell<Vec<(LogLevel, String)>>,
}

impl RecordingLogger {
    /// Creates an empty recording logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything logged so far.
    #[must_use]
    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries.borrow().clone()
    }

    /// Number of messages at `level`.
    #[must_use]
    pub fn count_at(&self, level: LogLevel) -> usize {
        self.entries.borrow().iter().filter(|(l, _)| *l == level).count()
    }

    /// True when nothing has been logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl Logger for RecordingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        self.entries.borrow_mut().push((level, message.to_owned()));
    }
}
