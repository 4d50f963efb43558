//! # Diagnostics
//!
//! This crate implements structured diagnostics for the messaging fabric.
//!
//! ## Philosophy
//!
//! - Logging is explicit and structured, not text-based or printf-style
//! - The fabric reports through a sink capability handed to it at
//!   construction; there is no global logger
//! - Dropped messages, protocol misuse, and handler failures are
//!   diagnostics, never faults

use core_types::WindowId;
use std::cell::RefCell;
use std::fmt;

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Debug information
    Debug,
    /// Informational messages
    Info,
    /// Warnings
    Warn,
    /// Errors
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// A structured log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Component that produced the entry (e.g. "router", "sessions")
    pub component: &'static str,
    /// Window involved, if known
    pub window: Option<WindowId>,
    /// Log message
    pub message: String,
    /// Structured fields
    pub fields: Vec<(String, String)>,
}

impl LogEntry {
    /// Creates a new log entry
    pub fn new(level: LogLevel, component: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            component,
            window: None,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Creates a warning entry
    pub fn warn(component: &'static str, message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warn, component, message)
    }

    /// Creates an error entry
    pub fn error(component: &'static str, message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, component, message)
    }

    /// Creates a debug entry
    pub fn debug(component: &'static str, message: impl Into<String>) -> Self {
        Self::new(LogLevel::Debug, component, message)
    }

    /// Sets the window involved
    pub fn with_window(mut self, window: WindowId) -> Self {
        self.window = Some(window);
        self
    }

    /// Adds a field to the log entry
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }
}

/// Sink for fabric diagnostics
///
/// The composition root decides where entries go (console, log service,
/// test recorder). The fabric only ever records; it never reads back.
pub trait DiagnosticSink {
    /// Records a diagnostic entry
    fn record(&self, entry: LogEntry);
}

/// Sink that discards every entry
#[derive(Debug, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&self, _entry: LogEntry) {}
}

/// Sink that records entries in memory
///
/// Used by tests to assert on diagnostics, and by hosts that poll and
/// drain entries on their own schedule.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: RefCell<Vec<LogEntry>>,
}

impl MemorySink {
    /// Creates an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all recorded entries
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.borrow().clone()
    }

    /// Returns how many entries were recorded at `level`
    pub fn count_at(&self, level: LogLevel) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|entry| entry.level == level)
            .count()
    }

    /// Returns whether any entry at `level` mentions `needle`
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|entry| entry.level == level && entry.message.contains(needle))
    }

    /// Removes and returns all recorded entries
    pub fn drain(&self) -> Vec<LogEntry> {
        self.entries.borrow_mut().drain(..).collect()
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&self, entry: LogEntry) {
        self.entries.borrow_mut().push(entry);
    }
}
