//! Built-in [`LogSink`] implementations.

use crate::common::Field;
use crate::logger::{Level, LogSink};
use chrono::{SecondsFormat, Utc};
use colored::Colorize;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// A console-oriented sink.
///
/// Records are rendered on one line: an ISO-8601 timestamp, the colorized
/// level name, the message, and the fields as `key=value` pairs. Records
/// below the minimum level are dropped, and write failures are swallowed —
/// logging never aborts the operation it instruments.
pub struct ConsoleSink {
    writer: Mutex<Box<dyn Write + Send>>,
    min_level: Level,
}

impl ConsoleSink {
    /// Creates a sink writing to stdout with minimum level [`Level::Info`].
    pub fn stdout() -> Self {
        Self::with_writer(io::stdout())
    }

    /// Creates a sink writing to the given writer with minimum level
    /// [`Level::Info`].
    pub fn with_writer(writer: impl Write + Send + 'static) -> Self {
        ConsoleSink {
            writer: Mutex::new(Box::new(writer)),
            min_level: Level::Info,
        }
    }

    /// Sets the minimum level below which records are dropped.
    pub fn with_min_level(mut self, min_level: Level) -> Self {
        self.min_level = min_level;
        self
    }

    fn colorized(level: Level) -> colored::ColoredString {
        match level {
            Level::Info => level.as_str().blue(),
            Level::Warn => level.as_str().yellow(),
            Level::Error => level.as_str().red(),
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::stdout()
    }
}

impl LogSink for ConsoleSink {
    fn log(&self, level: Level, message: &str, fields: &[Field]) {
        if level < self.min_level {
            return;
        }

        let mut line = format!(
            "{}\t{}\t{}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            Self::colorized(level),
            message,
        );
        for field in fields {
            line.push_str(&format!("\t{}={}", field.key, field.value));
        }

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{line}");
        }
    }
}

/// One record captured by an [`InMemorySink`].
#[derive(Clone, Debug)]
pub struct Record {
    /// Severity the record was emitted at.
    pub level: Level,
    /// The record message.
    pub message: String,
    /// Pre-bound fields followed by call-site fields, in emission order.
    pub fields: Vec<Field>,
}

/// An in-memory sink that buffers emitted records.
///
/// Useful for testing and debugging: clones share the same buffer, so a
/// sink can be handed to a [`Logger`] while the test keeps a handle for
/// assertions via [`emitted`].
///
/// # Example
///
/// ```
/// use spanlog::{InMemorySink, Logger};
///
/// let sink = InMemorySink::new();
/// let logger = Logger::new(sink.clone());
///
/// logger.info("ready", vec![]);
/// assert_eq!(sink.emitted().len(), 1);
/// ```
///
/// [`Logger`]: crate::Logger
/// [`emitted`]: InMemorySink::emitted
#[derive(Clone, Debug, Default)]
pub struct InMemorySink {
    records: Arc<Mutex<Vec<Record>>>,
}

impl InMemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the records emitted so far.
    pub fn emitted(&self) -> Vec<Record> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Clears the captured records.
    pub fn reset(&self) {
        if let Ok(mut records) = self.records.lock() {
            records.clear();
        }
    }
}

impl LogSink for InMemorySink {
    fn log(&self, level: Level, message: &str, fields: &[Field]) {
        if let Ok(mut records) = self.records.lock() {
            records.push(Record {
                level,
                message: message.to_owned(),
                fields: fields.to_vec(),
            });
        }
    }
}
