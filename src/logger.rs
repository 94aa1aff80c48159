//! Loggers and the "log now" facade.
//!
//! A [`Logger`] pairs a [`LogSink`] with a set of pre-bound fields. Deriving
//! a logger with [`Logger::with_fields`] never mutates the original, so a
//! logger can be resolved once and shared freely.
//!
//! [`Logger::from_context`] is the single place where ambient identity
//! becomes concrete log fields; every emission in this crate funnels
//! through it or through a span's bound logger.

use crate::common::Field;
use crate::context::Context;
use crate::global;
use std::fmt;
use std::sync::Arc;

pub(crate) const REQUEST_ID_FIELD: &str = "requestID";
pub(crate) const SPAN_FIELD: &str = "span";
pub(crate) const SPAN_ID_FIELD: &str = "spanID";
pub(crate) const DURATION_FIELD: &str = "duration";

/// Record severity.
///
/// These values form a total order: `Info < Warn < Error`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// The operation completed as expected.
    Info,
    /// The operation completed, but something deserves attention.
    Warn,
    /// The operation failed.
    Error,
}

impl Level {
    /// Returns the uppercase name of the level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The collaborator that renders and writes structured records.
///
/// Sinks are best-effort: `log` has no failure return, and implementations
/// must swallow write errors rather than surface them to the instrumented
/// operation.
pub trait LogSink: Send + Sync {
    /// Write one record at the given level with the given fields.
    fn log(&self, level: Level, message: &str, fields: &[Field]);
}

/// A handle to a [`LogSink`] carrying pre-bound fields.
///
/// Cloning a logger is cheap; the sink is shared behind an [`Arc`].
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn LogSink>,
    fields: Vec<Field>,
}

impl Logger {
    /// Creates a logger emitting to the given sink, with no pre-bound
    /// fields.
    pub fn new(sink: impl LogSink + 'static) -> Self {
        Logger {
            sink: Arc::new(sink),
            fields: Vec::new(),
        }
    }

    /// Returns a derived logger with the given fields appended to the
    /// pre-bound set. The original logger is unaffected.
    pub fn with_fields<I>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = Field>,
    {
        let mut bound = self.fields.clone();
        bound.extend(fields);
        Logger {
            sink: self.sink.clone(),
            fields: bound,
        }
    }

    /// Resolves a logger from the given carrier.
    ///
    /// Attaches `requestID` if bound and the active span id (under the
    /// `span` field) if bound. If the carrier holds a logger override it is
    /// used as the base instead of the process-wide default. Side-effect
    /// free and idempotent.
    pub fn from_context(cx: &Context) -> Self {
        let mut fields = Vec::new();
        if let Some(request_id) = cx.request_id() {
            fields.push(Field::new(REQUEST_ID_FIELD, request_id.to_owned()));
        }
        if let Some(span_id) = cx.span_id() {
            fields.push(Field::new(SPAN_FIELD, span_id.to_owned()));
        }

        match cx.logger_override() {
            Some(base) => base.with_fields(fields),
            None => global::default_logger().with_fields(fields),
        }
    }

    /// Emit one record at the given level.
    ///
    /// Pre-bound fields come first, in binding order, followed by the
    /// call-site fields.
    pub fn log(&self, level: Level, message: &str, fields: Vec<Field>) {
        let mut merged = self.fields.clone();
        merged.extend(fields);
        self.sink.log(level, message, &merged);
    }

    /// Emit one info-level record.
    pub fn info(&self, message: &str, fields: Vec<Field>) {
        self.log(Level::Info, message, fields);
    }

    /// Emit one warn-level record.
    pub fn warn(&self, message: &str, fields: Vec<Field>) {
        self.log(Level::Warn, message, fields);
    }

    /// Emit one error-level record.
    pub fn error(&self, message: &str, fields: Vec<Field>) {
        self.log(Level::Error, message, fields);
    }

    /// Returns the pre-bound fields, in binding order.
    pub fn bound_fields(&self) -> &[Field] {
        &self.fields
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("bound_fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// Emit one info-level record through the logger resolved from `cx`.
pub fn info(cx: &Context, message: &str, fields: Vec<Field>) {
    Logger::from_context(cx).info(message, fields);
}

/// Emit one warn-level record through the logger resolved from `cx`.
pub fn warn(cx: &Context, message: &str, fields: Vec<Field>) {
    Logger::from_context(cx).warn(message, fields);
}

/// Emit one error-level record through the logger resolved from `cx`.
pub fn error(cx: &Context, message: &str, fields: Vec<Field>) {
    Logger::from_context(cx).error(message, fields);
}
