//! Request-scoped, span-based structured logging.
//!
//! `spanlog` attaches a request identifier to a unit of work, derives child
//! spans for nested operations, accumulates contextual tags while a span is
//! open, and emits a single structured record when the span completes —
//! classified as success, slow, or error.
//!
//! Two layers make this work:
//!
//! - [`Context`]: an immutable, chainable carrier of request and span
//!   identity, threaded explicitly through a call graph. Deriving a context
//!   never mutates the original, so carriers are safe to share across
//!   concurrently-spawned sub-operations.
//! - [`Span`]: one traced operation, created with [`start_span`], tagged
//!   with [`Span::set_tag`], and completed exactly once with
//!   [`Span::finish`] or [`Span::finish_result`].
//!
//! A thin facade ([`info`], [`warn`], [`error`]) covers call sites that
//! want one record without wrapping a distinct operation.
//!
//! # Getting started
//!
//! ```
//! use spanlog::{start_span, Context};
//!
//! // Upstream middleware binds the request id once.
//! let cx = Context::new().with_request_id("req-42");
//!
//! let (span, cx) = start_span(&cx, "handle-request");
//! span.set_tag("route", "/users");
//!
//! spanlog::info(&cx, "authorized", vec![]);
//!
//! // One record: success, slow (> 1s), or error.
//! span.finish();
//! ```
//!
//! # Sinks
//!
//! Records are rendered by a [`LogSink`]. The process-wide default (a
//! [`ConsoleSink`] with ISO-8601 timestamps, colorized levels, and minimum
//! level info) can be replaced once at startup:
//!
//! ```no_run
//! use spanlog::{global, ConsoleSink, Level, Logger};
//!
//! let logger = Logger::new(ConsoleSink::stdout().with_min_level(Level::Warn));
//! global::set_default_logger(logger).expect("default logger already set");
//! ```
//!
//! Logging is best-effort throughout: no operation in this crate returns an
//! error to the instrumented code path, and sink write failures are
//! swallowed.

#![warn(missing_docs)]

mod common;
mod context;
mod logger;
mod sink;
mod span;

pub mod global;

pub use common::{Field, Key, StringValue, Value};
pub use context::Context;
pub use global::SetDefaultError;
pub use logger::{error, info, warn, Level, LogSink, Logger};
pub use sink::{ConsoleSink, InMemorySink, Record};
pub use span::{start_span, Span};
