//! Process-wide default logger.
//!
//! The default logger backs every emission that is not routed through a
//! context-bound override: the "log now" facade falls back to it, and span
//! completion records always use it as their base. It is initialized
//! exactly once — either explicitly via [`set_default_logger`] before any
//! logging happens, or lazily with a console configuration on first use —
//! and lives for the process lifetime.

use crate::logger::Logger;
use crate::sink::ConsoleSink;
use std::sync::OnceLock;
use thiserror::Error;

static DEFAULT_LOGGER: OnceLock<Logger> = OnceLock::new();

/// The error returned when the default logger was already initialized.
#[derive(Debug, Error)]
#[error("the default logger has already been initialized")]
#[non_exhaustive]
pub struct SetDefaultError;

/// Installs the process-wide default logger.
///
/// May be called at most once, before any call that touches the default
/// (lazy first use also counts as initialization).
///
/// # Errors
///
/// Returns [`SetDefaultError`] if a default logger is already in place.
pub fn set_default_logger(logger: Logger) -> Result<(), SetDefaultError> {
    DEFAULT_LOGGER.set(logger).map_err(|_| SetDefaultError)
}

/// Returns a handle to the process-wide default logger.
///
/// On first use, when no logger was installed via [`set_default_logger`],
/// the default is a [`ConsoleSink`] on stdout with minimum level info.
pub fn default_logger() -> Logger {
    DEFAULT_LOGGER
        .get_or_init(|| Logger::new(ConsoleSink::stdout()))
        .clone()
}

/// Installs a shared in-memory sink as the process default, once per test
/// binary. Tests that assert on globally-routed records must filter by a
/// name unique to the test, since the buffer is shared.
#[cfg(test)]
pub(crate) fn install_test_sink() -> crate::sink::InMemorySink {
    use crate::sink::InMemorySink;

    static TEST_SINK: OnceLock<InMemorySink> = OnceLock::new();
    let sink = TEST_SINK.get_or_init(InMemorySink::new).clone();
    let _ = DEFAULT_LOGGER.set(Logger::new(sink.clone()));
    sink
}
