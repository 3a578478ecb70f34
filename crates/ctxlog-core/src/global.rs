//! The process-wide default logger.

use std::sync::OnceLock;

use crate::error::LoggerError;
use crate::logger::Logger;

static GLOBAL: OnceLock<Logger> = OnceLock::new();

/// Default logger returned for contexts that carry none.
///
/// Built on first use unless [`init_global`] ran earlier. Every call returns
/// the same instance.
pub fn global() -> Logger {
    GLOBAL.get_or_init(Logger::new).clone()
}

/// Install `logger` as the process default.
///
/// Must run before anything calls [`global`]; once a default exists it is
/// never replaced.
pub fn init_global(logger: Logger) -> Result<(), LoggerError> {
    GLOBAL
        .set(logger)
        .map_err(|_| LoggerError::GlobalAlreadySet)
}
