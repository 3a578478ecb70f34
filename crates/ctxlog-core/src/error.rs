use thiserror::Error;

/// Errors from logger setup.
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("the global logger is already initialized")]
    GlobalAlreadySet,
}
