//! Error types for the cogniflow engine

use thiserror::Error;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Comprehensive error types for the cogniflow engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// Timeline store I/O or SQL error
    #[error("timeline store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// A query range was malformed (e.g. since > until)
    #[error("invalid query range: {0}")]
    InvalidRange(String),

    /// A producer recognized the raw event type but the payload was malformed
    #[error("malformed event payload: {0}")]
    ParseEvent(String),

    /// Settings/config file existed but could not be parsed
    #[error("config error: {0}")]
    Config(String),

    /// I/O error reading/writing settings or config files
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
