//! Error types for the time conductor

use thiserror::Error;

/// Errors raised by the conductor, its modes and the view service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Unknown mode '{0}'")]
    UnknownMode(String),
    
    #[error("No mode has been selected")]
    NoModeSelected,
    
    #[error("Mode '{mode}' has no compatible time system")]
    NoCompatibleTimeSystem { mode: String },
    
    #[error("Start bound {start} exceeds end bound {end}")]
    InvalidBounds { start: i64, end: i64 },
    
    #[error("Deltas must be non-negative (start: {start}, end: {end})")]
    InvalidDeltas { start: i64, end: i64 },
    
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Config(error.to_string())
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
