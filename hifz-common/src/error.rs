//! Common error types for hifz

use thiserror::Error;

/// Common result type for hifz operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across hifz crates
#[derive(Error, Debug)]
pub enum Error {
    /// Verse range or session parameters rejected before pattern generation
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
