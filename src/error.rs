//! Mining Error Types

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced before or while setting up a mining run.
///
/// Constraint violations inside the search are not errors: the recursion
/// represents them as boolean prunes and never unwinds.
#[derive(Error, Debug)]
pub enum MiningError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Output file cannot be opened
    #[error("cannot open output file {}", .0.display())]
    NoFile(PathBuf),

    /// Invalid option or option combination
    #[error("usage: {0}")]
    Usage(String),

    /// Malformed input data
    #[error("parse error at {path}:{line}: {message}")]
    Parse {
        path: String,
        line: usize,
        message: String,
    },

    /// Configuration loading error
    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),
}

impl MiningError {
    pub fn usage(message: impl Into<String>) -> Self {
        MiningError::Usage(message.into())
    }
}

/// Result type for mining operations
pub type MiningResult<T> = Result<T, MiningError>;
