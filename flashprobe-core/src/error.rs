use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Ledger missing, truncated, or inconsistent with its own header.
    #[error("Format error: {0}")]
    Format(String),

    /// Read or write against the target device failed.
    #[error("Medium fault at {}: {source}", path.display())]
    MediumFault {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Staging error: {0}")]
    Staging(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl ProbeError {
    pub fn medium(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProbeError::MediumFault {
            path: path.into(),
            source,
        }
    }
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, ProbeError>;
