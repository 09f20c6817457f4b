use std::path::PathBuf;

use crate::handle::Direction;

/// Errors that can occur while opening or closing pipe endpoints.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the pipe at the specified path.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An inherited descriptor was not opened for the required direction.
    #[error("descriptor {fd} is not open for {expected}")]
    AccessMode { fd: i32, expected: Direction },

    /// An I/O error occurred on the pipe.
    #[error("pipe I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Unwrap the underlying OS error, if there is one.
    pub fn into_io(self) -> std::io::Error {
        match self {
            TransportError::Open { source, .. } => source,
            TransportError::Io(err) => err,
            other => std::io::Error::new(std::io::ErrorKind::InvalidInput, other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
