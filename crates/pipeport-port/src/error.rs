/// Errors reported by pipe ports.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// Malformed input, a format precondition, or a closed port.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The pipe could not be opened for reading.
    #[error("pipe {pipe} not found: {source}")]
    NotFound {
        pipe: String,
        source: std::io::Error,
    },

    /// The pipe closed before a complete frame arrived.
    ///
    /// Expected at the end of every stream; the port will not produce audio again.
    #[error("end of stream")]
    EndOfStream,

    /// The operation does not fit the port's role.
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),

    /// The OS reported a read, write, open or close failure.
    #[error("pipe I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of [`PortError`] for hosts that branch on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortErrorKind {
    InvalidArgument,
    NotFound,
    EndOfStream,
    InvalidOperation,
    IoFailure,
}

impl PortError {
    pub fn kind(&self) -> PortErrorKind {
        match self {
            PortError::InvalidArgument(_) => PortErrorKind::InvalidArgument,
            PortError::NotFound { .. } => PortErrorKind::NotFound,
            PortError::EndOfStream => PortErrorKind::EndOfStream,
            PortError::InvalidOperation(_) => PortErrorKind::InvalidOperation,
            PortError::Io(_) => PortErrorKind::IoFailure,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        PortError::InvalidArgument(message.into())
    }
}

pub type Result<T> = std::result::Result<T, PortError>;
