use std::fmt;
use std::io;

use pipeport_port::PortError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PIPE_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound | io::ErrorKind::BrokenPipe => PIPE_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn port_error(context: &str, err: PortError) -> CliError {
    match err {
        PortError::Io(source) => io_error(context, source),
        PortError::NotFound { .. } => CliError::new(PIPE_ERROR, format!("{context}: {err}")),
        PortError::InvalidArgument(_) => CliError::new(USAGE, format!("{context}: {err}")),
        PortError::EndOfStream => CliError::new(FAILURE, format!("{context}: {err}")),
        PortError::InvalidOperation(_) => CliError::new(INTERNAL, format!("{context}: {err}")),
    }
}
