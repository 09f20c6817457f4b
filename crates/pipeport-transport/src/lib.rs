//! Byte-stream pipe endpoints.
//!
//! The lowest layer of pipeport. A pipe is either a filesystem path (named
//! FIFO or plain file) or a descriptor inherited from the parent process.
//! Endpoints are opened in exactly one direction and closed exactly once.
//!
//! Creating FIFOs and setting their permissions is left to the caller.
//! Unix only: endpoints are plain file descriptors.

pub mod error;
pub mod handle;
pub mod source;

pub use error::{Result, TransportError};
pub use handle::{Direction, PipeEnd, PipeHandle};
pub use source::PipeSource;
