//! Bridge a frame-clocked audio pipeline to byte pipes.
//!
//! pipeport moves fixed-duration audio frames between a host media pipeline
//! and named FIFOs or inherited descriptors, optionally companding 16-bit
//! PCM to 8-bit A-law on the pipe side.
//!
//! # Crate Structure
//!
//! - [`codec`]: Stateless A-law sample conversion
//! - [`transport`]: One-directional pipe endpoints
//! - [`port`]: Player and writer ports driven once per frame period

/// Re-export codec functions.
pub mod codec {
    pub use pipeport_codec::*;
}

/// Re-export transport types.
pub mod transport {
    pub use pipeport_transport::*;
}

/// Re-export port types.
pub mod port {
    pub use pipeport_port::*;
}
