//! Frame-oriented audio ports over byte pipes.
//!
//! Two roles share one contract ([`MediaPort`]):
//! - [`PipePlayerPort`] pulls one frame period of bytes from a pipe on each
//!   tick, expands A-law if configured, and reports audio or end-of-stream.
//! - [`PipeWriterPort`] takes PCM frames, compresses to A-law if configured,
//!   and writes each frame to a pipe with a blocking write.
//!
//! Both are driven synchronously by the host, one call per frame period.
//! A frame is never delivered partially: a short final read is end-of-stream.

pub mod error;
pub mod format;
pub mod frame;
pub mod player;
pub mod port;
pub mod writer;

pub use error::{PortError, PortErrorKind, Result};
pub use format::{AudioFormat, DEFAULT_PTIME, PCM_BITS_PER_SAMPLE};
pub use frame::{Frame, FrameType};
pub use player::{EofHandler, PipePlayerPort, PlayerCloser};
pub use port::{MediaPort, PortInfo, PortRole};
pub use writer::PipeWriterPort;
