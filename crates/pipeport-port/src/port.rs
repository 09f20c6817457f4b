use crate::error::{PortError, Result};
use crate::format::AudioFormat;
use crate::frame::Frame;

/// Which side of the pipeline a port sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortRole {
    /// Produces frames from a pipe.
    Player,
    /// Consumes frames into a pipe.
    Writer,
}

/// Static description of a port, fixed at creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    pub role: PortRole,
    pub format: AudioFormat,
    pub samples_per_frame: usize,
    pub frame_time_usec: u64,
}

impl PortInfo {
    pub(crate) fn new(
        name: impl Into<String>,
        role: PortRole,
        format: AudioFormat,
        samples_per_frame: usize,
    ) -> Self {
        Self {
            name: name.into(),
            role,
            format,
            samples_per_frame,
            frame_time_usec: format.frame_time_usec(samples_per_frame),
        }
    }

    /// Bytes of linear PCM in one of this port's frames.
    pub fn pcm_frame_bytes(&self) -> usize {
        self.format.pcm_frame_bytes(self.samples_per_frame)
    }

    /// Bytes on the pipe for one of this port's frames.
    pub fn wire_frame_bytes(&self) -> usize {
        self.format.wire_frame_bytes(self.samples_per_frame)
    }
}

/// The contract a host pipeline drives once per frame period.
///
/// A port implements the direction it supports; the other direction is
/// rejected with [`PortError::InvalidOperation`].
pub trait MediaPort {
    fn info(&self) -> &PortInfo;

    /// Fill `frame` with the next frame period of audio.
    fn get_frame(&mut self, frame: &mut Frame) -> Result<()> {
        frame.clear();
        Err(PortError::InvalidOperation("port does not produce frames"))
    }

    /// Consume one frame period of audio.
    fn put_frame(&mut self, _frame: &Frame) -> Result<()> {
        Err(PortError::InvalidOperation("port does not accept frames"))
    }

    /// Release the pipe. Later frame calls fail with `InvalidArgument`.
    fn destroy(&mut self) -> Result<()>;
}
