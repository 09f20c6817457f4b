/// What a [`Frame`] carries after a port has handled it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameType {
    /// No media: silence, a gap, or end-of-stream.
    None,
    /// Little-endian 16-bit linear PCM.
    Audio,
}

/// The pipeline's transport unit for one frame period.
///
/// The host allocates the buffer; ports fill it (player) or read it (writer)
/// and keep no reference after the call returns.
#[derive(Clone, Debug)]
pub struct Frame {
    pub frame_type: FrameType,
    buf: Vec<u8>,
    size: usize,
}

impl Frame {
    /// An empty frame with room for `capacity` bytes of PCM.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            frame_type: FrameType::None,
            buf: vec![0; capacity],
            size: 0,
        }
    }

    /// An audio frame holding `samples`.
    pub fn audio(samples: &[i16]) -> Self {
        let buf: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        Self {
            frame_type: FrameType::Audio,
            size: buf.len(),
            buf,
        }
    }

    /// An audio frame from raw little-endian PCM bytes.
    pub fn audio_bytes(pcm: &[u8]) -> Self {
        Self {
            frame_type: FrameType::Audio,
            buf: pcm.to_vec(),
            size: pcm.len(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Valid bytes in the frame.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn sample_count(&self) -> usize {
        self.size / 2
    }

    pub fn payload(&self) -> &[u8] {
        &self.buf[..self.size]
    }

    pub fn samples(&self) -> impl Iterator<Item = i16> + '_ {
        self.payload()
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
    }

    /// Reset to an empty, non-audio frame without releasing the buffer.
    pub fn clear(&mut self) {
        self.frame_type = FrameType::None;
        self.size = 0;
    }

    pub(crate) fn buf_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    pub(crate) fn mark_audio(&mut self, size: usize) {
        self.frame_type = FrameType::Audio;
        self.size = size.min(self.buf.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_frame_from_samples() {
        let frame = Frame::audio(&[1, -2, 300]);
        assert_eq!(frame.frame_type, FrameType::Audio);
        assert_eq!(frame.size(), 6);
        assert_eq!(frame.sample_count(), 3);
        assert_eq!(frame.samples().collect::<Vec<_>>(), vec![1, -2, 300]);
        assert_eq!(&frame.payload()[..2], &[1, 0]);
    }

    #[test]
    fn empty_frame_has_capacity_only() {
        let frame = Frame::with_capacity(320);
        assert_eq!(frame.frame_type, FrameType::None);
        assert_eq!(frame.capacity(), 320);
        assert_eq!(frame.size(), 0);
        assert!(frame.payload().is_empty());
    }

    #[test]
    fn clear_keeps_buffer() {
        let mut frame = Frame::audio_bytes(&[0; 8]);
        frame.clear();
        assert_eq!(frame.frame_type, FrameType::None);
        assert_eq!(frame.size(), 0);
        assert_eq!(frame.capacity(), 8);
    }

    #[test]
    fn mark_audio_is_clamped_to_capacity() {
        let mut frame = Frame::with_capacity(4);
        frame.mark_audio(10);
        assert_eq!(frame.size(), 4);
    }
}
