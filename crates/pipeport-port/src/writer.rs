use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use pipeport_codec::alaw;
use pipeport_transport::{PipeEnd, PipeHandle, PipeSource};
use tracing::{debug, info, trace};

use crate::error::{PortError, Result};
use crate::format::{AudioFormat, PCM_BITS_PER_SAMPLE};
use crate::frame::{Frame, FrameType};
use crate::port::{MediaPort, PortInfo, PortRole};

const WRITER_NAME: &str = "pipe writer";

/// Writes PCM frames to a byte pipe (blocking).
///
/// Each audio frame is converted to the wire format and written in full
/// before `put_frame` returns. There is no buffering beyond one frame, so a
/// slow or absent reader blocks the caller. Non-audio frames are dropped; no
/// silence is synthesized into the pipe.
pub struct PipeWriterPort<W = PipeHandle> {
    info: PortInfo,
    pipe: Option<W>,
    /// One wire frame; allocated on the first audio frame.
    buffer: Option<BytesMut>,
    buffer_size_hint: usize,
}

impl PipeWriterPort<PipeHandle> {
    /// Open `sink` write-only.
    ///
    /// `buffer_size_hint` reserves conversion buffer capacity up front; it
    /// never adds buffering between frames.
    pub fn create(
        sink: impl Into<PipeSource>,
        format: AudioFormat,
        samples_per_frame: usize,
        buffer_size_hint: Option<usize>,
    ) -> Result<Self> {
        check_format(&format, samples_per_frame)?;

        let sink = sink.into();
        let name = sink.display_name();
        let pipe = PipeHandle::open_write(sink).map_err(|err| PortError::Io(err.into_io()))?;

        info!(
            pipe = %name,
            sample_rate = format.sample_rate,
            alaw = format.companded,
            "pipe writer opened"
        );
        Ok(Self::build(
            name,
            pipe,
            format,
            samples_per_frame,
            buffer_size_hint,
        ))
    }
}

impl<W: Write + PipeEnd> PipeWriterPort<W> {
    /// Wrap an already-open writer.
    pub fn from_writer(
        writer: W,
        format: AudioFormat,
        samples_per_frame: usize,
        buffer_size_hint: Option<usize>,
    ) -> Result<Self> {
        check_format(&format, samples_per_frame)?;
        Ok(Self::build(
            WRITER_NAME.to_string(),
            writer,
            format,
            samples_per_frame,
            buffer_size_hint,
        ))
    }

    fn build(
        name: String,
        pipe: W,
        format: AudioFormat,
        samples_per_frame: usize,
        buffer_size_hint: Option<usize>,
    ) -> Self {
        Self {
            info: PortInfo::new(name, PortRole::Writer, format, samples_per_frame),
            pipe: Some(pipe),
            buffer: None,
            buffer_size_hint: buffer_size_hint.unwrap_or(0),
        }
    }

    /// Borrow the underlying pipe, if it is still open.
    pub fn get_ref(&self) -> Option<&W> {
        self.pipe.as_ref()
    }

    fn write_audio(&mut self, frame: &Frame) -> Result<()> {
        let size = frame.size();
        let pcm_frame_bytes = self.info.pcm_frame_bytes();
        if size % 2 != 0 {
            return Err(PortError::invalid(format!(
                "frame size {size} is not a whole number of 16-bit samples"
            )));
        }
        if size > pcm_frame_bytes {
            return Err(PortError::invalid(format!(
                "frame size {size} exceeds the port's {pcm_frame_bytes}-byte frame"
            )));
        }

        let Some(pipe) = self.pipe.as_mut() else {
            return Err(PortError::invalid("writer pipe is closed"));
        };

        let wire_frame_bytes = self.info.wire_frame_bytes();
        let reserve = self.buffer_size_hint.max(wire_frame_bytes);
        let buffer = self.buffer.get_or_insert_with(|| {
            debug!(bytes = wire_frame_bytes, reserve, "allocating writer conversion buffer");
            let mut buffer = BytesMut::with_capacity(reserve);
            buffer.resize(wire_frame_bytes, 0);
            buffer
        });

        let wire_len = if self.info.format.companded {
            alaw::encode_slice(frame.payload(), buffer)
        } else {
            buffer[..size].copy_from_slice(frame.payload());
            size
        };

        write_full(pipe, &buffer[..wire_len])?;
        trace!(bytes = wire_len, "wrote frame to pipe");
        Ok(())
    }
}

impl<W: Write + PipeEnd> MediaPort for PipeWriterPort<W> {
    fn info(&self) -> &PortInfo {
        &self.info
    }

    fn get_frame(&mut self, frame: &mut Frame) -> Result<()> {
        frame.clear();
        Err(PortError::InvalidOperation("pipe writer cannot produce frames"))
    }

    fn put_frame(&mut self, frame: &Frame) -> Result<()> {
        if frame.frame_type != FrameType::Audio {
            return Ok(());
        }
        self.write_audio(frame)
    }

    /// Close the pipe and return the close status. Nothing is flushed.
    fn destroy(&mut self) -> Result<()> {
        match self.pipe.take() {
            Some(pipe) => {
                debug!(port = %self.info.name, "closing writer pipe");
                pipe.close().map_err(PortError::Io)
            }
            None => Ok(()),
        }
    }
}

fn check_format(format: &AudioFormat, samples_per_frame: usize) -> Result<()> {
    if format.bits_per_sample != PCM_BITS_PER_SAMPLE {
        return Err(PortError::invalid(format!(
            "pipe writer needs {PCM_BITS_PER_SAMPLE}-bit samples, got {}",
            format.bits_per_sample
        )));
    }
    format.validate()?;
    if samples_per_frame == 0 {
        return Err(PortError::invalid("samples per frame must be non-zero"));
    }
    Ok(())
}

fn write_full<W: Write>(pipe: &mut W, buf: &[u8]) -> Result<()> {
    let mut offset = 0usize;
    while offset < buf.len() {
        match pipe.write(&buf[offset..]) {
            Ok(0) => return Err(PortError::Io(ErrorKind::WriteZero.into())),
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(PortError::Io(err)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor, Read};
    use std::os::fd::{FromRawFd, OwnedFd};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::error::PortErrorKind;
    use crate::player::PipePlayerPort;

    fn narrowband(companded: bool) -> AudioFormat {
        AudioFormat::pcm16(8000, 1).with_companding(companded)
    }

    fn ramp(len: i16) -> Vec<i16> {
        (0..len).map(|i| i * 200 - 16_000).collect()
    }

    #[test]
    fn non_audio_frame_never_writes() {
        let mut port =
            PipeWriterPort::from_writer(RecordingSink::default(), narrowband(true), 160, None)
                .unwrap();

        port.put_frame(&Frame::with_capacity(320)).unwrap();
        let mut silence = Frame::audio(&[0; 160]);
        silence.frame_type = FrameType::None;
        port.put_frame(&silence).unwrap();

        assert!(port.get_ref().unwrap().writes.is_empty());
    }

    #[test]
    fn pcm_frame_is_one_full_write() {
        let samples = ramp(160);
        let mut port =
            PipeWriterPort::from_writer(RecordingSink::default(), narrowband(false), 160, None)
                .unwrap();

        port.put_frame(&Frame::audio(&samples)).unwrap();

        let writes = &port.get_ref().unwrap().writes;
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].len(), 320);
        let expected: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        assert_eq!(writes[0], expected);
    }

    #[test]
    fn companded_frame_is_one_byte_per_sample() {
        let samples = ramp(160);
        let mut port =
            PipeWriterPort::from_writer(RecordingSink::default(), narrowband(true), 160, None)
                .unwrap();

        port.put_frame(&Frame::audio(&samples)).unwrap();
        port.put_frame(&Frame::audio(&samples)).unwrap();

        let writes = &port.get_ref().unwrap().writes;
        assert_eq!(writes.len(), 2);
        let expected: Vec<u8> = samples.iter().map(|s| alaw::encode(*s)).collect();
        assert_eq!(writes[0], expected);
        assert_eq!(writes[1], expected);
    }

    #[test]
    fn short_frame_writes_only_its_samples() {
        let mut port =
            PipeWriterPort::from_writer(RecordingSink::default(), narrowband(true), 160, None)
                .unwrap();

        port.put_frame(&Frame::audio(&[100; 40])).unwrap();
        assert_eq!(port.get_ref().unwrap().writes[0].len(), 40);
    }

    #[test]
    fn rejects_non_16_bit_before_opening() {
        let mut format = narrowband(false);
        format.bits_per_sample = 8;
        let missing = std::env::temp_dir().join(format!(
            "pipeport-writer-never-opened-{}",
            std::process::id()
        ));

        let err = PipeWriterPort::create(missing, format, 160, None)
            .err()
            .unwrap();
        assert_eq!(err.kind(), PortErrorKind::InvalidArgument);
    }

    #[test]
    fn rejects_zero_samples_per_frame() {
        let err = PipeWriterPort::from_writer(Vec::<u8>::new(), narrowband(false), 0, None)
            .err()
            .unwrap();
        assert!(matches!(err, PortError::InvalidArgument(_)));
    }

    #[test]
    fn open_failure_is_propagated_verbatim() {
        let missing = std::env::temp_dir().join(format!(
            "pipeport-writer-missing-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&missing);

        let err = PipeWriterPort::create(missing, narrowband(false), 160, None)
            .err()
            .unwrap();
        assert!(matches!(err, PortError::Io(ref e) if e.kind() == ErrorKind::NotFound));
    }

    #[test]
    fn get_frame_is_always_rejected() {
        let mut port =
            PipeWriterPort::from_writer(RecordingSink::default(), narrowband(false), 160, None)
                .unwrap();
        let mut frame = Frame::with_capacity(320);

        let err = port.get_frame(&mut frame).unwrap_err();
        assert_eq!(err.kind(), PortErrorKind::InvalidOperation);

        port.put_frame(&Frame::audio(&[0; 160])).unwrap();
        assert!(matches!(
            port.get_frame(&mut frame),
            Err(PortError::InvalidOperation(_))
        ));

        port.destroy().unwrap();
        assert!(matches!(
            port.get_frame(&mut frame),
            Err(PortError::InvalidOperation(_))
        ));
    }

    #[test]
    fn malformed_frames_are_rejected() {
        let mut port =
            PipeWriterPort::from_writer(RecordingSink::default(), narrowband(false), 160, None)
                .unwrap();

        let odd = Frame::audio_bytes(&[0u8; 3]);
        assert!(matches!(
            port.put_frame(&odd),
            Err(PortError::InvalidArgument(_))
        ));

        let oversized = Frame::audio(&[0; 161]);
        assert!(matches!(
            port.put_frame(&oversized),
            Err(PortError::InvalidArgument(_))
        ));
        assert!(port.get_ref().unwrap().writes.is_empty());
    }

    #[test]
    fn interrupted_write_retries() {
        let sink = InterruptedOnce {
            interrupted: false,
            data: Vec::new(),
        };
        let mut port = PipeWriterPort::from_writer(sink, narrowband(true), 160, None).unwrap();

        port.put_frame(&Frame::audio(&[0; 160])).unwrap();
        assert_eq!(port.get_ref().unwrap().data.len(), 160);
    }

    #[test]
    fn partial_writes_are_completed() {
        let sink = TrickleSink { data: Vec::new() };
        let mut port = PipeWriterPort::from_writer(sink, narrowband(false), 160, None).unwrap();

        port.put_frame(&Frame::audio(&ramp(160))).unwrap();
        assert_eq!(port.get_ref().unwrap().data.len(), 320);
    }

    #[test]
    fn zero_length_write_is_an_error() {
        let mut port = PipeWriterPort::from_writer(ZeroWriter, narrowband(false), 160, None).unwrap();

        let err = port.put_frame(&Frame::audio(&[0; 160])).unwrap_err();
        assert!(matches!(err, PortError::Io(ref e) if e.kind() == ErrorKind::WriteZero));
    }

    #[test]
    fn broken_pipe_is_propagated() {
        let (read_end, write_end) = os_pipe();
        drop(read_end);
        let mut port = PipeWriterPort::create(write_end, narrowband(false), 160, None).unwrap();

        let err = port.put_frame(&Frame::audio(&[0; 160])).unwrap_err();
        assert!(matches!(err, PortError::Io(ref e) if e.kind() == ErrorKind::BrokenPipe));
        assert_eq!(err.kind(), PortErrorKind::IoFailure);
    }

    #[test]
    fn destroy_closes_once_and_reports_status() {
        let closes = Arc::new(AtomicUsize::new(0));
        let sink = CloseCounting {
            closes: Arc::clone(&closes),
            fail: false,
        };
        let mut port = PipeWriterPort::from_writer(sink, narrowband(false), 160, None).unwrap();

        port.destroy().unwrap();
        port.destroy().unwrap();
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        let err = port.put_frame(&Frame::audio(&[0; 160])).unwrap_err();
        assert!(matches!(err, PortError::InvalidArgument(_)));
        assert!(port.get_ref().is_none());
    }

    #[test]
    fn destroy_returns_close_failure() {
        let sink = CloseCounting {
            closes: Arc::new(AtomicUsize::new(0)),
            fail: true,
        };
        let mut port = PipeWriterPort::from_writer(sink, narrowband(false), 160, None).unwrap();

        let err = port.destroy().unwrap_err();
        assert_eq!(err.kind(), PortErrorKind::IoFailure);
    }

    #[test]
    fn buffer_hint_does_not_change_wire_size() {
        let mut port = PipeWriterPort::from_writer(
            RecordingSink::default(),
            narrowband(true),
            160,
            Some(64 * 1024),
        )
        .unwrap();

        port.put_frame(&Frame::audio(&[0; 160])).unwrap();
        assert_eq!(port.get_ref().unwrap().writes[0].len(), 160);
    }

    #[test]
    fn writer_to_player_over_os_pipe() {
        let (read_end, write_end) = os_pipe();
        let format = narrowband(true);
        let mut writer = PipeWriterPort::create(write_end, format, 160, None).unwrap();
        assert_eq!(writer.info().role, PortRole::Writer);
        assert!(writer.info().name.starts_with("fd:"));
        let mut player = PipePlayerPort::create(read_end, format).unwrap();

        let samples = ramp(160);
        writer.put_frame(&Frame::audio(&samples)).unwrap();
        writer.destroy().unwrap();

        let mut frame = Frame::with_capacity(320);
        player.get_frame(&mut frame).unwrap();
        for (decoded, original) in frame.samples().zip(&samples) {
            let error = (i32::from(decoded) - i32::from(*original)).abs();
            assert!(error <= i32::from(*original).abs() / 16 + 16);
        }
        assert!(matches!(
            player.get_frame(&mut frame),
            Err(PortError::EndOfStream)
        ));
    }

    #[test]
    fn writes_to_existing_file_path() {
        let path = std::env::temp_dir().join(format!(
            "pipeport-writer-file-{}",
            std::process::id()
        ));
        std::fs::write(&path, b"").unwrap();

        let mut port = PipeWriterPort::create(path.clone(), narrowband(false), 160, None).unwrap();
        assert_eq!(port.info().name, path.display().to_string());
        port.put_frame(&Frame::audio(&ramp(160))).unwrap();
        port.destroy().unwrap();

        let mut written = Vec::new();
        std::fs::File::open(&path)
            .unwrap()
            .read_to_end(&mut written)
            .unwrap();
        assert_eq!(written.len(), 320);
        let _ = std::fs::remove_file(&path);
    }

    fn os_pipe() -> (OwnedFd, OwnedFd) {
        let mut fds = [0; 2];
        // SAFETY: `fds` is a valid two-element buffer for pipe(2).
        let rc = unsafe { libc::pipe(fds.as_mut_ptr()) };
        assert_eq!(rc, 0, "pipe(2) failed: {}", io::Error::last_os_error());
        // SAFETY: pipe(2) succeeded, so both descriptors are open and owned by us.
        unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) }
    }

    #[derive(Default)]
    struct RecordingSink {
        writes: Vec<Vec<u8>>,
    }

    impl Write for RecordingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.writes.push(buf.to_vec());
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl PipeEnd for RecordingSink {
        fn close(self) -> io::Result<()> {
            Ok(())
        }
    }

    struct InterruptedOnce {
        interrupted: bool,
        data: Vec<u8>,
    }

    impl Write for InterruptedOnce {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::from(ErrorKind::Interrupted));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl PipeEnd for InterruptedOnce {
        fn close(self) -> io::Result<()> {
            Ok(())
        }
    }

    struct TrickleSink {
        data: Vec<u8>,
    }

    impl Write for TrickleSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = buf.len().min(7);
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl PipeEnd for TrickleSink {
        fn close(self) -> io::Result<()> {
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl PipeEnd for ZeroWriter {
        fn close(self) -> io::Result<()> {
            Ok(())
        }
    }

    struct CloseCounting {
        closes: Arc<AtomicUsize>,
        fail: bool,
    }

    impl Write for CloseCounting {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl PipeEnd for CloseCounting {
        fn close(self) -> io::Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(io::Error::from_raw_os_error(libc::EIO));
            }
            Ok(())
        }
    }

    #[test]
    fn cursor_sink_collects_stream() {
        let mut port =
            PipeWriterPort::from_writer(Cursor::new(Vec::<u8>::new()), narrowband(true), 160, None)
                .unwrap();
        port.put_frame(&Frame::audio(&[0; 160])).unwrap();
        port.put_frame(&Frame::audio(&[0; 160])).unwrap();
        assert_eq!(port.get_ref().unwrap().get_ref().len(), 320);
    }
}
