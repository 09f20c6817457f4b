use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::BytesMut;
use pipeport_codec::alaw;
use pipeport_transport::{PipeEnd, PipeHandle, PipeSource};
use tracing::{debug, info, trace};

use crate::error::{PortError, Result};
use crate::format::{AudioFormat, DEFAULT_PTIME};
use crate::frame::Frame;
use crate::port::{MediaPort, PortInfo, PortRole};

const PLAYER_NAME: &str = "pipe source";

/// Notified when a player reaches end-of-stream.
///
/// Runs synchronously on the thread that called `get_frame`, once per stream.
/// Any user data travels inside the handler itself.
pub trait EofHandler: Send {
    fn on_eof(&mut self, port: &PortInfo);
}

impl<F> EofHandler for F
where
    F: FnMut(&PortInfo) + Send,
{
    fn on_eof(&mut self, port: &PortInfo) {
        self(port)
    }
}

struct Shared<R> {
    info: PortInfo,
    closing: AtomicBool,
    state: Mutex<PlayerState<R>>,
}

struct PlayerState<R> {
    pipe: Option<R>,
    /// Wire bytes for one frame; sized on first use, never resized.
    buffer: Option<BytesMut>,
    eof_handler: Option<Box<dyn EofHandler>>,
    eof_reached: bool,
}

impl<R> Shared<R> {
    fn lock_state(&self) -> MutexGuard<'_, PlayerState<R>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Reads frames from a byte pipe (blocking, whole frames only).
///
/// Each `get_frame` pulls exactly one frame period of wire bytes. If the pipe
/// closes before the frame is complete, the partial data is discarded, the
/// frame is marked empty, the EOF handler runs, and the call fails with
/// [`PortError::EndOfStream`]. End-of-stream is latched: later calls report it
/// again without reading or re-notifying.
pub struct PipePlayerPort<R = PipeHandle> {
    shared: Arc<Shared<R>>,
}

/// Closes a player's pipe, possibly from another thread.
///
/// Closing first marks the port as closing so new `get_frame` calls are
/// refused, then waits for a `get_frame` already in progress to return before
/// the pipe is closed.
pub struct PlayerCloser<R = PipeHandle> {
    shared: Arc<Shared<R>>,
}

impl PipePlayerPort<PipeHandle> {
    /// Open `source` for reading with the default 20 ms frame period.
    pub fn create(source: impl Into<PipeSource>, format: AudioFormat) -> Result<Self> {
        Self::create_with_ptime(source, format, DEFAULT_PTIME)
    }

    /// Open `source` for reading with an explicit frame period.
    pub fn create_with_ptime(
        source: impl Into<PipeSource>,
        format: AudioFormat,
        ptime: Duration,
    ) -> Result<Self> {
        let samples_per_frame = check_geometry(&format, ptime)?;
        let source = source.into();
        let pipe_name = source.display_name();
        let pipe = PipeHandle::open_read(source).map_err(|err| PortError::NotFound {
            pipe: pipe_name.clone(),
            source: err.into_io(),
        })?;

        let port = Self::build(pipe, format, samples_per_frame);
        info!(
            pipe = %pipe_name,
            sample_rate = format.sample_rate,
            channels = format.channel_count,
            alaw = format.companded,
            "pipe player opened"
        );
        Ok(port)
    }
}

impl<R: Read + PipeEnd + Send> PipePlayerPort<R> {
    /// Wrap an already-open reader with the default frame period.
    pub fn from_reader(reader: R, format: AudioFormat) -> Result<Self> {
        let samples_per_frame = check_geometry(&format, DEFAULT_PTIME)?;
        Ok(Self::build(reader, format, samples_per_frame))
    }

    fn build(pipe: R, format: AudioFormat, samples_per_frame: usize) -> Self {
        let info = PortInfo::new(PLAYER_NAME, PortRole::Player, format, samples_per_frame);
        Self {
            shared: Arc::new(Shared {
                info,
                closing: AtomicBool::new(false),
                state: Mutex::new(PlayerState {
                    pipe: Some(pipe),
                    buffer: None,
                    eof_handler: None,
                    eof_reached: false,
                }),
            }),
        }
    }

    /// Register the end-of-stream handler, replacing any previous one.
    pub fn set_eof_callback(&self, handler: impl EofHandler + 'static) -> Result<()> {
        self.ensure_open()?;
        self.shared.lock_state().eof_handler = Some(Box::new(handler));
        Ok(())
    }

    /// Remove the end-of-stream handler.
    pub fn clear_eof_callback(&self) {
        self.shared.lock_state().eof_handler = None;
    }

    /// A handle that can close this port from another thread.
    pub fn closer(&self) -> PlayerCloser<R> {
        PlayerCloser {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Whether end-of-stream has been reported.
    pub fn is_eof(&self) -> bool {
        self.shared.lock_state().eof_reached
    }

    fn ensure_open(&self) -> Result<()> {
        if self.shared.closing.load(Ordering::Acquire) {
            return Err(PortError::invalid("player port is closing"));
        }
        Ok(())
    }

    fn read_frame(&self, frame: &mut Frame) -> Result<()> {
        let companded = self.shared.info.format.companded;
        let capacity = frame.capacity();
        if capacity == 0 || capacity % 2 != 0 {
            return Err(PortError::invalid(format!(
                "frame capacity {capacity} is not a whole number of 16-bit samples"
            )));
        }
        let wire_len = if companded { capacity / 2 } else { capacity };

        let mut guard = self.shared.lock_state();
        let state = &mut *guard;
        let Some(pipe) = state.pipe.as_mut() else {
            return Err(PortError::invalid("player pipe is closed"));
        };
        if state.eof_reached {
            return Err(PortError::EndOfStream);
        }

        let buffer = state.buffer.get_or_insert_with(|| {
            debug!(bytes = wire_len, "allocating player conversion buffer");
            BytesMut::zeroed(wire_len)
        });
        if buffer.len() != wire_len {
            return Err(PortError::invalid(format!(
                "frame needs {wire_len} pipe bytes but the port reads {} per frame",
                buffer.len()
            )));
        }

        if !read_full(pipe, buffer)? {
            state.eof_reached = true;
            let handler = state.eof_handler.take();
            drop(guard);
            self.notify_eof(handler);
            return Err(PortError::EndOfStream);
        }

        let out = frame.buf_mut();
        if companded {
            alaw::decode_slice(buffer, out);
        } else {
            out.copy_from_slice(buffer);
        }
        drop(guard);

        frame.mark_audio(capacity);
        Ok(())
    }

    /// Run the handler without holding the state lock so it may close the port.
    fn notify_eof(&self, handler: Option<Box<dyn EofHandler>>) {
        info!(port = %self.shared.info.name, "pipe reached end of stream");
        let Some(mut handler) = handler else {
            return;
        };
        handler.on_eof(&self.shared.info);

        let mut state = self.shared.lock_state();
        if state.eof_handler.is_none() && !self.shared.closing.load(Ordering::Acquire) {
            state.eof_handler = Some(handler);
        }
    }
}

impl<R: Read + PipeEnd + Send> MediaPort for PipePlayerPort<R> {
    fn info(&self) -> &PortInfo {
        &self.shared.info
    }

    fn get_frame(&mut self, frame: &mut Frame) -> Result<()> {
        let result = self.ensure_open().and_then(|()| self.read_frame(frame));
        if result.is_err() {
            frame.clear();
        }
        result
    }

    fn destroy(&mut self) -> Result<()> {
        self.closer().close()
    }
}

impl<R: PipeEnd> PlayerCloser<R> {
    /// Close the pipe once; later calls return `Ok(())`.
    pub fn close(&self) -> Result<()> {
        self.shared.closing.store(true, Ordering::Release);
        // Taking the state lock waits out any in-flight get_frame.
        let pipe = self.shared.lock_state().pipe.take();
        match pipe {
            Some(pipe) => {
                debug!(port = %self.shared.info.name, "closing player pipe");
                pipe.close().map_err(PortError::Io)
            }
            None => Ok(()),
        }
    }

    pub fn is_closing(&self) -> bool {
        self.shared.closing.load(Ordering::Acquire)
    }
}

impl<R> Clone for PlayerCloser<R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

fn check_geometry(format: &AudioFormat, ptime: Duration) -> Result<usize> {
    format.validate()?;
    let samples_per_frame = format.samples_per_frame(ptime);
    if samples_per_frame == 0 {
        return Err(PortError::invalid(format!(
            "{} ms at {} Hz holds no whole sample",
            ptime.as_millis(),
            format.sample_rate
        )));
    }
    Ok(samples_per_frame)
}

/// Fill `buf` completely. `Ok(false)` means the pipe closed first.
fn read_full<R: Read>(pipe: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut filled = 0usize;
    while filled < buf.len() {
        match pipe.read(&mut buf[filled..]) {
            Ok(0) => {
                trace!(filled, wanted = buf.len(), "pipe closed before frame completed");
                return Ok(false);
            }
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(PortError::Io(err)),
        }
    }
    Ok(true)
}
