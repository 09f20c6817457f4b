use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, IntoRawFd, OwnedFd};
use std::os::unix::net::UnixStream;

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::source::PipeSource;

/// The single direction a pipe endpoint is opened for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Read => write!(f, "reading"),
            Direction::Write => write!(f, "writing"),
        }
    }
}

/// An endpoint that can be closed with its status reported.
///
/// Dropping a descriptor silently discards the result of `close(2)`. Ports
/// close through this trait so the status reaches the caller.
pub trait PipeEnd {
    /// Close the endpoint, consuming it.
    fn close(self) -> io::Result<()>;
}

/// An open, one-directional byte-stream endpoint.
///
/// Opening a FIFO path blocks until its peer end is opened too.
pub struct PipeHandle {
    file: File,
    direction: Direction,
    name: String,
}

impl PipeHandle {
    /// Open an endpoint read-only.
    pub fn open_read(source: impl Into<PipeSource>) -> Result<Self> {
        Self::open(source.into(), Direction::Read)
    }

    /// Open an endpoint write-only. Paths are neither created nor truncated.
    pub fn open_write(source: impl Into<PipeSource>) -> Result<Self> {
        Self::open(source.into(), Direction::Write)
    }

    fn open(source: PipeSource, direction: Direction) -> Result<Self> {
        let name = source.display_name();
        let file = match source {
            PipeSource::Path(path) => {
                let mut options = OpenOptions::new();
                match direction {
                    Direction::Read => options.read(true),
                    Direction::Write => options.write(true),
                };
                options
                    .open(&path)
                    .map_err(|source| TransportError::Open { path, source })?
            }
            PipeSource::Fd(fd) => {
                check_access_mode(&fd, direction)?;
                File::from(fd)
            }
        };

        debug!(pipe = %name, %direction, "opened pipe");
        Ok(Self {
            file,
            direction,
            name,
        })
    }

    /// The direction this endpoint was opened for.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Display name of the endpoint (path or `fd:N`).
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Read for PipeHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for PipeHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl AsRawFd for PipeHandle {
    fn as_raw_fd(&self) -> std::os::fd::RawFd {
        self.file.as_raw_fd()
    }
}

impl PipeEnd for PipeHandle {
    fn close(self) -> io::Result<()> {
        debug!(pipe = %self.name, "closing pipe");
        close_fd(self.file)
    }
}

impl PipeEnd for File {
    fn close(self) -> io::Result<()> {
        close_fd(self)
    }
}

impl PipeEnd for UnixStream {
    fn close(self) -> io::Result<()> {
        close_fd(self)
    }
}

impl<T> PipeEnd for io::Cursor<T> {
    fn close(self) -> io::Result<()> {
        Ok(())
    }
}

impl PipeEnd for Vec<u8> {
    fn close(self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Debug for PipeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipeHandle")
            .field("name", &self.name)
            .field("direction", &self.direction)
            .field("fd", &self.file.as_raw_fd())
            .finish()
    }
}

fn close_fd(owner: impl IntoRawFd) -> io::Result<()> {
    let fd = owner.into_raw_fd();
    // SAFETY: `fd` was released by its owner above, so it is open and nothing
    // else will close it.
    let rc = unsafe { libc::close(fd) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

fn check_access_mode(fd: &OwnedFd, direction: Direction) -> Result<()> {
    let raw = fd.as_raw_fd();
    // SAFETY: `raw` stays open for the duration of the call because `fd` is borrowed.
    let flags = unsafe { libc::fcntl(raw, libc::F_GETFL) };
    if flags < 0 {
        return Err(TransportError::Io(io::Error::last_os_error()));
    }

    let mode = flags & libc::O_ACCMODE;
    let allowed = match direction {
        Direction::Read => mode == libc::O_RDONLY || mode == libc::O_RDWR,
        Direction::Write => mode == libc::O_WRONLY || mode == libc::O_RDWR,
    };
    if allowed {
        Ok(())
    } else {
        Err(TransportError::AccessMode {
            fd: raw,
            expected: direction,
        })
    }
}
