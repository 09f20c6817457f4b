use std::fmt;
use std::os::fd::{AsRawFd, OwnedFd};
use std::path::{Path, PathBuf};

/// Where a pipe endpoint comes from.
pub enum PipeSource {
    /// A named FIFO or regular file.
    Path(PathBuf),
    /// A descriptor that is already open, e.g. inherited from a parent.
    Fd(OwnedFd),
}

impl PipeSource {
    /// Human-readable name used in logs and port info.
    pub fn display_name(&self) -> String {
        match self {
            PipeSource::Path(path) => path.display().to_string(),
            PipeSource::Fd(fd) => format!("fd:{}", fd.as_raw_fd()),
        }
    }

    /// The filesystem path, when the source has one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            PipeSource::Path(path) => Some(path),
            PipeSource::Fd(_) => None,
        }
    }
}

impl fmt::Debug for PipeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipeSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            PipeSource::Fd(fd) => f.debug_tuple("Fd").field(&fd.as_raw_fd()).finish(),
        }
    }
}

impl From<PathBuf> for PipeSource {
    fn from(path: PathBuf) -> Self {
        PipeSource::Path(path)
    }
}

impl From<&Path> for PipeSource {
    fn from(path: &Path) -> Self {
        PipeSource::Path(path.to_path_buf())
    }
}

impl From<&str> for PipeSource {
    fn from(path: &str) -> Self {
        PipeSource::Path(PathBuf::from(path))
    }
}

impl From<String> for PipeSource {
    fn from(path: String) -> Self {
        PipeSource::Path(PathBuf::from(path))
    }
}

impl From<OwnedFd> for PipeSource {
    fn from(fd: OwnedFd) -> Self {
        PipeSource::Fd(fd)
    }
}
