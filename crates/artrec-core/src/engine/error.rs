use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::protocols::artnet::ArtNetError;
use crate::timeline::TimelineError;

/// Failures surfaced by the session and its collaborators.
///
/// Protocol mismatches never appear here: rejected datagrams are dropped at
/// debug level inside `Session::handle_datagram`.
///
/// # Examples
/// ```
/// use std::io::ErrorKind;
/// use std::path::{Path, PathBuf};
///
/// use artrec_core::SessionError;
///
/// let err = SessionError::CapabilityDenied {
///     path: PathBuf::from("/srv/show"),
/// };
/// assert!(err.to_string().contains("not writable"));
/// ```
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("recording refused: working directory {} is not writable", path.display())]
    CapabilityDenied { path: PathBuf },
    #[error("no timeline selected for playback")]
    NoTimelineSelected,
    #[error("timeline unavailable: {0}")]
    TimelineUnavailable(#[source] TimelineError),
    #[error("timeline write failed: {0}")]
    TimelineWrite(#[source] TimelineError),
    #[error("working directory does not exist: {}", path.display())]
    WorkingDirMissing { path: PathBuf },
    #[error("frame encoding failed: {0}")]
    Encode(#[from] ArtNetError),
    #[error("transport failure: {0}")]
    Transport(#[from] std::io::Error),
}

impl SessionError {
    /// Classify a failure to create a recording in `dir`; a denied create
    /// counts as a refused Record.
    pub(crate) fn record_start(dir: &Path, err: TimelineError) -> Self {
        match &err {
            TimelineError::Io(io) if io.kind() == ErrorKind::PermissionDenied => {
                SessionError::CapabilityDenied {
                    path: dir.to_path_buf(),
                }
            }
            _ => SessionError::TimelineWrite(err),
        }
    }
}
