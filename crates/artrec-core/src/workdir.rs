//! Working directory holding the timeline files.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::engine::SessionError;

/// The directory recordings are written to and timelines are read from.
///
/// `can_record` is the capability gate for entering Record mode.
#[derive(Debug, Clone)]
pub struct WorkDir {
    root: PathBuf,
    writable: bool,
}

impl WorkDir {
    /// Open an existing directory.
    ///
    /// # Errors
    /// Returns `SessionError::WorkingDirMissing` when `root` is not an
    /// existing directory; callers treat this as fatal at startup.
    pub fn open(root: &Path) -> Result<Self, SessionError> {
        let meta = fs::metadata(root).map_err(|_| SessionError::WorkingDirMissing {
            path: root.to_path_buf(),
        })?;
        if !meta.is_dir() {
            return Err(SessionError::WorkingDirMissing {
                path: root.to_path_buf(),
            });
        }
        let writable = !meta.permissions().readonly();
        if !writable {
            warn!(path = %root.display(), "working directory is read-only, recording disabled");
        }
        debug!(path = %root.display(), writable, "working directory opened");
        Ok(Self {
            root: root.to_path_buf(),
            writable,
        })
    }

    /// Override the detected writability.
    pub fn with_writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }

    pub fn can_record(&self) -> bool {
        self.writable
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resolve a timeline name relative to the directory.
    pub fn timeline_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}
