use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use time::OffsetDateTime;
use time::macros::format_description;

use crate::TimelineEvent;

use super::error::TimelineError;
use super::format::encode_line;

/// Fixed suffix of every timeline file name.
pub const TIMELINE_SUFFIX: &str = "artnet.jsonl";

const MAX_NAME_ATTEMPTS: u32 = 100;

/// Build `YYYYMMDD_HHMMSS_artnet.jsonl`, with `_N` before the suffix for
/// `attempt > 0`.
///
/// # Examples
/// ```
/// use artrec_core::timeline::timeline_file_name;
/// use time::macros::datetime;
///
/// let at = datetime!(2021-03-04 05:06:07 UTC);
/// assert_eq!(timeline_file_name(at, 0), "20210304_050607_artnet.jsonl");
/// assert_eq!(timeline_file_name(at, 2), "20210304_050607_2_artnet.jsonl");
/// ```
pub fn timeline_file_name(created_at: OffsetDateTime, attempt: u32) -> String {
    let stamp = created_at
        .format(format_description!(
            "[year][month][day]_[hour][minute][second]"
        ))
        .unwrap_or_else(|_| created_at.unix_timestamp().to_string());
    if attempt == 0 {
        format!("{stamp}_{TIMELINE_SUFFIX}")
    } else {
        format!("{stamp}_{attempt}_{TIMELINE_SUFFIX}")
    }
}

/// Append-only writer for one timeline file.
///
/// Each event is written as one complete line and flushed before `append`
/// returns.
#[derive(Debug)]
pub struct TimelineWriter {
    path: PathBuf,
    file: File,
    events: u64,
}

impl TimelineWriter {
    /// Create a fresh timeline in `dir`, never reusing an existing file.
    pub fn create_in(dir: &Path, created_at: OffsetDateTime) -> Result<Self, TimelineError> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let path = dir.join(timeline_file_name(created_at, attempt));
            match Self::create_new(&path) {
                Ok(writer) => return Ok(writer),
                Err(TimelineError::Io(err)) if err.kind() == ErrorKind::AlreadyExists => continue,
                Err(err) => return Err(err),
            }
        }
        Err(TimelineError::NameExhausted {
            dir: dir.to_path_buf(),
        })
    }

    pub fn create_new(path: &Path) -> Result<Self, TimelineError> {
        let file = OpenOptions::new()
            .append(true)
            .create_new(true)
            .open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            events: 0,
        })
    }

    pub fn append(&mut self, event: &TimelineEvent) -> Result<(), TimelineError> {
        let mut line = encode_line(event)?;
        line.push('\n');
        self.file.write_all(line.as_bytes())?;
        self.file.flush()?;
        self.events += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn events_written(&self) -> u64 {
        self.events
    }
}
