use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::TimelineEvent;

use super::error::TimelineError;
use super::format::decode_line;

/// A restartable stream of timeline events.
pub trait TimelineSource {
    /// Next event, or `None` at the end of the timeline.
    fn next_event(&mut self) -> Result<Option<TimelineEvent>, TimelineError>;
    /// Restart from the first event.
    fn rewind(&mut self) -> Result<(), TimelineError>;
    /// Where the events come from, for error reporting.
    fn path(&self) -> &Path;
}

/// Incremental line reader over a timeline file.
///
/// Only one line is held in memory at a time. Blank lines are skipped.
/// Dropping the reader closes the file.
#[derive(Debug)]
pub struct TimelineReader {
    path: PathBuf,
    reader: BufReader<File>,
    line: usize,
    buf: String,
}

impl TimelineReader {
    pub fn open(path: &Path) -> Result<Self, TimelineError> {
        let file = File::open(path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => TimelineError::NotFound {
                path: path.to_path_buf(),
            },
            _ => TimelineError::Io(err),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            line: 0,
            buf: String::new(),
        })
    }

    /// Number of the last line consumed (1-based, 0 before the first read).
    pub fn line(&self) -> usize {
        self.line
    }
}

impl TimelineSource for TimelineReader {
    fn next_event(&mut self) -> Result<Option<TimelineEvent>, TimelineError> {
        loop {
            self.buf.clear();
            let read = self.reader.read_line(&mut self.buf)?;
            if read == 0 {
                return Ok(None);
            }
            self.line += 1;
            let text = self.buf.trim();
            if text.is_empty() {
                continue;
            }
            return decode_line(text, self.line).map(Some);
        }
    }

    fn rewind(&mut self) -> Result<(), TimelineError> {
        self.reader.seek(SeekFrom::Start(0))?;
        self.line = 0;
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for TimelineReader {
    type Item = Result<TimelineEvent, TimelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event().transpose()
    }
}
