use std::path::Path;
use std::time::Instant;

use time::OffsetDateTime;
use tracing::{debug, info};

use crate::timeline::{TimelineError, TimelineWriter};
use crate::{Delta, TimelineEvent};

/// Appends delta events to a freshly created timeline while recording.
///
/// The anchor is set by the first recorded change, so the first event sits
/// at offset 0 regardless of when recording was switched on.
#[derive(Debug)]
pub struct Recorder {
    writer: TimelineWriter,
    anchor: Option<Instant>,
    last_offset_ms: u64,
}

impl Recorder {
    pub fn start(dir: &Path, created_at: OffsetDateTime) -> Result<Self, TimelineError> {
        let writer = TimelineWriter::create_in(dir, created_at)?;
        info!(path = %writer.path().display(), "recording started");
        Ok(Self {
            writer,
            anchor: None,
            last_offset_ms: 0,
        })
    }

    pub fn path(&self) -> &Path {
        self.writer.path()
    }

    pub fn events_written(&self) -> u64 {
        self.writer.events_written()
    }

    /// Record `deltas` observed at `now`. Empty diffs are not recorded.
    ///
    /// Returns the offset written, if any.
    pub fn record(&mut self, now: Instant, deltas: Vec<Delta>) -> Result<Option<u64>, TimelineError> {
        if deltas.is_empty() {
            return Ok(None);
        }
        let anchor = *self.anchor.get_or_insert(now);
        let elapsed = now.saturating_duration_since(anchor).as_millis();
        let offset_ms = u64::try_from(elapsed)
            .unwrap_or(u64::MAX)
            .max(self.last_offset_ms);
        let event = TimelineEvent::new(offset_ms, deltas);
        self.writer.append(&event)?;
        self.last_offset_ms = offset_ms;
        debug!(offset_ms, deltas = event.deltas.len(), "recorded event");
        Ok(Some(offset_ms))
    }

    pub fn finish(self) {
        info!(
            path = %self.writer.path().display(),
            events = self.writer.events_written(),
            "recording stopped"
        );
    }
}
