use std::mem;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::timeline::{TimelineError, TimelineReader, TimelineSource};
use crate::{Delta, TimelineEvent};

/// What the player did on one tick.
#[derive(Debug)]
pub enum PlayerStep {
    /// The cached event is not due yet.
    Pending,
    /// The cached event is due; `after` tells what happened to the stream.
    Due { deltas: Vec<Delta>, after: AfterEvent },
}

#[derive(Debug)]
pub enum AfterEvent {
    /// The next event is cached.
    Scheduled,
    /// End of timeline reached in loop mode; playback restarted from the top.
    Restarted,
    /// End of timeline reached without loop mode.
    Finished,
    /// The stream could not be continued.
    Failed(TimelineError),
}

/// Replays a timeline against a monotonic clock, one event per tick.
///
/// Only the single cached event is evaluated on each poll; a backlog of
/// overdue events drains one tick at a time.
#[derive(Debug)]
pub struct Player<S = TimelineReader> {
    source: S,
    started: Instant,
    next: TimelineEvent,
}

impl<S: TimelineSource> Player<S> {
    /// Read the first event and start the clock at `now`.
    ///
    /// # Errors
    /// Fails when the first event is missing or unreadable.
    pub fn start(mut source: S, now: Instant) -> Result<Self, TimelineError> {
        let next = first_event(&mut source)?;
        debug!(offset_ms = next.offset_ms, "first timeline event cached");
        Ok(Self {
            source,
            started: now,
            next,
        })
    }

    /// Offset of the cached event.
    pub fn next_offset(&self) -> Duration {
        Duration::from_millis(self.next.offset_ms)
    }

    pub fn poll(&mut self, now: Instant, loop_playback: bool) -> PlayerStep {
        if now.saturating_duration_since(self.started) < self.next_offset() {
            return PlayerStep::Pending;
        }

        let deltas = mem::take(&mut self.next.deltas);
        let after = match self.source.next_event() {
            Ok(Some(event)) => {
                self.next = event;
                AfterEvent::Scheduled
            }
            Ok(None) if loop_playback => self.restart(now),
            Ok(None) => AfterEvent::Finished,
            Err(err) => AfterEvent::Failed(err),
        };
        PlayerStep::Due { deltas, after }
    }

    fn restart(&mut self, now: Instant) -> AfterEvent {
        let rewound = self
            .source
            .rewind()
            .and_then(|()| first_event(&mut self.source));
        match rewound {
            Ok(event) => {
                info!("timeline restarted");
                self.next = event;
                self.started = now;
                AfterEvent::Restarted
            }
            Err(err) => AfterEvent::Failed(err),
        }
    }
}

fn first_event<S: TimelineSource>(source: &mut S) -> Result<TimelineEvent, TimelineError> {
    source.next_event()?.ok_or_else(|| TimelineError::Empty {
        path: source.path().to_path_buf(),
    })
}
