use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::TimelineError;
use super::reader::{TimelineReader, TimelineSource};

/// Aggregate view of a stored timeline.
///
/// # Examples
/// ```
/// use artrec_core::TimelineSummary;
///
/// let summary = TimelineSummary {
///     path: "show.jsonl".to_string(),
///     events: 2,
///     deltas: 3,
///     duration_ms: 250,
///     channels: vec![1, 5],
///     monotonic: true,
/// };
/// assert_eq!(summary.channels.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineSummary {
    /// Path as provided to the summarizer.
    pub path: String,
    /// Number of events (non-blank lines).
    pub events: u64,
    /// Total delta entries across all events.
    pub deltas: u64,
    /// Offset of the last event in milliseconds.
    pub duration_ms: u64,
    /// Distinct channels touched, ascending.
    pub channels: Vec<u16>,
    /// Whether offsets never decrease.
    pub monotonic: bool,
}

/// Read a timeline incrementally and summarize it.
///
/// # Errors
/// Fails on I/O errors or the first corrupt line.
pub fn summarize(path: &Path) -> Result<TimelineSummary, TimelineError> {
    let mut reader = TimelineReader::open(path)?;
    let mut events = 0u64;
    let mut deltas = 0u64;
    let mut duration_ms = 0u64;
    let mut last_offset = None;
    let mut monotonic = true;
    let mut channels = BTreeSet::new();

    while let Some(event) = reader.next_event()? {
        events += 1;
        deltas += event.deltas.len() as u64;
        if let Some(last) = last_offset {
            if event.offset_ms < last {
                monotonic = false;
            }
        }
        last_offset = Some(event.offset_ms);
        duration_ms = duration_ms.max(event.offset_ms);
        channels.extend(event.deltas.iter().map(|delta| delta.channel));
    }

    Ok(TimelineSummary {
        path: path.display().to_string(),
        events,
        deltas,
        duration_ms,
        channels: channels.into_iter().collect(),
        monotonic,
    })
}
