//! Timeline files.
//!
//! A timeline is newline-delimited JSON: each line maps one quoted offset in
//! milliseconds to the deltas observed at that offset. Files are created
//! once per recording, appended to line by line and read back incrementally.
//! Encoding lives in `format`, file access in `reader` and `writer`.

pub mod error;
pub mod format;
pub mod reader;
pub mod summary;
pub mod writer;

pub use error::TimelineError;
pub use reader::{TimelineReader, TimelineSource};
pub use summary::{TimelineSummary, summarize};
pub use writer::{TIMELINE_SUFFIX, TimelineWriter, timeline_file_name};
