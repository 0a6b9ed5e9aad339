use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or writing timeline files.
///
/// # Examples
/// ```
/// use artrec_core::TimelineError;
///
/// let err = TimelineError::EmptyEvent { line: 3 };
/// assert!(err.to_string().contains("line 3"));
/// ```
#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("timeline not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("timeline has no events: {}", path.display())]
    Empty { path: PathBuf },
    #[error("malformed timeline line {line}: {message}")]
    Malformed { line: usize, message: String },
    #[error("expected exactly one offset on line {line}, found {count}")]
    OffsetCount { line: usize, count: usize },
    #[error("invalid offset '{key}' on line {line}")]
    InvalidOffset { line: usize, key: String },
    #[error("empty delta list on line {line}")]
    EmptyEvent { line: usize },
    #[error("timeline encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("could not allocate a timeline name in {}", dir.display())]
    NameExhausted { dir: PathBuf },
}
