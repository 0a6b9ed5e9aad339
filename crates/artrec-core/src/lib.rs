//! artrec core library: Art-Net DMX recording and playback.
//!
//! The crate mirrors one ArtDMX universe, records its changes to a
//! line-oriented delta timeline and replays stored timelines back onto the
//! network. Datagrams flow through the codec (`protocols::artnet`) into the
//! session (`engine`), which owns the frame buffer, the recorder, the player
//! and the mode state machine. Timeline files are handled in `timeline`; all
//! socket I/O lives in `reactor`.
//!
//! Invariants:
//! - The frame buffer length is fixed for the life of a session.
//! - Channel numbers are 1-indexed everywhere outside the codec.
//! - Recorded events always carry at least one delta, with non-decreasing
//!   offsets.
//! - Exactly one of Idle/Record/Playback is active at a time.
//!
//! # Examples
//! ```
//! use std::time::Instant;
//!
//! use artrec_core::protocols::artnet::encode;
//! use artrec_core::{Config, Session, WorkDir};
//!
//! let dir = tempfile::tempdir()?;
//! let config = Config {
//!     max_dmx_address: 8,
//!     working_dir: dir.path().to_path_buf(),
//!     ..Config::default()
//! };
//! let workdir = WorkDir::open(&config.working_dir)?;
//! let mut session = Session::new(config.clone(), workdir)?;
//!
//! let packet = encode(config.address()?, &[0, 0, 255])?;
//! session.handle_datagram(&packet, Instant::now());
//! assert_eq!(session.buffer().get(3), Some(255));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod config;
pub mod engine;
pub mod protocols;
pub mod reactor;
pub mod timeline;
pub mod workdir;

pub use config::{Config, ConfigError};
pub use engine::{ControlState, FrameBuffer, Session, SessionError, merge};
pub use protocols::artnet::{ArtNetError, DmxFrame, PortAddress};
pub use reactor::{Control, Reactor};
pub use timeline::{TimelineError, TimelineReader, TimelineSummary, TimelineWriter, summarize};
pub use workdir::WorkDir;

/// A single channel change.
///
/// # Examples
/// ```
/// use artrec_core::Delta;
///
/// let delta = Delta::new(1, 255);
/// let json = serde_json::to_string(&delta).unwrap();
/// assert_eq!(json, r#"{"channel":1,"value":255}"#);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Delta {
    /// 1-indexed DMX channel.
    pub channel: u16,
    pub value: u8,
}

impl Delta {
    pub fn new(channel: u16, value: u8) -> Self {
        Self { channel, value }
    }
}

/// Deltas observed at one point in time, relative to the recording start.
///
/// # Examples
/// ```
/// use artrec_core::{Delta, TimelineEvent};
///
/// let event = TimelineEvent::new(100, vec![Delta::new(1, 255)]);
/// assert_eq!(event.offset_ms, 100);
/// assert!(!event.deltas.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEvent {
    pub offset_ms: u64,
    pub deltas: Vec<Delta>,
}

impl TimelineEvent {
    pub fn new(offset_ms: u64, deltas: Vec<Delta>) -> Self {
        Self { offset_ms, deltas }
    }
}

/// Operating mode of a session; the numeric values match the control
/// surface selector.
///
/// # Examples
/// ```
/// use artrec_core::Mode;
///
/// assert_eq!(Mode::try_from(2), Ok(Mode::Playback));
/// assert_eq!("record".parse::<Mode>(), Ok(Mode::Record));
/// assert_eq!(u8::from(Mode::Idle), 0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Idle,
    Record,
    Playback,
}

impl From<Mode> for u8 {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Idle => 0,
            Mode::Record => 1,
            Mode::Playback => 2,
        }
    }
}

impl TryFrom<u8> for Mode {
    type Error = ParseModeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Mode::Idle),
            1 => Ok(Mode::Record),
            2 => Ok(Mode::Playback),
            _ => Err(ParseModeError(value.to_string())),
        }
    }
}

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "idle" => Ok(Mode::Idle),
            "1" | "record" => Ok(Mode::Record),
            "2" | "playback" => Ok(Mode::Playback),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Idle => "idle",
            Mode::Record => "record",
            Mode::Playback => "playback",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mode '{0}' (expected 0/idle, 1/record or 2/playback)")]
pub struct ParseModeError(String);

/// How timeline deltas combine with the live frame buffer during playback.
///
/// # Examples
/// ```
/// use artrec_core::MergeMode;
///
/// assert_eq!("HTP".parse::<MergeMode>(), Ok(MergeMode::Htp));
/// assert_eq!(MergeMode::default(), MergeMode::Ltp);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    /// Latest takes precedence.
    #[default]
    Ltp,
    /// Highest takes precedence.
    Htp,
}

impl FromStr for MergeMode {
    type Err = ParseMergeModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ltp" => Ok(MergeMode::Ltp),
            "htp" => Ok(MergeMode::Htp),
            other => Err(ParseMergeModeError(other.to_string())),
        }
    }
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeMode::Ltp => f.write_str("ltp"),
            MergeMode::Htp => f.write_str("htp"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown merge mode '{0}' (expected ltp or htp)")]
pub struct ParseMergeModeError(String);
