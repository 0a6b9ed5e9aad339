use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};
use tracing::{debug, error, info, trace, warn};

use crate::config::{Config, ConfigError};
use crate::protocols::artnet::{self, PortAddress};
use crate::timeline::TimelineReader;
use crate::workdir::WorkDir;
use crate::{MergeMode, Mode};

pub mod error;
pub mod frame_buffer;
pub mod merge;
pub mod player;
pub mod recorder;

pub use error::SessionError;
pub use frame_buffer::FrameBuffer;
pub use merge::merge;
pub use player::{AfterEvent, Player, PlayerStep};
pub use recorder::Recorder;

/// Snapshot of the externally visible session state.
///
/// # Examples
/// ```
/// use artrec_core::{ControlState, MergeMode, Mode};
///
/// let state = ControlState {
///     mode: Mode::Idle,
///     connected: false,
///     timeline: None,
///     merge_mode: MergeMode::Ltp,
///     loop_playback: false,
/// };
/// let json = serde_json::to_string(&state).unwrap();
/// assert!(json.contains("\"mode\":\"idle\""));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlState {
    pub mode: Mode,
    pub connected: bool,
    /// Active recording, or the timeline selected for playback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    pub merge_mode: MergeMode,
    pub loop_playback: bool,
}

/// One mirrored universe with its record/playback state.
///
/// All mutation happens through `&mut self` from a single reactor; the
/// entry points `handle_datagram`, `tick` and `set_mode` never return
/// errors and report failures through the log instead.
#[derive(Debug)]
pub struct Session {
    address: PortAddress,
    workdir: WorkDir,
    utc_offset: UtcOffset,
    buffer: FrameBuffer,
    mode: Mode,
    merge_mode: MergeMode,
    loop_playback: bool,
    timeline: Option<String>,
    connected: bool,
    recorder: Option<Recorder>,
    player: Option<Player<TimelineReader>>,
}

impl Session {
    pub fn new(config: Config, workdir: WorkDir) -> Result<Self, ConfigError> {
        config.validate()?;
        let address = config.address()?;
        Ok(Self {
            address,
            workdir,
            // Only readable while the process is single-threaded.
            utc_offset: UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
            buffer: FrameBuffer::new(config.channel_count()),
            mode: Mode::Idle,
            merge_mode: config.merge_mode,
            loop_playback: config.loop_playback,
            timeline: config.timeline.filter(|name| !name.trim().is_empty()),
            connected: false,
            recorder: None,
            player: None,
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn address(&self) -> PortAddress {
        self.address
    }

    pub fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    pub fn merge_mode(&self) -> MergeMode {
        self.merge_mode
    }

    pub fn set_merge_mode(&mut self, mode: MergeMode) {
        info!(merge_mode = %mode, "merge mode changed");
        self.merge_mode = mode;
    }

    pub fn set_loop(&mut self, enabled: bool) {
        info!(enabled, "loop playback changed");
        self.loop_playback = enabled;
    }

    /// Select the timeline used by the next Playback entry.
    pub fn select_timeline(&mut self, name: impl Into<String>) {
        let name = name.into();
        info!(timeline = %name, "timeline selected");
        self.timeline = Some(name);
    }

    pub fn set_connected(&mut self, connected: bool) {
        if self.connected != connected {
            info!(connected, "connection state changed");
        }
        self.connected = connected;
    }

    pub fn recording_path(&self) -> Option<&Path> {
        self.recorder.as_ref().map(Recorder::path)
    }

    pub fn control_state(&self) -> ControlState {
        ControlState {
            mode: self.mode,
            connected: self.connected,
            timeline: self.timeline.clone(),
            merge_mode: self.merge_mode,
            loop_playback: self.loop_playback,
        }
    }

    /// Process one inbound datagram.
    ///
    /// Foreign or malformed traffic is dropped without touching the buffer.
    /// Accepted frames always update the buffer; in Record mode the changes
    /// are appended to the active timeline.
    pub fn handle_datagram(&mut self, bytes: &[u8], now: Instant) {
        let frame = match artnet::decode(bytes) {
            Ok(frame) => frame,
            Err(err) => {
                debug!(len = bytes.len(), reason = %err, "dropping datagram");
                return;
            }
        };
        if frame.address != self.address {
            debug!(
                received = %frame.address,
                expected = %self.address,
                "dropping frame for another universe"
            );
            return;
        }
        trace!(
            sequence = frame.sequence,
            physical = frame.physical,
            length = frame.length,
            "accepted frame"
        );

        let deltas = self.buffer.diff(&frame.data);
        if let Some(recorder) = self.recorder.as_mut() {
            if let Err(err) = recorder.record(now, deltas) {
                report_error("handle_datagram", &SessionError::TimelineWrite(err));
            }
        }
    }

    /// Advance playback; returns the datagram to broadcast, if any.
    ///
    /// A no-op outside Playback.
    pub fn tick(&mut self, now: Instant) -> Option<Vec<u8>> {
        let player = self.player.as_mut()?;
        let PlayerStep::Due { deltas, after } = player.poll(now, self.loop_playback) else {
            return None;
        };

        self.buffer.apply(&deltas, self.merge_mode);
        let packet = match artnet::encode(self.address, self.buffer.as_slice()) {
            Ok(packet) => Some(packet),
            Err(err) => {
                report_error("tick", &SessionError::Encode(err));
                None
            }
        };

        match after {
            AfterEvent::Scheduled | AfterEvent::Restarted => {}
            AfterEvent::Finished => {
                info!("playback finished");
                self.enter_idle();
            }
            AfterEvent::Failed(err) => {
                report_error("tick", &SessionError::TimelineUnavailable(err));
                self.enter_idle();
            }
        }
        packet
    }

    /// Switch mode, reporting any refusal; returns the resulting mode.
    pub fn set_mode(&mut self, mode: Mode, now: Instant) -> Mode {
        if let Err(err) = self.try_set_mode(mode, now) {
            report_error("set_mode", &err);
        }
        self.mode
    }

    /// Switch mode, returning the refusal to the caller.
    ///
    /// A refused Record leaves the mode unchanged. A refused Playback leaves
    /// the session Idle.
    pub fn try_set_mode(&mut self, mode: Mode, now: Instant) -> Result<(), SessionError> {
        if mode == self.mode {
            return Ok(());
        }
        match mode {
            Mode::Idle => {
                self.enter_idle();
                Ok(())
            }
            Mode::Record => self.enter_record(),
            Mode::Playback => self.enter_playback(now),
        }
    }

    /// Close every open timeline and clear the connection indicator.
    pub fn shutdown(&mut self) {
        self.enter_idle();
        self.set_connected(false);
    }

    fn enter_record(&mut self) -> Result<(), SessionError> {
        if !self.workdir.can_record() {
            return Err(SessionError::CapabilityDenied {
                path: self.workdir.path().to_path_buf(),
            });
        }
        let created_at = OffsetDateTime::now_utc().to_offset(self.utc_offset);
        let recorder = Recorder::start(self.workdir.path(), created_at)
            .map_err(|err| SessionError::record_start(self.workdir.path(), err))?;

        self.close_player();
        self.timeline = recorder
            .path()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        self.recorder = Some(recorder);
        self.switch_to(Mode::Record);
        Ok(())
    }

    fn enter_playback(&mut self, now: Instant) -> Result<(), SessionError> {
        match self.open_player(now) {
            Ok(player) => {
                self.close_recorder();
                self.player = Some(player);
                self.switch_to(Mode::Playback);
                Ok(())
            }
            Err(err) => {
                self.enter_idle();
                Err(err)
            }
        }
    }

    fn open_player(&self, now: Instant) -> Result<Player<TimelineReader>, SessionError> {
        let name = self
            .timeline
            .as_deref()
            .ok_or(SessionError::NoTimelineSelected)?;
        let path = self.workdir.timeline_path(name);
        let reader = TimelineReader::open(&path).map_err(SessionError::TimelineUnavailable)?;
        let player = Player::start(reader, now).map_err(SessionError::TimelineUnavailable)?;
        info!(path = %path.display(), "playback started");
        Ok(player)
    }

    fn enter_idle(&mut self) {
        self.close_recorder();
        self.close_player();
        self.switch_to(Mode::Idle);
    }

    fn close_recorder(&mut self) {
        if let Some(recorder) = self.recorder.take() {
            recorder.finish();
        }
    }

    fn close_player(&mut self) {
        if self.player.take().is_some() {
            debug!("timeline reader closed");
        }
    }

    fn switch_to(&mut self, mode: Mode) {
        if self.mode != mode {
            info!(from = %self.mode, to = %mode, "mode changed");
            self.mode = mode;
        }
    }
}

/// Single reporting path for failures inside session entry points.
pub(crate) fn report_error(method: &str, err: &SessionError) {
    match err {
        SessionError::CapabilityDenied { .. } => {
            warn!(method, error = %err, "request refused");
        }
        _ => {
            error!(method, error = %err, "session error");
        }
    }
}
