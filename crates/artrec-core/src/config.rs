//! Session configuration.
//!
//! The host loads this from its own storage (the CLI uses TOML); the core
//! only consumes it read-only after `validate`.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::MergeMode;
use crate::protocols::artnet::layout;
use crate::protocols::artnet::{ArtNetError, PortAddress};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("max_dmx_address must be within 1..=512, got {0}")]
    MaxDmxAddress(u16),
    #[error("packet_delay_ms must be greater than zero")]
    PacketDelay,
    #[error("invalid universe address: {0}")]
    Address(#[from] ArtNetError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind: IpAddr,
    pub port: u16,
    /// Destination for outbound frames; the port is always `port`.
    pub broadcast: IpAddr,
    pub net: u8,
    pub subnet: u8,
    pub universe: u8,
    pub max_dmx_address: u16,
    /// Playback tick interval.
    pub packet_delay_ms: u64,
    pub working_dir: PathBuf,
    pub merge_mode: MergeMode,
    pub loop_playback: bool,
    /// Timeline file name (relative to `working_dir`) used for playback.
    pub timeline: Option<String>,
    /// Forces the working directory to be treated as read-only.
    pub read_only: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: layout::DEFAULT_PORT,
            broadcast: IpAddr::V4(Ipv4Addr::BROADCAST),
            net: 0,
            subnet: 0,
            universe: 0,
            max_dmx_address: layout::DMX_MAX_SLOTS as u16,
            packet_delay_ms: 25,
            working_dir: PathBuf::from("."),
            merge_mode: MergeMode::Ltp,
            loop_playback: false,
            timeline: None,
            read_only: false,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_dmx_address == 0 || usize::from(self.max_dmx_address) > layout::DMX_MAX_SLOTS {
            return Err(ConfigError::MaxDmxAddress(self.max_dmx_address));
        }
        if self.packet_delay_ms == 0 {
            return Err(ConfigError::PacketDelay);
        }
        self.address()?;
        Ok(())
    }

    pub fn address(&self) -> Result<PortAddress, ConfigError> {
        Ok(PortAddress::new(self.net, self.subnet, self.universe)?)
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn broadcast_addr(&self) -> SocketAddr {
        SocketAddr::new(self.broadcast, self.port)
    }

    pub fn packet_delay(&self) -> Duration {
        Duration::from_millis(self.packet_delay_ms)
    }

    pub fn channel_count(&self) -> usize {
        usize::from(self.max_dmx_address)
    }
}
