use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::ArtNetError;
use super::layout;

/// Net/subnet/universe triple identifying one ArtDMX universe.
///
/// # Examples
/// ```
/// use artrec_core::PortAddress;
///
/// let address = PortAddress::new(1, 2, 3).unwrap();
/// assert_eq!(address.to_port_address(), 0x0123);
/// assert_eq!(PortAddress::from_port_address(0x0123), address);
/// assert!(PortAddress::new(0, 16, 0).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortAddress {
    pub net: u8,
    pub subnet: u8,
    pub universe: u8,
}

impl PortAddress {
    pub fn new(net: u8, subnet: u8, universe: u8) -> Result<Self, ArtNetError> {
        if net > layout::NET_MASK {
            return Err(ArtNetError::InvalidAddress {
                field: "net",
                value: net.into(),
            });
        }
        if subnet > layout::NIBBLE_MASK {
            return Err(ArtNetError::InvalidAddress {
                field: "subnet",
                value: subnet.into(),
            });
        }
        if universe > layout::NIBBLE_MASK {
            return Err(ArtNetError::InvalidAddress {
                field: "universe",
                value: universe.into(),
            });
        }
        Ok(Self {
            net,
            subnet,
            universe,
        })
    }

    /// Build from a 15-bit Art-Net Port-Address; bit 15 is ignored.
    pub fn from_port_address(value: u16) -> Self {
        let [high, low] = value.to_be_bytes();
        Self {
            net: high & layout::NET_MASK,
            subnet: low >> 4,
            universe: low & layout::NIBBLE_MASK,
        }
    }

    pub fn to_port_address(self) -> u16 {
        (u16::from(self.net) << 8) | u16::from(self.sub_uni())
    }

    /// The combined subnet/universe byte as carried on the wire.
    pub fn sub_uni(self) -> u8 {
        (self.subnet << 4) | (self.universe & layout::NIBBLE_MASK)
    }
}

impl fmt::Display for PortAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.net, self.subnet, self.universe)
    }
}
