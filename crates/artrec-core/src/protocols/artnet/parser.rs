use super::address::PortAddress;
use super::error::ArtNetError;
use super::layout;
use super::reader::ArtNetReader;

/// A decoded ArtDMX frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmxFrame {
    pub sequence: u8,
    pub physical: u8,
    pub address: PortAddress,
    /// Channel count announced in the header; informational only.
    pub length: u16,
    pub data: Vec<u8>,
}

pub fn parse_artdmx(payload: &[u8]) -> Result<DmxFrame, ArtNetError> {
    let reader = ArtNetReader::new(payload);
    reader.require_max_len(layout::MAX_PACKET_LEN)?;
    reader.require_len(layout::DMX_DATA_OFFSET)?;

    let signature = reader.read_signature()?;
    if signature != layout::ARTNET_ID {
        return Err(ArtNetError::InvalidSignature);
    }

    let opcode = reader.read_u16_le(layout::OP_CODE_RANGE.clone())?;
    if opcode != layout::ARTDMX_OPCODE {
        return Err(ArtNetError::UnsupportedOpcode { opcode });
    }

    let version = reader.read_u16_be(layout::PROTOCOL_VERSION_RANGE.clone())?;
    if version != layout::PROTOCOL_VERSION {
        return Err(ArtNetError::UnsupportedVersion { version });
    }

    let sequence = reader.read_u8(layout::SEQUENCE_OFFSET)?;
    let physical = reader.read_u8(layout::PHYSICAL_OFFSET)?;
    let (subnet, universe) = reader.read_nibbles(layout::SUB_UNI_OFFSET)?;
    let net = reader.read_u8(layout::NET_OFFSET)? & layout::NET_MASK;
    let length = reader.read_u16_be(layout::LENGTH_RANGE.clone())?;
    let data = reader.read_tail(layout::DMX_DATA_OFFSET)?;

    Ok(DmxFrame {
        sequence,
        physical,
        address: PortAddress {
            net,
            subnet,
            universe,
        },
        length,
        data: data.to_vec(),
    })
}
