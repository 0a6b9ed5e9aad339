pub const ARTNET_ID: &[u8; 8] = b"Art-Net\0";

pub const OP_CODE_RANGE: std::ops::Range<usize> = 8..10;
pub const PROTOCOL_VERSION_RANGE: std::ops::Range<usize> = 10..12;
pub const SEQUENCE_OFFSET: usize = 12;
pub const PHYSICAL_OFFSET: usize = 13;
pub const SUB_UNI_OFFSET: usize = 14;
pub const NET_OFFSET: usize = 15;
pub const LENGTH_RANGE: std::ops::Range<usize> = 16..18;
pub const DMX_DATA_OFFSET: usize = 18;

pub const DMX_MAX_SLOTS: usize = 512;
pub const MAX_PACKET_LEN: usize = DMX_DATA_OFFSET + DMX_MAX_SLOTS;

pub const ARTDMX_OPCODE: u16 = 0x5000;
pub const PROTOCOL_VERSION: u16 = 14;

pub const NET_MASK: u8 = 0x7F;
pub const NIBBLE_MASK: u8 = 0x0F;

pub const DEFAULT_PORT: u16 = 6454;
