//! Art-Net protocol codec.
//!
//! The parser validates the packet size, Art-Net signature, ArtDMX opcode and
//! protocol version, then decodes the header fields and channel payload. The
//! writer produces the matching datagram for an outbound universe. Address
//! filtering is left to the caller: the codec accepts any universe.
//!
//! Rejections are values, never panics. Byte offsets and constants live in
//! `layout`, bounds-checked access in `reader`.

pub mod address;
pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;
pub mod writer;

pub use address::PortAddress;
pub use error::ArtNetError;
pub use parser::{DmxFrame, parse_artdmx};
pub use writer::build_artdmx;

/// Decode one datagram into an ArtDMX frame.
///
/// # Examples
/// ```
/// use artrec_core::protocols::artnet::{decode, encode};
/// use artrec_core::PortAddress;
///
/// let address = PortAddress::new(0, 1, 2).unwrap();
/// let packet = encode(address, &[10, 20, 30]).unwrap();
/// let frame = decode(&packet).unwrap();
/// assert_eq!(frame.address, address);
/// assert_eq!(frame.data, vec![10, 20, 30]);
/// ```
pub fn decode(bytes: &[u8]) -> Result<DmxFrame, ArtNetError> {
    parse_artdmx(bytes)
}

/// Encode channel values for `address` into an ArtDMX datagram.
pub fn encode(address: PortAddress, values: &[u8]) -> Result<Vec<u8>, ArtNetError> {
    build_artdmx(address, values)
}
