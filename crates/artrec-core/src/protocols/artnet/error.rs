use thiserror::Error;

/// Reasons an ArtDMX datagram is rejected or cannot be built.
///
/// Rejections are ordinary values: a datagram that is not ArtDMX for us is
/// expected traffic on a shared Art-Net network.
///
/// # Examples
/// ```
/// use artrec_core::ArtNetError;
///
/// let err = ArtNetError::UnsupportedOpcode { opcode: 0x2000 };
/// assert!(err.to_string().contains("unsupported opcode"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtNetError {
    #[error("payload too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("packet too long: at most {max} bytes, got {actual}")]
    TooLong { max: usize, actual: usize },
    #[error("invalid Art-Net signature")]
    InvalidSignature,
    #[error("unsupported opcode: {opcode:#06x}")]
    UnsupportedOpcode { opcode: u16 },
    #[error("unsupported protocol version: {version}")]
    UnsupportedVersion { version: u16 },
    #[error("DMX payload too large: at most {max} channels, got {actual}")]
    PayloadTooLarge { max: usize, actual: usize },
    #[error("invalid port-address field {field}: {value}")]
    InvalidAddress { field: &'static str, value: u16 },
}
