use super::address::PortAddress;
use super::error::ArtNetError;
use super::layout;

/// Build an ArtDMX datagram carrying `values` for `address`.
///
/// Sequence and physical are always zero; the length field equals
/// `values.len()`.
///
/// # Errors
/// Returns `ArtNetError::PayloadTooLarge` for more than 512 values.
pub fn build_artdmx(address: PortAddress, values: &[u8]) -> Result<Vec<u8>, ArtNetError> {
    if values.len() > layout::DMX_MAX_SLOTS {
        return Err(ArtNetError::PayloadTooLarge {
            max: layout::DMX_MAX_SLOTS,
            actual: values.len(),
        });
    }
    let length = u16::try_from(values.len()).map_err(|_| ArtNetError::PayloadTooLarge {
        max: layout::DMX_MAX_SLOTS,
        actual: values.len(),
    })?;

    let mut packet = vec![0u8; layout::DMX_DATA_OFFSET + values.len()];
    packet[..layout::ARTNET_ID.len()].copy_from_slice(layout::ARTNET_ID);
    packet[layout::OP_CODE_RANGE.clone()].copy_from_slice(&layout::ARTDMX_OPCODE.to_le_bytes());
    packet[layout::PROTOCOL_VERSION_RANGE.clone()]
        .copy_from_slice(&layout::PROTOCOL_VERSION.to_be_bytes());
    packet[layout::SUB_UNI_OFFSET] = address.sub_uni();
    packet[layout::NET_OFFSET] = address.net & layout::NET_MASK;
    packet[layout::LENGTH_RANGE.clone()].copy_from_slice(&length.to_be_bytes());
    packet[layout::DMX_DATA_OFFSET..].copy_from_slice(values);
    Ok(packet)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::build_artdmx;
    use crate::protocols::artnet::address::PortAddress;
    use crate::protocols::artnet::error::ArtNetError;
    use crate::protocols::artnet::layout;
    use crate::protocols::artnet::parser::parse_artdmx;

    #[test]
    fn packet_structure() {
        let address = PortAddress::new(2, 3, 4).unwrap();
        let packet = build_artdmx(address, &[0u8; 512]).unwrap();

        assert_eq!(&packet[0..8], b"Art-Net\0");
        assert_eq!(&packet[8..10], &[0x00, 0x50]);
        assert_eq!(&packet[10..12], &[0x00, 0x0E]);
        assert_eq!(packet[12], 0);
        assert_eq!(packet[13], 0);
        assert_eq!(packet[14], 0x34);
        assert_eq!(packet[15], 2);
        assert_eq!(&packet[16..18], &[0x02, 0x00]);
        assert_eq!(packet.len(), layout::MAX_PACKET_LEN);
    }

    #[test]
    fn rejects_more_than_512_values() {
        let err = build_artdmx(PortAddress::default(), &[0u8; 513]).unwrap_err();
        assert_eq!(
            err,
            ArtNetError::PayloadTooLarge {
                max: 512,
                actual: 513
            }
        );
    }

    fn any_address() -> impl Strategy<Value = PortAddress> {
        (0u8..=0x7F, 0u8..=0x0F, 0u8..=0x0F).prop_map(|(net, subnet, universe)| PortAddress {
            net,
            subnet,
            universe,
        })
    }

    proptest! {
        #[test]
        fn encode_then_decode_preserves_frame(
            address in any_address(),
            values in proptest::collection::vec(any::<u8>(), 1..=512),
        ) {
            let packet = build_artdmx(address, &values).unwrap();
            let frame = parse_artdmx(&packet).unwrap();
            prop_assert_eq!(frame.address, address);
            prop_assert_eq!(frame.sequence, 0);
            prop_assert_eq!(frame.physical, 0);
            prop_assert_eq!(usize::from(frame.length), values.len());
            prop_assert_eq!(frame.data, values);
        }
    }
}
