//! Wire framing for the serial-frame network interface (SPEC_FULL.md §4.4,
//! §6). Deliberately independent of any transport or IP-stack type so it can
//! be exercised on the host, the way `simplefs`'s header codec was kept
//! independent of its storage backend.

use crate::Error;

/// Length of an Ethernet header: 6-byte destination MAC, 6-byte source MAC,
/// 2-byte EtherType.
pub const ETH_HEADER_LEN: usize = 14;

/// Smallest payload a standard Ethernet frame carries (padded up to by the
/// sender if the real payload is shorter).
const MIN_ETH_PAYLOAD_LEN: usize = 46;

/// Smallest Ethernet frame this interface will accept: header plus the
/// standard minimum payload, 60 bytes total. A shorter frame is degenerate
/// by the wire contract in §4.4.
pub const MIN_ETH_FRAME_LEN: usize = ETH_HEADER_LEN + MIN_ETH_PAYLOAD_LEN;

/// Largest Ethernet frame this interface will accept.
pub const MAX_ETH_FRAME_LEN: usize = 1518;

/// Length prefix is always 2 bytes, big-endian.
pub const LEN_PREFIX_LEN: usize = 2;

pub const DEVICE_MAC: [u8; 6] = [0x02, 0x00, 0x00, 0x00, 0x00, 0x02];
pub const PEER_MAC: [u8; 6] = [0x02, 0x00, 0x00, 0x00, 0x00, 0x01];

/// Validate an Ethernet-frame length taken from the wire's length prefix.
pub fn validate_len(len: usize) -> Result<(), Error> {
    if (MIN_ETH_FRAME_LEN..=MAX_ETH_FRAME_LEN).contains(&len) {
        Ok(())
    } else {
        Err(Error::InvalidArg)
    }
}

/// Encode the 2-byte big-endian length prefix for an Ethernet frame of the
/// given length. Returns `InvalidArg` if the frame length is out of the
/// valid range.
pub fn encode_len_prefix(eth_len: usize) -> Result<[u8; LEN_PREFIX_LEN], Error> {
    validate_len(eth_len)?;
    let len = u16::try_from(eth_len).map_err(|_| Error::InvalidArg)?;
    Ok(len.to_be_bytes())
}

/// Decode a 2-byte big-endian length prefix, validating range.
pub fn decode_len_prefix(prefix: [u8; LEN_PREFIX_LEN]) -> Result<usize, Error> {
    let len = u16::from_be_bytes(prefix) as usize;
    validate_len(len)?;
    Ok(len)
}

/// Flatten a complete wire frame (length prefix + Ethernet frame) for a TX
/// write, given an already-assembled Ethernet frame.
pub fn encode_wire_frame(eth_frame: &[u8]) -> Result<Vec<u8>, Error> {
    let prefix = encode_len_prefix(eth_frame.len())?;
    let mut out = Vec::with_capacity(LEN_PREFIX_LEN + eth_frame.len());
    out.extend_from_slice(&prefix);
    out.extend_from_slice(eth_frame);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eth_frame(payload_len: usize) -> Vec<u8> {
        let mut frame = Vec::with_capacity(ETH_HEADER_LEN + payload_len);
        frame.extend_from_slice(&PEER_MAC); // dst
        frame.extend_from_slice(&DEVICE_MAC); // src
        frame.extend_from_slice(&[0x08, 0x00]); // EtherType IPv4
        frame.extend(std::iter::repeat(0xAB).take(payload_len));
        frame
    }

    #[test]
    fn validate_len_accepts_boundary_values() {
        assert!(validate_len(MIN_ETH_FRAME_LEN).is_ok());
        assert!(validate_len(MAX_ETH_FRAME_LEN).is_ok());
    }

    #[test]
    fn validate_len_rejects_too_small() {
        assert!(matches!(validate_len(13), Err(Error::InvalidArg)));
        assert!(matches!(validate_len(0), Err(Error::InvalidArg)));
    }

    #[test]
    fn validate_len_rejects_too_large() {
        assert!(matches!(validate_len(1519), Err(Error::InvalidArg)));
    }

    #[test]
    fn encode_decode_round_trip() {
        let frame = eth_frame(84); // 98 total, matches SPEC_FULL.md scenario 6
        let prefix = encode_len_prefix(frame.len()).unwrap();
        assert_eq!(prefix, 98u16.to_be_bytes());
        assert_eq!(decode_len_prefix(prefix).unwrap(), frame.len());
    }

    #[test]
    fn decode_rejects_undersized_prefix() {
        // LEN=19 from SPEC_FULL.md scenario 6: too small for a validly
        // framed Ethernet frame after the 14-byte header.
        let err = decode_len_prefix(19u16.to_be_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidArg));
    }

    #[test]
    fn encode_wire_frame_prefixes_length() {
        let frame = eth_frame(MIN_ETH_PAYLOAD_LEN);
        let wire = encode_wire_frame(&frame).unwrap();
        assert_eq!(&wire[..2], &(frame.len() as u16).to_be_bytes());
        assert_eq!(&wire[2..], &frame[..]);
    }

    #[test]
    fn encode_wire_frame_rejects_oversized_payload() {
        let frame = eth_frame(MAX_ETH_FRAME_LEN - ETH_HEADER_LEN + 1);
        assert!(encode_wire_frame(&frame).is_err());
    }
}
