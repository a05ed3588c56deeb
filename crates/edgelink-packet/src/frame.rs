//! Frame encoding/decoding.
//!
//! A frame is the marker byte, the type byte, the sequence byte, the payload,
//! and a trailing checksum:
//!
//! ```text
//! +--------+------+-----+-------------------+----------+
//! | 0xAA   | type | seq | payload[0..N]     | checksum |
//! +--------+------+-----+-------------------+----------+
//! ```
//!
//! The payload boundary is implicit: everything between the sequence byte and
//! the final byte. The checksum is a plain modulo-256 sum, so a corruption that
//! leaves the sum unchanged (e.g. +1 on one byte and -1 on another) is not
//! detected.

use bytes::BufMut;

use crate::constants::*;
use crate::error::FrameError;
use crate::types::{Packet, PacketType};

/// Sum of `bytes` modulo 256.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Encode a frame. Always succeeds; the payload length is not limited.
pub fn encode(packet_type: PacketType, sequence: u8, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(MIN_FRAME_LEN + payload.len());
    buf.put_u8(MARKER);
    buf.put_u8(packet_type.into());
    buf.put_u8(sequence);
    buf.put_slice(payload);
    let sum = checksum(&buf);
    buf.put_u8(sum);
    buf
}

/// Check that `frame` is well-formed, reporting the first check that fails.
pub fn validate(frame: &[u8]) -> Result<(), FrameError> {
    if frame.len() < MIN_FRAME_LEN {
        return Err(FrameError::TooShort {
            expected: MIN_FRAME_LEN,
            actual: frame.len(),
        });
    }
    if frame[0] != MARKER {
        return Err(FrameError::BadMarker(frame[0]));
    }
    let (body, trailer) = frame.split_at(frame.len() - 1);
    let expected = checksum(body);
    if expected != trailer[0] {
        return Err(FrameError::ChecksumMismatch {
            expected,
            actual: trailer[0],
        });
    }
    Ok(())
}

/// Decode one complete frame.
///
/// Returns `None` if the frame is shorter than four bytes, does not start with
/// the marker, or fails the checksum.
pub fn decode(frame: &[u8]) -> Option<Packet> {
    validate(frame).ok()?;
    Some(Packet {
        packet_type: PacketType::from(frame[1]),
        sequence: frame[2],
        payload: frame[HEADER_LEN..frame.len() - 1].to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let frame = encode(PacketType::Request, 5, b"REQ:123");

        assert_eq!(frame.len(), 4 + 7);
        assert_eq!(frame[0], MARKER);
        assert_eq!(frame[1], PKT_TYPE_REQ);
        assert_eq!(frame[2], 5);
        assert_eq!(&frame[3..10], b"REQ:123");
        assert_eq!(frame[10], checksum(&frame[..10]));
    }

    #[test]
    fn test_encode_empty_ack() {
        // 0xAA + 0x06 + 0x07 = 0xB7
        assert_eq!(encode(PacketType::Ack, 7, b""), vec![0xAA, 0x06, 0x07, 0xB7]);
    }

    #[test]
    fn test_checksum_wraps() {
        assert_eq!(checksum(&[0xFF, 0x02]), 0x01);
        assert_eq!(checksum(&[]), 0);
    }

    #[test]
    fn test_round_trip() {
        let payloads: [&[u8]; 4] = [b"", b"EDGE_DATA:42", b"REQ:99999", &[0xAA, 0x00, 0xFF, 0xAA]];
        for packet_type in [PacketType::Data, PacketType::Request, PacketType::Ack] {
            for sequence in [0u8, 1, 127, 128, 255] {
                for payload in payloads {
                    let frame = encode(packet_type, sequence, payload);
                    let packet = decode(&frame).expect("round trip");
                    assert_eq!(packet.packet_type, packet_type);
                    assert_eq!(packet.sequence, sequence);
                    assert_eq!(packet.payload, payload);
                }
            }
        }
    }

    #[test]
    fn test_long_payload() {
        let payload: Vec<u8> = (0..1000).map(|i| (i % 256) as u8).collect();
        let frame = encode(PacketType::Data, 9, &payload);
        assert_eq!(decode(&frame).expect("decode").payload, payload);
    }

    #[test]
    fn test_reject_short_frames() {
        for len in 0..MIN_FRAME_LEN {
            let frame = vec![MARKER; len];
            assert!(decode(&frame).is_none());
            assert_eq!(
                validate(&frame),
                Err(FrameError::TooShort { expected: 4, actual: len })
            );
        }
    }

    #[test]
    fn test_reject_marker_followed_by_two_bytes() {
        assert!(decode(&[MARKER, 0x02, 0x05]).is_none());
    }

    #[test]
    fn test_reject_bad_marker() {
        let mut frame = encode(PacketType::Data, 0, b"EDGE_DATA:42");
        for marker in (0..=u8::MAX).filter(|&b| b != MARKER) {
            frame[0] = marker;
            // Fix up the checksum so only the marker is wrong.
            let last = frame.len() - 1;
            frame[last] = checksum(&frame[..last]);
            assert_eq!(validate(&frame), Err(FrameError::BadMarker(marker)));
            assert!(decode(&frame).is_none());
        }
    }

    #[test]
    fn test_single_bit_flips_detected() {
        let frame = encode(PacketType::Request, 200, b"REQ:31337");
        for byte in 0..frame.len() {
            for bit in 0..8 {
                let mut corrupted = frame.clone();
                corrupted[byte] ^= 1 << bit;
                // A single flipped bit changes the byte sum by ±2^bit, which is
                // never 0 mod 256, so every flip is detected.
                assert!(
                    decode(&corrupted).is_none(),
                    "flip of bit {} in byte {} went undetected",
                    bit,
                    byte
                );
            }
        }
    }

    #[test]
    fn test_compensating_corruption_undetected() {
        let frame = encode(PacketType::Data, 1, b"AB");
        let mut corrupted = frame.clone();
        corrupted[3] += 1;
        corrupted[4] -= 1;
        let packet = decode(&corrupted).expect("sum-preserving corruption passes");
        assert_eq!(packet.payload, b"BA");
    }

    #[test]
    fn test_unknown_type_decodes() {
        let frame = encode(PacketType::Other(0x33), 3, b"x");
        assert_eq!(decode(&frame).expect("decode").packet_type, PacketType::Other(0x33));
    }
}
