//! Packet types carried on the link.

use std::borrow::Cow;

use crate::constants::*;

/// Semantic kind of a packet (byte 1 of the frame).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketType {
    /// Sensor reading sent periodically by the edge.
    Data,
    /// Request sent periodically by the controller.
    Request,
    /// Acknowledgement of a request, sent by the edge.
    Ack,
    /// Any other type byte. Well-formed frames of unknown type still decode.
    Other(u8),
}

impl PacketType {
    /// Short uppercase name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            PacketType::Data => "DATA",
            PacketType::Request => "REQ",
            PacketType::Ack => "ACK",
            PacketType::Other(_) => "OTHER",
        }
    }
}

impl std::fmt::Display for PacketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PacketType::Other(code) => write!(f, "OTHER(0x{:02X})", code),
            known => f.write_str(known.name()),
        }
    }
}

impl From<u8> for PacketType {
    fn from(code: u8) -> Self {
        match code {
            PKT_TYPE_DATA => PacketType::Data,
            PKT_TYPE_REQ => PacketType::Request,
            PKT_TYPE_ACK => PacketType::Ack,
            _ => PacketType::Other(code),
        }
    }
}

impl From<PacketType> for u8 {
    fn from(packet_type: PacketType) -> Self {
        match packet_type {
            PacketType::Data => PKT_TYPE_DATA,
            PacketType::Request => PKT_TYPE_REQ,
            PacketType::Ack => PKT_TYPE_ACK,
            PacketType::Other(code) => code,
        }
    }
}

/// A decoded packet.
///
/// Packets are built right before transmission and discarded after dispatch;
/// nothing on the link persists them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Semantic kind.
    pub packet_type: PacketType,
    /// Sender's rolling sequence number.
    pub sequence: u8,
    /// Payload bytes between the header and the checksum.
    pub payload: Vec<u8>,
}

impl Packet {
    /// Create a packet.
    pub fn new(packet_type: PacketType, sequence: u8, payload: impl Into<Vec<u8>>) -> Self {
        Packet {
            packet_type,
            sequence,
            payload: payload.into(),
        }
    }

    /// Create an acknowledgement echoing `sequence` with an empty payload.
    pub fn ack(sequence: u8) -> Self {
        Packet::new(PacketType::Ack, sequence, Vec::new())
    }

    /// Encode this packet into a wire frame.
    pub fn encode(&self) -> Vec<u8> {
        crate::encode(self.packet_type, self.sequence, &self.payload)
    }

    /// Total length of the encoded frame.
    pub fn frame_len(&self) -> usize {
        MIN_FRAME_LEN + self.payload.len()
    }

    /// Payload as text, for logging. Invalid UTF-8 is replaced.
    pub fn payload_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_type_codes() {
        assert_eq!(PacketType::from(0x01), PacketType::Data);
        assert_eq!(PacketType::from(0x02), PacketType::Request);
        assert_eq!(PacketType::from(0x06), PacketType::Ack);
        assert_eq!(PacketType::from(0x7F), PacketType::Other(0x7F));

        for code in 0..=u8::MAX {
            assert_eq!(u8::from(PacketType::from(code)), code);
        }
    }

    #[test]
    fn test_packet_type_display() {
        assert_eq!(PacketType::Request.to_string(), "REQ");
        assert_eq!(PacketType::Other(0x10).to_string(), "OTHER(0x10)");
    }

    #[test]
    fn test_ack_packet() {
        let ack = Packet::ack(42);
        assert_eq!(ack.packet_type, PacketType::Ack);
        assert_eq!(ack.sequence, 42);
        assert!(ack.payload.is_empty());
        assert_eq!(ack.frame_len(), 4);
        assert_eq!(ack.encode().len(), 4);
    }

    #[test]
    fn test_payload_str_lossy() {
        let packet = Packet::new(PacketType::Data, 0, vec![b'o', b'k', 0xFF]);
        assert_eq!(packet.payload_str(), "ok\u{FFFD}");
    }
}
