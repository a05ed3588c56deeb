//! Byte-at-a-time frame reassembly.
//!
//! Frames carry no length field, so the receiver cannot know where a frame
//! ends until the trailing checksum matches. The accumulator keeps every byte
//! since the last marker and re-checks the whole buffer after each byte:
//!
//! ```text
//! EMPTY --marker--> ACCUMULATING --checksum ok--> VALID_FRAME --> EMPTY
//!                        |
//!                        +--max_frame_len reached--> INVALID_FRAME --> resync
//! ```
//!
//! A checksum mismatch below the maximum frame length means "not complete
//! yet". At the maximum length the candidate is declared invalid: the bytes up
//! to the next marker it contains are dropped and the rest are replayed one at
//! a time, so any complete frame hiding behind a corrupted one is still found.
//! Replaying can complete more than one frame at once; the extras wait in a
//! ready queue drained by [`FrameAccumulator::push`] and
//! [`FrameAccumulator::pop_ready`].

use std::collections::VecDeque;

use bytes::{Buf, BufMut, BytesMut};
use log::trace;

use crate::constants::*;
use crate::frame::decode;
use crate::types::Packet;

/// Reassembles frames from a byte stream.
#[derive(Debug)]
pub struct FrameAccumulator {
    /// Bytes since the current candidate marker. Always empty or starts with
    /// [`MARKER`].
    buffer: BytesMut,
    /// Decoded packets not yet handed out.
    ready: VecDeque<Packet>,
    /// Length at which an unterminated candidate is abandoned.
    max_frame_len: usize,
    /// Bytes thrown away while hunting for a marker or resynchronising.
    discarded_bytes: u64,
    /// Candidates abandoned at the maximum frame length.
    dropped_frames: u64,
}

impl Default for FrameAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAccumulator {
    /// Create an accumulator with [`DEFAULT_MAX_FRAME_LEN`].
    pub fn new() -> Self {
        Self::with_max_frame_len(DEFAULT_MAX_FRAME_LEN)
    }

    /// Create an accumulator that abandons candidates at `max_frame_len` bytes.
    ///
    /// Values below [`MIN_FRAME_LEN`] are raised to it.
    pub fn with_max_frame_len(max_frame_len: usize) -> Self {
        let max_frame_len = max_frame_len.max(MIN_FRAME_LEN);
        FrameAccumulator {
            buffer: BytesMut::with_capacity(max_frame_len),
            ready: VecDeque::new(),
            max_frame_len,
            discarded_bytes: 0,
            dropped_frames: 0,
        }
    }

    /// Feed one byte. Returns the oldest decoded packet, if any.
    ///
    /// When a resync completes several frames at once, the rest stay queued;
    /// collect them with [`FrameAccumulator::pop_ready`].
    pub fn push(&mut self, byte: u8) -> Option<Packet> {
        self.ingest(byte);
        self.ready.pop_front()
    }

    /// Take the oldest decoded packet without feeding a byte.
    pub fn pop_ready(&mut self) -> Option<Packet> {
        self.ready.pop_front()
    }

    /// Number of decoded packets waiting in the ready queue.
    pub fn ready_len(&self) -> usize {
        self.ready.len()
    }

    /// Feed a run of bytes, collecting every packet they complete.
    pub fn push_slice(&mut self, data: &[u8]) -> Vec<Packet> {
        for &byte in data {
            self.ingest(byte);
        }
        self.ready.drain(..).collect()
    }

    fn ingest(&mut self, byte: u8) {
        if self.buffer.is_empty() && byte != MARKER {
            self.discarded_bytes += 1;
            trace!("discarding 0x{:02X} while waiting for frame marker", byte);
            return;
        }
        self.buffer.put_u8(byte);

        if self.buffer.len() < MIN_FRAME_LEN {
            return;
        }

        if let Some(packet) = decode(&self.buffer) {
            self.buffer.clear();
            self.ready.push_back(packet);
            return;
        }

        if self.buffer.len() >= self.max_frame_len {
            self.dropped_frames += 1;
            self.resync();
        }
    }

    /// Drop the current candidate up to the next marker it contains and
    /// replay the remaining bytes.
    ///
    /// The replayed bytes are shorter than the maximum frame length, so a
    /// replay never triggers another resync.
    fn resync(&mut self) {
        let skip = self.buffer[1..]
            .iter()
            .position(|&b| b == MARKER)
            .map(|pos| pos + 1)
            .unwrap_or(self.buffer.len());

        trace!(
            "abandoning {}-byte candidate frame, dropping {} bytes",
            self.buffer.len(),
            skip
        );

        self.discarded_bytes += skip as u64;
        self.buffer.advance(skip);

        let replay = self.buffer.split();
        for &byte in replay.iter() {
            self.ingest(byte);
        }
    }

    /// Number of bytes currently buffered.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Maximum candidate length before resynchronising.
    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }

    /// Total bytes discarded so far.
    pub fn discarded_bytes(&self) -> u64 {
        self.discarded_bytes
    }

    /// Total candidates abandoned at the maximum frame length.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }

    /// Drop any partial frame and any undelivered packets.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.ready.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::encode;
    use crate::types::PacketType;

    #[test]
    fn test_byte_at_a_time_request() {
        let mut acc = FrameAccumulator::new();
        let frame = encode(PacketType::Request, 5, b"REQ:123");

        for &byte in &frame[..frame.len() - 1] {
            assert!(acc.push(byte).is_none());
        }
        let packet = acc.push(frame[frame.len() - 1]).expect("frame complete");

        assert_eq!(packet.packet_type, PacketType::Request);
        assert_eq!(packet.sequence, 5);
        assert_eq!(packet.payload, b"REQ:123");
        assert_eq!(acc.buffered_len(), 0);
    }

    #[test]
    fn test_three_bytes_is_not_a_packet() {
        let mut acc = FrameAccumulator::new();
        assert!(acc.push_slice(&[MARKER, 0x13, 0x37]).is_empty());
        assert_eq!(acc.buffered_len(), 3);
    }

    #[test]
    fn test_leading_garbage_discarded() {
        let mut acc = FrameAccumulator::new();
        let mut stream = vec![0x00, 0x11, 0x22];
        stream.extend(encode(PacketType::Ack, 9, b""));

        let packets = acc.push_slice(&stream);
        assert_eq!(packets, vec![Packet::ack(9)]);
        assert_eq!(acc.discarded_bytes(), 3);
    }

    #[test]
    fn test_back_to_back_frames() {
        let mut acc = FrameAccumulator::new();
        let mut stream = encode(PacketType::Data, 0, b"EDGE_DATA:42");
        stream.extend(encode(PacketType::Ack, 1, b""));
        stream.extend(encode(PacketType::Ack, 2, b""));

        let packets = acc.push_slice(&stream);
        assert_eq!(packets.len(), 3);
        assert_eq!(packets[0].packet_type, PacketType::Data);
        assert_eq!(packets[0].payload, b"EDGE_DATA:42");
        assert_eq!(packets[1], Packet::ack(1));
        assert_eq!(packets[2], Packet::ack(2));
    }

    #[test]
    fn test_unterminated_candidate_is_bounded() {
        let mut acc = FrameAccumulator::with_max_frame_len(16);

        // Marker followed by zeros never satisfies the checksum.
        acc.push(MARKER);
        for _ in 0..40 {
            assert!(acc.push(0x00).is_none());
            assert!(acc.buffered_len() < 16);
        }
        assert!(acc.dropped_frames() >= 1);

        // The link recovers for the next real frame.
        let packets = acc.push_slice(&encode(PacketType::Ack, 3, b""));
        assert_eq!(packets, vec![Packet::ack(3)]);
    }

    /// One REQ with a flipped payload bit followed by `count` good ones.
    fn corrupted_then_valid(count: u8) -> Vec<u8> {
        let mut stream = encode(PacketType::Request, 0, b"REQ:100");
        stream[4] ^= 0x01;
        for seq in 1..=count {
            stream.extend(encode(
                PacketType::Request,
                seq,
                format!("REQ:{}", seq).as_bytes(),
            ));
        }
        stream
    }

    #[test]
    fn test_recovers_after_corrupted_frame() {
        let mut acc = FrameAccumulator::new();

        let packets = acc.push_slice(&corrupted_then_valid(10));

        let expected: Vec<Packet> = (1..=10u8)
            .map(|seq| {
                Packet::new(PacketType::Request, seq, format!("REQ:{}", seq).into_bytes())
            })
            .collect();
        assert_eq!(packets, expected);
        assert_eq!(acc.dropped_frames(), 1);
        assert_eq!(acc.discarded_bytes(), 11);
        assert_eq!(acc.buffered_len(), 0);
    }

    #[test]
    fn test_corrupted_frame_costs_only_itself() {
        let mut acc = FrameAccumulator::new();

        let sequences: Vec<u8> = acc
            .push_slice(&corrupted_then_valid(40))
            .iter()
            .map(|p| p.sequence)
            .collect();

        assert_eq!(sequences, (1..=40).collect::<Vec<u8>>());
        assert_eq!(acc.dropped_frames(), 1);
    }

    #[test]
    fn test_recovery_byte_at_a_time() {
        let mut acc = FrameAccumulator::new();
        let mut sequences = Vec::new();

        for byte in corrupted_then_valid(10) {
            if let Some(packet) = acc.push(byte) {
                sequences.push(packet.sequence);
            }
            while let Some(packet) = acc.pop_ready() {
                sequences.push(packet.sequence);
            }
        }

        assert_eq!(sequences, (1..=10).collect::<Vec<u8>>());
    }

    #[test]
    fn test_resync_replay_queues_extra_frames() {
        let mut acc = FrameAccumulator::with_max_frame_len(14);

        // Marker and a stray byte, then three ACKs. The candidate reaches the
        // limit on the last ACK byte and the replay completes all three.
        let mut stream = vec![MARKER, 0x01];
        for seq in 1..=3 {
            stream.extend(encode(PacketType::Ack, seq, b""));
        }
        let (last, head) = stream.split_last().unwrap();
        for &byte in head {
            assert!(acc.push(byte).is_none());
        }

        assert_eq!(acc.push(*last), Some(Packet::ack(1)));
        assert_eq!(acc.ready_len(), 2);
        assert_eq!(acc.pop_ready(), Some(Packet::ack(2)));
        assert_eq!(acc.pop_ready(), Some(Packet::ack(3)));
        assert_eq!(acc.pop_ready(), None);
        assert_eq!(acc.dropped_frames(), 1);
        assert_eq!(acc.discarded_bytes(), 2);
    }

    #[test]
    fn test_min_max_frame_len_clamped() {
        let acc = FrameAccumulator::with_max_frame_len(1);
        assert_eq!(acc.max_frame_len(), MIN_FRAME_LEN);
    }

    #[test]
    fn test_clear() {
        let mut acc = FrameAccumulator::new();
        acc.push_slice(&[MARKER, 0x02]);
        acc.clear();
        assert_eq!(acc.buffered_len(), 0);
    }
}
