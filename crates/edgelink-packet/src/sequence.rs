//! Sequence numbering and payload tags.

use crate::constants::TIMESTAMP_MODULUS;

/// Rolling 8-bit sequence counter owned by a single transmit loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceCounter {
    next: u8,
}

impl SequenceCounter {
    /// Create a counter starting at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a counter starting at `start`.
    pub fn starting_at(start: u8) -> Self {
        SequenceCounter { next: start }
    }

    /// Value the next call to [`SequenceCounter::next`] will return.
    pub fn peek(&self) -> u8 {
        self.next
    }

    /// Return the current value and advance, wrapping from 255 to 0.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> u8 {
        let current = self.next;
        self.next = self.next.wrapping_add(1);
        current
    }
}

/// Build a payload tag such as `REQ:48213` from a prefix and a Unix time in
/// milliseconds. The timestamp is reduced modulo 100000.
pub fn payload_tag(prefix: &str, unix_millis: i64) -> Vec<u8> {
    format!("{}{}", prefix, unix_millis.rem_euclid(TIMESTAMP_MODULUS)).into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{EDGE_DATA_PREFIX, REQUEST_PREFIX};

    #[test]
    fn test_sequence_starts_at_zero() {
        let mut seq = SequenceCounter::new();
        assert_eq!(seq.next(), 0);
        assert_eq!(seq.next(), 1);
        assert_eq!(seq.peek(), 2);
    }

    #[test]
    fn test_sequence_wraparound() {
        let mut seq = SequenceCounter::new();
        for expected in 0..=255u8 {
            assert_eq!(seq.next(), expected);
        }
        // 256 transmissions later we are back at 0 and keep counting.
        assert_eq!(seq.next(), 0);
        assert_eq!(seq.next(), 1);
    }

    #[test]
    fn test_sequence_starting_at() {
        let mut seq = SequenceCounter::starting_at(255);
        assert_eq!(seq.next(), 255);
        assert_eq!(seq.next(), 0);
    }

    #[test]
    fn test_payload_tag() {
        assert_eq!(payload_tag(EDGE_DATA_PREFIX, 1_700_000_012_345), b"EDGE_DATA:12345");
        assert_eq!(payload_tag(REQUEST_PREFIX, 1_700_000_000_042), b"REQ:42");
        assert_eq!(payload_tag(REQUEST_PREFIX, 99_999), b"REQ:99999");
        assert_eq!(payload_tag(REQUEST_PREFIX, 100_000), b"REQ:0");
    }
}
