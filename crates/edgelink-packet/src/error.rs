//! Frame validation errors.

use thiserror::Error;

/// Reasons a byte sequence is not a well-formed frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Frame is too short to be valid.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    TooShort {
        /// Expected minimum length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// First byte is not the frame marker.
    #[error("bad frame marker: 0x{0:02X}")]
    BadMarker(u8),

    /// Trailing byte does not match the sum of the preceding bytes.
    #[error("checksum mismatch: computed 0x{expected:02X}, frame carries 0x{actual:02X}")]
    ChecksumMismatch {
        /// Checksum computed over the frame body.
        expected: u8,
        /// Checksum byte carried by the frame.
        actual: u8,
    },
}
