//! Protocol constants
//!
//! Byte values and size limits used on the edge/controller serial link.

// ============================================================================
// Framing
// ============================================================================

/// Sentinel byte that starts every frame.
pub const MARKER: u8 = 0xAA;

/// Smallest well-formed frame: marker, type, sequence and checksum.
pub const MIN_FRAME_LEN: usize = 4;

/// Bytes preceding the payload (marker, type, sequence).
pub const HEADER_LEN: usize = 3;

/// Default upper bound on an accumulated frame before it is declared invalid.
///
/// The largest frame either role emits is `EDGE_DATA:99999` plus four bytes of
/// framing (19 bytes).
pub const DEFAULT_MAX_FRAME_LEN: usize = 64;

// ============================================================================
// Packet Types
// ============================================================================

/// Sensor reading, edge → controller.
pub const PKT_TYPE_DATA: u8 = 0x01;
/// Request, controller → edge.
pub const PKT_TYPE_REQ: u8 = 0x02;
/// Acknowledgement of a request, edge → controller.
pub const PKT_TYPE_ACK: u8 = 0x06;

// ============================================================================
// Payload Tags
// ============================================================================

/// Prefix of the edge's periodic sensor payload.
pub const EDGE_DATA_PREFIX: &str = "EDGE_DATA:";
/// Prefix of the controller's periodic request payload.
pub const REQUEST_PREFIX: &str = "REQ:";

/// Timestamps embedded in payload tags are reduced modulo this value.
pub const TIMESTAMP_MODULUS: i64 = 100_000;
