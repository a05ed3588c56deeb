//! Edge/Controller Serial Link Packets
//!
//! This crate provides the wire format shared by the edge node and the
//! controller node. Frames are delimited by a leading marker byte and a
//! trailing checksum byte; there is no length field.
//!
//! # Wire Format
//!
//! ```text
//! +--------+------+-----+-------------------+----------+
//! | 0xAA   | type | seq | payload[0..N]     | checksum |
//! +--------+------+-----+-------------------+----------+
//! ```
//!
//! - **type**: `0x01` DATA (edge → controller), `0x02` REQ (controller → edge),
//!   `0x06` ACK (edge → controller)
//! - **seq**: 8-bit rolling sequence number, informational only
//! - **checksum**: sum of every preceding byte, modulo 256
//!
//! # Example
//!
//! ```rust
//! use edgelink_packet::{decode, encode, PacketType};
//!
//! let frame = encode(PacketType::Request, 5, b"REQ:123");
//! let packet = decode(&frame).expect("well-formed frame");
//! assert_eq!(packet.packet_type, PacketType::Request);
//! assert_eq!(packet.sequence, 5);
//! assert_eq!(packet.payload, b"REQ:123");
//! ```

mod accumulator;
mod constants;
mod error;
mod frame;
mod sequence;
mod types;

pub use accumulator::*;
pub use constants::*;
pub use error::*;
pub use frame::*;
pub use sequence::*;
pub use types::*;
