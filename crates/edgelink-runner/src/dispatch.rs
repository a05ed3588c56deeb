//! What each role does with a decoded packet.
//!
//! The edge answers every REQ with an ACK carrying the same sequence number and
//! an empty payload. The controller logs every ACK. Anything else is ignored.

use edgelink_packet::{Packet, PacketType};
use tracing::{debug, info};

use crate::channel::Channel;
use crate::error::ChannelError;
use crate::role::Role;
use crate::stats::LinkStats;

/// Outcome of dispatching one packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// A request was answered with an ACK for this sequence number.
    Acknowledged(u8),
    /// An expected packet was accepted (controller receiving an ACK).
    Accepted,
    /// The packet type is not handled by this role.
    Ignored(PacketType),
}

/// Act on `packet` according to `role`.
///
/// The edge's ACK goes out through `channel`, which serialises it against the
/// transmit loop's frames.
pub fn dispatch(
    role: Role,
    packet: &Packet,
    channel: &dyn Channel,
    stats: &LinkStats,
) -> Result<Disposition, ChannelError> {
    if packet.packet_type != role.inbound_type() {
        debug!(
            "[{}] Ignoring {} seq={} ({} payload bytes)",
            role.tag(),
            packet.packet_type,
            packet.sequence,
            packet.payload.len()
        );
        stats.record_ignored(packet.packet_type);
        return Ok(Disposition::Ignored(packet.packet_type));
    }

    stats.record_dispatched();

    match role {
        Role::Edge => {
            info!(
                "[{}] Received REQ seq={} payload={}",
                role.tag(),
                packet.sequence,
                packet.payload_str()
            );
            let ack = Packet::ack(packet.sequence).encode();
            channel.write_frame(&ack)?;
            stats.record_sent(PacketType::Ack, ack.len());
            info!("[{}] Sent ACK seq={}", role.tag(), packet.sequence);
            Ok(Disposition::Acknowledged(packet.sequence))
        }
        Role::Controller => {
            info!(
                "[{}] Received ACK seq={} payload={}",
                role.tag(),
                packet.sequence,
                packet.payload_str()
            );
            Ok(Disposition::Accepted)
        }
    }
}
