//! Transmit loop.
//!
//! Sends one packet of the role's outbound type per interval, fire-and-forget.
//! The sequence counter belongs to the loop; nothing else increments it.

use std::sync::Arc;
use std::time::Duration;

use edgelink_packet::{payload_tag, Packet, SequenceCounter};
use tracing::{debug, error, info};

use crate::channel::Channel;
use crate::error::ChannelError;
use crate::role::Role;
use crate::shutdown::Shutdown;
use crate::stats::LinkStats;

/// State of a role's transmit loop.
pub struct TransmitLoop {
    role: Role,
    channel: Arc<dyn Channel>,
    interval: Duration,
    sequence: SequenceCounter,
    stats: Arc<LinkStats>,
    shutdown: Shutdown,
}

impl TransmitLoop {
    /// Create a transmit loop starting at sequence 0.
    pub fn new(
        role: Role,
        channel: Arc<dyn Channel>,
        interval: Duration,
        stats: Arc<LinkStats>,
        shutdown: Shutdown,
    ) -> Self {
        TransmitLoop {
            role,
            channel,
            interval,
            sequence: SequenceCounter::new(),
            stats,
            shutdown,
        }
    }

    /// Sequence number the next packet will carry.
    pub fn next_sequence(&self) -> u8 {
        self.sequence.peek()
    }

    /// Build, write and log one packet stamped with `unix_millis`.
    ///
    /// The sequence advances only when the write succeeds.
    pub fn send_next(&mut self, unix_millis: i64) -> Result<Packet, ChannelError> {
        let packet = Packet::new(
            self.role.outbound_type(),
            self.sequence.peek(),
            payload_tag(self.role.payload_prefix(), unix_millis),
        );
        let frame = packet.encode();
        self.channel.write_frame(&frame)?;
        self.sequence.next();

        self.stats.record_sent(packet.packet_type, frame.len());
        info!(
            "[{}] Sent {} seq={} payload={}",
            self.role.tag(),
            packet.packet_type,
            packet.sequence,
            packet.payload_str()
        );
        Ok(packet)
    }

    /// Run until shutdown or a channel error.
    pub fn run(mut self) -> Result<(), ChannelError> {
        while !self.shutdown.is_triggered() {
            let now = chrono::Utc::now().timestamp_millis();
            if let Err(e) = self.send_next(now) {
                if self.shutdown.is_triggered() {
                    debug!("[{}] Transmit stopped during shutdown: {}", self.role.tag(), e);
                    break;
                }
                error!(
                    "[{}] Transmit on {} failed: {}",
                    self.role.tag(),
                    self.channel.describe(),
                    e
                );
                self.stats.record_channel_error("tx");
                return Err(e);
            }
            if self.shutdown.wait(self.interval) {
                break;
            }
        }
        Ok(())
    }
}
