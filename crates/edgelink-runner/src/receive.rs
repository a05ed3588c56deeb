//! Receive loop.
//!
//! Polls the channel, reads one byte at a time into a [`FrameAccumulator`] and
//! dispatches every completed frame. When no bytes are available the loop
//! sleeps for the poll interval. Channel errors end the loop; malformed frames
//! never do.

use std::sync::Arc;
use std::time::Duration;

use edgelink_packet::{FrameAccumulator, Packet, PacketType};
use tracing::{debug, error, trace, warn};

use crate::channel::Channel;
use crate::dispatch::{dispatch, Disposition};
use crate::error::ChannelError;
use crate::role::Role;
use crate::shutdown::Shutdown;
use crate::stats::LinkStats;

/// Result of one receive iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxStep {
    /// No bytes were available.
    Idle,
    /// A byte was consumed without completing a frame.
    Accumulating,
    /// A byte completed a frame, which was dispatched.
    Frame {
        /// Type of the decoded packet.
        packet_type: PacketType,
        /// Sequence number of the decoded packet.
        sequence: u8,
        /// What the role did with it.
        disposition: Disposition,
    },
}

/// State of a role's receive loop.
pub struct ReceiveLoop {
    role: Role,
    channel: Arc<dyn Channel>,
    accumulator: FrameAccumulator,
    poll_interval: Duration,
    stats: Arc<LinkStats>,
    shutdown: Shutdown,
}

impl ReceiveLoop {
    /// Create a receive loop.
    pub fn new(
        role: Role,
        channel: Arc<dyn Channel>,
        max_frame_len: usize,
        poll_interval: Duration,
        stats: Arc<LinkStats>,
        shutdown: Shutdown,
    ) -> Self {
        ReceiveLoop {
            role,
            channel,
            accumulator: FrameAccumulator::with_max_frame_len(max_frame_len),
            poll_interval,
            stats,
            shutdown,
        }
    }

    /// Bytes currently held in the accumulation buffer.
    pub fn buffered_len(&self) -> usize {
        self.accumulator.buffered_len()
    }

    /// Run one iteration without sleeping.
    ///
    /// Packets already queued by the accumulator are delivered before any new
    /// byte is read.
    pub fn step(&mut self) -> Result<RxStep, ChannelError> {
        if let Some(packet) = self.accumulator.pop_ready() {
            return self.deliver(packet);
        }

        if self.channel.bytes_available()? == 0 {
            return Ok(RxStep::Idle);
        }

        let mut byte = [0u8; 1];
        if self.channel.read(&mut byte)? == 0 {
            return Ok(RxStep::Idle);
        }
        trace!("[{}] rx byte {}", self.role.tag(), hex::encode(byte));

        let discarded_before = self.accumulator.discarded_bytes();
        let dropped_before = self.accumulator.dropped_frames();

        let packet = self.accumulator.push(byte[0]);

        let dropped = self.accumulator.dropped_frames() - dropped_before;
        if dropped > 0 {
            warn!(
                "[{}] Abandoned unterminated frame at {} bytes, resynchronising",
                self.role.tag(),
                self.accumulator.max_frame_len()
            );
        }
        self.stats.record_dropped(dropped);
        self.stats
            .record_discarded(self.accumulator.discarded_bytes() - discarded_before);
        self.stats.set_buffered(self.accumulator.buffered_len());

        match packet {
            Some(packet) => self.deliver(packet),
            None => Ok(RxStep::Accumulating),
        }
    }

    fn deliver(&mut self, packet: Packet) -> Result<RxStep, ChannelError> {
        self.stats.record_received(packet.packet_type, packet.frame_len());
        let disposition = dispatch(self.role, &packet, self.channel.as_ref(), &self.stats)?;

        Ok(RxStep::Frame {
            packet_type: packet.packet_type,
            sequence: packet.sequence,
            disposition,
        })
    }

    /// Run until shutdown or a channel error.
    pub fn run(mut self) -> Result<(), ChannelError> {
        while !self.shutdown.is_triggered() {
            match self.step() {
                Ok(RxStep::Idle) => {
                    if self.shutdown.wait(self.poll_interval) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(e) if self.shutdown.is_triggered() => {
                    debug!("[{}] Receive stopped during shutdown: {}", self.role.tag(), e);
                    break;
                }
                Err(e) => {
                    error!(
                        "[{}] Receive on {} failed: {}",
                        self.role.tag(),
                        self.channel.describe(),
                        e
                    );
                    self.stats.record_channel_error("rx");
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}
