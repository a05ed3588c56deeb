//! Per-node link counters.
//!
//! Counters are kept locally as atomics (readable from tests and the final
//! summary) and mirrored to the `metrics` facade.

use std::sync::atomic::{AtomicU64, Ordering};

use edgelink_metrics::{metric_defs, MetricLabels};
use edgelink_packet::PacketType;

/// Counters shared by a node's transmit and receive loops.
#[derive(Debug)]
pub struct LinkStats {
    labels: MetricLabels,
    frames_sent: AtomicU64,
    bytes_sent: AtomicU64,
    acks_sent: AtomicU64,
    frames_received: AtomicU64,
    frames_dispatched: AtomicU64,
    frames_ignored: AtomicU64,
    discarded_bytes: AtomicU64,
    dropped_frames: AtomicU64,
    channel_errors: AtomicU64,
}

/// Point-in-time copy of [`LinkStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStatsSnapshot {
    /// Frames written, including ACK replies.
    pub frames_sent: u64,
    /// Bytes written.
    pub bytes_sent: u64,
    /// ACK replies written.
    pub acks_sent: u64,
    /// Well-formed frames decoded.
    pub frames_received: u64,
    /// Decoded frames the role acted on.
    pub frames_dispatched: u64,
    /// Decoded frames of a type the role does not handle.
    pub frames_ignored: u64,
    /// Bytes discarded while hunting for a marker or resynchronising.
    pub discarded_bytes: u64,
    /// Candidate frames abandoned at the maximum frame length.
    pub dropped_frames: u64,
    /// Channel I/O failures.
    pub channel_errors: u64,
}

impl std::fmt::Display for LinkStatsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "sent={} (acks={}, {} bytes) received={} dispatched={} ignored={} discarded_bytes={} dropped_frames={} channel_errors={}",
            self.frames_sent,
            self.acks_sent,
            self.bytes_sent,
            self.frames_received,
            self.frames_dispatched,
            self.frames_ignored,
            self.discarded_bytes,
            self.dropped_frames,
            self.channel_errors
        )
    }
}

impl LinkStats {
    /// Create zeroed counters labelled for `role` on `port`.
    pub fn new(role: &str, port: &str) -> Self {
        LinkStats {
            labels: MetricLabels::new(role, port),
            frames_sent: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            acks_sent: AtomicU64::new(0),
            frames_received: AtomicU64::new(0),
            frames_dispatched: AtomicU64::new(0),
            frames_ignored: AtomicU64::new(0),
            discarded_bytes: AtomicU64::new(0),
            dropped_frames: AtomicU64::new(0),
            channel_errors: AtomicU64::new(0),
        }
    }

    /// Metric labels for this node.
    pub fn labels(&self) -> &MetricLabels {
        &self.labels
    }

    /// A frame of `len` bytes was written.
    pub fn record_sent(&self, packet_type: PacketType, len: usize) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(len as u64, Ordering::Relaxed);
        metrics::counter!(
            metric_defs::LINK_TX_FRAMES.name,
            &self.labels.with_packet_type(packet_type.name())
        )
        .increment(1);
        metrics::counter!(metric_defs::LINK_TX_BYTES.name, &self.labels.to_labels())
            .increment(len as u64);
        if packet_type == PacketType::Ack {
            self.acks_sent.fetch_add(1, Ordering::Relaxed);
            metrics::counter!(metric_defs::LINK_ACKS_SENT.name, &self.labels.to_labels())
                .increment(1);
        }
    }

    /// A well-formed frame of `len` bytes was decoded.
    pub fn record_received(&self, packet_type: PacketType, len: usize) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(
            metric_defs::LINK_RX_FRAMES.name,
            &self.labels.with_packet_type(packet_type.name())
        )
        .increment(1);
        metrics::histogram!(metric_defs::LINK_RX_FRAME_SIZE.name, &self.labels.to_labels())
            .record(len as f64);
    }

    /// A decoded frame was acted on.
    pub fn record_dispatched(&self) {
        self.frames_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// A decoded frame was ignored.
    pub fn record_ignored(&self, packet_type: PacketType) {
        self.frames_ignored.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(
            metric_defs::LINK_RX_IGNORED.name,
            &self.labels.with_packet_type(packet_type.name())
        )
        .increment(1);
    }

    /// `count` bytes were discarded by the accumulator.
    pub fn record_discarded(&self, count: u64) {
        if count == 0 {
            return;
        }
        self.discarded_bytes.fetch_add(count, Ordering::Relaxed);
        metrics::counter!(metric_defs::LINK_RX_DISCARDED_BYTES.name, &self.labels.to_labels())
            .increment(count);
    }

    /// `count` candidate frames were abandoned by the accumulator.
    pub fn record_dropped(&self, count: u64) {
        if count == 0 {
            return;
        }
        self.dropped_frames.fetch_add(count, Ordering::Relaxed);
        metrics::counter!(metric_defs::LINK_RX_DROPPED_FRAMES.name, &self.labels.to_labels())
            .increment(count);
    }

    /// Current size of the receive buffer.
    pub fn set_buffered(&self, len: usize) {
        metrics::gauge!(metric_defs::LINK_RX_BUFFERED.name, &self.labels.to_labels())
            .set(len as f64);
    }

    /// A channel operation failed in `direction` ("tx" or "rx").
    pub fn record_channel_error(&self, direction: &'static str) {
        self.channel_errors.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(
            metric_defs::CHANNEL_ERRORS.name,
            &self.labels.with(&[("direction", direction.to_string())])
        )
        .increment(1);
    }

    /// Copy the current counter values.
    pub fn snapshot(&self) -> LinkStatsSnapshot {
        LinkStatsSnapshot {
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            acks_sent: self.acks_sent.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_dispatched: self.frames_dispatched.load(Ordering::Relaxed),
            frames_ignored: self.frames_ignored.load(Ordering::Relaxed),
            discarded_bytes: self.discarded_bytes.load(Ordering::Relaxed),
            dropped_frames: self.dropped_frames.load(Ordering::Relaxed),
            channel_errors: self.channel_errors.load(Ordering::Relaxed),
        }
    }
}
