//! Metrics infrastructure for the edge/controller serial link.
//!
//! This crate declares every metric the link emits as a structured [`Metric`]
//! constant. Without an installed recorder the `metrics` macros are no-ops.
//!
//! # Example
//!
//! ```rust,ignore
//! use edgelink_metrics::{MetricLabels, metric_defs, describe_metrics};
//!
//! describe_metrics();
//!
//! let labels = MetricLabels::new("edge", "COM6");
//! metrics::counter!(metric_defs::LINK_TX_FRAMES.name, &labels.with_packet_type("DATA"))
//!     .increment(1);
//! ```

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// The kind of metric (counter, gauge, or histogram).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// A monotonically increasing counter.
    Counter,
    /// A gauge that can go up and down.
    Gauge,
    /// A histogram for recording distributions.
    Histogram,
}

/// A metric declaration with its metadata.
#[derive(Debug, Clone)]
pub struct Metric {
    /// The metric name (e.g., "edgelink.link.tx_frames").
    pub name: &'static str,
    /// The kind of metric.
    pub kind: MetricKind,
    /// Human-readable description.
    pub description: &'static str,
    /// The unit of measurement.
    pub unit: Unit,
}

impl Metric {
    /// Declares a counter.
    pub const fn counter(name: &'static str, unit: Unit) -> Self {
        Self::new(name, MetricKind::Counter, unit)
    }

    /// Declares a gauge.
    pub const fn gauge(name: &'static str, unit: Unit) -> Self {
        Self::new(name, MetricKind::Gauge, unit)
    }

    /// Declares a histogram.
    pub const fn histogram(name: &'static str, unit: Unit) -> Self {
        Self::new(name, MetricKind::Histogram, unit)
    }

    const fn new(name: &'static str, kind: MetricKind, unit: Unit) -> Self {
        Self {
            name,
            kind,
            description: "",
            unit,
        }
    }

    /// Sets the description.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Registers this metric's description with the installed recorder.
    pub fn describe(&self) {
        match self.kind {
            MetricKind::Counter => describe_counter!(self.name, self.unit, self.description),
            MetricKind::Gauge => describe_gauge!(self.name, self.unit, self.description),
            MetricKind::Histogram => {
                describe_histogram!(self.name, self.unit, self.description)
            }
        }
    }
}

/// All metrics emitted by the link.
pub mod metric_defs {
    use super::{Metric, Unit};

    // ========================================================================
    // Transmit Path
    // ========================================================================

    pub const LINK_TX_FRAMES: Metric = Metric::counter("edgelink.link.tx_frames", Unit::Count)
        .with_description("Frames written to the channel");

    pub const LINK_TX_BYTES: Metric = Metric::counter("edgelink.link.tx_bytes", Unit::Bytes)
        .with_description("Bytes written to the channel");

    pub const LINK_ACKS_SENT: Metric = Metric::counter("edgelink.link.acks_sent", Unit::Count)
        .with_description("Acknowledgements sent in reply to requests");

    // ========================================================================
    // Receive Path
    // ========================================================================

    pub const LINK_RX_FRAMES: Metric = Metric::counter("edgelink.link.rx_frames", Unit::Count)
        .with_description("Well-formed frames decoded from the channel");

    pub const LINK_RX_IGNORED: Metric = Metric::counter("edgelink.link.rx_ignored", Unit::Count)
        .with_description("Well-formed frames of a type this role does not handle");

    pub const LINK_RX_DISCARDED_BYTES: Metric =
        Metric::counter("edgelink.link.rx_discarded_bytes", Unit::Bytes)
            .with_description("Bytes discarded while searching for a frame marker");

    pub const LINK_RX_DROPPED_FRAMES: Metric =
        Metric::counter("edgelink.link.rx_dropped_frames", Unit::Count)
            .with_description("Candidate frames abandoned at the maximum frame length");

    pub const LINK_RX_BUFFERED: Metric =
        Metric::gauge("edgelink.link.rx_buffered_bytes", Unit::Bytes)
            .with_description("Bytes held in the receive accumulation buffer");

    pub const LINK_RX_FRAME_SIZE: Metric =
        Metric::histogram("edgelink.link.rx_frame_size_bytes", Unit::Bytes)
            .with_description("Size of decoded frames in bytes");

    // ========================================================================
    // Channel
    // ========================================================================

    pub const CHANNEL_ERRORS: Metric = Metric::counter("edgelink.channel.errors", Unit::Count)
        .with_description("Channel I/O failures");

    /// Returns a slice of all defined metrics.
    pub const ALL: &[&Metric] = &[
        &LINK_TX_FRAMES,
        &LINK_TX_BYTES,
        &LINK_ACKS_SENT,
        &LINK_RX_FRAMES,
        &LINK_RX_IGNORED,
        &LINK_RX_DISCARDED_BYTES,
        &LINK_RX_DROPPED_FRAMES,
        &LINK_RX_BUFFERED,
        &LINK_RX_FRAME_SIZE,
        &CHANNEL_ERRORS,
    ];
}

/// Metric labels identifying a link endpoint.
///
/// ```rust
/// use edgelink_metrics::MetricLabels;
///
/// let labels = MetricLabels::new("edge", "/dev/ttyUSB0");
/// assert_eq!(labels.to_labels().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct MetricLabels {
    /// Role of the endpoint ("edge" or "controller").
    pub role: String,
    /// Channel description (serial port name or "loopback").
    pub port: String,
}

impl MetricLabels {
    /// Creates labels for the given role and port.
    pub fn new(role: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            port: port.into(),
        }
    }

    /// Converts the labels to the metrics crate label format.
    pub fn to_labels(&self) -> Vec<(&'static str, String)> {
        vec![("role", self.role.clone()), ("port", self.port.clone())]
    }

    /// Returns labels with additional key-value pairs.
    pub fn with(&self, extra: &[(&'static str, String)]) -> Vec<(&'static str, String)> {
        let mut labels = self.to_labels();
        labels.extend_from_slice(extra);
        labels
    }

    /// Returns labels with a `packet_type` entry.
    pub fn with_packet_type(&self, packet_type: &str) -> Vec<(&'static str, String)> {
        self.with(&[("packet_type", packet_type.to_string())])
    }
}

/// Describes all link metrics.
///
/// Call once at startup, after installing a recorder.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}
