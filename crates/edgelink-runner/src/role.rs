//! The two peer roles on the link.

use std::time::Duration;

use edgelink_packet::{PacketType, EDGE_DATA_PREFIX, REQUEST_PREFIX};
use serde::{Deserialize, Serialize};

/// Which end of the link this process plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Sensor side: sends DATA, answers REQ with ACK.
    Edge,
    /// Requesting side ("PC"): sends REQ, consumes ACK.
    Controller,
}

impl Role {
    /// Type of the packets this role's transmit loop sends.
    pub fn outbound_type(self) -> PacketType {
        match self {
            Role::Edge => PacketType::Data,
            Role::Controller => PacketType::Request,
        }
    }

    /// Type of the packets this role's receive loop acts on.
    pub fn inbound_type(self) -> PacketType {
        match self {
            Role::Edge => PacketType::Request,
            Role::Controller => PacketType::Ack,
        }
    }

    /// Prefix of the periodic payload tag.
    pub fn payload_prefix(self) -> &'static str {
        match self {
            Role::Edge => EDGE_DATA_PREFIX,
            Role::Controller => REQUEST_PREFIX,
        }
    }

    /// Default transmit cadence.
    pub fn default_tx_interval(self) -> Duration {
        match self {
            Role::Edge => Duration::from_millis(80),
            Role::Controller => Duration::from_millis(20),
        }
    }

    /// Default serial port.
    pub fn default_port(self) -> &'static str {
        match self {
            Role::Edge => "COM6",
            Role::Controller => "COM5",
        }
    }

    /// Tag used in log lines.
    pub fn tag(self) -> &'static str {
        match self {
            Role::Edge => "EDGE",
            Role::Controller => "PC",
        }
    }

    /// Lowercase name, used for thread names and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Edge => "edge",
            Role::Controller => "controller",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
