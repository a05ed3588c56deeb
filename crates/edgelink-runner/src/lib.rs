//! Edge and controller nodes for the framed serial link.
//!
//! Each node runs two threads over one shared [`Channel`]:
//!
//! - a **transmit loop** sending the role's outbound packet on a fixed cadence
//!   (edge: `DATA` every 80 ms, controller: `REQ` every 20 ms)
//! - a **receive loop** reassembling frames byte by byte and dispatching them
//!   (the edge answers every `REQ` with an `ACK`; the controller logs `ACK`s)
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use edgelink_runner::{LinkConfig, LinkNode, Role, SerialChannel};
//!
//! let config = LinkConfig::for_role(Role::Edge);
//! let channel = SerialChannel::open(&config)?;
//! let node = LinkNode::spawn(&config, Arc::new(channel))?;
//! node.join()?;
//! # Ok::<(), edgelink_runner::LinkError>(())
//! ```

pub mod channel;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod node;
pub mod receive;
pub mod role;
pub mod serial;
pub mod shutdown;
pub mod stats;
pub mod transmit;

pub use channel::{Channel, LoopbackChannel};
pub use config::LinkConfig;
pub use dispatch::{dispatch, Disposition};
pub use error::{ChannelError, ConfigError, LinkError, LinkResult};
pub use node::{spawn_loopback_pair, LinkNode};
pub use receive::{ReceiveLoop, RxStep};
pub use role::Role;
pub use serial::{list_ports, SerialChannel};
pub use shutdown::Shutdown;
pub use stats::{LinkStats, LinkStatsSnapshot};
pub use transmit::TransmitLoop;
