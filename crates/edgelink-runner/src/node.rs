//! Node lifecycle.
//!
//! A [`LinkNode`] owns the two threads of one role: the periodic transmit loop
//! and the receive loop. Both share the node's channel, statistics and
//! [`Shutdown`] signal. If either loop fails the signal is triggered and the
//! other loop exits at its next wait.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info};

use crate::channel::{Channel, LoopbackChannel};
use crate::config::LinkConfig;
use crate::error::{ChannelError, LinkError, LinkResult};
use crate::receive::ReceiveLoop;
use crate::role::Role;
use crate::shutdown::Shutdown;
use crate::stats::LinkStats;
use crate::transmit::TransmitLoop;

type LoopHandle = JoinHandle<Result<(), ChannelError>>;

/// Handle to a running node.
///
/// Dropping the handle signals shutdown but does not wait for the threads;
/// call [`LinkNode::join`] for that.
pub struct LinkNode {
    role: Role,
    stats: Arc<LinkStats>,
    shutdown: Shutdown,
    threads: Vec<(String, LoopHandle)>,
}

impl LinkNode {
    /// Start the loops for `config.role` on `channel`.
    pub fn spawn(config: &LinkConfig, channel: Arc<dyn Channel>) -> LinkResult<Self> {
        Self::spawn_with_shutdown(config, channel, Shutdown::new())
    }

    /// Start the loops with an externally owned shutdown signal.
    pub fn spawn_with_shutdown(
        config: &LinkConfig,
        channel: Arc<dyn Channel>,
        shutdown: Shutdown,
    ) -> LinkResult<Self> {
        config.validate()?;

        let role = config.role;
        let stats = Arc::new(LinkStats::new(role.as_str(), &channel.describe()));
        let mut node = LinkNode {
            role,
            stats: Arc::clone(&stats),
            shutdown: shutdown.clone(),
            threads: Vec::with_capacity(2),
        };

        let rx = ReceiveLoop::new(
            role,
            Arc::clone(&channel),
            config.max_frame_len,
            config.poll_interval(),
            Arc::clone(&stats),
            shutdown.clone(),
        );
        node.spawn_loop(format!("{}-rx", role.as_str()), move || rx.run())?;

        if config.transmit {
            let tx = TransmitLoop::new(
                role,
                Arc::clone(&channel),
                config.tx_interval(),
                stats,
                shutdown,
            );
            node.spawn_loop(format!("{}-tx", role.as_str()), move || tx.run())?;
        } else {
            debug!("[{}] Transmit loop disabled", role.tag());
        }

        info!(
            "[{}] Node started on {} (tx every {:?}, transmit={})",
            role.tag(),
            channel.describe(),
            config.tx_interval(),
            config.transmit
        );
        Ok(node)
    }

    fn spawn_loop<F>(&mut self, name: String, body: F) -> LinkResult<()>
    where
        F: FnOnce() -> Result<(), ChannelError> + Send + 'static,
    {
        let shutdown = self.shutdown.clone();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let result = body();
                if result.is_err() {
                    shutdown.trigger();
                }
                result
            })
            .map_err(|source| {
                self.shutdown.trigger();
                LinkError::Spawn {
                    name: name.clone(),
                    source,
                }
            })?;
        self.threads.push((name, handle));
        Ok(())
    }

    /// Role this node plays.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Counters shared by both loops.
    pub fn stats(&self) -> &Arc<LinkStats> {
        &self.stats
    }

    /// The node's shutdown signal.
    pub fn shutdown_signal(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Ask both loops to stop.
    pub fn shutdown(&self) {
        self.shutdown.trigger();
    }

    /// True once every loop thread has exited.
    pub fn is_finished(&self) -> bool {
        self.threads.iter().all(|(_, handle)| handle.is_finished())
    }

    /// Wait for both loops to exit.
    ///
    /// Returns the first loop error, if any. Does not itself signal shutdown.
    pub fn join(mut self) -> LinkResult<()> {
        let mut first_error = None;
        for (name, handle) in std::mem::take(&mut self.threads) {
            let outcome = match handle.join() {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(LinkError::Channel(e)),
                Err(_) => Err(LinkError::ThreadPanicked(name)),
            };
            if let Err(e) = outcome {
                first_error.get_or_insert(e);
            }
        }
        info!("[{}] Node stopped: {}", self.role.tag(), self.stats.snapshot());
        first_error.map_or(Ok(()), Err)
    }
}

impl Drop for LinkNode {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

impl std::fmt::Debug for LinkNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkNode")
            .field("role", &self.role)
            .field("threads", &self.threads.len())
            .field("shutdown", &self.shutdown)
            .finish()
    }
}

/// Run an edge and a controller against each other over an in-memory pipe.
///
/// Both nodes share one shutdown signal, so stopping either stops both.
pub fn spawn_loopback_pair(
    edge: &LinkConfig,
    controller: &LinkConfig,
) -> LinkResult<(LinkNode, LinkNode)> {
    if edge.role != Role::Edge || controller.role != Role::Controller {
        return Err(crate::error::ConfigError::Invalid(
            "loopback pair needs one edge and one controller config".into(),
        )
        .into());
    }

    let (edge_end, controller_end) = LoopbackChannel::named_pair("loopback:edge", "loopback:controller");
    let shutdown = Shutdown::new();
    let edge_node = LinkNode::spawn_with_shutdown(edge, Arc::new(edge_end), shutdown.clone())?;
    let controller_node =
        LinkNode::spawn_with_shutdown(controller, Arc::new(controller_end), shutdown)?;
    Ok((edge_node, controller_node))
}
