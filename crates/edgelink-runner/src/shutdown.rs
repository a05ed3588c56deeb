//! Cooperative shutdown signal shared by a node's loops.
//!
//! Both loops sleep through [`Shutdown::wait`], which returns early as soon as
//! shutdown is triggered. Triggering drops the only sender of an internal
//! channel, so every waiting receiver wakes at once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;

struct ShutdownState {
    triggered: AtomicBool,
    trigger: Mutex<Option<Sender<()>>>,
}

/// Cloneable cancellation signal.
#[derive(Clone)]
pub struct Shutdown {
    state: Arc<ShutdownState>,
    wake: Receiver<()>,
}

impl Shutdown {
    /// Create an untriggered signal.
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::bounded(0);
        Shutdown {
            state: Arc::new(ShutdownState {
                triggered: AtomicBool::new(false),
                trigger: Mutex::new(Some(tx)),
            }),
            wake: rx,
        }
    }

    /// Signal shutdown. Idempotent.
    pub fn trigger(&self) {
        self.state.triggered.store(true, Ordering::SeqCst);
        self.state.trigger.lock().take();
    }

    /// Check whether shutdown has been signalled.
    pub fn is_triggered(&self) -> bool {
        self.state.triggered.load(Ordering::SeqCst)
    }

    /// Sleep for `timeout` or until shutdown is signalled.
    ///
    /// Returns `true` if shutdown was signalled.
    pub fn wait(&self, timeout: Duration) -> bool {
        if self.is_triggered() {
            return true;
        }
        match self.wake.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => self.is_triggered(),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Shutdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shutdown")
            .field("triggered", &self.is_triggered())
            .finish()
    }
}
