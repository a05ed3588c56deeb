//! Byte channel abstraction.
//!
//! Both loops of a node share one [`Channel`]. The transmit loop and the edge's
//! ACK reply may write concurrently, so every implementation writes a whole
//! frame under one lock; the bytes of two frames never interleave.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use parking_lot::Mutex;

use crate::error::ChannelError;

/// A full-duplex byte stream.
pub trait Channel: Send + Sync {
    /// Write one complete frame. Frames from concurrent writers are serialised.
    fn write_frame(&self, frame: &[u8]) -> Result<(), ChannelError>;

    /// Number of bytes that can be read without waiting.
    fn bytes_available(&self) -> Result<usize, ChannelError>;

    /// Read up to `buf.len()` bytes. Returns 0 when nothing arrived before the
    /// channel's read timeout.
    fn read(&self, buf: &mut [u8]) -> Result<usize, ChannelError>;

    /// Human-readable name (port name, "loopback", ...).
    fn describe(&self) -> String;
}

// ============================================================================
// Loopback
// ============================================================================

/// One end of an in-memory full-duplex byte pipe.
///
/// Created in pairs by [`LoopbackChannel::pair`]; whatever one end writes the
/// other end reads. Dropping an end closes the pipe: the peer can still drain
/// bytes already in flight and then gets [`ChannelError::Closed`].
pub struct LoopbackChannel {
    name: String,
    tx: Mutex<Sender<u8>>,
    rx: Receiver<u8>,
    /// Set when this end is dropped.
    closed: Arc<AtomicBool>,
    /// Set when the peer is dropped.
    peer_closed: Arc<AtomicBool>,
}

impl LoopbackChannel {
    /// Create a connected pair of loopback ends.
    pub fn pair() -> (LoopbackChannel, LoopbackChannel) {
        Self::named_pair("loopback-a", "loopback-b")
    }

    /// Create a connected pair with the given names.
    pub fn named_pair(a: &str, b: &str) -> (LoopbackChannel, LoopbackChannel) {
        let (a_tx, b_rx) = crossbeam_channel::unbounded();
        let (b_tx, a_rx) = crossbeam_channel::unbounded();
        let a_closed = Arc::new(AtomicBool::new(false));
        let b_closed = Arc::new(AtomicBool::new(false));

        let end_a = LoopbackChannel {
            name: a.to_string(),
            tx: Mutex::new(a_tx),
            rx: a_rx,
            closed: Arc::clone(&a_closed),
            peer_closed: Arc::clone(&b_closed),
        };
        let end_b = LoopbackChannel {
            name: b.to_string(),
            tx: Mutex::new(b_tx),
            rx: b_rx,
            closed: b_closed,
            peer_closed: a_closed,
        };
        (end_a, end_b)
    }

    fn peer_gone(&self) -> bool {
        self.peer_closed.load(Ordering::SeqCst)
    }
}

impl Channel for LoopbackChannel {
    fn write_frame(&self, frame: &[u8]) -> Result<(), ChannelError> {
        if self.peer_gone() {
            return Err(ChannelError::Closed);
        }
        let tx = self.tx.lock();
        for &byte in frame {
            tx.send(byte).map_err(|_| ChannelError::Closed)?;
        }
        Ok(())
    }

    fn bytes_available(&self) -> Result<usize, ChannelError> {
        let available = self.rx.len();
        if available == 0 && self.peer_gone() {
            return Err(ChannelError::Closed);
        }
        Ok(available)
    }

    fn read(&self, buf: &mut [u8]) -> Result<usize, ChannelError> {
        let mut count = 0;
        while count < buf.len() {
            match self.rx.try_recv() {
                Ok(byte) => {
                    buf[count] = byte;
                    count += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if count == 0 {
                        return Err(ChannelError::Closed);
                    }
                    break;
                }
            }
        }
        if count == 0 && self.peer_gone() {
            return Err(ChannelError::Closed);
        }
        Ok(count)
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

impl Drop for LoopbackChannel {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for LoopbackChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopbackChannel")
            .field("name", &self.name)
            .field("pending", &self.rx.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_loopback_bidirectional() {
        let (a, b) = LoopbackChannel::pair();

        a.write_frame(&[1, 2, 3]).unwrap();
        b.write_frame(&[4, 5]).unwrap();

        assert_eq!(b.bytes_available().unwrap(), 3);
        let mut buf = [0u8; 8];
        assert_eq!(b.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);

        assert_eq!(a.bytes_available().unwrap(), 2);
        assert_eq!(a.read(&mut buf[..1]).unwrap(), 1);
        assert_eq!(buf[0], 4);
        assert_eq!(a.read(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], 5);
    }

    #[test]
    fn test_loopback_empty_read() {
        let (a, _b) = LoopbackChannel::pair();
        let mut buf = [0u8; 4];
        assert_eq!(a.bytes_available().unwrap(), 0);
        assert_eq!(a.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_loopback_close_drains_then_errors() {
        let (a, b) = LoopbackChannel::pair();
        a.write_frame(&[9, 9]).unwrap();
        drop(a);

        let mut buf = [0u8; 4];
        assert_eq!(b.bytes_available().unwrap(), 2);
        assert_eq!(b.read(&mut buf).unwrap(), 2);
        assert!(matches!(b.bytes_available(), Err(ChannelError::Closed)));
        assert!(matches!(b.read(&mut buf), Err(ChannelError::Closed)));
        assert!(matches!(b.write_frame(&[1]), Err(ChannelError::Closed)));
    }

    #[test]
    fn test_concurrent_frames_do_not_interleave() {
        let (a, b) = LoopbackChannel::pair();
        let a = Arc::new(a);

        let writers: Vec<_> = [0x11u8, 0x22u8]
            .into_iter()
            .map(|fill| {
                let a = Arc::clone(&a);
                thread::spawn(move || {
                    for _ in 0..200 {
                        a.write_frame(&[fill; 16]).unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let mut stream = vec![0u8; 2 * 200 * 16];
        assert_eq!(b.read(&mut stream).unwrap(), stream.len());
        for frame in stream.chunks(16) {
            assert!(frame.iter().all(|&byte| byte == frame[0]));
        }
    }

    #[test]
    fn test_describe() {
        let (a, b) = LoopbackChannel::named_pair("edge", "controller");
        assert_eq!(a.describe(), "edge");
        assert_eq!(b.describe(), "controller");
    }
}
