//! Unbounded FIFO hand-off between the producer and the consumer
//!
//! [`Channel`] wraps an unbounded crossbeam channel and adds an explicit
//! [`Channel::close`]. Closing wakes every blocked [`Channel::pop`] with
//! [`RelayError::ChannelClosed`] even though the channel itself still holds
//! a sender, which is what lets the relay stop its consumer thread without
//! killing it.
//!
//! Messages still queued at close time are not delivered. They stay
//! reachable through [`Channel::drain`] so the owner can account for them.

use crate::codec::EncodedMessage;
use crate::error::{RelayError, Result};
use crossbeam_channel::{select, unbounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Thread-safe unbounded FIFO of encoded messages
pub struct Channel {
    sender: Sender<EncodedMessage>,
    receiver: Receiver<EncodedMessage>,
    /// Dropped on close, which disconnects `close_rx`
    close_tx: Mutex<Option<Sender<()>>>,
    close_rx: Receiver<()>,
    closed: AtomicBool,
}

impl Channel {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        let (close_tx, close_rx) = unbounded();
        Self {
            sender,
            receiver,
            close_tx: Mutex::new(Some(close_tx)),
            close_rx,
            closed: AtomicBool::new(false),
        }
    }

    /// Append a message. Never blocks.
    pub fn push(&self, msg: EncodedMessage) -> Result<()> {
        if self.is_closed() {
            return Err(RelayError::ChannelClosed);
        }
        self.sender
            .send(msg)
            .map_err(|_| RelayError::ChannelClosed)
    }

    /// Block until the next message is available or the channel is closed
    pub fn pop(&self) -> Result<EncodedMessage> {
        if self.is_closed() {
            return Err(RelayError::ChannelClosed);
        }
        select! {
            recv(self.receiver) -> msg => msg.map_err(|_| RelayError::ChannelClosed),
            recv(self.close_rx) -> _ => Err(RelayError::ChannelClosed),
        }
    }

    /// Like [`Channel::pop`], but gives up after `timeout` with `Ok(None)`
    pub fn pop_timeout(&self, timeout: Duration) -> Result<Option<EncodedMessage>> {
        if self.is_closed() {
            return Err(RelayError::ChannelClosed);
        }
        select! {
            recv(self.receiver) -> msg => msg.map(Some).map_err(|_| RelayError::ChannelClosed),
            recv(self.close_rx) -> _ => Err(RelayError::ChannelClosed),
            default(timeout) => Ok(None),
        }
    }

    /// Remove and return every queued message, in order
    ///
    /// Works on a closed channel too.
    pub fn drain(&self) -> Vec<EncodedMessage> {
        self.receiver.try_iter().collect()
    }

    /// Number of queued messages
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Close the channel and wake every blocked `pop`. Idempotent.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        match self.close_tx.lock() {
            Ok(mut guard) => drop(guard.take()),
            Err(poisoned) => drop(poisoned.into_inner().take()),
        }
        tracing::debug!(pending = self.len(), "Channel closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("len", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
