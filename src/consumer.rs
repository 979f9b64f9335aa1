//! Consumer worker thread
//!
//! The consumer blocks on the [`Channel`] until a message arrives, decodes
//! it, validates it against the parameter domain and hands it to the
//! [`ObservableNotifier`]. Bad messages are dropped and logged; they never
//! reach the observer and never stop the loop.
//!
//! # Statistics
//!
//! Counters live in a shared [`ConsumerStats`] so they can be read while
//! the thread is running, and a final snapshot is returned in the
//! [`ConsumerReport`].

use crate::channel::Channel;
use crate::codec::{self, EncodedMessage};
use crate::error::{RelayError, Result};
use crate::notifier::ObservableNotifier;
use crate::shutdown::{ExitReason, ShutdownSignal};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Longest time the consumer waits on an empty channel before rechecking
/// the shutdown signal
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Live counters of a running consumer
#[derive(Debug, Default)]
pub struct ConsumerStats {
    received: AtomicU64,
    delivered: AtomicU64,
    malformed: AtomicU64,
    unknown: AtomicU64,
    unobserved: AtomicU64,
}

/// Point-in-time copy of [`ConsumerStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStatsSnapshot {
    /// Messages taken from the channel
    pub received: u64,
    /// Updates handed to the notifier with an observer bound
    pub delivered: u64,
    /// Messages dropped because they could not be decoded
    pub malformed: u64,
    /// Messages dropped because of an unknown parameter name
    pub unknown: u64,
    /// Valid updates dropped because no observer was bound
    pub unobserved: u64,
}

impl ConsumerStatsSnapshot {
    /// Total messages that never reached the observer
    pub fn dropped(&self) -> u64 {
        self.malformed + self.unknown + self.unobserved
    }
}

impl ConsumerStats {
    pub fn snapshot(&self) -> ConsumerStatsSnapshot {
        ConsumerStatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            unknown: self.unknown.load(Ordering::Relaxed),
            unobserved: self.unobserved.load(Ordering::Relaxed),
        }
    }
}

/// Summary returned when the consumer thread ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumerReport {
    pub stats: ConsumerStatsSnapshot,
    pub exit: ExitReason,
}

/// Drains the channel and forwards valid updates to the notifier
pub struct Consumer {
    channel: Arc<Channel>,
    notifier: ObservableNotifier,
    shutdown: ShutdownSignal,
    stats: Arc<ConsumerStats>,
}

impl Consumer {
    pub fn new(channel: Arc<Channel>, notifier: ObservableNotifier) -> Self {
        Self {
            channel,
            notifier,
            shutdown: ShutdownSignal::new(),
            stats: Arc::new(ConsumerStats::default()),
        }
    }

    /// Share a shutdown signal with the rest of the relay
    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Handle that stops this consumer when triggered
    pub fn shutdown_handle(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Shared counters, readable while the consumer runs
    pub fn stats(&self) -> Arc<ConsumerStats> {
        self.stats.clone()
    }

    /// Run the consumer loop on the current thread
    pub fn run(self) -> ConsumerReport {
        tracing::info!("Consumer started");

        let exit = loop {
            if self.shutdown.is_triggered() {
                break ExitReason::Cancelled;
            }

            match self.channel.pop_timeout(SHUTDOWN_POLL_INTERVAL) {
                Ok(Some(msg)) => self.handle_message(&msg),
                Ok(None) => continue,
                Err(e) if e.is_fatal() => {
                    tracing::info!("Consumer stopping: {}", e);
                    break ExitReason::ChannelClosed;
                }
                Err(e) => tracing::warn!("Consumer receive failed: {}", e),
            }
        };

        let stats = self.stats.snapshot();
        tracing::info!(
            received = stats.received,
            delivered = stats.delivered,
            dropped = stats.dropped(),
            ?exit,
            "Consumer stopped"
        );
        ConsumerReport { stats, exit }
    }

    /// Spawn the consumer loop on a dedicated thread
    pub fn spawn(self) -> Result<JoinHandle<ConsumerReport>> {
        thread::Builder::new()
            .name("relay-consumer".to_string())
            .spawn(move || self.run())
            .map_err(|e| RelayError::Worker(format!("Failed to spawn consumer: {}", e)))
    }

    fn handle_message(&self, msg: &EncodedMessage) {
        self.stats.received.fetch_add(1, Ordering::Relaxed);

        match codec::decode_update(msg) {
            Ok(update) => {
                tracing::debug!(name = %update.name, value = %update.value, "Receive param");
                if self.notifier.notify(update) {
                    self.stats.delivered.fetch_add(1, Ordering::Relaxed);
                } else {
                    self.stats.unobserved.fetch_add(1, Ordering::Relaxed);
                }
            }
            Err(RelayError::UnknownParameter(name)) => {
                tracing::warn!(raw = %msg, "Dropping update for unknown parameter {:?}", name);
                self.stats.unknown.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::warn!(raw = %msg, "Dropping message: {}", e);
                self.stats.malformed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}
