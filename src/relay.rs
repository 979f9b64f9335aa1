//! System root wiring the producer and consumer together
//!
//! [`Relay`] owns the shared [`Channel`] and hands each worker an `Arc` to
//! it. The observer side gets the [`ObserverMailbox`] returned by
//! [`Relay::new`], binds its observer there and pumps it on its own thread.
//!
//! # Example
//!
//! ```ignore
//! use signal_relay::{ParameterTable, Relay, RelayConfig};
//!
//! let (relay, mailbox) = Relay::new(RelayConfig::default())?;
//! mailbox.bind(ParameterTable::new());
//!
//! let running = relay.start()?;
//! // ... pump `mailbox` on this thread ...
//! let report = running.shutdown()?;
//! mailbox.with_observer(|table: &ParameterTable| println!("{table}"));
//! ```
//!
//! # Shutdown
//!
//! [`RunningRelay::shutdown`] triggers the shared [`ShutdownSignal`],
//! closes the channel and joins both threads. Messages still queued in the
//! channel at that point are dropped and counted in
//! [`RelayReport::abandoned`].

use crate::channel::Channel;
use crate::config::RelayConfig;
use crate::consumer::{Consumer, ConsumerReport, ConsumerStats, ConsumerStatsSnapshot};
use crate::error::{RelayError, Result};
use crate::notifier::{ObservableNotifier, ObserverMailbox};
use crate::producer::{Producer, ProducerReport};
use crate::shutdown::ShutdownSignal;
use std::sync::Arc;
use std::thread::JoinHandle;

/// Final accounting of a relay run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayReport {
    pub producer: ProducerReport,
    pub consumer: ConsumerReport,
    /// Messages left in the channel at shutdown
    pub abandoned: usize,
}

/// A configured relay that has not been started yet
pub struct Relay {
    config: RelayConfig,
    channel: Arc<Channel>,
    notifier: ObservableNotifier,
    shutdown: ShutdownSignal,
}

impl Relay {
    /// Build a relay; the mailbox belongs to the calling thread
    pub fn new(config: RelayConfig) -> Result<(Self, ObserverMailbox)> {
        config.validate()?;
        let (notifier, mailbox) = ObservableNotifier::new();
        let relay = Self {
            config,
            channel: Arc::new(Channel::new()),
            notifier,
            shutdown: ShutdownSignal::new(),
        };
        Ok((relay, mailbox))
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// The shared channel
    pub fn channel(&self) -> Arc<Channel> {
        self.channel.clone()
    }

    pub fn shutdown_handle(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Spawn the consumer, then the producer
    pub fn start(self) -> Result<RunningRelay> {
        if !self.notifier.is_bound() {
            tracing::warn!("Starting relay without an observer; updates will be dropped");
        }

        let consumer = Consumer::new(self.channel.clone(), self.notifier.clone())
            .with_shutdown(self.shutdown.clone());
        let stats = consumer.stats();
        let consumer_handle = consumer.spawn()?;

        let producer = Producer::new(self.channel.clone(), self.config.producer.interval())
            .with_shutdown(self.shutdown.clone());
        let producer_handle = match producer.spawn() {
            Ok(handle) => handle,
            Err(e) => {
                self.shutdown.trigger();
                self.channel.close();
                if let Err(join_err) = join_worker("Consumer", consumer_handle) {
                    tracing::error!("{}", join_err);
                }
                return Err(e);
            }
        };

        tracing::info!(
            interval_ms = self.config.producer.interval_ms,
            "Relay started"
        );

        Ok(RunningRelay {
            channel: self.channel,
            shutdown: self.shutdown,
            stats,
            producer: producer_handle,
            consumer: consumer_handle,
        })
    }
}

/// Handle to a relay whose worker threads are running
pub struct RunningRelay {
    channel: Arc<Channel>,
    shutdown: ShutdownSignal,
    stats: Arc<ConsumerStats>,
    producer: JoinHandle<ProducerReport>,
    consumer: JoinHandle<ConsumerReport>,
}

impl RunningRelay {
    /// Current consumer counters
    pub fn stats(&self) -> ConsumerStatsSnapshot {
        self.stats.snapshot()
    }

    /// Messages waiting in the channel
    pub fn queued(&self) -> usize {
        self.channel.len()
    }

    pub fn shutdown_handle(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// True once both worker threads have returned
    pub fn is_finished(&self) -> bool {
        self.producer.is_finished() && self.consumer.is_finished()
    }

    /// Stop both workers and collect their reports
    pub fn shutdown(self) -> Result<RelayReport> {
        self.shutdown.trigger();
        self.channel.close();

        // Join both before returning either error
        let producer = join_worker("Producer", self.producer);
        let consumer = join_worker("Consumer", self.consumer);
        let (producer, consumer) = (producer?, consumer?);

        let abandoned = self.channel.drain().len();
        if abandoned > 0 {
            tracing::warn!(abandoned, "Dropped messages left in channel at shutdown");
        }

        tracing::info!(
            sent = producer.sent,
            delivered = consumer.stats.delivered,
            "Relay stopped"
        );
        Ok(RelayReport {
            producer,
            consumer,
            abandoned,
        })
    }
}

/// Join a worker thread, turning a panic into [`RelayError::Worker`]
fn join_worker<T>(name: &str, handle: JoinHandle<T>) -> Result<T> {
    handle
        .join()
        .map_err(|_| RelayError::Worker(format!("{} thread panicked", name)))
}
