//! Producer worker thread
//!
//! The producer synthesizes a random [`Update`] every interval, encodes it
//! and pushes it onto the shared [`Channel`]. It never talks to the
//! consumer directly.
//!
//! # Lifecycle
//!
//! The loop runs until one of two things happens:
//!
//! - the [`ShutdownSignal`] is triggered (checked between cycles, and the
//!   interval sleep wakes up early on trigger)
//! - a push fails because the channel was closed
//!
//! Either way the thread returns a [`ProducerReport`] instead of being
//! killed.

use crate::channel::Channel;
use crate::codec;
use crate::error::{RelayError, Result};
use crate::shutdown::{ExitReason, ShutdownSignal};
use crate::types::Update;
use rand::Rng;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Default delay between two generated updates
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

/// Summary returned when the producer thread ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProducerReport {
    /// Number of updates pushed onto the channel
    pub sent: u64,
    pub exit: ExitReason,
}

/// Periodic generator of random parameter updates
pub struct Producer {
    channel: Arc<Channel>,
    interval: Duration,
    shutdown: ShutdownSignal,
}

impl Producer {
    /// Create a producer pushing onto `channel` every `interval`
    pub fn new(channel: Arc<Channel>, interval: Duration) -> Self {
        Self {
            channel,
            interval,
            shutdown: ShutdownSignal::new(),
        }
    }

    /// Share a shutdown signal with the rest of the relay
    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Handle that stops this producer when triggered
    pub fn shutdown_handle(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Pick a uniformly random name and value
    pub fn generate_update<R: Rng + ?Sized>(rng: &mut R) -> Update {
        Update::new(rng.random(), rng.random())
    }

    /// Run the producer loop on the current thread
    pub fn run(self) -> ProducerReport {
        self.run_with_rng(rand::rng())
    }

    /// Run the producer loop with a caller-supplied random source
    pub fn run_with_rng<R: Rng>(self, mut rng: R) -> ProducerReport {
        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            "Producer started"
        );

        let mut sent = 0u64;
        let exit = loop {
            if self.shutdown.is_triggered() {
                break ExitReason::Cancelled;
            }

            let update = Self::generate_update(&mut rng);
            tracing::debug!(name = %update.name, value = %update.value, "Send param");

            match self.channel.push(codec::encode_update(&update)) {
                Ok(()) => sent += 1,
                Err(e) if e.is_fatal() => {
                    tracing::warn!("Producer stopping: {}", e);
                    break ExitReason::ChannelClosed;
                }
                Err(e) => tracing::warn!(%update, "Push failed: {}", e),
            }

            if self.shutdown.wait_timeout(self.interval) {
                break ExitReason::Cancelled;
            }
        };

        tracing::info!(sent, ?exit, "Producer stopped");
        ProducerReport { sent, exit }
    }

    /// Spawn the producer loop on a dedicated thread
    pub fn spawn(self) -> Result<JoinHandle<ProducerReport>> {
        thread::Builder::new()
            .name("relay-producer".to_string())
            .spawn(move || self.run())
            .map_err(|e| RelayError::Worker(format!("Failed to spawn producer: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_update;
    use crate::types::{ParameterName, ParameterValue};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generate_update_covers_all_names() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts = [0usize; 3];
        for _ in 0..3000 {
            let update = Producer::generate_update(&mut rng);
            assert!(update.value.get() < ParameterValue::MAX_EXCLUSIVE);
            counts[update.name.index()] += 1;
        }
        // Uniform over three names: each should be near 1000
        for count in counts {
            assert!(count > 800, "skewed name distribution: {:?}", counts);
        }
    }

    #[test]
    fn test_run_on_closed_channel_exits() {
        let channel = Arc::new(Channel::new());
        channel.close();

        let report = Producer::new(channel, Duration::from_millis(10)).run();
        assert_eq!(
            report,
            ProducerReport {
                sent: 0,
                exit: ExitReason::ChannelClosed
            }
        );
    }

    #[test]
    fn test_cancelled_before_start_sends_nothing() {
        let channel = Arc::new(Channel::new());
        let shutdown = ShutdownSignal::new();
        shutdown.trigger();

        let report = Producer::new(channel.clone(), Duration::from_millis(10))
            .with_shutdown(shutdown)
            .run();
        assert_eq!(report.exit, ExitReason::Cancelled);
        assert_eq!(report.sent, 0);
        assert!(channel.is_empty());
    }

    #[test]
    fn test_spawned_producer_fills_channel() {
        let channel = Arc::new(Channel::new());
        let producer = Producer::new(channel.clone(), Duration::from_millis(5));
        let shutdown = producer.shutdown_handle();
        let handle = producer.spawn().unwrap();

        thread::sleep(Duration::from_millis(100));
        shutdown.trigger();
        let report = handle.join().unwrap();

        assert_eq!(report.exit, ExitReason::Cancelled);
        assert!(report.sent > 0);

        let messages = channel.drain();
        assert_eq!(messages.len() as u64, report.sent);
        for msg in messages {
            let update = decode_update(&msg).unwrap();
            assert!(ParameterName::ALL.contains(&update.name));
        }
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let first = Arc::new(Channel::new());
        let second = Arc::new(Channel::new());

        for channel in [&first, &second] {
            let producer = Producer::new(channel.clone(), Duration::from_millis(1));
            let shutdown = producer.shutdown_handle();
            let channel = channel.clone();
            let handle = thread::spawn(move || producer.run_with_rng(StdRng::seed_from_u64(9)));
            while channel.len() < 5 {
                thread::sleep(Duration::from_millis(1));
            }
            shutdown.trigger();
            handle.join().unwrap();
        }

        let a: Vec<_> = first.drain().into_iter().take(5).collect();
        let b: Vec<_> = second.drain().into_iter().take(5).collect();
        assert_eq!(a, b);
    }
}
