//! # Signal Relay: threaded parameter update pipeline
//!
//! A producer thread generates random parameter updates and a consumer
//! thread decodes them and forwards them to a single observer. The two
//! workers never talk to each other directly; everything flows through a
//! shared channel.
//!
//! ## Architecture
//!
//! ```text
//! [Producer] ──► [Channel] ──► [Consumer] ──► [ObservableNotifier] ──► [Observer]
//!  thread         FIFO          thread          mailbox hop            owner thread
//! ```
//!
//! - **Producer**: Encodes a random `(name, value)` pair every interval
//! - **Channel**: Unbounded crossbeam FIFO with an explicit close
//! - **Consumer**: Decodes, validates and forwards updates; drops bad input
//! - **Notifier**: Serializes delivery onto the observer's thread in order
//! - **Table**: The observer-side model of the latest value per parameter
//!
//! ## Configuration
//!
//! The binary reads `relay.toml` from the platform config directory
//! (see [`config`]). Only the producer interval and logging are
//! configurable.
//!
//! ## Example
//!
//! ```ignore
//! use signal_relay::{ParameterTable, Relay, RelayConfig};
//!
//! fn main() -> signal_relay::Result<()> {
//!     let (relay, mailbox) = Relay::new(RelayConfig::default())?;
//!     mailbox.bind(ParameterTable::new());
//!
//!     let running = relay.start()?;
//!     mailbox.run_until(&running.shutdown_handle());
//!     running.shutdown()?;
//!     mailbox.with_observer(|table: &ParameterTable| println!("{table}"));
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod codec;
pub mod config;
pub mod consumer;
pub mod error;
pub mod logging;
pub mod notifier;
pub mod producer;
pub mod relay;
pub mod shutdown;
pub mod table;
pub mod types;

// Re-export commonly used types
pub use channel::Channel;
pub use codec::{decode, decode_update, encode, encode_update, EncodedMessage};
pub use config::RelayConfig;
pub use consumer::{Consumer, ConsumerReport, ConsumerStatsSnapshot};
pub use error::{RelayError, Result};
pub use notifier::{ObservableNotifier, Observer, ObserverMailbox};
pub use producer::{Producer, ProducerReport};
pub use relay::{Relay, RelayReport, RunningRelay};
pub use shutdown::{ExitReason, ShutdownSignal};
pub use table::ParameterTable;
pub use types::{ParameterName, ParameterValue, Update};
