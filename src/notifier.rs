//! Cross-thread delivery of updates to a single observer
//!
//! The consumer runs on its own thread, but the observer (usually a UI
//! model) must only be touched from the thread that owns it. The notifier
//! is split in two halves joined by a channel the owner drains, e.g. once
//! per frame:
//!
//! - [`ObservableNotifier`] - cloneable, `Send` handle used by the consumer.
//!   [`ObservableNotifier::notify`] only enqueues and never waits for the
//!   observer.
//! - [`ObserverMailbox`] - stays on the observer's thread (it is `!Send`),
//!   holds the bound [`Observer`] and invokes it one update at a time, in
//!   arrival order.
//!
//! The observer never leaves the owner thread, so it needs neither `Send`
//! nor a lock, and the owner reads it back through
//! [`ObserverMailbox::with_observer`]:
//!
//! ```ignore
//! let (notifier, mailbox) = ObservableNotifier::new();
//! mailbox.bind(ParameterTable::new());
//!
//! // consumer thread
//! notifier.notify(update);
//!
//! // observer thread, e.g. once per frame
//! mailbox.process_pending();
//! mailbox.with_observer(|table: &ParameterTable| println!("{table}"));
//! ```
//!
//! Calling [`ObserverMailbox::bind`] or [`ObserverMailbox::unbind`] from
//! inside [`Observer::on_update`] is ignored with an error log; the slot is
//! borrowed for the duration of each delivery.

use crate::error::{RelayError, Result};
use crate::shutdown::ShutdownSignal;
use crate::types::{ParameterName, ParameterValue, Update};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::any::Any;
use std::cell::RefCell;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::Duration;

/// How often [`ObserverMailbox::run_until`] rechecks the shutdown signal
const MAILBOX_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Receiver of decoded parameter updates
#[cfg_attr(test, mockall::automock)]
pub trait Observer {
    /// Called on the mailbox's thread, once per update, in generation order
    fn on_update(&mut self, name: ParameterName, value: ParameterValue);
}

impl<F> Observer for F
where
    F: FnMut(ParameterName, ParameterValue),
{
    fn on_update(&mut self, name: ParameterName, value: ParameterValue) {
        self(name, value)
    }
}

/// Object-safe observer that can be downcast back to its concrete type
trait BoundObserver: Observer {
    fn as_any(&self) -> &dyn Any;
}

impl<O: Observer + 'static> BoundObserver for O {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Sending half, owned by the consumer
#[derive(Clone)]
pub struct ObservableNotifier {
    sender: Sender<Update>,
    bound: Arc<AtomicBool>,
}

impl ObservableNotifier {
    /// Create a notifier and the mailbox for the calling thread
    pub fn new() -> (Self, ObserverMailbox) {
        let (sender, receiver) = unbounded();
        let bound = Arc::new(AtomicBool::new(false));

        let notifier = Self {
            sender,
            bound: bound.clone(),
        };
        let mailbox = ObserverMailbox {
            receiver,
            observer: RefCell::new(None),
            bound,
            owner: thread::current().id(),
            _not_send: PhantomData,
        };
        (notifier, mailbox)
    }

    /// Whether the mailbox currently has an observer
    pub fn is_bound(&self) -> bool {
        self.bound.load(Ordering::SeqCst)
    }

    /// Queue `update` for the observer. Never blocks.
    ///
    /// Returns false when the update was dropped: nothing is bound, or the
    /// mailbox no longer exists.
    pub fn notify(&self, update: Update) -> bool {
        if !self.is_bound() {
            tracing::trace!(%update, "No observer bound, dropping update");
            return false;
        }
        if self.sender.send(update).is_err() {
            tracing::debug!(%update, "Observer mailbox gone, dropping update");
            return false;
        }
        true
    }
}

impl std::fmt::Debug for ObservableNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableNotifier")
            .field("bound", &self.is_bound())
            .field("queued", &self.sender.len())
            .finish()
    }
}

/// Receiving half, pinned to the observer's thread
pub struct ObserverMailbox {
    receiver: Receiver<Update>,
    observer: RefCell<Option<Box<dyn BoundObserver>>>,
    /// Shared with every notifier clone
    bound: Arc<AtomicBool>,
    owner: ThreadId,
    /// Keeps the mailbox on the thread that created it
    _not_send: PhantomData<*const ()>,
}

impl ObserverMailbox {
    /// Bind `observer`, replacing any previous binding
    pub fn bind<O>(&self, observer: O)
    where
        O: Observer + 'static,
    {
        let Ok(mut slot) = self.observer.try_borrow_mut() else {
            tracing::error!("Observer bind ignored: called during delivery");
            return;
        };
        let replaced = slot.replace(Box::new(observer)).is_some();
        self.bound.store(true, Ordering::SeqCst);
        tracing::debug!(replaced, "Observer bound");
    }

    /// Remove the current binding, if any
    pub fn unbind(&self) {
        let Ok(mut slot) = self.observer.try_borrow_mut() else {
            tracing::error!("Observer unbind ignored: called during delivery");
            return;
        };
        self.bound.store(false, Ordering::SeqCst);
        if slot.take().is_some() {
            tracing::debug!("Observer unbound");
        }
    }

    pub fn is_bound(&self) -> bool {
        self.bound.load(Ordering::SeqCst)
    }

    /// Run `f` on the bound observer if it is an `O`
    ///
    /// Returns `None` when nothing is bound, the observer has another type,
    /// or a delivery is in progress.
    pub fn with_observer<O, R, F>(&self, f: F) -> Option<R>
    where
        O: Observer + 'static,
        F: FnOnce(&O) -> R,
    {
        let slot = self.observer.try_borrow().ok()?;
        let observer = slot.as_deref()?.as_any().downcast_ref::<O>()?;
        Some(f(observer))
    }

    /// Thread every delivery happens on
    pub fn owner_thread(&self) -> ThreadId {
        self.owner
    }

    /// Number of updates waiting to be delivered
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Deliver every queued update without blocking
    ///
    /// Returns how many updates were taken from the mailbox.
    pub fn process_pending(&self) -> usize {
        let mut processed = 0;
        while let Ok(update) = self.receiver.try_recv() {
            self.deliver(update);
            processed += 1;
        }
        processed
    }

    /// Wait up to `timeout` for one update and deliver it
    ///
    /// Returns `Ok(false)` on timeout and [`RelayError::ChannelClosed`] once
    /// every notifier has been dropped and the mailbox is empty.
    pub fn process_next(&self, timeout: Duration) -> Result<bool> {
        match self.receiver.recv_timeout(timeout) {
            Ok(update) => {
                self.deliver(update);
                Ok(true)
            }
            Err(RecvTimeoutError::Timeout) => Ok(false),
            Err(RecvTimeoutError::Disconnected) => Err(RelayError::ChannelClosed),
        }
    }

    /// Deliver updates on this thread until `shutdown` is triggered or all
    /// notifiers are gone
    ///
    /// Updates already in the mailbox when shutdown is seen are still
    /// delivered before returning. Returns the number delivered.
    pub fn run_until(&self, shutdown: &ShutdownSignal) -> u64 {
        let mut processed = 0u64;
        while !shutdown.is_triggered() {
            match self.process_next(MAILBOX_POLL_INTERVAL) {
                Ok(true) => processed += 1,
                Ok(false) => {}
                Err(_) => break,
            }
        }
        processed + self.process_pending() as u64
    }

    fn deliver(&self, update: Update) {
        let Ok(mut slot) = self.observer.try_borrow_mut() else {
            tracing::error!(%update, "Nested delivery from inside an observer, dropping update");
            return;
        };
        let Some(observer) = slot.as_mut() else {
            tracing::trace!(%update, "Observer unbound before delivery, dropping update");
            return;
        };

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            observer.on_update(update.name, update.value)
        }));
        if result.is_err() {
            tracing::error!(%update, "Observer panicked while handling update");
        }
    }
}

impl std::fmt::Debug for ObserverMailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverMailbox")
            .field("owner", &self.owner)
            .field("bound", &self.is_bound())
            .field("pending", &self.pending())
            .finish()
    }
}
