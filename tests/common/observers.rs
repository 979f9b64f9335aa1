//! Observer test doubles

use signal_relay::{Observer, ParameterName, ParameterValue};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::thread::{self, ThreadId};

/// Shared view of what a [`RecordingObserver`] has seen
///
/// Lives on the mailbox's thread alongside the observer, so plain `Rc`
/// sharing is enough.
#[derive(Clone, Default)]
pub struct Recording {
    updates: Rc<RefCell<Vec<(String, u8)>>>,
    off_thread: Rc<Cell<usize>>,
}

impl Recording {
    /// Received updates as `(wire name, value)`, in arrival order
    pub fn updates(&self) -> Vec<(String, u8)> {
        self.updates.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.updates.borrow().len()
    }

    /// Deliveries that ran on a thread other than the owner
    pub fn off_thread_calls(&self) -> usize {
        self.off_thread.get()
    }
}

/// Observer that logs every update and checks it runs on its owner thread
pub struct RecordingObserver {
    owner: ThreadId,
    recording: Recording,
}

impl RecordingObserver {
    /// Observer expecting deliveries on the current thread
    pub fn on_current_thread() -> (Self, Recording) {
        let recording = Recording::default();
        let observer = Self {
            owner: thread::current().id(),
            recording: recording.clone(),
        };
        (observer, recording)
    }
}

impl Observer for RecordingObserver {
    fn on_update(&mut self, name: ParameterName, value: ParameterValue) {
        if thread::current().id() != self.owner {
            self.recording.off_thread.set(self.recording.off_thread.get() + 1);
        }
        self.recording
            .updates
            .borrow_mut()
            .push((name.as_str().to_string(), value.get()));
    }
}
