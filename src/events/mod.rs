//! The shared record of everything captured during a session.
//!
//! Every sampler appends into one [EventStore]. Appends are stamped while the lock is held, so
//! the order of the underlying list is also the temporal order of the events and nothing ever
//! needs to be sorted afterwards.

use std::{
    fmt::Display,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, Local};

use crate::utils::clock::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Keystroke,
    ClipboardCopy,
    WindowChange,
    SystemError,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Keystroke => "KEYSTROKE",
            EventKind::ClipboardCopy => "CLIPBOARD_COPY",
            EventKind::WindowChange => "WINDOW_CHANGE",
            EventKind::SystemError => "SYSTEM_ERROR",
        }
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub timestamp: DateTime<Local>,
    pub kind: EventKind,
    pub payload: String,
}

/// Append-only list of [Event]s guarded by a single mutex.
pub struct EventStore {
    events: Mutex<Vec<Event>>,
    clock: Arc<dyn Clock>,
}

impl EventStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            clock,
        }
    }

    // A producer that panicked while holding the lock can't have left a half-pushed element
    // behind, so the list is still valid.
    fn lock(&self) -> MutexGuard<'_, Vec<Event>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn append(&self, kind: EventKind, payload: impl Into<String>) {
        let payload = payload.into();
        let mut events = self.lock();
        events.push(Event {
            timestamp: self.clock.time(),
            kind,
            payload,
        });
    }

    /// Copies out the full sequence so that formatting doesn't hold the lock.
    pub fn snapshot(&self) -> Vec<Event> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
