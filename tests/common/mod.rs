//! Manual event source for integration tests.
//!
//! Records every register/unregister call and lets a test fire events into
//! the currently installed sink from any thread.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use hookbridge::{EventSink, EventSource};

#[derive(Default)]
struct Inner {
    sink: Mutex<Option<EventSink<u32>>>,
    registered: AtomicUsize,
    unregistered: AtomicUsize,
    refuse: AtomicBool,
}

/// Cloneable handle; clones share counters and the installed sink.
#[derive(Clone, Default)]
pub struct ManualSource {
    inner: Arc<Inner>,
}

impl ManualSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next registrations fail.
    pub fn refuse(&self, refuse: bool) {
        self.inner.refuse.store(refuse, Ordering::SeqCst);
    }

    /// Fires an event as the producer would. `false` if dropped or unregistered.
    pub fn fire(&self, event: u32) -> bool {
        let sink = self.inner.sink.lock().unwrap().clone();
        match sink {
            Some(sink) => sink.fire(event),
            None => false,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.inner.sink.lock().unwrap().is_some()
    }

    pub fn registered(&self) -> usize {
        self.inner.registered.load(Ordering::SeqCst)
    }

    pub fn unregistered(&self) -> usize {
        self.inner.unregistered.load(Ordering::SeqCst)
    }
}

impl EventSource for ManualSource {
    type Event = u32;
    type Registration = usize;
    type Error = String;

    fn name(&self) -> &str {
        "manual"
    }

    fn register(&self, sink: EventSink<u32>) -> Result<usize, String> {
        if self.inner.refuse.load(Ordering::SeqCst) {
            return Err("registration refused".to_string());
        }
        let n = self.inner.registered.fetch_add(1, Ordering::SeqCst) + 1;
        *self.inner.sink.lock().unwrap() = Some(sink);
        Ok(n)
    }

    fn unregister(&self, _registration: usize) {
        self.inner.sink.lock().unwrap().take();
        self.inner.unregistered.fetch_add(1, Ordering::SeqCst);
    }
}
