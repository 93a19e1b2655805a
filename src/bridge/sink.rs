//! # Producer-facing entry point.
//!
//! [`EventSink`] is what an [`EventSource`](crate::EventSource) receives on
//! registration. It carries the bridge context explicitly, so any number of
//! bridges can coexist in one process and a source can stash the sink in
//! whatever user-data channel its API offers.
//!
//! ## Rules
//! - `fire` never blocks, never allocates, and never unwinds into the caller.
//! - An event fired while no operation is parked is dropped, not queued.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::BridgeConfig;

use super::mailbox::{Claim, Claimant, Mailbox};
use super::stats::Counters;

/// Generation value meaning "no registration is open".
pub(crate) const CLOSED: u64 = 0;

/// State shared by a bridge, its sinks and its wait operations.
///
/// `generation` identifies the open registration; wait operations carry the
/// generation of the sequence that created them and are refused once it ends.
pub(crate) struct Shared<E> {
    pub(crate) mailbox: Mailbox<E>,
    pub(crate) counters: Counters,
    pub(crate) config: BridgeConfig,
    generation: AtomicU64,
    next_generation: AtomicU64,
}

impl<E> Shared<E> {
    pub(crate) fn new(config: BridgeConfig) -> Arc<Self> {
        Arc::new(Self {
            mailbox: Mailbox::new(),
            counters: Counters::default(),
            config,
            generation: AtomicU64::new(CLOSED),
            next_generation: AtomicU64::new(CLOSED + 1),
        })
    }

    /// Opens a new registration generation and returns it.
    pub(crate) fn open(&self) -> u64 {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        self.generation.store(generation, Ordering::Release);
        generation
    }

    /// Ends the open generation and evicts any operation still parked.
    ///
    /// An evicted operation completes with `BridgeError::Disconnected`.
    pub(crate) fn close(&self) {
        self.generation.store(CLOSED, Ordering::Release);
        if let Claim::Cancel(orphan) = self.mailbox.claim(Claimant::Teardown) {
            tracing::trace!(
                bridge = %self.config.label(),
                op = %orphan.id(),
                "registration ended, parked operation released"
            );
        }
    }

    #[cfg(test)]
    pub(crate) fn current(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// True if `generation` is the open registration.
    pub(crate) fn is_current(&self, generation: u64) -> bool {
        generation != CLOSED && self.generation.load(Ordering::Acquire) == generation
    }
}

/// Callback handle invoked by the producer with one event at a time.
///
/// Cheap to clone; safe to call from any thread.
pub struct EventSink<E> {
    shared: Arc<Shared<E>>,
}

impl<E> Clone for EventSink<E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<E> std::fmt::Debug for EventSink<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("bridge", &self.shared.config.label())
            .field("pending", &self.shared.mailbox.is_occupied())
            .finish()
    }
}

impl<E: Send + 'static> EventSink<E> {
    pub(crate) fn new(shared: Arc<Shared<E>>) -> Self {
        Self { shared }
    }

    /// Hands `event` to the waiting operation, if any.
    ///
    /// Returns `true` if an operation was resumed with the event, `false` if
    /// the event was dropped.
    ///
    /// A panic inside delivery aborts the process: the producer's context may
    /// not be able to unwind.
    pub fn fire(&self, event: E) -> bool {
        match panic::catch_unwind(AssertUnwindSafe(|| self.deliver(event))) {
            Ok(delivered) => delivered,
            Err(_) => {
                tracing::error!(
                    bridge = %self.shared.config.label(),
                    "panic while delivering an event; aborting"
                );
                std::process::abort();
            }
        }
    }

    /// Converts the sink into a plain closure for sources that take `Fn(E)`.
    pub fn into_fn(self) -> impl Fn(E) + Clone + Send + Sync + 'static {
        move |event| {
            self.fire(event);
        }
    }

    fn deliver(&self, event: E) -> bool {
        let shared = &self.shared;
        match shared.mailbox.claim(Claimant::Producer) {
            Claim::Delivery(completion) if !shared.is_current(completion.generation()) => {
                // Parked under an ended registration; dropping the completion
                // disconnects it. No live operation was waiting.
                shared.counters.dropped();
                tracing::trace!(
                    bridge = %shared.config.label(),
                    op = %completion.id(),
                    "stale operation disconnected, event dropped"
                );
                false
            }
            Claim::Delivery(completion) => {
                let op = completion.id();
                match completion.resume(event) {
                    Ok(()) => {
                        shared.counters.delivered();
                        tracing::trace!(bridge = %shared.config.label(), %op, "event delivered");
                        true
                    }
                    Err(_event) => {
                        // Operation dropped after we won the slot.
                        shared.counters.dropped();
                        tracing::trace!(bridge = %shared.config.label(), %op, "operation gone, event dropped");
                        false
                    }
                }
            }
            // Producer claims never yield `Cancel`.
            Claim::Cancel(_) | Claim::Empty => {
                shared.counters.dropped();
                tracing::trace!(bridge = %shared.config.label(), "no pending operation, event dropped");
                false
            }
        }
    }
}
