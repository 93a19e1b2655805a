//! # Lazy, unbounded sequence of wait operations.
//!
//! An [`EventSequence`] is tied to exactly one registration, taken when
//! [`EventBridge::start`](crate::EventBridge::start) succeeds and released when
//! the sequence is dropped, whatever the exit path (loop end, `break`, `?`,
//! panic unwinding). It is not restartable.
//!
//! ## Consuming
//! ```text
//! for op in sequence {                 // Iterator<Item = WaitOperation>, never ends
//!     match op.await? {
//!         Outcome::Event(ev) => ...,
//!         Outcome::Cancelled => break,  // sequence dropped ─► unregister
//!     }
//! }
//! ```
//! or [`EventSequence::into_stream`] for a `Stream` that ends on cancellation.

use futures::Stream;
use tokio_util::sync::CancellationToken;

use crate::error::BridgeError;
use crate::source::EventSource;

use super::core::EventBridge;
use super::operation::{Outcome, WaitOperation};

/// Sequence of [`WaitOperation`]s over one registration.
pub struct EventSequence<S: EventSource> {
    bridge: EventBridge<S>,
    registration: Option<S::Registration>,
    generation: u64,
    token: CancellationToken,
}

impl<S: EventSource> EventSequence<S> {
    pub(crate) fn new(
        bridge: EventBridge<S>,
        registration: S::Registration,
        generation: u64,
        token: CancellationToken,
    ) -> Self {
        Self {
            bridge,
            registration: Some(registration),
            generation,
            token,
        }
    }

    /// Creates the operation that waits for the next event.
    ///
    /// Only one operation may be started (polled) at a time. The operation is
    /// bound to this sequence's registration: once the sequence is dropped it
    /// completes with [`BridgeError::Disconnected`].
    pub fn next_op(&mut self) -> WaitOperation<S::Event> {
        WaitOperation::new(
            std::sync::Arc::clone(self.bridge.shared()),
            self.generation,
            self.token.clone(),
        )
    }

    /// Returns the cancellation token observed by every operation.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// True once the sequence's token has fired.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns the bridge this sequence iterates.
    pub fn bridge(&self) -> &EventBridge<S> {
        &self.bridge
    }

    /// Turns the sequence into a stream of events.
    ///
    /// The stream ends after cancellation or after yielding the first error.
    /// The registration is released when the stream is dropped.
    pub fn into_stream(self) -> impl Stream<Item = Result<S::Event, BridgeError>> {
        futures::stream::unfold(Some(self), |seq| async move {
            let Some(mut seq) = seq else {
                return None;
            };
            match seq.next_op().await {
                Ok(Outcome::Event(ev)) => Some((Ok(ev), Some(seq))),
                Ok(Outcome::Cancelled) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}

impl<S: EventSource> Iterator for EventSequence<S> {
    type Item = WaitOperation<S::Event>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_op())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

impl<S: EventSource> Drop for EventSequence<S> {
    fn drop(&mut self) {
        if let Some(registration) = self.registration.take() {
            self.bridge.release(registration);
        }
    }
}
