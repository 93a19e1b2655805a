//! # One-shot "deliver the next event" operation.
//!
//! A [`WaitOperation`] is a future. Its first poll **starts** it: the
//! operation parks its completion in the mailbox and suspends. It then
//! completes exactly once, with one of:
//! - `Ok(Outcome::Event(ev))` - the producer resumed it;
//! - `Ok(Outcome::Cancelled)` - its cancellation token fired first;
//! - `Err(BridgeError)` - the start was rejected or the continuation vanished.
//!
//! ## Cancellation race
//! ```text
//! token fired ──► claim(Owner) ──┬─ Cancel ─► Outcome::Cancelled   (producer will find the slot empty)
//!                                └─ Empty  ─► await in-flight value ─► Outcome::Event
//! ```
//! The producer and the canceller race on the same slot through
//! [`Mailbox::claim`](super::mailbox::Mailbox::claim); the loser is a no-op.
//!
//! Dropping a started operation is an implicit cancel: it takes its completion
//! back so a later operation can never receive an event meant for it.
//!
//! ## Registration binding
//! Each operation belongs to the registration of the sequence that created it.
//! Started after that sequence is dropped, it completes with
//! [`BridgeError::Disconnected`] without touching the mailbox; parked when the
//! sequence is dropped, it is evicted and completes the same way.

use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::FutureExt;
use tokio::sync::oneshot;
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

use crate::config::OverlapPolicy;
use crate::error::BridgeError;

use super::mailbox::{Claim, Claimant, Completion};
use super::sink::Shared;

/// Successful completion of a [`WaitOperation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<E> {
    /// The producer delivered an event.
    Event(E),
    /// The cancellation token fired before an event arrived.
    Cancelled,
}

impl<E> Outcome<E> {
    /// Returns the event, if one was delivered.
    pub fn into_event(self) -> Option<E> {
        match self {
            Outcome::Event(ev) => Some(ev),
            Outcome::Cancelled => None,
        }
    }

    /// True if the operation ended by cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }
}

enum State<E> {
    /// Not polled yet; nothing published.
    Idle,
    /// Completion parked in the mailbox.
    Parked {
        completion: Arc<Completion<E>>,
        rx: oneshot::Receiver<E>,
    },
    /// Cancellation lost the race; the producer owns the completion.
    Handoff { rx: oneshot::Receiver<E> },
    Done,
}

/// Awaitable request for the next event.
///
/// Created by [`EventSequence::next_op`](crate::EventSequence::next_op).
#[must_use = "a wait operation does nothing until awaited"]
pub struct WaitOperation<E> {
    shared: Arc<Shared<E>>,
    generation: u64,
    token: CancellationToken,
    cancelled: Option<Pin<Box<WaitForCancellationFutureOwned>>>,
    state: State<E>,
}

impl<E: Send + 'static> WaitOperation<E> {
    pub(crate) fn new(shared: Arc<Shared<E>>, generation: u64, token: CancellationToken) -> Self {
        Self {
            shared,
            generation,
            token,
            cancelled: None,
            state: State::Idle,
        }
    }

    /// True once the operation has been polled and is waiting on the producer.
    pub fn is_started(&self) -> bool {
        matches!(self.state, State::Parked { .. } | State::Handoff { .. })
    }

    /// Publishes a fresh completion into the mailbox.
    fn start(&self) -> Result<State<E>, BridgeError> {
        if !self.shared.is_current(self.generation) {
            tracing::debug!(
                bridge = %self.shared.config.label(),
                "wait operation outlived its sequence"
            );
            return Err(BridgeError::Disconnected);
        }

        let (tx, rx) = oneshot::channel();
        let id = self.shared.mailbox.next_id();
        let completion = Arc::new(Completion::new(id, self.generation, tx));

        match self.shared.mailbox.publish(Arc::clone(&completion)) {
            Ok(()) => {
                // The sequence may have ended between the check and the publish.
                if !self.shared.is_current(self.generation) {
                    if let Claim::Cancel(_) =
                        self.shared.mailbox.claim(Claimant::Owner(&completion))
                    {
                        return Err(BridgeError::Disconnected);
                    }
                }
                tracing::trace!(bridge = %self.shared.config.label(), op = %id, "operation parked");
                Ok(State::Parked { completion, rx })
            }
            Err(_) => match self.shared.config.overlap {
                OverlapPolicy::Fatal => {
                    tracing::error!(
                        bridge = %self.shared.config.label(),
                        op = %id,
                        "wait operation started while another is pending"
                    );
                    panic!(
                        "hookbridge: wait operation started while another is pending on bridge `{}`",
                        self.shared.config.label()
                    );
                }
                OverlapPolicy::Reject => {
                    tracing::debug!(
                        bridge = %self.shared.config.label(),
                        op = %id,
                        "overlapping wait operation rejected"
                    );
                    Err(BridgeError::Busy)
                }
            },
        }
    }

    fn poll_cancelled(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        let token = &self.token;
        self.cancelled
            .get_or_insert_with(|| Box::pin(token.clone().cancelled_owned()))
            .as_mut()
            .poll(cx)
    }

    fn finish_cancelled(&self) -> Poll<Result<Outcome<E>, BridgeError>> {
        self.shared.counters.cancelled();
        tracing::debug!(bridge = %self.shared.config.label(), "wait operation cancelled");
        Poll::Ready(Ok(Outcome::Cancelled))
    }
}

fn received<E>(res: Result<E, oneshot::error::RecvError>) -> Result<Outcome<E>, BridgeError> {
    res.map(Outcome::Event)
        .map_err(|_| BridgeError::Disconnected)
}

impl<E: Send + 'static> Future for WaitOperation<E> {
    type Output = Result<Outcome<E>, BridgeError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        loop {
            match mem::replace(&mut this.state, State::Done) {
                State::Idle => {
                    if this.token.is_cancelled() {
                        return this.finish_cancelled();
                    }
                    this.state = this.start()?;
                }
                State::Parked { completion, mut rx } => {
                    if let Poll::Ready(res) = rx.poll_unpin(cx) {
                        return Poll::Ready(received(res));
                    }
                    if this.poll_cancelled(cx).is_pending() {
                        this.state = State::Parked { completion, rx };
                        return Poll::Pending;
                    }
                    match this.shared.mailbox.claim(Claimant::Owner(&completion)) {
                        Claim::Cancel(_) => return this.finish_cancelled(),
                        // Owner claims never yield `Delivery`.
                        Claim::Delivery(_) | Claim::Empty => {
                            tracing::trace!(
                                bridge = %this.shared.config.label(),
                                op = %completion.id(),
                                "cancel lost to producer, awaiting in-flight event"
                            );
                            this.state = State::Handoff { rx };
                        }
                    }
                }
                State::Handoff { mut rx } => {
                    return match rx.poll_unpin(cx) {
                        Poll::Ready(res) => Poll::Ready(received(res)),
                        Poll::Pending => {
                            this.state = State::Handoff { rx };
                            Poll::Pending
                        }
                    };
                }
                State::Done => panic!("WaitOperation polled after completion"),
            }
        }
    }
}

impl<E> Drop for WaitOperation<E> {
    fn drop(&mut self) {
        if let State::Parked { completion, .. } = &self.state {
            if let Claim::Cancel(_) = self.shared.mailbox.claim(Claimant::Owner(completion)) {
                tracing::trace!(
                    bridge = %self.shared.config.label(),
                    op = %completion.id(),
                    "started operation dropped, completion reclaimed"
                );
            }
        }
    }
}
