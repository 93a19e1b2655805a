//! # Single-slot atomic handoff between producer and consumer.
//!
//! The [`Mailbox`] is one `AtomicPtr` slot. A started wait operation parks a
//! [`Completion`] there; the producer takes it out to deliver an event, or the
//! operation takes it back to cancel. The completion carries both the operation
//! identity and its resume routine, so publishing it is a single atomic store
//! and nobody ever observes a half-published operation.
//!
//! ## Ownership
//! ```text
//!            publish (null → C)                claim(Producer): swap(C → null)
//! WaitOperation ───────────────► [ slot ] ─────────────────────────────────► EventSink
//!                                   │                                         resume(C, ev)
//!                                   └──────────► claim(Owner(C)): cas(C → null)
//!                                                     → WaitOperation (cancel)
//! ```
//!
//! ## Rules
//! - At most one completion is parked at any instant.
//! - Every ownership transfer out of the slot goes through [`Mailbox::claim`];
//!   exactly one claimant obtains a given completion.
//! - The operation keeps its own `Arc` to the completion while parked, so the
//!   address it compares against can not be reused by another operation.
//! - A completion records the registration generation it was parked under;
//!   the sink refuses to resume a completion from an ended registration.
//!
//! ## Why raw pointers
//! The slot must go from "empty" to "one operation" with a single atomic
//! store, and the producer must take it with a single swap, without locks:
//! the producer may be a restricted callback that must not block. std has no
//! safe atomic cell for an owned `Arc`, so the slot stores `Arc::into_raw` in
//! an `AtomicPtr`, and the resume channel lives in an `UnsafeCell` that only
//! the claimant who removed the pointer touches. Both `unsafe` spots rely on
//! one invariant: a pointer leaves the slot through exactly one successful
//! atomic exchange.

use std::cell::UnsafeCell;
use std::fmt;
use std::marker::PhantomData;
use std::ptr;
use std::sync::Arc;
use std::sync::atomic::{AtomicPtr, AtomicU64, Ordering};

use tokio::sync::oneshot;

/// Identity of one wait operation, unique per mailbox.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct OpId(pub(crate) u64);

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op-{}", self.0)
    }
}

/// Parked continuation of a wait operation.
///
/// The resume channel is touched only by the claimant that removed this
/// completion from the slot.
pub(crate) struct Completion<E> {
    id: OpId,
    generation: u64,
    resume: UnsafeCell<Option<oneshot::Sender<E>>>,
}

// SAFETY: `resume` is accessed only through `Claimed::resume`, and a `Claimed`
// exists for a completion at most once (see `Mailbox::claim`).
unsafe impl<E: Send> Send for Completion<E> {}
unsafe impl<E: Send> Sync for Completion<E> {}

impl<E> Completion<E> {
    pub(crate) fn new(id: OpId, generation: u64, resume: oneshot::Sender<E>) -> Self {
        Self {
            id,
            generation,
            resume: UnsafeCell::new(Some(resume)),
        }
    }

    pub(crate) fn id(&self) -> OpId {
        self.id
    }
}

/// Exclusive ownership of a completion removed from the slot.
///
/// Dropped without [`Claimed::resume`], it disconnects the operation: the
/// resume channel closes even though the operation still holds the `Arc`.
pub(crate) struct Claimed<E>(Arc<Completion<E>>);

impl<E> Claimed<E> {
    fn take_sender(&self) -> Option<oneshot::Sender<E>> {
        // SAFETY: `Claimed` is produced once per publication, by the claimant
        // that won the slot; nobody else reads or writes `resume`.
        unsafe { (*self.0.resume.get()).take() }
    }

    pub(crate) fn id(&self) -> OpId {
        self.0.id
    }

    /// Registration generation the operation was parked under.
    pub(crate) fn generation(&self) -> u64 {
        self.0.generation
    }

    /// Resumes the operation with `event`.
    ///
    /// Returns the event back if the operation is gone.
    pub(crate) fn resume(self, event: E) -> Result<(), E> {
        match self.take_sender() {
            Some(tx) => tx.send(event),
            None => Err(event),
        }
    }
}

impl<E> Drop for Claimed<E> {
    fn drop(&mut self) {
        drop(self.take_sender());
    }
}

/// Who is trying to take the parked completion.
pub(crate) enum Claimant<'a, E> {
    /// The event sink, taking whatever is parked.
    Producer,
    /// The operation that parked `completion`, taking back only its own.
    Owner(&'a Arc<Completion<E>>),
    /// Registration teardown, evicting whatever is parked.
    Teardown,
}

/// Result of [`Mailbox::claim`].
pub(crate) enum Claim<E> {
    /// The producer took a parked completion and must resume it.
    Delivery(Claimed<E>),
    /// The owner (or teardown) took the completion back; the producer will
    /// never see it.
    Cancel(Claimed<E>),
    /// Nothing (or, for an owner, not its own completion) was parked.
    Empty,
}

/// Atomic single-slot handoff state.
pub(crate) struct Mailbox<E> {
    slot: AtomicPtr<Completion<E>>,
    next_id: AtomicU64,
    _owns: PhantomData<Arc<Completion<E>>>,
}

impl<E> Mailbox<E> {
    pub(crate) fn new() -> Self {
        Self {
            slot: AtomicPtr::new(ptr::null_mut()),
            next_id: AtomicU64::new(1),
            _owns: PhantomData,
        }
    }

    /// Allocates the identity for the next operation.
    pub(crate) fn next_id(&self) -> OpId {
        OpId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns true if a completion is currently parked.
    pub(crate) fn is_occupied(&self) -> bool {
        !self.slot.load(Ordering::Acquire).is_null()
    }

    /// Parks `completion` if the slot is empty.
    ///
    /// On failure the completion is handed back untouched and the parked one
    /// stays where it is.
    pub(crate) fn publish(&self, completion: Arc<Completion<E>>) -> Result<(), Arc<Completion<E>>> {
        let raw = Arc::into_raw(completion) as *mut Completion<E>;
        match self
            .slot
            .compare_exchange(ptr::null_mut(), raw, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Ok(()),
            // SAFETY: `raw` came from `Arc::into_raw` above and was never stored.
            Err(_) => Err(unsafe { Arc::from_raw(raw) }),
        }
    }

    /// Takes the parked completion on behalf of `who`.
    pub(crate) fn claim(&self, who: Claimant<'_, E>) -> Claim<E> {
        let taken = match who {
            Claimant::Producer | Claimant::Teardown => {
                self.slot.swap(ptr::null_mut(), Ordering::AcqRel)
            }
            Claimant::Owner(own) => {
                let expected = Arc::as_ptr(own) as *mut Completion<E>;
                match self.slot.compare_exchange(
                    expected,
                    ptr::null_mut(),
                    Ordering::AcqRel,
                    Ordering::Acquire,
                ) {
                    Ok(p) => p,
                    Err(_) => ptr::null_mut(),
                }
            }
        };
        if taken.is_null() {
            return Claim::Empty;
        }

        // SAFETY: a non-null slot value always comes from `Arc::into_raw` in
        // `publish`, and the atomic exchange above removed it, so this is the
        // only place reconstructing that reference.
        let claimed = Claimed(unsafe { Arc::from_raw(taken) });
        match who {
            Claimant::Producer => Claim::Delivery(claimed),
            Claimant::Owner(_) | Claimant::Teardown => Claim::Cancel(claimed),
        }
    }
}

impl<E> Drop for Mailbox<E> {
    fn drop(&mut self) {
        let raw = *self.slot.get_mut();
        if !raw.is_null() {
            // SAFETY: see `claim`; `&mut self` rules out concurrent claimants.
            drop(unsafe { Arc::from_raw(raw) });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parked(mailbox: &Mailbox<u32>) -> (Arc<Completion<u32>>, oneshot::Receiver<u32>) {
        let (tx, rx) = oneshot::channel();
        let completion = Arc::new(Completion::new(mailbox.next_id(), 1, tx));
        assert!(mailbox.publish(Arc::clone(&completion)).is_ok());
        (completion, rx)
    }

    #[test]
    fn test_producer_claim_on_empty_slot() {
        let mailbox = Mailbox::<u32>::new();
        assert!(matches!(mailbox.claim(Claimant::Producer), Claim::Empty));
        assert!(!mailbox.is_occupied());
    }

    #[test]
    fn test_producer_claim_delivers_and_clears() {
        let mailbox = Mailbox::<u32>::new();
        let (completion, mut rx) = parked(&mailbox);
        assert!(mailbox.is_occupied());

        match mailbox.claim(Claimant::Producer) {
            Claim::Delivery(c) => {
                assert_eq!(c.id(), completion.id());
                assert!(c.resume(7).is_ok());
            }
            _ => panic!("expected delivery"),
        }
        assert_eq!(rx.try_recv().unwrap(), 7);
        assert!(!mailbox.is_occupied());
    }

    #[test]
    fn test_owner_claim_cancels_own_completion() {
        let mailbox = Mailbox::<u32>::new();
        let (completion, _rx) = parked(&mailbox);

        assert!(matches!(
            mailbox.claim(Claimant::Owner(&completion)),
            Claim::Cancel(_)
        ));
        assert!(matches!(mailbox.claim(Claimant::Producer), Claim::Empty));
    }

    #[test]
    fn test_owner_claim_after_producer_is_empty() {
        let mailbox = Mailbox::<u32>::new();
        let (completion, _rx) = parked(&mailbox);

        let Claim::Delivery(taken) = mailbox.claim(Claimant::Producer) else {
            panic!("expected delivery");
        };
        assert!(matches!(
            mailbox.claim(Claimant::Owner(&completion)),
            Claim::Empty
        ));
        drop(taken);
    }

    #[test]
    fn test_owner_never_takes_foreign_completion() {
        let mailbox = Mailbox::<u32>::new();
        let (tx, _rx) = oneshot::channel();
        let stranger = Arc::new(Completion::new(mailbox.next_id(), 1, tx));
        let (_mine, _rx2) = parked(&mailbox);

        assert!(matches!(
            mailbox.claim(Claimant::Owner(&stranger)),
            Claim::Empty
        ));
        assert!(mailbox.is_occupied());
    }

    #[test]
    fn test_second_publish_is_refused() {
        let mailbox = Mailbox::<u32>::new();
        let (first, _rx) = parked(&mailbox);

        let (tx, _rx2) = oneshot::channel();
        let second = Arc::new(Completion::new(mailbox.next_id(), 1, tx));
        let back = mailbox.publish(second).err().expect("slot is taken");
        assert_ne!(back.id(), first.id());

        let Claim::Delivery(c) = mailbox.claim(Claimant::Producer) else {
            panic!("expected delivery");
        };
        assert_eq!(c.id(), first.id());
    }

    #[test]
    fn test_teardown_evicts_parked_completion() {
        let mailbox = Mailbox::<u32>::new();
        let (completion, mut rx) = parked(&mailbox);

        match mailbox.claim(Claimant::Teardown) {
            Claim::Cancel(c) => {
                assert_eq!(c.id(), completion.id());
                assert_eq!(c.generation(), 1);
            }
            _ => panic!("expected eviction"),
        }
        assert!(!mailbox.is_occupied());
        // Still referenced by its operation, yet the channel is closed.
        assert_eq!(Arc::strong_count(&completion), 1);
        assert_eq!(
            rx.try_recv(),
            Err(oneshot::error::TryRecvError::Closed)
        );
    }

    #[test]
    fn test_drop_releases_parked_completion() {
        let mailbox = Mailbox::<u32>::new();
        let (completion, _rx) = parked(&mailbox);
        assert_eq!(Arc::strong_count(&completion), 2);
        drop(mailbox);
        assert_eq!(Arc::strong_count(&completion), 1);
    }

    #[test]
    fn test_ids_are_unique() {
        let mailbox = Mailbox::<u32>::new();
        let a = mailbox.next_id();
        let b = mailbox.next_id();
        assert_ne!(a, b);
        assert_eq!(format!("{a}"), "op-1");
    }
}
