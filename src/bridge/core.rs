//! # Bridge owner.
//!
//! [`EventBridge`] owns the [`EventSource`] and the state shared with every
//! sink and operation it hands out. It is cheap to clone; clones refer to the
//! same bridge.
//!
//! ## Lifecycle
//! ```text
//! EventBridge::start(token)
//!   ├─► live = true (AlreadySubscribed if it was set)
//!   ├─► source.register(sink) ──Err──► live = false, BridgeError::Register
//!   ├─► generation = open()
//!   └─► EventSequence { registration, generation }
//!          ├─► next_op() / next_op() / ...   (one pending at a time, same generation)
//!          └─► drop ─► close(): evict parked op (Disconnected)
//!                   ─► source.unregister(registration), live = false
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::source::EventSource;

use super::sequence::EventSequence;
use super::sink::{EventSink, Shared};
use super::stats::BridgeStats;

struct Inner<S: EventSource> {
    source: S,
    shared: Arc<Shared<S::Event>>,
    live: AtomicBool,
}

/// Adapter from a push-based [`EventSource`] to awaitable events.
///
/// # Example
/// ```
/// use hookbridge::{EventBridge, EventSink, Outcome, SourceFn};
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), hookbridge::BridgeError> {
/// let source = SourceFn::new(
///     "immediate",
///     |_sink: EventSink<u32>| Ok::<_, String>(()),
///     |_registration: ()| {},
/// );
/// let bridge = EventBridge::new(source);
///
/// let token = CancellationToken::new();
/// let mut events = bridge.start(token.clone())?;
/// token.cancel();
/// assert_eq!(events.next_op().await?, Outcome::Cancelled);
/// # Ok(())
/// # }
/// ```
pub struct EventBridge<S: EventSource> {
    inner: Arc<Inner<S>>,
}

impl<S: EventSource> Clone for EventBridge<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: EventSource> EventBridge<S> {
    /// Creates a bridge over `source` with the default configuration.
    pub fn new(source: S) -> Self {
        Self::with_config(source, BridgeConfig::default())
    }

    /// Creates a bridge over `source` with an explicit configuration.
    pub fn with_config(source: S, config: BridgeConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                shared: Shared::new(config),
                live: AtomicBool::new(false),
            }),
        }
    }

    /// Returns the bridge configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.inner.shared.config
    }

    /// Returns the underlying source.
    pub fn source(&self) -> &S {
        &self.inner.source
    }

    /// Returns a sink bound to this bridge.
    pub fn sink(&self) -> EventSink<S::Event> {
        EventSink::new(Arc::clone(&self.inner.shared))
    }

    /// Installs a sink with the source.
    ///
    /// Registration errors are returned here and never reach the producer.
    /// Most callers want [`EventBridge::start`], which pairs this with
    /// [`EventBridge::unsubscribe`] automatically.
    pub fn subscribe(&self) -> Result<S::Registration, BridgeError> {
        let label = self.config().label();
        match self.inner.source.register(self.sink()) {
            Ok(registration) => {
                tracing::debug!(bridge = %label, source = %self.inner.source.name(), "subscribed");
                Ok(registration)
            }
            Err(e) => {
                tracing::debug!(bridge = %label, source = %self.inner.source.name(), error = %e, "subscribe failed");
                Err(BridgeError::register(e))
            }
        }
    }

    /// Releases a registration obtained from [`EventBridge::subscribe`].
    ///
    /// Must be called exactly once per registration.
    pub fn unsubscribe(&self, registration: S::Registration) {
        self.inner.source.unregister(registration);
        tracing::debug!(bridge = %self.config().label(), source = %self.inner.source.name(), "unsubscribed");
    }

    /// Registers with the source and returns the sequence of wait operations.
    ///
    /// Every operation of the sequence observes `token`. Only one sequence may
    /// be live per bridge; a second call fails with
    /// [`BridgeError::AlreadySubscribed`] until the first is dropped.
    pub fn start(&self, token: CancellationToken) -> Result<EventSequence<S>, BridgeError> {
        if self.inner.live.swap(true, Ordering::AcqRel) {
            return Err(BridgeError::AlreadySubscribed);
        }
        match self.subscribe() {
            Ok(registration) => {
                let generation = self.inner.shared.open();
                Ok(EventSequence::new(self.clone(), registration, generation, token))
            }
            Err(e) => {
                self.inner.live.store(false, Ordering::Release);
                Err(e)
            }
        }
    }

    /// True while an [`EventSequence`] from this bridge is alive.
    pub fn is_live(&self) -> bool {
        self.inner.live.load(Ordering::Acquire)
    }

    /// True if a wait operation is currently parked.
    pub fn is_pending(&self) -> bool {
        self.inner.shared.mailbox.is_occupied()
    }

    /// Returns a snapshot of the delivery counters.
    pub fn stats(&self) -> BridgeStats {
        self.inner.shared.counters.snapshot()
    }

    pub(crate) fn shared(&self) -> &Arc<Shared<S::Event>> {
        &self.inner.shared
    }

    pub(crate) fn release(&self, registration: S::Registration) {
        self.inner.shared.close();
        self.unsubscribe(registration);
        self.inner.live.store(false, Ordering::Release);
    }
}
