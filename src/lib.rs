//! # hookbridge
//!
//! **hookbridge** turns a push-based, callback-driven event source (an OS hook,
//! a device driver callback, a C library firing from its own thread) into
//! events a single async consumer awaits one at a time.
//!
//! The handoff is a lock-free single slot: the consumer parks one wait
//! operation, the producer resumes it. An event fired while nothing is parked
//! is dropped, never queued.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   producer thread (not ours)                         consumer task
//! ┌──────────────────────────┐                   ┌──────────────────────────┐
//! │  EventSource             │                   │  for op in sequence {    │
//! │   callback(ev)           │                   │      op.await            │
//! │     └─► EventSink::fire  │                   │  }                       │
//! └────────────┬─────────────┘                   └────────────┬─────────────┘
//!              │ claim(Producer)                              │ first poll: publish
//!              ▼                                              ▼
//!        ┌───────────────────────────────────────────────────────────┐
//!        │  Mailbox: AtomicPtr<Completion>  (null | one completion)  │
//!        └───────────────────────────────────────────────────────────┘
//!              │                                              ▲
//!              │ resume(ev) ─► oneshot ─► WaitOperation ──────┘ claim(Owner) on cancel/drop
//! ```
//!
//! ### Lifecycle
//! ```text
//! EventBridge::start(token) ──► source.register(sink) ──► EventSequence
//!
//! loop {
//!   ├─► op = sequence.next_op()
//!   ├─► op.await
//!   │     ├─ first poll: park completion (second pending op ─► OverlapPolicy)
//!   │     ├─ producer fires ─► Outcome::Event(ev)
//!   │     ├─ token fires    ─► race the producer for the slot
//!   │     │                     ├─ won  ─► Outcome::Cancelled
//!   │     │                     └─ lost ─► Outcome::Event(ev)
//!   │     └─ nothing parked when producer fires ─► event dropped
//!   └─ exit: sequence dropped ─► evict parked op (Disconnected)
//!                               ─► source.unregister(registration) (exactly once)
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                      |
//! |-------------------|--------------------------------------------------------------|-----------------------------------------|
//! | **Sources**       | Plug any callback API in; closures or a trait impl.          | [`EventSource`], [`SourceFn`]           |
//! | **Bridge**        | Owns registration, hands out sinks, counts deliveries.       | [`EventBridge`], [`EventSink`]          |
//! | **Consumption**   | Awaitable one-shot operations, iterator or stream.           | [`EventSequence`], [`WaitOperation`]    |
//! | **Errors**        | Typed failures distinct from cancellation.                   | [`BridgeError`], [`Outcome`]            |
//! | **Configuration** | Bridge name and overlap policy.                              | [`BridgeConfig`], [`OverlapPolicy`]     |
//!
//! ## Example
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use tokio_util::sync::CancellationToken;
//! use hookbridge::{EventBridge, EventSink, Outcome, SourceFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // A stand-in for an OS hook: stash the sink so "the system" can call it.
//!     let hook: Arc<Mutex<Option<EventSink<u32>>>> = Arc::default();
//!     let installed = Arc::clone(&hook);
//!     let removed = Arc::clone(&hook);
//!
//!     let source = SourceFn::new(
//!         "demo-hook",
//!         move |sink: EventSink<u32>| {
//!             *installed.lock().unwrap() = Some(sink);
//!             Ok::<_, String>(())
//!         },
//!         move |_registration: ()| {
//!             removed.lock().unwrap().take();
//!         },
//!     );
//!
//!     let bridge = EventBridge::new(source);
//!     let mut events = bridge.start(CancellationToken::new())?;
//!
//!     let mut op = events.next_op();
//!     let _ = futures::poll!(&mut op); // parks the operation
//!     let sink = hook.lock().unwrap().clone().unwrap();
//!     assert!(sink.fire(7));
//!
//!     assert_eq!(op.await?, Outcome::Event(7));
//!     drop(events); // unregisters
//!     assert!(hook.lock().unwrap().is_none());
//!     Ok(())
//! }
//! ```

mod bridge;
mod config;
mod error;
mod source;

// ---- Public re-exports ----

pub use bridge::{BridgeStats, EventBridge, EventSequence, EventSink, Outcome, WaitOperation};
pub use config::{BridgeConfig, OverlapPolicy};
pub use error::BridgeError;
pub use source::{EventSource, SourceFn};
