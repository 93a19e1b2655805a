//! Event bridge: mailbox, sink, wait operations and their lifecycle.
//!
//! The only public types from this module are [`EventBridge`], [`EventSequence`],
//! [`EventSink`], [`WaitOperation`], [`Outcome`] and [`BridgeStats`].
//!
//! Internal modules:
//! - [`mailbox`]: single atomic slot shared by producer and consumer;
//! - [`sink`]: producer entry point, drains the slot or drops the event;
//! - [`operation`]: one-shot future that parks itself and races cancellation;
//! - [`sequence`]: lazy unbounded run of operations tied to one registration;
//! - [`core`]: owns the source and the shared state, registers sinks;
//! - [`stats`]: delivery counters.

mod core;
mod mailbox;
mod operation;
mod sequence;
mod sink;
mod stats;

pub use self::core::EventBridge;
pub use operation::{Outcome, WaitOperation};
pub use sequence::EventSequence;
pub use sink::EventSink;
pub use stats::BridgeStats;

pub(crate) use sink::Shared;
