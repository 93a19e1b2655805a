//! # Event source abstraction.
//!
//! An [`EventSource`] is the push side of the bridge: an OS hook, a device
//! callback, a C library with a `user_data` pointer. The bridge hands it an
//! [`EventSink`] on registration and takes the registration back exactly once.
//!
//! ## Contract
//! - `register` is called once per [`EventSequence`](crate::EventSequence);
//!   failures are returned, never raised on the producer path.
//! - After `register` succeeds the source may call [`EventSink::fire`] any
//!   number of times, from any thread, until `unregister` returns.
//! - `unregister` is called exactly once per successful `register` and must
//!   not panic. After it returns the sink must not be fired again.

use std::fmt;

use crate::bridge::EventSink;

/// # Push-based, callback-driven producer of events.
///
/// # Example
/// ```
/// use hookbridge::{EventSink, EventSource};
///
/// struct Silent;
///
/// impl EventSource for Silent {
///     type Event = u32;
///     type Registration = ();
///     type Error = std::convert::Infallible;
///
///     fn register(&self, _sink: EventSink<u32>) -> Result<(), Self::Error> {
///         Ok(())
///     }
///
///     fn unregister(&self, _registration: ()) {}
/// }
/// ```
pub trait EventSource: Send + Sync + 'static {
    /// Value delivered per callback.
    type Event: Send + 'static;

    /// Opaque handle returned by a successful registration.
    type Registration: Send + 'static;

    /// Registration failure reported by the source.
    type Error: fmt::Display;

    /// Human-readable source name (for logs).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Installs `sink` with the underlying producer.
    fn register(&self, sink: EventSink<Self::Event>) -> Result<Self::Registration, Self::Error>;

    /// Removes a registration made by [`EventSource::register`].
    fn unregister(&self, registration: Self::Registration);
}
