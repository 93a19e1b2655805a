//! # Function-backed source (`SourceFn`)
//!
//! [`SourceFn`] assembles an [`EventSource`] from two closures:
//! `register: Fn(EventSink<E>) -> Result<R, Err>` and `unregister: Fn(R)`.
//! Both must not panic; that is a documented precondition of the closures,
//! not something checked at runtime.
//!
//! ## Example
//! ```rust
//! use hookbridge::{EventSink, EventSource, SourceFn};
//!
//! let source = SourceFn::new(
//!     "noop",
//!     |_sink: EventSink<u8>| Ok::<_, std::io::Error>(17u32),
//!     |_registration: u32| {},
//! );
//! assert_eq!(source.name(), "noop");
//! ```

use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;

use crate::bridge::EventSink;
use crate::source::EventSource;

/// Source built from a `register` / `unregister` closure pair.
pub struct SourceFn<E, R, Err, F, U> {
    name: Cow<'static, str>,
    register: F,
    unregister: U,
    _types: PhantomData<fn() -> (E, R, Err)>,
}

impl<E, R, Err, F, U> SourceFn<E, R, Err, F, U> {
    /// Creates a new function-backed source.
    pub fn new(name: impl Into<Cow<'static, str>>, register: F, unregister: U) -> Self {
        Self {
            name: name.into(),
            register,
            unregister,
            _types: PhantomData,
        }
    }
}

impl<E, R, Err, F, U> fmt::Debug for SourceFn<E, R, Err, F, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFn").field("name", &self.name).finish()
    }
}

impl<E, R, Err, F, U> EventSource for SourceFn<E, R, Err, F, U>
where
    E: Send + 'static,
    R: Send + 'static,
    Err: fmt::Display + 'static,
    F: Fn(EventSink<E>) -> Result<R, Err> + Send + Sync + 'static,
    U: Fn(R) + Send + Sync + 'static,
{
    type Event = E;
    type Registration = R;
    type Error = Err;

    fn name(&self) -> &str {
        &self.name
    }

    fn register(&self, sink: EventSink<E>) -> Result<R, Err> {
        (self.register)(sink)
    }

    fn unregister(&self, registration: R) {
        (self.unregister)(registration)
    }
}
