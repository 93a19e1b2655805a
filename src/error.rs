//! Error types produced by the bridge.
//!
//! [`BridgeError`] covers every failure a consumer can observe: a source that
//! refused registration, a second live sequence, an overlapping wait under
//! [`OverlapPolicy::Reject`](crate::OverlapPolicy::Reject), and an operation
//! that outlived its sequence.
//!
//! Cancellation is **not** an error; it is reported through
//! [`Outcome::Cancelled`](crate::Outcome::Cancelled).

use thiserror::Error;

/// # Errors produced by the event bridge.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The event source refused to register the sink.
    #[error("event source registration failed: {error}")]
    Register {
        /// Message reported by the source.
        error: String,
    },

    /// A sequence is already iterating this bridge.
    #[error("bridge already has a live event sequence")]
    AlreadySubscribed,

    /// Another wait operation is already parked in the mailbox.
    #[error("another wait operation is already pending")]
    Busy,

    /// The operation's sequence ended before an event was handed over.
    ///
    /// Returned by a wait operation polled for the first time after the
    /// [`EventSequence`](crate::EventSequence) that created it was dropped, and
    /// by an operation still parked when that sequence was dropped (teardown
    /// evicts it from the mailbox).
    #[error("event sequence ended before an event was delivered")]
    Disconnected,
}

impl BridgeError {
    /// Builds a [`BridgeError::Register`] from anything displayable.
    pub fn register(error: impl std::fmt::Display) -> Self {
        BridgeError::Register {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use hookbridge::BridgeError;
    ///
    /// assert_eq!(BridgeError::Busy.as_label(), "bridge_busy");
    /// assert_eq!(BridgeError::register("denied").as_label(), "bridge_register_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BridgeError::Register { .. } => "bridge_register_failed",
            BridgeError::AlreadySubscribed => "bridge_already_subscribed",
            BridgeError::Busy => "bridge_busy",
            BridgeError::Disconnected => "bridge_disconnected",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            BridgeError::Register { error } => format!("register: {error}"),
            BridgeError::AlreadySubscribed => "sequence already live".to_string(),
            BridgeError::Busy => "operation already pending".to_string(),
            BridgeError::Disconnected => "sequence ended".to_string(),
        }
    }
}
