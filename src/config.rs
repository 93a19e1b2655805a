//! # Bridge configuration.
//!
//! Provides [`BridgeConfig`], the settings an [`EventBridge`](crate::EventBridge)
//! is built with, and [`OverlapPolicy`], which decides what happens when a
//! second wait operation starts while one is still parked.
//!
//! ## Sentinel values
//! - `name = ""` → logs use `"bridge"` (see [`BridgeConfig::label`])

use std::borrow::Cow;

/// Reaction to a wait operation starting while another is pending.
///
/// The mailbox holds exactly one slot; this policy never turns it into a queue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverlapPolicy {
    /// Log and panic the consumer task. A single consumer is assumed, so an
    /// overlap is a programming error.
    #[default]
    Fatal,

    /// Complete the late operation with [`BridgeError::Busy`](crate::BridgeError::Busy)
    /// and leave the pending one untouched.
    Reject,
}

/// Configuration for an [`EventBridge`](crate::EventBridge).
///
/// ## Field semantics
/// - `name`: label attached to every log record of this bridge (`""` = `"bridge"`)
/// - `overlap`: see [`OverlapPolicy`]
#[derive(Clone, Debug, Default)]
pub struct BridgeConfig {
    /// Human-readable bridge name for logs.
    pub name: Cow<'static, str>,

    /// Policy applied when a second operation starts while one is pending.
    pub overlap: OverlapPolicy,
}

impl BridgeConfig {
    /// Creates a config with the given name and default policy.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the overlap policy.
    #[must_use]
    pub fn with_overlap(mut self, overlap: OverlapPolicy) -> Self {
        self.overlap = overlap;
        self
    }

    /// Returns the name used in logs, falling back to `"bridge"`.
    #[inline]
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            "bridge"
        } else {
            &self.name
        }
    }
}
