//! # External event sources.
//!
//! This module provides the capability the bridge consumes:
//! - [`EventSource`] - trait for anything that can push events into a sink
//! - [`SourceFn`] - source assembled from a `register` / `unregister` closure pair

mod source;
mod source_fn;

pub use source::EventSource;
pub use source_fn::SourceFn;
