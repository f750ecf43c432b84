//! Progress reporting for a harvest run
//!
//! The orchestrator never touches a presentation layer directly. It sends
//! immutable [`ProgressEvent`] values through a [`ProgressReporter`]; a single
//! consumer ([`forward_events`]) applies them, in order, to one
//! [`ProgressSink`].
//!
//! # Components
//!
//! - `ProgressEvent`: one log line, counter update, or terminal notification
//! - `ProgressReporter`: cloneable, non-blocking sending half
//! - `ProgressSink`: observer interface implemented by front ends
//! - `TracingSink`: console sink that renders events as tracing records

mod events;
mod sink;

pub use events::{ProgressEvent, ProgressReporter};
pub use sink::{forward_events, ProgressSink, TracingSink};
