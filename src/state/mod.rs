//! State module for tracking harvest progress
//!
//! # Components
//!
//! - `SubPageState`: lifecycle of one sub-page within a run
//! - `ProgressState`: the counters a progress display renders

mod page_state;
mod progress_state;

// Re-export main types
pub use page_state::SubPageState;
pub use progress_state::ProgressState;
