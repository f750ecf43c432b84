//! Output module for harvest results
//!
//! This module handles:
//! - Per-sub-page reports collected during a run
//! - The aggregate run summary and its console rendering

pub mod stats;

pub use stats::{print_summary, HarvestSummary, SubPageReport};
