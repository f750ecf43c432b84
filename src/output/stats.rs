//! Statistics gathered during a harvest run
//!
//! Every sub-page produces a [`SubPageReport`]; the coordinator folds them
//! into a [`HarvestSummary`] that the run returns.

use crate::state::SubPageState;
use std::path::PathBuf;
use url::Url;

/// Outcome of one sub-page
#[derive(Debug, Clone)]
pub struct SubPageReport {
    /// 1-based position in the index page's link order
    pub index: usize,

    pub link: Url,

    /// Destination folder, once created
    pub folder: Option<PathBuf>,

    pub state: SubPageState,

    pub images_found: usize,
    pub images_downloaded: usize,
    pub images_failed: usize,
    pub bytes_downloaded: u64,
}

impl SubPageReport {
    pub fn new(index: usize, link: Url) -> Self {
        Self {
            index,
            link,
            folder: None,
            state: SubPageState::Pending,
            images_found: 0,
            images_downloaded: 0,
            images_failed: 0,
            bytes_downloaded: 0,
        }
    }

    /// Moves the sub-page to its next lifecycle state
    pub fn advance(&mut self, next: SubPageState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid sub-page transition: {} -> {}",
            self.state,
            next
        );
        tracing::trace!("Sub-page {} {} -> {}", self.index, self.state, next);
        self.state = next;
    }
}

/// Aggregate results of a harvest run
#[derive(Debug, Clone, Default)]
pub struct HarvestSummary {
    /// Sub-page links selected on the index page
    pub sub_pages_found: usize,

    /// Reports ordered by sub-page index
    pub pages: Vec<SubPageReport>,
}

impl HarvestSummary {
    pub fn new(sub_pages_found: usize) -> Self {
        Self {
            sub_pages_found,
            pages: Vec::with_capacity(sub_pages_found),
        }
    }

    /// Adds a report, keeping `pages` sorted by index
    pub fn record(&mut self, report: SubPageReport) {
        let at = self.pages.partition_point(|p| p.index < report.index);
        self.pages.insert(at, report);
    }

    pub fn sub_pages_completed(&self) -> usize {
        self.pages.iter().filter(|p| p.state.is_success()).count()
    }

    pub fn sub_pages_skipped(&self) -> usize {
        self.pages.iter().filter(|p| p.state.is_skipped()).count()
    }

    pub fn images_found(&self) -> usize {
        self.pages.iter().map(|p| p.images_found).sum()
    }

    pub fn images_downloaded(&self) -> usize {
        self.pages.iter().map(|p| p.images_downloaded).sum()
    }

    pub fn images_failed(&self) -> usize {
        self.pages.iter().map(|p| p.images_failed).sum()
    }

    pub fn bytes_downloaded(&self) -> u64 {
        self.pages.iter().map(|p| p.bytes_downloaded).sum()
    }

    /// Share of found images that were saved, as a percentage
    pub fn success_rate(&self) -> f64 {
        let found = self.images_found();
        if found == 0 {
            return 0.0;
        }
        (self.images_downloaded() as f64 / found as f64) * 100.0
    }
}

/// Prints the summary to stdout in a formatted manner
pub fn print_summary(summary: &HarvestSummary) {
    println!("=== Harvest Summary ===\n");

    println!("Sub-pages:");
    println!("  Found: {}", summary.sub_pages_found);
    println!("  Completed: {}", summary.sub_pages_completed());
    println!("  Skipped: {}", summary.sub_pages_skipped());
    println!();

    println!("Images:");
    println!("  Found: {}", summary.images_found());
    println!("  Downloaded: {}", summary.images_downloaded());
    println!("  Failed: {}", summary.images_failed());
    println!("  Bytes written: {}", summary.bytes_downloaded());
    println!();

    let skipped: Vec<_> = summary.pages.iter().filter(|p| p.state.is_skipped()).collect();
    if !skipped.is_empty() {
        println!("Skipped Sub-pages ({}):", skipped.len());
        for page in skipped {
            println!("  - [{}] {} ({})", page.index, page.link, page.state);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} images saved)",
        summary.success_rate(),
        summary.images_downloaded(),
        summary.images_found()
    );
}
