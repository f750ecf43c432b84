//! Progress counters derived from the event stream

use crate::progress::ProgressEvent;

/// Counters a progress display renders
///
/// Sub-page counters cover the whole run; image counters describe the most
/// recently announced sub-page and reset whenever a new image total arrives.
/// Progress never moves backwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressState {
    pub sub_page_total: usize,
    pub sub_page_current: usize,

    /// 1-based index of the sub-page the image counters belong to
    pub image_sub_page: usize,
    pub image_total: usize,
    pub image_current: usize,
}

impl ProgressState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one event into the counters
    ///
    /// Returns true if any counter changed. Stale progress (lower than what
    /// was already seen, or for a sub-page that is no longer current) is
    /// ignored.
    pub fn apply(&mut self, event: &ProgressEvent) -> bool {
        let before = self.clone();

        match *event {
            ProgressEvent::SubPageTotal(total) => {
                self.sub_page_total = total;
            }
            ProgressEvent::SubPageProgress(done) => {
                self.sub_page_current = self.sub_page_current.max(done);
            }
            ProgressEvent::ImageTotal { sub_page, total } => {
                self.image_sub_page = sub_page;
                self.image_total = total;
                self.image_current = 0;
            }
            ProgressEvent::ImageProgress { sub_page, done } => {
                if sub_page == self.image_sub_page {
                    self.image_current = self.image_current.max(done);
                }
            }
            ProgressEvent::Log(_) | ProgressEvent::Succeeded | ProgressEvent::Failed(_) => {}
        }

        *self != before
    }

    pub fn sub_pages_complete(&self) -> bool {
        self.sub_page_current >= self.sub_page_total
    }

    pub fn images_complete(&self) -> bool {
        self.image_current >= self.image_total
    }
}
