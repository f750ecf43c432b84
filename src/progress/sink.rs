//! Progress observers and the task that feeds them

use crate::progress::ProgressEvent;
use crate::state::ProgressState;
use tokio::sync::mpsc;

/// Observer of a harvest run
///
/// Implemented by front ends (console, GUI, test recorders). A sink only
/// ever receives events from one consumer task, so methods take `&mut self`
/// and need no internal synchronisation.
pub trait ProgressSink {
    /// A human-readable log line
    fn log(&mut self, message: &str);

    /// Number of sub-pages discovered on the index page
    fn set_sub_page_total(&mut self, total: usize);

    /// Number of sub-pages finished so far
    fn set_sub_page_progress(&mut self, done: usize);

    /// Image count of the sub-page at `sub_page` (1-based); resets its progress
    fn set_image_total(&mut self, sub_page: usize, total: usize);

    /// Number of images attempted so far on the sub-page at `sub_page`
    fn set_image_progress(&mut self, sub_page: usize, done: usize);

    /// The run completed
    fn report_success(&mut self);

    /// The run stopped on a fatal error
    fn report_error(&mut self, message: &str);

    /// Dispatches one event to the matching method
    fn apply(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::Log(message) => self.log(&message),
            ProgressEvent::SubPageTotal(total) => self.set_sub_page_total(total),
            ProgressEvent::SubPageProgress(done) => self.set_sub_page_progress(done),
            ProgressEvent::ImageTotal { sub_page, total } => {
                self.set_image_total(sub_page, total)
            }
            ProgressEvent::ImageProgress { sub_page, done } => {
                self.set_image_progress(sub_page, done)
            }
            ProgressEvent::Succeeded => self.report_success(),
            ProgressEvent::Failed(message) => self.report_error(&message),
        }
    }
}

/// Records every event verbatim
impl ProgressSink for Vec<ProgressEvent> {
    fn log(&mut self, message: &str) {
        self.push(ProgressEvent::Log(message.to_string()));
    }

    fn set_sub_page_total(&mut self, total: usize) {
        self.push(ProgressEvent::SubPageTotal(total));
    }

    fn set_sub_page_progress(&mut self, done: usize) {
        self.push(ProgressEvent::SubPageProgress(done));
    }

    fn set_image_total(&mut self, sub_page: usize, total: usize) {
        self.push(ProgressEvent::ImageTotal { sub_page, total });
    }

    fn set_image_progress(&mut self, sub_page: usize, done: usize) {
        self.push(ProgressEvent::ImageProgress { sub_page, done });
    }

    fn report_success(&mut self) {
        self.push(ProgressEvent::Succeeded);
    }

    fn report_error(&mut self, message: &str) {
        self.push(ProgressEvent::Failed(message.to_string()));
    }
}

/// Drains the progress channel into a sink until every reporter is dropped
///
/// Returns the sink so callers can inspect whatever it accumulated.
pub async fn forward_events<S: ProgressSink>(
    mut rx: mpsc::UnboundedReceiver<ProgressEvent>,
    mut sink: S,
) -> S {
    while let Some(event) = rx.recv().await {
        sink.apply(event);
    }
    sink
}

/// Console sink that renders progress as tracing records
#[derive(Debug, Default)]
pub struct TracingSink {
    state: ProgressState,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters as last reported
    pub fn state(&self) -> &ProgressState {
        &self.state
    }
}

impl ProgressSink for TracingSink {
    fn log(&mut self, message: &str) {
        tracing::info!("{}", message);
    }

    fn set_sub_page_total(&mut self, total: usize) {
        self.state.apply(&ProgressEvent::SubPageTotal(total));
    }

    fn set_sub_page_progress(&mut self, done: usize) {
        if self.state.apply(&ProgressEvent::SubPageProgress(done)) {
            tracing::info!(
                "Sub-pages: {}/{}",
                self.state.sub_page_current,
                self.state.sub_page_total
            );
        }
    }

    fn set_image_total(&mut self, sub_page: usize, total: usize) {
        self.state
            .apply(&ProgressEvent::ImageTotal { sub_page, total });
    }

    fn set_image_progress(&mut self, sub_page: usize, done: usize) {
        if self
            .state
            .apply(&ProgressEvent::ImageProgress { sub_page, done })
        {
            tracing::debug!(
                "Sub-page {} images: {}/{}",
                sub_page,
                self.state.image_current,
                self.state.image_total
            );
        }
    }

    fn report_success(&mut self) {
        tracing::info!("All images downloaded");
    }

    fn report_error(&mut self, message: &str) {
        tracing::error!("Harvest failed: {}", message);
    }
}
