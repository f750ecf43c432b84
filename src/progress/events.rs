//! Progress events and the non-blocking reporter that sends them

use tokio::sync::mpsc;

/// A single progress notification emitted by a harvest run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Human-readable log line
    Log(String),

    /// Number of sub-pages discovered on the index page
    SubPageTotal(usize),

    /// Number of sub-pages finished so far
    SubPageProgress(usize),

    /// Number of images found on the sub-page at a 1-based index
    ImageTotal { sub_page: usize, total: usize },

    /// Number of image downloads attempted so far on a sub-page
    ImageProgress { sub_page: usize, done: usize },

    /// The run finished; per-item failures may still have been logged
    Succeeded,

    /// The run stopped on a fatal error
    Failed(String),
}

impl ProgressEvent {
    /// Returns true for the single event that ends every run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed(_))
    }
}

/// Sending half of the progress channel
///
/// Sending never blocks and never fails from the caller's point of view: if
/// the consumer has gone away, events are dropped and the run carries on.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl ProgressReporter {
    /// Creates a reporter together with the receiver its events arrive on
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// Creates a reporter that discards every event
    pub fn disconnected() -> Self {
        Self { tx: None }
    }

    pub fn send(&self, event: ProgressEvent) {
        if let Some(tx) = &self.tx {
            if tx.send(event).is_err() {
                tracing::trace!("Progress receiver closed, dropping event");
            }
        }
    }

    pub fn log(&self, message: impl Into<String>) {
        self.send(ProgressEvent::Log(message.into()));
    }

    pub fn sub_page_total(&self, total: usize) {
        self.send(ProgressEvent::SubPageTotal(total));
    }

    pub fn sub_page_progress(&self, done: usize) {
        self.send(ProgressEvent::SubPageProgress(done));
    }

    pub fn image_total(&self, sub_page: usize, total: usize) {
        self.send(ProgressEvent::ImageTotal { sub_page, total });
    }

    pub fn image_progress(&self, sub_page: usize, done: usize) {
        self.send(ProgressEvent::ImageProgress { sub_page, done });
    }

    pub fn success(&self) {
        self.send(ProgressEvent::Succeeded);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(ProgressEvent::Failed(message.into()));
    }
}
