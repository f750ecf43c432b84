/// Sub-page state definitions for tracking harvest progress
///
/// This module defines every state a sub-page can be in during a run.
use std::fmt;

/// Represents the current state of a sub-page in the harvest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubPageState {
    // ===== Active States =====
    /// Discovered on the index page, not yet started
    Pending,

    /// The sub-page itself is being fetched
    Fetching,

    /// Its folder exists and images are being downloaded
    Downloading,

    // ===== Terminal Success States =====
    /// Every image was attempted (individual images may have failed)
    Completed,

    // ===== Terminal Skip States =====
    /// The sub-page could not be fetched
    FetchFailed,

    /// Its destination folder could not be created
    FolderFailed,
}

impl SubPageState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Returns true if the sub-page may still be processed
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Fetching | Self::Downloading)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns true if the sub-page was skipped after a failure
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::FetchFailed | Self::FolderFailed)
    }

    /// Returns true if moving from this state to `next` is allowed
    ///
    /// The lifecycle is strictly forward:
    /// Pending → Fetching → (FetchFailed | Downloading | FolderFailed)
    /// and Downloading → Completed.
    pub fn can_transition_to(&self, next: SubPageState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Fetching)
                | (Self::Fetching, Self::FetchFailed)
                | (Self::Fetching, Self::FolderFailed)
                | (Self::Fetching, Self::Downloading)
                | (Self::Downloading, Self::Completed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Downloading => "downloading",
            Self::Completed => "completed",
            Self::FetchFailed => "fetch_failed",
            Self::FolderFailed => "folder_failed",
        }
    }
}

impl fmt::Display for SubPageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
