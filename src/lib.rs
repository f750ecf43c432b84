//! Gallery Harvester: a recursive web-image downloader
//!
//! This crate fetches an index page, discovers its gallery sub-pages, and
//! downloads every image of each sub-page into its own folder, streaming
//! progress events to an injected observer.

pub mod config;
pub mod crawler;
pub mod output;
pub mod progress;
pub mod state;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

pub use crawler::{DownloadError, FetchError};

/// Main error type for a harvest run
///
/// Every variant here is fatal to the run. Per-sub-page and per-image
/// failures are logged and skipped instead of surfacing as errors.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        source: ::url::ParseError,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to create directory {}: {source}", .path.display())]
    Directory {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Harvest cancelled")]
    Cancelled,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::HarvestConfig;
pub use crawler::Harvester;
pub use output::HarvestSummary;
pub use progress::{ProgressEvent, ProgressReporter, ProgressSink};
pub use state::{ProgressState, SubPageState};
pub use url::LinkSelector;
