//! Configuration module for Gallery Harvester
//!
//! This module handles the harvest settings: HTTP identity and timeouts, the
//! sub-page link rule, and concurrency bounds. Every setting has a default, so
//! an empty TOML file (or `HarvestConfig::default()`) is a complete config.
//!
//! # Example
//!
//! ```no_run
//! use gallery_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Image timeout: {}s", config.http.image_timeout_secs);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ConcurrencyConfig, HarvestConfig, HttpConfig, LinkRuleConfig};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
