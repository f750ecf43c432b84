//! Crawler module for page fetching and image harvesting
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching with charset detection
//! - HTML parsing and link/image extraction
//! - Streaming image downloads
//! - Overall harvest coordination

mod coordinator;
mod downloader;
mod fetcher;
mod parser;

pub use coordinator::{run_harvest, Harvester};
pub use downloader::{download_one, DownloadError, WRITE_CHUNK_SIZE};
pub use fetcher::{build_http_client, decode_body, FetchError, PageFetcher};
pub use parser::{extract_image_refs, extract_sub_page_links, ImageRef, PageDocument};
