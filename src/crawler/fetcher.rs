//! HTTP page fetcher
//!
//! This module handles every page request of a harvest, including:
//! - Building the shared HTTP client with the configured user agent
//! - GET requests for the index page and sub-pages
//! - Detecting the character encoding from the body bytes
//! - Error classification

use crate::config::HttpConfig;
use crate::crawler::parser::PageDocument;
use chardetng::EncodingDetector;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors that can occur while retrieving a page
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS, redirect or body-read failure
    #[error("network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("timeout fetching {url}")]
    Timeout { url: String },

    /// Any non-2xx response
    #[error("HTTP {status} fetching {url}")]
    HttpStatus { url: String, status: u16 },
}

impl FetchError {
    fn from_reqwest(url: &Url, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Network {
                url: url.to_string(),
                source,
            }
        }
    }

    /// HTTP status code, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Builds the HTTP client shared by page fetches and image downloads
///
/// # Arguments
///
/// * `config` - The HTTP configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use gallery_harvester::config::HttpConfig;
/// use gallery_harvester::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    // Request timeouts are set per request: pages and images use different ones
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .connect_timeout(config.connect_timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Decodes a page body using the encoding detected from its bytes
///
/// The `Content-Type` charset is deliberately ignored: pages in the wild
/// often declare the wrong one. A byte-order mark, when present, wins over
/// detection. Malformed sequences are replaced with U+FFFD, so decoding
/// never fails.
pub fn decode_body(bytes: &[u8]) -> String {
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);

    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!(
            "Body contained sequences invalid in {}, replaced",
            used.name()
        );
    }

    text.into_owned()
}

/// Fetches pages and parses them into documents
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    timeout: Duration,
}

impl PageFetcher {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Fetches a URL and parses the body into a [`PageDocument`]
    ///
    /// # Request Flow
    ///
    /// 1. Send GET with the client's user agent (redirects are followed)
    /// 2. Reject any non-2xx status
    /// 3. Read the full body and detect its encoding from the bytes
    /// 4. Parse the decoded text with the lenient HTML5 parser
    ///
    /// The returned document keeps `url` (the requested URL) as its base for
    /// resolving relative references.
    pub async fn fetch(&self, url: &Url) -> Result<PageDocument, FetchError> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let text = decode_body(&bytes);
        Ok(PageDocument::parse(url.clone(), text))
    }
}
