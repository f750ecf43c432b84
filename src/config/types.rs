use serde::Deserialize;
use std::time::Duration;

/// Browser-like identity sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

/// Main configuration structure for a harvest run
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub http: HttpConfig,
    pub links: LinkRuleConfig,
    pub concurrency: ConcurrencyConfig,
}

/// HTTP identity and timeouts
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HttpConfig {
    /// Value of the `User-Agent` header
    pub user_agent: String,

    /// Whole-request timeout for page fetches (seconds)
    pub page_timeout_secs: u64,

    /// Read timeout for image downloads (seconds)
    pub image_timeout_secs: u64,

    /// TCP/TLS connect timeout (seconds)
    pub connect_timeout_secs: u64,
}

impl HttpConfig {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn image_timeout(&self) -> Duration {
        Duration::from_secs(self.image_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            page_timeout_secs: 30,
            image_timeout_secs: 10,
            connect_timeout_secs: 10,
        }
    }
}

/// Rule deciding which anchors on the index page are gallery sub-pages
///
/// An href qualifies when it ends with any suffix or contains any marker.
/// Both comparisons are case-sensitive and run on the raw attribute value.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LinkRuleConfig {
    pub suffixes: Vec<String>,
    pub markers: Vec<String>,
}

impl Default for LinkRuleConfig {
    fn default() -> Self {
        Self {
            suffixes: vec![".html".to_string()],
            markers: vec!["NO.".to_string()],
        }
    }
}

/// Worker pool bounds
///
/// Sub-pages whose links map to the same folder name (duplicate links
/// included) never run at the same time, whatever `max-concurrent-pages` is.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ConcurrencyConfig {
    /// Sub-pages processed at the same time
    pub max_concurrent_pages: usize,

    /// Image downloads in flight per sub-page
    pub max_concurrent_images: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_concurrent_pages: 1,
            max_concurrent_images: 4,
        }
    }
}
