//! Harvest coordinator - main orchestration logic
//!
//! This module contains the run loop that ties the pipeline together:
//! - Fetching the index page and selecting sub-page links
//! - Fetching each sub-page and creating its destination folder
//! - Downloading each sub-page's images through a bounded pool
//! - Emitting progress events and the single terminal notification
//! - Honouring cancellation between and during network calls

use crate::config::{validate, HarvestConfig};
use crate::crawler::downloader::{download_one, DownloadError};
use crate::crawler::fetcher::{build_http_client, PageFetcher};
use crate::crawler::parser::{extract_image_refs, extract_sub_page_links, ImageRef};
use crate::output::{HarvestSummary, SubPageReport};
use crate::progress::{forward_events, ProgressReporter, ProgressSink};
use crate::state::SubPageState;
use crate::url::{folder_name_for, image_file_name, LinkSelector};
use crate::HarvestError;
use futures_util::stream::{self, StreamExt};
use reqwest::Client;
use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Main harvest coordinator
///
/// A `Harvester` is cheap to share by reference; one instance can run any
/// number of harvests, one after another or concurrently, all observing the
/// same cancellation token.
pub struct Harvester {
    config: Arc<HarvestConfig>,
    client: Client,
    fetcher: PageFetcher,
    selector: LinkSelector,
    cancel: CancellationToken,
}

impl Harvester {
    /// Creates a new harvester
    ///
    /// # Arguments
    ///
    /// * `config` - The harvest configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Harvester)` - Configuration valid and HTTP client built
    /// * `Err(HarvestError)` - Invalid configuration or client setup failure
    pub fn new(config: HarvestConfig) -> Result<Self, HarvestError> {
        validate(&config)?;

        let client = build_http_client(&config.http)?;
        let fetcher = PageFetcher::new(client.clone(), config.http.page_timeout());
        let selector = LinkSelector::from_config(&config.links);

        Ok(Self {
            config: Arc::new(config),
            client,
            fetcher,
            selector,
            cancel: CancellationToken::new(),
        })
    }

    /// Replaces the sub-page link rule taken from the configuration
    pub fn with_selector(mut self, selector: LinkSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Uses an externally owned cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that aborts every run of this harvester when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Runs one harvest, reporting through `reporter`
    ///
    /// Exactly one terminal event is sent: `Succeeded` when the run finishes
    /// (even if individual sub-pages or images failed), `Failed` with the
    /// error message otherwise. Files written before a fatal error stay on
    /// disk.
    pub async fn run(
        &self,
        base_url: &str,
        save_dir: &Path,
        reporter: &ProgressReporter,
    ) -> Result<HarvestSummary, HarvestError> {
        let result = self.harvest(base_url, save_dir, reporter).await;

        match &result {
            Ok(summary) => {
                tracing::info!(
                    "Harvest of {} completed: {} images from {} sub-pages",
                    base_url,
                    summary.images_downloaded(),
                    summary.sub_pages_completed()
                );
                reporter.success();
            }
            Err(e) => {
                tracing::error!("Harvest of {} failed: {}", base_url, e);
                reporter.error(e.to_string());
            }
        }

        result
    }

    /// Runs one harvest and feeds its events to `sink`
    ///
    /// The sink is driven concurrently with the run and handed back once the
    /// last event has been applied.
    pub async fn run_with_sink<S: ProgressSink>(
        &self,
        base_url: &str,
        save_dir: &Path,
        sink: S,
    ) -> (S, Result<HarvestSummary, HarvestError>) {
        let (reporter, rx) = ProgressReporter::channel();

        let run = async move {
            let result = self.run(base_url, save_dir, &reporter).await;
            drop(reporter);
            result
        };

        let (result, sink) = tokio::join!(run, forward_events(rx, sink));
        (sink, result)
    }

    async fn harvest(
        &self,
        base_url: &str,
        save_dir: &Path,
        reporter: &ProgressReporter,
    ) -> Result<HarvestSummary, HarvestError> {
        let base = Url::parse(base_url).map_err(|source| HarvestError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;

        tracing::info!("Fetching index page {}", base);
        let links = {
            let index = self.until_cancelled(self.fetcher.fetch(&base)).await??;
            extract_sub_page_links(&index, &self.selector)
        };

        tokio::fs::create_dir_all(save_dir)
            .await
            .map_err(|source| HarvestError::Directory {
                path: save_dir.to_path_buf(),
                source,
            })?;

        reporter.log(format!("found {} sub-pages", links.len()));
        reporter.sub_page_total(links.len());

        let mut summary = HarvestSummary::new(links.len());
        let mut fatal = None;
        let mut finished = 0;

        // Sub-pages that map to the same folder would write the same file
        // paths, so they share a lock and run one after another
        let mut folder_locks: HashMap<String, Arc<Mutex<()>>> = HashMap::new();
        let jobs: Vec<_> = links
            .into_iter()
            .enumerate()
            .map(|(i, link)| {
                let folder_name = folder_name_for(link.as_str());
                let lock = Arc::clone(folder_locks.entry(folder_name.clone()).or_default());
                (i + 1, link, folder_name, lock)
            })
            .collect();

        let mut pages = stream::iter(jobs)
            .map(|(index, link, folder_name, lock)| {
                self.process_sub_page(index, link, folder_name, lock, save_dir, reporter)
            })
            .buffer_unordered(self.config.concurrency.max_concurrent_pages);

        // Drain every in-flight sub-page, even after a fatal error, so
        // cancelled downloads get to remove their partial files
        while let Some(result) = pages.next().await {
            match result {
                Ok(report) => {
                    finished += 1;
                    reporter.sub_page_progress(finished);
                    summary.record(report);
                }
                Err(e) => {
                    fatal.get_or_insert(e);
                }
            }
        }

        match fatal {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }

    /// Processes a single sub-page
    ///
    /// Fetch and folder failures skip the sub-page; image failures are
    /// logged and counted. Only cancellation is returned as an error.
    /// `folder_lock` is held for the whole sub-page.
    async fn process_sub_page(
        &self,
        index: usize,
        link: Url,
        folder_name: String,
        folder_lock: Arc<Mutex<()>>,
        save_dir: &Path,
        reporter: &ProgressReporter,
    ) -> Result<SubPageReport, HarvestError> {
        self.ensure_active()?;
        let _folder_guard = self.until_cancelled(folder_lock.lock()).await?;

        let mut report = SubPageReport::new(index, link.clone());
        reporter.log(format!("processing {}", link));
        report.advance(SubPageState::Fetching);

        let images = match self.until_cancelled(self.fetcher.fetch(&link)).await? {
            Ok(page) => extract_image_refs(&page),
            Err(e) => {
                tracing::warn!("Skipping sub-page {}: {}", link, e);
                reporter.log(format!("failed to fetch {}: {}", link, e));
                report.advance(SubPageState::FetchFailed);
                return Ok(report);
            }
        };

        let folder = save_dir.join(folder_name);
        if let Err(e) = tokio::fs::create_dir_all(&folder).await {
            tracing::warn!("Skipping sub-page {}: cannot create {}: {}", link, folder.display(), e);
            reporter.log(format!("failed to create folder {}: {}", folder.display(), e));
            report.advance(SubPageState::FolderFailed);
            return Ok(report);
        }

        report.folder = Some(folder.clone());
        report.images_found = images.len();
        report.advance(SubPageState::Downloading);

        reporter.log(format!("found {} images", images.len()));
        reporter.image_total(index, images.len());
        reporter.image_progress(index, 0);

        let mut cancelled = false;
        let mut attempted = 0;

        let mut downloads = stream::iter(images)
            .map(|image| self.download_image(image, &folder))
            .buffer_unordered(self.config.concurrency.max_concurrent_images);

        while let Some((image, result)) = downloads.next().await {
            match result {
                Ok(bytes) => {
                    report.images_downloaded += 1;
                    report.bytes_downloaded += bytes;
                }
                Err(e) if e.is_cancelled() => {
                    cancelled = true;
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Image {} of {} failed: {}", image.position, link, e);
                    reporter.log(format!("failed to download {}: {}", image.url, e));
                    report.images_failed += 1;
                }
            }

            attempted += 1;
            reporter.image_progress(index, attempted);
        }

        if cancelled {
            return Err(HarvestError::Cancelled);
        }

        report.advance(SubPageState::Completed);
        Ok(report)
    }

    async fn download_image(
        &self,
        image: ImageRef,
        folder: &Path,
    ) -> (ImageRef, Result<u64, DownloadError>) {
        let destination = folder.join(image_file_name(image.position, &image.url));
        tracing::debug!("Downloading {} -> {}", image.url, destination.display());

        let result = download_one(
            &self.client,
            &image.url,
            &destination,
            self.config.http.image_timeout(),
            &self.cancel,
        )
        .await;

        (image, result)
    }

    fn ensure_active(&self) -> Result<(), HarvestError> {
        if self.cancel.is_cancelled() {
            Err(HarvestError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Races a network call against cancellation
    async fn until_cancelled<F: Future>(&self, fut: F) -> Result<F::Output, HarvestError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(HarvestError::Cancelled),
            output = fut => Ok(output),
        }
    }
}

/// Runs a complete harvest with a fresh harvester
///
/// # Arguments
///
/// * `config` - The harvest configuration
/// * `base_url` - The index page to start from
/// * `save_dir` - Root directory for the per-sub-page folders
/// * `sink` - Observer receiving every progress event
///
/// # Returns
///
/// The sink, after it received the terminal event, and the run result.
///
/// # Example
///
/// ```no_run
/// use gallery_harvester::config::HarvestConfig;
/// use gallery_harvester::crawler::run_harvest;
/// use gallery_harvester::progress::TracingSink;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (_sink, result) = run_harvest(
///     HarvestConfig::default(),
///     "https://example.com/albums/",
///     Path::new("downloads"),
///     TracingSink::new(),
/// )
/// .await;
/// let summary = result?;
/// println!("{} images", summary.images_downloaded());
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest<S: ProgressSink>(
    config: HarvestConfig,
    base_url: &str,
    save_dir: &Path,
    sink: S,
) -> (S, Result<HarvestSummary, HarvestError>) {
    let harvester = match Harvester::new(config) {
        Ok(h) => h,
        Err(e) => {
            let mut sink = sink;
            sink.report_error(&e.to_string());
            return (sink, Err(e));
        }
    };

    harvester.run_with_sink(base_url, save_dir, sink).await
}
