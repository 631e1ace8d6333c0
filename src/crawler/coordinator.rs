//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! archiving a site, including:
//! - Checking the seed and output root before anything is fetched
//! - Managing the frontier queue
//! - Coordinating fetching, asset saving, rewriting and link discovery
//! - Recording every non-fatal error in the crawl report
//! - Writing the bookmarks viewer at the end

use crate::archive::{ArchiveWriter, BOOKMARKS_PAGE, BOOKMARK_SCRIPT};
use crate::config::{validate, Config};
use crate::crawler::charset::{decode_page, encode_page};
use crate::crawler::css::{extract_css_references, rewrite_css_references};
use crate::crawler::fetcher::{Fetched, ResourceFetcher};
use crate::crawler::scheduler::{Frontier, PushOutcome};
use crate::crawler::transform::{collect_assets, rewrite_page, AssetKind, RewriteContext};
use crate::output::{CrawlReport, ErrorKind};
use crate::url::{
    parse_seed, relativize, without_fragment, ArchivePath, PathMapper, PathRole, SiteScope,
};
use crate::{ArchiveError, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use url::Url;

/// Main crawler coordinator structure
///
/// Owns all mutable state of one crawl: the frontier, the visited set, the
/// per-run resource memo and the report. It is consumed by [`Coordinator::run`].
pub struct Coordinator {
    config: Config,
    seed: Url,
    scope: SiteScope,
    mapper: PathMapper,
    fetcher: ResourceFetcher,
    writer: ArchiveWriter,
    frontier: Frontier,

    /// Every URL fetched this run, page or asset, by visit key, with where it
    /// was saved; None when fetching or writing failed
    resources: HashMap<String, Option<ArchivePath>>,

    report: CrawlReport,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The archiver configuration
    /// * `seed` - The URL the crawl starts from
    /// * `output_root` - Directory the archive is written to
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(ArchiveError)` - Invalid configuration, unusable seed, unwritable
    ///   output root, or an HTTP client that could not be built
    pub fn new(config: Config, seed: &str, output_root: impl Into<PathBuf>) -> Result<Self> {
        validate(&config)?;

        let seed_url = parse_seed(seed).map_err(|e| ArchiveError::InvalidSeed {
            url: seed.to_string(),
            reason: e.to_string(),
        })?;
        let scope = SiteScope::from_url(&seed_url).ok_or_else(|| ArchiveError::InvalidSeed {
            url: seed.to_string(),
            reason: "no host to scope the crawl to".to_string(),
        })?;

        let writer = ArchiveWriter::new(output_root)?;
        let fetcher = ResourceFetcher::new(&config.crawler, &config.user_agent)?;
        let mapper = PathMapper::from_config(&config);

        let mut frontier =
            Frontier::new(scope.clone(), mapper.clone()).with_page_budget(config.crawler.max_pages);
        frontier.push(&seed_url);

        Ok(Self {
            report: CrawlReport::new(seed_url.as_str()),
            config,
            seed: seed_url,
            scope,
            mapper,
            fetcher,
            writer,
            frontier,
            resources: HashMap::new(),
        })
    }

    /// Returns the normalized seed URL
    pub fn seed(&self) -> &Url {
        &self.seed
    }

    /// Runs the main crawl loop
    ///
    /// This is the core crawling logic that:
    /// 1. Gets URLs from the frontier until it is empty (or the page budget is spent)
    /// 2. Fetches each page and saves non-HTML pages as they are
    /// 3. Saves the page's same-site assets
    /// 4. Rewrites and saves the page
    /// 5. Queues newly discovered same-site links
    ///
    /// Per-page and per-asset failures never end the loop; they are recorded
    /// in the returned report.
    pub async fn run(mut self) -> Result<CrawlReport> {
        tracing::info!(
            "Archiving {} into {}",
            self.seed,
            self.writer.root().display()
        );

        let mut pages_crawled: u64 = 0;
        let start_time = std::time::Instant::now();

        while let Some(url) = self.frontier.next_url() {
            tracing::debug!("Processing URL: {}", url);
            self.process_page(&url).await;

            pages_crawled += 1;

            // Progress reporting every 10 pages
            if pages_crawled % 10 == 0 {
                let elapsed = start_time.elapsed();
                let rate = pages_crawled as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
                tracing::info!(
                    "Progress: {} pages crawled, {} in frontier, {:.2} pages/sec",
                    pages_crawled,
                    self.frontier.frontier_size(),
                    rate
                );
            }
        }

        if self.frontier.budget_spent() && !self.frontier.is_empty() {
            self.report.pages_remaining = self.frontier.frontier_size() as u64;
            tracing::info!(
                "Page budget of {} reached, {} URLs left in frontier",
                self.config.crawler.max_pages,
                self.frontier.frontier_size()
            );
        } else {
            tracing::info!("Frontier is empty, crawl complete");
        }

        self.write_bookmarks_page().await;
        self.report.finish();

        tracing::info!(
            "Crawl completed: {} pages crawled in {:?}, {} errors",
            pages_crawled,
            start_time.elapsed(),
            self.report.error_count()
        );

        Ok(self.report)
    }

    /// Processes a single page URL
    async fn process_page(&mut self, url: &Url) {
        self.report.record_visit();

        let page_path = self.mapper.to_archive_path(url, PathRole::Page);
        let key = self.mapper.visit_key(url);
        if let Some(earlier) = self.resources.get(&key).cloned() {
            self.reuse_resource(url, earlier, &page_path).await;
            return;
        }

        let Some(fetched) = self.fetch(url).await else {
            self.resources.insert(key, None);
            return;
        };

        // A same-site redirect target is the same page under another name; it
        // is saved at both locations so links to either keep working
        let base_url = without_fragment(&fetched.final_url);
        let mut keys = vec![key];
        let mut page_paths = vec![page_path];
        if self.scope.contains(&base_url) {
            let redirect_key = self.mapper.visit_key(&base_url);
            if !keys.contains(&redirect_key) {
                tracing::debug!("{} redirected to {}", url, base_url);
                self.frontier.mark_visited(&base_url);
                keys.push(redirect_key);

                let redirect_path = self.mapper.to_archive_path(&base_url, PathRole::Page);
                if redirect_path != page_paths[0] {
                    page_paths.push(redirect_path);
                }
            }
        }

        if !fetched.is_html() {
            tracing::info!(
                "Saving non-HTML content at {} ({})",
                url,
                fetched.content_type.as_deref().unwrap_or("no content type")
            );
            let saved = self.store_all(url, &page_paths, &fetched.body).await;
            if saved {
                self.report.record_asset_saved();
            }
            self.remember(&keys, saved.then(|| page_paths[0].clone()));
            return;
        }

        let page = decode_page(url, fetched.content_type.as_deref(), &fetched.body);
        if let Some(error) = &page.error {
            tracing::warn!("{}; rewriting a lossy decoding", error);
            self.report
                .record_error(ErrorKind::Parse, url.as_str(), error.to_string());
        }

        tracing::info!("Crawling: {}", url);

        // Claimed before the assets are saved, so a page referencing itself
        // is not fetched again
        self.remember(&keys, Some(page_paths[0].clone()));

        for asset in collect_assets(&page.text, &base_url, &self.scope, &self.mapper) {
            self.save_asset(&asset.url, asset.kind).await;
        }

        let script = self
            .config
            .archive
            .inject_bookmark_button
            .then_some(BOOKMARK_SCRIPT);
        let mut links = Vec::new();
        let mut saved = false;
        for (i, page_path) in page_paths.iter().enumerate() {
            let transformed = rewrite_page(
                &page.text,
                &RewriteContext {
                    page_url: &base_url,
                    page_path,
                    scope: &self.scope,
                    mapper: &self.mapper,
                    assets: &self.resources,
                    bookmark_script: script,
                },
            );

            if i == 0 {
                if script.is_some() && !transformed.injected {
                    tracing::debug!("No <body> in {}, bookmark button not added", url);
                }
                links = transformed.links;
            }

            let bytes = encode_page(&transformed.html, page.encoding);
            saved |= self.store(url, page_path, &bytes).await;
        }
        if saved {
            self.report.record_page_saved();
        } else {
            self.remember(&keys, None);
        }

        let mut queued = 0;
        for link in &links {
            if self.frontier.push(link) == PushOutcome::Queued {
                queued += 1;
            }
        }
        tracing::debug!(
            "{}: {} links found, {} newly queued",
            url,
            links.len(),
            queued
        );
    }

    /// Handles a dequeued page that was already fetched this run as an asset
    ///
    /// Nothing is fetched again. If the page role puts the URL somewhere else,
    /// the saved copy is duplicated there so hyperlinks to it resolve.
    async fn reuse_resource(&mut self, url: &Url, earlier: Option<ArchivePath>, page_path: &ArchivePath) {
        let Some(saved) = earlier else {
            tracing::debug!("Not fetching {} again, it failed earlier in this run", url);
            return;
        };
        if saved == *page_path {
            tracing::debug!("{} was already saved as an asset", url);
            return;
        }

        match tokio::fs::read(self.writer.location(&saved)).await {
            Ok(bytes) => {
                tracing::debug!("Copying {} from {} to {}", url, saved, page_path);
                self.store(url, page_path, &bytes).await;
            }
            Err(e) => {
                tracing::error!("Failed to read saved copy {} of {}: {}", saved, url, e);
                self.report.record_error(
                    ErrorKind::Write,
                    url.as_str(),
                    format!("Failed to read saved copy {}: {}", saved, e),
                );
            }
        }
    }

    fn remember(&mut self, keys: &[String], saved: Option<ArchivePath>) {
        for key in keys {
            self.resources.insert(key.clone(), saved.clone());
        }
    }

    /// Fetches and saves one asset referenced by a page, at most once per run
    ///
    /// Stylesheets, and anything served as CSS, have their own references
    /// saved and rewritten first.
    async fn save_asset(&mut self, url: &Url, kind: AssetKind) -> Option<ArchivePath> {
        let key = self.mapper.visit_key(url);
        if let Some(done) = self.resources.get(&key) {
            return done.clone();
        }

        let path = self.mapper.to_archive_path(url, PathRole::Asset);
        let saved = match self.fetch(url).await {
            Some(fetched) => {
                let body = if kind == AssetKind::Stylesheet || fetched.is_css() {
                    let base = without_fragment(&fetched.final_url);
                    self.rewrite_stylesheet(&base, &path, fetched.body).await
                } else {
                    fetched.body
                };
                self.store_asset(url, path, &body).await
            }
            None => None,
        };

        self.resources.insert(key, saved.clone());
        saved
    }

    /// Fetches and saves an asset referenced from a stylesheet, at most once per run
    ///
    /// The content is saved as-is, so `@import` chains end here.
    async fn save_nested_asset(&mut self, url: &Url) -> Option<ArchivePath> {
        let key = self.mapper.visit_key(url);
        if let Some(done) = self.resources.get(&key) {
            return done.clone();
        }

        let path = self.mapper.to_archive_path(url, PathRole::Asset);
        let saved = match self.fetch(url).await {
            Some(fetched) => self.store_asset(url, path, &fetched.body).await,
            None => None,
        };

        self.resources.insert(key, saved.clone());
        saved
    }

    /// Saves the same-site references of a stylesheet and points them at the saved copies
    async fn rewrite_stylesheet(&mut self, base_url: &Url, sheet_path: &ArchivePath, body: Vec<u8>) -> Vec<u8> {
        let css = match String::from_utf8(body) {
            Ok(css) => css,
            Err(e) => {
                tracing::debug!("Stylesheet {} is not UTF-8, saving it unmodified", base_url);
                return e.into_bytes();
            }
        };

        let mut targets: HashMap<String, String> = HashMap::new();
        for raw in extract_css_references(&css) {
            if targets.contains_key(&raw) {
                continue;
            }
            let Some(target) = self
                .mapper
                .resolve(base_url, &raw)
                .filter(|url| self.scope.contains(url))
            else {
                continue;
            };
            if let Some(saved) = self.save_nested_asset(&target).await {
                targets.insert(raw, relativize(sheet_path, &saved));
            }
        }

        rewrite_css_references(&css, |raw| targets.get(raw).cloned()).into_bytes()
    }

    /// Fetches a URL, recording a failure in the report
    async fn fetch(&mut self, url: &Url) -> Option<Fetched> {
        match self.fetcher.fetch(url).await {
            Ok(fetched) => Some(fetched),
            Err(e) => {
                tracing::warn!("Failed to download {}: {}", url, e);
                self.report
                    .record_error(ErrorKind::Fetch, url.as_str(), e.to_string());
                None
            }
        }
    }

    async fn store_asset(&mut self, url: &Url, path: ArchivePath, bytes: &[u8]) -> Option<ArchivePath> {
        if self.store(url, &path, bytes).await {
            self.report.record_asset_saved();
            Some(path)
        } else {
            None
        }
    }

    /// Writes content for `url` at every path, returning true if any write succeeded
    async fn store_all(&mut self, url: &Url, paths: &[ArchivePath], bytes: &[u8]) -> bool {
        let mut saved = false;
        for path in paths {
            saved |= self.store(url, path, bytes).await;
        }
        saved
    }

    /// Writes content for `url`, recording a failure in the report
    async fn store(&mut self, url: &Url, path: &ArchivePath, bytes: &[u8]) -> bool {
        match self.writer.write(path, bytes).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("Failed to save {} at {}: {}", url, path, e);
                self.report
                    .record_error(ErrorKind::Write, url.as_str(), e.to_string());
                false
            }
        }
    }

    async fn write_bookmarks_page(&mut self) {
        let path = ArchivePath::root_file(&self.config.archive.bookmarks_page);
        match self.writer.write(&path, BOOKMARKS_PAGE.as_bytes()).await {
            Ok(location) => tracing::info!("Bookmarks page written to {}", location.display()),
            Err(e) => {
                tracing::error!("Failed to write bookmarks page: {}", e);
                self.report
                    .record_error(ErrorKind::Write, path.as_str(), e.to_string());
            }
        }
    }
}

/// Archives the site reachable from `seed` into `output_root`
///
/// Convenience wrapper around [`Coordinator::new`] and [`Coordinator::run`].
pub async fn run_archive(config: Config, seed: &str, output_root: impl Into<PathBuf>) -> Result<CrawlReport> {
    Coordinator::new(config, seed, output_root)?.run().await
}
