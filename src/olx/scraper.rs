//! OLX スクレイパー実装
//!
//! 検索結果からリスティングURLを集め、各詳細ページを抽出してCSVに書き出す。
//! 1インスタンスにつき1回だけ `run` できる。

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::export::CsvExporter;
use crate::models::{JobStatus, ListingRecord, LocationFilter};
use crate::progress::{CancelFlag, ProgressReporter, ProgressWriter};
use crate::traits::BrowserSession;

use super::links::LinkCollector;
use super::listing::{ListingExtractor, ListingOutcome};
use super::pagination::PaginationController;
use super::search::{LocationSearch, SearchOutcome};

/// OLX スクレイパー
pub struct OlxScraper<S: BrowserSession> {
    session: S,
    config: ScraperConfig,
    progress: ProgressWriter,
    cancel: CancelFlag,
    exporter: CsvExporter,
}

impl<S: BrowserSession> OlxScraper<S> {
    pub fn new(session: S, config: ScraperConfig, progress: ProgressWriter) -> Self {
        let exporter = CsvExporter::new(config.output_dir.clone());
        Self {
            session,
            config,
            progress,
            cancel: CancelFlag::new(),
            exporter,
        }
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_exporter(mut self, exporter: CsvExporter) -> Self {
        self.exporter = exporter;
        self
    }

    pub fn reporter(&self) -> ProgressReporter {
        self.progress.reporter()
    }

    /// ジョブを最後まで実行する
    ///
    /// エラーはすべて進捗の `Error: ...` に記録して飲み込む。
    /// どの経路でもブラウザセッションは必ず1回だけ解放する。
    pub async fn run(mut self, location: &str, num_pages: u32) -> Option<PathBuf> {
        let result = match self.execute(location, num_pages).await {
            Ok(path) => path,
            Err(ScraperError::Cancelled) => {
                warn!("Scrape cancelled");
                self.progress.set_status(JobStatus::Cancelled);
                None
            }
            Err(e) => {
                error!("An error occurred: {}", e);
                self.progress.fail(&e);
                None
            }
        };

        if let Err(e) = self.session.quit().await {
            warn!("Failed to close browser session: {}", e);
        }

        result
    }

    async fn execute(&mut self, location: &str, num_pages: u32) -> Result<Option<PathBuf>, ScraperError> {
        self.progress.update(|state| state.total_pages = num_pages);
        self.progress.set_status(JobStatus::Initializing);

        info!("Navigating to {}", self.config.base_url);
        self.session.navigate(&self.config.base_url).await?;

        info!("Page loaded. Now inserting location and triggering search.");
        let search = LocationSearch::new(self.config.timeouts.search);
        let filter = match search.search(&self.session, location).await? {
            SearchOutcome::Applied => LocationFilter::Applied,
            SearchOutcome::Unfiltered(reason) => LocationFilter::Unfiltered(reason),
        };
        self.progress.update(|state| state.location_filter = filter);

        let links = self.discover(num_pages).await?;
        let records = self.extract_all(&links).await?;

        self.progress.set_status(JobStatus::Exporting);
        let path = self.exporter.export(&records)?;

        match &path {
            Some(path) => {
                let file_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().to_string());
                self.progress.update(|state| state.result_file_name = file_name);
            }
            None => info!("No listings were extracted, nothing exported"),
        }

        self.progress.set_status(JobStatus::Completed);
        info!("Scrape completed: {} records", records.len());
        Ok(path)
    }

    /// ページごとにリンクを集めて重複を除く
    async fn discover(&self, num_pages: u32) -> Result<HashSet<String>, ScraperError> {
        let collector = LinkCollector::new(self.config.timeouts.results);
        let pagination = PaginationController::new(&self.config.timeouts);
        let mut total_links: HashSet<String> = HashSet::new();

        for page in 1..=num_pages {
            self.cancel.check()?;
            self.progress.set_status(JobStatus::ScrapingPage(page));
            self.progress.update(|state| state.current_page = page);

            info!("Scraping links from page {}...", page);
            let links = collector.collect(&self.session).await?;
            let new_links: HashSet<String> = links
                .into_iter()
                .filter(|link| !total_links.contains(link))
                .collect();
            let new_count = new_links.len();
            total_links.extend(new_links);

            let discovered = total_links.len();
            self.progress.update(|state| {
                state.scraped_links = discovered;
                state.total_links = discovered;
            });
            info!(
                "Found {} new links on page {}. Total unique links so far: {}",
                new_count, page, discovered
            );

            if page < num_pages && !pagination.advance(&self.session).await? {
                info!("No more pages to load. Stopping scraping.");
                break;
            }
        }

        Ok(total_links)
    }

    /// 各URLの詳細ページを抽出。スキップしたURLも処理件数に数える
    async fn extract_all(&self, links: &HashSet<String>) -> Result<Vec<ListingRecord>, ScraperError> {
        self.progress.set_status(JobStatus::ScrapingListings);
        let total = links.len();
        self.progress.update(|state| {
            state.total_links = total;
            state.scraped_links = 0;
        });
        info!("Scraping data from {} unique links...", total);

        let extractor = ListingExtractor::new(self.config.timeouts.listing_title);
        let mut records = Vec::new();
        let mut skipped = 0;

        for (index, href) in links.iter().enumerate() {
            self.cancel.check()?;

            match extractor.extract(&self.session, href).await? {
                ListingOutcome::Extracted(record) => records.push(record),
                ListingOutcome::Skipped(_) => skipped += 1,
            }
            self.progress.update(|state| state.scraped_links = index + 1);
        }

        if skipped > 0 {
            warn!("{} of {} listings skipped", skipped, total);
        }
        Ok(records)
    }
}
