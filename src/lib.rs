//! OLX 中古車スクレイパーライブラリ
//!
//! - ロケーションで絞り込んだ検索結果を「もっと見る」でページ送りしながらURLを収集
//! - 各リスティングの詳細ページから項目を抽出（取れない項目は "N/A"）
//! - 結果をCSVに書き出し、進捗はスナップショットで参照できる
//!
//! # 使用例
//!
//! ```rust,ignore
//! use olx_scraper::{ChromeLauncher, JobResult, ScraperConfig, ScraperService};
//!
//! #[tokio::main]
//! async fn main() {
//!     let service = ScraperService::new(ChromeLauncher, ScraperConfig::from_env());
//!
//!     let handle = service.start("Jakarta Selatan", 3).unwrap();
//!     println!("{:?}", service.snapshot());
//!
//!     service.join(&handle).await;
//!     if let Ok(JobResult::Ready { file_name, .. }) = service.result(&handle).await {
//!         println!("CSV: {}", file_name);
//!     }
//! }
//! ```

pub mod chrome;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod olx;
pub mod progress;
pub mod service;
pub mod traits;

#[cfg(test)]
mod testing;

// 主要な型をリエクスポート
pub use chrome::{ChromeLauncher, ChromeSession};
pub use config::{ScraperConfig, Timeouts};
pub use error::ScraperError;
pub use export::CsvExporter;
pub use models::{JobStatus, ListingRecord, LocationFilter, ProgressState};
pub use olx::OlxScraper;
pub use progress::{CancelFlag, ProgressReporter, ProgressWriter};
pub use service::{JobHandle, JobResult, ScrapeRequest, ScraperService};
pub use traits::{BrowserSession, SessionLauncher, WaitCondition};
