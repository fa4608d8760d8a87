//! OLX スクレイパーモジュール
//!
//! 中古車カテゴリの検索結果を巡回し、各リスティングの詳細を取得する

mod links;
mod listing;
mod pagination;
mod scraper;
mod search;
pub mod selectors;

pub use links::LinkCollector;
pub use listing::{ListingExtractor, ListingOutcome};
pub use pagination::PaginationController;
pub use scraper::OlxScraper;
pub use search::{LocationSearch, SearchOutcome};
