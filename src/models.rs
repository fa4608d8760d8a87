//! リスティング・進捗の型定義

use std::fmt;

use serde::{Serialize, Serializer};

/// 取得できなかった項目の代替値
pub const NOT_AVAILABLE: &str = "N/A";

/// エクスポート列（この順で出力）
pub const COLUMNS: [&str; 8] = [
    "Title",
    "SubBrand",
    "Location",
    "Price",
    "Fuel",
    "Mileage",
    "Transmission",
    "URL",
];

/// 中古車リスティング1件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingRecord {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "SubBrand")]
    pub sub_brand: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Price")]
    pub price: String,
    #[serde(rename = "Fuel")]
    pub fuel: String,
    #[serde(rename = "Mileage")]
    pub mileage: String,
    #[serde(rename = "Transmission")]
    pub transmission: String,
    #[serde(rename = "URL")]
    pub url: String,
}

/// ジョブの状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// ジョブが一度も開始されていない
    Idle,
    NotStarted,
    Initializing,
    ScrapingPage(u32),
    ScrapingListings,
    Exporting,
    Completed,
    Cancelled,
    Error(String),
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Cancelled | JobStatus::Error(_)
        )
    }

    pub fn is_running(&self) -> bool {
        !self.is_terminal() && *self != JobStatus::Idle
    }

    /// フェーズの順序。1回の実行中に小さくなることはない
    pub fn phase(&self) -> u8 {
        match self {
            JobStatus::Idle | JobStatus::NotStarted => 0,
            JobStatus::Initializing => 1,
            JobStatus::ScrapingPage(_) => 2,
            JobStatus::ScrapingListings => 3,
            JobStatus::Exporting => 4,
            JobStatus::Completed | JobStatus::Cancelled | JobStatus::Error(_) => 5,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Idle => write!(f, "No scraping in progress"),
            JobStatus::NotStarted => write!(f, "Not started"),
            JobStatus::Initializing => write!(f, "Initializing"),
            JobStatus::ScrapingPage(page) => write!(f, "Scraping page {}", page),
            JobStatus::ScrapingListings => write!(f, "Scraping individual listings"),
            JobStatus::Exporting => write!(f, "Exporting data"),
            JobStatus::Completed => write!(f, "Completed"),
            JobStatus::Cancelled => write!(f, "Cancelled"),
            JobStatus::Error(message) => write!(f, "Error: {}", message),
        }
    }
}

impl Serialize for JobStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// ロケーション検索の結果
///
/// 検索に失敗しても絞り込みなしのトップページで続行するため、
/// その事実を進捗に残す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationFilter {
    Pending,
    Applied,
    Unfiltered(String),
}

impl fmt::Display for LocationFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationFilter::Pending => write!(f, "pending"),
            LocationFilter::Applied => write!(f, "applied"),
            LocationFilter::Unfiltered(reason) => write!(f, "unfiltered: {}", reason),
        }
    }
}

impl Serialize for LocationFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 進捗スナップショット
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressState {
    pub status: JobStatus,
    pub current_page: u32,
    pub total_pages: u32,
    pub scraped_links: usize,
    pub total_links: usize,
    #[serde(rename = "filename")]
    pub result_file_name: Option<String>,
    pub location_filter: LocationFilter,
}

impl ProgressState {
    /// 新規ジョブの初期状態
    pub fn new() -> Self {
        Self {
            status: JobStatus::NotStarted,
            current_page: 0,
            total_pages: 0,
            scraped_links: 0,
            total_links: 0,
            result_file_name: None,
            location_filter: LocationFilter::Pending,
        }
    }

    /// ジョブ未開始を表す状態
    pub fn no_job() -> Self {
        Self {
            status: JobStatus::Idle,
            ..Self::new()
        }
    }
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::new()
    }
}
