//! CSVエクスポート

use std::fmt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use tracing::info;

use crate::error::ScraperError;
use crate::models::ListingRecord;

const FILE_PREFIX: &str = "olx_data_";
const FILE_EXTENSION: &str = "csv";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

type Clock = Arc<dyn Fn() -> DateTime<Local> + Send + Sync>;

/// リスティングをCSVファイルに書き出す
#[derive(Clone)]
pub struct CsvExporter {
    output_dir: PathBuf,
    clock: Clock,
}

impl fmt::Debug for CsvExporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsvExporter")
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

impl CsvExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            clock: Arc::new(Local::now),
        }
    }

    /// ファイル名に使う時刻の取得元を差し替える
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Local> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// 1件以上あればファイルを作成してパスを返す。0件なら何も書かない
    pub fn export(&self, records: &[ListingRecord]) -> Result<Option<PathBuf>, ScraperError> {
        if records.is_empty() {
            info!("No data to export.");
            return Ok(None);
        }

        std::fs::create_dir_all(&self.output_dir)?;

        let stem = format!("{}{}", FILE_PREFIX, (self.clock)().format(TIMESTAMP_FORMAT));
        let (path, file) = self.create_unique(&stem)?;

        let mut writer = csv::Writer::from_writer(file);
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        info!("Data successfully exported to {:?} ({} rows)", path, records.len());
        Ok(Some(path))
    }

    /// 同じ秒に書き出した既存ファイルは上書きせず、連番を付ける
    fn create_unique(&self, stem: &str) -> Result<(PathBuf, std::fs::File), ScraperError> {
        let mut attempt = 1;
        loop {
            let name = if attempt == 1 {
                format!("{}.{}", stem, FILE_EXTENSION)
            } else {
                format!("{}_{}.{}", stem, attempt, FILE_EXTENSION)
            };
            let path = self.output_dir.join(name);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}
