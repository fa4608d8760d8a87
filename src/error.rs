use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("ブラウザ初期化エラー: {0}")]
    BrowserInit(String),

    #[error("ナビゲーションエラー: {0}")]
    Navigation(String),

    #[error("タイムアウト: {0}")]
    Timeout(String),

    #[error("要素が見つかりません: {0}")]
    ElementNotFound(String),

    #[error("JavaScript実行エラー: {0}")]
    JavaScript(String),

    #[error("ブラウザセッション切断: {0}")]
    SessionLost(String),

    #[error("エクスポートエラー: {0}")]
    Export(#[from] csv::Error),

    #[error("ファイル操作エラー: {0}")]
    FileIO(#[from] std::io::Error),

    #[error("不正なリクエスト: {0}")]
    InvalidRequest(String),

    #[error("ジョブ実行中: {0}")]
    JobInProgress(String),

    #[error("ジョブがキャンセルされました")]
    Cancelled,
}

impl ScraperError {
    /// ステップ内で回復せず、ジョブ全体を終了させるエラーか
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScraperError::SessionLost(_) | ScraperError::BrowserInit(_) | ScraperError::Cancelled
        )
    }
}
