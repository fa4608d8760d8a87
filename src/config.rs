use std::path::PathBuf;
use std::time::Duration;

/// OLX 中古車カテゴリのトップページ
pub const DEFAULT_BASE_URL: &str = "https://www.olx.co.id/mobil-bekas_c198";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// 各待機処理のタイムアウト
#[derive(Debug, Clone, PartialEq)]
pub struct Timeouts {
    /// 検索結果リストの出現待ち
    pub results: Duration,
    /// ロケーション入力欄・候補・検索ボタンの待ち
    pub search: Duration,
    /// 詳細ページのタイトル待ち
    pub listing_title: Duration,
    /// 「もっと見る」ボタンの待ち
    pub load_more: Duration,
    /// スクロール後、オーバーレイが消えるまでの待ち
    pub overlay_pause: Duration,
    /// クリック後、追加コンテンツ描画までの待ち
    pub render_pause: Duration,
    /// DOMポーリング間隔
    pub poll_interval: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            results: Duration::from_secs(20),
            search: Duration::from_secs(20),
            listing_title: Duration::from_secs(10),
            load_more: Duration::from_secs(10),
            overlay_pause: Duration::from_secs(1),
            render_pause: Duration::from_secs(2),
            poll_interval: Duration::from_millis(250),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub base_url: String,
    pub output_dir: PathBuf,
    pub headless: bool,
    pub chrome_path: Option<PathBuf>,
    pub user_agent: String,
    pub timeouts: Timeouts,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            output_dir: PathBuf::from("./scraped_data"),
            headless: true,
            chrome_path: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeouts: Timeouts::default(),
        }
    }
}

impl ScraperConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// 環境変数で既定値を上書き
    ///
    /// - `OLX_BASE_URL`
    /// - `OLX_OUTPUT_DIR`
    /// - `OLX_HEADLESS` (`0` / `false` でヘッド付き)
    /// - `CHROME_PATH` / `CHROMIUM_PATH`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("OLX_BASE_URL") {
            config.base_url = url;
        }
        if let Ok(dir) = std::env::var("OLX_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Ok(headless) = std::env::var("OLX_HEADLESS") {
            config.headless = !matches!(headless.to_ascii_lowercase().as_str(), "0" | "false" | "no");
        }
        config.chrome_path = std::env::var("CHROME_PATH")
            .or_else(|_| std::env::var("CHROMIUM_PATH"))
            .ok()
            .map(PathBuf::from);

        config
    }

    pub fn with_output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = path.into();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_path = Some(path.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }
}
