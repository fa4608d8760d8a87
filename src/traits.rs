use std::time::Duration;

use async_trait::async_trait;

use crate::config::ScraperConfig;
use crate::error::ScraperError;

/// 要素待機の条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitCondition {
    /// DOM上に存在する
    Present,
    /// 表示されている
    Visible,
    /// 表示されていて、かつ無効化されていない
    Clickable,
}

/// ブラウザセッション
///
/// スクレイパー本体はこのトレイト越しにだけブラウザを操作する。
/// 待機はすべてタイムアウト付きで、期限切れは `ScraperError::Timeout` で返す。
#[async_trait]
pub trait BrowserSession: Send + Sync {
    type Element: Send + Sync;

    /// URLへ遷移
    async fn navigate(&self, url: &str) -> Result<(), ScraperError>;

    /// 条件を満たす要素が現れるまで待機
    async fn wait_for(
        &self,
        selector: &str,
        condition: WaitCondition,
        timeout: Duration,
    ) -> Result<Vec<Self::Element>, ScraperError>;

    /// 待機せずに要素を検索（0件は空のVec）
    async fn find_all(&self, selector: &str) -> Result<Vec<Self::Element>, ScraperError>;

    async fn click(&self, element: &Self::Element) -> Result<(), ScraperError>;

    async fn scroll_into_view(&self, element: &Self::Element) -> Result<(), ScraperError>;

    /// 入力欄をクリアしてから文字列を入力
    async fn type_text(&self, element: &Self::Element, text: &str) -> Result<(), ScraperError>;

    async fn read_text(&self, element: &Self::Element) -> Result<String, ScraperError>;

    async fn read_attribute(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> Result<Option<String>, ScraperError>;

    /// 描画待ちの一時停止
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    /// リソース解放
    async fn quit(&mut self) -> Result<(), ScraperError>;
}

/// ジョブごとに新しいブラウザセッションを起動する
#[async_trait]
pub trait SessionLauncher: Send + Sync + 'static {
    type Session: BrowserSession + 'static;

    async fn launch(&self, config: &ScraperConfig) -> Result<Self::Session, ScraperError>;
}
