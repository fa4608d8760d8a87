use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::Timeouts;
use crate::error::ScraperError;
use crate::traits::{BrowserSession, WaitCondition};

use super::selectors;

/// 「もっと見る」で次のページ分を読み込む
#[derive(Debug, Clone)]
pub struct PaginationController {
    timeout: Duration,
    overlay_pause: Duration,
    render_pause: Duration,
}

impl PaginationController {
    pub fn new(timeouts: &Timeouts) -> Self {
        Self {
            timeout: timeouts.load_more,
            overlay_pause: timeouts.overlay_pause,
            render_pause: timeouts.render_pause,
        }
    }

    /// 追加読み込みできたら true
    ///
    /// ボタンが無い・操作に失敗した場合はページ終端として false を返す。
    /// `Err` はセッション自体が使えなくなった場合のみ。この場合ジョブはエラーで終わる。
    pub async fn advance<S: BrowserSession>(&self, session: &S) -> Result<bool, ScraperError> {
        match self.try_advance(session).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_fatal() => Err(e),
            Err(ScraperError::Timeout(_)) => {
                info!("No more pages to load or timed out.");
                Ok(false)
            }
            Err(e) => {
                warn!("Error loading more pages: {}", e);
                Ok(false)
            }
        }
    }

    async fn try_advance<S: BrowserSession>(&self, session: &S) -> Result<(), ScraperError> {
        let buttons = session
            .wait_for(selectors::LOAD_MORE_BUTTON, WaitCondition::Clickable, self.timeout)
            .await?;
        let button = buttons
            .first()
            .ok_or_else(|| ScraperError::ElementNotFound(selectors::LOAD_MORE_BUTTON.into()))?;

        session.scroll_into_view(button).await?;
        // オーバーレイが消えるのを待つ
        session.pause(self.overlay_pause).await;

        session.click(button).await?;
        session.pause(self.render_pause).await;

        debug!("Load more clicked");
        Ok(())
    }
}
