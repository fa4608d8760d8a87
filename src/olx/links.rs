use std::time::Duration;

use tracing::{debug, warn};

use crate::error::ScraperError;
use crate::traits::{BrowserSession, WaitCondition};

use super::selectors;

/// 検索結果ページからリスティングURLを集める
#[derive(Debug, Clone)]
pub struct LinkCollector {
    timeout: Duration,
}

impl LinkCollector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// 現在表示されている全カードのhrefを返す
    ///
    /// 結果リストが現れない場合は空。ページ間の重複除去は呼び出し側で行う。
    pub async fn collect<S: BrowserSession>(&self, session: &S) -> Result<Vec<String>, ScraperError> {
        match session
            .wait_for(selectors::RESULT_ITEM, WaitCondition::Present, self.timeout)
            .await
        {
            Ok(_) => {}
            Err(e) if e.is_fatal() => return Err(e),
            Err(ScraperError::Timeout(_)) => {
                warn!("Timed out waiting for the search results.");
                return Ok(Vec::new());
            }
            Err(e) => {
                warn!("An error occurred while waiting for search results: {}", e);
                return Ok(Vec::new());
            }
        }

        let anchors = match session.find_all(selectors::RESULT_LINK).await {
            Ok(anchors) => anchors,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("An error occurred while scraping links: {}", e);
                return Ok(Vec::new());
            }
        };

        let mut links = Vec::with_capacity(anchors.len());
        for anchor in &anchors {
            match session.read_attribute(anchor, "href").await {
                Ok(Some(href)) if !href.trim().is_empty() => links.push(href.trim().to_string()),
                Ok(_) => debug!("Result anchor without href, skipping"),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => debug!("Failed to read href: {}", e),
            }
        }

        Ok(links)
    }
}
