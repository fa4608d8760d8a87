use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::ScraperError;
use crate::models::{ListingRecord, NOT_AVAILABLE};
use crate::traits::{BrowserSession, WaitCondition};

use super::selectors;

/// 詳細ページ1件の抽出結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingOutcome {
    Extracted(ListingRecord),
    /// 必須項目（タイトル・価格）が取れず、レコードを作らなかった
    Skipped(String),
}

/// 詳細ページから項目を抽出する
#[derive(Debug, Clone)]
pub struct ListingExtractor {
    timeout: Duration,
}

impl ListingExtractor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// `Err` はセッションが使えなくなった場合のみ。それ以外の失敗は `Skipped`
    pub async fn extract<S: BrowserSession>(
        &self,
        session: &S,
        url: &str,
    ) -> Result<ListingOutcome, ScraperError> {
        match self.extract_required(session, url).await {
            Ok((title, price)) => {
                let record = ListingRecord {
                    sub_brand: optional_text(session, selectors::ITEM_SUBTITLE).await?,
                    location: location_text(session).await?,
                    fuel: optional_text(session, selectors::ITEM_FUEL).await?,
                    mileage: optional_text(session, selectors::ITEM_MILEAGE).await?,
                    transmission: optional_text(session, selectors::ITEM_TRANSMISSION).await?,
                    title,
                    price,
                    url: url.to_string(),
                };
                info!("Scraped: {}", record.title);
                Ok(ListingOutcome::Extracted(record))
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!("Error scraping {}: {}", url, e);
                Ok(ListingOutcome::Skipped(e.to_string()))
            }
        }
    }

    async fn extract_required<S: BrowserSession>(
        &self,
        session: &S,
        url: &str,
    ) -> Result<(String, String), ScraperError> {
        session.navigate(url).await?;
        session
            .wait_for(selectors::ITEM_TITLE, WaitCondition::Present, self.timeout)
            .await?;

        let title = required_text(session, selectors::ITEM_TITLE).await?;
        let price = required_text(session, selectors::ITEM_PRICE).await?;
        Ok((title, price))
    }
}

async fn required_text<S: BrowserSession>(session: &S, selector: &str) -> Result<String, ScraperError> {
    let elements = session.find_all(selector).await?;
    let element = elements
        .first()
        .ok_or_else(|| ScraperError::ElementNotFound(selector.to_string()))?;
    Ok(session.read_text(element).await?.trim().to_string())
}

/// 取れなければ "N/A"。他の項目には影響させない
async fn optional_text<S: BrowserSession>(session: &S, selector: &str) -> Result<String, ScraperError> {
    match required_text(session, selector).await {
        Ok(text) => Ok(text),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            debug!("Optional field {} unavailable: {}", selector, e);
            Ok(NOT_AVAILABLE.to_string())
        }
    }
}

/// 所在地は2番目の要素
async fn location_text<S: BrowserSession>(session: &S) -> Result<String, ScraperError> {
    let elements = match session.find_all(selectors::ITEM_LOCATION).await {
        Ok(elements) => elements,
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            debug!("Location lookup failed: {}", e);
            return Ok(NOT_AVAILABLE.to_string());
        }
    };

    match elements.get(1) {
        Some(element) => match session.read_text(element).await {
            Ok(text) => Ok(text.trim().to_string()),
            Err(e) if e.is_fatal() => Err(e),
            Err(_) => Ok(NOT_AVAILABLE.to_string()),
        },
        None => Ok(NOT_AVAILABLE.to_string()),
    }
}
