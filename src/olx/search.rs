use std::time::Duration;

use tracing::{info, warn};

use crate::error::ScraperError;
use crate::traits::{BrowserSession, WaitCondition};

use super::selectors;

/// ロケーション検索の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Applied,
    /// 絞り込みできず、トップページの結果のまま続行
    Unfiltered(String),
}

/// ロケーションを入力して候補を選び、検索を実行する
#[derive(Debug, Clone)]
pub struct LocationSearch {
    timeout: Duration,
}

impl LocationSearch {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub async fn search<S: BrowserSession>(
        &self,
        session: &S,
        location: &str,
    ) -> Result<SearchOutcome, ScraperError> {
        info!("Inserting location: {}", location);

        match self.try_search(session, location).await {
            Ok(()) => {
                info!("Location selected and search triggered.");
                Ok(SearchOutcome::Applied)
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!(
                    "Location search failed, continuing with unfiltered results: {}",
                    e
                );
                Ok(SearchOutcome::Unfiltered(e.to_string()))
            }
        }
    }

    async fn try_search<S: BrowserSession>(
        &self,
        session: &S,
        location: &str,
    ) -> Result<(), ScraperError> {
        let input = first(
            session
                .wait_for(selectors::LOCATION_INPUT, WaitCondition::Visible, self.timeout)
                .await?,
            selectors::LOCATION_INPUT,
        )?;
        session.type_text(&input, location).await?;

        let suggestion = first(
            session
                .wait_for(selectors::LOCATION_SUGGESTION, WaitCondition::Present, self.timeout)
                .await?,
            selectors::LOCATION_SUGGESTION,
        )?;
        session.click(&suggestion).await?;

        let button = first(
            session
                .wait_for(selectors::SEARCH_BUTTON, WaitCondition::Clickable, self.timeout)
                .await?,
            selectors::SEARCH_BUTTON,
        )?;
        session.click(&button).await?;

        Ok(())
    }
}

fn first<E>(elements: Vec<E>, selector: &str) -> Result<E, ScraperError> {
    elements
        .into_iter()
        .next()
        .ok_or_else(|| ScraperError::ElementNotFound(selector.to_string()))
}
