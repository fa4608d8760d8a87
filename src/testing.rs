//! テスト用の疑似ブラウザセッション
//!
//! 検索結果ページは「もっと見る」のクリックごとに1ページ分ずつ追加表示され、
//! 詳細ページはURLごとに用意したテキストを返す。

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::models::ProgressState;
use crate::olx::selectors;
use crate::progress::ProgressReporter;
use crate::traits::{BrowserSession, SessionLauncher, WaitCondition};

pub const ROOT_URL: &str = "https://www.olx.co.id/mobil-bekas_c198";

pub fn listing_url(n: usize) -> String {
    format!("https://www.olx.co.id/item/mobil-bekas-iid-{}", n)
}

pub fn test_config(output_dir: &Path) -> ScraperConfig {
    ScraperConfig::new(ROOT_URL).with_output_dir(output_dir)
}

#[derive(Debug)]
pub enum FakeElement {
    ResultItem,
    Anchor(Option<String>),
    Text(String),
    LoadMore,
    LocationInput,
    Suggestion,
    SearchButton,
}

#[derive(Debug, Clone, Default)]
pub struct FakeListing {
    texts: HashMap<&'static str, String>,
    locations: Vec<String>,
}

impl FakeListing {
    /// 全項目がそろった詳細ページ
    pub fn complete(title: &str) -> Self {
        let mut texts = HashMap::new();
        texts.insert(selectors::ITEM_TITLE, title.to_string());
        texts.insert(selectors::ITEM_PRICE, "Rp 135.000.000".to_string());
        texts.insert(selectors::ITEM_FUEL, "Bensin".to_string());
        texts.insert(selectors::ITEM_MILEAGE, "40.000-45.000 km".to_string());
        texts.insert(selectors::ITEM_TRANSMISSION, "Manual".to_string());
        texts.insert(selectors::ITEM_SUBTITLE, "Toyota Avanza".to_string());

        Self {
            texts,
            locations: vec!["Dipasang 2 hari lalu".to_string(), "Jakarta Selatan".to_string()],
        }
    }

    pub fn without(mut self, selector: &str) -> Self {
        self.texts.remove(selector);
        self
    }

    pub fn with_locations(mut self, locations: &[&str]) -> Self {
        self.locations = locations.iter().map(|s| s.to_string()).collect();
        self
    }
}

#[derive(Debug, Clone)]
pub struct FakeSite {
    pub root_url: String,
    pub result_pages: Vec<Vec<Option<String>>>,
    pub listings: HashMap<String, FakeListing>,
    pub search_widgets: bool,
    pub root_navigation_fails: bool,
    pub load_more_click_fails: bool,
    pub load_more_session_lost: bool,
    pub session_lost_on: Option<String>,
}

impl FakeSite {
    pub fn new(result_pages: Vec<Vec<String>>) -> Self {
        Self {
            root_url: ROOT_URL.to_string(),
            result_pages: result_pages
                .into_iter()
                .map(|page| page.into_iter().map(Some).collect())
                .collect(),
            listings: HashMap::new(),
            search_widgets: true,
            root_navigation_fails: false,
            load_more_click_fails: false,
            load_more_session_lost: false,
            session_lost_on: None,
        }
    }

    pub fn with_listing(mut self, url: impl Into<String>, listing: FakeListing) -> Self {
        self.listings.insert(url.into(), listing);
        self
    }

    /// 結果ページに含まれる全URLに完全な詳細ページを用意
    pub fn with_complete_listings(mut self) -> Self {
        let urls: Vec<String> = self
            .result_pages
            .iter()
            .flatten()
            .flatten()
            .cloned()
            .collect();
        for (i, url) in urls.into_iter().enumerate() {
            self.listings
                .entry(url)
                .or_insert_with(|| FakeListing::complete(&format!("Mobil {}", i + 1)));
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Location {
    Blank,
    Root,
    Listing(String),
}

#[derive(Debug)]
struct FakeState {
    location: Location,
    loaded_pages: usize,
    typed: Option<String>,
}

/// セッションの操作記録（セッションをムーブした後もテストから参照する）
#[derive(Debug, Default)]
pub struct FakeLog {
    quits: AtomicUsize,
    scrolls: AtomicUsize,
    navigations: Mutex<Vec<String>>,
    clicks: Mutex<Vec<&'static str>>,
    typed: Mutex<Vec<String>>,
    observer: Mutex<Option<ProgressReporter>>,
    snapshots: Mutex<Vec<ProgressState>>,
}

impl FakeLog {
    /// 以降のブラウザ操作ごとに進捗スナップショットを記録
    pub fn observe(&self, reporter: ProgressReporter) {
        *self.observer.lock().unwrap() = Some(reporter);
    }

    fn record(&self) {
        if let Some(reporter) = self.observer.lock().unwrap().as_ref() {
            self.snapshots.lock().unwrap().push(reporter.snapshot());
        }
    }

    pub fn snapshots(&self) -> Vec<ProgressState> {
        self.snapshots.lock().unwrap().clone()
    }

    pub fn quit_count(&self) -> usize {
        self.quits.load(Ordering::SeqCst)
    }

    pub fn scroll_count(&self) -> usize {
        self.scrolls.load(Ordering::SeqCst)
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }

    pub fn clicks(&self) -> Vec<&'static str> {
        self.clicks.lock().unwrap().clone()
    }

    pub fn typed(&self) -> Vec<String> {
        self.typed.lock().unwrap().clone()
    }
}

pub struct FakeSession {
    site: FakeSite,
    state: Mutex<FakeState>,
    log: Arc<FakeLog>,
}

impl FakeSession {
    pub fn new(site: FakeSite) -> Self {
        Self::with_log(site, Arc::new(FakeLog::default()))
    }

    pub fn with_log(site: FakeSite, log: Arc<FakeLog>) -> Self {
        Self {
            site,
            state: Mutex::new(FakeState {
                location: Location::Blank,
                loaded_pages: 0,
                typed: None,
            }),
            log,
        }
    }

    /// トップページを開いた状態で作成
    pub fn at_root(site: FakeSite) -> Self {
        let session = Self::new(site);
        {
            let mut state = session.state.lock().unwrap();
            state.location = Location::Root;
            state.loaded_pages = session.site.result_pages.len().min(1);
        }
        session
    }

    pub fn log(&self) -> Arc<FakeLog> {
        self.log.clone()
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    type Element = FakeElement;

    async fn navigate(&self, url: &str) -> Result<(), ScraperError> {
        self.log.record();
        self.log.navigations.lock().unwrap().push(url.to_string());

        if self.site.session_lost_on.as_deref() == Some(url) {
            return Err(ScraperError::SessionLost("websocket closed".into()));
        }

        let mut state = self.state.lock().unwrap();
        if url == self.site.root_url {
            if self.site.root_navigation_fails {
                return Err(ScraperError::Navigation("net::ERR_CONNECTION_RESET".into()));
            }
            state.location = Location::Root;
            state.loaded_pages = self.site.result_pages.len().min(1);
        } else {
            state.location = Location::Listing(url.to_string());
        }
        Ok(())
    }

    async fn wait_for(
        &self,
        selector: &str,
        _condition: WaitCondition,
        timeout: Duration,
    ) -> Result<Vec<FakeElement>, ScraperError> {
        let found = self.find_all(selector).await?;
        if found.is_empty() {
            return Err(ScraperError::Timeout(format!("{} ({:?})", selector, timeout)));
        }
        Ok(found)
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<FakeElement>, ScraperError> {
        self.log.record();
        let state = self.state.lock().unwrap();

        let found = match &state.location {
            Location::Blank => Vec::new(),
            Location::Root => {
                let loaded = &self.site.result_pages[..state.loaded_pages];
                match selector {
                    selectors::RESULT_ITEM => loaded
                        .iter()
                        .flatten()
                        .map(|_| FakeElement::ResultItem)
                        .collect(),
                    selectors::RESULT_LINK => loaded
                        .iter()
                        .flatten()
                        .map(|href| FakeElement::Anchor(href.clone()))
                        .collect(),
                    selectors::LOAD_MORE_BUTTON
                        if state.loaded_pages < self.site.result_pages.len() =>
                    {
                        vec![FakeElement::LoadMore]
                    }
                    selectors::LOCATION_INPUT if self.site.search_widgets => {
                        vec![FakeElement::LocationInput]
                    }
                    selectors::LOCATION_SUGGESTION
                        if self.site.search_widgets && state.typed.is_some() =>
                    {
                        vec![FakeElement::Suggestion]
                    }
                    selectors::SEARCH_BUTTON if self.site.search_widgets => {
                        vec![FakeElement::SearchButton]
                    }
                    _ => Vec::new(),
                }
            }
            Location::Listing(url) => match self.site.listings.get(url) {
                Some(listing) if selector == selectors::ITEM_LOCATION => listing
                    .locations
                    .iter()
                    .map(|text| FakeElement::Text(text.clone()))
                    .collect(),
                Some(listing) => listing
                    .texts
                    .get(selector)
                    .map(|text| vec![FakeElement::Text(text.clone())])
                    .unwrap_or_default(),
                None => Vec::new(),
            },
        };

        Ok(found)
    }

    async fn click(&self, element: &FakeElement) -> Result<(), ScraperError> {
        self.log.record();
        let label = match element {
            FakeElement::LoadMore => "load_more",
            FakeElement::Suggestion => "suggestion",
            FakeElement::SearchButton => "search",
            _ => "other",
        };
        self.log.clicks.lock().unwrap().push(label);

        if let FakeElement::LoadMore = element {
            if self.site.load_more_session_lost {
                return Err(ScraperError::SessionLost("target closed".into()));
            }
            if self.site.load_more_click_fails {
                return Err(ScraperError::JavaScript("element click intercepted".into()));
            }
            let mut state = self.state.lock().unwrap();
            state.loaded_pages = (state.loaded_pages + 1).min(self.site.result_pages.len());
        }
        Ok(())
    }

    async fn scroll_into_view(&self, _element: &FakeElement) -> Result<(), ScraperError> {
        self.log.record();
        self.log.scrolls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn type_text(&self, _element: &FakeElement, text: &str) -> Result<(), ScraperError> {
        self.log.record();
        self.log.typed.lock().unwrap().push(text.to_string());
        self.state.lock().unwrap().typed = Some(text.to_string());
        Ok(())
    }

    async fn read_text(&self, element: &FakeElement) -> Result<String, ScraperError> {
        match element {
            FakeElement::Text(text) => Ok(text.clone()),
            other => Err(ScraperError::ElementNotFound(format!("no text on {:?}", other))),
        }
    }

    async fn read_attribute(
        &self,
        element: &FakeElement,
        name: &str,
    ) -> Result<Option<String>, ScraperError> {
        match element {
            FakeElement::Anchor(href) if name == "href" => Ok(href.clone()),
            _ => Ok(None),
        }
    }

    async fn pause(&self, _duration: Duration) {}

    async fn quit(&mut self) -> Result<(), ScraperError> {
        self.log.quits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// 疑似セッションを起動するランチャー
pub struct FakeLauncher {
    pub site: FakeSite,
    pub log: Arc<FakeLog>,
    /// 設定されていれば、通知されるまで起動を保留する
    pub gate: Option<Arc<Notify>>,
    pub fail_launch: bool,
}

impl FakeLauncher {
    pub fn new(site: FakeSite) -> Self {
        Self {
            site,
            log: Arc::new(FakeLog::default()),
            gate: None,
            fail_launch: false,
        }
    }
}

#[async_trait]
impl SessionLauncher for FakeLauncher {
    type Session = FakeSession;

    async fn launch(&self, _config: &ScraperConfig) -> Result<FakeSession, ScraperError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail_launch {
            return Err(ScraperError::BrowserInit("chromium not found".into()));
        }
        Ok(FakeSession::with_log(self.site.clone(), self.log.clone()))
    }
}
