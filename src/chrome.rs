//! chromiumoxide によるブラウザセッション

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::traits::{BrowserSession, SessionLauncher, WaitCondition};

/// 自動操作の痕跡を隠す（新しいドキュメントごとに実行）
const HIDE_WEBDRIVER_SCRIPT: &str = r#"
    Object.defineProperty(navigator, 'webdriver', {
        get: () => undefined
    })
"#;

const IS_VISIBLE_FN: &str = r#"
    function() {
        const rect = this.getBoundingClientRect();
        const style = window.getComputedStyle(this);
        return rect.width > 0 && rect.height > 0
            && style.visibility !== 'hidden' && style.display !== 'none';
    }
"#;

const IS_CLICKABLE_FN: &str = r#"
    function() {
        const rect = this.getBoundingClientRect();
        const style = window.getComputedStyle(this);
        return rect.width > 0 && rect.height > 0
            && style.visibility !== 'hidden' && style.display !== 'none'
            && style.pointerEvents !== 'none' && !this.disabled;
    }
"#;

const CLEAR_VALUE_FN: &str = "function() { this.value = ''; }";

const PROFILE_DIR_PREFIX: &str = "olx-scraper-";

/// ジョブ専用のユーザーデータディレクトリ（drop で削除される）
fn create_profile_dir() -> Result<TempDir, ScraperError> {
    let dir = tempfile::Builder::new()
        .prefix(PROFILE_DIR_PREFIX)
        .tempdir()?;
    Ok(dir)
}

/// プロファイルを削除。失敗してもジョブは止めない
fn remove_profile_dir(dir: TempDir) {
    let path = dir.path().to_path_buf();
    match dir.close() {
        Ok(()) => debug!("Removed browser profile {:?}", path),
        Err(e) => warn!("Failed to remove browser profile {:?}: {}", path, e),
    }
}

/// WebSocket切断などブラウザ自体が使えなくなったエラーは SessionLost に寄せる
fn cdp_error(err: CdpError, fallback: fn(String) -> ScraperError) -> ScraperError {
    if matches!(
        err,
        CdpError::Ws(_) | CdpError::ChannelSendError(_) | CdpError::NoResponse
    ) {
        ScraperError::SessionLost(err.to_string())
    } else {
        fallback(err.to_string())
    }
}

pub struct ChromeSession {
    browser: Option<Browser>,
    page: Page,
    handler: JoinHandle<()>,
    profile_dir: Option<TempDir>,
    poll_interval: Duration,
}

impl ChromeSession {
    /// ブラウザを起動して空のページを開く
    pub async fn launch(config: &ScraperConfig) -> Result<Self, ScraperError> {
        info!("Initializing browser for OLX scraper...");

        // 起動に失敗した場合も drop で削除される
        let profile_dir = create_profile_dir()?;

        let mut builder = BrowserConfig::builder()
            .window_size(1280, 800)
            .user_data_dir(profile_dir.path());

        if let Some(chrome_path) = &config.chrome_path {
            builder = builder.chrome_executable(chrome_path);
        }

        if !config.headless {
            builder = builder.with_head();
        }

        builder = builder
            .no_sandbox()
            .request_timeout(Duration::from_secs(60))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--disable-software-rasterizer")
            .arg("--ignore-certificate-errors")
            .arg("--allow-running-insecure-content")
            .arg(format!("--user-agent={}", config.user_agent));

        let browser_config = builder
            .build()
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        // ハンドラータスクを起動
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                debug!("Browser event: {:?}", event);
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        let hide_webdriver = AddScriptToEvaluateOnNewDocumentParams::builder()
            .source(HIDE_WEBDRIVER_SCRIPT)
            .build()
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;
        page.evaluate_on_new_document(hide_webdriver)
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        info!("Browser initialized successfully");

        Ok(Self {
            browser: Some(browser),
            page,
            handler,
            profile_dir: Some(profile_dir),
            poll_interval: config.timeouts.poll_interval,
        })
    }

    async fn satisfies(&self, element: &Element, condition: WaitCondition) -> Result<bool, ScraperError> {
        let script = match condition {
            WaitCondition::Present => return Ok(true),
            WaitCondition::Visible => IS_VISIBLE_FN,
            WaitCondition::Clickable => IS_CLICKABLE_FN,
        };

        match element.call_js_fn(script, false).await {
            Ok(returns) => Ok(returns
                .result
                .value
                .and_then(|v| v.as_bool())
                .unwrap_or(false)),
            Err(e) => {
                let err = cdp_error(e, ScraperError::JavaScript);
                if err.is_fatal() {
                    return Err(err);
                }
                // 要素が差し替えられた直後など
                debug!("Condition check failed: {}", err);
                Ok(false)
            }
        }
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    type Element = Element;

    async fn navigate(&self, url: &str) -> Result<(), ScraperError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| cdp_error(e, ScraperError::Navigation))?;

        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| cdp_error(e, ScraperError::Navigation))?;

        debug!("Navigated to {}", url);
        Ok(())
    }

    async fn wait_for(
        &self,
        selector: &str,
        condition: WaitCondition,
        timeout: Duration,
    ) -> Result<Vec<Element>, ScraperError> {
        let start = Instant::now();

        loop {
            let elements = self.find_all(selector).await?;

            let mut ready = Vec::with_capacity(elements.len());
            for element in elements {
                if self.satisfies(&element, condition).await? {
                    ready.push(element);
                }
            }
            if !ready.is_empty() {
                debug!("{} ready after {:?}", selector, start.elapsed());
                return Ok(ready);
            }

            if start.elapsed() >= timeout {
                return Err(ScraperError::Timeout(format!(
                    "{} ({:?}) が{:?}以内に見つかりません",
                    selector, condition, timeout
                )));
            }

            sleep(self.poll_interval).await;
        }
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Element>, ScraperError> {
        match self.page.find_elements(selector).await {
            Ok(elements) => Ok(elements),
            Err(e) => {
                let err = cdp_error(e, ScraperError::ElementNotFound);
                if err.is_fatal() {
                    return Err(err);
                }
                debug!("{}: {}", selector, err);
                Ok(Vec::new())
            }
        }
    }

    async fn click(&self, element: &Element) -> Result<(), ScraperError> {
        element
            .click()
            .await
            .map_err(|e| cdp_error(e, ScraperError::JavaScript))?;
        Ok(())
    }

    async fn scroll_into_view(&self, element: &Element) -> Result<(), ScraperError> {
        element
            .scroll_into_view()
            .await
            .map_err(|e| cdp_error(e, ScraperError::JavaScript))?;
        Ok(())
    }

    async fn type_text(&self, element: &Element, text: &str) -> Result<(), ScraperError> {
        element
            .call_js_fn(CLEAR_VALUE_FN, false)
            .await
            .map_err(|e| cdp_error(e, ScraperError::JavaScript))?;

        element
            .focus()
            .await
            .map_err(|e| cdp_error(e, ScraperError::JavaScript))?
            .type_str(text)
            .await
            .map_err(|e| cdp_error(e, ScraperError::JavaScript))?;
        Ok(())
    }

    async fn read_text(&self, element: &Element) -> Result<String, ScraperError> {
        let text = element
            .inner_text()
            .await
            .map_err(|e| cdp_error(e, ScraperError::ElementNotFound))?;
        Ok(text.unwrap_or_default())
    }

    async fn read_attribute(&self, element: &Element, name: &str) -> Result<Option<String>, ScraperError> {
        // href などはプロパティ側が絶対URLになっている
        let property = element
            .property(name)
            .await
            .map_err(|e| cdp_error(e, ScraperError::ElementNotFound))?;
        if let Some(serde_json::Value::String(value)) = property {
            return Ok(Some(value));
        }

        element
            .attribute(name)
            .await
            .map_err(|e| cdp_error(e, ScraperError::ElementNotFound))
    }

    async fn quit(&mut self) -> Result<(), ScraperError> {
        let Some(mut browser) = self.browser.take() else {
            return Ok(());
        };

        info!("Closing browser...");
        let closed = browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| ScraperError::SessionLost(e.to_string()));

        if let Err(e) = browser.wait().await {
            warn!("Failed to wait for browser process: {}", e);
        }
        self.handler.abort();

        // ブラウザプロセス終了後に削除する
        if let Some(dir) = self.profile_dir.take() {
            remove_profile_dir(dir);
        }

        info!("Browser closed");
        closed
    }
}

/// ジョブごとに Chrome を起動する
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeLauncher;

#[async_trait]
impl SessionLauncher for ChromeLauncher {
    type Session = ChromeSession;

    async fn launch(&self, config: &ScraperConfig) -> Result<ChromeSession, ScraperError> {
        ChromeSession::launch(config).await
    }
}
