//! chromiumoxide による `SearchSession` 実装

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Element;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::{ScraperConfig, Selectors};
use crate::error::ScraperError;
use crate::traits::{ListingHandle, NextPage, SearchSession};

/// Chromeのセッション（ブラウザ1つ・ページ1つ）
pub struct ChromeSession {
    browser: Option<Browser>,
    page: Option<Page>,
    handler: Option<JoinHandle<()>>,
    selectors: Selectors,
}

impl ChromeSession {
    /// ブラウザを起動して空ページを開く
    pub async fn launch(config: &ScraperConfig) -> Result<Self, ScraperError> {
        info!("Launching browser...");

        // ユニークなユーザーデータディレクトリを生成
        let unique_id = format!(
            "{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        );
        let user_data_dir = std::env::temp_dir().join(format!("vacancy-scraper-{}", unique_id));

        let mut builder = BrowserConfig::builder()
            .user_data_dir(&user_data_dir)
            .window_size(1280, 800)
            .request_timeout(config.timeout)
            .no_sandbox()
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu");

        // Chrome パスが指定されていれば使う
        if let Ok(chrome_path) =
            std::env::var("CHROME_PATH").or_else(|_| std::env::var("CHROMIUM_PATH"))
        {
            builder = builder.chrome_executable(chrome_path);
        }

        if !config.headless {
            builder = builder.with_head();
        }

        if config.debug {
            builder = builder.arg("--enable-logging=stderr").arg("--v=1");
        }

        let browser_config = builder.build().map_err(ScraperError::BrowserInit)?;

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

        info!("Browser launched");
        Ok(Self {
            browser: Some(browser),
            page: Some(page),
            handler: Some(handler),
            selectors: config.selectors.clone(),
        })
    }

    fn page(&self) -> Result<&Page, ScraperError> {
        self.page
            .as_ref()
            .ok_or_else(|| ScraperError::Session("browser session already closed".into()))
    }
}

#[async_trait]
impl SearchSession for ChromeSession {
    type Listing = ChromeListing;

    async fn open(&mut self, url: &str) -> Result<(), ScraperError> {
        self.page()?
            .goto(url)
            .await
            .map_err(|e| ScraperError::Navigation(e.to_string()))?;
        Ok(())
    }

    async fn listings(&mut self) -> Result<Vec<ChromeListing>, ScraperError> {
        let elements = self
            .page()?
            .find_elements(self.selectors.listing.as_str())
            .await
            .map_err(|e| ScraperError::Session(format!("listings: {}", e)))?;
        Ok(elements
            .into_iter()
            .map(|element| ChromeListing { element })
            .collect())
    }

    async fn next_page(&mut self) -> Result<NextPage, ScraperError> {
        let controls = self
            .page()?
            .find_elements(self.selectors.next_page.as_str())
            .await
            .map_err(|e| ScraperError::Session(format!("next page: {}", e)))?;

        let Some(control) = controls.first() else {
            return Ok(NextPage::Missing);
        };

        let class = control
            .attribute("class")
            .await
            .map_err(|e| ScraperError::Session(e.to_string()))?
            .unwrap_or_default();
        let aria_disabled = control
            .attribute("aria-disabled")
            .await
            .map_err(|e| ScraperError::Session(e.to_string()))?;

        if class.contains(self.selectors.disabled_marker.as_str())
            || aria_disabled.as_deref() == Some("true")
        {
            Ok(NextPage::Disabled)
        } else {
            Ok(NextPage::Available)
        }
    }

    async fn advance(&mut self) -> Result<(), ScraperError> {
        self.page()?
            .find_element(self.selectors.next_page.as_str())
            .await
            .map_err(|e| ScraperError::Session(format!("next page: {}", e)))?
            .click()
            .await
            .map_err(|e| ScraperError::Navigation(format!("next page click: {}", e)))?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        info!("Closing browser...");

        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                debug!("Failed to close page: {}", e);
            }
        }

        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                debug!("Failed to close browser: {}", e);
            }
            if let Err(e) = browser.wait().await {
                debug!("Failed to wait for browser exit: {}", e);
            }
        }

        if let Some(handler) = self.handler.take() {
            handler.abort();
        }

        info!("Browser closed");
        Ok(())
    }

    async fn screenshot(&mut self) -> Option<Vec<u8>> {
        let page = self.page.as_ref()?;
        page.screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
            .ok()
    }
}

/// 検索結果ページ上の求人要素
pub struct ChromeListing {
    element: Element,
}

impl ChromeListing {
    async fn child(&self, selector: &str) -> Result<Element, ScraperError> {
        self.element
            .find_element(selector)
            .await
            .map_err(|e| ScraperError::ElementNotFound(format!("{}: {}", selector, e)))
    }
}

#[async_trait]
impl ListingHandle for ChromeListing {
    async fn text(&self, selector: &str) -> Result<String, ScraperError> {
        let text = self
            .child(selector)
            .await?
            .inner_text()
            .await
            .map_err(|e| ScraperError::ListingRead(format!("{} text: {}", selector, e)))?;
        Ok(text.unwrap_or_default())
    }

    async fn attribute(
        &self,
        selector: &str,
        name: &str,
    ) -> Result<Option<String>, ScraperError> {
        let child = self.child(selector).await?;

        // href などはプロパティ側が絶対URLになっている
        let property = child
            .property(name)
            .await
            .map_err(|e| ScraperError::ListingRead(format!("{} {}: {}", selector, name, e)))?;
        if let Some(value) = property.as_ref().and_then(|v| v.as_str()) {
            return Ok(Some(value.to_string()));
        }

        child
            .attribute(name)
            .await
            .map_err(|e| ScraperError::ListingRead(format!("{} {}: {}", selector, name, e)))
    }
}
