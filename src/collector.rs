//! ページ送りしながら求人を収集する

use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::config::{PageWait, ScraperConfig};
use crate::error::ScraperError;
use crate::extractor::VacancyExtractor;
use crate::traits::{ListingHandle, NextPage, SearchSession};
use crate::types::{CollectResult, SearchQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CollectorState {
    CollectingPage,
    Done,
}

pub struct ListingCollector {
    config: ScraperConfig,
    extractor: VacancyExtractor,
}

impl ListingCollector {
    pub fn new(config: ScraperConfig) -> Self {
        let extractor = VacancyExtractor::new(config.clone());
        Self { config, extractor }
    }

    /// 1回分の収集を実行する
    ///
    /// セッション障害が起きた場合はそこで打ち切り、それまでの結果を返す。
    /// セッションはどの経路でも最後に一度だけ閉じる。
    pub async fn collect<S: SearchSession>(
        &self,
        mut session: S,
        query: &SearchQuery,
    ) -> CollectResult {
        let mut result = CollectResult::default();

        if let Err(e) = self.run(&mut session, query, &mut result).await {
            error!(
                "Collection aborted after {} page(s), keeping {} record(s): {}",
                result.pages,
                result.vacancies.len(),
                e
            );
            if self.config.debug {
                self.log_screenshot(&mut session).await;
            }
            result.aborted = Some(e.to_string());
        }

        if let Err(e) = session.close().await {
            warn!("Failed to close browser session: {}", e);
        }

        info!(
            "Collected {} vacancies from {} page(s), skipped {}",
            result.vacancies.len(),
            result.pages,
            result.skipped
        );
        result
    }

    async fn run<S: SearchSession>(
        &self,
        session: &mut S,
        query: &SearchQuery,
        result: &mut CollectResult,
    ) -> Result<(), ScraperError> {
        let url = self.config.search_url(&query.position, &query.city);
        info!("Opening search page: {}", url);
        session.open(&url).await?;
        self.wait(session, &self.config.warmup, None).await?;

        let mut state = CollectorState::CollectingPage;
        while state == CollectorState::CollectingPage {
            state = self.collect_page(session, result).await?;
        }
        Ok(())
    }

    async fn collect_page<S: SearchSession>(
        &self,
        session: &mut S,
        result: &mut CollectResult,
    ) -> Result<CollectorState, ScraperError> {
        result.pages += 1;
        let listings = session.listings().await?;
        info!("Page {}: {} listing(s)", result.pages, listings.len());

        for (i, listing) in listings.iter().enumerate() {
            match self.extractor.extract(listing).await {
                Ok(vacancy) => result.vacancies.push(vacancy),
                Err(e) if e.is_listing_level() => {
                    warn!("Skipping listing {} on page {}: {}", i + 1, result.pages, e);
                    result.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        match session.next_page().await? {
            NextPage::Missing => {
                info!("No next page control, done");
                Ok(CollectorState::Done)
            }
            NextPage::Disabled => {
                info!("Next page control disabled, done");
                Ok(CollectorState::Done)
            }
            NextPage::Available => {
                let marker = self.page_marker(&listings).await;
                session.advance().await?;
                self.wait(session, &self.config.settle, marker.as_deref())
                    .await?;
                Ok(CollectorState::CollectingPage)
            }
        }
    }

    /// ページの目印（先頭求人のリンク）
    async fn page_marker<L: ListingHandle>(&self, listings: &[L]) -> Option<String> {
        let first = listings.first()?;
        first
            .attribute(&self.config.selectors.link, "href")
            .await
            .ok()
            .flatten()
    }

    /// `previous` があれば、その目印と異なるページが表示されるまで待つ
    async fn wait<S: SearchSession>(
        &self,
        session: &mut S,
        wait: &PageWait,
        previous: Option<&str>,
    ) -> Result<(), ScraperError> {
        match wait {
            PageWait::Fixed(duration) => {
                debug!("Sleeping {:?}", duration);
                sleep(*duration).await;
                Ok(())
            }
            PageWait::UntilReady { timeout, interval } => {
                let start = Instant::now();
                loop {
                    let listings = session.listings().await?;
                    if !listings.is_empty() {
                        let marker = self.page_marker(&listings).await;
                        if previous.is_none() || marker.as_deref() != previous {
                            debug!(
                                "{} listing(s) visible after {:?}",
                                listings.len(),
                                start.elapsed()
                            );
                            return Ok(());
                        }
                    }
                    if start.elapsed() >= *timeout {
                        warn!(
                            "Page not ready after {:?}, proceeding anyway",
                            start.elapsed()
                        );
                        return Ok(());
                    }
                    sleep(*interval).await;
                }
            }
        }
    }

    async fn log_screenshot<S: SearchSession>(&self, session: &mut S) {
        if let Some(png) = session.screenshot().await {
            use base64::Engine;
            let encoded = base64::engine::general_purpose::STANDARD.encode(&png);
            debug!("Abort screenshot: data:image/png;base64,{}", encoded);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::extractor::tests::FakeListing;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// ページごとの求人と次ページ状態を持つ偽セッション
    #[derive(Default)]
    pub(crate) struct FakeSession {
        pub pages: Vec<(Vec<FakeListing>, NextPage)>,
        pub current: usize,
        pub opened: Vec<String>,
        /// このページで listings() を失敗させる
        pub fail_on_page: Option<usize>,
        pub fail_open: bool,
        /// 次ページボタンの確認を失敗させる
        pub fail_next_page: bool,
        /// 次ページボタンのクリックを失敗させる
        pub fail_advance: bool,
        /// advance() 後、前のページを返し続ける listings() 呼び出し回数
        pub stale_reads: usize,
        stale_remaining: usize,
        pub closes: Arc<AtomicUsize>,
    }

    impl FakeSession {
        pub(crate) fn with_pages(pages: Vec<(Vec<FakeListing>, NextPage)>) -> Self {
            Self {
                pages,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl SearchSession for FakeSession {
        type Listing = FakeListing;

        async fn open(&mut self, url: &str) -> Result<(), ScraperError> {
            if self.fail_open {
                return Err(ScraperError::Navigation("net::ERR_NAME_NOT_RESOLVED".into()));
            }
            self.opened.push(url.to_string());
            Ok(())
        }

        async fn listings(&mut self) -> Result<Vec<FakeListing>, ScraperError> {
            if self.fail_on_page == Some(self.current) {
                return Err(ScraperError::Session("target closed".into()));
            }
            let index = if self.stale_remaining > 0 {
                self.stale_remaining -= 1;
                self.current - 1
            } else {
                self.current
            };
            Ok(self
                .pages
                .get(index)
                .map(|(listings, _)| listings.clone())
                .unwrap_or_default())
        }

        async fn next_page(&mut self) -> Result<NextPage, ScraperError> {
            if self.fail_next_page {
                return Err(ScraperError::Session("pagination control detached".into()));
            }
            Ok(self
                .pages
                .get(self.current)
                .map(|(_, next)| *next)
                .unwrap_or(NextPage::Missing))
        }

        async fn advance(&mut self) -> Result<(), ScraperError> {
            if self.fail_advance {
                return Err(ScraperError::Navigation("next page click: timeout".into()));
            }
            self.current += 1;
            self.stale_remaining = self.stale_reads;
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ScraperError> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    pub(crate) fn instant_config() -> ScraperConfig {
        ScraperConfig::default()
            .with_warmup(PageWait::Fixed(Duration::ZERO))
            .with_settle(PageWait::Fixed(Duration::ZERO))
    }

    fn page(n: usize, count: usize) -> Vec<FakeListing> {
        (0..count)
            .map(|i| {
                FakeListing::vacancy(
                    &format!("Садовник {}-{}", n, i),
                    "от 50 000 руб.",
                    &format!("/vakansii/{}-{}.html", n, i),
                )
            })
            .collect()
    }

    fn query() -> SearchQuery {
        SearchQuery::new("садовник", "москва")
    }

    #[tokio::test]
    async fn test_stops_when_next_page_disabled_on_page_three() {
        let session = FakeSession::with_pages(vec![
            (page(1, 2), NextPage::Available),
            (page(2, 2), NextPage::Available),
            (page(3, 1), NextPage::Disabled),
            (page(4, 5), NextPage::Missing),
        ]);
        let closes = session.closes.clone();

        let result = ListingCollector::new(instant_config())
            .collect(session, &query())
            .await;

        assert_eq!(result.pages, 3);
        assert_eq!(result.vacancies.len(), 5);
        assert!(result.vacancies.iter().all(|v| !v.position.contains(" 4-")));
        assert!(!result.is_partial());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_next_page_ends_run() {
        let session = FakeSession::with_pages(vec![(page(1, 3), NextPage::Missing)]);

        let result = ListingCollector::new(instant_config())
            .collect(session, &query())
            .await;

        assert_eq!(result.pages, 1);
        assert_eq!(result.vacancies.len(), 3);
        assert!(result.aborted.is_none());
    }

    #[tokio::test]
    async fn test_broken_listing_is_skipped() {
        let mut listings = page(1, 3);
        listings[1] = listings[1].clone().without("a");
        let session = FakeSession::with_pages(vec![
            (listings, NextPage::Available),
            (page(2, 1), NextPage::Disabled),
        ]);

        let result = ListingCollector::new(instant_config())
            .collect(session, &query())
            .await;

        assert_eq!(result.skipped, 1);
        assert_eq!(result.vacancies.len(), 3);
        assert_eq!(result.vacancies[1].position, "Садовник 1-2");
        assert!(!result.is_partial());
    }

    #[tokio::test]
    async fn test_session_fault_returns_partial_results() {
        let mut session = FakeSession::with_pages(vec![
            (page(1, 2), NextPage::Available),
            (page(2, 2), NextPage::Available),
            (page(3, 2), NextPage::Disabled),
        ]);
        session.fail_on_page = Some(1);
        let closes = session.closes.clone();

        let result = ListingCollector::new(instant_config())
            .collect(session, &query())
            .await;

        assert_eq!(result.vacancies.len(), 2);
        assert!(result.aborted.as_deref().unwrap().contains("target closed"));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_navigation_failure_still_closes_session() {
        let mut session = FakeSession::with_pages(vec![(page(1, 2), NextPage::Missing)]);
        session.fail_open = true;
        let closes = session.closes.clone();

        let result = ListingCollector::new(instant_config())
            .collect(session, &query())
            .await;

        assert!(result.vacancies.is_empty());
        assert_eq!(result.pages, 0);
        assert!(result.is_partial());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_opens_search_url_for_query() {
        let mut session = FakeSession::with_pages(vec![(page(1, 1), NextPage::Missing)]);
        let collector = ListingCollector::new(instant_config());
        let mut result = CollectResult::default();

        collector
            .run(&mut session, &query(), &mut result)
            .await
            .unwrap();

        assert_eq!(
            session.opened,
            vec![instant_config().search_url("садовник", "москва")]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_until_ready_gives_up_after_timeout() {
        let session = FakeSession::with_pages(vec![(Vec::new(), NextPage::Missing)]);
        let config = instant_config().with_warmup(PageWait::UntilReady {
            timeout: Duration::from_secs(10),
            interval: Duration::from_secs(1),
        });

        let result = ListingCollector::new(config).collect(session, &query()).await;

        assert_eq!(result.pages, 1);
        assert!(result.vacancies.is_empty());
        assert!(!result.is_partial());
    }

    #[tokio::test(start_paused = true)]
    async fn test_until_ready_returns_once_listings_visible() {
        let session = FakeSession::with_pages(vec![(page(1, 2), NextPage::Missing)]);
        let config = instant_config().with_warmup(PageWait::UntilReady {
            timeout: Duration::from_secs(3600),
            interval: Duration::from_secs(1),
        });

        let start = Instant::now();
        let result = ListingCollector::new(config).collect(session, &query()).await;

        assert_eq!(result.vacancies.len(), 2);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_detached_listing_is_skipped_and_run_continues() {
        let listings = vec![
            FakeListing::vacancy("a", "до 70 000 руб.", "/v/a.html"),
            FakeListing::vacancy("x", "до 70 000 руб.", "/v/x.html").detached_at("._1QIBo"),
            FakeListing::vacancy("b", "до 70 000 руб.", "/v/b.html"),
        ];
        let session = FakeSession::with_pages(vec![
            (listings, NextPage::Available),
            (
                vec![FakeListing::vacancy("c", "до 70 000 руб.", "/v/c.html")],
                NextPage::Disabled,
            ),
        ]);

        let result = ListingCollector::new(instant_config())
            .collect(session, &query())
            .await;

        let titles: Vec<_> = result.vacancies.iter().map(|v| v.position.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.pages, 2);
        assert!(!result.is_partial());
    }

    #[tokio::test(start_paused = true)]
    async fn test_until_ready_settle_waits_for_new_page() {
        let mut session = FakeSession::with_pages(vec![
            (page(1, 2), NextPage::Available),
            (page(2, 1), NextPage::Disabled),
        ]);
        session.stale_reads = 3;
        let config = instant_config().with_settle(PageWait::UntilReady {
            timeout: Duration::from_secs(30),
            interval: Duration::from_millis(500),
        });

        let result = ListingCollector::new(config).collect(session, &query()).await;

        let titles: Vec<_> = result.vacancies.iter().map(|v| v.position.as_str()).collect();
        assert_eq!(titles, vec!["Садовник 1-0", "Садовник 1-1", "Садовник 2-0"]);
        assert_eq!(result.pages, 2);
    }

    #[tokio::test]
    async fn test_next_page_fault_keeps_partial_results() {
        let mut session = FakeSession::with_pages(vec![
            (page(1, 2), NextPage::Available),
            (page(2, 2), NextPage::Disabled),
        ]);
        session.fail_next_page = true;
        let closes = session.closes.clone();

        let result = ListingCollector::new(instant_config())
            .collect(session, &query())
            .await;

        assert_eq!(result.vacancies.len(), 2);
        assert!(result
            .aborted
            .as_deref()
            .unwrap()
            .contains("pagination control detached"));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_advance_fault_keeps_partial_results() {
        let mut session = FakeSession::with_pages(vec![
            (page(1, 3), NextPage::Available),
            (page(2, 2), NextPage::Disabled),
        ]);
        session.fail_advance = true;
        let closes = session.closes.clone();

        let result = ListingCollector::new(instant_config())
            .collect(session, &query())
            .await;

        assert_eq!(result.pages, 1);
        assert_eq!(result.vacancies.len(), 3);
        assert!(result.aborted.as_deref().unwrap().contains("next page click"));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }
}
