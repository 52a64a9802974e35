use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};

use tower::Service;
use tracing::{error, info};

use crate::browser::ChromeSession;
use crate::collector::ListingCollector;
use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::store::{AppendSummary, JsonDocumentStore, RecordStore};
use crate::traits::SearchSession;
use crate::types::{CollectResult, SearchQuery, VacancyRecord};

/// スクレイピングリクエスト
#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    pub position: String,
    pub city: String,
    pub db_path: PathBuf,
    /// ブラウザ設定（headless もここで持つ）
    pub config: ScraperConfig,
}

impl ScrapeRequest {
    pub fn new(position: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            position: position.into(),
            city: city.into(),
            db_path: PathBuf::from("vacancies.json"),
            config: ScraperConfig::default(),
        }
    }

    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    pub fn with_config(mut self, config: ScraperConfig) -> Self {
        self.config = config;
        self
    }

    pub fn query(&self) -> SearchQuery {
        SearchQuery::new(&self.position, &self.city)
    }
}

impl From<ScrapeRequest> for ScraperConfig {
    fn from(req: ScrapeRequest) -> Self {
        req.config
    }
}

/// スクレイピング結果
#[derive(Debug)]
pub struct ScrapeResult {
    /// 今回の収集結果
    pub collected: CollectResult,
    pub appended: AppendSummary,
    /// 保存済みの全レコード（過去の実行分を含む）
    pub stored: Vec<VacancyRecord>,
}

/// 収集 → 保存 → 全件読み出し
pub async fn scrape_into_store<S, T>(
    session: S,
    config: ScraperConfig,
    query: &SearchQuery,
    store: &mut T,
) -> Result<ScrapeResult, ScraperError>
where
    S: SearchSession,
    T: RecordStore,
{
    let collected = ListingCollector::new(config).collect(session, query).await;
    let appended = store.append(&collected.vacancies);
    let stored = store.all()?;

    Ok(ScrapeResult {
        collected,
        appended,
        stored,
    })
}

/// tower::Serviceを実装したスクレイパーサービス
#[derive(Debug, Clone, Default)]
pub struct ScraperService {}

impl ScraperService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Service<ScrapeRequest> for ScraperService {
    type Response = ScrapeResult;
    type Error = ScraperError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ScrapeRequest) -> Self::Future {
        info!(
            "Scrape request: position={}, city={}, db={:?}",
            req.position, req.city, req.db_path
        );

        Box::pin(async move {
            let query = req.query();
            let mut store = JsonDocumentStore::open(&req.db_path);
            let config: ScraperConfig = req.into();

            let result = match ChromeSession::launch(&config).await {
                Ok(session) => scrape_into_store(session, config, &query, &mut store).await?,
                Err(e) => {
                    // 起動失敗も中断扱い。保存済みデータは返す
                    error!("Browser launch failed: {}", e);
                    ScrapeResult {
                        collected: CollectResult {
                            aborted: Some(e.to_string()),
                            ..Default::default()
                        },
                        appended: AppendSummary::default(),
                        stored: store.all()?,
                    }
                }
            };

            info!(
                "Scrape finished: collected={}, stored total={}",
                result.collected.vacancies.len(),
                result.stored.len()
            );

            Ok(result)
        })
    }
}
