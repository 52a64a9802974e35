//! superjob.ru 求人スクレイパー
//!
//! - 検索結果をページ送りしながら求人を抽出
//! - 給与テキストを下限/上限に分解
//! - TinyDB互換のJSONファイルに追記保存
//!
//! # 使用例
//!
//! ```rust,ignore
//! use vacancy_scraper::{ScraperService, ScrapeRequest};
//! use tower::Service;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut service = ScraperService::new();
//!
//!     let request = ScrapeRequest::new("садовник", "москва")
//!         .with_db_path("vacancies.json")
//!         .with_headless(false);
//!
//!     let result = service.call(request).await.unwrap();
//!     println!("stored: {}", result.stored.len());
//! }
//! ```
//!
//! # ブラウザを使わない場合
//!
//! `SearchSession` / `ListingHandle` を実装すれば `ListingCollector` をそのまま使える。
//!
//! ```rust,ignore
//! use vacancy_scraper::{ListingCollector, ScraperConfig, SearchQuery};
//!
//! let collector = ListingCollector::new(ScraperConfig::default());
//! let result = collector.collect(my_session, &SearchQuery::new("садовник", "москва")).await;
//! ```

pub mod browser;
pub mod collector;
pub mod config;
pub mod error;
pub mod extractor;
pub mod salary;
pub mod service;
pub mod store;
pub mod traits;
pub mod types;

// 主要な型をリエクスポート
pub use browser::{ChromeListing, ChromeSession};
pub use collector::ListingCollector;
pub use config::{PageWait, ScraperConfig, Selectors};
pub use error::ScraperError;
pub use extractor::VacancyExtractor;
pub use salary::{currency_of, SalaryMarkers, SalaryParser, SalaryRange};
pub use service::{scrape_into_store, ScrapeRequest, ScrapeResult, ScraperService};
pub use store::{AppendSummary, JsonDocumentStore, RecordStore};
pub use traits::{ListingHandle, NextPage, SearchSession};
pub use types::{CollectResult, SearchQuery, VacancyRecord};
