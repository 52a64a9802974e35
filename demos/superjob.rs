//! superjob.ru スクレイパー
//!
//! 実行方法:
//! ```
//! cargo run --example superjob
//! ```

use tower::Service;
use tracing_subscriber::EnvFilter;
use vacancy_scraper::{ScrapeRequest, ScraperService};

#[tokio::main]
async fn main() {
    // ログ設定
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let request = ScrapeRequest::new("садовник", "москва").with_db_path("vacancies.json");

    println!("=== Superjob Scraper ===");

    let mut service = ScraperService::new();
    match service.call(request).await {
        Ok(result) => {
            if let Some(reason) = &result.collected.aborted {
                eprintln!("Run aborted, partial results kept: {}", reason);
            }
            println!(
                "Collected {} vacancies ({} skipped), {} stored in total",
                result.collected.vacancies.len(),
                result.collected.skipped,
                result.stored.len()
            );
            match serde_json::to_string_pretty(&result.stored) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Failed to print stored vacancies: {}", e),
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
        }
    }
}
