use chrono::Utc;

use crate::config::{ScraperConfig, Selectors};
use crate::error::ScraperError;
use crate::salary::{currency_of, SalaryParser};
use crate::traits::ListingHandle;
use crate::types::VacancyRecord;

/// 求人要素から `VacancyRecord` を組み立てる
#[derive(Debug, Clone)]
pub struct VacancyExtractor {
    config: ScraperConfig,
    salary: SalaryParser,
}

impl VacancyExtractor {
    pub fn new(config: ScraperConfig) -> Self {
        let salary = SalaryParser::new(config.salary_markers.clone());
        Self { config, salary }
    }

    fn selectors(&self) -> &Selectors {
        &self.config.selectors
    }

    /// 1件抽出する。要素が欠けている・給与が解析できない場合はエラー
    pub async fn extract<L: ListingHandle>(
        &self,
        listing: &L,
    ) -> Result<VacancyRecord, ScraperError> {
        let selectors = self.selectors();

        let position = listing.text(&selectors.title).await?;
        if position.trim().is_empty() {
            return Err(ScraperError::ElementNotFound(format!(
                "empty title ({})",
                selectors.title
            )));
        }

        let salary_text = listing.text(&selectors.salary).await?;
        let salary = self.salary.parse(&salary_text)?;
        let currency = currency_of(&salary_text);

        let published_at = listing.text(&selectors.published).await?;

        let href = listing
            .attribute(&selectors.link, "href")
            .await?
            .filter(|href| !href.trim().is_empty())
            .ok_or_else(|| {
                ScraperError::ElementNotFound(format!("href on '{}'", selectors.link))
            })?;

        Ok(VacancyRecord {
            position: position.trim().to_string(),
            created_at: Utc::now(),
            published_at: published_at.trim().to_string(),
            salary_from: salary.from,
            salary_to: salary.to,
            currency,
            city: self.config.city.clone(),
            description: String::new(),
            link: self.config.absolute_link(href.trim()),
        })
    }
}
