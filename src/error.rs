use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("browser init error: {0}")]
    BrowserInit(String),

    #[error("navigation error: {0}")]
    Navigation(String),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("salary parse error: {0}")]
    SalaryParse(String),

    #[error("listing read error: {0}")]
    ListingRead(String),

    #[error("session error: {0}")]
    Session(String),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScraperError {
    /// Listing-level failures skip a single listing; everything else ends the run.
    pub fn is_listing_level(&self) -> bool {
        matches!(
            self,
            ScraperError::ElementNotFound(_)
                | ScraperError::SalaryParse(_)
                | ScraperError::ListingRead(_)
        )
    }
}
