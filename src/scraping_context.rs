use std::sync::Arc;

use log::info;

use crate::{
    config::ScrapingConfig, crawler::Crawler, ratelimit::RateLimiter, reference::ReferenceTables,
    requests::RequestClient,
};

/// Everything a run needs, built once before the first fetch.
pub struct ScrapingContext {
    pub scraping_config: ScrapingConfig,
    pub reference_tables: Arc<ReferenceTables>,
    pub request_client: RequestClient,
}

impl ScrapingContext {
    pub fn new() -> anyhow::Result<Self> {
        let scraping_config = ScrapingConfig::new()?;
        let reference_tables = ReferenceTables::load(scraping_config.team_abbr_path.as_deref())?;
        info!(
            "loaded {} team abbreviations",
            reference_tables.abbreviations.len()
        );
        let rate_limiter = RateLimiter::new(
            scraping_config.requests_per_sec,
            scraping_config.between_requests,
        );
        let request_client = RequestClient::new(rate_limiter)?;
        Ok(ScrapingContext {
            scraping_config,
            reference_tables: Arc::new(reference_tables),
            request_client,
        })
    }

    pub fn crawler(self) -> Crawler<RequestClient> {
        Crawler::new(
            self.request_client,
            self.scraping_config.crawl,
            self.reference_tables,
        )
    }
}
