use std::future::Future;
use std::time::Duration;

use log::debug;
use reqwest::{Client, ClientBuilder, Response};

use crate::{error::CrawlError, ratelimit::RateLimiter};

const USER_AGENT: &str = concat!("courtside/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The single call the crawler needs from a transport: the body of a page
/// that answered with a success status.
pub trait Fetch {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, CrawlError>>;
}

pub struct RequestClient {
    client: Client,
    rate_limiter: RateLimiter,
}

impl RequestClient {
    pub fn new(rate_limiter: RateLimiter) -> anyhow::Result<Self> {
        let client = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            rate_limiter,
        })
    }

    pub async fn fetch_url_response(&self, url: &str) -> Result<Response, CrawlError> {
        // Wait (non-blocking) until we're allowed to make a request according
        // to our self-imposed rate-limiting policy.
        self.rate_limiter.wait_until_ready().await;

        debug!("GET {url}");
        self.client
            .get(url)
            .send()
            .await
            .map_err(|source| CrawlError::Fetch {
                url: url.to_string(),
                source,
            })
    }

    pub async fn fetch_url_body(&self, url: &str) -> Result<String, CrawlError> {
        let response = self.fetch_url_response(url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().await.map_err(|source| CrawlError::Fetch {
            url: url.to_string(),
            source,
        })
    }
}

impl Fetch for RequestClient {
    async fn fetch(&self, url: &str) -> Result<String, CrawlError> {
        self.fetch_url_body(url).await
    }
}
