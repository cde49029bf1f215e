use std::num::NonZeroU32;
use std::ops::Range;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    Year,
    ratelimit::{DEFAULT_MS_BETWEEN_REQ, DEFAULT_REQ_PER_SEC},
    records::{PageLevel, PageRef, Product, SeasonRef},
};

const DEFAULT_GAMES_URL: &str = "https://www.basketball-reference.com/leagues/NBA_{year}_games.html";
const DEFAULT_SEASON_URL: &str = "https://www.basketball-reference.com/leagues/NBA_{year}.html";

/// The env vars read for a crawl. Every one of them is optional.
#[derive(Debug, Deserialize)]
pub struct ScrapingEnv {
    #[serde(default = "default_games_url")]
    nba_games_url: String,
    #[serde(default = "default_season_url")]
    nba_season_url: String,
    #[serde(default = "default_season_start")]
    season_start: Year,
    #[serde(default = "default_season_end")]
    season_end: Year,
    #[serde(default = "default_concurrency")]
    crawl_concurrency: usize,
    #[serde(default = "default_requests_per_sec")]
    requests_per_sec: u32,
    #[serde(default = "default_ms_between_requests")]
    ms_between_requests: u64,
    team_abbr_path: Option<PathBuf>,
    #[serde(default = "default_output_dir")]
    output_dir: PathBuf,
    #[serde(default = "default_products")]
    products: Vec<String>,
}

fn default_games_url() -> String {
    DEFAULT_GAMES_URL.to_string()
}

fn default_season_url() -> String {
    DEFAULT_SEASON_URL.to_string()
}

fn default_season_start() -> Year {
    2001
}

fn default_season_end() -> Year {
    2020
}

fn default_concurrency() -> usize {
    8
}

fn default_requests_per_sec() -> u32 {
    DEFAULT_REQ_PER_SEC.get()
}

fn default_ms_between_requests() -> u64 {
    DEFAULT_MS_BETWEEN_REQ
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_products() -> Vec<String> {
    Product::ALL.iter().map(|p| p.name().to_string()).collect()
}

/// Where seeds come from and how hard the crawl may push.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Games index template; `{year}` is replaced by the season year.
    pub games_url: String,
    /// League season template, used by the home-venue crawl.
    pub season_url: String,
    pub seasons: Range<Year>,
    pub concurrency: usize,
}

impl CrawlConfig {
    pub fn new(games_url: &str, season_url: &str, seasons: Range<Year>) -> Self {
        Self {
            games_url: games_url.to_string(),
            season_url: season_url.to_string(),
            seasons,
            concurrency: default_concurrency(),
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn get_url_for_season(&self, product: Product, season: SeasonRef) -> String {
        let template = match product {
            Product::HomeVenue => &self.season_url,
            Product::Arena | Product::Performance | Product::Schedule => &self.games_url,
        };
        template.replace("{year}", &season.year.to_string())
    }

    /// One index page per season, start inclusive, end exclusive.
    pub fn seeds(&self, product: Product) -> Vec<PageRef> {
        self.seasons
            .clone()
            .map(SeasonRef::new)
            .map(|season| {
                PageRef::new(
                    self.get_url_for_season(product, season),
                    PageLevel::Index,
                    season,
                )
            })
            .collect()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.seasons.is_empty() {
            bail!(
                "season range {}..{} is empty",
                self.seasons.start,
                self.seasons.end
            );
        }
        if self.concurrency == 0 {
            bail!("crawl concurrency must be at least 1");
        }
        Ok(())
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_GAMES_URL,
            DEFAULT_SEASON_URL,
            default_season_start()..default_season_end(),
        )
    }
}

pub struct ScrapingConfig {
    pub crawl: CrawlConfig,
    pub requests_per_sec: NonZeroU32,
    pub between_requests: Duration,
    pub team_abbr_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub products: Vec<Product>,
}

impl ScrapingConfig {
    pub fn new() -> anyhow::Result<Self> {
        let scraping_env = ScrapingEnv::load_from_env()?;
        Self::from_env(scraping_env)
    }

    fn from_env(env: ScrapingEnv) -> anyhow::Result<Self> {
        let crawl = CrawlConfig::new(
            &env.nba_games_url,
            &env.nba_season_url,
            env.season_start..env.season_end,
        )
        .with_concurrency(env.crawl_concurrency);
        crawl.validate()?;

        let requests_per_sec = NonZeroU32::new(env.requests_per_sec)
            .context("REQUESTS_PER_SEC must be at least 1")?;
        let products = env
            .products
            .iter()
            .map(|name| name.parse::<Product>().map_err(anyhow::Error::msg))
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self {
            crawl,
            requests_per_sec,
            between_requests: Duration::from_millis(env.ms_between_requests),
            team_abbr_path: env.team_abbr_path,
            output_dir: env.output_dir,
            products,
        })
    }
}

// Extension trait.
pub trait LoadFromEnv: DeserializeOwned {
    fn load_from_env() -> anyhow::Result<Self> {
        // Don't throw an error if .env file doesn't exist.
        let _ = dotenv::dotenv();
        let config =
            envy::from_env::<Self>().context("failed to load env variables into config struct")?;
        Ok(config)
    }
}

impl<T: DeserializeOwned> LoadFromEnv for T {}
