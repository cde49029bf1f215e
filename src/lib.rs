mod arena_scraper;
mod home_venue_scraper;
mod link_scraper;
mod performance_scraper;
mod schedule_scraper;

pub mod config;
pub mod crawler;
pub mod error;
pub mod normalize;
pub mod ratelimit;
pub mod records;
pub mod reference;
pub mod requests;
pub mod scraping_context;
pub mod selector;
pub mod sink;

pub type Year = i32;

pub use config::{CrawlConfig, ScrapingConfig};
pub use crawler::{CrawlReport, Crawler, PageFailure, PageOutcome, PageWarning};
pub use error::{CrawlError, ErrorKind, NormalizationError};
pub use records::{
    ArenaRecord, HomeVenueRecord, PageLevel, PageRef, PerformanceRecord, Product, Record,
    ScheduleRecord, ScheduleRow, SeasonRef,
};
pub use reference::{ReferenceTables, TeamAbbrTable};
pub use requests::{Fetch, RequestClient};
pub use scraping_context::ScrapingContext;
