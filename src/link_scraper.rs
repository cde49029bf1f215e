//! Link discovery on index and month pages.

use reqwest::Url;
use scraper::Html;

use crate::{error::CrawlError, selector::Query};

/// Month filter links on a season's games index.
pub fn month_links(document: &Html, base: &str) -> Result<Vec<String>, CrawlError> {
    links(document, base, "div.filter > div > a")
}

/// Box score links in a month's schedule table.
pub fn box_score_links(document: &Html, base: &str) -> Result<Vec<String>, CrawlError> {
    links(document, base, r#"td[data-stat="box_score_text"] > a"#)
}

/// Team-season links in a league season's standings.
pub fn team_links(document: &Html, base: &str) -> Result<Vec<String>, CrawlError> {
    links(document, base, r#"th[data-stat="team_name"] > a"#)
}

fn links(document: &Html, base: &str, css: &'static str) -> Result<Vec<String>, CrawlError> {
    Query::attr(css, "href")?
        .select_in(document)
        .iter()
        .map(|href| resolve(base, href))
        .collect()
}

/// Joins a possibly relative `href` onto the page it was found on.
pub fn resolve(base: &str, href: &str) -> Result<String, CrawlError> {
    let link_error = || CrawlError::Link {
        base: base.to_string(),
        href: href.to_string(),
    };
    let base_url = Url::parse(base).map_err(|_| link_error())?;
    let joined = base_url.join(href.trim()).map_err(|_| link_error())?;
    Ok(joined.to_string())
}
