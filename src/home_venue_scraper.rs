use scraper::Html;

use crate::{
    error::CrawlError,
    records::RawHomeVenue,
    selector::{Query, extract_text, following_text},
};

pub fn scrape_home_venue(document: &Html) -> Result<RawHomeVenue, CrawlError> {
    let season = Query::text(r#"h1[itemprop="name"] > span:nth-of-type(1)"#)?
        .first_in(document)
        .filter(|season| !season.is_empty())
        .ok_or(CrawlError::MissingField { field: "season" })?;
    let team = Query::text(r#"h1[itemprop="name"] > span:nth-of-type(2)"#)?
        .first_in(document)
        .filter(|team| !team.is_empty())
        .ok_or(CrawlError::MissingField { field: "team" })?;

    // The summary paragraph reads "<strong>Arena:</strong> Name Here".
    let labels = Query::text(r#"div[data-template="Partials/Teams/Summary"] p > strong"#)?;
    let home_arena = labels
        .elements(document.root_element())
        .into_iter()
        .filter(|label| extract_text(*label).contains("Arena:"))
        .find_map(following_text)
        .filter(|arena| !arena.is_empty())
        .ok_or(CrawlError::MissingField { field: "home_arena" })?;

    Ok(RawHomeVenue {
        season,
        team,
        home_arena,
    })
}
