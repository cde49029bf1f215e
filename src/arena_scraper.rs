use scraper::Html;

use crate::{error::CrawlError, records::RawArena, selector::Query};

/// Road and home team names from a box score's scorebox, in page order.
pub fn scorebox_teams(document: &Html) -> Result<[String; 2], CrawlError> {
    let mut teams = Query::text(r#"a[itemprop="name"]"#)?
        .select_in(document)
        .into_iter();
    match (teams.next(), teams.next()) {
        (Some(road), Some(home)) if !road.is_empty() && !home.is_empty() => Ok([road, home]),
        _ => Err(CrawlError::MissingField { field: "teams" }),
    }
}

/// Text lines of the scorebox metadata block. The first is the start time
/// and date, the second (when present) the venue.
pub fn scorebox_meta(document: &Html) -> Result<Vec<String>, CrawlError> {
    Ok(Query::own_text("div.scorebox_meta > div")?.select_in(document))
}

pub fn scrape_arena(document: &Html) -> Result<RawArena, CrawlError> {
    let [road_team, home_team] = scorebox_teams(document)?;
    let mut meta = scorebox_meta(document)?.into_iter();
    let date_time = meta
        .next()
        .ok_or(CrawlError::MissingField { field: "date" })?;
    Ok(RawArena {
        date_time,
        road_team,
        home_team,
        arena: meta.next(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(meta: &str) -> Html {
        Html::parse_document(&format!(
            r#"<div class="scorebox">
                <div><strong><a itemprop="name" href="/teams/LAL/2002.html">Los Angeles Lakers</a></strong></div>
                <div><strong><a itemprop="name" href="/teams/SAC/2002.html">Sacramento Kings</a></strong></div>
                <div class="scorebox_meta">{meta}</div>
            </div>"#
        ))
    }

    #[test]
    fn venue_is_the_second_meta_line() {
        let raw = scrape_arena(&page(
            "<div>7:30 PM, November 3, 2001</div><div>Arco Arena</div>",
        ))
        .unwrap();
        assert_eq!(raw.road_team, "Los Angeles Lakers");
        assert_eq!(raw.home_team, "Sacramento Kings");
        assert_eq!(raw.date_time, "7:30 PM, November 3, 2001");
        assert_eq!(raw.arena.as_deref(), Some("Arco Arena"));
    }

    #[test]
    fn single_meta_line_leaves_venue_unknown() {
        let raw = scrape_arena(&page("<div>7:30 PM, November 3, 2001</div>")).unwrap();
        assert_eq!(raw.arena, None);
    }

    #[test]
    fn missing_teams_is_a_hard_error() {
        let document = Html::parse_document(
            r#"<div class="scorebox_meta"><div>7:30 PM, November 3, 2001</div></div>"#,
        );
        assert!(matches!(
            scrape_arena(&document),
            Err(CrawlError::MissingField { field: "teams" })
        ));
    }

    #[test]
    fn missing_meta_is_a_hard_error() {
        assert!(matches!(
            scrape_arena(&page("")),
            Err(CrawlError::MissingField { field: "date" })
        ));
    }
}
