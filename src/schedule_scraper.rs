use scraper::Html;

use crate::{
    error::CrawlError,
    records::{PageRef, ScheduleRow},
    selector::Query,
};

/// A month page's schedule table, before any filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleBatch {
    pub season: String,
    pub rows: Vec<ScheduleRow>,
}

struct RowQueries {
    date: Query,
    time: Query,
    road_team: Query,
    road_team_pts: Query,
    home_team: Query,
    home_team_pts: Query,
    overtime_flg: Query,
    game_attnd: Query,
}

impl RowQueries {
    fn new() -> Result<Self, CrawlError> {
        Ok(Self {
            date: Query::text(r#"th[data-stat="date_game"] > a"#)?,
            time: Query::text(r#"td[data-stat="game_start_time"]"#)?,
            road_team: Query::text(r#"td[data-stat="visitor_team_name"] > a"#)?,
            road_team_pts: Query::text(r#"td[data-stat="visitor_pts"]"#)?,
            home_team: Query::text(r#"td[data-stat="home_team_name"] > a"#)?,
            home_team_pts: Query::text(r#"td[data-stat="home_pts"]"#)?,
            overtime_flg: Query::text(r#"td[data-stat="overtimes"]"#)?,
            game_attnd: Query::text(r#"td[data-stat="attendance"]"#)?,
        })
    }
}

/// Every row of the month's schedule table. The season label comes from the
/// page heading, or from the season the page was reached through when the
/// heading is missing.
pub fn scrape_schedule(document: &Html, page: &PageRef) -> Result<ScheduleBatch, CrawlError> {
    let season = Query::text(r#"h1[itemprop="name"] > span:nth-of-type(1)"#)?
        .first_in(document)
        .filter(|season| !season.is_empty())
        .unwrap_or_else(|| page.parent_season.label());

    let queries = RowQueries::new()?;
    let rows = Query::text("#schedule > tbody > tr")?
        .elements(document.root_element())
        .into_iter()
        .map(|row| {
            let cell = |query: &Query| query.select_first(row).unwrap_or_default();
            ScheduleRow {
                date: cell(&queries.date),
                time: cell(&queries.time),
                road_team: cell(&queries.road_team),
                road_team_pts: cell(&queries.road_team_pts),
                home_team: cell(&queries.home_team),
                home_team_pts: cell(&queries.home_team_pts),
                overtime_flg: cell(&queries.overtime_flg),
                game_attnd: cell(&queries.game_attnd),
            }
        })
        .collect();

    Ok(ScheduleBatch { season, rows })
}
