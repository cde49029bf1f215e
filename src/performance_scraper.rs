use scraper::Html;

use crate::{
    arena_scraper::{scorebox_meta, scorebox_teams},
    error::CrawlError,
    records::{RawPerformance, RawPerformanceSide},
    reference::ConferenceTable,
    selector::{Query, comment_fragment},
};

// The four-factors table ships inside an HTML comment. Its glossary text is
// the only stable thing to find it by.
const FOUR_FACTORS_MARKER: &str = "Pace Factor";

/// Reads both sides of a box score. Side 0 is the team listed first on the
/// page (road), side 1 the second (home).
pub fn scrape_performance(
    document: &Html,
    conferences: &ConferenceTable,
) -> Result<RawPerformance, CrawlError> {
    let teams = scorebox_teams(document)?;
    let date_time = scorebox_meta(document)?
        .into_iter()
        .next()
        .ok_or(CrawlError::MissingField { field: "date" })?;

    let four_factors = comment_fragment(document, FOUR_FACTORS_MARKER)
        .ok_or(CrawlError::MissingField { field: "pace" })?;
    let pace = Query::text(r#"td[data-stat="pace"]"#)?
        .first_in(&four_factors)
        .ok_or(CrawlError::MissingField { field: "pace" })?;
    let ortg = pair(
        "ortg",
        Query::text(r#"td[data-stat="off_rtg"]"#)?.select_in(&four_factors),
    )?;

    let footer = |field: &'static str, css: &'static str| -> Result<[String; 2], CrawlError> {
        pair(field, Query::text(css)?.select_in(document))
    };
    let free_throw_rate = footer(
        "free_throw_rate",
        r#"tfoot > tr > td[data-stat="fta_per_fga_pct"]"#,
    )?;
    let three_pt_att_rate = footer(
        "three_pt_att_rate",
        r#"tfoot > tr > td[data-stat="fg3a_per_fga_pct"]"#,
    )?;
    let true_shooting_pct = footer("true_shooting_pct", r#"tfoot > tr > td[data-stat="ts_pct"]"#)?;
    let total_rebound_pct = footer("total_rebound_pct", r#"tfoot > tr > td[data-stat="trb_pct"]"#)?;
    let team_steal_pct = footer("team_steal_pct", r#"tfoot > tr > td[data-stat="stl_pct"]"#)?;
    let team_block_pct = footer("team_block_pct", r#"tfoot > tr > td[data-stat="blk_pct"]"#)?;
    let effective_fg_pct = footer("effective_fg_pct", r#"tfoot > tr > td[data-stat="efg_pct"]"#)?;
    let turnovers_per100 = footer("turnovers_per100", r#"tfoot > tr > td[data-stat="tov_pct"]"#)?;
    let off_rebound_pct = footer("off_rebound_pct", r#"tfoot > tr > td[data-stat="orb_pct"]"#)?;
    let def_rebound_pct = footer("def_rebound_pct", r#"tfoot > tr > td[data-stat="drb_pct"]"#)?;

    let side = |i: usize| -> Result<RawPerformanceSide, CrawlError> {
        Ok(RawPerformanceSide {
            team: teams[i].clone(),
            conference: conferences.conference(&teams[i])?.to_string(),
            pace: pace.clone(),
            ortg: ortg[i].clone(),
            free_throw_rate: free_throw_rate[i].clone(),
            three_pt_att_rate: three_pt_att_rate[i].clone(),
            true_shooting_pct: true_shooting_pct[i].clone(),
            total_rebound_pct: total_rebound_pct[i].clone(),
            team_steal_pct: team_steal_pct[i].clone(),
            team_block_pct: team_block_pct[i].clone(),
            effective_fg_pct: effective_fg_pct[i].clone(),
            turnovers_per100: turnovers_per100[i].clone(),
            off_rebound_pct: off_rebound_pct[i].clone(),
            def_rebound_pct: def_rebound_pct[i].clone(),
        })
    };

    Ok(RawPerformance {
        date_time,
        sides: [side(0)?, side(1)?],
    })
}

/// One value per team, no more and no less.
fn pair(field: &'static str, values: Vec<String>) -> Result<[String; 2], CrawlError> {
    let found = values.len();
    <[String; 2]>::try_from(values).map_err(|_| CrawlError::FieldCount {
        field,
        expected: 2,
        found,
    })
}
