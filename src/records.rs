use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::Year;

/// One NBA season, identified by the calendar year it ends in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeasonRef {
    pub year: Year,
}

impl SeasonRef {
    pub fn new(year: Year) -> Self {
        Self { year }
    }

    /// Site-style label: the 2001 season is "2000-01".
    pub fn label(&self) -> String {
        format!("{}-{:02}", self.year - 1, self.year.rem_euclid(100))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageLevel {
    Index,
    Month,
    Detail,
}

impl PageLevel {
    pub fn name(&self) -> &'static str {
        match self {
            PageLevel::Index => "index",
            PageLevel::Month => "month",
            PageLevel::Detail => "detail",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRef {
    pub url: String,
    pub level: PageLevel,
    pub parent_season: SeasonRef,
}

impl PageRef {
    pub fn new(url: impl Into<String>, level: PageLevel, parent_season: SeasonRef) -> Self {
        Self {
            url: url.into(),
            level,
            parent_season,
        }
    }

    /// A page one level down, found on this one.
    pub fn child(&self, url: String, level: PageLevel) -> Self {
        Self::new(url, level, self.parent_season)
    }
}

/// The four data products a crawl can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Product {
    Arena,
    #[serde(rename = "home")]
    HomeVenue,
    #[serde(rename = "perf")]
    Performance,
    Schedule,
}

impl Product {
    pub const ALL: [Product; 4] = [
        Product::Arena,
        Product::HomeVenue,
        Product::Performance,
        Product::Schedule,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Product::Arena => "arena",
            Product::HomeVenue => "home",
            Product::Performance => "perf",
            Product::Schedule => "schedule",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Product {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "arena" => Ok(Product::Arena),
            "home" | "home_venue" => Ok(Product::HomeVenue),
            "perf" | "performance" => Ok(Product::Performance),
            "schedule" => Ok(Product::Schedule),
            other => Err(format!("unknown product {other:?}")),
        }
    }
}

// Raw field bags, as pulled off a page before normalization.

#[derive(Debug, Clone, PartialEq)]
pub struct RawArena {
    pub date_time: String,
    pub road_team: String,
    pub home_team: String,
    /// `None` when the scorebox metadata has no venue line.
    pub arena: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawHomeVenue {
    pub season: String,
    pub team: String,
    pub home_arena: String,
}

/// One side of a box score. Index 0 of [`RawPerformance::sides`] is the road
/// team, index 1 the home team.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawPerformanceSide {
    pub team: String,
    pub conference: String,
    pub pace: String,
    pub ortg: String,
    pub free_throw_rate: String,
    pub three_pt_att_rate: String,
    pub true_shooting_pct: String,
    pub total_rebound_pct: String,
    pub team_steal_pct: String,
    pub team_block_pct: String,
    pub effective_fg_pct: String,
    pub turnovers_per100: String,
    pub off_rebound_pct: String,
    pub def_rebound_pct: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawPerformance {
    pub date_time: String,
    pub sides: [RawPerformanceSide; 2],
}

/// A schedule table row. Empty strings stand for empty cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScheduleRow {
    pub date: String,
    pub time: String,
    pub road_team: String,
    pub road_team_pts: String,
    pub home_team: String,
    pub home_team_pts: String,
    pub overtime_flg: String,
    pub game_attnd: String,
}

// Finished records. Field order is the output column order.

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArenaRecord {
    pub date: String,
    pub time: String,
    pub road_team: String,
    pub home_team: String,
    pub arena: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeVenueRecord {
    pub season: String,
    pub team: String,
    pub home_arena: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceRecord {
    pub date: String,
    pub team: String,
    pub conference: String,
    pub pace: f64,
    pub ortg: f64,
    pub free_throw_rate: f64,
    pub three_pt_att_rate: f64,
    pub true_shooting_pct: f64,
    pub total_rebound_pct: f64,
    pub team_steal_pct: f64,
    pub team_block_pct: f64,
    pub effective_fg_pct: f64,
    pub turnovers_per100: f64,
    pub off_rebound_pct: f64,
    pub def_rebound_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleRecord {
    pub season: String,
    pub date: String,
    pub time: String,
    pub road_team_abbr: String,
    pub road_team: String,
    pub road_team_pts: u16,
    pub home_team_abbr: String,
    pub home_team: String,
    pub home_team_pts: u16,
    pub overtime_flg: String,
    pub game_attnd: u32,
    pub playoff_gm: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Arena(ArenaRecord),
    HomeVenue(HomeVenueRecord),
    Performance(PerformanceRecord),
    Schedule(ScheduleRecord),
}

impl Record {
    pub fn product(&self) -> Product {
        match self {
            Record::Arena(_) => Product::Arena,
            Record::HomeVenue(_) => Product::HomeVenue,
            Record::Performance(_) => Product::Performance,
            Record::Schedule(_) => Product::Schedule,
        }
    }
}
