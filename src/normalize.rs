//! Pure conversion from raw field bags to finished records.
//!
//! Nothing here touches the network or the filesystem. Every failure is a
//! [`NormalizationError`] scoped to the page being processed.

use std::sync::LazyLock;

use chrono::{Month, NaiveDate, NaiveTime};
use regex::{Captures, Regex};

use crate::error::NormalizationError;
use crate::records::{
    ArenaRecord, HomeVenueRecord, PerformanceRecord, RawArena, RawHomeVenue, RawPerformance,
    RawPerformanceSide, ScheduleRecord, ScheduleRow,
};
use crate::reference::{ReferenceTables, SeasonLabel};

// The month word is captured whole and must name a month on its own.
static MONTH_DAY_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([a-z]+)\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})\b")
        .expect("month/day/year pattern")
});

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").expect("iso date pattern")
});

// "7:30 PM", "7:30pm", "7:30p", "7:30 p.m."; the suffix must not run into a
// word, so "7:30 at" is not read as a.m.
static CLOCK_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2}):(\d{2})\s*([ap])(?:\.?\s*m\b\.?|\.|\b)").expect("clock time pattern")
});

// Any "h:mm" token, with or without a suffix.
static BARE_CLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{1,2}:\d{2}").expect("bare clock pattern"));

/// A game start as read off the page. Time is absent on date-only strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameMoment {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
}

impl GameMoment {
    /// `YYYY-MM-DD`.
    pub fn date_string(&self) -> String {
        format_date(self.date)
    }

    /// `7:30pm`, or empty when no time was given.
    pub fn time_string(&self) -> String {
        self.time.map(format_time).unwrap_or_default()
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn format_time(time: NaiveTime) -> String {
    time.format("%-I:%M%p").to_string().to_lowercase()
}

/// Parses loosely formatted strings such as `"7:30 PM, November 3, 2001"`,
/// `"Wed, Apr 14, 2004"` or `"November 3, 2001, 7:30 PM, at Arco Arena"`.
/// Words that are neither a date nor a clock time are ignored, but a clock
/// time that cannot be read (`"19:30"`, `"7:30"` with no am/pm) is an error.
pub fn parse_date_time(raw: &str) -> Result<GameMoment, NormalizationError> {
    let fail = || NormalizationError::DateTime(raw.to_string());
    let date = parse_date(raw).ok_or_else(fail)?;
    let time = match BARE_CLOCK.find(raw) {
        Some(token) => {
            let caps = CLOCK_TIME
                .captures_at(raw, token.start())
                .filter(|caps| caps.get(0).is_some_and(|m| m.start() == token.start()))
                .ok_or_else(fail)?;
            Some(clock_time(&caps).ok_or_else(fail)?)
        }
        None => None,
    };
    Ok(GameMoment { date, time })
}

/// Clock time alone, as in the schedule's start-time column.
pub fn parse_time(raw: &str) -> Result<NaiveTime, NormalizationError> {
    let fail = || NormalizationError::DateTime(raw.to_string());
    let caps = CLOCK_TIME.captures(raw).ok_or_else(fail)?;
    clock_time(&caps).ok_or_else(fail)
}

fn clock_time(caps: &Captures<'_>) -> Option<NaiveTime> {
    let hour = caps[1].parse().ok()?;
    let minute = caps[2].parse().ok()?;
    twelve_hour(hour, minute, caps[3].eq_ignore_ascii_case("p"))
}

/// The first "Month day, year" whose month word is a real month name, else an
/// ISO date.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let named = MONTH_DAY_YEAR
        .captures_iter(raw)
        .find_map(|caps| Some((caps[1].parse::<Month>().ok()?, caps)));
    if let Some((month, caps)) = named {
        let day = caps[2].parse().ok()?;
        let year = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month.number_from_month(), day);
    }
    let caps = ISO_DATE.captures(raw)?;
    NaiveDate::from_ymd_opt(caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?)
}

fn twelve_hour(hour: u32, minute: u32, pm: bool) -> Option<NaiveTime> {
    if !(1..=12).contains(&hour) {
        return None;
    }
    let hour = match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

pub fn parse_float(field: &'static str, raw: &str) -> Result<f64, NormalizationError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| NormalizationError::Number {
            field,
            value: raw.to_string(),
        })
}

/// Attendance with thousands separators stripped: `"19,812"` becomes `19812`.
pub fn parse_attendance(raw: &str) -> Result<u32, NormalizationError> {
    raw.replace(',', "")
        .trim()
        .parse()
        .map_err(|_| NormalizationError::Number {
            field: "game_attnd",
            value: raw.to_string(),
        })
}

fn parse_points(field: &'static str, raw: &str) -> Result<u16, NormalizationError> {
    raw.trim().parse().map_err(|_| NormalizationError::Number {
        field,
        value: raw.to_string(),
    })
}

pub fn normalize_arena(raw: RawArena) -> Result<ArenaRecord, NormalizationError> {
    let moment = parse_date_time(&raw.date_time)?;
    Ok(ArenaRecord {
        date: moment.date_string(),
        time: moment.time_string(),
        road_team: raw.road_team,
        home_team: raw.home_team,
        arena: raw.arena.unwrap_or_default(),
    })
}

pub fn normalize_home_venue(raw: RawHomeVenue) -> HomeVenueRecord {
    HomeVenueRecord {
        season: raw.season.trim().to_string(),
        team: raw.team.trim().to_string(),
        home_arena: raw.home_arena.trim().to_string(),
    }
}

/// Both sides of one box score. They share the page date by construction.
pub fn normalize_performance(
    raw: RawPerformance,
) -> Result<[PerformanceRecord; 2], NormalizationError> {
    let date = parse_date_time(&raw.date_time)?.date_string();
    let [road, home] = raw.sides;
    Ok([
        performance_side(&date, road)?,
        performance_side(&date, home)?,
    ])
}

fn performance_side(
    date: &str,
    side: RawPerformanceSide,
) -> Result<PerformanceRecord, NormalizationError> {
    Ok(PerformanceRecord {
        date: date.to_string(),
        pace: parse_float("pace", &side.pace)?,
        ortg: parse_float("ortg", &side.ortg)?,
        free_throw_rate: parse_float("free_throw_rate", &side.free_throw_rate)?,
        three_pt_att_rate: parse_float("three_pt_att_rate", &side.three_pt_att_rate)?,
        true_shooting_pct: parse_float("true_shooting_pct", &side.true_shooting_pct)?,
        total_rebound_pct: parse_float("total_rebound_pct", &side.total_rebound_pct)?,
        team_steal_pct: parse_float("team_steal_pct", &side.team_steal_pct)?,
        team_block_pct: parse_float("team_block_pct", &side.team_block_pct)?,
        effective_fg_pct: parse_float("effective_fg_pct", &side.effective_fg_pct)?,
        turnovers_per100: parse_float("turnovers_per100", &side.turnovers_per100)?,
        off_rebound_pct: parse_float("off_rebound_pct", &side.off_rebound_pct)?,
        def_rebound_pct: parse_float("def_rebound_pct", &side.def_rebound_pct)?,
        team: side.team,
        conference: side.conference,
    })
}

/// A row is unplayed when either score cell is blank.
pub fn is_played(row: &ScheduleRow) -> bool {
    !row.road_team_pts.trim().is_empty() && !row.home_team_pts.trim().is_empty()
}

/// Drops unplayed games, then resolves abbreviations and playoff status for
/// what is left. Source order is kept.
pub fn normalize_schedule(
    season: &str,
    rows: Vec<ScheduleRow>,
    tables: &ReferenceTables,
) -> Result<Vec<ScheduleRecord>, NormalizationError> {
    let season = SeasonLabel::parse(season)?;
    let cutoff = tables.playoffs.cutoff(&season)?;

    rows.into_iter()
        .filter(is_played)
        .map(|row| -> Result<ScheduleRecord, NormalizationError> {
            let date = parse_date_time(&row.date)?.date;
            let time = match row.time.trim() {
                "" => String::new(),
                raw => format_time(parse_time(raw)?),
            };
            Ok(ScheduleRecord {
                season: season.as_str().to_string(),
                date: format_date(date),
                time,
                road_team_abbr: tables.abbreviations.abbreviation(&row.road_team)?.to_string(),
                road_team_pts: parse_points("road_team_pts", &row.road_team_pts)?,
                home_team_abbr: tables.abbreviations.abbreviation(&row.home_team)?.to_string(),
                home_team_pts: parse_points("home_team_pts", &row.home_team_pts)?,
                overtime_flg: row.overtime_flg.trim().to_string(),
                game_attnd: parse_attendance(&row.game_attnd)?,
                playoff_gm: date >= cutoff,
                road_team: row.road_team,
                home_team: row.home_team,
            })
        })
        .collect()
}
