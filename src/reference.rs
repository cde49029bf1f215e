//! Read-only lookup tables, loaded once before a crawl starts and shared by
//! every in-flight page.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::Context;
use chrono::NaiveDate;
use log::warn;
use regex::Regex;
use serde::Deserialize;

use crate::error::NormalizationError;

const BUNDLED_TEAM_ABBR: &str = include_str!("../data/team-abbr.csv");

static SEASON_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}$").expect("season label pattern"));

#[derive(Debug, Deserialize)]
struct TeamAbbrRow {
    long_name: String,
    abbr: String,
}

/// Full team name to the site's three-letter code.
#[derive(Debug, Clone, Default)]
pub struct TeamAbbrTable {
    by_name: HashMap<String, String>,
}

impl TeamAbbrTable {
    /// Reads a `long_name,abbr` CSV with a header row.
    pub fn from_reader<R: Read>(reader: R) -> anyhow::Result<Self> {
        let mut by_name = HashMap::new();
        let mut csv_reader = csv::Reader::from_reader(reader);
        for row in csv_reader.deserialize::<TeamAbbrRow>() {
            let row = row.context("malformed team abbreviation row")?;
            let name = row.long_name.trim().to_string();
            let abbr = row.abbr.trim().to_string();
            if let Some(previous) = by_name.insert(name.clone(), abbr.clone()) {
                warn!("team {name:?} listed twice, {previous} replaced by {abbr}");
            }
        }
        Ok(Self { by_name })
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open team abbreviations at {}", path.display()))?;
        Self::from_reader(file)
    }

    /// The table shipped in `data/team-abbr.csv`.
    pub fn bundled() -> anyhow::Result<Self> {
        Self::from_reader(BUNDLED_TEAM_ABBR.as_bytes())
    }

    pub fn abbreviation(&self, team: &str) -> Result<&str, NormalizationError> {
        self.by_name
            .get(team)
            .map(String::as_str)
            .ok_or_else(|| NormalizationError::UnknownAbbreviation(team.to_string()))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

const CONFERENCES: &[(&str, char)] = &[
    ("Atlanta Hawks", 'E'),
    ("Boston Celtics", 'E'),
    ("Brooklyn Nets", 'E'),
    ("Charlotte Bobcats", 'E'),
    ("Charlotte Hornets", 'E'),
    ("Chicago Bulls", 'E'),
    ("Cleveland Cavaliers", 'E'),
    ("Dallas Mavericks", 'W'),
    ("Denver Nuggets", 'W'),
    ("Detroit Pistons", 'E'),
    ("Golden State Warriors", 'W'),
    ("Houston Rockets", 'W'),
    ("Indiana Pacers", 'E'),
    ("Los Angeles Clippers", 'W'),
    ("Los Angeles Lakers", 'W'),
    ("Memphis Grizzlies", 'W'),
    ("Miami Heat", 'E'),
    ("Milwaukee Bucks", 'E'),
    ("Minnesota Timberwolves", 'W'),
    ("New Jersey Nets", 'E'),
    ("New Orleans Hornets", 'E'),
    ("New Orleans Pelicans", 'W'),
    ("New Orleans/Oklahoma City Hornets", 'W'),
    ("New York Knicks", 'E'),
    ("Oklahoma City Thunder", 'W'),
    ("Orlando Magic", 'E'),
    ("Philadelphia 76ers", 'E'),
    ("Phoenix Suns", 'W'),
    ("Portland Trail Blazers", 'W'),
    ("Sacramento Kings", 'W'),
    ("San Antonio Spurs", 'W'),
    ("Seattle SuperSonics", 'W'),
    ("Toronto Raptors", 'E'),
    ("Utah Jazz", 'W'),
    ("Vancouver Grizzlies", 'W'),
    ("Washington Wizards", 'E'),
];

/// Full team name, including relocated and renamed franchises, to `E`/`W`.
#[derive(Debug, Clone)]
pub struct ConferenceTable {
    by_name: HashMap<&'static str, char>,
}

impl Default for ConferenceTable {
    fn default() -> Self {
        Self {
            by_name: CONFERENCES.iter().copied().collect(),
        }
    }
}

impl ConferenceTable {
    pub fn conference(&self, team: &str) -> Result<char, NormalizationError> {
        self.by_name
            .get(team)
            .copied()
            .ok_or_else(|| NormalizationError::UnknownConference(team.to_string()))
    }
}

/// A validated "YYYY-YY" season label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeasonLabel(String);

impl SeasonLabel {
    pub fn parse(raw: &str) -> Result<Self, NormalizationError> {
        if SEASON_LABEL.is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(NormalizationError::SeasonLabel(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

const PLAYOFF_CUTOFFS: &[(&str, (i32, u32, u32))] = &[
    ("2018-19", (2019, 4, 13)),
    ("2017-18", (2018, 4, 14)),
    ("2016-17", (2017, 4, 15)),
    ("2015-16", (2016, 4, 16)),
    ("2014-15", (2015, 4, 18)),
    ("2013-14", (2014, 4, 19)),
    ("2012-13", (2013, 4, 20)),
    ("2011-12", (2012, 4, 28)),
    ("2010-11", (2011, 4, 16)),
    ("2009-10", (2010, 4, 17)),
    ("2008-09", (2009, 4, 18)),
    ("2007-08", (2008, 4, 19)),
    ("2006-07", (2007, 4, 21)),
    ("2005-06", (2006, 4, 22)),
    ("2004-05", (2005, 4, 23)),
    ("2003-04", (2004, 4, 17)),
    ("2002-03", (2003, 4, 19)),
    ("2001-02", (2002, 4, 20)),
    ("2000-01", (2001, 4, 21)),
];

/// First playoff date of each season.
#[derive(Debug, Clone)]
pub struct PlayoffCutoffTable {
    by_season: HashMap<&'static str, NaiveDate>,
}

impl Default for PlayoffCutoffTable {
    fn default() -> Self {
        let by_season = PLAYOFF_CUTOFFS
            .iter()
            .filter_map(|&(season, (y, m, d))| Some((season, NaiveDate::from_ymd_opt(y, m, d)?)))
            .collect();
        Self { by_season }
    }
}

impl PlayoffCutoffTable {
    pub fn cutoff(&self, season: &SeasonLabel) -> Result<NaiveDate, NormalizationError> {
        self.by_season
            .get(season.as_str())
            .copied()
            .ok_or_else(|| NormalizationError::UnknownSeason(season.as_str().to_string()))
    }

    /// Games on or after the cutoff are playoff games.
    pub fn is_playoff(&self, season: &SeasonLabel, date: NaiveDate) -> Result<bool, NormalizationError> {
        Ok(date >= self.cutoff(season)?)
    }
}

#[derive(Debug, Clone)]
pub struct ReferenceTables {
    pub abbreviations: TeamAbbrTable,
    pub conferences: ConferenceTable,
    pub playoffs: PlayoffCutoffTable,
}

impl ReferenceTables {
    pub fn new(abbreviations: TeamAbbrTable) -> Self {
        Self {
            abbreviations,
            conferences: ConferenceTable::default(),
            playoffs: PlayoffCutoffTable::default(),
        }
    }

    /// Loads abbreviations from `path`, or the bundled table when unset.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let abbreviations = match path {
            Some(path) => TeamAbbrTable::from_path(path)?,
            None => TeamAbbrTable::bundled()?,
        };
        Ok(Self::new(abbreviations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn bundled_abbreviations_cover_every_conference_name() {
        let abbreviations = TeamAbbrTable::bundled().unwrap();
        let conferences = ConferenceTable::default();
        for (name, _) in CONFERENCES {
            assert!(abbreviations.abbreviation(name).is_ok(), "{name}");
            assert!(conferences.conference(name).is_ok(), "{name}");
        }
        assert_eq!(abbreviations.len(), CONFERENCES.len());
    }

    #[test]
    fn abbreviation_lookup_is_exact() {
        let table = TeamAbbrTable::from_reader("long_name,abbr\nUtah Jazz,UTA\n".as_bytes()).unwrap();
        assert_eq!(table.abbreviation("Utah Jazz"), Ok("UTA"));
        assert_eq!(
            table.abbreviation("utah jazz"),
            Err(NormalizationError::UnknownAbbreviation("utah jazz".to_string()))
        );
    }

    #[test]
    fn malformed_csv_is_rejected() {
        assert!(TeamAbbrTable::from_reader("name\nUtah Jazz\n".as_bytes()).is_err());
    }

    #[test]
    fn renamed_franchises_keep_their_conference() {
        let conferences = ConferenceTable::default();
        assert_eq!(conferences.conference("Seattle SuperSonics"), Ok('W'));
        assert_eq!(conferences.conference("Oklahoma City Thunder"), Ok('W'));
        assert_eq!(conferences.conference("New Jersey Nets"), Ok('E'));
        assert!(conferences.conference("Kansas City Kings").is_err());
    }

    #[test]
    fn season_labels_must_match_exactly() {
        assert!(SeasonLabel::parse("2003-04").is_ok());
        for bad in ["2003-2004", "03-04", "2003/04", " 2003-04", "2003-04 "] {
            assert_eq!(
                SeasonLabel::parse(bad),
                Err(NormalizationError::SeasonLabel(bad.to_string()))
            );
        }
    }

    #[test]
    fn playoff_cutoff_is_inclusive() {
        let playoffs = PlayoffCutoffTable::default();
        let season = SeasonLabel::parse("2003-04").unwrap();
        assert_eq!(playoffs.is_playoff(&season, date(2004, 4, 16)), Ok(false));
        assert_eq!(playoffs.is_playoff(&season, date(2004, 4, 17)), Ok(true));
        assert_eq!(playoffs.is_playoff(&season, date(2004, 6, 15)), Ok(true));

        let unknown = SeasonLabel::parse("1995-96").unwrap();
        assert_eq!(
            playoffs.is_playoff(&unknown, date(1996, 5, 1)),
            Err(NormalizationError::UnknownSeason("1995-96".to_string()))
        );
    }
}
