use serde::Serialize;
use thiserror::Error;

/// Coarse classification used when tallying failed pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Fetch,
    Parse,
    Extraction,
    Normalization,
    Sink,
}

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("request to {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("could not parse {url}: {reason}")]
    Parse { url: String, reason: String },

    #[error("invalid link {href:?} on {base}")]
    Link { base: String, href: String },

    #[error("invalid selector: {0}")]
    Selector(String),

    #[error("required field `{field}` is missing")]
    MissingField { field: &'static str },

    #[error("expected {expected} values for `{field}`, found {found}")]
    FieldCount {
        field: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("no extractor for a {level} page in the {product} crawl")]
    UnexpectedPage {
        product: &'static str,
        level: &'static str,
    },

    #[error(transparent)]
    Normalization(#[from] NormalizationError),

    #[error("record sink closed before the crawl finished")]
    SinkClosed,
}

impl CrawlError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CrawlError::Fetch { .. } | CrawlError::Status { .. } => ErrorKind::Fetch,
            CrawlError::Parse { .. } | CrawlError::Link { .. } => ErrorKind::Parse,
            CrawlError::Selector(_)
            | CrawlError::MissingField { .. }
            | CrawlError::FieldCount { .. }
            | CrawlError::UnexpectedPage { .. } => ErrorKind::Extraction,
            CrawlError::Normalization(_) => ErrorKind::Normalization,
            CrawlError::SinkClosed => ErrorKind::Sink,
        }
    }
}

/// Failures of the pure normalization layer. Always scoped to one page.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizationError {
    #[error("unparsable date/time: {0:?}")]
    DateTime(String),

    #[error("field `{field}` is not numeric: {value:?}")]
    Number { field: &'static str, value: String },

    #[error("no abbreviation for team {0:?}")]
    UnknownAbbreviation(String),

    #[error("no conference for team {0:?}")]
    UnknownConference(String),

    #[error("malformed season label {0:?}, expected YYYY-YY")]
    SeasonLabel(String),

    #[error("no playoff cutoff known for season {0}")]
    UnknownSeason(String),
}
