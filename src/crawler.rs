//! The three-level crawl: season index, month page, detail page.
//!
//! Pages are visited one level at a time. Within a level up to
//! `concurrency` fetches are in flight, and results are consumed in the
//! order the links were discovered, so records reach the sink in page
//! order. A page that fails is recorded in the [`CrawlReport`] and its
//! subtree is skipped; its siblings carry on.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use scraper::Html;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::{
    arena_scraper::scrape_arena,
    config::CrawlConfig,
    error::{CrawlError, ErrorKind},
    home_venue_scraper::scrape_home_venue,
    link_scraper::{box_score_links, month_links, team_links},
    normalize::{normalize_arena, normalize_home_venue, normalize_performance, normalize_schedule},
    performance_scraper::scrape_performance,
    records::{PageLevel, PageRef, Product, Record},
    reference::ReferenceTables,
    requests::Fetch,
    schedule_scraper::scrape_schedule,
};

/// What one page contributed: links to descend into, finished records, and
/// soft problems worth reporting.
#[derive(Debug, Default, PartialEq)]
pub struct PageOutcome {
    pub links: Vec<PageRef>,
    pub records: Vec<Record>,
    pub warnings: Vec<String>,
}

impl PageOutcome {
    fn links(page: &PageRef, urls: Vec<String>, level: PageLevel) -> Self {
        Self {
            links: urls.into_iter().map(|url| page.child(url, level)).collect(),
            ..Default::default()
        }
    }

    fn records(records: impl IntoIterator<Item = Record>) -> Self {
        Self {
            records: records.into_iter().collect(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageFailure {
    pub url: String,
    pub level: &'static str,
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageWarning {
    pub url: String,
    pub message: String,
}

/// Final tally of a crawl.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub product: Product,
    pub pages_ok: usize,
    pub records: usize,
    pub failures: Vec<PageFailure>,
    pub warnings: Vec<PageWarning>,
}

impl CrawlReport {
    fn new(product: Product) -> Self {
        Self {
            product,
            pages_ok: 0,
            records: 0,
            failures: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn failures_by_kind(&self) -> HashMap<ErrorKind, usize> {
        let mut tally = HashMap::new();
        for failure in &self.failures {
            *tally.entry(failure.kind).or_insert(0) += 1;
        }
        tally
    }

    pub fn log_summary(&self) {
        info!(
            "{}: {} pages ok, {} failed, {} warnings, {} records",
            self.product,
            self.pages_ok,
            self.failures.len(),
            self.warnings.len(),
            self.records
        );
        for (kind, count) in self.failures_by_kind() {
            info!("{}: {count} {kind:?} failures", self.product);
        }
    }
}

pub struct Crawler<F> {
    fetcher: F,
    config: CrawlConfig,
    tables: Arc<ReferenceTables>,
}

impl<F: Fetch> Crawler<F> {
    pub fn new(fetcher: F, config: CrawlConfig, tables: Arc<ReferenceTables>) -> Self {
        Self {
            fetcher,
            config,
            tables,
        }
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Crawls every page reachable from the configured seasons and sends
    /// the product's records to `sink`. Only a closed sink stops the crawl
    /// early.
    pub async fn run(
        &self,
        product: Product,
        sink: mpsc::Sender<Record>,
    ) -> Result<CrawlReport, CrawlError> {
        let mut report = CrawlReport::new(product);
        let mut seen = HashSet::new();
        let mut frontier: Vec<PageRef> = self
            .config
            .seeds(product)
            .into_iter()
            .filter(|seed| seen.insert(seed.url.clone()))
            .collect();

        while let Some(level) = frontier.first().map(|page| page.level) {
            info!(
                "{product}: visiting {} {} pages",
                frontier.len(),
                level.name()
            );
            let mut next = Vec::new();
            let mut visits = stream::iter(&frontier)
                .map(|page| async move { (page, self.visit(product, page).await) })
                .buffered(self.config.concurrency.max(1));

            while let Some((page, result)) = visits.next().await {
                let outcome = match result {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        warn!("{} failed ({:?}): {err}", page.url, err.kind());
                        report.failures.push(PageFailure {
                            url: page.url.clone(),
                            level: page.level.name(),
                            kind: err.kind(),
                            message: err.to_string(),
                        });
                        continue;
                    }
                };

                report.pages_ok += 1;
                for message in outcome.warnings {
                    warn!("{}: {message}", page.url);
                    report.warnings.push(PageWarning {
                        url: page.url.clone(),
                        message,
                    });
                }
                for link in outcome.links {
                    if seen.insert(link.url.clone()) {
                        next.push(link);
                    } else {
                        debug!("{}: duplicate link {}", page.url, link.url);
                    }
                }
                for record in outcome.records {
                    sink.send(record)
                        .await
                        .map_err(|_| CrawlError::SinkClosed)?;
                    report.records += 1;
                }
            }

            drop(visits);
            frontier = next;
        }

        Ok(report)
    }

    async fn visit(&self, product: Product, page: &PageRef) -> Result<PageOutcome, CrawlError> {
        let body = self.fetcher.fetch(&page.url).await?;
        self.process_page(product, page, &body)
    }

    /// Routes a fetched page to the extractor for its level and product.
    pub fn process_page(
        &self,
        product: Product,
        page: &PageRef,
        body: &str,
    ) -> Result<PageOutcome, CrawlError> {
        if body.trim().is_empty() {
            return Err(CrawlError::Parse {
                url: page.url.clone(),
                reason: "empty body".to_string(),
            });
        }
        let document = Html::parse_document(body);

        let outcome = match (page.level, product) {
            (PageLevel::Index, Product::HomeVenue) => PageOutcome::links(
                page,
                team_links(&document, &page.url)?,
                PageLevel::Detail,
            ),
            (PageLevel::Index, _) => PageOutcome::links(
                page,
                month_links(&document, &page.url)?,
                PageLevel::Month,
            ),
            (PageLevel::Month, Product::Schedule) => {
                let batch = scrape_schedule(&document, page)?;
                let total = batch.rows.len();
                let records = normalize_schedule(&batch.season, batch.rows, &self.tables)?;
                debug!(
                    "{}: {} of {total} games played",
                    page.url,
                    records.len()
                );
                PageOutcome::records(records.into_iter().map(Record::Schedule))
            }
            (PageLevel::Month, _) => PageOutcome::links(
                page,
                box_score_links(&document, &page.url)?,
                PageLevel::Detail,
            ),
            (PageLevel::Detail, Product::Arena) => {
                let raw = scrape_arena(&document)?;
                let missing_arena = raw.arena.is_none();
                let mut outcome =
                    PageOutcome::records([Record::Arena(normalize_arena(raw)?)]);
                if missing_arena {
                    outcome.warnings.push("no arena info".to_string());
                }
                outcome
            }
            (PageLevel::Detail, Product::Performance) => {
                let raw = scrape_performance(&document, &self.tables.conferences)?;
                PageOutcome::records(normalize_performance(raw)?.map(Record::Performance))
            }
            (PageLevel::Detail, Product::HomeVenue) => {
                let raw = scrape_home_venue(&document)?;
                PageOutcome::records([Record::HomeVenue(normalize_home_venue(raw))])
            }
            (PageLevel::Detail, Product::Schedule) => {
                return Err(CrawlError::UnexpectedPage {
                    product: product.name(),
                    level: page.level.name(),
                });
            }
        };

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::{
        performance_scraper::tests::box_score,
        records::{ArenaRecord, SeasonRef},
        reference::TeamAbbrTable,
        schedule_scraper::tests::{schedule_page, schedule_row},
    };

    const SITE: &str = "https://site.test";

    /// Serves canned pages; anything else is a 404.
    struct StaticFetcher {
        pages: HashMap<String, String>,
    }

    impl StaticFetcher {
        fn new(pages: &[(&str, String)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(path, body)| (format!("{SITE}{path}"), body.clone()))
                    .collect(),
            }
        }
    }

    impl Fetch for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<String, CrawlError> {
            self.pages.get(url).cloned().ok_or_else(|| CrawlError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    /// Canned pages with a per-URL delay; tracks how many fetches overlap.
    struct SlowFetcher {
        pages: StaticFetcher,
        delays: HashMap<String, Duration>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl Fetch for SlowFetcher {
        async fn fetch(&self, url: &str) -> Result<String, CrawlError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            if let Some(delay) = self.delays.get(url) {
                tokio::time::sleep(*delay).await;
            }
            let body = self.pages.fetch(url).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            body
        }
    }

    fn config(seasons: std::ops::Range<i32>) -> CrawlConfig {
        CrawlConfig::new(
            &format!("{SITE}/leagues/NBA_{{year}}_games.html"),
            &format!("{SITE}/leagues/NBA_{{year}}.html"),
            seasons,
        )
        .with_concurrency(3)
    }

    fn tables() -> Arc<ReferenceTables> {
        Arc::new(ReferenceTables::new(TeamAbbrTable::bundled().unwrap()))
    }

    fn crawler(pages: &[(&str, String)], seasons: std::ops::Range<i32>) -> Crawler<StaticFetcher> {
        Crawler::new(StaticFetcher::new(pages), config(seasons), tables())
    }

    fn index(months: &[&str]) -> String {
        let links: String = months
            .iter()
            .map(|m| format!(r#"<div><a href="/leagues/NBA_2002_games-{m}.html">{m}</a></div>"#))
            .collect();
        format!(r#"<html><body><div class="filter">{links}</div></body></html>"#)
    }

    fn month(boxes: &[&str]) -> String {
        let rows: String = boxes
            .iter()
            .map(|b| {
                format!(
                    r#"<tr><td data-stat="box_score_text"><a href="/boxscores/{b}.html">Box Score</a></td></tr>"#
                )
            })
            .collect();
        format!(r#"<html><body><table id="schedule"><tbody>{rows}</tbody></table></body></html>"#)
    }

    async fn collect<F: Fetch>(
        crawler: &Crawler<F>,
        product: Product,
    ) -> (CrawlReport, Vec<Record>) {
        let (tx, mut rx) = mpsc::channel(4);
        let collector = tokio::spawn(async move {
            let mut records = Vec::new();
            while let Some(record) = rx.recv().await {
                records.push(record);
            }
            records
        });
        let report = crawler.run(product, tx).await.unwrap();
        (report, collector.await.unwrap())
    }

    #[tokio::test]
    async fn arena_crawl_descends_two_levels() {
        let crawler = crawler(
            &[
                ("/leagues/NBA_2002_games.html", index(&["november"])),
                ("/leagues/NBA_2002_games-november.html", month(&["200111030SAC"])),
                (
                    "/boxscores/200111030SAC.html",
                    box_score("Los Angeles Lakers", "Sacramento Kings"),
                ),
            ],
            2002..2003,
        );
        let (report, records) = collect(&crawler, Product::Arena).await;
        assert_eq!(
            records,
            vec![Record::Arena(ArenaRecord {
                date: "2001-11-03".to_string(),
                time: "7:30pm".to_string(),
                road_team: "Los Angeles Lakers".to_string(),
                home_team: "Sacramento Kings".to_string(),
                arena: "Arco Arena".to_string(),
            })]
        );
        assert_eq!(report.pages_ok, 3);
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn failed_pages_do_not_stop_their_siblings() {
        let crawler = crawler(
            &[
                (
                    "/leagues/NBA_2002_games.html",
                    index(&["october", "november", "december"]),
                ),
                ("/leagues/NBA_2002_games-october.html", month(&["a", "b"])),
                ("/leagues/NBA_2002_games-december.html", String::new()),
                ("/boxscores/a.html", box_score("Los Angeles Lakers", "Sacramento Kings")),
                ("/boxscores/b.html", box_score("Los Angeles Lakers", "Kansas City Kings")),
            ],
            2002..2004,
        );
        let (report, records) = collect(&crawler, Product::Performance).await;

        // Box score a gives two records; b names an unknown team.
        assert_eq!(records.len(), 2);
        assert_eq!(report.records, 2);
        assert_eq!(report.pages_ok, 3);

        let failed: Vec<_> = report
            .failures
            .iter()
            .map(|f| (f.url.trim_start_matches(SITE), f.kind))
            .collect();
        assert_eq!(
            failed,
            vec![
                ("/leagues/NBA_2003_games.html", ErrorKind::Fetch),
                ("/leagues/NBA_2002_games-november.html", ErrorKind::Fetch),
                ("/leagues/NBA_2002_games-december.html", ErrorKind::Parse),
                ("/boxscores/b.html", ErrorKind::Normalization),
            ]
        );
        assert_eq!(report.failures_by_kind()[&ErrorKind::Fetch], 2);
    }

    #[tokio::test]
    async fn slow_pages_keep_link_order_within_the_concurrency_limit() {
        let boxes: Vec<String> = (0..10).map(|i| format!("g{i}")).collect();
        let box_refs: Vec<&str> = boxes.iter().map(String::as_str).collect();
        let mut pages = vec![
            ("/leagues/NBA_2002_games.html".to_string(), index(&["november"])),
            ("/leagues/NBA_2002_games-november.html".to_string(), month(&box_refs)),
        ];
        let mut delays = HashMap::new();
        for (i, name) in boxes.iter().enumerate() {
            let path = format!("/boxscores/{name}.html");
            // Earlier games answer last.
            delays.insert(format!("{SITE}{path}"), Duration::from_millis(5 * (10 - i as u64)));
            pages.push((path, box_score("Los Angeles Lakers", &format!("A{i}"))));
        }
        let pages: Vec<(&str, String)> = pages
            .iter()
            .map(|(path, body)| (path.as_str(), body.clone()))
            .collect();
        let fetcher = SlowFetcher {
            pages: StaticFetcher::new(&pages),
            delays,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        };
        let crawler = Crawler::new(fetcher, config(2002..2003), tables());

        let (report, records) = collect(&crawler, Product::Arena).await;
        assert!(report.failures.is_empty());
        let home_teams: Vec<_> = records
            .iter()
            .map(|record| match record {
                Record::Arena(r) => r.home_team.clone(),
                other => panic!("unexpected record {other:?}"),
            })
            .collect();
        let expected: Vec<_> = (0..10).map(|i| format!("A{i}")).collect();
        assert_eq!(home_teams, expected);

        let peak = crawler.fetcher.peak.load(Ordering::SeqCst);
        assert!(peak <= crawler.config().concurrency, "peak {peak}");
        assert!(peak > 1, "fetches never overlapped");
    }

    #[tokio::test]
    async fn duplicate_links_are_visited_once() {
        let crawler = crawler(
            &[
                ("/leagues/NBA_2002_games.html", index(&["november", "november"])),
                (
                    "/leagues/NBA_2002_games-november.html",
                    month(&["200111030SAC", "200111030SAC"]),
                ),
                (
                    "/boxscores/200111030SAC.html",
                    box_score("Los Angeles Lakers", "Sacramento Kings"),
                ),
            ],
            2002..2003,
        );
        let (report, records) = collect(&crawler, Product::Arena).await;
        assert_eq!(records.len(), 1);
        assert_eq!(report.pages_ok, 3);
    }

    #[tokio::test]
    async fn missing_venue_is_a_warning_not_a_failure() {
        let page = box_score("Los Angeles Lakers", "Sacramento Kings")
            .replace("<div>Arco Arena</div>", "");
        let crawler = crawler(
            &[
                ("/leagues/NBA_2002_games.html", index(&["november"])),
                ("/leagues/NBA_2002_games-november.html", month(&["x"])),
                ("/boxscores/x.html", page),
            ],
            2002..2003,
        );
        let (report, records) = collect(&crawler, Product::Arena).await;
        assert!(report.failures.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].url, format!("{SITE}/boxscores/x.html"));
        match &records[..] {
            [Record::Arena(record)] => assert_eq!(record.arena, ""),
            other => panic!("unexpected records: {other:?}"),
        }
    }

    #[tokio::test]
    async fn schedule_stops_at_the_month_page() {
        let rows = [
            schedule_row("Tue, Apr 13, 2004", "Utah Jazz", "97", "Denver Nuggets", "102", "19,812"),
            schedule_row("Wed, Apr 14, 2004", "Utah Jazz", "", "Denver Nuggets", "", ""),
            schedule_row("Sat, Apr 17, 2004", "Memphis Grizzlies", "74", "San Antonio Spurs", "98", "18,118"),
        ];
        let crawler = crawler(
            &[
                ("/leagues/NBA_2002_games.html", index(&["april"])),
                (
                    "/leagues/NBA_2002_games-april.html",
                    schedule_page(Some("2003-04"), &rows),
                ),
            ],
            2002..2003,
        );
        let (report, records) = collect(&crawler, Product::Schedule).await;
        assert_eq!(report.pages_ok, 2);
        let summary: Vec<_> = records
            .iter()
            .map(|record| match record {
                Record::Schedule(r) => (r.date.as_str(), r.road_team_abbr.as_str(), r.playoff_gm),
                other => panic!("unexpected record {other:?}"),
            })
            .collect();
        assert_eq!(
            summary,
            vec![("2004-04-13", "UTA", false), ("2004-04-17", "MEM", true)]
        );
    }

    #[test]
    fn detail_pages_have_no_schedule_extractor() {
        let crawler = crawler(&[], 2002..2003);
        let page = PageRef::new(format!("{SITE}/boxscores/x.html"), PageLevel::Detail, SeasonRef::new(2002));
        let result = crawler.process_page(Product::Schedule, &page, "<html></html>");
        assert!(matches!(result, Err(CrawlError::UnexpectedPage { .. })));
    }

    #[test]
    fn index_pages_route_by_product() {
        let crawler = crawler(&[], 2002..2003);
        let page = PageRef::new(
            format!("{SITE}/leagues/NBA_2002.html"),
            PageLevel::Index,
            SeasonRef::new(2002),
        );
        let body = r#"<table><tr>
            <th data-stat="team_name"><a href="/teams/SAC/2002.html">Sacramento Kings</a></th>
        </tr></table>"#;
        let outcome = crawler.process_page(Product::HomeVenue, &page, body).unwrap();
        assert_eq!(
            outcome.links,
            vec![PageRef::new(
                format!("{SITE}/teams/SAC/2002.html"),
                PageLevel::Detail,
                SeasonRef::new(2002)
            )]
        );

        let outcome = crawler.process_page(Product::Arena, &page, body).unwrap();
        assert!(outcome.links.is_empty());
    }
}
