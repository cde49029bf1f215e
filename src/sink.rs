//! Persists finished records. One CSV file per product; the column order is
//! the field order of the record structs.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use log::info;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::{crawler::CrawlReport, error::CrawlError, records::Record};

/// Records buffered between the crawl and the writer.
pub const SINK_CAPACITY: usize = 256;

/// Drains `rx` into CSV on `writer` until every sender is dropped.
/// Returns the number of rows written.
pub async fn write_csv<W: Write>(mut rx: mpsc::Receiver<Record>, writer: W) -> anyhow::Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut written = 0;
    while let Some(record) = rx.recv().await {
        let result = match &record {
            Record::Arena(r) => csv_writer.serialize(r),
            Record::HomeVenue(r) => csv_writer.serialize(r),
            Record::Performance(r) => csv_writer.serialize(r),
            Record::Schedule(r) => csv_writer.serialize(r),
        };
        result.with_context(|| format!("failed to write {} record", record.product()))?;
        written += 1;
    }
    csv_writer.flush()?;
    Ok(written)
}

pub async fn write_csv_file(rx: mpsc::Receiver<Record>, path: &Path) -> anyhow::Result<usize> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let written = write_csv(rx, file).await?;
    info!("wrote {written} rows to {}", path.display());
    Ok(written)
}

/// Waits for the writer task once the crawl has returned. When the crawl
/// stopped because the writer hung up, the writer's error is the one
/// reported.
pub async fn join_writer(
    crawl: Result<CrawlReport, CrawlError>,
    writer: JoinHandle<anyhow::Result<usize>>,
) -> anyhow::Result<(CrawlReport, usize)> {
    let report = match crawl {
        Ok(report) => report,
        Err(CrawlError::SinkClosed) => {
            writer.await.context("record writer panicked")??;
            anyhow::bail!("record writer stopped before the crawl finished");
        }
        Err(e) => {
            writer.abort();
            return Err(e.into());
        }
    };
    let written = writer.await.context("record writer panicked")??;
    Ok((report, written))
}

pub fn write_report(report: &CrawlReport, path: &Path) -> anyhow::Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, report)
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    Ok(())
}
