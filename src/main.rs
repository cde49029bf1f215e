use std::path::Path;

use anyhow::Context;
use courtside::{Crawler, Product, RequestClient, ScrapingContext, sink};
use dotenv::dotenv;
use log::{LevelFilter, error, info};
use tokio::sync::mpsc;

extern crate env_logger;
extern crate log;

async fn run_product_crawl_job(
    crawler: &Crawler<RequestClient>,
    product: Product,
    output_dir: &Path,
) -> anyhow::Result<()> {
    let (tx, rx) = mpsc::channel(sink::SINK_CAPACITY);
    let csv_path = output_dir.join(format!("{product}.csv"));
    let writer = tokio::spawn(async move { sink::write_csv_file(rx, &csv_path).await });

    let crawl = crawler.run(product, tx).await;
    let (report, written) = sink::join_writer(crawl, writer).await?;
    report.log_summary();
    if written != report.records {
        error!(
            "{product}: crawl produced {} records but {written} were written",
            report.records
        );
    }

    let report_path = output_dir.join(format!("{product}-report.json"));
    sink::write_report(&report, &report_path)?;
    info!("{product}: report at {}", report_path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let context = ScrapingContext::new()?;
    let output_dir = context.scraping_config.output_dir.clone();
    let products = context.scraping_config.products.clone();
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let crawler = context.crawler();
    let seasons = &crawler.config().seasons;
    info!(
        "crawling seasons {}..{} for {:?}",
        seasons.start, seasons.end, products
    );

    for product in products {
        if let Err(e) = run_product_crawl_job(&crawler, product, &output_dir).await {
            error!("{product} crawl aborted: {e:#}");
        }
    }
    Ok(())
}
