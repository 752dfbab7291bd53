//! Basic usage example for the Scout library.
//!
//! Searches a local registry and prints every tag as it arrives, then the
//! sorted table.
//!
//! Run with: cargo run --example basic_usage -- http://localhost:5000

use libscout::{JobResult, OutputFormat, PoolConfig, SearchConfig, Searcher, Credentials};
use libscout::{collect_records, render, sort_records};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://localhost:5000".to_string());

    let config = SearchConfig::new(url, true, OutputFormat::Text);
    let pool = PoolConfig {
        workers: 4,
        rate_per_second: 20,
        ..PoolConfig::default()
    };
    let searcher = Searcher::new(config, pool)?;
    let mut handle = searcher.search_all(Credentials::Anonymous)?;

    let mut results = Vec::new();
    while let Some(result) = handle.recv().await {
        match &result {
            JobResult::Tag { image, tag } => println!("found {}:{}", image, tag.name),
            JobResult::Failed { image, error, .. } => {
                eprintln!("failed {}: {}", image.as_deref().unwrap_or("<catalog>"), error)
            }
            JobResult::Cancelled { .. } => {}
        }
        results.push(result);
    }

    let mut report = collect_records(results);
    sort_records(&mut report.images);
    println!();
    print!("{}", render(&report.images, OutputFormat::Text)?);

    Ok(())
}
