//! Sales analysis demo
//!
//! Usage: cargo run --bin sales_analysis -- [PATH]
//!        (defaults to data/sales_data.csv)

use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use queue_relay::logging::init_logging;
use queue_relay::{read_path, Money, SalesQuery};
use std::collections::HashMap;
use std::path::PathBuf;

const DEFAULT_PATH: &str = "data/sales_data.csv";
const TOP_N: usize = 5;

#[derive(Parser, Debug)]
#[command(name = "sales_analysis")]
#[command(about = "Summarise a CSV file of sales records")]
struct Args {
    /// CSV file to analyse
    #[arg(value_name = "PATH", default_value = DEFAULT_PATH)]
    path: PathBuf,

    /// Log level spec, e.g. "info" or "debug"
    #[arg(long = "log-level", default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _logger = init_logging(&args.log_level, None).context("could not start logging")?;

    println!("Sales Data Analysis");
    println!("===================\n");
    println!("Loading sales data from: {}", args.path.display());

    let summary = read_path(&args.path)
        .with_context(|| format!("error loading {}", args.path.display()))?;
    println!(
        "Loaded {} sales records ({} rows skipped)\n",
        summary.records.len(),
        summary.skipped
    );

    let query = SalesQuery::new(&summary.records);

    heading("1. TOTAL REVENUE");
    println!("Total Revenue: ${}\n", query.total_revenue());

    heading("2. REVENUE BY CATEGORY");
    for (category, revenue) in by_value_desc(query.revenue_by_category()) {
        println!("  {:<20}: ${:>10}", category, revenue);
    }
    println!();

    heading("3. SALES COUNT BY REGION");
    for (region, count) in by_value_desc(query.count_by_region()) {
        println!("  {:<20}: {} sales", region, count);
    }
    println!();

    heading(&format!("4. TOP {} PRODUCTS BY REVENUE", TOP_N));
    for (rank, (product, revenue)) in query.top_products(TOP_N).iter().enumerate() {
        println!("  {}. {:<30}: ${:>10}", rank + 1, product, revenue);
    }
    println!();

    heading(&format!("5. TOP {} SALES REPRESENTATIVES", TOP_N));
    for (rank, (rep, revenue)) in query.top_reps(TOP_N).iter().enumerate() {
        println!("  {}. {:<30}: ${:>10}", rank + 1, rep, revenue);
    }
    println!();

    heading("6. PRODUCT COUNT BY CATEGORY");
    for (category, count) in by_value_desc(query.count_by_category()) {
        println!("  {:<20}: {} products", category, count);
    }
    println!();

    let (start, end) = q1_2024()?;
    heading(&format!("7. SALES IN DATE RANGE ({} to {})", start, end));
    let in_range = query.in_date_range(start, end);
    let range_revenue: Money = in_range.iter().map(|r| r.total_value()).sum();
    println!("Number of Sales: {}", in_range.len());
    println!("Total Revenue: ${}\n", range_revenue);

    println!("Analysis Complete!");
    Ok(())
}

fn heading(title: &str) {
    println!("{}", title);
    println!("{}", "-".repeat(title.len()));
}

/// Entries sorted by value, largest first, then by key for stable output
fn by_value_desc<V: Ord + Copy>(map: HashMap<String, V>) -> Vec<(String, V)> {
    let mut entries: Vec<_> = map.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries
}

fn q1_2024() -> anyhow::Result<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).context("bad range start")?;
    let end = NaiveDate::from_ymd_opt(2024, 3, 31).context("bad range end")?;
    Ok((start, end))
}
