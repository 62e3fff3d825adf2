//! Producer/consumer demo
//!
//! Splits a numbered item list across producers, drains it with consumers,
//! then checks that every item arrived exactly once.
//!
//! Usage: cargo run --bin producer_consumer -- --capacity 5 --items 10

use anyhow::{bail, Context};
use clap::Parser;
use queue_relay::logging::init_logging;
use queue_relay::{SessionBuilder, Sink};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "producer_consumer")]
#[command(about = "Run producers and consumers over one bounded queue")]
struct Args {
    /// Queue capacity
    #[arg(short = 'c', long, default_value_t = 5)]
    capacity: usize,

    /// Total number of items to move
    #[arg(short = 'n', long, default_value_t = 10)]
    items: usize,

    /// Number of producer threads
    #[arg(short = 'p', long, default_value_t = 1)]
    producers: usize,

    /// Number of consumer threads
    #[arg(short = 'k', long, default_value_t = 1)]
    consumers: usize,

    /// Cancel any unit still running after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Log level spec, e.g. "info" or "debug"
    #[arg(long = "log-level", default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _logger = init_logging(&args.log_level, None).context("could not start logging")?;

    if args.producers == 0 || args.consumers == 0 {
        bail!("need at least one producer and one consumer");
    }

    println!("Producer-Consumer Demo");
    println!("======================");

    let items: Vec<String> = (1..=args.items).map(|i| format!("Item-{}", i)).collect();
    println!(
        "Moving {} items through a queue of capacity {} with {} producer(s) and {} consumer(s)\n",
        items.len(),
        args.capacity,
        args.producers,
        args.consumers
    );

    let mut builder = SessionBuilder::new(args.capacity);
    for p in 0..args.producers {
        let share: Vec<String> = items
            .iter()
            .skip(p)
            .step_by(args.producers)
            .cloned()
            .collect();
        builder = builder.add_producer(format!("Producer-{}", p + 1), share);
    }

    let mut sinks = Vec::new();
    for c in 0..args.consumers {
        let mut limit = items.len() / args.consumers;
        if c < items.len() % args.consumers {
            limit += 1;
        }
        let sink = Sink::new();
        sinks.push(sink.clone());
        builder = builder.add_consumer(format!("Consumer-{}", c + 1), sink, Some(limit));
    }

    let session = builder.build()?;
    let metrics = session.queue().metrics().clone();
    let running = session.start()?;
    let report = match args.timeout {
        Some(secs) => running.wait_timeout(Duration::from_secs(secs)),
        None => running.wait(),
    };

    println!("\nUnits");
    println!("-----");
    for unit in &report.units {
        match &unit.error {
            None => println!("  {:<12} {:<8} {:?}, {} items", unit.name, unit.role, unit.state, unit.items),
            Some(e) => println!("  {:<12} {:<8} {:?}, {} items ({})", unit.name, unit.role, unit.state, unit.items, e),
        }
    }

    println!("\nQueue: {}", metrics.snapshot().format());

    let check = report.verify();
    println!("\nValidation Results");
    println!("------------------");
    println!("Source items count:      {}", check.expected);
    println!("Destination items count: {}", check.actual);
    for (item, count) in &check.missing {
        println!("  Missing item: {} (x{})", item, count);
    }
    for (item, count) in &check.unexpected {
        println!("  Unexpected item: {} (x{})", item, count);
    }

    for (i, sink) in sinks.iter().enumerate() {
        println!("\nConsumer-{} received:", i + 1);
        for item in sink.snapshot() {
            println!("  - {}", item);
        }
    }

    if !check.is_ok() || !report.is_clean() {
        bail!("session did not deliver every item exactly once");
    }
    println!("\nAll items were successfully consumed");
    Ok(())
}
