//! Demo application: concurrent increments on sharded counters.
//!
//! Run with:
//! ```bash
//! RUST_LOG=contatori_store=debug cargo run --example demo --features demo -- --help
//! ```

use clap::{Parser, ValueEnum};
use contatori_store::cache::MemoryCache;
use contatori_store::counters::{ShardedCounter, ShardedCounterConfig};
use contatori_store::observers::json::JsonObserver;
use contatori_store::observers::table::{TableObserver, TableStyle};
use contatori_store::observers::Result;
use contatori_store::snapshot::MetricsSnapshot;
use contatori_store::store::MemoryStore;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

const COUNTERS: [&str; 3] = ["page_views", "signups", "api_calls"];

/// Output format for counter totals.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Pretty ASCII table
    Table,
    /// Compact table with multiple columns
    Compact,
    /// JSON format
    Json,
}

/// Table style selection.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum StyleChoice {
    Ascii,
    #[default]
    Rounded,
    Sharp,
    Modern,
    Markdown,
}

impl From<StyleChoice> for TableStyle {
    fn from(choice: StyleChoice) -> Self {
        match choice {
            StyleChoice::Ascii => TableStyle::Ascii,
            StyleChoice::Rounded => TableStyle::Rounded,
            StyleChoice::Sharp => TableStyle::Sharp,
            StyleChoice::Modern => TableStyle::Modern,
            StyleChoice::Markdown => TableStyle::Markdown,
        }
    }
}

/// Demo application for contatori-store - sharded counters in a store.
///
/// Spawns threads that increment a few counters, optionally grows the shard
/// count of the hottest one, then prints the totals.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Table style (for table/compact formats)
    #[arg(short, long, value_enum, default_value = "rounded")]
    style: StyleChoice,

    /// Number of incrementing threads
    #[arg(short, long, default_value = "8")]
    threads: usize,

    /// Number of increments per thread
    #[arg(short, long, default_value = "1000")]
    iterations: usize,

    /// Shards given to new counters
    #[arg(long, default_value = "20")]
    shards: usize,

    /// Raise the shard count of `page_views` to N before the run
    #[arg(long)]
    grow: Option<usize>,

    /// Seed for shard selection
    #[arg(long)]
    seed: Option<u64>,

    /// Cache lifetime in milliseconds
    #[arg(long, default_value = "60000")]
    cache_ttl_ms: u64,

    /// Pretty print JSON output
    #[arg(long)]
    pretty: bool,

    /// Show the per-shard breakdown of `page_views`
    #[arg(long)]
    breakdown: bool,
}

/// Increments every counter from `threads` threads.
///
/// Returns the number of increments that failed.
fn simulate_traffic(counter: &Arc<ShardedCounter>, threads: usize, iterations: usize) -> usize {
    let mut handles = vec![];

    for i in 0..threads {
        let counter = Arc::clone(counter);
        handles.push(thread::spawn(move || {
            let mut failed = 0usize;
            let mut bump = |name: &str| {
                if let Err(err) = counter.increment(name) {
                    tracing::warn!(counter = name, %err, "increment failed");
                    failed += 1;
                }
            };
            for j in 0..iterations {
                bump("page_views");
                if (i * iterations + j) % 10 == 0 {
                    bump("api_calls");
                }
                if (i * iterations + j) % 100 == 0 {
                    bump("signups");
                }
            }
            failed
        }));
    }

    handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .sum()
}

fn render(args: &Args, snapshot: &MetricsSnapshot) -> Result<String> {
    let output = match args.format {
        OutputFormat::Table => TableObserver::new()
            .with_style(args.style.into())
            .render(snapshot),
        OutputFormat::Compact => TableObserver::new()
            .compact(true)
            .columns(COUNTERS.len())
            .with_style(args.style.into())
            .render(snapshot),
        OutputFormat::Json => JsonObserver::new()
            .pretty(args.pretty)
            .wrap_in_snapshot(true)
            .include_timestamp(true)
            .to_json(snapshot)?,
    };
    Ok(output)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = ShardedCounterConfig::new()
        .with_default_shards(args.shards)
        .with_cache_ttl(Duration::from_millis(args.cache_ttl_ms));
    let mut counter = ShardedCounter::with_config(MemoryStore::new(), MemoryCache::new(), config);
    if let Some(seed) = args.seed {
        counter = counter.with_seed(seed);
    }
    let counter = Arc::new(counter);

    if let Some(shards) = args.grow {
        counter.increase_shards("page_views", shards)?;
    }

    eprintln!(
        "Simulating {} threads x {} iterations...",
        args.threads, args.iterations
    );
    let start = Instant::now();
    let failed = simulate_traffic(&counter, args.threads, args.iterations);
    eprintln!("Simulation complete in {:?}.", start.elapsed());
    if failed > 0 {
        eprintln!("{} increments failed and are missing from the totals.", failed);
    }
    eprintln!();

    let snapshot = MetricsSnapshot::collect(&*counter, COUNTERS)?;
    println!("{}", render(&args, &snapshot)?);

    if args.breakdown {
        for shard in counter.shards("page_views")? {
            println!("page_views[{:>3}] {}", shard.index, shard.count);
        }
    }

    Ok(())
}
