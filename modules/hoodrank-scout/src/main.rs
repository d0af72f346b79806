use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hoodrank_common::{dedup_records, write_rows, Config, OutputFormat};
use hoodrank_scout::{build_backend, BackendKind, ExtractionPipeline, ScrapeSummary};

#[derive(Parser)]
#[command(name = "scout", about = "Scrape restaurant records from the looks map")]
struct Args {
    /// How to load the page.
    #[arg(long, value_enum, default_value_t = BackendKind::Http)]
    backend: BackendKind,

    /// Target URL (overrides SCRAPER_URL).
    #[arg(long)]
    url: Option<String>,

    /// Output file. Defaults to restaurant_data.json under DATA_OUTPUT_DIR.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Run the browser without a window.
    #[arg(long, conflicts_with = "headed")]
    headless: bool,

    /// Show the browser window.
    #[arg(long)]
    headed: bool,

    /// Page load timeout in seconds (overrides SCRAPER_TIMEOUT).
    #[arg(long)]
    timeout: Option<u64>,

    /// Drop case-insensitive duplicate names before writing.
    #[arg(long)]
    deduplicate: bool,

    /// Exit non-zero when only the placeholder dataset was produced.
    #[arg(long)]
    strict: bool,

    #[arg(short, long)]
    verbose: bool,

    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = match (args.verbose, args.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("hoodrank={level}").parse()?)
                .add_directive(format!("browserless_client={level}").parse()?),
        )
        .init();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(url) = args.url {
        config.target_url = url;
    }
    if let Some(timeout) = args.timeout {
        config.scraper_timeout_secs = timeout;
    }
    if args.headless {
        config.scraper_headless = true;
    }
    if args.headed {
        config.scraper_headless = false;
    }
    config.log_keys();

    let backend = build_backend(args.backend, &config)?;
    let pipeline = ExtractionPipeline::default();

    info!(backend = backend.name(), "Scout starting");
    let extraction = backend
        .scrape(&pipeline)
        .await
        .with_context(|| format!("Scrape of {} failed", config.target_url))?;

    if extraction.used_fallback() {
        warn!("No live data found, output contains placeholder records");
        if args.strict {
            anyhow::bail!("No restaurant data found on {}", config.target_url);
        }
    }

    let mut records = extraction.records;
    if args.deduplicate {
        let before = records.len();
        records = dedup_records(records);
        info!(removed = before - records.len(), "Deduplicated records");
    }

    let output = args
        .output
        .unwrap_or_else(|| config.data_output_dir.join("restaurant_data.json"));
    write_rows(&output, args.format, &records)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(
        strategy = %extraction.strategy,
        records = records.len(),
        path = %output.display(),
        "Scout complete"
    );
    if !args.quiet {
        println!("{}", ScrapeSummary::from_records(&records));
    }

    Ok(())
}
