use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hoodrank_analysis::{aggregate, correlation_matrix, full_report, summarize, RankMetric, Ranking};
use hoodrank_common::{read_json, write_rows, Config, OutputFormat, Record};

#[derive(Parser)]
#[command(name = "analyze", about = "Rank Manhattan neighborhoods from scraped restaurant records")]
struct Args {
    /// Records written by `scout`. Defaults to restaurant_data.json under DATA_OUTPUT_DIR.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Where to write the neighborhood table. Defaults to
    /// neighborhood_analysis.json under DATA_OUTPUT_DIR.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// How many neighborhoods to list in the top ranking.
    #[arg(long, default_value_t = 10)]
    top: usize,

    #[arg(long, value_enum, default_value_t = RankMetric::AvgAttractive)]
    metric: RankMetric,

    /// Print the correlation matrix between metrics.
    #[arg(long)]
    correlation: bool,

    /// Print dataset-level summary statistics.
    #[arg(long)]
    summary: bool,

    #[arg(short, long)]
    verbose: bool,

    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match (args.verbose, args.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(format!("hoodrank={level}").parse()?))
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    let input = args
        .input
        .unwrap_or_else(|| config.data_output_dir.join("restaurant_data.json"));
    let output = args
        .output
        .unwrap_or_else(|| config.data_output_dir.join("neighborhood_analysis.json"));

    let records: Vec<Record> =
        read_json(&input).with_context(|| format!("Failed to load {}", input.display()))?;
    if records.is_empty() {
        anyhow::bail!("No restaurant data found in {}", input.display());
    }
    info!(records = records.len(), path = %input.display(), "Loaded restaurant records");

    let table = aggregate(&records);
    if table.is_empty() {
        anyhow::bail!("No Manhattan neighborhoods found in {} records", records.len());
    }

    if !args.quiet {
        println!("{}", full_report(&table));
        let title = format!("TOP {} NEIGHBORHOODS BY {}", args.top, args.metric.column().to_uppercase());
        println!("{}", Ranking::new(title, args.metric, table.top(args.metric, args.top)));

        if args.correlation {
            println!("=== CORRELATION MATRIX ===");
            println!("{}", correlation_matrix(table.stats()));
        }
        if args.summary {
            if let Some(summary) = summarize(&table) {
                println!("=== SUMMARY STATISTICS ===");
                println!("{summary}");
            }
        }
    }

    write_rows(&output, args.format, table.stats())
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!(neighborhoods = table.len(), path = %output.display(), "Analysis complete");

    Ok(())
}
