//! CLI entry point for the registration insights tool.
//!
//! Provides subcommands for analyzing a registration CSV, exporting the
//! growth table and writing a plain-text investor report.

use anyhow::{Result, anyhow};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use registration_insights::{
    analyzers::types::{Dimension, Granularity},
    config::CategoryAliases,
    filter::RecordFilter,
    loader::load_rows,
    normalize::{Normalizer, rejection_breakdown},
    output::{
        export_growth, print_pretty, render_coverage, render_growth_table, render_summary,
        to_json,
    },
    pipeline::{Dataset, Query, run},
    report::InsightReport,
};
use std::ffi::OsStr;
use std::num::NonZeroUsize;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "registration-insights")]
#[command(about = "Growth and market-share analytics over vehicle registrations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Filter parameters shared by every subcommand.
#[derive(Args, Debug)]
struct FilterArgs {
    /// Earliest date to include (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Latest date to include (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Restrict to a vehicle category (repeatable, e.g. 2W, "Four Wheeler")
    #[arg(long = "category")]
    categories: Vec<String>,

    /// Restrict to a manufacturer (repeatable)
    #[arg(long = "manufacturer")]
    manufacturers: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print growth metrics and KPIs for a registration CSV
    Analyze {
        /// CSV file with date, category, manufacturer, registrations[, region] columns
        #[arg(short, long)]
        input: String,

        #[command(flatten)]
        filter: FilterArgs,

        /// Time bucket width
        #[arg(short, long, value_enum, default_value = "quarter")]
        granularity: Granularity,

        /// Grouping dimension (repeatable; order defines the key)
        #[arg(short, long = "dimension", value_enum, default_value = "category")]
        dimensions: Vec<Dimension>,

        /// Manufacturers counted towards market concentration
        #[arg(short = 'n', long, default_value = "5")]
        top_n: NonZeroUsize,

        /// Emit JSON instead of text tables
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write the growth table to a CSV file
    Export {
        #[arg(short, long)]
        input: String,

        /// CSV file to write
        #[arg(short, long, default_value = "growth.csv")]
        output: String,

        #[command(flatten)]
        filter: FilterArgs,

        #[arg(short, long, value_enum, default_value = "quarter")]
        granularity: Granularity,

        #[arg(short, long = "dimension", value_enum, default_value = "category")]
        dimensions: Vec<Dimension>,

        /// Gzip compress the CSV (writes <output>.gz)
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
    /// Write a plain-text insights report
    Report {
        #[arg(short, long)]
        input: String,

        /// Text file to write
        #[arg(short, long, default_value = "vehicle_insights_report.txt")]
        output: String,

        #[command(flatten)]
        filter: FilterArgs,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/registration_insights.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("registration_insights.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let aliases = load_aliases()?;

    match cli.command {
        Commands::Analyze {
            input,
            filter,
            granularity,
            dimensions,
            top_n,
            json,
        } => {
            let dataset = load_dataset(&input, &aliases)?;
            let query = Query::new(granularity, dimensions)
                .with_filter(build_filter(filter, &aliases)?)
                .with_top_n(top_n);
            let analysis = run(&dataset, &query)?;
            print_pretty(&analysis);

            if json {
                println!("{}", to_json(&analysis)?);
            } else {
                print!("{}", render_growth_table(&analysis.growth));
                println!();
                print!("{}", render_summary(&analysis.summary));
                println!();
                print!("{}", render_coverage(&analysis.coverage));
            }
        }
        Commands::Export {
            input,
            output,
            filter,
            granularity,
            dimensions,
            gzip,
        } => {
            let dataset = load_dataset(&input, &aliases)?;
            let query = Query::new(granularity, dimensions)
                .with_filter(build_filter(filter, &aliases)?);
            let analysis = run(&dataset, &query)?;

            export_growth(&output, &analysis.growth, gzip)?;
        }
        Commands::Report {
            input,
            output,
            filter,
        } => {
            let dataset = load_dataset(&input, &aliases)?;
            let filter = build_filter(filter, &aliases)?;
            let report = InsightReport::build(&dataset, &filter, Utc::now())?;

            std::fs::write(&output, report.render())?;
            info!(path = %output, "Report exported");
        }
    }

    Ok(())
}

/// Built-in category aliases, extended from `CATEGORY_ALIASES_PATH` when set.
fn load_aliases() -> Result<CategoryAliases> {
    match std::env::var("CATEGORY_ALIASES_PATH") {
        Ok(path) => {
            let aliases = CategoryAliases::load(&path)?;
            info!(path = %path, aliases = aliases.len(), "Category aliases loaded");
            Ok(aliases)
        }
        Err(_) => Ok(CategoryAliases::default()),
    }
}

/// Loads and normalizes the CSV at `input`, reporting rejected rows.
#[tracing::instrument(skip(aliases))]
fn load_dataset(input: &str, aliases: &CategoryAliases) -> Result<Dataset> {
    let rows = load_rows(input)?;
    let dataset = Dataset::from_rows(1, &rows, &Normalizer::new(aliases.clone()));

    if !dataset.rejected.is_empty() {
        for (reason, count) in rejection_breakdown(&dataset.rejected) {
            warn!(reason, count, "Rows rejected");
        }
    }
    info!(
        rows = rows.len(),
        accepted = dataset.records.len(),
        rejected = dataset.rejected.len(),
        "Dataset loaded"
    );

    Ok(dataset)
}

fn build_filter(args: FilterArgs, aliases: &CategoryAliases) -> Result<RecordFilter> {
    let categories = args
        .categories
        .iter()
        .map(|c| {
            aliases
                .resolve(c)
                .ok_or_else(|| anyhow!("unknown vehicle category `{}`", c))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(RecordFilter::default()
        .between(args.from, args.to)
        .with_categories(categories)
        .with_manufacturers(&args.manufacturers))
}
