//! CLI entry point for the occupancy report tool.
//!
//! Provides subcommands for printing a statistics report with insights and
//! for exporting filtered data as JSON or CSV.

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use occupancy_report::analyzers::aggregate::aggregate;
use occupancy_report::analyzers::insights;
use occupancy_report::analyzers::summary::summarize;
use occupancy_report::analyzers::types::{OverallSummary, WeekdaySummary};
use occupancy_report::export;
use occupancy_report::fetch::{DataSource, FileSource, HttpSource};
use occupancy_report::filter;
use occupancy_report::loader::{LoaderConfig, RecordLoader};
use occupancy_report::model::{FilterPeriod, FilterSpec, Observation};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "occupancy_report")]
#[command(about = "Aggregates facility occupancy CSV data into weekday/hour reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print summary statistics and insights for a CSV snapshot
    Report {
        /// Path to file or URL to fetch; falls back to OCCUPANCY_DATA_URL
        #[arg(value_name = "FILE_OR_URL")]
        source: Option<String>,

        /// Reporting window
        #[arg(short, long, value_enum, default_value_t = PeriodArg::All)]
        period: PeriodArg,

        /// Start of a custom window (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<NaiveDate>,

        /// End of a custom window (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<NaiveDate>,

        /// Emit the full JSON bundle instead of the text summary
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Bypass the cache and re-fetch the CSV
        #[arg(long, default_value_t = false)]
        reload: bool,
    },
    /// Export filtered records and statistics to a file
    Export {
        /// Path to file or URL to fetch; falls back to OCCUPANCY_DATA_URL
        #[arg(value_name = "FILE_OR_URL")]
        source: Option<String>,

        /// Export format
        #[arg(short, long, value_enum, default_value_t = FormatArg::Json)]
        format: FormatArg,

        /// Output file path
        #[arg(short, long)]
        output: Option<String>,

        #[arg(short, long, value_enum, default_value_t = PeriodArg::All)]
        period: PeriodArg,

        #[arg(long)]
        start_date: Option<NaiveDate>,

        #[arg(long)]
        end_date: Option<NaiveDate>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PeriodArg {
    All,
    Week,
    TwoWeeks,
    Month,
    Custom,
}

impl From<PeriodArg> for FilterPeriod {
    fn from(arg: PeriodArg) -> Self {
        match arg {
            PeriodArg::All => FilterPeriod::All,
            PeriodArg::Week => FilterPeriod::Week,
            PeriodArg::TwoWeeks => FilterPeriod::TwoWeeks,
            PeriodArg::Month => FilterPeriod::Month,
            PeriodArg::Custom => FilterPeriod::Custom,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Json,
    Csv,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/occupancy_report.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("occupancy_report.log"));

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

    match cli.command {
        Commands::Report {
            source,
            period,
            start_date,
            end_date,
            json,
            reload,
        } => {
            let spec = build_spec(period, start_date, end_date)?;
            let (filtered, weekly, overall) = run_pipeline(source, &spec, reload).await?;
            let lines = insights::generate(&overall, &weekly);

            if json {
                let bundle = export::build_bundle(&filtered, &overall, &weekly);
                println!("{}", export::to_json(&bundle)?);
            } else {
                print_report(&overall, &lines);
            }
        }
        Commands::Export {
            source,
            format,
            output,
            period,
            start_date,
            end_date,
        } => {
            let spec = build_spec(period, start_date, end_date)?;
            let (filtered, weekly, overall) = run_pipeline(source, &spec, false).await?;

            let (content, default_name) = match format {
                FormatArg::Json => {
                    let bundle = export::build_bundle(&filtered, &overall, &weekly);
                    (export::to_json(&bundle)?, "occupancy-export.json")
                }
                FormatArg::Csv => (export::to_csv(&filtered)?, "occupancy-export.csv"),
            };

            let path = output.unwrap_or_else(|| default_name.to_string());
            std::fs::write(&path, content)?;
            info!(path = %path, records = filtered.len(), "Export written");
        }
    }

    Ok(())
}

/// Runs load → filter → aggregate → summarize and returns the results.
async fn run_pipeline(
    source: Option<String>,
    spec: &FilterSpec,
    reload: bool,
) -> Result<(Vec<Observation>, Vec<WeekdaySummary>, OverallSummary)> {
    let source = resolve_source(source)?;
    let loader = RecordLoader::new(make_source(&source), LoaderConfig::default());

    let records = loader.load(reload).await?;
    let filtered = filter::apply(&records, spec);
    let weekly = aggregate(&filtered);
    let overall = summarize(&weekly, &filtered);

    Ok((filtered, weekly, overall))
}

/// Builds and validates the filter spec; an invalid custom range is rejected
/// here, before any data is touched.
fn build_spec(
    period: PeriodArg,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<FilterSpec> {
    let spec = FilterSpec {
        period: period.into(),
        start_date,
        end_date,
    };

    if let Err(e) = spec.validate() {
        warn!(error = %e, "Invalid custom date range");
        return Err(e.into());
    }

    Ok(spec)
}

fn resolve_source(arg: Option<String>) -> Result<String> {
    if let Some(source) = arg {
        return Ok(source);
    }
    std::env::var("OCCUPANCY_DATA_URL").map_err(|_| {
        anyhow::anyhow!("no data source given: pass FILE_OR_URL or set OCCUPANCY_DATA_URL")
    })
}

/// Builds a source from a local file path or an HTTP URL.
fn make_source(source: &str) -> Box<dyn DataSource> {
    if source.starts_with("http") {
        Box::new(HttpSource::new(source))
    } else {
        Box::new(FileSource::new(source))
    }
}

fn print_report(overall: &OverallSummary, insights: &[String]) {
    println!("Occupancy report ({} records)", overall.total_entries);
    println!("  Average crowd level: {:.1}", overall.average_crowd_level);
    println!(
        "  Peak: {} around {:02}:00",
        overall.peak_weekday, overall.peak_hour
    );
    println!(
        "  Quiet: {} around {:02}:00",
        overall.quiet_weekday, overall.quiet_hour
    );
    println!(
        "  Crowd distribution: {}% empty / {}% moderate / {}% busy",
        overall.crowd_distribution.empty,
        overall.crowd_distribution.moderate,
        overall.crowd_distribution.busy
    );
    println!();
    println!("Insights:");
    for line in insights {
        println!("  - {line}");
    }
}
