// Command-line front end for the funnel report.
//
// Loads one CSV export, applies the date/channel filter given on the command
// line, and prints or exports one of the dashboard views.
mod output;

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{debug, warn};

use funnel_report::reports::{self, DEFAULT_ROW_LIMIT};
use funnel_report::util::format_int;
use funnel_report::{
    logging, Dashboard, DashboardConfig, FetchOutcome, FilterState, Granularity, TrendMetric,
};

#[derive(Parser)]
#[command(name = "funnel-report")]
#[command(about = "Marketing funnel KPIs from a published spreadsheet export", long_about = None)]
struct Cli {
    /// CSV export of the tracking sheet
    #[arg(long)]
    csv: PathBuf,
    /// TOML file overriding aliases, formulas or thresholds
    #[arg(long)]
    config: Option<PathBuf>,
    /// First day to include (defaults to the earliest row)
    #[arg(long)]
    start: Option<NaiveDate>,
    /// Last day to include (defaults to the latest row)
    #[arg(long)]
    end: Option<NaiveDate>,
    #[arg(long, default_value = "All")]
    channel: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// KPI cards, funnel, benchmarks and focus list
    Summary {
        /// Also write the summary as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Trend series for one metric
    Series {
        #[arg(long, default_value = "ctr")]
        metric: TrendMetric,
        #[arg(long, default_value = "day")]
        granularity: Granularity,
    },
    /// Filtered rows, optionally searched
    Rows {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value_t = DEFAULT_ROW_LIMIT)]
        limit: usize,
    },
    /// Distinct channels in the dataset
    Channels,
    /// Write every view to CSV plus a JSON summary
    Export {
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        #[arg(long, default_value = "ctr")]
        metric: TrendMetric,
        #[arg(long, default_value = "day")]
        granularity: Granularity,
    },
}

fn build_filter(dashboard: &Dashboard, cli: &Cli) -> FilterState {
    let mut filter = dashboard.default_filter().with_channel(cli.channel.clone());
    if cli.start.is_some() {
        filter.start = cli.start;
    }
    if cli.end.is_some() {
        filter.end = cli.end;
    }
    if !dashboard.get_channels().contains(&filter.channel) {
        warn!(channel = %filter.channel, "channel not present in dataset");
    }
    filter
}

fn print_summary(dashboard: &Dashboard, filter: &FilterState) {
    let currency = &dashboard.config().currency_symbol;
    let summary = dashboard.summarize(filter);
    let thresholds = &dashboard.config().thresholds;

    println!("Filtered rows: {}\n", format_int(summary.row_count));
    let cards = reports::kpi_cards(&summary.totals, &summary.metrics, thresholds, currency);
    output::preview_table(Some("KPIs"), &cards);
    let funnel = reports::funnel_steps(&summary.totals, &summary.metrics);
    output::preview_table(Some("Funnel"), &funnel);
    let benchmarks = reports::benchmark_rows(&summary.classified, currency);
    output::preview_table(Some("Benchmarks"), &benchmarks);
    for line in reports::focus_lines(&summary.focus, currency) {
        println!("{}", line);
    }
    println!();
}

fn export_all(
    dashboard: &Dashboard,
    filter: &FilterState,
    out_dir: &Path,
    metric: TrendMetric,
    granularity: Granularity,
) -> anyhow::Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let currency = &dashboard.config().currency_symbol;
    let summary = dashboard.summarize(filter);

    let benchmarks = reports::benchmark_rows(&summary.classified, currency);
    output::write_csv(&out_dir.join("benchmarks.csv"), &benchmarks)?;
    let funnel = reports::funnel_steps(&summary.totals, &summary.metrics);
    output::write_csv(&out_dir.join("funnel.csv"), &funnel)?;
    let series = dashboard.get_series(filter, metric, granularity);
    output::write_csv(
        &out_dir.join("series.csv"),
        &reports::series_rows(&series, metric, currency),
    )?;
    let rows = dashboard.filtered(filter);
    output::write_csv(
        &out_dir.join("rows.csv"),
        &reports::row_table(&rows, "", usize::MAX, currency),
    )?;
    output::write_json(&out_dir.join("summary.json"), &summary)?;

    println!("Outputs saved to {}", out_dir.display());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => DashboardConfig::load(path)
            .with_context(|| format!("invalid config {}", path.display()))?,
        None => DashboardConfig::default(),
    };
    let mut dashboard = Dashboard::new(config);

    let outcome = dashboard
        .refresh_from_path(&cli.csv)
        .await
        .with_context(|| format!("Error loading dashboard from {}", cli.csv.display()))?;
    if let FetchOutcome::Applied(report) = outcome {
        println!(
            "Processing dataset... ({} records read, {} rows kept)",
            format_int(report.total_records),
            format_int(report.kept_rows)
        );
        if report.rejected_rows > 0 {
            println!(
                "Note: {} rows skipped due to missing or unparsable dates.",
                format_int(report.rejected_rows)
            );
        }
        for (field, header) in &report.resolved_columns {
            debug!(%field, header = %header, "column");
        }
        if !report.unresolved_fields.is_empty() {
            let names: Vec<&str> = report.unresolved_fields.iter().map(|f| f.name()).collect();
            println!("Columns not found (read as 0): {}", names.join(", "));
        }
        println!();
    }

    let filter = build_filter(&dashboard, &cli);

    match cli.command {
        Commands::Summary { json } => {
            print_summary(&dashboard, &filter);
            if let Some(path) = json {
                output::write_json(&path, &dashboard.summarize(&filter))?;
                println!("Summary written to {}.", path.display());
            }
        }
        Commands::Series {
            metric,
            granularity,
        } => {
            let series = dashboard.get_series(&filter, metric, granularity);
            let rows = reports::series_rows(&series, metric, &dashboard.config().currency_symbol);
            output::preview_table(Some(metric.metric().label()), &rows);
        }
        Commands::Rows { search, limit } => {
            let rows = dashboard.filtered(&filter);
            let table =
                reports::row_table(&rows, &search, limit, &dashboard.config().currency_symbol);
            output::preview_table(None, &table);
        }
        Commands::Channels => {
            for channel in dashboard.get_channels() {
                println!("{}", channel);
            }
        }
        Commands::Export {
            out_dir,
            metric,
            granularity,
        } => {
            export_all(&dashboard, &filter, &out_dir, metric, granularity)?;
        }
    }

    Ok(())
}
