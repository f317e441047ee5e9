use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use school_analytics::adapters::Domain;
use school_analytics::config::Settings;
use school_analytics::pipeline::{analyze_facts, Analysis, AnalysisRequest};
use school_analytics::source::{load_facts, FactSource};
use school_analytics::trend::{Metric, SortOrder};
use school_analytics::{db, report};

#[derive(Parser)]
#[command(name = "school-analytics")]
#[command(about = "Attendance, fee, test, syllabus and timetable analytics for schools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data ending at the given date
    Seed {
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Import one domain's records from a CSV file
    Import {
        #[arg(long)]
        domain: String,
        #[arg(long)]
        csv: PathBuf,
    },
    /// Rank groups within a domain with period-over-period trends
    Rank {
        #[command(flatten)]
        query: QueryArgs,
        #[arg(long, default_value = "percentage")]
        metric: String,
        #[arg(long, default_value = "desc")]
        order: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Print the full analysis as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report for one domain
    Report {
        #[command(flatten)]
        query: QueryArgs,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Summarise every domain for one period
    Overview {
        #[arg(long, default_value = "weekly")]
        period: String,
        #[arg(long)]
        as_of: Option<NaiveDate>,
        #[arg(long)]
        stability_band: Option<f64>,
        /// Read `<domain>.csv` exports from this directory instead of the database
        #[arg(long)]
        csv_dir: Option<PathBuf>,
    },
}

#[derive(Args)]
struct QueryArgs {
    #[arg(long)]
    domain: String,
    #[arg(long, default_value = "weekly")]
    period: String,
    /// Last day of the current window; defaults to today (UTC)
    #[arg(long)]
    as_of: Option<NaiveDate>,
    /// Read records from a CSV export instead of the database
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Percentage points a group must move to count as a change
    #[arg(long)]
    stability_band: Option<f64>,
}

fn reference_date(as_of: Option<NaiveDate>) -> NaiveDate {
    as_of.unwrap_or_else(|| Utc::now().date_naive())
}

async fn fact_source(settings: &Settings, csv: Option<PathBuf>) -> anyhow::Result<FactSource> {
    match csv {
        Some(path) => Ok(FactSource::Csv(path)),
        None => Ok(FactSource::Database(db::connect(settings).await?)),
    }
}

async fn run_query(
    settings: &Settings,
    query: QueryArgs,
    metric: Metric,
    order: SortOrder,
) -> anyhow::Result<Analysis> {
    let domain: Domain = query.domain.parse()?;
    let request = AnalysisRequest::parse(&query.period, reference_date(query.as_of))?
        .with_metric(metric)
        .with_sort_order(order)
        .with_thresholds(settings.thresholds(query.stability_band)?);

    let source = fact_source(settings, query.csv).await?;
    let facts = load_facts(domain, &source, request.window.span()).await?;
    Ok(analyze_facts(domain, &facts, &request))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    match cli.command {
        Commands::InitDb => {
            let pool = db::connect(&settings).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed { as_of } => {
            let pool = db::connect(&settings).await?;
            let inserted = db::seed(&pool, reference_date(as_of)).await?;
            println!("Seed data inserted ({inserted} new rows).");
        }
        Commands::Import { domain, csv } => {
            let domain: Domain = domain.parse()?;
            let pool = db::connect(&settings).await?;
            let inserted = db::import_csv(&pool, domain, &csv).await?;
            println!("Inserted {inserted} {domain} records from {}.", csv.display());
        }
        Commands::Rank {
            query,
            metric,
            order,
            limit,
            json,
        } => {
            let metric: Metric = metric.parse()?;
            let order: SortOrder = order.parse()?;
            let analysis = run_query(&settings, query, metric, order).await?;

            if json {
                let body = serde_json::to_string_pretty(&analysis)
                    .context("failed to serialize analysis")?;
                println!("{body}");
                return Ok(());
            }

            if analysis.is_empty() {
                println!("No data found for this window.");
                return Ok(());
            }

            println!(
                "{} by {} for {} (previous {}):",
                analysis.domain.rate_label(),
                analysis.domain.group_label(),
                analysis.window.current(),
                analysis.window.previous()
            );
            for row in analysis.ranked.iter().take(limit) {
                println!("{}", report::format_row(row));
            }
        }
        Commands::Report { query, limit, out } => {
            let analysis =
                run_query(&settings, query, Metric::Percentage, SortOrder::Desc).await?;
            let body = report::build_report(&analysis, limit);
            std::fs::write(&out, body)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Overview {
            period,
            as_of,
            stability_band,
            csv_dir,
        } => {
            let request = AnalysisRequest::parse(&period, reference_date(as_of))?
                .with_thresholds(settings.thresholds(stability_band)?);
            let source = match csv_dir {
                Some(dir) => FactSource::CsvDir(dir),
                None => FactSource::Database(db::connect(&settings).await?),
            };

            println!(
                "Overview for {} to {} (previous {}):",
                request.window.start_date,
                request.window.end_date,
                request.window.previous()
            );
            for domain in Domain::ALL {
                let facts = load_facts(domain, &source, request.window.span()).await?;
                let analysis = analyze_facts(domain, &facts, &request);
                println!("{}", report::overview_line(&analysis));
            }
        }
    }

    Ok(())
}
