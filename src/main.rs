use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

use event_feedback_pulse::dashboard::{self, DashboardSnapshot};
use event_feedback_pulse::filters::{self, DashboardFilters, DateRange};
use event_feedback_pulse::impact::{Impact, ImpactCounter};
use event_feedback_pulse::models::DashboardInput;
use event_feedback_pulse::report::{self, ReportOptions};
use event_feedback_pulse::{db, export, rankings};

#[derive(Parser)]
#[command(name = "feedback-pulse")]
#[command(about = "Satisfaction metrics for live-event feedback surveys", long_about = None)]
struct Cli {
    /// Postgres connection string for the survey store
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    database_url: Option<String>,
    #[arg(long, env = "FEEDBACK_MAX_CONNECTIONS", default_value_t = 5, global = true)]
    max_connections: u32,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FilterArgs {
    #[arg(long)]
    from: Option<NaiveDate>,
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Trailing window ending today
    #[arg(long, conflicts_with_all = ["from", "to"])]
    since_days: Option<i64>,
    #[arg(long)]
    event_type: Option<String>,
    #[arg(long)]
    gender: Option<String>,
    #[arg(long)]
    age_band: Option<String>,
    #[arg(long)]
    transport_mode: Option<String>,
    /// Read CSV exports from this directory instead of the store
    #[arg(long)]
    export_dir: Option<PathBuf>,
}

impl FilterArgs {
    fn filters(&self) -> DashboardFilters {
        let date_range = match (self.since_days, self.from, self.to) {
            (Some(days), _, _) => Some(filters::trailing_window(days)),
            (None, None, None) => None,
            (None, from, to) => Some(DateRange { from, to }),
        };

        DashboardFilters {
            date_range,
            event_type: self.event_type.clone(),
            gender: self.gender.clone(),
            age_band: self.age_band.clone(),
            transport_mode: self.transport_mode.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the dashboard snapshot as JSON
    Snapshot {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
        #[arg(long, default_value_t = rankings::DRIVER_DISPLAY_LIMIT)]
        top: usize,
        #[arg(long, default_value_t = rankings::PREFERENCE_DISPLAY_LIMIT)]
        preferences: usize,
        /// Only list preferences containing this text
        #[arg(long)]
        search: Option<String>,
    },
    /// Show the trees planted so far
    Trees {
        #[arg(long)]
        export_dir: Option<PathBuf>,
    },
    /// Poll the response count and report every change
    WatchTrees {
        #[arg(long, default_value_t = 30)]
        interval_secs: u64,
    },
}

async fn connect(cli: &Cli) -> anyhow::Result<PgPool> {
    let database_url = cli
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set unless --export-dir is given")?;

    PgPoolOptions::new()
        .max_connections(cli.max_connections)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")
}

async fn load_input(cli: &Cli, filter: &FilterArgs) -> anyhow::Result<DashboardInput> {
    let filters = filter.filters();
    match &filter.export_dir {
        Some(dir) => {
            let raw = export::load_export_dir(dir)?;
            Ok(filters::apply(&raw, &filters))
        }
        None => {
            let pool = connect(cli).await?;
            db::load_dashboard_input(&pool, &filters).await
        }
    }
}

async fn snapshot_for(cli: &Cli, filter: &FilterArgs) -> anyhow::Result<DashboardSnapshot> {
    let input = load_input(cli, filter).await?;
    Ok(dashboard::build_snapshot(&input))
}

fn print_impact(impact: &Impact) {
    println!(
        "{} responses, {} trees planted ({}kg CO2), {} responses to the next tree.",
        impact.responses, impact.trees_planted, impact.co2_offset_kg, impact.responses_to_next_tree
    );
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

    match &cli.command {
        Commands::Snapshot { filter, out } => {
            let snapshot = snapshot_for(&cli, filter).await?;
            let json = serde_json::to_string_pretty(&snapshot)?;
            match out {
                Some(path) => {
                    std::fs::write(path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Snapshot written to {}.", path.display());
                }
                None => println!("{json}"),
            }
        }
        Commands::Report {
            filter,
            out,
            top,
            preferences,
            search,
        } => {
            let snapshot = snapshot_for(&cli, filter).await?;
            let options = ReportOptions {
                top_drivers: *top,
                top_preferences: *preferences,
                preference_search: search.clone(),
            };
            let report = report::build_report(&filter.filters(), &snapshot, &options);
            std::fs::write(out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Trees { export_dir } => {
            let responses = match export_dir {
                Some(dir) => export::count_response_rows(dir)?,
                None => {
                    let pool = connect(&cli).await?;
                    db::count_responses(&pool).await?
                }
            };
            print_impact(&Impact::from_responses(responses));
        }
        Commands::WatchTrees { interval_secs } => {
            let pool = connect(&cli).await?;
            let mut counter = ImpactCounter::new();
            let mut ticker = tokio::time::interval(Duration::from_secs((*interval_secs).max(1)));
            tracing::info!(interval_secs, "watching response count");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = tokio::signal::ctrl_c() => break,
                }
                let total = match db::count_responses(&pool).await {
                    Ok(total) => total,
                    Err(err) => {
                        tracing::warn!(error = %err, "response count failed, retrying next tick");
                        continue;
                    }
                };
                if let Some(update) = counter.observe(total) {
                    if update.new_tree {
                        tracing::info!(trees = update.impact.trees_planted, "a new tree will be planted");
                    }
                    print_impact(&update.impact);
                }
            }
        }
    }

    Ok(())
}
