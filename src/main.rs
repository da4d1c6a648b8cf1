use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use colored::*;
use readyrs::config::AppConfig;
use readyrs::engine::ReadinessEngine;
use readyrs::export::{self, text, ExportFormat};
use readyrs::import::ImportManager;
use readyrs::logging::{init_logging, log_engine_error};
use readyrs::models::UserHistory;
use readyrs::EngineError;
use std::path::{Path, PathBuf};
use tracing::info;

/// readyrs - Training Readiness & Load Analytics
///
/// Turns wellness submissions, wearable telemetry and activity logs into
/// daily readiness, training load (CTL/ATL/TSB), ACWR and recovery guidance.
#[derive(Parser)]
#[command(name = "readyrs")]
#[command(version)]
#[command(about = "Training readiness and load analytics", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Where a user's history comes from
#[derive(Args)]
struct InputArgs {
    /// JSON history file
    #[arg(long, value_name = "FILE", conflicts_with_all = ["wellness", "activities"])]
    history: Option<PathBuf>,

    /// Wellness CSV file
    #[arg(long, value_name = "FILE")]
    wellness: Option<PathBuf>,

    /// Activity CSV file
    #[arg(long, value_name = "FILE")]
    activities: Option<PathBuf>,

    /// User id for CSV input
    #[arg(long, default_value = "athlete")]
    user_id: String,

    /// User UTC offset in minutes for CSV input
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    utc_offset: i32,
}

#[derive(Args)]
struct OutputArgs {
    /// Output format (text, json)
    #[arg(short = 'f', long, default_value = "text")]
    format: String,

    /// Write to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Full readiness, load and recovery report for one day
    Report {
        #[command(flatten)]
        input: InputArgs,

        /// Evaluation day (defaults to the latest recorded day)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Daily readiness over a trailing range
    Readiness {
        #[command(flatten)]
        input: InputArgs,

        /// Last day of the range
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Number of days to show
        #[arg(long, default_value = "14")]
        days: u32,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Performance management chart (CTL, ATL, TSB)
    Pmc {
        #[command(flatten)]
        input: InputArgs,

        /// Last day of the range
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Number of days to show
        #[arg(long, default_value = "42")]
        days: u32,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Acute:chronic workload ratio over a trailing range
    Acwr {
        #[command(flatten)]
        input: InputArgs,

        /// Last day of the range
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Number of days to show
        #[arg(long, default_value = "28")]
        days: u32,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Recovery score and recommendations for one day
    Recovery {
        #[command(flatten)]
        input: InputArgs,

        /// Evaluation day (defaults to the latest recorded day)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Reports for every user in a JSON history array
    Batch {
        /// JSON file holding one history or an array of them
        #[arg(long, value_name = "FILE")]
        history: PathBuf,

        /// Evaluation day (defaults to today)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Manage configuration
    Config {
        /// Write a default configuration file
        #[arg(long)]
        init: bool,

        /// Print the effective configuration
        #[arg(long)]
        show: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::load_or_default(),
    };

    let mut log_config = config.logging.clone();
    log_config.level = log_config.level.raised_by(cli.verbose);
    init_logging(&log_config)?;

    if cli.verbose > 0 {
        eprintln!("{}", format!("Log level: {:?}", log_config.level).dimmed());
    }

    let engine = engine_result(ReadinessEngine::with_config(config.engine.clone()))?;

    match cli.command {
        Commands::Report {
            input,
            date,
            output,
        } => {
            let history = load_history(&input)?;
            let as_of = evaluation_day(&history, date);
            let report = engine_result(engine.analyze(&history, as_of))?;
            write(&report, &output, text::render_report)?;
        }

        Commands::Readiness {
            input,
            date,
            days,
            output,
        } => {
            let history = load_history(&input)?;
            let to = evaluation_day(&history, date);
            let from = ReadinessEngine::range_start(to, days);
            let series = engine.readiness_series(&history, from, to);
            write(&series, &output, |s| text::render_readiness_table(s))?;
        }

        Commands::Pmc {
            input,
            date,
            days,
            output,
        } => {
            let history = load_history(&input)?;
            let to = evaluation_day(&history, date);
            let from = ReadinessEngine::range_start(to, days);
            let series = engine_result(engine.pmc_series(&history, from, to))?;
            let ramp_rate = engine.ctl_ramp_rate(&history, to);
            write(&series, &output, |s| {
                let mut table = text::render_pmc_table(s);
                if let Some(rate) = ramp_rate {
                    table.push_str(&format!("\nCTL ramp rate: {:+.1} per week", rate));
                }
                table
            })?;
        }

        Commands::Acwr {
            input,
            date,
            days,
            output,
        } => {
            let history = load_history(&input)?;
            let to = evaluation_day(&history, date);
            let from = ReadinessEngine::range_start(to, days);
            let series = engine.acwr_series(&history, from, to);
            write(&series, &output, |s| text::render_acwr_table(s))?;
        }

        Commands::Recovery {
            input,
            date,
            output,
        } => {
            let history = load_history(&input)?;
            let as_of = evaluation_day(&history, date);
            let report = engine_result(engine.analyze(&history, as_of))?;
            write(&report.recovery, &output, text::render_recovery)?;
        }

        Commands::Batch {
            history,
            date,
            output,
        } => {
            let histories = ImportManager::import_histories(&history)
                .with_context(|| format!("Failed to import {}", history.display()))?;
            let as_of = date.unwrap_or_else(|| Local::now().date_naive());
            let batch = engine.analyze_batch(&histories, as_of);
            write(&batch, &output, text::render_batch)?;

            if batch.failed_users > 0 {
                eprintln!(
                    "{}",
                    format!("{} of {} users failed", batch.failed_users, batch.total_users)
                        .yellow()
                );
            }
        }

        Commands::Config { init, show } => {
            run_config(cli.config.as_deref(), config, init, show)?;
        }
    }

    Ok(())
}

/// Log engine errors at their severity before handing them to anyhow
fn engine_result<T>(result: readyrs::Result<T>) -> Result<T> {
    result.map_err(|e: EngineError| {
        log_engine_error(&e);
        anyhow::Error::new(e)
    })
}

fn load_history(input: &InputArgs) -> Result<UserHistory> {
    if let Some(path) = &input.history {
        return ImportManager::import_history(path)
            .with_context(|| format!("Failed to import {}", path.display()));
    }

    if input.wellness.is_none() && input.activities.is_none() {
        bail!("Provide --history, or --wellness and/or --activities");
    }

    let history = ImportManager::import_csv_pair(
        &input.user_id,
        input.utc_offset,
        input.wellness.as_deref(),
        input.activities.as_deref(),
    )
    .context("Failed to import CSV input")?;
    Ok(history)
}

fn evaluation_day(history: &UserHistory, date: Option<NaiveDate>) -> NaiveDate {
    date.or_else(|| ReadinessEngine::latest_day(history))
        .unwrap_or_else(|| Local::now().date_naive())
}

fn write<T, F>(value: &T, output: &OutputArgs, render_text: F) -> Result<()>
where
    T: serde::Serialize,
    F: FnOnce(&T) -> String,
{
    let format: ExportFormat = output.format.parse()?;
    export::export(value, format, output.output.as_deref(), render_text)?;
    if let Some(path) = &output.output {
        eprintln!("{}", format!("✓ Written to {}", path.display()).green());
    }
    Ok(())
}

fn run_config(path: Option<&Path>, mut config: AppConfig, init: bool, show: bool) -> Result<()> {
    if init {
        let target = path
            .map(Path::to_path_buf)
            .unwrap_or_else(AppConfig::default_config_path);
        if target.exists() {
            bail!("Config file already exists: {}", target.display());
        }
        config = AppConfig::default();
        config.save_to_file(&target)?;
        info!(file = %target.display(), "wrote default config");
        println!("{}", format!("✓ Wrote {}", target.display()).green());
    }

    if show || !init {
        let rendered =
            toml::to_string_pretty(&config).context("Failed to render configuration")?;
        println!("{}", rendered);
    }
    Ok(())
}
