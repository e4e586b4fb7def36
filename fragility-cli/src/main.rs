//! Fragility CLI: run the monitor and inspect configuration.
//!
//! Commands:
//! - `monitor`: score the sector from CSV inputs (or synthetic data) and print the dashboard
//! - `config`: print the merged configuration as TOML

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use fragility_core::scoring::Component;
use fragility_runner::export::save_artifacts;
use fragility_runner::{
    run_monitor, CsvFilingProvider, CsvMacroProvider, CsvMarketProvider, MonitorConfig,
    MonitorResult, ReportContext, SyntheticProvider,
};

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "fragility.toml";

const SPARK_CHARS: &[u8] = b" .:-=+*#%@";
const SPARK_WIDTH: usize = 40;
const TREND_PERIODS: usize = 60;

#[derive(Parser)]
#[command(
    name = "fragility",
    about = "Fragility CLI — sector fragility index monitor"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the monitor and print the dashboard.
    Monitor {
        /// Path to a TOML config file. Defaults to ./fragility.toml when present.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Show the index as of this date (YYYY-MM-DD).
        #[arg(long)]
        asof: Option<String>,

        /// Write JSON, CSV and Markdown artifacts to this directory.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Use deterministic synthetic data instead of the CSV inputs.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Synthetic start date (YYYY-MM-DD). Defaults to 6 years ago.
        #[arg(long)]
        start: Option<String>,

        /// Synthetic end date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,
    },
    /// Print the merged configuration as TOML.
    Config {
        /// Path to a TOML config file. Defaults to ./fragility.toml when present.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Monitor {
            config,
            asof,
            output,
            synthetic,
            start,
            end,
        } => run_monitor_cmd(config, asof, output, synthetic, start, end),
        Commands::Config { config } => {
            let config = load_config(config.as_deref())?;
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<MonitorConfig> {
    let default_path = Path::new(DEFAULT_CONFIG_FILE);
    let path = path.or_else(|| default_path.exists().then_some(default_path));
    MonitorConfig::load(path).context("failed to load configuration")
}

fn init_logging(config: &MonitorConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn parse_date(value: Option<&str>) -> Result<Option<NaiveDate>> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD"))
        })
        .transpose()
}

fn run_monitor_cmd(
    config_path: Option<PathBuf>,
    asof: Option<String>,
    output: Option<PathBuf>,
    synthetic: bool,
    start: Option<String>,
    end: Option<String>,
) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    init_logging(&config);
    let asof = parse_date(asof.as_deref())?;
    tracing::info!(synthetic, asof = ?asof, "starting monitor");

    let result = if synthetic {
        let end_date = parse_date(end.as_deref())?
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let start_date = parse_date(start.as_deref())?
            .unwrap_or_else(|| end_date - chrono::Duration::days(365 * 6));
        let provider = SyntheticProvider::new(start_date, end_date);
        run_monitor(&config, &provider, &provider, &provider)?
    } else {
        run_monitor(
            &config,
            &CsvMarketProvider {
                path: config.data.prices.clone(),
            },
            &CsvMacroProvider {
                path: config.data.macro_series.clone(),
            },
            &CsvFilingProvider {
                path: config.data.filings.clone(),
            },
        )?
    };

    let result = match asof {
        Some(date) => match result.truncate_as_of(date) {
            Some(truncated) => truncated,
            None => {
                println!("No data available for the requested window.");
                return Ok(());
            }
        },
        None => result,
    };

    print_dashboard(&result);

    if let Some(dir) = output {
        let out = save_artifacts(&result, &dir)?;
        println!("\nArtifacts written to {}", out.display());
    }

    Ok(())
}

/// Character sparkline: at most `width` samples, min maps to ' ' and max to '@'.
fn sparkline(values: &[f64], width: usize) -> String {
    let mut values: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if values.is_empty() {
        return String::new();
    }
    if values.len() > width {
        let step = (values.len() / width).max(1);
        values = values.into_iter().step_by(step).collect();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let levels = SPARK_CHARS.len() - 1;
    values
        .iter()
        .map(|v| {
            let idx = if max == min {
                0
            } else {
                (((v - min) / (max - min)) * levels as f64) as usize
            };
            SPARK_CHARS[idx.min(levels)] as char
        })
        .collect()
}

fn print_dashboard(result: &MonitorResult) {
    let Some(latest) = result.composite.latest() else {
        println!("No data available for the requested window.");
        return;
    };
    if result.components.index().is_empty() {
        println!("No data available for the requested window.");
        return;
    }

    let index = result.composite.index_values();
    let trend = &index[index.len().saturating_sub(TREND_PERIODS)..];

    println!("\nFragility Index");
    println!(
        "Index: {:.1} | Band: [{:.1}, {:.1}]",
        latest.index, latest.band_lower, latest.band_upper
    );
    println!("Regime: {} (as of {})", result.summary.regime, result.summary.as_of);
    println!("Trend: {}", sparkline(trend, SPARK_WIDTH));
    println!("{}", result.summary.interpretation);
    if result.has_synthetic {
        println!("** SYNTHETIC DATA **");
    }

    println!("\nComponents");
    for component in Component::ALL {
        let value = result.components.latest(component);
        if value.is_nan() {
            println!("- {:<20} {:>5}", component.label(), "n/a");
        } else {
            println!("- {:<20} {:>5.1}", component.label(), value);
        }
    }

    let context = ReportContext::build(&result.composite, &result.components);
    if !context.movers.is_empty() {
        println!("\nBiggest Movers");
        for mover in &context.movers {
            println!(
                "- {:<20} {:>+6.1} {}",
                mover.label(),
                mover.delta,
                mover.sigma_text()
            );
        }
    }
    for callout in context
        .containment_message
        .iter()
        .chain(context.macro_sector_callout.iter())
    {
        println!("\n{callout}");
    }

    let b = &result.backtest;
    println!("\nBacktest");
    println!(
        "Precision: {:.2} | Recall: {:.2} | Avg lead: {} | Events: {} | Signals: {}",
        b.precision,
        b.recall,
        b.avg_lead_days
            .map_or_else(|| "n/a".to_string(), |d| format!("{d:.1}d")),
        b.events,
        b.signals
    );
}
