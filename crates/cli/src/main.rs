//! Delivery KPI CLI
//!
//! Wires the mechanical collaborators around the analytic core: load an
//! event log, run the pipeline, print or persist the report; or generate
//! a synthetic event log to run against.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::Colorize;
use delivery_kpi_config::KpiConfig;
use delivery_kpi_datagen::{EventLogGenerator, GeneratorConfig};
use delivery_kpi_processor::KpiPipeline;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] delivery_kpi_config::ConfigError),

    #[error(transparent)]
    Processor(#[from] delivery_kpi_processor::ProcessorError),

    #[error(transparent)]
    Loader(#[from] delivery_kpi_loader::LoaderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(
    name = "delivery-kpi",
    version,
    about = "Delivery KPI analytics - turn order lifecycle event logs into KPI reports"
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the analytic pipeline over an event log
    #[command(name = "run", about = "Compute a KPI report from an event log file")]
    Run {
        /// Event log file (.jsonl by default, .csv by extension)
        input: PathBuf,

        /// Configuration file (YAML)
        #[arg(short, long, value_name = "FILE", env = "KPI_CONFIG")]
        config: Option<PathBuf>,

        /// Write the report to this path instead of only printing it
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Override the SLA threshold in seconds
        #[arg(long, value_name = "SECONDS")]
        sla_seconds: Option<u64>,

        /// Override the dimension field the group breakdown uses
        #[arg(long, value_name = "FIELD")]
        group_key: Option<String>,
    },

    /// Generate a synthetic event log
    #[command(name = "generate", about = "Write a synthetic event log for testing")]
    Generate {
        /// Output file (JSONL)
        #[arg(short, long, value_name = "FILE", default_value = "event_log.jsonl")]
        output: PathBuf,

        /// Number of orders to generate
        #[arg(long, default_value_t = 200)]
        orders: u32,

        /// RNG seed
        #[arg(long, default_value_t = 12345)]
        seed: u64,

        /// Fraction of orders that receive a dirty mutation (0.0 - 0.2)
        #[arg(long, default_value_t = 0.0)]
        dirty: f64,

        /// First order-creation day (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last order-creation day (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            input,
            config,
            output,
            sla_seconds,
            group_key,
        } => run_pipeline(input, config, output, sla_seconds, group_key).await,
        Commands::Generate {
            output,
            orders,
            seed,
            dirty,
            start,
            end,
        } => generate_log(output, orders, seed, dirty, start, end).await,
    }
}

async fn run_pipeline(
    input: PathBuf,
    config_path: Option<PathBuf>,
    output: Option<PathBuf>,
    sla_seconds: Option<u64>,
    group_key: Option<String>,
) -> CliResult<()> {
    let mut config = KpiConfig::load(config_path)?;
    if let Some(sla) = sla_seconds {
        config.sla_seconds = sla;
    }
    if let Some(key) = group_key {
        config.group_key = key;
    }
    config.validate()?;

    let pipeline = KpiPipeline::new(&config)?;
    let records = delivery_kpi_loader::load_records(&input).await?;
    info!(path = %input.display(), records = records.len(), "loaded event log");

    let run = pipeline.run(records);

    println!("{}", "Delivery KPI Report".bold().cyan());
    println!("{}", "=".repeat(40));
    println!("{}", serde_json::to_string_pretty(&run.report)?);
    println!();
    println!("{}", "Pipeline:".bold().cyan());
    println!("  Raw records: {}", run.stats.raw_records);
    println!("  Rejected:    {}", run.stats.rejected_records);
    println!("  Events:      {}", run.stats.events);
    println!("  Orders:      {}", run.stats.orders);
    println!(
        "  Completed:   {}",
        run.stats.completed_orders.to_string().green()
    );

    if let Some(path) = output {
        delivery_kpi_loader::write_report(&path, &run.report).await?;
        println!();
        println!("Report written to {}", path.display().to_string().bold());
    }

    Ok(())
}

async fn generate_log(
    output: PathBuf,
    orders: u32,
    seed: u64,
    dirty: f64,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> CliResult<()> {
    let defaults = GeneratorConfig::default();
    let config = GeneratorConfig {
        orders,
        seed,
        dirty_ratio: dirty,
        start_date: start.unwrap_or(defaults.start_date),
        end_date: end.unwrap_or(defaults.end_date),
        ..defaults
    };

    let records = EventLogGenerator::new(config).generate();

    let mut lines = String::with_capacity(records.len() * 128);
    for record in &records {
        lines.push_str(&serde_json::to_string(record)?);
        lines.push('\n');
    }
    tokio::fs::write(&output, lines).await?;

    println!(
        "Generated {} event rows from {} orders (seed={})",
        records.len().to_string().green(),
        orders,
        seed
    );
    println!("  -> {}", output.display().to_string().bold());

    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("delivery_kpi=debug,info")
    } else {
        tracing_subscriber::EnvFilter::from_default_env()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
