use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use strum::IntoEnumIterator;
use ticketflow::{
    analytics::{AnalyticsEngine, ExportFormat, ReportExporter, SeverityPreset},
    config::Config,
    error::AppError,
    ingest::{load_events, InputFormat},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ticketflow", version)]
#[command(about = "Find where service tickets lose time between stages", long_about = None)]
struct Cli {
    /// Extra configuration file layered over the defaults
    #[arg(short, long, global = true, env = "TICKETFLOW_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an event log and export the result tables
    Analyze {
        /// Event log (.csv or .json)
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory (defaults to output.directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Severity threshold preset: standard, extended or baseline
        #[arg(short, long)]
        preset: Option<SeverityPreset>,

        /// Fraction of bottleneck time removed, 0..=1
        #[arg(long)]
        reduction: Option<f64>,

        /// Tickets per year
        #[arg(long)]
        volume: Option<u64>,

        /// Loaded cost per hour
        #[arg(long)]
        hourly_cost: Option<f64>,

        /// Number of slowest stages targeted by the projection
        #[arg(long)]
        top_n: Option<usize>,

        /// Table format: csv or json
        #[arg(short, long)]
        format: Option<ExportFormat>,

        /// Input format when the extension is not .csv or .json
        #[arg(long)]
        input_format: Option<InputFormat>,

        /// Aggregate on a single thread
        #[arg(long)]
        sequential: bool,
    },

    /// List the severity threshold presets
    Presets,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("Error: {:#}", err);
        let code = err
            .downcast_ref::<AppError>()
            .map(AppError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if cli.json_logs {
        config.observability.json_logs = true;
    }
    init_tracing(&config);

    match cli.command {
        Commands::Presets => {
            print_presets();
            Ok(())
        }
        Commands::Analyze {
            input,
            output,
            preset,
            reduction,
            volume,
            hourly_cost,
            top_n,
            format,
            input_format,
            sequential,
        } => {
            if let Some(r) = reduction {
                config.impact.reduction_fraction = r;
            }
            if let Some(v) = volume {
                config.impact.tickets_per_year = v;
            }
            if let Some(c) = hourly_cost {
                config.impact.hourly_cost = c;
            }
            if let Some(n) = top_n {
                config.impact.top_n = n;
            }
            if sequential {
                config.analysis.parallel = false;
            }
            config.validate()?;

            let analytics_config = config.to_analytics_config(preset)?;
            let engine = AnalyticsEngine::new(analytics_config).map_err(AppError::from)?;
            tracing::info!(
                thresholds = ?engine.config().thresholds,
                parallel = engine.config().parallel,
                "✅ Analytics engine configured"
            );

            let raw = load_events(&input, input_format)
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?;

            let report = tokio::task::spawn_blocking(move || engine.analyze_raw(raw))
                .await
                .context("Analysis task panicked")?
                .map_err(AppError::from)?;

            let format = format.unwrap_or(config.output.format);
            let directory = output.unwrap_or_else(|| config.output.directory.clone());
            let artifacts = ReportExporter::render(&report, format).map_err(AppError::from)?;
            let written = ReportExporter::write_all(&artifacts, &directory)
                .await
                .map_err(AppError::from)?;
            tracing::info!(
                directory = %directory.display(),
                files = written.len(),
                "✅ Results exported"
            );

            print!("{}", report.summary());
            Ok(())
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("ticketflow={}", config.observability.log_level).into());
    let registry = tracing_subscriber::registry().with(filter);

    if config.observability.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_presets() {
    println!(
        "{:<10} {:>10} {:>8} {:>10} {:>8}",
        "preset", "CRITICAL>", "HIGH>", "MODERATE>", "floor"
    );
    for preset in SeverityPreset::iter() {
        let t = preset.thresholds();
        println!(
            "{:<10} {:>10} {:>8} {:>10} {:>8}",
            preset.to_string(),
            t.critical_above,
            t.high_above,
            t.moderate_above,
            t.inclusion_floor
        );
    }
}
