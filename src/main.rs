//! CLI entry point for the ce_meta analysis tool.
//!
//! Provides subcommands for the time-series, boxplot and correlation
//! pipelines over the scenario-projection workbook, or all three at once.

use anyhow::Result;
use ce_meta::config::AnalysisConfig;
use ce_meta::error::AnalysisError;
use ce_meta::pipeline::{Pipeline, run};
use clap::{Args, Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "ce_meta")]
#[command(about = "Statistics and charts for circular-economy scenario projections", long_about = None)]
struct Cli {
    #[command(flatten)]
    options: Options,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct Options {
    /// JSON settings file; flags below override its values
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Source workbook with gdp, job and co2 sheets
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    /// Year used by the boxplot and correlation pipelines
    #[arg(short, long, global = true)]
    year: Option<i32>,

    /// Directory for the exported workbooks
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Directory for the SVG charts
    #[arg(long, global = true)]
    charts_dir: Option<PathBuf>,

    /// Skip chart rendering
    #[arg(long, default_value_t = false, global = true)]
    no_charts: bool,

    /// Also write every exported sheet as CSV
    #[arg(long, default_value_t = false, global = true)]
    csv: bool,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Study means and ranges per year, one chart per indicator
    TimeSeries,
    /// Boxplot of study means per indicator and scenario degree
    Boxplot,
    /// Pearson correlation of gdp, job and co2 study means
    Corr,
    /// Run all three pipelines (default)
    All,
}

impl Commands {
    fn pipelines(self) -> Vec<Pipeline> {
        match self {
            Commands::TimeSeries => vec![Pipeline::TimeSeries],
            Commands::Boxplot => vec![Pipeline::Boxplot],
            Commands::Corr => vec![Pipeline::Correlation],
            Commands::All => Pipeline::ALL.to_vec(),
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/ce_meta.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("ce_meta.log"));

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
    let config = build_config(&cli.options)?;
    debug!(?config, "Configuration resolved");

    let pipelines = cli.command.unwrap_or(Commands::All).pipelines();

    match run(&pipelines, &config) {
        Ok(files) => {
            for file in &files {
                info!(path = %file.display(), "Written");
            }
            Ok(())
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "Analysis failed");
            if e
                .downcast_ref::<AnalysisError>()
                .is_some_and(AnalysisError::is_data_format)
            {
                warn!(input = %config.input.display(), "Input workbook does not match the expected layout");
            }
            Err(e)
        }
    }
}

/// Starts from the config file (or defaults) and applies the CLI overrides.
fn build_config(options: &Options) -> Result<AnalysisConfig> {
    let mut config = match &options.config {
        Some(path) => {
            info!(path = %path.display(), "Loading config");
            AnalysisConfig::load(path)?
        }
        None => AnalysisConfig::default(),
    };

    if let Some(input) = &options.input {
        config.input = input.clone();
    }
    if let Some(year) = options.year {
        config.year = year;
    }
    if let Some(dir) = &options.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(dir) = &options.charts_dir {
        config.charts_dir = dir.clone();
    }
    if options.no_charts {
        config.render_charts = false;
    }
    if options.csv {
        config.export_csv = true;
    }

    config.validate()?;
    Ok(config)
}
