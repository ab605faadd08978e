use anyhow::Result;
use clap::{Parser, ValueEnum};
use rmcp::{ServiceExt, transport::stdio};
use std::path::PathBuf;
use tracing_subscriber::{self, filter::EnvFilter};

use nappa_instrument::{
    config::InstrumentConfig,
    service::{InstrumentService, RunMode},
};

/// NAPPA instrumentation - structural injection of the prefetching library into
/// Android projects
#[derive(Parser, Debug)]
#[command(name = "nappa-instrument")]
#[command(about = "Instrument Android Java/Kotlin projects for NAPPA, as an MCP server or one-shot run")]
#[command(version)]
struct Args {
    /// Root directories of the project (can be specified multiple times)
    #[arg(
        short = 'd',
        long = "root-dir",
        help = "Root directory of the project (default: current directory)",
        value_name = "PATH"
    )]
    root_directories: Vec<PathBuf>,

    /// Configuration file
    #[arg(
        short = 'c',
        long = "config",
        help = "Configuration file (default: nappa-instrument.yml found upwards from the root directory)",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Maximum file size to process (in bytes)
    #[arg(long = "max-file-size", help = "Maximum file size to process in bytes")]
    max_file_size: Option<u64>,

    /// Report edits without writing files
    #[arg(long = "dry-run", help = "Compute and report edits without modifying files")]
    dry_run: bool,

    /// Run once and print the JSON result instead of serving MCP
    #[arg(long = "run", value_enum, value_name = "PASS")]
    run: Option<Pass>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Pass {
    Activities,
    IntentExtras,
    All,
}

impl From<Pass> for RunMode {
    fn from(pass: Pass) -> Self {
        match pass {
            Pass::Activities => RunMode::Activities,
            Pass::IntentExtras => RunMode::IntentExtras,
            Pass::All => RunMode::All,
        }
    }
}

#[tokio::main]
#[tracing::instrument]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // stdout carries the MCP transport; log to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("Starting with arguments: {:?}", args);

    let run = args.run;
    let config = create_config_from_args(args)?;
    let service = InstrumentService::with_config(config);

    if let Some(pass) = run {
        let outcome = service.run(pass.into(), None);
        let result = match &outcome {
            Ok(result) => result,
            Err(nappa_instrument::errors::ServiceError::Faults { partial, .. }) => partial.as_ref(),
            Err(e) => anyhow::bail!("{e}"),
        };
        println!("{}", serde_json::to_string_pretty(result)?);
        outcome?;
        return Ok(());
    }

    let service = service.serve(stdio()).await?;

    tracing::info!("Service started, waiting for connections");
    service.waiting().await?;
    Ok(())
}

/// Create an InstrumentConfig from the configuration file and command line arguments
fn create_config_from_args(args: Args) -> Result<InstrumentConfig> {
    let root_directories = if args.root_directories.is_empty() {
        // Default to current working directory
        vec![std::env::current_dir()?]
    } else {
        args.root_directories
    };

    let mut config = match args.config {
        Some(path) => InstrumentConfig::from_file(&path)?,
        None => match InstrumentConfig::discover(&root_directories[0])? {
            Some((path, config)) => {
                tracing::info!("Using configuration {}", path.display());
                config
            }
            None => user_config()?.unwrap_or_default(),
        },
    };

    config.root_directories = root_directories;
    if let Some(max_file_size) = args.max_file_size {
        config.max_file_size = max_file_size;
    }
    if args.dry_run {
        config.dry_run = true;
    }
    Ok(config)
}

/// Fallback configuration in the user's config directory
/// (e.g. ~/.config/nappa-instrument/nappa-instrument.yml)
fn user_config() -> Result<Option<InstrumentConfig>> {
    let Some(path) = dirs::config_dir()
        .map(|dir| dir.join("nappa-instrument").join("nappa-instrument.yml"))
        .filter(|path| path.exists())
    else {
        return Ok(None);
    };
    tracing::info!("Using configuration {}", path.display());
    Ok(Some(InstrumentConfig::from_file(&path)?))
}
