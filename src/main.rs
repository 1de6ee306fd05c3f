use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

use hpos::api::{OutputFormat, ResultFormatter};
use hpos::processing::PositionEngine;
use hpos::utils::{nmea_files_in, EngineConfig, MissingPdopPolicy};

/// Reduce logged NMEA position fixes to one weighted best-estimate position
#[derive(Debug, Parser)]
#[command(name = "hpos", version)]
struct Cli {
    /// NMEA log file, or a directory whose *.nmea files are processed in name order
    #[arg(default_value = ".")]
    target: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Highest admitted PDOP in hundredths (210 admits up to 2.10)
    #[arg(long)]
    pdop_cutoff: Option<i64>,

    /// Handling of fix groups without a PDOP value
    #[arg(long, value_enum)]
    missing_pdop: Option<PdopOpt>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Copy, Clone, Debug, clap::ValueEnum)]
enum PdopOpt {
    Accept,
    Reject,
}

impl From<PdopOpt> for MissingPdopPolicy {
    fn from(value: PdopOpt) -> Self {
        match value {
            PdopOpt::Accept => MissingPdopPolicy::Accept,
            PdopOpt::Reject => MissingPdopPolicy::Reject,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(message) => {
            error!("{}", message);
            return ExitCode::FAILURE;
        }
    };

    let files = if cli.target.is_dir() {
        info!(dir = %cli.target.display(), "scanning for logs");
        match nmea_files_in(&cli.target) {
            Ok(files) => files,
            Err(e) => {
                error!("cannot read directory '{}': {}", cli.target.display(), e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        vec![cli.target.clone()]
    };

    if files.is_empty() {
        warn!("no .nmea files in '{}'", cli.target.display());
        return ExitCode::SUCCESS;
    }

    let mut failed = false;
    for path in &files {
        if let Err(message) = process_file(&config, cli.format, path, files.len() > 1) {
            error!("{}", message);
            failed = true;
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn load_config(cli: &Cli) -> Result<EngineConfig, String> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path).map_err(|e| e.to_string())?,
        None => EngineConfig::default(),
    };

    if let Some(cutoff) = cli.pdop_cutoff {
        config = config.with_pdop_cutoff(cutoff);
    }
    if let Some(policy) = cli.missing_pdop {
        config = config.with_missing_pdop(policy.into());
    }

    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn process_file(config: &EngineConfig, format: OutputFormat, path: &Path, banner: bool) -> Result<(), String> {
    let report = PositionEngine::run_file(config, path).map_err(|e| e.to_string())?;

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "hpos".to_string());
    let rendered = ResultFormatter::new(format)
        .with_name(name)
        .render(&report)
        .map_err(|e| format!("{}: {}", path.display(), e))?;

    if banner && format == OutputFormat::Text {
        println!("== {} ==", path.display());
    }
    print!("{}", rendered);
    Ok(())
}

/// Initialize logging subsystem
fn init_logging(verbose: bool) {
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    if verbose {
        subscriber.with_max_level(tracing::Level::DEBUG).init();
    } else {
        subscriber.with_max_level(tracing::Level::INFO).init();
    }
}
