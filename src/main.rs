use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use flowbridge::{config, logging, server};

#[derive(Debug, Parser)]
#[command(
    name = "flowbridge",
    version,
    about = "Content-aware HTTP webhook router"
)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long)]
    config: PathBuf,

    /// Validate the configuration and exit
    #[arg(long)]
    validate_only: bool,

    /// Override the configured log level
    #[arg(long, value_parser = ["trace", "debug", "info", "warn", "error"])]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", logging::startup_error_line(&err.to_string()));
            return ExitCode::FAILURE;
        }
    };

    let level = cli
        .log_level
        .as_deref()
        .unwrap_or(&config.server.log_level);
    logging::init(level);

    info!(
        category = logging::CATEGORY_CONFIG,
        path = %cli.config.display(),
        "Configuration loaded and validated"
    );

    if cli.validate_only {
        return ExitCode::SUCCESS;
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.workers)
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(
                category = logging::CATEGORY_SERVER,
                error = %err,
                "Failed to build async runtime"
            );
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = runtime.block_on(server::run(config)) {
        error!(
            category = logging::CATEGORY_SERVER,
            error = %err,
            "Server terminated with error"
        );
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
