use std::io;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer};

use job_advert_logger::api::advert::AdvertService;
use job_advert_logger::cli::{self, Cli};
use job_advert_logger::config::Config;
use job_advert_logger::db::RecordStore;
use job_advert_logger::instance::{InstanceError, InstanceGuard};

fn init_logging(log_dir: &Path) -> io::Result<()> {
    // Create logs directory if it doesn't exist
    std::fs::create_dir_all(log_dir)?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    // Log files are created as: logs/info.log.2024-12-22, logs/error.log.2024-12-22
    let info_file = tracing_appender::rolling::daily(log_dir, "info.log");
    let error_file = tracing_appender::rolling::daily(log_dir, "error.log");

    let info_layer = tracing_subscriber::fmt::layer()
        .with_writer(info_file)
        .with_ansi(false)
        .with_filter(LevelFilter::INFO);

    let error_layer = tracing_subscriber::fmt::layer()
        .with_writer(error_file)
        .with_ansi(false)
        .with_filter(LevelFilter::ERROR);

    // Terminal output goes to stderr so command output on stdout stays clean
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_filter(LevelFilter::WARN);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(info_layer)
        .with(error_layer)
        .init();

    Ok(())
}

fn main() -> ExitCode {
    let args = Cli::parse();
    let config = Config::from_env();

    if let Err(e) = init_logging(&config.log_dir) {
        eprintln!("Failed to initialise logging in {}: {}", config.log_dir.display(), e);
        return ExitCode::FAILURE;
    }

    info!("Starting job-advert-logger");
    info!("  - Data file: {}", config.data_file.display());
    info!("  - Lock file: {}", config.lock_file.display());

    // Nothing is loaded unless this process is the only instance
    let guard = match InstanceGuard::acquire(&config.lock_file) {
        Ok(guard) => guard,
        Err(InstanceError::AlreadyRunning(path)) => {
            error!("Another instance holds {}", path.display());
            eprintln!("Another instance is running in the same directory\nExit.");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut service = AdvertService::new(RecordStore::open(&config.data_file));
    info!("Loaded {} job adverts", service.store().len());

    let result = cli::execute(args.command, &mut service, &mut io::stdout().lock());

    if let Err(e) = guard.release() {
        error!("{}", e);
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => cli::report(&e),
    }
}
