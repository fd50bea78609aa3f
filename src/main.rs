//! Shelf labeler entry point.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use shelf_labeler::api::HttpBackend;
use shelf_labeler::config::{AppConfig, LogLevel};
use shelf_labeler::LabelerApp;

/// Label products on shelf photos with a clustering backend.
#[derive(Parser, Debug)]
#[command(name = "shelf-labeler", version, about)]
struct Args {
    /// Backend base URL (overrides the config file)
    #[arg(long, env = "SHELF_LABELER_SERVER")]
    server: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level: error, warn, info, debug or trace
    #[arg(long, value_parser = parse_log_level)]
    log_level: Option<LogLevel>,

    /// Shelf image to preselect
    image: Option<PathBuf>,
}

fn parse_log_level(s: &str) -> Result<LogLevel, String> {
    LogLevel::parse(s).ok_or_else(|| format!("unknown log level `{s}`"))
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config_result = match &args.config {
        Some(path) => AppConfig::load(path).map(Some),
        None => Ok(AppConfig::load_from_default_path()),
    };
    let (mut config, config_error) = match config_result {
        Ok(config) => (config.unwrap_or_default(), None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    if let Some(level) = args.log_level {
        config.preferences.log_level = level;
    }
    env_logger::Builder::new()
        .filter_level(config.preferences.log_level.to_level_filter())
        .parse_default_env()
        .init();

    if let Some(e) = config_error {
        log::error!("Failed to load config: {}", e);
        eprintln!("Config error: {e}");
        return ExitCode::FAILURE;
    }
    if let (None, Some(path)) = (&args.config, AppConfig::default_path()) {
        match AppConfig::create_if_missing(&path) {
            Ok(true) => log::info!("Wrote default configuration to {:?}", path),
            Ok(false) => {}
            Err(e) => log::warn!("Could not write default config {:?}: {}", path, e),
        }
    }
    if let Some(server) = args.server {
        config.server.base_url = server;
    }

    let backend = match HttpBackend::new(&config.server.base_url, config.server.timeout()) {
        Ok(backend) => backend,
        Err(e) => {
            log::error!("Failed to create HTTP client: {}", e);
            eprintln!("Application error: {e}");
            return ExitCode::FAILURE;
        }
    };
    log::info!("Using backend at {}", backend.base_url());

    let mut app = LabelerApp::stdout(config, Arc::new(backend));
    if let Some(image) = args.image {
        app.select_file(image);
    }

    match app.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Application error: {}", e);
            eprintln!("Application error: {e}");
            ExitCode::FAILURE
        }
    }
}
