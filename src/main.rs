use anyhow::{Context, Result};
use clap::Parser;
use recruiter_assistant::{core::ConfigManager, start_web_server};
use std::fs::OpenOptions;
use std::path::PathBuf;
use tracing::info;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "recruiter_assistant=info,rocket::server=off";

/// Recruiter search assistant: settings popup, page adapter and LLM
/// orchestration served over HTTP.
#[derive(Parser)]
#[command(name = "recruiter-assistant", version)]
struct Args {
    /// Port to listen on (defaults to ROCKET_PORT, then 8000)
    #[arg(long)]
    port: Option<u16>,

    /// JSON file holding the persisted plugin settings
    #[arg(long)]
    store_path: Option<PathBuf>,

    /// TOML file overriding the page selector chains
    #[arg(long)]
    selectors: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, env = "ASSISTANT_JSON_LOGS")]
    json_logs: bool,

    /// Write JSON logs to this file instead of stdout, truncating it on startup
    #[arg(long, env = "ASSISTANT_LOG_FILE")]
    log_file: Option<PathBuf>,
}

fn init_logging(args: &Args) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    match &args.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(file)
                        .with_current_span(false)
                        .with_span_list(false),
                )
                .init();
        }
        None if args.json_logs => registry.with(fmt::layer().json()).init(),
        None => registry.with(fmt::layer()).init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let mut settings = ConfigManager::load()?;
    if let Some(port) = args.port {
        settings.port = port;
    }
    if let Some(store_path) = args.store_path {
        settings.store_path = store_path;
    }
    if let Some(selectors) = args.selectors {
        settings.selectors_path = Some(selectors);
    }

    info!("Settings store: {}", settings.store_path.display());
    info!(
        "Host pages: {}{}",
        settings.host.domain, settings.host.path
    );
    info!("Server: http://0.0.0.0:{}", settings.port);

    start_web_server(settings).await
}
