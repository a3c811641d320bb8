use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod engine;
mod engines;
mod error;
mod extractors;
mod loader;
mod ocr;
mod preprocessing;
mod server;
mod session;
mod sessions;

#[derive(Parser, Debug)]
#[command(name = "ocr-workbench")]
#[command(about = "Interactive image-to-text server with configurable preprocessing")]
#[command(version)]
pub struct Args {
    /// Host address to bind to
    #[arg(long, env = "OCR_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "OCR_PORT", default_value = "9292")]
    pub port: u16,

    /// OCR backend to use
    #[arg(long, env = "OCR_ENGINE", value_enum, default_value_t = engines::EngineKind::Tesseract)]
    pub engine: engines::EngineKind,

    /// Path or name of the tesseract executable
    #[arg(long, env = "TESSERACT_CMD", default_value = "tesseract")]
    pub tesseract_cmd: PathBuf,

    /// Language for OCR (e.g., "eng", "deu", "eng+fra")
    #[arg(long, env = "OCR_LANGUAGE", default_value = "eng")]
    pub language: String,

    /// Path to tessdata directory (uses TESSDATA_PREFIX env var if not set)
    #[arg(long, env = "TESSDATA_PREFIX")]
    pub tessdata_path: Option<PathBuf>,

    /// Seconds the engine may spend on one extraction (0 = no limit)
    #[arg(long, env = "OCR_TIMEOUT_SECS", default_value = "60")]
    pub timeout_secs: u64,

    /// Maximum file size in bytes (default: 50MB)
    #[arg(long, env = "OCR_MAX_FILE_SIZE", default_value = "52428800")]
    pub max_file_size: usize,

    /// Seconds of inactivity after which a session is dropped
    #[arg(long, env = "OCR_SESSION_TTL_SECS", default_value = "1800")]
    pub session_ttl_secs: u64,

    /// Maximum number of concurrently open sessions
    #[arg(long, env = "OCR_MAX_SESSIONS", default_value = "256")]
    pub max_sessions: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from(args);

    tracing::info!("Starting ocr-workbench v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Binding to {}:{}", config.host, config.port);

    server::run(config).await
}
