use crate::engines::EngineKind;
use crate::Args;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub engine: EngineKind,
    pub tesseract_cmd: PathBuf,
    pub language: String,
    pub tessdata_path: Option<PathBuf>,
    /// Engine time budget per extraction; `None` means unbounded
    pub timeout: Option<Duration>,
    pub max_file_size: usize,
    pub session_ttl: Duration,
    pub max_sessions: usize,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            engine: args.engine,
            tesseract_cmd: args.tesseract_cmd,
            language: args.language,
            tessdata_path: args.tessdata_path,
            timeout: (args.timeout_secs > 0).then(|| Duration::from_secs(args.timeout_secs)),
            max_file_size: args.max_file_size,
            session_ttl: Duration::from_secs(args.session_ttl_secs),
            max_sessions: args.max_sessions,
        }
    }
}

#[cfg(test)]
impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9292,
            engine: EngineKind::Tesseract,
            tesseract_cmd: PathBuf::from("tesseract"),
            language: "eng".to_string(),
            tessdata_path: None,
            timeout: Some(Duration::from_secs(60)),
            max_file_size: 52_428_800,
            session_ttl: Duration::from_secs(1800),
            max_sessions: 256,
        }
    }
}
