use std::path::PathBuf;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Maximum number of queued (not yet started) jobs.
    pub queue_capacity: usize,
    /// Root directory for uploads and toolbox outputs.
    pub storage_path: PathBuf,
    /// Path to the WhisperX runner binary.
    pub whisperx_bin: PathBuf,
    /// Age threshold for the retention sweep, in hours.
    pub retention_hours: u64,
    /// Built frontend directory to serve statically, if present.
    pub frontend_dist: Option<PathBuf>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `QUEUE_CAPACITY`       | `8`                        |
    /// | `STORAGE_PATH`         | `/tmp/murmur`              |
    /// | `WHISPERX_BIN`         | `whisperx-runner`          |
    /// | `RETENTION_HOURS`      | `24`                       |
    /// | `FRONTEND_DIST`        | unset (no static serving)  |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let queue_capacity: usize = std::env::var("QUEUE_CAPACITY")
            .unwrap_or_else(|_| "8".into())
            .parse()
            .expect("QUEUE_CAPACITY must be a valid usize");

        let storage_path =
            PathBuf::from(std::env::var("STORAGE_PATH").unwrap_or_else(|_| "/tmp/murmur".into()));

        let whisperx_bin = PathBuf::from(
            std::env::var("WHISPERX_BIN").unwrap_or_else(|_| "whisperx-runner".into()),
        );

        let retention_hours: u64 = std::env::var("RETENTION_HOURS")
            .unwrap_or_else(|_| "24".into())
            .parse()
            .expect("RETENTION_HOURS must be a valid u64");

        let frontend_dist = std::env::var("FRONTEND_DIST").ok().map(PathBuf::from);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            queue_capacity,
            storage_path,
            whisperx_bin,
            retention_hours,
            frontend_dist,
        }
    }
}
