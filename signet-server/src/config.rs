//! Runtime configuration assembled from the environment, with CLI
//! overrides applied in `main`.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// Environment variable naming the supervisor status pipe.
pub const STATUS_PIPE_ENV: &str = "SIGNET_STATUS_PIPE";

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. Absence is tolerated: the server comes
    /// up degraded and reports unhealthy until one is provided.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    /// Exact origins allowed by CORS; empty means permissive.
    pub allowed_origins: Vec<String>,
    /// Supervisor status pipe, written during store bring-up.
    pub status_pipe: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            host: "0.0.0.0".to_string(),
            port: 3000,
            db_max_connections: 5,
            db_acquire_timeout: Duration::from_secs(3),
            allowed_origins: Vec::new(),
            status_pipe: None,
        }
    }
}

impl Config {
    /// Read configuration from the environment. Unparseable numeric
    /// values fall back to their defaults with a warning rather than
    /// aborting startup.
    pub fn from_env() -> Self {
        let mut config = Config::default();
        if let Ok(url) = env::var("DATABASE_URL") {
            config.database_url = Some(url);
        }
        if let Ok(host) = env::var("SERVER_HOST") {
            config.host = host;
        }
        config.port = parse_env("SERVER_PORT", config.port);
        config.db_max_connections = parse_env("DB_MAX_CONNECTIONS", config.db_max_connections);
        config.db_acquire_timeout = Duration::from_secs(parse_env("DB_ACQUIRE_TIMEOUT_SECS", 3));
        if let Ok(raw) = env::var("ALLOWED_ORIGINS") {
            config.allowed_origins = parse_origin_list(&raw);
        }
        config.status_pipe = env::var_os(STATUS_PIPE_ENV).map(PathBuf::from);
        config
    }
}

/// Split a comma-separated origin list, dropping empties.
fn parse_origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}

fn parse_env<T>(name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(name) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(err) => {
                warn!("ignoring unparseable {name}={raw}: {err}");
                default
            }
        },
        Err(_) => default,
    }
}
