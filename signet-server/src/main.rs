//! Server binary: configuration, store bring-up and serving.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use signet_core::repo::postgres::PostgresUsersRepository;
use signet_core::{Health, UserDirectory, UsersRepository};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use signet_server::config::Config;
use signet_server::routes;
use signet_server::state::AppState;
use signet_server::supervisor::{self, StoreSignal};

/// Placeholder pool target used when no database is configured: the store
/// handle must always exist, it just never answers.
const UNREACHABLE_DATABASE_URL: &str = "postgres://127.0.0.1:1/signet";

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "signet-server")]
#[command(about = "Account directory service with embedded sign-on support")]
struct Cli {
    /// Server port (overrides environment)
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Server host (overrides environment)
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,

    /// PostgreSQL connection string (overrides environment)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_file_loaded = dotenvy::dotenv().is_ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            // Override via RUST_LOG.
            "info,tower_http=warn".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if env_file_loaded {
        info!("loaded .env file");
    }

    let mut config = Config::from_env();
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(database_url) = cli.database_url {
        config.database_url = Some(database_url);
    }

    run_server(config).await
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    let config = Arc::new(config);
    let health = Health::new();

    let database_url = match config.database_url.clone() {
        Some(url)
            if url.starts_with("postgres://") || url.starts_with("postgresql://") =>
        {
            url
        }
        Some(_) => {
            error!("Only PostgreSQL database URLs are supported");
            anyhow::bail!("Invalid database URL: must start with postgres:// or postgresql://");
        }
        None => {
            warn!("DATABASE_URL not set; serving degraded until one is provided");
            UNREACHABLE_DATABASE_URL.to_string()
        }
    };

    let repo = PostgresUsersRepository::connect_lazy(
        &database_url,
        config.db_max_connections,
        config.db_acquire_timeout,
    )
    .context("failed to build connection pool")?;

    bring_up_store(&repo, &health, &config).await;

    let repo: Arc<dyn UsersRepository> = Arc::new(repo);
    let state = AppState::new(UserDirectory::new(repo), health, Arc::clone(&config));
    let app = routes::create_app(state);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?;
    info!(
        "Starting Signet account service on {}:{}",
        config.host, config.port
    );
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

/// Attempt connectivity and schema sync, record the outcome, and tell the
/// supervisor. A failure leaves the process running degraded: the health
/// gate answers 503 until the store comes back.
async fn bring_up_store(repo: &PostgresUsersRepository, health: &Health, config: &Config) {
    match connect_and_migrate(repo).await {
        Ok(()) => {
            info!("Successfully connected to PostgreSQL");
            health.mark_connected();
            if let Some(pipe) = &config.status_pipe {
                supervisor::notify(pipe, StoreSignal::Started);
            }
        }
        Err(err) => {
            error!(error = %err, "PostgreSQL bring-up failed; serving degraded");
            health.mark_disconnected(err.to_string());
            if let Some(pipe) = &config.status_pipe {
                supervisor::notify(pipe, StoreSignal::NoConnection);
            }
        }
    }
}

async fn connect_and_migrate(repo: &PostgresUsersRepository) -> signet_core::Result<()> {
    repo.ping().await?;
    repo.migrate().await
}
