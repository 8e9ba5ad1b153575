use std::sync::Arc;

use anyhow::Context;
use common::storage::FilesystemBlobStore;
use judge::{Judge0Client, ValidationEngine};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use enlighten_server::config::AppConfig;
use enlighten_server::problems::{ProblemService, SeaOrmProblemStore};
use enlighten_server::state::AppState;
use enlighten_server::{build_router, database, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = database::init_db(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    seed::seed_role_permissions(&db)
        .await
        .context("Failed to seed roles")?;

    let blobs = FilesystemBlobStore::new(
        config.storage.avatar_dir.clone(),
        config.storage.max_avatar_bytes,
    )
    .await
    .context("Failed to prepare avatar storage")?;

    let judge = Judge0Client::new(&config.judge).context("Failed to build judge client")?;
    info!(base_url = %config.judge.base_url, "Using judge");
    let engine = ValidationEngine::new(Arc::new(judge), &config.judge);
    let problems = ProblemService::new(
        Arc::new(SeaOrmProblemStore::new(db.clone())),
        Arc::new(engine),
    );

    let shutdown = CancellationToken::new();
    let state = AppState {
        db,
        config: config.clone(),
        problems,
        blobs: Arc::new(blobs),
        shutdown: shutdown.clone(),
    };
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    let signal = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl-c");
            return;
        }
        info!("Shutdown signal received");
        signal.cancel();
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}
