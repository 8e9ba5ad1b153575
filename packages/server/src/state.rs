use std::sync::Arc;

use common::storage::BlobStore;
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::problems::ProblemService;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub problems: ProblemService,
    pub blobs: Arc<dyn BlobStore>,
    /// Cancelled once the server starts shutting down.
    pub shutdown: CancellationToken,
}
