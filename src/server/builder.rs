//! Server wiring and the run_server entry point

use crate::auth::AuthSystem;
use crate::config::Config;
use crate::server::server::HttpServer;
use crate::storage;
use crate::utils::error::Result;
use tracing::info;

/// Connect storage, build the auth system, start its background tasks and
/// serve until shutdown
pub async fn run_server(config: Config) -> Result<()> {
    info!("Starting greenlight-rs {}", crate::VERSION);
    config.validate()?;

    let store = storage::connect(&config.storage).await?;
    let auth = AuthSystem::new(&config.auth, &config.rate_limit, store);

    let tasks = auth.start_background_tasks();
    info!(tasks = tasks.len(), "background tasks started");

    let server = HttpServer::new(&config, auth);
    info!("Server starting at: http://{}", config.server.address());
    let result = server.start().await;

    for task in tasks {
        task.abort();
    }
    result
}
