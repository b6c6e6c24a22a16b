/**
 * Server Initialization
 *
 * # Initialization Process
 *
 * 1. Connect the database, or fall back to the in-memory store
 * 2. Build the external service adapters from configuration
 * 3. Assemble `AppState`, which starts the fan-out worker
 * 4. Create the router
 */

use axum::Router;

use crate::backend::routes::router::create_router;
use crate::backend::server::config::load_database;
use crate::backend::server::state::{AppState, ServiceHandles};
use crate::backend::store::Repositories;
use crate::shared::config::AppConfig;

/// Create and configure the Axum application
pub async fn create_app(config: AppConfig) -> Router<()> {
    tracing::info!("Initializing spamit backend server");

    let repos = match load_database(config.database_url.as_deref()).await {
        Some(pool) => Repositories::postgres(pool),
        None => Repositories::in_memory(),
    };
    tracing::info!("Using {} store", repos.backend());

    let services = ServiceHandles::from_config(&config);
    let (app_state, worker) = AppState::new(config, repos, services);

    // The worker only returns once every handle is dropped
    tokio::spawn(async move {
        if let Err(e) = worker.await {
            tracing::error!("Fan-out worker terminated abnormally: {}", e);
        }
    });

    let app = create_router(app_state);
    tracing::info!("Router configured");
    app
}
