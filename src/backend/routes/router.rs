/**
 * Router Configuration
 *
 * Combines the API routes with operational endpoints, static media and the
 * middleware stack into one Axum router.
 */

use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::backend::error::BackendError;
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;
use crate::backend::store::Repositories;

/// GET /api/health
async fn health(State(repos): State<Repositories>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "database": repos.backend(),
    }))
}

/// GET /api
async fn banner() -> Json<serde_json::Value> {
    Json(json!({
        "name": "spamit API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/api/auth",
            "/api/users",
            "/api/groups",
            "/api/posts",
            "/api/notifications",
            "/api/health",
        ],
    }))
}

/// JSON 404 under `/api`, plain text elsewhere
async fn fallback(uri: Uri) -> Response {
    if uri.path().starts_with("/api") {
        BackendError::not_found("Endpoint").into_response()
    } else {
        (StatusCode::NOT_FOUND, "404 Not Found").into_response()
    }
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new()
        .route("/api/health", get(health))
        .route("/api", get(banner));

    // Add API routes
    let router = configure_api_routes(router);

    // Uploaded media
    let router = router.nest_service("/uploads", ServeDir::new(&app_state.config.upload_dir));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    // Trace wraps CORS so preflight responses are logged too
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    router
        .fallback(fallback)
        .layer(middleware)
        .with_state(app_state)
}
