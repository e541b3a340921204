use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

use super::{handlers, items, jobs, middleware::metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Stored media, by file name
    let downloads = ServeDir::new(state.feed().media_dir());

    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Download jobs
        .route("/jobs", get(jobs::list_jobs))
        .route("/jobs", post(jobs::create_job))
        .route("/jobs/{item_id}", get(jobs::get_job))
        .route("/jobs/{item_id}/retry", post(jobs::retry_job))
        // Feed items
        .route("/items", get(items::list_items))
        .route("/items", post(items::create_item))
        .route("/items/{id}", patch(items::update_item))
        .route("/items/{id}", delete(items::delete_item))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .nest_service("/downloads", downloads)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
