//! HTTP routes over the core [`Database`].

mod error;
mod health;
mod issues;
mod logging;
mod projects;
mod resolutions;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, patch, post};
use axum::Router;
use issue_tracker_core::Database;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::upload::ImageHost;

pub use error::ApiError;

/// Largest issue submission accepted, sized to ImgBB's 32 MB image cap.
pub const MAX_ISSUE_BODY_BYTES: usize = 32 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub images: Arc<dyn ImageHost>,
}

pub fn create_router(db: Database, images: Arc<dyn ImageHost>) -> Router {
    let state = AppState { db, images };

    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/projects/{project_id}",
            get(projects::get_project).patch(projects::update_project),
        )
        .route(
            "/projects/{project_id}/achievements",
            patch(projects::add_achievement),
        )
        .route(
            "/issues",
            get(issues::list_issues)
                .post(issues::create_issue)
                .layer(DefaultBodyLimit::max(MAX_ISSUE_BODY_BYTES)),
        )
        .route("/issues/search", get(issues::search_issues))
        .route("/issues/{issue_id}", get(issues::get_issue))
        .route(
            "/issues/{issue_id}/resolutions",
            get(resolutions::list_resolutions),
        )
        .route("/resolutions", post(resolutions::add_resolution))
        .layer(middleware::from_fn(logging::log_requests))
        .layer(CatchPanicLayer::custom(error::handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
