//! Multi-user task tracker: projects with members, tasks assigned to members,
//! and per-task journals.
//!
//! The library exposes the router and its building blocks so the binary and
//! the integration tests assemble the exact same application.

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod views;

use axum::{middleware as axum_middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::{clock::Clock, config::Config, db::Database, error::AppError};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub clock: Clock,
}

pub fn app(state: AppState) -> Router {
    // Everything except account pages requires a session
    let protected_routes = Router::new()
        .route("/", get(routes::home))
        .nest("/projects", routes::projects::router())
        .nest("/task", routes::tasks::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_session,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(routes::auth::router())
        .merge(protected_routes)
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn health_check() -> &'static str {
    "OK"
}

async fn not_found() -> AppError {
    AppError::NotFound("Not found".to_string())
}
