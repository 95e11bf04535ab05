//! survey-server library - HTTP front-end for the music recommendation survey
//!
//! Serves the step table, the terms gate and step/survey submission on top of
//! `survey-common`. Participant answers stay on the client between steps; the
//! server validates them and stores completed surveys.

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use survey_common::catalog::PlaylistCatalog;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;

pub use error::{ApiError, ApiResult};

/// Playlist catalog compiled into the binary, used when none is configured
pub const BUILTIN_CATALOG: &str = include_str!("../data/playlists.toml");

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Submission database
    pub db: SqlitePool,
    /// Playlists shown on swipe steps
    pub catalog: Arc<PlaylistCatalog>,
    /// Mark cookies `Secure`
    pub secure_cookies: bool,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, catalog: PlaylistCatalog, secure_cookies: bool) -> Self {
        Self {
            db,
            catalog: Arc::new(catalog),
            secure_cookies,
        }
    }
}

/// Build application router
///
/// Survey routes sit behind the terms gate; health, the step table and the
/// terms endpoints are public.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    // Protected routes (require accepted terms)
    let protected = Router::new()
        .route("/api/session", get(api::get_session))
        .route("/api/playlists/:major/:sub", get(api::get_playlist))
        .route("/api/steps/submit", post(api::submit_step))
        .route("/api/survey/submit", post(api::submit_survey))
        .layer(middleware::from_fn(api::terms_gate));

    // Public routes
    let public = Router::new()
        .route("/api/steps", get(api::list_steps))
        .route("/api/terms/accept", post(api::accept_terms))
        .route("/api/terms/reset", post(api::reset_terms))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
