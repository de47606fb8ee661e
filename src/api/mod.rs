pub mod errors;
pub mod models;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use dashmap::DashMap;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::KycConfig;
use crate::errors::KycError;
use crate::repository::Repository;
use models::CheckRun;

pub struct CheckHandle {
    pub run: Arc<RwLock<CheckRun>>,
    pub cancel_token: CancellationToken,
}

/// Finished check runs kept for polling before the oldest are evicted.
pub const DEFAULT_CHECK_RETENTION: usize = 32;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<RwLock<Repository>>,
    pub checks: Arc<DashMap<String, Arc<CheckHandle>>>,
    pub step_delay: Duration,
    pub check_retention: usize,
}

impl AppState {
    pub fn new(repo: Repository, step_delay: Duration) -> Self {
        Self {
            repo: Arc::new(RwLock::new(repo)),
            checks: Arc::new(DashMap::new()),
            step_delay,
            check_retention: DEFAULT_CHECK_RETENTION,
        }
    }

    pub fn with_check_retention(mut self, retention: usize) -> Self {
        self.check_retention = retention;
        self
    }
}

pub async fn create_app_state(config: &KycConfig) -> Result<AppState, KycError> {
    let repo = Repository::from_config(config).await?;
    Ok(AppState::new(repo, config.step_delay()))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(routes::health::health_check))
        .route("/api/issues", get(routes::issues::list_issues).post(routes::issues::create_issue))
        .route(
            "/api/issues/:id",
            get(routes::issues::get_issue)
                .patch(routes::issues::update_issue)
                .delete(routes::issues::delete_issue),
        )
        .route("/api/issues/:id/actions/:action", post(routes::issues::apply_action))
        .route("/api/categories", get(routes::statistics::get_categories))
        .route("/api/statistics", get(routes::statistics::get_statistics))
        .route("/api/stories", get(routes::stories::list_stories))
        .route("/api/stories/:id", get(routes::stories::get_story))
        .route("/api/stories/:id/issues", get(routes::stories::get_story_issues))
        .route("/api/stories/:id/support", get(routes::stories::get_story_support))
        .route("/api/companies", get(routes::companies::list_companies).post(routes::companies::create_company))
        .route(
            "/api/companies/:id",
            get(routes::companies::get_company)
                .patch(routes::companies::update_company)
                .delete(routes::companies::delete_company),
        )
        .route("/api/checks", post(routes::checks::start_check))
        .route("/api/checks/:id", get(routes::checks::get_check))
        .route("/api/checks/:id/stop", post(routes::checks::stop_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
