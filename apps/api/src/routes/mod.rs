pub mod health;

use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{get, post},
    Router,
};

use crate::applications;
use crate::jobs;
use crate::mass_apply;
use crate::state::AppState;

/// Room for a full run of 100 resumes in one multipart body.
const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Jobs API
        .route(
            "/api/v1/jobs",
            post(jobs::handlers::create_job).get(jobs::handlers::list_jobs),
        )
        .route(
            "/api/v1/jobs/:id/applications",
            get(jobs::handlers::list_job_applications),
        )
        // Applications API
        .route("/api/v1/applications", post(applications::handlers::apply))
        // Mass apply API
        .route(
            "/api/v1/mass-apply",
            post(mass_apply::handlers::run_mass_apply),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
