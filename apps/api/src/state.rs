use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::functions::FunctionsClient;
use crate::mass_apply::processor::ApplicationProcessor;
use crate::mass_apply::sink::ApplicationSink;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Client for the serverless function collaborators (parse, score, analyze).
    pub functions: Arc<FunctionsClient>,
    pub config: Arc<Config>,
    /// Per-resume pipeline run by the mass apply worker pool. Pluggable so
    /// the batch machinery can be driven without remote services.
    pub processor: Arc<dyn ApplicationProcessor>,
    /// Bulk persistence for processed applications.
    pub sink: Arc<dyn ApplicationSink>,
}
