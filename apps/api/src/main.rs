mod applications;
mod auth;
mod config;
mod db;
mod errors;
mod functions;
mod jobs;
mod mass_apply;
mod models;
mod routes;
mod state;
mod storage;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::functions::analysis::PgJobAnalyses;
use crate::functions::extraction::HttpResumeParser;
use crate::functions::scoring::HttpApplicationScorer;
use crate::functions::FunctionsClient;
use crate::mass_apply::processor::ResumePipeline;
use crate::mass_apply::sink::PgApplicationSink;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::S3ResumeStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Arc::new(Config::from_env()?);

    // Initialize structured logging. Tracing targets carry the crate name
    // of the compiled binary, not the package name.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Hireloop API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized");

    // Initialize the functions client shared by extraction, scoring and analysis
    let functions = FunctionsClient::new(
        config.functions_url.clone(),
        config.functions_api_key.clone(),
    );
    info!("Functions client initialized");

    // Wire the per-resume pipeline: S3 store, remote extraction and
    // scoring, stored-analysis lookup in Postgres.
    let store = Arc::new(S3ResumeStore::new(
        s3,
        config.s3_bucket.clone(),
        config.s3_endpoint.clone(),
    ));
    let processor = Arc::new(ResumePipeline::new(
        store,
        Arc::new(HttpResumeParser::new(functions.clone())),
        Arc::new(HttpApplicationScorer::new(functions.clone())),
        Arc::new(PgJobAnalyses::new(db.clone())),
    ));
    let sink = Arc::new(PgApplicationSink::new(db.clone()));

    // Build app state
    let state = AppState {
        db,
        functions: Arc::new(functions),
        config: Arc::clone(&config),
        processor,
        sink,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "hireloop-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
