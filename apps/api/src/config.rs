use anyhow::{anyhow, Context, Result};

/// Application configuration loaded from environment variables.
/// Fails fast at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub functions_url: String,
    pub functions_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub mass_apply_pool_size: usize,
    pub mass_apply_batch_size: usize,
    pub mass_apply_batch_pause_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            functions_url: require_env("FUNCTIONS_URL")?,
            functions_api_key: require_env("FUNCTIONS_API_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            mass_apply_pool_size: parse_env("MASS_APPLY_POOL_SIZE", default_pool_size())?,
            mass_apply_batch_size: parse_env("MASS_APPLY_BATCH_SIZE", 5)?,
            mass_apply_batch_pause_ms: parse_env("MASS_APPLY_BATCH_PAUSE_MS", 1000)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|_| anyhow!("Environment variable '{key}' must be a valid number")),
        Err(_) => Ok(default),
    }
}

/// Default worker-pool size: one worker per available core.
fn default_pool_size() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
