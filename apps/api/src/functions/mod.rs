/// Functions client: the single point of entry for all remote function calls.
///
/// ARCHITECTURAL RULE: No other module may call the functions service
/// directly. Resume extraction, application scoring, and job analysis all
/// go through this module.
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod analysis;
pub mod extraction;
pub mod scoring;

/// Extracts structured data from a stored resume.
pub const PARSE_RESUME: &str = "parse-resume";
/// Scores extracted resume data against a job's stored analysis.
pub const SCORE_APPLICATION: &str = "score-application";
/// Analyzes a job posting; the result is stored on the job row.
pub const ANALYZE_JOB: &str = "analyze-job";

const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum FunctionsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Function '{function}' failed (status {status}): {message}")]
    Api {
        function: String,
        status: u16,
        message: String,
    },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Function '{function}' still failing after {retries} attempts")]
    RetriesExhausted { function: String, retries: u32 },
}

#[derive(Debug, Deserialize)]
struct FunctionErrorBody {
    error: String,
}

/// The single functions client used by all services.
/// Wraps the functions gateway with retry logic and typed JSON decoding.
#[derive(Clone)]
pub struct FunctionsClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl FunctionsClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Invokes a named function with a JSON body and decodes the JSON
    /// response. Retries on 429 (rate limit) and 5xx errors with
    /// exponential backoff.
    pub async fn invoke<B, T>(&self, function: &str, body: &B) -> Result<T, FunctionsError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, function);
        let mut last_error: Option<FunctionsError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Function '{function}' attempt {attempt} failed, retrying after {}ms...",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .header("authorization", format!("Bearer {}", self.api_key))
                .header("content-type", "application/json")
                .json(body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(FunctionsError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Function '{function}' returned {status}: {body}");
                last_error = Some(FunctionsError::Api {
                    function: function.to_string(),
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(FunctionsError::Api {
                    function: function.to_string(),
                    status: status.as_u16(),
                    message: error_message(body),
                });
            }

            let body = response.text().await?;
            let decoded: T = serde_json::from_str(&body)?;

            debug!("Function '{function}' call succeeded");
            return Ok(decoded);
        }

        Err(last_error.unwrap_or(FunctionsError::RetriesExhausted {
            function: function.to_string(),
            retries: MAX_RETRIES,
        }))
    }
}

/// Pulls a readable message out of a function error body, which is usually
/// `{"error": "..."}` but may be arbitrary text.
fn error_message(body: String) -> String {
    serde_json::from_str::<FunctionErrorBody>(&body)
        .map(|e| e.error)
        .unwrap_or(body)
}
