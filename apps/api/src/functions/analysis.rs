//! Job analysis: the analyze-job function call made at posting time, and
//! the stored-analysis lookup the scoring stage depends on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::functions::{FunctionsClient, FunctionsError, ANALYZE_JOB};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeJobRequest<'a> {
    job_data: &'a Value,
}

#[derive(Debug, Deserialize)]
struct AnalyzeJobResponse {
    analysis: Value,
}

/// Sends the posting payload to the analyze-job function and returns the
/// analysis object to store on the job row. The object's internals belong
/// to the scoring service; this side treats it as opaque JSON.
pub async fn analyze_job(
    functions: &FunctionsClient,
    job_data: &Value,
) -> Result<Value, FunctionsError> {
    let response: AnalyzeJobResponse = functions
        .invoke(ANALYZE_JOB, &AnalyzeJobRequest { job_data })
        .await?;

    Ok(response.analysis)
}

/// Stored-analysis lookup: a resume can only be scored against a job whose
/// posting has been analyzed.
#[async_trait]
pub trait JobAnalyses: Send + Sync {
    /// Returns the stored analysis for a job, or `None` when the job is
    /// unknown or was never analyzed.
    async fn analysis_for(&self, job_id: Uuid) -> anyhow::Result<Option<Value>>;
}

/// Postgres-backed lookup against the jobs table.
pub struct PgJobAnalyses {
    pool: PgPool,
}

impl PgJobAnalyses {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobAnalyses for PgJobAnalyses {
    async fn analysis_for(&self, job_id: Uuid) -> anyhow::Result<Option<Value>> {
        // Outer Option: row exists; inner Option: ai_analysis is non-null.
        let analysis: Option<Option<Value>> =
            sqlx::query_scalar("SELECT ai_analysis FROM jobs WHERE id = $1")
                .bind(job_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(analysis.flatten())
    }
}
