//! Application scoring via the score-application function.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::functions::{FunctionsClient, SCORE_APPLICATION};
use crate::models::resume::ParsedResume;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScoreApplicationRequest<'a> {
    job_analysis: &'a Value,
    resume_data: &'a ParsedResume,
}

/// Verdict returned by the scoring service. A response missing any of
/// these fields is malformed and fails the scoring stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreReport {
    /// 0 – 100
    pub overall_score: f64,
    /// Per-criterion detail following the job's rubric; stored verbatim.
    pub scoring_breakdown: Value,
    pub analysis: ScoreAnalysis,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreAnalysis {
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
}

/// Scoring collaborator: judges extracted resume data against a job's
/// stored analysis.
#[async_trait]
pub trait ApplicationScorer: Send + Sync {
    async fn score(&self, job_analysis: &Value, resume: &ParsedResume)
        -> anyhow::Result<ScoreReport>;
}

/// Production scorer backed by the score-application function.
pub struct HttpApplicationScorer {
    functions: FunctionsClient,
}

impl HttpApplicationScorer {
    pub fn new(functions: FunctionsClient) -> Self {
        Self { functions }
    }
}

#[async_trait]
impl ApplicationScorer for HttpApplicationScorer {
    async fn score(
        &self,
        job_analysis: &Value,
        resume: &ParsedResume,
    ) -> anyhow::Result<ScoreReport> {
        let report: ScoreReport = self
            .functions
            .invoke(
                SCORE_APPLICATION,
                &ScoreApplicationRequest {
                    job_analysis,
                    resume_data: resume,
                },
            )
            .await?;

        Ok(report)
    }
}
