//! Per-resume processing pipeline.
//!
//! Turning one uploaded resume into an application row takes four remote
//! steps, strictly in order: store the file, extract structured data from
//! it, fetch the target job's stored analysis, and score the extraction
//! against that analysis. The first failing step fails the whole resume
//! with an error naming the step; other resumes are unaffected.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::functions::analysis::JobAnalyses;
use crate::functions::extraction::ResumeParser;
use crate::functions::scoring::ApplicationScorer;
use crate::models::application::{ApplicationStatus, NewApplication};
use crate::storage::{resume_key, ResumeStore};

/// One uploaded file.
#[derive(Debug, Clone)]
pub struct ResumeFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// One unit of work: a file plus the identity and target job it belongs
/// to. Immutable once submitted.
#[derive(Debug, Clone)]
pub struct ResumeSubmission {
    pub file: ResumeFile,
    pub applicant_id: Uuid,
    pub job_id: Uuid,
}

/// Failure of exactly one resume, naming the step that failed.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("storage failed: {0}")]
    Storage(String),

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("job analysis lookup failed: {0}")]
    AnalysisLookup(String),

    #[error("job {0} has no analysis on record")]
    AnalysisMissing(Uuid),

    #[error("scoring failed: {0}")]
    Scoring(String),

    #[error("worker pool failed: {0}")]
    Pool(String),
}

/// Processes one submission into an application ready to persist.
/// Implementations run concurrently across submissions.
#[async_trait]
pub trait ApplicationProcessor: Send + Sync {
    async fn process(&self, submission: ResumeSubmission) -> Result<NewApplication, ProcessError>;
}

/// The production processor: S3 store, remote extraction and scoring,
/// analysis lookup in Postgres. All collaborators are fixed at startup.
pub struct ResumePipeline {
    store: Arc<dyn ResumeStore>,
    parser: Arc<dyn ResumeParser>,
    scorer: Arc<dyn ApplicationScorer>,
    analyses: Arc<dyn JobAnalyses>,
}

impl ResumePipeline {
    pub fn new(
        store: Arc<dyn ResumeStore>,
        parser: Arc<dyn ResumeParser>,
        scorer: Arc<dyn ApplicationScorer>,
        analyses: Arc<dyn JobAnalyses>,
    ) -> Self {
        Self {
            store,
            parser,
            scorer,
            analyses,
        }
    }
}

#[async_trait]
impl ApplicationProcessor for ResumePipeline {
    async fn process(&self, submission: ResumeSubmission) -> Result<NewApplication, ProcessError> {
        let ResumeSubmission {
            file,
            applicant_id,
            job_id,
        } = submission;

        let key = resume_key(applicant_id, &file.file_name);
        self.store
            .upload(&key, file.bytes, &file.content_type)
            .await
            .map_err(|e| ProcessError::Storage(e.to_string()))?;
        let resume_url = self.store.public_url(&key);
        debug!(%key, "resume stored");

        let parsed = self
            .parser
            .parse(&resume_url)
            .await
            .map_err(|e| ProcessError::Extraction(e.to_string()))?;

        let analysis = self
            .analyses
            .analysis_for(job_id)
            .await
            .map_err(|e| ProcessError::AnalysisLookup(e.to_string()))?
            .ok_or(ProcessError::AnalysisMissing(job_id))?;

        let report = self
            .scorer
            .score(&analysis, &parsed)
            .await
            .map_err(|e| ProcessError::Scoring(e.to_string()))?;

        Ok(NewApplication {
            job_id,
            applicant_id,
            resume_url,
            status: ApplicationStatus::Pending,
            parsed_data: parsed,
            score: report.overall_score,
            scoring_breakdown: report.scoring_breakdown,
            strengths: report.analysis.strengths,
            gaps: report.analysis.gaps,
            recommendation: report.recommendation,
        })
    }
}
