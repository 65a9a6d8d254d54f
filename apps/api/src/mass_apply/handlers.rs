// HTTP surface for mass apply. Accepts a multipart upload of resumes
// plus a target job, runs the batch, and returns the final report.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use super::coordinator::{BatchReport, MassApplyConfig, MassApplyCoordinator, MassApplyRequest};
use super::processor::ResumeFile;
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::state::AppState;

const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Serialize)]
pub struct MassApplyResponse {
    pub message: String,
    pub report: BatchReport,
}

/// POST /api/v1/mass-apply
///
/// Multipart body: one `job_id` text field and any number of `resumes`
/// file fields, PDF only. The whole request is rejected before any
/// processing if a precondition fails.
pub async fn run_mass_apply(
    State(state): State<AppState>,
    CurrentUser(applicant_id): CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<MassApplyResponse>, AppError> {
    let mut job_id: Option<Uuid> = None;
    let mut files: Vec<ResumeFile> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart request: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("job_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Unreadable job_id field: {e}")))?;
                let parsed = text.trim().parse().map_err(|_| {
                    AppError::Validation("'job_id' must be a valid UUID".to_string())
                })?;
                job_id = Some(parsed);
            }
            Some("resumes") => {
                let file_name = field.file_name().unwrap_or("resume.pdf").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                if content_type != PDF_CONTENT_TYPE {
                    return Err(AppError::Validation(format!(
                        "Only PDF resumes are accepted, '{file_name}' is {content_type}"
                    )));
                }
                let bytes = field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read '{file_name}': {e}"))
                })?;
                files.push(ResumeFile {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            _ => {}
        }
    }

    let job_id =
        job_id.ok_or_else(|| AppError::Validation("A target job must be selected".to_string()))?;

    let job_exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM jobs WHERE id = $1 AND is_active = TRUE)",
    )
    .bind(job_id)
    .fetch_one(&state.db)
    .await?;
    if !job_exists {
        return Err(AppError::NotFound(format!("Job {job_id} not found")));
    }

    let coordinator = MassApplyCoordinator::new(
        Arc::clone(&state.processor),
        Arc::clone(&state.sink),
        MassApplyConfig::from_app_config(&state.config),
    );

    // Surface progress in the logs while the run is in flight.
    let mut progress_rx = coordinator.subscribe_progress();
    tokio::spawn(async move {
        while progress_rx.changed().await.is_ok() {
            let snapshot = *progress_rx.borrow_and_update();
            debug!(
                processed = snapshot.processed,
                total = snapshot.total,
                percent = snapshot.percent,
                "mass apply progress"
            );
        }
    });

    let report = coordinator
        .run(MassApplyRequest {
            job_id,
            applicant_id,
            files,
        })
        .await?;

    Ok(Json(MassApplyResponse {
        message: format!(
            "Processed {} of {} resumes",
            report.succeeded, report.submitted
        ),
        report,
    }))
}
