use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::application::{ApplicationRow, ApplicationStatus};
use crate::models::job::JobRow;
use crate::state::AppState;

/// Stands in for an uploaded resume when the applicant applies without
/// one. Rows carrying it are excluded from parsing and scoring.
const PLACEHOLDER_RESUME_URL: &str = "placeholder";

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub job_id: Uuid,
    pub resume_url: Option<String>,
}

/// POST /api/v1/applications
pub async fn apply(
    State(state): State<AppState>,
    CurrentUser(applicant_id): CurrentUser,
    Json(payload): Json<ApplyRequest>,
) -> Result<(StatusCode, Json<ApplicationRow>), AppError> {
    let job = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
        .bind(payload.job_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", payload.job_id)))?;

    if !job.is_active {
        return Err(AppError::Validation(
            "This job is no longer accepting applications".to_string(),
        ));
    }

    let resume_url = payload
        .resume_url
        .unwrap_or_else(|| PLACEHOLDER_RESUME_URL.to_string());

    let application = sqlx::query_as::<_, ApplicationRow>(
        r#"
        INSERT INTO applications (job_id, applicant_id, resume_url, status)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(job.id)
    .bind(applicant_id)
    .bind(&resume_url)
    .bind(ApplicationStatus::Pending)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(application)))
}
