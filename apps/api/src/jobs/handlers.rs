use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::functions::analysis::analyze_job;
use crate::models::application::ApplicationRow;
use crate::models::job::{EmploymentType, ExperienceLevel, JobRow};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    pub company_name: String,
    pub description: String,
    pub location: String,
    pub employment_type: EmploymentType,
    pub experience_level: ExperienceLevel,
    #[serde(default)]
    pub skills: Vec<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub education_requirements: Option<String>,
    pub additional_info: Option<String>,
    pub application_deadline: Option<DateTime<Utc>>,
}

/// POST /api/v1/jobs
///
/// Creates a posting and analyzes it up front so scoring has criteria
/// ready by the time resumes arrive. A failed analysis still posts the
/// job; scoring reports the missing analysis per resume until the job
/// is re-analyzed.
pub async fn create_job(
    State(state): State<AppState>,
    CurrentUser(recruiter_id): CurrentUser,
    Json(payload): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobRow>), AppError> {
    if payload.title.trim().is_empty() || payload.description.trim().is_empty() {
        return Err(AppError::Validation(
            "Job title and description are required".to_string(),
        ));
    }

    let job_data = analysis_payload(&payload);
    let ai_analysis = match analyze_job(&state.functions, &job_data).await {
        Ok(analysis) => Some(analysis),
        Err(e) => {
            warn!(error = %e, title = %payload.title, "job analysis failed at posting time");
            None
        }
    };

    let job = sqlx::query_as::<_, JobRow>(
        r#"
        INSERT INTO jobs
            (recruiter_id, title, company_name, description, location,
             employment_type, experience_level, skills, salary_min, salary_max,
             education_requirements, additional_info, application_deadline,
             ai_analysis)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING *
        "#,
    )
    .bind(recruiter_id)
    .bind(&payload.title)
    .bind(&payload.company_name)
    .bind(&payload.description)
    .bind(&payload.location)
    .bind(payload.employment_type)
    .bind(payload.experience_level)
    .bind(&payload.skills)
    .bind(payload.salary_min)
    .bind(payload.salary_max)
    .bind(&payload.education_requirements)
    .bind(&payload.additional_info)
    .bind(payload.application_deadline)
    .bind(&ai_analysis)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(job)))
}

/// Job fields for the analyzer, keyed the way its prompt reads them.
/// Its criteria draw on `additional_info` and `education_requirements`
/// as well as the headline fields.
fn analysis_payload(payload: &CreateJobRequest) -> serde_json::Value {
    json!({
        "title": payload.title,
        "company_name": payload.company_name,
        "description": payload.description,
        "location": payload.location,
        "employment_type": payload.employment_type,
        "experience_level": payload.experience_level,
        "skills": payload.skills,
        "salary_min": payload.salary_min,
        "salary_max": payload.salary_max,
        "education_requirements": payload.education_requirements,
        "additional_info": payload.additional_info,
        "application_deadline": payload.application_deadline,
    })
}

/// GET /api/v1/jobs
pub async fn list_jobs(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<JobRow>>, AppError> {
    let jobs = sqlx::query_as::<_, JobRow>(
        "SELECT * FROM jobs WHERE is_active = TRUE ORDER BY created_at DESC",
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(jobs))
}

/// GET /api/v1/jobs/:id/applications
///
/// Recruiter view: every application for one of their postings.
pub async fn list_job_applications(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Vec<ApplicationRow>>, AppError> {
    let job = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
        .bind(job_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    if job.recruiter_id != user_id {
        return Err(AppError::Forbidden);
    }

    let applications = sqlx::query_as::<_, ApplicationRow>(
        "SELECT * FROM applications WHERE job_id = $1 ORDER BY created_at DESC",
    )
    .bind(job_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(applications))
}
