#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::resume::ParsedResume;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Reviewed,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    pub resume_url: String,
    pub status: ApplicationStatus,
    pub parsed_data: Option<Value>,
    pub score: Option<f64>,
    pub scoring_breakdown: Option<Value>,
    pub strengths: Option<Vec<String>>,
    pub gaps: Option<Vec<String>>,
    pub recommendation: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A fully processed application, ready for the end-of-run bulk insert.
/// Built exactly once per successfully processed resume and never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct NewApplication {
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    pub resume_url: String,
    pub status: ApplicationStatus,
    pub parsed_data: ParsedResume,
    pub score: f64,
    pub scoring_breakdown: Value,
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
    pub recommendation: String,
}
