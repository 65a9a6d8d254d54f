// Bulk persistence for processed applications. One batch, one
// transaction: either every successful resume becomes a row or none do.

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use crate::models::application::NewApplication;

/// Persists a whole batch of applications at once.
#[async_trait]
pub trait ApplicationSink: Send + Sync {
    async fn insert_batch(&self, records: &[NewApplication]) -> anyhow::Result<()>;
}

pub struct PgApplicationSink {
    pool: PgPool,
}

impl PgApplicationSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApplicationSink for PgApplicationSink {
    async fn insert_batch(&self, records: &[NewApplication]) -> anyhow::Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to open a transaction for the application batch")?;

        for record in records {
            let parsed_data = serde_json::to_value(&record.parsed_data)
                .context("Failed to serialize parsed resume data")?;

            sqlx::query(
                r#"
                INSERT INTO applications
                    (job_id, applicant_id, resume_url, status, parsed_data,
                     score, scoring_breakdown, strengths, gaps, recommendation)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(record.job_id)
            .bind(record.applicant_id)
            .bind(&record.resume_url)
            .bind(record.status)
            .bind(parsed_data)
            .bind(record.score)
            .bind(&record.scoring_breakdown)
            .bind(&record.strengths)
            .bind(&record.gaps)
            .bind(&record.recommendation)
            .execute(&mut *tx)
            .await
            .context("Failed to insert application")?;
        }

        tx.commit()
            .await
            .context("Failed to commit the application batch")?;

        info!(count = records.len(), "persisted application batch");
        Ok(())
    }
}
