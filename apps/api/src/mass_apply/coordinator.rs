//! Batch coordination for mass apply runs.
//!
//! A run takes up to [`MAX_FILES_PER_RUN`] resumes for one job, feeds them
//! through the worker pool chunk by chunk, publishes progress after every
//! completion, and finishes with a single bulk insert of everything that
//! processed cleanly. Individual failures are collected, not fatal; only
//! precondition and persistence failures fail the run as a whole.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::pool::WorkerPool;
use super::processor::{ApplicationProcessor, ProcessError, ResumeFile, ResumeSubmission};
use super::progress::{BatchProgress, ProgressTracker};
use super::sink::ApplicationSink;
use crate::config::Config;

/// Hard cap on resumes per run.
pub const MAX_FILES_PER_RUN: usize = 100;

/// Tuning knobs for a run. Resolved once from the application config;
/// nothing here changes mid-run.
#[derive(Debug, Clone)]
pub struct MassApplyConfig {
    /// Worker slots in the pool.
    pub pool_size: usize,
    /// Resumes dispatched per chunk. Independent of `pool_size`.
    pub batch_size: usize,
    /// Pause between chunks, as courtesy to the remote services.
    pub batch_pause: Duration,
}

impl MassApplyConfig {
    pub fn from_app_config(config: &Config) -> Self {
        Self {
            pool_size: config.mass_apply_pool_size,
            batch_size: config.mass_apply_batch_size.max(1),
            batch_pause: Duration::from_millis(config.mass_apply_batch_pause_ms),
        }
    }
}

#[derive(Debug, Error)]
pub enum MassApplyError {
    #[error("no resumes were provided")]
    Empty,

    #[error("a mass apply run accepts at most {MAX_FILES_PER_RUN} resumes, got {0}")]
    TooMany(usize),

    #[error("failed to persist {succeeded} processed applications: {message}")]
    Persist { succeeded: usize, message: String },
}

/// One run's input. Every file is processed for the same applicant
/// against the same job.
pub struct MassApplyRequest {
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    pub files: Vec<ResumeFile>,
}

/// One file that did not make it into the persisted batch.
#[derive(Debug, Clone, Serialize)]
pub struct ItemFailure {
    pub file_name: String,
    pub reason: String,
}

/// Final counts for a completed run.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub submitted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<ItemFailure>,
}

pub struct MassApplyCoordinator {
    processor: Arc<dyn ApplicationProcessor>,
    sink: Arc<dyn ApplicationSink>,
    config: MassApplyConfig,
    progress: ProgressTracker,
}

impl MassApplyCoordinator {
    pub fn new(
        processor: Arc<dyn ApplicationProcessor>,
        sink: Arc<dyn ApplicationSink>,
        mut config: MassApplyConfig,
    ) -> Self {
        // A zero batch size would spin the dispatch loop without ever
        // taking a file.
        config.batch_size = config.batch_size.max(1);
        Self {
            processor,
            sink,
            config,
            progress: ProgressTracker::new(),
        }
    }

    /// Progress snapshots, published after every item completion.
    pub fn subscribe_progress(&self) -> watch::Receiver<BatchProgress> {
        self.progress.subscribe()
    }

    /// Drives one run to completion.
    ///
    /// Precondition failures reject the run before any file is touched.
    /// After that, every file yields exactly one entry in the report:
    /// either a persisted application or a listed failure.
    pub async fn run(&self, request: MassApplyRequest) -> Result<BatchReport, MassApplyError> {
        let total = request.files.len();
        if total == 0 {
            return Err(MassApplyError::Empty);
        }
        if total > MAX_FILES_PER_RUN {
            return Err(MassApplyError::TooMany(total));
        }

        self.progress.reset(total);

        // A fresh pool per run: workers close over the processor and are
        // torn down when the run ends.
        let pool = WorkerPool::new(self.config.pool_size, Arc::clone(&self.processor));

        info!(
            total,
            chunks = total.div_ceil(self.config.batch_size),
            pool_size = pool.size(),
            job_id = %request.job_id,
            "starting mass apply run"
        );

        let mut accepted = Vec::with_capacity(total);
        let mut failures = Vec::new();

        let mut files = request.files.into_iter();
        let mut remaining = total;
        while remaining > 0 {
            let chunk: Vec<ResumeFile> = files.by_ref().take(self.config.batch_size).collect();
            let chunk_size = chunk.len();
            remaining -= chunk_size;

            let mut in_flight = JoinSet::new();
            for file in chunk {
                let file_name = file.file_name.clone();
                let handle = pool.submit(ResumeSubmission {
                    file,
                    applicant_id: request.applicant_id,
                    job_id: request.job_id,
                });
                in_flight.spawn(async move { (file_name, handle.outcome().await) });
            }
            debug!(
                size = chunk_size,
                remaining,
                queued = pool.queued(),
                active = pool.active(),
                "chunk dispatched"
            );

            while let Some(joined) = in_flight.join_next().await {
                // The wrapper task only awaits a handle and cannot panic,
                // but a join error still has to count toward the report.
                let (file_name, outcome) = match joined {
                    Ok(completed) => completed,
                    Err(e) => ("unknown".to_string(), Err(ProcessError::Pool(e.to_string()))),
                };

                match outcome {
                    Ok(record) => accepted.push(record),
                    Err(e) => {
                        warn!(file_name = %file_name, error = %e, "resume failed to process");
                        failures.push(ItemFailure {
                            file_name,
                            reason: e.to_string(),
                        });
                    }
                }

                let progress = self.progress.record_completion();
                debug!(
                    processed = progress.processed,
                    total = progress.total,
                    percent = progress.percent,
                    "item completed"
                );
            }

            if remaining > 0 && !self.config.batch_pause.is_zero() {
                tokio::time::sleep(self.config.batch_pause).await;
            }
        }

        if !accepted.is_empty() {
            self.sink
                .insert_batch(&accepted)
                .await
                .map_err(|e| MassApplyError::Persist {
                    succeeded: accepted.len(),
                    message: e.to_string(),
                })?;
        }

        let report = BatchReport {
            submitted: total,
            succeeded: accepted.len(),
            failed: failures.len(),
            failures,
        };
        info!(
            submitted = report.submitted,
            succeeded = report.succeeded,
            failed = report.failed,
            "mass apply run finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::application::{ApplicationStatus, NewApplication};
    use crate::models::resume::ParsedResume;
    use async_trait::async_trait;
    use bytes::Bytes;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    // ──────────────────────────────────────────────────────────────────
    // Test doubles
    // ──────────────────────────────────────────────────────────────────

    #[derive(Default)]
    struct StubProcessor {
        fail_on: Vec<String>,
        delay: Option<Duration>,
        calls: AtomicUsize,
        started: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl ApplicationProcessor for StubProcessor {
        async fn process(
            &self,
            submission: ResumeSubmission,
        ) -> Result<NewApplication, ProcessError> {
            let name = submission.file.file_name.clone();
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.started.lock().unwrap().push(name.clone());

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail_on.contains(&name) {
                return Err(ProcessError::Extraction(format!("cannot read {name}")));
            }
            Ok(NewApplication {
                job_id: submission.job_id,
                applicant_id: submission.applicant_id,
                resume_url: format!("http://files.test/{name}"),
                status: ApplicationStatus::Pending,
                parsed_data: ParsedResume::default(),
                score: 70.0,
                scoring_breakdown: json!({}),
                strengths: vec![],
                gaps: vec![],
                recommendation: "Review".to_string(),
            })
        }
    }

    #[derive(Default)]
    struct MemorySink {
        fail: bool,
        batches: Mutex<Vec<Vec<NewApplication>>>,
    }

    #[async_trait]
    impl ApplicationSink for MemorySink {
        async fn insert_batch(&self, records: &[NewApplication]) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("database unavailable");
            }
            self.batches.lock().unwrap().push(records.to_vec());
            Ok(())
        }
    }

    // ──────────────────────────────────────────────────────────────────
    // Fixtures
    // ──────────────────────────────────────────────────────────────────

    fn pdf(name: &str) -> ResumeFile {
        ResumeFile {
            file_name: name.to_string(),
            content_type: "application/pdf".to_string(),
            bytes: Bytes::from_static(b"%PDF-1.4"),
        }
    }

    fn request(files: Vec<ResumeFile>) -> MassApplyRequest {
        MassApplyRequest {
            job_id: Uuid::from_u128(42),
            applicant_id: Uuid::from_u128(7),
            files,
        }
    }

    fn config(pool_size: usize, batch_size: usize, pause_ms: u64) -> MassApplyConfig {
        MassApplyConfig {
            pool_size,
            batch_size,
            batch_pause: Duration::from_millis(pause_ms),
        }
    }

    fn coordinator(
        processor: Arc<StubProcessor>,
        sink: Arc<MemorySink>,
        config: MassApplyConfig,
    ) -> MassApplyCoordinator {
        MassApplyCoordinator::new(processor, sink, config)
    }

    // ──────────────────────────────────────────────────────────────────
    // Tests
    // ──────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn rejects_an_empty_run_before_any_processing() {
        let processor = Arc::new(StubProcessor::default());
        let sink = Arc::new(MemorySink::default());
        let coordinator = coordinator(Arc::clone(&processor), Arc::clone(&sink), config(2, 2, 0));

        let result = coordinator.run(request(vec![])).await;

        assert!(matches!(result, Err(MassApplyError::Empty)));
        assert_eq!(processor.calls.load(Ordering::SeqCst), 0);
        assert!(sink.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_more_files_than_the_run_limit() {
        let processor = Arc::new(StubProcessor::default());
        let sink = Arc::new(MemorySink::default());
        let coordinator = coordinator(Arc::clone(&processor), Arc::clone(&sink), config(2, 5, 0));

        let files: Vec<ResumeFile> = (0..101).map(|i| pdf(&format!("cv-{i}.pdf"))).collect();
        let result = coordinator.run(request(files)).await;

        assert!(matches!(result, Err(MassApplyError::TooMany(101))));
        assert_eq!(processor.calls.load(Ordering::SeqCst), 0);
        assert!(sink.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn three_files_one_bad_yields_one_insert_of_two() {
        let processor = Arc::new(StubProcessor {
            fail_on: vec!["broken.pdf".to_string()],
            delay: Some(Duration::from_millis(5)),
            ..StubProcessor::default()
        });
        let sink = Arc::new(MemorySink::default());
        let coordinator = coordinator(Arc::clone(&processor), Arc::clone(&sink), config(2, 2, 0));

        let report = coordinator
            .run(request(vec![pdf("a.pdf"), pdf("broken.pdf"), pdf("b.pdf")]))
            .await
            .unwrap();

        assert_eq!(report.submitted, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failures[0].file_name, "broken.pdf");
        assert!(report.failures[0].reason.contains("extraction"));

        let batches = sink.batches.lock().unwrap();
        assert_eq!(batches.len(), 1, "exactly one bulk insert");
        assert_eq!(batches[0].len(), 2);

        assert!(processor.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn one_failure_leaves_the_other_four_intact() {
        let processor = Arc::new(StubProcessor {
            fail_on: vec!["cv-2.pdf".to_string()],
            ..StubProcessor::default()
        });
        let sink = Arc::new(MemorySink::default());
        let coordinator = coordinator(Arc::clone(&processor), Arc::clone(&sink), config(3, 5, 0));

        let files: Vec<ResumeFile> = (0..5).map(|i| pdf(&format!("cv-{i}.pdf"))).collect();
        let report = coordinator.run(request(files)).await.unwrap();

        assert_eq!(report.submitted, 5);
        assert_eq!(report.succeeded, 4);
        assert_eq!(report.failed, 1);
        assert_eq!(sink.batches.lock().unwrap()[0].len(), 4);
    }

    #[tokio::test]
    async fn progress_is_monotone_and_ends_at_exactly_one_hundred() {
        let processor = Arc::new(StubProcessor {
            delay: Some(Duration::from_millis(2)),
            ..StubProcessor::default()
        });
        let sink = Arc::new(MemorySink::default());
        let coordinator = coordinator(processor, sink, config(2, 3, 0));

        let mut rx = coordinator.subscribe_progress();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let collector = {
            let seen = Arc::clone(&seen);
            tokio::spawn(async move {
                while rx.changed().await.is_ok() {
                    let snapshot = *rx.borrow_and_update();
                    seen.lock().unwrap().push(snapshot);
                }
            })
        };

        let files: Vec<ResumeFile> = (0..7).map(|i| pdf(&format!("cv-{i}.pdf"))).collect();
        let report = coordinator.run(request(files)).await.unwrap();
        assert_eq!(report.submitted, 7);

        drop(coordinator);
        collector.await.unwrap();

        let seen = seen.lock().unwrap();
        assert!(!seen.is_empty());
        assert!(seen
            .windows(2)
            .all(|pair| pair[0].processed <= pair[1].processed));
        assert!(seen.windows(2).all(|pair| pair[0].percent <= pair[1].percent));

        let last = seen.last().unwrap();
        assert_eq!(last.processed, 7);
        assert_eq!(last.percent, 100.0);
    }

    #[tokio::test]
    async fn persistence_failure_fails_the_whole_run() {
        let processor = Arc::new(StubProcessor::default());
        let sink = Arc::new(MemorySink {
            fail: true,
            ..MemorySink::default()
        });
        let coordinator = coordinator(Arc::clone(&processor), sink, config(2, 2, 0));

        let result = coordinator.run(request(vec![pdf("a.pdf"), pdf("b.pdf")])).await;

        match result {
            Err(MassApplyError::Persist { succeeded, message }) => {
                assert_eq!(succeeded, 2);
                assert!(message.contains("database unavailable"));
            }
            other => panic!("expected a persistence error, got {other:?}"),
        }
        // Processing itself completed before the insert failed.
        assert_eq!(processor.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn skips_persistence_when_nothing_succeeded() {
        let processor = Arc::new(StubProcessor {
            fail_on: vec!["a.pdf".to_string(), "b.pdf".to_string()],
            ..StubProcessor::default()
        });
        let sink = Arc::new(MemorySink::default());
        let coordinator = coordinator(processor, Arc::clone(&sink), config(2, 2, 0));

        let report = coordinator
            .run(request(vec![pdf("a.pdf"), pdf("b.pdf")]))
            .await
            .unwrap();

        assert_eq!(report.succeeded, 0);
        assert_eq!(report.failed, 2);
        assert!(sink.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn a_chunk_finishes_before_the_next_one_starts() {
        let processor = Arc::new(StubProcessor {
            delay: Some(Duration::from_millis(5)),
            ..StubProcessor::default()
        });
        let sink = Arc::new(MemorySink::default());
        let coordinator = coordinator(Arc::clone(&processor), sink, config(4, 2, 0));

        let files: Vec<ResumeFile> = (0..4).map(|i| pdf(&format!("cv-{i}.pdf"))).collect();
        coordinator.run(request(files)).await.unwrap();

        let started = processor.started.lock().unwrap();
        let first: std::collections::HashSet<_> = started[..2].iter().cloned().collect();
        let expected: std::collections::HashSet<_> =
            ["cv-0.pdf".to_string(), "cv-1.pdf".to_string()].into();
        assert_eq!(first, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn pauses_between_chunks_but_not_after_the_last() {
        let processor = Arc::new(StubProcessor::default());
        let sink = Arc::new(MemorySink::default());
        let coordinator = coordinator(processor, sink, config(2, 2, 1000));

        let start = tokio::time::Instant::now();
        let files: Vec<ResumeFile> = (0..5).map(|i| pdf(&format!("cv-{i}.pdf"))).collect();
        coordinator.run(request(files)).await.unwrap();
        let elapsed = start.elapsed();

        // Three chunks of {2, 2, 1}: two inter-chunk pauses, none after
        // the final chunk.
        assert!(elapsed >= Duration::from_millis(2000));
        assert!(elapsed < Duration::from_millis(3000));
    }

    #[test]
    fn batch_size_never_drops_below_one() {
        let app_config = Config {
            database_url: "postgres://localhost/test".to_string(),
            s3_bucket: "resumes".to_string(),
            s3_endpoint: "http://localhost:9000".to_string(),
            aws_access_key_id: "test".to_string(),
            aws_secret_access_key: "test".to_string(),
            functions_url: "http://localhost:9090".to_string(),
            functions_api_key: "test".to_string(),
            port: 3001,
            rust_log: "debug".to_string(),
            mass_apply_pool_size: 4,
            mass_apply_batch_size: 0,
            mass_apply_batch_pause_ms: 0,
        };

        let config = MassApplyConfig::from_app_config(&app_config);
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.pool_size, 4);
        assert!(config.batch_pause.is_zero());
    }

    #[tokio::test]
    async fn a_zero_batch_size_still_drains_the_run() {
        let processor = Arc::new(StubProcessor::default());
        let sink = Arc::new(MemorySink::default());
        let coordinator = coordinator(processor.clone(), sink.clone(), config(1, 0, 0));

        let report = coordinator
            .run(request(vec![pdf("a.pdf"), pdf("b.pdf")]))
            .await
            .unwrap();

        assert_eq!(report.submitted, 2);
        assert_eq!(report.succeeded, 2);
        assert_eq!(sink.batches.lock().unwrap()[0].len(), 2);
    }
}
