//! Runs a single job's work: iterates its input files, invokes the
//! operation handler per file, updates the job record, and honors
//! cooperative cancellation.

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::Utc;
use pdfbatch_core::{JobId, JobStatus, OperationOutcome, OperationRegistry};
use tracing::{info, warn};

use crate::store::JobStore;

/// Invoked after each file's outcome has been recorded, with `(id,
/// percent_complete, outcome)`. Runs after the store's lock has been
/// released, never while holding it. Any panic inside the callback is
/// caught and dropped, matching the "callback exceptions are caught and
/// dropped" propagation policy.
pub type ProgressCallback = Arc<dyn Fn(JobId, f64, &OperationOutcome) + Send + Sync>;

/// Job-independent settings that shape how a single job's executor runs.
#[derive(Clone)]
pub struct ExecutorConfig {
    /// If true, the first failing file immediately fails the whole job and
    /// remaining files are left unprocessed. Default is false
    /// (continue-on-error).
    pub stop_on_error: bool,
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        ExecutorConfig {
            stop_on_error: false,
            progress_callback: None,
        }
    }
}

/// Runs `id`'s job to completion (or cancellation). Intended to be spawned
/// onto a [`crate::pool::WorkerPool`] as a single queued task; never spawns
/// its own worker thread, so exactly one executor runs per job at a time.
pub(crate) async fn run_job(
    store: Arc<JobStore>,
    registry: Arc<OperationRegistry>,
    config: ExecutorConfig,
    id: JobId,
) {
    let Ok((operation, files, params, cancel_signal)) = store.peek(id, |record| {
        (
            record.operation.clone(),
            record.files.clone(),
            record.params.clone(),
            record.cancel_signal.clone(),
        )
    }) else {
        warn!(job_id = %id, "executor started for a job that no longer exists");
        return;
    };

    let _ = store.mutate(id, |record| {
        record.status = JobStatus::Running;
        record.started_at = Some(Utc::now());
    });
    info!(job_id = %id, operation = %operation, total_files = files.len(), "job started");

    let handler = match registry.lookup(&operation) {
        Ok(handler) => handler,
        Err(_) => {
            let _ = store.mutate(id, |record| {
                record.status = JobStatus::Failed;
                record.completed_at = Some(Utc::now());
                record.failed_files += 1;
                record
                    .results
                    .push(OperationOutcome::synthetic_failure(format!(
                        "unknown operation '{operation}'"
                    )));
            });
            warn!(job_id = %id, operation = %operation, "job failed: unknown operation");
            return;
        }
    };

    let total = files.len();
    for (index, file) in files.into_iter().enumerate() {
        if cancel_signal.load(Ordering::Acquire) {
            finish_as_cancelled(&store, id);
            return;
        }

        let outcome = invoke_handler(&handler, file, &params).await;
        let success = outcome.success;
        let callback_outcome = config.progress_callback.as_ref().map(|_| outcome.clone());

        let mutated = store.mutate(id, |record| {
            record.results.push(outcome);
            if success {
                record.processed_files += 1;
            } else {
                record.failed_files += 1;
            }
        });
        if mutated.is_err() {
            warn!(job_id = %id, "job record disappeared mid-execution");
            return;
        }

        if let (Some(callback), Some(outcome)) = (&config.progress_callback, &callback_outcome) {
            let percent = (index + 1) as f64 / total as f64 * 100.0;
            let callback = Arc::clone(callback);
            let id = id;
            let outcome = outcome.clone();
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                callback(id, percent, &outcome);
            }));
        }

        if config.stop_on_error && !success {
            let _ = store.mutate(id, |record| {
                record.status = JobStatus::Failed;
                record.completed_at = Some(Utc::now());
            });
            warn!(job_id = %id, file_index = index, "job failed: stop_on_error after failing file");
            return;
        }
    }

    let _ = store.mutate(id, |record| {
        record.status = JobStatus::Completed;
        record.completed_at = Some(Utc::now());
    });
    info!(job_id = %id, "job completed");
}

async fn invoke_handler(
    handler: &pdfbatch_core::OperationHandler,
    file: PathBuf,
    params: &pdfbatch_core::OperationParams,
) -> OperationOutcome {
    let handler = Arc::clone(handler);
    let params = params.clone();
    tokio::task::spawn_blocking(move || handler(&file, &params))
        .await
        .unwrap_or_else(|join_err| {
            OperationOutcome::synthetic_failure(format!("handler task panicked: {join_err}"))
        })
}

fn finish_as_cancelled(store: &JobStore, id: JobId) {
    let _ = store.mutate(id, |record| {
        if !record.status.is_terminal() {
            record.status = JobStatus::Cancelled;
            record.completed_at = Some(Utc::now());
        }
    });
    info!(job_id = %id, "job cancelled at file boundary");
}
