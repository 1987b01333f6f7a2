//! Public façade: create / query / cancel / statistics / report / retry /
//! save-config, wiring the store, pool, registry, and config store together.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use pdfbatch_core::{
    BatchError, BatchResult, ConfigEntry, ConfigStore, JobId, JobRecord, JobSnapshot, JobStatus,
    OperationParams, OperationRegistry,
};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::executor::{self, ExecutorConfig, ProgressCallback};
use crate::janitor;
use crate::pool::{WorkerPool, DEFAULT_WORKER_COUNT};
use crate::report::{self, JobReport, JobStatistics};
use crate::store::JobStore;

/// Construction-time configuration for a [`BatchManager`].
#[derive(Clone)]
pub struct EngineConfig {
    /// Number of worker tasks in the pool. Default 4.
    pub worker_count: usize,
    /// If true, a job aborts on its first failing file instead of
    /// continuing through the remainder. Default false.
    pub stop_on_error: bool,
    /// Root directory `ConfigStore` persists presets under.
    pub temp_dir: PathBuf,
    /// Advisory maximum input file size; not enforced by the core itself
    /// (the embedder's handlers are expected to honor it).
    pub max_file_size_bytes: u64,
    /// How often the janitor sweeps for evictable jobs. Default 1 hour.
    pub janitor_interval: Duration,
    /// How old a terminal job must be before the janitor evicts it.
    /// Default 24 hours.
    pub janitor_max_age: Duration,
    /// How long `shutdown` waits for in-flight work before detaching it.
    pub shutdown_grace: Duration,
    /// Invoked after each file's outcome is recorded; see
    /// [`executor::ProgressCallback`].
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            worker_count: DEFAULT_WORKER_COUNT,
            stop_on_error: false,
            temp_dir: std::env::temp_dir(),
            max_file_size_bytes: 100 * 1024 * 1024,
            janitor_interval: Duration::from_secs(60 * 60),
            janitor_max_age: Duration::from_secs(24 * 60 * 60),
            shutdown_grace: Duration::from_secs(30),
            progress_callback: None,
        }
    }
}

/// The batch job orchestration engine's public entry point.
pub struct BatchManager {
    store: Arc<JobStore>,
    registry: Arc<OperationRegistry>,
    pool: WorkerPool,
    config_store: ConfigStore,
    executor_config: ExecutorConfig,
    janitor_shutdown: watch::Sender<bool>,
    janitor_handle: tokio::task::JoinHandle<()>,
    shutdown_grace: Duration,
}

impl BatchManager {
    /// Builds a new manager. Must be called from inside a Tokio runtime: it
    /// spawns the janitor's background task immediately.
    pub fn new(config: EngineConfig, registry: OperationRegistry) -> std::io::Result<Self> {
        let store = Arc::new(JobStore::new());
        let config_store = ConfigStore::new(&config.temp_dir)?;
        let pool = WorkerPool::new(config.worker_count);

        let (janitor_shutdown, shutdown_rx) = watch::channel(false);
        let janitor_handle = tokio::spawn(janitor::run(
            Arc::clone(&store),
            config.janitor_interval,
            config.janitor_max_age,
            shutdown_rx,
        ));

        Ok(BatchManager {
            store,
            registry: Arc::new(registry),
            pool,
            config_store,
            executor_config: ExecutorConfig {
                stop_on_error: config.stop_on_error,
                progress_callback: config.progress_callback,
            },
            janitor_shutdown,
            janitor_handle,
            shutdown_grace: config.shutdown_grace,
        })
    }

    /// Validates and creates a new job, submitting it to the worker pool.
    /// Files that do not exist or are not regular files are dropped with a
    /// warning; the job fails with `invalid-input` only if none remain.
    ///
    /// Uses the manager's configured default progress callback, if any. Use
    /// [`BatchManager::create_with_progress`] to register a callback for
    /// this job specifically.
    pub async fn create(
        &self,
        operation: impl Into<String>,
        files: Vec<PathBuf>,
        params: OperationParams,
    ) -> BatchResult<JobSnapshot> {
        self.create_with_progress(operation, files, params, None).await
    }

    /// Like [`BatchManager::create`], but `progress_callback` (when given)
    /// is invoked for this job instead of the manager's default, matching
    /// the per-job `progress_callback` this job's record carries.
    pub async fn create_with_progress(
        &self,
        operation: impl Into<String>,
        files: Vec<PathBuf>,
        params: OperationParams,
        progress_callback: Option<ProgressCallback>,
    ) -> BatchResult<JobSnapshot> {
        let operation = operation.into();
        if operation.is_empty() {
            return Err(BatchError::InvalidInput("operation name must not be empty".into()));
        }
        if !self.registry.contains(&operation) {
            return Err(BatchError::InvalidInput(format!("unknown operation '{operation}'")));
        }
        if files.is_empty() {
            return Err(BatchError::InvalidInput("files list must not be empty".into()));
        }

        let mut accepted = Vec::with_capacity(files.len());
        for file in files {
            if is_regular_file(&file) {
                accepted.push(file);
            } else {
                warn!(file = %file.display(), "dropping input file: does not exist or is not a regular file");
            }
        }
        if accepted.is_empty() {
            return Err(BatchError::InvalidInput(
                "no valid files remained after filtering".into(),
            ));
        }

        let record = JobRecord::new(operation.clone(), accepted, params);
        let id = record.id;
        let snapshot = record.snapshot();
        self.store.insert(record);

        let store = Arc::clone(&self.store);
        let registry = Arc::clone(&self.registry);
        let executor_config = ExecutorConfig {
            stop_on_error: self.executor_config.stop_on_error,
            progress_callback: progress_callback.or_else(|| self.executor_config.progress_callback.clone()),
        };
        self.pool
            .submit(Box::pin(executor::run_job(store, registry, executor_config, id)))
            .await
            .map_err(BatchError::system)?;

        info!(job_id = %id, operation = %operation, "job submitted");
        Ok(snapshot)
    }

    /// Returns a snapshot of `id`'s current state.
    pub fn status(&self, id: JobId) -> BatchResult<JobSnapshot> {
        self.store.get_snapshot(id)
    }

    /// Requests cancellation. Returns `false` if `id` is unknown or the job
    /// is already terminal; `true` otherwise. A pending job transitions to
    /// `cancelled` immediately; a running job's transition happens
    /// cooperatively, in the executor, at the next file boundary.
    pub fn cancel(&self, id: JobId) -> bool {
        self.store
            .mutate(id, |record| {
                if record.status.is_terminal() {
                    return false;
                }
                record.request_cancel();
                if record.status == JobStatus::Pending {
                    record.status = JobStatus::Cancelled;
                    record.completed_at = Some(Utc::now());
                }
                true
            })
            .unwrap_or(false)
    }

    /// Computes derived statistics for `id`.
    pub fn statistics(&self, id: JobId) -> BatchResult<JobStatistics> {
        self.store.peek(id, report::statistics)
    }

    /// Builds the full structured report for `id`.
    pub fn report(&self, id: JobId) -> BatchResult<JobReport> {
        self.store.peek(id, report::report)
    }

    /// Persists `id`'s operation and params under `name` for later reuse.
    pub fn save_config(&self, id: JobId, name: impl Into<String>) -> BatchResult<bool> {
        let (operation, parameters) = self.store.peek(id, |record| {
            (record.operation.clone(), record.params.clone())
        })?;
        let entry = ConfigEntry {
            name: name.into(),
            operation,
            parameters,
            created_at: Utc::now(),
            source_job_id: id,
        };
        self.config_store.save(&entry)?;
        Ok(true)
    }

    /// Loads a previously saved configuration by name.
    pub fn load_config(&self, name: &str) -> BatchResult<ConfigEntry> {
        self.config_store.load(name)
    }

    /// Resubmits the subset of `id`'s input files whose outcome failed, as
    /// a new job with the same operation and params. Fails with
    /// `invalid-state` if `id` is not `completed`, or `invalid-input` if no
    /// file in it failed.
    pub async fn retry_failed(&self, id: JobId) -> BatchResult<JobSnapshot> {
        let record = self.store.peek(id, Clone::clone)?;
        if record.status != JobStatus::Completed {
            return Err(BatchError::InvalidState(format!(
                "job {id} is not completed, cannot retry"
            )));
        }

        let failed_files: Vec<PathBuf> = record
            .files
            .iter()
            .zip(record.results.iter())
            .filter(|(_, outcome)| !outcome.success)
            .map(|(file, _)| file.clone())
            .collect();
        if failed_files.is_empty() {
            return Err(BatchError::InvalidInput(format!(
                "job {id} has no failed files to retry"
            )));
        }

        self.create(record.operation, failed_files, record.params).await
    }

    /// Sets the cancel signal on every non-terminal job, stops accepting new
    /// submissions, waits out the configured grace period for in-flight
    /// work, and stops the janitor. Best-effort: resources are released
    /// even on failure paths.
    pub async fn shutdown(self) {
        for id in self.store.list_ids() {
            let _ = self.store.mutate(id, |record| {
                if !record.status.is_terminal() {
                    record.request_cancel();
                }
            });
        }

        let _ = self.janitor_shutdown.send(true);
        let _ = tokio::time::timeout(self.shutdown_grace, self.janitor_handle).await;
        self.pool.shutdown(self.shutdown_grace).await;
        info!("batch manager shut down");
    }
}

fn is_regular_file(path: &Path) -> bool {
    path.is_file()
}
