//! Shared data types: job identifiers, status, per-file outcomes, and the
//! job record itself.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque, globally unique job identifier.
///
/// Backed by a random UUID rather than a monotonic counter, matching the
/// identifier scheme the batch toolkit this engine replaces actually uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(uuid::Uuid);

impl JobId {
    /// Generates a fresh, random job id.
    pub fn new() -> Self {
        JobId(uuid::Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(JobId(uuid::Uuid::parse_str(s)?))
    }
}

/// Parameter bag passed through to an operation handler unexamined.
pub type OperationParams = BTreeMap<String, Value>;

/// The five recognized job statuses. Terminal states are `Completed`,
/// `Failed`, and `Cancelled`; once a record reaches one, it never
/// transitions again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// True for any status from which no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

/// The result of applying a handler to a single file.
///
/// A handler is *total*: it must never panic, so every outcome — success or
/// failure — is represented as a value of this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationOutcome {
    pub success: bool,
    pub message: String,
    pub output_files: Vec<PathBuf>,
    pub execution_time_seconds: f64,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl OperationOutcome {
    /// Builds a synthetic failure outcome, e.g. for an unresolvable
    /// operation name or a handler that could not be invoked at all.
    pub fn synthetic_failure(message: impl Into<String>) -> Self {
        let message = message.into();
        OperationOutcome {
            success: false,
            message: message.clone(),
            output_files: Vec::new(),
            execution_time_seconds: 0.0,
            warnings: Vec::new(),
            errors: vec![message],
        }
    }
}

/// The core mutable entity owned exclusively by the job store.
///
/// All mutation is mediated by the store's lock; see `pdfbatch_engine::store`
/// for the `mutate` entry point that enforces this.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub id: JobId,
    pub operation: String,
    pub status: JobStatus,
    pub total_files: usize,
    pub processed_files: usize,
    pub failed_files: usize,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub files: Vec<PathBuf>,
    pub params: OperationParams,
    pub results: Vec<OperationOutcome>,
    /// Single-shot cooperative cancellation flag, checked by the executor
    /// between files. Never busy-waited on.
    pub cancel_signal: Arc<AtomicBool>,
}

impl JobRecord {
    /// Creates a new job record in the `Pending` state.
    pub fn new(operation: String, files: Vec<PathBuf>, params: OperationParams) -> Self {
        JobRecord {
            id: JobId::new(),
            operation,
            status: JobStatus::Pending,
            total_files: files.len(),
            processed_files: 0,
            failed_files: 0,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            files,
            params,
            results: Vec::new(),
            cancel_signal: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Requests cooperative cancellation. Does not itself change `status`;
    /// callers decide whether to force an immediate `Cancelled` transition
    /// (pending jobs) or let the executor observe the flag (running jobs).
    pub fn request_cancel(&self) {
        self.cancel_signal.store(true, Ordering::Release);
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel_signal.load(Ordering::Acquire)
    }

    /// Builds the immutable, deep-copied snapshot returned to callers.
    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            job_id: self.id,
            operation: self.operation.clone(),
            status: self.status,
            total_files: self.total_files,
            processed_files: self.processed_files,
            failed_files: self.failed_files,
            created_at: self.created_at,
            completed_at: self.completed_at,
            results: self.results.clone(),
        }
    }
}

/// Immutable, deep-copied view of a [`JobRecord`] returned to callers. Its
/// lifetime is decoupled from further mutation of the owning record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub job_id: JobId,
    pub operation: String,
    pub status: JobStatus,
    pub total_files: usize,
    pub processed_files: usize,
    pub failed_files: usize,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub results: Vec<OperationOutcome>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_id_roundtrips_through_display_and_parse() {
        let id = JobId::new();
        let parsed: JobId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn new_record_starts_pending_with_no_results() {
        let record = JobRecord::new("extract_text".into(), vec!["a.pdf".into()], OperationParams::new());
        assert_eq!(record.status, JobStatus::Pending);
        assert_eq!(record.total_files, 1);
        assert!(record.results.is_empty());
        assert!(record.started_at.is_none());
        assert!(record.completed_at.is_none());
        assert!(!record.is_cancel_requested());
    }

    #[test]
    fn request_cancel_sets_the_shared_flag() {
        let record = JobRecord::new("compress".into(), vec!["a.pdf".into()], OperationParams::new());
        let flag = record.cancel_signal.clone();
        record.request_cancel();
        assert!(flag.load(Ordering::Acquire));
        assert!(record.is_cancel_requested());
    }
}
