#![forbid(unsafe_code)]
#![deny(unreachable_pub)]

//! Batch job orchestration engine: schedules PDF-processing requests across
//! a bounded worker pool, tracks job lifecycle, and produces statistics and
//! reports.
//!
//! The engine never performs PDF work itself. Operations are supplied by
//! the embedder as handlers registered on an [`pdfbatch_core::OperationRegistry`]
//! passed into [`BatchManager::new`].

mod executor;
mod janitor;
mod pool;
mod report;
mod store;

pub mod manager;
pub mod telemetry;

pub use executor::{ExecutorConfig, ProgressCallback};
pub use manager::{BatchManager, EngineConfig};
pub use pool::{PoolShutdown, Task, WorkerPool, DEFAULT_WORKER_COUNT};
pub use report::{categorize_error, ErrorCategory, ErrorSummary, FileResult, JobReport, JobStatistics, JobSummary, PerformanceMetrics};
pub use store::JobStore;
pub use telemetry::init_tracing;

pub use pdfbatch_core::{
    BatchError, BatchResult, ConfigEntry, ConfigStore, JobId, JobRecord, JobSnapshot, JobStatus,
    OperationHandler, OperationOutcome, OperationParams, OperationRegistry, KNOWN_OPERATIONS,
};
