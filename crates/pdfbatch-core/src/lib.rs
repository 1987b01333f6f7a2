#![forbid(unsafe_code)]
#![deny(unreachable_pub)]

//! Shared data model, error taxonomy, operation registry, and config
//! persistence for the PDF batch job orchestration engine.

pub mod config_store;
pub mod error;
pub mod model;
pub mod registry;

pub use config_store::{ConfigEntry, ConfigStore};
pub use error::{BatchError, BatchResult};
pub use model::{JobId, JobRecord, JobSnapshot, JobStatus, OperationOutcome, OperationParams};
pub use registry::{OperationHandler, OperationRegistry, KNOWN_OPERATIONS};
