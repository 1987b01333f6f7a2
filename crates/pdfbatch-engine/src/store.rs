//! Thread-safe job record storage.
//!
//! A single coarse-grained lock guards the whole map and every record it
//! contains. `mutate` is the only channel for structured updates so the
//! invariants on [`JobRecord`] can be checked inside the critical section;
//! contention on a per-job basis is negligible next to the cost of a file
//! operation, so a fine-grained scheme is not worth its complexity.

use std::collections::HashMap;
use std::sync::Mutex;

use pdfbatch_core::{BatchError, JobId, JobRecord, JobSnapshot};

/// Owns every [`JobRecord`] the engine currently tracks.
#[derive(Default)]
pub struct JobStore {
    records: Mutex<HashMap<JobId, JobRecord>>,
}

impl JobStore {
    pub fn new() -> Self {
        JobStore::default()
    }

    /// Inserts a freshly created record. Panics (via the mutex poison path)
    /// only on a prior panic elsewhere while the lock was held, matching the
    /// engine's "store corruption is a system error" stance.
    pub fn insert(&self, record: JobRecord) {
        let mut guard = self.records.lock().expect("job store lock poisoned");
        guard.insert(record.id, record);
    }

    /// Returns a deep-copied snapshot of the record, decoupled from further
    /// mutation.
    pub fn get_snapshot(&self, id: JobId) -> Result<JobSnapshot, BatchError> {
        let guard = self.records.lock().expect("job store lock poisoned");
        guard
            .get(&id)
            .map(JobRecord::snapshot)
            .ok_or_else(|| BatchError::NotFound(format!("no job with id {id}")))
    }

    /// Runs `f` with exclusive mutable access to the record identified by
    /// `id`, under the store's lock, returning whatever `f` returns. This is
    /// the only way callers are allowed to change a record's fields.
    pub fn mutate<R>(
        &self,
        id: JobId,
        f: impl FnOnce(&mut JobRecord) -> R,
    ) -> Result<R, BatchError> {
        let mut guard = self.records.lock().expect("job store lock poisoned");
        let record = guard
            .get_mut(&id)
            .ok_or_else(|| BatchError::NotFound(format!("no job with id {id}")))?;
        Ok(f(record))
    }

    /// Runs `f` with shared (read-only) access to the record, returning
    /// whatever `f` returns. Used to read internal fields (e.g. `files`,
    /// `params`) that are not part of the public [`JobSnapshot`].
    pub fn peek<R>(&self, id: JobId, f: impl FnOnce(&JobRecord) -> R) -> Result<R, BatchError> {
        let guard = self.records.lock().expect("job store lock poisoned");
        let record = guard
            .get(&id)
            .ok_or_else(|| BatchError::NotFound(format!("no job with id {id}")))?;
        Ok(f(record))
    }

    /// Removes and returns a record's final snapshot, if present.
    pub fn remove(&self, id: JobId) -> Option<JobSnapshot> {
        let mut guard = self.records.lock().expect("job store lock poisoned");
        guard.remove(&id).map(|record| record.snapshot())
    }

    /// Lists every tracked job id. No particular order is guaranteed.
    pub fn list_ids(&self) -> Vec<JobId> {
        let guard = self.records.lock().expect("job store lock poisoned");
        guard.keys().copied().collect()
    }

    /// Removes every record whose predicate returns true, returning their
    /// final snapshots. Used by the janitor sweep.
    pub fn remove_matching(&self, mut predicate: impl FnMut(&JobRecord) -> bool) -> Vec<JobSnapshot> {
        let mut guard = self.records.lock().expect("job store lock poisoned");
        let matching: Vec<JobId> = guard
            .iter()
            .filter(|(_, record)| predicate(record))
            .map(|(id, _)| *id)
            .collect();
        matching
            .into_iter()
            .filter_map(|id| guard.remove(&id).map(|record| record.snapshot()))
            .collect()
    }
}
