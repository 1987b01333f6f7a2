//! Periodically evicts terminal jobs older than a configurable age.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::info;

use crate::store::JobStore;

/// Removes every terminal job whose `completed_at` predates `now - max_age`.
/// Never touches a non-terminal job. Returns the number of records removed.
pub(crate) fn sweep_once(store: &JobStore, max_age: Duration) -> usize {
    let cutoff = Utc::now()
        - chrono::Duration::from_std(max_age).expect("max_age fits in a chrono::Duration");

    let removed = store.remove_matching(|record| {
        record.status.is_terminal() && record.completed_at.is_some_and(|completed| completed < cutoff)
    });

    if !removed.is_empty() {
        info!(count = removed.len(), "janitor swept terminal jobs");
    }
    removed.len()
}

/// Runs [`sweep_once`] on a fixed interval until `shutdown` fires. Intended
/// to be spawned as a single background task alongside the engine.
pub(crate) async fn run(
    store: Arc<JobStore>,
    interval: Duration,
    max_age: Duration,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                sweep_once(&store, max_age);
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfbatch_core::{JobRecord, JobStatus, OperationParams};

    #[test]
    fn sweep_only_removes_old_terminal_jobs() {
        let store = JobStore::new();

        let mut old_completed = JobRecord::new("ocr".into(), vec!["a.pdf".into()], OperationParams::new());
        old_completed.status = JobStatus::Completed;
        old_completed.completed_at = Some(Utc::now() - chrono::Duration::hours(48));
        let old_completed_id = old_completed.id;

        let mut recent_completed =
            JobRecord::new("ocr".into(), vec!["b.pdf".into()], OperationParams::new());
        recent_completed.status = JobStatus::Completed;
        recent_completed.completed_at = Some(Utc::now());
        let recent_completed_id = recent_completed.id;

        let mut running = JobRecord::new("ocr".into(), vec!["c.pdf".into()], OperationParams::new());
        running.status = JobStatus::Running;
        running.started_at = Some(Utc::now() - chrono::Duration::hours(48));
        let running_id = running.id;

        store.insert(old_completed);
        store.insert(recent_completed);
        store.insert(running);

        let removed = sweep_once(&store, Duration::from_secs(24 * 60 * 60));
        assert_eq!(removed, 1);
        assert!(store.get_snapshot(old_completed_id).is_err());
        assert!(store.get_snapshot(recent_completed_id).is_ok());
        assert!(store.get_snapshot(running_id).is_ok());
    }

    #[test]
    fn s6_three_old_completed_jobs_are_removed_leaving_the_other_two() {
        let store = JobStore::new();
        let mut old_ids = Vec::new();
        for i in 0..3 {
            let mut record = JobRecord::new(
                "compress".into(),
                vec![format!("f{i}.pdf").into()],
                OperationParams::new(),
            );
            record.status = JobStatus::Completed;
            record.completed_at = Some(Utc::now() - chrono::Duration::hours(72));
            old_ids.push(record.id);
            store.insert(record);
        }

        let mut running = JobRecord::new("compress".into(), vec!["r.pdf".into()], OperationParams::new());
        running.status = JobStatus::Running;
        let running_id = running.id;
        store.insert(running);

        let mut recent = JobRecord::new("compress".into(), vec!["n.pdf".into()], OperationParams::new());
        recent.status = JobStatus::Completed;
        recent.completed_at = Some(Utc::now());
        let recent_id = recent.id;
        store.insert(recent);

        let removed = sweep_once(&store, Duration::from_secs(24 * 60 * 60));
        assert_eq!(removed, 3);
        for id in old_ids {
            assert!(store.get_snapshot(id).is_err());
        }
        assert!(store.get_snapshot(running_id).is_ok());
        assert!(store.get_snapshot(recent_id).is_ok());
    }
}
