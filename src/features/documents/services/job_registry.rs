use chrono::Utc;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

use crate::features::documents::models::JobStatus;

/// Process-wide map of document id -> live job status.
///
/// Each pipeline run writes only its own entry. Terminal entries are frozen and
/// stay readable until `evict_expired` drops them.
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<Uuid, JobStatus>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry unless one already exists for the document.
    /// Returns `false` when the id was already registered.
    pub async fn register(&self, job: JobStatus) -> bool {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.document_id) {
            return false;
        }
        tracing::debug!("Registered job for document {}", job.document_id);
        jobs.insert(job.document_id, job);
        true
    }

    /// Snapshot of the entry, if any
    pub async fn get(&self, id: Uuid) -> Option<JobStatus> {
        self.jobs.read().await.get(&id).cloned()
    }

    /// Apply `change` to the entry and return the new snapshot.
    ///
    /// Terminal entries are left untouched. `None` when the id is unknown.
    pub async fn update<F>(&self, id: Uuid, change: F) -> Option<JobStatus>
    where
        F: FnOnce(&mut JobStatus),
    {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&id)?;

        if job.is_terminal() {
            tracing::debug!(
                "Ignoring update for document {}: job already {}",
                id,
                job.status
            );
            return Some(job.clone());
        }

        change(job);
        job.updated_at = Utc::now();
        if job.is_terminal() {
            job.terminal_since = Some(Instant::now());
        }
        Some(job.clone())
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Drop terminal entries older than `retention`; returns how many went
    pub async fn evict_expired(&self, retention: Duration) -> usize {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| match job.terminal_since {
            Some(since) => since.elapsed() < retention,
            None => true,
        });
        let evicted = before - jobs.len();
        if evicted > 0 {
            tracing::info!("Evicted {} expired job(s) from registry", evicted);
        }
        evicted
    }
}
