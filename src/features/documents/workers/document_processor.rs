use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::interval;

use crate::core::config::WorkerConfig;
use crate::core::error::Result;
use crate::features::documents::services::DocumentPipeline;

/// Background worker: claims pending documents on a fixed interval, runs each on
/// its own task, and sweeps expired jobs out of the registry
pub struct DocumentProcessor {
    pipeline: Arc<DocumentPipeline>,
    interval: Duration,
    batch_size: i64,
    job_retention: Duration,
}

impl DocumentProcessor {
    pub fn new(pipeline: Arc<DocumentPipeline>, config: &WorkerConfig, job_retention: Duration) -> Self {
        Self {
            pipeline,
            interval: config.interval,
            batch_size: config.batch_size,
            job_retention,
        }
    }

    /// Run until `shutdown` flips to `true`, then wait for in-flight runs
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            "Starting document processor (every {}s, batch of {})",
            self.interval.as_secs(),
            self.batch_size
        );

        let mut ticker = interval(self.interval);
        let mut in_flight: Vec<JoinHandle<()>> = Vec::new();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    in_flight.retain(|handle| !handle.is_finished());

                    match self.process_batch().await {
                        Ok(handles) => in_flight.extend(handles),
                        Err(e) => tracing::error!("Error processing document batch: {:?}", e),
                    }

                    self.pipeline.registry().evict_expired(self.job_retention).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!(
            "Document processor stopping, waiting for {} in-flight run(s)",
            in_flight.len()
        );
        for result in join_all(in_flight).await {
            if let Err(e) = result {
                tracing::error!("Processing task panicked: {:?}", e);
            }
        }
    }

    /// Dispatch up to one batch of pending documents
    pub async fn process_batch(&self) -> Result<Vec<JoinHandle<()>>> {
        let pending = self.pipeline.documents().list_pending(self.batch_size).await?;

        if pending.is_empty() {
            return Ok(Vec::new());
        }

        tracing::info!("Dispatching {} pending document(s)", pending.len());

        Ok(pending
            .iter()
            .map(|document| self.pipeline.spawn_pipeline(document.id))
            .collect())
    }
}
