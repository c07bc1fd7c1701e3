//! WorkerPool processor.
//!
//! Runs the jobs of all other handlers with at most `workers` in flight. No ordering holds
//! between jobs.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;

use super::run_job;
use super::stats::PipelineStats;
use crate::events::JobReceiver;

pub struct WorkerPool {
    workers: usize,
    stats: Arc<PipelineStats>,
}

impl WorkerPool {
    pub fn new(workers: usize, stats: Arc<PipelineStats>) -> Self {
        Self {
            workers: workers.max(1),
            stats,
        }
    }

    pub async fn run(self, job_rx: JobReceiver) {
        info!(workers = self.workers, "Worker pool started");
        let stats = &self.stats;
        ReceiverStream::new(job_rx)
            .for_each_concurrent(self.workers, |job| async move {
                let ok = run_job(job).await;
                stats.job_finished(ok);
            })
            .await;
        info!("Worker pool drained");
    }
}
