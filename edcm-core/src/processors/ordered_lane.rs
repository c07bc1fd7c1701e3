//! OrderedLane processor.
//!
//! Runs the jobs of order-sensitive handlers strictly one at a time, in the order the dispatcher
//! queued them. The lane exits once the dispatcher is gone and the queue is empty.

use std::sync::Arc;

use tracing::info;

use super::run_job;
use super::stats::PipelineStats;
use crate::events::JobReceiver;

pub struct OrderedLane {
    stats: Arc<PipelineStats>,
}

impl OrderedLane {
    pub fn new(stats: Arc<PipelineStats>) -> Self {
        Self { stats }
    }

    pub async fn run(self, mut job_rx: JobReceiver) {
        info!("Ordered lane started");
        let mut processed = 0u64;
        while let Some(job) = job_rx.recv().await {
            let ok = run_job(job).await;
            self.stats.job_finished(ok);
            processed += 1;
        }
        info!(processed, "Ordered lane drained");
    }
}
