//! Processors of the ingestion pipeline.
//!
//! - `Dispatcher`: polls watched files, parses records, queues jobs on lanes
//! - `OrderedLane`: runs order-sensitive jobs one at a time
//! - `WorkerPool`: runs all other jobs concurrently
//!
//! [`spawn_pipeline`] wires the three together.

pub mod dispatcher;
pub mod ordered_lane;
pub mod stats;
pub mod worker_pool;

pub use dispatcher::Dispatcher;
pub use ordered_lane::OrderedLane;
pub use stats::{PipelineStats, StatsSnapshot};
pub use worker_pool::WorkerPool;

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, warn};

use crate::config::MonitorConfig;
use crate::events::{Job, LaneSenders, ordered_lane_channel, pool_lane_channel};
use crate::handlers::HandlerRegistry;

/// Handles of a running pipeline.
pub struct PipelineHandle {
    dispatcher: JoinHandle<()>,
    ordered: JoinHandle<()>,
    pool: JoinHandle<()>,
    stats: Arc<PipelineStats>,
}

impl PipelineHandle {
    pub fn stats(&self) -> Arc<PipelineStats> {
        Arc::clone(&self.stats)
    }

    /// Wait for the dispatcher to stop and both lanes to drain.
    pub async fn join(self) {
        for (task, handle) in [
            ("dispatcher", self.dispatcher),
            ("ordered_lane", self.ordered),
            ("worker_pool", self.pool),
        ] {
            if let Err(e) = handle.await {
                error!(task, error = %e, "Pipeline task failed");
            }
        }
    }
}

/// Spawn the dispatcher and both lanes on the current runtime.
///
/// The pipeline runs until `shutdown_rx` turns `true`; then queued jobs are drained.
pub fn spawn_pipeline(
    config: MonitorConfig,
    registry: HandlerRegistry,
    shutdown_rx: watch::Receiver<bool>,
) -> PipelineHandle {
    let stats = Arc::new(PipelineStats::default());
    let (ordered_tx, ordered_rx) = ordered_lane_channel(config.lane_buffer);
    let (pool_tx, pool_rx) = pool_lane_channel(config.lane_buffer);

    let ordered = tokio::spawn(OrderedLane::new(Arc::clone(&stats)).run(ordered_rx));
    let pool = tokio::spawn(WorkerPool::new(config.workers, Arc::clone(&stats)).run(pool_rx));
    let dispatcher = tokio::spawn(
        Dispatcher::new(config, Arc::new(registry), Arc::clone(&stats))
            .run(shutdown_rx, LaneSenders::new(ordered_tx, pool_tx)),
    );

    PipelineHandle {
        dispatcher,
        ordered,
        pool,
        stats,
    }
}

/// Run one job in its own task so a panicking handler cannot take the lane down.
///
/// Returns `true` if the handler succeeded.
pub(crate) async fn run_job(job: Job) -> bool {
    let handler = Arc::clone(&job.handler);
    let event_type = job.event.event_type.clone();
    let seq = job.event.origin.seq;

    let result = tokio::spawn(async move { job.handler.handle(&job.event).await }).await;
    match result {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            warn!(
                handler = handler.name(),
                event_type = %event_type,
                seq,
                error = %e,
                "Handler failed"
            );
            false
        }
        Err(e) => {
            error!(
                handler = handler.name(),
                event_type = %event_type,
                seq,
                error = %e,
                "Handler panicked"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventOrigin, JournalEvent};
    use crate::handlers::{EventHandler, HandlerError, Lane};
    use async_trait::async_trait;
    use std::path::Path;

    struct Panics;

    #[async_trait]
    impl EventHandler for Panics {
        fn name(&self) -> &'static str {
            "panics"
        }
        fn event_types(&self) -> &'static [&'static str] {
            &["Boom"]
        }
        fn lane(&self) -> Lane {
            Lane::Ordered
        }
        #[allow(clippy::panic)]
        async fn handle(&self, _event: &JournalEvent) -> Result<(), HandlerError> {
            panic!("handler bug")
        }
    }

    #[tokio::test]
    async fn test_panicking_handler_is_contained() {
        let event = JournalEvent::parse(
            r#"{"event":"Boom"}"#,
            EventOrigin::new(Path::new("Journal.log"), 0),
        )
        .unwrap();
        let job = Job {
            handler: Arc::new(Panics),
            event: Arc::new(event),
        };
        assert!(!run_job(job).await);
    }
}
