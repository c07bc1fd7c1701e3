//! Lane channel factories and handles.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::types::JournalEvent;
use crate::handlers::{EventHandler, Lane};

/// Default buffer size of each lane.
///
/// A full lane makes the dispatcher wait, which in turn delays the next poll.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// One handler invocation waiting to run.
#[derive(Clone)]
pub struct Job {
    pub handler: Arc<dyn EventHandler>,
    pub event: Arc<JournalEvent>,
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("handler", &self.handler.name())
            .field("event_type", &self.event.event_type)
            .field("seq", &self.event.origin.seq)
            .finish()
    }
}

/// Sender handle for a lane.
pub type JobSender = mpsc::Sender<Job>;
/// Receiver handle for a lane.
pub type JobReceiver = mpsc::Receiver<Job>;

/// Create the channel of the ordered lane.
pub fn ordered_lane_channel(buffer: usize) -> (JobSender, JobReceiver) {
    mpsc::channel(buffer.max(1))
}

/// Create the channel of the worker pool.
pub fn pool_lane_channel(buffer: usize) -> (JobSender, JobReceiver) {
    mpsc::channel(buffer.max(1))
}

/// Senders of both lanes, owned by the dispatcher.
///
/// Dropping it closes both lanes once their queues are drained.
pub struct LaneSenders {
    pub ordered: JobSender,
    pub pool: JobSender,
}

impl LaneSenders {
    pub fn new(ordered: JobSender, pool: JobSender) -> Self {
        Self { ordered, pool }
    }

    pub fn for_lane(&self, lane: Lane) -> &JobSender {
        match lane {
            Lane::Ordered => &self.ordered,
            Lane::Pool => &self.pool,
        }
    }
}
