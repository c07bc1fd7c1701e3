use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by the dispatcher and both lanes.
#[derive(Debug, Default)]
pub struct PipelineStats {
    records_parsed: AtomicU64,
    records_dropped: AtomicU64,
    read_failures: AtomicU64,
    jobs_succeeded: AtomicU64,
    jobs_failed: AtomicU64,
}

/// Point-in-time copy of [`PipelineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub records_parsed: u64,
    pub records_dropped: u64,
    pub read_failures: u64,
    pub jobs_succeeded: u64,
    pub jobs_failed: u64,
}

impl StatsSnapshot {
    pub fn jobs_finished(&self) -> u64 {
        self.jobs_succeeded + self.jobs_failed
    }
}

impl PipelineStats {
    pub(crate) fn record_parsed(&self) {
        self.records_parsed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.records_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn read_failed(&self) {
        self.read_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn job_finished(&self, ok: bool) {
        if ok {
            self.jobs_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.jobs_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            records_parsed: self.records_parsed.load(Ordering::Relaxed),
            records_dropped: self.records_dropped.load(Ordering::Relaxed),
            read_failures: self.read_failures.load(Ordering::Relaxed),
            jobs_succeeded: self.jobs_succeeded.load(Ordering::Relaxed),
            jobs_failed: self.jobs_failed.load(Ordering::Relaxed),
        }
    }
}
