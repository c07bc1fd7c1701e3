//! Periodic progress summary in the log.

use std::sync::Arc;
use std::time::Duration;

use compact_str::CompactString;
use edcm_core::entities::ConstructionSite;
use edcm_core::processors::PipelineStats;
use edcm_sdk::MarketId;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::state::AppState;

/// One line of the progress report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSummary {
    pub market_id: MarketId,
    pub label: CompactString,
    pub progress_percent: u8,
    pub remaining_tons: u64,
    pub open_materials: usize,
    pub complete: bool,
}

impl From<&ConstructionSite> for SiteSummary {
    fn from(site: &ConstructionSite) -> Self {
        let outstanding = site.outstanding();
        Self {
            market_id: site.market_id,
            label: site.site_id.clone(),
            progress_percent: site.progress_percent(),
            remaining_tons: outstanding.iter().map(|(_, tons)| *tons).sum::<u64>(),
            open_materials: outstanding.len(),
            complete: site.complete,
        }
    }
}

/// Spawn the reporter. It logs once per `period` until `shutdown_rx` turns `true`.
pub fn spawn_reporter(
    state: AppState,
    stats: Arc<PipelineStats>,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; nothing has been ingested yet.
        interval.tick().await;

        loop {
            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        tracing::debug!("Reporter shutting down");
                        break;
                    }
                }
                _ = interval.tick() => {
                    report(&state, &stats).await;
                }
            }
        }
    })
}

async fn report(state: &AppState, stats: &PipelineStats) {
    let counters = stats.snapshot();
    tracing::info!(
        records = counters.records_parsed,
        dropped = counters.records_dropped,
        read_failures = counters.read_failures,
        jobs_failed = counters.jobs_failed,
        "Pipeline status"
    );

    for summary in state.sites.get_all().await.iter().map(SiteSummary::from) {
        tracing::info!(
            market_id = summary.market_id,
            site = %summary.label,
            progress = summary.progress_percent,
            remaining_tons = summary.remaining_tons,
            open_materials = summary.open_materials,
            complete = summary.complete,
            "Construction progress"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edcm_core::entities::{Commodity, MaterialRequirement};

    fn requirement(id: u64, name: &str, required: u64, delivered: u64) -> MaterialRequirement {
        let commodity = Arc::new(Commodity {
            id,
            name: name.into(),
            display_name: None,
            category: None,
        });
        let mut requirement = MaterialRequirement::new(commodity, required);
        requirement.delivered = delivered;
        requirement
    }

    #[test]
    fn test_summary_counts_open_materials() {
        let mut site = ConstructionSite::new(42);
        site.requirements.push(requirement(1, "steel", 100, 100));
        site.requirements.push(requirement(2, "polymers", 60, 20));
        site.requirements.push(requirement(3, "cmmcomposite", 40, 0));

        let summary = SiteSummary::from(&site);
        assert_eq!(summary.label, "STUB_42");
        assert_eq!(summary.progress_percent, 60);
        assert_eq!(summary.remaining_tons, 80);
        assert_eq!(summary.open_materials, 2);
        assert!(!summary.complete);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reporter_stops_on_shutdown() {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = spawn_reporter(
            AppState::new(),
            Arc::new(PipelineStats::default()),
            Duration::from_secs(30),
            shutdown_rx,
        );

        tokio::time::sleep(Duration::from_secs(95)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
