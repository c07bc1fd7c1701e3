//! Construction site store.
//!
//! Every site lives in its own slot: a mutex guarding the site together with the fingerprint of
//! the last depot report accepted for it. The fingerprint check and the requirement mutation
//! happen under that one lock, so two reports for the same market are applied atomically with
//! respect to each other, while reports for different markets never share a lock.
//!
//! Depot reports carry cumulative required totals but incremental delivered amounts. Required
//! quantities are taken as reported (but never lowered); the reported delivered amount is added to
//! what the store already counted, once per novel report. Depot reports and contributions run on
//! different lanes, so a report can be applied before a contribution it already includes; each
//! site remembers the journal position of its newest report and skips deliveries logged before it.

use std::sync::Arc;

use compact_str::CompactString;
use edcm_sdk::{CommodityId, MarketId};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::fingerprint::Fingerprint;
use super::shard::ShardedMap;
use crate::entities::{Commodity, ConstructionSite, MaterialRequirement};
use crate::events::EventOrigin;

// ---------------------------------------------------------------------------
// Public data types
// ---------------------------------------------------------------------------

/// One commodity line of a depot report, already resolved to a registered commodity.
#[derive(Debug, Clone)]
pub struct DepotLine {
    pub commodity: Arc<Commodity>,
    pub required: u64,
    pub provided: u64,
}

/// A depot status report for one market.
#[derive(Debug, Clone, Default)]
pub struct DepotSnapshot {
    pub lines: Vec<DepotLine>,
    pub complete: bool,
    pub failed: bool,
    pub observed_at: Option<OffsetDateTime>,
    /// Journal position of the report, when it was read from a file.
    pub origin: Option<EventOrigin>,
}

impl DepotSnapshot {
    pub fn fingerprint(&self, market_id: MarketId) -> Fingerprint {
        let lines: Vec<_> = self
            .lines
            .iter()
            .map(|l| (l.commodity.id, l.required, l.provided))
            .collect();
        Fingerprint::of_lines(market_id, &lines)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// First report for a previously unseen market.
    Created,
    /// A novel report was applied to an existing site.
    Updated,
    /// The report matched the last accepted one for this market.
    Unchanged,
}

/// Domain invariant violations. A rejected update leaves the store unchanged.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The same commodity was listed twice in one depot report.
    #[error("commodity {commodity} listed more than once in depot report for market {market_id}")]
    DuplicateCommodity {
        market_id: MarketId,
        commodity: CompactString,
    },

    /// Delivered quantities never decrease.
    #[error("negative delivery of {delta} t for commodity {commodity_id}")]
    NegativeDelivery { commodity_id: CommodityId, delta: i64 },
}

// ---------------------------------------------------------------------------
// ConstructionSiteStore
// ---------------------------------------------------------------------------

pub(crate) struct SiteSlot {
    site: ConstructionSite,
    fingerprint: Option<Fingerprint>,
    /// Position of the newest depot report seen for this site.
    last_report: Option<EventOrigin>,
}

impl SiteSlot {
    fn new(site: ConstructionSite) -> Self {
        Self {
            site,
            fingerprint: None,
            last_report: None,
        }
    }

    fn note_report(&mut self, origin: Option<EventOrigin>) {
        let Some(origin) = origin else {
            return;
        };
        let is_newer = self
            .last_report
            .as_ref()
            .is_none_or(|last| last.path != origin.path || last.seq < origin.seq);
        if is_newer {
            self.last_report = Some(origin);
        }
    }

    /// Whether a depot report read after `origin` in the same file has already been applied.
    fn reported_after(&self, origin: &EventOrigin) -> bool {
        self.last_report
            .as_ref()
            .is_some_and(|last| last.path == origin.path && last.seq > origin.seq)
    }
}

type Slot = Arc<Mutex<SiteSlot>>;

/// Authoritative state of all known construction sites.
pub struct ConstructionSiteStore {
    sites: ShardedMap<Slot>,
    /// Station names seen while docked, by market id. Used to label sites created later.
    name_hints: ShardedMap<CompactString>,
}

impl Default for ConstructionSiteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructionSiteStore {
    pub fn new() -> Self {
        Self {
            sites: ShardedMap::new(),
            name_hints: ShardedMap::new(),
        }
    }

    /// Apply a depot status report to the site of `market_id`, creating the site if needed.
    pub async fn upsert_from_depot_status(
        &self,
        market_id: MarketId,
        snapshot: DepotSnapshot,
    ) -> Result<UpsertOutcome, StoreError> {
        for (i, line) in snapshot.lines.iter().enumerate() {
            if snapshot.lines[..i]
                .iter()
                .any(|prev| prev.commodity.id == line.commodity.id)
            {
                return Err(StoreError::DuplicateCommodity {
                    market_id,
                    commodity: line.commodity.name.clone(),
                });
            }
        }

        let fingerprint = snapshot.fingerprint(market_id);
        let (slot, created) = self
            .sites
            .get_or_insert_with(market_id, || {
                Arc::new(Mutex::new(SiteSlot::new(ConstructionSite::new(market_id))))
            })
            .await;

        let mut slot = slot.lock().await;
        if created && let Some(name) = self.name_hints.get(market_id).await {
            slot.site.site_id = name;
        }
        slot.note_report(snapshot.origin.clone());
        if slot.fingerprint == Some(fingerprint) {
            debug!(market_id, %fingerprint, "Depot report unchanged");
            return Ok(UpsertOutcome::Unchanged);
        }

        let site = &mut slot.site;
        for line in snapshot.lines {
            match site.requirement_mut(line.commodity.id) {
                None => {
                    let mut requirement = MaterialRequirement::new(line.commodity, line.required);
                    requirement.delivered = line.provided;
                    site.requirements.push(requirement);
                }
                Some(requirement) => {
                    if line.required > requirement.required {
                        requirement.required = line.required;
                    } else if line.required < requirement.required {
                        warn!(
                            market_id,
                            commodity = %requirement.commodity.name,
                            stored = requirement.required,
                            reported = line.required,
                            "Depot reported a lower required total; keeping the stored one"
                        );
                    }
                    requirement.delivered += line.provided;
                }
            }
        }
        site.complete = snapshot.complete;
        site.failed = snapshot.failed;
        site.last_updated = Some(snapshot.observed_at.unwrap_or_else(OffsetDateTime::now_utc));
        slot.fingerprint = Some(fingerprint);
        debug!(market_id, %fingerprint, "Depot report applied");

        Ok(if created {
            UpsertOutcome::Created
        } else {
            UpsertOutcome::Updated
        })
    }

    /// Add `delta` tons of a commodity to every open requirement for it, across all sites.
    ///
    /// Returns the number of requirements updated.
    pub async fn apply_delivery(
        &self,
        commodity_id: CommodityId,
        delta: i64,
    ) -> Result<usize, StoreError> {
        self.apply_delivery_from(commodity_id, delta, None).await
    }

    /// [`apply_delivery`](Self::apply_delivery) for a delivery read at `origin`.
    ///
    /// Sites whose newest depot report comes later in the same file already include the delivery
    /// and are left alone; they still count towards the returned number.
    pub async fn apply_delivery_from(
        &self,
        commodity_id: CommodityId,
        delta: i64,
        origin: Option<&EventOrigin>,
    ) -> Result<usize, StoreError> {
        let delta = u64::try_from(delta)
            .map_err(|_| StoreError::NegativeDelivery { commodity_id, delta })?;
        if delta == 0 {
            return Ok(0);
        }

        let mut matched = 0;
        for (market_id, slot) in self.sites.values().await {
            let mut slot = slot.lock().await;
            let already_counted = origin.is_some_and(|o| slot.reported_after(o));
            let Some(requirement) = slot.site.requirement_mut(commodity_id) else {
                continue;
            };
            if already_counted {
                matched += 1;
                debug!(
                    market_id,
                    commodity_id,
                    delta,
                    "Delivery already in a later depot report"
                );
            } else if requirement.is_open() {
                requirement.delivered += delta;
                slot.site.last_updated = Some(OffsetDateTime::now_utc());
                matched += 1;
                debug!(market_id, commodity_id, delta, "Delivery applied");
            }
        }
        Ok(matched)
    }

    /// Remember the station name of a market and use it to label a stub site.
    ///
    /// Returns `true` when an existing site was relabelled.
    pub async fn record_site_name(&self, market_id: MarketId, name: &str) -> bool {
        let name = CompactString::from(name.trim());
        if name.is_empty() {
            return false;
        }
        self.name_hints.insert(market_id, name.clone()).await;

        let Some(slot) = self.sites.get(market_id).await else {
            return false;
        };
        let mut slot = slot.lock().await;
        if slot.site.has_stub_label() {
            slot.site.site_id = name;
            true
        } else {
            false
        }
    }

    /// Load a site from persistence, replacing any current state for its market.
    ///
    /// The dedup fingerprint starts empty, so the next depot report is always applied.
    pub async fn restore(&self, site: ConstructionSite) {
        let market_id = site.market_id;
        let slot = Arc::new(Mutex::new(SiteSlot::new(site)));
        self.sites.insert(market_id, slot).await;
    }

    pub async fn get(&self, market_id: MarketId) -> Option<ConstructionSite> {
        let slot = self.sites.get(market_id).await?;
        Some(slot.lock().await.site.clone())
    }

    /// Copies of all sites, ordered by market id.
    pub async fn get_all(&self) -> Vec<ConstructionSite> {
        let mut sites = Vec::new();
        for (_, slot) in self.sites.values().await {
            sites.push(slot.lock().await.site.clone());
        }
        sites.sort_by_key(|s| s.market_id);
        sites
    }

    /// Fingerprint of the last report accepted for a market.
    pub async fn fingerprint(&self, market_id: MarketId) -> Option<Fingerprint> {
        let slot = self.sites.get(market_id).await?;
        slot.lock().await.fingerprint
    }

    pub async fn len(&self) -> usize {
        self.sites.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Hold the lock of one site until the guard is dropped.
    #[cfg(test)]
    pub(crate) async fn lock_site(
        &self,
        market_id: MarketId,
    ) -> Option<tokio::sync::OwnedMutexGuard<SiteSlot>> {
        let slot = self.sites.get(market_id).await?;
        Some(slot.lock_owned().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn commodity(id: CommodityId, name: &str) -> Arc<Commodity> {
        Arc::new(Commodity {
            id,
            name: name.into(),
            display_name: None,
            category: None,
        })
    }

    fn snapshot(lines: &[(CommodityId, &str, u64, u64)]) -> DepotSnapshot {
        DepotSnapshot {
            lines: lines
                .iter()
                .map(|(id, name, required, provided)| DepotLine {
                    commodity: commodity(*id, name),
                    required: *required,
                    provided: *provided,
                })
                .collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_same_report_applied_once() {
        let store = ConstructionSiteStore::new();
        let report = snapshot(&[(1, "steel", 100, 10), (2, "polymers", 50, 0)]);

        let first = store.upsert_from_depot_status(7, report.clone()).await.unwrap();
        let second = store.upsert_from_depot_status(7, report).await.unwrap();
        assert_eq!(first, UpsertOutcome::Created);
        assert_eq!(second, UpsertOutcome::Unchanged);

        let site = store.get(7).await.unwrap();
        assert_eq!(site.requirements.len(), 2);
        assert_eq!(site.requirement(1).unwrap().delivered, 10);
    }

    #[tokio::test]
    async fn test_reordered_report_is_a_duplicate() {
        let store = ConstructionSiteStore::new();
        store
            .upsert_from_depot_status(7, snapshot(&[(1, "steel", 100, 0), (2, "polymers", 50, 0)]))
            .await
            .unwrap();
        let outcome = store
            .upsert_from_depot_status(7, snapshot(&[(2, "polymers", 50, 0), (1, "steel", 100, 0)]))
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_novel_report_adds_its_delivered_amount() {
        let store = ConstructionSiteStore::new();
        store
            .upsert_from_depot_status(7, snapshot(&[(1, "steel", 100, 10)]))
            .await
            .unwrap();
        assert_eq!(store.get(7).await.unwrap().requirement(1).unwrap().delivered, 10);

        // A smaller amount is still new progress.
        let outcome = store
            .upsert_from_depot_status(7, snapshot(&[(1, "steel", 100, 5)]))
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated);
        assert_eq!(store.get(7).await.unwrap().requirement(1).unwrap().delivered, 15);

        // Repeating the last report adds nothing.
        let outcome = store
            .upsert_from_depot_status(7, snapshot(&[(1, "steel", 100, 5)]))
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Unchanged);
        assert_eq!(store.get(7).await.unwrap().requirement(1).unwrap().delivered, 15);

        // Contributions add on top of reported progress.
        assert_eq!(store.apply_delivery(1, 20).await.unwrap(), 1);
        store
            .upsert_from_depot_status(7, snapshot(&[(1, "steel", 100, 0)]))
            .await
            .unwrap();
        assert_eq!(store.get(7).await.unwrap().requirement(1).unwrap().delivered, 35);
    }

    #[tokio::test]
    async fn test_required_never_decreases() {
        let store = ConstructionSiteStore::new();
        store
            .upsert_from_depot_status(7, snapshot(&[(1, "steel", 100, 0)]))
            .await
            .unwrap();
        store
            .upsert_from_depot_status(7, snapshot(&[(1, "steel", 80, 0)]))
            .await
            .unwrap();
        assert_eq!(store.get(7).await.unwrap().requirement(1).unwrap().required, 100);
        store
            .upsert_from_depot_status(7, snapshot(&[(1, "steel", 120, 0)]))
            .await
            .unwrap();
        assert_eq!(store.get(7).await.unwrap().requirement(1).unwrap().required, 120);
    }

    #[tokio::test]
    async fn test_duplicate_commodity_rejected_without_change() {
        let store = ConstructionSiteStore::new();
        let err = store
            .upsert_from_depot_status(7, snapshot(&[(1, "steel", 100, 0), (1, "steel", 5, 0)]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateCommodity { market_id: 7, .. }));
        assert!(store.get(7).await.is_none());
        assert!(store.fingerprint(7).await.is_none());
    }

    #[tokio::test]
    async fn test_negative_delivery_rejected() {
        let store = ConstructionSiteStore::new();
        store
            .upsert_from_depot_status(7, snapshot(&[(1, "steel", 100, 10)]))
            .await
            .unwrap();
        let err = store.apply_delivery(1, -5).await.unwrap_err();
        assert!(matches!(err, StoreError::NegativeDelivery { delta: -5, .. }));
        assert_eq!(store.get(7).await.unwrap().requirement(1).unwrap().delivered, 10);
    }

    #[tokio::test]
    async fn test_delivery_applies_to_open_requirements_across_sites() {
        let store = ConstructionSiteStore::new();
        store
            .upsert_from_depot_status(1, snapshot(&[(10, "steel", 100, 0)]))
            .await
            .unwrap();
        store
            .upsert_from_depot_status(2, snapshot(&[(10, "steel", 50, 50)]))
            .await
            .unwrap();
        store
            .upsert_from_depot_status(3, snapshot(&[(10, "steel", 70, 0), (11, "copper", 5, 0)]))
            .await
            .unwrap();

        assert_eq!(store.apply_delivery(10, 20).await.unwrap(), 2);
        assert_eq!(store.get(1).await.unwrap().requirement(10).unwrap().delivered, 20);
        assert_eq!(store.get(2).await.unwrap().requirement(10).unwrap().delivered, 50);
        assert_eq!(store.get(3).await.unwrap().requirement(10).unwrap().delivered, 20);
        assert_eq!(store.apply_delivery(99, 20).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delivery_before_applied_report_is_not_counted_twice() {
        let store = ConstructionSiteStore::new();
        let journal: Arc<std::path::Path> = Arc::from(std::path::Path::new("Journal.01.log"));
        let at = |seq| Some(EventOrigin::new(Arc::clone(&journal), seq));

        // The report at line 5 already includes the 40 t contributed at line 4.
        let mut report = snapshot(&[(10, "steel", 100, 40)]);
        report.origin = at(5);
        store.upsert_from_depot_status(1, report).await.unwrap();

        let matched = store
            .apply_delivery_from(10, 40, at(4).as_ref())
            .await
            .unwrap();
        assert_eq!(matched, 1);
        assert_eq!(store.get(1).await.unwrap().requirement(10).unwrap().delivered, 40);

        // A later contribution is new.
        store
            .apply_delivery_from(10, 10, at(6).as_ref())
            .await
            .unwrap();
        assert_eq!(store.get(1).await.unwrap().requirement(10).unwrap().delivered, 50);

        // Another file's positions are not comparable.
        let other = EventOrigin::new(std::path::Path::new("Journal.02.log"), 0);
        store
            .apply_delivery_from(10, 5, Some(&other))
            .await
            .unwrap();
        assert_eq!(store.get(1).await.unwrap().requirement(10).unwrap().delivered, 55);
    }

    #[tokio::test]
    async fn test_markets_do_not_share_a_lock() {
        let store = Arc::new(ConstructionSiteStore::new());
        store
            .upsert_from_depot_status(1, snapshot(&[(10, "steel", 100, 0)]))
            .await
            .unwrap();
        let guard = store.lock_site(1).await.unwrap();

        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            store.upsert_from_depot_status(2, snapshot(&[(10, "steel", 100, 0)])),
        )
        .await
        .expect("market 2 blocked by market 1")
        .unwrap();
        assert_eq!(outcome, UpsertOutcome::Created);
        drop(guard);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_markets_keep_independent_fingerprints() {
        let store = Arc::new(ConstructionSiteStore::new());
        // Every market receives the identical payload, three times, interleaved.
        let mut tasks = Vec::new();
        for round in 0..3 {
            for market_id in 0..32u64 {
                let store = Arc::clone(&store);
                tasks.push(tokio::spawn(async move {
                    let outcome = store
                        .upsert_from_depot_status(market_id, snapshot(&[(10, "steel", 100, 5)]))
                        .await
                        .unwrap();
                    (round, market_id, outcome)
                }));
            }
        }

        let mut applied = vec![0u32; 32];
        for task in tasks {
            let (_, market_id, outcome) = task.await.unwrap();
            if outcome != UpsertOutcome::Unchanged {
                applied[market_id as usize] += 1;
            }
        }
        assert!(applied.iter().all(|n| *n == 1), "{applied:?}");

        for market_id in 0..32u64 {
            let expected = snapshot(&[(10, "steel", 100, 5)]).fingerprint(market_id);
            assert_eq!(store.fingerprint(market_id).await, Some(expected));
            assert_eq!(store.get(market_id).await.unwrap().total_delivered(), 5);
        }
    }

    #[tokio::test]
    async fn test_site_name_hint() {
        let store = ConstructionSiteStore::new();
        assert!(!store.record_site_name(9, "Orbital Construction Site: Ayres Hub").await);
        store
            .upsert_from_depot_status(9, snapshot(&[(10, "steel", 1, 0)]))
            .await
            .unwrap();
        assert_eq!(
            store.get(9).await.unwrap().site_id,
            "Orbital Construction Site: Ayres Hub"
        );

        store
            .upsert_from_depot_status(8, snapshot(&[(10, "steel", 1, 0)]))
            .await
            .unwrap();
        assert_eq!(store.get(8).await.unwrap().site_id, "STUB_8");
        assert!(store.record_site_name(8, "Hobbs Landing").await);
        assert!(!store.record_site_name(8, "Something Else").await);
        assert_eq!(store.get(8).await.unwrap().site_id, "Hobbs Landing");
    }

    #[tokio::test]
    async fn test_restore_clears_fingerprint() {
        let store = ConstructionSiteStore::new();
        let report = snapshot(&[(10, "steel", 100, 0)]);
        store.upsert_from_depot_status(4, report.clone()).await.unwrap();
        let site = store.get(4).await.unwrap();

        store.restore(site).await;
        assert!(store.fingerprint(4).await.is_none());
        let outcome = store.upsert_from_depot_status(4, report).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_progress_bounds_hold() {
        let store = ConstructionSiteStore::new();
        store
            .upsert_from_depot_status(1, snapshot(&[(10, "steel", 10, 0)]))
            .await
            .unwrap();
        store.apply_delivery(10, 500).await.unwrap();
        store.upsert_from_depot_status(2, snapshot(&[])).await.unwrap();

        for site in store.get_all().await {
            assert!(site.progress_percent() <= 100);
        }
        assert_eq!(store.get(1).await.unwrap().progress_percent(), 100);
        assert_eq!(store.get(2).await.unwrap().progress_percent(), 0);
    }
}
