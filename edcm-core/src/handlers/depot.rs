use std::sync::Arc;

use async_trait::async_trait;
use edcm_sdk::journal::{CONSTRUCTION_DEPOT, ConstructionDepotEvent};
use tracing::{debug, info};

use super::{EventHandler, HandlerError, Lane};
use crate::events::JournalEvent;
use crate::stores::{CommodityRegistry, ConstructionSiteStore, DepotLine, DepotSnapshot, UpsertOutcome};

/// Applies `ColonisationConstructionDepot` reports to the site store.
///
/// Reports for different markets are independent, so this runs on the pool; the store's
/// per-market fingerprint keeps repeated reports idempotent under any interleaving.
pub struct ConstructionDepotHandler {
    commodities: Arc<CommodityRegistry>,
    sites: Arc<ConstructionSiteStore>,
}

impl ConstructionDepotHandler {
    pub fn new(commodities: Arc<CommodityRegistry>, sites: Arc<ConstructionSiteStore>) -> Self {
        Self { commodities, sites }
    }
}

#[async_trait]
impl EventHandler for ConstructionDepotHandler {
    fn name(&self) -> &'static str {
        "construction_depot"
    }

    fn event_types(&self) -> &'static [&'static str] {
        &[CONSTRUCTION_DEPOT]
    }

    fn lane(&self) -> Lane {
        Lane::Pool
    }

    async fn handle(&self, event: &JournalEvent) -> Result<(), HandlerError> {
        let depot: ConstructionDepotEvent =
            event.decode().map_err(|e| HandlerError::decode(event, e))?;

        let mut lines = Vec::with_capacity(depot.resources_required.len());
        for resource in &depot.resources_required {
            let commodity = self
                .commodities
                .resolve(&resource.name, resource.name_localised.as_deref())
                .await;
            lines.push(DepotLine {
                commodity,
                required: resource.required_amount,
                provided: resource.provided_amount,
            });
        }
        let requirements = lines.len();
        let snapshot = DepotSnapshot {
            lines,
            complete: depot.construction_complete,
            failed: depot.construction_failed,
            observed_at: event.timestamp,
            origin: Some(event.origin.clone()),
        };

        match self
            .sites
            .upsert_from_depot_status(depot.market_id, snapshot)
            .await?
        {
            UpsertOutcome::Created => {
                info!(market_id = depot.market_id, requirements, "New construction site")
            }
            UpsertOutcome::Updated => info!(
                market_id = depot.market_id,
                progress = depot.construction_progress,
                "Construction site updated"
            ),
            UpsertOutcome::Unchanged => {
                debug!(market_id = depot.market_id, "Duplicate depot report")
            }
        }
        Ok(())
    }
}
