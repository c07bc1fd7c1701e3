use std::sync::Arc;

use async_trait::async_trait;
use edcm_sdk::journal::{COLONISATION_CONTRIBUTION, ColonisationContributionEvent};
use tracing::{debug, warn};

use super::{EventHandler, HandlerError, Lane};
use crate::events::JournalEvent;
use crate::stores::{CargoInventory, CommodityRegistry, ConstructionSiteStore};

/// Applies `ColonisationContribution` deliveries to every open requirement and takes the
/// delivered tons out of the hold. Ordered with the other cargo events.
pub struct ContributionHandler {
    commodities: Arc<CommodityRegistry>,
    sites: Arc<ConstructionSiteStore>,
    cargo: Arc<CargoInventory>,
}

impl ContributionHandler {
    pub fn new(
        commodities: Arc<CommodityRegistry>,
        sites: Arc<ConstructionSiteStore>,
        cargo: Arc<CargoInventory>,
    ) -> Self {
        Self {
            commodities,
            sites,
            cargo,
        }
    }
}

#[async_trait]
impl EventHandler for ContributionHandler {
    fn name(&self) -> &'static str {
        "contribution"
    }

    fn event_types(&self) -> &'static [&'static str] {
        &[COLONISATION_CONTRIBUTION]
    }

    fn lane(&self) -> Lane {
        Lane::Ordered
    }

    async fn handle(&self, event: &JournalEvent) -> Result<(), HandlerError> {
        let payload: ColonisationContributionEvent =
            event.decode().map_err(|e| HandlerError::decode(event, e))?;

        // A bad line must not keep the valid ones from being applied.
        let mut first_error = None;
        for contribution in &payload.contributions {
            let commodity = self
                .commodities
                .resolve(&contribution.name, contribution.name_localised.as_deref())
                .await;
            match self
                .sites
                .apply_delivery_from(commodity.id, contribution.amount, Some(&event.origin))
                .await
            {
                Ok(0) => warn!(
                    market_id = payload.market_id,
                    commodity = %commodity.name,
                    amount = contribution.amount,
                    "Contribution matched no open requirement"
                ),
                Ok(updated) => debug!(
                    market_id = payload.market_id,
                    commodity = %commodity.name,
                    amount = contribution.amount,
                    updated,
                    "Contribution applied"
                ),
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                    continue;
                }
            }
            self.cargo.apply_delta(commodity.id, -contribution.amount).await;
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}
