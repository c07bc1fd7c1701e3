use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use edcm_sdk::journal::{
    CARGO, CARGO_TRANSFER, CargoEvent, CargoTransferEvent, LOADOUT, LoadoutEvent, TransferDirection,
};
use tracing::{debug, info};

use super::{EventHandler, HandlerError, Lane};
use crate::events::JournalEvent;
use crate::stores::{CargoInventory, CommodityRegistry};

/// Keeps the [`CargoInventory`] in step with the journal.
///
/// Hold contents are a running sum of deltas, so these events must be applied in order.
pub struct CargoHandler {
    commodities: Arc<CommodityRegistry>,
    cargo: Arc<CargoInventory>,
}

impl CargoHandler {
    pub fn new(commodities: Arc<CommodityRegistry>, cargo: Arc<CargoInventory>) -> Self {
        Self { commodities, cargo }
    }

    async fn on_cargo(&self, payload: CargoEvent) {
        // Cargo of the SRV is reported with its own vessel tag.
        if payload.vessel.as_deref().is_some_and(|v| v != "Ship") {
            return;
        }
        let Some(inventory) = payload.inventory else {
            debug!("Cargo event without inventory");
            return;
        };
        let mut counts = BTreeMap::new();
        for item in &inventory {
            let commodity = self
                .commodities
                .resolve(&item.name, item.name_localised.as_deref())
                .await;
            *counts.entry(commodity.id).or_insert(0) += item.count;
        }
        debug!(total = payload.count, kinds = counts.len(), "Cargo snapshot");
        self.cargo.replace(counts).await;
    }

    async fn on_transfer(&self, payload: CargoTransferEvent) {
        for transfer in &payload.transfers {
            let commodity = self
                .commodities
                .resolve(&transfer.commodity, transfer.commodity_localised.as_deref())
                .await;
            let delta = match transfer.direction {
                TransferDirection::Toship => transfer.count,
                TransferDirection::Tocarrier => -transfer.count,
            };
            self.cargo.apply_delta(commodity.id, delta).await;
        }
    }
}

#[async_trait]
impl EventHandler for CargoHandler {
    fn name(&self) -> &'static str {
        "cargo"
    }

    fn event_types(&self) -> &'static [&'static str] {
        &[CARGO, CARGO_TRANSFER, LOADOUT]
    }

    fn lane(&self) -> Lane {
        Lane::Ordered
    }

    async fn handle(&self, event: &JournalEvent) -> Result<(), HandlerError> {
        let decode_err = |e| HandlerError::decode(event, e);
        match event.event_type.as_str() {
            CARGO => self.on_cargo(event.decode().map_err(decode_err)?).await,
            CARGO_TRANSFER => self.on_transfer(event.decode().map_err(decode_err)?).await,
            LOADOUT => {
                let loadout: LoadoutEvent = event.decode().map_err(decode_err)?;
                info!(
                    ship = %loadout.ship,
                    name = %loadout.ship_name,
                    capacity = loadout.cargo_capacity,
                    "Ship loadout"
                );
                self.cargo
                    .set_ship(&loadout.ship, loadout.cargo_capacity)
                    .await;
            }
            _ => {}
        }
        Ok(())
    }
}
