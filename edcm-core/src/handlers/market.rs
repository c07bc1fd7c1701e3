use std::sync::Arc;

use async_trait::async_trait;
use compact_str::CompactString;
use edcm_sdk::journal::{MARKET, MarketEvent};
use tracing::{debug, info};

use super::{EventHandler, HandlerError, Lane};
use crate::entities::{Market, MarketItem};
use crate::events::JournalEvent;
use crate::stores::{CommodityRegistry, MarketStore};

/// Stores market snapshots read from `Market.json`.
///
/// The journal line of the same name has no item list and is skipped; the file written next to
/// it carries the data.
pub struct MarketSnapshotHandler {
    commodities: Arc<CommodityRegistry>,
    markets: Arc<MarketStore>,
}

impl MarketSnapshotHandler {
    pub fn new(commodities: Arc<CommodityRegistry>, markets: Arc<MarketStore>) -> Self {
        Self {
            commodities,
            markets,
        }
    }
}

#[async_trait]
impl EventHandler for MarketSnapshotHandler {
    fn name(&self) -> &'static str {
        "market_snapshot"
    }

    fn event_types(&self) -> &'static [&'static str] {
        &[MARKET]
    }

    fn lane(&self) -> Lane {
        Lane::Pool
    }

    async fn handle(&self, event: &JournalEvent) -> Result<(), HandlerError> {
        if event.field("Items").is_none() {
            debug!("Market event without items");
            return Ok(());
        }
        let payload: MarketEvent = event.decode().map_err(|e| HandlerError::decode(event, e))?;

        let mut market = Market::new(payload.market_id, payload.station_name.as_str());
        market.station_type = payload.station_type.as_deref().map(CompactString::from);
        market.system_name = payload.star_system.as_deref().map(CompactString::from);
        for entry in payload.items.unwrap_or_default() {
            let category = entry
                .category_localised
                .as_deref()
                .or(entry.category.as_deref());
            let commodity = self
                .commodities
                .register(entry.id, &entry.name, entry.name_localised.as_deref(), category)
                .await;
            market = market.with_item(MarketItem {
                commodity,
                buy_price: entry.buy_price,
                sell_price: entry.sell_price,
                stock: entry.stock,
                demand: entry.demand,
            });
        }

        let items = market.items.len();
        self.markets.replace_market(payload.market_id, market).await;
        info!(
            market_id = payload.market_id,
            station = %payload.station_name,
            items,
            "Market snapshot stored"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventOrigin;
    use std::path::Path;

    #[tokio::test]
    async fn test_market_file_replaces_snapshot() {
        let commodities = Arc::new(CommodityRegistry::new());
        let markets = Arc::new(MarketStore::new());
        let handler = MarketSnapshotHandler::new(Arc::clone(&commodities), Arc::clone(&markets));
        let origin = || EventOrigin::new(Path::new("Market.json"), 0);

        let journal_line = JournalEvent::parse(
            r#"{"event":"Market","MarketID":128666762,"StationName":"Obsidian Orbital"}"#,
            origin(),
        )
        .unwrap();
        handler.handle(&journal_line).await.unwrap();
        assert!(markets.is_empty().await);

        let file = JournalEvent::parse(
            r#"{"timestamp":"2025-04-12T18:30:00Z","event":"Market","MarketID":128666762,
               "StationName":"Obsidian Orbital","StationType":"Orbis","StarSystem":"Sol","Items":[
                 {"id":128049204,"Name":"$steel_name;","Name_Localised":"Steel","Category":"$MARKET_category_metals;",
                  "Category_Localised":"Metals","BuyPrice":4200,"SellPrice":4100,"Stock":9000,"Demand":0},
                 {"id":128049197,"Name":"$polymers_name;","Name_Localised":"Polymers","Category":"$MARKET_category_industrial_materials;",
                  "Category_Localised":"Industrial materials","BuyPrice":300,"SellPrice":280,"Stock":0,"Demand":1200}
               ]}"#,
            origin(),
        )
        .unwrap();
        handler.handle(&file).await.unwrap();

        let market = markets.get(128666762).await.unwrap();
        assert_eq!(market.station_name, "Obsidian Orbital");
        assert_eq!(market.system_name.as_deref(), Some("Sol"));
        assert_eq!(market.stock_of(128049204), 9000);
        assert_eq!(
            commodities
                .get(128049204)
                .await
                .unwrap()
                .category
                .as_deref(),
            Some("Metals")
        );
        assert_eq!(markets.find_candidates(&[128049197]).await.len(), 0);
    }
}
