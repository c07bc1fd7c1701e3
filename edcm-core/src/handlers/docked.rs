use std::sync::Arc;

use async_trait::async_trait;
use edcm_sdk::journal::{DOCKED, DockedEvent, LOCATION, LocationEvent};
use tracing::info;

use super::{EventHandler, HandlerError, Lane};
use crate::events::JournalEvent;
use crate::stores::ConstructionSiteStore;

/// Names construction sites after the station the commander docks at.
///
/// `Location` is handled too: a game started while docked writes no `Docked` event.
pub struct DockedHandler {
    sites: Arc<ConstructionSiteStore>,
}

impl DockedHandler {
    pub fn new(sites: Arc<ConstructionSiteStore>) -> Self {
        Self { sites }
    }
}

#[async_trait]
impl EventHandler for DockedHandler {
    fn name(&self) -> &'static str {
        "docked"
    }

    fn event_types(&self) -> &'static [&'static str] {
        &[DOCKED, LOCATION]
    }

    fn lane(&self) -> Lane {
        Lane::Pool
    }

    async fn handle(&self, event: &JournalEvent) -> Result<(), HandlerError> {
        let docked = if event.event_type == LOCATION {
            let location: LocationEvent =
                event.decode().map_err(|e| HandlerError::decode(event, e))?;
            match location.docked_at() {
                Some(docked) => docked,
                None => return Ok(()),
            }
        } else {
            event
                .decode::<DockedEvent>()
                .map_err(|e| HandlerError::decode(event, e))?
        };
        if !docked.is_construction_site() {
            return Ok(());
        }
        if self
            .sites
            .record_site_name(docked.market_id, &docked.station_name)
            .await
        {
            info!(
                market_id = docked.market_id,
                station = %docked.station_name,
                system = docked.star_system.as_deref().unwrap_or("?"),
                source = %event.event_type,
                "Construction site named"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventOrigin;
    use crate::stores::{DepotLine, DepotSnapshot};
    use std::path::Path;

    fn parse(line: &str) -> JournalEvent {
        JournalEvent::parse(line, EventOrigin::new(Path::new("Journal.log"), 0)).unwrap()
    }

    async fn stub_site(sites: &ConstructionSiteStore, market_id: u64) {
        let steel = Arc::new(crate::entities::Commodity {
            id: 1,
            name: "steel".into(),
            display_name: None,
            category: None,
        });
        let report = DepotSnapshot {
            lines: vec![DepotLine {
                commodity: steel,
                required: 100,
                provided: 0,
            }],
            ..Default::default()
        };
        sites.upsert_from_depot_status(market_id, report).await.unwrap();
    }

    #[tokio::test]
    async fn test_location_while_docked_names_site() {
        let sites = Arc::new(ConstructionSiteStore::new());
        stub_site(&sites, 42).await;
        let handler = DockedHandler::new(Arc::clone(&sites));

        handler
            .handle(&parse(
                r#"{"event":"Location","Docked":true,"StationName":"Orbital Construction Site: Ayres Hub","StationType":"SpaceConstructionDepot","StarSystem":"HIP 1","MarketID":42}"#,
            ))
            .await
            .unwrap();
        assert_eq!(
            sites.get(42).await.unwrap().site_id,
            "Orbital Construction Site: Ayres Hub"
        );
    }

    #[tokio::test]
    async fn test_location_in_space_is_ignored() {
        let sites = Arc::new(ConstructionSiteStore::new());
        stub_site(&sites, 42).await;
        let handler = DockedHandler::new(Arc::clone(&sites));

        handler
            .handle(&parse(r#"{"event":"Location","Docked":false,"StarSystem":"HIP 1"}"#))
            .await
            .unwrap();
        handler
            .handle(&parse(
                r#"{"event":"Docked","StationName":"Jameson Memorial","StationType":"Orbis","MarketID":42}"#,
            ))
            .await
            .unwrap();
        assert_eq!(sites.get(42).await.unwrap().site_id, "STUB_42");
    }
}
