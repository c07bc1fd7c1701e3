//! State persisted between runs.
//!
//! The snapshot holds the site and market DTOs. Dedup fingerprints are not persisted, so the first
//! depot report after a restart is always applied on top of the restored progress.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use edcm_core::entities::{ConstructionSite, Market, MaterialRequirement};
use edcm_sdk::objects::{ConstructionSiteDto, MarketDto};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::state::AppState;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub sites: Vec<ConstructionSiteDto>,
    #[serde(default)]
    pub markets: Vec<MarketDto>,
}

impl Snapshot {
    /// Copy the current state out of the stores.
    pub async fn capture(state: &AppState) -> Self {
        let sites = state
            .sites
            .get_all()
            .await
            .iter()
            .map(ConstructionSiteDto::from)
            .collect();
        let markets = state
            .markets
            .get_all()
            .await
            .iter()
            .map(|m| MarketDto::from(&**m))
            .collect();
        Self { sites, markets }
    }

    /// Read a snapshot file. `Ok(None)` if it does not exist yet.
    pub fn load(path: &Path) -> Result<Option<Self>, SnapshotError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SnapshotError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Write atomically: write to a temp file, then rename over the target.
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let json = serde_json::to_string_pretty(self)?;
        let io_err = |source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        };
        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, json).map_err(io_err)?;
        std::fs::rename(&temp_path, path).map_err(io_err)?;
        Ok(())
    }

    /// Load every site and market into the stores.
    ///
    /// Commodities are interned into the registry first, so restored entities share the same
    /// `Arc<Commodity>` as entities created by later events.
    pub async fn restore_into(self, state: &AppState) {
        let site_count = self.sites.len();
        let market_count = self.markets.len();

        for dto in self.sites {
            let mut site = ConstructionSite::from(dto);
            let mut requirements: Vec<MaterialRequirement> =
                Vec::with_capacity(site.requirements.len());
            for mut requirement in site.requirements {
                requirement.commodity = state.commodities.intern(&requirement.commodity).await;
                if requirements
                    .iter()
                    .any(|r| r.commodity.id == requirement.commodity.id)
                {
                    warn!(
                        market_id = site.market_id,
                        commodity = %requirement.commodity.name,
                        "Dropping duplicate requirement from snapshot"
                    );
                    continue;
                }
                requirements.push(requirement);
            }
            site.requirements = requirements;
            state.sites.restore(site).await;
        }

        for dto in self.markets {
            let mut market = Market::from(dto);
            let mut items = BTreeMap::new();
            for (_, mut item) in std::mem::take(&mut market.items) {
                item.commodity = state.commodities.intern(&item.commodity).await;
                items.insert(item.commodity.id, item);
            }
            market.items = items;
            state.markets.replace_market(market.market_id, market).await;
        }

        info!(
            sites = site_count,
            markets = market_count,
            "Restored state from snapshot"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edcm_core::entities::{Commodity, MarketItem};
    use std::sync::Arc;

    fn commodity(id: u64, name: &str, display: &str) -> Arc<Commodity> {
        Arc::new(Commodity {
            id,
            name: name.into(),
            display_name: Some(display.into()),
            category: Some("Metals".into()),
        })
    }

    async fn seeded_state() -> AppState {
        let state = AppState::new();
        let steel = commodity(128049204, "steel", "Steel");

        let mut site = ConstructionSite::new(3957677570);
        site.site_id = "Planetary Construction Site: Hobbs Landing".into();
        let mut requirement = MaterialRequirement::new(Arc::clone(&steel), 6000);
        requirement.delivered = 1500;
        site.requirements.push(requirement);
        state.sites.restore(site).await;

        let market = Market::new(128666762, "Obsidian Orbital").with_item(MarketItem {
            commodity: steel,
            buy_price: 4200,
            sell_price: 4100,
            stock: 9000,
            demand: 0,
        });
        state.markets.replace_market(128666762, market).await;
        state
    }

    #[tokio::test]
    async fn test_save_and_restore() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let original = Snapshot::capture(&seeded_state().await).await;
        original.save(&path).unwrap();
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = Snapshot::load(&path).unwrap().unwrap();
        assert_eq!(loaded, original);

        let restored = AppState::new();
        loaded.restore_into(&restored).await;

        let site = restored.sites.get(3957677570).await.unwrap();
        assert_eq!(site.site_id, "Planetary Construction Site: Hobbs Landing");
        assert_eq!(site.requirements[0].remaining(), 4500);
        assert_eq!(site.progress_percent(), 25);

        let market = restored.markets.get(128666762).await.unwrap();
        let steel = restored.commodities.find("$Steel_name;").await.unwrap();
        assert_eq!(steel.id, 128049204);
        assert_eq!(market.stock_of(steel.id), 9000);
        // Site and market share the registry's instance.
        assert!(Arc::ptr_eq(&site.requirements[0].commodity, &steel));

        assert_eq!(Snapshot::capture(&restored).await, original);
    }

    #[test]
    fn test_missing_snapshot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Snapshot::load(&dir.path().join("absent.json")).unwrap().is_none());
    }

    #[test]
    fn test_malformed_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{\"sites\": 3}").unwrap();
        assert!(matches!(
            Snapshot::load(&path).unwrap_err(),
            SnapshotError::Json(_)
        ));
    }
}
