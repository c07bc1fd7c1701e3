//! Commodity identity.
//!
//! Market data carries the game's numeric commodity ids; depot reports, contributions and cargo
//! events carry names only. The registry maps every spelling of a commodity to one id for the
//! lifetime of the process.

use std::collections::HashMap;
use std::sync::Arc;

use compact_str::CompactString;
use edcm_sdk::CommodityId;
use edcm_sdk::names::{normalize_localised_name, normalize_system_name};
use tokio::sync::RwLock;
use tracing::debug;

use crate::entities::Commodity;

/// Ids handed out for names not yet seen in market data start here, far above the game's range.
pub const PROVISIONAL_ID_BASE: CommodityId = 1 << 48;

#[derive(Default)]
pub struct CommodityRegistry {
    inner: RwLock<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    by_id: HashMap<CommodityId, Arc<Commodity>>,
    by_name: HashMap<CompactString, CommodityId>,
    by_localised: HashMap<CompactString, CommodityId>,
    provisional_issued: u64,
}

impl RegistryInner {
    fn lookup(&self, name: &str, localised: Option<&str>) -> Option<Arc<Commodity>> {
        let id = self.by_name.get(name).or_else(|| {
            localised
                .and_then(normalize_localised_name)
                .and_then(|key| self.by_localised.get(&key))
        })?;
        self.by_id.get(id).cloned()
    }

    fn insert(&mut self, commodity: Commodity) -> Arc<Commodity> {
        let commodity = Arc::new(commodity);
        self.by_name.insert(commodity.name.clone(), commodity.id);
        if let Some(key) = commodity
            .display_name
            .as_deref()
            .and_then(normalize_localised_name)
        {
            self.by_localised.entry(key).or_insert(commodity.id);
        }
        self.by_id.insert(commodity.id, Arc::clone(&commodity));
        commodity
    }
}

impl CommodityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a commodity seen in market data.
    ///
    /// The first id seen for a name wins: if the name is already known, under a provisional id or
    /// otherwise, the existing commodity is returned and `id` is ignored.
    pub async fn register(
        &self,
        id: CommodityId,
        raw_name: &str,
        localised: Option<&str>,
        category: Option<&str>,
    ) -> Arc<Commodity> {
        let name = normalize_system_name(raw_name);
        if let Some(existing) = self.inner.read().await.lookup(&name, localised) {
            return existing;
        }

        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.lookup(&name, localised) {
            return existing;
        }
        if let Some(taken) = inner.by_id.get(&id) {
            // Same id, different spelling: alias the new name.
            let taken = Arc::clone(taken);
            inner.by_name.insert(name, taken.id);
            return taken;
        }
        inner.insert(Commodity {
            id,
            name,
            display_name: localised.map(CompactString::from),
            category: category.map(CompactString::from),
        })
    }

    /// Re-register a commodity restored from persistence.
    pub async fn intern(&self, commodity: &Commodity) -> Arc<Commodity> {
        self.register(
            commodity.id,
            &commodity.name,
            commodity.display_name.as_deref(),
            commodity.category.as_deref(),
        )
        .await
    }

    /// Resolve a commodity named by an event, registering a provisional id if it is unknown.
    pub async fn resolve(&self, raw_name: &str, localised: Option<&str>) -> Arc<Commodity> {
        let name = normalize_system_name(raw_name);
        if let Some(existing) = self.inner.read().await.lookup(&name, localised) {
            return existing;
        }

        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.lookup(&name, localised) {
            return existing;
        }
        let id = PROVISIONAL_ID_BASE + inner.provisional_issued;
        inner.provisional_issued += 1;
        debug!(commodity = %name, id, "Registered provisional commodity");
        inner.insert(Commodity {
            id,
            name,
            display_name: localised.map(CompactString::from),
            category: None,
        })
    }

    pub async fn get(&self, id: CommodityId) -> Option<Arc<Commodity>> {
        self.inner.read().await.by_id.get(&id).cloned()
    }

    /// Look up by any spelling without registering.
    pub async fn find(&self, raw_name: &str) -> Option<Arc<Commodity>> {
        let name = normalize_system_name(raw_name);
        self.inner.read().await.lookup(&name, Some(raw_name))
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
