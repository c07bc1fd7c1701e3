//! The commander's ship and cargo hold.

use std::collections::BTreeMap;

use compact_str::CompactString;
use edcm_sdk::CommodityId;
use tokio::sync::RwLock;
use tracing::debug;

/// Copy of the inventory state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CargoSnapshot {
    pub ship: Option<CompactString>,
    pub capacity: Option<u64>,
    /// `false` until a full `Cargo` snapshot has been seen for the current ship.
    pub known: bool,
    pub counts: BTreeMap<CommodityId, u64>,
}

impl CargoSnapshot {
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }
}

/// Ship cargo, fed by the ordered lane only.
#[derive(Default)]
pub struct CargoInventory {
    state: RwLock<CargoSnapshot>,
}

impl CargoInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A different ship invalidates the hold contents until the next full snapshot.
    pub async fn set_ship(&self, ship: &str, capacity: u64) {
        let mut state = self.state.write().await;
        if state.ship.as_deref() != Some(ship) {
            state.known = false;
            state.counts.clear();
        }
        state.ship = Some(CompactString::from(ship));
        state.capacity = Some(capacity);
    }

    /// Replace the hold contents.
    pub async fn replace(&self, counts: BTreeMap<CommodityId, u64>) {
        let mut state = self.state.write().await;
        state.counts = counts;
        state.counts.retain(|_, count| *count > 0);
        state.known = true;
    }

    /// Adjust one commodity. Ignored until the contents are known; counts floor at zero.
    ///
    /// Returns `false` if the delta was ignored.
    pub async fn apply_delta(&self, commodity_id: CommodityId, delta: i64) -> bool {
        let mut state = self.state.write().await;
        if !state.known {
            debug!(commodity_id, delta, "Cargo contents unknown, ignoring delta");
            return false;
        }
        let current = state.counts.get(&commodity_id).copied().unwrap_or(0);
        let next = current.saturating_add_signed(delta);
        if next == 0 {
            state.counts.remove(&commodity_id);
        } else {
            state.counts.insert(commodity_id, next);
        }
        true
    }

    pub async fn count_of(&self, commodity_id: CommodityId) -> u64 {
        self.state.read().await.counts.get(&commodity_id).copied().unwrap_or(0)
    }

    pub async fn capacity(&self) -> Option<u64> {
        self.state.read().await.capacity
    }

    pub async fn snapshot(&self) -> CargoSnapshot {
        self.state.read().await.clone()
    }
}
