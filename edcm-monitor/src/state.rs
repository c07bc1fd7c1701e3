//! Stores shared by the pipeline, the reporter and the planner.

use std::sync::Arc;

use edcm_core::handlers::HandlerRegistry;
use edcm_core::optimizer::RoutePlanner;
use edcm_core::stores::{CargoInventory, CommodityRegistry, ConstructionSiteStore, MarketStore};

/// Application state shared across all tasks.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone, Default)]
pub struct AppState {
    pub commodities: Arc<CommodityRegistry>,
    pub sites: Arc<ConstructionSiteStore>,
    pub markets: Arc<MarketStore>,
    pub cargo: Arc<CargoInventory>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler registry with every built-in handler wired to these stores.
    pub fn handler_registry(&self) -> HandlerRegistry {
        HandlerRegistry::with_default_handlers(
            Arc::clone(&self.commodities),
            Arc::clone(&self.sites),
            Arc::clone(&self.markets),
            Arc::clone(&self.cargo),
        )
    }

    pub fn route_planner(&self, default_capacity: u64) -> RoutePlanner {
        RoutePlanner::new(
            Arc::clone(&self.sites),
            Arc::clone(&self.markets),
            Arc::clone(&self.cargo),
            default_capacity,
        )
    }
}
