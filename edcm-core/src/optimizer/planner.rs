//! Route planning against live stores.

use std::sync::Arc;

use edcm_sdk::MarketId;
use edcm_sdk::objects::{RequestError, RouteOptimizationRequest};
use thiserror::Error;
use tracing::{debug, info};

use super::{CandidateMarket, Demand, OptimizerError, RoutePlan, optimize};
use crate::stores::{CargoInventory, ConstructionSiteStore, MarketStore};

#[derive(Debug, Error)]
pub enum PlanError {
    /// No site is known for the requested market id.
    #[error("construction site {0} not found")]
    SiteNotFound(MarketId),

    /// The request itself is unusable.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] RequestError),

    /// The optimizer rejected its inputs.
    #[error("optimizer error: {0}")]
    Optimizer(#[from] OptimizerError),
}

/// Plans delivery runs from copies of the current store state.
///
/// Plans may be computed while ingestion continues; a plan reflects the state at the moment its
/// snapshots were taken.
pub struct RoutePlanner {
    sites: Arc<ConstructionSiteStore>,
    markets: Arc<MarketStore>,
    cargo: Arc<CargoInventory>,
    default_capacity: u64,
}

impl RoutePlanner {
    pub fn new(
        sites: Arc<ConstructionSiteStore>,
        markets: Arc<MarketStore>,
        cargo: Arc<CargoInventory>,
        default_capacity: u64,
    ) -> Self {
        Self {
            sites,
            markets,
            cargo,
            default_capacity,
        }
    }

    /// Capacity used when the request does not name one: the current ship's, else the default.
    pub async fn effective_capacity(&self, request: &RouteOptimizationRequest) -> u64 {
        if let Some(capacity) = request.cargo_capacity_tons {
            return capacity;
        }
        match self.cargo.capacity().await {
            Some(capacity) if capacity > 0 => capacity,
            _ => self.default_capacity,
        }
    }

    pub async fn plan(&self, request: &RouteOptimizationRequest) -> Result<RoutePlan, PlanError> {
        request.validate()?;
        let site_id = request.construction_site_id;
        let site = self
            .sites
            .get(site_id)
            .await
            .ok_or(PlanError::SiteNotFound(site_id))?;

        let demand: Vec<Demand> = site
            .outstanding()
            .into_iter()
            .map(|(commodity, remaining)| Demand {
                commodity,
                remaining,
            })
            .collect();
        let commodity_ids: Vec<_> = demand.iter().map(|d| d.commodity.id).collect();
        // The depot's own market only buys.
        let candidates: Vec<CandidateMarket> = self
            .markets
            .find_candidates(&commodity_ids)
            .await
            .iter()
            .filter(|m| m.market_id != site_id)
            .map(|m| CandidateMarket::from(&**m))
            .collect();
        let capacity = self.effective_capacity(request).await;
        debug!(
            site_id,
            outstanding = demand.len(),
            candidates = candidates.len(),
            capacity,
            "Planning delivery runs"
        );

        let plan = optimize(
            site_id,
            &demand,
            &candidates,
            capacity,
            request.max_markets_per_run,
        )?;
        info!(
            site_id,
            runs = plan.runs.len(),
            tons = plan.total_tonnage(),
            coverage = plan.coverage_fraction,
            "Route plan ready"
        );
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Commodity, Market, MarketItem};
    use crate::stores::{DepotLine, DepotSnapshot};

    fn commodity(id: u64, name: &str) -> Arc<Commodity> {
        Arc::new(Commodity {
            id,
            name: name.into(),
            display_name: None,
            category: None,
        })
    }

    fn item(commodity: &Arc<Commodity>, stock: u64) -> MarketItem {
        MarketItem {
            commodity: Arc::clone(commodity),
            buy_price: 1000,
            sell_price: 900,
            stock,
            demand: 0,
        }
    }

    async fn fixture() -> (RoutePlanner, Arc<CargoInventory>) {
        let steel = commodity(1, "steel");
        let sites = Arc::new(ConstructionSiteStore::new());
        sites
            .upsert_from_depot_status(
                500,
                DepotSnapshot {
                    lines: vec![DepotLine {
                        commodity: Arc::clone(&steel),
                        required: 100,
                        provided: 40,
                    }],
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let markets = Arc::new(MarketStore::new());
        markets
            .replace_market(500, Market::new(500, "Depot").with_item(item(&steel, 1000)))
            .await;
        markets
            .replace_market(7, Market::new(7, "Ayres Hub").with_item(item(&steel, 25)))
            .await;

        let cargo = Arc::new(CargoInventory::new());
        let planner = RoutePlanner::new(sites, markets, Arc::clone(&cargo), 50);
        (planner, cargo)
    }

    #[tokio::test]
    async fn test_plan_excludes_site_market_and_uses_default_capacity() {
        let (planner, _) = fixture().await;
        let plan = planner.plan(&RouteOptimizationRequest::new(500)).await.unwrap();
        assert_eq!(plan.runs.len(), 1);
        assert_eq!(plan.runs[0].legs[0].market_id, 7);
        assert_eq!(plan.total_tonnage(), 25);
        assert!((plan.coverage_fraction - 25.0 / 60.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_capacity_falls_back_to_ship() {
        let (planner, cargo) = fixture().await;
        let request = RouteOptimizationRequest::new(500);
        assert_eq!(planner.effective_capacity(&request).await, 50);
        cargo.set_ship("type6", 16).await;
        assert_eq!(planner.effective_capacity(&request).await, 16);

        let plan = planner.plan(&request).await.unwrap();
        let tonnages: Vec<_> = plan.runs.iter().map(|r| r.total_tonnage).collect();
        assert_eq!(tonnages, [16, 9]);
    }

    #[tokio::test]
    async fn test_unknown_site_and_bad_request() {
        let (planner, _) = fixture().await;
        let err = planner.plan(&RouteOptimizationRequest::new(1)).await.unwrap_err();
        assert!(matches!(err, PlanError::SiteNotFound(1)));

        let mut request = RouteOptimizationRequest::new(500);
        request.cargo_capacity_tons = Some(0);
        let err = planner.plan(&request).await.unwrap_err();
        assert!(matches!(err, PlanError::InvalidRequest(RequestError::NonPositiveCapacity)));
    }
}
