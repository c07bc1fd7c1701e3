//! Greedy multi-run route optimization.
//!
//! [`optimize`] is a pure function over copies of store state. Each run starts at the market
//! holding the most of the scarcest commodity (least market stock relative to its remaining
//! demand), buys everything outstanding it can carry there, then visits further markets for the
//! next scarcest commodities until the hold is full or the leg limit is reached. Runs repeat until
//! demand is met or no market can supply what is left.
//!
//! The result is not optimal, only deterministic: every tie is broken by id.

pub mod plan;
pub mod planner;

pub use plan::{DeliveryRun, Purchase, RoutePlan, RunLeg};
pub use planner::{PlanError, RoutePlanner};

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use compact_str::CompactString;
use edcm_sdk::{CommodityId, MarketId};
use smallvec::SmallVec;

use crate::entities::{Commodity, Market};

/// Outstanding demand for one commodity.
#[derive(Debug, Clone)]
pub struct Demand {
    pub commodity: Arc<Commodity>,
    pub remaining: u64,
}

/// A market's stock as seen by the optimizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateMarket {
    pub market_id: MarketId,
    pub name: CompactString,
    pub stock: BTreeMap<CommodityId, u64>,
}

impl From<&Market> for CandidateMarket {
    fn from(value: &Market) -> Self {
        Self {
            market_id: value.market_id,
            name: value.station_name.clone(),
            stock: value
                .items
                .iter()
                .filter(|(_, item)| item.stock > 0)
                .map(|(id, item)| (*id, item.stock))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptimizerError {
    /// A run must be able to carry something.
    #[error("cargo capacity must be positive")]
    NonPositiveCapacity,
}

/// Plan delivery runs for `site_id`.
///
/// `max_legs` of 0 is treated as 1.
pub fn optimize(
    site_id: MarketId,
    demand: &[Demand],
    markets: &[CandidateMarket],
    capacity: u64,
    max_legs: u32,
) -> Result<RoutePlan, OptimizerError> {
    if capacity == 0 {
        return Err(OptimizerError::NonPositiveCapacity);
    }
    let max_legs = max_legs.max(1) as usize;

    let mut state = State::new(demand, markets);
    let original: u64 = state.remaining.values().sum();

    let mut runs = Vec::new();
    while let Some(run) = state.next_run(capacity, max_legs, runs.len() as u32 + 1) {
        runs.push(run);
    }

    let left: u64 = state.remaining.values().sum();
    let coverage_fraction = if original == 0 {
        0.0
    } else {
        (original - left) as f64 / original as f64
    };
    Ok(RoutePlan {
        construction_site_id: site_id,
        runs,
        coverage_fraction,
    })
}

// -- Private helpers ----------------------------------------------------

/// Working copy of demand and stock. Purchases are subtracted here, never from the stores.
struct State {
    remaining: BTreeMap<CommodityId, u64>,
    names: BTreeMap<CommodityId, CompactString>,
    /// Ordered by market id.
    markets: Vec<CandidateMarket>,
}

impl State {
    fn new(demand: &[Demand], markets: &[CandidateMarket]) -> Self {
        let mut remaining = BTreeMap::new();
        let mut names = BTreeMap::new();
        for d in demand.iter().filter(|d| d.remaining > 0) {
            *remaining.entry(d.commodity.id).or_insert(0) += d.remaining;
            names
                .entry(d.commodity.id)
                .or_insert_with(|| CompactString::from(d.commodity.label()));
        }

        let mut markets: Vec<CandidateMarket> = markets
            .iter()
            .map(|m| CandidateMarket {
                market_id: m.market_id,
                name: m.name.clone(),
                stock: m
                    .stock
                    .iter()
                    .filter(|(id, stock)| **stock > 0 && remaining.contains_key(*id))
                    .map(|(id, stock)| (*id, *stock))
                    .collect(),
            })
            .collect();
        markets.sort_by_key(|m| m.market_id);
        markets.dedup_by_key(|m| m.market_id);

        Self {
            remaining,
            names,
            markets,
        }
    }

    /// Outstanding commodities with stock somewhere, most scarce first.
    fn scarcity_ranking(&self) -> Vec<CommodityId> {
        let mut ranked: Vec<(CommodityId, u64, u64)> = self
            .remaining
            .iter()
            .filter(|(_, remaining)| **remaining > 0)
            .map(|(id, remaining)| {
                let stock = self.markets.iter().map(|m| m.stock_of(*id)).sum::<u64>();
                (*id, stock, *remaining)
            })
            .filter(|(_, stock, _)| *stock > 0)
            .collect();
        ranked.sort_by(|a, b| compare_scarcity(a, b).then(a.0.cmp(&b.0)));
        ranked.into_iter().map(|(id, _, _)| id).collect()
    }

    /// Index of the market with the most stock of `commodity`, skipping `visited`.
    fn best_market_for(&self, commodity: CommodityId, visited: &[usize]) -> Option<usize> {
        // Markets are sorted by id, so keeping the first maximum breaks ties by id.
        let mut best: Option<(usize, u64)> = None;
        for (index, market) in self.markets.iter().enumerate() {
            if visited.contains(&index) {
                continue;
            }
            let stock = market.stock_of(commodity);
            if stock > 0 && best.is_none_or(|(_, s)| stock > s) {
                best = Some((index, stock));
            }
        }
        best.map(|(index, _)| index)
    }

    fn next_run(&mut self, capacity: u64, max_legs: usize, run_index: u32) -> Option<DeliveryRun> {
        let ranking = self.scarcity_ranking();
        let primary = self.best_market_for(*ranking.first()?, &[])?;

        let mut capacity_left = capacity;
        let mut visited = vec![primary];
        let mut legs = vec![self.buy_at(primary, &ranking, &mut capacity_left)];

        while capacity_left > 0 && legs.len() < max_legs {
            let ranking = self.scarcity_ranking();
            let Some(next) = ranking
                .iter()
                .find_map(|commodity| self.best_market_for(*commodity, &visited))
            else {
                break;
            };
            visited.push(next);
            legs.push(self.buy_at(next, &ranking, &mut capacity_left));
        }

        let run = DeliveryRun::close(run_index, legs);
        (run.total_tonnage > 0).then_some(run)
    }

    /// Buy every outstanding commodity the market has, in `ranking` order, within capacity.
    fn buy_at(&mut self, index: usize, ranking: &[CommodityId], capacity_left: &mut u64) -> RunLeg {
        let mut purchases = SmallVec::new();
        for commodity in ranking {
            if *capacity_left == 0 {
                break;
            }
            let remaining = self.remaining.get(commodity).copied().unwrap_or(0);
            let stock = self.markets[index].stock_of(*commodity);
            let tons = remaining.min(stock).min(*capacity_left);
            if tons == 0 {
                continue;
            }
            *capacity_left -= tons;
            if let Some(r) = self.remaining.get_mut(commodity) {
                *r -= tons;
            }
            if let Some(s) = self.markets[index].stock.get_mut(commodity) {
                *s -= tons;
            }
            purchases.push(Purchase {
                commodity_id: *commodity,
                material_name: self.names.get(commodity).cloned().unwrap_or_default(),
                tons,
            });
        }
        let market = &self.markets[index];
        RunLeg {
            market_id: market.market_id,
            market_name: market.name.clone(),
            purchases,
        }
    }
}

impl CandidateMarket {
    pub fn stock_of(&self, commodity: CommodityId) -> u64 {
        self.stock.get(&commodity).copied().unwrap_or(0)
    }
}

/// Compare `stock / remaining` ratios exactly.
fn compare_scarcity(a: &(CommodityId, u64, u64), b: &(CommodityId, u64, u64)) -> Ordering {
    let (_, stock_a, rem_a) = *a;
    let (_, stock_b, rem_b) = *b;
    (u128::from(stock_a) * u128::from(rem_b)).cmp(&(u128::from(stock_b) * u128::from(rem_a)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demand(id: CommodityId, name: &str, remaining: u64) -> Demand {
        Demand {
            commodity: Arc::new(Commodity {
                id,
                name: name.into(),
                display_name: None,
                category: None,
            }),
            remaining,
        }
    }

    fn market(id: MarketId, stock: &[(CommodityId, u64)]) -> CandidateMarket {
        CandidateMarket {
            market_id: id,
            name: format!("Market {id}").into(),
            stock: stock.iter().copied().collect(),
        }
    }

    const STEEL: CommodityId = 1;
    const POLYMERS: CommodityId = 2;

    #[test]
    fn test_single_market_covers_everything_in_one_leg() {
        let plan = optimize(
            99,
            &[demand(STEEL, "steel", 10), demand(POLYMERS, "polymers", 5)],
            &[market(1, &[(STEEL, 50), (POLYMERS, 50)])],
            100,
            2,
        )
        .unwrap();

        assert_eq!(plan.runs.len(), 1);
        assert_eq!(plan.runs[0].legs.len(), 1);
        assert_eq!(plan.runs[0].total_tonnage, 15);
        assert_eq!(plan.coverage_fraction, 1.0);
        assert_eq!(plan.runs[0].materials_summary.get("steel"), Some(&10));
        assert_eq!(plan.runs[0].materials_summary.get("polymers"), Some(&5));
    }

    #[test]
    fn test_scarce_commodity_picks_primary_then_secondary() {
        const RARE: CommodityId = 10;
        const COMMON: CommodityId = 11;
        let plan = optimize(
            99,
            &[demand(RARE, "rare", 4), demand(COMMON, "common", 4)],
            &[
                market(2, &[(COMMON, 10)]),
                market(1, &[(RARE, 4), (COMMON, 2)]),
            ],
            10,
            2,
        )
        .unwrap();

        assert_eq!(plan.runs.len(), 1);
        let run = &plan.runs[0];
        assert_eq!(run.legs.len(), 2);
        assert_eq!(run.legs[0].market_id, 1);
        assert_eq!(run.legs[1].market_id, 2);
        assert_eq!(run.total_tonnage, 8);
        assert_eq!(run.legs[0].purchases[0].material_name, "rare");
        assert_eq!(run.legs[1].tonnage(), 2);
        assert_eq!(plan.coverage_fraction, 1.0);
    }

    #[test]
    fn test_capacity_splits_into_runs() {
        let plan = optimize(
            99,
            &[demand(3, "components", 25)],
            &[market(1, &[(3, 40)])],
            10,
            2,
        )
        .unwrap();
        let tonnages: Vec<_> = plan.runs.iter().map(|r| r.total_tonnage).collect();
        assert_eq!(tonnages, [10, 10, 5]);
        let indices: Vec<_> = plan.runs.iter().map(|r| r.run_index).collect();
        assert_eq!(indices, [1, 2, 3]);
        assert_eq!(plan.coverage_fraction, 1.0);
    }

    #[test]
    fn test_short_stock_gives_partial_coverage() {
        let plan = optimize(99, &[demand(4, "alloys", 30)], &[market(1, &[(4, 20)])], 15, 2)
            .unwrap();
        let tonnages: Vec<_> = plan.runs.iter().map(|r| r.total_tonnage).collect();
        assert_eq!(tonnages, [15, 5]);
        assert!((plan.coverage_fraction - 20.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_markets_gives_empty_plan() {
        let plan = optimize(99, &[demand(STEEL, "steel", 10)], &[], 100, 2).unwrap();
        assert!(plan.runs.is_empty());
        assert_eq!(plan.coverage_fraction, 0.0);
    }

    #[test]
    fn test_zero_demand_has_zero_coverage() {
        let plan = optimize(99, &[], &[market(1, &[(STEEL, 5)])], 100, 2).unwrap();
        assert!(plan.runs.is_empty());
        assert_eq!(plan.coverage_fraction, 0.0);
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let err = optimize(99, &[demand(STEEL, "steel", 10)], &[], 0, 2).unwrap_err();
        assert_eq!(err, OptimizerError::NonPositiveCapacity);
    }

    #[test]
    fn test_unsupplied_commodity_lowers_coverage() {
        let plan = optimize(
            99,
            &[demand(STEEL, "steel", 10), demand(POLYMERS, "polymers", 10)],
            &[market(1, &[(STEEL, 100)])],
            100,
            3,
        )
        .unwrap();
        assert_eq!(plan.total_tonnage(), 10);
        assert_eq!(plan.coverage_fraction, 0.5);
    }

    #[test]
    fn test_leg_limit_is_respected() {
        let plan = optimize(
            99,
            &[demand(1, "a", 5), demand(2, "b", 5), demand(3, "c", 5)],
            &[market(10, &[(1, 5)]), market(11, &[(2, 5)]), market(12, &[(3, 5)])],
            100,
            0,
        )
        .unwrap();
        assert!(plan.runs.iter().all(|r| r.legs.len() == 1));
        assert_eq!(plan.runs.len(), 3);
        assert_eq!(plan.coverage_fraction, 1.0);
    }

    #[test]
    fn test_identical_inputs_give_identical_plans() {
        let demand = [demand(1, "a", 30), demand(2, "b", 30), demand(3, "c", 30)];
        let markets = [
            market(12, &[(1, 10), (2, 10)]),
            market(10, &[(1, 10), (3, 10)]),
            market(11, &[(2, 10), (3, 10)]),
        ];
        let first = optimize(99, &demand, &markets, 12, 2).unwrap();
        for _ in 0..10 {
            assert_eq!(optimize(99, &demand, &markets, 12, 2).unwrap(), first);
        }
        // Equal ratios everywhere: ties go to the lowest commodity id, then market id.
        assert_eq!(first.runs[0].legs[0].market_id, 10);
        assert_eq!(first.runs[0].legs[0].purchases[0].commodity_id, 1);
    }
}
