//! Route plan types.

use std::collections::BTreeMap;

use compact_str::CompactString;
use edcm_sdk::objects::{DeliveryRunDto, PurchaseDto, RoutePlanDto, RunLegDto};
use edcm_sdk::{CommodityId, MarketId};
use smallvec::SmallVec;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    pub commodity_id: CommodityId,
    pub material_name: CompactString,
    pub tons: u64,
}

/// One market visit within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLeg {
    pub market_id: MarketId,
    pub market_name: CompactString,
    pub purchases: SmallVec<[Purchase; 4]>,
}

impl RunLeg {
    pub fn tonnage(&self) -> u64 {
        self.purchases.iter().map(|p| p.tons).sum()
    }
}

/// One trip, bounded by cargo capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryRun {
    /// 1-based.
    pub run_index: u32,
    pub legs: Vec<RunLeg>,
    pub total_tonnage: u64,
    pub materials_summary: BTreeMap<CompactString, u64>,
}

impl DeliveryRun {
    pub(super) fn close(run_index: u32, legs: Vec<RunLeg>) -> Self {
        let mut materials_summary = BTreeMap::new();
        for purchase in legs.iter().flat_map(|leg| leg.purchases.iter()) {
            *materials_summary
                .entry(purchase.material_name.clone())
                .or_insert(0) += purchase.tons;
        }
        let total_tonnage = legs.iter().map(RunLeg::tonnage).sum();
        Self {
            run_index,
            legs,
            total_tonnage,
            materials_summary,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoutePlan {
    pub construction_site_id: MarketId,
    pub runs: Vec<DeliveryRun>,
    /// Share of the outstanding demand the runs deliver, in `[0, 1]`.
    pub coverage_fraction: f64,
}

impl RoutePlan {
    pub fn total_tonnage(&self) -> u64 {
        self.runs.iter().map(|r| r.total_tonnage).sum()
    }
}

impl From<&RunLeg> for RunLegDto {
    fn from(value: &RunLeg) -> Self {
        RunLegDto {
            market_id: value.market_id,
            market_name: value.market_name.clone(),
            purchases: value
                .purchases
                .iter()
                .map(|p| PurchaseDto {
                    material_name: p.material_name.clone(),
                    amount_tons: p.tons,
                })
                .collect(),
        }
    }
}

impl From<&DeliveryRun> for DeliveryRunDto {
    fn from(value: &DeliveryRun) -> Self {
        DeliveryRunDto {
            run_index: value.run_index,
            legs: value.legs.iter().map(Into::into).collect(),
            total_tonnage: value.total_tonnage,
            materials_summary_tons: value.materials_summary.clone(),
        }
    }
}

impl From<&RoutePlan> for RoutePlanDto {
    fn from(value: &RoutePlan) -> Self {
        RoutePlanDto {
            construction_site_id: value.construction_site_id,
            runs: value.runs.iter().map(Into::into).collect(),
            coverage_fraction: value.coverage_fraction,
        }
    }
}
