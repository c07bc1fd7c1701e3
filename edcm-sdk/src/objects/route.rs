//! Route optimization request and result objects.

use std::collections::BTreeMap;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::MarketId;

/// Default number of markets a single run may visit.
pub const DEFAULT_MAX_MARKETS_PER_RUN: u32 = 2;

fn default_max_markets_per_run() -> u32 {
    DEFAULT_MAX_MARKETS_PER_RUN
}

/// Request to plan delivery runs for one construction site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOptimizationRequest {
    pub construction_site_id: MarketId,
    /// Tons per run. Falls back to the current ship, then to configuration, when absent.
    #[serde(default)]
    pub cargo_capacity_tons: Option<u64>,
    #[serde(default = "default_max_markets_per_run")]
    pub max_markets_per_run: u32,
}

impl RouteOptimizationRequest {
    pub fn new(construction_site_id: MarketId) -> Self {
        Self {
            construction_site_id,
            cargo_capacity_tons: None,
            max_markets_per_run: DEFAULT_MAX_MARKETS_PER_RUN,
        }
    }

    /// Reject requests that can never produce a plan.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.cargo_capacity_tons == Some(0) {
            return Err(RequestError::NonPositiveCapacity);
        }
        if self.max_markets_per_run == 0 {
            return Err(RequestError::NoMarketsPerRun);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("cargo capacity must be positive")]
    NonPositiveCapacity,
    #[error("max markets per run must be at least 1")]
    NoMarketsPerRun,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePlanDto {
    pub construction_site_id: MarketId,
    pub runs: Vec<DeliveryRunDto>,
    /// Fraction of outstanding demand the runs cover, in `[0, 1]`.
    pub coverage_fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRunDto {
    /// 1-based.
    pub run_index: u32,
    pub legs: Vec<RunLegDto>,
    pub total_tonnage: u64,
    pub materials_summary_tons: BTreeMap<CompactString, u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunLegDto {
    pub market_id: MarketId,
    pub market_name: CompactString,
    pub purchases: SmallVec<[PurchaseDto; 4]>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseDto {
    pub material_name: CompactString,
    pub amount_tons: u64,
}
