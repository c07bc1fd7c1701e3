//! Construction site transfer objects.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::MarketId;

use super::CommodityDto;

/// A construction site and its material requirements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructionSiteDto {
    pub market_id: MarketId,
    /// Display label. `STUB_<marketId>` until the station name is known.
    pub site_id: CompactString,
    #[serde(default)]
    pub progress_percent: u8,
    #[serde(default)]
    pub complete: bool,
    #[serde(default)]
    pub failed: bool,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub last_updated: Option<OffsetDateTime>,
    #[serde(default)]
    pub requirements: Vec<MaterialRequirementDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialRequirementDto {
    pub commodity: CommodityDto,
    pub required_quantity: u64,
    pub delivered_quantity: u64,
    /// Derived; ignored when read back.
    #[serde(default)]
    pub remaining_quantity: u64,
}
