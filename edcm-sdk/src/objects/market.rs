use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::MarketId;

use super::CommodityDto;

/// A market snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketDto {
    pub market_id: MarketId,
    pub station_name: CompactString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station_type: Option<CompactString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_name: Option<CompactString>,
    #[serde(default)]
    pub items: Vec<MarketItemDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketItemDto {
    pub commodity: CommodityDto,
    pub buy_price: u64,
    pub sell_price: u64,
    pub stock: u64,
    pub demand: u64,
}
