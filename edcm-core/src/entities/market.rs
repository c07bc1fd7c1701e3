use std::collections::BTreeMap;
use std::sync::Arc;

use compact_str::CompactString;
use edcm_sdk::objects::{CommodityDto, MarketDto, MarketItemDto};
use edcm_sdk::{CommodityId, MarketId};

use super::Commodity;

/// Point-in-time state of one commodity at one market.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketItem {
    pub commodity: Arc<Commodity>,
    pub buy_price: u64,
    pub sell_price: u64,
    pub stock: u64,
    pub demand: u64,
}

/// A market snapshot. Replaced wholesale on every refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Market {
    pub market_id: MarketId,
    pub station_name: CompactString,
    pub station_type: Option<CompactString>,
    pub system_name: Option<CompactString>,
    pub items: BTreeMap<CommodityId, MarketItem>,
}

impl Market {
    pub fn new(market_id: MarketId, station_name: impl Into<CompactString>) -> Self {
        Self {
            market_id,
            station_name: station_name.into(),
            station_type: None,
            system_name: None,
            items: BTreeMap::new(),
        }
    }

    /// Insert an item, replacing any previous entry for the same commodity.
    pub fn with_item(mut self, item: MarketItem) -> Self {
        self.items.insert(item.commodity.id, item);
        self
    }

    pub fn stock_of(&self, commodity_id: CommodityId) -> u64 {
        self.items.get(&commodity_id).map_or(0, |item| item.stock)
    }

    /// Whether any of the commodities is in stock here.
    pub fn supplies_any(&self, commodity_ids: &[CommodityId]) -> bool {
        commodity_ids.iter().any(|id| self.stock_of(*id) > 0)
    }
}

impl From<&Market> for MarketDto {
    fn from(value: &Market) -> Self {
        MarketDto {
            market_id: value.market_id,
            station_name: value.station_name.clone(),
            station_type: value.station_type.clone(),
            system_name: value.system_name.clone(),
            items: value
                .items
                .values()
                .map(|item| MarketItemDto {
                    commodity: CommodityDto::from(item.commodity.as_ref()),
                    buy_price: item.buy_price,
                    sell_price: item.sell_price,
                    stock: item.stock,
                    demand: item.demand,
                })
                .collect(),
        }
    }
}

impl From<MarketDto> for Market {
    fn from(value: MarketDto) -> Self {
        let items = value
            .items
            .into_iter()
            .map(|dto| {
                let item = MarketItem {
                    commodity: Arc::new(Commodity::from(dto.commodity)),
                    buy_price: dto.buy_price,
                    sell_price: dto.sell_price,
                    stock: dto.stock,
                    demand: dto.demand,
                };
                (item.commodity.id, item)
            })
            .collect();
        Market {
            market_id: value.market_id,
            station_name: value.station_name,
            station_type: value.station_type,
            system_name: value.system_name,
            items,
        }
    }
}
