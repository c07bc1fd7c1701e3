//! Market store.
//!
//! Markets are immutable snapshots behind `Arc`; a refresh swaps the whole snapshot.

use std::sync::Arc;

use edcm_sdk::{CommodityId, MarketId};

use super::shard::ShardedMap;
use crate::entities::Market;

pub struct MarketStore {
    markets: ShardedMap<Arc<Market>>,
}

impl Default for MarketStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketStore {
    pub fn new() -> Self {
        Self {
            markets: ShardedMap::new(),
        }
    }

    /// Replace everything known about `market_id` with `market`.
    ///
    /// Returns the previous snapshot, if any.
    pub async fn replace_market(&self, market_id: MarketId, mut market: Market) -> Option<Arc<Market>> {
        market.market_id = market_id;
        self.markets.insert(market_id, Arc::new(market)).await
    }

    pub async fn get(&self, market_id: MarketId) -> Option<Arc<Market>> {
        self.markets.get(market_id).await
    }

    /// All markets, ordered by market id.
    pub async fn get_all(&self) -> Vec<Arc<Market>> {
        let mut markets: Vec<_> = self.markets.values().await.into_iter().map(|(_, m)| m).collect();
        markets.sort_by_key(|m| m.market_id);
        markets
    }

    /// Markets with positive stock of at least one of the commodities, ordered by market id.
    pub async fn find_candidates(&self, commodity_ids: &[CommodityId]) -> Vec<Arc<Market>> {
        let mut markets = self.get_all().await;
        markets.retain(|m| m.supplies_any(commodity_ids));
        markets
    }

    pub async fn len(&self) -> usize {
        self.markets.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Commodity, MarketItem};

    fn item(id: CommodityId, stock: u64) -> MarketItem {
        MarketItem {
            commodity: Arc::new(Commodity {
                id,
                name: format!("c{id}").into(),
                display_name: None,
                category: None,
            }),
            buy_price: 100,
            sell_price: 90,
            stock,
            demand: 0,
        }
    }

    #[tokio::test]
    async fn test_replace_overwrites_whole_snapshot() {
        let store = MarketStore::new();
        store
            .replace_market(1, Market::new(1, "Ayres Hub").with_item(item(10, 5)).with_item(item(11, 7)))
            .await;
        let previous = store
            .replace_market(1, Market::new(1, "Ayres Hub").with_item(item(10, 9)))
            .await;
        assert_eq!(previous.map(|m| m.items.len()), Some(2));

        let market = store.get(1).await.unwrap();
        assert_eq!(market.stock_of(10), 9);
        assert_eq!(market.stock_of(11), 0);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_find_candidates_requires_positive_stock() {
        let store = MarketStore::new();
        store.replace_market(3, Market::new(3, "C").with_item(item(10, 0))).await;
        store.replace_market(2, Market::new(2, "B").with_item(item(11, 4))).await;
        store.replace_market(1, Market::new(1, "A").with_item(item(10, 1))).await;

        let ids: Vec<_> = store
            .find_candidates(&[10])
            .await
            .iter()
            .map(|m| m.market_id)
            .collect();
        assert_eq!(ids, vec![1]);

        let ids: Vec<_> = store
            .find_candidates(&[10, 11])
            .await
            .iter()
            .map(|m| m.market_id)
            .collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(store.find_candidates(&[]).await.is_empty());
    }
}
