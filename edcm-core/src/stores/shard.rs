use std::collections::HashMap;

use edcm_sdk::MarketId;
use tokio::sync::RwLock;

const SHARD_COUNT: usize = 16;

/// A map keyed by market id, split over independently locked shards.
///
/// Values are expected to be cheap to clone (`Arc`s); readers receive clones and never hold a
/// shard lock across their own work.
pub(crate) struct ShardedMap<V> {
    shards: Box<[RwLock<HashMap<MarketId, V>>]>,
}

impl<V: Clone> ShardedMap<V> {
    pub(crate) fn new() -> Self {
        let shards = (0..SHARD_COUNT)
            .map(|_| RwLock::new(HashMap::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { shards }
    }

    fn shard(&self, key: MarketId) -> &RwLock<HashMap<MarketId, V>> {
        // Market ids are sequential in their low digits; fold the high bits in.
        let mixed = key ^ (key >> 17) ^ (key >> 31);
        &self.shards[(mixed % SHARD_COUNT as u64) as usize]
    }

    pub(crate) async fn get(&self, key: MarketId) -> Option<V> {
        self.shard(key).read().await.get(&key).cloned()
    }

    /// Insert or replace, returning the previous value.
    pub(crate) async fn insert(&self, key: MarketId, value: V) -> Option<V> {
        self.shard(key).write().await.insert(key, value)
    }

    /// Return the existing value, or insert the one built by `init`. The flag is `true` when
    /// this call inserted.
    pub(crate) async fn get_or_insert_with(
        &self,
        key: MarketId,
        init: impl FnOnce() -> V,
    ) -> (V, bool) {
        if let Some(existing) = self.get(key).await {
            return (existing, false);
        }
        let mut shard = self.shard(key).write().await;
        if let Some(existing) = shard.get(&key) {
            return (existing.clone(), false);
        }
        let value = init();
        shard.insert(key, value.clone());
        (value, true)
    }

    /// Clone every value out, shard by shard. Not a consistent cut across shards.
    pub(crate) async fn values(&self) -> Vec<(MarketId, V)> {
        let mut out = Vec::new();
        for shard in self.shards.iter() {
            let guard = shard.read().await;
            out.extend(guard.iter().map(|(k, v)| (*k, v.clone())));
        }
        out
    }

    pub(crate) async fn len(&self) -> usize {
        let mut total = 0;
        for shard in self.shards.iter() {
            total += shard.read().await.len();
        }
        total
    }
}
