//! Shared mutable state of the monitor.
//!
//! The construction site store and the market store are the only state mutated by event
//! handlers. Both are sharded by market id so that unrelated markets never wait on each other.

pub mod cargo;
pub mod commodities;
pub mod construction_sites;
pub mod fingerprint;
pub mod markets;
mod shard;

pub use cargo::{CargoInventory, CargoSnapshot};
pub use commodities::{CommodityRegistry, PROVISIONAL_ID_BASE};
pub use construction_sites::{
    ConstructionSiteStore, DepotLine, DepotSnapshot, StoreError, UpsertOutcome,
};
pub use fingerprint::Fingerprint;
pub use markets::MarketStore;
