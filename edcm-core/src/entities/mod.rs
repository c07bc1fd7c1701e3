//! In-memory domain entities.
//!
//! Entities are owned by their stores. Everything handed out of a store is an owned copy, so
//! readers never observe a half-applied update.

pub mod commodity;
pub mod construction_site;
pub mod market;

pub use commodity::Commodity;
pub use construction_site::{ConstructionSite, MaterialRequirement};
pub use market::{Market, MarketItem};

pub use edcm_sdk::{CommodityId, MarketId};
