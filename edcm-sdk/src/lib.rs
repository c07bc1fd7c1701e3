//! Wire types shared between the construction monitor core and its surroundings.
//!
//! * [`journal`] holds the typed payloads decoded from game journal records.
//! * [`objects`] holds the transfer objects exposed to persistence and display layers.
//! * [`names`] normalizes the commodity identifiers used by the game.

pub mod journal;
pub mod names;
pub mod objects;

/// Game-assigned market identifier. Construction sites are keyed by the market id of their depot.
pub type MarketId = u64;

/// Stable numeric commodity key.
pub type CommodityId = u64;
