//! Typed journal payloads.
//!
//! The journal is a stream of JSON objects tagged by an `"event"` field. The dispatcher keeps
//! records schema-free; handlers decode the record into one of these payloads at their boundary.
//! Field names follow the game's PascalCase spelling.

use crate::MarketId;
use serde::{Deserialize, Serialize};

/// Event tag of a construction depot status report.
pub const CONSTRUCTION_DEPOT: &str = "ColonisationConstructionDepot";
/// Event tag of a commander contribution to a construction depot.
pub const COLONISATION_CONTRIBUTION: &str = "ColonisationContribution";
/// Event tag of a transfer between ship and fleet carrier.
pub const CARGO_TRANSFER: &str = "CargoTransfer";
/// Event tag of a full cargo hold snapshot.
pub const CARGO: &str = "Cargo";
/// Event tag of a ship loadout report.
pub const LOADOUT: &str = "Loadout";
/// Event tag of a docking report.
pub const DOCKED: &str = "Docked";
/// Event tag of the position report written at startup.
pub const LOCATION: &str = "Location";
/// Event tag of a market snapshot (`Market.json`).
pub const MARKET: &str = "Market";

/// `ColonisationConstructionDepot`: the depot's required totals and newly provided amounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConstructionDepotEvent {
    #[serde(rename = "MarketID")]
    pub market_id: MarketId,
    #[serde(default)]
    pub construction_progress: f64,
    #[serde(default)]
    pub construction_complete: bool,
    #[serde(default)]
    pub construction_failed: bool,
    #[serde(default)]
    pub resources_required: Vec<DepotResource>,
}

/// One commodity line of a depot report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DepotResource {
    pub name: String,
    #[serde(rename = "Name_Localised", default)]
    pub name_localised: Option<String>,
    pub required_amount: u64,
    pub provided_amount: u64,
    #[serde(default)]
    pub payment: u64,
}

/// `ColonisationContribution`: commodities handed over to a depot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ColonisationContributionEvent {
    #[serde(rename = "MarketID")]
    pub market_id: MarketId,
    #[serde(default)]
    pub contributions: Vec<Contribution>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Contribution {
    pub name: String,
    #[serde(rename = "Name_Localised", default)]
    pub name_localised: Option<String>,
    pub amount: i64,
}

/// `CargoTransfer`: moves between the ship and a fleet carrier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CargoTransferEvent {
    #[serde(default)]
    pub transfers: Vec<CargoTransfer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CargoTransfer {
    #[serde(rename = "Type")]
    pub commodity: String,
    #[serde(rename = "Type_Localised", default)]
    pub commodity_localised: Option<String>,
    pub count: i64,
    pub direction: TransferDirection,
}

/// Direction of a [`CargoTransfer`], relative to the ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferDirection {
    /// Into the ship's hold.
    #[serde(alias = "ToShip")]
    Toship,
    /// Out of the ship's hold.
    #[serde(alias = "ToCarrier")]
    Tocarrier,
}

/// `Cargo`: complete snapshot of a vessel's hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CargoEvent {
    #[serde(default)]
    pub vessel: Option<String>,
    #[serde(default)]
    pub count: u64,
    /// Absent in the short journal form; the full inventory is then only in `Cargo.json`.
    #[serde(default)]
    pub inventory: Option<Vec<CargoItem>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CargoItem {
    pub name: String,
    #[serde(rename = "Name_Localised", default)]
    pub name_localised: Option<String>,
    pub count: u64,
    #[serde(default)]
    pub stolen: u64,
}

/// `Loadout`: the ship currently flown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoadoutEvent {
    pub ship: String,
    #[serde(rename = "ShipID")]
    pub ship_id: u64,
    #[serde(default)]
    pub ship_name: String,
    pub cargo_capacity: u64,
}

/// `Docked`: the commander docked at a station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DockedEvent {
    pub station_name: String,
    #[serde(default)]
    pub station_type: Option<String>,
    #[serde(default)]
    pub star_system: Option<String>,
    #[serde(rename = "MarketID")]
    pub market_id: MarketId,
}

impl DockedEvent {
    /// Whether the station is a colonisation construction site.
    pub fn is_construction_site(&self) -> bool {
        self.station_name.contains("Construction Site")
            || self
                .station_type
                .as_deref()
                .is_some_and(|t| t.contains("Construction"))
    }
}

/// `Location`: where the commander is, written when the game starts and after a respawn.
///
/// Station fields are only present when the ship is docked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LocationEvent {
    #[serde(default)]
    pub docked: bool,
    #[serde(default)]
    pub station_name: Option<String>,
    #[serde(default)]
    pub station_type: Option<String>,
    #[serde(default)]
    pub star_system: Option<String>,
    #[serde(rename = "MarketID", default)]
    pub market_id: Option<MarketId>,
}

impl LocationEvent {
    /// The station the ship sits at, if docked.
    pub fn docked_at(self) -> Option<DockedEvent> {
        if !self.docked {
            return None;
        }
        Some(DockedEvent {
            station_name: self.station_name?,
            station_type: self.station_type,
            star_system: self.star_system,
            market_id: self.market_id?,
        })
    }
}

/// `Market`: market snapshot as written to `Market.json`.
///
/// The journal line of the same name carries no `Items`; only the file does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MarketEvent {
    #[serde(rename = "MarketID")]
    pub market_id: MarketId,
    pub station_name: String,
    #[serde(default)]
    pub station_type: Option<String>,
    #[serde(default)]
    pub star_system: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<MarketEntry>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MarketEntry {
    #[serde(rename = "id")]
    pub id: u64,
    pub name: String,
    #[serde(rename = "Name_Localised", default)]
    pub name_localised: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(rename = "Category_Localised", default)]
    pub category_localised: Option<String>,
    #[serde(default)]
    pub buy_price: u64,
    #[serde(default)]
    pub sell_price: u64,
    #[serde(default)]
    pub stock: u64,
    #[serde(default)]
    pub demand: u64,
}
