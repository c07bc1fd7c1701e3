//! Transfer objects exchanged with persistence and display layers.
//!
//! These are the serializable shapes of the core's entities. They serialize camelCase and carry
//! no behavior beyond validation of incoming requests.

pub mod commodity;
pub mod construction;
pub mod market;
pub mod route;

pub use commodity::CommodityDto;
pub use construction::{ConstructionSiteDto, MaterialRequirementDto};
pub use market::{MarketDto, MarketItemDto};
pub use route::{
    DeliveryRunDto, PurchaseDto, RequestError, RouteOptimizationRequest, RoutePlanDto, RunLegDto,
};
