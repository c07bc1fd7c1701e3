//! Construction sites and their material requirements.

use std::sync::Arc;

use compact_str::{CompactString, format_compact};
use edcm_sdk::objects::{CommodityDto, ConstructionSiteDto, MaterialRequirementDto};
use edcm_sdk::{CommodityId, MarketId};
use time::OffsetDateTime;

use super::Commodity;

const STUB_PREFIX: &str = "STUB_";

/// Material demand of one site for one commodity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialRequirement {
    pub commodity: Arc<Commodity>,
    /// Total the depot asks for. Never decreases.
    pub required: u64,
    /// Total handed over so far. Never decreases.
    pub delivered: u64,
}

impl MaterialRequirement {
    pub fn new(commodity: Arc<Commodity>, required: u64) -> Self {
        Self {
            commodity,
            required,
            delivered: 0,
        }
    }

    pub fn remaining(&self) -> u64 {
        self.required.saturating_sub(self.delivered)
    }

    pub fn is_open(&self) -> bool {
        self.remaining() > 0
    }
}

/// A colonisation construction site, keyed by the market id of its depot.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructionSite {
    pub market_id: MarketId,
    /// Display label; a stub until the station name is seen.
    pub site_id: CompactString,
    /// Ordered by first appearance, unique per commodity.
    pub requirements: Vec<MaterialRequirement>,
    pub complete: bool,
    pub failed: bool,
    pub last_updated: Option<OffsetDateTime>,
}

impl ConstructionSite {
    /// A site with no requirements and a stub label.
    pub fn new(market_id: MarketId) -> Self {
        Self {
            market_id,
            site_id: Self::stub_label(market_id),
            requirements: Vec::new(),
            complete: false,
            failed: false,
            last_updated: None,
        }
    }

    pub fn stub_label(market_id: MarketId) -> CompactString {
        format_compact!("{STUB_PREFIX}{market_id}")
    }

    pub fn has_stub_label(&self) -> bool {
        self.site_id.starts_with(STUB_PREFIX)
    }

    pub fn requirement(&self, commodity_id: CommodityId) -> Option<&MaterialRequirement> {
        self.requirements
            .iter()
            .find(|r| r.commodity.id == commodity_id)
    }

    pub fn requirement_mut(&mut self, commodity_id: CommodityId) -> Option<&mut MaterialRequirement> {
        self.requirements
            .iter_mut()
            .find(|r| r.commodity.id == commodity_id)
    }

    pub fn total_required(&self) -> u64 {
        self.requirements.iter().map(|r| r.required).sum()
    }

    pub fn total_delivered(&self) -> u64 {
        self.requirements.iter().map(|r| r.delivered).sum()
    }

    /// `floor(100 * delivered / required)`, clamped to 100; 0 when nothing is required.
    pub fn progress_percent(&self) -> u8 {
        let required = u128::from(self.total_required());
        if required == 0 {
            return 0;
        }
        let delivered = u128::from(self.total_delivered());
        (delivered * 100 / required).min(100) as u8
    }

    /// Requirements that still need material, with their remaining quantity.
    pub fn outstanding(&self) -> Vec<(Arc<Commodity>, u64)> {
        self.requirements
            .iter()
            .filter(|r| r.is_open())
            .map(|r| (Arc::clone(&r.commodity), r.remaining()))
            .collect()
    }
}

impl From<&MaterialRequirement> for MaterialRequirementDto {
    fn from(value: &MaterialRequirement) -> Self {
        MaterialRequirementDto {
            commodity: CommodityDto::from(value.commodity.as_ref()),
            required_quantity: value.required,
            delivered_quantity: value.delivered,
            remaining_quantity: value.remaining(),
        }
    }
}

impl From<&ConstructionSite> for ConstructionSiteDto {
    fn from(value: &ConstructionSite) -> Self {
        ConstructionSiteDto {
            market_id: value.market_id,
            site_id: value.site_id.clone(),
            progress_percent: value.progress_percent(),
            complete: value.complete,
            failed: value.failed,
            last_updated: value.last_updated,
            requirements: value.requirements.iter().map(Into::into).collect(),
        }
    }
}

impl From<ConstructionSiteDto> for ConstructionSite {
    /// Derived fields of the DTO are recomputed, not trusted. Later duplicates of a commodity are
    /// dropped.
    fn from(value: ConstructionSiteDto) -> Self {
        let mut requirements: Vec<MaterialRequirement> =
            Vec::with_capacity(value.requirements.len());
        for dto in value.requirements {
            if requirements.iter().any(|r| r.commodity.id == dto.commodity.id) {
                continue;
            }
            requirements.push(MaterialRequirement {
                commodity: Arc::new(Commodity::from(dto.commodity)),
                required: dto.required_quantity,
                delivered: dto.delivered_quantity,
            });
        }
        ConstructionSite {
            market_id: value.market_id,
            site_id: value.site_id,
            requirements,
            complete: value.complete,
            failed: value.failed,
            last_updated: value.last_updated,
        }
    }
}
