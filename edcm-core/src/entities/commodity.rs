use compact_str::CompactString;
use edcm_sdk::CommodityId;
use edcm_sdk::objects::CommodityDto;

/// A tradeable commodity. Immutable once registered and shared by `Arc` across sites and markets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Commodity {
    pub id: CommodityId,
    /// Normalized system name (`steel`, `liquidoxygen`).
    pub name: CompactString,
    pub display_name: Option<CompactString>,
    pub category: Option<CompactString>,
}

impl Commodity {
    /// Name to show to people: the localised name when known.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

impl From<&Commodity> for CommodityDto {
    fn from(value: &Commodity) -> Self {
        CommodityDto {
            id: value.id,
            name: value.name.clone(),
            display_name: value.display_name.clone(),
            category: value.category.clone(),
        }
    }
}

impl From<CommodityDto> for Commodity {
    fn from(value: CommodityDto) -> Self {
        Commodity {
            id: value.id,
            name: value.name,
            display_name: value.display_name,
            category: value.category,
        }
    }
}
