use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::CommodityId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommodityDto {
    pub id: CommodityId,
    /// Normalized system name, e.g. `steel`.
    pub name: CompactString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<CompactString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CompactString>,
}
