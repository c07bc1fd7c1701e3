//! Commodity name normalization.
//!
//! The journal refers to the same commodity in several spellings: `"$Steel_name;"` in depot
//! reports, `"steel"` in cargo transfers, `"$steel_name;"` in market data. All of them reduce to
//! the same lowercase system name.

use compact_str::CompactString;

/// Placeholder returned for empty names.
pub const UNKNOWN_COMMODITY: &str = "unknown";

/// Normalize a raw commodity name to its lowercase system name.
///
/// Strips a leading `$` and a trailing `_name;`, then lowercases.
pub fn normalize_system_name(raw: &str) -> CompactString {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return CompactString::const_new(UNKNOWN_COMMODITY);
    }
    let without_prefix = trimmed.strip_prefix('$').unwrap_or(trimmed);
    let stripped = without_prefix
        .strip_suffix("_name;")
        .unwrap_or(without_prefix);
    if stripped.is_empty() {
        return CompactString::const_new(UNKNOWN_COMMODITY);
    }
    CompactString::from(stripped.to_lowercase())
}

/// Normalize a localised display name for case-insensitive lookups.
pub fn normalize_localised_name(raw: &str) -> Option<CompactString> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(CompactString::from(trimmed.to_lowercase()))
    }
}
