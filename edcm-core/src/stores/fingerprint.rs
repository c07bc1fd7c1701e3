//! Content fingerprints of depot reports.

use std::fmt;

use edcm_sdk::CommodityId;
use ring::digest;

/// SHA-256 over the normalized commodity lines of a depot report.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Lines are sorted before hashing, so the order the game lists them in does not matter.
    /// Each line is `(commodity id, required, provided)`.
    pub fn of_lines(market_id: u64, lines: &[(CommodityId, u64, u64)]) -> Self {
        let mut sorted = lines.to_vec();
        sorted.sort_unstable();

        let mut ctx = digest::Context::new(&digest::SHA256);
        ctx.update(&market_id.to_be_bytes());
        for (commodity, required, provided) in &sorted {
            ctx.update(&commodity.to_be_bytes());
            ctx.update(&required.to_be_bytes());
            ctx.update(&provided.to_be_bytes());
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(ctx.finish().as_ref());
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    /// First 10 bytes in base32; enough to tell reports apart in logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&fast32::base32::RFC4648_NOPAD.encode(&self.0[..10]))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({self})")
    }
}
