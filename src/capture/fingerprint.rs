//! Content-addressed block identity.
//!
//! Virtualized hosts recreate nodes as they scroll, so the same logical block
//! is seen many times under different handles. Its identity is derived from a
//! short prefix of its text combined with a coarse position bucket:
//!
//! ```text
//! FxHash64(prefix_bytes || 0x00 || bucket.to_le_bytes())
//! ```
//!
//! Two different blocks with identical leading text at different places land
//! in different buckets. The same block re-measured after scrolling usually
//! lands in the same bucket; when sub-pixel drift carries it across a bucket
//! edge, [`adjacent_fingerprints`] names the ids it may already be stored
//! under. Identical prefixes within one bucket still merge.

use std::fmt;
use std::hash::Hasher;

use fxhash::FxHasher64;
use serde::{Deserialize, Serialize};

use crate::config::FingerprintConfig;
use crate::converters::whitespace::strip_zero_width;

/// Derived identity of a content unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(u64);

impl BlockId {
    /// Wrap a raw 64-bit fingerprint.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw 64-bit fingerprint.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Leading `max_chars` characters of the block text, zero-width stripped and trimmed.
pub fn text_prefix(text: &str, max_chars: usize) -> String {
    let cleaned = strip_zero_width(text);
    let trimmed = cleaned.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((cut, _)) => trimmed[..cut].to_string(),
        None => trimmed.to_string(),
    }
}

/// Coarse position bucket for a document-relative offset.
pub fn position_bucket(position: f64, bucket_px: f64) -> i64 {
    (position / bucket_px).round() as i64
}

/// Compute the identity of a block from its text and document-relative position.
///
/// # Examples
///
/// ```
/// use vdom_capture::capture::fingerprint::fingerprint;
/// use vdom_capture::config::FingerprintConfig;
///
/// let config = FingerprintConfig::default();
/// let first = fingerprint("Hello world", 640.0, &config);
/// let drifted = fingerprint("Hello world", 640.4, &config);
/// let elsewhere = fingerprint("Hello world", 1280.0, &config);
///
/// assert_eq!(first, drifted);
/// assert_ne!(first, elsewhere);
/// ```
pub fn fingerprint(text: &str, position: f64, config: &FingerprintConfig) -> BlockId {
    let prefix = text_prefix(text, config.prefix_chars);
    hash_parts(&prefix, position_bucket(position, config.bucket_px))
}

/// Identities of the same text one bucket above and one bucket below `position`.
///
/// A block sitting near a bucket edge can round either way between two
/// measurements; callers look these up before treating the block as new.
///
/// ```
/// use vdom_capture::capture::fingerprint::{adjacent_fingerprints, fingerprint};
/// use vdom_capture::config::FingerprintConfig;
///
/// let config = FingerprintConfig::default();
/// let stored = fingerprint("Hello world", 36.3, &config);
/// assert_ne!(stored, fingerprint("Hello world", 35.7, &config));
/// assert!(adjacent_fingerprints("Hello world", 35.7, &config).contains(&stored));
/// ```
pub fn adjacent_fingerprints(
    text: &str,
    position: f64,
    config: &FingerprintConfig,
) -> [BlockId; 2] {
    let prefix = text_prefix(text, config.prefix_chars);
    let bucket = position_bucket(position, config.bucket_px);
    [hash_parts(&prefix, bucket - 1), hash_parts(&prefix, bucket + 1)]
}

fn hash_parts(prefix: &str, bucket: i64) -> BlockId {
    let mut hasher = FxHasher64::default();
    hasher.write(prefix.as_bytes());
    hasher.write(&[0]); // separator
    hasher.write(&bucket.to_le_bytes());
    BlockId(hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_is_char_boundary_safe() {
        assert_eq!(text_prefix("  héllo wörld  ", 4), "héll");
        assert_eq!(text_prefix("短い文章です", 3), "短い文");
        assert_eq!(text_prefix("ab", 50), "ab");
        assert_eq!(text_prefix("\u{200B}x", 5), "x");
    }

    #[test]
    fn test_bucket_rounding() {
        assert_eq!(position_bucket(0.0, 8.0), 0);
        assert_eq!(position_bucket(803.7, 8.0), 100);
        assert_eq!(position_bucket(796.4, 8.0), 100);
        assert_eq!(position_bucket(-3.0, 8.0), 0);
    }

    #[test]
    fn test_only_prefix_matters() {
        let config = FingerprintConfig {
            prefix_chars: 5,
            bucket_px: 8.0,
        };
        assert_eq!(
            fingerprint("Hello there", 0.0, &config),
            fingerprint("Hello world", 0.0, &config)
        );
        assert_ne!(
            fingerprint("Hello", 0.0, &config),
            fingerprint("Help!", 0.0, &config)
        );
    }

    #[test]
    fn test_adjacent_covers_edge_drift() {
        let config = FingerprintConfig::default();
        for top in [4.0, 36.0, 1004.0, -12.0] {
            let above = fingerprint("edge", top + 0.3, &config);
            let below = fingerprint("edge", top - 0.3, &config);
            assert_ne!(above, below);
            assert!(adjacent_fingerprints("edge", top - 0.3, &config).contains(&above));
            assert!(adjacent_fingerprints("edge", top + 0.3, &config).contains(&below));
        }
        let centre = fingerprint("edge", 36.0, &config);
        assert!(!adjacent_fingerprints("edge", 36.0, &config).contains(&centre));
    }

    #[test]
    fn test_display_is_fixed_width_hex() {
        assert_eq!(BlockId::from_raw(0xab).to_string(), "00000000000000ab");
    }
}
