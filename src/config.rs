//! Leaf-size configuration for balancing and compaction (spec §4.B/§4.C).

use crate::node::{DEFAULT_MAX_LEAF_SIZE, DEFAULT_MIN_LEAF_SIZE};

/// Bounds leaf sizes used by [`crate::Rope::balance_with`] and
/// [`crate::Rope::compact`].
///
/// `min` and `max` are in bytes. Leaves below `min` get coalesced with
/// neighbours where possible; leaves above `max` get split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LeafSizeConfig {
    /// Leaves smaller than this are coalesced with a neighbour when
    /// balancing, so long as the merge doesn't exceed `max`.
    pub min: usize,
    /// Leaves larger than this are split.
    pub max: usize,
}

impl Default for LeafSizeConfig {
    fn default() -> Self {
        LeafSizeConfig {
            min: DEFAULT_MIN_LEAF_SIZE,
            max: DEFAULT_MAX_LEAF_SIZE,
        }
    }
}

impl LeafSizeConfig {
    /// A config sized for small documents (spec §4.B "small: 64–256").
    pub fn small() -> Self {
        LeafSizeConfig { min: 64, max: 256 }
    }

    /// A config sized for medium documents (spec §4.B "medium: 256–1024").
    pub fn medium() -> Self {
        LeafSizeConfig { min: 256, max: 1024 }
    }

    /// A config sized for large documents (spec §4.B "large: 512–2048").
    pub fn large() -> Self {
        LeafSizeConfig { min: 512, max: 2048 }
    }

    /// Picks a leaf-size band proportioned to the current document length,
    /// in characters, per spec §4.B `suggestedConfig(length)`.
    pub fn suggested(char_len: usize) -> Self {
        if char_len < 8 * 1024 {
            Self::small()
        } else if char_len < 512 * 1024 {
            Self::medium()
        } else {
            Self::large()
        }
    }
}
