// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Terrain patterns: the terrain of a tile's center and of each peering bit.

use crate::geometry::CellNeighbor;

/// Which peering bits of a terrain set take part in matching.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TerrainMode {
    /// Corners and sides.
    #[default]
    MatchCornersAndSides,
    /// Corners only.
    MatchCorners,
    /// Sides only.
    MatchSides,
}

/// Terrain assignment of a tile: its center terrain plus one terrain per peering bit.
///
/// `-1` means "no terrain". Bits that are not valid for the terrain set stay at `-1`,
/// so two patterns of the same terrain set compare equal exactly when every valid
/// bit matches.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TerrainPattern {
    terrain: i32,
    bits: [i32; CellNeighbor::COUNT],
}

impl Default for TerrainPattern {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl TerrainPattern {
    /// The pattern with no terrain anywhere.
    pub const EMPTY: Self = Self {
        terrain: -1,
        bits: [-1; CellNeighbor::COUNT],
    };

    /// A pattern with the given center terrain and no peering terrains.
    pub const fn with_center(terrain: i32) -> Self {
        Self {
            terrain,
            bits: [-1; CellNeighbor::COUNT],
        }
    }

    /// Center terrain.
    pub const fn terrain(&self) -> i32 {
        self.terrain
    }

    /// Set the center terrain.
    pub fn set_terrain(&mut self, terrain: i32) {
        self.terrain = terrain;
    }

    /// Terrain on peering bit `bit`.
    pub const fn peering_bit(&self, bit: CellNeighbor) -> i32 {
        self.bits[bit.index()]
    }

    /// Set the terrain on peering bit `bit`.
    pub fn set_peering_bit(&mut self, bit: CellNeighbor, terrain: i32) {
        self.bits[bit.index()] = terrain;
    }

    /// Builder form of [`TerrainPattern::set_peering_bit`].
    #[must_use]
    pub fn with_peering_bit(mut self, bit: CellNeighbor, terrain: i32) -> Self {
        self.set_peering_bit(bit, terrain);
        self
    }

    /// True when neither the center nor any bit carries a terrain.
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_bits() {
        let p = TerrainPattern::with_center(2)
            .with_peering_bit(CellNeighbor::LeftSide, 2)
            .with_peering_bit(CellNeighbor::RightSide, 0);
        assert_eq!(p.terrain(), 2);
        assert_eq!(p.peering_bit(CellNeighbor::LeftSide), 2);
        assert_eq!(p.peering_bit(CellNeighbor::RightSide), 0);
        assert_eq!(p.peering_bit(CellNeighbor::TopSide), -1);
        assert!(!p.is_empty());
        assert!(TerrainPattern::default().is_empty());
    }
}
