// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by terrain operations.

use core::fmt;

use crate::coord::Coord;
use crate::geometry::{CellNeighbor, TileShape};

/// Invalid input to a terrain operation. The operation had no effect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TerrainError {
    /// The terrain set index does not exist in the tile set.
    TerrainSetOutOfRange {
        /// Requested index.
        terrain_set: i32,
        /// Number of terrain sets available.
        count: usize,
    },
    /// Two consecutive cells of a terrain path are not neighbors.
    InvalidPath {
        /// Cell the step starts from.
        from: Coord,
        /// Cell that is not adjacent to `from`.
        to: Coord,
    },
    /// The direction has no peering bit in this tile geometry.
    UnsupportedPeeringBit {
        /// Tile geometry.
        shape: TileShape,
        /// Offending direction.
        bit: CellNeighbor,
    },
}

impl fmt::Display for TerrainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TerrainSetOutOfRange { terrain_set, count } => {
                write!(f, "terrain set {terrain_set} out of range (0..{count})")
            }
            Self::InvalidPath { from, to } => {
                write!(f, "invalid terrain path, {to} is not a neighboring tile of {from}")
            }
            Self::UnsupportedPeeringBit { shape, bit } => {
                write!(f, "{bit:?} is not a peering bit of {shape:?} tiles")
            }
        }
    }
}

impl core::error::Error for TerrainError {}
