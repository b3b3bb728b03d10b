// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer errors.

use core::fmt;

use tileweave_terrain::TerrainError;

/// Errors reported by [`TileLayer`](crate::TileLayer) operations.
///
/// A failed operation leaves the layer untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayerError {
    /// The operation needs a tile set and the layer has none.
    NoTileSet,
    /// Encoded tile data whose length is not a multiple of the record size.
    CorruptTileData {
        /// Number of integers received.
        len: usize,
        /// Integers per record for the format.
        record: usize,
    },
    /// An encoded tile data format this crate does not know.
    UnsupportedFormat(u32),
    /// The operation needs the layer to be attached to a world.
    NotInTree,
    /// A terrain operation failed.
    Terrain(TerrainError),
}

impl fmt::Display for LayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTileSet => f.write_str("the layer has no tile set"),
            Self::CorruptTileData { len, record } => write!(
                f,
                "corrupted tile data: got {len} integers, expected a multiple of {record}"
            ),
            Self::UnsupportedFormat(format) => write!(f, "unsupported tile data format {format}"),
            Self::NotInTree => f.write_str("the layer is not attached to a world"),
            Self::Terrain(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl core::error::Error for LayerError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Terrain(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TerrainError> for LayerError {
    fn from(e: TerrainError) -> Self {
        Self::Terrain(e)
    }
}
