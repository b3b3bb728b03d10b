// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! State shared by the subsystems during one update pass.

use alloc::vec::Vec;

use kurbo::{Affine, Point};

use crate::config::LayerConfig;
use crate::dirty::DirtyTracker;
use crate::layer::World;
use crate::report::PassReport;
use crate::store::{CellKey, GridStore};
use crate::tile_set::{AtlasSource, TileData, TileSet};
use crate::types::TileRef;

/// Borrowed view of a layer for the duration of a pass.
pub(crate) struct Pass<'a, S> {
    pub(crate) servers: &'a mut S,
    pub(crate) tile_set: Option<&'a TileSet>,
    pub(crate) config: &'a LayerConfig,
    pub(crate) dirty: &'a DirtyTracker,
    pub(crate) world: Option<&'a World>,
    pub(crate) transform: Affine,
    pub(crate) in_destructor: bool,
    pub(crate) report: &'a mut PassReport,
}

impl<S> Pass<'_, S> {
    /// Every cell on a full rebuild, the dirty cells otherwise.
    pub(crate) fn cells(&self, store: &GridStore, full: bool) -> Vec<CellKey> {
        if full {
            store.keys()
        } else {
            self.dirty.cells().to_vec()
        }
    }
}

/// Atlas and effective metadata of `tile`, with the runtime override taking precedence.
///
/// `None` when the tile is empty, missing from the tile set, or a scene tile.
pub(crate) fn atlas_data<'t>(
    tile_set: &'t TileSet,
    tile: TileRef,
    runtime: Option<&'t TileData>,
) -> Option<(&'t AtlasSource, &'t TileData)> {
    let (atlas, data) = tile_set.atlas_tile(tile)?;
    Some((atlas, runtime.unwrap_or(data)))
}

/// World transform of the cell whose center is at `local`.
pub(crate) fn cell_transform(global: Affine, local: Point) -> Affine {
    global * Affine::translate(local.to_vec2())
}
