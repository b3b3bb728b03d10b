// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-pass overrides of tile metadata supplied by the host.

use alloc::boxed::Box;

use tileweave_terrain::Coord;

use crate::config::LayerConfig;
use crate::dirty::{DirtyFlags, DirtyTracker};
use crate::store::{CellKey, GridStore};
use crate::tile_set::{TileData, TileSet};

/// Host callback that rewrites tile metadata for single cells.
///
/// Overrides live for one update pass only: they are built before the
/// subsystems run and dropped once they are done, so the hook is asked again
/// on every pass touching the cell.
pub trait RuntimeTileDataHook {
    /// Whether the cell at `coords` of layer `layer` gets an override.
    fn use_tile_data_runtime_update(&mut self, layer: usize, coords: Coord) -> bool;

    /// Rewrite `data`, a copy of the tile's metadata.
    fn tile_data_runtime_update(&mut self, layer: usize, coords: Coord, data: &mut TileData);
}

#[derive(Debug, Default)]
pub(crate) struct RuntimeData {
    needs_all_cleanup: bool,
    was_cleaned_up: bool,
}

impl RuntimeData {
    /// Build overrides for the cells this pass visits.
    pub(crate) fn build(
        &mut self,
        store: &mut GridStore,
        dirty: &mut DirtyTracker,
        tile_set: Option<&TileSet>,
        config: &LayerConfig,
        hook: Option<&mut (dyn RuntimeTileDataHook + 'static)>,
        in_destructor: bool,
    ) {
        let forced = in_destructor || !config.enabled || !config.visible || tile_set.is_none();
        if let (false, Some(tile_set), Some(hook)) = (forced, tile_set, hook) {
            if self.was_cleaned_up || dirty.any(DirtyFlags::TILE_SET) {
                self.needs_all_cleanup = true;
                for key in store.keys() {
                    build_cell(store, key, dirty, false, tile_set, config, hook);
                }
            } else if dirty.any(DirtyFlags::RUNTIME_UPDATE) {
                for key in store.keys() {
                    build_cell(store, key, dirty, true, tile_set, config, hook);
                }
            } else {
                for key in dirty.cells().to_vec() {
                    build_cell(store, key, dirty, false, tile_set, config, hook);
                }
            }
        }
        self.was_cleaned_up = forced;
    }

    /// Drop the overrides once every subsystem has read them.
    pub(crate) fn clear(&mut self, store: &mut GridStore, dirty: &DirtyTracker) {
        if self.needs_all_cleanup {
            for cell in store.iter_mut() {
                cell.runtime_data = None;
            }
            self.needs_all_cleanup = false;
        } else {
            for key in dirty.cells() {
                if let Some(cell) = store.cell_mut(*key) {
                    cell.runtime_data = None;
                }
            }
        }
    }
}

/// Build the override of one cell. With `mark_dirty`, overridden cells join the
/// dirty list so the subsystems pick up the new data.
fn build_cell(
    store: &mut GridStore,
    key: CellKey,
    dirty: &mut DirtyTracker,
    mark_dirty: bool,
    tile_set: &TileSet,
    config: &LayerConfig,
    hook: &mut (dyn RuntimeTileDataHook + 'static),
) {
    let Some(cell) = store.cell_mut(key) else {
        return;
    };
    let Some(data) = tile_set.tile_data(cell.tile) else {
        return;
    };
    if !hook.use_tile_data_runtime_update(config.layer_index, cell.coords) {
        return;
    }
    let mut data = data.clone();
    hook.tile_data_runtime_update(config.layer_index, cell.coords, &mut data);
    cell.runtime_data = Some(Box::new(data));
    if mark_dirty {
        dirty.push_cell(key, &mut cell.queued);
    }
}
