// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene pass: instantiates the scene of every scene-collection tile.

use kurbo::Affine;

use crate::dirty::DirtyFlags;
use crate::layer::World;
use crate::pass::Pass;
use crate::servers::{SceneRoot, Servers};
use crate::store::{CellData, GridStore};
use crate::tile_set::TileSet;

#[derive(Debug, Default)]
pub(crate) struct Scenes {
    was_cleaned_up: bool,
}

impl Scenes {
    pub(crate) fn update<S: Servers>(&mut self, store: &mut GridStore, pass: &mut Pass<'_, S>) {
        let forced = pass.in_destructor
            || !pass.config.enabled
            || pass.world.is_none()
            || pass.tile_set.is_none();

        match (forced, pass.tile_set, pass.world) {
            (false, Some(tile_set), Some(world)) => {
                let full =
                    self.was_cleaned_up || pass.dirty.any(DirtyFlags::TILE_SET | DirtyFlags::IN_TREE);
                for key in pass.cells(store, full) {
                    if let Some(cell) = store.cell_mut(key) {
                        update_cell(cell, tile_set, world, pass);
                    }
                }
            }
            _ => {
                for cell in store.iter_mut() {
                    clear_cell(cell, pass);
                }
            }
        }
        self.was_cleaned_up = forced;
    }
}

/// Replace the instance of `cell`: the old one is always freed first.
fn update_cell<S: Servers>(cell: &mut CellData, tile_set: &TileSet, world: &World, pass: &mut Pass<'_, S>) {
    clear_cell(cell, pass);

    let Some(scene) = tile_set.scene_tile(cell.tile).and_then(|t| t.scene) else {
        return;
    };
    let Some((node, root)) = pass.servers.instantiate(scene) else {
        log::warn!("scene {scene:?} of cell {} could not be instantiated", cell.coords);
        return;
    };
    let local = tile_set.map_to_local(cell.coords);
    match root {
        SceneRoot::Control { position } => pass.servers.set_position(node, position + local.to_vec2()),
        SceneRoot::Node2D { transform } => pass
            .servers
            .set_transform(node, Affine::translate(local.to_vec2()) * transform),
        SceneRoot::Other => {}
    }
    pass.servers.add_child(world.owner, node);
    pass.report.scenes.created += 1;
    cell.scene = Some(node);
}

fn clear_cell<S: Servers>(cell: &mut CellData, pass: &mut Pass<'_, S>) {
    if let Some(node) = cell.scene.take() {
        pass.servers.queue_free(node);
        pass.report.scenes.freed += 1;
    }
}
