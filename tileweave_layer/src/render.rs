// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rendering pass: batches cells into quadrants, one draw item per run of
//! tiles sharing a material and z-index, plus one light occluder per cell and
//! occlusion layer.

use alloc::vec::Vec;

use kurbo::{Affine, Point};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tileweave_terrain::Coord;

use crate::dirty::DirtyFlags;
use crate::layer::World;
use crate::pass::{Pass, atlas_data, cell_transform};
use crate::quadrant::{QuadrantIndex, grid_key, y_sort_key};
use crate::servers::{Servers, TileDraw};
use crate::store::{CellData, CellKey, GridStore};
use crate::tile_set::{AnimationMode, TileSet};
use crate::types::{CanvasItemId, MaterialId};

/// Aspects that change how cells map to quadrants when Y-sorting.
const Y_SORT_SHAPE: DirtyFlags = DirtyFlags::Y_SORT_ENABLED
    .union(DirtyFlags::Y_SORT_ORIGIN)
    .union(DirtyFlags::LOCAL_TRANSFORM)
    .union(DirtyFlags::TILE_SET);

/// Aspects re-applied to every existing draw item.
const ITEM_SETTINGS: DirtyFlags = DirtyFlags::LIGHT_MASK
    .union(DirtyFlags::TEXTURE_FILTER)
    .union(DirtyFlags::TEXTURE_REPEAT)
    .union(DirtyFlags::SELF_MODULATE);

#[derive(Debug, Default)]
pub(crate) struct Rendering {
    quadrants: QuadrantIndex,
    was_cleaned_up: bool,
}

impl Rendering {
    pub(crate) fn quadrant_count(&self) -> usize {
        self.quadrants.len()
    }

    /// Draw items in draw order.
    pub(crate) fn items(&self) -> Vec<CanvasItemId> {
        self.ordered_quadrants()
            .into_iter()
            .filter_map(|key| self.quadrants.get(key))
            .flat_map(|q| q.items.iter().copied())
            .collect()
    }

    pub(crate) fn update<S: Servers>(&mut self, store: &mut GridStore, pass: &mut Pass<'_, S>) {
        let forced = pass.in_destructor
            || !pass.config.enabled
            || !pass.config.visible
            || pass.tile_set.is_none()
            || pass.world.is_none();

        let dirty = pass.dirty;
        let shape_changed = dirty.any(DirtyFlags::QUADRANT_SIZE | DirtyFlags::Y_SORT_ENABLED)
            || (pass.config.y_sort_enabled && dirty.any(Y_SORT_SHAPE));
        if forced || shape_changed {
            self.free_all(store, pass);
            self.was_cleaned_up = true;
        }

        if let (false, Some(tile_set), Some(world)) = (forced, pass.tile_set, pass.world) {
            let full = self.was_cleaned_up
                || dirty.any(
                    DirtyFlags::TILE_SET
                        | DirtyFlags::IN_TREE
                        | DirtyFlags::IN_CANVAS
                        | DirtyFlags::MATERIAL,
                );
            if full || dirty.any(DirtyFlags::Z_INDEX) {
                pass.servers
                    .canvas_item_set_z_index(world.canvas_item, pass.config.z_index);
            }
            for key in pass.cells(store, full) {
                self.place_cell(store, key, tile_set, pass);
            }
            let touched = self.quadrants.take_dirty();
            for key in &touched {
                self.redraw(store, *key, tile_set, world, pass);
            }
            if full || !touched.is_empty() {
                self.reindex(pass.servers);
            }
            if dirty.any(ITEM_SETTINGS) {
                self.reapply_settings(pass);
            }
        }

        self.update_occluders(store, pass, forced);
        self.was_cleaned_up = forced;
    }

    fn free_all<S: Servers>(&mut self, store: &mut GridStore, pass: &mut Pass<'_, S>) {
        for q in self.quadrants.drain() {
            for item in q.items {
                pass.servers.canvas_item_free(item);
                pass.report.canvas_items.freed += 1;
            }
        }
        for cell in store.iter_mut() {
            cell.rendering_quadrant = None;
        }
    }

    fn place_cell<S>(&mut self, store: &mut GridStore, key: CellKey, tile_set: &TileSet, pass: &Pass<'_, S>) {
        let Some(cell) = store.cell_mut(key) else {
            return;
        };
        let y_origin = atlas_data(tile_set, cell.tile, cell.runtime_data.as_deref())
            .map(|(_, data)| data.y_sort_origin);
        let Some(y_origin) = y_origin else {
            self.quadrants.evict(key, &mut cell.rendering_quadrant);
            return;
        };
        let (quadrant, origin) = if pass.config.y_sort_enabled {
            y_sort_key(tile_set.map_to_local(cell.coords), y_origin, pass.config.y_sort_origin)
        } else {
            let size = pass.config.rendering_quadrant_size.max(1);
            let quadrant = grid_key(cell.coords, size);
            (quadrant, tile_set.map_to_local(quadrant * size))
        };
        self.quadrants
            .place(key, &mut cell.rendering_quadrant, quadrant, origin);
    }

    fn redraw<S: Servers>(
        &mut self,
        store: &mut GridStore,
        key: Coord,
        tile_set: &TileSet,
        world: &World,
        pass: &mut Pass<'_, S>,
    ) {
        let Some(q) = self.quadrants.get_mut(key) else {
            return;
        };
        for item in q.items.drain(..) {
            pass.servers.canvas_item_free(item);
            pass.report.canvas_items.freed += 1;
        }

        let has_tile = q
            .cells
            .iter()
            .any(|k| store.cell(*k).is_some_and(|c| !c.tile.is_empty()));
        if !has_tile {
            if let Some(q) = self.quadrants.remove(key) {
                for k in q.cells {
                    if let Some(cell) = store.cell_mut(k) {
                        cell.rendering_quadrant = None;
                    }
                }
            }
            return;
        }

        let origin = q.origin;
        let y_sort = pass.config.y_sort_enabled;
        let mut order: Vec<(f64, Coord, CellKey)> = q
            .cells
            .iter()
            .filter_map(|k| {
                let cell = store.cell(*k)?;
                let (_, data) = atlas_data(tile_set, cell.tile, cell.runtime_data.as_deref())?;
                let sort_y = tile_set.map_to_local(cell.coords).y + f64::from(data.y_sort_origin);
                Some((sort_y, cell.coords, *k))
            })
            .collect();
        if y_sort {
            order.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        } else {
            order.sort_by_key(|e| e.1);
        }

        let mut current: Option<(Option<MaterialId>, i32, CanvasItemId)> = None;
        for (_, _, k) in order {
            let Some(cell) = store.cell(k) else {
                continue;
            };
            let Some((atlas, data)) = atlas_data(tile_set, cell.tile, cell.runtime_data.as_deref())
            else {
                continue;
            };
            let item = match current {
                Some((material, z, item)) if material == data.material && z == data.z_index => item,
                _ => {
                    let item = create_item(pass, world, origin, data.material, data.z_index);
                    q.items.push(item);
                    current = Some((data.material, data.z_index, item));
                    item
                }
            };

            let local = tile_set.map_to_local(cell.coords);
            let animation_offset = match atlas.animation_mode(cell.tile.atlas_coords) {
                AnimationMode::RandomStartTimes => animation_offset(local, world.instance_id),
                AnimationMode::Default => 0.0,
            };
            let draw = TileDraw {
                texture: atlas.texture,
                tile: cell.tile,
                position: (local - origin).to_point(),
                transform: cell.tile.transform(),
                modulate: data.modulate,
                animation_offset,
            };
            pass.servers.canvas_item_add_tile(item, &draw);
        }
    }

    /// Quadrant keys ordered by origin, top to bottom then left to right.
    fn ordered_quadrants(&self) -> Vec<Coord> {
        let mut order: Vec<(Point, Coord)> = self.quadrants.iter().map(|q| (q.origin, q.key)).collect();
        order.sort_by(|a, b| {
            a.0.y
                .total_cmp(&b.0.y)
                .then(a.0.x.total_cmp(&b.0.x))
                .then(a.1.cmp(&b.1))
        });
        order.into_iter().map(|(_, key)| key).collect()
    }

    /// Renumber every draw item so sibling order follows quadrant order.
    fn reindex<S: Servers>(&self, servers: &mut S) {
        let mut index = i32::MIN;
        for item in self.items() {
            servers.canvas_item_set_draw_index(item, index);
            index = index.saturating_add(1);
        }
    }

    fn reapply_settings<S: Servers>(&self, pass: &mut Pass<'_, S>) {
        let config = pass.config;
        for q in self.quadrants.iter() {
            for item in &q.items {
                pass.servers.canvas_item_set_light_mask(*item, config.light_mask);
                pass.servers
                    .canvas_item_set_texture_filter(*item, config.texture_filter);
                pass.servers
                    .canvas_item_set_texture_repeat(*item, config.texture_repeat);
                pass.servers
                    .canvas_item_set_self_modulate(*item, config.self_modulate);
            }
        }
    }

    fn update_occluders<S: Servers>(&mut self, store: &mut GridStore, pass: &mut Pass<'_, S>, forced: bool) {
        match (forced, pass.tile_set, pass.world) {
            (false, Some(tile_set), Some(world)) => {
                let full = self.was_cleaned_up || pass.dirty.any(DirtyFlags::TILE_SET);
                for key in pass.cells(store, full) {
                    if let Some(cell) = store.cell_mut(key) {
                        update_cell_occluders(cell, tile_set, world, pass);
                    }
                }
            }
            _ => {
                for cell in store.iter_mut() {
                    clear_cell_occluders(cell, pass);
                }
            }
        }
    }

    /// Move every occluder after the layer moved.
    pub(crate) fn transform_changed<S: Servers>(
        &self,
        store: &GridStore,
        tile_set: &TileSet,
        world: &World,
        servers: &mut S,
        transform: Affine,
    ) {
        for cell in store.iter() {
            let xform = cell_transform(transform, tile_set.map_to_local(cell.coords));
            for occluder in cell.occluders.iter().flatten() {
                servers.occluder_attach_to_canvas(*occluder, Some(world.canvas));
                servers.occluder_set_transform(*occluder, xform);
            }
        }
    }
}

fn create_item<S: Servers>(
    pass: &mut Pass<'_, S>,
    world: &World,
    origin: Point,
    material: Option<MaterialId>,
    z_index: i32,
) -> CanvasItemId {
    let config = pass.config;
    let servers = &mut *pass.servers;
    let item = servers.canvas_item_create();
    servers.canvas_item_set_material(item, material.or(config.material));
    servers.canvas_item_set_parent(item, Some(world.canvas_item));
    servers.canvas_item_set_transform(item, Affine::translate(origin.to_vec2()));
    servers.canvas_item_set_light_mask(item, config.light_mask);
    servers.canvas_item_set_z_index(item, z_index);
    servers.canvas_item_set_texture_filter(item, config.texture_filter);
    servers.canvas_item_set_texture_repeat(item, config.texture_repeat);
    servers.canvas_item_set_self_modulate(item, config.self_modulate);
    pass.report.canvas_items.created += 1;
    item
}

/// Stable phase offset in `[0, 1)` for an animated tile drawn at `local`.
pub(crate) fn animation_offset(local: Point, instance_id: u64) -> f64 {
    let seed = mix(mix(local.x.to_bits()) ^ local.y.to_bits().rotate_left(32) ^ instance_id);
    SmallRng::seed_from_u64(seed).gen_range(0.0..1.0)
}

fn mix(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn update_cell_occluders<S: Servers>(cell: &mut CellData, tile_set: &TileSet, world: &World, pass: &mut Pass<'_, S>) {
    let CellData {
        coords,
        tile,
        occluders,
        runtime_data,
        ..
    } = cell;
    let Some((_, data)) = atlas_data(tile_set, *tile, runtime_data.as_deref()) else {
        for occluder in occluders.drain(..).flatten() {
            pass.servers.occluder_free(occluder);
            pass.report.occluders.freed += 1;
        }
        return;
    };

    let layers = tile_set.occlusion_layers();
    if occluders.len() > layers.len() {
        for occluder in occluders.drain(layers.len()..).flatten() {
            pass.servers.occluder_free(occluder);
            pass.report.occluders.freed += 1;
        }
    }
    occluders.resize(layers.len(), None);

    let xform = cell_transform(pass.transform, tile_set.map_to_local(*coords));
    for (i, layer) in layers.iter().enumerate() {
        match data.occluder(i, tile.transform()) {
            Some(polygon) => {
                let occluder = *occluders[i].get_or_insert_with(|| {
                    pass.report.occluders.created += 1;
                    pass.servers.occluder_create()
                });
                let servers = &mut *pass.servers;
                servers.occluder_set_transform(occluder, xform);
                servers.occluder_set_polygon(occluder, &polygon);
                servers.occluder_attach_to_canvas(occluder, Some(world.canvas));
                servers.occluder_set_light_mask(occluder, layer.light_mask);
                servers.occluder_set_as_sdf_collision(occluder, layer.sdf_collision);
            }
            None => {
                if let Some(occluder) = occluders[i].take() {
                    pass.servers.occluder_free(occluder);
                    pass.report.occluders.freed += 1;
                }
            }
        }
    }
}

fn clear_cell_occluders<S: Servers>(cell: &mut CellData, pass: &mut Pass<'_, S>) {
    for occluder in cell.occluders.drain(..).flatten() {
        pass.servers.occluder_free(occluder);
        pass.report.occluders.freed += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn animation_offsets_are_stable_and_in_range() {
        let a = animation_offset(Point::new(8.0, 24.0), 7);
        assert_eq!(a, animation_offset(Point::new(8.0, 24.0), 7));
        assert!((0.0..1.0).contains(&a));
        let others = [
            animation_offset(Point::new(24.0, 8.0), 7),
            animation_offset(Point::new(8.0, 24.0), 8),
        ];
        assert!(others.iter().any(|o| *o != a));
    }
}
