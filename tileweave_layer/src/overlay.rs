// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Debug overlay pass: draws collision shapes, navigation meshes, scene
//! placeholders and missing tiles into one draw item per debug quadrant.

use alloc::vec::Vec;

use kurbo::{Affine, Point, Vec2};
use tileweave_terrain::Coord;

use crate::dirty::DirtyFlags;
use crate::layer::World;
use crate::pass::Pass;
use crate::quadrant::{DEBUG_QUADRANT_SIZE, QuadrantIndex, grid_key};
use crate::servers::Servers;
use crate::store::{CellData, GridStore};
use crate::tile_set::{TileSet, TileSource};
use crate::types::{CanvasItemId, Color};

/// Debug items draw above every tile.
const DEBUG_Z_INDEX: i32 = 4095;

const MISSING_COLOR: Color = Color::new(1.0, 0.0, 0.0, 0.6);
const COLLISION_COLOR: Color = Color::new(0.0, 0.6, 0.7, 0.42);
const NAVIGATION_COLOR: Color = Color::new(0.5, 1.0, 1.0, 0.4);

/// Aspects that change what the debug items show.
const DEBUG_OUTPUT: DirtyFlags = DirtyFlags::IN_TREE
    .union(DirtyFlags::VISIBILITY)
    .union(DirtyFlags::TILE_SET)
    .union(DirtyFlags::RUNTIME_UPDATE)
    .union(DirtyFlags::COLLISION_VISIBILITY)
    .union(DirtyFlags::NAVIGATION_VISIBILITY)
    .union(DirtyFlags::DEBUG_OVERLAY);

#[derive(Debug, Default)]
pub(crate) struct DebugOverlay {
    quadrants: QuadrantIndex,
    was_cleaned_up: bool,
}

impl DebugOverlay {
    pub(crate) fn quadrant_count(&self) -> usize {
        self.quadrants.len()
    }

    pub(crate) fn update<S: Servers>(&mut self, store: &mut GridStore, pass: &mut Pass<'_, S>) {
        let forced = pass.in_destructor
            || !pass.config.enabled
            || !pass.config.visible
            || !pass.config.debug_active()
            || pass.tile_set.is_none()
            || pass.world.is_none();

        let (false, Some(tile_set), Some(world)) = (forced, pass.tile_set, pass.world) else {
            for q in self.quadrants.drain() {
                for item in q.items {
                    pass.servers.canvas_item_free(item);
                    pass.report.debug_items.freed += 1;
                }
            }
            for cell in store.iter_mut() {
                cell.debug_quadrant = None;
            }
            self.was_cleaned_up = true;
            return;
        };

        let full = self.was_cleaned_up || pass.dirty.flags().intersects(DEBUG_OUTPUT);
        for key in pass.cells(store, full) {
            let Some(cell) = store.cell_mut(key) else {
                continue;
            };
            if cell.tile.is_empty() {
                self.quadrants.evict(key, &mut cell.debug_quadrant);
            } else {
                let quadrant = grid_key(cell.coords, DEBUG_QUADRANT_SIZE);
                let origin = tile_set.map_to_local(quadrant * DEBUG_QUADRANT_SIZE);
                self.quadrants
                    .place(key, &mut cell.debug_quadrant, quadrant, origin);
            }
        }

        for key in self.quadrants.take_dirty() {
            self.redraw(store, key, tile_set, world, pass);
        }
        self.was_cleaned_up = false;
    }

    fn redraw<S: Servers>(
        &mut self,
        store: &GridStore,
        key: Coord,
        tile_set: &TileSet,
        world: &World,
        pass: &mut Pass<'_, S>,
    ) {
        let Some(q) = self.quadrants.get_mut(key) else {
            return;
        };
        let mut cells: Vec<&CellData> = q
            .cells
            .iter()
            .filter_map(|k| store.cell(*k))
            .filter(|c| !c.tile.is_empty())
            .collect();
        if cells.is_empty() {
            if let Some(q) = self.quadrants.remove(key) {
                for item in q.items {
                    pass.servers.canvas_item_free(item);
                    pass.report.debug_items.freed += 1;
                }
            }
            return;
        }
        cells.sort_by_key(|c| c.coords);

        let item = match q.items.first() {
            Some(item) => {
                pass.servers.canvas_item_clear(*item);
                *item
            }
            None => {
                let item = pass.servers.canvas_item_create();
                pass.servers.canvas_item_set_z_index(item, DEBUG_Z_INDEX);
                pass.servers
                    .canvas_item_set_parent(item, Some(world.canvas_item));
                pass.report.debug_items.created += 1;
                q.items.push(item);
                item
            }
        };
        pass.servers
            .canvas_item_set_transform(item, Affine::translate(q.origin.to_vec2()));

        let origin = q.origin;
        for cell in cells {
            draw_cell(item, cell, origin, tile_set, pass);
        }
    }
}

fn draw_cell<S: Servers>(item: CanvasItemId, cell: &CellData, origin: Point, tile_set: &TileSet, pass: &mut Pass<'_, S>) {
    let config = pass.config;
    let offset = tile_set.map_to_local(cell.coords) - origin;
    let tile = cell.tile;
    let size = tile_set.tile_size();

    match tile_set.source(tile.source_id) {
        Some(TileSource::Scenes(_)) => match tile_set.scene_tile(tile) {
            Some(scene) if scene.scene.is_none() || scene.display_placeholder => {
                let hash = (u64::from(tile.source_id.unsigned_abs()) << 32)
                    | u64::from(tile.alternative.unsigned_abs());
                let color = Color::from_hash(hash.wrapping_mul(0x9E37_79B9_7F4A_7C15), 0.5);
                let radius = size.width.min(size.height) / 4.0;
                pass.servers
                    .canvas_item_add_circle(item, offset.to_point(), radius, color);
            }
            Some(_) => {}
            None => draw_missing(item, offset, tile_set, pass),
        },
        Some(TileSource::Atlas(_)) => {
            let Some(data) = cell
                .runtime_data
                .as_deref()
                .or_else(|| tile_set.tile_data(tile))
            else {
                draw_missing(item, offset, tile_set, pass);
                return;
            };
            if config.collision_visibility.is_shown(config.debug_overlay) {
                for layer in 0..tile_set.physics_layers().len() {
                    for p in 0..data.collision_polygon_count(layer) {
                        for shape in data.collision_shapes(layer, p, tile.transform()) {
                            let points: Vec<Point> = shape.iter().map(|pt| *pt + offset).collect();
                            pass.servers
                                .canvas_item_add_polygon(item, &points, COLLISION_COLOR);
                        }
                    }
                }
            }
            if config.navigation_visibility.is_shown(config.debug_overlay) {
                for layer in 0..tile_set.navigation_layers().len() {
                    let Some(mesh) = data.navigation_polygon(layer, tile.transform()) else {
                        continue;
                    };
                    for polygon in &mesh.polygons {
                        let points: Vec<Point> = polygon
                            .iter()
                            .filter_map(|i| mesh.vertices.get(*i))
                            .map(|pt| *pt + offset)
                            .collect();
                        pass.servers
                            .canvas_item_add_polygon(item, &points, NAVIGATION_COLOR);
                    }
                }
            }
        }
        None => draw_missing(item, offset, tile_set, pass),
    }
}

/// Red square over a cell whose tile is not in the tile set.
fn draw_missing<S: Servers>(item: CanvasItemId, offset: Vec2, tile_set: &TileSet, pass: &mut Pass<'_, S>) {
    let half = Vec2::new(tile_set.tile_size().width, tile_set.tile_size().height) / 4.0;
    let center = offset.to_point();
    let square = [
        center + Vec2::new(-half.x, -half.y),
        center + Vec2::new(half.x, -half.y),
        center + Vec2::new(half.x, half.y),
        center + Vec2::new(-half.x, half.y),
    ];
    pass.servers
        .canvas_item_add_polygon(item, &square, MISSING_COLOR);
}
