// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Physics pass: one body per cell and physics layer that has collision polygons.

use hashbrown::HashMap;
use kurbo::Affine;
use tileweave_terrain::Coord;

use crate::dirty::DirtyFlags;
use crate::layer::World;
use crate::pass::{Pass, atlas_data, cell_transform};
use crate::servers::{BodyMode, Servers};
use crate::store::{CellData, GridStore};
use crate::tile_set::TileSet;
use crate::types::BodyId;

#[derive(Debug, Default)]
pub(crate) struct Physics {
    body_coords: HashMap<BodyId, Coord>,
    was_cleaned_up: bool,
}

impl Physics {
    pub(crate) fn has_body(&self, body: BodyId) -> bool {
        self.body_coords.contains_key(&body)
    }

    pub(crate) fn coords_for_body(&self, body: BodyId) -> Option<Coord> {
        self.body_coords.get(&body).copied()
    }

    pub(crate) fn body_count(&self) -> usize {
        self.body_coords.len()
    }

    pub(crate) fn update<S: Servers>(&mut self, store: &mut GridStore, pass: &mut Pass<'_, S>) {
        let forced = pass.in_destructor
            || !pass.config.enabled
            || pass.world.is_none()
            || pass.tile_set.is_none();

        match (forced, pass.tile_set, pass.world) {
            (false, Some(tile_set), Some(world)) => {
                let full = self.was_cleaned_up
                    || pass.dirty.any(
                        DirtyFlags::TILE_SET | DirtyFlags::COLLISION_ANIMATABLE | DirtyFlags::IN_TREE,
                    );
                for key in pass.cells(store, full) {
                    if let Some(cell) = store.cell_mut(key) {
                        self.update_cell(cell, tile_set, world, pass);
                    }
                }
            }
            _ => {
                for cell in store.iter_mut() {
                    self.clear_cell(cell, pass);
                }
            }
        }
        self.was_cleaned_up = forced;
    }

    fn free_body<S: Servers>(&mut self, body: BodyId, pass: &mut Pass<'_, S>) {
        self.body_coords.remove(&body);
        pass.servers.body_free(body);
        pass.report.bodies.freed += 1;
    }

    fn clear_cell<S: Servers>(&mut self, cell: &mut CellData, pass: &mut Pass<'_, S>) {
        for body in cell.bodies.drain(..).flatten() {
            self.free_body(body, pass);
        }
    }

    fn update_cell<S: Servers>(&mut self, cell: &mut CellData, tile_set: &TileSet, world: &World, pass: &mut Pass<'_, S>) {
        let CellData {
            coords,
            tile,
            bodies,
            runtime_data,
            ..
        } = cell;
        let Some((_, data)) = atlas_data(tile_set, *tile, runtime_data.as_deref()) else {
            for body in bodies.drain(..).flatten() {
                self.free_body(body, pass);
            }
            return;
        };

        let layers = tile_set.physics_layers();
        if bodies.len() > layers.len() {
            for body in bodies.drain(layers.len()..).flatten() {
                self.free_body(body, pass);
            }
        }
        bodies.resize(layers.len(), None);

        let transform = cell_transform(pass.transform, tile_set.map_to_local(*coords));
        let mode = if pass.config.collision_animatable {
            BodyMode::Kinematic
        } else {
            BodyMode::Static
        };
        for (i, layer) in layers.iter().enumerate() {
            let Some(physics) = data.physics(i).filter(|p| !p.polygons.is_empty()) else {
                if let Some(body) = bodies[i].take() {
                    self.free_body(body, pass);
                }
                continue;
            };

            let body = match bodies[i] {
                Some(body) => body,
                None => {
                    let body = pass.servers.body_create();
                    pass.report.bodies.created += 1;
                    bodies[i] = Some(body);
                    body
                }
            };
            self.body_coords.insert(body, *coords);

            let servers = &mut *pass.servers;
            servers.body_set_mode(body, mode);
            servers.body_set_space(body, Some(world.space));
            servers.body_set_transform(body, transform);
            servers.body_attach_owner(body, world.instance_id);
            servers.body_set_collision_layer(body, layer.collision_layer);
            servers.body_set_collision_mask(body, layer.collision_mask);
            servers.body_set_pickable(body, false);
            servers.body_set_linear_velocity(body, physics.linear_velocity);
            servers.body_set_angular_velocity(body, physics.angular_velocity);
            let (bounce, friction) = layer
                .material
                .as_ref()
                .map_or((0.0, 1.0), |m| (m.computed_bounce(), m.computed_friction()));
            servers.body_set_bounce(body, bounce);
            servers.body_set_friction(body, friction);

            servers.body_clear_shapes(body);
            let mut shape_index = 0;
            for (p, polygon) in physics.polygons.iter().enumerate() {
                for shape in data.collision_shapes(i, p, tile.transform()) {
                    servers.body_add_shape(body, &shape);
                    servers.body_set_shape_one_way(body, shape_index, polygon.one_way, polygon.one_way_margin);
                    shape_index += 1;
                }
            }
        }
    }

    /// Move every body after the layer moved.
    pub(crate) fn transform_changed<S: Servers>(
        &self,
        store: &GridStore,
        tile_set: &TileSet,
        servers: &mut S,
        transform: Affine,
    ) {
        for cell in store.iter() {
            let xform = cell_transform(transform, tile_set.map_to_local(cell.coords));
            for body in cell.bodies.iter().flatten() {
                servers.body_set_transform(*body, xform);
            }
        }
    }
}
