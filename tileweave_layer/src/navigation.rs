// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Navigation pass: one region per cell and navigation layer with a mesh.

use kurbo::Affine;

use crate::dirty::DirtyFlags;
use crate::layer::World;
use crate::pass::{Pass, atlas_data, cell_transform};
use crate::servers::Servers;
use crate::store::{CellData, GridStore};
use crate::tile_set::TileSet;
use crate::types::{NavMapId, RegionId};

#[derive(Debug, Default)]
pub(crate) struct Navigation {
    map: Option<NavMapId>,
    owns_map: bool,
    needs_full: bool,
    was_cleaned_up: bool,
}

impl Navigation {
    pub(crate) fn map(&self) -> Option<NavMapId> {
        self.map
    }

    pub(crate) fn update<S: Servers>(&mut self, store: &mut GridStore, pass: &mut Pass<'_, S>) {
        let forced = pass.in_destructor
            || !pass.config.enabled
            || !pass.config.navigation_enabled
            || pass.world.is_none()
            || pass.tile_set.is_none();

        let (false, Some(tile_set), Some(world)) = (forced, pass.tile_set, pass.world) else {
            for cell in store.iter_mut() {
                clear_cell(cell, pass);
            }
            self.release_map(pass.servers, Some(&mut pass.report.navigation.freed));
            self.was_cleaned_up = true;
            return;
        };

        if pass.dirty.any(DirtyFlags::LAYER_INDEX) {
            self.release_map(pass.servers, Some(&mut pass.report.navigation.freed));
        }
        if self.map.is_none() {
            self.acquire_map(world, pass);
            self.needs_full = true;
        }

        let full = self.was_cleaned_up
            || self.needs_full
            || pass.dirty.any(DirtyFlags::TILE_SET | DirtyFlags::IN_TREE);
        for key in pass.cells(store, full) {
            if let Some(cell) = store.cell_mut(key) {
                self.update_cell(cell, tile_set, world, pass);
            }
        }
        self.needs_full = false;
        self.was_cleaned_up = false;
    }

    /// Layer 0 shares the world map; other layers get a private one.
    fn acquire_map<S: Servers>(&mut self, world: &World, pass: &mut Pass<'_, S>) {
        if pass.config.layer_index == 0 {
            self.map = Some(world.navigation_map);
            self.owns_map = false;
        } else {
            let map = pass.servers.map_create();
            pass.servers.map_set_cell_size(map, 1.0);
            pass.servers.map_set_active(map, true);
            pass.report.navigation.created += 1;
            self.map = Some(map);
            self.owns_map = true;
        }
    }

    /// Forget the current map, freeing it if the layer created it.
    fn release_map<S: Servers>(&mut self, servers: &mut S, freed: Option<&mut usize>) {
        if let Some(map) = self.map.take()
            && self.owns_map
        {
            servers.map_free(map);
            if let Some(freed) = freed {
                *freed += 1;
            }
        }
        self.owns_map = false;
    }

    /// Point the layer at a map owned by the host, or back at the default map
    /// with `None`.
    pub(crate) fn set_map<S: Servers>(&mut self, map: Option<NavMapId>, servers: &mut S) {
        if map.is_some() && map == self.map {
            return;
        }
        self.release_map(servers, None);
        self.map = map;
        self.needs_full = true;
    }

    fn update_cell<S: Servers>(&self, cell: &mut CellData, tile_set: &TileSet, world: &World, pass: &mut Pass<'_, S>) {
        let CellData {
            coords,
            tile,
            regions,
            runtime_data,
            ..
        } = cell;
        let Some((_, data)) = atlas_data(tile_set, *tile, runtime_data.as_deref()) else {
            for region in regions.drain(..).flatten() {
                free_region(region, pass);
            }
            return;
        };

        let layers = tile_set.navigation_layers();
        if regions.len() > layers.len() {
            for region in regions.drain(layers.len()..).flatten() {
                free_region(region, pass);
            }
        }
        regions.resize(layers.len(), None);

        let transform = cell_transform(pass.transform, tile_set.map_to_local(*coords));
        for (i, layer) in layers.iter().enumerate() {
            let polygon = data
                .navigation_polygon(i, tile.transform())
                .filter(|p| !p.is_empty());
            let Some(polygon) = polygon else {
                if let Some(region) = regions[i].take() {
                    free_region(region, pass);
                }
                continue;
            };
            let region = *regions[i].get_or_insert_with(|| {
                pass.report.navigation.created += 1;
                pass.servers.region_create()
            });
            let servers = &mut *pass.servers;
            servers.region_set_owner(region, world.instance_id);
            servers.region_set_map(region, self.map);
            servers.region_set_transform(region, transform);
            servers.region_set_navigation_layers(region, layer.layers);
            servers.region_set_navigation_polygon(region, &polygon);
        }
    }

    /// Move every region after the layer moved.
    pub(crate) fn transform_changed<S: Servers>(
        &self,
        store: &GridStore,
        tile_set: &TileSet,
        servers: &mut S,
        transform: Affine,
    ) {
        for cell in store.iter() {
            let xform = cell_transform(transform, tile_set.map_to_local(cell.coords));
            for region in cell.regions.iter().flatten() {
                servers.region_set_transform(*region, xform);
            }
        }
    }
}

fn free_region<S: Servers>(region: RegionId, pass: &mut Pass<'_, S>) {
    pass.servers.region_set_map(region, None);
    pass.servers.region_free(region);
    pass.report.navigation.freed += 1;
}

fn clear_cell<S: Servers>(cell: &mut CellData, pass: &mut Pass<'_, S>) {
    for region in cell.regions.drain(..).flatten() {
        free_region(region, pass);
    }
}
