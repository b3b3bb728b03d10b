// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The tile layer: a sparse grid of cells kept in sync with the backends.

use alloc::boxed::Box;
use alloc::collections::BTreeSet;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cell::Cell;
use core::fmt;

use kurbo::Affine;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tileweave_terrain::{
    ConstraintSet, Coord, OffsetAxis, TerrainFill, TerrainPattern, TerrainSolver,
};

use crate::codec::{self, DecodedCell, TileDataFormat};
use crate::config::{DebugVisibility, LayerConfig, TextureFilter, TextureRepeat};
use crate::dirty::{DirtyFlags, DirtyTracker};
use crate::error::LayerError;
use crate::navigation::Navigation;
use crate::overlay::DebugOverlay;
use crate::pass::Pass;
use crate::pattern::TileMapPattern;
use crate::physics::Physics;
use crate::render::Rendering;
use crate::report::PassReport;
use crate::runtime::{RuntimeData, RuntimeTileDataHook};
use crate::scenes::Scenes;
use crate::scheduler::UpdateScheduler;
use crate::servers::Servers;
use crate::store::{CellData, GridStore};
use crate::terrain::{GridTerrain, random_tile};
use crate::tile_set::{TileData, TileSet};
use crate::types::{
    BodyId, CanvasId, CanvasItemId, CellRect, Color, INVALID_ALTERNATIVE, INVALID_ATLAS_COORDS,
    INVALID_SOURCE, MaterialId, NavMapId, NodeId, SpaceId, TileRef,
};

/// Handles of the world a layer is attached to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct World {
    /// Canvas that occluders attach to.
    pub canvas: CanvasId,
    /// The layer's own draw item; quadrant items are parented to it.
    pub canvas_item: CanvasItemId,
    /// Physics space of the bodies.
    pub space: SpaceId,
    /// Default navigation map, shared by layer 0.
    pub navigation_map: NavMapId,
    /// Node that spawned scenes are parented to.
    pub owner: NodeId,
    /// Instance id attached to bodies and regions.
    pub instance_id: u64,
}

/// A sparse grid of tiles, mirrored into the backend objects of `S`.
///
/// Edits are cheap: they only record what changed. The backends catch up in
/// one update pass, run by [`process`](Self::process) once per frame. Any number
/// of edits between two frames cost a single pass, and a pass with nothing
/// dirty creates and frees nothing.
///
/// Dropping the layer frees every backend object it created.
pub struct TileLayer<S: Servers> {
    servers: S,
    config: LayerConfig,
    tile_set: Option<Arc<TileSet>>,
    store: GridStore,
    dirty: DirtyTracker,
    scheduler: UpdateScheduler,
    world: Option<World>,
    transform: Affine,
    rendering: Rendering,
    physics: Physics,
    navigation: Navigation,
    scenes: Scenes,
    debug: DebugOverlay,
    runtime: RuntimeData,
    hook: Option<Box<dyn RuntimeTileDataHook>>,
    used_rect: Cell<Option<CellRect>>,
    rng: SmallRng,
    in_destructor: bool,
}

impl<S: Servers + fmt::Debug> fmt::Debug for TileLayer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileLayer")
            .field("servers", &self.servers)
            .field("config", &self.config)
            .field("cells", &self.store.len())
            .field("dirty", &self.dirty)
            .field("world", &self.world)
            .field("has_hook", &self.hook.is_some())
            .finish_non_exhaustive()
    }
}

impl<S: Servers> TileLayer<S> {
    /// A detached layer with default settings and no tile set.
    pub fn new(servers: S) -> Self {
        Self::with_config(servers, LayerConfig::default())
    }

    /// A detached layer with `config`.
    pub fn with_config(servers: S, config: LayerConfig) -> Self {
        let rng = SmallRng::seed_from_u64(config.random_seed);
        Self {
            servers,
            config,
            tile_set: None,
            store: GridStore::new(),
            dirty: DirtyTracker::new(),
            scheduler: UpdateScheduler::new(),
            world: None,
            transform: Affine::IDENTITY,
            rendering: Rendering::default(),
            physics: Physics::default(),
            navigation: Navigation::default(),
            scenes: Scenes::default(),
            debug: DebugOverlay::default(),
            runtime: RuntimeData::default(),
            hook: None,
            used_rect: Cell::new(None),
            rng,
            in_destructor: false,
        }
    }

    /// The backends.
    pub fn servers(&self) -> &S {
        &self.servers
    }

    /// The backends, mutably.
    pub fn servers_mut(&mut self) -> &mut S {
        &mut self.servers
    }

    /// Current settings.
    pub fn config(&self) -> &LayerConfig {
        &self.config
    }

    /// The tile set.
    pub fn tile_set(&self) -> Option<&Arc<TileSet>> {
        self.tile_set.as_ref()
    }

    /// Swap the tile set. Every cell is rebuilt on the next pass.
    pub fn set_tile_set(&mut self, tile_set: Option<Arc<TileSet>>) {
        let same = match (&self.tile_set, &tile_set) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if same {
            return;
        }
        self.tile_set = tile_set;
        self.mark(DirtyFlags::TILE_SET);
    }

    /// Install or remove the runtime tile data hook.
    pub fn set_runtime_hook(&mut self, hook: Option<Box<dyn RuntimeTileDataHook>>) {
        self.hook = hook;
        // Cells the previous hook overrode must be redrawn without it.
        for key in self.store.keys() {
            if let Some(cell) = self.store.cell_mut(key) {
                self.dirty.push_cell(key, &mut cell.queued);
            }
        }
        self.mark(DirtyFlags::RUNTIME_UPDATE);
    }

    /// Ask the hook again for every cell on the next pass.
    pub fn notify_runtime_tile_data_update(&mut self) {
        self.mark(DirtyFlags::RUNTIME_UPDATE);
    }

    // --- world attachment ---

    /// Attach to `world`. Everything is built on the next pass.
    pub fn enter_tree(&mut self, world: World) {
        self.world = Some(world);
        self.mark(DirtyFlags::IN_TREE | DirtyFlags::IN_CANVAS);
    }

    /// Detach from the world, releasing every backend object right away.
    pub fn exit_tree(&mut self) -> PassReport {
        self.world = None;
        self.dirty.mark(DirtyFlags::IN_TREE | DirtyFlags::IN_CANVAS);
        self.run_pass()
    }

    /// The world the layer is attached to.
    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    /// Whether the layer is attached.
    pub fn is_in_tree(&self) -> bool {
        self.world.is_some()
    }

    /// Global transform of the layer.
    pub fn transform(&self) -> Affine {
        self.transform
    }

    /// Move the layer. Bodies, regions and occluders follow immediately.
    pub fn set_transform(&mut self, transform: Affine) {
        if self.transform == transform {
            return;
        }
        self.transform = transform;
        if let (Some(tile_set), Some(world)) = (self.tile_set.as_deref(), self.world.as_ref()) {
            self.rendering
                .transform_changed(&self.store, tile_set, world, &mut self.servers, transform);
            self.physics
                .transform_changed(&self.store, tile_set, &mut self.servers, transform);
            self.navigation
                .transform_changed(&self.store, tile_set, &mut self.servers, transform);
        }
        self.mark(DirtyFlags::LOCAL_TRANSFORM);
    }

    // --- settings ---

    fn mark(&mut self, flags: DirtyFlags) {
        self.dirty.mark(flags);
        self.queue_update();
    }

    fn queue_update(&mut self) {
        self.scheduler.request(self.world.is_some());
    }

    fn set_config<T: PartialEq>(
        &mut self,
        value: T,
        field: impl FnOnce(&mut LayerConfig) -> &mut T,
        flags: DirtyFlags,
    ) {
        let slot = field(&mut self.config);
        if *slot == value {
            return;
        }
        *slot = value;
        self.mark(flags);
    }

    /// Enable or disable the layer. Disabled layers hold no backend object.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.set_config(enabled, |c| &mut c.enabled, DirtyFlags::ENABLED);
    }

    /// Show or hide the layer.
    pub fn set_visible(&mut self, visible: bool) {
        self.set_config(visible, |c| &mut c.visible, DirtyFlags::VISIBILITY);
    }

    /// Side of a rendering quadrant in cells. Values below 1 are rejected.
    pub fn set_rendering_quadrant_size(&mut self, size: i32) {
        if size < 1 {
            log::warn!("rendering quadrant size must be at least 1, got {size}");
            return;
        }
        self.set_config(
            size,
            |c| &mut c.rendering_quadrant_size,
            DirtyFlags::QUADRANT_SIZE,
        );
    }

    /// Toggle Y-sorting.
    pub fn set_y_sort_enabled(&mut self, enabled: bool) {
        self.set_config(enabled, |c| &mut c.y_sort_enabled, DirtyFlags::Y_SORT_ENABLED);
    }

    /// Offset added to every tile's Y-sort position.
    pub fn set_y_sort_origin(&mut self, origin: i32) {
        self.set_config(origin, |c| &mut c.y_sort_origin, DirtyFlags::Y_SORT_ORIGIN);
    }

    /// Z-index of the layer.
    pub fn set_z_index(&mut self, z_index: i32) {
        self.set_config(z_index, |c| &mut c.z_index, DirtyFlags::Z_INDEX);
    }

    /// Light mask of draw items.
    pub fn set_light_mask(&mut self, mask: i32) {
        self.set_config(mask, |c| &mut c.light_mask, DirtyFlags::LIGHT_MASK);
    }

    /// Texture filter of draw items.
    pub fn set_texture_filter(&mut self, filter: TextureFilter) {
        self.set_config(filter, |c| &mut c.texture_filter, DirtyFlags::TEXTURE_FILTER);
    }

    /// Texture repeat of draw items.
    pub fn set_texture_repeat(&mut self, repeat: TextureRepeat) {
        self.set_config(repeat, |c| &mut c.texture_repeat, DirtyFlags::TEXTURE_REPEAT);
    }

    /// Tint of the tiles.
    pub fn set_self_modulate(&mut self, color: Color) {
        self.set_config(color, |c| &mut c.self_modulate, DirtyFlags::SELF_MODULATE);
    }

    /// Material inherited by tiles without one.
    pub fn set_material(&mut self, material: Option<MaterialId>) {
        self.set_config(material, |c| &mut c.material, DirtyFlags::MATERIAL);
    }

    /// Create kinematic instead of static bodies.
    pub fn set_collision_animatable(&mut self, animatable: bool) {
        self.set_config(
            animatable,
            |c| &mut c.collision_animatable,
            DirtyFlags::COLLISION_ANIMATABLE,
        );
    }

    /// Debug drawing of collision shapes.
    pub fn set_collision_visibility(&mut self, visibility: DebugVisibility) {
        self.set_config(
            visibility,
            |c| &mut c.collision_visibility,
            DirtyFlags::COLLISION_VISIBILITY,
        );
    }

    /// Enable or disable navigation regions.
    pub fn set_navigation_enabled(&mut self, enabled: bool) {
        self.set_config(
            enabled,
            |c| &mut c.navigation_enabled,
            DirtyFlags::NAVIGATION_ENABLED,
        );
    }

    /// Debug drawing of navigation meshes.
    pub fn set_navigation_visibility(&mut self, visibility: DebugVisibility) {
        self.set_config(
            visibility,
            |c| &mut c.navigation_visibility,
            DirtyFlags::NAVIGATION_VISIBILITY,
        );
    }

    /// Position in the owning group.
    pub fn set_layer_index(&mut self, index: usize) {
        self.set_config(index, |c| &mut c.layer_index, DirtyFlags::LAYER_INDEX);
    }

    /// Toggle the debug overlay.
    pub fn set_debug_overlay(&mut self, enabled: bool) {
        self.set_config(enabled, |c| &mut c.debug_overlay, DirtyFlags::DEBUG_OVERLAY);
    }

    /// Reseed the generator used to pick terrain tiles.
    pub fn set_random_seed(&mut self, seed: u64) {
        self.config.random_seed = seed;
        self.rng = SmallRng::seed_from_u64(seed);
    }

    /// Navigation map the regions join.
    pub fn navigation_map(&self) -> Option<NavMapId> {
        self.navigation.map()
    }

    /// Make the regions join `map`, a map owned by the host. `None` goes back to
    /// the default map on the next pass.
    ///
    /// The choice lasts until the layer detaches.
    pub fn set_navigation_map(&mut self, map: Option<NavMapId>) -> Result<(), LayerError> {
        if self.world.is_none() {
            return Err(LayerError::NotInTree);
        }
        self.navigation.set_map(map, &mut self.servers);
        self.queue_update();
        Ok(())
    }

    // --- cells ---

    /// Put `tile` at `coords`. Empty tiles erase the cell.
    ///
    /// A partially invalid tile counts as empty. Setting the tile a cell already
    /// has does nothing.
    pub fn set_cell(&mut self, coords: Coord, tile: TileRef) {
        let tile = tile.normalized();
        let key = match self.store.key(coords) {
            Some(key) => key,
            None if tile.is_empty() => return,
            None => self.store.get_or_insert(coords),
        };
        let Some(cell) = self.store.cell_mut(key) else {
            return;
        };
        if cell.tile == tile {
            return;
        }
        cell.tile = tile;
        self.dirty.push_cell(key, &mut cell.queued);
        self.used_rect.set(None);
        self.queue_update();
    }

    /// Erase the cell at `coords`.
    pub fn erase_cell(&mut self, coords: Coord) {
        self.set_cell(coords, TileRef::EMPTY);
    }

    /// Erase every cell.
    pub fn clear(&mut self) {
        for coords in self.used_cells() {
            self.erase_cell(coords);
        }
    }

    /// Tile at `coords`, resolved through the tile set proxies if asked.
    pub fn get_cell(&self, coords: Coord, use_proxies: bool) -> TileRef {
        let tile = self.store.get(coords).map_or(TileRef::EMPTY, CellData::tile);
        match (&self.tile_set, use_proxies) {
            (Some(tile_set), true) => tile_set.map_tile_proxy(tile),
            _ => tile,
        }
    }

    /// Source id at `coords`.
    pub fn get_cell_source_id(&self, coords: Coord, use_proxies: bool) -> i32 {
        self.get_cell(coords, use_proxies).source_id
    }

    /// Atlas coordinates at `coords`.
    pub fn get_cell_atlas_coords(&self, coords: Coord, use_proxies: bool) -> Coord {
        self.get_cell(coords, use_proxies).atlas_coords
    }

    /// Alternative id at `coords`.
    pub fn get_cell_alternative_tile(&self, coords: Coord, use_proxies: bool) -> i32 {
        self.get_cell(coords, use_proxies).alternative
    }

    /// Metadata of the atlas tile at `coords`.
    pub fn get_cell_tile_data(&self, coords: Coord, use_proxies: bool) -> Option<&TileData> {
        let tile = self.get_cell(coords, use_proxies);
        self.tile_set.as_deref()?.tile_data(tile)
    }

    /// The entry at `coords`, with its backend handles.
    pub fn cell(&self, coords: Coord) -> Option<&CellData> {
        self.store.get(coords)
    }

    /// Coordinates of every non-empty cell, in order.
    pub fn used_cells(&self) -> Vec<Coord> {
        let mut cells: Vec<Coord> = self
            .store
            .iter()
            .filter(|c| !c.tile.is_empty())
            .map(CellData::coords)
            .collect();
        cells.sort_unstable();
        cells
    }

    /// Coordinates of the cells matching a tile, in order.
    ///
    /// [`INVALID_SOURCE`], [`INVALID_ATLAS_COORDS`] and [`INVALID_ALTERNATIVE`]
    /// match anything.
    pub fn used_cells_by_id(&self, source_id: i32, atlas_coords: Coord, alternative: i32) -> Vec<Coord> {
        let mut cells: Vec<Coord> = self
            .store
            .iter()
            .filter(|c| !c.tile.is_empty())
            .filter(|c| source_id == INVALID_SOURCE || c.tile.source_id == source_id)
            .filter(|c| atlas_coords == INVALID_ATLAS_COORDS || c.tile.atlas_coords == atlas_coords)
            .filter(|c| alternative == INVALID_ALTERNATIVE || c.tile.alternative == alternative)
            .map(CellData::coords)
            .collect();
        cells.sort_unstable();
        cells
    }

    /// Smallest rectangle covering every non-empty cell; [`CellRect::ZERO`] when
    /// there is none.
    pub fn used_rect(&self) -> CellRect {
        if let Some(rect) = self.used_rect.get() {
            return rect;
        }
        let rect = self
            .store
            .iter()
            .filter(|c| !c.tile.is_empty())
            .fold(None, |rect: Option<CellRect>, c| {
                Some(rect.map_or(CellRect::cell(c.coords), |r| r.union_cell(c.coords)))
            })
            .unwrap_or(CellRect::ZERO);
        self.used_rect.set(Some(rect));
        rect
    }

    /// Erase every cell whose tile the tile set does not have. Returns how many
    /// were erased.
    pub fn fix_invalid_tiles(&mut self) -> Result<usize, LayerError> {
        let tile_set = self.tile_set.clone().ok_or(LayerError::NoTileSet)?;
        let invalid: Vec<Coord> = self
            .store
            .iter()
            .filter(|c| !c.tile.is_empty() && !tile_set.has_tile(c.tile))
            .map(CellData::coords)
            .collect();
        for coords in &invalid {
            self.erase_cell(*coords);
        }
        Ok(invalid.len())
    }

    /// Whether `body` is one of the layer's bodies.
    pub fn has_body(&self, body: BodyId) -> bool {
        self.physics.has_body(body)
    }

    /// Cell that owns `body`.
    pub fn coords_for_body(&self, body: BodyId) -> Option<Coord> {
        self.physics.coords_for_body(body)
    }

    // --- patterns and encoding ---

    /// Copy the cells at `coords` into a pattern anchored at their minimum.
    ///
    /// On offset shapes, cells on odd lines are shifted back so that pasting the
    /// pattern on a line of the same parity reproduces the layout.
    pub fn get_pattern(&self, coords: &[Coord]) -> Result<TileMapPattern, LayerError> {
        let tile_set = self.tile_set.as_deref().ok_or(LayerError::NoTileSet)?;
        let mut pattern = TileMapPattern::new();
        let Some(min) = coords.iter().copied().reduce(Coord::min) else {
            return Ok(pattern);
        };

        let axis = tile_set.shape().offset_axis();
        let mut ensure_positive = Coord::ZERO;
        let mut placed = Vec::with_capacity(coords.len());
        for &c in coords {
            let mut in_pattern = c - min;
            match axis {
                Some(OffsetAxis::Horizontal) if min.y % 2 != 0 && in_pattern.y % 2 != 0 => {
                    in_pattern.x -= 1;
                    if in_pattern.x < 0 {
                        ensure_positive.x = 1;
                    }
                }
                Some(OffsetAxis::Vertical) if min.x % 2 != 0 && in_pattern.x % 2 != 0 => {
                    in_pattern.y -= 1;
                    if in_pattern.y < 0 {
                        ensure_positive.y = 1;
                    }
                }
                _ => {}
            }
            placed.push((c, in_pattern));
        }
        for (c, in_pattern) in placed {
            pattern.set_cell(in_pattern + ensure_positive, self.get_cell(c, false));
        }
        Ok(pattern)
    }

    /// Paste `pattern` with its origin at `position`.
    pub fn set_pattern(&mut self, position: Coord, pattern: &TileMapPattern) -> Result<(), LayerError> {
        let tile_set = self.tile_set.clone().ok_or(LayerError::NoTileSet)?;
        for (cell, tile) in pattern.cells() {
            self.set_cell(tile_set.map_pattern(position, cell), tile);
        }
        Ok(())
    }

    /// Every non-empty cell packed in the current format.
    pub fn tile_data(&self) -> Vec<i32> {
        codec::encode(self.used_cells().into_iter().map(|c| (c, self.get_cell(c, false))))
    }

    /// Replace every cell with the packed `data`.
    ///
    /// Malformed data leaves the layer untouched. Legacy cells are mapped through
    /// the tile set's compatibility table; without a tile set their id becomes
    /// the source id and the flip flags become the alternative.
    pub fn set_tile_data(&mut self, format: TileDataFormat, data: &[i32]) -> Result<(), LayerError> {
        let cells = codec::decode(format, data)?;
        let tile_set = self.tile_set.clone();
        self.clear();
        for cell in cells {
            match cell {
                DecodedCell::Tile { coords, tile } => self.set_cell(coords, tile),
                DecodedCell::Legacy {
                    coords,
                    tile_id,
                    autotile_coords,
                    transform,
                } => match &tile_set {
                    Some(tile_set) => {
                        match tile_set.compatibility_tile(tile_id, autotile_coords, transform) {
                            Some(tile) => self.set_cell(coords, tile),
                            None => log::warn!(
                                "no compatibility entry for tile {tile_id} {autotile_coords} at {coords}"
                            ),
                        }
                    }
                    None => self.set_cell(
                        coords,
                        TileRef::new(tile_id, autotile_coords, transform.legacy_alternative()),
                    ),
                },
            }
        }
        Ok(())
    }

    // --- terrains ---

    fn with_solver<T>(
        &self,
        terrain_set: i32,
        f: impl FnOnce(&TerrainSolver<'_, GridTerrain<'_>>) -> Result<T, LayerError>,
    ) -> Result<T, LayerError> {
        let tile_set = self.tile_set.as_deref().ok_or(LayerError::NoTileSet)?;
        let source = GridTerrain {
            tile_set,
            store: &self.store,
        };
        let solver = TerrainSolver::new(&source, terrain_set)?;
        f(&solver)
    }

    /// Patterns for `to_replace` that best satisfy `constraints`.
    pub fn terrain_fill_constraints(
        &self,
        to_replace: &[Coord],
        terrain_set: i32,
        constraints: &ConstraintSet,
    ) -> Result<TerrainFill, LayerError> {
        self.with_solver(terrain_set, |s| Ok(s.fill_constraints(to_replace, constraints)))
    }

    /// Patterns that paint `coords` with `terrain`, connected to each other and
    /// to their surroundings.
    pub fn terrain_fill_connect(
        &self,
        coords: &[Coord],
        terrain_set: i32,
        terrain: i32,
        ignore_empty: bool,
    ) -> Result<TerrainFill, LayerError> {
        self.with_solver(terrain_set, |s| Ok(s.fill_connect(coords, terrain, ignore_empty)))
    }

    /// Patterns that paint the path through `coords` with `terrain`.
    pub fn terrain_fill_path(
        &self,
        coords: &[Coord],
        terrain_set: i32,
        terrain: i32,
        ignore_empty: bool,
    ) -> Result<TerrainFill, LayerError> {
        self.with_solver(terrain_set, |s| Ok(s.fill_path(coords, terrain, ignore_empty)?))
    }

    /// Patterns that stamp `pattern` on every cell of `coords`.
    pub fn terrain_fill_pattern(
        &self,
        coords: &[Coord],
        terrain_set: i32,
        pattern: &TerrainPattern,
        ignore_empty: bool,
    ) -> Result<TerrainFill, LayerError> {
        self.with_solver(terrain_set, |s| Ok(s.fill_pattern(coords, pattern, ignore_empty)))
    }

    /// Paint `coords` with `terrain`, connecting the result to its surroundings.
    pub fn set_cells_terrain_connect(
        &mut self,
        coords: &[Coord],
        terrain_set: i32,
        terrain: i32,
        ignore_empty: bool,
    ) -> Result<(), LayerError> {
        let fill = self.terrain_fill_connect(coords, terrain_set, terrain, ignore_empty)?;
        self.apply_terrain_fill(coords, terrain_set, fill)
    }

    /// Paint the path through `coords` with `terrain`.
    pub fn set_cells_terrain_path(
        &mut self,
        coords: &[Coord],
        terrain_set: i32,
        terrain: i32,
        ignore_empty: bool,
    ) -> Result<(), LayerError> {
        let fill = self.terrain_fill_path(coords, terrain_set, terrain, ignore_empty)?;
        self.apply_terrain_fill(coords, terrain_set, fill)
    }

    /// Write a solver result as tiles.
    ///
    /// Painted cells always get a fresh random tile. Surrounding cells keep their
    /// tile when its pattern is already the one asked for.
    fn apply_terrain_fill(
        &mut self,
        painted: &[Coord],
        terrain_set: i32,
        fill: TerrainFill,
    ) -> Result<(), LayerError> {
        let tile_set = self.tile_set.clone().ok_or(LayerError::NoTileSet)?;
        let painted: BTreeSet<Coord> = painted.iter().copied().collect();
        for (coords, pattern) in fill {
            if !painted.contains(&coords) {
                let current = self
                    .store
                    .get(coords)
                    .and_then(|c| tile_set.pattern_of(c.tile, terrain_set))
                    .unwrap_or(TerrainPattern::EMPTY);
                if current == pattern {
                    continue;
                }
            }
            let tile = random_tile(&tile_set, terrain_set, &pattern, &mut self.rng);
            self.set_cell(coords, tile);
        }
        Ok(())
    }

    // --- update pass ---

    /// Whether a pass is owed.
    pub fn is_update_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// Number of passes run so far.
    pub fn passes(&self) -> u64 {
        self.scheduler.passes()
    }

    /// Run the owed pass, if any. Call once per frame.
    pub fn process(&mut self) -> Option<PassReport> {
        if !self.scheduler.begin() {
            return None;
        }
        Some(self.run_pass())
    }

    /// Run a pass now, owed or not.
    pub fn update_internals(&mut self) -> PassReport {
        self.run_pass()
    }

    /// Free every backend object. Later passes keep the layer released.
    ///
    /// Called on drop if the host did not call it.
    pub fn teardown(&mut self) -> PassReport {
        if self.in_destructor {
            return PassReport::default();
        }
        self.in_destructor = true;
        self.run_pass()
    }

    /// Number of rendering quadrants.
    pub fn quadrant_count(&self) -> usize {
        self.rendering.quadrant_count()
    }

    /// Number of debug quadrants.
    pub fn debug_quadrant_count(&self) -> usize {
        self.debug.quadrant_count()
    }

    /// Draw items of the rendering quadrants, in draw order.
    pub fn draw_items(&self) -> Vec<CanvasItemId> {
        self.rendering.items()
    }

    /// Number of physics bodies.
    pub fn body_count(&self) -> usize {
        self.physics.body_count()
    }

    fn run_pass(&mut self) -> PassReport {
        let mut report = PassReport {
            dirty_cells: self.dirty.cells().len(),
            ..PassReport::default()
        };
        let tile_set = self.tile_set.clone();

        self.runtime.build(
            &mut self.store,
            &mut self.dirty,
            tile_set.as_deref(),
            &self.config,
            self.hook.as_deref_mut(),
            self.in_destructor,
        );

        {
            let mut pass = Pass {
                servers: &mut self.servers,
                tile_set: tile_set.as_deref(),
                config: &self.config,
                dirty: &self.dirty,
                world: self.world.as_ref(),
                transform: self.transform,
                in_destructor: self.in_destructor,
                report: &mut report,
            };
            self.rendering.update(&mut self.store, &mut pass);
            log::trace!(
                "rendering: items {:?}, occluders {:?}",
                pass.report.canvas_items,
                pass.report.occluders
            );
            self.physics.update(&mut self.store, &mut pass);
            log::trace!("physics: bodies {:?}", pass.report.bodies);
            self.navigation.update(&mut self.store, &mut pass);
            log::trace!("navigation: {:?}", pass.report.navigation);
            self.scenes.update(&mut self.store, &mut pass);
            log::trace!("scenes: {:?}", pass.report.scenes);
            self.debug.update(&mut self.store, &mut pass);
            log::trace!("debug: items {:?}", pass.report.debug_items);
        }

        self.runtime.clear(&mut self.store, &self.dirty);

        // Erased cells have released everything by now.
        let tombstones: Vec<Coord> = self
            .dirty
            .cells()
            .iter()
            .filter_map(|key| self.store.cell(*key))
            .filter(|c| c.tile.is_empty())
            .map(CellData::coords)
            .collect();
        for coords in tombstones {
            self.store.remove(coords);
            report.removed_cells += 1;
        }
        for key in self.dirty.reset() {
            if let Some(cell) = self.store.cell_mut(key) {
                cell.queued = false;
            }
        }
        self.scheduler.finish();

        log::debug!(
            "pass {}: {} dirty cells, {:?}",
            self.scheduler.passes(),
            report.dirty_cells,
            report.total()
        );
        report
    }
}

impl<S: Servers> Drop for TileLayer<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}
