// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Read-only tile set: sources, per-tile metadata, layers, terrains and proxies.
//!
//! A [`TileSet`] is assembled once with [`TileSetBuilder`] and then shared
//! (usually behind an `Rc`) by every layer that draws from it. Building also
//! computes the terrain cache: for every terrain set, the list of patterns some
//! tile provides and the weighted tiles providing each pattern.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use kurbo::{Point, Size, Vec2};
use tileweave_terrain::{CellNeighbor, Coord, TerrainMode, TerrainPattern, TileShape};

use crate::types::{Color, MaterialId, SceneId, TextureId, TileRef, TileTransform};

/// A closed polygon in tile-local coordinates (origin at the tile center).
pub type Polygon = Vec<Point>;

fn transform_polygon(points: &[Point], transform: TileTransform) -> Polygon {
    points.iter().map(|p| transform.apply(*p)).collect()
}

/// One collision polygon of a tile, already decomposed into convex parts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollisionPolygon {
    /// Convex parts; each becomes one backend shape.
    pub shapes: Vec<Polygon>,
    /// Whether the shapes only collide from one side.
    pub one_way: bool,
    /// Margin of one-way collisions.
    pub one_way_margin: f64,
}

impl CollisionPolygon {
    /// A polygon that is convex already.
    pub fn convex(points: Polygon) -> Self {
        Self {
            shapes: alloc::vec![points],
            one_way: false,
            one_way_margin: 1.0,
        }
    }

    /// Builder form setting the one-way flag and margin.
    #[must_use]
    pub fn with_one_way(mut self, margin: f64) -> Self {
        self.one_way = true;
        self.one_way_margin = margin;
        self
    }
}

/// Collision data of a tile on one physics layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TilePhysics {
    /// Constant linear velocity given to bodies.
    pub linear_velocity: Vec2,
    /// Constant angular velocity given to bodies.
    pub angular_velocity: f64,
    /// Collision polygons.
    pub polygons: Vec<CollisionPolygon>,
}

/// Navigation mesh of a tile on one navigation layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NavigationPolygon {
    /// Mesh vertices.
    pub vertices: Vec<Point>,
    /// Convex polygons as indices into `vertices`.
    pub polygons: Vec<Vec<usize>>,
    /// Source outlines.
    pub outlines: Vec<Polygon>,
}

impl NavigationPolygon {
    /// A mesh made of one convex outline.
    pub fn from_convex_outline(outline: Polygon) -> Self {
        Self {
            polygons: alloc::vec![(0..outline.len()).collect()],
            vertices: outline.clone(),
            outlines: alloc::vec![outline],
        }
    }

    /// True when there is neither a polygon nor an outline.
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty() && self.outlines.is_empty()
    }

    /// The mesh under `transform`.
    pub fn transformed(&self, transform: TileTransform) -> Self {
        if transform.is_empty() {
            return self.clone();
        }
        Self {
            vertices: transform_polygon(&self.vertices, transform),
            polygons: self.polygons.clone(),
            outlines: self
                .outlines
                .iter()
                .map(|o| transform_polygon(o, transform))
                .collect(),
        }
    }
}

/// Metadata of one tile alternative.
#[derive(Clone, Debug, PartialEq)]
pub struct TileData {
    /// Material of the draw item the tile lands in.
    pub material: Option<MaterialId>,
    /// Tile tint.
    pub modulate: Color,
    /// Z-index of the draw item the tile lands in.
    pub z_index: i32,
    /// Offset added to the tile's Y position when Y-sorting.
    pub y_sort_origin: i32,
    /// Offset of the texture relative to the cell center.
    pub texture_origin: Vec2,
    /// Relative weight when several tiles match a terrain pattern.
    pub probability: f32,
    /// Terrain set the tile belongs to, or `-1`.
    pub terrain_set: i32,
    /// Terrain of the center and of each peering bit.
    pub terrain: TerrainPattern,
    /// Occluder polygon per occlusion layer.
    pub occluders: Vec<Option<Polygon>>,
    /// Collision per physics layer.
    pub physics: Vec<TilePhysics>,
    /// Navigation mesh per navigation layer.
    pub navigation: Vec<Option<NavigationPolygon>>,
}

impl Default for TileData {
    fn default() -> Self {
        Self {
            material: None,
            modulate: Color::WHITE,
            z_index: 0,
            y_sort_origin: 0,
            texture_origin: Vec2::ZERO,
            probability: 1.0,
            terrain_set: -1,
            terrain: TerrainPattern::EMPTY,
            occluders: Vec::new(),
            physics: Vec::new(),
            navigation: Vec::new(),
        }
    }
}

impl TileData {
    /// Builder: z-index.
    #[must_use]
    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    /// Builder: material.
    #[must_use]
    pub fn with_material(mut self, material: MaterialId) -> Self {
        self.material = Some(material);
        self
    }

    /// Builder: Y-sort origin.
    #[must_use]
    pub fn with_y_sort_origin(mut self, y_sort_origin: i32) -> Self {
        self.y_sort_origin = y_sort_origin;
        self
    }

    /// Builder: terrain painting probability.
    #[must_use]
    pub fn with_probability(mut self, probability: f32) -> Self {
        self.probability = probability;
        self
    }

    /// Builder: terrain set and pattern.
    #[must_use]
    pub fn with_terrain(mut self, terrain_set: i32, pattern: TerrainPattern) -> Self {
        self.terrain_set = terrain_set;
        self.terrain = pattern;
        self
    }

    /// Builder: occluder polygon on `layer`.
    #[must_use]
    pub fn with_occluder(mut self, layer: usize, polygon: Polygon) -> Self {
        if self.occluders.len() <= layer {
            self.occluders.resize(layer + 1, None);
        }
        self.occluders[layer] = Some(polygon);
        self
    }

    /// Builder: add a collision polygon on `layer`.
    #[must_use]
    pub fn with_collision(mut self, layer: usize, polygon: CollisionPolygon) -> Self {
        self.physics_mut(layer).polygons.push(polygon);
        self
    }

    /// Builder: constant velocities of the bodies on `layer`.
    #[must_use]
    pub fn with_constant_velocity(mut self, layer: usize, linear: Vec2, angular: f64) -> Self {
        let physics = self.physics_mut(layer);
        physics.linear_velocity = linear;
        physics.angular_velocity = angular;
        self
    }

    /// Builder: navigation mesh on `layer`.
    #[must_use]
    pub fn with_navigation(mut self, layer: usize, polygon: NavigationPolygon) -> Self {
        if self.navigation.len() <= layer {
            self.navigation.resize(layer + 1, None);
        }
        self.navigation[layer] = Some(polygon);
        self
    }

    fn physics_mut(&mut self, layer: usize) -> &mut TilePhysics {
        if self.physics.len() <= layer {
            self.physics.resize_with(layer + 1, TilePhysics::default);
        }
        &mut self.physics[layer]
    }

    /// Occluder on `layer` under `transform`.
    pub fn occluder(&self, layer: usize, transform: TileTransform) -> Option<Polygon> {
        self.occluders
            .get(layer)?
            .as_deref()
            .map(|p| transform_polygon(p, transform))
    }

    /// Collision data on `layer`.
    pub fn physics(&self, layer: usize) -> Option<&TilePhysics> {
        self.physics.get(layer)
    }

    /// Number of collision polygons on `layer`.
    pub fn collision_polygon_count(&self, layer: usize) -> usize {
        self.physics(layer).map_or(0, |p| p.polygons.len())
    }

    /// Convex shapes of collision polygon `polygon` on `layer` under `transform`.
    pub fn collision_shapes(
        &self,
        layer: usize,
        polygon: usize,
        transform: TileTransform,
    ) -> Vec<Polygon> {
        self.physics(layer)
            .and_then(|p| p.polygons.get(polygon))
            .map(|p| {
                p.shapes
                    .iter()
                    .map(|s| transform_polygon(s, transform))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Navigation mesh on `layer` under `transform`.
    pub fn navigation_polygon(
        &self,
        layer: usize,
        transform: TileTransform,
    ) -> Option<NavigationPolygon> {
        self.navigation
            .get(layer)?
            .as_ref()
            .map(|n| n.transformed(transform))
    }
}

/// How an animated tile chooses its first frame.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum AnimationMode {
    /// Every instance starts in phase.
    #[default]
    Default,
    /// Each cell gets its own stable phase offset.
    RandomStartTimes,
}

/// Frame animation of an atlas tile.
#[derive(Clone, Debug, PartialEq)]
pub struct TileAnimation {
    /// Frames per atlas row; 0 lays them out on one row.
    pub columns: i32,
    /// Playback speed multiplier.
    pub speed: f64,
    /// Duration of each frame in seconds.
    pub frame_durations: Vec<f64>,
    /// Start phase policy.
    pub mode: AnimationMode,
}

/// One tile of an atlas with its alternatives (alternative `0` is the base tile).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AtlasTile {
    alternatives: BTreeMap<i32, TileData>,
    animation: Option<TileAnimation>,
}

impl AtlasTile {
    /// A tile whose base alternative has `data`.
    pub fn new(data: TileData) -> Self {
        let mut alternatives = BTreeMap::new();
        alternatives.insert(0, data);
        Self {
            alternatives,
            animation: None,
        }
    }

    /// Builder: add alternative `id`.
    #[must_use]
    pub fn with_alternative(mut self, id: i32, data: TileData) -> Self {
        self.alternatives.insert(id, data);
        self
    }

    /// Builder: animate the tile.
    #[must_use]
    pub fn with_animation(mut self, animation: TileAnimation) -> Self {
        self.animation = Some(animation);
        self
    }

    /// Metadata of alternative `id`, ignoring transform bits.
    pub fn alternative(&self, id: i32) -> Option<&TileData> {
        self.alternatives.get(&TileTransform::strip(id))
    }

    /// Every alternative in id order.
    pub fn alternatives(&self) -> impl Iterator<Item = (i32, &TileData)> + '_ {
        self.alternatives.iter().map(|(id, d)| (*id, d))
    }

    /// Animation, if any.
    pub fn animation(&self) -> Option<&TileAnimation> {
        self.animation.as_ref()
    }
}

/// Tiles cut from one texture.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AtlasSource {
    /// Texture the tiles are cut from.
    pub texture: Option<TextureId>,
    /// Size of one tile in the texture.
    pub texture_region_size: Size,
    tiles: BTreeMap<Coord, AtlasTile>,
}

impl AtlasSource {
    /// An empty atlas over `texture`.
    pub fn new(texture: Option<TextureId>, texture_region_size: Size) -> Self {
        Self {
            texture,
            texture_region_size,
            tiles: BTreeMap::new(),
        }
    }

    /// Builder: add a tile at `coords`.
    #[must_use]
    pub fn with_tile(mut self, coords: Coord, tile: AtlasTile) -> Self {
        self.tiles.insert(coords, tile);
        self
    }

    /// Tile at `coords`.
    pub fn tile(&self, coords: Coord) -> Option<&AtlasTile> {
        self.tiles.get(&coords)
    }

    /// Every tile in coordinate order.
    pub fn tiles(&self) -> impl Iterator<Item = (Coord, &AtlasTile)> + '_ {
        self.tiles.iter().map(|(c, t)| (*c, t))
    }

    /// Whether a tile exists at `coords`.
    pub fn has_tile(&self, coords: Coord) -> bool {
        self.tiles.contains_key(&coords)
    }

    /// Whether the tile at `coords` has `alternative` (transform bits ignored).
    pub fn has_alternative(&self, coords: Coord, alternative: i32) -> bool {
        self.tile_data(coords, alternative).is_some()
    }

    /// Metadata of `(coords, alternative)`.
    pub fn tile_data(&self, coords: Coord, alternative: i32) -> Option<&TileData> {
        self.tiles.get(&coords)?.alternative(alternative)
    }

    /// Animation start policy of the tile at `coords`.
    pub fn animation_mode(&self, coords: Coord) -> AnimationMode {
        self.tile(coords)
            .and_then(AtlasTile::animation)
            .map_or(AnimationMode::Default, |a| a.mode)
    }
}

/// A scene a scene tile instantiates.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SceneTile {
    /// The scene, if one is assigned.
    pub scene: Option<SceneId>,
    /// Whether debug drawing shows a placeholder for it.
    pub display_placeholder: bool,
}

/// Tiles that spawn scenes. Every tile lives at `(0, 0)`; the alternative picks the scene.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneCollectionSource {
    scenes: BTreeMap<i32, SceneTile>,
}

impl SceneCollectionSource {
    /// An empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add scene tile `id`.
    #[must_use]
    pub fn with_scene(mut self, id: i32, tile: SceneTile) -> Self {
        self.scenes.insert(id, tile);
        self
    }

    /// Scene tile `id`.
    pub fn scene_tile(&self, id: i32) -> Option<&SceneTile> {
        self.scenes.get(&id)
    }
}

/// A tile-set source.
#[derive(Clone, Debug, PartialEq)]
pub enum TileSource {
    /// Texture atlas.
    Atlas(AtlasSource),
    /// Scene collection.
    Scenes(SceneCollectionSource),
}

impl TileSource {
    /// Whether a tile exists at `coords`.
    pub fn has_tile(&self, coords: Coord) -> bool {
        match self {
            Self::Atlas(a) => a.has_tile(coords),
            Self::Scenes(_) => coords == Coord::ZERO,
        }
    }

    /// Whether the tile at `coords` has `alternative`.
    pub fn has_alternative(&self, coords: Coord, alternative: i32) -> bool {
        match self {
            Self::Atlas(a) => a.has_alternative(coords, alternative),
            Self::Scenes(s) => coords == Coord::ZERO && s.scene_tile(alternative).is_some(),
        }
    }

    /// Metadata of an atlas tile. Scene tiles have none.
    pub fn tile_data(&self, coords: Coord, alternative: i32) -> Option<&TileData> {
        match self {
            Self::Atlas(a) => a.tile_data(coords, alternative),
            Self::Scenes(_) => None,
        }
    }

    /// Scene of a scene tile. Atlas tiles have none.
    pub fn scene_tile(&self, coords: Coord, alternative: i32) -> Option<&SceneTile> {
        match self {
            Self::Atlas(_) => None,
            Self::Scenes(s) if coords == Coord::ZERO => s.scene_tile(alternative),
            Self::Scenes(_) => None,
        }
    }

    /// The atlas, if this is one.
    pub fn as_atlas(&self) -> Option<&AtlasSource> {
        match self {
            Self::Atlas(a) => Some(a),
            Self::Scenes(_) => None,
        }
    }
}

/// Bounce and friction of bodies on a physics layer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PhysicsMaterial {
    /// Restitution.
    pub bounce: f64,
    /// Friction.
    pub friction: f64,
    /// Rough materials win the friction combine; the backend sees a negated friction.
    pub rough: bool,
    /// Absorbent materials win the bounce combine; the backend sees a negated bounce.
    pub absorbent: bool,
}

impl Default for PhysicsMaterial {
    fn default() -> Self {
        Self {
            bounce: 0.0,
            friction: 1.0,
            rough: false,
            absorbent: false,
        }
    }
}

impl PhysicsMaterial {
    /// Bounce as handed to the backend.
    pub fn computed_bounce(&self) -> f64 {
        if self.absorbent { -self.bounce } else { self.bounce }
    }

    /// Friction as handed to the backend.
    pub fn computed_friction(&self) -> f64 {
        if self.rough { -self.friction } else { self.friction }
    }
}

/// Settings of a physics layer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PhysicsLayer {
    /// Collision layer bits.
    pub collision_layer: u32,
    /// Collision mask bits.
    pub collision_mask: u32,
    /// Material; `None` means bounce 0 and friction 1.
    pub material: Option<PhysicsMaterial>,
}

impl Default for PhysicsLayer {
    fn default() -> Self {
        Self {
            collision_layer: 1,
            collision_mask: 1,
            material: None,
        }
    }
}

/// Settings of a navigation layer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NavigationLayer {
    /// Navigation layer bits given to regions.
    pub layers: u32,
}

impl Default for NavigationLayer {
    fn default() -> Self {
        Self { layers: 1 }
    }
}

/// Settings of an occlusion layer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OcclusionLayer {
    /// Light mask of the occluders.
    pub light_mask: i32,
    /// Whether occluders contribute to the signed distance field.
    pub sdf_collision: bool,
}

impl Default for OcclusionLayer {
    fn default() -> Self {
        Self {
            light_mask: 1,
            sdf_collision: false,
        }
    }
}

/// A terrain inside a terrain set.
#[derive(Clone, Debug, PartialEq)]
pub struct Terrain {
    /// Display name.
    pub name: String,
    /// Display color.
    pub color: Color,
}

/// A group of terrains that connect with each other.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TerrainSet {
    /// Which peering bits take part in matching.
    pub mode: TerrainMode,
    /// Terrains of the set.
    pub terrains: Vec<Terrain>,
}

#[derive(Clone, Debug, Default)]
struct TerrainCache {
    patterns: Vec<TerrainPattern>,
    tiles: BTreeMap<TerrainPattern, Vec<(TileRef, f32)>>,
}

/// The tile set a layer draws from.
#[derive(Clone, Debug, Default)]
pub struct TileSet {
    shape: TileShape,
    tile_size: Size,
    sources: BTreeMap<i32, TileSource>,
    physics_layers: Vec<PhysicsLayer>,
    navigation_layers: Vec<NavigationLayer>,
    occlusion_layers: Vec<OcclusionLayer>,
    terrain_sets: Vec<TerrainSet>,
    terrain_cache: Vec<TerrainCache>,
    source_proxies: BTreeMap<i32, i32>,
    coords_proxies: BTreeMap<(i32, Coord), (i32, Coord)>,
    alternative_proxies: BTreeMap<TileRef, TileRef>,
    compatibility: BTreeMap<(i32, Coord, TileTransform), TileRef>,
}

impl TileSet {
    /// Start building a tile set.
    pub fn builder() -> TileSetBuilder {
        TileSetBuilder::default()
    }

    /// Tile geometry.
    pub fn shape(&self) -> TileShape {
        self.shape
    }

    /// Size of one cell in local units.
    pub fn tile_size(&self) -> Size {
        self.tile_size
    }

    /// Source `id`.
    pub fn source(&self, id: i32) -> Option<&TileSource> {
        self.sources.get(&id)
    }

    /// Whether source `id` exists.
    pub fn has_source(&self, id: i32) -> bool {
        self.sources.contains_key(&id)
    }

    /// Every source in id order.
    pub fn sources(&self) -> impl Iterator<Item = (i32, &TileSource)> + '_ {
        self.sources.iter().map(|(id, s)| (*id, s))
    }

    /// Whether `tile` names an existing source, tile and alternative.
    pub fn has_tile(&self, tile: TileRef) -> bool {
        self.source(tile.source_id)
            .is_some_and(|s| s.has_tile(tile.atlas_coords) && s.has_alternative(tile.atlas_coords, tile.alternative))
    }

    /// The atlas and metadata of `tile`, when it is an existing atlas tile.
    pub fn atlas_tile(&self, tile: TileRef) -> Option<(&AtlasSource, &TileData)> {
        let atlas = self.source(tile.source_id)?.as_atlas()?;
        let data = atlas.tile_data(tile.atlas_coords, tile.alternative)?;
        Some((atlas, data))
    }

    /// Metadata of `tile`, when it is an existing atlas tile.
    pub fn tile_data(&self, tile: TileRef) -> Option<&TileData> {
        self.atlas_tile(tile).map(|(_, d)| d)
    }

    /// Scene of `tile`, when it is an existing scene tile.
    pub fn scene_tile(&self, tile: TileRef) -> Option<&SceneTile> {
        self.source(tile.source_id)?
            .scene_tile(tile.atlas_coords, tile.alternative)
    }

    /// Physics layers.
    pub fn physics_layers(&self) -> &[PhysicsLayer] {
        &self.physics_layers
    }

    /// Navigation layers.
    pub fn navigation_layers(&self) -> &[NavigationLayer] {
        &self.navigation_layers
    }

    /// Occlusion layers.
    pub fn occlusion_layers(&self) -> &[OcclusionLayer] {
        &self.occlusion_layers
    }

    /// Terrain sets.
    pub fn terrain_sets(&self) -> &[TerrainSet] {
        &self.terrain_sets
    }

    /// Local position of the center of cell `coords`.
    ///
    /// Offset shapes shift odd rows (or columns) by half a tile and pack lines by
    /// the shape's overlap ratio.
    pub fn map_to_local(&self, coords: Coord) -> Point {
        let (x, y) = (f64::from(coords.x), f64::from(coords.y));
        let ratio = self.shape.overlapping_ratio();
        let (x, y) = match self.shape.offset_axis() {
            None => (x, y),
            Some(tileweave_terrain::OffsetAxis::Horizontal) => {
                let shift = if coords.y.rem_euclid(2) == 0 { 0.0 } else { 0.5 };
                (x + shift, y * ratio)
            }
            Some(tileweave_terrain::OffsetAxis::Vertical) => {
                let shift = if coords.x.rem_euclid(2) == 0 { 0.0 } else { 0.5 };
                (x * ratio, y + shift)
            }
        };
        Point::new(
            (x + 0.5) * self.tile_size.width,
            (y + 0.5) * self.tile_size.height,
        )
    }

    /// Where cell `coords_in_pattern` of a pattern placed at `position` lands.
    pub fn map_pattern(&self, position: Coord, coords_in_pattern: Coord) -> Coord {
        self.shape.map_pattern(position, coords_in_pattern)
    }

    /// Resolve `tile` through the proxies.
    ///
    /// Existing tiles are returned unchanged. Otherwise the most specific proxy
    /// wins: alternative level, then coordinate level, then source level.
    pub fn map_tile_proxy(&self, tile: TileRef) -> TileRef {
        if self.has_tile(tile) {
            return tile;
        }
        if let Some(to) = self.alternative_proxies.get(&tile) {
            return *to;
        }
        if let Some((source_id, atlas_coords)) =
            self.coords_proxies.get(&(tile.source_id, tile.atlas_coords))
        {
            return TileRef::new(*source_id, *atlas_coords, tile.alternative);
        }
        if let Some(source_id) = self.source_proxies.get(&tile.source_id) {
            return TileRef::new(*source_id, tile.atlas_coords, tile.alternative);
        }
        tile
    }

    /// Tile that replaces a legacy `(tile id, autotile coords, transform)` cell.
    pub fn compatibility_tile(
        &self,
        tile_id: i32,
        coords: Coord,
        transform: TileTransform,
    ) -> Option<TileRef> {
        self.compatibility.get(&(tile_id, coords, transform)).copied()
    }

    /// `pattern` with every bit the terrain set does not match on cleared.
    pub fn masked_pattern(&self, terrain_set: i32, pattern: TerrainPattern) -> TerrainPattern {
        let mode = self.terrain_mode(terrain_set);
        let mut out = pattern;
        for bit in CellNeighbor::ALL {
            if !self.shape.is_valid_peering_bit(mode, bit) {
                out.set_peering_bit(bit, -1);
            }
        }
        out
    }

    /// Matching mode of `terrain_set`.
    pub fn terrain_mode(&self, terrain_set: i32) -> TerrainMode {
        usize::try_from(terrain_set)
            .ok()
            .and_then(|i| self.terrain_sets.get(i))
            .map_or(TerrainMode::default(), |s| s.mode)
    }

    /// Terrain pattern of `tile`, if it belongs to `terrain_set`.
    pub fn pattern_of(&self, tile: TileRef, terrain_set: i32) -> Option<TerrainPattern> {
        let data = self.tile_data(tile)?;
        (data.terrain_set == terrain_set).then(|| self.masked_pattern(terrain_set, data.terrain))
    }

    /// Every pattern of `terrain_set`, the empty one included, in sorted order.
    pub fn terrain_patterns(&self, terrain_set: i32) -> &[TerrainPattern] {
        self.cache(terrain_set)
            .map(|c| c.patterns.as_slice())
            .unwrap_or_default()
    }

    /// Tiles providing `pattern` in `terrain_set`, with their probability.
    ///
    /// The empty pattern is provided by [`TileRef::EMPTY`].
    pub fn tiles_for_pattern(&self, terrain_set: i32, pattern: &TerrainPattern) -> &[(TileRef, f32)] {
        self.cache(terrain_set)
            .and_then(|c| c.tiles.get(pattern))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn cache(&self, terrain_set: i32) -> Option<&TerrainCache> {
        usize::try_from(terrain_set)
            .ok()
            .and_then(|i| self.terrain_cache.get(i))
    }

    fn rebuild_terrain_cache(&mut self) {
        let mut caches = Vec::with_capacity(self.terrain_sets.len());
        for set in 0..self.terrain_sets.len() {
            let Ok(set_id) = i32::try_from(set) else {
                break;
            };
            let mut tiles: BTreeMap<TerrainPattern, Vec<(TileRef, f32)>> = BTreeMap::new();
            tiles.insert(TerrainPattern::EMPTY, alloc::vec![(TileRef::EMPTY, 1.0)]);
            for (source_id, source) in &self.sources {
                let Some(atlas) = source.as_atlas() else {
                    continue;
                };
                for (coords, tile) in atlas.tiles() {
                    for (alternative, data) in tile.alternatives() {
                        if data.terrain_set != set_id {
                            continue;
                        }
                        let pattern = self.masked_pattern(set_id, data.terrain);
                        tiles.entry(pattern).or_default().push((
                            TileRef::new(*source_id, coords, alternative),
                            data.probability,
                        ));
                    }
                }
            }
            caches.push(TerrainCache {
                patterns: tiles.keys().copied().collect(),
                tiles,
            });
        }
        self.terrain_cache = caches;
    }
}

/// Builder for [`TileSet`].
#[derive(Debug, Default)]
pub struct TileSetBuilder {
    set: TileSet,
}

impl TileSetBuilder {
    /// Tile geometry.
    #[must_use]
    pub fn shape(mut self, shape: TileShape) -> Self {
        self.set.shape = shape;
        self
    }

    /// Size of one cell in local units.
    #[must_use]
    pub fn tile_size(mut self, size: Size) -> Self {
        self.set.tile_size = size;
        self
    }

    /// Add source `id`, replacing any previous one.
    #[must_use]
    pub fn source(mut self, id: i32, source: TileSource) -> Self {
        self.set.sources.insert(id, source);
        self
    }

    /// Add a physics layer.
    #[must_use]
    pub fn physics_layer(mut self, layer: PhysicsLayer) -> Self {
        self.set.physics_layers.push(layer);
        self
    }

    /// Add a navigation layer.
    #[must_use]
    pub fn navigation_layer(mut self, layer: NavigationLayer) -> Self {
        self.set.navigation_layers.push(layer);
        self
    }

    /// Add an occlusion layer.
    #[must_use]
    pub fn occlusion_layer(mut self, layer: OcclusionLayer) -> Self {
        self.set.occlusion_layers.push(layer);
        self
    }

    /// Add a terrain set.
    #[must_use]
    pub fn terrain_set(mut self, set: TerrainSet) -> Self {
        self.set.terrain_sets.push(set);
        self
    }

    /// Map every tile of source `from` to source `to`.
    #[must_use]
    pub fn source_proxy(mut self, from: i32, to: i32) -> Self {
        self.set.source_proxies.insert(from, to);
        self
    }

    /// Map tile `from` of a source to tile `to`, keeping the alternative.
    #[must_use]
    pub fn coords_proxy(mut self, from: (i32, Coord), to: (i32, Coord)) -> Self {
        self.set.coords_proxies.insert(from, to);
        self
    }

    /// Map one alternative to another.
    #[must_use]
    pub fn alternative_proxy(mut self, from: TileRef, to: TileRef) -> Self {
        self.set.alternative_proxies.insert(from, to);
        self
    }

    /// Register the replacement of a legacy cell.
    #[must_use]
    pub fn compatibility(
        mut self,
        tile_id: i32,
        coords: Coord,
        transform: TileTransform,
        to: TileRef,
    ) -> Self {
        self.set.compatibility.insert((tile_id, coords, transform), to);
        self
    }

    /// Finish, computing the terrain cache.
    pub fn build(mut self) -> TileSet {
        self.set.rebuild_terrain_cache();
        self.set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atlas() -> AtlasSource {
        AtlasSource::new(Some(TextureId::from_raw(7)), Size::new(16.0, 16.0))
            .with_tile(Coord::new(0, 0), AtlasTile::new(TileData::default()))
            .with_tile(
                Coord::new(1, 0),
                AtlasTile::new(TileData::default()).with_alternative(1, TileData::default()),
            )
    }

    #[test]
    fn map_to_local_per_shape() {
        let square = TileSet::builder().tile_size(Size::new(16.0, 16.0)).build();
        assert_eq!(square.map_to_local(Coord::new(0, 0)), Point::new(8.0, 8.0));
        assert_eq!(square.map_to_local(Coord::new(-1, 2)), Point::new(-8.0, 40.0));

        let iso = TileSet::builder()
            .shape(TileShape::Isometric)
            .tile_size(Size::new(32.0, 16.0))
            .build();
        assert_eq!(iso.map_to_local(Coord::new(0, 1)), Point::new(32.0, 16.0));
        assert_eq!(iso.map_to_local(Coord::new(0, -1)), Point::new(32.0, 0.0));

        let hex_v = TileSet::builder()
            .shape(TileShape::HexVerticalOffset)
            .tile_size(Size::new(16.0, 16.0))
            .build();
        assert_eq!(hex_v.map_to_local(Coord::new(1, 0)), Point::new(20.0, 16.0));
    }

    #[test]
    fn alternatives_ignore_transform_bits() {
        let source = TileSource::Atlas(atlas());
        assert!(source.has_alternative(Coord::new(1, 0), 1 | (1 << 13)));
        assert!(!source.has_alternative(Coord::new(0, 0), 1));
        assert!(!source.has_tile(Coord::new(5, 5)));
    }

    #[test]
    fn scene_tiles_live_at_origin() {
        let scenes = TileSource::Scenes(SceneCollectionSource::new().with_scene(
            3,
            SceneTile {
                scene: Some(SceneId::from_raw(1)),
                display_placeholder: false,
            },
        ));
        assert!(scenes.has_alternative(Coord::ZERO, 3));
        assert!(!scenes.has_alternative(Coord::new(1, 0), 3));
        assert!(scenes.tile_data(Coord::ZERO, 3).is_none());
        assert!(scenes.scene_tile(Coord::ZERO, 3).is_some());
    }

    #[test]
    fn proxies_prefer_the_most_specific_mapping() {
        let set = TileSet::builder()
            .source(0, TileSource::Atlas(atlas()))
            .source_proxy(5, 0)
            .coords_proxy((5, Coord::new(2, 2)), (0, Coord::new(1, 0)))
            .alternative_proxy(
                TileRef::new(5, Coord::new(2, 2), 4),
                TileRef::new(0, Coord::new(0, 0), 0),
            )
            .build();

        let existing = TileRef::new(0, Coord::new(1, 0), 1);
        assert_eq!(set.map_tile_proxy(existing), existing);
        assert_eq!(
            set.map_tile_proxy(TileRef::new(5, Coord::new(2, 2), 4)),
            TileRef::new(0, Coord::new(0, 0), 0)
        );
        assert_eq!(
            set.map_tile_proxy(TileRef::new(5, Coord::new(2, 2), 1)),
            TileRef::new(0, Coord::new(1, 0), 1)
        );
        assert_eq!(
            set.map_tile_proxy(TileRef::new(5, Coord::new(9, 9), 0)),
            TileRef::new(0, Coord::new(9, 9), 0)
        );
        let unknown = TileRef::new(8, Coord::ZERO, 0);
        assert_eq!(set.map_tile_proxy(unknown), unknown);
    }

    #[test]
    fn terrain_cache_masks_bits_and_lists_empty() {
        let pattern = TerrainPattern::with_center(0)
            .with_peering_bit(CellNeighbor::RightSide, 0)
            .with_peering_bit(CellNeighbor::BottomRightCorner, 0);
        let source = AtlasSource::new(None, Size::new(16.0, 16.0)).with_tile(
            Coord::ZERO,
            AtlasTile::new(TileData::default().with_terrain(0, pattern).with_probability(2.0)),
        );
        let set = TileSet::builder()
            .source(1, TileSource::Atlas(source))
            .terrain_set(TerrainSet {
                mode: TerrainMode::MatchSides,
                terrains: Vec::new(),
            })
            .build();

        let masked = TerrainPattern::with_center(0).with_peering_bit(CellNeighbor::RightSide, 0);
        assert_eq!(set.terrain_patterns(0), &[TerrainPattern::EMPTY, masked]);
        assert_eq!(
            set.tiles_for_pattern(0, &masked),
            &[(TileRef::new(1, Coord::ZERO, 0), 2.0)]
        );
        assert_eq!(
            set.tiles_for_pattern(0, &TerrainPattern::EMPTY),
            &[(TileRef::EMPTY, 1.0)]
        );
        assert_eq!(set.pattern_of(TileRef::new(1, Coord::ZERO, 0), 0), Some(masked));
        assert_eq!(set.pattern_of(TileRef::new(1, Coord::ZERO, 0), 1), None);
        assert!(set.terrain_patterns(3).is_empty());
    }

    #[test]
    fn transformed_occluder() {
        let data = TileData::default().with_occluder(1, alloc::vec![Point::new(1.0, 2.0)]);
        assert!(data.occluder(0, TileTransform::empty()).is_none());
        assert_eq!(
            data.occluder(1, TileTransform::FLIP_V),
            Some(alloc::vec![Point::new(1.0, -2.0)])
        );
    }
}
