// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory backend recording every object a layer creates.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use kurbo::{Affine, Point, Vec2};

use crate::config::{TextureFilter, TextureRepeat};
use crate::layer::World;
use crate::servers::{
    BodyMode, NavigationServer, PhysicsServer, RenderingServer, SceneHost, SceneRoot, TileDraw,
};
use crate::tile_set::NavigationPolygon;
use crate::types::{
    BodyId, CanvasId, CanvasItemId, Color, MaterialId, NavMapId, NodeId, OccluderId, RegionId,
    SceneId, SpaceId,
};

/// Recorded state of a draw item.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CanvasItemState {
    /// Parent item.
    pub parent: Option<CanvasItemId>,
    /// Transform relative to the parent.
    pub transform: Affine,
    /// Z-index.
    pub z_index: i32,
    /// Material.
    pub material: Option<MaterialId>,
    /// Sibling order.
    pub draw_index: i32,
    /// Light mask.
    pub light_mask: i32,
    /// Texture filter.
    pub texture_filter: TextureFilter,
    /// Texture repeat.
    pub texture_repeat: TextureRepeat,
    /// Self-modulate.
    pub self_modulate: Color,
    /// Tiles drawn, in order.
    pub tiles: Vec<TileDraw>,
    /// Polygons drawn, with their color.
    pub polygons: Vec<(Vec<Point>, Color)>,
    /// Circles drawn: center, radius and color.
    pub circles: Vec<(Point, f64, Color)>,
}

/// Recorded state of a light occluder.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OccluderState {
    /// Canvas it is attached to.
    pub canvas: Option<CanvasId>,
    /// World transform.
    pub transform: Affine,
    /// Outline.
    pub polygon: Vec<Point>,
    /// Light mask.
    pub light_mask: i32,
    /// Whether it feeds the signed distance field.
    pub sdf_collision: bool,
}

/// One collision shape of a body.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeState {
    /// Convex outline.
    pub points: Vec<Point>,
    /// One-way collision.
    pub one_way: bool,
    /// One-way margin.
    pub one_way_margin: f64,
}

/// Recorded state of a physics body.
#[derive(Clone, Debug, PartialEq)]
pub struct BodyState {
    /// Static or kinematic.
    pub mode: BodyMode,
    /// Space it lives in.
    pub space: Option<SpaceId>,
    /// World transform.
    pub transform: Affine,
    /// Owner instance id.
    pub owner: Option<u64>,
    /// Collision layer.
    pub collision_layer: u32,
    /// Collision mask.
    pub collision_mask: u32,
    /// Whether input picking sees it.
    pub pickable: bool,
    /// Constant linear velocity.
    pub linear_velocity: Vec2,
    /// Constant angular velocity.
    pub angular_velocity: f64,
    /// Bounce.
    pub bounce: f64,
    /// Friction.
    pub friction: f64,
    /// Shapes, in index order.
    pub shapes: Vec<ShapeState>,
}

impl Default for BodyState {
    fn default() -> Self {
        Self {
            mode: BodyMode::Static,
            space: None,
            transform: Affine::IDENTITY,
            owner: None,
            collision_layer: 1,
            collision_mask: 1,
            pickable: true,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            bounce: 0.0,
            friction: 1.0,
            shapes: Vec::new(),
        }
    }
}

/// Recorded state of a navigation map.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MapState {
    /// Cell size.
    pub cell_size: f64,
    /// Whether it is active.
    pub active: bool,
}

/// Recorded state of a navigation region.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegionState {
    /// Owner instance id.
    pub owner: Option<u64>,
    /// Map it belongs to.
    pub map: Option<NavMapId>,
    /// World transform.
    pub transform: Affine,
    /// Navigation layers bitmask.
    pub navigation_layers: u32,
    /// Mesh.
    pub polygon: Option<NavigationPolygon>,
}

/// Recorded state of an instantiated scene.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeState {
    /// Scene it was instantiated from.
    pub scene: SceneId,
    /// Root kind.
    pub root: SceneRoot,
    /// Parent node.
    pub parent: Option<NodeId>,
}

/// Backend that keeps every object in memory.
///
/// Handles are allocated from one counter shared by every object kind, so a
/// handle is never reused. Freeing an unknown handle logs a warning and is
/// otherwise ignored; tests use [`HeadlessServers::freed`] and
/// [`HeadlessServers::live_objects`] to check that nothing leaks.
#[derive(Clone, Debug, Default)]
pub struct HeadlessServers {
    next_id: u64,
    created: usize,
    freed: usize,
    canvas_items: BTreeMap<CanvasItemId, CanvasItemState>,
    occluders: BTreeMap<OccluderId, OccluderState>,
    bodies: BTreeMap<BodyId, BodyState>,
    maps: BTreeMap<NavMapId, MapState>,
    regions: BTreeMap<RegionId, RegionState>,
    nodes: BTreeMap<NodeId, NodeState>,
    scenes: BTreeMap<SceneId, SceneRoot>,
    external_maps: usize,
}

impl HeadlessServers {
    /// An empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `scene` instantiable, with a root of kind `root`.
    pub fn register_scene(&mut self, scene: SceneId, root: SceneRoot) {
        self.scenes.insert(scene, root);
    }

    /// Register a navigation map created outside the layer, such as the world map.
    ///
    /// Registered maps do not count as live objects.
    pub fn register_map(&mut self, map: NavMapId) {
        if self.maps.insert(map, MapState::default()).is_none() {
            self.external_maps += 1;
        }
    }

    /// Allocate the handles of a world for layers to attach to.
    ///
    /// None of them counts as created; the navigation map is registered.
    pub fn create_world(&mut self) -> World {
        let base = self.next_id;
        self.next_id += 5;
        let world = World {
            canvas: CanvasId::from_raw(base + 1),
            canvas_item: CanvasItemId::from_raw(base + 2),
            space: SpaceId::from_raw(base + 3),
            navigation_map: NavMapId::from_raw(base + 4),
            owner: NodeId::from_raw(base + 5),
            instance_id: base + 5,
        };
        self.register_map(world.navigation_map);
        world
    }

    /// Objects created so far.
    pub fn created(&self) -> usize {
        self.created
    }

    /// Objects freed so far.
    pub fn freed(&self) -> usize {
        self.freed
    }

    /// Objects alive right now.
    pub fn live_objects(&self) -> usize {
        self.canvas_items.len()
            + self.occluders.len()
            + self.bodies.len()
            + self.regions.len()
            + self.nodes.len()
            + self.maps.len().saturating_sub(self.external_maps)
    }

    /// Draw items.
    pub fn canvas_items(&self) -> &BTreeMap<CanvasItemId, CanvasItemState> {
        &self.canvas_items
    }

    /// Light occluders.
    pub fn occluders(&self) -> &BTreeMap<OccluderId, OccluderState> {
        &self.occluders
    }

    /// Physics bodies.
    pub fn bodies(&self) -> &BTreeMap<BodyId, BodyState> {
        &self.bodies
    }

    /// Navigation maps, created and registered.
    pub fn maps(&self) -> &BTreeMap<NavMapId, MapState> {
        &self.maps
    }

    /// Navigation regions.
    pub fn regions(&self) -> &BTreeMap<RegionId, RegionState> {
        &self.regions
    }

    /// Live scene instances.
    pub fn nodes(&self) -> &BTreeMap<NodeId, NodeState> {
        &self.nodes
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.created += 1;
        self.next_id
    }

    fn release<K: Ord + core::fmt::Debug, V>(map: &mut BTreeMap<K, V>, freed: &mut usize, key: K) {
        if map.remove(&key).is_some() {
            *freed += 1;
        } else {
            log::warn!("freeing unknown handle {key:?}");
        }
    }

    fn item(&mut self, item: CanvasItemId) -> Option<&mut CanvasItemState> {
        let state = self.canvas_items.get_mut(&item);
        if state.is_none() {
            log::warn!("unknown draw item {item:?}");
        }
        state
    }

    fn occluder(&mut self, occluder: OccluderId) -> Option<&mut OccluderState> {
        let state = self.occluders.get_mut(&occluder);
        if state.is_none() {
            log::warn!("unknown occluder {occluder:?}");
        }
        state
    }

    fn body(&mut self, body: BodyId) -> Option<&mut BodyState> {
        let state = self.bodies.get_mut(&body);
        if state.is_none() {
            log::warn!("unknown body {body:?}");
        }
        state
    }

    fn map(&mut self, map: NavMapId) -> Option<&mut MapState> {
        let state = self.maps.get_mut(&map);
        if state.is_none() {
            log::warn!("unknown navigation map {map:?}");
        }
        state
    }

    fn region(&mut self, region: RegionId) -> Option<&mut RegionState> {
        let state = self.regions.get_mut(&region);
        if state.is_none() {
            log::warn!("unknown region {region:?}");
        }
        state
    }
}

impl RenderingServer for HeadlessServers {
    fn canvas_item_create(&mut self) -> CanvasItemId {
        let id = CanvasItemId::from_raw(self.next());
        self.canvas_items.insert(id, CanvasItemState::default());
        id
    }

    fn canvas_item_free(&mut self, item: CanvasItemId) {
        Self::release(&mut self.canvas_items, &mut self.freed, item);
    }

    fn canvas_item_clear(&mut self, item: CanvasItemId) {
        if let Some(s) = self.item(item) {
            s.tiles.clear();
            s.polygons.clear();
            s.circles.clear();
        }
    }

    fn canvas_item_set_parent(&mut self, item: CanvasItemId, parent: Option<CanvasItemId>) {
        if let Some(s) = self.item(item) {
            s.parent = parent;
        }
    }

    fn canvas_item_set_transform(&mut self, item: CanvasItemId, transform: Affine) {
        if let Some(s) = self.item(item) {
            s.transform = transform;
        }
    }

    fn canvas_item_set_z_index(&mut self, item: CanvasItemId, z_index: i32) {
        // The layer's own item belongs to the host and is not tracked here.
        if let Some(s) = self.canvas_items.get_mut(&item) {
            s.z_index = z_index;
        }
    }

    fn canvas_item_set_material(&mut self, item: CanvasItemId, material: Option<MaterialId>) {
        if let Some(s) = self.item(item) {
            s.material = material;
        }
    }

    fn canvas_item_set_draw_index(&mut self, item: CanvasItemId, index: i32) {
        if let Some(s) = self.item(item) {
            s.draw_index = index;
        }
    }

    fn canvas_item_set_light_mask(&mut self, item: CanvasItemId, mask: i32) {
        if let Some(s) = self.item(item) {
            s.light_mask = mask;
        }
    }

    fn canvas_item_set_texture_filter(&mut self, item: CanvasItemId, filter: TextureFilter) {
        if let Some(s) = self.item(item) {
            s.texture_filter = filter;
        }
    }

    fn canvas_item_set_texture_repeat(&mut self, item: CanvasItemId, repeat: TextureRepeat) {
        if let Some(s) = self.item(item) {
            s.texture_repeat = repeat;
        }
    }

    fn canvas_item_set_self_modulate(&mut self, item: CanvasItemId, color: Color) {
        if let Some(s) = self.item(item) {
            s.self_modulate = color;
        }
    }

    fn canvas_item_add_tile(&mut self, item: CanvasItemId, tile: &TileDraw) {
        if let Some(s) = self.item(item) {
            s.tiles.push(tile.clone());
        }
    }

    fn canvas_item_add_polygon(&mut self, item: CanvasItemId, points: &[Point], color: Color) {
        if let Some(s) = self.item(item) {
            s.polygons.push((points.to_vec(), color));
        }
    }

    fn canvas_item_add_circle(&mut self, item: CanvasItemId, center: Point, radius: f64, color: Color) {
        if let Some(s) = self.item(item) {
            s.circles.push((center, radius, color));
        }
    }

    fn occluder_create(&mut self) -> OccluderId {
        let id = OccluderId::from_raw(self.next());
        self.occluders.insert(id, OccluderState::default());
        id
    }

    fn occluder_free(&mut self, occluder: OccluderId) {
        Self::release(&mut self.occluders, &mut self.freed, occluder);
    }

    fn occluder_attach_to_canvas(&mut self, occluder: OccluderId, canvas: Option<CanvasId>) {
        if let Some(s) = self.occluder(occluder) {
            s.canvas = canvas;
        }
    }

    fn occluder_set_transform(&mut self, occluder: OccluderId, transform: Affine) {
        if let Some(s) = self.occluder(occluder) {
            s.transform = transform;
        }
    }

    fn occluder_set_polygon(&mut self, occluder: OccluderId, polygon: &[Point]) {
        if let Some(s) = self.occluder(occluder) {
            s.polygon = polygon.to_vec();
        }
    }

    fn occluder_set_light_mask(&mut self, occluder: OccluderId, mask: i32) {
        if let Some(s) = self.occluder(occluder) {
            s.light_mask = mask;
        }
    }

    fn occluder_set_as_sdf_collision(&mut self, occluder: OccluderId, enabled: bool) {
        if let Some(s) = self.occluder(occluder) {
            s.sdf_collision = enabled;
        }
    }
}

impl PhysicsServer for HeadlessServers {
    fn body_create(&mut self) -> BodyId {
        let id = BodyId::from_raw(self.next());
        self.bodies.insert(id, BodyState::default());
        id
    }

    fn body_free(&mut self, body: BodyId) {
        Self::release(&mut self.bodies, &mut self.freed, body);
    }

    fn body_set_mode(&mut self, body: BodyId, mode: BodyMode) {
        if let Some(s) = self.body(body) {
            s.mode = mode;
        }
    }

    fn body_set_space(&mut self, body: BodyId, space: Option<SpaceId>) {
        if let Some(s) = self.body(body) {
            s.space = space;
        }
    }

    fn body_set_transform(&mut self, body: BodyId, transform: Affine) {
        if let Some(s) = self.body(body) {
            s.transform = transform;
        }
    }

    fn body_attach_owner(&mut self, body: BodyId, owner: u64) {
        if let Some(s) = self.body(body) {
            s.owner = Some(owner);
        }
    }

    fn body_set_collision_layer(&mut self, body: BodyId, layer: u32) {
        if let Some(s) = self.body(body) {
            s.collision_layer = layer;
        }
    }

    fn body_set_collision_mask(&mut self, body: BodyId, mask: u32) {
        if let Some(s) = self.body(body) {
            s.collision_mask = mask;
        }
    }

    fn body_set_pickable(&mut self, body: BodyId, pickable: bool) {
        if let Some(s) = self.body(body) {
            s.pickable = pickable;
        }
    }

    fn body_set_linear_velocity(&mut self, body: BodyId, velocity: Vec2) {
        if let Some(s) = self.body(body) {
            s.linear_velocity = velocity;
        }
    }

    fn body_set_angular_velocity(&mut self, body: BodyId, velocity: f64) {
        if let Some(s) = self.body(body) {
            s.angular_velocity = velocity;
        }
    }

    fn body_set_bounce(&mut self, body: BodyId, bounce: f64) {
        if let Some(s) = self.body(body) {
            s.bounce = bounce;
        }
    }

    fn body_set_friction(&mut self, body: BodyId, friction: f64) {
        if let Some(s) = self.body(body) {
            s.friction = friction;
        }
    }

    fn body_clear_shapes(&mut self, body: BodyId) {
        if let Some(s) = self.body(body) {
            s.shapes.clear();
        }
    }

    fn body_add_shape(&mut self, body: BodyId, points: &[Point]) {
        if let Some(s) = self.body(body) {
            s.shapes.push(ShapeState {
                points: points.to_vec(),
                one_way: false,
                one_way_margin: 0.0,
            });
        }
    }

    fn body_set_shape_one_way(&mut self, body: BodyId, index: usize, one_way: bool, margin: f64) {
        if let Some(shape) = self.body(body).and_then(|s| s.shapes.get_mut(index)) {
            shape.one_way = one_way;
            shape.one_way_margin = margin;
        }
    }
}

impl NavigationServer for HeadlessServers {
    fn map_create(&mut self) -> NavMapId {
        let id = NavMapId::from_raw(self.next());
        self.maps.insert(id, MapState::default());
        id
    }

    fn map_free(&mut self, map: NavMapId) {
        Self::release(&mut self.maps, &mut self.freed, map);
    }

    fn map_set_cell_size(&mut self, map: NavMapId, size: f64) {
        if let Some(s) = self.map(map) {
            s.cell_size = size;
        }
    }

    fn map_set_active(&mut self, map: NavMapId, active: bool) {
        if let Some(s) = self.map(map) {
            s.active = active;
        }
    }

    fn region_create(&mut self) -> RegionId {
        let id = RegionId::from_raw(self.next());
        self.regions.insert(id, RegionState::default());
        id
    }

    fn region_free(&mut self, region: RegionId) {
        Self::release(&mut self.regions, &mut self.freed, region);
    }

    fn region_set_owner(&mut self, region: RegionId, owner: u64) {
        if let Some(s) = self.region(region) {
            s.owner = Some(owner);
        }
    }

    fn region_set_map(&mut self, region: RegionId, map: Option<NavMapId>) {
        if let Some(s) = self.region(region) {
            s.map = map;
        }
    }

    fn region_set_transform(&mut self, region: RegionId, transform: Affine) {
        if let Some(s) = self.region(region) {
            s.transform = transform;
        }
    }

    fn region_set_navigation_layers(&mut self, region: RegionId, layers: u32) {
        if let Some(s) = self.region(region) {
            s.navigation_layers = layers;
        }
    }

    fn region_set_navigation_polygon(&mut self, region: RegionId, polygon: &NavigationPolygon) {
        if let Some(s) = self.region(region) {
            s.polygon = Some(polygon.clone());
        }
    }
}

impl SceneHost for HeadlessServers {
    fn instantiate(&mut self, scene: SceneId) -> Option<(NodeId, SceneRoot)> {
        let root = *self.scenes.get(&scene)?;
        let id = NodeId::from_raw(self.next());
        self.nodes.insert(
            id,
            NodeState {
                scene,
                root,
                parent: None,
            },
        );
        Some((id, root))
    }

    fn set_position(&mut self, node: NodeId, position: Point) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.root = SceneRoot::Control { position };
        }
    }

    fn set_transform(&mut self, node: NodeId, transform: Affine) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.root = SceneRoot::Node2D { transform };
        }
    }

    fn add_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(n) = self.nodes.get_mut(&child) {
            n.parent = Some(parent);
        }
    }

    fn queue_free(&mut self, node: NodeId) {
        Self::release(&mut self.nodes, &mut self.freed, node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_unique_and_frees_are_counted() {
        let mut s = HeadlessServers::new();
        let item = s.canvas_item_create();
        let body = s.body_create();
        assert_ne!(item.raw(), body.raw());
        assert_eq!(s.live_objects(), 2);

        s.canvas_item_free(item);
        s.canvas_item_free(item);
        assert_eq!(s.freed(), 1);
        assert_eq!(s.created(), 2);
        assert_eq!(s.live_objects(), 1);
    }

    #[test]
    fn unregistered_scenes_do_not_instantiate() {
        let mut s = HeadlessServers::new();
        assert!(s.instantiate(SceneId::from_raw(9)).is_none());
        s.register_scene(SceneId::from_raw(9), SceneRoot::Other);
        let (node, root) = s.instantiate(SceneId::from_raw(9)).unwrap();
        assert_eq!(root, SceneRoot::Other);
        assert_eq!(s.nodes()[&node].scene, SceneId::from_raw(9));
    }
}
