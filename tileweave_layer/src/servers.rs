// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend services a layer drives.
//!
//! A layer never owns backend objects directly. It asks these services to create
//! them, keeps the returned handles, and frees each handle exactly once. Every
//! call is synchronous and infallible from the layer's point of view.
//!
//! Hosts implement the four traits on whatever reaches their engine;
//! [`HeadlessServers`](crate::HeadlessServers) implements them in memory.

use kurbo::{Affine, Point, Vec2};

use crate::config::{TextureFilter, TextureRepeat};
use crate::tile_set::NavigationPolygon;
use crate::types::{
    BodyId, CanvasId, CanvasItemId, Color, MaterialId, NavMapId, NodeId, OccluderId, RegionId,
    SceneId, SpaceId, TextureId, TileRef, TileTransform,
};

/// One tile sprite drawn into a draw item.
#[derive(Clone, Debug, PartialEq)]
pub struct TileDraw {
    /// Atlas texture.
    pub texture: Option<TextureId>,
    /// The tile being drawn.
    pub tile: TileRef,
    /// Position of the tile center relative to the draw item.
    pub position: Point,
    /// Flip and transpose bits.
    pub transform: TileTransform,
    /// Tint: layer self-modulate times the tile's own modulate.
    pub modulate: Color,
    /// Animation phase offset in `[0, 1)`.
    pub animation_offset: f64,
}

/// Draw items and light occluders.
pub trait RenderingServer {
    /// Create an empty draw item.
    fn canvas_item_create(&mut self) -> CanvasItemId;
    /// Destroy a draw item.
    fn canvas_item_free(&mut self, item: CanvasItemId);
    /// Remove every command recorded in a draw item.
    fn canvas_item_clear(&mut self, item: CanvasItemId);
    /// Parent a draw item.
    fn canvas_item_set_parent(&mut self, item: CanvasItemId, parent: Option<CanvasItemId>);
    /// Transform relative to the parent.
    fn canvas_item_set_transform(&mut self, item: CanvasItemId, transform: Affine);
    /// Z-index relative to the parent.
    fn canvas_item_set_z_index(&mut self, item: CanvasItemId, z_index: i32);
    /// Material; `None` means "use the parent's".
    fn canvas_item_set_material(&mut self, item: CanvasItemId, material: Option<MaterialId>);
    /// Order among siblings.
    fn canvas_item_set_draw_index(&mut self, item: CanvasItemId, index: i32);
    /// Light mask.
    fn canvas_item_set_light_mask(&mut self, item: CanvasItemId, mask: i32);
    /// Default texture filter.
    fn canvas_item_set_texture_filter(&mut self, item: CanvasItemId, filter: TextureFilter);
    /// Default texture repeat.
    fn canvas_item_set_texture_repeat(&mut self, item: CanvasItemId, repeat: TextureRepeat);
    /// Tint applied to the item but not its children.
    fn canvas_item_set_self_modulate(&mut self, item: CanvasItemId, color: Color);
    /// Record a tile sprite.
    fn canvas_item_add_tile(&mut self, item: CanvasItemId, tile: &TileDraw);
    /// Record a filled polygon.
    fn canvas_item_add_polygon(&mut self, item: CanvasItemId, points: &[Point], color: Color);
    /// Record a filled circle.
    fn canvas_item_add_circle(&mut self, item: CanvasItemId, center: Point, radius: f64, color: Color);

    /// Create a light occluder.
    fn occluder_create(&mut self) -> OccluderId;
    /// Destroy a light occluder.
    fn occluder_free(&mut self, occluder: OccluderId);
    /// Attach to a canvas, or detach with `None`.
    fn occluder_attach_to_canvas(&mut self, occluder: OccluderId, canvas: Option<CanvasId>);
    /// World transform.
    fn occluder_set_transform(&mut self, occluder: OccluderId, transform: Affine);
    /// Occluder outline.
    fn occluder_set_polygon(&mut self, occluder: OccluderId, polygon: &[Point]);
    /// Light mask.
    fn occluder_set_light_mask(&mut self, occluder: OccluderId, mask: i32);
    /// Whether the occluder also feeds the signed distance field.
    fn occluder_set_as_sdf_collision(&mut self, occluder: OccluderId, enabled: bool);
}

/// How a body reacts to the simulation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum BodyMode {
    /// Never moves.
    #[default]
    Static,
    /// Moved by the host; pushes other bodies.
    Kinematic,
}

/// Collision bodies.
pub trait PhysicsServer {
    /// Create a body.
    fn body_create(&mut self) -> BodyId;
    /// Destroy a body.
    fn body_free(&mut self, body: BodyId);
    /// Static or kinematic.
    fn body_set_mode(&mut self, body: BodyId, mode: BodyMode);
    /// Physics space.
    fn body_set_space(&mut self, body: BodyId, space: Option<SpaceId>);
    /// World transform.
    fn body_set_transform(&mut self, body: BodyId, transform: Affine);
    /// Host object that owns the body.
    fn body_attach_owner(&mut self, body: BodyId, owner: u64);
    /// Collision layer bits.
    fn body_set_collision_layer(&mut self, body: BodyId, layer: u32);
    /// Collision mask bits.
    fn body_set_collision_mask(&mut self, body: BodyId, mask: u32);
    /// Whether pointer picking sees the body.
    fn body_set_pickable(&mut self, body: BodyId, pickable: bool);
    /// Constant linear velocity.
    fn body_set_linear_velocity(&mut self, body: BodyId, velocity: Vec2);
    /// Constant angular velocity.
    fn body_set_angular_velocity(&mut self, body: BodyId, velocity: f64);
    /// Restitution.
    fn body_set_bounce(&mut self, body: BodyId, bounce: f64);
    /// Friction.
    fn body_set_friction(&mut self, body: BodyId, friction: f64);
    /// Remove every shape.
    fn body_clear_shapes(&mut self, body: BodyId);
    /// Append a convex shape.
    fn body_add_shape(&mut self, body: BodyId, points: &[Point]);
    /// One-way settings of shape `index`.
    fn body_set_shape_one_way(&mut self, body: BodyId, index: usize, one_way: bool, margin: f64);
}

/// Navigation maps and regions.
pub trait NavigationServer {
    /// Create a map.
    fn map_create(&mut self) -> NavMapId;
    /// Destroy a map.
    fn map_free(&mut self, map: NavMapId);
    /// Rasterization cell size.
    fn map_set_cell_size(&mut self, map: NavMapId, size: f64);
    /// Whether the map takes part in queries.
    fn map_set_active(&mut self, map: NavMapId, active: bool);
    /// Create a region.
    fn region_create(&mut self) -> RegionId;
    /// Destroy a region.
    fn region_free(&mut self, region: RegionId);
    /// Host object that owns the region.
    fn region_set_owner(&mut self, region: RegionId, owner: u64);
    /// Map the region belongs to.
    fn region_set_map(&mut self, region: RegionId, map: Option<NavMapId>);
    /// World transform.
    fn region_set_transform(&mut self, region: RegionId, transform: Affine);
    /// Navigation layer bits.
    fn region_set_navigation_layers(&mut self, region: RegionId, layers: u32);
    /// Mesh.
    fn region_set_navigation_polygon(&mut self, region: RegionId, polygon: &NavigationPolygon);
}

/// How an instantiated scene root is positioned.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SceneRoot {
    /// Positioned by a point; the cell position is added to it.
    Control {
        /// Position the scene was saved with.
        position: Point,
    },
    /// Positioned by a transform; the cell translation is applied on the left.
    Node2D {
        /// Transform the scene was saved with.
        transform: Affine,
    },
    /// Not positionable.
    Other,
}

/// Scene instantiation.
pub trait SceneHost {
    /// Instantiate `scene`; `None` when it cannot be.
    fn instantiate(&mut self, scene: SceneId) -> Option<(NodeId, SceneRoot)>;
    /// Move a control-like root.
    fn set_position(&mut self, node: NodeId, position: Point);
    /// Transform a 2D root.
    fn set_transform(&mut self, node: NodeId, transform: Affine);
    /// Parent `child` under the owner of the layer.
    fn add_child(&mut self, parent: NodeId, child: NodeId);
    /// Free a node at the host's next convenient point.
    fn queue_free(&mut self, node: NodeId);
}

/// Everything a layer needs.
pub trait Servers: RenderingServer + PhysicsServer + NavigationServer + SceneHost {}

impl<T: RenderingServer + PhysicsServer + NavigationServer + SceneHost> Servers for T {}
