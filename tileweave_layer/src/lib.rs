// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tileweave Layer: a sparse tile grid kept in sync with rendering, physics,
//! navigation and scene backends.
//!
//! A [`TileLayer`] stores cells by coordinate. Editing a cell only records that
//! it changed; the backend objects catch up in one batched update pass that the
//! host runs once per frame with [`TileLayer::process`].
//!
//! - Rendering batches cells into square quadrants (or one quadrant per Y-sort
//!   row) and emits one draw item per run of tiles sharing a material and
//!   z-index. Each cell also gets one light occluder per occlusion layer.
//! - Physics creates one body per cell and physics layer, with the tile's
//!   collision polygons as shapes.
//! - Navigation creates one region per cell and navigation layer. Layer 0 joins
//!   the world's map; other layers get a private one.
//! - Scene tiles are instantiated and parented under the layer's owner.
//! - A debug overlay draws what the other passes cannot show.
//!
//! Backends sit behind the [`RenderingServer`], [`PhysicsServer`],
//! [`NavigationServer`] and [`SceneHost`] traits. [`HeadlessServers`] implements
//! all four in memory.
//!
//! Terrain painting goes through [`tileweave_terrain`]'s solver, fed with the
//! layer's cells.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use kurbo::Size;
//! use tileweave_layer::{
//!     AtlasSource, AtlasTile, Coord, HeadlessServers, TileData, TileLayer, TileRef, TileSet,
//!     TileSource,
//! };
//!
//! let atlas = AtlasSource::new(None, Size::new(16.0, 16.0))
//!     .with_tile(Coord::new(0, 0), AtlasTile::new(TileData::default()));
//! let tile_set = TileSet::builder()
//!     .tile_size(Size::new(16.0, 16.0))
//!     .source(0, TileSource::Atlas(atlas))
//!     .build();
//!
//! let mut servers = HeadlessServers::new();
//! let world = servers.create_world();
//! let mut layer = TileLayer::new(servers);
//! layer.set_tile_set(Some(Arc::new(tile_set)));
//! layer.enter_tree(world);
//!
//! let grass = TileRef::new(0, Coord::new(0, 0), 0);
//! for x in 0..4 {
//!     layer.set_cell(Coord::new(x, 0), grass);
//! }
//!
//! // Four edits, one pass, one draw item.
//! let report = layer.process().unwrap();
//! assert_eq!(report.canvas_items.created, 1);
//! assert_eq!(layer.draw_items().len(), 1);
//!
//! // Nothing is owed until the next edit.
//! assert!(layer.process().is_none());
//! ```

#![no_std]

extern crate alloc;

pub mod codec;

mod config;
mod dirty;
mod error;
mod headless;
mod layer;
mod navigation;
mod overlay;
mod pass;
mod pattern;
mod physics;
mod quadrant;
mod render;
mod report;
mod runtime;
mod scenes;
mod scheduler;
mod servers;
mod store;
mod terrain;
mod tile_set;
mod types;

pub use codec::{DecodedCell, TileDataFormat};
pub use config::{DebugVisibility, LayerConfig, TextureFilter, TextureRepeat};
pub use dirty::{DirtyFlags, DirtyTracker};
pub use error::LayerError;
pub use headless::{
    BodyState, CanvasItemState, HeadlessServers, MapState, NodeState, OccluderState, RegionState,
    ShapeState,
};
pub use layer::{TileLayer, World};
pub use pattern::TileMapPattern;
pub use report::{Churn, PassReport};
pub use runtime::RuntimeTileDataHook;
pub use scheduler::UpdateScheduler;
pub use servers::{
    BodyMode, NavigationServer, PhysicsServer, RenderingServer, SceneHost, SceneRoot, Servers,
    TileDraw,
};
pub use store::{CellData, CellKey, GridStore};
pub use tile_set::{
    AnimationMode, AtlasSource, AtlasTile, CollisionPolygon, NavigationLayer, NavigationPolygon,
    OcclusionLayer, PhysicsLayer, PhysicsMaterial, Polygon, SceneCollectionSource, SceneTile,
    Terrain, TerrainSet, TileAnimation, TileData, TilePhysics, TileSet, TileSetBuilder, TileSource,
};
pub use types::{
    BodyId, CanvasId, CanvasItemId, CellRect, Color, INVALID_ALTERNATIVE, INVALID_ATLAS_COORDS,
    INVALID_SOURCE, MaterialId, NavMapId, NodeId, OccluderId, RegionId, SceneId, SpaceId,
    TextureId, TileRef, TileTransform,
};

pub use tileweave_terrain::{
    CellNeighbor, ConstraintSet, Coord, TerrainConstraint, TerrainFill, TerrainMode,
    TerrainPattern, TileShape,
};
