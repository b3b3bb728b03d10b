// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tileweave Terrain: tile geometry and an autotile constraint solver.
//!
//! - [`TileShape`] describes square, isometric and half-offset hexagonal grids:
//!   which neighbors exist, where they are, and which peering bits a terrain mode uses.
//! - [`TerrainConstraint`] pins a terrain to one canonical peering position. Aliased
//!   directions (the right side of one cell is the left side of the next) share a
//!   [`ConstraintKey`], so conflicts collapse into one [`ConstraintSet`] entry.
//! - [`TerrainSolver`] scores every candidate [`TerrainPattern`] by the summed
//!   priority of the constraints it violates and picks the cheapest, then uses that
//!   to implement connect, path and pattern painting.
//!
//! The solver reads the grid through the [`TerrainSource`] trait and never writes.
//!
//! # Example
//!
//! ```rust
//! use tileweave_terrain::{CellNeighbor, ConstraintSet, Coord, TerrainConstraint, TileShape};
//!
//! let shape = TileShape::Square;
//! // The right side of (0, 0) and the left side of (1, 0) are the same position.
//! let a = TerrainConstraint::peering(shape, Coord::new(0, 0), CellNeighbor::RightSide, 0)
//!     .unwrap()
//!     .with_priority(10);
//! let b = TerrainConstraint::peering(shape, Coord::new(1, 0), CellNeighbor::LeftSide, 1)
//!     .unwrap();
//! assert_eq!(a.key(), b.key());
//!
//! let mut set = ConstraintSet::new();
//! set.insert(a);
//! set.insert(b);
//! assert_eq!(set.len(), 1);
//! assert_eq!(set.get(a.key()).unwrap().terrain(), 0);
//! ```

#![no_std]

extern crate alloc;

pub mod constraint;
pub mod coord;
pub mod error;
pub mod geometry;
pub mod pattern;
pub mod solver;

pub use constraint::{ConstraintKey, ConstraintSet, TerrainConstraint};
pub use coord::Coord;
pub use error::TerrainError;
pub use geometry::{CellNeighbor, OffsetAxis, TileShape};
pub use pattern::{TerrainMode, TerrainPattern};
pub use solver::{
    INFERRED_PRIORITY, PAINTED_PRIORITY, TerrainFill, TerrainSolver, TerrainSource,
};
