// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Terrain constraints and the ordered set that holds them.
//!
//! A peering bit is shared by every cell touching the same edge or corner. To
//! detect conflicts, each (cell, direction) pair is rewritten to a canonical
//! `(base cell, bit index)` key, where the bit index runs from `1` to
//! [`TileShape::peering_bit_count`]. Index `0` is the center of `base`.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::coord::Coord;
use crate::error::TerrainError;
use crate::geometry::{CellNeighbor, TileShape};

/// Canonical identity of a constraint.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstraintKey {
    /// Cell owning the bit.
    pub base: Coord,
    /// `0` for the center, `1..=peering_bit_count` otherwise.
    pub bit: u8,
}

/// A required (or inferred) terrain at one canonical peering position.
///
/// Equality is by value of all fields; sets key constraints by [`ConstraintKey`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TerrainConstraint {
    key: ConstraintKey,
    terrain: i32,
    priority: i32,
}

impl TerrainConstraint {
    /// Priority used when no other is given.
    pub const DEFAULT_PRIORITY: i32 = 1;

    /// A constraint on the center of `coords`.
    pub const fn center(coords: Coord, terrain: i32) -> Self {
        Self {
            key: ConstraintKey {
                base: coords,
                bit: 0,
            },
            terrain,
            priority: Self::DEFAULT_PRIORITY,
        }
    }

    /// A constraint on the peering bit of `coords` facing `bit`, in canonical form.
    pub fn peering(
        shape: TileShape,
        coords: Coord,
        bit: CellNeighbor,
        terrain: i32,
    ) -> Result<Self, TerrainError> {
        let (base, index) =
            canonicalize(shape, coords, bit).ok_or(TerrainError::UnsupportedPeeringBit {
                shape,
                bit,
            })?;
        Ok(Self {
            key: ConstraintKey { base, bit: index },
            terrain,
            priority: Self::DEFAULT_PRIORITY,
        })
    }

    /// Builder form of [`TerrainConstraint::set_priority`].
    #[must_use]
    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Canonical key.
    pub const fn key(&self) -> ConstraintKey {
        self.key
    }

    /// Base cell of the canonical key.
    pub const fn base(&self) -> Coord {
        self.key.base
    }

    /// Canonical bit index (`0` is the center).
    pub const fn bit(&self) -> u8 {
        self.key.bit
    }

    /// True for center constraints.
    pub const fn is_center(&self) -> bool {
        self.key.bit == 0
    }

    /// Required terrain.
    pub const fn terrain(&self) -> i32 {
        self.terrain
    }

    /// Set the required terrain.
    pub fn set_terrain(&mut self, terrain: i32) {
        self.terrain = terrain;
    }

    /// Weight added to a candidate's score when it violates this constraint.
    pub const fn priority(&self) -> i32 {
        self.priority
    }

    /// Set the weight.
    pub fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    /// Every `(cell, direction)` pair that touches this constraint's position.
    ///
    /// Center constraints overlap nothing. The list follows the geometry table
    /// order, which decides tie-breaks when counting terrains.
    pub fn overlapping_coords_and_peering_bits(
        &self,
        shape: TileShape,
    ) -> Vec<(Coord, CellNeighbor)> {
        use CellNeighbor as N;
        let b = self.key.base;
        let n = |dir| shape.neighbor(b, dir);
        match (shape, self.key.bit) {
            (_, 0) => Vec::new(),
            (TileShape::Square, 1) => alloc::vec![(b, N::RightSide), (n(N::RightSide), N::LeftSide)],
            (TileShape::Square, 2) => alloc::vec![
                (b, N::BottomRightCorner),
                (n(N::RightSide), N::BottomLeftCorner),
                (n(N::BottomRightCorner), N::TopLeftCorner),
                (n(N::BottomSide), N::TopRightCorner),
            ],
            (TileShape::Square, 3) => {
                alloc::vec![(b, N::BottomSide), (n(N::BottomSide), N::TopSide)]
            }
            (TileShape::Isometric, 1) => alloc::vec![
                (b, N::BottomRightSide),
                (n(N::BottomRightSide), N::TopLeftSide),
            ],
            (TileShape::Isometric, 2) => alloc::vec![
                (b, N::BottomCorner),
                (n(N::BottomRightSide), N::LeftCorner),
                (n(N::BottomCorner), N::TopCorner),
                (n(N::BottomLeftSide), N::RightCorner),
            ],
            (TileShape::Isometric, 3) => alloc::vec![
                (b, N::BottomLeftSide),
                (n(N::BottomLeftSide), N::TopRightSide),
            ],
            (TileShape::HexHorizontalOffset, 1) => {
                alloc::vec![(b, N::RightSide), (n(N::RightSide), N::LeftSide)]
            }
            (TileShape::HexHorizontalOffset, 2) => alloc::vec![
                (b, N::BottomRightCorner),
                (n(N::RightSide), N::BottomLeftCorner),
                (n(N::BottomRightSide), N::TopCorner),
            ],
            (TileShape::HexHorizontalOffset, 3) => alloc::vec![
                (b, N::BottomRightSide),
                (n(N::BottomRightSide), N::TopLeftSide),
            ],
            (TileShape::HexHorizontalOffset, 4) => alloc::vec![
                (b, N::BottomCorner),
                (n(N::BottomRightSide), N::TopLeftCorner),
                (n(N::BottomLeftSide), N::TopRightCorner),
            ],
            (TileShape::HexHorizontalOffset, 5) => alloc::vec![
                (b, N::BottomLeftSide),
                (n(N::BottomLeftSide), N::TopRightSide),
            ],
            (TileShape::HexVerticalOffset, 1) => alloc::vec![
                (b, N::RightCorner),
                (n(N::TopRightSide), N::BottomLeftCorner),
                (n(N::BottomRightSide), N::TopLeftCorner),
            ],
            (TileShape::HexVerticalOffset, 2) => alloc::vec![
                (b, N::BottomRightSide),
                (n(N::BottomRightSide), N::TopLeftSide),
            ],
            (TileShape::HexVerticalOffset, 3) => alloc::vec![
                (b, N::BottomRightCorner),
                (n(N::BottomRightSide), N::LeftCorner),
                (n(N::BottomSide), N::TopLeftCorner),
            ],
            (TileShape::HexVerticalOffset, 4) => {
                alloc::vec![(b, N::BottomSide), (n(N::BottomSide), N::TopSide)]
            }
            (TileShape::HexVerticalOffset, 5) => alloc::vec![
                (b, N::BottomLeftSide),
                (n(N::BottomLeftSide), N::TopRightSide),
            ],
            _ => Vec::new(),
        }
    }
}

/// Map a `(cell, direction)` pair to its canonical `(base, bit index)`.
fn canonicalize(shape: TileShape, pos: Coord, bit: CellNeighbor) -> Option<(Coord, u8)> {
    use CellNeighbor as N;
    let n = |dir| shape.neighbor(pos, dir);
    let out = match shape {
        TileShape::Square => match bit {
            N::RightSide => (pos, 1),
            N::BottomRightCorner => (pos, 2),
            N::BottomSide => (pos, 3),
            N::BottomLeftCorner => (n(N::LeftSide), 2),
            N::LeftSide => (n(N::LeftSide), 1),
            N::TopLeftCorner => (n(N::TopLeftCorner), 2),
            N::TopSide => (n(N::TopSide), 3),
            N::TopRightCorner => (n(N::TopSide), 2),
            _ => return None,
        },
        TileShape::Isometric => match bit {
            N::RightCorner => (n(N::TopRightSide), 2),
            N::BottomRightSide => (pos, 1),
            N::BottomCorner => (pos, 2),
            N::BottomLeftSide => (pos, 3),
            N::LeftCorner => (n(N::TopLeftSide), 2),
            N::TopLeftSide => (n(N::TopLeftSide), 1),
            N::TopCorner => (n(N::TopCorner), 2),
            N::TopRightSide => (n(N::TopRightSide), 3),
            _ => return None,
        },
        TileShape::HexHorizontalOffset => match bit {
            N::RightSide => (pos, 1),
            N::BottomRightCorner => (pos, 2),
            N::BottomRightSide => (pos, 3),
            N::BottomCorner => (pos, 4),
            N::BottomLeftSide => (pos, 5),
            N::BottomLeftCorner => (n(N::LeftSide), 2),
            N::LeftSide => (n(N::LeftSide), 1),
            N::TopLeftCorner => (n(N::TopLeftSide), 4),
            N::TopLeftSide => (n(N::TopLeftSide), 3),
            N::TopCorner => (n(N::TopLeftSide), 2),
            N::TopRightSide => (n(N::TopRightSide), 5),
            N::TopRightCorner => (n(N::TopRightSide), 4),
            _ => return None,
        },
        TileShape::HexVerticalOffset => match bit {
            N::RightCorner => (pos, 1),
            N::BottomRightSide => (pos, 2),
            N::BottomRightCorner => (pos, 3),
            N::BottomSide => (pos, 4),
            N::BottomLeftSide => (pos, 5),
            N::BottomLeftCorner => (n(N::BottomLeftSide), 1),
            N::LeftCorner => (n(N::TopLeftSide), 3),
            N::TopLeftSide => (n(N::TopLeftSide), 2),
            N::TopLeftCorner => (n(N::TopLeftSide), 1),
            N::TopSide => (n(N::TopSide), 4),
            N::TopRightCorner => (n(N::TopSide), 3),
            N::TopRightSide => (n(N::TopRightSide), 5),
            _ => return None,
        },
    };
    Some(out)
}

/// Constraints keyed by [`ConstraintKey`], iterated in key order.
///
/// At most one constraint exists per key. [`ConstraintSet::insert`] keeps the
/// stored constraint unless the incoming one has a strictly higher priority;
/// [`ConstraintSet::replace`] always overwrites.
#[derive(Clone, Debug, Default)]
pub struct ConstraintSet {
    entries: BTreeMap<ConstraintKey, TerrainConstraint>,
}

impl ConstraintSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `constraint`, resolving a key collision by priority.
    ///
    /// Returns `true` if `constraint` is now the stored value for its key.
    pub fn insert(&mut self, constraint: TerrainConstraint) -> bool {
        match self.entries.get_mut(&constraint.key) {
            Some(existing) if existing.priority >= constraint.priority => false,
            Some(existing) => {
                *existing = constraint;
                true
            }
            None => {
                self.entries.insert(constraint.key, constraint);
                true
            }
        }
    }

    /// Store `constraint`, discarding whatever was at its key.
    pub fn replace(&mut self, constraint: TerrainConstraint) {
        self.entries.insert(constraint.key, constraint);
    }

    /// The constraint stored at `key`.
    pub fn get(&self, key: ConstraintKey) -> Option<&TerrainConstraint> {
        self.entries.get(&key)
    }

    /// Remove and return the constraint at `key`.
    pub fn remove(&mut self, key: ConstraintKey) -> Option<TerrainConstraint> {
        self.entries.remove(&key)
    }

    /// Number of stored constraints.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no constraint is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in key order.
    pub fn iter(&self) -> impl Iterator<Item = &TerrainConstraint> + '_ {
        self.entries.values()
    }
}

impl Extend<TerrainConstraint> for ConstraintSet {
    fn extend<I: IntoIterator<Item = TerrainConstraint>>(&mut self, iter: I) {
        for c in iter {
            self.insert(c);
        }
    }
}

impl FromIterator<TerrainConstraint> for ConstraintSet {
    fn from_iter<I: IntoIterator<Item = TerrainConstraint>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}
