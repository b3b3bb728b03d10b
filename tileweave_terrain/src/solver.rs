// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimum-violation terrain solver and the connect/path/pattern fills.
//!
//! The solver never touches the grid. It reads through [`TerrainSource`] and
//! returns the pattern chosen for each affected cell, in the order the cells
//! were visited. Turning patterns into concrete tiles is the caller's job.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use crate::constraint::{ConstraintKey, ConstraintSet, TerrainConstraint};
use crate::coord::Coord;
use crate::error::TerrainError;
use crate::geometry::{CellNeighbor, TileShape};
use crate::pattern::{TerrainMode, TerrainPattern};

/// Priority of constraints the caller asked for explicitly.
pub const PAINTED_PRIORITY: i32 = 10;
/// Priority of constraints inferred from cells already on the grid.
pub const INFERRED_PRIORITY: i32 = 5;

/// Patterns chosen by a fill, one per visited cell.
pub type TerrainFill = Vec<(Coord, TerrainPattern)>;

/// Read access to the tile set and grid needed by the solver.
pub trait TerrainSource {
    /// Tile geometry.
    fn shape(&self) -> TileShape;

    /// Number of terrain sets defined by the tile set.
    fn terrain_set_count(&self) -> usize;

    /// Matching mode of a terrain set.
    fn terrain_mode(&self, terrain_set: i32) -> TerrainMode;

    /// Every pattern some tile of `terrain_set` provides, in enumeration order.
    ///
    /// Includes [`TerrainPattern::EMPTY`] when erasing is an option.
    fn patterns(&self, terrain_set: i32) -> &[TerrainPattern];

    /// Pattern of the tile at `coords`, if it belongs to `terrain_set`.
    fn pattern_at(&self, coords: Coord, terrain_set: i32) -> Option<TerrainPattern>;
}

/// Solver bound to one terrain set of a [`TerrainSource`].
#[derive(Debug)]
pub struct TerrainSolver<'a, S: ?Sized> {
    source: &'a S,
    terrain_set: i32,
    shape: TileShape,
    mode: TerrainMode,
}

impl<'a, S: TerrainSource + ?Sized> TerrainSolver<'a, S> {
    /// Bind a solver to `terrain_set`.
    pub fn new(source: &'a S, terrain_set: i32) -> Result<Self, TerrainError> {
        let count = source.terrain_set_count();
        if usize::try_from(terrain_set).map_or(true, |i| i >= count) {
            return Err(TerrainError::TerrainSetOutOfRange { terrain_set, count });
        }
        Ok(Self {
            source,
            terrain_set,
            shape: source.shape(),
            mode: source.terrain_mode(terrain_set),
        })
    }

    /// The bound terrain set.
    pub fn terrain_set(&self) -> i32 {
        self.terrain_set
    }

    fn valid_bits(&self) -> impl Iterator<Item = CellNeighbor> + '_ {
        CellNeighbor::ALL
            .into_iter()
            .filter(|bit| self.shape.is_valid_peering_bit(self.mode, *bit))
    }

    fn peering(&self, coords: Coord, bit: CellNeighbor, terrain: i32) -> Option<TerrainConstraint> {
        TerrainConstraint::peering(self.shape, coords, bit, terrain).ok()
    }

    fn key_of(&self, coords: Coord, bit: CellNeighbor) -> Option<ConstraintKey> {
        self.peering(coords, bit, -1).map(|c| c.key())
    }

    /// Pattern currently at `coords`, or the empty pattern.
    pub fn current_pattern(&self, coords: Coord) -> TerrainPattern {
        self.source
            .pattern_at(coords, self.terrain_set)
            .unwrap_or(TerrainPattern::EMPTY)
    }

    /// Pick the pattern for `coords` that violates the least constraint weight.
    ///
    /// A candidate is rejected outright if it changes a bit (or the center) that no
    /// constraint covers. Ties go to the earliest candidate. When nothing qualifies
    /// the current pattern is kept.
    pub fn best_pattern_for_constraints(
        &self,
        coords: Coord,
        constraints: &ConstraintSet,
        current: TerrainPattern,
    ) -> TerrainPattern {
        let mut best: Option<(i32, TerrainPattern)> = None;
        'candidates: for candidate in self.source.patterns(self.terrain_set) {
            let mut score = 0;

            let center = TerrainConstraint::center(coords, candidate.terrain());
            match constraints.get(center.key()) {
                Some(c) if c.terrain() != candidate.terrain() => score += c.priority(),
                Some(_) => {}
                None if current.terrain() != candidate.terrain() => continue,
                None => {}
            }

            for bit in self.valid_bits() {
                let Some(key) = self.key_of(coords, bit) else {
                    continue;
                };
                let value = candidate.peering_bit(bit);
                match constraints.get(key) {
                    Some(c) if c.terrain() != value => score += c.priority(),
                    Some(_) => {}
                    None if current.peering_bit(bit) != value => continue 'candidates,
                    None => {}
                }
            }

            if best.is_none_or(|(min, _)| score < min) {
                best = Some((score, *candidate));
            }
        }
        best.map_or(current, |(_, pattern)| pattern)
    }

    /// Constraints that placing `pattern` at `coords` imposes on its surroundings.
    pub fn constraints_from_added_pattern(
        &self,
        coords: Coord,
        pattern: &TerrainPattern,
    ) -> Vec<TerrainConstraint> {
        let mut out = Vec::new();
        out.push(TerrainConstraint::center(coords, pattern.terrain()));
        for bit in self.valid_bits() {
            if let Some(c) = self.peering(coords, bit, pattern.peering_bit(bit)) {
                out.push(c);
            }
        }
        out
    }

    /// Constraints describing what already surrounds the painted cells.
    ///
    /// Every peering position touching a painted cell receives the most common
    /// terrain among the tiles overlapping it (ties keep the first seen). Each
    /// painted cell also keeps its current center terrain. With `ignore_empty`,
    /// absent terrain does not vote and empty centers are skipped.
    pub fn constraints_from_painted_cells(
        &self,
        painted: &BTreeSet<Coord>,
        ignore_empty: bool,
    ) -> ConstraintSet {
        let mut positions = ConstraintSet::new();
        for &coords in painted {
            for bit in self.valid_bits() {
                if let Some(c) = self.peering(coords, bit, -1) {
                    positions.insert(c);
                }
            }
        }

        let mut out = ConstraintSet::new();
        let mut counts: Vec<(i32, u32)> = Vec::new();
        for position in positions.iter() {
            counts.clear();
            for (coords, bit) in position.overlapping_coords_and_peering_bits(self.shape) {
                let terrain = self
                    .source
                    .pattern_at(coords, self.terrain_set)
                    .map_or(-1, |p| p.peering_bit(bit));
                if ignore_empty && terrain < 0 {
                    continue;
                }
                match counts.iter_mut().find(|(t, _)| *t == terrain) {
                    Some((_, n)) => *n += 1,
                    None => counts.push((terrain, 1)),
                }
            }

            let mut max = 0;
            let mut max_terrain = -1;
            for &(terrain, n) in &counts {
                if n > max {
                    max = n;
                    max_terrain = terrain;
                }
            }
            if max > 0 {
                let mut c = *position;
                c.set_terrain(max_terrain);
                c.set_priority(INFERRED_PRIORITY);
                out.insert(c);
            }
        }

        for &coords in painted {
            let terrain = self
                .source
                .pattern_at(coords, self.terrain_set)
                .map_or(-1, |p| p.terrain());
            if !ignore_empty || terrain >= 0 {
                out.insert(
                    TerrainConstraint::center(coords, terrain).with_priority(INFERRED_PRIORITY),
                );
            }
        }
        out
    }

    /// Solve `to_replace` in order, feeding each choice back as a constraint.
    pub fn fill_constraints(&self, to_replace: &[Coord], constraints: &ConstraintSet) -> TerrainFill {
        let mut constraints = constraints.clone();
        let mut out = Vec::with_capacity(to_replace.len());
        for &coords in to_replace {
            let current = self.current_pattern(coords);
            let pattern = self.best_pattern_for_constraints(coords, &constraints, current);
            for c in self.constraints_from_added_pattern(coords, &pattern) {
                constraints.replace(c.with_priority(INFERRED_PRIORITY));
            }
            out.push((coords, pattern));
        }
        out
    }

    /// Cells a fill may modify: painted cells (last painted first), then their neighbors.
    fn modifiable_cells(
        &self,
        painted: &[Coord],
        include: impl Fn(CellNeighbor) -> bool,
    ) -> (Vec<Coord>, BTreeSet<Coord>) {
        let mut list = Vec::new();
        let mut seen = BTreeSet::new();
        for &coords in painted.iter().rev() {
            if seen.insert(coords) {
                list.push(coords);
            }
        }
        for &coords in painted {
            for bit in CellNeighbor::ALL.into_iter().filter(|b| include(*b)) {
                if let Some(neighbor) = self.shape.neighbor_cell(coords, bit)
                    && seen.insert(neighbor)
                {
                    list.push(neighbor);
                }
            }
        }
        (list, seen)
    }

    /// Paint `coords` with `terrain`, connecting to adjacent cells of the same terrain.
    pub fn fill_connect(&self, coords: &[Coord], terrain: i32, ignore_empty: bool) -> TerrainFill {
        let painted: BTreeSet<Coord> = coords.iter().copied().collect();
        let (to_replace, modifiable) =
            self.modifiable_cells(coords, |bit| self.shape.is_existing_neighbor(bit));

        let with_terrain: BTreeSet<Coord> = modifiable
            .iter()
            .copied()
            .filter(|c| {
                painted.contains(c)
                    || self
                        .source
                        .pattern_at(*c, self.terrain_set)
                        .is_some_and(|p| p.terrain() == terrain)
            })
            .collect();

        let mut constraints = ConstraintSet::new();
        for &cell in coords {
            constraints
                .insert(TerrainConstraint::center(cell, terrain).with_priority(PAINTED_PRIORITY));
            for bit in self.valid_bits() {
                let Some(c) = self.peering(cell, bit, terrain) else {
                    continue;
                };
                let connects = if bit.is_side() {
                    self.shape
                        .neighbor_cell(cell, bit)
                        .is_some_and(|n| with_terrain.contains(&n))
                } else {
                    c.overlapping_coords_and_peering_bits(self.shape)
                        .iter()
                        .all(|(n, _)| with_terrain.contains(n))
                };
                if connects {
                    constraints.insert(c.with_priority(PAINTED_PRIORITY));
                }
            }
        }
        constraints.extend(
            self.constraints_from_painted_cells(&painted, ignore_empty)
                .iter()
                .copied(),
        );

        self.fill_constraints(&to_replace, &constraints)
    }

    /// Paint a path of consecutive neighboring cells with `terrain`.
    ///
    /// Consecutive cells must be grid neighbors, whatever the terrain mode. Only
    /// the bits between consecutive cells are connected, and only when the mode
    /// has a peering bit there.
    pub fn fill_path(
        &self,
        coords: &[Coord],
        terrain: i32,
        ignore_empty: bool,
    ) -> Result<TerrainFill, TerrainError> {
        let mut links = Vec::with_capacity(coords.len().saturating_sub(1));
        for pair in coords.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let bit = CellNeighbor::ALL
                .into_iter()
                .filter(|bit| self.shape.is_existing_neighbor(*bit))
                .find(|bit| self.shape.neighbor_cell(from, *bit) == Some(to))
                .ok_or(TerrainError::InvalidPath { from, to })?;
            links.push((from, bit));
        }

        let painted: BTreeSet<Coord> = coords.iter().copied().collect();
        let (to_replace, _) = self.modifiable_cells(coords, |bit| {
            self.shape.is_valid_peering_bit(self.mode, bit)
        });

        let mut constraints = ConstraintSet::new();
        for &cell in coords {
            constraints
                .insert(TerrainConstraint::center(cell, terrain).with_priority(PAINTED_PRIORITY));
        }
        for (cell, bit) in links {
            if !self.shape.is_valid_peering_bit(self.mode, bit) {
                continue;
            }
            if let Some(c) = self.peering(cell, bit, terrain) {
                constraints.insert(c.with_priority(PAINTED_PRIORITY));
            }
        }
        constraints.extend(
            self.constraints_from_painted_cells(&painted, ignore_empty)
                .iter()
                .copied(),
        );

        Ok(self.fill_constraints(&to_replace, &constraints))
    }

    /// Paint every cell of `coords` with exactly `pattern`, adapting the surroundings.
    pub fn fill_pattern(
        &self,
        coords: &[Coord],
        pattern: &TerrainPattern,
        ignore_empty: bool,
    ) -> TerrainFill {
        let painted: BTreeSet<Coord> = coords.iter().copied().collect();
        let (to_replace, _) = self.modifiable_cells(coords, |bit| {
            self.shape.is_valid_peering_bit(self.mode, bit)
        });

        let mut constraints = ConstraintSet::new();
        for &cell in coords {
            for c in self.constraints_from_added_pattern(cell, pattern) {
                constraints.insert(c.with_priority(PAINTED_PRIORITY));
            }
        }
        constraints.extend(
            self.constraints_from_painted_cells(&painted, ignore_empty)
                .iter()
                .copied(),
        );

        self.fill_constraints(&to_replace, &constraints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::collections::BTreeMap;

    /// Square grid with one terrain and every combination of four peering bits.
    struct Square {
        mode: TerrainMode,
        patterns: Vec<TerrainPattern>,
        grid: BTreeMap<Coord, TerrainPattern>,
    }

    const SIDES: [CellNeighbor; 4] = [
        CellNeighbor::RightSide,
        CellNeighbor::BottomSide,
        CellNeighbor::LeftSide,
        CellNeighbor::TopSide,
    ];

    const CORNERS: [CellNeighbor; 4] = [
        CellNeighbor::BottomRightCorner,
        CellNeighbor::BottomLeftCorner,
        CellNeighbor::TopLeftCorner,
        CellNeighbor::TopRightCorner,
    ];

    impl Square {
        fn new(mode: TerrainMode, bits: [CellNeighbor; 4]) -> Self {
            let mut patterns = alloc::vec![TerrainPattern::EMPTY];
            for mask in 0..16_u32 {
                let mut p = TerrainPattern::with_center(0);
                for (i, bit) in bits.iter().enumerate() {
                    if mask & (1 << i) != 0 {
                        p.set_peering_bit(*bit, 0);
                    }
                }
                patterns.push(p);
            }
            Self {
                mode,
                patterns,
                grid: BTreeMap::new(),
            }
        }

        fn sides() -> Self {
            Self::new(TerrainMode::MatchSides, SIDES)
        }

        fn corners() -> Self {
            Self::new(TerrainMode::MatchCorners, CORNERS)
        }
    }

    impl TerrainSource for Square {
        fn shape(&self) -> TileShape {
            TileShape::Square
        }

        fn terrain_set_count(&self) -> usize {
            1
        }

        fn terrain_mode(&self, _: i32) -> TerrainMode {
            self.mode
        }

        fn patterns(&self, _: i32) -> &[TerrainPattern] {
            &self.patterns
        }

        fn pattern_at(&self, coords: Coord, _: i32) -> Option<TerrainPattern> {
            self.grid.get(&coords).copied()
        }
    }

    fn pattern_of(fill: &TerrainFill, coords: Coord) -> TerrainPattern {
        fill.iter()
            .find(|(c, _)| *c == coords)
            .map(|(_, p)| *p)
            .expect("cell should be part of the fill")
    }

    #[test]
    fn out_of_range_terrain_set_is_rejected() {
        let src = Square::sides();
        assert!(matches!(
            TerrainSolver::new(&src, 1),
            Err(TerrainError::TerrainSetOutOfRange { terrain_set: 1, count: 1 })
        ));
        assert!(TerrainSolver::new(&src, -1).is_err());
    }

    #[test]
    fn connect_line_links_interior_cells_on_both_sides() {
        let src = Square::sides();
        let solver = TerrainSolver::new(&src, 0).unwrap();
        let line: Vec<Coord> = (0..5).map(|x| Coord::new(x, 0)).collect();
        let fill = solver.fill_connect(&line, 0, false);

        // Painted cells come first, last painted first.
        assert_eq!(fill[0].0, Coord::new(4, 0));

        for x in 1..4 {
            let p = pattern_of(&fill, Coord::new(x, 0));
            assert_eq!(p.terrain(), 0);
            assert_eq!(p.peering_bit(CellNeighbor::LeftSide), 0);
            assert_eq!(p.peering_bit(CellNeighbor::RightSide), 0);
            assert_eq!(p.peering_bit(CellNeighbor::TopSide), -1);
            assert_eq!(p.peering_bit(CellNeighbor::BottomSide), -1);
        }
        let first = pattern_of(&fill, Coord::new(0, 0));
        assert_eq!(first.peering_bit(CellNeighbor::LeftSide), -1);
        assert_eq!(first.peering_bit(CellNeighbor::RightSide), 0);
        let last = pattern_of(&fill, Coord::new(4, 0));
        assert_eq!(last.peering_bit(CellNeighbor::LeftSide), 0);
        assert_eq!(last.peering_bit(CellNeighbor::RightSide), -1);

        // Untouched neighbors stay empty.
        assert!(pattern_of(&fill, Coord::new(5, 0)).is_empty());
        assert!(pattern_of(&fill, Coord::new(2, 1)).is_empty());
    }

    #[test]
    fn connect_joins_existing_terrain() {
        let mut src = Square::sides();
        src.grid
            .insert(Coord::new(1, 0), TerrainPattern::with_center(0));
        let solver = TerrainSolver::new(&src, 0).unwrap();
        let fill = solver.fill_connect(&[Coord::new(0, 0)], 0, false);
        assert_eq!(
            pattern_of(&fill, Coord::new(0, 0)).peering_bit(CellNeighbor::RightSide),
            0
        );
        let neighbor = pattern_of(&fill, Coord::new(1, 0));
        assert_eq!(neighbor.terrain(), 0);
        assert_eq!(neighbor.peering_bit(CellNeighbor::LeftSide), 0);
    }

    #[test]
    fn path_only_links_consecutive_cells() {
        let src = Square::sides();
        let solver = TerrainSolver::new(&src, 0).unwrap();
        let path = [Coord::new(0, 0), Coord::new(1, 0), Coord::new(1, 1)];
        let fill = solver.fill_path(&path, 0, false).unwrap();
        let corner = pattern_of(&fill, Coord::new(1, 0));
        assert_eq!(corner.peering_bit(CellNeighbor::LeftSide), 0);
        assert_eq!(corner.peering_bit(CellNeighbor::BottomSide), 0);
        assert_eq!(corner.peering_bit(CellNeighbor::RightSide), -1);
        let end = pattern_of(&fill, Coord::new(1, 1));
        assert_eq!(end.peering_bit(CellNeighbor::TopSide), 0);
        assert_eq!(end.peering_bit(CellNeighbor::LeftSide), -1);
    }

    #[test]
    fn disconnected_path_names_the_pair() {
        let src = Square::sides();
        let solver = TerrainSolver::new(&src, 0).unwrap();
        let err = solver
            .fill_path(&[Coord::new(0, 0), Coord::new(2, 0)], 0, false)
            .unwrap_err();
        assert_eq!(
            err,
            TerrainError::InvalidPath {
                from: Coord::new(0, 0),
                to: Coord::new(2, 0)
            }
        );
        assert_eq!(
            alloc::format!("{err}"),
            "invalid terrain path, (2, 0) is not a neighboring tile of (0, 0)"
        );
    }

    #[test]
    fn sides_path_accepts_diagonal_steps() {
        let src = Square::sides();
        let solver = TerrainSolver::new(&src, 0).unwrap();
        let fill = solver
            .fill_path(&[Coord::new(0, 0), Coord::new(1, 1)], 0, false)
            .unwrap();
        // No side bit joins diagonal cells, so only the centers are painted.
        for coords in [Coord::new(0, 0), Coord::new(1, 1)] {
            assert_eq!(pattern_of(&fill, coords), TerrainPattern::with_center(0));
        }
    }

    #[test]
    fn corners_path_accepts_side_steps() {
        let src = Square::corners();
        let solver = TerrainSolver::new(&src, 0).unwrap();
        let fill = solver
            .fill_path(&[Coord::new(0, 0), Coord::new(1, 0)], 0, false)
            .unwrap();
        for coords in [Coord::new(0, 0), Coord::new(1, 0)] {
            assert_eq!(pattern_of(&fill, coords), TerrainPattern::with_center(0));
        }
        assert!(pattern_of(&fill, Coord::new(0, 1)).is_empty());
    }

    #[test]
    fn corners_path_links_diagonal_steps_through_the_shared_corner() {
        let src = Square::corners();
        let solver = TerrainSolver::new(&src, 0).unwrap();
        let fill = solver
            .fill_path(&[Coord::new(0, 0), Coord::new(1, 1)], 0, false)
            .unwrap();
        assert_eq!(
            pattern_of(&fill, Coord::new(0, 0)),
            TerrainPattern::with_center(0).with_peering_bit(CellNeighbor::BottomRightCorner, 0)
        );
        assert_eq!(
            pattern_of(&fill, Coord::new(1, 1)),
            TerrainPattern::with_center(0).with_peering_bit(CellNeighbor::TopLeftCorner, 0)
        );
    }

    #[test]
    fn corners_path_still_rejects_gaps() {
        let src = Square::corners();
        let solver = TerrainSolver::new(&src, 0).unwrap();
        assert_eq!(
            solver.fill_path(&[Coord::new(0, 0), Coord::new(0, 2)], 0, false),
            Err(TerrainError::InvalidPath {
                from: Coord::new(0, 0),
                to: Coord::new(0, 2)
            })
        );
    }

    #[test]
    fn corners_connect_needs_every_cell_around_the_corner() {
        let src = Square::corners();
        let solver = TerrainSolver::new(&src, 0).unwrap();

        // Two cells side by side share no full corner.
        let pair = solver.fill_connect(&[Coord::new(0, 0), Coord::new(1, 0)], 0, false);
        for coords in [Coord::new(0, 0), Coord::new(1, 0)] {
            assert_eq!(pattern_of(&pair, coords), TerrainPattern::with_center(0));
        }

        // A 2x2 block fills the corner in its middle.
        let block = [
            Coord::new(0, 0),
            Coord::new(1, 0),
            Coord::new(0, 1),
            Coord::new(1, 1),
        ];
        let fill = solver.fill_connect(&block, 0, false);
        let inner = [
            (Coord::new(0, 0), CellNeighbor::BottomRightCorner),
            (Coord::new(1, 0), CellNeighbor::BottomLeftCorner),
            (Coord::new(0, 1), CellNeighbor::TopRightCorner),
            (Coord::new(1, 1), CellNeighbor::TopLeftCorner),
        ];
        for (coords, corner) in inner {
            assert_eq!(
                pattern_of(&fill, coords),
                TerrainPattern::with_center(0).with_peering_bit(corner, 0)
            );
        }
    }

    #[test]
    fn unconstrained_bits_are_never_changed() {
        let src = Square::sides();
        let solver = TerrainSolver::new(&src, 0).unwrap();
        let mut constraints = ConstraintSet::new();
        constraints.insert(
            TerrainConstraint::center(Coord::ZERO, 0).with_priority(PAINTED_PRIORITY),
        );
        // Only the center is constrained; no candidate may flip a side bit, so the
        // only acceptable candidate is the bare center pattern.
        let current = TerrainPattern::EMPTY;
        let best = solver.best_pattern_for_constraints(Coord::ZERO, &constraints, current);
        assert_eq!(best, TerrainPattern::with_center(0));
    }

    #[test]
    fn no_candidate_keeps_current_pattern() {
        let src = Square::sides();
        let solver = TerrainSolver::new(&src, 0).unwrap();
        let current = TerrainPattern::with_center(7);
        let best = solver.best_pattern_for_constraints(Coord::ZERO, &ConstraintSet::new(), current);
        assert_eq!(best, current);
    }

    #[test]
    fn painted_cells_take_majority_terrain() {
        let mut src = Square::sides();
        src.grid.insert(
            Coord::new(1, 0),
            TerrainPattern::with_center(0).with_peering_bit(CellNeighbor::LeftSide, 0),
        );
        let solver = TerrainSolver::new(&src, 0).unwrap();
        let painted: BTreeSet<Coord> = [Coord::ZERO].into_iter().collect();

        let with_empty = solver.constraints_from_painted_cells(&painted, false);
        let right = TerrainConstraint::peering(
            TileShape::Square,
            Coord::ZERO,
            CellNeighbor::RightSide,
            0,
        )
        .unwrap();
        // One vote for -1 (the painted cell), one for 0: the first seen wins.
        assert_eq!(with_empty.get(right.key()).unwrap().terrain(), -1);
        assert_eq!(
            with_empty.get(right.key()).unwrap().priority(),
            INFERRED_PRIORITY
        );
        assert!(with_empty.get(TerrainConstraint::center(Coord::ZERO, 0).key()).is_some());

        let ignoring_empty = solver.constraints_from_painted_cells(&painted, true);
        assert_eq!(ignoring_empty.get(right.key()).unwrap().terrain(), 0);
        assert!(
            ignoring_empty
                .get(TerrainConstraint::center(Coord::ZERO, 0).key())
                .is_none()
        );
    }

    #[test]
    fn pattern_fill_places_the_exact_pattern() {
        let src = Square::sides();
        let solver = TerrainSolver::new(&src, 0).unwrap();
        let wanted = TerrainPattern::with_center(0).with_peering_bit(CellNeighbor::TopSide, 0);
        let fill = solver.fill_pattern(&[Coord::new(3, 3)], &wanted, false);
        assert_eq!(pattern_of(&fill, Coord::new(3, 3)), wanted);
        // The neighbor's center is unconstrained, so it cannot change; it keeps
        // the closest pattern with an empty center.
        assert!(pattern_of(&fill, Coord::new(3, 2)).is_empty());
    }
}
