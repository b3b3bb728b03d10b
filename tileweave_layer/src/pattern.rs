// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangular stamps of cells, copied out of and pasted into layers.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use tileweave_terrain::Coord;

use crate::types::TileRef;

/// A block of cells with non-negative coordinates.
///
/// The size grows to cover every cell ever set; removing cells does not
/// shrink it unless asked to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TileMapPattern {
    size: Coord,
    cells: BTreeMap<Coord, TileRef>,
}

impl TileMapPattern {
    /// An empty pattern.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cell at `coords`. Empty tiles remove the cell.
    ///
    /// Negative coordinates are rejected with a warning.
    pub fn set_cell(&mut self, coords: Coord, tile: TileRef) {
        if coords.x < 0 || coords.y < 0 {
            log::warn!("pattern cell {coords} has a negative coordinate");
            return;
        }
        let tile = tile.normalized();
        if tile.is_empty() {
            self.cells.remove(&coords);
            return;
        }
        self.size = self.size.max(coords + Coord::new(1, 1));
        self.cells.insert(coords, tile);
    }

    /// Remove the cell at `coords`, shrinking the size to the remaining cells
    /// if `update_size` is set.
    pub fn remove_cell(&mut self, coords: Coord, update_size: bool) {
        self.cells.remove(&coords);
        if update_size {
            self.size = self
                .cells
                .keys()
                .fold(Coord::ZERO, |size, c| size.max(*c + Coord::new(1, 1)));
        }
    }

    /// Whether a cell exists at `coords`.
    pub fn has_cell(&self, coords: Coord) -> bool {
        self.cells.contains_key(&coords)
    }

    /// Tile at `coords`, [`TileRef::EMPTY`] if none.
    pub fn get_cell(&self, coords: Coord) -> TileRef {
        self.cells.get(&coords).copied().unwrap_or(TileRef::EMPTY)
    }

    /// Coordinates of every cell, in order.
    pub fn used_cells(&self) -> Vec<Coord> {
        self.cells.keys().copied().collect()
    }

    /// Cells with their tiles, in coordinate order.
    pub fn cells(&self) -> impl Iterator<Item = (Coord, TileRef)> + '_ {
        self.cells.iter().map(|(c, t)| (*c, *t))
    }

    /// Width and height in cells.
    pub fn size(&self) -> Coord {
        self.size
    }

    /// Force the size.
    pub fn set_size(&mut self, size: Coord) {
        self.size = size;
    }

    /// True when the pattern holds no cell.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_covers_every_cell_set() {
        let mut p = TileMapPattern::new();
        p.set_cell(Coord::new(2, 0), TileRef::new(0, Coord::ZERO, 0));
        p.set_cell(Coord::new(0, 3), TileRef::new(0, Coord::ZERO, 0));
        assert_eq!(p.size(), Coord::new(3, 4));
        assert_eq!(p.used_cells(), [Coord::new(0, 3), Coord::new(2, 0)]);

        p.remove_cell(Coord::new(0, 3), false);
        assert_eq!(p.size(), Coord::new(3, 4));
        p.remove_cell(Coord::new(9, 9), true);
        assert_eq!(p.size(), Coord::new(3, 1));
    }

    #[test]
    fn negative_and_empty_cells_are_not_stored() {
        let mut p = TileMapPattern::new();
        p.set_cell(Coord::new(-1, 0), TileRef::new(0, Coord::ZERO, 0));
        p.set_cell(Coord::new(1, 1), TileRef::EMPTY);
        assert!(p.is_empty());
        assert_eq!(p.get_cell(Coord::new(1, 1)), TileRef::EMPTY);
    }
}
