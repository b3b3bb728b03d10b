// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spatial buckets of cells, shared by the rendering and debug passes.

use alloc::vec::Vec;

use hashbrown::HashMap;
use kurbo::Point;
use tileweave_terrain::Coord;

use crate::store::CellKey;
use crate::types::CanvasItemId;

/// Side of a debug quadrant in cells.
pub(crate) const DEBUG_QUADRANT_SIZE: i32 = 16;

/// Key of the grid-aligned bucket holding `coords`.
pub(crate) fn grid_key(coords: Coord, size: i32) -> Coord {
    coords.div_floor(size.max(1))
}

/// Key and origin of the Y-sort slice a tile drawn at `local` belongs to.
///
/// The slice is a thin horizontal band: its origin sits on the Y axis at the
/// tile's sort position, and its key is that position scaled by 100.
pub(crate) fn y_sort_key(local: Point, tile_y_origin: i32, layer_y_origin: i32) -> (Coord, Point) {
    let origin = Point::new(
        0.0,
        local.y + f64::from(tile_y_origin) + f64::from(layer_y_origin),
    );
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Keys truncate toward zero; positions beyond i32 saturate."
    )]
    let key = Coord::new((origin.x * 100.0) as i32, (origin.y * 100.0) as i32);
    (key, origin)
}

/// One bucket: its member cells and the draw items built from them.
#[derive(Debug)]
pub(crate) struct Quadrant {
    pub(crate) key: Coord,
    pub(crate) origin: Point,
    pub(crate) cells: Vec<CellKey>,
    pub(crate) items: Vec<CanvasItemId>,
    queued: bool,
}

/// Buckets by key, plus the list of buckets touched since the last drain.
#[derive(Debug, Default)]
pub(crate) struct QuadrantIndex {
    quadrants: HashMap<Coord, Quadrant>,
    dirty: Vec<Coord>,
}

impl QuadrantIndex {
    pub(crate) fn len(&self) -> usize {
        self.quadrants.len()
    }

    pub(crate) fn get(&self, key: Coord) -> Option<&Quadrant> {
        self.quadrants.get(&key)
    }

    pub(crate) fn get_mut(&mut self, key: Coord) -> Option<&mut Quadrant> {
        self.quadrants.get_mut(&key)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Quadrant> + '_ {
        self.quadrants.values()
    }

    fn mark_dirty(&mut self, key: Coord) {
        if let Some(q) = self.quadrants.get_mut(&key)
            && !q.queued
        {
            q.queued = true;
            self.dirty.push(key);
        }
    }

    /// Put `cell` in bucket `key`, creating it at `origin` if needed.
    ///
    /// The bucket the cell leaves and the one it joins are both marked dirty,
    /// even when they are the same.
    pub(crate) fn place(&mut self, cell: CellKey, current: &mut Option<Coord>, key: Coord, origin: Point) {
        self.evict(cell, current);
        let q = self.quadrants.entry(key).or_insert_with(|| Quadrant {
            key,
            origin,
            cells: Vec::new(),
            items: Vec::new(),
            queued: false,
        });
        q.cells.push(cell);
        *current = Some(key);
        self.mark_dirty(key);
    }

    /// Take `cell` out of its bucket, marking that bucket dirty.
    pub(crate) fn evict(&mut self, cell: CellKey, current: &mut Option<Coord>) {
        let Some(old) = current.take() else {
            return;
        };
        if let Some(q) = self.quadrants.get_mut(&old) {
            q.cells.retain(|c| *c != cell);
        }
        self.mark_dirty(old);
    }

    /// Buckets touched since the last call, in the order they were touched.
    pub(crate) fn take_dirty(&mut self) -> Vec<Coord> {
        let dirty = core::mem::take(&mut self.dirty);
        for key in &dirty {
            if let Some(q) = self.quadrants.get_mut(key) {
                q.queued = false;
            }
        }
        dirty
    }

    pub(crate) fn remove(&mut self, key: Coord) -> Option<Quadrant> {
        self.quadrants.remove(&key)
    }

    /// Remove every bucket.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = Quadrant> + '_ {
        self.dirty.clear();
        self.quadrants.drain().map(|(_, q)| q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::GridStore;

    #[test]
    fn grid_keys_floor_toward_negative_infinity() {
        assert_eq!(grid_key(Coord::new(-1, -1), 16), Coord::new(-1, -1));
        assert_eq!(grid_key(Coord::new(-16, -16), 16), Coord::new(-1, -1));
        assert_eq!(grid_key(Coord::new(0, 0), 16), Coord::new(0, 0));
        assert_eq!(grid_key(Coord::new(16, 0), 16), Coord::new(1, 0));
        assert_eq!(grid_key(Coord::new(15, -17), 16), Coord::new(0, -2));
    }

    #[test]
    fn y_sort_key_scales_the_sort_position() {
        let (key, origin) = y_sort_key(Point::new(40.0, 8.5), 2, -1);
        assert_eq!(origin, Point::new(0.0, 9.5));
        assert_eq!(key, Coord::new(0, 950));
    }

    #[test]
    fn moving_a_cell_dirties_both_buckets() {
        let mut store = GridStore::new();
        let cell = store.get_or_insert(Coord::ZERO);
        let mut index = QuadrantIndex::default();
        let mut current = None;

        index.place(cell, &mut current, Coord::ZERO, Point::ZERO);
        assert_eq!(index.take_dirty(), [Coord::ZERO]);

        index.place(cell, &mut current, Coord::new(1, 0), Point::new(10.0, 0.0));
        assert_eq!(current, Some(Coord::new(1, 0)));
        assert_eq!(index.take_dirty(), [Coord::ZERO, Coord::new(1, 0)]);
        assert!(index.get(Coord::ZERO).unwrap().cells.is_empty());
        assert_eq!(index.get(Coord::new(1, 0)).unwrap().cells, [cell]);

        index.evict(cell, &mut current);
        assert_eq!(current, None);
        assert_eq!(index.take_dirty(), [Coord::new(1, 0)]);
        assert!(index.take_dirty().is_empty());
    }
}
