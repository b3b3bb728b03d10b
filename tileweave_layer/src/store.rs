// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sparse grid storage: cells live in a generational arena indexed by coordinate.

use alloc::boxed::Box;
use alloc::vec::Vec;

use hashbrown::HashMap;
use smallvec::SmallVec;
use tileweave_terrain::Coord;

use crate::tile_set::TileData;
use crate::types::{BodyId, NodeId, OccluderId, RegionId, TileRef};

/// Generational handle of a cell entry.
///
/// Handles stay valid while the entry exists. Once an erased cell is dropped at
/// the end of a pass its slot may be reused with a newer generation, so stale
/// handles never alias a different cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CellKey(u32, u32);

impl CellKey {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Cell keys are 32-bit; a layer never holds 2^32 cells."
    )]
    const fn new(idx: usize, generation: u32) -> Self {
        Self(idx as u32, generation)
    }

    const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Per-layer backend handles; one slot per tile-set layer.
pub(crate) type Handles<T> = SmallVec<[Option<T>; 2]>;

/// One present coordinate and everything derived from it.
#[derive(Debug)]
pub struct CellData {
    pub(crate) coords: Coord,
    pub(crate) tile: TileRef,
    pub(crate) queued: bool,
    pub(crate) rendering_quadrant: Option<Coord>,
    pub(crate) debug_quadrant: Option<Coord>,
    pub(crate) occluders: Handles<OccluderId>,
    pub(crate) bodies: Handles<BodyId>,
    pub(crate) regions: Handles<RegionId>,
    pub(crate) scene: Option<NodeId>,
    pub(crate) runtime_data: Option<Box<TileData>>,
}

impl CellData {
    fn new(coords: Coord) -> Self {
        Self {
            coords,
            tile: TileRef::EMPTY,
            queued: false,
            rendering_quadrant: None,
            debug_quadrant: None,
            occluders: SmallVec::new(),
            bodies: SmallVec::new(),
            regions: SmallVec::new(),
            scene: None,
            runtime_data: None,
        }
    }

    /// Grid coordinate.
    pub fn coords(&self) -> Coord {
        self.coords
    }

    /// Current tile; [`TileRef::EMPTY`] once erased.
    pub fn tile(&self) -> TileRef {
        self.tile
    }

    /// Bodies, one slot per physics layer.
    pub fn bodies(&self) -> &[Option<BodyId>] {
        &self.bodies
    }

    /// Navigation regions, one slot per navigation layer.
    pub fn regions(&self) -> &[Option<RegionId>] {
        &self.regions
    }

    /// Occluders, one slot per occlusion layer.
    pub fn occluders(&self) -> &[Option<OccluderId>] {
        &self.occluders
    }

    /// Spawned scene instance.
    pub fn scene(&self) -> Option<NodeId> {
        self.scene
    }

    /// Runtime override of the tile data, present only during a pass.
    pub fn runtime_data(&self) -> Option<&TileData> {
        self.runtime_data.as_deref()
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    cell: Option<CellData>,
}

/// Coordinate-addressed arena of [`CellData`].
#[derive(Debug, Default)]
pub struct GridStore {
    slots: Vec<Slot>,
    free_list: Vec<usize>,
    index: HashMap<Coord, CellKey>,
}

impl GridStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, erased-but-not-yet-dropped ones included.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True when no entry exists.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Handle of the entry at `coords`.
    pub fn key(&self, coords: Coord) -> Option<CellKey> {
        self.index.get(&coords).copied()
    }

    /// Entry at `coords`.
    pub fn get(&self, coords: Coord) -> Option<&CellData> {
        self.cell(self.key(coords)?)
    }

    /// Entry behind `key`, if it is still alive.
    pub fn cell(&self, key: CellKey) -> Option<&CellData> {
        let slot = self.slots.get(key.idx())?;
        if slot.generation != key.1 {
            return None;
        }
        slot.cell.as_ref()
    }

    /// Mutable entry behind `key`, if it is still alive.
    pub fn cell_mut(&mut self, key: CellKey) -> Option<&mut CellData> {
        let slot = self.slots.get_mut(key.idx())?;
        if slot.generation != key.1 {
            return None;
        }
        slot.cell.as_mut()
    }

    /// Entry at `coords`, created empty if absent.
    pub fn get_or_insert(&mut self, coords: Coord) -> CellKey {
        if let Some(key) = self.key(coords) {
            return key;
        }
        let key = if let Some(idx) = self.free_list.pop() {
            let slot = &mut self.slots[idx];
            slot.generation += 1;
            slot.cell = Some(CellData::new(coords));
            CellKey::new(idx, slot.generation)
        } else {
            self.slots.push(Slot {
                generation: 1,
                cell: Some(CellData::new(coords)),
            });
            CellKey::new(self.slots.len() - 1, 1)
        };
        self.index.insert(coords, key);
        key
    }

    /// Drop the entry at `coords`, returning it.
    pub fn remove(&mut self, coords: Coord) -> Option<CellData> {
        let key = self.index.remove(&coords)?;
        let cell = self.slots.get_mut(key.idx())?.cell.take();
        self.free_list.push(key.idx());
        cell
    }

    /// Every entry, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &CellData> + '_ {
        self.slots.iter().filter_map(|s| s.cell.as_ref())
    }

    /// Every entry, mutably, in no particular order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut CellData> + '_ {
        self.slots.iter_mut().filter_map(|s| s.cell.as_mut())
    }

    /// Handles of every entry, in coordinate order.
    pub fn keys(&self) -> Vec<CellKey> {
        let mut keys: Vec<(Coord, CellKey)> = self.index.iter().map(|(c, k)| (*c, *k)).collect();
        keys.sort_unstable_by_key(|(c, _)| *c);
        keys.into_iter().map(|(_, k)| k).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_idempotent_per_coordinate() {
        let mut store = GridStore::new();
        let a = store.get_or_insert(Coord::new(1, 2));
        let b = store.get_or_insert(Coord::new(1, 2));
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(Coord::new(1, 2)).unwrap().tile(), TileRef::EMPTY);
    }

    #[test]
    fn reused_slots_get_new_generations() {
        let mut store = GridStore::new();
        let a = store.get_or_insert(Coord::new(0, 0));
        assert!(store.remove(Coord::new(0, 0)).is_some());
        assert!(store.cell(a).is_none());
        let b = store.get_or_insert(Coord::new(5, 5));
        assert_ne!(a, b);
        assert!(store.cell(a).is_none());
        assert_eq!(store.cell(b).unwrap().coords(), Coord::new(5, 5));
        assert!(store.remove(Coord::new(0, 0)).is_none());
    }

    #[test]
    fn keys_come_in_coordinate_order() {
        let mut store = GridStore::new();
        for c in [Coord::new(3, 0), Coord::new(-2, 7), Coord::new(0, 1)] {
            store.get_or_insert(c);
        }
        let coords: Vec<Coord> = store
            .keys()
            .into_iter()
            .map(|k| store.cell(k).unwrap().coords())
            .collect();
        assert_eq!(coords, [Coord::new(-2, 7), Coord::new(0, 1), Coord::new(3, 0)]);
    }
}
