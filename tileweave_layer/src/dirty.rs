// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! What changed since the last update pass.

use alloc::vec::Vec;

use crate::store::CellKey;

bitflags::bitflags! {
    /// Layer-wide aspects that changed since the last pass.
    ///
    /// Every subsystem reads the same snapshot; the flags are only reset once
    /// the whole pass is done.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DirtyFlags: u32 {
        /// Enabled toggled.
        const ENABLED = 1 << 0;
        /// Attached to or detached from a world.
        const IN_TREE = 1 << 1;
        /// Canvas changed.
        const IN_CANVAS = 1 << 2;
        /// Visibility toggled.
        const VISIBILITY = 1 << 3;
        /// Self-modulate changed.
        const SELF_MODULATE = 1 << 4;
        /// Y-sort toggled.
        const Y_SORT_ENABLED = 1 << 5;
        /// Y-sort origin changed.
        const Y_SORT_ORIGIN = 1 << 6;
        /// Z-index changed.
        const Z_INDEX = 1 << 7;
        /// Light mask changed.
        const LIGHT_MASK = 1 << 8;
        /// Texture filter changed.
        const TEXTURE_FILTER = 1 << 9;
        /// Texture repeat changed.
        const TEXTURE_REPEAT = 1 << 10;
        /// Layer material changed.
        const MATERIAL = 1 << 11;
        /// Transform relative to the parent changed.
        const LOCAL_TRANSFORM = 1 << 12;
        /// Rendering quadrant size changed.
        const QUADRANT_SIZE = 1 << 13;
        /// Kinematic bodies toggled.
        const COLLISION_ANIMATABLE = 1 << 14;
        /// Collision debug visibility changed.
        const COLLISION_VISIBILITY = 1 << 15;
        /// Navigation toggled.
        const NAVIGATION_ENABLED = 1 << 16;
        /// Navigation debug visibility changed.
        const NAVIGATION_VISIBILITY = 1 << 17;
        /// Position in the owning group changed.
        const LAYER_INDEX = 1 << 18;
        /// Tile set swapped.
        const TILE_SET = 1 << 19;
        /// The host asked for runtime tile data to be rebuilt.
        const RUNTIME_UPDATE = 1 << 20;
        /// Debug overlay toggled.
        const DEBUG_OVERLAY = 1 << 21;
    }
}

/// Dirty aspects plus the cells edited since the last pass.
///
/// A cell is listed at most once; membership is the `queued` bit of the cell,
/// tested by [`DirtyTracker::push_cell`].
#[derive(Clone, Debug, Default)]
pub struct DirtyTracker {
    flags: DirtyFlags,
    cells: Vec<CellKey>,
}

impl DirtyTracker {
    /// Nothing dirty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current aspects.
    pub fn flags(&self) -> DirtyFlags {
        self.flags
    }

    /// Whether any of `flags` is set.
    pub fn any(&self, flags: DirtyFlags) -> bool {
        self.flags.intersects(flags)
    }

    /// Mark aspects dirty.
    pub fn mark(&mut self, flags: DirtyFlags) {
        self.flags |= flags;
    }

    /// List `key` unless `queued` says it already is.
    pub fn push_cell(&mut self, key: CellKey, queued: &mut bool) {
        if !*queued {
            *queued = true;
            self.cells.push(key);
        }
    }

    /// Dirty cells in edit order.
    pub fn cells(&self) -> &[CellKey] {
        &self.cells
    }

    /// True when neither a flag nor a cell is dirty.
    pub fn is_clean(&self) -> bool {
        self.flags.is_empty() && self.cells.is_empty()
    }

    /// Reset the flags and hand back the cell list.
    pub fn reset(&mut self) -> Vec<CellKey> {
        self.flags = DirtyFlags::empty();
        core::mem::take(&mut self.cells)
    }
}
