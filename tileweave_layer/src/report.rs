// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Summary of the backend work done by one update pass.

/// Backend objects one subsystem created and freed during a pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Churn {
    /// Objects created.
    pub created: usize,
    /// Objects freed.
    pub freed: usize,
}

impl Churn {
    /// True if nothing was created or freed.
    pub fn is_empty(&self) -> bool {
        self.created == 0 && self.freed == 0
    }

    fn merge(self, other: Self) -> Self {
        Self {
            created: self.created + other.created,
            freed: self.freed + other.freed,
        }
    }
}

/// Summary returned by [`TileLayer::process`](crate::TileLayer::process) and
/// [`TileLayer::update_internals`](crate::TileLayer::update_internals).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Draw items of rendering quadrants.
    pub canvas_items: Churn,
    /// Light occluders.
    pub occluders: Churn,
    /// Physics bodies.
    pub bodies: Churn,
    /// Navigation regions and private navigation maps.
    pub navigation: Churn,
    /// Spawned scene instances.
    pub scenes: Churn,
    /// Draw items of debug quadrants.
    pub debug_items: Churn,
    /// Cells that were dirty when the pass started.
    pub dirty_cells: usize,
    /// Erased cells dropped from the grid at the end of the pass.
    pub removed_cells: usize,
}

impl PassReport {
    /// True if no backend object was created or freed.
    pub fn is_quiet(&self) -> bool {
        self.total().is_empty()
    }

    /// Churn summed over every subsystem.
    pub fn total(&self) -> Churn {
        [
            self.canvas_items,
            self.occluders,
            self.bodies,
            self.navigation,
            self.scenes,
            self.debug_items,
        ]
        .into_iter()
        .fold(Churn::default(), Churn::merge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_sums_every_subsystem() {
        let mut r = PassReport::default();
        assert!(r.is_quiet());
        r.bodies.created = 2;
        r.canvas_items.freed = 1;
        assert_eq!(r.total(), Churn { created: 2, freed: 1 });
        assert!(!r.is_quiet());
    }
}
