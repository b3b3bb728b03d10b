// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Glue between a layer's cells and the terrain solver.

use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use tileweave_terrain::{Coord, TerrainMode, TerrainPattern, TerrainSource, TileShape};

use crate::store::GridStore;
use crate::tile_set::TileSet;
use crate::types::TileRef;

/// A layer's cells seen through one tile set, as the solver reads them.
#[derive(Debug)]
pub(crate) struct GridTerrain<'a> {
    pub(crate) tile_set: &'a TileSet,
    pub(crate) store: &'a GridStore,
}

impl TerrainSource for GridTerrain<'_> {
    fn shape(&self) -> TileShape {
        self.tile_set.shape()
    }

    fn terrain_set_count(&self) -> usize {
        self.tile_set.terrain_sets().len()
    }

    fn terrain_mode(&self, terrain_set: i32) -> TerrainMode {
        self.tile_set.terrain_mode(terrain_set)
    }

    fn patterns(&self, terrain_set: i32) -> &[TerrainPattern] {
        self.tile_set.terrain_patterns(terrain_set)
    }

    fn pattern_at(&self, coords: Coord, terrain_set: i32) -> Option<TerrainPattern> {
        let cell = self.store.get(coords)?;
        self.tile_set.pattern_of(cell.tile, terrain_set)
    }
}

/// Pick a tile providing `pattern`, weighted by tile probability.
///
/// The empty pattern maps to [`TileRef::EMPTY`], as does a pattern no tile
/// provides. When every candidate weighs zero the first one wins.
pub(crate) fn random_tile<R: Rng>(
    tile_set: &TileSet,
    terrain_set: i32,
    pattern: &TerrainPattern,
    rng: &mut R,
) -> TileRef {
    if pattern.is_empty() {
        return TileRef::EMPTY;
    }
    let candidates = tile_set.tiles_for_pattern(terrain_set, pattern);
    match candidates {
        [] => TileRef::EMPTY,
        [(only, _)] => *only,
        [(first, _), ..] => match WeightedIndex::new(candidates.iter().map(|(_, w)| *w)) {
            Ok(dist) => candidates[dist.sample(rng)].0,
            Err(_) => *first,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile_set::{AtlasSource, AtlasTile, TerrainSet, TileData, TileSource};
    use kurbo::Size;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn grass(probability: f32) -> TileData {
        TileData::default()
            .with_terrain(0, TerrainPattern::with_center(0))
            .with_probability(probability)
    }

    fn tile_set(a: f32, b: f32) -> TileSet {
        let atlas = AtlasSource::new(None, Size::new(16.0, 16.0))
            .with_tile(Coord::new(0, 0), AtlasTile::new(grass(a)))
            .with_tile(Coord::new(1, 0), AtlasTile::new(grass(b)));
        TileSet::builder()
            .tile_size(Size::new(16.0, 16.0))
            .terrain_set(TerrainSet {
                mode: TerrainMode::MatchSides,
                terrains: alloc::vec![],
            })
            .source(0, TileSource::Atlas(atlas))
            .build()
    }

    #[test]
    fn zero_weights_fall_back_to_the_first_candidate() {
        let ts = tile_set(0.0, 0.0);
        let mut rng = SmallRng::seed_from_u64(1);
        let tile = random_tile(&ts, 0, &TerrainPattern::with_center(0), &mut rng);
        assert_eq!(tile, TileRef::new(0, Coord::new(0, 0), 0));
    }

    #[test]
    fn weights_exclude_zero_probability_tiles() {
        let ts = tile_set(0.0, 1.0);
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..20 {
            let tile = random_tile(&ts, 0, &TerrainPattern::with_center(0), &mut rng);
            assert_eq!(tile, TileRef::new(0, Coord::new(1, 0), 0));
        }
    }

    #[test]
    fn empty_pattern_erases() {
        let ts = tile_set(1.0, 1.0);
        let mut rng = SmallRng::seed_from_u64(3);
        assert_eq!(
            random_tile(&ts, 0, &TerrainPattern::EMPTY, &mut rng),
            TileRef::EMPTY
        );
    }
}
