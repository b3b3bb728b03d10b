// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::Arc;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use kurbo::Size;
use tileweave_layer::{
    AtlasSource, AtlasTile, CellNeighbor, Coord, HeadlessServers, TerrainMode, TerrainPattern,
    TerrainSet, TileData, TileLayer, TileSet, TileSource,
};

/// One tile for every combination of the four sides, like a 16-tile blob set.
fn tile_set() -> Arc<TileSet> {
    let sides = [
        CellNeighbor::RightSide,
        CellNeighbor::BottomSide,
        CellNeighbor::LeftSide,
        CellNeighbor::TopSide,
    ];
    let mut atlas = AtlasSource::new(None, Size::new(16.0, 16.0));
    for mask in 0..16_i32 {
        let mut pattern = TerrainPattern::with_center(0);
        for (i, side) in sides.iter().enumerate() {
            if mask & (1 << i) != 0 {
                pattern.set_peering_bit(*side, 0);
            }
        }
        atlas = atlas.with_tile(
            Coord::new(mask, 0),
            AtlasTile::new(TileData::default().with_terrain(0, pattern)),
        );
    }
    Arc::new(
        TileSet::builder()
            .tile_size(Size::new(16.0, 16.0))
            .source(0, TileSource::Atlas(atlas))
            .terrain_set(TerrainSet {
                mode: TerrainMode::MatchSides,
                terrains: Vec::new(),
            })
            .build(),
    )
}

fn block(n: i32) -> Vec<Coord> {
    (0..n)
        .flat_map(|y| (0..n).map(move |x| Coord::new(x, y)))
        .collect()
}

fn bench_connect(c: &mut Criterion) {
    let tile_set = tile_set();
    let mut group = c.benchmark_group("terrain_connect");
    for &n in &[4_i32, 16, 32] {
        let cells = block(n);
        group.bench_function(format!("block_n{n}"), |b| {
            b.iter_batched(
                || {
                    let mut layer = TileLayer::new(HeadlessServers::new());
                    layer.set_tile_set(Some(tile_set.clone()));
                    layer
                },
                |mut layer| {
                    let _ = layer.set_cells_terrain_connect(&cells, 0, 0, false);
                    black_box(layer.used_cells().len())
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_path(c: &mut Criterion) {
    let tile_set = tile_set();
    let mut layer = TileLayer::new(HeadlessServers::new());
    layer.set_tile_set(Some(tile_set));
    let path: Vec<Coord> = (0..64).map(|x| Coord::new(x, x / 8)).collect();
    // Consecutive cells must be neighbors; fill the steps in.
    let mut stepped = Vec::with_capacity(path.len() * 2);
    for w in path.windows(2) {
        stepped.push(w[0]);
        if w[0].y != w[1].y {
            stepped.push(Coord::new(w[0].x, w[1].y));
        }
    }
    stepped.extend(path.last());
    c.bench_function("terrain_fill_path_64", |b| {
        b.iter(|| black_box(layer.terrain_fill_path(&stepped, 0, 0, false)));
    });
}

criterion_group!(benches, bench_connect, bench_path);
criterion_main!(benches);
