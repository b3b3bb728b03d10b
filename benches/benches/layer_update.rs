// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::Arc;

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{Point, Size};
use tileweave_layer::{
    AtlasSource, AtlasTile, CollisionPolygon, Coord, HeadlessServers, PhysicsLayer, TileData,
    TileLayer, TileRef, TileSet, TileSource,
};

const FLOOR: TileRef = TileRef::new(0, Coord::new(0, 0), 0);
const WALL: TileRef = TileRef::new(0, Coord::new(1, 0), 0);

fn tile_set() -> Arc<TileSet> {
    let wall = TileData::default().with_collision(
        0,
        CollisionPolygon::convex(vec![
            Point::new(-8.0, -8.0),
            Point::new(8.0, -8.0),
            Point::new(8.0, 8.0),
            Point::new(-8.0, 8.0),
        ]),
    );
    let atlas = AtlasSource::new(None, Size::new(16.0, 16.0))
        .with_tile(Coord::new(0, 0), AtlasTile::new(TileData::default().with_z_index(0)))
        .with_tile(Coord::new(1, 0), AtlasTile::new(wall.with_z_index(1)));
    Arc::new(
        TileSet::builder()
            .tile_size(Size::new(16.0, 16.0))
            .source(0, TileSource::Atlas(atlas))
            .physics_layer(PhysicsLayer::default())
            .build(),
    )
}

fn filled_layer(tile_set: &Arc<TileSet>, n: i32, y_sort: bool) -> TileLayer<HeadlessServers> {
    let mut servers = HeadlessServers::new();
    let world = servers.create_world();
    let mut layer = TileLayer::new(servers);
    layer.set_tile_set(Some(tile_set.clone()));
    layer.set_y_sort_enabled(y_sort);
    layer.enter_tree(world);
    for y in 0..n {
        for x in 0..n {
            let tile = if (x * 7 + y * 3) % 5 == 0 { WALL } else { FLOOR };
            layer.set_cell(Coord::new(x, y), tile);
        }
    }
    layer
}

fn bench_full_build(c: &mut Criterion) {
    let tile_set = tile_set();
    let mut group = c.benchmark_group("full_build");
    for &n in &[32_i32, 64, 128] {
        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_function(format!("grid_n{n}"), |b| {
            b.iter_batched(
                || filled_layer(&tile_set, n, false),
                |mut layer| black_box(layer.process()),
                BatchSize::LargeInput,
            );
        });
        group.bench_function(format!("y_sort_n{n}"), |b| {
            b.iter_batched(
                || filled_layer(&tile_set, n, true),
                |mut layer| black_box(layer.process()),
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_incremental(c: &mut Criterion) {
    let tile_set = tile_set();
    let mut group = c.benchmark_group("incremental");
    for &n in &[64_i32, 256] {
        let mut layer = filled_layer(&tile_set, n, false);
        layer.process();
        let mut flip = false;
        group.bench_function(format!("one_cell_n{n}"), |b| {
            b.iter(|| {
                flip = !flip;
                layer.set_cell(Coord::new(n / 2, n / 2), if flip { WALL } else { FLOOR });
                black_box(layer.process())
            });
        });
        group.bench_function(format!("idle_n{n}"), |b| {
            b.iter(|| black_box(layer.update_internals()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_full_build, bench_incremental);
criterion_main!(benches);
