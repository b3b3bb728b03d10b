// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint a few frames into a headless layer and print what each pass did.

use std::sync::Arc;

use kurbo::{Point, Size};
use tileweave_layer::{
    AtlasSource, AtlasTile, CollisionPolygon, Coord, HeadlessServers, PhysicsLayer, TileData,
    TileLayer, TileRef, TileSet, TileSource,
};

fn main() {
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
        .with_tile(Coord::new(0, 0), AtlasTile::new(TileData::default()))
        .with_tile(Coord::new(1, 0), AtlasTile::new(wall));
    let tile_set = TileSet::builder()
        .tile_size(Size::new(16.0, 16.0))
        .source(0, TileSource::Atlas(atlas))
        .physics_layer(PhysicsLayer::default())
        .build();

    let floor = TileRef::new(0, Coord::new(0, 0), 0);
    let wall = TileRef::new(0, Coord::new(1, 0), 0);

    let mut servers = HeadlessServers::new();
    let world = servers.create_world();
    let mut layer = TileLayer::new(servers);
    layer.set_tile_set(Some(Arc::new(tile_set)));
    layer.enter_tree(world);

    // Frame 1: a 40x40 room, walls on the border.
    for y in 0..40 {
        for x in 0..40 {
            let border = x == 0 || y == 0 || x == 39 || y == 39;
            layer.set_cell(Coord::new(x, y), if border { wall } else { floor });
        }
    }
    if let Some(report) = layer.process() {
        println!("frame 1: {report:?}");
    }

    // Frame 2: knock a door into the wall.
    layer.set_cell(Coord::new(20, 0), floor);
    if let Some(report) = layer.process() {
        println!("frame 2: {report:?}");
    }

    // Frame 3: nothing changed, nothing to do.
    println!("frame 3: {:?}", layer.process());

    println!(
        "{} quadrants, {} bodies, {} live backend objects",
        layer.quadrant_count(),
        layer.body_count(),
        layer.servers().live_objects()
    );
}
