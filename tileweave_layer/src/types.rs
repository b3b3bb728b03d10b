// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public value types: tile references, transform bits, backend handles and small geometry.

use core::fmt;

use tileweave_terrain::Coord;

/// Source id meaning "no source".
pub const INVALID_SOURCE: i32 = -1;
/// Atlas coordinate meaning "no tile".
pub const INVALID_ATLAS_COORDS: Coord = Coord::INVALID;
/// Alternative id meaning "no alternative".
pub const INVALID_ALTERNATIVE: i32 = -1;

/// What a cell holds: a source, a tile inside that source, and an alternative of that tile.
///
/// The alternative id may carry [`TileTransform`] bits on top of the base alternative.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileRef {
    /// Source id in the tile set.
    pub source_id: i32,
    /// Tile coordinate inside an atlas source. Scene collections use `(0, 0)`.
    pub atlas_coords: Coord,
    /// Alternative id, possibly with transform bits.
    pub alternative: i32,
}

impl Default for TileRef {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl TileRef {
    /// The sentinel for an absent cell.
    pub const EMPTY: Self = Self {
        source_id: INVALID_SOURCE,
        atlas_coords: INVALID_ATLAS_COORDS,
        alternative: INVALID_ALTERNATIVE,
    };

    /// Create a reference.
    pub const fn new(source_id: i32, atlas_coords: Coord, alternative: i32) -> Self {
        Self {
            source_id,
            atlas_coords,
            alternative,
        }
    }

    /// Collapse a partially invalid reference into [`TileRef::EMPTY`].
    ///
    /// A reference with any sentinel field is treated as an erase.
    #[must_use]
    pub fn normalized(self) -> Self {
        if self.source_id == INVALID_SOURCE
            || self.atlas_coords == INVALID_ATLAS_COORDS
            || self.alternative == INVALID_ALTERNATIVE
        {
            Self::EMPTY
        } else {
            self
        }
    }

    /// True for the sentinel source.
    pub const fn is_empty(&self) -> bool {
        self.source_id == INVALID_SOURCE
    }

    /// Transform bits carried by the alternative id.
    pub fn transform(&self) -> TileTransform {
        TileTransform::from_alternative(self.alternative)
    }
}

impl fmt::Display for TileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.source_id, self.atlas_coords, self.alternative
        )
    }
}

bitflags::bitflags! {
    /// Flip and transpose bits stored in the high part of an alternative id.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct TileTransform: u32 {
        /// Mirror horizontally.
        const FLIP_H = 1 << 12;
        /// Mirror vertically.
        const FLIP_V = 1 << 13;
        /// Swap the axes before flipping.
        const TRANSPOSE = 1 << 14;
    }
}

impl TileTransform {
    /// Transform bits of `alternative`. Negative ids carry none.
    pub fn from_alternative(alternative: i32) -> Self {
        u32::try_from(alternative).map_or(Self::empty(), Self::from_bits_truncate)
    }

    /// `alternative` with every transform bit cleared.
    pub fn strip(alternative: i32) -> i32 {
        if alternative < 0 {
            return alternative;
        }
        #[allow(
            clippy::cast_possible_wrap,
            reason = "Transform bits all sit below bit 31."
        )]
        let mask = Self::all().bits() as i32;
        alternative & !mask
    }

    /// Legacy `flip_h + 2 * flip_v + 4 * transpose` alternative id.
    pub fn legacy_alternative(self) -> i32 {
        i32::from(self.contains(Self::FLIP_H))
            + (i32::from(self.contains(Self::FLIP_V)) << 1)
            + (i32::from(self.contains(Self::TRANSPOSE)) << 2)
    }

    /// Apply the transform to a tile-local point: transpose first, then flip.
    pub fn apply(self, p: kurbo::Point) -> kurbo::Point {
        let mut p = p;
        if self.contains(Self::TRANSPOSE) {
            p = kurbo::Point::new(p.y, p.x);
        }
        if self.contains(Self::FLIP_H) {
            p.x = -p.x;
        }
        if self.contains(Self::FLIP_V) {
            p.y = -p.y;
        }
        p
    }
}

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a backend-provided id.
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            /// The backend-provided id.
            pub const fn raw(self) -> u64 {
                self.0
            }
        }
    };
}

handle!(
    /// Backend draw item.
    CanvasItemId
);
handle!(
    /// Backend light occluder.
    OccluderId
);
handle!(
    /// Backend physics body.
    BodyId
);
handle!(
    /// Backend navigation region.
    RegionId
);
handle!(
    /// Backend navigation map.
    NavMapId
);
handle!(
    /// Backend physics space.
    SpaceId
);
handle!(
    /// Backend canvas that occluders attach to.
    CanvasId
);
handle!(
    /// Scene node spawned by the host.
    NodeId
);
handle!(
    /// Material bound to draw items.
    MaterialId
);
handle!(
    /// Atlas texture.
    TextureId
);
handle!(
    /// Packed scene that a scene tile instantiates.
    SceneId
);

/// Integer rectangle of cells.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CellRect {
    /// Top-left cell.
    pub position: Coord,
    /// Width and height in cells.
    pub size: Coord,
}

impl CellRect {
    /// The empty rectangle at the origin.
    pub const ZERO: Self = Self {
        position: Coord::ZERO,
        size: Coord::ZERO,
    };

    /// A rectangle covering exactly one cell.
    pub const fn cell(coords: Coord) -> Self {
        Self {
            position: coords,
            size: Coord::new(1, 1),
        }
    }

    /// Number of cells covered.
    pub fn area(&self) -> i64 {
        i64::from(self.size.x) * i64::from(self.size.y)
    }

    /// Whether `coords` lies inside the rectangle.
    pub fn contains(&self, coords: Coord) -> bool {
        let end = self.position + self.size;
        coords.x >= self.position.x && coords.y >= self.position.y && coords.x < end.x && coords.y < end.y
    }

    /// Grow the rectangle to also cover the cell at `coords`.
    #[must_use]
    pub fn union_cell(self, coords: Coord) -> Self {
        let start = self.position.min(coords);
        let end = (self.position + self.size).max(coords + Coord::new(1, 1));
        Self {
            position: start,
            size: end - start,
        }
    }
}

/// Linear RGBA color.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// Create a color.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Stable color for `hash`, saturated and fairly bright.
    pub fn from_hash(hash: u64, alpha: f32) -> Self {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Each channel takes one masked byte."
        )]
        let byte = |shift: u32| ((hash >> shift) & 0xFF) as u8;
        let channel = |shift: u32| 0.5 + f32::from(byte(shift)) / 512.0;
        Self::new(channel(24), channel(16), channel(8), alpha)
    }
}

impl core::ops::Mul for Color {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::new(self.r * rhs.r, self.g * rhs.g, self.b * rhs.b, self.a * rhs.a)
    }
}
