// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tile geometries and the neighbor relations between cells.
//!
//! Non-square shapes use the stacked layout: every other row (horizontal
//! offset axis) or column (vertical offset axis) is shifted by half a tile.

use crate::coord::Coord;
use crate::pattern::TerrainMode;

/// The sixteen directions a tile can touch a neighbor through.
///
/// Even discriminants are sides, odd discriminants are corners. Which of them
/// exist depends on the [`TileShape`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
#[allow(missing_docs, reason = "Variant names are self-describing directions.")]
pub enum CellNeighbor {
    RightSide = 0,
    RightCorner,
    BottomRightSide,
    BottomRightCorner,
    BottomSide,
    BottomCorner,
    BottomLeftSide,
    BottomLeftCorner,
    LeftSide,
    LeftCorner,
    TopLeftSide,
    TopLeftCorner,
    TopSide,
    TopCorner,
    TopRightSide,
    TopRightCorner,
}

impl CellNeighbor {
    /// Number of directions.
    pub const COUNT: usize = 16;

    /// All directions in discriminant order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::RightSide,
        Self::RightCorner,
        Self::BottomRightSide,
        Self::BottomRightCorner,
        Self::BottomSide,
        Self::BottomCorner,
        Self::BottomLeftSide,
        Self::BottomLeftCorner,
        Self::LeftSide,
        Self::LeftCorner,
        Self::TopLeftSide,
        Self::TopLeftCorner,
        Self::TopSide,
        Self::TopCorner,
        Self::TopRightSide,
        Self::TopRightCorner,
    ];

    /// Index of this direction in [`CellNeighbor::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// True for the side directions.
    pub const fn is_side(self) -> bool {
        (self as u8) % 2 == 0
    }
}

/// Shape of the tiles in a grid.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TileShape {
    /// Plain square grid.
    #[default]
    Square,
    /// Diamond tiles, rows offset by half a tile.
    Isometric,
    /// Hexagons with every other row shifted horizontally.
    HexHorizontalOffset,
    /// Hexagons with every other column shifted vertically.
    HexVerticalOffset,
}

/// Axis along which half-offset shapes shift every other line.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OffsetAxis {
    /// Odd rows are shifted right.
    Horizontal,
    /// Odd columns are shifted down.
    Vertical,
}

impl TileShape {
    /// Number of canonical peering-bit indices a constraint can carry.
    pub const fn peering_bit_count(self) -> u8 {
        match self {
            Self::Square | Self::Isometric => 3,
            Self::HexHorizontalOffset | Self::HexVerticalOffset => 5,
        }
    }

    /// The offset axis, or `None` for square grids.
    pub const fn offset_axis(self) -> Option<OffsetAxis> {
        match self {
            Self::Square => None,
            Self::Isometric | Self::HexHorizontalOffset => Some(OffsetAxis::Horizontal),
            Self::HexVerticalOffset => Some(OffsetAxis::Vertical),
        }
    }

    /// Vertical (or horizontal, for vertical offset) overlap between rows.
    ///
    /// Square tiles do not overlap, hexagons overlap by a quarter, diamonds by half.
    pub const fn overlapping_ratio(self) -> f64 {
        match self {
            Self::Square => 1.0,
            Self::Isometric => 0.5,
            Self::HexHorizontalOffset | Self::HexVerticalOffset => 0.75,
        }
    }

    /// Whether a cell of this shape has a neighbor in direction `neighbor`.
    pub const fn is_existing_neighbor(self, neighbor: CellNeighbor) -> bool {
        use CellNeighbor as N;
        match self {
            Self::Square => matches!(
                neighbor,
                N::RightSide
                    | N::BottomRightCorner
                    | N::BottomSide
                    | N::BottomLeftCorner
                    | N::LeftSide
                    | N::TopLeftCorner
                    | N::TopSide
                    | N::TopRightCorner
            ),
            Self::Isometric => matches!(
                neighbor,
                N::RightCorner
                    | N::BottomRightSide
                    | N::BottomCorner
                    | N::BottomLeftSide
                    | N::LeftCorner
                    | N::TopLeftSide
                    | N::TopCorner
                    | N::TopRightSide
            ),
            Self::HexHorizontalOffset => matches!(
                neighbor,
                N::RightSide
                    | N::BottomRightSide
                    | N::BottomLeftSide
                    | N::LeftSide
                    | N::TopLeftSide
                    | N::TopRightSide
            ),
            Self::HexVerticalOffset => matches!(
                neighbor,
                N::BottomRightSide
                    | N::BottomSide
                    | N::BottomLeftSide
                    | N::TopLeftSide
                    | N::TopSide
                    | N::TopRightSide
            ),
        }
    }

    /// Whether `bit` is a terrain peering bit for tiles of this shape in `mode`.
    pub const fn is_valid_peering_bit(self, mode: TerrainMode, bit: CellNeighbor) -> bool {
        use CellNeighbor as N;
        let sides = matches!(
            mode,
            TerrainMode::MatchCornersAndSides | TerrainMode::MatchSides
        );
        let corners = matches!(
            mode,
            TerrainMode::MatchCornersAndSides | TerrainMode::MatchCorners
        );
        match self {
            Self::Square => {
                (sides && matches!(bit, N::RightSide | N::BottomSide | N::LeftSide | N::TopSide))
                    || (corners
                        && matches!(
                            bit,
                            N::BottomRightCorner
                                | N::BottomLeftCorner
                                | N::TopLeftCorner
                                | N::TopRightCorner
                        ))
            }
            Self::Isometric => {
                (sides
                    && matches!(
                        bit,
                        N::BottomRightSide | N::BottomLeftSide | N::TopLeftSide | N::TopRightSide
                    ))
                    || (corners
                        && matches!(
                            bit,
                            N::RightCorner | N::BottomCorner | N::LeftCorner | N::TopCorner
                        ))
            }
            Self::HexHorizontalOffset => {
                (sides
                    && matches!(
                        bit,
                        N::RightSide
                            | N::BottomRightSide
                            | N::BottomLeftSide
                            | N::LeftSide
                            | N::TopLeftSide
                            | N::TopRightSide
                    ))
                    || (corners
                        && matches!(
                            bit,
                            N::BottomRightCorner
                                | N::BottomCorner
                                | N::BottomLeftCorner
                                | N::TopLeftCorner
                                | N::TopCorner
                                | N::TopRightCorner
                        ))
            }
            Self::HexVerticalOffset => {
                (sides
                    && matches!(
                        bit,
                        N::BottomRightSide
                            | N::BottomSide
                            | N::BottomLeftSide
                            | N::TopLeftSide
                            | N::TopSide
                            | N::TopRightSide
                    ))
                    || (corners
                        && matches!(
                            bit,
                            N::RightCorner
                                | N::BottomRightCorner
                                | N::BottomLeftCorner
                                | N::LeftCorner
                                | N::TopLeftCorner
                                | N::TopRightCorner
                        ))
            }
        }
    }

    /// The cell adjacent to `coords` in direction `neighbor`.
    ///
    /// Returns `None` when the shape has no neighbor in that direction.
    pub fn neighbor_cell(self, coords: Coord, neighbor: CellNeighbor) -> Option<Coord> {
        use CellNeighbor as N;
        let offset = match self {
            Self::Square => match neighbor {
                N::RightSide => Coord::new(1, 0),
                N::BottomRightCorner => Coord::new(1, 1),
                N::BottomSide => Coord::new(0, 1),
                N::BottomLeftCorner => Coord::new(-1, 1),
                N::LeftSide => Coord::new(-1, 0),
                N::TopLeftCorner => Coord::new(-1, -1),
                N::TopSide => Coord::new(0, -1),
                N::TopRightCorner => Coord::new(1, -1),
                _ => return None,
            },
            Self::Isometric | Self::HexHorizontalOffset => {
                let iso = matches!(self, Self::Isometric);
                let shifted = coords.y % 2 != 0;
                match neighbor {
                    N::RightCorner if iso => Coord::new(1, 0),
                    N::RightSide if !iso => Coord::new(1, 0),
                    N::BottomRightSide => Coord::new(i32::from(shifted), 1),
                    N::BottomCorner if iso => Coord::new(0, 2),
                    N::BottomLeftSide => Coord::new(if shifted { 0 } else { -1 }, 1),
                    N::LeftCorner if iso => Coord::new(-1, 0),
                    N::LeftSide if !iso => Coord::new(-1, 0),
                    N::TopLeftSide => Coord::new(if shifted { 0 } else { -1 }, -1),
                    N::TopCorner if iso => Coord::new(0, -2),
                    N::TopRightSide => Coord::new(i32::from(shifted), -1),
                    _ => return None,
                }
            }
            Self::HexVerticalOffset => {
                let shifted = coords.x % 2 != 0;
                match neighbor {
                    N::BottomSide => Coord::new(0, 1),
                    N::BottomRightSide => Coord::new(1, i32::from(shifted)),
                    N::TopRightSide => Coord::new(1, if shifted { 0 } else { -1 }),
                    N::TopSide => Coord::new(0, -1),
                    N::TopLeftSide => Coord::new(-1, if shifted { 0 } else { -1 }),
                    N::BottomLeftSide => Coord::new(-1, i32::from(shifted)),
                    _ => return None,
                }
            }
        };
        Some(coords + offset)
    }

    /// Neighbor lookup for directions the tables guarantee to exist.
    pub(crate) fn neighbor(self, coords: Coord, neighbor: CellNeighbor) -> Coord {
        self.neighbor_cell(coords, neighbor).unwrap_or(coords)
    }

    /// Where a cell of a pattern lands when the pattern is placed at `position`.
    ///
    /// Half-offset shapes shift cells whose row (or column) parity would otherwise
    /// flip when both the placement and the cell sit on odd lines.
    pub fn map_pattern(self, position: Coord, coords_in_pattern: Coord) -> Coord {
        let mut out = position + coords_in_pattern;
        match self.offset_axis() {
            Some(OffsetAxis::Horizontal) => {
                if position.y % 2 != 0 && coords_in_pattern.y % 2 != 0 {
                    out.x += 1;
                }
            }
            Some(OffsetAxis::Vertical) => {
                if position.x % 2 != 0 && coords_in_pattern.x % 2 != 0 {
                    out.y += 1;
                }
            }
            None => {}
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sides_are_even() {
        assert!(CellNeighbor::RightSide.is_side());
        assert!(!CellNeighbor::RightCorner.is_side());
        assert!(CellNeighbor::TopRightSide.is_side());
        assert_eq!(CellNeighbor::ALL[13], CellNeighbor::TopCorner);
    }

    #[test]
    fn square_neighbors() {
        let s = TileShape::Square;
        let c = Coord::new(3, 3);
        assert_eq!(s.neighbor_cell(c, CellNeighbor::RightSide), Some(Coord::new(4, 3)));
        assert_eq!(s.neighbor_cell(c, CellNeighbor::TopLeftCorner), Some(Coord::new(2, 2)));
        assert_eq!(s.neighbor_cell(c, CellNeighbor::RightCorner), None);
    }

    #[test]
    fn horizontal_offset_neighbors_depend_on_row_parity() {
        let s = TileShape::HexHorizontalOffset;
        assert_eq!(
            s.neighbor_cell(Coord::new(0, 0), CellNeighbor::BottomRightSide),
            Some(Coord::new(0, 1))
        );
        assert_eq!(
            s.neighbor_cell(Coord::new(0, 1), CellNeighbor::BottomRightSide),
            Some(Coord::new(1, 2))
        );
        assert_eq!(
            s.neighbor_cell(Coord::new(0, -1), CellNeighbor::TopLeftSide),
            Some(Coord::new(0, -2))
        );
        assert_eq!(s.neighbor_cell(Coord::new(0, 0), CellNeighbor::BottomSide), None);
    }

    #[test]
    fn isometric_corners_skip_a_row() {
        let s = TileShape::Isometric;
        assert_eq!(
            s.neighbor_cell(Coord::new(2, 2), CellNeighbor::BottomCorner),
            Some(Coord::new(2, 4))
        );
        assert_eq!(
            s.neighbor_cell(Coord::new(2, 2), CellNeighbor::RightCorner),
            Some(Coord::new(3, 2))
        );
        assert_eq!(s.neighbor_cell(Coord::new(2, 2), CellNeighbor::RightSide), None);
    }

    #[test]
    fn vertical_offset_neighbors_depend_on_column_parity() {
        let s = TileShape::HexVerticalOffset;
        assert_eq!(
            s.neighbor_cell(Coord::new(1, 0), CellNeighbor::BottomRightSide),
            Some(Coord::new(2, 1))
        );
        assert_eq!(
            s.neighbor_cell(Coord::new(0, 0), CellNeighbor::BottomRightSide),
            Some(Coord::new(1, 0))
        );
    }

    #[test]
    fn valid_bits_follow_mode() {
        let s = TileShape::Square;
        assert!(s.is_valid_peering_bit(TerrainMode::MatchSides, CellNeighbor::LeftSide));
        assert!(!s.is_valid_peering_bit(TerrainMode::MatchSides, CellNeighbor::TopLeftCorner));
        assert!(s.is_valid_peering_bit(TerrainMode::MatchCorners, CellNeighbor::TopLeftCorner));
        assert!(!s.is_valid_peering_bit(TerrainMode::MatchCornersAndSides, CellNeighbor::TopCorner));
    }

    #[test]
    fn map_pattern_shifts_odd_rows() {
        let s = TileShape::HexHorizontalOffset;
        assert_eq!(s.map_pattern(Coord::new(0, 1), Coord::new(0, 1)), Coord::new(1, 2));
        assert_eq!(s.map_pattern(Coord::new(0, 2), Coord::new(0, 1)), Coord::new(0, 3));
        assert_eq!(
            TileShape::Square.map_pattern(Coord::new(0, 1), Coord::new(0, 1)),
            Coord::new(0, 2)
        );
    }
}
