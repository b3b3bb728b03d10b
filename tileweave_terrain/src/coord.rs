// Copyright 2025 the Tileweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Integer grid coordinates.

use core::fmt;
use core::ops::{Add, Mul, Sub};

/// Integer coordinate of a grid cell (or of an atlas tile, or of a quadrant).
///
/// Ordering is lexicographic on `(x, y)`, which is the order used for
/// deterministic iteration throughout the workspace.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coord {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Coord {
    /// The origin.
    pub const ZERO: Self = Self::new(0, 0);
    /// Sentinel used for "no atlas coordinate".
    pub const INVALID: Self = Self::new(-1, -1);

    /// Create a coordinate.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Component-wise floor division.
    ///
    /// Rounds toward negative infinity, so `(-1, -1)` and `(-16, -16)` share a
    /// bucket of size 16.
    pub const fn div_floor(self, size: i32) -> Self {
        debug_assert!(size > 0, "bucket size must be positive");
        Self::new(self.x.div_euclid(size), self.y.div_euclid(size))
    }

    /// Component-wise minimum.
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y))
    }

    /// Component-wise maximum.
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y))
    }
}

impl Add for Coord {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Coord {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<i32> for Coord {
    type Output = Self;

    fn mul(self, rhs: i32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl From<(i32, i32)> for Coord {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_division_rounds_toward_negative_infinity() {
        assert_eq!(Coord::new(-1, -1).div_floor(16), Coord::new(-1, -1));
        assert_eq!(Coord::new(-16, -16).div_floor(16), Coord::new(-1, -1));
        assert_eq!(Coord::new(-17, 15).div_floor(16), Coord::new(-2, 0));
        assert_eq!(Coord::new(0, 0).div_floor(16), Coord::ZERO);
        assert_eq!(Coord::new(16, 0).div_floor(16), Coord::new(1, 0));
    }

    #[test]
    fn ordering_is_x_then_y() {
        assert!(Coord::new(0, 5) < Coord::new(1, 0));
        assert!(Coord::new(1, 0) < Coord::new(1, 1));
    }
}
