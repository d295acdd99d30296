//! Small geometry toolkit shared by the packers and the hull extractor.
//!
//! - `Vec2`: f32 euclid vector used by the overlap test and convex hulls
//! - `Rotation`: the four cardinal CCW rotations and their coordinate mapping
//! - integer helpers: `next_power_of_two`, `round_up`

use serde::{Deserialize, Serialize};
use std::fmt;

/// 2D point/vector in floating point sprite space.
pub type Vec2 = euclid::default::Vector2D<f32>;

pub use euclid::vec2;

/// Counter-clockwise perpendicular `(-y, x)`.
#[inline]
pub fn perp(v: Vec2) -> Vec2 {
    vec2(-v.y, v.x)
}

/// Counter-clockwise rotation applied to a sprite when placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [Rotation::R0, Rotation::R90, Rotation::R180, Rotation::R270];

    pub fn degrees(self) -> u32 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 90,
            Rotation::R180 => 180,
            Rotation::R270 => 270,
        }
    }

    pub fn from_degrees(degrees: u32) -> Option<Rotation> {
        match degrees {
            0 => Some(Rotation::R0),
            90 => Some(Rotation::R90),
            180 => Some(Rotation::R180),
            270 => Some(Rotation::R270),
            _ => None,
        }
    }

    /// True for 90/270 where width and height trade places.
    #[inline]
    pub fn swaps_axes(self) -> bool {
        matches!(self, Rotation::R90 | Rotation::R270)
    }

    /// Dimensions of a `width x height` rectangle after this rotation.
    #[inline]
    pub fn apply_size(self, width: u32, height: u32) -> (u32, u32) {
        if self.swaps_axes() {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Maps `(x, y)` inside a `width x height` rectangle to its position in the rotated rectangle.
    ///
    /// - 90:  `(y, width-1-x)`
    /// - 180: `(width-1-x, height-1-y)`
    /// - 270: `(height-1-y, x)`
    ///
    /// `(x, y)` must lie inside the rectangle.
    #[inline]
    pub fn apply(self, x: u32, y: u32, width: u32, height: u32) -> (u32, u32) {
        debug_assert!(x < width && y < height);
        match self {
            Rotation::R0 => (x, y),
            Rotation::R90 => (y, width - 1 - x),
            Rotation::R180 => (width - 1 - x, height - 1 - y),
            Rotation::R270 => (height - 1 - y, x),
        }
    }
}

impl From<Rotation> for u32 {
    fn from(r: Rotation) -> u32 {
        r.degrees()
    }
}

impl TryFrom<u32> for Rotation {
    type Error = String;
    fn try_from(v: u32) -> Result<Self, Self::Error> {
        Rotation::from_degrees(v).ok_or_else(|| format!("invalid rotation: {v}"))
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.degrees())
    }
}

/// Smallest power of two `>= v` (1 for `v <= 1`).
pub fn next_power_of_two(mut v: u32) -> u32 {
    if v <= 1 {
        return 1;
    }
    v -= 1;
    v |= v >> 1;
    v |= v >> 2;
    v |= v >> 4;
    v |= v >> 8;
    v |= v >> 16;
    v + 1
}

#[inline]
pub fn is_power_of_two(v: u32) -> bool {
    v != 0 && (v & (v - 1)) == 0
}

/// Rounds `x` up to the next multiple of `multiple`.
#[inline]
pub fn round_up(x: u32, multiple: u32) -> u32 {
    x.div_ceil(multiple) * multiple
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pow2_edges() {
        assert_eq!(next_power_of_two(0), 1);
        assert_eq!(next_power_of_two(1), 1);
        assert_eq!(next_power_of_two(2), 2);
        assert_eq!(next_power_of_two(3), 4);
        assert_eq!(next_power_of_two(117), 128);
        assert_eq!(next_power_of_two(128), 128);
        assert_eq!(next_power_of_two(129), 256);
    }

    #[test]
    fn round_up_to_multiple() {
        assert_eq!(round_up(0, 16), 0);
        assert_eq!(round_up(1, 16), 16);
        assert_eq!(round_up(16, 16), 16);
        assert_eq!(round_up(17, 16), 32);
    }

    #[test]
    fn rotate_corners() {
        // 4x2 rectangle, top-left corner
        assert_eq!(Rotation::R90.apply(0, 0, 4, 2), (0, 3));
        assert_eq!(Rotation::R180.apply(0, 0, 4, 2), (3, 1));
        assert_eq!(Rotation::R270.apply(0, 0, 4, 2), (1, 0));
        assert_eq!(Rotation::R0.apply(3, 1, 4, 2), (3, 1));
    }

    #[test]
    fn perp_turns_counter_clockwise() {
        assert_eq!(perp(vec2(1.0, 0.0)), vec2(0.0, 1.0));
        assert_eq!(perp(vec2(3.0, 4.0)).dot(vec2(3.0, 4.0)), 0.0);
        assert!(Vec2::zero().try_normalize().is_none());
    }
}
