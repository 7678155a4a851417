//! Fixed-point positions and distances.
//!
//! Every position, distance and speed in the simulation is an `I32F32`, so
//! two machines fed the same commands compute bit-identical worlds.

use std::ops::{Add, Sub};

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Simulation scalar: 32 integer bits, 32 fractional bits.
pub type Fixed = I32F32;

/// Point or offset on the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_bits")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_bits")]
    pub y: Fixed,
}

/// Serde adapter storing a [`Fixed`] as its raw `i64` bits, so encoded
/// values decode to exactly the same number.
pub mod fixed_bits {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Write the raw bits.
    pub fn serialize<S: Serializer>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.to_bits())
    }

    /// Read the raw bits.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Fixed, D::Error> {
        i64::deserialize(deserializer).map(Fixed::from_bits)
    }
}

impl Vec2Fixed {
    /// The origin.
    pub const ZERO: Self = Self::new(Fixed::ZERO, Fixed::ZERO);

    /// Point from fixed coordinates.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Point at whole world units.
    #[must_use]
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Squared distance. Saturates at [`Fixed::MAX`] for points too far
    /// apart to square.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let d = self - other;
        d.x.saturating_mul(d.x).saturating_add(d.y.saturating_mul(d.y))
    }

    /// Euclidean distance.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        sqrt(self.distance_squared(other))
    }

    /// `other` is no farther than `radius` away. Compares squares, no root.
    #[must_use]
    pub fn within(self, other: Self, radius: Fixed) -> bool {
        self.distance_squared(other) <= radius.saturating_mul(radius)
    }

    /// Distance from the origin.
    #[must_use]
    pub fn length(self) -> Fixed {
        self.distance(Self::ZERO)
    }

    /// Both coordinates times `factor`.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Same direction, length one. The zero vector stays zero.
    #[must_use]
    pub fn normalize(self) -> Self {
        match self.length() {
            len if len == Fixed::ZERO => Self::ZERO,
            len => Self::new(self.x / len, self.y / len),
        }
    }

    /// One step of at most `step` toward `target`.
    ///
    /// Snaps onto `target` once it is within a step, so arrival checks
    /// with small radii settle instead of overshooting back and forth.
    #[must_use]
    pub fn move_towards(self, target: Self, step: Fixed) -> Self {
        let delta = target - self;
        let remaining = delta.length();
        if remaining <= step {
            target
        } else {
            self + delta.scale(step / remaining)
        }
    }

    /// Both coordinates clamped into `[0, max]`.
    #[must_use]
    pub fn clamp_to(self, max: Fixed) -> Self {
        Self::new(self.x.clamp(Fixed::ZERO, max), self.y.clamp(Fixed::ZERO, max))
    }
}

impl Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Floor square root, exact to the last fractional bit.
///
/// For raw bits `v` the value is `v / 2^32`, so its root has raw bits
/// `isqrt(v * 2^32)`.
fn sqrt(value: Fixed) -> Fixed {
    let bits = value.to_bits();
    if bits <= 0 {
        return Fixed::ZERO;
    }
    let root = isqrt(u128::from(bits.unsigned_abs()) << 32);
    Fixed::from_bits(i64::try_from(root).unwrap_or(i64::MAX))
}

/// Integer floor square root by Newton's method.
fn isqrt(n: u128) -> u128 {
    if n < 2 {
        return n;
    }
    let bits = 128 - n.leading_zeros();
    let mut x = 1u128 << ((bits + 1) / 2);
    loop {
        let next = (x + n / x) / 2;
        if next >= x {
            return x;
        }
        x = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(x: i32, y: i32) -> Vec2Fixed {
        Vec2Fixed::from_ints(x, y)
    }

    #[test]
    fn test_isqrt_floors() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(15), 3);
        assert_eq!(isqrt(16), 4);
        assert_eq!(isqrt(u128::from(u64::MAX)), u128::from(u32::MAX));
    }

    #[test]
    fn test_distance_is_exact_for_whole_triangles() {
        assert_eq!(pos(0, 0).distance(pos(30, 40)), Fixed::from_num(50));
        assert_eq!(pos(3, 0).distance_squared(pos(0, 4)), Fixed::from_num(25));
    }

    #[test]
    fn test_sqrt_of_fraction() {
        let root = sqrt(Fixed::from_num(0.25));
        assert_eq!(root, Fixed::from_num(0.5));
    }

    #[test]
    fn test_within_is_inclusive() {
        assert!(pos(0, 0).within(pos(5, 0), Fixed::from_num(5)));
        assert!(!pos(0, 0).within(pos(6, 0), Fixed::from_num(5)));
    }

    #[test]
    fn test_move_towards_snaps_within_a_step() {
        assert_eq!(pos(0, 0).move_towards(pos(3, 4), Fixed::from_num(10)), pos(3, 4));
    }

    #[test]
    fn test_move_towards_partial_step() {
        let next = pos(0, 0).move_towards(pos(100, 0), Fixed::from_num(25));
        assert_eq!(next, pos(25, 0));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(pos(0, 0).normalize(), Vec2Fixed::ZERO);
        let v = pos(3, 4).normalize();
        assert!((v.length() - Fixed::ONE).abs() < Fixed::from_num(0.001));
    }

    #[test]
    fn test_far_points_saturate() {
        let a = pos(-2_000_000, -2_000_000);
        let b = pos(2_000_000, 2_000_000);
        assert_eq!(a.distance_squared(b), Fixed::MAX);
    }

    #[test]
    fn test_clamp_to_field() {
        let max = Fixed::from_num(2000);
        assert_eq!(pos(-10, 2500).clamp_to(max), pos(0, 2000));
    }

    #[test]
    fn test_bits_survive_json() {
        let v = Vec2Fixed::new(Fixed::from_num(1) / Fixed::from_num(3), Fixed::from_num(-7));
        let text = serde_json::to_string(&v).unwrap();
        assert_eq!(serde_json::from_str::<Vec2Fixed>(&text).unwrap(), v);
    }
}
