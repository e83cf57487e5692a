// src/grids/h3/ijk.rs

use crate::constants::{M_ONESEVENTH, M_RSIN60, M_SQRT3_2};
use crate::math::Vec2d;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "serde")]
use serde_repr::{Deserialize_repr, Serialize_repr};

/// H3 digit representing IJK+ axes direction (0-6), or invalid (7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Hash, Default)]
#[repr(u8)]
#[cfg_attr(feature = "serde", derive(Serialize_repr, Deserialize_repr))]
pub enum Direction {
  /// H3 digit in center.
  #[default]
  Center = 0,
  /// H3 digit in k-axes direction.
  KAxes = 1,
  /// H3 digit in j-axes direction.
  JAxes = 2,
  /// H3 digit in j == k direction.
  JkAxes = 3,
  /// H3 digit in i-axes direction.
  IAxes = 4,
  /// H3 digit in i == k direction.
  IkAxes = 5,
  /// H3 digit in i == j direction.
  IjAxes = 6,
  /// H3 digit in the invalid direction.
  InvalidDigit = 7,
}

impl Direction {
  /// Digit from its 3-bit value.
  #[inline]
  #[must_use]
  pub fn from_bits(value: u64) -> Direction {
    match value & 7 {
      0 => Direction::Center,
      1 => Direction::KAxes,
      2 => Direction::JAxes,
      3 => Direction::JkAxes,
      4 => Direction::IAxes,
      5 => Direction::IkAxes,
      6 => Direction::IjAxes,
      _ => Direction::InvalidDigit,
    }
  }

  /// Rotates the digit 60 degrees counter-clockwise.
  #[inline]
  #[must_use]
  pub fn rotate60_ccw(self) -> Direction {
    match self {
      Direction::KAxes => Direction::IkAxes,
      Direction::IkAxes => Direction::IAxes,
      Direction::IAxes => Direction::IjAxes,
      Direction::IjAxes => Direction::JAxes,
      Direction::JAxes => Direction::JkAxes,
      Direction::JkAxes => Direction::KAxes,
      other => other,
    }
  }

  /// Rotates the digit 60 degrees clockwise.
  #[inline]
  #[must_use]
  pub fn rotate60_cw(self) -> Direction {
    match self {
      Direction::KAxes => Direction::JkAxes,
      Direction::JkAxes => Direction::JAxes,
      Direction::JAxes => Direction::IjAxes,
      Direction::IjAxes => Direction::IAxes,
      Direction::IAxes => Direction::IkAxes,
      Direction::IkAxes => Direction::KAxes,
      other => other,
    }
  }
}

/// IJK hexagon coordinates. Each axis is spaced 120 degrees apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CoordIJK {
  /// I component.
  pub i: i32,
  /// J component.
  pub j: i32,
  /// K component.
  pub k: i32,
}

/// IJK unit vectors corresponding to the 7 H3 digits (0-6).
#[rustfmt::skip]
pub(crate) const UNIT_VECS: [CoordIJK; 7] = [
    CoordIJK { i: 0, j: 0, k: 0 },  // center
    CoordIJK { i: 0, j: 0, k: 1 },  // k
    CoordIJK { i: 0, j: 1, k: 0 },  // j
    CoordIJK { i: 0, j: 1, k: 1 },  // jk
    CoordIJK { i: 1, j: 0, k: 0 },  // i
    CoordIJK { i: 1, j: 0, k: 1 },  // ik
    CoordIJK { i: 1, j: 1, k: 0 },  // ij
];

impl CoordIJK {
  #[inline]
  #[must_use]
  pub const fn new(i: i32, j: i32, k: i32) -> Self {
    Self { i, j, k }
  }

  #[inline]
  #[must_use]
  pub fn add(&self, o: &CoordIJK) -> CoordIJK {
    CoordIJK::new(self.i + o.i, self.j + o.j, self.k + o.k)
  }

  #[inline]
  #[must_use]
  pub fn sub(&self, o: &CoordIJK) -> CoordIJK {
    CoordIJK::new(self.i - o.i, self.j - o.j, self.k - o.k)
  }

  #[inline]
  pub fn scale(&mut self, factor: i32) {
    self.i *= factor;
    self.j *= factor;
    self.k *= factor;
  }

  /// Sets the components to their smallest non-negative representation.
  #[inline]
  pub fn normalize(&mut self) {
    if self.i < 0 {
      self.j -= self.i;
      self.k -= self.i;
      self.i = 0;
    }
    if self.j < 0 {
      self.i -= self.j;
      self.k -= self.j;
      self.j = 0;
    }
    if self.k < 0 {
      self.i -= self.k;
      self.j -= self.k;
      self.k = 0;
    }
    let min = self.i.min(self.j).min(self.k);
    if min > 0 {
      self.i -= min;
      self.j -= min;
      self.k -= min;
    }
  }

  /// Digit of a unit vector (or the zero vector), `InvalidDigit` otherwise.
  #[must_use]
  pub fn to_digit(&self) -> Direction {
    let mut c = *self;
    c.normalize();
    UNIT_VECS
      .iter()
      .position(|u| *u == c)
      .map_or(Direction::InvalidDigit, |p| Direction::from_bits(p as u64))
  }

  /// Moves to the neighbouring hex in the given digit direction.
  #[inline]
  pub fn neighbor(&mut self, digit: Direction) {
    if digit != Direction::Center && digit != Direction::InvalidDigit {
      *self = self.add(&UNIT_VECS[digit as usize]);
      self.normalize();
    }
  }

  /// Combines the three axis images of a linear map and normalizes.
  #[inline]
  fn apply(&mut self, iv: CoordIJK, jv: CoordIJK, kv: CoordIJK) {
    let (i, j, k) = (self.i, self.j, self.k);
    self.i = iv.i * i + jv.i * j + kv.i * k;
    self.j = iv.j * i + jv.j * j + kv.j * k;
    self.k = iv.k * i + jv.k * j + kv.k * k;
    self.normalize();
  }

  /// Parent in a counter-clockwise aperture 7 grid (Class III).
  #[inline]
  pub fn up_ap7(&mut self) {
    let i = f64::from(self.i - self.k);
    let j = f64::from(self.j - self.k);
    self.i = ((3.0 * i - j) * M_ONESEVENTH).round() as i32;
    self.j = ((i + 2.0 * j) * M_ONESEVENTH).round() as i32;
    self.k = 0;
    self.normalize();
  }

  /// Parent in a clockwise aperture 7 grid (Class II).
  #[inline]
  pub fn up_ap7r(&mut self) {
    let i = f64::from(self.i - self.k);
    let j = f64::from(self.j - self.k);
    self.i = ((2.0 * i + j) * M_ONESEVENTH).round() as i32;
    self.j = ((3.0 * j - i) * M_ONESEVENTH).round() as i32;
    self.k = 0;
    self.normalize();
  }

  /// Center child at the next finer counter-clockwise aperture 7 resolution.
  #[inline]
  pub fn down_ap7(&mut self) {
    self.apply(CoordIJK::new(3, 0, 1), CoordIJK::new(1, 3, 0), CoordIJK::new(0, 1, 3));
  }

  /// Center child at the next finer clockwise aperture 7 resolution.
  #[inline]
  pub fn down_ap7r(&mut self) {
    self.apply(CoordIJK::new(3, 1, 0), CoordIJK::new(0, 3, 1), CoordIJK::new(1, 0, 3));
  }

  /// Center hex at the next finer counter-clockwise aperture 3 resolution.
  #[inline]
  pub fn down_ap3(&mut self) {
    self.apply(CoordIJK::new(2, 0, 1), CoordIJK::new(1, 2, 0), CoordIJK::new(0, 1, 2));
  }

  /// Center hex at the next finer clockwise aperture 3 resolution.
  #[inline]
  pub fn down_ap3r(&mut self) {
    self.apply(CoordIJK::new(2, 1, 0), CoordIJK::new(0, 2, 1), CoordIJK::new(1, 0, 2));
  }

  #[inline]
  pub fn rotate60_ccw(&mut self) {
    self.apply(CoordIJK::new(1, 1, 0), CoordIJK::new(0, 1, 1), CoordIJK::new(1, 0, 1));
  }

  #[inline]
  pub fn rotate60_cw(&mut self) {
    self.apply(CoordIJK::new(1, 0, 1), CoordIJK::new(1, 1, 0), CoordIJK::new(0, 1, 1));
  }

  /// Center point of the hex in 2D cartesian coordinates.
  #[inline]
  #[must_use]
  pub fn to_hex2d(&self) -> Vec2d {
    let i = f64::from(self.i - self.k);
    let j = f64::from(self.j - self.k);
    Vec2d::new(i - 0.5 * j, j * M_SQRT3_2)
  }

  /// Containing hex of a 2D cartesian point (quantization from DGGRID).
  #[must_use]
  pub fn from_hex2d(v: &Vec2d) -> CoordIJK {
    let mut h = CoordIJK::default();
    let a1 = v.x.abs();
    let a2 = v.y.abs();

    let x2 = a2 * M_RSIN60;
    let x1 = a1 + x2 / 2.0;

    let m1 = x1 as i32;
    let m2 = x2 as i32;

    let r1 = x1 - f64::from(m1);
    let r2 = x2 - f64::from(m2);

    if r1 < 0.5 {
      if r1 < 1.0 / 3.0 {
        h.i = m1;
        h.j = if r2 < (1.0 + r1) / 2.0 { m2 } else { m2 + 1 };
      } else {
        h.j = if r2 < 1.0 - r1 { m2 } else { m2 + 1 };
        h.i = if (1.0 - r1) <= r2 && r2 < 2.0 * r1 { m1 + 1 } else { m1 };
      }
    } else if r1 < 2.0 / 3.0 {
      h.j = if r2 < 1.0 - r1 { m2 } else { m2 + 1 };
      h.i = if (2.0 * r1 - 1.0) < r2 && r2 < (1.0 - r1) { m1 } else { m1 + 1 };
    } else {
      h.i = m1 + 1;
      h.j = if r2 < r1 / 2.0 { m2 } else { m2 + 1 };
    }

    // fold across the axes if necessary
    if v.x < 0.0 {
      if h.j % 2 == 0 {
        let axis_i = h.j / 2;
        let diff = h.i - axis_i;
        h.i -= 2 * diff;
      } else {
        let axis_i = (h.j + 1) / 2;
        let diff = h.i - axis_i;
        h.i -= 2 * diff + 1;
      }
    }

    if v.y < 0.0 {
      h.i -= (2 * h.j + 1) / 2;
      h.j = -h.j;
    }

    h.normalize();
    h
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_normalize() {
    let mut c = CoordIJK::new(2, 3, 4);
    c.normalize();
    assert_eq!(c, CoordIJK::new(0, 1, 2), "min removed");
    let mut n = CoordIJK::new(-1, 0, 0);
    n.normalize();
    assert_eq!(n, CoordIJK::new(0, 1, 1), "negative i folded");
  }

  #[test]
  fn test_unit_to_digit() {
    for (d, u) in UNIT_VECS.iter().enumerate() {
      assert_eq!(u.to_digit() as usize, d, "unit vector {d}");
    }
    assert_eq!(CoordIJK::new(2, 0, 0).to_digit(), Direction::InvalidDigit);
  }

  #[test]
  fn test_hex2d_to_coord_ijk() {
    assert_eq!(CoordIJK::from_hex2d(&Vec2d::new(0.0, 0.0)), CoordIJK::new(0, 0, 0), "origin");
    assert_eq!(CoordIJK::from_hex2d(&Vec2d::new(1.0, 0.0)), CoordIJK::new(1, 0, 0), "i axis");
    assert_eq!(
      CoordIJK::from_hex2d(&Vec2d::new(-0.5, M_SQRT3_2)),
      CoordIJK::new(0, 1, 0),
      "j axis"
    );
    assert_eq!(
      CoordIJK::from_hex2d(&Vec2d::new(-0.5, -M_SQRT3_2)),
      CoordIJK::new(0, 0, 1),
      "k axis"
    );
  }

  #[test]
  fn test_hex2d_round_trip() {
    for u in &UNIT_VECS {
      let mut c = *u;
      c.scale(3);
      c.normalize();
      assert_eq!(CoordIJK::from_hex2d(&c.to_hex2d()), c, "round trip of {c:?}");
    }
  }

  #[test]
  fn test_up_down_ap7_inverse() {
    for u in &UNIT_VECS {
      let mut c = *u;
      c.down_ap7();
      c.up_ap7();
      assert_eq!(c, *u, "ccw down/up");
      let mut r = *u;
      r.down_ap7r();
      r.up_ap7r();
      assert_eq!(r, *u, "cw down/up");
    }
  }

  #[test]
  fn test_rotations_cycle() {
    let mut c = CoordIJK::new(1, 0, 0);
    for _ in 0..6 {
      c.rotate60_ccw();
    }
    assert_eq!(c, CoordIJK::new(1, 0, 0), "six ccw rotations");
    c.rotate60_ccw();
    c.rotate60_cw();
    assert_eq!(c, CoordIJK::new(1, 0, 0), "ccw then cw");
    let mut d = Direction::KAxes;
    for _ in 0..6 {
      d = d.rotate60_cw();
    }
    assert_eq!(d, Direction::KAxes);
    assert_eq!(Direction::KAxes.rotate60_ccw(), Direction::IkAxes);
  }
}
