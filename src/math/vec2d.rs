// src/math/vec2d.rs

/// 2D floating-point vector.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Vec2d {
  /// X component.
  pub x: f64,
  /// Y component.
  pub y: f64,
}

impl Vec2d {
  #[inline]
  #[must_use]
  pub const fn new(x: f64, y: f64) -> Self {
    Self { x, y }
  }

  /// Magnitude of the vector.
  #[inline]
  #[must_use]
  pub fn mag(&self) -> f64 {
    (self.x * self.x + self.y * self.y).sqrt()
  }

  /// Intersection of the line through `p0`/`p1` with the line through
  /// `p2`/`p3`. Parallel lines yield `None`.
  #[inline]
  #[must_use]
  pub fn intersect(p0: Vec2d, p1: Vec2d, p2: Vec2d, p3: Vec2d) -> Option<Vec2d> {
    let s1 = Vec2d::new(p1.x - p0.x, p1.y - p0.y);
    let s2 = Vec2d::new(p3.x - p2.x, p3.y - p2.y);
    let denominator = -s2.x * s1.y + s1.x * s2.y;
    if denominator == 0.0 {
      return None;
    }
    let t = (s2.x * (p0.y - p2.y) - s2.y * (p0.x - p2.x)) / denominator;
    Some(Vec2d::new(p0.x + t * s1.x, p0.y + t * s1.y))
  }

  /// Component-wise comparison at single-precision tolerance.
  #[inline]
  #[must_use]
  pub fn almost_equals(&self, other: &Vec2d) -> bool {
    let eps = f64::from(f32::EPSILON);
    (self.x - other.x).abs() < eps && (self.y - other.y).abs() < eps
  }
}
