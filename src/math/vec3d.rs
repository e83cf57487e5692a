// src/math/vec3d.rs

use std::ops::{Add, Mul, Sub};

/// 3D floating-point vector, usually a point on the unit sphere.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Vec3d {
  /// X component.
  pub x: f64,
  /// Y component.
  pub y: f64,
  /// Z component.
  pub z: f64,
}

impl Vec3d {
  #[inline]
  #[must_use]
  pub const fn new(x: f64, y: f64, z: f64) -> Self {
    Self { x, y, z }
  }

  /// Unit-sphere point of a latitude/longitude in radians.
  #[inline]
  #[must_use]
  pub fn from_lat_lng_rads(lat: f64, lng: f64) -> Self {
    let r = lat.cos();
    Self {
      x: lng.cos() * r,
      y: lng.sin() * r,
      z: lat.sin(),
    }
  }

  /// Unit-sphere point of a latitude/longitude in degrees.
  #[inline]
  #[must_use]
  pub fn from_degrees(lat: f64, lon: f64) -> Self {
    Self::from_lat_lng_rads(lat.to_radians(), lon.to_radians())
  }

  /// Latitude/longitude in degrees of the direction of this vector.
  #[inline]
  #[must_use]
  pub fn to_degrees(&self) -> (f64, f64) {
    let lat = self.z.atan2(self.x.hypot(self.y)).to_degrees();
    let lon = self.y.atan2(self.x).to_degrees();
    (lat, lon)
  }

  #[inline]
  #[must_use]
  pub fn dot(&self, o: &Vec3d) -> f64 {
    self.x * o.x + self.y * o.y + self.z * o.z
  }

  #[inline]
  #[must_use]
  pub fn cross(&self, o: &Vec3d) -> Vec3d {
    Vec3d::new(
      self.y * o.z - self.z * o.y,
      self.z * o.x - self.x * o.z,
      self.x * o.y - self.y * o.x,
    )
  }

  #[inline]
  #[must_use]
  pub fn norm(&self) -> f64 {
    self.dot(self).sqrt()
  }

  /// Unit vector in the same direction; the zero vector stays zero.
  #[inline]
  #[must_use]
  pub fn normalized(&self) -> Vec3d {
    let n = self.norm();
    if n == 0.0 {
      *self
    } else {
      *self * (1.0 / n)
    }
  }

  /// Square of the Euclidean distance between two points.
  #[inline]
  #[must_use]
  pub fn square_dist(&self, o: &Vec3d) -> f64 {
    let d = *self - *o;
    d.dot(&d)
  }

  /// Angle in radians between two directions.
  #[inline]
  #[must_use]
  pub fn angle_to(&self, o: &Vec3d) -> f64 {
    self.cross(o).norm().atan2(self.dot(o))
  }
}

impl Add for Vec3d {
  type Output = Vec3d;
  fn add(self, o: Vec3d) -> Vec3d {
    Vec3d::new(self.x + o.x, self.y + o.y, self.z + o.z)
  }
}

impl Sub for Vec3d {
  type Output = Vec3d;
  fn sub(self, o: Vec3d) -> Vec3d {
    Vec3d::new(self.x - o.x, self.y - o.y, self.z - o.z)
  }
}

impl Mul<f64> for Vec3d {
  type Output = Vec3d;
  fn mul(self, s: f64) -> Vec3d {
    Vec3d::new(self.x * s, self.y * s, self.z * s)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_point_square_dist() {
    let v1 = Vec3d::new(0.0, 0.0, 0.0);
    let v2 = Vec3d::new(1.0, 0.0, 0.0);
    let v5 = Vec3d::new(1.0, 1.0, 2.0);
    assert!(v1.square_dist(&v1).abs() < f64::EPSILON, "distance to self is 0");
    assert!((v1.square_dist(&v2) - 1.0).abs() < f64::EPSILON, "distance to <1,0,0> is 1");
    assert!((v1.square_dist(&v5) - 6.0).abs() < f64::EPSILON, "distance to <1,1,2> is 6");
  }

  #[test]
  fn test_geo_to_vec3d_round_trip() {
    let origin = Vec3d::new(0.0, 0.0, 0.0);
    let p = Vec3d::from_degrees(45.0, -120.0);
    assert!((origin.square_dist(&p) - 1.0).abs() < 1e-12, "point on unit sphere");
    let (lat, lon) = p.to_degrees();
    assert!((lat - 45.0).abs() < 1e-12 && (lon + 120.0).abs() < 1e-12, "round trip");
  }

  #[test]
  fn test_cross_is_orthogonal() {
    let a = Vec3d::new(1.0, 2.0, 3.0);
    let b = Vec3d::new(-2.0, 0.5, 1.0);
    let c = a.cross(&b);
    assert!(c.dot(&a).abs() < 1e-12 && c.dot(&b).abs() < 1e-12);
  }

  #[test]
  fn test_angle_between_directions() {
    let equator = Vec3d::from_degrees(0.0, 0.0);
    assert!((equator.angle_to(&Vec3d::new(0.0, 0.0, 1.0)) - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    assert!(equator.angle_to(&equator).abs() < 1e-12);
    let east = Vec3d::from_degrees(0.0, 1.0);
    assert!((equator.angle_to(&east) - 1f64.to_radians()).abs() < 1e-12);
  }
}
