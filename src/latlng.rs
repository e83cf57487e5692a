// src/latlng.rs

use crate::constants::{EARTH_AUTHALIC_RADIUS_M, EPSILON, M_2PI, M_PI_2};
use std::f64::consts::PI;

/// Latitude/longitude coordinates in radians.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct LatLng {
  /// Latitude in radians.
  pub lat: f64,
  /// Longitude in radians.
  pub lng: f64,
}

impl LatLng {
  #[inline]
  #[must_use]
  pub const fn new(lat: f64, lng: f64) -> Self {
    Self { lat, lng }
  }

  #[inline]
  #[must_use]
  pub fn from_degrees(lat: f64, lon: f64) -> Self {
    Self {
      lat: lat.to_radians(),
      lng: lon.to_radians(),
    }
  }

  /// `(lon, lat)` in degrees, the vertex order of raw rings.
  #[inline]
  #[must_use]
  pub fn to_lon_lat_degrees(&self) -> (f64, f64) {
    (self.lng.to_degrees(), self.lat.to_degrees())
  }

  /// Whether both components are within `threshold` radians.
  #[inline]
  #[must_use]
  pub fn almost_equal_threshold(&self, other: &LatLng, threshold: f64) -> bool {
    (self.lat - other.lat).abs() < threshold && (self.lng - other.lng).abs() < threshold
  }

  /// Azimuth from `self` to `other` in radians.
  #[inline]
  #[must_use]
  pub fn azimuth_to(&self, other: &LatLng) -> f64 {
    let dlng = other.lng - self.lng;
    (other.lat.cos() * dlng.sin()).atan2(self.lat.cos() * other.lat.sin() - self.lat.sin() * other.lat.cos() * dlng.cos())
  }

  /// Point at azimuth `az` and angular `distance` (radians) from `self`.
  #[must_use]
  pub fn az_distance(&self, az: f64, distance: f64) -> LatLng {
    if distance < EPSILON {
      return *self;
    }
    let az = pos_angle_rads(az);
    let mut p2 = LatLng::default();

    if az < EPSILON || (az - PI).abs() < EPSILON {
      p2.lat = if az < EPSILON {
        self.lat + distance
      } else {
        self.lat - distance
      };
      if (p2.lat - M_PI_2).abs() < EPSILON {
        p2 = LatLng::new(M_PI_2, 0.0);
      } else if (p2.lat + M_PI_2).abs() < EPSILON {
        p2 = LatLng::new(-M_PI_2, 0.0);
      } else {
        p2.lng = constrain_lng(self.lng);
      }
      return p2;
    }

    let sin_lat = (self.lat.sin() * distance.cos() + self.lat.cos() * distance.sin() * az.cos()).clamp(-1.0, 1.0);
    p2.lat = sin_lat.asin();
    if (p2.lat - M_PI_2).abs() < EPSILON {
      return LatLng::new(M_PI_2, 0.0);
    }
    if (p2.lat + M_PI_2).abs() < EPSILON {
      return LatLng::new(-M_PI_2, 0.0);
    }
    let inv_cos_p2_lat = 1.0 / p2.lat.cos();
    let sin_lng = (az.sin() * distance.sin() * inv_cos_p2_lat).clamp(-1.0, 1.0);
    let cos_lng = ((distance.cos() - self.lat.sin() * p2.lat.sin()) / self.lat.cos() * inv_cos_p2_lat).clamp(-1.0, 1.0);
    p2.lng = constrain_lng(self.lng + sin_lng.atan2(cos_lng));
    p2
  }
}

/// Normalizes radians to a value between `0.0` and `2 * PI`.
#[inline]
#[must_use]
pub fn pos_angle_rads(rads: f64) -> f64 {
  let tmp = if rads < 0.0 { rads + M_2PI } else { rads };
  if tmp >= M_2PI {
    tmp - M_2PI
  } else {
    tmp
  }
}

/// Constrains longitude to the range `[-PI, PI]`.
#[inline]
#[must_use]
pub fn constrain_lng(mut lng: f64) -> f64 {
  while lng > PI {
    lng -= M_2PI;
  }
  while lng < -PI {
    lng += M_2PI;
  }
  lng
}

/// Wraps a longitude in degrees into `[-180, 180)`.
#[inline]
#[must_use]
pub fn wrap_lon_deg(lon: f64) -> f64 {
  let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
  if wrapped.is_finite() {
    wrapped
  } else {
    lon
  }
}

/// Haversine great circle distance in radians.
#[must_use]
pub fn great_circle_distance_rads(a: &LatLng, b: &LatLng) -> f64 {
  let sin_lat_half = ((b.lat - a.lat) * 0.5).sin();
  let sin_lng_half = ((b.lng - a.lng) * 0.5).sin();
  let h = (sin_lat_half * sin_lat_half + a.lat.cos() * b.lat.cos() * sin_lng_half * sin_lng_half).clamp(0.0, 1.0);
  2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Great circle distance in meters on the authalic sphere.
#[must_use]
pub fn great_circle_distance_m(a: &LatLng, b: &LatLng) -> f64 {
  great_circle_distance_rads(a, b) * EARTH_AUTHALIC_RADIUS_M
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_pos_angle_rads() {
    assert!((pos_angle_rads(0.0)).abs() < f64::EPSILON, "0 rads unchanged");
    assert!((pos_angle_rads(-PI / 2.0) - 3.0 * PI / 2.0).abs() < 1e-12, "negative wraps");
    assert!((pos_angle_rads(M_2PI + 1.0) - 1.0).abs() < 1e-12, "over 2pi wraps");
  }

  #[test]
  fn test_wrap_lon_deg() {
    assert!((wrap_lon_deg(190.0) + 170.0).abs() < 1e-12);
    assert!((wrap_lon_deg(-190.0) - 170.0).abs() < 1e-12);
    assert!((wrap_lon_deg(180.0) + 180.0).abs() < 1e-12);
  }

  #[test]
  fn test_azimuth_due_north_and_east() {
    let origin = LatLng::from_degrees(0.0, 0.0);
    assert!(origin.azimuth_to(&LatLng::from_degrees(10.0, 0.0)).abs() < 1e-12);
    assert!((origin.azimuth_to(&LatLng::from_degrees(0.0, 10.0)) - M_PI_2).abs() < 1e-12);
  }

  #[test]
  fn test_az_distance_round_trip() {
    let start = LatLng::from_degrees(15.0, 10.0);
    let end = LatLng::from_degrees(20.0, 30.0);
    let az = start.azimuth_to(&end);
    let d = great_circle_distance_rads(&start, &end);
    let back = start.az_distance(az, d);
    assert!(back.almost_equal_threshold(&end, 1e-9), "az/distance reaches the target");
  }

  #[test]
  fn test_az_distance_to_pole() {
    let start = LatLng::from_degrees(45.0, 10.0);
    let p = start.az_distance(0.0, PI / 4.0);
    assert!((p.lat - M_PI_2).abs() < 1e-12 && p.lng == 0.0, "due north to the pole");
  }
}
