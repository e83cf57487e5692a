//! Geodesic cell metrics on the WGS84 ellipsoid.

use geo::{GeodesicArea, GeodesicDistance};
use geo_types::{Coord, Point};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::CellGeometry;
use crate::grids::DggsCodec;
use crate::math::Vec3d;
use crate::types::{CellId, Result};

const SEAM_EPS: f64 = 1e-9;

/// Size of a cell along its sides.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Shape {
  /// Equal-sided cells (H3, S2, rHEALPix, QTM, ...).
  Regular { avg_edge_len_m: f64 },
  /// Latitude/longitude rectangles (Geohash, OLC, tiles, ...).
  Graticule { width_m: f64, height_m: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellMetrics {
  pub center_lat: f64,
  pub center_lon: f64,
  pub shape: Shape,
  pub area_m2: f64,
  pub perimeter_m: f64,
}

fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
  Point::from(a).geodesic_distance(&Point::from(b))
}

/// Edge on the +/-180 meridian added by the antimeridian split.
fn is_seam(a: Coord<f64>, b: Coord<f64>) -> bool {
  a.x.abs() >= 180.0 - SEAM_EPS && b.x.abs() >= 180.0 - SEAM_EPS && (a.x - b.x).abs() < SEAM_EPS
}

/// Perimeter of the original cell, leaving out seam edges.
fn perimeter(geometry: &CellGeometry) -> f64 {
  geometry
    .polygons()
    .iter()
    .flat_map(|p| p.exterior().lines())
    .filter(|l| !is_seam(l.start, l.end))
    .map(|l| distance(l.start, l.end))
    .sum()
}

/// Mean direction of the ring's vertices, robust to poles and the seam.
fn spherical_center(ring: &[Coord<f64>]) -> (f64, f64) {
  let sum = ring
    .iter()
    .map(|c| Vec3d::from_degrees(c.y, c.x))
    .fold(Vec3d::default(), |acc, v| acc + v);
  let (lat, lon) = sum.normalized().to_degrees();
  (lat, crate::latlng::wrap_lon_deg(lon))
}

/// `(lat_min, lon_min, lat_max, lon_max)` of a raw ring.
fn ring_bounds(ring: &[Coord<f64>]) -> (f64, f64, f64, f64) {
  ring.iter().fold(
    (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
    |(a, b, c, d), p| (a.min(p.y), b.min(p.x), c.max(p.y), d.max(p.x)),
  )
}

/// Metrics of `cell` from its decoded ring and sanitised geometry.
pub fn cell_metrics(
  codec: &dyn DggsCodec,
  cell: &CellId,
  ring: &[Coord<f64>],
  geometry: &CellGeometry,
) -> Result<CellMetrics> {
  let area_m2 = geometry
    .polygons()
    .iter()
    .map(|p| p.geodesic_area_unsigned())
    .sum();
  let perimeter_m = perimeter(geometry);
  let (center_lat, center_lon, shape) = if codec.is_regular() {
    let edges = codec.edges(cell)?.max(1);
    let (lat, lon) = spherical_center(ring);
    (
      lat,
      lon,
      Shape::Regular {
        avg_edge_len_m: perimeter_m / edges as f64,
      },
    )
  } else {
    let (lat_min, lon_min, lat_max, lon_max) = ring_bounds(ring);
    let (mid_lat, mid_lon) = ((lat_min + lat_max) / 2.0, (lon_min + lon_max) / 2.0);
    let width_m = distance(Coord { x: lon_min, y: mid_lat }, Coord { x: lon_max, y: mid_lat });
    let height_m = distance(Coord { x: mid_lon, y: lat_min }, Coord { x: mid_lon, y: lat_max });
    (
      mid_lat,
      crate::latlng::wrap_lon_deg(mid_lon),
      Shape::Graticule { width_m, height_m },
    )
  };
  Ok(CellMetrics {
    center_lat,
    center_lon,
    shape,
    area_m2,
    perimeter_m,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::geometry::{sanitize, SanitizeOptions};
  use crate::grids::geohash::GeohashCodec;
  use crate::grids::h3::H3Codec;

  fn describe(codec: &dyn DggsCodec, cell: &CellId) -> CellMetrics {
    let ring = codec.decode(cell).unwrap();
    let g = sanitize(&ring, &SanitizeOptions::default()).unwrap();
    cell_metrics(codec, cell, &ring, &g).unwrap()
  }

  #[test]
  fn test_h3_res5_metrics() {
    let cell = H3Codec.encode(37.7749, -122.4194, 5).unwrap();
    let m = describe(&H3Codec, &cell);
    // average res 5 hexagon is about 252.9 km2 with 9.85 km edges
    assert!((150e6..350e6).contains(&m.area_m2), "area {}", m.area_m2);
    let Shape::Regular { avg_edge_len_m } = m.shape else {
      panic!("hexagons are regular")
    };
    assert!((7_000.0..12_000.0).contains(&avg_edge_len_m), "edge {avg_edge_len_m}");
    assert!((m.perimeter_m - 6.0 * avg_edge_len_m).abs() < 1e-6);
    assert!((m.center_lat - 37.7749).abs() < 0.2 && (m.center_lon + 122.4194).abs() < 0.2);
  }

  #[test]
  fn test_geohash_width_height() {
    let cell = GeohashCodec.parse("s0000").unwrap();
    let m = describe(&GeohashCodec, &cell);
    let Shape::Graticule { width_m, height_m } = m.shape else {
      panic!("geohash cells are graticule cells")
    };
    // 0.0439 x 0.0439 degrees at the equator
    assert!((width_m - 4_891.0).abs() < 30.0, "width {width_m}");
    assert!((height_m - 4_860.0).abs() < 30.0, "height {height_m}");
    assert!((m.area_m2 - width_m * height_m).abs() / m.area_m2 < 0.01);
  }

  #[test]
  fn test_seam_edges_left_out_of_perimeter() {
    let ring: Vec<Coord<f64>> = [(179.0, -1.0), (181.0, -1.0), (181.0, 1.0), (179.0, 1.0)]
      .iter()
      .map(|&(x, y)| Coord { x, y })
      .collect();
    let g = sanitize(&ring, &SanitizeOptions::default()).unwrap();
    let whole = sanitize(
      &ring.iter().map(|c| Coord { x: c.x - 10.0, y: c.y }).collect::<Vec<_>>(),
      &SanitizeOptions::default(),
    )
    .unwrap();
    assert!((perimeter(&g) - perimeter(&whole)).abs() < 1.0);
  }
}
