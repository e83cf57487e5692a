//! Cell geometries: sanitised polygons built from decoded rings, plus the
//! geodesic metrics derived from them.

pub mod antimeridian;
pub mod metrics;

use geo::{BooleanOps, BoundingRect, Centroid, GeodesicArea, Intersects};
use geo_types::{Geometry, MultiPolygon, Point, Polygon, Rect};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use antimeridian::{sanitize, SanitizeOptions};
pub use metrics::{cell_metrics, CellMetrics, Shape};

use crate::grids::DggsCodec;
use crate::types::{BBox, CellId, Result};

/// Polygon of a cell in WGS84 `(lon, lat)` degrees, every longitude inside
/// `[-180, 180]`. Cells cut by the antimeridian become multipolygons.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CellGeometry {
  Polygon(Polygon<f64>),
  MultiPolygon(MultiPolygon<f64>),
}

impl CellGeometry {
  /// Member polygons, one for a plain polygon.
  #[must_use]
  pub fn polygons(&self) -> Vec<&Polygon<f64>> {
    match self {
      CellGeometry::Polygon(p) => vec![p],
      CellGeometry::MultiPolygon(mp) => mp.0.iter().collect(),
    }
  }

  #[must_use]
  pub fn to_multi_polygon(&self) -> MultiPolygon<f64> {
    match self {
      CellGeometry::Polygon(p) => MultiPolygon::new(vec![p.clone()]),
      CellGeometry::MultiPolygon(mp) => mp.clone(),
    }
  }

  #[must_use]
  pub fn is_multi(&self) -> bool {
    matches!(self, CellGeometry::MultiPolygon(_))
  }

  /// Planar bounding rectangle over all parts.
  #[must_use]
  pub fn bounding_rect(&self) -> Option<Rect<f64>> {
    match self {
      CellGeometry::Polygon(p) => p.bounding_rect(),
      CellGeometry::MultiPolygon(mp) => mp.bounding_rect(),
    }
  }

  /// Bounding box, reported as crossing the antimeridian when the parts sit
  /// on both sides of it.
  #[must_use]
  pub fn bbox(&self) -> Option<BBox> {
    BBox::covering(
      self
        .polygons()
        .into_iter()
        .filter_map(BoundingRect::bounding_rect)
        .map(|r| BBox::from_rect(&r)),
    )
  }

  /// Whether any part touches `bbox`, which may cross the antimeridian.
  #[must_use]
  pub fn intersects_bbox(&self, bbox: &BBox) -> bool {
    let parts = bbox.split_antimeridian();
    self
      .polygons()
      .into_iter()
      .any(|p| parts.iter().any(|b| p.intersects(&b.to_rect())))
  }

  #[must_use]
  pub fn contains_point(&self, lat: f64, lon: f64) -> bool {
    let pt = Point::new(lon, lat);
    self.polygons().into_iter().any(|p| pt.intersects(p))
  }

  /// Planar centroid `(lat, lon)`; for split cells the largest part's.
  #[must_use]
  pub fn centroid(&self) -> Option<(f64, f64)> {
    let part = match self {
      CellGeometry::Polygon(p) => p,
      CellGeometry::MultiPolygon(mp) => mp.0.iter().max_by(|a, b| {
        use geo::Area;
        a.unsigned_area().total_cmp(&b.unsigned_area())
      })?,
    };
    part.centroid().map(|c| (c.y(), c.x()))
  }
}

impl From<CellGeometry> for Geometry<f64> {
  fn from(g: CellGeometry) -> Self {
    match g {
      CellGeometry::Polygon(p) => Geometry::Polygon(p),
      CellGeometry::MultiPolygon(mp) => Geometry::MultiPolygon(mp),
    }
  }
}

/// Geodesic area of the planar intersection of two geometries.
#[must_use]
pub fn overlap_area_m2(a: &CellGeometry, b: &CellGeometry) -> f64 {
  let (Some(ra), Some(rb)) = (a.bounding_rect(), b.bounding_rect()) else {
    return 0.0;
  };
  if !ra.intersects(&rb) {
    return 0.0;
  }
  a.to_multi_polygon()
    .intersection(&b.to_multi_polygon())
    .0
    .iter()
    .map(GeodesicArea::geodesic_area_unsigned)
    .sum()
}

/// Decodes and sanitises a cell with the default options.
pub fn cell_geometry(codec: &dyn DggsCodec, cell: &CellId) -> Result<CellGeometry> {
  sanitize(&codec.decode(cell)?, &SanitizeOptions::default())
}

/// Geometry and metrics of a cell from a single decode.
pub fn describe_cell(codec: &dyn DggsCodec, cell: &CellId) -> Result<(CellGeometry, CellMetrics)> {
  let ring = codec.decode(cell)?;
  let geometry = sanitize(&ring, &SanitizeOptions::default())?;
  let metrics = cell_metrics(codec, cell, &ring, &geometry)?;
  Ok((geometry, metrics))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::grids::geohash::GeohashCodec;
  use crate::grids::DggsCodec;

  #[test]
  fn test_cell_geometry_contains_encoded_point() {
    let cell = GeohashCodec.encode(57.64911, 10.40744, 5).unwrap();
    let g = cell_geometry(&GeohashCodec, &cell).unwrap();
    assert!(!g.is_multi());
    assert!(g.contains_point(57.64911, 10.40744));
    let (lat, lon) = g.centroid().unwrap();
    assert!((lat - 57.64911).abs() < 0.05 && (lon - 10.40744).abs() < 0.05);
  }

  #[test]
  fn test_overlap_area() {
    let a = cell_geometry(&GeohashCodec, &GeohashCodec.parse("s0").unwrap()).unwrap();
    let inner = cell_geometry(&GeohashCodec, &GeohashCodec.parse("s00").unwrap()).unwrap();
    let beside = cell_geometry(&GeohashCodec, &GeohashCodec.parse("s2").unwrap()).unwrap();
    let whole: f64 = inner.polygons().iter().map(|p| p.geodesic_area_unsigned()).sum();
    assert!((overlap_area_m2(&a, &inner) - whole).abs() / whole < 1e-6);
    assert!(overlap_area_m2(&a, &beside) < 1.0, "shared edge only");
  }

  #[test]
  fn test_split_cell_bbox_crosses() {
    let ring = vec![
      geo_types::Coord { x: 170.0, y: -5.0 },
      geo_types::Coord { x: 190.0, y: -5.0 },
      geo_types::Coord { x: 190.0, y: 5.0 },
      geo_types::Coord { x: 170.0, y: 5.0 },
    ];
    let g = sanitize(&ring, &SanitizeOptions::default()).unwrap();
    let b = g.bbox().unwrap();
    assert!(b.crosses_antimeridian());
    assert!((b.lon_min - 170.0).abs() < 1e-9 && (b.lon_max + 170.0).abs() < 1e-9);
    assert!(g.intersects_bbox(&BBox::new(-1.0, -175.0, 1.0, -172.0).unwrap()));
    assert!(!g.intersects_bbox(&BBox::new(-1.0, 0.0, 1.0, 10.0).unwrap()));
  }
}
