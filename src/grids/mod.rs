//! Cell codecs. Each grid implements [`DggsCodec`]; nothing outside this
//! module knows how a grid lays out its cells.

pub mod external;
pub mod gars;
pub mod geohash;
pub mod georef;
pub mod h3;
pub mod maidenhead;
pub mod mgrs;
pub mod olc;
pub mod qtm;
pub mod registry;
pub mod rhealpix;
pub mod s2;
pub mod tiles;
#[cfg(test)]
pub(crate) mod testing;

use geo_types::Coord;

use crate::constants::EARTH_AREA_M2;
use crate::math::Vec3d;
use crate::types::{check_lat_lon, BBox, CellId, DggsError, DggsKind, Hierarchy, ResBounds, Result};

pub use registry::Registry;

/// Cell boundary as decoded: `(lon, lat)` vertices in degrees, not closed.
/// Longitudes may leave `[-180, 180]` where the cell crosses the antimeridian.
pub type RawRing = Vec<Coord<f64>>;

/// Uniform interface over every grid.
pub trait DggsCodec: Send + Sync {
  fn kind(&self) -> DggsKind;

  fn res_bounds(&self) -> ResBounds {
    self.kind().default_bounds()
  }

  /// `OutOfRange` unless `res` is a resolution of this grid.
  fn validate_resolution(&self, res: u8) -> Result<()> {
    if self.res_bounds().contains(res) {
      Ok(())
    } else {
      Err(DggsError::OutOfRange { kind: self.kind(), res })
    }
  }

  /// Cell containing a WGS84 point.
  fn encode(&self, lat: f64, lon: f64, res: u8) -> Result<CellId>;

  /// Boundary of a cell.
  fn decode(&self, cell: &CellId) -> Result<RawRing>;

  fn resolution(&self, cell: &CellId) -> Result<u8>;

  /// Containing cell one resolution up, `None` at the coarsest resolution.
  fn parent(&self, cell: &CellId) -> Result<Option<CellId>>;

  /// Descendants at `target`.
  fn children(&self, cell: &CellId, target: u8) -> Result<Vec<CellId>>;

  /// Cells sharing an edge with `cell`.
  fn neighbors(&self, cell: &CellId) -> Result<Vec<CellId>>;

  fn is_regular(&self) -> bool {
    self.kind().is_regular()
  }

  /// Number of polygon edges of a cell.
  fn edges(&self, cell: &CellId) -> Result<usize> {
    self.decode(cell).map(|ring| ring.len())
  }

  fn hierarchy(&self) -> Hierarchy {
    self.kind().default_hierarchy()
  }

  /// Canonicalises and validates a textual token.
  fn parse(&self, token: &str) -> Result<CellId>;

  /// Coarsest cells in traversal order.
  fn roots(&self) -> Result<Vec<CellId>>;

  fn world_threshold(&self) -> u8 {
    self.kind().default_world_threshold()
  }

  /// Cells at `res` covering `bbox` by direct scan. `None` asks the caller to
  /// descend from [`DggsCodec::roots`].
  fn cover_bbox(&self, _bbox: &BBox, _res: u8) -> Result<Option<Vec<CellId>>> {
    Ok(None)
  }

  /// Fraction by which a cell's bbox is grown before pruning a descent.
  fn descent_margin(&self) -> f64 {
    0.05
  }

  /// Number of cells covering the globe at `res`.
  fn cell_count(&self, res: u8) -> f64;

  fn mean_cell_area_m2(&self, res: u8) -> f64 {
    EARTH_AREA_M2 / self.cell_count(res)
  }
}

/// Rejects cells of another grid.
pub(crate) fn expect_kind(cell: &CellId, kind: DggsKind) -> Result<()> {
  if cell.kind == kind {
    Ok(())
  } else {
    Err(DggsError::InvalidCellToken {
      kind,
      token: cell.canonical(),
    })
  }
}

/// Shared argument checks of `encode`.
pub(crate) fn check_encode(codec: &(impl DggsCodec + ?Sized), lat: f64, lon: f64, res: u8) -> Result<()> {
  check_lat_lon(lat, lon)?;
  codec.validate_resolution(res)
}

/// Expands `cell` level by level down to `target` with `step` producing the
/// direct children of one cell.
pub(crate) fn descend_to<F>(codec: &(impl DggsCodec + ?Sized), cell: &CellId, target: u8, step: F) -> Result<Vec<CellId>>
where
  F: Fn(&CellId) -> Result<Vec<CellId>>,
{
  let res = codec.resolution(cell)?;
  if target < res {
    return Err(DggsError::TargetBelowInput { target, input: res });
  }
  codec.validate_resolution(target)?;
  let mut level = vec![cell.clone()];
  let mut current = res;
  while current < target {
    let mut next = Vec::with_capacity(level.len() * 4);
    for c in &level {
      next.extend(step(c)?);
    }
    level = next;
    current = codec.resolution(level.first().ok_or_else(|| cell.invalid())?)?;
  }
  Ok(level)
}

/// Widest longitude step of a rectangle edge. Steps of 180 degrees or more
/// cannot be told apart from the short way round.
const MAX_LON_STEP: f64 = 90.0;

/// Axis-aligned rectangle ring, counter-clockwise from the south-west corner.
/// Parallels wider than [`MAX_LON_STEP`] get intermediate vertices.
pub(crate) fn rect_ring(lat_min: f64, lon_min: f64, lat_max: f64, lon_max: f64) -> RawRing {
  let width = lon_max - lon_min;
  let n = (width / MAX_LON_STEP).ceil().max(1.0) as u32;
  let step = width / f64::from(n);
  let mut ring = Vec::with_capacity(2 * n as usize + 2);
  for k in 0..n {
    ring.push(Coord {
      x: lon_min + step * f64::from(k),
      y: lat_min,
    });
  }
  ring.push(Coord { x: lon_max, y: lat_min });
  for k in 0..n {
    ring.push(Coord {
      x: lon_max - step * f64::from(k),
      y: lat_max,
    });
  }
  ring.push(Coord { x: lon_min, y: lat_max });
  ring
}

/// Longest straight step, in radians, along a densified great-circle arc. A
/// step of this length strays about five metres from the arc.
const MAX_ARC_STEP: f64 = 2.5e-3;
const MAX_ARC_STEPS: u32 = 1024;

/// Straight lon/lat steps needed to follow a great-circle arc of `angle`
/// radians.
pub(crate) fn arc_steps(angle: f64) -> u32 {
  ((angle / MAX_ARC_STEP).ceil() as u32).clamp(1, MAX_ARC_STEPS)
}

/// Appends the great-circle arc from `a` to `b` as `(lon, lat)` vertices,
/// `b` excluded.
pub(crate) fn push_arc(ring: &mut RawRing, a: Vec3d, b: Vec3d) {
  let steps = arc_steps(a.angle_to(&b));
  for step in 0..steps {
    let f = f64::from(step) / f64::from(steps);
    let (lat, lon) = (a * (1.0 - f) + b * f).normalized().to_degrees();
    ring.push(Coord { x: lon, y: lat });
  }
}

/// Closed great-circle polygon through `corners`.
pub(crate) fn arc_ring(corners: &[Vec3d]) -> RawRing {
  let mut ring = Vec::new();
  for (k, a) in corners.iter().enumerate() {
    push_arc(&mut ring, *a, corners[(k + 1) % corners.len()]);
  }
  ring
}

/// Lower-left corners of a regular lat/lon graticule with `lat_step` x
/// `lon_step` cells anchored at (-90, -180) that touch `bbox`, lon-major.
pub(crate) fn graticule_scan(bbox: &BBox, lat_step: f64, lon_step: f64) -> Vec<(f64, f64)> {
  let mut out = Vec::new();
  for part in bbox.split_antimeridian() {
    let i0 = ((part.lon_min + 180.0) / lon_step).floor() as i64;
    let mut i1 = ((part.lon_max + 180.0) / lon_step).ceil() as i64 - 1;
    let j0 = ((part.lat_min + 90.0) / lat_step).floor() as i64;
    let mut j1 = ((part.lat_max + 90.0) / lat_step).ceil() as i64 - 1;
    i1 = i1.max(i0).min((360.0 / lon_step).round() as i64 - 1);
    j1 = j1.max(j0).min((180.0 / lat_step).round() as i64 - 1);
    for i in i0.max(0)..=i1 {
      for j in j0.max(0)..=j1 {
        out.push((-90.0 + j as f64 * lat_step, -180.0 + i as f64 * lon_step));
      }
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_graticule_scan_lon_major() {
    let b = BBox::new(0.5, 0.5, 1.5, 2.5).unwrap();
    let corners = graticule_scan(&b, 1.0, 1.0);
    assert_eq!(corners.len(), 6);
    assert_eq!(corners[0], (0.0, 0.0));
    assert_eq!(corners[1], (1.0, 0.0), "latitude varies fastest");
    assert_eq!(corners[5], (1.0, 2.0));
  }

  #[test]
  fn test_graticule_scan_world_edges() {
    let corners = graticule_scan(&BBox::world(), 30.0, 30.0);
    assert_eq!(corners.len(), 72, "12 x 6 cells, no wrap past 180");
  }

  #[test]
  fn test_rect_ring_narrow_keeps_four_corners() {
    let ring = rect_ring(10.0, 20.0, 15.0, 65.0);
    assert_eq!(ring.len(), 4);
    assert_eq!(ring[0], Coord { x: 20.0, y: 10.0 });
    assert_eq!(ring[2], Coord { x: 65.0, y: 15.0 });
  }

  #[test]
  fn test_rect_ring_wide_edges_split() {
    let ring = rect_ring(-85.0, -180.0, 85.0, 180.0);
    assert_eq!(ring.len(), 10);
    for w in ring.windows(2) {
      assert!((w[1].x - w[0].x).abs() <= MAX_LON_STEP, "{:?} -> {:?}", w[0], w[1]);
    }
    let half = rect_ring(0.0, 0.0, 85.0, 180.0);
    assert_eq!(half.len(), 6);
  }

  #[test]
  fn test_arc_steps_grow_with_length() {
    assert_eq!(arc_steps(0.0), 1);
    assert_eq!(arc_steps(1e-4), 1, "short arcs stay straight");
    assert_eq!(arc_steps(0.01), 4);
    assert!(arc_steps(std::f64::consts::FRAC_PI_2) > 600);
    assert_eq!(arc_steps(f64::NAN), 1);
  }

  #[test]
  fn test_arc_ring_follows_great_circle() {
    // quarter of the equator bent up to the pole: edges stay on their circles
    let corners = [Vec3d::from_degrees(0.0, 0.0), Vec3d::from_degrees(0.0, 90.0), Vec3d::new(0.0, 0.0, 1.0)];
    let ring = arc_ring(&corners);
    assert!(ring.len() > 1800);
    let first_leg: Vec<_> = ring.iter().take_while(|c| c.x < 90.0 - 1e-9 && c.y.abs() < 1e-9).collect();
    assert!(first_leg.len() > 600, "equator edge densified");
    assert!(ring.iter().all(|c| c.y > -1e-9));
  }
}
