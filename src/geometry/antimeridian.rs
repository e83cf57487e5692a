//! Antimeridian-safe polygon construction.
//!
//! Decoded rings carry longitudes that may leave `[-180, 180]` or jump by
//! 360 degrees between neighbouring vertices. The ring is unwrapped so that
//! every step takes the shorter way round, and its closure then tells how
//! often it winds around the pole. A ring that winds once encloses a pole
//! and is closed along it; a ring that does not wind is cut into pieces along
//! the antimeridian.

use geo::line_intersection::{line_intersection, LineIntersection};
use geo::orient::{Direction, Orient};
use geo::Area;
use geo_types::{Coord, Line, LineString, MultiPolygon, Polygon};

use super::CellGeometry;
use crate::latlng::wrap_lon_deg;
use crate::types::{DggsError, Result};

const POLE_EPS: f64 = 1e-9;
const SEAM_EPS: f64 = 1e-9;
const MIN_PIECE_AREA: f64 = 1e-12;

/// Knobs of [`sanitize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SanitizeOptions {
  /// Close a pole-enclosing ring through the north pole.
  pub force_north_pole: bool,
  /// Close a pole-enclosing ring through the south pole.
  pub force_south_pole: bool,
  /// Orient outer rings counter-clockwise and holes clockwise.
  pub fix_winding: bool,
}

impl Default for SanitizeOptions {
  fn default() -> Self {
    Self {
      force_north_pole: false,
      force_south_pole: false,
      fix_winding: true,
    }
  }
}

fn unfixable(msg: &str) -> DggsError {
  DggsError::UnfixableGeometry(msg.to_string())
}

fn same(a: Coord<f64>, b: Coord<f64>) -> bool {
  (a.x - b.x).abs() < 1e-12 && (a.y - b.y).abs() < 1e-12
}

fn dedup(pts: &mut Vec<Coord<f64>>) {
  pts.dedup_by(|b, a| same(*a, *b));
  while pts.len() > 1 && same(pts[0], pts[pts.len() - 1]) {
    pts.pop();
  }
}

fn on_pole(c: Coord<f64>) -> bool {
  c.y.abs() >= 90.0 - POLE_EPS
}

/// Open ring with longitudes wrapped. A pole vertex between two off-pole
/// neighbours has no longitude of its own and is split in two, one for each
/// neighbour; pole vertices that already bound an edge along the pole keep
/// theirs.
fn prepare(ring: &[Coord<f64>]) -> Result<Vec<Coord<f64>>> {
  if ring.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
    return Err(unfixable("non-finite vertex"));
  }
  let mut pts = ring.to_vec();
  dedup(&mut pts);
  let n = pts.len();
  if n < 3 {
    return Err(unfixable("ring has fewer than three distinct vertices"));
  }
  let mut out = Vec::with_capacity(n + 2);
  for i in 0..n {
    let c = pts[i];
    if !on_pole(c) {
      out.push(Coord {
        x: wrap_lon_deg(c.x),
        y: c.y,
      });
      continue;
    }
    let lat = 90f64.copysign(c.y);
    let (prev, next) = (pts[(i + n - 1) % n], pts[(i + 1) % n]);
    if on_pole(prev) || on_pole(next) {
      out.push(Coord { x: wrap_lon_deg(c.x), y: lat });
    } else {
      out.push(Coord {
        x: wrap_lon_deg(prev.x),
        y: lat,
      });
      out.push(Coord {
        x: wrap_lon_deg(next.x),
        y: lat,
      });
    }
  }
  dedup(&mut out);
  if out.len() < 3 {
    return Err(unfixable("ring collapses onto a pole"));
  }
  Ok(out)
}

/// Continuous longitudes, each step along the shorter arc.
fn unwrap(pts: &[Coord<f64>]) -> Vec<Coord<f64>> {
  let mut out = Vec::with_capacity(pts.len());
  let mut lon = pts[0].x;
  out.push(pts[0]);
  for w in pts.windows(2) {
    lon += wrap_lon_deg(w[1].x - w[0].x);
    out.push(Coord { x: lon, y: w[1].y });
  }
  out
}

/// Re-roots a ring that winds once around a pole at its first seam crossing
/// and closes it along the pole.
fn polar_ring(u: &[Coord<f64>], windings: i64, pole_lat: f64) -> Vec<Coord<f64>> {
  let n = u.len();
  let shift = 360.0 * windings as f64;
  let mut chain = u.to_vec();
  chain.push(Coord {
    x: u[0].x + shift,
    y: u[0].y,
  });
  let dir = shift.signum();
  let mut cut = None;
  for i in 0..n {
    let (a, b) = (chain[i], chain[i + 1]);
    // first seam value 180 + 360m strictly ahead of a in the winding direction
    let seam = if dir > 0.0 {
      ((a.x - 180.0) / 360.0).floor() * 360.0 + 540.0
    } else {
      ((a.x - 180.0) / 360.0).ceil() * 360.0 - 180.0
    };
    let crosses = if dir > 0.0 {
      a.x < seam && seam <= b.x
    } else {
      b.x <= seam && seam < a.x
    };
    if crosses {
      let t = (seam - a.x) / (b.x - a.x);
      cut = Some((i, seam, a.y + t * (b.y - a.y)));
      break;
    }
  }
  let (i, seam, lat) = cut.unwrap_or((n - 1, chain[n].x, chain[n].y));
  let mut out = Vec::with_capacity(n + 5);
  out.push(Coord { x: seam, y: lat });
  out.extend_from_slice(&chain[i + 1..=n]);
  out.extend(chain[1..=i].iter().map(|c| Coord {
    x: c.x + shift,
    y: c.y,
  }));
  out.push(Coord { x: seam + shift, y: lat });
  let to_start = -180.0 * dir - seam;
  for c in &mut out {
    c.x = (c.x + to_start).clamp(-180.0, 180.0);
  }
  let (start, end) = (out[0].x, out[out.len() - 1].x);
  out.push(Coord { x: end, y: pole_lat });
  out.push(Coord { x: 0.0, y: pole_lat });
  out.push(Coord { x: start, y: pole_lat });
  dedup(&mut out);
  out
}

fn intersect_x(a: Coord<f64>, b: Coord<f64>, x: f64) -> Coord<f64> {
  let t = (x - a.x) / (b.x - a.x);
  Coord { x, y: a.y + t * (b.y - a.y) }
}

/// Sutherland–Hodgman against one vertical line.
fn clip_x(ring: &[Coord<f64>], bound: f64, keep_east: bool) -> Vec<Coord<f64>> {
  let inside = |c: &Coord<f64>| if keep_east { c.x >= bound } else { c.x <= bound };
  let n = ring.len();
  let mut out = Vec::with_capacity(n + 2);
  for i in 0..n {
    let (prev, cur) = (ring[(i + n - 1) % n], ring[i]);
    match (inside(&prev), inside(&cur)) {
      (true, true) => out.push(cur),
      (true, false) => out.push(intersect_x(prev, cur, bound)),
      (false, true) => {
        out.push(intersect_x(prev, cur, bound));
        out.push(cur);
      }
      (false, false) => {}
    }
  }
  out
}

/// Pieces of a non-winding ring on each side of the antimeridian, shifted
/// back into range.
fn split_at_seam(u: &[Coord<f64>]) -> Vec<Vec<Coord<f64>>> {
  let min = u.iter().map(|c| c.x).fold(f64::INFINITY, f64::min);
  let offset = 360.0 * ((min + 180.0 + SEAM_EPS) / 360.0).floor();
  let ring: Vec<Coord<f64>> = u.iter().map(|c| Coord { x: c.x - offset, y: c.y }).collect();
  let max = ring.iter().map(|c| c.x).fold(f64::NEG_INFINITY, f64::max);
  if max <= 180.0 + SEAM_EPS {
    return vec![ring
      .into_iter()
      .map(|c| Coord {
        x: c.x.clamp(-180.0, 180.0),
        y: c.y,
      })
      .collect()];
  }
  let mut pieces = Vec::with_capacity(2);
  for (lo, hi, shift) in [(-180.0, 180.0, 0.0), (180.0, 540.0, -360.0)] {
    let mut piece = clip_x(&clip_x(&ring, lo, true), hi, false);
    for c in &mut piece {
      c.x += shift;
    }
    dedup(&mut piece);
    if piece.len() >= 3 && Polygon::new(LineString::from(piece.clone()), vec![]).unsigned_area() > MIN_PIECE_AREA {
      pieces.push(piece);
    }
  }
  pieces
}

/// No two non-adjacent edges cross or overlap.
fn is_simple(ring: &[Coord<f64>]) -> bool {
  let n = ring.len();
  let edge = |i: usize| Line::new(ring[i], ring[(i + 1) % n]);
  for i in 0..n {
    for j in i + 2..n {
      if i == 0 && j == n - 1 {
        continue;
      }
      match line_intersection(edge(i), edge(j)) {
        Some(LineIntersection::SinglePoint { is_proper: true, .. } | LineIntersection::Collinear { .. }) => {
          return false;
        }
        _ => {}
      }
    }
  }
  true
}

/// Builds a valid geometry from a decoded ring.
pub fn sanitize(ring: &[Coord<f64>], opts: &SanitizeOptions) -> Result<CellGeometry> {
  if opts.force_north_pole && opts.force_south_pole {
    return Err(unfixable("both poles forced"));
  }
  let pts = prepare(ring)?;
  let u = unwrap(&pts);
  let n = u.len();
  let closure = u[n - 1].x + wrap_lon_deg(pts[0].x - pts[n - 1].x) - u[0].x;
  let windings = (closure / 360.0).round() as i64;
  let rings = match windings {
    0 => split_at_seam(&u),
    1 | -1 => {
      let north = if opts.force_north_pole || opts.force_south_pole {
        opts.force_north_pole
      } else {
        pts.iter().map(|c| c.y).sum::<f64>() >= 0.0
      };
      vec![polar_ring(&u, windings, if north { 90.0 } else { -90.0 })]
    }
    _ => return Err(unfixable("ring winds around the globe more than once")),
  };
  if rings.is_empty() {
    return Err(unfixable("ring has no area"));
  }
  let mut polygons = Vec::with_capacity(rings.len());
  for r in rings {
    if !is_simple(&r) {
      return Err(unfixable("self-intersecting ring"));
    }
    let p = Polygon::new(LineString::from(r), vec![]);
    polygons.push(if opts.fix_winding { p.orient(Direction::Default) } else { p });
  }
  Ok(if polygons.len() == 1 {
    CellGeometry::Polygon(polygons.remove(0))
  } else {
    CellGeometry::MultiPolygon(MultiPolygon::new(polygons))
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use geo::winding_order::Winding;
  use geo::Contains;
  use geo_types::Point;

  fn ring(pts: &[(f64, f64)]) -> Vec<Coord<f64>> {
    pts.iter().map(|&(x, y)| Coord { x, y }).collect()
  }

  fn all_in_range(g: &CellGeometry) -> bool {
    g.polygons()
      .iter()
      .all(|p| p.exterior().coords().all(|c| (-180.0..=180.0).contains(&c.x)))
  }

  #[test]
  fn test_plain_ring_kept() {
    let g = sanitize(&ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]), &SanitizeOptions::default())
      .unwrap();
    let CellGeometry::Polygon(p) = &g else {
      panic!("expected a polygon")
    };
    assert_eq!(p.exterior().0.len(), 5, "closed ring of four corners");
    assert!(p.exterior().is_ccw());
  }

  #[test]
  fn test_clockwise_fixed() {
    let cw = ring(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]);
    let g = sanitize(&cw, &SanitizeOptions::default()).unwrap();
    assert!(g.polygons()[0].exterior().is_ccw());
    let opts = SanitizeOptions {
      fix_winding: false,
      ..SanitizeOptions::default()
    };
    assert!(sanitize(&cw, &opts).unwrap().polygons()[0].exterior().is_cw());
  }

  #[test]
  fn test_split_on_antimeridian() {
    // same cell, once with raw longitudes past 180 and once wrapped
    for pts in [
      [(175.0, 10.0), (185.0, 10.0), (185.0, 20.0), (175.0, 20.0)],
      [(175.0, 10.0), (-175.0, 10.0), (-175.0, 20.0), (175.0, 20.0)],
    ] {
      let g = sanitize(&ring(&pts), &SanitizeOptions::default()).unwrap();
      assert!(g.is_multi());
      assert_eq!(g.polygons().len(), 2);
      assert!(all_in_range(&g));
      assert!(g.contains_point(15.0, 178.0));
      assert!(g.contains_point(15.0, -178.0));
      assert!(!g.contains_point(15.0, 0.0));
    }
  }

  #[test]
  fn test_north_polar_cap() {
    let cap: Vec<(f64, f64)> = (0..8).map(|k| (-180.0 + 45.0 * f64::from(k), 80.0)).collect();
    let g = sanitize(&ring(&cap), &SanitizeOptions::default()).unwrap();
    let CellGeometry::Polygon(p) = &g else {
      panic!("expected a polygon")
    };
    assert!(all_in_range(&g));
    assert!(p.contains(&Point::new(10.0, 85.0)));
    assert!(p.contains(&Point::new(-170.0, 89.0)));
    assert!(!p.contains(&Point::new(10.0, 70.0)));
    assert!(p.exterior().coords().any(|c| c.y == 90.0));
  }

  #[test]
  fn test_south_cap_reversed_and_forced() {
    let cap: Vec<(f64, f64)> = (0..6).map(|k| (170.0 - 60.0 * f64::from(k), -75.0)).collect();
    let g = sanitize(&ring(&cap), &SanitizeOptions::default()).unwrap();
    assert!(g.contains_point(-85.0, 0.0));
    let opts = SanitizeOptions {
      force_north_pole: true,
      ..SanitizeOptions::default()
    };
    let g = sanitize(&ring(&cap), &opts).unwrap();
    assert!(g.contains_point(85.0, 0.0), "closed through the forced pole");
  }

  #[test]
  fn test_pole_vertex_expanded() {
    // octant with a vertex on the north pole
    let g = sanitize(&ring(&[(0.0, 0.0), (90.0, 0.0), (0.0, 90.0)]), &SanitizeOptions::default()).unwrap();
    let CellGeometry::Polygon(p) = &g else {
      panic!("expected a polygon")
    };
    assert_eq!(p.exterior().0.len(), 5);
    assert!(p.contains(&Point::new(45.0, 60.0)));
  }

  #[test]
  fn test_pole_edge_kept() {
    // graticule cell with its top edge on the south pole
    let g = sanitize(&ring(&[(0.0, -90.0), (45.0, -90.0), (45.0, -45.0), (0.0, -45.0)]), &SanitizeOptions::default())
      .unwrap();
    let CellGeometry::Polygon(p) = &g else {
      panic!("expected a polygon")
    };
    assert_eq!(p.exterior().0.len(), 5);
    assert!(g.contains_point(-60.0, 20.0));
    assert!(g.contains_point(-90.0, 20.0));
    assert!(!g.contains_point(-60.0, 50.0));
  }

  #[test]
  fn test_pole_edge_on_the_seam() {
    let east = sanitize(&ring(&[(135.0, 84.0), (180.0, 84.0), (180.0, 90.0), (135.0, 90.0)]), &SanitizeOptions::default())
      .unwrap();
    assert!(!east.is_multi());
    assert!(east.contains_point(89.0, 170.0));
    assert!(!east.contains_point(89.0, -170.0));
    let west = sanitize(&ring(&[(-180.0, 84.0), (-135.0, 84.0), (-135.0, 90.0), (-180.0, 90.0)]), &SanitizeOptions::default())
      .unwrap();
    assert!(west.contains_point(89.0, -170.0));
    assert!(all_in_range(&west));
  }

  #[test]
  fn test_seam_edge_leaves_no_sliver() {
    // western edge exactly on -180 with rounding noise past it
    let pts = [(-180.0, 0.0), (-90.0, 0.0), (-90.0, 45.0), (-180.000_000_000_000_1, 45.0), (-180.000_000_000_000_1, 20.0)];
    let g = sanitize(&ring(&pts), &SanitizeOptions::default()).unwrap();
    assert!(!g.is_multi());
    assert!(all_in_range(&g));
    assert!(g.contains_point(10.0, -120.0));
  }

  #[test]
  fn test_unfixable() {
    let square = ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
    let both = SanitizeOptions {
      force_north_pole: true,
      force_south_pole: true,
      fix_winding: true,
    };
    assert!(matches!(sanitize(&square, &both), Err(DggsError::UnfixableGeometry(_))));
    let bow_tie = ring(&[(0.0, 0.0), (1.0, 1.0), (1.0, 0.0), (0.0, 1.0)]);
    assert!(matches!(sanitize(&bow_tie, &SanitizeOptions::default()), Err(DggsError::UnfixableGeometry(_))));
    let twice: Vec<(f64, f64)> = (0..16).map(|k| (f64::from(k) * 45.0, 60.0)).collect();
    assert!(matches!(sanitize(&ring(&twice), &SanitizeOptions::default()), Err(DggsError::UnfixableGeometry(_))));
    assert!(sanitize(&ring(&[(0.0, 0.0), (1.0, 1.0)]), &SanitizeOptions::default()).is_err());
  }
}
