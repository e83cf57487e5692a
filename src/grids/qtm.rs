//! Quaternary Triangular Mesh on the spherical octahedron.
//!
//! Facets `1..=4` cover the northern hemisphere in 90 degree longitude
//! quadrants from -180, `5..=8` the southern one. Every triangle splits at its
//! great-circle edge midpoints into a central child `0` and corner children
//! `1`, `2`, `3`.

use super::{arc_ring, check_encode, descend_to, expect_kind, DggsCodec, RawRing};
use crate::math::Vec3d;
use crate::types::{CellId, DggsError, DggsKind, Result};

const MAX_RES: u8 = 24;
const INSIDE_EPS: f64 = 1e-12;

/// Spherical triangle, counter-clockwise seen from outside the sphere.
#[derive(Debug, Clone, Copy)]
struct Triangle([Vec3d; 3]);

impl Triangle {
  /// Facet `1..=8`.
  fn facet(facet: u8) -> Triangle {
    let q = (facet - 1) % 4;
    let lon_a = -180.0 + 90.0 * f64::from(q);
    let a = Vec3d::from_degrees(0.0, lon_a);
    let b = Vec3d::from_degrees(0.0, lon_a + 90.0);
    if facet <= 4 {
      Triangle([a, b, Vec3d::new(0.0, 0.0, 1.0)])
    } else {
      Triangle([a, Vec3d::new(0.0, 0.0, -1.0), b])
    }
  }

  fn child(&self, digit: u8) -> Triangle {
    let [v0, v1, v2] = self.0;
    let m01 = (v0 + v1).normalized();
    let m12 = (v1 + v2).normalized();
    let m20 = (v2 + v0).normalized();
    match digit {
      1 => Triangle([v0, m01, m20]),
      2 => Triangle([m01, v1, m12]),
      3 => Triangle([m20, m12, v2]),
      _ => Triangle([m01, m12, m20]),
    }
  }

  fn contains(&self, p: &Vec3d) -> bool {
    let [a, b, c] = self.0;
    [(a, b), (b, c), (c, a)]
      .iter()
      .all(|(u, v)| u.cross(v).normalized().dot(p) >= -INSIDE_EPS)
  }

  fn centroid(&self) -> Vec3d {
    let [a, b, c] = self.0;
    (a + b + c).normalized()
  }
}

fn facet_of(lat: f64, lon: f64) -> u8 {
  let quadrant = ((lon + 180.0) / 90.0).floor().clamp(0.0, 3.0) as u8;
  if lat >= 0.0 {
    quadrant + 1
  } else {
    quadrant + 5
  }
}

/// Validated digits of a token: facet first, then subdivision digits.
fn path_of(code: &str) -> Option<Vec<u8>> {
  let digits: Vec<u8> = code.bytes().map(|b| b.wrapping_sub(b'0')).collect();
  let (facet, rest) = digits.split_first()?;
  let ok = (1..=8).contains(facet) && rest.iter().all(|d| *d < 4) && digits.len() <= MAX_RES as usize;
  ok.then_some(digits)
}

fn format_path(path: &[u8]) -> String {
  path.iter().map(|d| char::from(b'0' + d)).collect()
}

fn triangle_of(path: &[u8]) -> Triangle {
  path[1..].iter().fold(Triangle::facet(path[0]), |t, d| t.child(*d))
}

fn locate(p: &Vec3d, facet: u8, res: u8) -> Vec<u8> {
  let mut path = Vec::with_capacity(res as usize);
  path.push(facet);
  let mut t = Triangle::facet(facet);
  for _ in 1..res {
    let digit = (1..=3).find(|d| t.child(*d).contains(p)).unwrap_or(0);
    t = t.child(digit);
    path.push(digit);
  }
  path
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QtmCodec;

impl QtmCodec {
  fn path(cell: &CellId) -> Result<Vec<u8>> {
    expect_kind(cell, DggsKind::Qtm)?;
    cell.as_text().and_then(path_of).ok_or_else(|| cell.invalid())
  }

  fn id(path: &[u8]) -> CellId {
    CellId::text(DggsKind::Qtm, format_path(path))
  }

  fn encode_point(p: &Vec3d, res: u8) -> CellId {
    let (lat, lon) = p.to_degrees();
    Self::id(&locate(p, facet_of(lat, lon), res))
  }
}

impl DggsCodec for QtmCodec {
  fn kind(&self) -> DggsKind {
    DggsKind::Qtm
  }

  fn encode(&self, lat: f64, lon: f64, res: u8) -> Result<CellId> {
    check_encode(self, lat, lon, res)?;
    let p = Vec3d::from_degrees(lat, lon);
    Ok(Self::id(&locate(&p, facet_of(lat, lon), res)))
  }

  /// Triangle vertices, with each great-circle edge densified by its length.
  fn decode(&self, cell: &CellId) -> Result<RawRing> {
    let path = Self::path(cell)?;
    Ok(arc_ring(&triangle_of(&path).0))
  }

  fn resolution(&self, cell: &CellId) -> Result<u8> {
    Self::path(cell).map(|p| p.len() as u8)
  }

  fn parent(&self, cell: &CellId) -> Result<Option<CellId>> {
    let path = Self::path(cell)?;
    Ok((path.len() > 1).then(|| Self::id(&path[..path.len() - 1])))
  }

  fn children(&self, cell: &CellId, target: u8) -> Result<Vec<CellId>> {
    descend_to(self, cell, target, |c| {
      let path = Self::path(c)?;
      if path.len() >= MAX_RES as usize {
        return Ok(Vec::new());
      }
      Ok(
        (0..4u8)
          .map(|d| {
            let mut p = path.clone();
            p.push(d);
            Self::id(&p)
          })
          .collect(),
      )
    })
  }

  /// The three triangles across each edge.
  fn neighbors(&self, cell: &CellId) -> Result<Vec<CellId>> {
    let path = Self::path(cell)?;
    let res = path.len() as u8;
    let t = triangle_of(&path);
    let c = t.centroid();
    let mut out: Vec<CellId> = Vec::with_capacity(3);
    for k in 0..3 {
      let mid = (t.0[k] + t.0[(k + 1) % 3]).normalized();
      let across = (mid + (mid - c) * 0.5).normalized();
      let n = Self::encode_point(&across, res);
      if n != *cell && !out.contains(&n) {
        out.push(n);
      }
    }
    Ok(out)
  }

  fn edges(&self, cell: &CellId) -> Result<usize> {
    Self::path(cell).map(|_| 3)
  }

  fn parse(&self, token: &str) -> Result<CellId> {
    let code: String = token.chars().filter(|c| !c.is_whitespace()).collect();
    path_of(&code)
      .filter(|p| self.res_bounds().contains(p.len() as u8))
      .map(|p| Self::id(&p))
      .ok_or_else(|| DggsError::InvalidCellToken {
        kind: DggsKind::Qtm,
        token: token.to_string(),
      })
  }

  fn roots(&self) -> Result<Vec<CellId>> {
    Ok((1..=8u8).map(|f| Self::id(&[f])).collect())
  }

  fn cell_count(&self, res: u8) -> f64 {
    8.0 * 4f64.powi(i32::from(res.max(1)) - 1)
  }
}
