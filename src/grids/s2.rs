//! S2 cells: six cube faces under a quadratic projection, each ordered by a
//! 30 level Hilbert curve.

use super::{arc_ring, check_encode, descend_to, expect_kind, DggsCodec, RawRing};
use crate::math::Vec3d;
use crate::types::{CellId, DggsError, DggsKind, Result};

pub const MAX_LEVEL: u8 = 30;
const MAX_SIZE: u32 = 1 << MAX_LEVEL;
const POS_BITS: u32 = 2 * MAX_LEVEL as u32 + 1;

const SWAP_MASK: u8 = 1;
const INVERT_MASK: u8 = 2;

/// Hilbert position of an `(i, j)` quadrant, by orientation.
const IJ_TO_POS: [[u8; 4]; 4] = [[0, 1, 3, 2], [0, 3, 1, 2], [2, 3, 1, 0], [2, 1, 3, 0]];
/// Quadrant `(i << 1 | j)` at a Hilbert position, by orientation.
const POS_TO_IJ: [[u8; 4]; 4] = [[0, 1, 3, 2], [0, 2, 3, 1], [3, 2, 0, 1], [3, 1, 0, 2]];
/// Orientation change after each position.
const POS_TO_ORIENTATION: [u8; 4] = [SWAP_MASK, 0, 0, INVERT_MASK | SWAP_MASK];

fn face_of(p: &Vec3d) -> u8 {
  let (ax, ay, az) = (p.x.abs(), p.y.abs(), p.z.abs());
  let (axis, value) = if ax > ay {
    if ax > az {
      (0, p.x)
    } else {
      (2, p.z)
    }
  } else if ay > az {
    (1, p.y)
  } else {
    (2, p.z)
  };
  if value < 0.0 {
    axis + 3
  } else {
    axis
  }
}

fn xyz_to_face_uv(p: &Vec3d) -> (u8, f64, f64) {
  let face = face_of(p);
  let (u, v) = match face {
    0 => (p.y / p.x, p.z / p.x),
    1 => (-p.x / p.y, p.z / p.y),
    2 => (-p.x / p.z, -p.y / p.z),
    3 => (p.z / p.x, p.y / p.x),
    4 => (p.z / p.y, -p.x / p.y),
    _ => (-p.y / p.z, -p.x / p.z),
  };
  (face, u, v)
}

fn face_uv_to_xyz(face: u8, u: f64, v: f64) -> Vec3d {
  match face {
    0 => Vec3d::new(1.0, u, v),
    1 => Vec3d::new(-u, 1.0, v),
    2 => Vec3d::new(-u, -v, 1.0),
    3 => Vec3d::new(-1.0, -v, -u),
    4 => Vec3d::new(v, -1.0, -u),
    _ => Vec3d::new(v, u, -1.0),
  }
}

fn uv_to_st(u: f64) -> f64 {
  if u >= 0.0 {
    0.5 * (1.0 + 3.0 * u).sqrt()
  } else {
    1.0 - 0.5 * (1.0 - 3.0 * u).sqrt()
  }
}

fn st_to_uv(s: f64) -> f64 {
  if s >= 0.5 {
    (4.0 * s * s - 1.0) / 3.0
  } else {
    (1.0 - 4.0 * (1.0 - s) * (1.0 - s)) / 3.0
  }
}

fn st_to_ij(s: f64) -> u32 {
  ((s * f64::from(MAX_SIZE)).floor().max(0.0) as u32).min(MAX_SIZE - 1)
}

/// Lowest set bit of a cell at `level`.
fn lsb_for_level(level: u8) -> u64 {
  1u64 << (2 * u32::from(MAX_LEVEL - level))
}

/// Leaf cell id of face coordinates.
fn from_face_ij(face: u8, i: u32, j: u32) -> u64 {
  let mut orientation = face & SWAP_MASK;
  let mut pos = 0u64;
  for k in (0..u32::from(MAX_LEVEL)).rev() {
    let ij = ((((i >> k) & 1) << 1) | ((j >> k) & 1)) as usize;
    let p = IJ_TO_POS[orientation as usize][ij];
    pos = (pos << 2) | u64::from(p);
    orientation ^= POS_TO_ORIENTATION[p as usize];
  }
  (u64::from(face) << POS_BITS) | (pos << 1) | 1
}

/// Cell id at `level` containing a unit vector.
fn from_point(p: &Vec3d, level: u8) -> u64 {
  let (face, u, v) = xyz_to_face_uv(p);
  let leaf = from_face_ij(face, st_to_ij(uv_to_st(u)), st_to_ij(uv_to_st(v)));
  parent_at(leaf, level)
}

fn parent_at(id: u64, level: u8) -> u64 {
  let lsb = lsb_for_level(level);
  (id & lsb.wrapping_neg()) | lsb
}

#[must_use]
pub fn is_valid(id: u64) -> bool {
  id != 0 && (id >> POS_BITS) < 6 && id.trailing_zeros() % 2 == 0
}

#[must_use]
pub fn level(id: u64) -> u8 {
  MAX_LEVEL - (id.trailing_zeros() / 2) as u8
}

/// Face and the `(i, j)` of the cell at its own level.
fn to_face_ij(id: u64) -> (u8, u32, u32) {
  let face = (id >> POS_BITS) as u8;
  let mut orientation = face & SWAP_MASK;
  let (mut i, mut j) = (0u32, 0u32);
  for k in 0..u32::from(level(id)) {
    let pos = ((id >> (POS_BITS - 2 - 2 * k)) & 3) as usize;
    let ij = POS_TO_IJ[orientation as usize][pos];
    i = (i << 1) | u32::from(ij >> 1);
    j = (j << 1) | u32::from(ij & 1);
    orientation ^= POS_TO_ORIENTATION[pos];
  }
  (face, i, j)
}

/// Unit vector at face coordinates `(s, t)` in `[0, 1]`, or slightly beyond.
fn st_point(face: u8, s: f64, t: f64) -> Vec3d {
  face_uv_to_xyz(face, st_to_uv(s), st_to_uv(t)).normalized()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct S2Codec;

impl S2Codec {
  fn id_of(cell: &CellId) -> Result<u64> {
    expect_kind(cell, DggsKind::S2)?;
    cell.as_u64().filter(|id| is_valid(*id)).ok_or_else(|| cell.invalid())
  }

  fn id(raw: u64) -> CellId {
    CellId::int(DggsKind::S2, raw)
  }
}

impl DggsCodec for S2Codec {
  fn kind(&self) -> DggsKind {
    DggsKind::S2
  }

  fn encode(&self, lat: f64, lon: f64, res: u8) -> Result<CellId> {
    check_encode(self, lat, lon, res)?;
    Ok(Self::id(from_point(&Vec3d::from_degrees(lat, lon), res)))
  }

  /// Corners in counter-clockwise order. Cell edges lie on great circles
  /// and are densified by their length.
  fn decode(&self, cell: &CellId) -> Result<RawRing> {
    let id = Self::id_of(cell)?;
    let (face, i, j) = to_face_ij(id);
    let size = 1.0 / f64::from(1u32 << level(id));
    let (s0, t0) = (f64::from(i) * size, f64::from(j) * size);
    let corners = [(s0, t0), (s0 + size, t0), (s0 + size, t0 + size), (s0, t0 + size)].map(|(s, t)| st_point(face, s, t));
    Ok(arc_ring(&corners))
  }

  fn resolution(&self, cell: &CellId) -> Result<u8> {
    Self::id_of(cell).map(level)
  }

  fn parent(&self, cell: &CellId) -> Result<Option<CellId>> {
    let id = Self::id_of(cell)?;
    let lvl = level(id);
    Ok((lvl > 0).then(|| Self::id(parent_at(id, lvl - 1))))
  }

  fn children(&self, cell: &CellId, target: u8) -> Result<Vec<CellId>> {
    descend_to(self, cell, target, |c| {
      let id = Self::id_of(c)?;
      if level(id) >= MAX_LEVEL {
        return Ok(Vec::new());
      }
      let lsb = id & id.wrapping_neg();
      let step = lsb >> 1;
      let first = id - lsb + (lsb >> 2);
      Ok((0..4).map(|k| Self::id(first + k * step)).collect())
    })
  }

  /// The four cells sharing an edge, wrapping across cube faces.
  fn neighbors(&self, cell: &CellId) -> Result<Vec<CellId>> {
    let id = Self::id_of(cell)?;
    let lvl = level(id);
    let (face, i, j) = to_face_ij(id);
    let n = f64::from(1u32 << lvl);
    let (ci, cj) = (f64::from(i) + 0.5, f64::from(j) + 0.5);
    // centres of the four edge-adjacent cells, possibly off this face
    let beyond = [(ci, cj - 1.0), (ci + 1.0, cj), (ci, cj + 1.0), (ci - 1.0, cj)];
    let mut out: Vec<CellId> = Vec::with_capacity(4);
    for (pi, pj) in beyond {
      let p = st_point(face, pi / n, pj / n);
      let nid = Self::id(from_point(&p, lvl));
      if nid.as_u64() != Some(id) && !out.contains(&nid) {
        out.push(nid);
      }
    }
    Ok(out)
  }

  fn edges(&self, cell: &CellId) -> Result<usize> {
    Self::id_of(cell).map(|_| 4)
  }

  /// Accepts hex tokens with or without trailing zeros.
  fn parse(&self, token: &str) -> Result<CellId> {
    let t = token.trim().to_ascii_lowercase();
    let bad = || DggsError::InvalidCellToken {
      kind: DggsKind::S2,
      token: token.to_string(),
    };
    if t.is_empty() || t.len() > 16 {
      return Err(bad());
    }
    let raw = u64::from_str_radix(&t, 16).map_err(|_| bad())? << (4 * (16 - t.len()));
    if is_valid(raw) {
      Ok(Self::id(raw))
    } else {
      Err(bad())
    }
  }

  fn roots(&self) -> Result<Vec<CellId>> {
    Ok((0..6u64).map(|face| Self::id((face << POS_BITS) | (1u64 << (POS_BITS - 1)))).collect())
  }

  fn cell_count(&self, res: u8) -> f64 {
    6.0 * 4f64.powi(i32::from(res.min(MAX_LEVEL)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use geo::{Contains, LineString, Point, Polygon};

  #[test]
  fn test_face_roots() {
    let roots = S2Codec.roots().unwrap();
    assert_eq!(roots[0].to_string(), "1");
    assert_eq!(roots[1].to_string(), "3");
    assert_eq!(roots[5].to_string(), "b");
    for r in &roots {
      assert_eq!(S2Codec.resolution(r).unwrap(), 0);
    }
  }

  #[test]
  fn test_faces_of_axes() {
    assert_eq!(face_of(&Vec3d::from_degrees(0.0, 0.0)), 0);
    assert_eq!(face_of(&Vec3d::from_degrees(0.0, 90.0)), 1);
    assert_eq!(face_of(&Vec3d::from_degrees(90.0, 0.0)), 2);
    assert_eq!(face_of(&Vec3d::from_degrees(0.0, 180.0)), 3);
    assert_eq!(face_of(&Vec3d::from_degrees(-90.0, 0.0)), 5);
  }

  #[test]
  fn test_ij_round_trip() {
    for (face, i, j) in [(0u8, 0u32, 0u32), (1, 12345, 987_654), (5, MAX_SIZE - 1, 7)] {
      let id = from_face_ij(face, i, j);
      assert_eq!(level(id), 30);
      assert_eq!(to_face_ij(id), (face, i, j));
    }
  }

  #[test]
  fn test_encode_decode_contains() {
    for (lat, lon) in [(40.7128, -74.006), (-33.86, 151.2), (0.1, 0.1), (70.0, -150.0)] {
      let cell = S2Codec.encode(lat, lon, 10).unwrap();
      let ring: Vec<(f64, f64)> = S2Codec.decode(&cell).unwrap().iter().map(|c| (c.x, c.y)).collect();
      let poly = Polygon::new(LineString::from(ring), vec![]);
      assert!(poly.contains(&Point::new(lon, lat)), "{cell} contains {lat},{lon}");
    }
  }

  #[test]
  fn test_hierarchy() {
    let cell = S2Codec.encode(40.7128, -74.006, 12).unwrap();
    let parent = S2Codec.parent(&cell).unwrap().unwrap();
    assert_eq!(S2Codec.resolution(&parent).unwrap(), 11);
    let kids = S2Codec.children(&parent, 12).unwrap();
    assert_eq!(kids.len(), 4);
    assert!(kids.contains(&cell));
    for k in &kids {
      assert_eq!(S2Codec.parent(k).unwrap().as_ref(), Some(&parent));
    }
  }

  #[test]
  fn test_parse_tokens() {
    let cell = S2Codec.encode(40.7128, -74.006, 12).unwrap();
    let token = cell.to_string();
    assert_eq!(S2Codec.parse(&token.to_ascii_uppercase()).unwrap(), cell);
    assert!(S2Codec.parse("X").is_err());
    assert!(S2Codec.parse("e").is_err(), "face 7");
  }

  #[test]
  fn test_neighbors_across_faces() {
    let face0 = S2Codec.roots().unwrap()[0].clone();
    let ns = S2Codec.neighbors(&face0).unwrap();
    assert_eq!(ns.len(), 4);
    let names: Vec<String> = ns.iter().map(ToString::to_string).collect();
    assert!(!names.contains(&"7".to_string()), "opposite face is not adjacent");
    let cell = S2Codec.encode(10.0, 20.0, 8).unwrap();
    for n in S2Codec.neighbors(&cell).unwrap() {
      assert!(S2Codec.neighbors(&n).unwrap().contains(&cell), "symmetric");
    }
  }

  #[test]
  fn test_decoded_geometry_contains_point_at_coarse_levels() {
    for (lat, lon) in [(40.7128, -74.006), (-33.86, 151.2), (52.0, 179.99), (-89.7, -100.0), (89.7, 10.0)] {
      for res in 0..=20 {
        let cell = S2Codec.encode(lat, lon, res).unwrap();
        let g = crate::geometry::cell_geometry(&S2Codec, &cell).unwrap();
        assert!(g.contains_point(lat, lon), "({lat}, {lon}) outside {cell}");
      }
    }
  }
}
