//! H3 hexagonal grid: icosahedral gnomonic faces, aperture 7, alternating
//! Class II / Class III orientation and twelve pentagons per resolution.

mod base_cells;
mod face_ijk;
mod ijk;
mod index;
mod neighbors;

pub use face_ijk::FaceIJK;
pub use ijk::{CoordIJK, Direction};
pub use index::H3Index;

use super::{arc_ring, check_encode, descend_to, expect_kind, DggsCodec, RawRing};
use crate::constants::{MAX_H3_RES, NUM_BASE_CELLS};
use crate::latlng::LatLng;
use crate::math::Vec3d;
use crate::types::{CellId, DggsError, DggsKind, Result};

/// Native H3 codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct H3Codec;

impl H3Codec {
  /// Validated index of a cell.
  pub fn index(cell: &CellId) -> Result<H3Index> {
    expect_kind(cell, DggsKind::H3)?;
    let h = cell.as_u64().map(H3Index).ok_or_else(|| cell.invalid())?;
    if h.is_valid() {
      Ok(h)
    } else {
      Err(cell.invalid())
    }
  }

  fn id(h: H3Index) -> CellId {
    CellId::int(DggsKind::H3, h.0)
  }
}

impl DggsCodec for H3Codec {
  fn kind(&self) -> DggsKind {
    DggsKind::H3
  }

  fn encode(&self, lat: f64, lon: f64, res: u8) -> Result<CellId> {
    check_encode(self, lat, lon, res)?;
    H3Index::from_geo(&LatLng::from_degrees(lat, lon), res)
      .map(Self::id)
      .ok_or(DggsError::InvalidCoordinate { lat, lon })
  }

  /// Boundary vertices joined by great-circle arcs, densified on long edges.
  fn decode(&self, cell: &CellId) -> Result<RawRing> {
    let h = Self::index(cell)?;
    let corners: Vec<Vec3d> = h.boundary().iter().map(|v| Vec3d::from_lat_lng_rads(v.lat, v.lng)).collect();
    Ok(arc_ring(&corners))
  }

  fn resolution(&self, cell: &CellId) -> Result<u8> {
    Self::index(cell).map(H3Index::resolution)
  }

  fn parent(&self, cell: &CellId) -> Result<Option<CellId>> {
    let h = Self::index(cell)?;
    let res = h.resolution();
    if res == 0 {
      return Ok(None);
    }
    Ok(h.parent(res - 1).map(Self::id))
  }

  fn children(&self, cell: &CellId, target: u8) -> Result<Vec<CellId>> {
    descend_to(self, cell, target, |c| {
      Ok(Self::index(c)?.direct_children().into_iter().map(Self::id).collect())
    })
  }

  fn neighbors(&self, cell: &CellId) -> Result<Vec<CellId>> {
    let h = Self::index(cell)?;
    Ok(neighbors::edge_neighbors(h).into_iter().map(Self::id).collect())
  }

  fn edges(&self, cell: &CellId) -> Result<usize> {
    Ok(if Self::index(cell)?.is_pentagon() { 5 } else { 6 })
  }

  fn parse(&self, token: &str) -> Result<CellId> {
    let trimmed = token.trim();
    let hex = trimmed
      .strip_prefix("0x")
      .or_else(|| trimmed.strip_prefix("0X"))
      .unwrap_or(trimmed);
    let bad = || DggsError::InvalidCellToken {
      kind: DggsKind::H3,
      token: token.to_string(),
    };
    let value = u64::from_str_radix(hex, 16).map_err(|_| bad())?;
    if H3Index(value).is_valid() {
      Ok(Self::id(H3Index(value)))
    } else {
      Err(bad())
    }
  }

  fn roots(&self) -> Result<Vec<CellId>> {
    Ok((0..NUM_BASE_CELLS as u8).map(|bc| Self::id(H3Index::from_base_cell(bc))).collect())
  }

  // children of a hexagon overhang it by up to a third of its width
  fn descent_margin(&self) -> f64 {
    0.5
  }

  fn cell_count(&self, res: u8) -> f64 {
    2.0 + 120.0 * 7f64.powi(i32::from(res.min(MAX_H3_RES)))
  }
}
