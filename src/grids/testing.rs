//! Codecs for exercising failure paths.

use super::geohash::GeohashCodec;
use super::{DggsCodec, RawRing};
use crate::types::{BBox, CellId, DggsKind, Result};

/// Geohash with crossed outlines for every cell under `s`.
pub(crate) struct TwistedGeohash;

impl DggsCodec for TwistedGeohash {
  fn kind(&self) -> DggsKind {
    DggsKind::Geohash
  }

  fn encode(&self, lat: f64, lon: f64, res: u8) -> Result<CellId> {
    GeohashCodec.encode(lat, lon, res)
  }

  fn decode(&self, cell: &CellId) -> Result<RawRing> {
    let ring = GeohashCodec.decode(cell)?;
    if cell.to_string().starts_with('s') {
      Ok(vec![ring[0], ring[2], ring[1], ring[3]])
    } else {
      Ok(ring)
    }
  }

  fn resolution(&self, cell: &CellId) -> Result<u8> {
    GeohashCodec.resolution(cell)
  }

  fn parent(&self, cell: &CellId) -> Result<Option<CellId>> {
    GeohashCodec.parent(cell)
  }

  fn children(&self, cell: &CellId, target: u8) -> Result<Vec<CellId>> {
    GeohashCodec.children(cell, target)
  }

  fn neighbors(&self, cell: &CellId) -> Result<Vec<CellId>> {
    GeohashCodec.neighbors(cell)
  }

  fn parse(&self, token: &str) -> Result<CellId> {
    GeohashCodec.parse(token)
  }

  fn roots(&self) -> Result<Vec<CellId>> {
    GeohashCodec.roots()
  }

  fn cover_bbox(&self, bbox: &BBox, res: u8) -> Result<Option<Vec<CellId>>> {
    GeohashCodec.cover_bbox(bbox, res)
  }

  fn cell_count(&self, res: u8) -> f64 {
    GeohashCodec.cell_count(res)
  }
}
