//! Geohash: base-32 interleaved bisection of longitude and latitude.

use super::{check_encode, descend_to, expect_kind, graticule_scan, rect_ring, DggsCodec, RawRing};
use crate::latlng::wrap_lon_deg;
use crate::types::{BBox, CellId, DggsError, DggsKind, Result};

const ALPHABET: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";
const MAX_LEN: u8 = 12;

fn char_value(c: u8) -> Option<u64> {
  ALPHABET.iter().position(|a| *a == c).map(|p| p as u64)
}

/// Bounds of a geohash: `(lat_min, lon_min, lat_max, lon_max)`.
pub(crate) fn bounds(hash: &str) -> Option<(f64, f64, f64, f64)> {
  let (mut lat_lo, mut lat_hi) = (-90.0, 90.0);
  let (mut lon_lo, mut lon_hi) = (-180.0, 180.0);
  let mut even = true;
  for c in hash.bytes() {
    let v = char_value(c)?;
    for bit in (0..5).rev() {
      let on = (v >> bit) & 1 == 1;
      if even {
        let mid = (lon_lo + lon_hi) / 2.0;
        if on {
          lon_lo = mid;
        } else {
          lon_hi = mid;
        }
      } else {
        let mid = (lat_lo + lat_hi) / 2.0;
        if on {
          lat_lo = mid;
        } else {
          lat_hi = mid;
        }
      }
      even = !even;
    }
  }
  Some((lat_lo, lon_lo, lat_hi, lon_hi))
}

/// Geohash of length `len` for a point.
pub(crate) fn encode_hash(lat: f64, lon: f64, len: u8) -> String {
  let (mut lat_lo, mut lat_hi) = (-90.0, 90.0);
  let (mut lon_lo, mut lon_hi) = (-180.0, 180.0);
  let mut even = true;
  let mut out = String::with_capacity(len as usize);
  for _ in 0..len {
    let mut v = 0usize;
    for _ in 0..5 {
      v <<= 1;
      if even {
        let mid = (lon_lo + lon_hi) / 2.0;
        if lon >= mid {
          v |= 1;
          lon_lo = mid;
        } else {
          lon_hi = mid;
        }
      } else {
        let mid = (lat_lo + lat_hi) / 2.0;
        if lat >= mid {
          v |= 1;
          lat_lo = mid;
        } else {
          lat_hi = mid;
        }
      }
      even = !even;
    }
    out.push(char::from(ALPHABET[v]));
  }
  out
}

/// Cell size in degrees `(lat, lon)` at a length.
fn cell_size(len: u8) -> (f64, f64) {
  let bits = 5 * i32::from(len);
  let lon_bits = (bits + 1) / 2;
  let lat_bits = bits / 2;
  (180.0 / 2f64.powi(lat_bits), 360.0 / 2f64.powi(lon_bits))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GeohashCodec;

impl GeohashCodec {
  fn hash(cell: &CellId) -> Result<&str> {
    expect_kind(cell, DggsKind::Geohash)?;
    let s = cell.as_text().ok_or_else(|| cell.invalid())?;
    if s.is_empty() || s.len() > MAX_LEN as usize || bounds(s).is_none() {
      return Err(cell.invalid());
    }
    Ok(s)
  }

  fn id(hash: String) -> CellId {
    CellId::text(DggsKind::Geohash, hash)
  }
}

impl DggsCodec for GeohashCodec {
  fn kind(&self) -> DggsKind {
    DggsKind::Geohash
  }

  fn encode(&self, lat: f64, lon: f64, res: u8) -> Result<CellId> {
    check_encode(self, lat, lon, res)?;
    Ok(Self::id(encode_hash(lat, lon, res)))
  }

  fn decode(&self, cell: &CellId) -> Result<RawRing> {
    let (lat_min, lon_min, lat_max, lon_max) = bounds(Self::hash(cell)?).ok_or_else(|| cell.invalid())?;
    Ok(rect_ring(lat_min, lon_min, lat_max, lon_max))
  }

  fn resolution(&self, cell: &CellId) -> Result<u8> {
    Self::hash(cell).map(|s| s.len() as u8)
  }

  fn parent(&self, cell: &CellId) -> Result<Option<CellId>> {
    let s = Self::hash(cell)?;
    Ok((s.len() > 1).then(|| Self::id(s[..s.len() - 1].to_string())))
  }

  fn children(&self, cell: &CellId, target: u8) -> Result<Vec<CellId>> {
    descend_to(self, cell, target, |c| {
      let s = Self::hash(c)?;
      Ok(
        ALPHABET
          .iter()
          .map(|a| {
            let mut child = String::with_capacity(s.len() + 1);
            child.push_str(s);
            child.push(char::from(*a));
            Self::id(child)
          })
          .collect(),
      )
    })
  }

  /// Edge and corner neighbours; cells past the poles are dropped.
  fn neighbors(&self, cell: &CellId) -> Result<Vec<CellId>> {
    let s = Self::hash(cell)?;
    let (lat_min, lon_min, lat_max, lon_max) = bounds(s).ok_or_else(|| cell.invalid())?;
    let (dlat, dlon) = (lat_max - lat_min, lon_max - lon_min);
    let (clat, clon) = ((lat_min + lat_max) / 2.0, (lon_min + lon_max) / 2.0);
    let mut out: Vec<CellId> = Vec::with_capacity(8);
    for (di, dj) in [(1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0), (-1, -1), (0, -1), (1, -1)] {
      let lat = clat + f64::from(di) * dlat;
      if !(-90.0..=90.0).contains(&lat) {
        continue;
      }
      let lon = wrap_lon_deg(clon + f64::from(dj) * dlon);
      let n = Self::id(encode_hash(lat, lon, s.len() as u8));
      if n.as_text() != Some(s) && !out.contains(&n) {
        out.push(n);
      }
    }
    Ok(out)
  }

  fn parse(&self, token: &str) -> Result<CellId> {
    let hash = token.trim().to_ascii_lowercase();
    let len_ok = (1..=MAX_LEN as usize).contains(&hash.len());
    if !len_ok || bounds(&hash).is_none() {
      return Err(DggsError::InvalidCellToken {
        kind: DggsKind::Geohash,
        token: token.to_string(),
      });
    }
    Ok(Self::id(hash))
  }

  fn roots(&self) -> Result<Vec<CellId>> {
    Ok(ALPHABET.iter().map(|a| Self::id(char::from(*a).to_string())).collect())
  }

  fn cover_bbox(&self, bbox: &BBox, res: u8) -> Result<Option<Vec<CellId>>> {
    self.validate_resolution(res)?;
    let (dlat, dlon) = cell_size(res);
    let cells = graticule_scan(bbox, dlat, dlon)
      .into_iter()
      .map(|(lat, lon)| Self::id(encode_hash(lat + dlat / 2.0, lon + dlon / 2.0, res)))
      .collect();
    Ok(Some(cells))
  }

  fn cell_count(&self, res: u8) -> f64 {
    32f64.powi(i32::from(res))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_london() {
    let cell = GeohashCodec.encode(51.5074, -0.1278, 7).unwrap();
    assert_eq!(cell.to_string(), "gcpvj0d");
    let (lat_min, lon_min, lat_max, lon_max) = bounds("gcpvj0d").unwrap();
    assert!((lat_min..=lat_max).contains(&51.5074));
    assert!((lon_min..=lon_max).contains(&-0.1278));
  }

  #[test]
  fn test_parse_lowercases() {
    assert_eq!(GeohashCodec.parse(" GCPVJ ").unwrap().to_string(), "gcpvj");
    assert!(GeohashCodec.parse("gcpa").is_err(), "a is not in the alphabet");
    assert!(GeohashCodec.parse("").is_err());
  }

  #[test]
  fn test_hierarchy() {
    let cell = GeohashCodec.parse("gcpv").unwrap();
    assert_eq!(GeohashCodec.parent(&cell).unwrap().unwrap().to_string(), "gcp");
    assert_eq!(GeohashCodec.children(&cell, 5).unwrap().len(), 32);
    assert!(GeohashCodec.parent(&GeohashCodec.parse("g").unwrap()).unwrap().is_none());
  }

  #[test]
  fn test_neighbors() {
    let cell = GeohashCodec.parse("gcpvj0e").unwrap();
    let ns = GeohashCodec.neighbors(&cell).unwrap();
    assert_eq!(ns.len(), 8);
    let north_pole_cell = GeohashCodec.encode(89.99, 0.0, 2).unwrap();
    assert_eq!(GeohashCodec.neighbors(&north_pole_cell).unwrap().len(), 5);
  }

  #[test]
  fn test_cover_bbox_world_res1() {
    let cells = GeohashCodec.cover_bbox(&BBox::world(), 1).unwrap().unwrap();
    assert_eq!(cells.len(), 32);
  }

  #[test]
  fn test_polar_cells_have_geometry() {
    let south = GeohashCodec.parse("h").unwrap();
    let g = crate::geometry::cell_geometry(&GeohashCodec, &south).unwrap();
    assert!(g.contains_point(-60.0, 20.0));
    for (lat, lon) in [(90.0, 0.0), (-90.0, 0.0), (90.0, 179.9), (-90.0, -180.0)] {
      for res in 1..=4 {
        let cell = GeohashCodec.encode(lat, lon, res).unwrap();
        let g = crate::geometry::cell_geometry(&GeohashCodec, &cell).unwrap();
        assert!(g.contains_point(lat, lon), "{cell}");
      }
    }
  }
}
