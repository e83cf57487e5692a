//! Maidenhead locator: field, square, subsquare and extended square pairs.

use super::{check_encode, descend_to, expect_kind, graticule_scan, rect_ring, DggsCodec, RawRing};
use crate::latlng::wrap_lon_deg;
use crate::types::{BBox, CellId, DggsError, DggsKind, Result};

/// Divisions per axis at each pair.
const DIVISIONS: [u32; 4] = [18, 10, 24, 10];

/// Cell size in degrees `(lat, lon)` after `pairs` pairs.
fn cell_size(pairs: u8) -> (f64, f64) {
  let mut lat = 180.0;
  let mut lon = 360.0;
  for d in &DIVISIONS[..pairs as usize] {
    lat /= f64::from(*d);
    lon /= f64::from(*d);
  }
  (lat, lon)
}

fn pair_chars(level: usize, lon_idx: u32, lat_idx: u32) -> [char; 2] {
  let base = match level {
    0 => b'A',
    2 => b'a',
    _ => b'0',
  };
  [char::from(base + lon_idx as u8), char::from(base + lat_idx as u8)]
}

/// `(lon_idx, lat_idx)` per pair, validated.
fn parse_pairs(locator: &str) -> Option<Vec<(u32, u32)>> {
  let bytes = locator.as_bytes();
  if bytes.is_empty() || bytes.len() % 2 == 1 || bytes.len() > 8 {
    return None;
  }
  bytes
    .chunks(2)
    .enumerate()
    .map(|(level, pair)| {
      let base = match level {
        0 => b'A',
        2 => b'a',
        _ => b'0',
      };
      let lon = u32::from(pair[0].checked_sub(base)?);
      let lat = u32::from(pair[1].checked_sub(base)?);
      (lon < DIVISIONS[level] && lat < DIVISIONS[level]).then_some((lon, lat))
    })
    .collect()
}

fn format_pairs(pairs: &[(u32, u32)]) -> String {
  pairs
    .iter()
    .enumerate()
    .flat_map(|(level, (lon, lat))| pair_chars(level, *lon, *lat))
    .collect()
}

fn locate(lat: f64, lon: f64, pairs: u8) -> Vec<(u32, u32)> {
  let mut x = (wrap_lon_deg(lon) + 180.0) / 360.0;
  let mut y = ((lat + 90.0) / 180.0).min(1.0 - f64::EPSILON);
  DIVISIONS[..pairs as usize]
    .iter()
    .map(|d| {
      let d = f64::from(*d);
      let xi = (x * d).floor().clamp(0.0, d - 1.0);
      let yi = (y * d).floor().clamp(0.0, d - 1.0);
      x = x * d - xi;
      y = y * d - yi;
      (xi as u32, yi as u32)
    })
    .collect()
}

fn bounds(pairs: &[(u32, u32)]) -> (f64, f64, f64, f64) {
  let (mut lat, mut lon) = (-90.0, -180.0);
  for (level, (x, y)) in pairs.iter().enumerate() {
    let (dlat, dlon) = cell_size(level as u8 + 1);
    lon += f64::from(*x) * dlon;
    lat += f64::from(*y) * dlat;
  }
  let (dlat, dlon) = cell_size(pairs.len() as u8);
  (lat, lon, lat + dlat, lon + dlon)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MaidenheadCodec;

impl MaidenheadCodec {
  fn pairs(cell: &CellId) -> Result<Vec<(u32, u32)>> {
    expect_kind(cell, DggsKind::Maidenhead)?;
    cell.as_text().and_then(parse_pairs).ok_or_else(|| cell.invalid())
  }

  fn id(pairs: &[(u32, u32)]) -> CellId {
    CellId::text(DggsKind::Maidenhead, format_pairs(pairs))
  }
}

impl DggsCodec for MaidenheadCodec {
  fn kind(&self) -> DggsKind {
    DggsKind::Maidenhead
  }

  fn encode(&self, lat: f64, lon: f64, res: u8) -> Result<CellId> {
    check_encode(self, lat, lon, res)?;
    Ok(Self::id(&locate(lat, lon, res)))
  }

  fn decode(&self, cell: &CellId) -> Result<RawRing> {
    let (lat_min, lon_min, lat_max, lon_max) = bounds(&Self::pairs(cell)?);
    Ok(rect_ring(lat_min, lon_min, lat_max, lon_max))
  }

  fn resolution(&self, cell: &CellId) -> Result<u8> {
    Self::pairs(cell).map(|p| p.len() as u8)
  }

  fn parent(&self, cell: &CellId) -> Result<Option<CellId>> {
    let pairs = Self::pairs(cell)?;
    Ok((pairs.len() > 1).then(|| Self::id(&pairs[..pairs.len() - 1])))
  }

  fn children(&self, cell: &CellId, target: u8) -> Result<Vec<CellId>> {
    descend_to(self, cell, target, |c| {
      let pairs = Self::pairs(c)?;
      let d = DIVISIONS.get(pairs.len()).copied().unwrap_or(0);
      let mut out = Vec::with_capacity((d * d) as usize);
      for x in 0..d {
        for y in 0..d {
          let mut child = pairs.clone();
          child.push((x, y));
          out.push(Self::id(&child));
        }
      }
      Ok(out)
    })
  }

  fn neighbors(&self, cell: &CellId) -> Result<Vec<CellId>> {
    let pairs = Self::pairs(cell)?;
    let (lat_min, lon_min, lat_max, lon_max) = bounds(&pairs);
    let (dlat, dlon) = (lat_max - lat_min, lon_max - lon_min);
    let (clat, clon) = ((lat_min + lat_max) / 2.0, (lon_min + lon_max) / 2.0);
    let own = Self::id(&pairs);
    let mut out: Vec<CellId> = Vec::with_capacity(8);
    for (di, dj) in [(1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0), (-1, -1), (0, -1), (1, -1)] {
      let lat = clat + f64::from(di) * dlat;
      if !(-90.0..=90.0).contains(&lat) {
        continue;
      }
      let n = Self::id(&locate(lat, clon + f64::from(dj) * dlon, pairs.len() as u8));
      if n != own && !out.contains(&n) {
        out.push(n);
      }
    }
    Ok(out)
  }

  /// Field letters upper case, subsquare letters lower case.
  fn parse(&self, token: &str) -> Result<CellId> {
    let raw = token.trim();
    let normalised: String = raw
      .chars()
      .enumerate()
      .map(|(i, c)| {
        if i / 2 == 2 {
          c.to_ascii_lowercase()
        } else {
          c.to_ascii_uppercase()
        }
      })
      .collect();
    let pairs = parse_pairs(&normalised).ok_or_else(|| DggsError::InvalidCellToken {
      kind: DggsKind::Maidenhead,
      token: token.to_string(),
    })?;
    Ok(Self::id(&pairs))
  }

  fn roots(&self) -> Result<Vec<CellId>> {
    let mut out = Vec::with_capacity(324);
    for x in 0..DIVISIONS[0] {
      for y in 0..DIVISIONS[0] {
        out.push(Self::id(&[(x, y)]));
      }
    }
    Ok(out)
  }

  fn cover_bbox(&self, bbox: &BBox, res: u8) -> Result<Option<Vec<CellId>>> {
    self.validate_resolution(res)?;
    let (dlat, dlon) = cell_size(res);
    let cells = graticule_scan(bbox, dlat, dlon)
      .into_iter()
      .map(|(lat, lon)| Self::id(&locate(lat + dlat / 2.0, lon + dlon / 2.0, res)))
      .collect();
    Ok(Some(cells))
  }

  fn cell_count(&self, res: u8) -> f64 {
    let (dlat, dlon) = cell_size(res.min(4));
    (180.0 / dlat) * (360.0 / dlon)
  }
}
