//! World Geographic Reference System: 15 degree tiles, 1 degree letters,
//! then longitude and latitude minutes with growing decimal precision.

use super::{check_encode, descend_to, expect_kind, graticule_scan, rect_ring, DggsCodec, RawRing};
use crate::latlng::wrap_lon_deg;
use crate::types::{BBox, CellId, DggsError, DggsKind, Result};

const TILE_LON: &[u8; 24] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const TILE_LAT: &[u8; 12] = b"ABCDEFGHJKLM";
const DEGREE: &[u8; 15] = b"ABCDEFGHJKLMNPQ";
const MAX_RES: u8 = 5;

/// Cell edge in degrees at a resolution.
fn cell_size(res: u8) -> f64 {
  match res {
    0 => 15.0,
    1 => 1.0,
    r => 10f64.powi(2 - i32::from(r)) / 60.0,
  }
}

/// Cell address in units of the cell edge from (-90, -180).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Georef {
  res: u8,
  x: u64,
  y: u64,
}

/// Cells per degree at resolutions 2 and above.
fn per_degree(res: u8) -> u64 {
  60 * 10u64.pow(u32::from(res) - 2)
}

impl Georef {
  fn locate(lat: f64, lon: f64, res: u8) -> Georef {
    let size = cell_size(res);
    let nx = (360.0 / size).round() as u64;
    let ny = (180.0 / size).round() as u64;
    let x = (((wrap_lon_deg(lon) + 180.0) / size).floor() as u64).min(nx - 1);
    let y = ((((lat + 90.0) / size).floor()).max(0.0) as u64).min(ny - 1);
    Georef { res, x, y }
  }

  fn bounds(self) -> (f64, f64, f64, f64) {
    let size = cell_size(self.res);
    let lon = -180.0 + self.x as f64 * size;
    let lat = -90.0 + self.y as f64 * size;
    (lat, lon, lat + size, lon + size)
  }

  /// Same point one resolution up.
  fn coarser(self) -> Option<Georef> {
    let (x, y) = match self.res {
      0 => return None,
      1 => (self.x / 15, self.y / 15),
      2 => (self.x / 60, self.y / 60),
      _ => (self.x / 10, self.y / 10),
    };
    Some(Georef { res: self.res - 1, x, y })
  }

  fn fan_out(self) -> u64 {
    match self.res {
      0 => 15,
      1 => 60,
      _ => 10,
    }
  }

  fn format(self) -> String {
    let (deg_x, deg_y, sub_x, sub_y) = if self.res >= 2 {
      let per = per_degree(self.res);
      (self.x / per, self.y / per, self.x % per, self.y % per)
    } else if self.res == 1 {
      (self.x, self.y, 0, 0)
    } else {
      (self.x * 15, self.y * 15, 0, 0)
    };
    let mut out = String::with_capacity(14);
    out.push(char::from(TILE_LON[(deg_x / 15) as usize]));
    out.push(char::from(TILE_LAT[(deg_y / 15) as usize]));
    if self.res >= 1 {
      out.push(char::from(DEGREE[(deg_x % 15) as usize]));
      out.push(char::from(DEGREE[(deg_y % 15) as usize]));
    }
    if self.res >= 2 {
      let width = self.res as usize;
      out.push_str(&format!("{sub_x:0width$}{sub_y:0width$}"));
    }
    out
  }

  fn parse(code: &str) -> Option<Georef> {
    let b = code.as_bytes();
    let pos = |table: &[u8], c: u8| table.iter().position(|t| *t == c).map(|p| p as u64);
    let tx = pos(TILE_LON, *b.first()?)?;
    let ty = pos(TILE_LAT, *b.get(1)?)?;
    if b.len() == 2 {
      return Some(Georef { res: 0, x: tx, y: ty });
    }
    let dx = tx * 15 + pos(DEGREE, *b.get(2)?)?;
    let dy = ty * 15 + pos(DEGREE, *b.get(3)?)?;
    if b.len() == 4 {
      return Some(Georef { res: 1, x: dx, y: dy });
    }
    let digits = &b[4..];
    if digits.len() % 2 == 1 || !digits.iter().all(u8::is_ascii_digit) {
      return None;
    }
    let res = (digits.len() / 2) as u8;
    if !(2..=MAX_RES).contains(&res) {
      return None;
    }
    let half = digits.len() / 2;
    let sx: u64 = code[4..4 + half].parse().ok()?;
    let sy: u64 = code[4 + half..].parse().ok()?;
    let per = per_degree(res);
    if sx >= per || sy >= per {
      return None;
    }
    Some(Georef {
      res,
      x: dx * per + sx,
      y: dy * per + sy,
    })
  }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GeorefCodec;

impl GeorefCodec {
  fn cell(cell: &CellId) -> Result<Georef> {
    expect_kind(cell, DggsKind::Georef)?;
    cell.as_text().and_then(Georef::parse).ok_or_else(|| cell.invalid())
  }

  fn id(g: Georef) -> CellId {
    CellId::text(DggsKind::Georef, g.format())
  }
}

impl DggsCodec for GeorefCodec {
  fn kind(&self) -> DggsKind {
    DggsKind::Georef
  }

  fn encode(&self, lat: f64, lon: f64, res: u8) -> Result<CellId> {
    check_encode(self, lat, lon, res)?;
    Ok(Self::id(Georef::locate(lat, lon, res)))
  }

  fn decode(&self, cell: &CellId) -> Result<RawRing> {
    let (lat_min, lon_min, lat_max, lon_max) = Self::cell(cell)?.bounds();
    Ok(rect_ring(lat_min, lon_min, lat_max, lon_max))
  }

  fn resolution(&self, cell: &CellId) -> Result<u8> {
    Self::cell(cell).map(|g| g.res)
  }

  fn parent(&self, cell: &CellId) -> Result<Option<CellId>> {
    Ok(Self::cell(cell)?.coarser().map(Self::id))
  }

  fn children(&self, cell: &CellId, target: u8) -> Result<Vec<CellId>> {
    descend_to(self, cell, target, |c| {
      let g = Self::cell(c)?;
      if g.res >= MAX_RES {
        return Ok(Vec::new());
      }
      let n = g.fan_out();
      let mut out = Vec::with_capacity((n * n) as usize);
      for i in 0..n {
        for j in 0..n {
          out.push(Self::id(Georef {
            res: g.res + 1,
            x: g.x * n + i,
            y: g.y * n + j,
          }));
        }
      }
      Ok(out)
    })
  }

  fn neighbors(&self, cell: &CellId) -> Result<Vec<CellId>> {
    let g = Self::cell(cell)?;
    let size = cell_size(g.res);
    let (lat_min, lon_min, _, _) = g.bounds();
    let (clat, clon) = (lat_min + size / 2.0, lon_min + size / 2.0);
    let mut out: Vec<CellId> = Vec::with_capacity(8);
    for (di, dj) in [(1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0), (-1, -1), (0, -1), (1, -1)] {
      let lat = clat + f64::from(di) * size;
      if !(-90.0..=90.0).contains(&lat) {
        continue;
      }
      let n = Georef::locate(lat, clon + f64::from(dj) * size, g.res);
      let id = Self::id(n);
      if n != g && !out.contains(&id) {
        out.push(id);
      }
    }
    Ok(out)
  }

  fn parse(&self, token: &str) -> Result<CellId> {
    let code: String = token.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_ascii_uppercase();
    Georef::parse(&code).map(Self::id).ok_or_else(|| DggsError::InvalidCellToken {
      kind: DggsKind::Georef,
      token: token.to_string(),
    })
  }

  fn roots(&self) -> Result<Vec<CellId>> {
    let mut out = Vec::with_capacity(288);
    for x in 0..24 {
      for y in 0..12 {
        out.push(Self::id(Georef { res: 0, x, y }));
      }
    }
    Ok(out)
  }

  fn cover_bbox(&self, bbox: &BBox, res: u8) -> Result<Option<Vec<CellId>>> {
    self.validate_resolution(res)?;
    let size = cell_size(res);
    let cells = graticule_scan(bbox, size, size)
      .into_iter()
      .map(|(lat, lon)| Self::id(Georef::locate(lat + size / 2.0, lon + size / 2.0, res)))
      .collect();
    Ok(Some(cells))
  }

  fn cell_count(&self, res: u8) -> f64 {
    let size = cell_size(res.min(MAX_RES));
    (360.0 / size) * (180.0 / size)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_known_codes() {
    assert_eq!(GeorefCodec.encode(-90.0, -180.0, 1).unwrap().to_string(), "AAAA");
    // 38.286108 N, 76.4291704 W
    let cell = GeorefCodec.encode(38.286_108, -76.429_170_4, 2).unwrap();
    assert_eq!(cell.to_string(), "GJPJ3417");
    let cell = GeorefCodec.encode(38.286_108, -76.429_170_4, 3).unwrap();
    assert_eq!(cell.to_string(), "GJPJ342171");
  }

  #[test]
  fn test_hierarchy() {
    let tile = GeorefCodec.parse("gj").unwrap();
    assert_eq!(GeorefCodec.children(&tile, 1).unwrap().len(), 225);
    let cell = GeorefCodec.parse("GJPJ342171").unwrap();
    assert_eq!(GeorefCodec.parent(&cell).unwrap().unwrap().to_string(), "GJPJ3417");
    let up = GeorefCodec.parent(&GeorefCodec.parse("GJPJ3417").unwrap()).unwrap().unwrap();
    assert_eq!(up.to_string(), "GJPJ");
    assert_eq!(GeorefCodec.parent(&up).unwrap().unwrap().to_string(), "GJ");
  }

  #[test]
  fn test_parse_rejects() {
    assert!(GeorefCodec.parse("IJ").is_err(), "I is skipped");
    assert!(GeorefCodec.parse("GJPJ6017").is_err(), "60 minutes");
    assert!(GeorefCodec.parse("GJPJ341").is_err());
  }
}
