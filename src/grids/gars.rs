//! Global Area Reference System: 30 minute cells split into 15 minute
//! quadrants, 5 minute keypads and 1 minute extensions.

use super::{check_encode, descend_to, expect_kind, graticule_scan, rect_ring, DggsCodec, RawRing};
use crate::latlng::wrap_lon_deg;
use crate::types::{BBox, CellId, DggsError, DggsKind, Result};

const LETTERS: &[u8; 24] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const LON_BANDS: u32 = 720;
const LAT_BANDS: u32 = 360;

/// Edge length in minutes at each resolution.
const MINUTES: [f64; 4] = [30.0, 15.0, 5.0, 1.0];

/// Decoded cell: 30' band indices (from -180 / -90) and the finer
/// subdivisions, each `(col, row_from_north)`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Gars {
  lon_band: u32,
  lat_band: u32,
  quadrant: Option<(u32, u32)>,
  keypad: Option<(u32, u32)>,
  extension: Option<(u32, u32)>,
}

impl Gars {
  fn res(&self) -> u8 {
    1 + u8::from(self.quadrant.is_some()) + u8::from(self.keypad.is_some()) + u8::from(self.extension.is_some())
  }

  fn truncate(&self, res: u8) -> Gars {
    Gars {
      quadrant: self.quadrant.filter(|_| res >= 2),
      keypad: self.keypad.filter(|_| res >= 3),
      extension: self.extension.filter(|_| res >= 4),
      ..self.clone()
    }
  }

  fn locate(lat: f64, lon: f64, res: u8) -> Gars {
    // minutes from the south-west corner of the globe
    let x = ((wrap_lon_deg(lon) + 180.0) * 60.0).clamp(0.0, 21_600.0 - 1e-9);
    let y = ((lat + 90.0) * 60.0).clamp(0.0, 10_800.0 - 1e-9);
    let lon_band = (x / 30.0).floor() as u32;
    let lat_band = (y / 30.0).floor() as u32;
    let (mut fx, mut fy) = (x - f64::from(lon_band) * 30.0, y - f64::from(lat_band) * 30.0);
    let mut step = |size: f64, n: u32| {
      let col = ((fx / size).floor() as u32).min(n - 1);
      let row_s = ((fy / size).floor() as u32).min(n - 1);
      fx -= f64::from(col) * size;
      fy -= f64::from(row_s) * size;
      (col, n - 1 - row_s)
    };
    let quadrant = step(15.0, 2);
    let keypad = step(5.0, 3);
    let extension = step(1.0, 5);
    Gars {
      lon_band,
      lat_band,
      quadrant: Some(quadrant),
      keypad: Some(keypad),
      extension: Some(extension),
    }
    .truncate(res)
  }

  /// `(lat_min, lon_min, lat_max, lon_max)` in degrees.
  fn bounds(&self) -> (f64, f64, f64, f64) {
    let mut west = f64::from(self.lon_band) * 30.0;
    let mut north = f64::from(self.lat_band + 1) * 30.0;
    let mut size = 30.0;
    for (part, n) in [(self.quadrant, 2), (self.keypad, 3), (self.extension, 5)] {
      if let Some((col, row)) = part {
        size /= f64::from(n);
        west += f64::from(col) * size;
        north -= f64::from(row) * size;
      }
    }
    let lon_min = west / 60.0 - 180.0;
    let lat_max = north / 60.0 - 90.0;
    (lat_max - size / 60.0, lon_min, lat_max, lon_min + size / 60.0)
  }

  fn format(&self) -> String {
    let mut out = format!(
      "{:03}{}{}",
      self.lon_band + 1,
      char::from(LETTERS[(self.lat_band / 24) as usize]),
      char::from(LETTERS[(self.lat_band % 24) as usize])
    );
    if let Some((col, row)) = self.quadrant {
      out.push(char::from(b'1' + (row * 2 + col) as u8));
    }
    if let Some((col, row)) = self.keypad {
      out.push(char::from(b'1' + (row * 3 + col) as u8));
    }
    if let Some((col, row)) = self.extension {
      out.push_str(&format!("{:02}", row * 5 + col + 1));
    }
    out
  }

  fn parse(code: &str) -> Option<Gars> {
    let b = code.as_bytes();
    if !matches!(b.len(), 5 | 6 | 7 | 9) || !b[..3].iter().all(u8::is_ascii_digit) {
      return None;
    }
    let lon_num: u32 = code[..3].parse().ok()?;
    if !(1..=LON_BANDS).contains(&lon_num) {
      return None;
    }
    let l1 = LETTERS.iter().position(|c| *c == b[3])? as u32;
    let l2 = LETTERS.iter().position(|c| *c == b[4])? as u32;
    let lat_band = l1 * 24 + l2;
    if lat_band >= LAT_BANDS {
      return None;
    }
    let digit = |i: usize, max: u32| -> Option<u32> {
      let d = u32::from(b.get(i)?.checked_sub(b'1')?);
      (d < max).then_some(d)
    };
    let quadrant = if b.len() >= 6 { Some(digit(5, 4)?) } else { None };
    let keypad = if b.len() >= 7 { Some(digit(6, 9)?) } else { None };
    let extension = if b.len() == 9 {
      let v: u32 = code[7..9].parse().ok()?;
      if !(1..=25).contains(&v) || !b[7..9].iter().all(u8::is_ascii_digit) {
        return None;
      }
      Some(v - 1)
    } else {
      None
    };
    Some(Gars {
      lon_band: lon_num - 1,
      lat_band,
      quadrant: quadrant.map(|q| (q % 2, q / 2)),
      keypad: keypad.map(|k| (k % 3, k / 3)),
      extension: extension.map(|e| (e % 5, e / 5)),
    })
  }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GarsCodec;

impl GarsCodec {
  fn cell(cell: &CellId) -> Result<Gars> {
    expect_kind(cell, DggsKind::Gars)?;
    cell.as_text().and_then(Gars::parse).ok_or_else(|| cell.invalid())
  }

  fn id(g: &Gars) -> CellId {
    CellId::text(DggsKind::Gars, g.format())
  }
}

impl DggsCodec for GarsCodec {
  fn kind(&self) -> DggsKind {
    DggsKind::Gars
  }

  fn encode(&self, lat: f64, lon: f64, res: u8) -> Result<CellId> {
    check_encode(self, lat, lon, res)?;
    Ok(Self::id(&Gars::locate(lat, lon, res)))
  }

  fn decode(&self, cell: &CellId) -> Result<RawRing> {
    let (lat_min, lon_min, lat_max, lon_max) = Self::cell(cell)?.bounds();
    Ok(rect_ring(lat_min, lon_min, lat_max, lon_max))
  }

  fn resolution(&self, cell: &CellId) -> Result<u8> {
    Self::cell(cell).map(|g| g.res())
  }

  fn parent(&self, cell: &CellId) -> Result<Option<CellId>> {
    let g = Self::cell(cell)?;
    let res = g.res();
    Ok((res > 1).then(|| Self::id(&g.truncate(res - 1))))
  }

  fn children(&self, cell: &CellId, target: u8) -> Result<Vec<CellId>> {
    descend_to(self, cell, target, |c| {
      let g = Self::cell(c)?;
      let n = match g.res() {
        1 => 2,
        2 => 3,
        3 => 5,
        _ => return Ok(Vec::new()),
      };
      let mut out = Vec::with_capacity((n * n) as usize);
      for row in 0..n {
        for col in 0..n {
          let mut child = g.clone();
          match g.res() {
            1 => child.quadrant = Some((col, row)),
            2 => child.keypad = Some((col, row)),
            _ => child.extension = Some((col, row)),
          }
          out.push(Self::id(&child));
        }
      }
      Ok(out)
    })
  }

  fn neighbors(&self, cell: &CellId) -> Result<Vec<CellId>> {
    let g = Self::cell(cell)?;
    let (lat_min, lon_min, lat_max, lon_max) = g.bounds();
    let (dlat, dlon) = (lat_max - lat_min, lon_max - lon_min);
    let (clat, clon) = ((lat_min + lat_max) / 2.0, (lon_min + lon_max) / 2.0);
    let own = Self::id(&g);
    let mut out: Vec<CellId> = Vec::with_capacity(8);
    for (di, dj) in [(1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0), (-1, -1), (0, -1), (1, -1)] {
      let lat = clat + f64::from(di) * dlat;
      if !(-90.0..=90.0).contains(&lat) {
        continue;
      }
      let n = Self::id(&Gars::locate(lat, clon + f64::from(dj) * dlon, g.res()));
      if n != own && !out.contains(&n) {
        out.push(n);
      }
    }
    Ok(out)
  }

  fn parse(&self, token: &str) -> Result<CellId> {
    let code: String = token.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_ascii_uppercase();
    Gars::parse(&code).map(|g| Self::id(&g)).ok_or_else(|| DggsError::InvalidCellToken {
      kind: DggsKind::Gars,
      token: token.to_string(),
    })
  }

  fn roots(&self) -> Result<Vec<CellId>> {
    let mut out = Vec::with_capacity((LON_BANDS * LAT_BANDS) as usize);
    for lon_band in 0..LON_BANDS {
      for lat_band in 0..LAT_BANDS {
        out.push(Self::id(&Gars {
          lon_band,
          lat_band,
          quadrant: None,
          keypad: None,
          extension: None,
        }));
      }
    }
    Ok(out)
  }

  fn cover_bbox(&self, bbox: &BBox, res: u8) -> Result<Option<Vec<CellId>>> {
    self.validate_resolution(res)?;
    let step = MINUTES[res as usize - 1] / 60.0;
    let cells = graticule_scan(bbox, step, step)
      .into_iter()
      .map(|(lat, lon)| Self::id(&Gars::locate(lat + step / 2.0, lon + step / 2.0, res)))
      .collect();
    Ok(Some(cells))
  }

  fn cell_count(&self, res: u8) -> f64 {
    let m = MINUTES[usize::from(res.clamp(1, 4)) - 1];
    (21_600.0 / m) * (10_800.0 / m)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_known_cells() {
    // 30' cell at the south-west corner of the globe
    assert_eq!(GarsCodec.encode(-89.9, -179.9, 1).unwrap().to_string(), "001AA");
    assert_eq!(GarsCodec.encode(89.9, 179.9, 1).unwrap().to_string(), "720QZ");
    let cell = GarsCodec.encode(32.25, -117.25, 3).unwrap();
    assert!(cell.to_string().starts_with("126LE"), "{cell}");
  }

  #[test]
  fn test_quadrant_and_keypad_layout() {
    // north-west corner of a 30' cell is quadrant 1 keypad 1
    let nw = GarsCodec.encode(0.49, 0.01, 3).unwrap();
    assert_eq!(&nw.to_string()[5..], "11");
    // south-east corner is quadrant 4 keypad 9
    let se = GarsCodec.encode(0.01, 0.49, 3).unwrap();
    assert_eq!(&se.to_string()[5..], "49");
    let ext = GarsCodec.encode(0.49, 0.01, 4).unwrap();
    assert_eq!(&ext.to_string()[7..], "01");
  }

  #[test]
  fn test_decode_size() {
    let cell = GarsCodec.parse("361HN37").unwrap();
    let ring = GarsCodec.decode(&cell).unwrap();
    assert!(((ring[1].x - ring[0].x) - 5.0 / 60.0).abs() < 1e-12);
    assert!(((ring[2].y - ring[1].y) - 5.0 / 60.0).abs() < 1e-12);
  }

  #[test]
  fn test_hierarchy() {
    let cell = GarsCodec.parse("361hn").unwrap();
    assert_eq!(cell.to_string(), "361HN");
    assert_eq!(GarsCodec.children(&cell, 2).unwrap().len(), 4);
    assert_eq!(GarsCodec.children(&cell, 4).unwrap().len(), 4 * 9 * 25);
    let leaf = GarsCodec.parse("361HN3725").unwrap();
    assert_eq!(GarsCodec.parent(&leaf).unwrap().unwrap().to_string(), "361HN37");
    assert!(GarsCodec.parse("000AA").is_err());
    assert!(GarsCodec.parse("361HN5").is_err());
    assert!(GarsCodec.parse("361HN3726").is_err());
  }
}
