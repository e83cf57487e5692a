//! Open Location Code (plus codes), computed on integer grid units so that
//! cell edges do not drift with floating point accumulation.

use super::{check_encode, descend_to, expect_kind, graticule_scan, rect_ring, DggsCodec, RawRing};
use crate::latlng::wrap_lon_deg;
use crate::types::{BBox, CellId, DggsError, DggsKind, Result};

const ALPHABET: &[u8; 20] = b"23456789CFGHJMPQRVWX";
const SEPARATOR: char = '+';
const SEPARATOR_POS: usize = 8;
const PADDING: char = '0';
const PAIR_LEN: usize = 10;
const MAX_LEN: usize = 15;
const GRID_COLS: i64 = 5;
const GRID_ROWS: i64 = 4;

/// Integer units per degree of latitude (20^3 * 4^5).
const LAT_UNITS: i64 = 8_192_000;
/// Integer units per degree of longitude (20^3 * 5^5).
const LNG_UNITS: i64 = 25_000_000;

/// Valid code lengths.
pub const LENGTHS: [u8; 10] = [2, 4, 6, 8, 10, 11, 12, 13, 14, 15];

/// Place values of each digit position in integer units, `(lat, lng)`.
fn place(pos: usize) -> (i64, i64) {
  if pos < PAIR_LEN {
    let level = (pos / 2) as u32;
    (20 * LAT_UNITS / 20i64.pow(level), 20 * LNG_UNITS / 20i64.pow(level))
  } else {
    let level = (pos - PAIR_LEN + 1) as u32;
    (1024 / GRID_ROWS.pow(level), 3125 / GRID_COLS.pow(level))
  }
}

/// Cell size in integer units for a code length.
fn cell_units(len: usize) -> (i64, i64) {
  place(len - 1)
}

fn digit_value(c: u8) -> Option<u8> {
  ALPHABET.iter().position(|a| *a == c).map(|p| p as u8)
}

/// All fifteen digits of the code containing a point.
fn encode_digits(lat: f64, lon: f64) -> [u8; MAX_LEN] {
  let lat = lat.clamp(-90.0, 90.0);
  let lon = wrap_lon_deg(lon);
  let mut lat_val = (((lat + 90.0) * LAT_UNITS as f64 * 1e6).round() / 1e6).floor() as i64;
  let mut lng_val = (((lon + 180.0) * LNG_UNITS as f64 * 1e6).round() / 1e6).floor() as i64;
  lat_val = lat_val.clamp(0, 180 * LAT_UNITS - 1);
  lng_val = lng_val.rem_euclid(360 * LNG_UNITS);

  let mut digits = [0u8; MAX_LEN];
  for pos in (PAIR_LEN..MAX_LEN).rev() {
    digits[pos] = ((lat_val % GRID_ROWS) * GRID_COLS + lng_val % GRID_COLS) as u8;
    lat_val /= GRID_ROWS;
    lng_val /= GRID_COLS;
  }
  for pair in (0..PAIR_LEN / 2).rev() {
    digits[2 * pair] = (lat_val % 20) as u8;
    digits[2 * pair + 1] = (lng_val % 20) as u8;
    lat_val /= 20;
    lng_val /= 20;
  }
  digits
}

fn format_code(digits: &[u8]) -> String {
  let mut out = String::with_capacity(MAX_LEN + 1);
  for (pos, d) in digits.iter().enumerate() {
    if pos == SEPARATOR_POS {
      out.push(SEPARATOR);
    }
    out.push(char::from(ALPHABET[*d as usize]));
  }
  if digits.len() < SEPARATOR_POS {
    for _ in digits.len()..SEPARATOR_POS {
      out.push(PADDING);
    }
    out.push(SEPARATOR);
  } else if digits.len() == SEPARATOR_POS {
    out.push(SEPARATOR);
  }
  out
}

/// Significant digits of a canonical full code.
fn parse_digits(code: &str) -> Option<Vec<u8>> {
  let bytes = code.as_bytes();
  if bytes.get(SEPARATOR_POS) != Some(&(SEPARATOR as u8)) || bytes.iter().filter(|b| **b == SEPARATOR as u8).count() != 1 {
    return None;
  }
  let head = &bytes[..SEPARATOR_POS];
  let tail = &bytes[SEPARATOR_POS + 1..];
  let significant = head.iter().take_while(|b| **b != PADDING as u8).count();
  if significant < 2 || significant % 2 == 1 {
    return None;
  }
  if significant < SEPARATOR_POS && (!tail.is_empty() || head[significant..].iter().any(|b| *b != PADDING as u8)) {
    return None;
  }
  if tail.len() == 1 || tail.len() > MAX_LEN - SEPARATOR_POS {
    return None;
  }
  let mut digits = Vec::with_capacity(significant + tail.len());
  for b in head[..significant].iter().chain(tail) {
    digits.push(digit_value(*b)?);
  }
  // first pair addresses 9 x 18 twenty degree cells
  if digits[0] >= 9 || digits[1] >= 18 {
    return None;
  }
  Some(digits)
}

/// Bounds in integer units: `(lat_lo, lng_lo, lat_size, lng_size)`.
fn digit_bounds(digits: &[u8]) -> (i64, i64, i64, i64) {
  let (mut lat, mut lng) = (0i64, 0i64);
  for (pos, d) in digits.iter().enumerate() {
    let (lat_place, lng_place) = place(pos);
    let d = i64::from(*d);
    if pos < PAIR_LEN {
      if pos % 2 == 0 {
        lat += d * lat_place;
      } else {
        lng += d * lng_place;
      }
    } else {
      lat += (d / GRID_COLS) * lat_place;
      lng += (d % GRID_COLS) * lng_place;
    }
  }
  let (lat_size, lng_size) = cell_units(digits.len());
  (lat, lng, lat_size, lng_size)
}

fn to_degrees(lat_units: i64, lng_units: i64) -> (f64, f64) {
  (
    lat_units as f64 / LAT_UNITS as f64 - 90.0,
    lng_units as f64 / LNG_UNITS as f64 - 180.0,
  )
}

/// Code length one step coarser.
fn coarser(len: usize) -> Option<usize> {
  match len {
    0..=2 => None,
    3..=10 => Some(len - 2),
    _ => Some(len - 1),
  }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OlcCodec;

impl OlcCodec {
  fn digits(cell: &CellId) -> Result<Vec<u8>> {
    expect_kind(cell, DggsKind::Olc)?;
    cell.as_text().and_then(parse_digits).ok_or_else(|| cell.invalid())
  }

  fn id(digits: &[u8]) -> CellId {
    CellId::text(DggsKind::Olc, format_code(digits))
  }

  fn bounds_deg(digits: &[u8]) -> (f64, f64, f64, f64) {
    let (lat, lng, dlat, dlng) = digit_bounds(digits);
    let (lat_min, lon_min) = to_degrees(lat, lng);
    let (lat_max, lon_max) = to_degrees(lat + dlat, lng + dlng);
    (lat_min, lon_min, lat_max, lon_max)
  }
}

impl DggsCodec for OlcCodec {
  fn kind(&self) -> DggsKind {
    DggsKind::Olc
  }

  fn validate_resolution(&self, res: u8) -> Result<()> {
    if LENGTHS.contains(&res) && self.res_bounds().contains(res) {
      Ok(())
    } else {
      Err(DggsError::OutOfRange { kind: DggsKind::Olc, res })
    }
  }

  fn encode(&self, lat: f64, lon: f64, res: u8) -> Result<CellId> {
    check_encode(self, lat, lon, res)?;
    Ok(Self::id(&encode_digits(lat, lon)[..res as usize]))
  }

  fn decode(&self, cell: &CellId) -> Result<RawRing> {
    let (lat_min, lon_min, lat_max, lon_max) = Self::bounds_deg(&Self::digits(cell)?);
    Ok(rect_ring(lat_min, lon_min, lat_max, lon_max))
  }

  fn resolution(&self, cell: &CellId) -> Result<u8> {
    Self::digits(cell).map(|d| d.len() as u8)
  }

  fn parent(&self, cell: &CellId) -> Result<Option<CellId>> {
    let digits = Self::digits(cell)?;
    Ok(coarser(digits.len()).map(|len| Self::id(&digits[..len])))
  }

  fn children(&self, cell: &CellId, target: u8) -> Result<Vec<CellId>> {
    descend_to(self, cell, target, |c| {
      let digits = Self::digits(c)?;
      let mut out = Vec::new();
      if digits.len() < PAIR_LEN {
        for lat in 0..20u8 {
          for lng in 0..20u8 {
            let mut child = digits.clone();
            child.extend([lat, lng]);
            out.push(Self::id(&child));
          }
        }
      } else if digits.len() < MAX_LEN {
        for d in 0..20u8 {
          let mut child = digits.clone();
          child.push(d);
          out.push(Self::id(&child));
        }
      }
      Ok(out)
    })
  }

  fn neighbors(&self, cell: &CellId) -> Result<Vec<CellId>> {
    let digits = Self::digits(cell)?;
    let len = digits.len();
    let (lat_min, lon_min, lat_max, lon_max) = Self::bounds_deg(&digits);
    let (dlat, dlon) = (lat_max - lat_min, lon_max - lon_min);
    let (clat, clon) = ((lat_min + lat_max) / 2.0, (lon_min + lon_max) / 2.0);
    let own = Self::id(&digits);
    let mut out: Vec<CellId> = Vec::with_capacity(8);
    for (di, dj) in [(1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0), (-1, -1), (0, -1), (1, -1)] {
      let lat = clat + f64::from(di) * dlat;
      if !(-90.0..=90.0).contains(&lat) {
        continue;
      }
      let n = Self::id(&encode_digits(lat, clon + f64::from(dj) * dlon)[..len]);
      if n != own && !out.contains(&n) {
        out.push(n);
      }
    }
    Ok(out)
  }

  /// Uppercases and strips whitespace. Short codes are rejected.
  fn parse(&self, token: &str) -> Result<CellId> {
    let code: String = token.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_ascii_uppercase();
    let digits = parse_digits(&code).ok_or_else(|| DggsError::InvalidCellToken {
      kind: DggsKind::Olc,
      token: token.to_string(),
    })?;
    Ok(Self::id(&digits))
  }

  fn roots(&self) -> Result<Vec<CellId>> {
    let mut out = Vec::with_capacity(162);
    for lng in 0..18u8 {
      for lat in 0..9u8 {
        out.push(Self::id(&[lat, lng]));
      }
    }
    Ok(out)
  }

  fn cover_bbox(&self, bbox: &BBox, res: u8) -> Result<Option<Vec<CellId>>> {
    self.validate_resolution(res)?;
    let (lat_size, lng_size) = cell_units(res as usize);
    let dlat = lat_size as f64 / LAT_UNITS as f64;
    let dlon = lng_size as f64 / LNG_UNITS as f64;
    let cells = graticule_scan(bbox, dlat, dlon)
      .into_iter()
      .map(|(lat, lon)| Self::id(&encode_digits(lat + dlat / 2.0, lon + dlon / 2.0)[..res as usize]))
      .collect();
    Ok(Some(cells))
  }

  fn cell_count(&self, res: u8) -> f64 {
    let (lat_size, lng_size) = cell_units(usize::from(res.clamp(2, MAX_LEN as u8)));
    (180 * LAT_UNITS / lat_size) as f64 * (360 * LNG_UNITS / lng_size) as f64
  }
}
