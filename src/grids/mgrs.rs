//! Military Grid Reference System over WGS84 UTM zones.
//!
//! Resolution is the number of digits per axis: 0 names a 100 km square,
//! 5 a 1 m square. Polar UPS areas are not covered.

use geo_types::Coord;

use super::{arc_steps, check_encode, expect_kind, DggsCodec, RawRing};
use crate::constants::{EARTH_AREA_M2, EARTH_AUTHALIC_RADIUS_M, WGS84_A, WGS84_F};
use crate::types::{BBox, CellId, DggsError, DggsKind, Result};

const BANDS: &[u8; 20] = b"CDEFGHJKLMNPQRSTUVWX";
const COLUMN_SETS: [&[u8; 8]; 3] = [b"STUVWXYZ", b"ABCDEFGH", b"JKLMNPQR"];
const ROWS: &[u8; 20] = b"ABCDEFGHJKLMNPQRSTUV";
const K0: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;
const MIN_LAT: f64 = -80.0;
const MAX_LAT: f64 = 84.0;

/// Position in a UTM zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Utm {
  pub zone: u8,
  pub north: bool,
  pub easting: f64,
  pub northing: f64,
}

fn ellipsoid() -> (f64, f64) {
  let e2 = WGS84_F * (2.0 - WGS84_F);
  (e2, e2 / (1.0 - e2))
}

fn central_meridian(zone: u8) -> f64 {
  f64::from(zone) * 6.0 - 183.0
}

/// UTM zone of a point, with the Norway and Svalbard exceptions.
#[must_use]
pub fn zone_of(lat: f64, lon: f64) -> u8 {
  let lon = if lon >= 180.0 { lon - 360.0 } else { lon };
  if (56.0..64.0).contains(&lat) && (3.0..12.0).contains(&lon) {
    return 32;
  }
  if (72.0..=84.0).contains(&lat) && (0.0..42.0).contains(&lon) {
    return match lon {
      l if l < 9.0 => 31,
      l if l < 21.0 => 33,
      l if l < 33.0 => 35,
      _ => 37,
    };
  }
  (((lon + 180.0) / 6.0).floor() as u8).min(59) + 1
}

/// Meridian arc length from the equator.
fn meridian_arc(phi: f64, e2: f64) -> f64 {
  let e4 = e2 * e2;
  let e6 = e4 * e2;
  WGS84_A
    * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
      - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
      + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
      - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
}

/// Forward transverse Mercator in a given zone.
#[must_use]
pub fn to_utm_in_zone(lat: f64, lon: f64, zone: u8) -> Utm {
  let (e2, ep2) = ellipsoid();
  let phi = lat.to_radians();
  let mut dlon = lon - central_meridian(zone);
  if dlon > 180.0 {
    dlon -= 360.0;
  } else if dlon < -180.0 {
    dlon += 360.0;
  }
  let (sin_phi, cos_phi) = phi.sin_cos();
  let n = WGS84_A / (1.0 - e2 * sin_phi * sin_phi).sqrt();
  let t = phi.tan().powi(2);
  let c = ep2 * cos_phi * cos_phi;
  let a = cos_phi * dlon.to_radians();
  let m = meridian_arc(phi, e2);

  let easting = K0
    * n
    * (a + (1.0 - t + c) * a.powi(3) / 6.0 + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a.powi(5) / 120.0)
    + FALSE_EASTING;
  let mut northing = K0
    * (m
      + n
        * phi.tan()
        * (a * a / 2.0
          + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
          + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a.powi(6) / 720.0));
  let north = lat >= 0.0;
  if !north {
    northing += FALSE_NORTHING_SOUTH;
  }
  Utm {
    zone,
    north,
    easting,
    northing,
  }
}

#[must_use]
pub fn to_utm(lat: f64, lon: f64) -> Utm {
  to_utm_in_zone(lat, lon, zone_of(lat, lon))
}

/// Inverse transverse Mercator: `(lat, lon)` in degrees.
#[must_use]
pub fn from_utm(utm: &Utm) -> (f64, f64) {
  let (e2, ep2) = ellipsoid();
  let e4 = e2 * e2;
  let e6 = e4 * e2;
  let y = if utm.north {
    utm.northing
  } else {
    utm.northing - FALSE_NORTHING_SOUTH
  };
  let m = y / K0;
  let mu = m / (WGS84_A * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));
  let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());
  let phi1 = mu
    + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
    + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
    + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
    + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();
  let (sin1, cos1) = phi1.sin_cos();
  let n1 = WGS84_A / (1.0 - e2 * sin1 * sin1).sqrt();
  let t1 = phi1.tan().powi(2);
  let c1 = ep2 * cos1 * cos1;
  let r1 = WGS84_A * (1.0 - e2) / (1.0 - e2 * sin1 * sin1).powf(1.5);
  let d = (utm.easting - FALSE_EASTING) / (n1 * K0);

  let phi = phi1
    - (n1 * phi1.tan() / r1)
      * (d * d / 2.0 - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
        + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1) * d.powi(6) / 720.0);
  let lambda = (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
    + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1) * d.powi(5) / 120.0)
    / cos1;
  (phi.to_degrees(), central_meridian(utm.zone) + lambda.to_degrees())
}

fn band_index(lat: f64) -> usize {
  (((lat - MIN_LAT) / 8.0).floor().max(0.0) as usize).min(BANDS.len() - 1)
}

/// A parsed MGRS reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Mgrs {
  zone: u8,
  band: usize,
  column: usize,
  row: usize,
  precision: u8,
  easting: u32,
  northing: u32,
}

impl Mgrs {
  fn cell_m(&self) -> f64 {
    10f64.powi(5 - i32::from(self.precision))
  }

  fn locate(lat: f64, lon: f64, precision: u8) -> Mgrs {
    let utm = to_utm(lat, lon);
    let e100k = (utm.easting / 100_000.0).floor() as i64;
    let n100k = (utm.northing / 100_000.0).floor() as i64;
    let column = (e100k - 1).clamp(0, 7) as usize;
    let mut row = n100k.rem_euclid(20) as usize;
    if utm.zone % 2 == 0 {
      row = (row + 5) % 20;
    }
    let div = 10f64.powi(5 - i32::from(precision));
    Mgrs {
      zone: utm.zone,
      band: band_index(lat),
      column,
      row,
      precision,
      easting: ((utm.easting.rem_euclid(100_000.0)) / div).floor() as u32,
      northing: ((utm.northing.rem_euclid(100_000.0)) / div).floor() as u32,
    }
  }

  fn format(&self) -> String {
    let mut out = format!(
      "{}{}{}{}",
      self.zone,
      char::from(BANDS[self.band]),
      char::from(COLUMN_SETS[(self.zone % 3) as usize][self.column]),
      char::from(ROWS[self.row])
    );
    if self.precision > 0 {
      let w = self.precision as usize;
      out.push_str(&format!("{:0w$}{:0w$}", self.easting, self.northing));
    }
    out
  }

  fn parse(code: &str) -> Option<Mgrs> {
    let b = code.as_bytes();
    let zone_len = b.iter().take_while(|c| c.is_ascii_digit()).count();
    if !(1..=2).contains(&zone_len) || b.len() < zone_len + 3 {
      return None;
    }
    let zone: u8 = code[..zone_len].parse().ok()?;
    if !(1..=60).contains(&zone) {
      return None;
    }
    let band = BANDS.iter().position(|c| *c == b[zone_len])?;
    let column = COLUMN_SETS[(zone % 3) as usize].iter().position(|c| *c == b[zone_len + 1])?;
    let row = ROWS.iter().position(|c| *c == b[zone_len + 2])?;
    let digits = &code[zone_len + 3..];
    if digits.len() % 2 == 1 || digits.len() > 10 || !digits.bytes().all(|c| c.is_ascii_digit()) {
      return None;
    }
    let precision = (digits.len() / 2) as u8;
    let (easting, northing) = if precision == 0 {
      (0, 0)
    } else {
      let half = digits.len() / 2;
      (digits[..half].parse().ok()?, digits[half..].parse().ok()?)
    };
    Some(Mgrs {
      zone,
      band,
      column,
      row,
      precision,
      easting,
      northing,
    })
  }

  /// South-west corner of the cell in UTM.
  fn corner(&self) -> Utm {
    let north = self.band >= 10;
    let mut row = self.row;
    if self.zone % 2 == 0 {
      row = (row + 15) % 20;
    }
    let easting = (self.column as f64 + 1.0) * 100_000.0 + f64::from(self.easting) * self.cell_m();
    let row_northing = row as f64 * 100_000.0 + f64::from(self.northing) * self.cell_m();
    // lift the 2000 km row cycle to the band's latitude
    let band_floor = MIN_LAT + 8.0 * self.band as f64;
    let floor = to_utm_in_zone(band_floor, central_meridian(self.zone), self.zone);
    let floor_northing = if north == floor.north {
      floor.northing
    } else {
      floor.northing - FALSE_NORTHING_SOUTH
    };
    let cycles = ((floor_northing - 100_000.0 - row_northing) / 2_000_000.0).ceil().max(0.0);
    Utm {
      zone: self.zone,
      north,
      easting,
      northing: row_northing + cycles * 2_000_000.0,
    }
  }

  /// Grid-square outline. Grid lines curve in lon/lat, so long sides are
  /// traced through the inverse projection.
  fn ring(&self) -> RawRing {
    let sw = self.corner();
    let size = self.cell_m();
    let steps = arc_steps(size / EARTH_AUTHALIC_RADIUS_M);
    let corners = [(0.0, 0.0), (size, 0.0), (size, size), (0.0, size)];
    let mut ring = Vec::with_capacity(4 * steps as usize);
    for k in 0..4 {
      let (ae, an) = corners[k];
      let (be, bn) = corners[(k + 1) % 4];
      for step in 0..steps {
        let f = f64::from(step) / f64::from(steps);
        let (lat, lon) = from_utm(&Utm {
          easting: sw.easting + ae + (be - ae) * f,
          northing: sw.northing + an + (bn - an) * f,
          ..sw
        });
        ring.push(Coord { x: lon, y: lat });
      }
    }
    ring
  }

  fn center(&self) -> (f64, f64) {
    let sw = self.corner();
    let half = self.cell_m() / 2.0;
    from_utm(&Utm {
      easting: sw.easting + half,
      northing: sw.northing + half,
      ..sw
    })
  }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MgrsCodec;

impl MgrsCodec {
  fn cell(cell: &CellId) -> Result<Mgrs> {
    expect_kind(cell, DggsKind::Mgrs)?;
    cell.as_text().and_then(Mgrs::parse).ok_or_else(|| cell.invalid())
  }

  fn id(m: &Mgrs) -> CellId {
    CellId::text(DggsKind::Mgrs, m.format())
  }

  fn scan(&self, bbox: &BBox, res: u8) -> Vec<CellId> {
    let size = 10f64.powi(5 - i32::from(res));
    let step = size / 111_320.0 * 0.5;
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for part in bbox.split_antimeridian() {
      let lat_lo = part.lat_min.max(MIN_LAT);
      let lat_hi = part.lat_max.min(MAX_LAT);
      if lat_lo > lat_hi {
        continue;
      }
      let nx = ((part.lon_max - part.lon_min) / step).ceil() as usize;
      let ny = ((lat_hi - lat_lo) / step).ceil() as usize;
      for i in 0..=nx {
        let lon = (part.lon_min + i as f64 * step).min(part.lon_max);
        for j in 0..=ny {
          let lat = (lat_lo + j as f64 * step).min(lat_hi);
          let id = Self::id(&Mgrs::locate(lat, lon, res));
          if seen.insert(id.clone()) {
            out.push(id);
          }
        }
      }
    }
    out
  }
}

impl DggsCodec for MgrsCodec {
  fn kind(&self) -> DggsKind {
    DggsKind::Mgrs
  }

  fn encode(&self, lat: f64, lon: f64, res: u8) -> Result<CellId> {
    check_encode(self, lat, lon, res)?;
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
      return Err(DggsError::InvalidCoordinate { lat, lon });
    }
    Ok(Self::id(&Mgrs::locate(lat, lon, res)))
  }

  fn decode(&self, cell: &CellId) -> Result<RawRing> {
    Ok(Self::cell(cell)?.ring())
  }

  fn resolution(&self, cell: &CellId) -> Result<u8> {
    Self::cell(cell).map(|m| m.precision)
  }

  fn parent(&self, cell: &CellId) -> Result<Option<CellId>> {
    let m = Self::cell(cell)?;
    if m.precision == 0 {
      return Ok(None);
    }
    Ok(Some(Self::id(&Mgrs {
      precision: m.precision - 1,
      easting: m.easting / 10,
      northing: m.northing / 10,
      ..m
    })))
  }

  fn children(&self, cell: &CellId, target: u8) -> Result<Vec<CellId>> {
    super::descend_to(self, cell, target, |c| {
      let m = Self::cell(c)?;
      if m.precision >= 5 {
        return Ok(Vec::new());
      }
      let mut out = Vec::with_capacity(100);
      for de in 0..10 {
        for dn in 0..10 {
          out.push(Self::id(&Mgrs {
            precision: m.precision + 1,
            easting: m.easting * 10 + de,
            northing: m.northing * 10 + dn,
            ..m
          }));
        }
      }
      Ok(out)
    })
  }

  fn neighbors(&self, cell: &CellId) -> Result<Vec<CellId>> {
    let m = Self::cell(cell)?;
    let sw = m.corner();
    let size = m.cell_m();
    let own = Self::id(&m);
    let mut out: Vec<CellId> = Vec::with_capacity(8);
    for (de, dn) in [(0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (1.0, -1.0), (0.0, -1.0), (-1.0, -1.0), (-1.0, 0.0), (-1.0, 1.0)] {
      let (lat, lon) = from_utm(&Utm {
        easting: sw.easting + (de + 0.5) * size,
        northing: sw.northing + (dn + 0.5) * size,
        ..sw
      });
      if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        continue;
      }
      let lon = crate::latlng::wrap_lon_deg(lon);
      let id = Self::id(&Mgrs::locate(lat, lon, m.precision));
      if id != own && !out.contains(&id) {
        out.push(id);
      }
    }
    Ok(out)
  }

  fn edges(&self, cell: &CellId) -> Result<usize> {
    Self::cell(cell).map(|_| 4)
  }

  /// Uppercases and strips whitespace; the zone loses leading zeros.
  fn parse(&self, token: &str) -> Result<CellId> {
    let code: String = token.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_ascii_uppercase();
    let m = Mgrs::parse(&code).ok_or_else(|| DggsError::InvalidCellToken {
      kind: DggsKind::Mgrs,
      token: token.to_string(),
    })?;
    let (lat, _) = m.center();
    if !lat.is_finite() {
      return Err(DggsError::InvalidCellToken {
        kind: DggsKind::Mgrs,
        token: token.to_string(),
      });
    }
    Ok(Self::id(&m))
  }

  fn roots(&self) -> Result<Vec<CellId>> {
    Ok(self.scan(&BBox::world(), 0))
  }

  /// Point scan at half the cell size, deduplicated in scan order.
  fn cover_bbox(&self, bbox: &BBox, res: u8) -> Result<Option<Vec<CellId>>> {
    self.validate_resolution(res)?;
    Ok(Some(self.scan(bbox, res)))
  }

  fn cell_count(&self, res: u8) -> f64 {
    let size = 10f64.powi(5 - i32::from(res.min(5)));
    EARTH_AREA_M2 / (size * size)
  }
}
