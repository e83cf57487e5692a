//! Web Mercator XYZ tiles, addressed either as `z{z}x{x}y{y}` tilecodes or
//! as quadkeys.

use std::f64::consts::PI;

use super::{check_encode, descend_to, expect_kind, rect_ring, DggsCodec, RawRing};
use crate::constants::MERCATOR_MAX_LAT;
use crate::latlng::wrap_lon_deg;
use crate::types::{BBox, CellId, DggsError, DggsKind, Result};

const MAX_ZOOM: u8 = 29;

/// One XYZ tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
  pub z: u8,
  pub x: u32,
  pub y: u32,
}

impl Tile {
  fn n(z: u8) -> u32 {
    1u32 << z
  }

  fn x_at(lon: f64, z: u8) -> u32 {
    let n = f64::from(Self::n(z));
    (((wrap_lon_deg(lon) + 180.0) / 360.0 * n).floor() as u32).min(Self::n(z) - 1)
  }

  fn y_at(lat: f64, z: u8) -> u32 {
    let n = f64::from(Self::n(z));
    let lat = lat.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT).to_radians();
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * n;
    (y.floor().max(0.0) as u32).min(Self::n(z) - 1)
  }

  #[must_use]
  pub fn containing(lat: f64, lon: f64, z: u8) -> Tile {
    Tile {
      z,
      x: Self::x_at(lon, z),
      y: Self::y_at(lat, z),
    }
  }

  fn lon_of(x: u32, z: u8) -> f64 {
    f64::from(x) / f64::from(Self::n(z)) * 360.0 - 180.0
  }

  fn lat_of(y: u32, z: u8) -> f64 {
    let t = PI * (1.0 - 2.0 * f64::from(y) / f64::from(Self::n(z)));
    t.sinh().atan().to_degrees()
  }

  /// `(lat_min, lon_min, lat_max, lon_max)`.
  #[must_use]
  pub fn bounds(&self) -> (f64, f64, f64, f64) {
    (
      Self::lat_of(self.y + 1, self.z),
      Self::lon_of(self.x, self.z),
      Self::lat_of(self.y, self.z),
      Self::lon_of(self.x + 1, self.z),
    )
  }

  fn parent(&self) -> Option<Tile> {
    (self.z > 0).then(|| Tile {
      z: self.z - 1,
      x: self.x >> 1,
      y: self.y >> 1,
    })
  }

  fn children(&self) -> [Tile; 4] {
    let (z, x, y) = (self.z + 1, self.x << 1, self.y << 1);
    [
      Tile { z, x, y },
      Tile { z, x: x + 1, y },
      Tile { z, x, y: y + 1 },
      Tile { z, x: x + 1, y: y + 1 },
    ]
  }

  #[must_use]
  pub fn tilecode(&self) -> String {
    format!("z{}x{}y{}", self.z, self.x, self.y)
  }

  #[must_use]
  pub fn quadkey(&self) -> String {
    (1..=self.z)
      .rev()
      .map(|i| {
        let mask = 1u32 << (i - 1);
        let d = u8::from(self.x & mask != 0) + 2 * u8::from(self.y & mask != 0);
        char::from(b'0' + d)
      })
      .collect()
  }

  fn from_tilecode(s: &str) -> Option<Tile> {
    let rest = s.strip_prefix('z')?;
    let (z, rest) = rest.split_once('x')?;
    let (x, y) = rest.split_once('y')?;
    let all_digits = |t: &str| !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit());
    if !(all_digits(z) && all_digits(x) && all_digits(y)) {
      return None;
    }
    let tile = Tile {
      z: z.parse().ok()?,
      x: x.parse().ok()?,
      y: y.parse().ok()?,
    };
    tile.is_valid().then_some(tile)
  }

  fn from_quadkey(s: &str) -> Option<Tile> {
    if s.is_empty() || s.len() > MAX_ZOOM as usize {
      return None;
    }
    let mut tile = Tile { z: 0, x: 0, y: 0 };
    for b in s.bytes() {
      let d = u32::from(b.checked_sub(b'0').filter(|d| *d < 4)?);
      tile = Tile {
        z: tile.z + 1,
        x: (tile.x << 1) | (d & 1),
        y: (tile.y << 1) | (d >> 1),
      };
    }
    Some(tile)
  }

  fn is_valid(&self) -> bool {
    self.z <= MAX_ZOOM && self.x < Self::n(self.z) && self.y < Self::n(self.z)
  }
}

/// Codec for both tile addressings.
#[derive(Debug, Clone, Copy)]
pub struct TileCodec {
  kind: DggsKind,
}

impl TileCodec {
  #[must_use]
  pub const fn tilecode() -> Self {
    Self {
      kind: DggsKind::Tilecode,
    }
  }

  #[must_use]
  pub const fn quadkey() -> Self {
    Self { kind: DggsKind::Quadkey }
  }

  fn tile(&self, cell: &CellId) -> Result<Tile> {
    expect_kind(cell, self.kind)?;
    let s = cell.as_text().ok_or_else(|| cell.invalid())?;
    let tile = if self.kind == DggsKind::Quadkey {
      Tile::from_quadkey(s)
    } else {
      Tile::from_tilecode(s)
    };
    tile.ok_or_else(|| cell.invalid())
  }

  fn id(&self, tile: Tile) -> CellId {
    if self.kind == DggsKind::Quadkey {
      CellId::text(self.kind, tile.quadkey())
    } else {
      CellId::text(self.kind, tile.tilecode())
    }
  }
}

impl DggsCodec for TileCodec {
  fn kind(&self) -> DggsKind {
    self.kind
  }

  fn encode(&self, lat: f64, lon: f64, res: u8) -> Result<CellId> {
    check_encode(self, lat, lon, res)?;
    if lat.abs() > MERCATOR_MAX_LAT {
      return Err(DggsError::InvalidCoordinate { lat, lon });
    }
    Ok(self.id(Tile::containing(lat, lon, res)))
  }

  fn decode(&self, cell: &CellId) -> Result<RawRing> {
    let (lat_min, lon_min, lat_max, lon_max) = self.tile(cell)?.bounds();
    Ok(rect_ring(lat_min, lon_min, lat_max, lon_max))
  }

  fn resolution(&self, cell: &CellId) -> Result<u8> {
    self.tile(cell).map(|t| t.z)
  }

  fn parent(&self, cell: &CellId) -> Result<Option<CellId>> {
    let min = self.res_bounds().min;
    let tile = self.tile(cell)?;
    Ok(tile.parent().filter(|p| p.z >= min).map(|p| self.id(p)))
  }

  fn children(&self, cell: &CellId, target: u8) -> Result<Vec<CellId>> {
    descend_to(self, cell, target, |c| {
      let tile = self.tile(c)?;
      if tile.z >= MAX_ZOOM {
        return Ok(Vec::new());
      }
      Ok(tile.children().iter().map(|t| self.id(*t)).collect())
    })
  }

  fn neighbors(&self, cell: &CellId) -> Result<Vec<CellId>> {
    let tile = self.tile(cell)?;
    let n = i64::from(Tile::n(tile.z));
    let mut out: Vec<CellId> = Vec::with_capacity(8);
    for (dy, dx) in [(-1, 0), (-1, 1), (0, 1), (1, 1), (1, 0), (1, -1), (0, -1), (-1, -1)] {
      let y = i64::from(tile.y) + dy;
      if y < 0 || y >= n {
        continue;
      }
      let x = (i64::from(tile.x) + dx).rem_euclid(n);
      let t = Tile {
        z: tile.z,
        x: x as u32,
        y: y as u32,
      };
      let id = self.id(t);
      if t != tile && !out.contains(&id) {
        out.push(id);
      }
    }
    Ok(out)
  }

  fn edges(&self, cell: &CellId) -> Result<usize> {
    self.tile(cell).map(|_| 4)
  }

  fn parse(&self, token: &str) -> Result<CellId> {
    let s = token.trim().to_ascii_lowercase();
    let tile = if self.kind == DggsKind::Quadkey {
      Tile::from_quadkey(&s)
    } else {
      Tile::from_tilecode(&s)
    };
    tile
      .filter(|t| self.res_bounds().contains(t.z))
      .map(|t| self.id(t))
      .ok_or_else(|| DggsError::InvalidCellToken {
        kind: self.kind,
        token: token.to_string(),
      })
  }

  fn roots(&self) -> Result<Vec<CellId>> {
    let z = self.res_bounds().min;
    let n = Tile::n(z);
    let mut out = Vec::with_capacity((n * n) as usize);
    for x in 0..n {
      for y in 0..n {
        out.push(self.id(Tile { z, x, y }));
      }
    }
    Ok(out)
  }

  /// Tile range scan, x-major.
  fn cover_bbox(&self, bbox: &BBox, res: u8) -> Result<Option<Vec<CellId>>> {
    self.validate_resolution(res)?;
    let mut out = Vec::new();
    let lat_lo = bbox.lat_min.max(-MERCATOR_MAX_LAT);
    let lat_hi = bbox.lat_max.min(MERCATOR_MAX_LAT);
    if lat_lo > lat_hi {
      return Ok(Some(out));
    }
    let (y0, y1) = (Tile::y_at(lat_hi, res), Tile::y_at(lat_lo, res));
    for part in bbox.split_antimeridian() {
      let x0 = Tile::x_at(part.lon_min, res);
      // the eastern edge belongs to the next tile
      let x1 = if part.lon_max >= 180.0 {
        Tile::n(res) - 1
      } else {
        Tile::x_at(part.lon_max, res)
      };
      for x in x0..=x1 {
        for y in y0..=y1 {
          out.push(self.id(Tile { z: res, x, y }));
        }
      }
    }
    Ok(Some(out))
  }

  fn cell_count(&self, res: u8) -> f64 {
    4f64.powi(i32::from(res))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_tile_math() {
    let t = Tile::containing(51.5074, -0.1278, 10);
    assert_eq!((t.x, t.y), (511, 340));
    let (lat_min, lon_min, lat_max, lon_max) = t.bounds();
    assert!(lat_min <= 51.5074 && 51.5074 <= lat_max);
    assert!(lon_min <= -0.1278 && -0.1278 <= lon_max);
  }

  #[test]
  fn test_quadkey_round_trip() {
    let t = Tile { z: 3, x: 3, y: 5 };
    assert_eq!(t.quadkey(), "213");
    assert_eq!(Tile::from_quadkey("213"), Some(t));
    assert_eq!(t.tilecode(), "z3x3y5");
    assert_eq!(Tile::from_tilecode("z3x3y5"), Some(t));
    assert_eq!(Tile::from_tilecode("z3x8y5"), None);
  }

  #[test]
  fn test_codecs() {
    let qk = TileCodec::quadkey();
    let tc = TileCodec::tilecode();
    assert!(qk.encode(86.0, 0.0, 5).is_err(), "outside web mercator");
    assert_eq!(qk.roots().unwrap().len(), 4);
    assert_eq!(tc.roots().unwrap().len(), 1);
    let cell = tc.parse("Z1X0Y0").unwrap();
    assert_eq!(tc.parent(&cell).unwrap().unwrap().to_string(), "z0x0y0");
    assert!(qk.parent(&qk.parse("2").unwrap()).unwrap().is_none(), "quadkeys start at zoom 1");
    assert_eq!(tc.children(&cell, 3).unwrap().len(), 16);
  }

  #[test]
  fn test_cover_bbox_wraps() {
    let tc = TileCodec::tilecode();
    let bbox = BBox::new(-10.0, 170.0, 10.0, -170.0).unwrap();
    let cells = tc.cover_bbox(&bbox, 2).unwrap().unwrap();
    assert_eq!(cells.len(), 4, "two columns either side of the antimeridian");
  }

  #[test]
  fn test_world_spanning_tiles_have_geometry() {
    use crate::geometry::cell_geometry;
    let tc = TileCodec::tilecode();
    let world = cell_geometry(&tc, &tc.parse("z0x0y0").unwrap()).unwrap();
    assert!(!world.is_multi());
    for (lat, lon) in [(10.0, 10.0), (-60.0, -179.9), (80.0, 179.9)] {
      assert!(world.contains_point(lat, lon));
    }
    let qk = TileCodec::quadkey();
    for (lat, lon) in [(40.0, -100.0), (40.0, 100.0), (-40.0, -100.0), (-40.0, 100.0), (1.0, 179.99), (-1.0, -179.99)] {
      let cell = qk.encode(lat, lon, 1).unwrap();
      let g = cell_geometry(&qk, &cell).unwrap();
      assert!(g.contains_point(lat, lon), "{cell}");
      assert!(!g.contains_point(-lat, -lon), "{cell} is a quarter, not a cap");
      assert!(!g.contains_point(88.0, lon), "{cell} stops at the mercator limit");
    }
  }
}
