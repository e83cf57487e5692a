//! Adapter for grids whose cell arithmetic lives outside this crate (A5,
//! ISEA4T, ISEA3H and the DGGAL family).
//!
//! Such libraries usually speak in string tokens. [`GridBackend`] is the
//! small surface they have to provide; [`ExternalCodec`] lifts it into a full
//! [`DggsCodec`] with the registry's metadata for the grid kind, resolution
//! checks and token canonicalisation.

use geo_types::Coord;

use super::{check_encode, descend_to, expect_kind, DggsCodec, RawRing};
use crate::types::{BBox, CellId, DggsError, DggsKind, Hierarchy, ResBounds, Result};

/// Token-level operations of an out-of-crate grid library.
pub trait GridBackend: Send + Sync {
  /// Token of the cell containing a point; coordinates are already checked.
  fn encode(&self, lat: f64, lon: f64, res: u8) -> Result<String>;

  /// Boundary as `(lon, lat)` pairs in degrees.
  fn vertices(&self, token: &str) -> Result<Vec<(f64, f64)>>;

  fn resolution(&self, token: &str) -> Result<u8>;

  fn parent(&self, token: &str) -> Result<Option<String>>;

  /// Children one resolution down.
  fn children(&self, token: &str) -> Result<Vec<String>>;

  fn neighbors(&self, token: &str) -> Result<Vec<String>>;

  fn roots(&self) -> Result<Vec<String>>;

  fn cell_count(&self, res: u8) -> f64;

  /// Canonical form of a user supplied token, `None` when malformed.
  fn canonicalize(&self, token: &str) -> Option<String> {
    let t = token.trim();
    (!t.is_empty()).then(|| t.to_string())
  }

  /// Native bbox cover, if the library has one.
  fn cover_bbox(&self, _bbox: &BBox, _res: u8) -> Result<Option<Vec<String>>> {
    Ok(None)
  }
}

/// [`DggsCodec`] over a [`GridBackend`].
pub struct ExternalCodec<B> {
  kind: DggsKind,
  bounds: ResBounds,
  backend: B,
}

impl<B: GridBackend> ExternalCodec<B> {
  pub fn new(kind: DggsKind, backend: B) -> Self {
    Self {
      kind,
      bounds: kind.default_bounds(),
      backend,
    }
  }

  /// Replaces the resolution bounds reported for the grid.
  #[must_use]
  pub fn with_bounds(mut self, bounds: ResBounds) -> Self {
    self.bounds = bounds;
    self
  }

  fn token<'a>(&self, cell: &'a CellId) -> Result<&'a str> {
    expect_kind(cell, self.kind)?;
    cell.as_text().ok_or_else(|| cell.invalid())
  }

  fn id(&self, token: String) -> CellId {
    CellId::text(self.kind, token)
  }

  fn ids(&self, tokens: Vec<String>) -> Vec<CellId> {
    tokens.into_iter().map(|t| self.id(t)).collect()
  }
}

impl<B: GridBackend> DggsCodec for ExternalCodec<B> {
  fn kind(&self) -> DggsKind {
    self.kind
  }

  fn res_bounds(&self) -> ResBounds {
    self.bounds
  }

  fn encode(&self, lat: f64, lon: f64, res: u8) -> Result<CellId> {
    check_encode(self, lat, lon, res)?;
    self.backend.encode(lat, lon, res).map(|t| self.id(t))
  }

  fn decode(&self, cell: &CellId) -> Result<RawRing> {
    let ring = self.backend.vertices(self.token(cell)?)?;
    if ring.len() < 3 {
      return Err(cell.invalid());
    }
    Ok(ring.into_iter().map(|(x, y)| Coord { x, y }).collect())
  }

  fn resolution(&self, cell: &CellId) -> Result<u8> {
    self.backend.resolution(self.token(cell)?)
  }

  fn parent(&self, cell: &CellId) -> Result<Option<CellId>> {
    if self.hierarchy() == Hierarchy::None {
      return Ok(None);
    }
    Ok(self.backend.parent(self.token(cell)?)?.map(|t| self.id(t)))
  }

  fn children(&self, cell: &CellId, target: u8) -> Result<Vec<CellId>> {
    descend_to(self, cell, target, |c| Ok(self.ids(self.backend.children(self.token(c)?)?)))
  }

  fn neighbors(&self, cell: &CellId) -> Result<Vec<CellId>> {
    Ok(self.ids(self.backend.neighbors(self.token(cell)?)?))
  }

  fn parse(&self, token: &str) -> Result<CellId> {
    let bad = || DggsError::InvalidCellToken {
      kind: self.kind,
      token: token.to_string(),
    };
    let canonical = self.backend.canonicalize(token).ok_or_else(bad)?;
    let res = self.backend.resolution(&canonical).map_err(|_| bad())?;
    if !self.bounds.contains(res) {
      return Err(bad());
    }
    Ok(self.id(canonical))
  }

  fn roots(&self) -> Result<Vec<CellId>> {
    Ok(self.ids(self.backend.roots()?))
  }

  fn cover_bbox(&self, bbox: &BBox, res: u8) -> Result<Option<Vec<CellId>>> {
    self.validate_resolution(res)?;
    Ok(self.backend.cover_bbox(bbox, res)?.map(|t| self.ids(t)))
  }

  fn cell_count(&self, res: u8) -> f64 {
    self.backend.cell_count(res)
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;

  /// Lat/lon quadtree standing in for an out-of-crate library: tokens are
  /// `q` followed by one digit per level, `q` alone covering the globe.
  pub(crate) struct QuadBackend;

  fn bounds(token: &str) -> Option<(f64, f64, f64, f64)> {
    let digits = token.strip_prefix('q')?;
    let (mut lat0, mut lon0, mut lat1, mut lon1) = (-90.0, -180.0, 90.0, 180.0);
    for d in digits.bytes() {
      let d = d.checked_sub(b'0').filter(|d| *d < 4)?;
      let (mlat, mlon) = ((lat0 + lat1) / 2.0, (lon0 + lon1) / 2.0);
      if d & 1 == 1 {
        lon0 = mlon;
      } else {
        lon1 = mlon;
      }
      if d & 2 == 2 {
        lat0 = mlat;
      } else {
        lat1 = mlat;
      }
    }
    Some((lat0, lon0, lat1, lon1))
  }

  fn bad(token: &str) -> DggsError {
    DggsError::InvalidCellToken {
      kind: DggsKind::A5,
      token: token.to_string(),
    }
  }

  impl GridBackend for QuadBackend {
    fn encode(&self, lat: f64, lon: f64, res: u8) -> Result<String> {
      let mut token = String::from("q");
      let (mut lat0, mut lon0, mut lat1, mut lon1) = (-90.0, -180.0, 90.0, 180.0);
      for _ in 0..res {
        let (mlat, mlon) = ((lat0 + lat1) / 2.0, (lon0 + lon1) / 2.0);
        let mut d = 0;
        if lon >= mlon {
          d |= 1;
          lon0 = mlon;
        } else {
          lon1 = mlon;
        }
        if lat >= mlat {
          d |= 2;
          lat0 = mlat;
        } else {
          lat1 = mlat;
        }
        token.push(char::from(b'0' + d));
      }
      Ok(token)
    }

    fn vertices(&self, token: &str) -> Result<Vec<(f64, f64)>> {
      let (lat0, lon0, lat1, lon1) = bounds(token).ok_or_else(|| bad(token))?;
      Ok(vec![(lon0, lat0), (lon1, lat0), (lon1, lat1), (lon0, lat1)])
    }

    fn resolution(&self, token: &str) -> Result<u8> {
      bounds(token).map(|_| (token.len() - 1) as u8).ok_or_else(|| bad(token))
    }

    fn parent(&self, token: &str) -> Result<Option<String>> {
      bounds(token).ok_or_else(|| bad(token))?;
      Ok((token.len() > 1).then(|| token[..token.len() - 1].to_string()))
    }

    fn children(&self, token: &str) -> Result<Vec<String>> {
      bounds(token).ok_or_else(|| bad(token))?;
      Ok((0..4).map(|d| format!("{token}{d}")).collect())
    }

    fn neighbors(&self, _token: &str) -> Result<Vec<String>> {
      Ok(Vec::new())
    }

    fn roots(&self) -> Result<Vec<String>> {
      Ok(vec!["q".to_string()])
    }

    fn cell_count(&self, res: u8) -> f64 {
      4f64.powi(i32::from(res))
    }

    fn canonicalize(&self, token: &str) -> Option<String> {
      Some(token.trim().to_ascii_lowercase())
    }
  }

  #[test]
  fn test_adapter_round_trip() {
    let codec = ExternalCodec::new(DggsKind::A5, QuadBackend);
    let cell = codec.encode(10.0, 20.0, 3).unwrap();
    assert_eq!(cell.to_string(), "q300");
    assert_eq!(codec.resolution(&cell).unwrap(), 3);
    assert_eq!(codec.parse(" Q300 ").unwrap(), cell);
    assert_eq!(codec.parent(&cell).unwrap().unwrap().to_string(), "q30");
    assert_eq!(codec.children(&cell, 5).unwrap().len(), 16);
    assert_eq!(codec.decode(&cell).unwrap().len(), 4);
  }

  #[test]
  fn test_adapter_checks() {
    let codec = ExternalCodec::new(DggsKind::A5, QuadBackend).with_bounds(ResBounds::new(0, 4, 2));
    assert!(matches!(codec.encode(10.0, 20.0, 5), Err(DggsError::OutOfRange { .. })));
    assert!(matches!(codec.encode(91.0, 20.0, 1), Err(DggsError::InvalidCoordinate { .. })));
    assert!(codec.parse("q01234").is_err());
    let foreign = CellId::text(DggsKind::Isea4t, "q1");
    assert!(codec.resolution(&foreign).is_err());
  }
}
