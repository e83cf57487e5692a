//! Name-based conversions between coordinates and cells of any registered
//! grid.
//!
//! The free functions go through [`Registry::global`]. A [`Converter`] carries
//! its own registry and coordinate order, e.g. one built from a [`Config`].

use crate::config::{Config, CoordOrder};
use crate::generation::CellRecord;
use crate::geometry::{cell_geometry, CellGeometry};
use crate::grids::{DggsCodec, Registry};
use crate::types::{check_lat_lon, CellId, DggsError, Result};

/// Conversions over an explicit registry.
pub struct Converter<'r> {
  registry: &'r Registry,
  coord_order: CoordOrder,
}

impl<'r> Converter<'r> {
  #[must_use]
  pub fn new(registry: &'r Registry) -> Self {
    Self {
      registry,
      coord_order: CoordOrder::default(),
    }
  }

  /// Converter over `registry` reading coordinates in the configured order.
  /// Build the registry with [`Registry::with_config`] to apply the
  /// configured resolution bounds as well.
  #[must_use]
  pub fn with_config(registry: &'r Registry, config: &Config) -> Self {
    Self {
      registry,
      coord_order: config.coord_order,
    }
  }

  pub fn codec(&self, name: &str) -> Result<&'r dyn DggsCodec> {
    self.registry.get_by_name(name)
  }

  pub fn latlon2cell(&self, name: &str, lat: f64, lon: f64, res: u8) -> Result<CellId> {
    self.codec(name)?.encode(lat, lon, res)
  }

  /// Cell containing a point given as text, e.g. `"48.85, 2.35"`.
  pub fn text2cell(&self, name: &str, text: &str, res: u8) -> Result<CellId> {
    let (lat, lon) = parse_latlon(text, self.coord_order)?;
    self.latlon2cell(name, lat, lon, res)
  }

  pub fn parse_cell(&self, name: &str, token: &str) -> Result<CellId> {
    self.codec(name)?.parse(token)
  }

  pub fn cell2geometry(&self, name: &str, token: &str) -> Result<CellGeometry> {
    let codec = self.codec(name)?;
    cell_geometry(codec, &codec.parse(token)?)
  }

  pub fn cell2record(&self, name: &str, token: &str) -> Result<CellRecord> {
    let codec = self.codec(name)?;
    CellRecord::describe(codec, &codec.parse(token)?)
  }

  /// Centre of a cell as `(lat, lon)`.
  pub fn cell_to_latlon(&self, name: &str, token: &str) -> Result<(f64, f64)> {
    let m = self.cell2record(name, token)?.metrics;
    Ok((m.center_lat, m.center_lon))
  }
}

fn global() -> Converter<'static> {
  Converter::new(Registry::global())
}

pub fn latlon2cell(name: &str, lat: f64, lon: f64, res: u8) -> Result<CellId> {
  global().latlon2cell(name, lat, lon, res)
}

pub fn cell2geometry(name: &str, token: &str) -> Result<CellGeometry> {
  global().cell2geometry(name, token)
}

pub fn cell2record(name: &str, token: &str) -> Result<CellRecord> {
  global().cell2record(name, token)
}

pub fn cell_to_latlon(name: &str, token: &str) -> Result<(f64, f64)> {
  global().cell_to_latlon(name, token)
}

/// Reads two numbers separated by a comma, semicolon or whitespace, in
/// `order`, and returns them as a checked `(lat, lon)`.
pub fn parse_latlon(text: &str, order: CoordOrder) -> Result<(f64, f64)> {
  let bad = || DggsError::InvalidCoordinate {
    lat: f64::NAN,
    lon: f64::NAN,
  };
  let inner = text.trim().trim_start_matches('(').trim_end_matches(')');
  let numbers: Vec<f64> = inner
    .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
    .filter(|s| !s.is_empty())
    .map(str::parse::<f64>)
    .collect::<std::result::Result<_, _>>()
    .map_err(|_| bad())?;
  let &[a, b] = numbers.as_slice() else {
    return Err(bad());
  };
  let (lat, lon) = match order {
    CoordOrder::LatLon => (a, b),
    CoordOrder::LonLat => (b, a),
  };
  check_lat_lon(lat, lon)?;
  Ok((lat, lon))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::DggsKind;

  #[test]
  fn test_parse_latlon_orders() {
    assert_eq!(parse_latlon("48.85, 2.35", CoordOrder::LatLon).unwrap(), (48.85, 2.35));
    assert_eq!(parse_latlon(" (2.35;48.85) ", CoordOrder::LonLat).unwrap(), (48.85, 2.35));
    assert_eq!(parse_latlon("-33.9 151.2", CoordOrder::LatLon).unwrap(), (-33.9, 151.2));
    assert!(parse_latlon("48.85", CoordOrder::LatLon).is_err());
    assert!(parse_latlon("north, east", CoordOrder::LatLon).is_err());
    assert!(matches!(
      parse_latlon("2.35, 148.85", CoordOrder::LonLat),
      Err(DggsError::InvalidCoordinate { .. })
    ));
  }

  #[test]
  fn test_global_conversions() {
    let cell = latlon2cell("geohash", 57.64911, 10.40744, 11).unwrap();
    assert_eq!(cell.to_string(), "u4pruydqqvj");
    let (lat, lon) = cell_to_latlon("geohash", "u4pruydqqvj").unwrap();
    assert!((lat - 57.64911).abs() < 1e-3 && (lon - 10.40744).abs() < 1e-3);
    assert!(cell2geometry("h3", "85283473fffffff").is_ok());
    assert!(matches!(latlon2cell("nope", 0.0, 0.0, 1), Err(DggsError::Unavailable(_))));
    assert!(matches!(cell2record("a5", "abc"), Err(DggsError::Unavailable(_))));
  }

  #[test]
  fn test_converter_uses_config() {
    let mut cfg = Config::new();
    cfg.set("coordOrder", "lonlat").unwrap();
    cfg.set("dggs.h3.maxRes", "6").unwrap();
    let registry = Registry::with_config(&cfg);
    let conv = Converter::with_config(&registry, &cfg);
    let cell = conv.text2cell("h3", "2.35, 48.85", 6).unwrap();
    assert_eq!(cell.kind, DggsKind::H3);
    assert_eq!(cell, latlon2cell("h3", 48.85, 2.35, 6).unwrap());
    assert!(matches!(conv.text2cell("h3", "2.35, 48.85", 7), Err(DggsError::OutOfRange { .. })));
  }
}
