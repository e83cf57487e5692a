//! Runtime configuration: coordinate order, per-grid resolution clamps and
//! colour hints.
//!
//! Settings are keyed by strings so that hosts can forward their own
//! key/value stores through [`Config::set`]. Nothing here touches the
//! environment or the filesystem.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::types::{DggsError, DggsKind, ResBounds, Result};

/// Order of the two numbers in textual coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CoordOrder {
  #[default]
  LatLon,
  LonLat,
}

impl FromStr for CoordOrder {
  type Err = DggsError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().replace(['_', '-', ' ', ','], "").as_str() {
      "latlon" | "latlng" | "yx" => Ok(CoordOrder::LatLon),
      "lonlat" | "lnglat" | "xy" => Ok(CoordOrder::LonLat),
      _ => Err(DggsError::InvalidConfig(format!("unknown coordinate order `{s}`"))),
    }
  }
}

/// Optional overrides of a grid's resolution bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResConfig {
  pub min_res: Option<u8>,
  pub max_res: Option<u8>,
  pub default_res: Option<u8>,
}

impl ResConfig {
  /// Narrows `base` by the overrides. Overrides never widen the native bounds
  /// and the default is kept inside the result.
  #[must_use]
  pub fn apply(&self, base: ResBounds) -> ResBounds {
    let min = self.min_res.map_or(base.min, |m| m.clamp(base.min, base.max));
    let max = self.max_res.map_or(base.max, |m| m.clamp(min, base.max));
    let default = self.default_res.unwrap_or(base.default).clamp(min, max);
    ResBounds { min, max, default }
  }
}

/// RGBA colour hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rgba {
  pub r: u8,
  pub g: u8,
  pub b: u8,
  pub a: u8,
}

impl FromStr for Rgba {
  type Err = DggsError;

  /// Parses `#RRGGBB` or `#RRGGBBAA`.
  fn from_str(s: &str) -> Result<Self> {
    let bad = || DggsError::InvalidConfig(format!("invalid colour `{s}`"));
    let hex = s.trim().strip_prefix('#').ok_or_else(bad)?;
    if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
      return Err(bad());
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| bad());
    Ok(Rgba {
      r: byte(0)?,
      g: byte(2)?,
      b: byte(4)?,
      a: if hex.len() == 8 { byte(6)? } else { 255 },
    })
  }
}

impl fmt::Display for Rgba {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
  }
}

/// Toolkit configuration.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct Config {
  pub coord_order: CoordOrder,
  pub persistent_marker: bool,
  /// Resolution overrides keyed by grid name.
  pub dggs: BTreeMap<String, ResConfig>,
  /// Colour hints keyed by grid name.
  pub colors: BTreeMap<String, Rgba>,
}

impl Config {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Sets one value using the host's key naming.
  ///
  /// Accepted keys: `coordOrder`, `persistentMarker`,
  /// `dggs.<name>.minRes|maxRes|defaultRes` and `<name>Color`.
  pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
    match key {
      "coordOrder" => {
        self.coord_order = value.parse()?;
        return Ok(());
      }
      "persistentMarker" => {
        self.persistent_marker = parse_bool(value)?;
        return Ok(());
      }
      _ => {}
    }

    if let Some(rest) = key.strip_prefix("dggs.") {
      let (name, field) = rest
        .rsplit_once('.')
        .ok_or_else(|| DggsError::InvalidConfig(format!("unknown key `{key}`")))?;
      let kind: DggsKind = name
        .parse()
        .map_err(|_| DggsError::InvalidConfig(format!("unknown grid in key `{key}`")))?;
      let res: u8 = value
        .trim()
        .parse()
        .map_err(|_| DggsError::InvalidConfig(format!("`{key}` expects a resolution, got `{value}`")))?;
      let entry = self.dggs.entry(kind.name().to_string()).or_default();
      match field {
        "minRes" => entry.min_res = Some(res),
        "maxRes" => entry.max_res = Some(res),
        "defaultRes" => entry.default_res = Some(res),
        _ => return Err(DggsError::InvalidConfig(format!("unknown key `{key}`"))),
      }
      return Ok(());
    }

    if let Some(name) = key.strip_suffix("Color") {
      let kind: DggsKind = name
        .parse()
        .map_err(|_| DggsError::InvalidConfig(format!("unknown grid in key `{key}`")))?;
      self.colors.insert(kind.name().to_string(), value.parse()?);
      return Ok(());
    }

    Err(DggsError::InvalidConfig(format!("unknown key `{key}`")))
  }

  /// Resolution bounds of `kind` after applying overrides to `base`.
  #[must_use]
  pub fn effective_bounds(&self, kind: DggsKind, base: ResBounds) -> ResBounds {
    self.dggs.get(kind.name()).map_or(base, |c| c.apply(base))
  }

  #[must_use]
  pub fn color(&self, kind: DggsKind) -> Option<Rgba> {
    self.colors.get(kind.name()).copied()
  }
}

fn parse_bool(value: &str) -> Result<bool> {
  match value.trim().to_ascii_lowercase().as_str() {
    "true" | "1" | "yes" | "on" => Ok(true),
    "false" | "0" | "no" | "off" => Ok(false),
    _ => Err(DggsError::InvalidConfig(format!("expected a boolean, got `{value}`"))),
  }
}
