//! Core value types shared by every grid: cell identifiers, grid kinds,
//! resolution bounds, bounding boxes, attribute values and the crate error.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by codecs, engines and the conversion façade.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DggsError {
  /// Latitude/longitude non-finite or outside the grid's domain.
  #[error("invalid coordinate: lat {lat}, lon {lon}")]
  InvalidCoordinate { lat: f64, lon: f64 },

  /// Token that does not decode to a cell of the given grid.
  #[error("invalid {kind} cell token `{token}`")]
  InvalidCellToken { kind: DggsKind, token: String },

  /// Resolution outside the grid's allowed set.
  #[error("resolution {res} out of range for {kind}")]
  OutOfRange { kind: DggsKind, res: u8 },

  /// A numeric statistic was requested without a numeric field.
  #[error("statistic `{0}` requires a numeric field")]
  MissingNumericField(String),

  /// Whole-world generation above the grid's world threshold.
  #[error("{kind} resolution {res} exceeds world threshold {threshold}; supply a bounding box")]
  ResolutionRequiresBbox { kind: DggsKind, res: u8, threshold: u8 },

  /// Compaction requested on a grid without a strict hierarchy.
  #[error("compaction is not supported for {0}")]
  CompactionUnsupported(DggsKind),

  /// Expansion target coarser than one of the input cells.
  #[error("target resolution {target} is below input resolution {input}")]
  TargetBelowInput { target: u8, input: u8 },

  /// Resampling between identical grids.
  #[error("source and target grid are both {0}")]
  SameDggs(DggsKind),

  /// Backend for a grid is not registered or failed to load.
  #[error("grid backend unavailable: {0}")]
  Unavailable(String),

  /// A cell ring that cannot be turned into a valid polygon.
  #[error("unfixable geometry: {0}")]
  UnfixableGeometry(String),

  /// Operation was cancelled through its `CancellationToken`.
  #[error("operation cancelled")]
  Cancelled,

  /// Unknown statistic name.
  #[error("invalid statistic `{0}`")]
  InvalidStatistic(String),

  /// Malformed configuration key or value.
  #[error("invalid configuration: {0}")]
  InvalidConfig(String),
}

/// Result type for grid operations.
pub type Result<T> = std::result::Result<T, DggsError>;

/// Variants of the DGGAL grid family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DggalVariant {
  Gnosis,
  Isea3h,
  Isea9r,
  Ivea3h,
  Ivea9r,
  Rtea3h,
  Rtea9r,
  Rhealpix,
}

impl DggalVariant {
  pub const ALL: [DggalVariant; 8] = [
    DggalVariant::Gnosis,
    DggalVariant::Isea3h,
    DggalVariant::Isea9r,
    DggalVariant::Ivea3h,
    DggalVariant::Ivea9r,
    DggalVariant::Rtea3h,
    DggalVariant::Rtea9r,
    DggalVariant::Rhealpix,
  ];

  #[must_use]
  pub fn as_str(self) -> &'static str {
    match self {
      DggalVariant::Gnosis => "gnosis",
      DggalVariant::Isea3h => "isea3h",
      DggalVariant::Isea9r => "isea9r",
      DggalVariant::Ivea3h => "ivea3h",
      DggalVariant::Ivea9r => "ivea9r",
      DggalVariant::Rtea3h => "rtea3h",
      DggalVariant::Rtea9r => "rtea9r",
      DggalVariant::Rhealpix => "rhealpix",
    }
  }

  /// Aperture-3 hexagonal variants only have an advisory parent.
  #[must_use]
  pub fn is_aperture3(self) -> bool {
    matches!(self, DggalVariant::Isea3h | DggalVariant::Ivea3h | DggalVariant::Rtea3h)
  }
}

/// How a grid's cells nest across resolutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Hierarchy {
  /// Every cell has exactly one parent whose extent is tiled by its children.
  Strict,
  /// A parent exists but children do not tile it exactly.
  Advisory,
  /// Resolutions are unrelated.
  None,
}

/// Inclusive resolution bounds with a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResBounds {
  pub min: u8,
  pub max: u8,
  pub default: u8,
}

impl ResBounds {
  #[must_use]
  pub const fn new(min: u8, max: u8, default: u8) -> Self {
    Self { min, max, default }
  }

  #[must_use]
  pub fn contains(&self, res: u8) -> bool {
    (self.min..=self.max).contains(&res)
  }
}

/// Enumerated tag of every supported grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DggsKind {
  H3,
  S2,
  A5,
  RHealpix,
  Isea4t,
  Isea3h,
  Qtm,
  Olc,
  Geohash,
  Georef,
  Mgrs,
  Tilecode,
  Quadkey,
  Maidenhead,
  Gars,
  Dggal(DggalVariant),
}

impl DggsKind {
  /// Grids with a codec bundled in this crate.
  pub const NATIVE: [DggsKind; 12] = [
    DggsKind::H3,
    DggsKind::S2,
    DggsKind::RHealpix,
    DggsKind::Qtm,
    DggsKind::Olc,
    DggsKind::Geohash,
    DggsKind::Georef,
    DggsKind::Mgrs,
    DggsKind::Tilecode,
    DggsKind::Quadkey,
    DggsKind::Maidenhead,
    DggsKind::Gars,
  ];

  /// Every kind, native grids first.
  #[must_use]
  pub fn all() -> Vec<DggsKind> {
    let mut kinds = Self::NATIVE.to_vec();
    kinds.extend([DggsKind::A5, DggsKind::Isea4t, DggsKind::Isea3h]);
    kinds.extend(DggalVariant::ALL.iter().map(|v| DggsKind::Dggal(*v)));
    kinds
  }

  #[must_use]
  pub fn name(self) -> &'static str {
    match self {
      DggsKind::H3 => "h3",
      DggsKind::S2 => "s2",
      DggsKind::A5 => "a5",
      DggsKind::RHealpix => "rhealpix",
      DggsKind::Isea4t => "isea4t",
      DggsKind::Isea3h => "isea3h",
      DggsKind::Qtm => "qtm",
      DggsKind::Olc => "olc",
      DggsKind::Geohash => "geohash",
      DggsKind::Georef => "georef",
      DggsKind::Mgrs => "mgrs",
      DggsKind::Tilecode => "tilecode",
      DggsKind::Quadkey => "quadkey",
      DggsKind::Maidenhead => "maidenhead",
      DggsKind::Gars => "gars",
      DggsKind::Dggal(v) => match v {
        DggalVariant::Gnosis => "dggal_gnosis",
        DggalVariant::Isea3h => "dggal_isea3h",
        DggalVariant::Isea9r => "dggal_isea9r",
        DggalVariant::Ivea3h => "dggal_ivea3h",
        DggalVariant::Ivea9r => "dggal_ivea9r",
        DggalVariant::Rtea3h => "dggal_rtea3h",
        DggalVariant::Rtea9r => "dggal_rtea9r",
        DggalVariant::Rhealpix => "dggal_rhealpix",
      },
    }
  }

  /// Name of the id column in binning and generation output.
  #[must_use]
  pub fn id_field(self) -> &'static str {
    self.name()
  }

  #[must_use]
  pub fn is_native(self) -> bool {
    Self::NATIVE.contains(&self)
  }

  #[must_use]
  pub fn default_bounds(self) -> ResBounds {
    match self {
      DggsKind::H3 => ResBounds::new(0, 15, 8),
      DggsKind::S2 => ResBounds::new(0, 30, 12),
      DggsKind::A5 => ResBounds::new(0, 29, 10),
      DggsKind::RHealpix => ResBounds::new(0, 15, 5),
      DggsKind::Isea4t => ResBounds::new(0, 25, 10),
      DggsKind::Isea3h => ResBounds::new(0, 32, 12),
      DggsKind::Qtm => ResBounds::new(1, 24, 10),
      DggsKind::Olc => ResBounds::new(2, 15, 10),
      DggsKind::Geohash => ResBounds::new(1, 12, 6),
      DggsKind::Georef => ResBounds::new(0, 5, 2),
      DggsKind::Mgrs => ResBounds::new(0, 5, 3),
      DggsKind::Tilecode => ResBounds::new(0, 29, 12),
      DggsKind::Quadkey => ResBounds::new(1, 29, 12),
      DggsKind::Maidenhead => ResBounds::new(1, 4, 2),
      DggsKind::Gars => ResBounds::new(1, 4, 2),
      DggsKind::Dggal(_) => ResBounds::new(0, 16, 8),
    }
  }

  /// Highest resolution that may be generated without a bounding box.
  #[must_use]
  pub fn default_world_threshold(self) -> u8 {
    match self {
      DggsKind::H3 | DggsKind::Olc | DggsKind::Dggal(_) => 4,
      DggsKind::S2 | DggsKind::A5 | DggsKind::RHealpix => 5,
      DggsKind::Isea4t | DggsKind::Isea3h => 6,
      DggsKind::Qtm => 9,
      DggsKind::Geohash => 3,
      DggsKind::Georef | DggsKind::Gars => 1,
      DggsKind::Mgrs => 0,
      DggsKind::Tilecode | DggsKind::Quadkey => 8,
      DggsKind::Maidenhead => 2,
    }
  }

  #[must_use]
  pub fn default_hierarchy(self) -> Hierarchy {
    match self {
      DggsKind::Isea3h | DggsKind::Mgrs => Hierarchy::Advisory,
      DggsKind::Dggal(v) if v.is_aperture3() => Hierarchy::Advisory,
      _ => Hierarchy::Strict,
    }
  }

  /// Regular grids report an average edge length, graticules width and height.
  #[must_use]
  pub fn is_regular(self) -> bool {
    !matches!(
      self,
      DggsKind::Olc
        | DggsKind::Geohash
        | DggsKind::Georef
        | DggsKind::Mgrs
        | DggsKind::Tilecode
        | DggsKind::Quadkey
        | DggsKind::Maidenhead
        | DggsKind::Gars
    )
  }
}

impl fmt::Display for DggsKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for DggsKind {
  type Err = DggsError;

  fn from_str(s: &str) -> Result<Self> {
    let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
    let wanted = match wanted.as_str() {
      "plus_code" | "pluscode" | "plus_codes" => "olc".to_string(),
      "rhp" => "rhealpix".to_string(),
      _ => wanted,
    };
    DggsKind::all()
      .into_iter()
      .find(|k| k.name() == wanted)
      .ok_or_else(|| DggsError::Unavailable(format!("unknown grid `{s}`")))
  }
}

/// Grid-specific payload of a cell identifier.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CellToken {
  /// 64-bit ids (H3, S2).
  Int(u64),
  /// Canonical string ids.
  Text(String),
  /// rHEALPix region letter with its subdivision digits.
  Path { region: char, digits: Vec<u8> },
}

/// A cell of one grid. Compared by `(kind, canonical string)`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellId {
  pub kind: DggsKind,
  pub token: CellToken,
}

impl CellId {
  #[must_use]
  pub fn int(kind: DggsKind, value: u64) -> Self {
    Self {
      kind,
      token: CellToken::Int(value),
    }
  }

  #[must_use]
  pub fn text(kind: DggsKind, value: impl Into<String>) -> Self {
    Self {
      kind,
      token: CellToken::Text(value.into()),
    }
  }

  #[must_use]
  pub fn path(kind: DggsKind, region: char, digits: Vec<u8>) -> Self {
    Self {
      kind,
      token: CellToken::Path { region, digits },
    }
  }

  /// Integer payload, if any.
  #[must_use]
  pub fn as_u64(&self) -> Option<u64> {
    match self.token {
      CellToken::Int(v) => Some(v),
      _ => None,
    }
  }

  /// String payload for text tokens.
  #[must_use]
  pub fn as_text(&self) -> Option<&str> {
    match &self.token {
      CellToken::Text(s) => Some(s),
      _ => None,
    }
  }

  /// Canonical string form.
  #[must_use]
  pub fn canonical(&self) -> String {
    match &self.token {
      CellToken::Int(v) => match self.kind {
        DggsKind::S2 => s2_token(*v),
        _ => format!("{v:015x}"),
      },
      CellToken::Text(s) => s.clone(),
      CellToken::Path { region, digits } => {
        let mut out = String::with_capacity(digits.len() + 1);
        out.push(*region);
        for d in digits {
          out.push(char::from(b'0' + d));
        }
        out
      }
    }
  }

  pub(crate) fn invalid(&self) -> DggsError {
    DggsError::InvalidCellToken {
      kind: self.kind,
      token: self.canonical(),
    }
  }
}

fn s2_token(id: u64) -> String {
  if id == 0 {
    return "X".to_string();
  }
  let hex = format!("{id:016x}");
  hex.trim_end_matches('0').to_string()
}

impl fmt::Display for CellId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.canonical())
  }
}

impl PartialEq for CellId {
  fn eq(&self, other: &Self) -> bool {
    self.kind == other.kind && self.canonical() == other.canonical()
  }
}

impl Eq for CellId {}

impl Hash for CellId {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.kind.hash(state);
    self.canonical().hash(state);
  }
}

impl PartialOrd for CellId {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for CellId {
  fn cmp(&self, other: &Self) -> Ordering {
    self
      .kind
      .cmp(&other.kind)
      .then_with(|| self.canonical().as_bytes().cmp(other.canonical().as_bytes()))
  }
}

/// Geographic bounding box in WGS84 degrees.
///
/// `lon_min > lon_max` denotes a box crossing the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BBox {
  pub lat_min: f64,
  pub lon_min: f64,
  pub lat_max: f64,
  pub lon_max: f64,
}

impl BBox {
  /// Validated constructor.
  pub fn new(lat_min: f64, lon_min: f64, lat_max: f64, lon_max: f64) -> Result<Self> {
    let finite = [lat_min, lon_min, lat_max, lon_max].iter().all(|v| v.is_finite());
    if !finite || lat_min > lat_max || !(-90.0..=90.0).contains(&lat_min) || !(-90.0..=90.0).contains(&lat_max) {
      return Err(DggsError::InvalidCoordinate {
        lat: lat_min,
        lon: lon_min,
      });
    }
    if !(-180.0..=180.0).contains(&lon_min) || !(-180.0..=180.0).contains(&lon_max) {
      return Err(DggsError::InvalidCoordinate {
        lat: lat_max,
        lon: lon_max,
      });
    }
    Ok(Self {
      lat_min,
      lon_min,
      lat_max,
      lon_max,
    })
  }

  #[must_use]
  pub const fn world() -> Self {
    Self {
      lat_min: -90.0,
      lon_min: -180.0,
      lat_max: 90.0,
      lon_max: 180.0,
    }
  }

  #[must_use]
  pub fn crosses_antimeridian(&self) -> bool {
    self.lon_min > self.lon_max
  }

  /// Splits a box crossing the antimeridian into its eastern and western halves.
  #[must_use]
  pub fn split_antimeridian(&self) -> Vec<BBox> {
    if self.crosses_antimeridian() {
      vec![
        BBox {
          lon_max: 180.0,
          ..*self
        },
        BBox {
          lon_min: -180.0,
          ..*self
        },
      ]
    } else {
      vec![*self]
    }
  }

  #[must_use]
  pub fn contains(&self, lat: f64, lon: f64) -> bool {
    if lat < self.lat_min || lat > self.lat_max {
      return false;
    }
    if self.crosses_antimeridian() {
      lon >= self.lon_min || lon <= self.lon_max
    } else {
      lon >= self.lon_min && lon <= self.lon_max
    }
  }

  /// Smallest box holding all of `boxes`. It crosses the antimeridian when
  /// the widest empty run of longitudes lies away from it.
  #[must_use]
  pub fn covering<I: IntoIterator<Item = BBox>>(boxes: I) -> Option<BBox> {
    let mut parts: Vec<BBox> = boxes.into_iter().flat_map(|b| b.split_antimeridian()).collect();
    if parts.is_empty() {
      return None;
    }
    let lat_min = parts.iter().map(|b| b.lat_min).fold(f64::INFINITY, f64::min);
    let lat_max = parts.iter().map(|b| b.lat_max).fold(f64::NEG_INFINITY, f64::max);
    parts.sort_by(|a, b| a.lon_min.total_cmp(&b.lon_min));
    let mut runs: Vec<(f64, f64)> = Vec::with_capacity(parts.len());
    for p in &parts {
      match runs.last_mut() {
        Some(last) if p.lon_min <= last.1 => last.1 = last.1.max(p.lon_max),
        _ => runs.push((p.lon_min, p.lon_max)),
      }
    }
    let (west, east) = (runs[0].0, runs[runs.len() - 1].1);
    let (mut gap, mut lon_min, mut lon_max) = (west + 360.0 - east, west, east);
    for w in runs.windows(2) {
      if w[1].0 - w[0].1 > gap {
        gap = w[1].0 - w[0].1;
        lon_min = w[1].0;
        lon_max = w[0].1;
      }
    }
    if gap <= 0.0 {
      (lon_min, lon_max) = (-180.0, 180.0);
    }
    Some(BBox {
      lat_min,
      lon_min,
      lat_max,
      lon_max,
    })
  }

  /// Overlap test for two boxes that do not cross the antimeridian.
  #[must_use]
  pub fn intersects(&self, other: &BBox) -> bool {
    self.lat_min <= other.lat_max
      && other.lat_min <= self.lat_max
      && self.lon_min <= other.lon_max
      && other.lon_min <= self.lon_max
  }

  /// Grows the box by a fraction of its size on every side, clamped to the globe.
  #[must_use]
  pub fn buffered(&self, fraction: f64) -> BBox {
    let dlat = (self.lat_max - self.lat_min) * fraction;
    if self.crosses_antimeridian() {
      let dlon = (self.lon_max - self.lon_min + 360.0) * fraction;
      let (lon_min, lon_max) = (self.lon_min - dlon, self.lon_max + dlon);
      let (lon_min, lon_max) = if lon_min <= lon_max { (-180.0, 180.0) } else { (lon_min, lon_max) };
      return BBox {
        lat_min: (self.lat_min - dlat).max(-90.0),
        lon_min,
        lat_max: (self.lat_max + dlat).min(90.0),
        lon_max,
      };
    }
    let dlon = (self.lon_max - self.lon_min) * fraction;
    BBox {
      lat_min: (self.lat_min - dlat).max(-90.0),
      lon_min: (self.lon_min - dlon).max(-180.0),
      lat_max: (self.lat_max + dlat).min(90.0),
      lon_max: (self.lon_max + dlon).min(180.0),
    }
  }

  #[must_use]
  pub fn to_rect(&self) -> geo_types::Rect<f64> {
    geo_types::Rect::new(
      geo_types::coord! { x: self.lon_min, y: self.lat_min },
      geo_types::coord! { x: self.lon_max, y: self.lat_max },
    )
  }

  #[must_use]
  pub fn from_rect(rect: &geo_types::Rect<f64>) -> Self {
    Self {
      lat_min: rect.min().y,
      lon_min: rect.min().x,
      lat_max: rect.max().y,
      lon_max: rect.max().x,
    }
  }
}

/// Attribute value carried by input features and emitted in output records.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum AttributeValue {
  #[default]
  Null,
  Bool(bool),
  Int(i64),
  Float(f64),
  Text(String),
}

impl AttributeValue {
  #[must_use]
  pub fn is_null(&self) -> bool {
    matches!(self, AttributeValue::Null)
  }

  /// Numeric reading of the value; text is parsed after trimming.
  #[must_use]
  pub fn as_f64(&self) -> Option<f64> {
    match self {
      AttributeValue::Int(v) => Some(*v as f64),
      AttributeValue::Float(v) if v.is_finite() => Some(*v),
      AttributeValue::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
      _ => None,
    }
  }
}

impl fmt::Display for AttributeValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      AttributeValue::Null => Ok(()),
      AttributeValue::Bool(b) => write!(f, "{b}"),
      AttributeValue::Int(v) => write!(f, "{v}"),
      AttributeValue::Float(v) => write!(f, "{v}"),
      AttributeValue::Text(s) => f.write_str(s),
    }
  }
}

impl From<f64> for AttributeValue {
  fn from(v: f64) -> Self {
    AttributeValue::Float(v)
  }
}

impl From<i64> for AttributeValue {
  fn from(v: i64) -> Self {
    AttributeValue::Int(v)
  }
}

impl From<&str> for AttributeValue {
  fn from(v: &str) -> Self {
    AttributeValue::Text(v.to_string())
  }
}

impl From<String> for AttributeValue {
  fn from(v: String) -> Self {
    AttributeValue::Text(v)
  }
}

impl<T: Into<AttributeValue>> From<Option<T>> for AttributeValue {
  fn from(v: Option<T>) -> Self {
    v.map_or(AttributeValue::Null, Into::into)
  }
}

/// Named attribute values of one input feature.
pub type Attributes = std::collections::BTreeMap<String, AttributeValue>;

/// Rejects non-finite or out-of-range WGS84 coordinates.
pub fn check_lat_lon(lat: f64, lon: f64) -> Result<()> {
  if lat.is_finite() && lon.is_finite() && (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) {
    Ok(())
  } else {
    Err(DggsError::InvalidCoordinate { lat, lon })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_kind_names_round_trip() {
    for kind in DggsKind::all() {
      let parsed: DggsKind = kind.name().parse().unwrap();
      assert_eq!(parsed, kind, "name round trip for {kind}");
    }
    assert_eq!("H3".parse::<DggsKind>().unwrap(), DggsKind::H3);
    assert_eq!(
      "DGGAL_ISEA9R".parse::<DggsKind>().unwrap(),
      DggsKind::Dggal(DggalVariant::Isea9r)
    );
    assert!("nope".parse::<DggsKind>().is_err());
  }

  #[test]
  fn test_cell_id_ordering() {
    let a = CellId::text(DggsKind::Geohash, "gcp");
    let b = CellId::text(DggsKind::Geohash, "gcq");
    let h = CellId::int(DggsKind::H3, 0x85283083fffffff);
    assert!(a < b);
    assert!(h < a, "kind compares first");
    assert_eq!(h.canonical(), "85283083fffffff");
  }

  #[test]
  fn test_path_token_canonical() {
    let c = CellId::path(DggsKind::RHealpix, 'N', vec![0, 4, 8]);
    assert_eq!(c.to_string(), "N048");
  }

  #[test]
  fn test_s2_token() {
    let c = CellId::int(DggsKind::S2, 0x89c2_5900_0000_0000);
    assert_eq!(c.canonical(), "89c259");
  }

  #[test]
  fn test_bbox_validation_and_split() {
    assert!(BBox::new(10.0, 0.0, 5.0, 1.0).is_err());
    assert!(BBox::new(0.0, 0.0, 1.0, 200.0).is_err());
    let b = BBox::new(-10.0, 170.0, 10.0, -170.0).unwrap();
    assert!(b.crosses_antimeridian());
    let parts = b.split_antimeridian();
    assert_eq!(parts.len(), 2);
    assert!(b.contains(0.0, 175.0));
    assert!(b.contains(0.0, -175.0));
    assert!(!b.contains(0.0, 0.0));
  }

  #[test]
  fn test_bbox_covering() {
    let bb = |a, b, c, d| BBox::new(a, b, c, d).unwrap();
    assert_eq!(BBox::covering(Vec::new()), None);
    // either side of the antimeridian: crossing, not the full band
    let u = BBox::covering([bb(0.0, 178.0, 1.0, 179.0), bb(-2.0, -179.5, 0.5, -178.0)]).unwrap();
    assert_eq!(u, bb(-2.0, 178.0, 1.0, -178.0));
    assert!(!u.contains(0.0, 0.0));
    let plain = BBox::covering([bb(0.0, 10.0, 1.0, 11.0), bb(0.0, 20.0, 1.0, 21.0)]).unwrap();
    assert_eq!(plain, bb(0.0, 10.0, 1.0, 21.0));
    let crossing = BBox::covering([bb(0.0, 170.0, 1.0, -170.0), bb(0.0, 160.0, 1.0, 165.0)]).unwrap();
    assert_eq!(crossing, bb(0.0, 160.0, 1.0, -170.0));
    let band = BBox::covering([bb(0.0, -180.0, 1.0, 0.0), bb(0.0, 0.0, 1.0, 180.0)]).unwrap();
    assert_eq!(band, bb(0.0, -180.0, 1.0, 180.0));
  }

  #[test]
  fn test_attribute_numeric() {
    assert_eq!(AttributeValue::from(" 4.5 ").as_f64(), Some(4.5));
    assert_eq!(AttributeValue::from("abc").as_f64(), None);
    assert_eq!(AttributeValue::Int(3).as_f64(), Some(3.0));
    assert_eq!(AttributeValue::Null.as_f64(), None);
  }
}
