//! Aggregation of point features into grid cells or polygon bins.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;

use geo::{BoundingRect, Intersects};
use geo_types::{Point, Polygon, Rect};
use log::{debug, warn};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::geometry::{cell_geometry, CellGeometry};
use crate::grids::DggsCodec;
use crate::progress::{CancellationToken, ProgressSink, ProgressTracker};
use crate::stats::{CategoryStats, Statistic};
use crate::types::{check_lat_lon, AttributeValue, Attributes, CellId, DggsError, Result};

/// Category of every feature when no category field is set.
pub const ALL_CATEGORY: &str = "all";

/// Category of features whose category attribute is missing or null.
pub const NULL_CATEGORY: &str = "null";

/// Id column of polygon bins.
pub const POLYGON_ID_FIELD: &str = "bin_id";

/// Input point with its attributes.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointFeature {
  pub lat: f64,
  pub lon: f64,
  pub attributes: Attributes,
}

impl PointFeature {
  #[must_use]
  pub fn new(lat: f64, lon: f64) -> Self {
    Self {
      lat,
      lon,
      attributes: BTreeMap::new(),
    }
  }

  #[must_use]
  pub fn with(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
    self.attributes.insert(name.into(), value.into());
    self
  }

  #[must_use]
  pub fn get(&self, name: &str) -> Option<&AttributeValue> {
    self.attributes.get(name)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BinOptions {
  pub resolution: u8,
  pub statistic: Statistic,
  pub numeric_field: Option<String>,
  pub category_field: Option<String>,
}

impl BinOptions {
  /// Point counts at `resolution`.
  #[must_use]
  pub fn new(resolution: u8) -> Self {
    Self {
      resolution,
      statistic: Statistic::Count,
      numeric_field: None,
      category_field: None,
    }
  }

  #[must_use]
  pub fn statistic(mut self, statistic: Statistic, numeric_field: impl Into<String>) -> Self {
    self.statistic = statistic;
    self.numeric_field = Some(numeric_field.into());
    self
  }

  #[must_use]
  pub fn category(mut self, field: impl Into<String>) -> Self {
    self.category_field = Some(field.into());
    self
  }

  fn check(&self) -> Result<()> {
    let has_field = self.numeric_field.as_deref().is_some_and(|f| !f.trim().is_empty());
    if self.statistic.needs_field() && !has_field {
      return Err(DggsError::MissingNumericField(self.statistic.name().to_string()));
    }
    Ok(())
  }

  fn category_of(&self, feature: &PointFeature) -> String {
    match &self.category_field {
      None => ALL_CATEGORY.to_string(),
      Some(field) => match feature.get(field) {
        None | Some(AttributeValue::Null) => NULL_CATEGORY.to_string(),
        Some(v) => v.to_string().trim().to_lowercase(),
      },
    }
  }

  fn column(&self, category: &str) -> String {
    if self.category_field.is_some() {
      format!("{category}_{}", self.statistic)
    } else {
      self.statistic.to_string()
    }
  }
}

/// One output bin of [`bin_points`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BinRecord {
  pub cell: CellId,
  pub geometry: CellGeometry,
  /// Values aligned with [`BinOutput::columns`].
  pub values: Vec<AttributeValue>,
}

/// One output bin of [`bin_points_in_polygons`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PolygonBinRecord {
  /// Position of the polygon in the input.
  pub index: usize,
  pub polygon: Polygon<f64>,
  pub values: Vec<AttributeValue>,
}

/// Frozen result of a binning run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BinOutput<R> {
  /// Name of the bin id column.
  pub id_field: String,
  /// Statistic columns, one per category seen in the input.
  pub columns: Vec<String>,
  pub records: Vec<R>,
  /// Features dropped for invalid coordinates.
  pub skipped: usize,
  pub total: usize,
}

impl<R> BinOutput<R> {
  /// Index of a statistic column.
  #[must_use]
  pub fn column_index(&self, name: &str) -> Option<usize> {
    self.columns.iter().position(|c| c == name)
  }
}

/// Bins in first-insertion order with their per-category statistics.
struct Buckets<K> {
  order: Vec<K>,
  hits: HashMap<K, usize>,
  stats: HashMap<K, HashMap<String, CategoryStats>>,
  categories: Vec<String>,
  seen_categories: HashSet<String>,
}

impl<K: Hash + Eq + Clone> Buckets<K> {
  fn new() -> Self {
    Self {
      order: Vec::new(),
      hits: HashMap::new(),
      stats: HashMap::new(),
      categories: Vec::new(),
      seen_categories: HashSet::new(),
    }
  }

  fn add(&mut self, key: &K, category: &str, value: Option<&AttributeValue>) {
    if !self.stats.contains_key(key) {
      self.order.push(key.clone());
    }
    if self.seen_categories.insert(category.to_string()) {
      self.categories.push(category.to_string());
    }
    *self.hits.entry(key.clone()).or_default() += 1;
    self
      .stats
      .entry(key.clone())
      .or_default()
      .entry(category.to_string())
      .or_default()
      .add(value);
  }

  /// Features added under `key`.
  fn hits(&self, key: &K) -> usize {
    self.hits.get(key).copied().unwrap_or(0)
  }

  fn columns(&self, options: &BinOptions) -> Vec<String> {
    self.categories.iter().map(|c| options.column(c)).collect()
  }

  /// Finalised values of `key` per category column, null where the bin saw
  /// no feature of that category.
  fn values(&self, key: &K, statistic: Statistic) -> Vec<AttributeValue> {
    let per_cat = self.stats.get(key);
    self
      .categories
      .iter()
      .map(|cat| {
        per_cat
          .and_then(|m| m.get(cat))
          .map_or(AttributeValue::Null, |s| s.finalize(statistic))
      })
      .collect()
  }
}

fn summarise_skipped(skipped: usize, total: usize) {
  if skipped > 0 {
    warn!("{skipped} of {total} features skipped");
  }
}

/// Bins `points` into the cells of `codec` at `options.resolution`.
pub fn bin_points(
  codec: &dyn DggsCodec,
  points: &[PointFeature],
  options: &BinOptions,
  sink: &dyn ProgressSink,
  cancel: &CancellationToken,
) -> Result<BinOutput<BinRecord>> {
  options.check()?;
  codec.validate_resolution(options.resolution)?;
  let mut tracker = ProgressTracker::new(sink);
  let mut buckets = Buckets::new();
  let mut skipped = 0;

  for (i, feature) in points.iter().enumerate() {
    cancel.check()?;
    match check_lat_lon(feature.lat, feature.lon).and_then(|()| codec.encode(feature.lat, feature.lon, options.resolution)) {
      Ok(cell) => {
        let value = options.numeric_field.as_deref().and_then(|f| feature.get(f));
        buckets.add(&cell, &options.category_of(feature), value);
      }
      Err(e) => {
        debug!("skipping feature {i}: {e}");
        skipped += 1;
      }
    }
    tracker.report_ratio(i + 1, points.len());
  }

  let mut records = Vec::with_capacity(buckets.order.len());
  for cell in &buckets.order {
    cancel.check()?;
    let geometry = match cell_geometry(codec, cell) {
      Ok(g) => g,
      Err(DggsError::UnfixableGeometry(reason)) => {
        let hits = buckets.hits(cell);
        warn!("dropping {cell} and its {hits} features: {reason}");
        skipped += hits;
        continue;
      }
      Err(e) => return Err(e),
    };
    records.push(BinRecord {
      cell: cell.clone(),
      geometry,
      values: buckets.values(cell, options.statistic),
    });
  }
  tracker.finish();
  summarise_skipped(skipped, points.len());
  debug!("binned {} points into {} {} cells", points.len() - skipped, records.len(), codec.kind());
  Ok(BinOutput {
    id_field: codec.kind().id_field().to_string(),
    columns: buckets.columns(options),
    records,
    skipped,
    total: points.len(),
  })
}

/// Bins `points` into `polygons`; a point on or inside several polygons
/// counts towards each of them. Every polygon is reported, in input order.
/// `options.resolution` is not used.
pub fn bin_points_in_polygons(
  polygons: &[Polygon<f64>],
  points: &[PointFeature],
  options: &BinOptions,
  sink: &dyn ProgressSink,
  cancel: &CancellationToken,
) -> Result<BinOutput<PolygonBinRecord>> {
  options.check()?;
  let rects: Vec<Option<Rect<f64>>> = polygons.iter().map(BoundingRect::bounding_rect).collect();
  let mut tracker = ProgressTracker::new(sink);
  let mut buckets = Buckets::new();
  let mut skipped = 0;

  for (i, feature) in points.iter().enumerate() {
    cancel.check()?;
    if let Err(e) = check_lat_lon(feature.lat, feature.lon) {
      debug!("skipping feature {i}: {e}");
      skipped += 1;
      continue;
    }
    let pt = Point::new(feature.lon, feature.lat);
    let category = options.category_of(feature);
    let value = options.numeric_field.as_deref().and_then(|f| feature.get(f));
    for (index, polygon) in polygons.iter().enumerate() {
      let in_rect = rects[index].is_some_and(|r| pt.intersects(&r));
      if in_rect && pt.intersects(polygon) {
        buckets.add(&index, &category, value);
      }
    }
    tracker.report_ratio(i + 1, points.len());
  }

  let records = polygons
    .iter()
    .enumerate()
    .map(|(index, polygon)| PolygonBinRecord {
      index,
      polygon: polygon.clone(),
      values: buckets.values(&index, options.statistic),
    })
    .collect();
  tracker.finish();
  summarise_skipped(skipped, points.len());
  Ok(BinOutput {
    id_field: POLYGON_ID_FIELD.to_string(),
    columns: buckets.columns(options),
    records,
    skipped,
    total: points.len(),
  })
}
