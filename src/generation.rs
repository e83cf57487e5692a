//! Cell coverage of a bounding box, or of the whole globe at coarse
//! resolutions.
//!
//! Grids with a direct scan ([`DggsCodec::cover_bbox`]) enumerate their cells
//! in one pass. Every other grid is walked depth first from its roots,
//! skipping subtrees whose outline misses the query box.

use std::collections::HashSet;

use log::{debug, warn};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::geometry::{cell_geometry, describe_cell, CellGeometry, CellMetrics, Shape};
use crate::grids::DggsCodec;
use crate::progress::{CancellationToken, ProgressSink, ProgressTracker, StageProgress};
use crate::types::{AttributeValue, BBox, CellId, DggsError, Result};

/// One generated cell with its geometry and measures.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellRecord {
  pub cell: CellId,
  pub resolution: u8,
  pub geometry: CellGeometry,
  pub metrics: CellMetrics,
}

impl CellRecord {
  pub fn describe(codec: &dyn DggsCodec, cell: &CellId) -> Result<Self> {
    let resolution = codec.resolution(cell)?;
    let (geometry, metrics) = describe_cell(codec, cell)?;
    Ok(Self {
      cell: cell.clone(),
      resolution,
      geometry,
      metrics,
    })
  }

  /// Attribute columns in output order. Regular grids report the average
  /// edge length, graticule grids the cell width and height.
  #[must_use]
  pub fn columns(&self) -> Vec<(&'static str, AttributeValue)> {
    let m = &self.metrics;
    let mut cols = vec![
      ("cell_id", AttributeValue::Text(self.cell.canonical())),
      ("resolution", AttributeValue::Int(i64::from(self.resolution))),
      ("center_lat", AttributeValue::Float(m.center_lat)),
      ("center_lon", AttributeValue::Float(m.center_lon)),
    ];
    match m.shape {
      Shape::Regular { avg_edge_len_m } => cols.push(("avg_edge_len", AttributeValue::Float(avg_edge_len_m))),
      Shape::Graticule { width_m, height_m } => {
        cols.push(("cell_width", AttributeValue::Float(width_m)));
        cols.push(("cell_height", AttributeValue::Float(height_m)));
      }
    }
    cols.push(("cell_area", AttributeValue::Float(m.area_m2)));
    cols.push(("cell_perimeter", AttributeValue::Float(m.perimeter_m)));
    cols
  }
}

/// Cells at `res` with geometry and metrics. `bbox` of `None` means the
/// whole globe, which is only allowed up to the grid's world threshold.
pub fn generate(
  codec: &dyn DggsCodec,
  res: u8,
  bbox: Option<&BBox>,
  sink: &dyn ProgressSink,
  cancel: &CancellationToken,
) -> Result<Vec<CellRecord>> {
  let ids = generate_ids(codec, res, bbox, &StageProgress::new(sink, 0.0, 0.5), cancel)?;
  let stage = StageProgress::new(sink, 0.5, 0.5);
  let mut tracker = ProgressTracker::new(&stage);
  let mut out = Vec::with_capacity(ids.len());
  let mut dropped = 0;
  for (i, cell) in ids.iter().enumerate() {
    cancel.check()?;
    match CellRecord::describe(codec, cell) {
      Ok(record) => out.push(record),
      Err(DggsError::UnfixableGeometry(reason)) => {
        warn!("dropping {cell}: {reason}");
        dropped += 1;
      }
      Err(e) => return Err(e),
    }
    tracker.report_ratio(i + 1, ids.len());
  }
  tracker.finish();
  if dropped > 0 {
    warn!("{dropped} of {} {} cells dropped without a geometry", ids.len(), codec.kind());
  }
  Ok(out)
}

/// Identifiers of the cells [`generate`] would produce, in the same order.
pub fn generate_ids(
  codec: &dyn DggsCodec,
  res: u8,
  bbox: Option<&BBox>,
  sink: &dyn ProgressSink,
  cancel: &CancellationToken,
) -> Result<Vec<CellId>> {
  codec.validate_resolution(res)?;
  let threshold = codec.world_threshold();
  if bbox.is_none() && res > threshold {
    return Err(DggsError::ResolutionRequiresBbox {
      kind: codec.kind(),
      res,
      threshold,
    });
  }
  let mut tracker = ProgressTracker::new(sink);
  let cells = match codec.cover_bbox(bbox.unwrap_or(&BBox::world()), res)? {
    Some(cells) => {
      let mut seen = HashSet::with_capacity(cells.len());
      let mut out = Vec::with_capacity(cells.len());
      for (i, cell) in cells.iter().enumerate() {
        cancel.check()?;
        if seen.insert(cell.clone()) {
          out.push(cell.clone());
        }
        tracker.report_ratio(i + 1, cells.len());
      }
      out
    }
    None => descend(codec, res, bbox, &mut tracker, cancel)?,
  };
  tracker.finish();
  debug!("generated {} {} cells at resolution {res}", cells.len(), codec.kind());
  Ok(cells)
}

/// Whether two boxes overlap, either of them possibly crossing the
/// antimeridian.
fn boxes_overlap(a: &BBox, b: &BBox) -> bool {
  a.split_antimeridian()
    .iter()
    .any(|pa| b.split_antimeridian().iter().any(|pb| pa.intersects(pb)))
}

/// Depth-first walk from the roots. Progress is tracked as the share of the
/// globe's cell tree already settled: each root carries an equal share that
/// its children split evenly.
fn descend(
  codec: &dyn DggsCodec,
  res: u8,
  bbox: Option<&BBox>,
  tracker: &mut ProgressTracker<'_>,
  cancel: &CancellationToken,
) -> Result<Vec<CellId>> {
  let roots = codec.roots()?;
  let share = 1.0 / roots.len().max(1) as f64;
  let mut stack: Vec<(CellId, f64)> = roots.into_iter().rev().map(|c| (c, share)).collect();
  let mut seen = HashSet::new();
  let mut out = Vec::new();
  let mut settled = 0.0;

  while let Some((cell, weight)) = stack.pop() {
    cancel.check()?;
    let cell_res = codec.resolution(&cell)?;
    if cell_res >= res {
      let keep = cell_res == res
        && match bbox {
          None => true,
          Some(b) => touches(codec, &cell, b)?,
        };
      if keep && seen.insert(cell.clone()) {
        out.push(cell);
      }
      settled += weight;
      tracker.report(settled);
      continue;
    }
    if let Some(b) = bbox {
      if !may_reach(codec, &cell, b) {
        settled += weight;
        tracker.report(settled);
        continue;
      }
    }
    let children = codec.children(&cell, cell_res + 1)?;
    if children.is_empty() {
      settled += weight;
      tracker.report(settled);
      continue;
    }
    let part = weight / children.len() as f64;
    stack.extend(children.into_iter().rev().map(|c| (c, part)));
  }
  Ok(out)
}

/// Whether the outline of `cell` touches `bbox`; cells without one do not.
fn touches(codec: &dyn DggsCodec, cell: &CellId, bbox: &BBox) -> Result<bool> {
  match cell_geometry(codec, cell) {
    Ok(g) => Ok(g.intersects_bbox(bbox)),
    Err(DggsError::UnfixableGeometry(reason)) => {
      warn!("dropping {cell}: {reason}");
      Ok(false)
    }
    Err(e) => Err(e),
  }
}

/// Whether descendants of `cell` can touch `bbox`. Cells whose outline
/// cannot be built are kept so their children get a chance.
fn may_reach(codec: &dyn DggsCodec, cell: &CellId, bbox: &BBox) -> bool {
  match cell_geometry(codec, cell) {
    Ok(g) => g
      .bbox()
      .map_or(true, |cb| boxes_overlap(&cb.buffered(codec.descent_margin()), bbox)),
    Err(e) => {
      debug!("descending through {cell} without pruning: {e}");
      true
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::grids::geohash::GeohashCodec;
  use crate::grids::h3::H3Codec;
  use crate::grids::qtm::QtmCodec;
  use crate::grids::rhealpix::RHealpixCodec;
  use crate::grids::s2::S2Codec;
  use crate::grids::testing::TwistedGeohash;
  use crate::progress::NoProgress;
  use std::cell::RefCell;

  fn ids(codec: &dyn DggsCodec, res: u8, bbox: Option<&BBox>) -> Vec<CellId> {
    generate_ids(codec, res, bbox, &NoProgress, &CancellationToken::new()).unwrap()
  }

  #[test]
  fn test_world_generation_counts() {
    assert_eq!(ids(&H3Codec, 0, None).len(), 122);
    assert_eq!(ids(&H3Codec, 1, None).len(), 842);
    assert_eq!(ids(&S2Codec, 1, None).len(), 24);
    assert_eq!(ids(&RHealpixCodec, 1, None).len(), 54);
    assert_eq!(ids(&QtmCodec, 2, None).len(), 32);
    assert_eq!(ids(&GeohashCodec, 1, None).len(), 32);
  }

  #[test]
  fn test_world_above_threshold_needs_bbox() {
    let err = generate_ids(&H3Codec, 5, None, &NoProgress, &CancellationToken::new()).unwrap_err();
    assert_eq!(
      err,
      DggsError::ResolutionRequiresBbox {
        kind: crate::types::DggsKind::H3,
        res: 5,
        threshold: 4
      }
    );
  }

  #[test]
  fn test_bbox_cover_contains_every_point() {
    let bbox = BBox::new(48.80, 2.25, 48.90, 2.42).unwrap();
    let cells = ids(&H3Codec, 7, Some(&bbox));
    assert!(!cells.is_empty());
    for (lat, lon) in [(48.85, 2.35), (48.81, 2.26), (48.89, 2.41)] {
      let c = H3Codec.encode(lat, lon, 7).unwrap();
      assert!(cells.contains(&c), "{c} missing for ({lat}, {lon})");
    }
    let far = H3Codec.encode(40.0, -3.7, 7).unwrap();
    assert!(!cells.contains(&far));
  }

  #[test]
  fn test_antimeridian_bbox() {
    let bbox = BBox::new(-1.0, 179.0, 1.0, -179.0).unwrap();
    let cells = ids(&S2Codec, 6, Some(&bbox));
    for lon in [179.5, -179.5] {
      let c = S2Codec.encode(0.0, lon, 6).unwrap();
      assert!(cells.contains(&c), "{c} missing at lon {lon}");
    }
    assert!(!cells.contains(&S2Codec.encode(0.0, 0.0, 6).unwrap()));
  }

  #[test]
  fn test_progress_and_cancellation() {
    let seen = RefCell::new(Vec::new());
    let sink = |p: f64| seen.borrow_mut().push(p);
    let records = generate(&QtmCodec, 3, None, &sink, &CancellationToken::new()).unwrap();
    assert_eq!(records.len(), 128);
    let seen = seen.into_inner();
    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "monotonic");
    assert!((seen.last().copied().unwrap() - 1.0).abs() < 1e-12);

    let cancel = CancellationToken::new();
    cancel.cancel();
    assert_eq!(generate(&QtmCodec, 3, None, &NoProgress, &cancel), Err(DggsError::Cancelled));
  }

  #[test]
  fn test_record_columns() {
    let cell = GeohashCodec.parse("u4pru").unwrap();
    let record = CellRecord::describe(&GeohashCodec, &cell).unwrap();
    let names: Vec<&str> = record.columns().iter().map(|(n, _)| *n).collect();
    assert_eq!(
      names,
      [
        "cell_id",
        "resolution",
        "center_lat",
        "center_lon",
        "cell_width",
        "cell_height",
        "cell_area",
        "cell_perimeter"
      ]
    );
    let h3 = CellRecord::describe(&H3Codec, &H3Codec.encode(0.0, 0.0, 3).unwrap()).unwrap();
    assert!(h3.columns().iter().any(|(n, _)| *n == "avg_edge_len"));
  }

  #[test]
  fn test_crossing_bbox_matches_its_halves() {
    let crossing = BBox::new(-5.0, 178.0, 5.0, -178.0).unwrap();
    let east = BBox::new(-5.0, 178.0, 5.0, 180.0).unwrap();
    let west = BBox::new(-5.0, -180.0, 5.0, -178.0).unwrap();
    let whole: HashSet<CellId> = ids(&H3Codec, 3, Some(&crossing)).into_iter().collect();
    let halves: HashSet<CellId> = ids(&H3Codec, 3, Some(&east))
      .into_iter()
      .chain(ids(&H3Codec, 3, Some(&west)))
      .collect();
    assert!(!whole.is_empty());
    assert_eq!(whole, halves);
  }

  #[test]
  fn test_unfixable_cells_dropped() {
    let all = generate(&TwistedGeohash, 1, None, &NoProgress, &CancellationToken::new()).unwrap();
    assert_eq!(all.len(), 31);
    assert!(all.iter().all(|r| r.cell.to_string() != "s"));
    let bbox = BBox::new(5.0, 5.0, 6.0, 6.0).unwrap();
    assert!(generate(&TwistedGeohash, 3, Some(&bbox), &NoProgress, &CancellationToken::new())
      .unwrap()
      .is_empty());
  }

  #[test]
  fn test_polar_cells_generated() {
    let records = generate(&GeohashCodec, 2, None, &NoProgress, &CancellationToken::new()).unwrap();
    assert_eq!(records.len(), 1024);
    let north = records.iter().find(|r| r.cell.to_string() == "zz").unwrap();
    assert!(north.geometry.contains_point(89.9, 179.9));
  }
}
