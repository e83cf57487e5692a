//! Transfer of cell values from one grid onto another.
//!
//! Every target cell overlapping the sources receives the area-weighted mean
//! of the overlapping source values (or the value of the largest overlap in
//! [`ResampleMethod::Majority`] mode). Overlaps are planar intersections in
//! lon/lat measured geodesically.

use std::collections::HashSet;

use geo::{GeodesicArea, Intersects};
use geo_types::Rect;
use log::debug;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::generation::generate_ids;
use crate::geometry::{cell_geometry, overlap_area_m2, CellGeometry};
use crate::grids::{DggsCodec, Registry};
use crate::progress::{CancellationToken, ProgressSink, ProgressTracker, StageProgress};
use crate::types::{AttributeValue, BBox, CellId, DggsError, DggsKind, Result};

/// Overlaps below this share of the target cell are rounding noise.
const NOISE_SHARE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ResampleMethod {
  #[default]
  AreaWeighted,
  /// Value of the source with the largest overlap.
  Majority,
}

/// Cell of the source grid with its value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SourceCell {
  pub cell: CellId,
  pub value: AttributeValue,
}

impl SourceCell {
  pub fn new(cell: CellId, value: impl Into<AttributeValue>) -> Self {
    Self {
      cell,
      value: value.into(),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResampleRecord {
  pub cell: CellId,
  pub resolution: u8,
  pub geometry: CellGeometry,
  pub value: AttributeValue,
  /// Number of source cells overlapping this cell.
  pub sources: usize,
  pub covered_area_m2: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResampleOutput {
  pub target_kind: DggsKind,
  pub target_res: u8,
  pub records: Vec<ResampleRecord>,
}

/// Resolution of `target` whose mean cell area is closest, in log space, to
/// the mean cell area of `source` at `source_res`. Ties go to the coarser
/// resolution.
pub fn auto_resolution(source: &dyn DggsCodec, source_res: u8, target: &dyn DggsCodec) -> Result<u8> {
  let wanted = source.mean_cell_area_m2(source_res).ln();
  let bounds = target.res_bounds();
  (bounds.min..=bounds.max)
    .filter(|r| target.validate_resolution(*r).is_ok())
    .map(|r| (r, (target.mean_cell_area_m2(r).ln() - wanted).abs()))
    .fold(None, |best: Option<(u8, f64)>, (r, d)| match best {
      Some((_, bd)) if bd <= d => best,
      _ => Some((r, d)),
    })
    .map(|(r, _)| r)
    .ok_or(DggsError::OutOfRange {
      kind: target.kind(),
      res: source_res,
    })
}

/// Source cells prepared for overlap queries.
struct Source {
  value: AttributeValue,
  geometry: CellGeometry,
  rect: Option<Rect<f64>>,
}

/// Smallest box holding every source. It crosses the antimeridian when the
/// sources do, rather than widening to the full band.
fn union_bbox(sources: &[Source]) -> Option<BBox> {
  BBox::covering(sources.iter().filter_map(|s| s.geometry.bbox()))
}

/// Resamples `sources`, all cells of one grid, onto `target_kind`.
///
/// Without `target_res` the resolution is picked by [`auto_resolution`] from
/// the finest source resolution. Sources are visited in ascending cell order
/// and the output is sorted by cell.
pub fn resample(
  registry: &Registry,
  sources: &[SourceCell],
  target_kind: DggsKind,
  target_res: Option<u8>,
  method: ResampleMethod,
  sink: &dyn ProgressSink,
  cancel: &CancellationToken,
) -> Result<ResampleOutput> {
  let target = registry.get(target_kind)?;
  let Some(first) = sources.first() else {
    let res = target_res.unwrap_or(target.res_bounds().default);
    target.validate_resolution(res)?;
    return Ok(ResampleOutput {
      target_kind,
      target_res: res,
      records: Vec::new(),
    });
  };
  let source_kind = first.cell.kind;
  if source_kind == target_kind {
    return Err(DggsError::SameDggs(source_kind));
  }
  let source = registry.get(source_kind)?;

  let mut ordered: Vec<&SourceCell> = sources.iter().collect();
  ordered.sort_by(|a, b| a.cell.cmp(&b.cell));
  let mut seen = HashSet::new();
  ordered.retain(|s| seen.insert(s.cell.clone()));

  let stage = StageProgress::new(sink, 0.0, 0.2);
  let mut tracker = ProgressTracker::new(&stage);
  let mut prepared = Vec::with_capacity(ordered.len());
  let mut finest = 0;
  for (i, s) in ordered.iter().enumerate() {
    cancel.check()?;
    if s.cell.kind != source_kind {
      return Err(DggsError::InvalidCellToken {
        kind: source_kind,
        token: s.cell.canonical(),
      });
    }
    finest = finest.max(source.resolution(&s.cell)?);
    let geometry = cell_geometry(source, &s.cell)?;
    prepared.push(Source {
      value: s.value.clone(),
      rect: geometry.bounding_rect(),
      geometry,
    });
    tracker.report_ratio(i + 1, ordered.len());
  }

  let res = match target_res {
    Some(r) => {
      target.validate_resolution(r)?;
      r
    }
    None => auto_resolution(source, finest, target)?,
  };
  debug!("resampling {} {source_kind} cells onto {target_kind} resolution {res}", prepared.len());

  let Some(area) = union_bbox(&prepared) else {
    return Ok(ResampleOutput {
      target_kind,
      target_res: res,
      records: Vec::new(),
    });
  };
  let mut candidates = generate_ids(target, res, Some(&area), &StageProgress::new(sink, 0.2, 0.3), cancel)?;
  candidates.sort();

  let stage = StageProgress::new(sink, 0.5, 0.5);
  let mut tracker = ProgressTracker::new(&stage);
  let mut records = Vec::new();
  for (i, cell) in candidates.iter().enumerate() {
    cancel.check()?;
    if let Some(record) = resample_cell(target, cell, res, &prepared, method)? {
      records.push(record);
    }
    tracker.report_ratio(i + 1, candidates.len());
  }
  tracker.finish();
  Ok(ResampleOutput {
    target_kind,
    target_res: res,
    records,
  })
}

/// Record of one target cell, `None` when no source overlaps it.
fn resample_cell(
  target: &dyn DggsCodec,
  cell: &CellId,
  res: u8,
  sources: &[Source],
  method: ResampleMethod,
) -> Result<Option<ResampleRecord>> {
  let geometry = cell_geometry(target, cell)?;
  let Some(rect) = geometry.bounding_rect() else {
    return Ok(None);
  };
  let own: f64 = geometry.polygons().iter().map(|p| p.geodesic_area_unsigned()).sum();
  let noise = own * NOISE_SHARE;

  let mut covered = 0.0;
  let mut count = 0;
  let (mut weighted, mut weight) = (0.0, 0.0);
  let mut largest: Option<(f64, &AttributeValue)> = None;
  for s in sources {
    if !s.rect.is_some_and(|r| r.intersects(&rect)) {
      continue;
    }
    let a = overlap_area_m2(&geometry, &s.geometry);
    if a <= noise {
      continue;
    }
    covered += a;
    count += 1;
    if s.value.is_null() {
      continue;
    }
    if let Some(v) = s.value.as_f64() {
      weighted += v * a;
      weight += a;
    }
    if largest.map_or(true, |(best, _)| a > best) {
      largest = Some((a, &s.value));
    }
  }
  if count == 0 {
    return Ok(None);
  }
  let value = match method {
    ResampleMethod::AreaWeighted if weight > 0.0 => AttributeValue::Float(weighted / weight),
    ResampleMethod::AreaWeighted => AttributeValue::Null,
    ResampleMethod::Majority => largest.map_or(AttributeValue::Null, |(_, v)| v.clone()),
  };
  Ok(Some(ResampleRecord {
    cell: cell.clone(),
    resolution: res,
    geometry,
    value,
    sources: count,
    covered_area_m2: covered,
  }))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::grids::geohash::GeohashCodec;
  use crate::grids::h3::H3Codec;
  use crate::progress::NoProgress;

  fn children_of(token: &str, res: u8) -> Vec<CellId> {
    GeohashCodec.children(&GeohashCodec.parse(token).unwrap(), res).unwrap()
  }

  fn run(sources: &[SourceCell], res: Option<u8>, method: ResampleMethod) -> Result<ResampleOutput> {
    resample(
      Registry::global(),
      sources,
      DggsKind::H3,
      res,
      method,
      &NoProgress,
      &CancellationToken::new(),
    )
  }

  #[test]
  fn test_auto_resolution_by_log_area() {
    assert_eq!(auto_resolution(&GeohashCodec, 5, &H3Codec).unwrap(), 6);
    assert_eq!(auto_resolution(&H3Codec, 6, &GeohashCodec).unwrap(), 5);
  }

  #[test]
  fn test_same_grid_rejected() {
    let cell = H3Codec.encode(0.0, 0.0, 5).unwrap();
    let err = resample(
      Registry::global(),
      &[SourceCell::new(cell, 1.0)],
      DggsKind::H3,
      None,
      ResampleMethod::AreaWeighted,
      &NoProgress,
      &CancellationToken::new(),
    )
    .unwrap_err();
    assert_eq!(err, DggsError::SameDggs(DggsKind::H3));
  }

  #[test]
  fn test_weighted_mean_conserves_total() {
    let sources: Vec<SourceCell> = children_of("s0000", 6)
      .into_iter()
      .enumerate()
      .map(|(i, c)| SourceCell::new(c, i as f64))
      .collect();
    let out = run(&sources, Some(8), ResampleMethod::AreaWeighted).unwrap();
    assert_eq!(out.target_res, 8);
    assert!(out.records.windows(2).all(|w| w[0].cell < w[1].cell));

    let source_total: f64 = sources
      .iter()
      .map(|s| {
        let g = cell_geometry(&GeohashCodec, &s.cell).unwrap();
        let a: f64 = g.polygons().iter().map(|p| p.geodesic_area_unsigned()).sum();
        s.value.as_f64().unwrap() * a
      })
      .sum();
    let target_total: f64 = out
      .records
      .iter()
      .map(|r| r.value.as_f64().unwrap() * r.covered_area_m2)
      .sum();
    assert!((source_total - target_total).abs() / source_total < 1e-6);

    let parent = cell_geometry(&GeohashCodec, &GeohashCodec.parse("s0000").unwrap()).unwrap();
    let parent_area: f64 = parent.polygons().iter().map(|p| p.geodesic_area_unsigned()).sum();
    let covered: f64 = out.records.iter().map(|r| r.covered_area_m2).sum();
    assert!((covered - parent_area).abs() / parent_area < 1e-6);
  }

  #[test]
  fn test_majority_and_nulls() {
    let parent = GeohashCodec.decode(&GeohashCodec.parse("s0000").unwrap()).unwrap();
    let (west, east) = (parent[0].x, parent[1].x);
    let mid = (west + east) / 2.0;
    let sources: Vec<SourceCell> = children_of("s0000", 6)
      .into_iter()
      .map(|c| {
        let (_, lon) = cell_geometry(&GeohashCodec, &c).unwrap().centroid().unwrap();
        SourceCell::new(c, if lon < mid { "forest" } else { "water" })
      })
      .collect();
    let out = run(&sources, Some(8), ResampleMethod::Majority).unwrap();
    assert!(out
      .records
      .iter()
      .all(|r| r.value == AttributeValue::from("forest") || r.value == AttributeValue::from("water")));
    let lat = (parent[0].y + parent[2].y) / 2.0;
    let western = H3Codec.encode(lat, west + (east - west) / 8.0, 8).unwrap();
    let rec = out.records.iter().find(|r| r.cell == western).unwrap();
    assert_eq!(rec.value, AttributeValue::from("forest"));

    let weighted = run(&sources, Some(8), ResampleMethod::AreaWeighted).unwrap();
    assert!(weighted.records.iter().all(|r| r.value.is_null()), "text values carry no weight");
  }

  #[test]
  fn test_sources_across_antimeridian_stay_local() {
    let sources: Vec<SourceCell> = [(0.5, 179.5), (0.5, -179.5)]
      .iter()
      .map(|&(lat, lon)| SourceCell::new(GeohashCodec.encode(lat, lon, 4).unwrap(), 1.0))
      .collect();
    let prepared: Vec<Source> = sources
      .iter()
      .map(|s| {
        let geometry = cell_geometry(&GeohashCodec, &s.cell).unwrap();
        Source {
          value: s.value.clone(),
          rect: geometry.bounding_rect(),
          geometry,
        }
      })
      .collect();
    let area = union_bbox(&prepared).unwrap();
    assert!(area.crosses_antimeridian(), "{area:?}");
    assert!(!area.contains(0.5, 0.0));

    let out = run(&sources, Some(4), ResampleMethod::AreaWeighted).unwrap();
    assert!(!out.records.is_empty());
    for r in &out.records {
      assert!(r.geometry.polygons().iter().all(|p| p.exterior().coords().all(|c| c.x.abs() > 178.0)), "{}", r.cell);
    }
  }
}
