use std::collections::{BTreeMap, HashMap, HashSet};

use log::{debug, warn};

use crate::generation::generate_ids;
use crate::geometry::{cell_geometry, overlap_area_m2};
use crate::grids::DggsCodec;
use crate::progress::{CancellationToken, NoProgress, ProgressSink, ProgressTracker};
use crate::types::{AttributeValue, Attributes, CellId, DggsError, Hierarchy, Result};

/// Share of a candidate cell that must lie inside the input for an
/// advisory expansion to keep it. Keeps slivers along shared edges out.
const MIN_OVERLAP_SHARE: f64 = 0.01;

/// Cells read from an attribute column and compacted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerCompaction {
  pub cells: Vec<CellId>,
  /// Features without a valid id.
  pub skipped: usize,
}

fn require_strict(codec: &dyn DggsCodec) -> Result<()> {
  if codec.hierarchy() == Hierarchy::Strict {
    Ok(())
  } else {
    Err(DggsError::CompactionUnsupported(codec.kind()))
  }
}

/// Smallest set of cells covering the same area as `cells`.
///
/// Cells may be of mixed resolutions. Working from the finest resolution up,
/// every complete set of siblings is replaced by its parent until no set is
/// complete. Duplicates and cells already covered by a coarser input cell
/// collapse. The result is sorted.
pub fn compact(
  codec: &dyn DggsCodec,
  cells: &[CellId],
  sink: &dyn ProgressSink,
  cancel: &CancellationToken,
) -> Result<Vec<CellId>> {
  require_strict(codec)?;
  let mut by_res: BTreeMap<u8, HashSet<CellId>> = BTreeMap::new();
  for cell in cells {
    by_res.entry(codec.resolution(cell)?).or_default().insert(cell.clone());
  }
  let Some((&finest, _)) = by_res.last_key_value() else {
    return Ok(Vec::new());
  };
  let levels = usize::from(finest) + 1;
  let mut tracker = ProgressTracker::new(sink);
  let mut out: HashSet<CellId> = HashSet::new();

  for res in (0..=finest).rev() {
    cancel.check()?;
    let Some(level) = by_res.remove(&res) else {
      continue;
    };
    // Group by parent
    let mut groups: HashMap<CellId, Vec<CellId>> = HashMap::new();
    for cell in level {
      match codec.parent(&cell)? {
        Some(parent) => groups.entry(parent).or_default().push(cell),
        None => {
          out.insert(cell);
        }
      }
    }
    for (parent, kids) in groups {
      cancel.check()?;
      let complete = kids.len() > 1 && kids.len() == codec.children(&parent, res)?.len();
      if complete {
        by_res.entry(res - 1).or_default().insert(parent);
      } else {
        out.extend(kids);
      }
    }
    tracker.report_ratio(levels - usize::from(res), levels);
  }

  let mut compacted: Vec<CellId> = Vec::with_capacity(out.len());
  for cell in &out {
    if !covered_by_ancestor(codec, cell, &out)? {
      compacted.push(cell.clone());
    }
  }
  compacted.sort();
  tracker.finish();
  debug!("compacted {} {} cells into {}", cells.len(), codec.kind(), compacted.len());
  Ok(compacted)
}

fn covered_by_ancestor(codec: &dyn DggsCodec, cell: &CellId, set: &HashSet<CellId>) -> Result<bool> {
  let mut current = codec.parent(cell)?;
  while let Some(p) = current {
    if set.contains(&p) {
      return Ok(true);
    }
    current = codec.parent(&p)?;
  }
  Ok(false)
}

/// Reads cell ids from the `id_field` attribute of each feature and compacts
/// them. Features with a missing or malformed id are counted and skipped.
pub fn compact_layer(
  codec: &dyn DggsCodec,
  features: &[Attributes],
  id_field: &str,
  sink: &dyn ProgressSink,
  cancel: &CancellationToken,
) -> Result<LayerCompaction> {
  require_strict(codec)?;
  let mut cells = Vec::with_capacity(features.len());
  let mut skipped = 0;
  for (i, feature) in features.iter().enumerate() {
    cancel.check()?;
    let parsed = match feature.get(id_field) {
      None | Some(AttributeValue::Null) => None,
      Some(v) => codec.parse(&v.to_string()).ok(),
    };
    match parsed {
      Some(cell) => cells.push(cell),
      None => {
        debug!("feature {i} has no valid {} id in {id_field:?}", codec.kind());
        skipped += 1;
      }
    }
  }
  if skipped > 0 {
    warn!("{skipped} of {} features skipped", features.len());
  }
  Ok(LayerCompaction {
    cells: compact(codec, &cells, sink, cancel)?,
    skipped,
  })
}

/// Cells at `target` covering `cells`, sorted.
///
/// Strictly hierarchical grids expand through their children. Other grids
/// regenerate the cells at `target` overlapping each input cell.
pub fn expand(
  codec: &dyn DggsCodec,
  cells: &[CellId],
  target: u8,
  sink: &dyn ProgressSink,
  cancel: &CancellationToken,
) -> Result<Vec<CellId>> {
  codec.validate_resolution(target)?;
  for cell in cells {
    let input = codec.resolution(cell)?;
    if input > target {
      return Err(DggsError::TargetBelowInput { target, input });
    }
  }
  let mut tracker = ProgressTracker::new(sink);
  let mut out: Vec<CellId> = Vec::new();
  let strict = codec.hierarchy() == Hierarchy::Strict;
  for (i, cell) in cells.iter().enumerate() {
    cancel.check()?;
    if strict {
      out.extend(codec.children(cell, target)?);
    } else {
      out.extend(overlapping(codec, cell, target, cancel)?);
    }
    tracker.report_ratio(i + 1, cells.len());
  }
  out.sort();
  out.dedup();
  tracker.finish();
  debug!("expanded {} {} cells into {} at resolution {target}", cells.len(), codec.kind(), out.len());
  Ok(out)
}

/// Cells at `target` sharing area with `cell`.
fn overlapping(codec: &dyn DggsCodec, cell: &CellId, target: u8, cancel: &CancellationToken) -> Result<Vec<CellId>> {
  let shape = cell_geometry(codec, cell)?;
  let Some(bbox) = shape.bbox() else {
    return Ok(Vec::new());
  };
  let mut kept = Vec::new();
  for candidate in generate_ids(codec, target, Some(&bbox), &NoProgress, cancel)? {
    let g = cell_geometry(codec, &candidate)?;
    let own: f64 = g.polygons().iter().map(|p| geo::GeodesicArea::geodesic_area_unsigned(*p)).sum();
    if own > 0.0 && overlap_area_m2(&shape, &g) >= own * MIN_OVERLAP_SHARE {
      kept.push(candidate);
    }
  }
  Ok(kept)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::grids::geohash::GeohashCodec;
  use crate::grids::h3::H3Codec;
  use crate::grids::mgrs::MgrsCodec;
  use crate::grids::s2::S2Codec;

  fn run_compact(codec: &dyn DggsCodec, cells: &[CellId]) -> Result<Vec<CellId>> {
    compact(codec, cells, &NoProgress, &CancellationToken::new())
  }

  fn run_expand(codec: &dyn DggsCodec, cells: &[CellId], target: u8) -> Result<Vec<CellId>> {
    expand(codec, cells, target, &NoProgress, &CancellationToken::new())
  }

  #[test]
  fn test_compact_full_children_to_parent() {
    let parent = H3Codec.parse("85283473fffffff").unwrap();
    let children = H3Codec.children(&parent, 6).unwrap();
    assert_eq!(children.len(), 7);
    assert_eq!(run_compact(&H3Codec, &children).unwrap(), vec![parent.clone()]);

    let grandchildren = H3Codec.children(&parent, 7).unwrap();
    assert_eq!(run_compact(&H3Codec, &grandchildren).unwrap(), vec![parent]);
  }

  #[test]
  fn test_compact_pentagon_children() {
    let pentagon = H3Codec.roots().unwrap().remove(4);
    let children = H3Codec.children(&pentagon, 1).unwrap();
    assert_eq!(children.len(), 6);
    assert_eq!(run_compact(&H3Codec, &children).unwrap(), vec![pentagon]);
  }

  #[test]
  fn test_compact_partial_and_duplicates() {
    let parent = GeohashCodec.parse("u4p").unwrap();
    let mut cells = GeohashCodec.children(&parent, 4).unwrap();
    let dropped = cells.pop().unwrap();
    let first = cells[0].clone();
    cells.push(first.clone());
    let out = run_compact(&GeohashCodec, &cells).unwrap();
    assert_eq!(out.len(), 31);
    assert!(!out.contains(&dropped));
    assert!(out.windows(2).all(|w| w[0] < w[1]), "sorted without duplicates");
  }

  #[test]
  fn test_compact_mixed_resolutions() {
    let parent = S2Codec.parse("89c25").unwrap();
    let children = S2Codec.children(&parent, S2Codec.resolution(&parent).unwrap() + 1).unwrap();
    let mut cells = vec![children[0].clone(), children[1].clone(), children[2].clone()];
    cells.extend(S2Codec.children(&children[3], S2Codec.resolution(&children[3]).unwrap() + 1).unwrap());
    assert_eq!(run_compact(&S2Codec, &cells).unwrap(), vec![parent.clone()]);

    let covered = S2Codec.children(&children[0], S2Codec.resolution(&children[0]).unwrap() + 2).unwrap();
    let mut cells = vec![children[0].clone()];
    cells.extend(covered);
    assert_eq!(run_compact(&S2Codec, &cells).unwrap(), vec![children[0].clone()]);
  }

  #[test]
  fn test_compact_requires_strict_hierarchy() {
    let cell = MgrsCodec.encode(48.85, 2.35, 1).unwrap();
    assert_eq!(
      run_compact(&MgrsCodec, &[cell]),
      Err(DggsError::CompactionUnsupported(crate::types::DggsKind::Mgrs))
    );
  }

  #[test]
  fn test_compact_then_expand_restores() {
    let parent = H3Codec.parse("85283473fffffff").unwrap();
    let mut cells = H3Codec.children(&parent, 7).unwrap();
    cells.truncate(30);
    cells.sort();
    let compacted = run_compact(&H3Codec, &cells).unwrap();
    assert!(compacted.len() < cells.len());
    assert_eq!(run_expand(&H3Codec, &compacted, 7).unwrap(), cells);
  }

  #[test]
  fn test_expand_rejects_coarser_target() {
    let cell = H3Codec.encode(0.0, 0.0, 6).unwrap();
    assert_eq!(
      run_expand(&H3Codec, &[cell], 5),
      Err(DggsError::TargetBelowInput { target: 5, input: 6 })
    );
  }

  #[test]
  fn test_expand_advisory_regenerates() {
    let cell = MgrsCodec.encode(48.85, 2.35, 0).unwrap();
    assert_eq!(cell.to_string(), "31UDQ");
    let out = run_expand(&MgrsCodec, &[cell], 1).unwrap();
    assert!(out.iter().all(|c| c.to_string().starts_with("31UDQ")), "{out:?}");
    for (lat, lon) in [(48.85, 2.35), (48.9, 2.2)] {
      let inner = MgrsCodec.encode(lat, lon, 1).unwrap();
      assert!(out.contains(&inner), "{inner} missing");
    }
  }

  #[test]
  fn test_compact_layer_skips_bad_ids() {
    let parent = GeohashCodec.parse("u4p").unwrap();
    let mut layer: Vec<Attributes> = GeohashCodec
      .children(&parent, 4)
      .unwrap()
      .into_iter()
      .map(|c| Attributes::from([("geohash".to_string(), AttributeValue::from(c.to_string().to_uppercase()))]))
      .collect();
    layer.push(Attributes::from([("geohash".to_string(), AttributeValue::from("not a hash"))]));
    layer.push(Attributes::new());
    let out = compact_layer(&GeohashCodec, &layer, "geohash", &NoProgress, &CancellationToken::new()).unwrap();
    assert_eq!(out.cells, vec![parent]);
    assert_eq!(out.skipped, 2);
  }
}
