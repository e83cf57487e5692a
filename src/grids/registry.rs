//! Table of grid backends keyed by [`DggsKind`].

use std::collections::HashMap;
use std::sync::OnceLock;

use log::debug;

use super::gars::GarsCodec;
use super::geohash::GeohashCodec;
use super::georef::GeorefCodec;
use super::h3::H3Codec;
use super::maidenhead::MaidenheadCodec;
use super::mgrs::MgrsCodec;
use super::olc::OlcCodec;
use super::qtm::QtmCodec;
use super::rhealpix::RHealpixCodec;
use super::s2::S2Codec;
use super::tiles::TileCodec;
use super::{DggsCodec, RawRing};
use crate::config::Config;
use crate::types::{BBox, CellId, DggsError, DggsKind, Hierarchy, ResBounds, Result};

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// Grid backends available to the engines and the conversion façade.
#[derive(Default)]
pub struct Registry {
  codecs: HashMap<DggsKind, Box<dyn DggsCodec>>,
}

impl Registry {
  /// Registry without any backend.
  #[must_use]
  pub fn empty() -> Self {
    Self::default()
  }

  /// Registry holding every codec bundled with the crate.
  #[must_use]
  pub fn with_defaults() -> Self {
    let mut r = Self::empty();
    r.register(Box::new(H3Codec));
    r.register(Box::new(S2Codec));
    r.register(Box::new(RHealpixCodec));
    r.register(Box::new(QtmCodec));
    r.register(Box::new(OlcCodec));
    r.register(Box::new(GeohashCodec));
    r.register(Box::new(GeorefCodec));
    r.register(Box::new(MgrsCodec));
    r.register(Box::new(TileCodec::tilecode()));
    r.register(Box::new(TileCodec::quadkey()));
    r.register(Box::new(MaidenheadCodec));
    r.register(Box::new(GarsCodec));
    r
  }

  /// Bundled codecs with the resolution overrides of `config` applied.
  #[must_use]
  pub fn with_config(config: &Config) -> Self {
    let mut r = Self::with_defaults();
    r.apply_config(config);
    r
  }

  /// Process-wide registry of the bundled codecs.
  pub fn global() -> &'static Registry {
    GLOBAL.get_or_init(Registry::with_defaults)
  }

  /// Adds a backend, replacing any previous one of the same kind.
  pub fn register(&mut self, codec: Box<dyn DggsCodec>) {
    let kind = codec.kind();
    if self.codecs.insert(kind, codec).is_some() {
      debug!("replaced backend for {kind}");
    }
  }

  /// Registers the backend produced by `loader`. A failing loader, or one
  /// that yields a codec of another kind, leaves the registry unchanged.
  pub fn register_with<F>(&mut self, kind: DggsKind, loader: F) -> Result<()>
  where
    F: FnOnce() -> Result<Box<dyn DggsCodec>>,
  {
    let codec = loader().map_err(|e| DggsError::Unavailable(format!("{kind}: {e}")))?;
    if codec.kind() != kind {
      return Err(DggsError::Unavailable(format!("{kind}: loader produced a {} backend", codec.kind())));
    }
    self.register(codec);
    Ok(())
  }

  /// Narrows the resolution bounds of every registered grid that has an
  /// override in `config`.
  pub fn apply_config(&mut self, config: &Config) {
    let kinds: Vec<DggsKind> = self.codecs.keys().copied().collect();
    for kind in kinds {
      if !config.dggs.contains_key(kind.name()) {
        continue;
      }
      if let Some(inner) = self.codecs.remove(&kind) {
        let bounds = config.effective_bounds(kind, inner.res_bounds());
        self.codecs.insert(kind, Box::new(Bounded { inner, bounds }));
      }
    }
  }

  pub fn get(&self, kind: DggsKind) -> Result<&dyn DggsCodec> {
    self
      .codecs
      .get(&kind)
      .map(|c| &**c)
      .ok_or_else(|| DggsError::Unavailable(format!("no backend registered for {kind}")))
  }

  /// Looks a backend up by grid name, e.g. `"h3"` or `"dggal_isea9r"`.
  pub fn get_by_name(&self, name: &str) -> Result<&dyn DggsCodec> {
    self.get(name.parse()?)
  }

  #[must_use]
  pub fn contains(&self, kind: DggsKind) -> bool {
    self.codecs.contains_key(&kind)
  }

  /// Registered kinds in [`DggsKind`] order.
  #[must_use]
  pub fn kinds(&self) -> Vec<DggsKind> {
    let mut kinds: Vec<DggsKind> = self.codecs.keys().copied().collect();
    kinds.sort();
    kinds
  }
}

/// Codec with narrowed resolution bounds.
struct Bounded {
  inner: Box<dyn DggsCodec>,
  bounds: ResBounds,
}

impl DggsCodec for Bounded {
  fn kind(&self) -> DggsKind {
    self.inner.kind()
  }

  fn res_bounds(&self) -> ResBounds {
    self.bounds
  }

  fn encode(&self, lat: f64, lon: f64, res: u8) -> Result<CellId> {
    self.validate_resolution(res)?;
    self.inner.encode(lat, lon, res)
  }

  fn decode(&self, cell: &CellId) -> Result<RawRing> {
    self.inner.decode(cell)
  }

  fn resolution(&self, cell: &CellId) -> Result<u8> {
    self.inner.resolution(cell)
  }

  fn parent(&self, cell: &CellId) -> Result<Option<CellId>> {
    self.inner.parent(cell)
  }

  fn children(&self, cell: &CellId, target: u8) -> Result<Vec<CellId>> {
    self.validate_resolution(target)?;
    self.inner.children(cell, target)
  }

  fn neighbors(&self, cell: &CellId) -> Result<Vec<CellId>> {
    self.inner.neighbors(cell)
  }

  fn is_regular(&self) -> bool {
    self.inner.is_regular()
  }

  fn edges(&self, cell: &CellId) -> Result<usize> {
    self.inner.edges(cell)
  }

  fn hierarchy(&self) -> Hierarchy {
    self.inner.hierarchy()
  }

  fn parse(&self, token: &str) -> Result<CellId> {
    self.inner.parse(token)
  }

  fn roots(&self) -> Result<Vec<CellId>> {
    self.inner.roots()
  }

  fn world_threshold(&self) -> u8 {
    self.inner.world_threshold()
  }

  fn cover_bbox(&self, bbox: &BBox, res: u8) -> Result<Option<Vec<CellId>>> {
    self.validate_resolution(res)?;
    self.inner.cover_bbox(bbox, res)
  }

  fn descent_margin(&self) -> f64 {
    self.inner.descent_margin()
  }

  fn cell_count(&self, res: u8) -> f64 {
    self.inner.cell_count(res)
  }

  fn mean_cell_area_m2(&self, res: u8) -> f64 {
    self.inner.mean_cell_area_m2(res)
  }
}
