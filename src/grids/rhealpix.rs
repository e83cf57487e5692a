//! Spherical rHEALPix with `N_side = 3` and both polar squares above and
//! below the first equatorial square.
//!
//! The HEALPix projection maps the sphere onto a staircase of polar
//! triangles around an equatorial band; rHEALPix rotates the polar triangles
//! into two squares so the plane holds six equal squares: `N`, `O`, `P`, `Q`,
//! `R`, `S`. Each square is split 3x3 per resolution and cells are addressed
//! by region letter and one row-major digit per level, counted from the
//! upper-left child.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use geo_types::Coord;

use super::{arc_steps, check_encode, descend_to, expect_kind, DggsCodec, RawRing};
use crate::math::Vec3d;
use crate::types::{CellId, CellToken, DggsError, DggsKind, Result};

const REGIONS: [char; 6] = ['N', 'O', 'P', 'Q', 'R', 'S'];
const MAX_RES: u8 = 15;
const SIDE: f64 = FRAC_PI_2;

/// `asin(2/3)`, the latitude where the polar caps begin.
fn cap_lat() -> f64 {
  (2.0f64 / 3.0).asin()
}

fn rotate_ccw(d: (f64, f64), quarter_turns: u8) -> (f64, f64) {
  (0..quarter_turns % 4).fold(d, |(x, y), _| (-y, x))
}

fn rotate_cw(d: (f64, f64), quarter_turns: u8) -> (f64, f64) {
  (0..quarter_turns % 4).fold(d, |(x, y), _| (y, -x))
}

/// Polar triangle column of a longitude in radians.
fn column(lam: f64) -> u8 {
  ((lam + PI) / FRAC_PI_2).floor().clamp(0.0, 3.0) as u8
}

fn column_center(c: u8) -> f64 {
  -3.0 * FRAC_PI_4 + f64::from(c) * FRAC_PI_2
}

/// Centres of the two polar squares.
const NORTH_CENTER: (f64, f64) = (-3.0 * FRAC_PI_4, FRAC_PI_2);
const SOUTH_CENTER: (f64, f64) = (-3.0 * FRAC_PI_4, -FRAC_PI_2);

/// rHEALPix plane coordinates of a point in radians.
fn project(lam: f64, phi: f64) -> (f64, f64) {
  if phi.abs() <= cap_lat() {
    return (lam, 3.0 * PI / 8.0 * phi.sin());
  }
  let sigma = (3.0 * (1.0 - phi.sin().abs())).sqrt();
  let c = column(lam);
  let lam_c = column_center(c);
  let x = lam_c + (lam - lam_c) * sigma;
  let y = phi.signum() * FRAC_PI_4 * (2.0 - sigma);
  // move the triangle's apex onto the square centre, then turn it into place
  let (center, d) = if phi > 0.0 {
    (NORTH_CENTER, rotate_ccw((x - lam_c, y - NORTH_CENTER.1), c))
  } else {
    (SOUTH_CENTER, rotate_cw((x - lam_c, y - SOUTH_CENTER.1), c))
  };
  (center.0 + d.0, center.1 + d.1)
}

/// Inverse of [`project`], `(lam, phi)` in radians.
fn unproject(x: f64, y: f64) -> (f64, f64) {
  if y.abs() <= FRAC_PI_4 {
    return (x, (8.0 * y / (3.0 * PI)).clamp(-1.0, 1.0).asin());
  }
  let north = y > 0.0;
  let center = if north { NORTH_CENTER } else { SOUTH_CENTER };
  let (dx, dy) = (x - center.0, y - center.1);
  // side of the square the point's triangle rests on
  let c = if north {
    if dy <= -dx.abs() {
      0
    } else if dx >= dy.abs() {
      1
    } else if dy >= dx.abs() {
      2
    } else {
      3
    }
  } else if dy >= dx.abs() {
    0
  } else if dx >= dy.abs() {
    1
  } else if dy <= -dx.abs() {
    2
  } else {
    3
  };
  let (tx, ty) = if north {
    rotate_cw((dx, dy), c)
  } else {
    rotate_ccw((dx, dy), c)
  };
  let lam_c = column_center(c);
  let (hx, hy) = (lam_c + tx, center.1 + ty);
  let sigma = (2.0 - 4.0 * hy.abs() / PI).max(0.0);
  let phi = hy.signum() * (1.0 - sigma * sigma / 3.0).clamp(-1.0, 1.0).asin();
  let lam = if sigma > 1e-12 {
    lam_c + (hx - lam_c) / sigma
  } else {
    lam_c
  };
  (lam, phi)
}

/// Upper-left corner of a region square in the plane.
fn region_origin(region: usize) -> (f64, f64) {
  match region {
    0 => (-PI, 3.0 * FRAC_PI_4),
    5 => (-PI, -FRAC_PI_4),
    r => (-PI + (r - 1) as f64 * SIDE, FRAC_PI_4),
  }
}

/// Cell as region index and row/column at its resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cell {
  region: usize,
  res: u8,
  row: u64,
  col: u64,
}

impl Cell {
  fn locate(lat: f64, lon: f64, res: u8) -> Cell {
    let (x, y) = project(lon.to_radians(), lat.to_radians());
    let region = if y > FRAC_PI_4 {
      0
    } else if y < -FRAC_PI_4 {
      5
    } else {
      1 + column(x) as usize
    };
    let (x0, y0) = region_origin(region);
    let n = 3u64.pow(u32::from(res));
    let idx = |t: f64| ((t / SIDE * n as f64).floor().max(0.0) as u64).min(n - 1);
    Cell {
      region,
      res,
      row: idx(y0 - y),
      col: idx(x - x0),
    }
  }

  fn from_path(region: char, digits: &[u8]) -> Option<Cell> {
    let region = REGIONS.iter().position(|r| *r == region)?;
    if digits.len() > MAX_RES as usize || digits.iter().any(|d| *d > 8) {
      return None;
    }
    let (mut row, mut col) = (0u64, 0u64);
    for d in digits {
      row = row * 3 + u64::from(d / 3);
      col = col * 3 + u64::from(d % 3);
    }
    Some(Cell {
      region,
      res: digits.len() as u8,
      row,
      col,
    })
  }

  fn digits(&self) -> Vec<u8> {
    (0..self.res)
      .map(|k| {
        let p = 3u64.pow(u32::from(self.res - 1 - k));
        ((self.row / p % 3) * 3 + self.col / p % 3) as u8
      })
      .collect()
  }

  fn is_polar(&self) -> bool {
    self.region == 0 || self.region == 5
  }

  fn size(&self) -> f64 {
    SIDE / 3f64.powi(i32::from(self.res))
  }

  /// `(x_left, y_top)` in the plane.
  fn corner(&self) -> (f64, f64) {
    let (x0, y0) = region_origin(self.region);
    let s = self.size();
    (x0 + self.col as f64 * s, y0 - self.row as f64 * s)
  }

  fn point(x: f64, y: f64) -> Vec3d {
    let (lam, phi) = unproject(x, y);
    Vec3d::from_lat_lng_rads(phi, lam)
  }

  fn center(&self) -> (f64, f64) {
    let (x, y) = self.corner();
    let h = self.size() / 2.0;
    let (lam, phi) = unproject(x + h, y - h);
    (phi.to_degrees(), lam.to_degrees())
  }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RHealpixCodec;

impl RHealpixCodec {
  fn cell(cell: &CellId) -> Result<Cell> {
    expect_kind(cell, DggsKind::RHealpix)?;
    match &cell.token {
      CellToken::Path { region, digits } => Cell::from_path(*region, digits),
      _ => None,
    }
    .ok_or_else(|| cell.invalid())
  }

  fn id(c: &Cell) -> CellId {
    CellId::path(DggsKind::RHealpix, REGIONS[c.region], c.digits())
  }

  /// Cell centre as `(lat, lon)` in degrees.
  pub fn center(&self, cell: &CellId) -> Result<(f64, f64)> {
    Self::cell(cell).map(|c| c.center())
  }
}

impl DggsCodec for RHealpixCodec {
  fn kind(&self) -> DggsKind {
    DggsKind::RHealpix
  }

  fn encode(&self, lat: f64, lon: f64, res: u8) -> Result<CellId> {
    check_encode(self, lat, lon, res)?;
    Ok(Self::id(&Cell::locate(lat, lon, res)))
  }

  /// Equatorial cells are lat/lon rectangles; polar cells are curved and
  /// get extra vertices along each side.
  fn decode(&self, cell: &CellId) -> Result<RawRing> {
    let c = Self::cell(cell)?;
    let (xl, yt) = c.corner();
    let s = c.size();
    let corners = [(xl, yt - s), (xl + s, yt - s), (xl + s, yt), (xl, yt)];
    // equatorial edges are parallels and meridians; polar ones curve
    let steps = if c.is_polar() { arc_steps(s) } else { 1 };
    let mut ring = Vec::with_capacity(4 * steps as usize);
    for k in 0..4 {
      let (ax, ay) = corners[k];
      let (bx, by) = corners[(k + 1) % 4];
      for step in 0..steps {
        let f = f64::from(step) / f64::from(steps);
        let (lam, phi) = unproject(ax + (bx - ax) * f, ay + (by - ay) * f);
        ring.push(Coord {
          x: lam.to_degrees(),
          y: phi.to_degrees(),
        });
      }
    }
    Ok(ring)
  }

  fn resolution(&self, cell: &CellId) -> Result<u8> {
    Self::cell(cell).map(|c| c.res)
  }

  fn parent(&self, cell: &CellId) -> Result<Option<CellId>> {
    let c = Self::cell(cell)?;
    Ok((c.res > 0).then(|| {
      Self::id(&Cell {
        region: c.region,
        res: c.res - 1,
        row: c.row / 3,
        col: c.col / 3,
      })
    }))
  }

  fn children(&self, cell: &CellId, target: u8) -> Result<Vec<CellId>> {
    descend_to(self, cell, target, |id| {
      let c = Self::cell(id)?;
      if c.res >= MAX_RES {
        return Ok(Vec::new());
      }
      let mut out = Vec::with_capacity(9);
      for d in 0..9u64 {
        out.push(Self::id(&Cell {
          region: c.region,
          res: c.res + 1,
          row: c.row * 3 + d / 3,
          col: c.col * 3 + d % 3,
        }));
      }
      Ok(out)
    })
  }

  /// Edge neighbours, found by stepping a quarter cell over the midpoint of
  /// each side on the sphere so region seams need no special casing.
  fn neighbors(&self, cell: &CellId) -> Result<Vec<CellId>> {
    let c = Self::cell(cell)?;
    let (xl, yt) = c.corner();
    let s = c.size();
    let (cx, cy) = (xl + s / 2.0, yt - s / 2.0);
    let mut out: Vec<CellId> = Vec::with_capacity(4);
    for (dx, dy) in [(0.0, -1.0), (1.0, 0.0), (0.0, 1.0), (-1.0, 0.0)] {
      let mid = Cell::point(cx + dx * s / 2.0, cy + dy * s / 2.0);
      let inner = Cell::point(cx + dx * s / 4.0, cy + dy * s / 4.0);
      let (lat, lon) = (mid + (mid - inner)).normalized().to_degrees();
      let n = Self::id(&Cell::locate(lat, lon, c.res));
      if n != *cell && !out.contains(&n) {
        out.push(n);
      }
    }
    Ok(out)
  }

  fn edges(&self, cell: &CellId) -> Result<usize> {
    Self::cell(cell).map(|_| 4)
  }

  /// Region letter (any case) followed by digits 0..8.
  fn parse(&self, token: &str) -> Result<CellId> {
    let t: String = token.chars().filter(|c| !c.is_whitespace()).collect();
    let mut chars = t.chars();
    let parsed = chars.next().and_then(|region| {
      let digits: Option<Vec<u8>> = chars.map(|ch| ch.to_digit(10).map(|d| d as u8)).collect();
      Cell::from_path(region.to_ascii_uppercase(), &digits?)
    });
    parsed.map(|c| Self::id(&c)).ok_or_else(|| DggsError::InvalidCellToken {
      kind: DggsKind::RHealpix,
      token: token.to_string(),
    })
  }

  fn roots(&self) -> Result<Vec<CellId>> {
    Ok(REGIONS.iter().map(|r| CellId::path(DggsKind::RHealpix, *r, Vec::new())).collect())
  }

  fn cell_count(&self, res: u8) -> f64 {
    6.0 * 9f64.powi(i32::from(res))
  }
}
