// src/grids/h3/index.rs

use super::base_cells::{
  base_cell_home, base_cell_is_cw_offset, face_ijk_to_base_cell, is_base_cell_pentagon, MAX_FACE_COORD,
};
use super::face_ijk::{is_class_iii, FaceIJK, Overage};
use super::ijk::{CoordIJK, Direction};
use crate::constants::{
  H3_BC_MASK, H3_BC_OFFSET, H3_CELL_MODE, H3_DIGIT_MASK, H3_HIGH_BIT_MASK, H3_INIT, H3_MODE_MASK, H3_MODE_OFFSET,
  H3_PER_DIGIT_OFFSET, H3_RESERVED_MASK, H3_RES_MASK, H3_RES_OFFSET, MAX_H3_RES, NUM_BASE_CELLS,
};
use crate::latlng::LatLng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 64-bit H3 cell index.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct H3Index(pub u64);

impl H3Index {
  #[inline]
  #[must_use]
  pub fn mode(self) -> u64 {
    (self.0 & H3_MODE_MASK) >> H3_MODE_OFFSET
  }

  #[inline]
  fn set_mode(&mut self, mode: u64) {
    self.0 = (self.0 & !H3_MODE_MASK) | (mode << H3_MODE_OFFSET);
  }

  #[inline]
  #[must_use]
  pub fn resolution(self) -> u8 {
    ((self.0 & H3_RES_MASK) >> H3_RES_OFFSET) as u8
  }

  #[inline]
  pub(crate) fn set_resolution(&mut self, res: u8) {
    self.0 = (self.0 & !H3_RES_MASK) | (u64::from(res) << H3_RES_OFFSET);
  }

  #[inline]
  #[must_use]
  pub fn base_cell(self) -> u8 {
    ((self.0 & H3_BC_MASK) >> H3_BC_OFFSET) as u8
  }

  #[inline]
  pub(crate) fn set_base_cell(&mut self, bc: u8) {
    self.0 = (self.0 & !H3_BC_MASK) | (u64::from(bc) << H3_BC_OFFSET);
  }

  #[inline]
  fn digit_shift(r: u8) -> u64 {
    u64::from(MAX_H3_RES - r) * u64::from(H3_PER_DIGIT_OFFSET)
  }

  /// Digit at resolution `r` (1-based).
  #[inline]
  #[must_use]
  pub fn digit(self, r: u8) -> Direction {
    Direction::from_bits((self.0 >> Self::digit_shift(r)) & H3_DIGIT_MASK)
  }

  #[inline]
  pub(crate) fn set_digit(&mut self, r: u8, digit: Direction) {
    let shift = Self::digit_shift(r);
    self.0 = (self.0 & !(H3_DIGIT_MASK << shift)) | ((digit as u64) << shift);
  }

  /// Cell index of a base cell.
  #[must_use]
  pub fn from_base_cell(bc: u8) -> H3Index {
    let mut h = H3Index(H3_INIT);
    h.set_mode(H3_CELL_MODE);
    h.set_base_cell(bc);
    h
  }

  /// First non-center digit, `Center` if all digits are zero.
  #[must_use]
  pub fn leading_non_zero_digit(self) -> Direction {
    (1..=self.resolution())
      .map(|r| self.digit(r))
      .find(|d| *d != Direction::Center)
      .unwrap_or(Direction::Center)
  }

  #[must_use]
  pub fn is_pentagon(self) -> bool {
    is_base_cell_pentagon(self.base_cell()) && self.leading_non_zero_digit() == Direction::Center
  }

  #[must_use]
  pub fn is_valid(self) -> bool {
    if self.0 & H3_HIGH_BIT_MASK != 0 || self.mode() != H3_CELL_MODE || self.0 & H3_RESERVED_MASK != 0 {
      return false;
    }
    let bc = self.base_cell();
    let res = self.resolution();
    if bc as usize >= NUM_BASE_CELLS || res > MAX_H3_RES {
      return false;
    }
    let mut found_first = false;
    for r in 1..=res {
      let digit = self.digit(r);
      if !found_first && digit != Direction::Center {
        found_first = true;
        if is_base_cell_pentagon(bc) && digit == Direction::KAxes {
          return false;
        }
      }
      if digit == Direction::InvalidDigit {
        return false;
      }
    }
    ((res + 1)..=MAX_H3_RES).all(|r| self.digit(r) == Direction::InvalidDigit)
  }

  #[must_use]
  pub(crate) fn rotate60_ccw(mut self) -> H3Index {
    for r in 1..=self.resolution() {
      let d = self.digit(r);
      self.set_digit(r, d.rotate60_ccw());
    }
    self
  }

  #[must_use]
  pub(crate) fn rotate60_cw(mut self) -> H3Index {
    for r in 1..=self.resolution() {
      let d = self.digit(r);
      self.set_digit(r, d.rotate60_cw());
    }
    self
  }

  /// Rotates a pentagon index, stepping over the deleted k sub-sequence.
  #[must_use]
  pub(crate) fn rotate_pent60_ccw(mut self) -> H3Index {
    let mut found_first = false;
    for r in 1..=self.resolution() {
      let d = self.digit(r);
      self.set_digit(r, d.rotate60_ccw());
      if !found_first && self.digit(r) != Direction::Center {
        found_first = true;
        if self.leading_non_zero_digit() == Direction::KAxes {
          self = self.rotate60_ccw();
        }
      }
    }
    self
  }

  /// Index of the cell with the given face coordinates, `None` when they do
  /// not resolve to a base cell.
  #[must_use]
  pub fn from_face_ijk(fijk: &FaceIJK, res: u8) -> Option<H3Index> {
    let mut h = H3Index(H3_INIT);
    h.set_mode(H3_CELL_MODE);
    h.set_resolution(res);

    if res == 0 {
      let (bc, _) = face_ijk_to_base_cell(fijk)?;
      h.set_base_cell(bc);
      return Some(h);
    }

    let mut fijk_bc = *fijk;
    for r in (0..res).rev() {
      let last = fijk_bc.coord;
      let mut last_center;
      if is_class_iii(r + 1) {
        fijk_bc.coord.up_ap7();
        last_center = fijk_bc.coord;
        last_center.down_ap7();
      } else {
        fijk_bc.coord.up_ap7r();
        last_center = fijk_bc.coord;
        last_center.down_ap7r();
      }
      let mut diff = last.sub(&last_center);
      diff.normalize();
      h.set_digit(r + 1, diff.to_digit());
    }

    let c = fijk_bc.coord;
    if c.i > MAX_FACE_COORD || c.j > MAX_FACE_COORD || c.k > MAX_FACE_COORD {
      return None;
    }
    let (bc, num_rots) = face_ijk_to_base_cell(&fijk_bc)?;
    h.set_base_cell(bc);

    if is_base_cell_pentagon(bc) {
      if h.leading_non_zero_digit() == Direction::KAxes {
        h = if base_cell_is_cw_offset(bc, fijk_bc.face) {
          h.rotate60_cw()
        } else {
          h.rotate60_ccw()
        };
      }
      for _ in 0..num_rots {
        h = h.rotate_pent60_ccw();
      }
    } else {
      for _ in 0..num_rots {
        h = h.rotate60_ccw();
      }
    }
    Some(h)
  }

  /// Cell containing a point given in radians.
  #[must_use]
  pub fn from_geo(g: &LatLng, res: u8) -> Option<H3Index> {
    H3Index::from_face_ijk(&FaceIJK::from_geo(g, res), res)
  }

  /// Face coordinates of the cell, on the face that contains its center.
  #[must_use]
  pub fn to_face_ijk(self) -> FaceIJK {
    let bc = self.base_cell();
    let mut h = self;
    // all of sub-sequence 5 needs adjusting, some of 4 below
    if is_base_cell_pentagon(bc) && h.leading_non_zero_digit() == Direction::IkAxes {
      h = h.rotate60_cw();
    }

    let mut fijk = base_cell_home(bc);
    let home_is_center = fijk.coord == CoordIJK::default();
    let res = h.resolution();
    let possible_overage = is_base_cell_pentagon(bc) || !(res == 0 || home_is_center);

    for r in 1..=res {
      if is_class_iii(r) {
        fijk.coord.down_ap7();
      } else {
        fijk.coord.down_ap7r();
      }
      fijk.coord.neighbor(h.digit(r));
    }

    if !possible_overage {
      return fijk;
    }

    let orig = fijk.coord;
    let mut adj_res = res;
    if is_class_iii(res) {
      fijk.coord.down_ap7r();
      adj_res += 1;
    }

    let pent_leading4 = is_base_cell_pentagon(bc) && h.leading_non_zero_digit() == Direction::IAxes;
    if fijk.adjust_overage_class_ii(adj_res, pent_leading4, false) == Overage::NoOverage {
      if adj_res != res {
        fijk.coord = orig;
      }
    } else {
      if is_base_cell_pentagon(bc) {
        while fijk.adjust_overage_class_ii(adj_res, false, false) != Overage::NoOverage {}
      }
      if adj_res != res {
        fijk.coord.up_ap7r();
      }
    }
    fijk
  }

  /// Center point in radians.
  #[must_use]
  pub fn center(self) -> LatLng {
    self.to_face_ijk().to_geo(self.resolution())
  }

  /// Boundary vertices in radians, counter-clockwise.
  #[must_use]
  pub fn boundary(self) -> Vec<LatLng> {
    let fijk = self.to_face_ijk();
    if self.is_pentagon() {
      fijk.pent_boundary(self.resolution())
    } else {
      fijk.hex_boundary(self.resolution())
    }
  }

  /// Ancestor at a coarser resolution, `None` for finer or equal targets
  /// outside the valid range.
  #[must_use]
  pub fn parent(self, res: u8) -> Option<H3Index> {
    let own = self.resolution();
    if res > own {
      return None;
    }
    let mut p = self;
    p.set_resolution(res);
    for r in (res + 1)..=own {
      p.set_digit(r, Direction::InvalidDigit);
    }
    Some(p)
  }

  /// Direct children in digit order; the k child of a pentagon is skipped.
  #[must_use]
  pub fn direct_children(self) -> Vec<H3Index> {
    let res = self.resolution();
    if res >= MAX_H3_RES {
      return Vec::new();
    }
    let pentagon = self.is_pentagon();
    (0..7u64)
      .filter(|d| !(pentagon && *d == Direction::KAxes as u64))
      .map(|d| {
        let mut c = self;
        c.set_resolution(res + 1);
        c.set_digit(res + 1, Direction::from_bits(d));
        c
      })
      .collect()
  }
}
