// src/grids/h3/neighbors.rs

use super::base_cells::{
  base_cell_home, base_cell_is_cw_offset, base_cell_neighbor, is_base_cell_pentagon, is_base_cell_polar_pentagon,
  BASE_CELL_NEIGHBOR_60CCW_ROTS, INVALID_BASE_CELL,
};
use super::face_ijk::is_class_iii;
use super::ijk::Direction as D;
use super::index::H3Index;

// Digit written at the current resolution and the carry direction for the
// parent resolution, indexed by [old digit][direction of travel].

#[rustfmt::skip]
const NEW_DIGIT_II: [[D; 7]; 7] = [
  [D::Center, D::KAxes, D::JAxes, D::JkAxes, D::IAxes, D::IkAxes, D::IjAxes],
  [D::KAxes, D::IAxes, D::JkAxes, D::IjAxes, D::IkAxes, D::JAxes, D::Center],
  [D::JAxes, D::JkAxes, D::KAxes, D::IAxes, D::IjAxes, D::Center, D::IkAxes],
  [D::JkAxes, D::IjAxes, D::IAxes, D::IkAxes, D::Center, D::KAxes, D::JAxes],
  [D::IAxes, D::IkAxes, D::IjAxes, D::Center, D::JAxes, D::JkAxes, D::KAxes],
  [D::IkAxes, D::JAxes, D::Center, D::KAxes, D::JkAxes, D::IjAxes, D::IAxes],
  [D::IjAxes, D::Center, D::IkAxes, D::JAxes, D::KAxes, D::IAxes, D::JkAxes],
];

#[rustfmt::skip]
const NEW_ADJUSTMENT_II: [[D; 7]; 7] = [
  [D::Center, D::Center, D::Center, D::Center, D::Center, D::Center, D::Center],
  [D::Center, D::KAxes, D::Center, D::KAxes, D::Center, D::IkAxes, D::Center],
  [D::Center, D::Center, D::JAxes, D::JkAxes, D::Center, D::Center, D::JAxes],
  [D::Center, D::KAxes, D::JkAxes, D::JkAxes, D::Center, D::Center, D::Center],
  [D::Center, D::Center, D::Center, D::Center, D::IAxes, D::IAxes, D::IjAxes],
  [D::Center, D::IkAxes, D::Center, D::Center, D::IAxes, D::IkAxes, D::Center],
  [D::Center, D::Center, D::JAxes, D::Center, D::IjAxes, D::Center, D::IjAxes],
];

#[rustfmt::skip]
const NEW_DIGIT_III: [[D; 7]; 7] = [
  [D::Center, D::KAxes, D::JAxes, D::JkAxes, D::IAxes, D::IkAxes, D::IjAxes],
  [D::KAxes, D::JAxes, D::JkAxes, D::IAxes, D::IkAxes, D::IjAxes, D::Center],
  [D::JAxes, D::JkAxes, D::IAxes, D::IkAxes, D::IjAxes, D::Center, D::KAxes],
  [D::JkAxes, D::IAxes, D::IkAxes, D::IjAxes, D::Center, D::KAxes, D::JAxes],
  [D::IAxes, D::IkAxes, D::IjAxes, D::Center, D::KAxes, D::JAxes, D::JkAxes],
  [D::IkAxes, D::IjAxes, D::Center, D::KAxes, D::JAxes, D::JkAxes, D::IAxes],
  [D::IjAxes, D::Center, D::KAxes, D::JAxes, D::JkAxes, D::IAxes, D::IkAxes],
];

#[rustfmt::skip]
const NEW_ADJUSTMENT_III: [[D; 7]; 7] = [
  [D::Center, D::Center, D::Center, D::Center, D::Center, D::Center, D::Center],
  [D::Center, D::KAxes, D::Center, D::JkAxes, D::Center, D::KAxes, D::Center],
  [D::Center, D::Center, D::JAxes, D::JAxes, D::Center, D::Center, D::IjAxes],
  [D::Center, D::JkAxes, D::JAxes, D::JkAxes, D::Center, D::Center, D::Center],
  [D::Center, D::Center, D::Center, D::Center, D::IAxes, D::IkAxes, D::IAxes],
  [D::Center, D::KAxes, D::Center, D::Center, D::IkAxes, D::IkAxes, D::Center],
  [D::Center, D::Center, D::IjAxes, D::Center, D::IAxes, D::Center, D::IjAxes],
];

/// Why a step in one direction produced no cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepError {
  /// The direction points into a pentagon's deleted k sub-sequence.
  Pentagon,
  /// The origin is not a valid cell.
  InvalidCell,
}

/// Cell adjacent to `origin` in direction `dir`.
///
/// `rotations` holds the number of ccw rotations of the current frame and is
/// updated to the frame of the returned cell.
pub(crate) fn neighbor_rotations(origin: H3Index, mut dir: D, rotations: &mut u8) -> Result<H3Index, StepError> {
  if dir == D::Center || dir == D::InvalidDigit {
    return Err(StepError::InvalidCell);
  }
  *rotations %= 6;
  for _ in 0..*rotations {
    dir = dir.rotate60_ccw();
  }

  let mut out = origin;
  let old_base_cell = origin.base_cell();
  let old_leading_digit = origin.leading_non_zero_digit();
  let mut new_rotations = 0u8;

  let mut r = i32::from(origin.resolution()) - 1;
  loop {
    if r < 0 {
      let mut bc = base_cell_neighbor(old_base_cell, dir);
      new_rotations = BASE_CELL_NEIGHBOR_60CCW_ROTS[old_base_cell as usize][dir as usize].max(0) as u8;
      if bc == INVALID_BASE_CELL {
        // the edge borders the ik neighbour across the deleted k vertex
        bc = base_cell_neighbor(old_base_cell, D::IkAxes);
        new_rotations = BASE_CELL_NEIGHBOR_60CCW_ROTS[old_base_cell as usize][D::IkAxes as usize].max(0) as u8;
        out = out.rotate60_ccw();
        *rotations += 1;
      }
      out.set_base_cell(bc);
      break;
    }

    let level = (r + 1) as u8;
    let old_digit = out.digit(level);
    if old_digit == D::InvalidDigit {
      return Err(StepError::InvalidCell);
    }
    let next_dir = if is_class_iii(level) {
      out.set_digit(level, NEW_DIGIT_II[old_digit as usize][dir as usize]);
      NEW_ADJUSTMENT_II[old_digit as usize][dir as usize]
    } else {
      out.set_digit(level, NEW_DIGIT_III[old_digit as usize][dir as usize]);
      NEW_ADJUSTMENT_III[old_digit as usize][dir as usize]
    };
    if next_dir == D::Center {
      break;
    }
    dir = next_dir;
    r -= 1;
  }

  let new_base_cell = out.base_cell();
  if is_base_cell_pentagon(new_base_cell) {
    let mut adjusted_k_subsequence = false;
    if out.leading_non_zero_digit() == D::KAxes {
      if old_base_cell == new_base_cell {
        match old_leading_digit {
          D::Center => return Err(StepError::Pentagon),
          D::JkAxes => {
            out = out.rotate60_ccw();
            *rotations += 1;
          }
          D::IkAxes => {
            out = out.rotate60_cw();
            *rotations += 5;
          }
          _ => return Err(StepError::InvalidCell),
        }
      } else {
        out = if base_cell_is_cw_offset(new_base_cell, base_cell_home(old_base_cell).face) {
          out.rotate60_cw()
        } else {
          out.rotate60_ccw()
        };
        adjusted_k_subsequence = true;
      }
    }

    for _ in 0..new_rotations {
      out = out.rotate_pent60_ccw();
    }

    if old_base_cell != new_base_cell {
      if is_base_cell_polar_pentagon(new_base_cell) {
        if old_base_cell != 118 && old_base_cell != 8 && out.leading_non_zero_digit() != D::JkAxes {
          *rotations += 1;
        }
      } else if out.leading_non_zero_digit() == D::IkAxes && !adjusted_k_subsequence {
        *rotations += 1;
      }
    }
  } else {
    for _ in 0..new_rotations {
      out = out.rotate60_ccw();
    }
  }

  *rotations = (*rotations + new_rotations) % 6;
  Ok(out)
}

/// Distinct cells sharing an edge with `origin`: six for hexagons, five for
/// pentagons.
pub(crate) fn edge_neighbors(origin: H3Index) -> Vec<H3Index> {
  let mut out: Vec<H3Index> = Vec::with_capacity(6);
  for dir in [D::KAxes, D::JAxes, D::JkAxes, D::IAxes, D::IkAxes, D::IjAxes] {
    let mut rotations = 0;
    if let Ok(n) = neighbor_rotations(origin, dir, &mut rotations) {
      if n != origin && !out.contains(&n) {
        out.push(n);
      }
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::latlng::LatLng;

  #[test]
  fn test_hexagon_has_six_neighbors() {
    let h = H3Index(0x85283083fffffff);
    let ns = edge_neighbors(h);
    assert_eq!(ns.len(), 6);
    for n in &ns {
      assert!(n.is_valid(), "{n:?} valid");
      assert_eq!(n.resolution(), 5);
      assert!(edge_neighbors(*n).contains(&h), "adjacency is symmetric");
    }
  }

  #[test]
  fn test_pentagon_has_five_neighbors() {
    for bc in [4u8, 14, 117] {
      let mut p = H3Index::from_base_cell(bc);
      p.set_resolution(2);
      p.set_digit(1, D::Center);
      p.set_digit(2, D::Center);
      assert!(p.is_pentagon());
      assert_eq!(edge_neighbors(p).len(), 5, "base cell {bc}");
    }
    assert_eq!(edge_neighbors(H3Index::from_base_cell(4)).len(), 5, "res 0 pentagon");
  }

  #[test]
  fn test_neighbors_are_close() {
    let h = H3Index::from_geo(&LatLng::from_degrees(-33.86, 151.2), 7).unwrap();
    let c = h.center();
    for n in edge_neighbors(h) {
      let d = crate::latlng::great_circle_distance_m(&c, &n.center());
      assert!(d < 5_000.0, "res 7 neighbour at {d} m");
    }
  }
}
