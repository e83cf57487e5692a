// tests/h3_codec_tests.rs

use xs_dggs::constants::{NORTH_POLE_CELLS, NUM_PENTAGONS, SOUTH_POLE_CELLS};
use xs_dggs::grids::h3::{H3Codec, H3Index};
use xs_dggs::*;

fn cell(hex: &str) -> CellId {
  H3Codec.parse(hex).unwrap()
}

#[test]
fn test_cli_lat_lng_to_cell() {
  // "latLngToCell --lat 20 --lng 123 -r 2" "824b9ffffffffff"
  let c = H3Codec.encode(20.0, 123.0, 2).unwrap();
  assert_eq!(c.to_string(), "824b9ffffffffff");
  assert_eq!(c.as_u64(), Some(0x824b9ffffffffff));
}

#[test]
fn test_cli_cell_to_lat_lng() {
  // "cellToLatLng -c 8928342e20fffff" "POINT(-122.5003039349 37.5012466151)"
  let h = H3Codec::index(&cell("8928342e20fffff")).unwrap();
  let (lon, lat) = h.center().to_lon_lat_degrees();
  assert!((lon - -122.5003039349).abs() < 1e-9, "lon {lon}");
  assert!((lat - 37.5012466151).abs() < 1e-9, "lat {lat}");
}

#[test]
fn test_cli_cell_to_boundary() {
  // "cellToBoundary -c 8928342e20fffff" "POLYGON((-122.4990471431 37.4997389893, ..."
  let ring = H3Codec.decode(&cell("8928342e20fffff")).unwrap();
  assert_eq!(ring.len(), 6);
  assert!(
    ring
      .iter()
      .any(|v| (v.x - -122.4990471431).abs() < 1e-9 && (v.y - 37.4997389893).abs() < 1e-9),
    "first CLI vertex missing from {ring:?}"
  );
}

#[test]
fn test_cli_invalid_cells() {
  // "cellToLatLng -c asdf" "Error 5: Cell argument was not valid"
  assert!(matches!(H3Codec.parse("asdf"), Err(DggsError::InvalidCellToken { .. })));
  // res 0 cell with its mode cleared
  let no_mode = CellId::int(DggsKind::H3, 0x8001fffffffffff & !(0xf << 59));
  assert!(H3Codec.resolution(&no_mode).is_err());
  assert!(!H3Index(0x852834727fffffff).is_valid());
  assert!(H3Codec.parse("0x85283473FFFFFFF").is_ok());
}

#[test]
fn test_cli_cell_to_parent() {
  // "cellToParent -c 8928342e20fffff --resolution 3" "832834fffffffff"
  let mut c = cell("8928342e20fffff");
  while H3Codec.resolution(&c).unwrap() > 3 {
    c = H3Codec.parent(&c).unwrap().unwrap();
  }
  assert_eq!(c.to_string(), "832834fffffffff");
  let base = cell("8009fffffffffff");
  assert_eq!(H3Codec.parent(&base).unwrap(), None);
}

#[test]
fn test_cli_cell_to_children() {
  // "cellToChildrenSize -c 85283473fffffff -r 6" "7"
  let parent = cell("85283473fffffff");
  let kids = H3Codec.children(&parent, 6).unwrap();
  assert_eq!(kids.len(), 7);
  for k in &kids {
    assert_eq!(H3Codec.parent(k).unwrap().as_ref(), Some(&parent));
  }
  // "cellToCenterChild -c 85283473fffffff --resolution 7" "872834700ffffff"
  let grandkids = H3Codec.children(&parent, 7).unwrap();
  assert_eq!(grandkids.len(), 49);
  assert!(grandkids.contains(&cell("872834700ffffff")));
  assert!(grandkids.contains(&cell("872834730ffffff")));
}

#[test]
fn test_pentagon_children_and_edges() {
  let pentagon = cell("8009fffffffffff");
  assert!(H3Codec::index(&pentagon).unwrap().is_pentagon());
  assert_eq!(H3Codec.edges(&pentagon).unwrap(), 5);
  assert_eq!(H3Codec.children(&pentagon, 1).unwrap().len(), 6);
  assert_eq!(H3Codec.neighbors(&pentagon).unwrap().len(), 5);
}

#[test]
fn test_hexagon_neighbors() {
  let n = H3Codec.neighbors(&cell("85283473fffffff")).unwrap();
  assert_eq!(n.len(), 6);
  assert!(n.contains(&cell("85283477fffffff")));
  assert!(n.contains(&cell("85283447fffffff")));
  assert!(!n.contains(&cell("85283473fffffff")));
}

#[test]
fn test_roots_and_counts() {
  let roots = H3Codec.roots().unwrap();
  assert_eq!(roots.len(), 122);
  assert_eq!(H3Codec.cell_count(0), 122.0);
  assert_eq!(H3Codec.cell_count(1), 842.0);
}

#[test]
fn test_pole_cells() {
  for res in 0..=15u8 {
    let north = H3Codec.encode(90.0, 0.0, res).unwrap();
    let south = H3Codec.encode(-90.0, 0.0, res).unwrap();
    assert_eq!(north.as_u64(), Some(NORTH_POLE_CELLS[res as usize]), "north res {res}");
    assert_eq!(south.as_u64(), Some(SOUTH_POLE_CELLS[res as usize]), "south res {res}");
  }
}

#[test]
fn test_twelve_pentagons_per_resolution() {
  let pentagons = |cells: Vec<CellId>| {
    cells
      .iter()
      .filter(|c| H3Codec::index(c).unwrap().is_pentagon())
      .count() as u64
  };
  let roots = H3Codec.roots().unwrap();
  assert_eq!(pentagons(roots.clone()), NUM_PENTAGONS);
  let res1: Vec<CellId> = roots.iter().flat_map(|r| H3Codec.children(r, 1).unwrap()).collect();
  assert_eq!(res1.len(), 842);
  assert_eq!(pentagons(res1), NUM_PENTAGONS);
}
