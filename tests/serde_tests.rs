// tests/serde_tests.rs

// Only compile and run these tests if the "serde" feature is enabled.
#![cfg(feature = "serde")]

use xs_dggs::grids::h3::{Direction, H3Index};
use xs_dggs::*;

#[test]
fn test_h3index_serde() {
  let h = H3Index(0x8928308280fffff);
  let serialized = serde_json::to_string(&h).unwrap();
  // repr(transparent) over u64
  assert_eq!(serialized, "617700169958293503");
  let deserialized: H3Index = serde_json::from_str(&serialized).unwrap();
  assert_eq!(h, deserialized);
}

#[test]
fn test_direction_serde() {
  let dir = Direction::KAxes;
  let serialized = serde_json::to_string(&dir).unwrap();
  assert_eq!(serialized, "1"); // serde_repr serializes to the number
  let deserialized: Direction = serde_json::from_str(&serialized).unwrap();
  assert_eq!(dir, deserialized);
}

#[test]
fn test_cell_id_serde() {
  let cells = [
    CellId::int(DggsKind::H3, 0x85283473fffffff),
    CellId::text(DggsKind::Geohash, "u4pru"),
    CellId::path(DggsKind::RHealpix, 'N', vec![0, 8, 4]),
    CellId::text(DggsKind::Dggal(DggalVariant::Isea9r), "A4-0-A"),
  ];
  for cell in cells {
    let json = serde_json::to_string(&cell).unwrap();
    let back: CellId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, cell, "{json}");
  }
}

#[test]
fn test_attribute_value_serde_is_untagged() {
  let values = vec![
    AttributeValue::Null,
    AttributeValue::Bool(true),
    AttributeValue::Int(3),
    AttributeValue::Float(2.5),
    AttributeValue::Text("forest".into()),
  ];
  let json = serde_json::to_string(&values).unwrap();
  assert_eq!(json, r#"[null,true,3,2.5,"forest"]"#);
  let back: Vec<AttributeValue> = serde_json::from_str(&json).unwrap();
  assert_eq!(back, values);
}

#[test]
fn test_statistic_serde() {
  assert_eq!(serde_json::to_string(&Statistic::Mean).unwrap(), r#""mean""#);
  for stat in Statistic::ALL {
    let back: Statistic = serde_json::from_str(&serde_json::to_string(&stat).unwrap()).unwrap();
    assert_eq!(back, stat);
  }
}

#[test]
fn test_config_serde() {
  let mut cfg = Config::new();
  cfg.set("coordOrder", "lonlat").unwrap();
  cfg.set("dggs.h3.maxRes", "9").unwrap();
  cfg.set("s2Color", "#ff000080").unwrap();
  let json = serde_json::to_string(&cfg).unwrap();
  assert!(json.contains(r#""coordOrder":"lonlat""#), "{json}");
  let back: Config = serde_json::from_str(&json).unwrap();
  assert_eq!(back, cfg);

  // missing keys fall back to defaults
  let partial: Config = serde_json::from_str(r#"{"persistentMarker":true}"#).unwrap();
  assert!(partial.persistent_marker);
  assert_eq!(partial.coord_order, CoordOrder::LatLon);
}

#[test]
fn test_bbox_serde() {
  let bbox = BBox::new(-10.0, 170.0, 10.0, -170.0).unwrap();
  let back: BBox = serde_json::from_str(&serde_json::to_string(&bbox).unwrap()).unwrap();
  assert_eq!(back, bbox);
  assert!(back.crosses_antimeridian());
}

#[test]
fn test_cell_record_serde() {
  let record = cell2record("geohash", "u4pru").unwrap();
  let json = serde_json::to_string(&record).unwrap();
  let back: CellRecord = serde_json::from_str(&json).unwrap();
  assert_eq!(back.cell, record.cell);
  assert_eq!(back.resolution, 5);
  assert!(matches!(back.metrics.shape, Shape::Graticule { .. }));
  assert!((back.metrics.area_m2 - record.metrics.area_m2).abs() < 1e-6 * record.metrics.area_m2);
  assert_eq!(back.geometry.polygons().len(), 1);
}
