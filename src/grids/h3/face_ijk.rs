// src/grids/h3/face_ijk.rs

use super::ijk::CoordIJK;
use crate::constants::{
  EPSILON, INV_RES0_U_GNOMONIC, M_AP7_ROT_RADS, M_RSQRT7, M_SQRT3_2, M_SQRT7, NUM_ICOSA_FACES, RES0_U_GNOMONIC,
};
use crate::latlng::{pos_angle_rads, LatLng};
use crate::math::{Vec2d, Vec3d};

/// Quadrant of a face's neighbour table.
pub(crate) const IJ_QUADRANT: usize = 1;
pub(crate) const KI_QUADRANT: usize = 2;
pub(crate) const JK_QUADRANT: usize = 3;

/// Overage distance by Class II resolution.
#[rustfmt::skip]
pub(crate) const MAX_DIM_BY_CII_RES: [i32; 17] = [
    2, -1, 14, -1, 98, -1, 686, -1, 4802, -1, 33614, -1, 235_298, -1, 1_647_086, -1, 11_529_602,
];

/// Unit scale distance by Class II resolution.
#[rustfmt::skip]
pub(crate) const UNIT_SCALE_BY_CII_RES: [i32; 17] = [
    1, -1, 7, -1, 49, -1, 343, -1, 2401, -1, 16807, -1, 117_649, -1, 823_543, -1, 5_764_801,
];

/// Icosahedron face centers in lat/lng radians.
#[rustfmt::skip]
pub(crate) const FACE_CENTER_GEO: [LatLng; NUM_ICOSA_FACES] = [
    LatLng::new(0.803_582_649_718_989_94, 1.248_397_419_617_396), // face 0
    LatLng::new(1.307_747_883_455_638_2, 2.536_945_009_877_921), // face 1
    LatLng::new(1.054_751_253_523_952, -1.347_517_358_900_396_6), // face 2
    LatLng::new(0.600_191_595_538_186_8, -0.450_603_909_469_755_75), // face 3
    LatLng::new(0.491_715_428_198_773_87, 0.401_988_202_911_306_94), // face 4
    LatLng::new(0.172_745_327_415_618_7, 1.678_146_885_280_433_7), // face 5
    LatLng::new(0.605_929_321_571_350_7, 2.953_923_329_812_411_6), // face 6
    LatLng::new(0.427_370_518_328_979_64, -1.888_876_200_336_285_4), // face 7
    LatLng::new(-0.079_066_118_549_212_83, -0.733_429_513_380_867_74), // face 8
    LatLng::new(-0.230_961_644_455_383_64, 0.506_495_587_332_349), // face 9
    LatLng::new(0.079_066_118_549_212_83, 2.408_163_140_208_925_5), // face 10
    LatLng::new(0.230_961_644_455_383_64, -2.635_097_066_257_444), // face 11
    LatLng::new(-0.172_745_327_415_618_7, -1.463_445_768_309_359_5), // face 12
    LatLng::new(-0.605_929_321_571_350_7, -0.187_669_323_777_381_62), // face 13
    LatLng::new(-0.427_370_518_328_979_64, 1.252_716_453_253_508), // face 14
    LatLng::new(-0.600_191_595_538_186_8, 2.690_988_744_120_037_5), // face 15
    LatLng::new(-0.491_715_428_198_773_87, -2.739_604_450_678_486_3), // face 16
    LatLng::new(-0.803_582_649_718_989_94, -1.893_195_233_972_397), // face 17
    LatLng::new(-1.307_747_883_455_638_2, -0.604_647_643_711_872_1), // face 18
    LatLng::new(-1.054_751_253_523_952, 1.794_075_294_689_396_6), // face 19
];

/// Icosahedron face centers on the unit sphere.
#[rustfmt::skip]
const FACE_CENTER_POINT: [Vec3d; NUM_ICOSA_FACES] = [
    Vec3d::new(0.219_930_779_140_460_6, 0.658_369_178_027_499_6, 0.719_847_537_892_618_2), // face 0
    Vec3d::new(-0.213_923_483_450_142_1, 0.147_817_182_955_070_3, 0.965_601_793_521_420_5), // face 1
    Vec3d::new(0.109_262_527_878_479_7, -0.481_195_157_287_321, 0.869_777_512_128_725_3), // face 2
    Vec3d::new(0.742_856_730_158_679_1, -0.359_394_167_827_802_8, 0.564_800_593_651_703_3), // face 3
    Vec3d::new(0.811_253_470_914_096_9, 0.344_895_323_763_938_4, 0.472_138_773_641_393), // face 4
    Vec3d::new(-0.105_549_814_961_392_1, 0.979_445_729_641_141_3, 0.171_887_461_000_936_5), // face 5
    Vec3d::new(-0.807_540_757_997_009_2, 0.153_355_248_589_881_8, 0.569_526_199_488_268_8), // face 6
    Vec3d::new(-0.284_614_806_978_790_7, -0.864_408_097_265_420_6, 0.414_479_255_247_354), // face 7
    Vec3d::new(0.740_562_147_385_448_2, -0.667_329_956_456_552_4, -0.078_983_764_632_673_77), // face 8
    Vec3d::new(0.851_230_398_647_429_3, 0.472_234_378_858_268_1, -0.228_913_738_868_780_8), // face 9
    Vec3d::new(-0.740_562_147_385_448_1, 0.667_329_956_456_552_4, 0.078_983_764_632_673_77), // face 10
    Vec3d::new(-0.851_230_398_647_429_2, -0.472_234_378_858_268_2, 0.228_913_738_868_780_8), // face 11
    Vec3d::new(0.105_549_814_961_391_9, -0.979_445_729_641_141_3, -0.171_887_461_000_936_5), // face 12
    Vec3d::new(0.807_540_757_997_009_2, -0.153_355_248_589_881_9, -0.569_526_199_488_268_8), // face 13
    Vec3d::new(0.284_614_806_978_790_8, 0.864_408_097_265_420_4, -0.414_479_255_247_354), // face 14
    Vec3d::new(-0.742_856_730_158_679_1, 0.359_394_167_827_802_7, -0.564_800_593_651_703_3), // face 15
    Vec3d::new(-0.811_253_470_914_097_1, -0.344_895_323_763_938_2, -0.472_138_773_641_393), // face 16
    Vec3d::new(-0.219_930_779_140_460_7, -0.658_369_178_027_499_6, -0.719_847_537_892_618_2), // face 17
    Vec3d::new(0.213_923_483_450_142, -0.147_817_182_955_070_4, -0.965_601_793_521_420_5), // face 18
    Vec3d::new(-0.109_262_527_878_479_6, 0.481_195_157_287_321, -0.869_777_512_128_725_3), // face 19
];

/// Azimuth in radians from each face center to its vertices 0/1/2.
#[rustfmt::skip]
const FACE_AXES_AZ_RADS_CII: [[f64; 3]; NUM_ICOSA_FACES] = [
    [5.619_958_268_523_94, 3.525_563_166_130_744_5, 1.431_168_063_737_548_7], // face 0
    [5.760_339_081_714_187, 3.665_943_979_320_991_7, 1.571_548_876_927_796], // face 1
    [0.780_213_654_393_430_1, 4.969_003_859_179_821, 2.874_608_756_786_625_7], // face 2
    [0.430_469_363_979_999_9, 4.619_259_568_766_391, 2.524_864_466_373_195_5], // face 3
    [6.130_269_123_335_111, 4.035_874_020_941_916, 1.941_478_918_548_720_3], // face 4
    [2.692_877_706_530_643, 0.598_482_604_137_447_1, 4.787_272_808_923_838], // face 5
    [2.982_963_003_477_244, 0.888_567_901_084_048_4, 5.077_358_105_870_44], // face 6
    [3.532_912_002_790_141, 1.438_516_900_396_945_7, 5.627_307_105_183_337], // face 7
    [3.494_305_004_259_568, 1.399_909_901_866_372_9, 5.588_700_106_652_764], // face 8
    [3.003_214_169_499_538_4, 0.908_819_067_106_342_9, 5.097_609_271_892_734], // face 9
    [5.930_472_956_509_811_6, 3.836_077_854_116_616, 1.741_682_751_723_420_4], // face 10
    [0.138_378_484_090_254_85, 4.327_168_688_876_646, 2.232_773_586_483_45], // face 11
    [0.448_714_947_059_150_36, 4.637_505_151_845_541_5, 2.543_110_049_452_346], // face 12
    [0.158_629_650_112_549_36, 4.347_419_854_898_94, 2.253_024_752_505_745], // face 13
    [5.891_865_957_979_238_5, 3.797_470_855_586_043, 1.703_075_753_192_847_6], // face 14
    [2.711_123_289_609_793_3, 0.616_728_187_216_597_8, 4.805_518_392_002_988_7], // face 15
    [3.294_508_837_434_268, 1.200_113_735_041_073, 5.388_903_939_827_464], // face 16
    [3.804_819_692_245_44, 1.710_424_589_852_244_5, 5.899_214_794_638_635], // face 17
    [3.664_438_879_055_192_4, 1.570_043_776_661_997, 5.758_833_981_448_388], // face 18
    [2.361_378_999_196_363, 0.266_983_896_803_167_6, 4.455_774_101_589_558_6], // face 19
];

/// How to move into an adjacent face's IJK system.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FaceOrientIJK {
  pub(crate) face: usize,
  /// Res 0 translation relative to the primary face.
  pub(crate) translate: CoordIJK,
  /// Number of 60 degree ccw rotations relative to the primary face.
  pub(crate) ccw_rot60: u8,
}

const fn fo(face: usize, i: i32, j: i32, k: i32, ccw_rot60: u8) -> FaceOrientIJK {
  FaceOrientIJK {
    face,
    translate: CoordIJK::new(i, j, k),
    ccw_rot60,
  }
}

/// Neighbouring faces: central, IJ, KI and JK quadrants.
#[rustfmt::skip]
pub(crate) const FACE_NEIGHBORS: [[FaceOrientIJK; 4]; NUM_ICOSA_FACES] = [
    [fo(0, 0, 0, 0, 0), fo(4, 2, 0, 2, 1), fo(1, 2, 2, 0, 5), fo(5, 0, 2, 2, 3)], // face 0
    [fo(1, 0, 0, 0, 0), fo(0, 2, 0, 2, 1), fo(2, 2, 2, 0, 5), fo(6, 0, 2, 2, 3)], // face 1
    [fo(2, 0, 0, 0, 0), fo(1, 2, 0, 2, 1), fo(3, 2, 2, 0, 5), fo(7, 0, 2, 2, 3)], // face 2
    [fo(3, 0, 0, 0, 0), fo(2, 2, 0, 2, 1), fo(4, 2, 2, 0, 5), fo(8, 0, 2, 2, 3)], // face 3
    [fo(4, 0, 0, 0, 0), fo(3, 2, 0, 2, 1), fo(0, 2, 2, 0, 5), fo(9, 0, 2, 2, 3)], // face 4
    [fo(5, 0, 0, 0, 0), fo(10, 2, 2, 0, 3), fo(14, 2, 0, 2, 3), fo(0, 0, 2, 2, 3)], // face 5
    [fo(6, 0, 0, 0, 0), fo(11, 2, 2, 0, 3), fo(10, 2, 0, 2, 3), fo(1, 0, 2, 2, 3)], // face 6
    [fo(7, 0, 0, 0, 0), fo(12, 2, 2, 0, 3), fo(11, 2, 0, 2, 3), fo(2, 0, 2, 2, 3)], // face 7
    [fo(8, 0, 0, 0, 0), fo(13, 2, 2, 0, 3), fo(12, 2, 0, 2, 3), fo(3, 0, 2, 2, 3)], // face 8
    [fo(9, 0, 0, 0, 0), fo(14, 2, 2, 0, 3), fo(13, 2, 0, 2, 3), fo(4, 0, 2, 2, 3)], // face 9
    [fo(10, 0, 0, 0, 0), fo(5, 2, 2, 0, 3), fo(6, 2, 0, 2, 3), fo(15, 0, 2, 2, 3)], // face 10
    [fo(11, 0, 0, 0, 0), fo(6, 2, 2, 0, 3), fo(7, 2, 0, 2, 3), fo(16, 0, 2, 2, 3)], // face 11
    [fo(12, 0, 0, 0, 0), fo(7, 2, 2, 0, 3), fo(8, 2, 0, 2, 3), fo(17, 0, 2, 2, 3)], // face 12
    [fo(13, 0, 0, 0, 0), fo(8, 2, 2, 0, 3), fo(9, 2, 0, 2, 3), fo(18, 0, 2, 2, 3)], // face 13
    [fo(14, 0, 0, 0, 0), fo(9, 2, 2, 0, 3), fo(5, 2, 0, 2, 3), fo(19, 0, 2, 2, 3)], // face 14
    [fo(15, 0, 0, 0, 0), fo(16, 2, 0, 2, 1), fo(19, 2, 2, 0, 5), fo(10, 0, 2, 2, 3)], // face 15
    [fo(16, 0, 0, 0, 0), fo(17, 2, 0, 2, 1), fo(15, 2, 2, 0, 5), fo(11, 0, 2, 2, 3)], // face 16
    [fo(17, 0, 0, 0, 0), fo(18, 2, 0, 2, 1), fo(16, 2, 2, 0, 5), fo(12, 0, 2, 2, 3)], // face 17
    [fo(18, 0, 0, 0, 0), fo(19, 2, 0, 2, 1), fo(17, 2, 2, 0, 5), fo(13, 0, 2, 2, 3)], // face 18
    [fo(19, 0, 0, 0, 0), fo(15, 2, 0, 2, 1), fo(18, 2, 2, 0, 5), fo(14, 0, 2, 2, 3)], // face 19
];

/// Quadrant from one face to an adjacent one, 0 when not adjacent.
pub(crate) fn adjacent_face_dir(from: usize, to: usize) -> usize {
  if from == to {
    return 0;
  }
  (IJ_QUADRANT..=JK_QUADRANT)
    .find(|q| FACE_NEIGHBORS[from][*q].face == to)
    .unwrap_or(0)
}

/// Result of moving a coordinate that may have left its face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Overage {
  NoOverage,
  /// On a face edge (substrate grids only).
  FaceEdge,
  /// Moved onto an adjacent face.
  NewFace,
}

#[inline]
pub(crate) fn is_class_iii(res: u8) -> bool {
  res % 2 == 1
}

/// Face number and IJK coordinates on that face-centered coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FaceIJK {
  /// Icosahedron face number (0-19).
  pub face: usize,
  /// IJK coordinates on that face.
  pub coord: CoordIJK,
}

/// Face whose center is closest to `g`, with the squared euclidean distance
/// to that center on the unit sphere.
fn closest_face(g: &LatLng) -> (usize, f64) {
  let v3d = Vec3d::from_lat_lng_rads(g.lat, g.lng);
  let mut face = 0;
  let mut sqd = 5.0;
  for (f, center) in FACE_CENTER_POINT.iter().enumerate() {
    let d = center.square_dist(&v3d);
    if d < sqd {
      face = f;
      sqd = d;
    }
  }
  (face, sqd)
}

/// Projects a point onto its closest face as hex2d coordinates at `res`.
pub(crate) fn geo_to_hex2d(g: &LatLng, res: u8) -> (usize, Vec2d) {
  let (face, sqd) = closest_face(g);

  // cos(r) = 1 - 2 * sin^2(r/2) = 1 - sqd / 2
  let mut r = (1.0 - sqd * 0.5).clamp(-1.0, 1.0).acos();
  if r < EPSILON {
    return (face, Vec2d::default());
  }

  let mut theta = pos_angle_rads(FACE_AXES_AZ_RADS_CII[face][0] - pos_angle_rads(FACE_CENTER_GEO[face].azimuth_to(g)));
  if is_class_iii(res) {
    theta = pos_angle_rads(theta - M_AP7_ROT_RADS);
  }

  // gnomonic scaling
  r = r.tan() * INV_RES0_U_GNOMONIC;
  for _ in 0..res {
    r *= M_SQRT7;
  }

  (face, Vec2d::new(r * theta.cos(), r * theta.sin()))
}

/// Inverse of [`geo_to_hex2d`]. `substrate` marks the aperture 33r vertex grid.
pub(crate) fn hex2d_to_geo(v: &Vec2d, face: usize, res: u8, substrate: bool) -> LatLng {
  let mut r = v.mag();
  if r < EPSILON {
    return FACE_CENTER_GEO[face];
  }

  let mut theta = v.y.atan2(v.x);
  for _ in 0..res {
    r *= M_RSQRT7;
  }
  if substrate {
    r /= 3.0;
    if is_class_iii(res) {
      r *= M_RSQRT7;
    }
  }
  r = (r * RES0_U_GNOMONIC).atan();

  // substrate grids are already adjusted for Class III
  if !substrate && is_class_iii(res) {
    theta = pos_angle_rads(theta + M_AP7_ROT_RADS);
  }
  let az = pos_angle_rads(FACE_AXES_AZ_RADS_CII[face][0] - theta);
  FACE_CENTER_GEO[face].az_distance(az, r)
}

#[rustfmt::skip]
const VERTS_CII: [CoordIJK; 6] = [
    CoordIJK::new(2, 1, 0), CoordIJK::new(1, 2, 0), CoordIJK::new(0, 2, 1),
    CoordIJK::new(0, 1, 2), CoordIJK::new(1, 0, 2), CoordIJK::new(2, 0, 1),
];

#[rustfmt::skip]
const VERTS_CIII: [CoordIJK; 6] = [
    CoordIJK::new(5, 4, 0), CoordIJK::new(1, 5, 0), CoordIJK::new(0, 5, 4),
    CoordIJK::new(0, 1, 5), CoordIJK::new(4, 0, 5), CoordIJK::new(5, 0, 1),
];

/// Endpoints in substrate hex2d of the icosahedron edge in a quadrant.
fn icosa_edge(quadrant: usize, adj_res: u8) -> (Vec2d, Vec2d) {
  let max_dim = f64::from(MAX_DIM_BY_CII_RES[adj_res as usize]);
  let v0 = Vec2d::new(3.0 * max_dim, 0.0);
  let v1 = Vec2d::new(-1.5 * max_dim, 3.0 * M_SQRT3_2 * max_dim);
  let v2 = Vec2d::new(-1.5 * max_dim, -3.0 * M_SQRT3_2 * max_dim);
  match quadrant {
    IJ_QUADRANT => (v0, v1),
    JK_QUADRANT => (v1, v2),
    _ => (v2, v0),
  }
}

impl FaceIJK {
  #[must_use]
  pub const fn new(face: usize, coord: CoordIJK) -> Self {
    Self { face, coord }
  }

  /// Cell containing `g` at `res`, expressed on its closest face.
  #[must_use]
  pub fn from_geo(g: &LatLng, res: u8) -> FaceIJK {
    let (face, v) = geo_to_hex2d(g, res);
    FaceIJK::new(face, CoordIJK::from_hex2d(&v))
  }

  /// Center point of the cell.
  #[must_use]
  pub fn to_geo(&self, res: u8) -> LatLng {
    hex2d_to_geo(&self.coord.to_hex2d(), self.face, res, false)
  }

  /// Moves a Class II coordinate that fell off its face onto the adjacent face.
  pub(crate) fn adjust_overage_class_ii(&mut self, res: u8, pent_leading4: bool, substrate: bool) -> Overage {
    let scale = if substrate { 3 } else { 1 };
    let max_dim = MAX_DIM_BY_CII_RES[res as usize] * scale;
    let sum = self.coord.i + self.coord.j + self.coord.k;

    if substrate && sum == max_dim {
      return Overage::FaceEdge;
    }
    if sum <= max_dim {
      return Overage::NoOverage;
    }

    let orient = if self.coord.k > 0 {
      if self.coord.j > 0 {
        FACE_NEIGHBORS[self.face][JK_QUADRANT]
      } else {
        if pent_leading4 {
          // rotate about the pentagon center to skip the missing sequence
          let origin = CoordIJK::new(max_dim, 0, 0);
          let mut tmp = self.coord.sub(&origin);
          tmp.rotate60_cw();
          self.coord = tmp.add(&origin);
        }
        FACE_NEIGHBORS[self.face][KI_QUADRANT]
      }
    } else {
      FACE_NEIGHBORS[self.face][IJ_QUADRANT]
    };

    self.face = orient.face;
    for _ in 0..orient.ccw_rot60 {
      self.coord.rotate60_ccw();
    }
    let mut trans = orient.translate;
    trans.scale(UNIT_SCALE_BY_CII_RES[res as usize] * scale);
    self.coord = self.coord.add(&trans);
    self.coord.normalize();

    // overage points on pentagon boundaries can end up on edges
    if substrate && self.coord.i + self.coord.j + self.coord.k == max_dim {
      Overage::FaceEdge
    } else {
      Overage::NewFace
    }
  }

  /// Repeats substrate adjustment until a pentagon vertex settles on a face.
  pub(crate) fn adjust_pent_vert_overage(&mut self, res: u8) -> Overage {
    loop {
      let overage = self.adjust_overage_class_ii(res, false, true);
      if overage != Overage::NewFace {
        return overage;
      }
    }
  }

  /// Vertices of the cell in the substrate grid and the Class II resolution
  /// they live at.
  fn to_verts(&self, res: u8, count: usize) -> (Vec<FaceIJK>, u8) {
    let verts = if is_class_iii(res) { &VERTS_CIII } else { &VERTS_CII };
    let mut center = self.coord;
    center.down_ap3();
    center.down_ap3r();
    let mut adj_res = res;
    if is_class_iii(res) {
      center.down_ap7r();
      adj_res += 1;
    }
    let out = verts[..count]
      .iter()
      .map(|v| {
        let mut c = center.add(v);
        c.normalize();
        FaceIJK::new(self.face, c)
      })
      .collect();
    (out, adj_res)
  }

  /// Boundary of a hexagonal cell, including icosahedron edge crossings.
  #[must_use]
  pub fn hex_boundary(&self, res: u8) -> Vec<LatLng> {
    let (verts, adj_res) = self.to_verts(res, 6);
    let mut out = Vec::with_capacity(10);
    let mut last_face: Option<usize> = None;
    let mut last_overage = Overage::NoOverage;

    // one extra pass catches a crossing on the closing edge
    for vert in 0..=6 {
      let v = vert % 6;
      let mut fijk = verts[v];
      let overage = fijk.adjust_overage_class_ii(adj_res, false, true);

      if let Some(lf) = last_face {
        if is_class_iii(res) && fijk.face != lf && last_overage != Overage::FaceEdge {
          let last_v = (v + 5) % 6;
          let orig0 = verts[last_v].coord.to_hex2d();
          let orig1 = verts[v].coord.to_hex2d();
          let face2 = if lf == self.face { fijk.face } else { lf };
          let (e0, e1) = icosa_edge(adjacent_face_dir(self.face, face2), adj_res);
          if let Some(inter) = Vec2d::intersect(orig0, orig1, e0, e1) {
            if !orig0.almost_equals(&inter) && !orig1.almost_equals(&inter) {
              out.push(hex2d_to_geo(&inter, self.face, adj_res, true));
            }
          }
        }
      }

      if vert < 6 {
        out.push(hex2d_to_geo(&fijk.coord.to_hex2d(), fijk.face, adj_res, true));
      }
      last_face = Some(fijk.face);
      last_overage = overage;
    }
    out
  }

  /// Boundary of a pentagonal cell, including icosahedron edge crossings.
  #[must_use]
  pub fn pent_boundary(&self, res: u8) -> Vec<LatLng> {
    let (verts, adj_res) = self.to_verts(res, 5);
    let mut out = Vec::with_capacity(10);
    let mut last: Option<FaceIJK> = None;

    for vert in 0..=5 {
      let mut fijk = verts[vert % 5];
      fijk.adjust_pent_vert_overage(adj_res);

      // every Class III pentagon edge crosses an icosahedron edge
      if let (true, Some(last_fijk)) = (is_class_iii(res), last) {
        let orig0 = last_fijk.coord.to_hex2d();
        let orient = FACE_NEIGHBORS[fijk.face][adjacent_face_dir(fijk.face, last_fijk.face)];
        let mut tmp = FaceIJK::new(orient.face, fijk.coord);
        for _ in 0..orient.ccw_rot60 {
          tmp.coord.rotate60_ccw();
        }
        let mut trans = orient.translate;
        trans.scale(UNIT_SCALE_BY_CII_RES[adj_res as usize] * 3);
        tmp.coord = tmp.coord.add(&trans);
        tmp.coord.normalize();
        let orig1 = tmp.coord.to_hex2d();

        let (e0, e1) = icosa_edge(adjacent_face_dir(tmp.face, fijk.face), adj_res);
        if let Some(inter) = Vec2d::intersect(orig0, orig1, e0, e1) {
          out.push(hex2d_to_geo(&inter, tmp.face, adj_res, true));
        }
      }

      if vert < 5 {
        out.push(hex2d_to_geo(&fijk.coord.to_hex2d(), fijk.face, adj_res, true));
      }
      last = Some(fijk);
    }
    out
  }
}
