// src/constants.rs

use std::f64::consts;

/// pi / 2.0
pub const M_PI_2: f64 = consts::FRAC_PI_2;
/// 2.0 * PI
pub const M_2PI: f64 = 2.0 * consts::PI;

/// Threshold epsilon.
pub const EPSILON: f64 = 0.000_000_000_000_000_1;
/// WGS84 semi-major axis in meters.
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// Authalic radius of the WGS84 ellipsoid in meters.
pub const EARTH_AUTHALIC_RADIUS_M: f64 = 6_371_007.180_918_475;
/// Surface area of the WGS84 ellipsoid in square meters.
pub const EARTH_AREA_M2: f64 = 510_065_621_724_088.5;

/// Web Mercator latitude limit.
pub const MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

// H3

/// sqrt(3) / 2.0
pub const M_SQRT3_2: f64 = 0.866_025_403_784_438_6;
/// sqrt(7)
pub const M_SQRT7: f64 = 2.645_751_311_064_590_6;
/// 1 / sqrt(7)
pub const M_RSQRT7: f64 = 1.0 / M_SQRT7;
/// 1 / sin(60')
pub const M_RSIN60: f64 = 1.0 / M_SQRT3_2;
/// 1/7
pub const M_ONESEVENTH: f64 = 1.0 / 7.0;
/// Rotation angle between Class II and Class III resolution axes: asin(sqrt(3/28)).
pub const M_AP7_ROT_RADS: f64 = 0.333_473_172_251_832_1;
/// Scaling factor from hex2d resolution 0 unit length to gnomonic unit length.
pub const RES0_U_GNOMONIC: f64 = 0.381_966_011_250_105;
/// Reciprocal of `RES0_U_GNOMONIC`.
pub const INV_RES0_U_GNOMONIC: f64 = 1.0 / RES0_U_GNOMONIC;

/// Max H3 resolution.
pub const MAX_H3_RES: u8 = 15;
/// Number of icosahedron faces.
pub const NUM_ICOSA_FACES: usize = 20;
/// Number of H3 base cells.
pub const NUM_BASE_CELLS: usize = 122;
/// Number of H3 pentagons per resolution.
pub const NUM_PENTAGONS: u64 = 12;

/// H3 index bit layout.
pub const H3_MODE_OFFSET: u8 = 59;
pub const H3_RESERVED_OFFSET: u8 = 56;
pub const H3_RES_OFFSET: u8 = 52;
pub const H3_BC_OFFSET: u8 = 45;
pub const H3_PER_DIGIT_OFFSET: u8 = 3;
pub const H3_HIGH_BIT_MASK: u64 = 1u64 << 63;
pub const H3_MODE_MASK: u64 = 0b1111u64 << H3_MODE_OFFSET;
pub const H3_RESERVED_MASK: u64 = 0b111u64 << H3_RESERVED_OFFSET;
pub const H3_RES_MASK: u64 = 0b1111u64 << H3_RES_OFFSET;
pub const H3_BC_MASK: u64 = 0b111_1111u64 << H3_BC_OFFSET;
pub const H3_DIGIT_MASK: u64 = 0b111u64;
/// H3 index mode for cells.
pub const H3_CELL_MODE: u64 = 1;
/// Index with mode 0, res 0, base cell 0 and all digits 7.
pub const H3_INIT: u64 = 35_184_372_088_831;

/// H3 cells that contain the North Pole, by resolution.
#[rustfmt::skip]
pub const NORTH_POLE_CELLS: [u64; MAX_H3_RES as usize + 1] = [
    0x8001fffffffffff, 0x81033ffffffffff, 0x820327fffffffff, 0x830326fffffffff,
    0x8403263ffffffff, 0x85032623fffffff, 0x860326237ffffff, 0x870326233ffffff,
    0x880326233bfffff, 0x890326233abffff, 0x8a0326233ab7fff, 0x8b0326233ab0fff,
    0x8c0326233ab03ff, 0x8d0326233ab03bf, 0x8e0326233ab039f, 0x8f0326233ab0399,
];

/// H3 cells that contain the South Pole, by resolution.
#[rustfmt::skip]
pub const SOUTH_POLE_CELLS: [u64; MAX_H3_RES as usize + 1] = [
    0x80f3fffffffffff, 0x81f2bffffffffff, 0x82f297fffffffff, 0x83f293fffffffff,
    0x84f2939ffffffff, 0x85f29383fffffff, 0x86f29380fffffff, 0x87f29380effffff,
    0x88f29380e1fffff, 0x89f29380e0fffff, 0x8af29380e0d7fff, 0x8bf29380e0d0fff,
    0x8cf29380e0d0dff, 0x8df29380e0d0cff, 0x8ef29380e0d0cc7, 0x8ff29380e0d0cc4,
];
