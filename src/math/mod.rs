// src/math/mod.rs
#![allow(clippy::module_name_repetitions)] // Common in math modules

pub mod vec2d;
pub mod vec3d;

pub use vec2d::Vec2d;
pub use vec3d::Vec3d;
