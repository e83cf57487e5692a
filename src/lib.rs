#![deny(clippy::all)] // Enforce clippy lints
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)] // Often a matter of taste
#![allow(clippy::missing_errors_doc)] // TODO: Add error docs later
#![allow(clippy::cast_possible_truncation)] // Grid arithmetic moves between f64 and integer cell coordinates
#![allow(clippy::cast_precision_loss)] // Counts and ids are far below 2^52 where it matters
#![allow(clippy::cast_sign_loss)] // Floors of non-negative values
#![allow(clippy::must_use_candidate)] // For functions where side effects are intended
#![allow(clippy::unreadable_literal)] // Sometimes published constants are clearer this way
#![allow(clippy::similar_names)] // Can be common in math-heavy code
#![allow(clippy::wildcard_imports)] // Allow for re-exporting from modules

//! `xs-dggs` converts between WGS84 coordinates and the cells of many
//! Discrete Global Grid Systems, and builds on that conversion to generate
//! cell coverages, bin point data, compact and expand cell sets, and resample
//! values from one grid onto another.
//!
//! Every grid implements [`DggsCodec`]; the engines only talk to that trait,
//! so a grid registered at runtime through [`Registry::register`] works with
//! all of them.
//!
//! ```
//! use xs_dggs::{latlon2cell, cell_to_latlon};
//!
//! let cell = latlon2cell("geohash", 57.64911, 10.40744, 5).unwrap();
//! assert_eq!(cell.to_string(), "u4pru");
//! let (lat, lon) = cell_to_latlon("geohash", "u4pru").unwrap();
//! assert!((lat - 57.65).abs() < 0.05 && (lon - 10.41).abs() < 0.05);
//! ```

// Declare modules
pub mod binning;
pub mod config;
pub mod constants;
pub mod convert;
pub mod generation;
pub mod geometry;
pub mod grids;
pub mod hierarchy;
pub mod latlng;
pub mod math;
pub mod progress;
pub mod resample;
pub mod stats;
pub mod types;

// Re-export key public types and functions for easier use
pub use binning::{bin_points, bin_points_in_polygons, BinOptions, BinOutput, BinRecord, PointFeature, PolygonBinRecord};
pub use config::{Config, CoordOrder, ResConfig, Rgba};
pub use convert::{cell2geometry, cell2record, cell_to_latlon, latlon2cell, parse_latlon, Converter};
pub use generation::{generate, generate_ids, CellRecord};
pub use geometry::{cell_geometry, describe_cell, sanitize, CellGeometry, CellMetrics, SanitizeOptions, Shape};
pub use grids::external::{ExternalCodec, GridBackend};
pub use grids::{DggsCodec, RawRing, Registry};
pub use hierarchy::{compact, compact_layer, expand, LayerCompaction};
pub use progress::{CancellationToken, NoProgress, ProgressSink, ProgressTracker, StageProgress};
pub use resample::{auto_resolution, resample, ResampleMethod, ResampleOutput, ResampleRecord, SourceCell};
pub use stats::{CategoryStats, Statistic};
pub use types::{
  AttributeValue, Attributes, BBox, CellId, CellToken, DggalVariant, DggsError, DggsKind, Hierarchy, ResBounds, Result,
};
