// src/hierarchy/mod.rs

pub mod compaction;

pub use compaction::{compact, compact_layer, expand, LayerCompaction};
