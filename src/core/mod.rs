//! Core building blocks: the bounded parallel mapper, argument construction,
//! parameter structs, and image processing primitives (blend, grid, crop,
//! palette, resize, stats). These are consumed by the high-level `api` module.
pub mod args;
pub mod params;
pub mod pool;
pub mod processing;
