//! Spatial acceleration structures
//!
//! Hierarchical partitioning of static level geometry for sub-linear
//! nearest-intersection queries. Built once per level load, read-only
//! afterwards.

mod bvh;

pub use bvh::{Bvh, BvhConfig, RayHit};
