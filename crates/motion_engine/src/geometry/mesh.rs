//! Merged static level geometry

use super::{Aabb, Triangle};
use crate::foundation::math::Vec3;

/// Immutable collection of collision triangles for one level
///
/// Built once per level load from the level provider's merged vertex and
/// index buffers, then handed to the spatial index. Degenerate (zero-area)
/// triangles and incomplete index chunks are dropped during construction so
/// downstream queries never see them.
#[derive(Debug, Clone, Default)]
pub struct StaticGeometry {
    triangles: Vec<Triangle>,
}

impl StaticGeometry {
    /// Creates empty geometry (a void scene with no collision surfaces)
    pub fn empty() -> Self {
        Self { triangles: Vec::new() }
    }

    /// Creates geometry from indexed vertices
    ///
    /// Indices are consumed in chunks of three; a trailing partial chunk or
    /// an out-of-range index drops that triangle rather than failing the
    /// whole level.
    pub fn from_vertices(vertices: &[Vec3], indices: &[u32]) -> Self {
        let mut triangles = Vec::with_capacity(indices.len() / 3);

        for chunk in indices.chunks(3) {
            if chunk.len() != 3 {
                continue;
            }
            let fetch = |i: u32| vertices.get(i as usize).copied();
            let (Some(v0), Some(v1), Some(v2)) = (fetch(chunk[0]), fetch(chunk[1]), fetch(chunk[2]))
            else {
                continue;
            };

            let tri = Triangle::new(v0, v1, v2);
            if !tri.is_degenerate() {
                triangles.push(tri);
            }
        }

        let dropped = indices.len() / 3 - triangles.len();
        if dropped > 0 {
            log::warn!("static geometry dropped {dropped} degenerate or invalid triangles");
        }

        Self { triangles }
    }

    /// Creates geometry from an explicit triangle list
    pub fn from_triangles(triangles: Vec<Triangle>) -> Self {
        let triangles: Vec<_> = triangles.into_iter().filter(|t| !t.is_degenerate()).collect();
        Self { triangles }
    }

    /// All triangles in the level
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Number of triangles
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    /// Whether the level has no collision surfaces at all
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Bounding box of the whole level
    pub fn bounds(&self) -> Aabb {
        let mut aabb = Aabb::empty();
        for tri in &self.triangles {
            aabb.grow(&tri.bounds());
        }
        aabb
    }
}
