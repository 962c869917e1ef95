//! Collision triangles

use super::{Aabb, Ray};
use crate::foundation::math::Vec3;

/// A triangle for collision detection
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    /// First vertex in world space
    pub v0: Vec3,
    /// Second vertex in world space
    pub v1: Vec3,
    /// Third vertex in world space
    pub v2: Vec3,
}

impl Triangle {
    /// Creates a new triangle
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self { v0, v1, v2 }
    }

    /// Calculates the normal of the triangle (right-hand rule)
    ///
    /// Degenerate (zero-area) triangles produce a zero normal rather than
    /// NaN; such triangles are filtered out at geometry construction.
    pub fn normal(&self) -> Vec3 {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;
        crate::foundation::math::utils::normalize_or_zero(edge1.cross(&edge2))
    }

    /// Calculates the centroid (center point) of the triangle
    pub fn centroid(&self) -> Vec3 {
        (self.v0 + self.v1 + self.v2) / 3.0
    }

    /// Bounding box of the three vertices
    pub fn bounds(&self) -> Aabb {
        let mut aabb = Aabb::empty();
        aabb.grow_point(self.v0);
        aabb.grow_point(self.v1);
        aabb.grow_point(self.v2);
        aabb
    }

    /// Whether the triangle has effectively zero area
    pub fn is_degenerate(&self) -> bool {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;
        edge1.cross(&edge2).magnitude_squared() < 1e-12
    }

    /// Möller-Trumbore ray-triangle intersection algorithm
    ///
    /// Returns the distance along the ray if hit, None otherwise.
    /// See: "Fast, Minimum Storage Ray/Triangle Intersection" by
    /// Möller & Trumbore.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        const EPSILON: f32 = 0.000001;

        // Calculate edges from v0
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;

        // Calculate determinant
        let h = ray.direction.cross(&edge2);
        let a = edge1.dot(&h);

        // Ray parallel to triangle?
        if a.abs() < EPSILON {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin - self.v0;
        let u = f * s.dot(&h);

        // Hit outside triangle on u axis?
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&edge1);
        let v = f * ray.direction.dot(&q);

        // Hit outside triangle on v axis?
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        // Distance along ray; behind the origin does not count
        let t = f * edge2.dot(&q);
        if t >= 0.0 {
            Some(t)
        } else {
            None
        }
    }
}
