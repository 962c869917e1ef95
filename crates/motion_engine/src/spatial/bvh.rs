//! Bounding volume hierarchy over static triangle geometry
//!
//! Binary tree of AABBs built with a binned surface-area-heuristic split.
//! Each triangle lives in exactly one leaf; the tree is rebuilt wholesale
//! on level transition, never incrementally.

use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;
use crate::geometry::{Aabb, Ray, StaticGeometry};

/// Configuration for BVH construction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BvhConfig {
    /// Maximum triangles per leaf before a split is attempted
    pub max_leaf_triangles: usize,

    /// Number of candidate split planes evaluated per axis
    pub sah_bins: usize,
}

impl Default for BvhConfig {
    fn default() -> Self {
        Self {
            max_leaf_triangles: 8,
            sah_bins: 8,
        }
    }
}

/// Result of a nearest-intersection query
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    /// The distance from the ray origin to the hit point
    pub distance: f32,
    /// The point of intersection in world space
    pub point: Vec3,
    /// The surface normal at the intersection point, facing the ray origin
    pub normal: Vec3,
}

/// Single node in the hierarchy
#[derive(Debug, Clone)]
enum BvhNode {
    Leaf {
        bounds: Aabb,
        /// Indices into the owned geometry's triangle list
        triangles: Vec<u32>,
    },
    Internal {
        bounds: Aabb,
        left: Box<BvhNode>,
        right: Box<BvhNode>,
    },
}

impl BvhNode {
    fn bounds(&self) -> &Aabb {
        match self {
            Self::Leaf { bounds, .. } | Self::Internal { bounds, .. } => bounds,
        }
    }
}

/// Bounding volume hierarchy over one level's static geometry
///
/// Owns the [`StaticGeometry`] it indexes. An index built from empty
/// geometry is valid; every query on it reports no-hit.
#[derive(Debug, Clone)]
pub struct Bvh {
    geometry: StaticGeometry,
    root: Option<Box<BvhNode>>,
}

impl Default for Bvh {
    fn default() -> Self {
        Self::empty()
    }
}

impl Bvh {
    /// An index with no geometry (a void or test scene)
    pub fn empty() -> Self {
        Self {
            geometry: StaticGeometry::empty(),
            root: None,
        }
    }

    /// Build the hierarchy over the given geometry
    ///
    /// O(n log n) in triangle count; expected once per level load, never
    /// per frame.
    pub fn build(geometry: StaticGeometry, config: &BvhConfig) -> Self {
        if geometry.is_empty() {
            log::info!("spatial index built over empty geometry");
            return Self::empty();
        }

        let indices: Vec<u32> = (0..geometry.len() as u32).collect();
        let root = Self::build_recursive(&geometry, indices, config);

        let bvh = Self {
            geometry,
            root: Some(Box::new(root)),
        };
        log::info!(
            "spatial index built: {} triangles, {} nodes, depth {}",
            bvh.triangle_count(),
            bvh.node_count(),
            bvh.max_depth()
        );
        bvh
    }

    fn build_recursive(geometry: &StaticGeometry, indices: Vec<u32>, config: &BvhConfig) -> BvhNode {
        let bounds = Self::bounds_of(geometry, &indices);

        if indices.len() <= config.max_leaf_triangles.max(1) {
            return BvhNode::Leaf { bounds, triangles: indices };
        }

        let (left_indices, right_indices) = Self::split(geometry, indices, config);

        // All candidate planes put every triangle on one side (coincident
        // centroids); a flat leaf is the only correct shape here.
        if left_indices.is_empty() || right_indices.is_empty() {
            let indices = if left_indices.is_empty() { right_indices } else { left_indices };
            return BvhNode::Leaf { bounds, triangles: indices };
        }

        let left = Self::build_recursive(geometry, left_indices, config);
        let right = Self::build_recursive(geometry, right_indices, config);

        BvhNode::Internal {
            bounds,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Partition triangle indices by the cheapest surface-area-heuristic
    /// plane, falling back to a centroid-median split along the longest
    /// axis when no plane beats leaving the node unsplit.
    fn split(
        geometry: &StaticGeometry,
        mut indices: Vec<u32>,
        config: &BvhConfig,
    ) -> (Vec<u32>, Vec<u32>) {
        // Bounds of the triangle centroids; the split planes sweep these
        let mut centroid_bounds = Aabb::empty();
        for &i in &indices {
            centroid_bounds.grow_point(geometry.triangles()[i as usize].centroid());
        }

        let extent = centroid_bounds.max - centroid_bounds.min;

        let mut best: Option<(usize, f32, f32)> = None; // (axis, plane, cost)

        for axis in 0..3 {
            if extent[axis] <= f32::EPSILON {
                continue;
            }
            for bin in 1..config.sah_bins.max(2) {
                let t = bin as f32 / config.sah_bins as f32;
                let plane = centroid_bounds.min[axis] + t * extent[axis];

                let cost = Self::sah_cost(geometry, &indices, axis, plane);
                if best.map_or(true, |(_, _, c)| cost < c) {
                    best = Some((axis, plane, cost));
                }
            }
        }

        if let Some((axis, plane, _)) = best {
            let (left, right): (Vec<u32>, Vec<u32>) = indices
                .iter()
                .copied()
                .partition(|&i| geometry.triangles()[i as usize].centroid()[axis] < plane);
            if !left.is_empty() && !right.is_empty() {
                return (left, right);
            }
        }

        // Median fallback along the longest centroid axis
        let axis = if extent.x >= extent.y && extent.x >= extent.z {
            0
        } else if extent.y >= extent.z {
            1
        } else {
            2
        };
        indices.sort_by(|&a, &b| {
            let ca = geometry.triangles()[a as usize].centroid()[axis];
            let cb = geometry.triangles()[b as usize].centroid()[axis];
            ca.partial_cmp(&cb).unwrap_or(std::cmp::Ordering::Equal)
        });
        let mid = indices.len() / 2;
        let right = indices.split_off(mid);
        (indices, right)
    }

    /// Surface-area cost of splitting at `plane`: SA(L)·|L| + SA(R)·|R|
    fn sah_cost(geometry: &StaticGeometry, indices: &[u32], axis: usize, plane: f32) -> f32 {
        let mut left_bounds = Aabb::empty();
        let mut right_bounds = Aabb::empty();
        let mut left_count = 0u32;
        let mut right_count = 0u32;

        for &i in indices {
            let tri = &geometry.triangles()[i as usize];
            if tri.centroid()[axis] < plane {
                left_bounds.grow(&tri.bounds());
                left_count += 1;
            } else {
                right_bounds.grow(&tri.bounds());
                right_count += 1;
            }
        }

        if left_count == 0 || right_count == 0 {
            return f32::INFINITY;
        }

        left_bounds.surface_area() * left_count as f32
            + right_bounds.surface_area() * right_count as f32
    }

    fn bounds_of(geometry: &StaticGeometry, indices: &[u32]) -> Aabb {
        let mut bounds = Aabb::empty();
        for &i in indices {
            bounds.grow(&geometry.triangles()[i as usize].bounds());
        }
        bounds
    }

    /// Find the closest intersection along the ray within `[t_min, t_max]`
    ///
    /// Children are visited near-first and subtrees whose entry distance
    /// exceeds the best hit so far are pruned without descending.
    pub fn raycast_nearest(&self, ray: &Ray, t_min: f32, t_max: f32) -> Option<RayHit> {
        let mut best: Option<RayHit> = None;
        if let Some(root) = &self.root {
            self.raycast_node(root, ray, t_min, t_max, &mut best);
        }
        best
    }

    /// First-hit-only mode: report whether anything intersects in range
    ///
    /// Stops descending as soon as any triangle hit is accepted, which is
    /// cheaper than a full nearest query when only blocked/clear matters.
    pub fn raycast_any(&self, ray: &Ray, t_min: f32, t_max: f32) -> bool {
        self.root
            .as_ref()
            .is_some_and(|root| self.any_hit_node(root, ray, t_min, t_max))
    }

    fn raycast_node(
        &self,
        node: &BvhNode,
        ray: &Ray,
        t_min: f32,
        t_max: f32,
        best: &mut Option<RayHit>,
    ) {
        let limit = best.map_or(t_max, |hit| hit.distance.min(t_max));
        if node.bounds().intersect_ray(ray, t_min, limit).is_none() {
            return;
        }

        match node {
            BvhNode::Leaf { triangles, .. } => {
                for &i in triangles {
                    let tri = &self.geometry.triangles()[i as usize];
                    if let Some(t) = tri.intersect_ray(ray) {
                        let limit = best.map_or(t_max, |hit| hit.distance.min(t_max));
                        if t >= t_min && t <= limit {
                            let mut normal = tri.normal();
                            // Report the face toward the ray origin so callers
                            // can push away from the surface regardless of
                            // triangle winding.
                            if normal.dot(&ray.direction) > 0.0 {
                                normal = -normal;
                            }
                            *best = Some(RayHit {
                                distance: t,
                                point: ray.point_at(t),
                                normal,
                            });
                        }
                    }
                }
            }
            BvhNode::Internal { left, right, .. } => {
                let d_left = left.bounds().intersect_ray(ray, t_min, limit);
                let d_right = right.bounds().intersect_ray(ray, t_min, limit);

                let (first, second) = match (d_left, d_right) {
                    (Some(a), Some(b)) if b < a => (right, left),
                    _ => (left, right),
                };
                self.raycast_node(first, ray, t_min, t_max, best);
                self.raycast_node(second, ray, t_min, t_max, best);
            }
        }
    }

    fn any_hit_node(&self, node: &BvhNode, ray: &Ray, t_min: f32, t_max: f32) -> bool {
        if node.bounds().intersect_ray(ray, t_min, t_max).is_none() {
            return false;
        }

        match node {
            BvhNode::Leaf { triangles, .. } => triangles.iter().any(|&i| {
                self.geometry.triangles()[i as usize]
                    .intersect_ray(ray)
                    .is_some_and(|t| t >= t_min && t <= t_max)
            }),
            BvhNode::Internal { left, right, .. } => {
                self.any_hit_node(left, ray, t_min, t_max)
                    || self.any_hit_node(right, ray, t_min, t_max)
            }
        }
    }

    /// The geometry this index was built over
    pub fn geometry(&self) -> &StaticGeometry {
        &self.geometry
    }

    /// Number of indexed triangles
    pub fn triangle_count(&self) -> usize {
        self.geometry.len()
    }

    /// Total node count (for the debug HUD)
    pub fn node_count(&self) -> usize {
        fn count(node: &BvhNode) -> usize {
            match node {
                BvhNode::Leaf { .. } => 1,
                BvhNode::Internal { left, right, .. } => 1 + count(left) + count(right),
            }
        }
        self.root.as_ref().map_or(0, |root| count(root))
    }

    /// Deepest leaf depth, root at depth 0 (for the debug HUD)
    pub fn max_depth(&self) -> usize {
        fn depth(node: &BvhNode) -> usize {
            match node {
                BvhNode::Leaf { .. } => 0,
                BvhNode::Internal { left, right, .. } => 1 + depth(left).max(depth(right)),
            }
        }
        self.root.as_ref().map_or(0, |root| depth(root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Triangle;
    use approx::assert_relative_eq;

    /// A 20x20 floor at the given height, two triangles
    fn floor_at(y: f32) -> Vec<Triangle> {
        vec![
            Triangle::new(
                Vec3::new(-10.0, y, -10.0),
                Vec3::new(10.0, y, -10.0),
                Vec3::new(10.0, y, 10.0),
            ),
            Triangle::new(
                Vec3::new(-10.0, y, -10.0),
                Vec3::new(10.0, y, 10.0),
                Vec3::new(-10.0, y, 10.0),
            ),
        ]
    }

    fn build(triangles: Vec<Triangle>) -> Bvh {
        Bvh::build(StaticGeometry::from_triangles(triangles), &BvhConfig::default())
    }

    fn down_ray(origin: Vec3) -> Ray {
        Ray::new(origin, Vec3::new(0.0, -1.0, 0.0))
    }

    #[test]
    fn empty_index_reports_no_hit() {
        let bvh = Bvh::build(StaticGeometry::empty(), &BvhConfig::default());
        let ray = down_ray(Vec3::new(0.0, 5.0, 0.0));
        assert!(bvh.raycast_nearest(&ray, 0.0, 100.0).is_none());
        assert!(!bvh.raycast_any(&ray, 0.0, 100.0));
    }

    #[test]
    fn nearest_hit_on_single_floor() {
        let bvh = build(floor_at(0.0));
        let hit = bvh.raycast_nearest(&down_ray(Vec3::new(0.0, 5.0, 0.0)), 0.0, 100.0).unwrap();

        assert_relative_eq!(hit.distance, 5.0, epsilon = 1e-4);
        assert_relative_eq!(hit.point.y, 0.0, epsilon = 1e-4);
        assert!(hit.normal.y > 0.99, "floor normal should face the ray origin");
    }

    #[test]
    fn nearest_picks_closer_of_stacked_floors() {
        let mut triangles = floor_at(0.0);
        triangles.extend(floor_at(3.0));
        let bvh = build(triangles);

        let hit = bvh.raycast_nearest(&down_ray(Vec3::new(0.0, 5.0, 0.0)), 0.0, 100.0).unwrap();
        assert_relative_eq!(hit.point.y, 3.0, epsilon = 1e-4);
    }

    #[test]
    fn range_limits_are_honored() {
        let bvh = build(floor_at(0.0));
        let ray = down_ray(Vec3::new(0.0, 5.0, 0.0));

        assert!(bvh.raycast_nearest(&ray, 0.0, 4.0).is_none(), "hit beyond t_max");
        assert!(bvh.raycast_nearest(&ray, 6.0, 100.0).is_none(), "hit before t_min");
        assert!(!bvh.raycast_any(&ray, 0.0, 4.0));
        assert!(bvh.raycast_any(&ray, 0.0, 6.0));
    }

    #[test]
    fn traversal_matches_brute_force_on_a_grid() {
        // A field of small floor tiles at varying heights; the accelerated
        // query must agree with a linear scan for a batch of rays.
        let mut triangles = Vec::new();
        for gx in -5i32..5 {
            for gz in -5i32..5 {
                let x = gx as f32;
                let z = gz as f32;
                let y = ((gx + gz) as f32 * 0.1).sin();
                triangles.push(Triangle::new(
                    Vec3::new(x, y, z),
                    Vec3::new(x + 1.0, y, z),
                    Vec3::new(x + 1.0, y, z + 1.0),
                ));
            }
        }
        let geometry = StaticGeometry::from_triangles(triangles.clone());
        let bvh = Bvh::build(geometry, &BvhConfig::default());

        for sx in -4i32..4 {
            for sz in -4i32..4 {
                let ray = down_ray(Vec3::new(sx as f32 + 0.75, 10.0, sz as f32 + 0.25));

                let brute = triangles
                    .iter()
                    .filter_map(|t| t.intersect_ray(&ray))
                    .fold(f32::INFINITY, f32::min);
                let fast = bvh.raycast_nearest(&ray, 0.0, 100.0);

                match fast {
                    Some(hit) => assert_relative_eq!(hit.distance, brute, epsilon = 1e-4),
                    None => assert_eq!(brute, f32::INFINITY),
                }
            }
        }
    }

    #[test]
    fn every_triangle_lands_in_exactly_one_leaf() {
        let mut triangles = floor_at(0.0);
        for i in 0..40 {
            let x = i as f32;
            triangles.push(Triangle::new(
                Vec3::new(x, 1.0, 0.0),
                Vec3::new(x + 0.5, 1.0, 0.0),
                Vec3::new(x, 1.0, 0.5),
            ));
        }
        let n = triangles.len();
        let bvh = build(triangles);

        fn collect(node: &BvhNode, out: &mut Vec<u32>) {
            match node {
                BvhNode::Leaf { triangles, .. } => out.extend_from_slice(triangles),
                BvhNode::Internal { left, right, .. } => {
                    collect(left, out);
                    collect(right, out);
                }
            }
        }
        let mut seen = Vec::new();
        collect(bvh.root.as_ref().unwrap(), &mut seen);
        seen.sort_unstable();

        assert_eq!(seen.len(), n);
        seen.dedup();
        assert_eq!(seen.len(), n, "a triangle appeared in more than one leaf");
    }

    #[test]
    fn coincident_triangles_build_a_flat_leaf() {
        // 40 identical triangles cannot be partitioned; build must still
        // terminate and answer queries.
        let tri = Triangle::new(
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(0.0, 0.0, 1.0),
        );
        let bvh = build(vec![tri; 40]);
        assert!(bvh.raycast_any(&down_ray(Vec3::new(0.0, 5.0, 0.0)), 0.0, 100.0));
    }
}
