//! Collision resolution against the spatial index
//!
//! The body is approximated by a small set of rays rather than an exact
//! capsule: three sample heights (bottom sphere center, mid, top sphere
//! center), each casting short rays in the six cardinal directions. This
//! trades some tunneling risk at concave corners for far simpler and
//! faster queries than geometric capsule-vs-mesh intersection.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{utils, Vec3};
use crate::geometry::Ray;
use crate::physics::{GroundContact, MovementResolution, RayHit};
use crate::spatial::Bvh;

/// Displacements below this magnitude are treated as no movement at all.
const NEGLIGIBLE_DISPLACEMENT: f32 = 1e-6;

/// Configuration for collision queries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Contact tolerance: surfaces within this distance of the body radius
    /// count as touching, not penetrating. Suppresses jitter from float
    /// noise at resting contact.
    pub skin_width: f32,

    /// How far above the query point the ground probe starts
    pub ground_probe_lift: f32,

    /// Ground height reported while no spatial index is configured, so the
    /// integrator can run before level geometry is ready
    pub fallback_ground_height: f32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            skin_width: 0.03,
            ground_probe_lift: 0.1,
            fallback_ground_height: 0.0,
        }
    }
}

/// Higher-level collision queries over a [`Bvh`]
///
/// Holds the spatial index for the current level, if any. With no index
/// configured the resolver degrades gracefully: occupancy reports free and
/// the ground probe reports a floor at the configured fallback height.
#[derive(Debug, Default)]
pub struct CollisionResolver {
    index: Option<Bvh>,
    config: CollisionConfig,
}

/// Cardinal ray directions cast from each body sample point.
const CARDINAL_DIRECTIONS: [[f32; 3]; 6] = [
    [1.0, 0.0, 0.0],
    [-1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0],
    [0.0, 0.0, -1.0],
    [0.0, 1.0, 0.0],
    [0.0, -1.0, 0.0],
];

impl CollisionResolver {
    /// Creates a resolver with no level geometry yet
    pub fn new(config: CollisionConfig) -> Self {
        Self { index: None, config }
    }

    /// Creates a resolver over an already-built index
    pub fn with_index(index: Bvh, config: CollisionConfig) -> Self {
        Self {
            index: Some(index),
            config,
        }
    }

    /// Install the spatial index for a freshly loaded level
    pub fn set_index(&mut self, index: Bvh) {
        log::debug!("collision resolver received index ({} triangles)", index.triangle_count());
        self.index = Some(index);
    }

    /// Drop the current level's index (level transition)
    pub fn clear_index(&mut self) {
        self.index = None;
    }

    /// The current index, if a level is loaded
    pub fn index(&self) -> Option<&Bvh> {
        self.index.as_ref()
    }

    /// Query configuration
    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    /// Body sample heights above the feet: bottom sphere center, mid, top
    /// sphere center of the approximated capsule.
    fn sample_heights(body_radius: f32, body_height: f32) -> [f32; 3] {
        let bottom = body_radius;
        let top = (body_height - body_radius).max(bottom);
        [bottom, body_height * 0.5, top]
    }

    /// Can a body of the given dimensions occupy `point` (feet position)?
    ///
    /// Returns the nearest blocking contact, or `None` when the position is
    /// free. A surface is blocking only when some ray hits it closer than
    /// `body_radius - skin_width`; anything in the skin band is touching.
    pub fn check_occupancy(
        &self,
        point: Vec3,
        body_radius: f32,
        body_height: f32,
    ) -> Option<RayHit> {
        let index = self.index.as_ref()?;
        if !utils::is_finite(point) {
            return None;
        }

        let blocking_distance = body_radius - self.config.skin_width;
        let mut nearest: Option<RayHit> = None;

        for height in Self::sample_heights(body_radius, body_height) {
            let origin = point + Vec3::new(0.0, height, 0.0);
            for dir in CARDINAL_DIRECTIONS {
                let ray = Ray::new(origin, Vec3::new(dir[0], dir[1], dir[2]));
                if let Some(hit) = index.raycast_nearest(&ray, 0.0, body_radius) {
                    if hit.distance < blocking_distance
                        && nearest.map_or(true, |best| hit.distance < best.distance)
                    {
                        nearest = Some(hit);
                    }
                }
            }
        }

        nearest
    }

    /// Probe straight down for the floor beneath `point` (feet position)
    ///
    /// The ray starts slightly above the feet and reaches `probe_distance`
    /// below them. No hit means airborne. Without an index the probe
    /// reports a floor at the configured fallback height.
    pub fn check_ground(&self, point: Vec3, probe_distance: f32) -> Option<GroundContact> {
        let Some(index) = self.index.as_ref() else {
            return Some(GroundContact {
                height: self.config.fallback_ground_height,
                normal: Vec3::y(),
            });
        };
        if !utils::is_finite(point) {
            return None;
        }

        let origin = point + Vec3::new(0.0, self.config.ground_probe_lift, 0.0);
        let ray = Ray::new(origin, -Vec3::y());
        let reach = self.config.ground_probe_lift + probe_distance;

        index.raycast_nearest(&ray, 0.0, reach).map(|hit| GroundContact {
            height: hit.point.y,
            normal: hit.normal,
        })
    }

    /// Resolve a desired displacement into the largest allowed movement
    ///
    /// The cheap path, where the full target position is free, covers most
    /// frames. Otherwise the horizontal displacement is decomposed into its
    /// axis-aligned components and each is kept only if its single-axis
    /// move is free, letting the body slide along walls it approaches at an
    /// angle. The vertical component is always applied: vertical motion is
    /// governed by gravity and jumping, and floor contact is handled by the
    /// ground probe, not by lateral collision.
    pub fn resolve_movement(
        &self,
        current: Vec3,
        desired: Vec3,
        body_radius: f32,
        body_height: f32,
    ) -> MovementResolution {
        if !utils::is_finite(desired) || !utils::is_finite(current) {
            log::warn!("non-finite movement input rejected: {current:?} + {desired:?}");
            return MovementResolution::unchanged(current, false);
        }

        if desired.magnitude_squared() < NEGLIGIBLE_DISPLACEMENT * NEGLIGIBLE_DISPLACEMENT {
            return MovementResolution::unchanged(current, true);
        }

        let target = current + desired;
        if self.check_occupancy(target, body_radius, body_height).is_none() {
            return MovementResolution {
                allowed: true,
                displacement: desired,
                position: target,
                blocked_x: false,
                blocked_z: false,
            };
        }

        // Axis-decomposition slide. Each horizontal axis contributes its
        // component only if moving along it alone is free. This stops a
        // body dead at a concave corner where both axes are blocked, which
        // a swept test would sometimes let slide; the tradeoff is accepted.
        let mut slide = Vec3::new(0.0, desired.y, 0.0);
        let mut blocked_x = false;
        let mut blocked_z = false;

        if desired.x.abs() >= NEGLIGIBLE_DISPLACEMENT {
            let x_only = current + Vec3::new(desired.x, 0.0, 0.0);
            if self.check_occupancy(x_only, body_radius, body_height).is_none() {
                slide.x = desired.x;
            } else {
                blocked_x = true;
            }
        }

        if desired.z.abs() >= NEGLIGIBLE_DISPLACEMENT {
            let z_only = current + Vec3::new(0.0, 0.0, desired.z);
            if self.check_occupancy(z_only, body_radius, body_height).is_none() {
                slide.z = desired.z;
            } else {
                blocked_z = true;
            }
        }

        MovementResolution {
            allowed: slide.magnitude_squared() >= NEGLIGIBLE_DISPLACEMENT * NEGLIGIBLE_DISPLACEMENT,
            displacement: slide,
            position: current + slide,
            blocked_x,
            blocked_z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{StaticGeometry, Triangle};
    use crate::spatial::BvhConfig;
    use approx::assert_relative_eq;

    const RADIUS: f32 = 0.4;
    const HEIGHT: f32 = 1.8;

    /// Quad helper: two triangles from four corners
    fn quad(a: Vec3, b: Vec3, c: Vec3, d: Vec3) -> [Triangle; 2] {
        [Triangle::new(a, b, c), Triangle::new(a, c, d)]
    }

    /// 40x40 floor at y=0
    fn floor() -> Vec<Triangle> {
        quad(
            Vec3::new(-20.0, 0.0, -20.0),
            Vec3::new(20.0, 0.0, -20.0),
            Vec3::new(20.0, 0.0, 20.0),
            Vec3::new(-20.0, 0.0, 20.0),
        )
        .to_vec()
    }

    /// Wall plane at x = `x`, spanning z in [-10, 10], y in [0, 3]
    fn wall_at_x(x: f32) -> Vec<Triangle> {
        quad(
            Vec3::new(x, 0.0, -10.0),
            Vec3::new(x, 0.0, 10.0),
            Vec3::new(x, 3.0, 10.0),
            Vec3::new(x, 3.0, -10.0),
        )
        .to_vec()
    }

    fn resolver_over(triangles: Vec<Triangle>) -> CollisionResolver {
        let bvh = Bvh::build(StaticGeometry::from_triangles(triangles), &BvhConfig::default());
        CollisionResolver::with_index(bvh, CollisionConfig::default())
    }

    #[test]
    fn open_space_is_unoccupied() {
        let resolver = resolver_over(floor());
        assert!(resolver
            .check_occupancy(Vec3::new(0.0, 0.0, 0.0), RADIUS, HEIGHT)
            .is_none());
    }

    #[test]
    fn standing_on_the_floor_is_touching_not_penetrating() {
        // The bottom sample sits one radius above the feet, so the floor is
        // exactly at blocking range and must land in the skin band.
        let resolver = resolver_over(floor());
        assert!(resolver.check_occupancy(Vec3::zeros(), RADIUS, HEIGHT).is_none());
    }

    #[test]
    fn point_against_a_wall_is_occupied() {
        let resolver = resolver_over(wall_at_x(1.0));
        let contact = resolver
            .check_occupancy(Vec3::new(0.9, 0.0, 0.0), RADIUS, HEIGHT)
            .expect("wall within body radius should block");
        assert!(contact.distance < RADIUS);
        assert!(contact.normal.x < -0.99, "contact normal should face the body");
    }

    #[test]
    fn ground_probe_finds_floor_height() {
        let resolver = resolver_over(floor());
        let ground = resolver.check_ground(Vec3::new(3.0, 0.1, -2.0), 0.25).unwrap();
        assert_relative_eq!(ground.height, 0.0, epsilon = 1e-4);
        assert!(ground.normal.y > 0.99);
    }

    #[test]
    fn ground_probe_reports_airborne_when_floor_is_out_of_reach() {
        let resolver = resolver_over(floor());
        assert!(resolver.check_ground(Vec3::new(0.0, 5.0, 0.0), 0.25).is_none());
    }

    #[test]
    fn missing_index_degrades_to_safe_defaults() {
        let resolver = CollisionResolver::new(CollisionConfig::default());

        assert!(resolver.check_occupancy(Vec3::zeros(), RADIUS, HEIGHT).is_none());
        let ground = resolver.check_ground(Vec3::new(0.0, 100.0, 0.0), 0.25).unwrap();
        assert_eq!(ground.height, 0.0);

        let res = resolver.resolve_movement(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0), RADIUS, HEIGHT);
        assert!(res.allowed);
        assert_eq!(res.position, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn empty_geometry_is_a_free_fall_scene() {
        // Distinct from the missing-index case: an index exists but holds
        // nothing, so there is no floor anywhere.
        let resolver = resolver_over(Vec::new());
        assert!(resolver.check_occupancy(Vec3::zeros(), RADIUS, HEIGHT).is_none());
        assert!(resolver.check_ground(Vec3::zeros(), 0.25).is_none());
    }

    #[test]
    fn unobstructed_movement_takes_the_cheap_path() {
        let resolver = resolver_over(floor());
        let desired = Vec3::new(0.5, 0.0, -0.5);
        let res = resolver.resolve_movement(Vec3::zeros(), desired, RADIUS, HEIGHT);

        assert!(res.allowed);
        assert_eq!(res.displacement, desired);
        assert!(!res.blocked_x && !res.blocked_z);
    }

    #[test]
    fn negligible_movement_is_allowed_unchanged() {
        let resolver = resolver_over(floor());
        let res = resolver.resolve_movement(Vec3::zeros(), Vec3::new(1e-9, 0.0, 0.0), RADIUS, HEIGHT);
        assert!(res.allowed);
        assert_eq!(res.position, Vec3::zeros());
    }

    #[test]
    fn diagonal_into_wall_slides_along_free_axis() {
        // Wall blocks +X only; diagonal intent must keep its Z component
        // and drop X entirely.
        let resolver = resolver_over(wall_at_x(1.0));
        let start = Vec3::new(0.6, 0.0, 0.0);
        let res = resolver.resolve_movement(start, Vec3::new(0.1, 0.0, 0.1), RADIUS, HEIGHT);

        assert!(!res.allowed || res.displacement.x == 0.0);
        assert!(res.blocked_x);
        assert!(!res.blocked_z);
        assert_relative_eq!(res.displacement.x, 0.0);
        assert_relative_eq!(res.displacement.z, 0.1, epsilon = 1e-6);
        assert_relative_eq!(res.position.z, 0.1, epsilon = 1e-6);
    }

    #[test]
    fn concave_corner_blocks_both_axes() {
        let mut triangles = wall_at_x(1.0);
        // Matching wall at z = 1, spanning x
        triangles.extend(quad(
            Vec3::new(-10.0, 0.0, 1.0),
            Vec3::new(-10.0, 3.0, 1.0),
            Vec3::new(10.0, 3.0, 1.0),
            Vec3::new(10.0, 0.0, 1.0),
        ));
        let resolver = resolver_over(triangles);

        let start = Vec3::new(0.6, 0.0, 0.6);
        let res = resolver.resolve_movement(start, Vec3::new(0.1, 0.0, 0.1), RADIUS, HEIGHT);

        assert!(!res.allowed);
        assert!(res.blocked_x && res.blocked_z);
        assert_eq!(res.position, start);
    }

    #[test]
    fn vertical_component_survives_a_blocked_wall() {
        let resolver = resolver_over(wall_at_x(1.0));
        let start = Vec3::new(0.6, 0.5, 0.0);
        let res = resolver.resolve_movement(start, Vec3::new(0.1, -0.2, 0.0), RADIUS, HEIGHT);

        assert!(res.blocked_x);
        assert_relative_eq!(res.displacement.y, -0.2, epsilon = 1e-6);
        assert_relative_eq!(res.position.y, 0.3, epsilon = 1e-6);
    }

    #[test]
    fn non_finite_input_never_reaches_position_state() {
        let resolver = resolver_over(floor());
        let res = resolver.resolve_movement(
            Vec3::zeros(),
            Vec3::new(f32::NAN, 0.0, 0.0),
            RADIUS,
            HEIGHT,
        );
        assert!(!res.allowed);
        assert_eq!(res.position, Vec3::zeros());
    }
}
