//! # Motion Engine
//!
//! Real-time first-person character movement and collision resolution for
//! static 3D levels.
//!
//! ## Features
//!
//! - **BVH Spatial Index**: surface-area-heuristic tree over level
//!   triangles with pruned nearest-hit ray queries
//! - **Move-and-Slide Collision**: ray-sampled body occupancy with
//!   axis-decomposition wall sliding
//! - **Kinematic Movement**: gravity, jumping, sprint/stamina, and crouch
//!   blending under a fixed timestep
//! - **Fixed-Timestep Scheduler**: clamped-delta accumulator loop with an
//!   interpolation alpha for smooth rendering
//!
//! ## Quick Start
//!
//! ```rust
//! use motion_engine::prelude::*;
//!
//! // Composition root: geometry -> index -> resolver -> integrator
//! let config = SimConfig::default();
//! let geometry = StaticGeometry::empty(); // supplied by the level loader
//! let index = Bvh::build(geometry, &config.spatial);
//! let resolver = CollisionResolver::with_index(index, config.collision.clone());
//! let mut player = KinematicIntegrator::new(config.movement.clone(), Vec3::zeros());
//!
//! // Once per fixed step, from the scheduler:
//! let intent = InputIntent::idle();
//! player.step(1.0 / 60.0, &intent, Vec3::new(0.0, 0.0, 1.0), &resolver);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod geometry;
pub mod movement;
pub mod physics;
pub mod scheduler;
pub mod spatial;

pub use config::{ConfigError, SimConfig};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{ConfigError, SimConfig},
        foundation::{
            math::{Vec2, Vec3},
            time::Timer,
        },
        geometry::{Aabb, Ray, StaticGeometry, Triangle},
        movement::{InputIntent, IntentButtons, KinematicIntegrator, KinematicState, MovementConfig},
        physics::{CollisionConfig, CollisionResolver, GroundContact, MovementResolution, RayHit},
        scheduler::{
            SchedulerConfig, SchedulerState, SimulationScheduler, StateError, TickSignals,
        },
        spatial::{Bvh, BvhConfig},
    };
}
