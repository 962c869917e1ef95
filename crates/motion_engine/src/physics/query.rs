//! Query result types
//!
//! All results here are transient: created inside a single resolver call,
//! consumed by the caller, never persisted across frames.

use crate::foundation::math::Vec3;

/// Result of a downward ground probe
#[derive(Debug, Clone, Copy)]
pub struct GroundContact {
    /// World-space height (Y) of the detected floor
    pub height: f32,
    /// Surface normal of the floor at the contact point
    pub normal: Vec3,
}

/// Result of a movement-check query
#[derive(Debug, Clone, Copy)]
pub struct MovementResolution {
    /// Whether the full desired displacement was free of obstruction
    pub allowed: bool,
    /// The resolved (possibly reduced or slid) displacement
    pub displacement: Vec3,
    /// Final position: start position plus resolved displacement
    pub position: Vec3,
    /// The X axis of the displacement was blocked by geometry
    pub blocked_x: bool,
    /// The Z axis of the displacement was blocked by geometry
    pub blocked_z: bool,
}

impl MovementResolution {
    /// A resolution that leaves the body where it started
    pub fn unchanged(position: Vec3, allowed: bool) -> Self {
        Self {
            allowed,
            displacement: Vec3::zeros(),
            position,
            blocked_x: false,
            blocked_z: false,
        }
    }
}
