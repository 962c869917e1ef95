//! Movement tuning parameters
//!
//! All values use metric units (meters, seconds) and continuous rates, so
//! behavior is identical for any fixed step size.

use serde::{Deserialize, Serialize};

/// Configuration for player movement physics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    // Body dimensions
    /// Collision radius (meters)
    pub body_radius: f32,

    /// Standing body height (meters)
    pub standing_height: f32,

    /// Crouched body height (meters)
    pub crouch_height: f32,

    /// Eye height above the feet when standing (meters)
    pub eye_height_standing: f32,

    /// Eye height above the feet when fully crouched (meters)
    pub eye_height_crouched: f32,

    // Speeds
    /// Walking speed (meters/second)
    pub walk_speed: f32,

    /// Sprinting speed (meters/second)
    pub sprint_speed: f32,

    /// Crouched movement speed (meters/second)
    pub crouch_speed: f32,

    /// Exponential damping rate toward the target horizontal velocity
    /// (1/second); higher snaps harder
    pub acceleration_rate: f32,

    // Vertical motion
    /// Gravity acceleration (meters/second²)
    pub gravity: f32,

    /// Upward velocity applied on jump (meters/second)
    pub jump_speed: f32,

    /// How far below the feet the ground probe reaches (meters)
    pub ground_probe_distance: f32,

    // Stamina
    /// Stamina capacity
    pub max_stamina: f32,

    /// Stamina drained per second of sprinting
    pub stamina_drain_rate: f32,

    /// Stamina restored per second once regeneration starts
    pub stamina_regen_rate: f32,

    /// Seconds after sprinting stops before regeneration starts; prevents
    /// flicker between drain and regen at the sprint boundary
    pub stamina_regen_delay: f32,

    // Crouch
    /// Exponential blend rate between standing and crouched height
    /// (1/second)
    pub crouch_blend_rate: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            body_radius: 0.4,
            standing_height: 1.8,
            crouch_height: 1.0,
            eye_height_standing: 1.65,
            eye_height_crouched: 0.9,

            walk_speed: 4.5,
            sprint_speed: 7.0,
            crouch_speed: 2.0,
            acceleration_rate: 10.0,

            gravity: 20.0,
            jump_speed: 6.5,
            ground_probe_distance: 0.25,

            max_stamina: 100.0,
            stamina_drain_rate: 20.0,
            stamina_regen_rate: 25.0,
            stamina_regen_delay: 1.0,

            crouch_blend_rate: 8.0,
        }
    }
}
