//! Kinematic state and per-step input

use bitflags::bitflags;

use crate::foundation::math::{Vec2, Vec3};

bitflags! {
    /// Button state captured in an input snapshot
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct IntentButtons: u8 {
        /// Jump was requested this step
        const JUMP = 1 << 0;
        /// Sprint key is held
        const SPRINT = 1 << 1;
        /// Crouch key is held
        const CROUCH = 1 << 2;
    }
}

/// Immutable per-step input snapshot
///
/// Produced by the input collaborator once per fixed step, consumed by the
/// integrator, and discarded.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputIntent {
    /// Horizontal movement in local space: `x` strafes right, `y` moves
    /// forward. Magnitude is clamped to 1 at construction.
    pub movement: Vec2,

    /// Button state for this step
    pub buttons: IntentButtons,
}

impl InputIntent {
    /// Creates an intent, clamping the movement vector into the unit disk
    /// and zeroing non-finite input
    pub fn new(movement: Vec2, buttons: IntentButtons) -> Self {
        let movement = if movement.x.is_finite() && movement.y.is_finite() {
            let len = movement.magnitude();
            if len > 1.0 {
                movement / len
            } else {
                movement
            }
        } else {
            Vec2::zeros()
        };
        Self { movement, buttons }
    }

    /// An intent with no movement and no buttons
    pub fn idle() -> Self {
        Self::default()
    }

    /// Whether jump was requested
    pub fn jump_requested(&self) -> bool {
        self.buttons.contains(IntentButtons::JUMP)
    }

    /// Whether sprint is held
    pub fn sprint_held(&self) -> bool {
        self.buttons.contains(IntentButtons::SPRINT)
    }

    /// Whether crouch is held
    pub fn crouch_held(&self) -> bool {
        self.buttons.contains(IntentButtons::CROUCH)
    }

    /// Whether there is meaningful movement input
    pub fn is_moving(&self) -> bool {
        self.movement.magnitude_squared() > 1e-4
    }
}

/// The player body's physical state
///
/// Owned by [`crate::movement::KinematicIntegrator`] and mutated only
/// inside its `step`; collaborators read committed values between steps.
#[derive(Debug, Clone, Copy)]
pub struct KinematicState {
    /// Feet position in world space
    pub position: Vec3,

    /// Velocity (meters/second)
    pub velocity: Vec3,

    /// Whether the ground probe found a floor last step
    pub grounded: bool,

    /// Whether sprint was active last step
    pub sprinting: bool,

    /// Stamina remaining, in `[0, max_stamina]`
    pub stamina: f32,

    /// Crouch blend: 0 standing, 1 fully crouched. Drives both the
    /// collision sampling height and the eye offset so the two never
    /// disagree mid-transition.
    pub crouch_fraction: f32,

    /// Seconds since sprint was last active, for the regeneration delay
    pub since_sprint: f32,
}

impl KinematicState {
    /// State at rest at the given position with full stamina
    pub fn at(position: Vec3, max_stamina: f32) -> Self {
        Self {
            position,
            velocity: Vec3::zeros(),
            grounded: false,
            sprinting: false,
            stamina: max_stamina,
            crouch_fraction: 0.0,
            since_sprint: f32::INFINITY,
        }
    }

    /// Current horizontal speed (meters/second)
    pub fn horizontal_speed(&self) -> f32 {
        crate::foundation::math::utils::horizontal(self.velocity).magnitude()
    }
}
