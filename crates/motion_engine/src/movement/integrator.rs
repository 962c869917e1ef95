//! Fixed-step kinematic integration
//!
//! Advances the player body deterministically: input intent becomes a
//! target horizontal velocity, damping and gravity shape the velocity, the
//! collision resolver grants the largest allowed displacement, and the
//! ground probe settles the result. All time-dependent terms are continuous
//! rates multiplied by the step size.

use crate::foundation::math::{
    utils::{self, damp_factor, lerp},
    Vec3,
};
use crate::movement::{InputIntent, KinematicState, MovementConfig};
use crate::physics::CollisionResolver;

/// How far below a spawn point the ground is searched for
const SPAWN_PROBE_DISTANCE: f32 = 2.0;

/// Owns and advances the player's kinematic state
pub struct KinematicIntegrator {
    config: MovementConfig,
    state: KinematicState,
}

impl KinematicIntegrator {
    /// Creates an integrator at rest at the given feet position
    pub fn new(config: MovementConfig, position: Vec3) -> Self {
        let state = KinematicState::at(position, config.max_stamina);
        Self { config, state }
    }

    /// Advance the body by one fixed step
    ///
    /// `look_direction` is the camera's forward vector; only its horizontal
    /// projection steers movement. Degenerate look directions (straight
    /// down, zero, NaN) steer nothing but never poison the state.
    pub fn step(
        &mut self,
        dt: f32,
        intent: &InputIntent,
        look_direction: Vec3,
        resolver: &CollisionResolver,
    ) {
        if dt <= 0.0 || !dt.is_finite() {
            return;
        }

        self.update_crouch(dt, intent, resolver);
        let sprinting = self.update_stamina(dt, intent);
        self.update_horizontal_velocity(dt, intent, look_direction, sprinting);
        self.update_vertical_velocity(dt, intent);
        self.apply_movement(dt, resolver);
        self.settle_on_ground(resolver);
    }

    fn update_crouch(&mut self, dt: f32, intent: &InputIntent, resolver: &CollisionResolver) {
        let mut target = if intent.crouch_held() { 1.0 } else { 0.0 };

        // Standing back up needs head clearance at full height; without it
        // the body stays crouched under the obstacle.
        if target == 0.0 && self.state.crouch_fraction > 0.01 {
            let clear = resolver
                .check_occupancy(
                    self.state.position,
                    self.config.body_radius,
                    self.config.standing_height,
                )
                .is_none();
            if !clear {
                target = 1.0;
            }
        }

        self.state.crouch_fraction = lerp(
            self.state.crouch_fraction,
            target,
            damp_factor(self.config.crouch_blend_rate, dt),
        );
    }

    fn update_stamina(&mut self, dt: f32, intent: &InputIntent) -> bool {
        let sprinting = intent.sprint_held()
            && !intent.crouch_held()
            && intent.is_moving()
            && self.state.stamina > 0.0;

        if sprinting {
            self.state.stamina =
                (self.state.stamina - self.config.stamina_drain_rate * dt).max(0.0);
            self.state.since_sprint = 0.0;
        } else {
            self.state.since_sprint += dt;
            if self.state.since_sprint >= self.config.stamina_regen_delay {
                self.state.stamina = (self.state.stamina
                    + self.config.stamina_regen_rate * dt)
                    .min(self.config.max_stamina);
            }
        }

        self.state.sprinting = sprinting;
        sprinting
    }

    fn update_horizontal_velocity(
        &mut self,
        dt: f32,
        intent: &InputIntent,
        look_direction: Vec3,
        sprinting: bool,
    ) {
        let forward = utils::normalize_or_zero(utils::horizontal(look_direction));
        let right = forward.cross(&Vec3::y());

        let speed = if sprinting {
            self.config.sprint_speed
        } else if intent.crouch_held() {
            self.config.crouch_speed
        } else {
            self.config.walk_speed
        };

        let wish = (forward * intent.movement.y + right * intent.movement.x) * speed;

        let factor = damp_factor(self.config.acceleration_rate, dt);
        self.state.velocity.x = lerp(self.state.velocity.x, wish.x, factor);
        self.state.velocity.z = lerp(self.state.velocity.z, wish.z, factor);
    }

    fn update_vertical_velocity(&mut self, dt: f32, intent: &InputIntent) {
        if intent.jump_requested() && self.state.grounded {
            self.state.velocity.y = self.config.jump_speed;
            self.state.grounded = false;
        } else if !self.state.grounded {
            self.state.velocity.y -= self.config.gravity * dt;
        }
    }

    fn apply_movement(&mut self, dt: f32, resolver: &CollisionResolver) {
        let desired = self.state.velocity * dt;
        let resolution = resolver.resolve_movement(
            self.state.position,
            desired,
            self.config.body_radius,
            self.current_height(),
        );

        self.state.position = resolution.position;

        // A wall the body is pressed against must not accumulate velocity;
        // otherwise releasing the key fires the stored speed sideways.
        if resolution.blocked_x {
            self.state.velocity.x = 0.0;
        }
        if resolution.blocked_z {
            self.state.velocity.z = 0.0;
        }
    }

    fn settle_on_ground(&mut self, resolver: &CollisionResolver) {
        // While ascending (jump impulse just applied) the probe is skipped
        // so the same step cannot re-ground the body.
        if self.state.velocity.y > 0.0 {
            self.state.grounded = false;
            return;
        }

        match resolver.check_ground(self.state.position, self.config.ground_probe_distance) {
            Some(ground) => {
                self.state.grounded = true;
                self.state.position.y = ground.height;
                self.state.velocity.y = 0.0;
            }
            None => self.state.grounded = false,
        }
    }

    /// Immediately reposition the body, zeroing velocity
    ///
    /// Bypasses collision resolution; the destination is assumed valid
    /// (authored by level data). The next step runs a fresh ground check.
    pub fn teleport(&mut self, position: Vec3) {
        log::debug!("teleport to {position:?}");
        self.state.position = position;
        self.state.velocity = Vec3::zeros();
        self.state.grounded = false;
    }

    /// Place the body at a spawn point and settle it onto the floor below
    ///
    /// Spawn points are authored at-or-slightly-above the floor; the
    /// downward search keeps the first rendered frame from showing a
    /// one-step fall.
    pub fn spawn(&mut self, position: Vec3, resolver: &CollisionResolver) {
        self.teleport(position);
        if let Some(ground) = resolver.check_ground(position, SPAWN_PROBE_DISTANCE) {
            self.state.position.y = ground.height;
            self.state.grounded = true;
        }
    }

    /// Committed state from the last step
    pub fn state(&self) -> &KinematicState {
        &self.state
    }

    /// Feet position in world space
    pub fn position(&self) -> Vec3 {
        self.state.position
    }

    /// Current velocity
    pub fn velocity(&self) -> Vec3 {
        self.state.velocity
    }

    /// Camera position: feet plus the crouch-blended eye height
    pub fn eye_position(&self) -> Vec3 {
        let eye = lerp(
            self.config.eye_height_standing,
            self.config.eye_height_crouched,
            self.state.crouch_fraction,
        );
        self.state.position + Vec3::new(0.0, eye, 0.0)
    }

    /// Crouch-blended body height used for collision sampling
    pub fn current_height(&self) -> f32 {
        lerp(
            self.config.standing_height,
            self.config.crouch_height,
            self.state.crouch_fraction,
        )
    }

    /// Whether the ground probe found a floor last step
    pub fn grounded(&self) -> bool {
        self.state.grounded
    }

    /// Whether sprint was active last step
    pub fn sprinting(&self) -> bool {
        self.state.sprinting
    }

    /// Stamina remaining
    pub fn stamina(&self) -> f32 {
        self.state.stamina
    }

    /// Movement tuning in effect
    pub fn config(&self) -> &MovementConfig {
        &self.config
    }
}
