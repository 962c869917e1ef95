//! Math utilities and types
//!
//! Provides the fundamental math types for simulation code. All vectors are
//! `f32`; Y is up throughout the crate.

pub use nalgebra::{Vector2, Vector3};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// Math utility functions
pub mod utils {
    use super::Vec3;

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Blend factor for exponential damping toward a target.
    ///
    /// `lerp(current, target, damp_factor(rate, dt))` converges identically
    /// for any step size: stepping twice with `dt/2` equals stepping once
    /// with `dt`.
    pub fn damp_factor(rate: f32, dt: f32) -> f32 {
        1.0 - (-rate * dt).exp()
    }

    /// Normalize a vector, substituting zero for degenerate input.
    ///
    /// A zero-length or non-finite vector normalizes to NaN, which would
    /// poison every subsequent frame if it reached position state.
    pub fn normalize_or_zero(v: Vec3) -> Vec3 {
        let len_sq = v.magnitude_squared();
        if len_sq > f32::EPSILON && len_sq.is_finite() {
            v / len_sq.sqrt()
        } else {
            Vec3::zeros()
        }
    }

    /// Project a vector onto the horizontal (XZ) plane.
    pub fn horizontal(v: Vec3) -> Vec3 {
        Vec3::new(v.x, 0.0, v.z)
    }

    /// Whether every component of a vector is a finite number.
    pub fn is_finite(v: Vec3) -> bool {
        v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::utils::*;
    use super::Vec3;
    use approx::assert_relative_eq;

    #[test]
    fn damp_factor_is_step_size_independent() {
        // One big step vs two half steps must land on the same value.
        let rate = 8.0;
        let (start, target) = (0.0_f32, 10.0_f32);

        let whole = lerp(start, target, damp_factor(rate, 0.032));

        let half = lerp(start, target, damp_factor(rate, 0.016));
        let half = lerp(half, target, damp_factor(rate, 0.016));

        assert_relative_eq!(whole, half, epsilon = 1e-4);
    }

    #[test]
    fn normalize_or_zero_guards_degenerate_input() {
        assert_eq!(normalize_or_zero(Vec3::zeros()), Vec3::zeros());
        assert_eq!(normalize_or_zero(Vec3::new(f32::NAN, 0.0, 0.0)), Vec3::zeros());

        let n = normalize_or_zero(Vec3::new(3.0, 0.0, 4.0));
        assert_relative_eq!(n.magnitude(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn horizontal_drops_vertical_component() {
        let v = horizontal(Vec3::new(1.0, -9.8, 2.0));
        assert_eq!(v.y, 0.0);
        assert_eq!(v.x, 1.0);
        assert_eq!(v.z, 2.0);
    }
}
