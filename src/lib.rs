//! Starshard - simulation core of a wrap-around arcade space shooter
//!
//! Core modules:
//! - `sim`: Deterministic per-tick simulation (entities, physics, collisions, scoring, waves)
//! - `tuning`: Data-driven game balance, overridable from JSON
//! - `persistence`: High-score save/load hook
//! - `highscores`: Top-N leaderboard for finished runs
//! - `error`: Error types for the loading/saving edges

pub mod error;
pub mod highscores;
pub mod persistence;
pub mod sim;
pub mod tuning;

pub use error::{SimError, SimResult};
pub use highscores::HighScores;
pub use tuning::{Preset, Tuning};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Reference frame time (60 Hz)
    pub const FRAME_DT: f32 = 1.0 / 60.0;
    /// Largest step a single tick may integrate (frame hitch guard)
    pub const MAX_DT: f32 = 0.033;

    /// Collision restitution for elastic responses
    pub const RESTITUTION: f32 = 0.8;

    /// Combo decay window in seconds
    pub const COMBO_WINDOW: f32 = 3.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    if !angle.is_finite() {
        return 0.0;
    }
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Signed shortest rotation taking `from` to `to`, in [-π, π)
#[inline]
pub fn shortest_angle_delta(from: f32, to: f32) -> f32 {
    normalize_angle(normalize_angle(to) - normalize_angle(from))
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Heading angle of a vector (radians)
#[inline]
pub fn angle_of(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_normalize_angle() {
        // 3π lands on the ±π seam
        assert!((normalize_angle(3.0 * PI).abs() - PI).abs() < 1e-5);
        assert!((normalize_angle(-PI / 2.0) + PI / 2.0).abs() < 1e-6);
        assert_eq!(normalize_angle(f32::NAN), 0.0);
    }

    #[test]
    fn test_shortest_angle_delta_takes_short_way() {
        // 170° to -170° is +20°, not -340°
        let delta = shortest_angle_delta(170f32.to_radians(), -170f32.to_radians());
        assert!((delta - 20f32.to_radians()).abs() < 1e-4);

        let delta = shortest_angle_delta(-170f32.to_radians(), 170f32.to_radians());
        assert!((delta + 20f32.to_radians()).abs() < 1e-4);
    }
}
