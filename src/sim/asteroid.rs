//! Asteroids and splitting

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entity::{Body, Entity, EntityKind};
use super::physics::WorldBounds;
use crate::normalize_angle;
use crate::tuning::{AsteroidTuning, Tuning};

/// Asteroid size class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AsteroidSize {
    Large,
    Medium,
    Small,
}

impl AsteroidSize {
    pub const ALL: [AsteroidSize; 3] = [AsteroidSize::Large, AsteroidSize::Medium, AsteroidSize::Small];

    pub fn as_str(&self) -> &'static str {
        match self {
            AsteroidSize::Large => "large",
            AsteroidSize::Medium => "medium",
            AsteroidSize::Small => "small",
        }
    }
}

/// An asteroid
#[derive(Debug, Clone)]
pub struct Asteroid {
    pub body: Body,
    pub size: AsteroidSize,
    /// Size of the pieces produced on destruction
    pub split_size: Option<AsteroidSize>,
    /// Number of pieces produced on destruction
    pub split_count: u8,
    /// Angular velocity (radians/second)
    pub spin: f32,
}

impl Default for Asteroid {
    fn default() -> Self {
        Self {
            body: Body::new(1.0),
            size: AsteroidSize::Large,
            split_size: None,
            split_count: 0,
            spin: 0.0,
        }
    }
}

/// Spawn arguments for [`Asteroid`]
#[derive(Debug, Clone, Copy)]
pub struct AsteroidSpawn {
    pub size: AsteroidSize,
    pub position: Vec2,
    pub velocity: Vec2,
    pub spin: f32,
}

impl Asteroid {
    pub(crate) fn init(&mut self, args: AsteroidSpawn, tuning: &Tuning) {
        let size = tuning.asteroids.size(args.size);
        self.body.radius = size.radius;
        self.body.position = args.position;
        self.body.velocity = args.velocity;
        self.size = args.size;
        self.split_size = size.split_size;
        self.split_count = if size.split_size.is_some() { size.split_count } else { 0 };
        self.spin = args.spin;
    }

    pub fn update(&mut self, dt: f32, bounds: WorldBounds) {
        self.body.rotation = normalize_angle(self.body.rotation + self.spin * dt);
        self.body.advance(dt, bounds);
    }

    /// Spawn arguments for the pieces this asteroid breaks into.
    ///
    /// Each piece gets a random heading, speed
    /// `base_speed(split_size) * split_speed_factor * U(0.8, 1.2)` and a small
    /// positional jitter so pieces do not start perfectly stacked.
    pub fn split_pieces(&self, rng: &mut impl Rng, tuning: &AsteroidTuning) -> Vec<AsteroidSpawn> {
        let Some(split_size) = self.split_size else {
            return Vec::new();
        };
        let base_speed = tuning.size(split_size).base_speed;
        let jitter = tuning.split_jitter;

        (0..self.split_count)
            .map(|_| {
                let angle = rng.random_range(0.0..std::f32::consts::TAU);
                let speed = base_speed * tuning.split_speed_factor * rng.random_range(0.8..=1.2);
                let offset = if jitter > 0.0 {
                    Vec2::new(rng.random_range(-jitter..=jitter), rng.random_range(-jitter..=jitter))
                } else {
                    Vec2::ZERO
                };
                AsteroidSpawn {
                    size: split_size,
                    position: self.body.position + offset,
                    velocity: Vec2::from_angle(angle) * speed,
                    spin: random_spin(rng, tuning.max_spin),
                }
            })
            .collect()
    }
}

/// Uniform spin in [-max, max]
pub fn random_spin(rng: &mut impl Rng, max_spin: f32) -> f32 {
    if max_spin > 0.0 {
        rng.random_range(-max_spin..=max_spin)
    } else {
        0.0
    }
}

impl Entity for Asteroid {
    const KIND: EntityKind = EntityKind::Asteroid;

    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn reset(&mut self) {
        let radius = self.body.radius;
        *self = Self::default();
        self.body.radius = radius;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn asteroid(size: AsteroidSize, tuning: &Tuning) -> Asteroid {
        let mut a = Asteroid::default();
        a.init(
            AsteroidSpawn {
                size,
                position: Vec2::new(100.0, 50.0),
                velocity: Vec2::ZERO,
                spin: 0.0,
            },
            tuning,
        );
        a
    }

    #[test]
    fn test_init_uses_size_table() {
        let tuning = Tuning::default();
        let large = asteroid(AsteroidSize::Large, &tuning);
        assert_eq!(large.body.radius, 40.0);
        assert_eq!(large.split_count, 2);
        assert_eq!(large.split_size, Some(AsteroidSize::Medium));

        let small = asteroid(AsteroidSize::Small, &tuning);
        assert_eq!(small.split_count, 0);
        assert_eq!(small.split_size, None);
    }

    #[test]
    fn test_split_pieces() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(7);
        let large = asteroid(AsteroidSize::Large, &tuning);
        let pieces = large.split_pieces(&mut rng, &tuning.asteroids);
        assert_eq!(pieces.len(), 2);

        let base = tuning.asteroids.medium.base_speed * 1.2;
        for piece in &pieces {
            assert_eq!(piece.size, AsteroidSize::Medium);
            let speed = piece.velocity.length();
            assert!(speed >= base * 0.8 - 1e-3 && speed <= base * 1.2 + 1e-3);
            let offset = piece.position - large.body.position;
            assert!(offset.x.abs() <= 1.0 && offset.y.abs() <= 1.0);
        }
    }

    #[test]
    fn test_small_does_not_split() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(7);
        let small = asteroid(AsteroidSize::Small, &tuning);
        assert!(small.split_pieces(&mut rng, &tuning.asteroids).is_empty());
    }

    #[test]
    fn test_update_spins_and_moves() {
        let tuning = Tuning::default();
        let mut a = asteroid(AsteroidSize::Medium, &tuning);
        a.body.velocity = Vec2::new(10.0, 0.0);
        a.spin = 1.0;
        a.update(0.5, tuning.world.bounds());
        assert!((a.body.position.x - 105.0).abs() < 1e-4);
        assert!((a.body.rotation - 0.5).abs() < 1e-5);
    }
}
