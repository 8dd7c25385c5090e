//! Shared entity state and the capability set every entity kind implements

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::asteroid::Asteroid;
use super::bullet::Bullet;
use super::enemy::Enemy;
use super::physics::{self, WorldBounds};
use super::pickup::Pickup;
use super::pool::Handle;
use super::ship::Ship;

/// The five pooled entity kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Ship,
    Asteroid,
    Bullet,
    Enemy,
    Pickup,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Ship,
        EntityKind::Asteroid,
        EntityKind::Bullet,
        EntityKind::Enemy,
        EntityKind::Pickup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Ship => "ship",
            EntityKind::Asteroid => "asteroid",
            EntityKind::Bullet => "bullet",
            EntityKind::Enemy => "enemy",
            EntityKind::Pickup => "pickup",
        }
    }
}

/// Kinematic state common to every entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Facing (radians)
    pub rotation: f32,
    pub radius: f32,
    /// Seconds since spawn
    pub age: f32,
    /// False once despawned; the manager sweeps it at the end of its update
    pub active: bool,
}

impl Body {
    pub fn new(radius: f32) -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            rotation: 0.0,
            radius,
            age: 0.0,
            active: true,
        }
    }

    /// Return to the freshly-constructed state (radius is kept)
    pub fn reset(&mut self) {
        *self = Self::new(self.radius);
    }

    /// Mark for removal
    #[inline]
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Age, integrate and wrap in one step
    pub fn advance(&mut self, dt: f32, bounds: WorldBounds) {
        self.age += dt;
        physics::integrate(self, dt);
        physics::wrap(self, bounds.half_width, bounds.half_height);
        physics::enforce_invariants(self, bounds);
    }
}

/// Capability set shared by ships, asteroids, bullets, enemies and pickups
pub trait Entity {
    const KIND: EntityKind;

    fn body(&self) -> &Body;

    fn body_mut(&mut self) -> &mut Body;

    /// Clear all per-life state before the instance goes back to its pool.
    ///
    /// A reset instance must not hold handles to other entities.
    fn reset(&mut self);

    #[inline]
    fn is_active(&self) -> bool {
        self.body().active
    }

    #[inline]
    fn position(&self) -> Vec2 {
        self.body().position
    }
}

/// Typed reference to any entity, used by the grid and by events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Ship(Handle<Ship>),
    Asteroid(Handle<Asteroid>),
    Bullet(Handle<Bullet>),
    Enemy(Handle<Enemy>),
    Pickup(Handle<Pickup>),
}

impl EntityRef {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Ship(_) => EntityKind::Ship,
            EntityRef::Asteroid(_) => EntityKind::Asteroid,
            EntityRef::Bullet(_) => EntityKind::Bullet,
            EntityRef::Enemy(_) => EntityKind::Enemy,
            EntityRef::Pickup(_) => EntityKind::Pickup,
        }
    }

    pub fn as_asteroid(&self) -> Option<Handle<Asteroid>> {
        match self {
            EntityRef::Asteroid(h) => Some(*h),
            _ => None,
        }
    }

    pub fn as_bullet(&self) -> Option<Handle<Bullet>> {
        match self {
            EntityRef::Bullet(h) => Some(*h),
            _ => None,
        }
    }

    pub fn as_enemy(&self) -> Option<Handle<Enemy>> {
        match self {
            EntityRef::Enemy(h) => Some(*h),
            _ => None,
        }
    }

    pub fn as_pickup(&self) -> Option<Handle<Pickup>> {
        match self {
            EntityRef::Pickup(h) => Some(*h),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_reset_keeps_radius() {
        let mut body = Body::new(12.0);
        body.position = Vec2::new(3.0, 4.0);
        body.age = 9.0;
        body.deactivate();
        body.reset();
        assert_eq!(body.radius, 12.0);
        assert_eq!(body.position, Vec2::ZERO);
        assert_eq!(body.age, 0.0);
        assert!(body.active);
    }

    #[test]
    fn test_advance_ages_and_wraps() {
        let mut body = Body::new(5.0);
        body.position = Vec2::new(100.0, 0.0);
        body.velocity = Vec2::new(100.0, 0.0);
        body.advance(0.1, WorldBounds::new(100.0, 100.0));
        assert!((body.age - 0.1).abs() < 1e-6);
        // 110 > 105, wraps to -100
        assert!((body.position.x + 100.0).abs() < 1e-4);
    }
}
