//! Projectiles with pierce and ricochet modifiers

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entity::{Body, Entity, EntityKind, EntityRef};
use super::physics::WorldBounds;
use crate::angle_of;
use crate::tuning::Tuning;

/// Who fired a bullet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BulletOwner {
    #[default]
    Player,
    Enemy,
}

/// What happened to a bullet after it hit something
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Passed through, one pierce charge used
    Pierced,
    /// Bounced to a new heading, one ricochet charge used
    Ricocheted,
    /// Despawned
    Spent,
}

/// A bullet
#[derive(Debug, Clone)]
pub struct Bullet {
    pub body: Body,
    pub owner: BulletOwner,
    /// Targets it can still pass through
    pub pierce: u32,
    /// Bounces left
    pub ricochet: u32,
    /// Damage multiplier
    pub damage: f32,
    /// Seconds remaining
    pub lifetime: f32,
    /// Last entity hit, so a surviving bullet does not hit it again next tick
    pub last_hit: Option<EntityRef>,
}

impl Default for Bullet {
    fn default() -> Self {
        Self {
            body: Body::new(1.0),
            owner: BulletOwner::Player,
            pierce: 0,
            ricochet: 0,
            damage: 1.0,
            lifetime: 0.0,
            last_hit: None,
        }
    }
}

/// Spawn arguments for [`Bullet`]
#[derive(Debug, Clone, Copy)]
pub struct BulletSpawn {
    pub owner: BulletOwner,
    pub position: Vec2,
    pub velocity: Vec2,
    pub pierce: u32,
    pub ricochet: u32,
    pub damage: f32,
    pub lifetime: f32,
}

impl BulletSpawn {
    /// Plain player shot with default lifetime
    pub fn player(position: Vec2, velocity: Vec2, tuning: &Tuning) -> Self {
        Self {
            owner: BulletOwner::Player,
            position,
            velocity,
            pierce: 0,
            ricochet: 0,
            damage: 1.0,
            lifetime: tuning.bullets.lifetime,
        }
    }
}

impl Bullet {
    pub(crate) fn init(&mut self, args: BulletSpawn, tuning: &Tuning) {
        self.body.radius = tuning.bullets.radius;
        self.body.position = args.position;
        self.body.velocity = args.velocity;
        self.body.rotation = angle_of(args.velocity);
        self.owner = args.owner;
        self.pierce = args.pierce;
        self.ricochet = args.ricochet;
        self.damage = args.damage;
        self.lifetime = args.lifetime;
        self.last_hit = None;
    }

    pub fn update(&mut self, dt: f32, bounds: WorldBounds) {
        self.lifetime -= dt;
        if self.lifetime <= 0.0 {
            self.body.deactivate();
            return;
        }
        self.body.advance(dt, bounds);
    }

    /// Spend a modifier for a hit on `target`, or despawn.
    ///
    /// Pierce is used before ricochet. A ricochet keeps the speed and picks a
    /// random new heading.
    pub fn register_hit(&mut self, target: EntityRef, rng: &mut impl Rng) -> HitOutcome {
        self.last_hit = Some(target);
        if self.pierce > 0 {
            self.pierce -= 1;
            HitOutcome::Pierced
        } else if self.ricochet > 0 {
            self.ricochet -= 1;
            let speed = self.body.velocity.length();
            let angle = rng.random_range(0.0..std::f32::consts::TAU);
            self.body.velocity = Vec2::from_angle(angle) * speed;
            self.body.rotation = angle;
            HitOutcome::Ricocheted
        } else {
            self.body.deactivate();
            HitOutcome::Spent
        }
    }

    /// Whether `target` was the previous thing this bullet hit
    pub fn recently_hit(&self, target: EntityRef) -> bool {
        self.last_hit == Some(target)
    }
}

impl Entity for Bullet {
    const KIND: EntityKind = EntityKind::Bullet;

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
