//! The player ship

use glam::Vec2;

use super::bullet::{BulletOwner, BulletSpawn};
use super::entity::{Body, Entity, EntityKind};
use super::physics::{self, WorldBounds};
use super::pickup::PickupKind;
use crate::tuning::{BulletTuning, ShipTuning, Tuning};
use crate::{normalize_angle, shortest_angle_delta};

/// Base weapon modifiers copied onto every bullet fired
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponStats {
    pub pierce: u32,
    pub ricochet: u32,
    /// Damage multiplier
    pub damage: f32,
}

impl Default for WeaponStats {
    fn default() -> Self {
        Self {
            pierce: 0,
            ricochet: 0,
            damage: 1.0,
        }
    }
}

/// Seconds remaining on each timed buff
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Buffs {
    pub rapid_fire: f32,
    pub pierce: f32,
    pub damage: f32,
}

impl Buffs {
    fn tick(&mut self, dt: f32) {
        for timer in [&mut self.rapid_fire, &mut self.pierce, &mut self.damage] {
            *timer = (*timer - dt).max(0.0);
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ship {
    pub body: Body,
    /// Heading the ship eases toward (radians)
    pub target_rotation: f32,
    pub thrusting: bool,
    pub invulnerable: bool,
    /// Seconds of invulnerability left
    pub invuln_time: f32,
    pub health: f32,
    pub max_health: f32,
    pub shield: f32,
    pub max_shield: f32,
    pub credits: u64,
    /// Seconds until the next shot is allowed
    pub fire_cooldown: f32,
    pub weapon: WeaponStats,
    pub buffs: Buffs,
}

impl Default for Ship {
    fn default() -> Self {
        Self::new(&ShipTuning::default())
    }
}

impl Ship {
    pub fn new(tuning: &ShipTuning) -> Self {
        Self {
            body: Body::new(tuning.radius),
            target_rotation: 0.0,
            thrusting: false,
            invulnerable: false,
            invuln_time: 0.0,
            health: tuning.max_health,
            max_health: tuning.max_health,
            shield: 0.0,
            max_shield: tuning.max_shield,
            credits: 0,
            fire_cooldown: 0.0,
            weapon: WeaponStats::default(),
            buffs: Buffs::default(),
        }
    }

    /// Unit vector along the current facing
    pub fn heading(&self) -> Vec2 {
        Vec2::from_angle(self.body.rotation)
    }

    pub fn update(&mut self, dt: f32, tuning: &ShipTuning, bounds: WorldBounds) {
        // Ease toward the target heading along the shorter arc
        let delta = shortest_angle_delta(self.body.rotation, self.target_rotation);
        let step = tuning.rotation_speed * dt;
        self.body.rotation = if delta.abs() <= step {
            normalize_angle(self.target_rotation)
        } else {
            normalize_angle(self.body.rotation + step * delta.signum())
        };

        if self.thrusting {
            let force = self.heading() * tuning.thrust;
            physics::apply_force(&mut self.body, force, dt);
        }
        self.body.velocity *= tuning.friction;
        physics::clamp_velocity(&mut self.body, 0.0, tuning.max_speed);
        self.body.advance(dt, bounds);

        if self.invulnerable {
            self.invuln_time -= dt;
            if self.invuln_time <= 0.0 {
                self.invulnerable = false;
                self.invuln_time = 0.0;
            }
        }
        self.fire_cooldown = (self.fire_cooldown - dt).max(0.0);
        self.buffs.tick(dt);
    }

    /// Extend invulnerability to at least `seconds`
    pub fn grant_invulnerability(&mut self, seconds: f32) {
        self.invulnerable = true;
        self.invuln_time = self.invuln_time.max(seconds);
    }

    /// Apply damage, shield first. Returns true when the ship is destroyed.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        let absorbed = amount.min(self.shield);
        self.shield -= absorbed;
        self.health = (self.health - (amount - absorbed)).max(0.0);
        self.health <= 0.0
    }

    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount).min(self.max_health);
    }

    pub fn add_shield(&mut self, amount: f32) {
        self.shield = (self.shield + amount).min(self.max_shield);
    }

    /// Start (or extend) a timed buff. Non-buff kinds are ignored.
    pub fn activate_buff(&mut self, kind: PickupKind, seconds: f32) {
        let timer = match kind {
            PickupKind::RapidFire => &mut self.buffs.rapid_fire,
            PickupKind::Pierce => &mut self.buffs.pierce,
            PickupKind::Damage => &mut self.buffs.damage,
            _ => return,
        };
        *timer = timer.max(seconds);
    }

    /// Fire if the cooldown allows, returning the bullet to spawn.
    ///
    /// Rapid fire halves the cooldown.
    pub fn try_fire(&mut self, tuning: &ShipTuning, bullets: &BulletTuning) -> Option<BulletSpawn> {
        if self.fire_cooldown > 0.0 || !self.body.active {
            return None;
        }
        self.fire_cooldown = if self.buffs.rapid_fire > 0.0 {
            tuning.fire_cooldown * 0.5
        } else {
            tuning.fire_cooldown
        };

        let heading = self.heading();
        Some(BulletSpawn {
            owner: BulletOwner::Player,
            position: self.body.position + heading * (self.body.radius + bullets.radius + 1.0),
            velocity: heading * bullets.speed + self.body.velocity,
            pierce: self.weapon.pierce,
            ricochet: self.weapon.ricochet,
            damage: self.weapon.damage,
            lifetime: bullets.lifetime,
        })
    }

    /// Fresh ship at `position` with spawn invulnerability
    pub(crate) fn init(&mut self, position: Vec2, tuning: &Tuning) {
        *self = Self::new(&tuning.ship);
        self.body.position = position;
        self.grant_invulnerability(tuning.ship.spawn_invulnerability);
    }
}

impl Entity for Ship {
    const KIND: EntityKind = EntityKind::Ship;

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
