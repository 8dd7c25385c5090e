//! Enemy ships and their AI state machine
//!
//! Hunting pursues the target until it is within attack range. Attacking keeps
//! pursuing with some lateral jitter for a few seconds, then the enemy either
//! flees (when it ended up close) or circles the target before hunting again.
//! Shooting is independent of the state: range, cooldown and an accuracy roll.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::bullet::{BulletOwner, BulletSpawn};
use super::entity::{Body, Entity, EntityKind};
use super::physics::{self, WorldBounds};
use super::pool::Handle;
use super::ship::Ship;
use crate::angle_of;
use crate::tuning::{BulletTuning, EnemyStats, Tuning};

/// Aim error applied to a shot that fails its accuracy roll (radians, ±)
const MISS_SPREAD: f32 = 0.5;
/// Chance of fleeing after an attack run that ended inside flee distance
const FLEE_CHANCE: f64 = 0.6;
/// Radial drift while circling (fraction of the acceleration, ±)
const ORBIT_DRIFT: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyType {
    Hunter,
    Sniper,
    Kamikaze,
}

impl EnemyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnemyType::Hunter => "hunter",
            EnemyType::Sniper => "sniper",
            EnemyType::Kamikaze => "kamikaze",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiState {
    Hunting,
    Attacking,
    Fleeing,
    Circling,
}

#[derive(Debug, Clone)]
pub struct Enemy {
    pub body: Body,
    pub enemy_type: EnemyType,
    pub health: f32,
    pub state: AiState,
    /// Seconds left in the current timed state
    pub state_timer: f32,
    /// Seconds until the next shot
    pub shoot_timer: f32,
    /// Weak reference to the ship being chased
    pub target: Option<Handle<Ship>>,
    /// +1 counter-clockwise, -1 clockwise
    pub orbit_direction: f32,
}

impl Default for Enemy {
    fn default() -> Self {
        Self {
            body: Body::new(1.0),
            enemy_type: EnemyType::Hunter,
            health: 0.0,
            state: AiState::Hunting,
            state_timer: 0.0,
            shoot_timer: 0.0,
            target: None,
            orbit_direction: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EnemySpawn {
    pub enemy_type: EnemyType,
    pub position: Vec2,
    pub velocity: Vec2,
    pub target: Option<Handle<Ship>>,
}

/// Resolved snapshot of the target for one update
#[derive(Debug, Clone, Copy)]
pub struct TargetInfo {
    pub position: Vec2,
    pub velocity: Vec2,
}

impl Enemy {
    pub(crate) fn init(&mut self, args: EnemySpawn, tuning: &Tuning) {
        let stats = tuning.enemies.stats(args.enemy_type);
        self.body.radius = stats.radius;
        self.body.position = args.position;
        self.body.velocity = args.velocity;
        self.enemy_type = args.enemy_type;
        self.health = stats.health;
        self.state = AiState::Hunting;
        self.state_timer = 0.0;
        self.shoot_timer = stats.shoot_cooldown.0;
        self.target = args.target;
        self.orbit_direction = 1.0;
    }

    /// Advance AI, movement and weapon. Returns a shot to spawn, if any.
    pub fn update(
        &mut self,
        dt: f32,
        target: Option<TargetInfo>,
        rng: &mut impl Rng,
        stats: &EnemyStats,
        bullets: &BulletTuning,
        bounds: WorldBounds,
    ) -> Option<BulletSpawn> {
        self.state_timer -= dt;
        self.shoot_timer -= dt;

        let Some(target) = target else {
            // Nothing to chase: coast
            self.state = AiState::Hunting;
            self.body.advance(dt, bounds);
            return None;
        };

        let to_target = target.position - self.body.position;
        let dist = to_target.length();
        let dir = to_target.normalize_or_zero();

        let steer = self.think(dist, dir, rng, stats);
        physics::apply_force(&mut self.body, steer.normalize_or_zero() * stats.acceleration, dt);
        physics::clamp_velocity(&mut self.body, 0.0, stats.max_speed);
        if self.body.velocity.length_squared() > f32::EPSILON {
            self.body.rotation = angle_of(self.body.velocity);
        }
        self.body.advance(dt, bounds);

        if dist <= stats.range && self.shoot_timer <= 0.0 {
            let (lo, hi) = stats.shoot_cooldown;
            self.shoot_timer = if hi > lo { rng.random_range(lo..hi) } else { lo };
            return Some(self.shoot(target, rng, stats, bullets));
        }
        None
    }

    /// Run state transitions and return the steering direction
    fn think(&mut self, dist: f32, dir: Vec2, rng: &mut impl Rng, stats: &EnemyStats) -> Vec2 {
        match self.state {
            AiState::Hunting => {
                if dist <= stats.attack_range {
                    self.state = AiState::Attacking;
                    self.state_timer = rng.random_range(2.0..4.0);
                }
                dir
            }
            AiState::Attacking => {
                if self.state_timer <= 0.0 {
                    if dist < stats.flee_distance && rng.random_bool(FLEE_CHANCE) {
                        self.state = AiState::Fleeing;
                        self.state_timer = rng.random_range(1.5..2.5);
                    } else {
                        self.state = AiState::Circling;
                        self.state_timer = rng.random_range(2.0..4.0);
                        self.orbit_direction = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
                    }
                }
                let jitter = if stats.jitter > 0.0 {
                    rng.random_range(-stats.jitter..=stats.jitter)
                } else {
                    0.0
                };
                dir + dir.perp() * jitter
            }
            AiState::Fleeing => {
                if self.state_timer <= 0.0 {
                    self.state = AiState::Hunting;
                }
                -dir
            }
            AiState::Circling => {
                if self.state_timer <= 0.0 {
                    self.state = AiState::Hunting;
                }
                let tangent = dir.perp() * self.orbit_direction;
                // Pull toward the preferred orbit radius
                let radial = ((dist - stats.orbit_radius) / stats.orbit_radius.max(1.0)).clamp(-1.0, 1.0);
                let drift = rng.random_range(-ORBIT_DRIFT..=ORBIT_DRIFT);
                tangent + dir * (radial + drift)
            }
        }
    }

    fn shoot(
        &self,
        target: TargetInfo,
        rng: &mut impl Rng,
        stats: &EnemyStats,
        bullets: &BulletTuning,
    ) -> BulletSpawn {
        let aim = lead_target(self.body.position, target.position, target.velocity, bullets.enemy_speed);
        let mut angle = angle_of(aim - self.body.position);
        if !rng.random_bool(stats.accuracy.clamp(0.0, 1.0) as f64) {
            angle += rng.random_range(-MISS_SPREAD..=MISS_SPREAD);
        }
        let heading = Vec2::from_angle(angle);
        BulletSpawn {
            owner: BulletOwner::Enemy,
            position: self.body.position + heading * (self.body.radius + bullets.radius + 1.0),
            velocity: heading * bullets.enemy_speed,
            pierce: 0,
            ricochet: 0,
            damage: 1.0,
            lifetime: bullets.enemy_lifetime,
        }
    }

    /// Apply damage. Returns true when this killed the enemy.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if !self.body.active {
            return false;
        }
        self.health -= amount;
        if self.health <= 0.0 {
            self.body.deactivate();
            true
        } else {
            false
        }
    }
}

/// Point to aim at so a bullet of `bullet_speed` meets a target moving at
/// constant velocity (first-order lead on the current distance)
pub fn lead_target(shooter: Vec2, target_pos: Vec2, target_vel: Vec2, bullet_speed: f32) -> Vec2 {
    if bullet_speed <= 0.0 {
        return target_pos;
    }
    let time = shooter.distance(target_pos) / bullet_speed;
    target_pos + target_vel * time
}

impl Entity for Enemy {
    const KIND: EntityKind = EntityKind::Enemy;

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

    fn enemy(enemy_type: EnemyType, position: Vec2, tuning: &Tuning) -> Enemy {
        let mut e = Enemy::default();
        e.init(
            EnemySpawn {
                enemy_type,
                position,
                velocity: Vec2::ZERO,
                target: None,
            },
            tuning,
        );
        e
    }

    fn still_target(position: Vec2) -> Option<TargetInfo> {
        Some(TargetInfo {
            position,
            velocity: Vec2::ZERO,
        })
    }

    #[test]
    fn test_lead_target() {
        let aim = lead_target(Vec2::ZERO, Vec2::new(100.0, 0.0), Vec2::new(0.0, 50.0), 100.0);
        assert_eq!(aim, Vec2::new(100.0, 50.0));
        assert_eq!(lead_target(Vec2::ZERO, Vec2::ONE, Vec2::ONE, 0.0), Vec2::ONE);
    }

    #[test]
    fn test_hunting_turns_to_attacking_in_range() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(3);
        let stats = tuning.enemies.stats(EnemyType::Hunter);
        let bounds = tuning.world.bounds();

        let mut e = enemy(EnemyType::Hunter, Vec2::new(500.0, 0.0), &tuning);
        e.update(0.016, still_target(Vec2::ZERO), &mut rng, stats, &tuning.bullets, bounds);
        assert_eq!(e.state, AiState::Hunting);
        // Pursuit accelerates toward the target
        assert!(e.body.velocity.x < 0.0);

        e.body.position = Vec2::new(100.0, 0.0);
        e.update(0.016, still_target(Vec2::ZERO), &mut rng, stats, &tuning.bullets, bounds);
        assert_eq!(e.state, AiState::Attacking);
        assert!(e.state_timer >= 2.0 && e.state_timer <= 4.0);
    }

    #[test]
    fn test_attack_run_ends_in_flee_or_circle_then_hunts() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(11);
        let stats = tuning.enemies.stats(EnemyType::Hunter);
        let bounds = tuning.world.bounds();

        let mut e = enemy(EnemyType::Hunter, Vec2::new(50.0, 0.0), &tuning);
        e.state = AiState::Attacking;
        e.state_timer = 0.0;
        e.update(0.016, still_target(Vec2::ZERO), &mut rng, stats, &tuning.bullets, bounds);
        assert!(matches!(e.state, AiState::Fleeing | AiState::Circling));

        e.state_timer = 0.0;
        e.update(0.016, still_target(Vec2::ZERO), &mut rng, stats, &tuning.bullets, bounds);
        assert_eq!(e.state, AiState::Hunting);
    }

    #[test]
    fn test_far_enemy_never_flees() {
        let tuning = Tuning::default();
        let stats = tuning.enemies.stats(EnemyType::Hunter);
        let bounds = tuning.world.bounds();
        for seed in 0..20 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut e = enemy(EnemyType::Hunter, Vec2::new(250.0, 0.0), &tuning);
            e.state = AiState::Attacking;
            e.state_timer = 0.0;
            e.update(0.016, still_target(Vec2::ZERO), &mut rng, stats, &tuning.bullets, bounds);
            assert_eq!(e.state, AiState::Circling);
        }
    }

    #[test]
    fn test_shoots_only_in_range_and_off_cooldown() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(5);
        let stats = tuning.enemies.stats(EnemyType::Sniper);
        let bounds = tuning.world.bounds();

        // Out of range
        let mut e = enemy(EnemyType::Sniper, Vec2::new(600.0, 0.0), &tuning);
        e.shoot_timer = 0.0;
        let shot = e.update(0.016, still_target(Vec2::new(-40.0, 0.0)), &mut rng, stats, &tuning.bullets, bounds);
        assert!(shot.is_none());

        // In range, cooldown elapsed
        e.body.position = Vec2::new(300.0, 0.0);
        e.shoot_timer = 0.0;
        let shot = e
            .update(0.016, still_target(Vec2::ZERO), &mut rng, stats, &tuning.bullets, bounds)
            .unwrap();
        assert_eq!(shot.owner, BulletOwner::Enemy);
        assert!(shot.velocity.x < 0.0);
        assert!(e.shoot_timer >= 2.5 && e.shoot_timer <= 4.0);

        // Cooling down
        let shot = e.update(0.016, still_target(Vec2::ZERO), &mut rng, stats, &tuning.bullets, bounds);
        assert!(shot.is_none());
    }

    #[test]
    fn test_no_target_coasts() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(5);
        let stats = tuning.enemies.stats(EnemyType::Hunter);
        let mut e = enemy(EnemyType::Hunter, Vec2::ZERO, &tuning);
        e.body.velocity = Vec2::new(10.0, 0.0);
        e.shoot_timer = 0.0;
        let shot = e.update(0.5, None, &mut rng, stats, &tuning.bullets, tuning.world.bounds());
        assert!(shot.is_none());
        assert_eq!(e.body.position, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_take_damage_kills_once() {
        let tuning = Tuning::default();
        let mut e = enemy(EnemyType::Kamikaze, Vec2::ZERO, &tuning);
        assert!(!e.take_damage(10.0));
        assert!(e.take_damage(10.0));
        assert!(!e.body.active);
        assert!(!e.take_damage(10.0));
    }
}
