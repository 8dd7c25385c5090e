//! Collision detection and typed resolution
//!
//! Each tick the grid is rebuilt from the active entities, then every enabled
//! pair is resolved in a fixed order. For a pair `(A, B)` each active `A` looks
//! at the `B` entries of its home cell. Both sides are re-checked for activity
//! right before the exact test, so anything despawned earlier in the pass is
//! skipped. Entities spawned during the pass (split pieces, drops) are not in
//! the grid and wait for the next tick.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::asteroid::Asteroid;
use super::bullet::{BulletOwner, HitOutcome};
use super::entity::{Entity, EntityRef};
use super::events::GameEvent;
use super::grid::SpatialGrid;
use super::manager::EntityManager;
use super::physics;
use super::pickup::{Pickup, PickupSpawn};
use super::pool::Handle;
use super::ship::Ship;
use crate::tuning::Tuning;

/// Entity pairings with a collision response, in resolution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollisionPair {
    ShipAsteroid,
    BulletAsteroid,
    ShipBullet,
    ShipEnemy,
    BulletEnemy,
    ShipPickup,
}

impl CollisionPair {
    pub const ALL: [CollisionPair; 6] = [
        CollisionPair::ShipAsteroid,
        CollisionPair::BulletAsteroid,
        CollisionPair::ShipBullet,
        CollisionPair::ShipEnemy,
        CollisionPair::BulletEnemy,
        CollisionPair::ShipPickup,
    ];

    /// Configuration key
    pub fn key(&self) -> &'static str {
        match self {
            CollisionPair::ShipAsteroid => "ship_asteroid",
            CollisionPair::BulletAsteroid => "bullet_asteroid",
            CollisionPair::ShipBullet => "ship_bullet",
            CollisionPair::ShipEnemy => "ship_enemy",
            CollisionPair::BulletEnemy => "bullet_enemy",
            CollisionPair::ShipPickup => "ship_pickup",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|pair| pair.key() == key)
    }
}

#[derive(Debug, Clone)]
pub struct CollisionSystem {
    grid: SpatialGrid,
    pairs: Vec<CollisionPair>,
}

impl CollisionSystem {
    /// Build from a cell size and a list of enabled pair keys.
    ///
    /// Unknown keys are logged and skipped; duplicates are ignored.
    pub fn new(cell_size: f32, keys: &[String]) -> Self {
        let mut pairs = Vec::with_capacity(keys.len());
        for key in keys {
            match CollisionPair::from_key(key) {
                Some(pair) if !pairs.contains(&pair) => pairs.push(pair),
                Some(_) => {}
                None => log::warn!("Unknown collision pair '{}', skipping", key),
            }
        }
        Self {
            grid: SpatialGrid::new(cell_size),
            pairs,
        }
    }

    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self::new(tuning.world.grid_cell_size, &tuning.collision.pairs)
    }

    /// Enabled pairs in resolution order
    pub fn pairs(&self) -> &[CollisionPair] {
        &self.pairs
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    /// Rebuild the grid and resolve every enabled pair
    pub fn update(&mut self, manager: &mut EntityManager, rng: &mut impl Rng, events: &mut Vec<GameEvent>) {
        self.rebuild(manager);
        let grid = &self.grid;
        for &pair in &self.pairs {
            match pair {
                CollisionPair::ShipAsteroid => ship_asteroid(grid, manager, events),
                CollisionPair::BulletAsteroid => bullet_asteroid(grid, manager, rng, events),
                CollisionPair::ShipBullet => ship_bullet(grid, manager, events),
                CollisionPair::ShipEnemy => ship_enemy(grid, manager, rng, events),
                CollisionPair::BulletEnemy => bullet_enemy(grid, manager, rng, events),
                CollisionPair::ShipPickup => ship_pickup(grid, manager, events),
            }
        }
    }

    fn rebuild(&mut self, manager: &EntityManager) {
        self.grid.clear();
        let grid = &mut self.grid;
        for (h, e) in manager.ships().iter() {
            grid.insert(EntityRef::Ship(h), e.body.position, e.body.radius);
        }
        for (h, e) in manager.asteroids().iter() {
            grid.insert(EntityRef::Asteroid(h), e.body.position, e.body.radius);
        }
        for (h, e) in manager.bullets().iter() {
            grid.insert(EntityRef::Bullet(h), e.body.position, e.body.radius);
        }
        for (h, e) in manager.enemies().iter() {
            grid.insert(EntityRef::Enemy(h), e.body.position, e.body.radius);
        }
        for (h, e) in manager.pickups().iter() {
            grid.insert(EntityRef::Pickup(h), e.body.position, e.body.radius);
        }
    }
}

/// Apply damage to the ship and report it. Returns true if it was destroyed.
fn damage_ship(ship: &mut Ship, amount: f32, events: &mut Vec<GameEvent>) -> bool {
    let destroyed = ship.take_damage(amount);
    events.push(GameEvent::ShipDamaged {
        amount,
        health: ship.health,
    });
    if destroyed {
        log::info!("Ship destroyed at ({:.0}, {:.0})", ship.body.position.x, ship.body.position.y);
        ship.body.deactivate();
        events.push(GameEvent::ShipDestroyed {
            position: ship.body.position,
        });
    }
    destroyed
}

/// Knock the ship away from `from`
fn knockback(ship: &mut Ship, from: Vec2, strength: f32) {
    let dir = physics::direction(from, ship.body.position);
    physics::apply_impulse(&mut ship.body, dir * strength);
}

fn position_of<T: Entity>(entity: Option<&T>) -> Option<Vec2> {
    entity.map(|e| e.position())
}

fn spawn_drops(manager: &mut EntityManager, drops: Vec<PickupSpawn>, events: &mut Vec<GameEvent>) {
    for drop in drops {
        manager.spawn::<Pickup>(drop);
        events.push(GameEvent::PickupSpawned {
            kind: drop.kind,
            position: drop.position,
        });
    }
}

fn ship_asteroid(grid: &SpatialGrid, manager: &mut EntityManager, events: &mut Vec<GameEvent>) {
    for ship_h in manager.ships().handles() {
        let Some(pos) = position_of(manager.get(ship_h)) else {
            continue;
        };
        for asteroid_h in grid.candidates(pos).iter().filter_map(EntityRef::as_asteroid) {
            let (pools, tuning) = manager.parts_mut();
            let Some(ship) = pools.ships.get_active_mut(ship_h) else {
                break;
            };
            let Some(asteroid) = pools.asteroids.get_active_mut(asteroid_h) else {
                continue;
            };
            if !physics::are_colliding(&ship.body, &asteroid.body) {
                continue;
            }
            events.push(GameEvent::Collision {
                pair: CollisionPair::ShipAsteroid,
                first: EntityRef::Ship(ship_h),
                second: EntityRef::Asteroid(asteroid_h),
            });
            if ship.invulnerable {
                continue;
            }

            let rules = &tuning.collision;
            ship.grant_invulnerability(rules.asteroid_invulnerability);
            knockback(ship, asteroid.body.position, rules.knockback);
            damage_ship(ship, rules.ship_asteroid_damage, events);
        }
    }
}

fn bullet_asteroid(
    grid: &SpatialGrid,
    manager: &mut EntityManager,
    rng: &mut impl Rng,
    events: &mut Vec<GameEvent>,
) {
    for bullet_h in manager.bullets().handles() {
        let Some(pos) = position_of(manager.get(bullet_h)) else {
            continue;
        };
        for asteroid_h in grid.candidates(pos).iter().filter_map(EntityRef::as_asteroid) {
            let target = EntityRef::Asteroid(asteroid_h);
            let (pools, tuning) = manager.parts_mut();
            let Some(bullet) = pools.bullets.get_active_mut(bullet_h) else {
                break;
            };
            if bullet.recently_hit(target) {
                continue;
            }
            let Some(asteroid) = pools.asteroids.get_active_mut(asteroid_h) else {
                continue;
            };
            if !physics::are_colliding(&bullet.body, &asteroid.body) {
                continue;
            }
            events.push(GameEvent::Collision {
                pair: CollisionPair::BulletAsteroid,
                first: EntityRef::Bullet(bullet_h),
                second: target,
            });

            let by_player = bullet.owner == BulletOwner::Player;
            let outcome = bullet.register_hit(target, rng);
            asteroid.body.deactivate();
            let pieces = asteroid.split_pieces(rng, &tuning.asteroids);
            let (size, position) = (asteroid.size, asteroid.body.position);

            let magnet = pools.ships.iter().next().map(|(h, _)| h);
            let drops = asteroid_drops(rng, tuning, position, magnet);

            events.push(GameEvent::AsteroidDestroyed {
                size,
                position,
                by_player,
                pieces: pieces.len() as u8,
            });
            log::debug!("{:?} asteroid destroyed, {} pieces", size, pieces.len());
            for piece in pieces {
                manager.spawn::<Asteroid>(piece);
            }
            spawn_drops(manager, drops, events);

            if outcome == HitOutcome::Spent {
                break;
            }
        }
    }
}

fn ship_bullet(grid: &SpatialGrid, manager: &mut EntityManager, events: &mut Vec<GameEvent>) {
    for ship_h in manager.ships().handles() {
        let Some(pos) = position_of(manager.get(ship_h)) else {
            continue;
        };
        for bullet_h in grid.candidates(pos).iter().filter_map(EntityRef::as_bullet) {
            let (pools, tuning) = manager.parts_mut();
            let Some(ship) = pools.ships.get_active_mut(ship_h) else {
                break;
            };
            let Some(bullet) = pools.bullets.get_active_mut(bullet_h) else {
                continue;
            };
            // Own shots pass through the ship
            if bullet.owner != BulletOwner::Enemy || !physics::are_colliding(&ship.body, &bullet.body) {
                continue;
            }
            events.push(GameEvent::Collision {
                pair: CollisionPair::ShipBullet,
                first: EntityRef::Ship(ship_h),
                second: EntityRef::Bullet(bullet_h),
            });
            bullet.body.deactivate();
            ship.grant_invulnerability(tuning.collision.bullet_invulnerability);
        }
    }
}

fn ship_enemy(
    grid: &SpatialGrid,
    manager: &mut EntityManager,
    rng: &mut impl Rng,
    events: &mut Vec<GameEvent>,
) {
    for ship_h in manager.ships().handles() {
        let Some(pos) = position_of(manager.get(ship_h)) else {
            continue;
        };
        for enemy_h in grid.candidates(pos).iter().filter_map(EntityRef::as_enemy) {
            let (pools, tuning) = manager.parts_mut();
            let Some(ship) = pools.ships.get_active_mut(ship_h) else {
                break;
            };
            let Some(enemy) = pools.enemies.get_active_mut(enemy_h) else {
                continue;
            };
            if !physics::are_colliding(&ship.body, &enemy.body) {
                continue;
            }
            events.push(GameEvent::Collision {
                pair: CollisionPair::ShipEnemy,
                first: EntityRef::Ship(ship_h),
                second: EntityRef::Enemy(enemy_h),
            });
            if ship.invulnerable {
                continue;
            }

            let rules = &tuning.collision;
            physics::resolve_collision(&mut ship.body, &mut enemy.body);
            ship.grant_invulnerability(rules.enemy_invulnerability);
            knockback(ship, enemy.body.position, rules.knockback);
            // Separation can push either body past the wrap limit
            let bounds = tuning.world.bounds();
            physics::wrap(&mut ship.body, bounds.half_width, bounds.half_height);
            physics::wrap(&mut enemy.body, bounds.half_width, bounds.half_height);
            damage_ship(ship, rules.ship_enemy_damage, events);

            if enemy.take_damage(rules.enemy_contact_damage) {
                let position = enemy.body.position;
                events.push(GameEvent::EnemyDestroyed {
                    enemy_type: enemy.enemy_type,
                    position,
                    by_player: true,
                });
                let drops = enemy_drop(rng, tuning, position, Some(ship_h));
                spawn_drops(manager, drops, events);
            }
        }
    }
}

fn bullet_enemy(
    grid: &SpatialGrid,
    manager: &mut EntityManager,
    rng: &mut impl Rng,
    events: &mut Vec<GameEvent>,
) {
    for bullet_h in manager.bullets().handles() {
        let Some(pos) = position_of(manager.get(bullet_h)) else {
            continue;
        };
        for enemy_h in grid.candidates(pos).iter().filter_map(EntityRef::as_enemy) {
            let target = EntityRef::Enemy(enemy_h);
            let (pools, tuning) = manager.parts_mut();
            let Some(bullet) = pools.bullets.get_active_mut(bullet_h) else {
                break;
            };
            // Enemies do not hurt each other
            if bullet.owner != BulletOwner::Player || bullet.recently_hit(target) {
                continue;
            }
            let Some(enemy) = pools.enemies.get_active_mut(enemy_h) else {
                continue;
            };
            if !physics::are_colliding(&bullet.body, &enemy.body) {
                continue;
            }
            events.push(GameEvent::Collision {
                pair: CollisionPair::BulletEnemy,
                first: EntityRef::Bullet(bullet_h),
                second: target,
            });

            let damage = bullet.damage * tuning.bullets.base_damage;
            let outcome = bullet.register_hit(target, rng);
            if enemy.take_damage(damage) {
                let position = enemy.body.position;
                events.push(GameEvent::EnemyDestroyed {
                    enemy_type: enemy.enemy_type,
                    position,
                    by_player: true,
                });
                log::debug!("{} destroyed", enemy.enemy_type.as_str());
                let magnet = pools.ships.iter().next().map(|(h, _)| h);
                let drops = enemy_drop(rng, tuning, position, magnet);
                spawn_drops(manager, drops, events);
            }

            if outcome == HitOutcome::Spent {
                break;
            }
        }
    }
}

/// Roll the drops for a destroyed asteroid: one, or else two
fn asteroid_drops(
    rng: &mut impl Rng,
    tuning: &Tuning,
    position: Vec2,
    magnet: Option<Handle<Ship>>,
) -> Vec<PickupSpawn> {
    let count = if rng.random_bool(tuning.pickups.single_drop_chance.clamp(0.0, 1.0)) {
        1
    } else {
        2
    };
    (0..count)
        .map(|_| PickupSpawn::drop_at(position, magnet, rng, &tuning.pickups))
        .collect()
}

/// Roll the drop for a destroyed enemy
fn enemy_drop(
    rng: &mut impl Rng,
    tuning: &Tuning,
    position: Vec2,
    magnet: Option<Handle<Ship>>,
) -> Vec<PickupSpawn> {
    if rng.random_bool(tuning.pickups.enemy_drop_chance.clamp(0.0, 1.0)) {
        vec![PickupSpawn::drop_at(position, magnet, rng, &tuning.pickups)]
    } else {
        Vec::new()
    }
}

fn ship_pickup(grid: &SpatialGrid, manager: &mut EntityManager, events: &mut Vec<GameEvent>) {
    for ship_h in manager.ships().handles() {
        let Some(pos) = position_of(manager.get(ship_h)) else {
            continue;
        };
        for pickup_h in grid.candidates(pos).iter().filter_map(EntityRef::as_pickup) {
            let (pools, _) = manager.parts_mut();
            let Some(ship) = pools.ships.get_active_mut(ship_h) else {
                break;
            };
            let Some(pickup) = pools.pickups.get_active_mut(pickup_h) else {
                continue;
            };
            if !physics::are_colliding(&ship.body, &pickup.body) {
                continue;
            }
            events.push(GameEvent::Collision {
                pair: CollisionPair::ShipPickup,
                first: EntityRef::Ship(ship_h),
                second: EntityRef::Pickup(pickup_h),
            });
            let effect = pickup.apply_to_ship(ship);
            pickup.body.deactivate();
            events.push(GameEvent::PickupCollected {
                kind: pickup.kind,
                effect,
            });
        }
    }
}
