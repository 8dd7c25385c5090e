//! Entity ownership and per-tick entity updates
//!
//! The [`EntityManager`] owns one [`Pool`] per entity kind. Everything else in
//! the simulation refers to entities through handles and resolves them here.

use glam::Vec2;
use rand::Rng;

use super::asteroid::{Asteroid, AsteroidSpawn};
use super::bullet::{Bullet, BulletSpawn};
use super::enemy::{Enemy, EnemySpawn, TargetInfo};
use super::entity::{Entity, EntityKind};
use super::events::GameEvent;
use super::pickup::{Pickup, PickupSpawn};
use super::pool::{Handle, Pool, PoolStats};
use super::ship::Ship;
use crate::tuning::Tuning;

/// One pool per entity kind
pub struct Pools {
    pub ships: Pool<Ship>,
    pub asteroids: Pool<Asteroid>,
    pub bullets: Pool<Bullet>,
    pub enemies: Pool<Enemy>,
    pub pickups: Pool<Pickup>,
}

impl Pools {
    fn new(tuning: &Tuning) -> Self {
        let caps = &tuning.pools;
        Self {
            ships: Pool::with_capacity(caps.ships),
            asteroids: Pool::with_capacity(caps.asteroids),
            bullets: Pool::with_capacity(caps.bullets),
            enemies: Pool::with_capacity(caps.enemies),
            pickups: Pool::with_capacity(caps.pickups),
        }
    }
}

/// An entity kind stored in [`Pools`]
pub trait Managed: Entity + Default + Sized + 'static {
    fn pool(pools: &Pools) -> &Pool<Self>;
    fn pool_mut(pools: &mut Pools) -> &mut Pool<Self>;
}

/// An entity kind that can be spawned from arguments
pub trait Spawn: Managed {
    type Args;

    /// Initialize a freshly reset instance
    fn init(&mut self, args: Self::Args, tuning: &Tuning);
}

macro_rules! managed {
    ($ty:ty, $field:ident, $args:ty) => {
        impl Managed for $ty {
            fn pool(pools: &Pools) -> &Pool<Self> {
                &pools.$field
            }

            fn pool_mut(pools: &mut Pools) -> &mut Pool<Self> {
                &mut pools.$field
            }
        }

        impl Spawn for $ty {
            type Args = $args;

            fn init(&mut self, args: Self::Args, tuning: &Tuning) {
                <$ty>::init(self, args, tuning)
            }
        }
    };
}

managed!(Ship, ships, Vec2);
managed!(Asteroid, asteroids, AsteroidSpawn);
managed!(Bullet, bullets, BulletSpawn);
managed!(Enemy, enemies, EnemySpawn);
managed!(Pickup, pickups, PickupSpawn);

pub struct EntityManager {
    pub(crate) pools: Pools,
    tuning: Tuning,
}

impl EntityManager {
    pub fn new(tuning: Tuning) -> Self {
        Self {
            pools: Pools::new(&tuning),
            tuning,
        }
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Pools and tuning borrowed together (resolvers mutate one, read the other)
    pub(crate) fn parts_mut(&mut self) -> (&mut Pools, &Tuning) {
        (&mut self.pools, &self.tuning)
    }

    /// Take a pooled instance (or allocate one) and initialize it from `args`
    pub fn spawn<T: Spawn>(&mut self, args: T::Args) -> Handle<T> {
        let (handle, entity) = T::pool_mut(&mut self.pools).acquire();
        entity.init(args, &self.tuning);
        log::debug!("Spawned {} {:?}", T::KIND.as_str(), handle);
        handle
    }

    /// Insert an instance built elsewhere
    pub fn add_existing<T: Managed>(&mut self, entity: T) -> Handle<T> {
        T::pool_mut(&mut self.pools).insert(entity)
    }

    /// Resolve a handle to an active entity
    pub fn get<T: Managed>(&self, handle: Handle<T>) -> Option<&T> {
        T::pool(&self.pools).get_active(handle)
    }

    pub fn get_mut<T: Managed>(&mut self, handle: Handle<T>) -> Option<&mut T> {
        T::pool_mut(&mut self.pools).get_active_mut(handle)
    }

    pub fn is_alive<T: Managed>(&self, handle: Handle<T>) -> bool {
        T::pool(&self.pools).is_active(handle)
    }

    /// Active entities of one kind in slot order
    pub fn iter<T: Managed>(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        T::pool(&self.pools).iter()
    }

    pub fn ships(&self) -> &Pool<Ship> {
        &self.pools.ships
    }

    pub fn asteroids(&self) -> &Pool<Asteroid> {
        &self.pools.asteroids
    }

    pub fn bullets(&self) -> &Pool<Bullet> {
        &self.pools.bullets
    }

    pub fn enemies(&self) -> &Pool<Enemy> {
        &self.pools.enemies
    }

    pub fn pickups(&self) -> &Pool<Pickup> {
        &self.pools.pickups
    }

    /// Number of active entities of `kind`
    pub fn count(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Ship => self.pools.ships.active_count(),
            EntityKind::Asteroid => self.pools.asteroids.active_count(),
            EntityKind::Bullet => self.pools.bullets.active_count(),
            EntityKind::Enemy => self.pools.enemies.active_count(),
            EntityKind::Pickup => self.pools.pickups.active_count(),
        }
    }

    pub fn pool_stats(&self, kind: EntityKind) -> PoolStats {
        match kind {
            EntityKind::Ship => self.pools.ships.stats(),
            EntityKind::Asteroid => self.pools.asteroids.stats(),
            EntityKind::Bullet => self.pools.bullets.stats(),
            EntityKind::Enemy => self.pools.enemies.stats(),
            EntityKind::Pickup => self.pools.pickups.stats(),
        }
    }

    pub fn first_active_ship(&self) -> Option<Handle<Ship>> {
        self.pools.ships.iter().next().map(|(handle, _)| handle)
    }

    /// Update every active entity, turn enemy shots into bullets, then sweep
    /// despawned entities back into their pools.
    pub fn update(&mut self, dt: f32, rng: &mut impl Rng, events: &mut Vec<GameEvent>) {
        let tuning = &self.tuning;
        let bounds = tuning.world.bounds();
        let Pools {
            ships,
            asteroids,
            bullets,
            enemies,
            pickups,
        } = &mut self.pools;

        for (_, ship) in ships.iter_mut() {
            ship.update(dt, &tuning.ship, bounds);
        }
        for (_, asteroid) in asteroids.iter_mut() {
            asteroid.update(dt, bounds);
        }
        for (_, bullet) in bullets.iter_mut() {
            bullet.update(dt, bounds);
        }

        let fallback = ships.iter().next().map(|(handle, _)| handle);
        let mut shots = Vec::new();
        for (_, enemy) in enemies.iter_mut() {
            if !enemy.target.is_some_and(|h| ships.is_active(h)) {
                enemy.target = fallback;
            }
            let target = enemy
                .target
                .and_then(|h| ships.get_active(h))
                .map(|ship| TargetInfo {
                    position: ship.body.position,
                    velocity: ship.body.velocity,
                });
            let stats = tuning.enemies.stats(enemy.enemy_type);
            if let Some(shot) = enemy.update(dt, target, rng, stats, &tuning.bullets, bounds) {
                shots.push(shot);
            }
        }
        for shot in shots {
            let (_, bullet) = bullets.acquire();
            bullet.init(shot, tuning);
            events.push(GameEvent::BulletFired {
                owner: shot.owner,
                position: shot.position,
            });
        }

        for (_, pickup) in pickups.iter_mut() {
            let magnet = pickup
                .magnet_target
                .and_then(|h| ships.get_active(h))
                .map(|ship| ship.body.position);
            pickup.update(dt, magnet, &tuning.pickups, bounds);
        }

        ships.sweep_inactive();
        asteroids.sweep_inactive();
        bullets.sweep_inactive();
        enemies.sweep_inactive();
        pickups.sweep_inactive();
    }

    /// Deactivate everything and return it to the pools
    pub fn clear_all(&mut self) {
        self.pools.ships.release_all();
        self.pools.asteroids.release_all();
        self.pools.bullets.release_all();
        self.pools.enemies.release_all();
        self.pools.pickups.release_all();
    }
}
