//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-supplied timestep, clamped per tick
//! - Seeded RNG only
//! - Stable iteration order (by pool slot)
//! - No rendering, audio or platform dependencies

pub mod asteroid;
pub mod bullet;
pub mod collision;
pub mod enemy;
pub mod entity;
pub mod events;
pub mod grid;
pub mod manager;
pub mod physics;
pub mod pickup;
pub mod pool;
pub mod schedule;
pub mod scoring;
pub mod ship;
pub mod state;
pub mod tick;
pub mod wave;

pub use asteroid::{Asteroid, AsteroidSize, AsteroidSpawn};
pub use bullet::{Bullet, BulletOwner, BulletSpawn, HitOutcome};
pub use collision::{CollisionPair, CollisionSystem};
pub use enemy::{AiState, Enemy, EnemySpawn, EnemyType, lead_target};
pub use entity::{Body, Entity, EntityKind, EntityRef};
pub use events::{EventBus, EventKind, GameEvent};
pub use grid::SpatialGrid;
pub use manager::{EntityManager, Managed, Spawn};
pub use physics::WorldBounds;
pub use pickup::{Pickup, PickupEffect, PickupKind, PickupSpawn};
pub use pool::{Handle, Pool, PoolStats};
pub use schedule::Schedule;
pub use scoring::{Award, ComboState, ScoringSystem};
pub use ship::Ship;
pub use state::{GamePhase, GameState};
pub use tick::{TickInput, tick};
pub use wave::{WaveConfig, WavePhase, WaveState, WaveSystem, generate_wave_config};
