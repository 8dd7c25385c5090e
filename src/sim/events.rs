//! Typed simulation events and the callback table that receives them
//!
//! Systems push [`GameEvent`]s into a per-tick buffer. At the end of the tick
//! the buffer is handed to the [`EventBus`], which calls every handler
//! registered for the event's [`EventKind`] and then every catch-all handler.

use std::collections::HashMap;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::asteroid::AsteroidSize;
use super::bullet::BulletOwner;
use super::collision::CollisionPair;
use super::enemy::EnemyType;
use super::entity::EntityRef;
use super::pickup::{PickupEffect, PickupKind};

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Two entities touched and the pair's resolver ran
    Collision {
        pair: CollisionPair,
        first: EntityRef,
        second: EntityRef,
    },
    AsteroidDestroyed {
        size: AsteroidSize,
        position: Vec2,
        /// Destroyed by a player bullet (scores)
        by_player: bool,
        /// Number of pieces it split into
        pieces: u8,
    },
    EnemyDestroyed {
        enemy_type: EnemyType,
        position: Vec2,
        by_player: bool,
    },
    PickupSpawned {
        kind: PickupKind,
        position: Vec2,
    },
    PickupCollected {
        kind: PickupKind,
        effect: PickupEffect,
    },
    ShipDamaged {
        amount: f32,
        health: f32,
    },
    ShipDestroyed {
        position: Vec2,
    },
    BulletFired {
        owner: BulletOwner,
        position: Vec2,
    },
    PointsAwarded {
        base: u32,
        multiplier: u32,
        points: u64,
        score: u64,
    },
    ComboExpired {
        count: u32,
    },
    HighScore {
        score: u64,
    },
    WaveStarted {
        wave: u32,
        asteroids: u32,
        enemies: u32,
    },
    WaveComplete {
        wave: u32,
        perfect: bool,
    },
    EnemiesSpawned {
        wave: u32,
        count: u32,
    },
    GameOver {
        score: u64,
        wave: u32,
    },
}

/// Discriminant of [`GameEvent`], used as the subscription key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Collision,
    AsteroidDestroyed,
    EnemyDestroyed,
    PickupSpawned,
    PickupCollected,
    ShipDamaged,
    ShipDestroyed,
    BulletFired,
    PointsAwarded,
    ComboExpired,
    HighScore,
    WaveStarted,
    WaveComplete,
    EnemiesSpawned,
    GameOver,
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::Collision { .. } => EventKind::Collision,
            GameEvent::AsteroidDestroyed { .. } => EventKind::AsteroidDestroyed,
            GameEvent::EnemyDestroyed { .. } => EventKind::EnemyDestroyed,
            GameEvent::PickupSpawned { .. } => EventKind::PickupSpawned,
            GameEvent::PickupCollected { .. } => EventKind::PickupCollected,
            GameEvent::ShipDamaged { .. } => EventKind::ShipDamaged,
            GameEvent::ShipDestroyed { .. } => EventKind::ShipDestroyed,
            GameEvent::BulletFired { .. } => EventKind::BulletFired,
            GameEvent::PointsAwarded { .. } => EventKind::PointsAwarded,
            GameEvent::ComboExpired { .. } => EventKind::ComboExpired,
            GameEvent::HighScore { .. } => EventKind::HighScore,
            GameEvent::WaveStarted { .. } => EventKind::WaveStarted,
            GameEvent::WaveComplete { .. } => EventKind::WaveComplete,
            GameEvent::EnemiesSpawned { .. } => EventKind::EnemiesSpawned,
            GameEvent::GameOver { .. } => EventKind::GameOver,
        }
    }
}

type Handler = Box<dyn FnMut(&GameEvent)>;

/// Callback table keyed by event kind
#[derive(Default)]
pub struct EventBus {
    handlers: HashMap<EventKind, Vec<Handler>>,
    catch_all: Vec<Handler>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `handler` for every event of `kind`
    pub fn subscribe(&mut self, kind: EventKind, handler: impl FnMut(&GameEvent) + 'static) {
        self.handlers.entry(kind).or_default().push(Box::new(handler));
    }

    /// Call `handler` for every event
    pub fn subscribe_all(&mut self, handler: impl FnMut(&GameEvent) + 'static) {
        self.catch_all.push(Box::new(handler));
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.values().map(Vec::len).sum::<usize>() + self.catch_all.len()
    }

    /// Deliver one event
    pub fn emit(&mut self, event: &GameEvent) {
        if let Some(handlers) = self.handlers.get_mut(&event.kind()) {
            for handler in handlers.iter_mut() {
                handler(event);
            }
        }
        for handler in self.catch_all.iter_mut() {
            handler(event);
        }
    }

    /// Deliver a tick's events in order
    pub fn dispatch(&mut self, events: &[GameEvent]) {
        if self.handlers.is_empty() && self.catch_all.is_empty() {
            return;
        }
        for event in events {
            self.emit(event);
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.handler_count())
            .finish()
    }
}
