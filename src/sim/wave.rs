//! Wave progression
//!
//! Idle → Active → Complete → (transition delay) → Active with the next wave.
//! A wave spawns its asteroids immediately and its enemies after a delay; it
//! completes once no asteroids or enemies are left and no enemy spawn is still
//! pending.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::asteroid::{AsteroidSize, AsteroidSpawn, random_spin};
use super::enemy::{EnemySpawn, EnemyType};
use super::entity::EntityKind;
use super::events::GameEvent;
use super::manager::EntityManager;
use super::schedule::Schedule;
use crate::tuning::WaveTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WavePhase {
    Idle,
    Active,
    Complete,
}

/// Parameters of one wave
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveConfig {
    pub wave: u32,
    pub asteroid_count: u32,
    /// Relative weights for large, medium and small asteroids
    pub size_weights: [u32; 3],
    pub enemy_count: u32,
    pub speed_multiplier: f32,
    /// Drop chance hint for this wave (not applied by the simulation)
    pub pickup_chance: f32,
}

impl WaveConfig {
    /// Weighted random asteroid size
    pub fn roll_size(&self, rng: &mut impl Rng) -> AsteroidSize {
        let total: u32 = self.size_weights.iter().sum();
        if total == 0 {
            return AsteroidSize::Large;
        }
        let mut roll = rng.random_range(0..total);
        for (size, weight) in AsteroidSize::ALL.into_iter().zip(self.size_weights) {
            if roll < weight {
                return size;
            }
            roll -= weight;
        }
        AsteroidSize::Large
    }
}

/// Wave parameters for wave `n` (1-based)
pub fn generate_wave_config(n: u32, tuning: &WaveTuning) -> WaveConfig {
    let n = n.max(1);
    let step = n - 1;
    let size_weights = match n {
        1..=2 => [80, 20, 0],
        3..=5 => [50, 30, 20],
        _ => [30, 40, 30],
    };
    let enemy_count = if n >= 3 {
        ((n - 3) / 2 + 1).min(tuning.max_enemies)
    } else {
        0
    };
    WaveConfig {
        wave: n,
        asteroid_count: (3 + 2 * step).min(tuning.max_asteroids),
        size_weights,
        enemy_count,
        speed_multiplier: 1.0 + 0.1 * step as f32,
        pickup_chance: (0.1 + 0.02 * step as f32).min(0.4),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveState {
    pub current_wave: u32,
    pub phase: WavePhase,
    /// Active asteroids, refreshed every update
    pub asteroid_count: u32,
    /// Active enemies, refreshed every update
    pub enemy_count: u32,
    /// No damage taken so far this wave
    pub perfect_wave: bool,
}

impl Default for WaveState {
    fn default() -> Self {
        Self {
            current_wave: 0,
            phase: WavePhase::Idle,
            asteroid_count: 0,
            enemy_count: 0,
            perfect_wave: true,
        }
    }
}

/// Deferred wave work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveAction {
    SpawnEnemies { wave: u32, count: u32 },
    Advance,
}

#[derive(Debug, Clone)]
pub struct WaveSystem {
    tuning: WaveTuning,
    state: WaveState,
    config: Option<WaveConfig>,
    schedule: Schedule<WaveAction>,
}

impl WaveSystem {
    pub fn new(tuning: &WaveTuning) -> Self {
        Self {
            tuning: tuning.clone(),
            state: WaveState::default(),
            config: None,
            schedule: Schedule::new(),
        }
    }

    pub fn state(&self) -> &WaveState {
        &self.state
    }

    pub fn current_wave(&self) -> u32 {
        self.state.current_wave
    }

    pub fn phase(&self) -> WavePhase {
        self.state.phase
    }

    /// Config of the wave in progress
    pub fn config(&self) -> Option<&WaveConfig> {
        self.config.as_ref()
    }

    /// Whether the current wave's enemies are still waiting to spawn
    pub fn enemies_pending(&self) -> bool {
        self.schedule
            .pending(|a| matches!(a, WaveAction::SpawnEnemies { .. }))
    }

    /// Move to the next wave and start it
    pub fn next_wave(&mut self, manager: &mut EntityManager, rng: &mut impl Rng, events: &mut Vec<GameEvent>) {
        self.state.current_wave += 1;
        self.start_wave(manager, rng, events);
    }

    /// Spawn the current wave's asteroids and schedule its enemies
    pub fn start_wave(&mut self, manager: &mut EntityManager, rng: &mut impl Rng, events: &mut Vec<GameEvent>) {
        let config = generate_wave_config(self.state.current_wave, &self.tuning);
        self.state.current_wave = config.wave;
        self.state.phase = WavePhase::Active;
        self.state.perfect_wave = true;

        for _ in 0..config.asteroid_count {
            let spawn = self.asteroid_spawn(&config, manager, rng);
            manager.spawn::<super::asteroid::Asteroid>(spawn);
        }
        if config.enemy_count > 0 {
            self.schedule.push_after(
                self.tuning.enemy_spawn_delay,
                WaveAction::SpawnEnemies {
                    wave: config.wave,
                    count: config.enemy_count,
                },
            );
        }

        log::info!(
            "Wave {} started: {} asteroids, {} enemies",
            config.wave,
            config.asteroid_count,
            config.enemy_count
        );
        events.push(GameEvent::WaveStarted {
            wave: config.wave,
            asteroids: config.asteroid_count,
            enemies: config.enemy_count,
        });
        self.refresh_counts(manager);
        self.config = Some(config);
    }

    /// Run due scheduled work, refresh counts and detect completion
    pub fn update(
        &mut self,
        dt: f32,
        manager: &mut EntityManager,
        rng: &mut impl Rng,
        events: &mut Vec<GameEvent>,
    ) {
        for action in self.schedule.advance(dt) {
            match action {
                WaveAction::SpawnEnemies { wave, count } => {
                    if wave == self.state.current_wave {
                        self.spawn_enemies(count, manager, rng, events);
                    }
                }
                WaveAction::Advance => self.next_wave(manager, rng, events),
            }
        }

        self.refresh_counts(manager);
        if self.state.phase == WavePhase::Active
            && self.state.asteroid_count == 0
            && self.state.enemy_count == 0
            && !self.enemies_pending()
        {
            self.state.phase = WavePhase::Complete;
            log::info!(
                "Wave {} complete{}",
                self.state.current_wave,
                if self.state.perfect_wave { " (perfect)" } else { "" }
            );
            events.push(GameEvent::WaveComplete {
                wave: self.state.current_wave,
                perfect: self.state.perfect_wave,
            });
            self.schedule
                .push_after(self.tuning.transition_delay, WaveAction::Advance);
        }
    }

    /// Drop the current wave's asteroids, enemies and pending work and start
    /// the next wave at once. Nothing is scored.
    pub fn skip_wave(&mut self, manager: &mut EntityManager, rng: &mut impl Rng, events: &mut Vec<GameEvent>) {
        log::info!("Skipping wave {}", self.state.current_wave);
        self.schedule.clear();
        for (_, asteroid) in manager.pools.asteroids.iter_mut() {
            asteroid.body.deactivate();
        }
        for (_, enemy) in manager.pools.enemies.iter_mut() {
            enemy.body.deactivate();
        }
        self.next_wave(manager, rng, events);
    }

    /// Track events that affect the wave (damage spoils a perfect wave)
    pub fn observe(&mut self, event: &GameEvent) {
        if let GameEvent::ShipDamaged { .. } = event {
            self.state.perfect_wave = false;
        }
    }

    /// Drop pending work and return to Idle
    pub fn clear(&mut self) {
        self.schedule.clear();
        self.state = WaveState::default();
        self.config = None;
    }

    fn refresh_counts(&mut self, manager: &EntityManager) {
        self.state.asteroid_count = manager.count(EntityKind::Asteroid) as u32;
        self.state.enemy_count = manager.count(EntityKind::Enemy) as u32;
    }

    fn asteroid_spawn(&self, config: &WaveConfig, manager: &EntityManager, rng: &mut impl Rng) -> AsteroidSpawn {
        let bounds = manager.tuning().world.bounds();
        let random_point = |rng: &mut _| {
            Vec2::new(
                random_in(rng, bounds.half_width),
                random_in(rng, bounds.half_height),
            )
        };

        let mut position = random_point(rng);
        let mut attempts = 1;
        while position.length() < self.tuning.safe_radius && attempts < self.tuning.spawn_attempts {
            position = random_point(rng);
            attempts += 1;
        }

        let (lo, hi) = self.tuning.asteroid_speed;
        let speed = if hi > lo { rng.random_range(lo..hi) } else { lo } * config.speed_multiplier;
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        AsteroidSpawn {
            size: config.roll_size(rng),
            position,
            velocity: Vec2::from_angle(angle) * speed,
            spin: random_spin(rng, manager.tuning().asteroids.max_spin),
        }
    }

    /// Enemy types available on the current wave
    fn unlocked_types(&self) -> Vec<EnemyType> {
        let wave = self.state.current_wave;
        [
            (EnemyType::Hunter, self.tuning.hunter_from_wave),
            (EnemyType::Sniper, self.tuning.sniper_from_wave),
            (EnemyType::Kamikaze, self.tuning.kamikaze_from_wave),
        ]
        .into_iter()
        .filter(|(_, from)| wave >= *from)
        .map(|(enemy_type, _)| enemy_type)
        .collect()
    }

    fn spawn_enemies(
        &mut self,
        count: u32,
        manager: &mut EntityManager,
        rng: &mut impl Rng,
        events: &mut Vec<GameEvent>,
    ) {
        let types = self.unlocked_types();
        let target = manager.first_active_ship();
        let avoid = target
            .and_then(|h| manager.get(h))
            .map_or(Vec2::ZERO, |ship| ship.body.position);
        let bounds = manager.tuning().world.bounds();

        for _ in 0..count {
            let enemy_type = if types.is_empty() {
                EnemyType::Hunter
            } else {
                types[rng.random_range(0..types.len())]
            };

            let mut position = edge_point(rng, bounds.half_width, bounds.half_height);
            let mut attempts = 1;
            while position.distance(avoid) < self.tuning.safe_radius && attempts < self.tuning.spawn_attempts {
                position = edge_point(rng, bounds.half_width, bounds.half_height);
                attempts += 1;
            }

            manager.spawn::<super::enemy::Enemy>(EnemySpawn {
                enemy_type,
                position,
                velocity: Vec2::ZERO,
                target,
            });
        }

        log::info!("Wave {}: {} enemies arrived", self.state.current_wave, count);
        events.push(GameEvent::EnemiesSpawned {
            wave: self.state.current_wave,
            count,
        });
        self.refresh_counts(manager);
    }
}

fn random_in(rng: &mut impl Rng, half: f32) -> f32 {
    if half > 0.0 { rng.random_range(-half..half) } else { 0.0 }
}

/// Random point on the world border
fn edge_point(rng: &mut impl Rng, half_width: f32, half_height: f32) -> Vec2 {
    match rng.random_range(0..4) {
        0 => Vec2::new(random_in(rng, half_width), half_height),
        1 => Vec2::new(random_in(rng, half_width), -half_height),
        2 => Vec2::new(half_width, random_in(rng, half_height)),
        _ => Vec2::new(-half_width, random_in(rng, half_height)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::asteroid::Asteroid;
    use crate::sim::ship::Ship;
    use crate::tuning::Tuning;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn setup() -> (WaveSystem, EntityManager, Pcg32) {
        let tuning = Tuning::default();
        (
            WaveSystem::new(&tuning.waves),
            EntityManager::new(tuning),
            Pcg32::seed_from_u64(99),
        )
    }

    fn kill_all_asteroids(manager: &mut EntityManager) {
        for h in manager.asteroids().handles() {
            if let Some(a) = manager.get_mut::<Asteroid>(h) {
                a.body.deactivate();
            }
        }
    }

    #[test]
    fn test_wave_config_table() {
        let tuning = WaveTuning::default();
        let w1 = generate_wave_config(1, &tuning);
        assert_eq!(w1.asteroid_count, 3);
        assert_eq!(w1.size_weights, [80, 20, 0]);
        assert_eq!(w1.enemy_count, 0);
        assert_eq!(w1.speed_multiplier, 1.0);
        assert!((w1.pickup_chance - 0.1).abs() < 1e-6);

        let w3 = generate_wave_config(3, &tuning);
        assert_eq!(w3.asteroid_count, 7);
        assert_eq!(w3.size_weights, [50, 30, 20]);
        assert_eq!(w3.enemy_count, 1);

        let w6 = generate_wave_config(6, &tuning);
        assert_eq!(w6.size_weights, [30, 40, 30]);
        assert_eq!(w6.enemy_count, 2);
        assert!((w6.speed_multiplier - 1.5).abs() < 1e-6);

        let w20 = generate_wave_config(20, &tuning);
        assert_eq!(w20.asteroid_count, 20);
        assert_eq!(w20.enemy_count, 5);
        assert!((w20.pickup_chance - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_start_wave_spawns_away_from_center() {
        let (mut waves, mut manager, mut rng) = setup();
        let mut events = Vec::new();
        waves.next_wave(&mut manager, &mut rng, &mut events);

        assert_eq!(waves.current_wave(), 1);
        assert_eq!(waves.phase(), WavePhase::Active);
        assert_eq!(manager.count(EntityKind::Asteroid), 3);
        for (_, a) in manager.asteroids().iter() {
            assert!(a.body.position.length() >= 150.0);
            assert_ne!(a.size, AsteroidSize::Small);
            let speed = a.body.velocity.length();
            assert!((10.0..=30.0).contains(&speed));
        }
        assert_eq!(
            events,
            vec![GameEvent::WaveStarted {
                wave: 1,
                asteroids: 3,
                enemies: 0
            }]
        );
    }

    #[test]
    fn test_completion_and_advance() {
        let (mut waves, mut manager, mut rng) = setup();
        let mut events = Vec::new();
        waves.next_wave(&mut manager, &mut rng, &mut events);
        events.clear();

        waves.update(0.1, &mut manager, &mut rng, &mut events);
        assert_eq!(waves.phase(), WavePhase::Active);

        kill_all_asteroids(&mut manager);
        waves.update(0.1, &mut manager, &mut rng, &mut events);
        assert_eq!(waves.phase(), WavePhase::Complete);
        assert_eq!(
            events,
            vec![GameEvent::WaveComplete {
                wave: 1,
                perfect: true
            }]
        );

        // Nothing happens until the transition delay has passed
        waves.update(1.9, &mut manager, &mut rng, &mut events);
        assert_eq!(waves.current_wave(), 1);
        waves.update(0.2, &mut manager, &mut rng, &mut events);
        assert_eq!(waves.current_wave(), 2);
        assert_eq!(manager.count(EntityKind::Asteroid), 5);
    }

    #[test]
    fn test_damage_spoils_perfect_wave() {
        let (mut waves, mut manager, mut rng) = setup();
        let mut events = Vec::new();
        waves.next_wave(&mut manager, &mut rng, &mut events);
        waves.observe(&GameEvent::ShipDamaged {
            amount: 10.0,
            health: 90.0,
        });
        kill_all_asteroids(&mut manager);
        events.clear();
        waves.update(0.1, &mut manager, &mut rng, &mut events);
        assert_eq!(
            events,
            vec![GameEvent::WaveComplete {
                wave: 1,
                perfect: false
            }]
        );
    }

    #[test]
    fn test_pending_enemies_block_completion() {
        let (mut waves, mut manager, mut rng) = setup();
        let ship = manager.spawn::<Ship>(Vec2::ZERO);
        let mut events = Vec::new();
        waves.state.current_wave = 2;
        waves.next_wave(&mut manager, &mut rng, &mut events);
        assert_eq!(waves.config().unwrap().enemy_count, 1);
        assert!(waves.enemies_pending());

        kill_all_asteroids(&mut manager);
        waves.update(1.0, &mut manager, &mut rng, &mut events);
        assert_eq!(waves.phase(), WavePhase::Active);

        waves.update(2.5, &mut manager, &mut rng, &mut events);
        assert_eq!(manager.count(EntityKind::Enemy), 1);
        assert!(events.contains(&GameEvent::EnemiesSpawned { wave: 3, count: 1 }));
        let (_, enemy) = manager.enemies().iter().next().unwrap();
        assert_eq!(enemy.enemy_type, EnemyType::Hunter);
        assert_eq!(enemy.target, Some(ship));
        assert!(enemy.body.position.length() >= 150.0);
        assert_eq!(waves.phase(), WavePhase::Active);
    }

    #[test]
    fn test_unlocks() {
        let (mut waves, _, _) = setup();
        waves.state.current_wave = 3;
        assert_eq!(waves.unlocked_types(), vec![EnemyType::Hunter]);
        waves.state.current_wave = 6;
        assert_eq!(
            waves.unlocked_types(),
            vec![EnemyType::Hunter, EnemyType::Sniper, EnemyType::Kamikaze]
        );
    }

    #[test]
    fn test_skip_wave() {
        let (mut waves, mut manager, mut rng) = setup();
        let mut events = Vec::new();
        waves.state.current_wave = 3;
        waves.next_wave(&mut manager, &mut rng, &mut events);
        waves.skip_wave(&mut manager, &mut rng, &mut events);
        assert_eq!(waves.current_wave(), 5);
        // Only the wave 5 enemy spawn is left
        assert_eq!(waves.schedule.len(), 1);
        assert!(waves.enemies_pending());
        assert_eq!(manager.count(EntityKind::Asteroid), 11);
    }

    #[test]
    fn test_clear_purges_schedule() {
        let (mut waves, mut manager, mut rng) = setup();
        let mut events = Vec::new();
        waves.state.current_wave = 4;
        waves.next_wave(&mut manager, &mut rng, &mut events);
        assert!(waves.enemies_pending());
        waves.clear();
        assert!(!waves.enemies_pending());
        assert_eq!(waves.phase(), WavePhase::Idle);
        assert_eq!(waves.current_wave(), 0);
    }
}
