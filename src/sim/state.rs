//! Game state
//!
//! Everything one run owns: the seeded RNG, the entity manager and the systems
//! that act on it.

use std::fmt;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::CollisionSystem;
use super::events::{EventBus, GameEvent};
use super::manager::EntityManager;
use super::pool::Handle;
use super::scoring::ScoringSystem;
use super::ship::Ship;
use super::wave::WaveSystem;
use crate::highscores::HighScores;
use crate::persistence::{HighScoreStore, MemoryStore};
use crate::tuning::Tuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Ship destroyed, run ended
    GameOver,
}

/// Complete game state for one run
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub manager: EntityManager,
    pub collisions: CollisionSystem,
    pub scoring: ScoringSystem,
    pub waves: WaveSystem,
    /// Callbacks fed with every event at the end of a tick
    pub events: EventBus,
    pub phase: GamePhase,
    /// Simulated seconds this run
    pub time: f32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// The player's ship
    pub ship: Handle<Ship>,
    /// Finished runs
    pub leaderboard: HighScores,
    /// Events produced by the most recent tick
    pub last_events: Vec<GameEvent>,
    /// Events raised outside a tick, delivered with the next one
    pub(crate) queued_events: Vec<GameEvent>,
}

impl GameState {
    /// New run with default tuning and an in-memory high score
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default(), Box::new(MemoryStore::new()))
    }

    pub fn with_tuning(seed: u64, tuning: Tuning, store: Box<dyn HighScoreStore>) -> Self {
        let collisions = CollisionSystem::from_tuning(&tuning);
        let scoring = ScoringSystem::new(&tuning.scoring, store);
        let waves = WaveSystem::new(&tuning.waves);
        let mut manager = EntityManager::new(tuning);
        let ship = manager.spawn::<Ship>(glam::Vec2::ZERO);

        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            manager,
            collisions,
            scoring,
            waves,
            events: EventBus::new(),
            phase: GamePhase::Playing,
            time: 0.0,
            time_ticks: 0,
            ship,
            leaderboard: HighScores::new(),
            last_events: Vec::new(),
            queued_events: Vec::new(),
        };
        state.start_first_wave();
        log::info!("New run (seed {})", seed);
        state
    }

    /// Start over with the same seed. The leaderboard, high score and
    /// subscribers are kept.
    pub fn restart(&mut self) {
        self.manager.clear_all();
        self.waves.clear();
        self.scoring.reset_run();
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.ship = self.manager.spawn::<Ship>(glam::Vec2::ZERO);
        self.phase = GamePhase::Playing;
        self.time = 0.0;
        self.time_ticks = 0;
        self.last_events.clear();
        self.queued_events.clear();
        self.start_first_wave();
        log::info!("Run restarted (seed {})", self.seed);
    }

    fn start_first_wave(&mut self) {
        self.waves
            .next_wave(&mut self.manager, &mut self.rng, &mut self.queued_events);
    }

    /// The player's ship while it is alive
    pub fn ship(&self) -> Option<&Ship> {
        self.manager.ships().get_active(self.ship)
    }

    pub fn score(&self) -> u64 {
        self.scoring.score()
    }

    pub fn wave(&self) -> u32 {
        self.waves.current_wave()
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }
}

impl fmt::Debug for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameState")
            .field("seed", &self.seed)
            .field("phase", &self.phase)
            .field("time_ticks", &self.time_ticks)
            .field("wave", &self.waves.state())
            .field("scoring", &self.scoring)
            .finish_non_exhaustive()
    }
}
