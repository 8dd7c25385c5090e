//! Score, combo multiplier and high score
//!
//! Every award is multiplied by the current combo multiplier and then bumps the
//! combo count. The combo decays if nothing scores within the combo window, and
//! taking damage resets it.

use std::fmt;

use super::events::GameEvent;
use crate::persistence::{HighScoreStore, MemoryStore};
use crate::tuning::{PointTable, ScoringTuning};

/// Combo counts at which the multiplier steps up
pub const COMBO_THRESHOLDS: [u32; 8] = [1, 2, 3, 5, 8, 12, 20, 30];
/// Multiplier reached at each threshold
pub const COMBO_MULTIPLIERS: [u32; 8] = [2, 3, 4, 5, 6, 7, 8, 9];

/// Multiplier for a combo count (1 below the first threshold)
pub fn multiplier_for(count: u32) -> u32 {
    COMBO_THRESHOLDS
        .iter()
        .zip(COMBO_MULTIPLIERS)
        .rev()
        .find(|(threshold, _)| count >= **threshold)
        .map_or(1, |(_, multiplier)| multiplier)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComboState {
    pub multiplier: u32,
    pub count: u32,
    /// Seconds until the combo expires
    pub timer: f32,
    pub max_timer: f32,
}

impl ComboState {
    fn new(max_timer: f32) -> Self {
        Self {
            multiplier: 1,
            count: 0,
            timer: 0.0,
            max_timer,
        }
    }

    fn reset(&mut self) {
        *self = Self::new(self.max_timer);
    }
}

/// Result of one award
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Award {
    pub base: u32,
    pub multiplier: u32,
    pub points: u64,
}

pub struct ScoringSystem {
    points: PointTable,
    combo: ComboState,
    score: u64,
    high_score: u64,
    /// A HighScore event was already emitted this run
    beat_high_score: bool,
    store: Box<dyn HighScoreStore>,
}

impl ScoringSystem {
    /// Create with the high score read from `store` (unreadable stores start at 0)
    pub fn new(tuning: &ScoringTuning, mut store: Box<dyn HighScoreStore>) -> Self {
        let high_score = store.load_high_score().unwrap_or_else(|e| {
            log::warn!("Could not load high score: {}", e);
            0
        });
        Self {
            points: tuning.points.clone(),
            combo: ComboState::new(tuning.combo_window),
            score: 0,
            high_score,
            beat_high_score: false,
            store,
        }
    }

    pub fn in_memory(tuning: &ScoringTuning) -> Self {
        Self::new(tuning, Box::new(MemoryStore::new()))
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn high_score(&self) -> u64 {
        self.high_score
    }

    pub fn combo(&self) -> &ComboState {
        &self.combo
    }

    pub fn points(&self) -> &PointTable {
        &self.points
    }

    /// Add `round(base * multiplier)` to the score, then extend the combo
    pub fn award_points(&mut self, base: u32, events: &mut Vec<GameEvent>) -> Award {
        let multiplier = self.combo.multiplier;
        let points = (base as f64 * multiplier as f64).round() as u64;
        self.score += points;

        self.combo.count += 1;
        self.combo.multiplier = multiplier_for(self.combo.count);
        self.combo.timer = self.combo.max_timer;

        events.push(GameEvent::PointsAwarded {
            base,
            multiplier,
            points,
            score: self.score,
        });

        if self.score > self.high_score {
            self.high_score = self.score;
            if let Err(e) = self.store.save_high_score(self.high_score) {
                log::warn!("Could not save high score: {}", e);
            }
            if !self.beat_high_score {
                self.beat_high_score = true;
                log::info!("New high score");
                events.push(GameEvent::HighScore { score: self.score });
            }
        }

        Award {
            base,
            multiplier,
            points,
        }
    }

    /// Decay the combo timer
    pub fn update_combo(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        if self.combo.count == 0 {
            return;
        }
        self.combo.timer -= dt;
        if self.combo.timer <= 0.0 {
            events.push(GameEvent::ComboExpired {
                count: self.combo.count,
            });
            self.combo.reset();
        }
    }

    pub fn reset_combo(&mut self) {
        self.combo.reset();
    }

    /// Turn a domain event into score changes
    pub fn observe(&mut self, event: &GameEvent, events: &mut Vec<GameEvent>) {
        match *event {
            GameEvent::AsteroidDestroyed {
                size,
                by_player: true,
                ..
            } => {
                self.award_points(self.points.asteroid(size), events);
            }
            GameEvent::EnemyDestroyed { by_player: true, .. } => {
                self.award_points(self.points.enemy, events);
            }
            GameEvent::PickupCollected { .. } => {
                self.award_points(self.points.pickup, events);
            }
            GameEvent::ShipDamaged { .. } => self.reset_combo(),
            GameEvent::WaveComplete { perfect, .. } => {
                self.award_points(self.points.wave_complete, events);
                if perfect {
                    self.award_points(self.points.perfect_wave, events);
                }
            }
            _ => {}
        }
    }

    /// Clear score and combo for a new run (the high score stays)
    pub fn reset_run(&mut self) {
        self.score = 0;
        self.beat_high_score = false;
        self.combo.reset();
    }
}

impl fmt::Debug for ScoringSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScoringSystem")
            .field("score", &self.score)
            .field("high_score", &self.high_score)
            .field("combo", &self.combo)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::asteroid::AsteroidSize;
    use glam::Vec2;
    use proptest::prelude::*;

    fn scoring() -> ScoringSystem {
        ScoringSystem::in_memory(&ScoringTuning::default())
    }

    #[test]
    fn test_multiplier_table() {
        let counts = [0, 1, 2, 3, 4, 5, 7, 8, 11, 12, 19, 20, 29, 30, 31];
        let expected = [1, 2, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9];
        for (count, want) in counts.into_iter().zip(expected) {
            assert_eq!(multiplier_for(count), want, "count {}", count);
        }
    }

    #[test]
    fn test_first_award_uses_multiplier_one() {
        let mut s = scoring();
        let mut events = Vec::new();
        let award = s.award_points(20, &mut events);
        assert_eq!(award.multiplier, 1);
        assert_eq!(award.points, 20);
        assert_eq!(s.score(), 20);
        assert_eq!(s.combo().count, 1);
        assert_eq!(s.combo().multiplier, 2);

        let award = s.award_points(50, &mut events);
        assert_eq!(award.points, 100);
        assert_eq!(s.score(), 120);
    }

    #[test]
    fn test_combo_expires() {
        let mut s = scoring();
        let mut events = Vec::new();
        s.award_points(10, &mut events);
        events.clear();

        s.update_combo(2.9, &mut events);
        assert_eq!(s.combo().count, 1);
        s.update_combo(0.2, &mut events);
        assert_eq!(s.combo().count, 0);
        assert_eq!(s.combo().multiplier, 1);
        assert_eq!(events, vec![GameEvent::ComboExpired { count: 1 }]);
    }

    #[test]
    fn test_award_resets_combo_timer() {
        let mut s = scoring();
        let mut events = Vec::new();
        s.award_points(10, &mut events);
        s.update_combo(2.0, &mut events);
        s.award_points(10, &mut events);
        assert_eq!(s.combo().timer, 3.0);
    }

    #[test]
    fn test_observe_player_kills_only() {
        let mut s = scoring();
        let mut events = Vec::new();
        s.observe(
            &GameEvent::AsteroidDestroyed {
                size: AsteroidSize::Small,
                position: Vec2::ZERO,
                by_player: false,
                pieces: 0,
            },
            &mut events,
        );
        assert_eq!(s.score(), 0);

        s.observe(
            &GameEvent::AsteroidDestroyed {
                size: AsteroidSize::Small,
                position: Vec2::ZERO,
                by_player: true,
                pieces: 0,
            },
            &mut events,
        );
        assert_eq!(s.score(), 100);
    }

    #[test]
    fn test_damage_resets_combo() {
        let mut s = scoring();
        let mut events = Vec::new();
        s.award_points(10, &mut events);
        s.award_points(10, &mut events);
        s.observe(
            &GameEvent::ShipDamaged {
                amount: 10.0,
                health: 90.0,
            },
            &mut events,
        );
        assert_eq!(s.combo().count, 0);
        assert_eq!(s.award_points(10, &mut events).multiplier, 1);
    }

    #[test]
    fn test_perfect_wave_bonus() {
        let mut s = scoring();
        let mut events = Vec::new();
        s.observe(
            &GameEvent::WaveComplete {
                wave: 1,
                perfect: true,
            },
            &mut events,
        );
        // 100 * 1 + 500 * 2
        assert_eq!(s.score(), 1100);
    }

    #[test]
    fn test_high_score_saved_and_kept_across_runs() {
        let mut s = ScoringSystem::new(&ScoringTuning::default(), Box::new(MemoryStore::with_score(15)));
        assert_eq!(s.high_score(), 15);
        let mut events = Vec::new();
        s.award_points(20, &mut events);
        s.award_points(20, &mut events);
        assert_eq!(s.high_score(), 60);
        let highs = events
            .iter()
            .filter(|e| matches!(e, GameEvent::HighScore { .. }))
            .count();
        assert_eq!(highs, 1);

        s.reset_run();
        assert_eq!(s.score(), 0);
        assert_eq!(s.high_score(), 60);
    }

    proptest! {
        #[test]
        fn prop_award_without_combo_adds_base(base in 0u32..100_000, start in 0u32..50) {
            let mut s = scoring();
            let mut events = Vec::new();
            for _ in 0..start {
                s.award_points(1, &mut events);
            }
            s.reset_combo();
            let before = s.score();
            let award = s.award_points(base, &mut events);
            prop_assert_eq!(award.multiplier, 1);
            prop_assert_eq!(s.score() - before, base as u64);
        }
    }
}
