//! Fixed timestep simulation tick
//!
//! Core game loop that advances the simulation deterministically:
//! input → entities → collisions → scoring → combo → waves → event dispatch.

use glam::Vec2;

use super::asteroid::Asteroid;
use super::bullet::{Bullet, BulletOwner};
use super::enemy::lead_target;
use super::events::GameEvent;
use super::state::{GamePhase, GameState};
use crate::highscores::HighScoreEntry;
use crate::{angle_of, shortest_angle_delta};

/// Autopilot fires once its heading is this close to the aim point (radians)
const AUTOPILOT_FIRE_ARC: f32 = 0.2;
/// Autopilot thrusts toward targets farther than this
const AUTOPILOT_CLOSE_IN: f32 = 250.0;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Heading the ship should turn toward (from mouse/stick)
    pub target_rotation: Option<f32>,
    /// Main engine on
    pub thrust: bool,
    /// Fire when the cooldown allows
    pub fire: bool,
    /// Pause toggle
    pub pause: bool,
    /// Skip to next wave (debug/testing)
    pub skip_wave: bool,
    /// Idle/demo mode - AI flies the ship
    pub idle_mode: bool,
}

/// Advance the game state by one timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                return;
            }
            GamePhase::Paused => state.phase = GamePhase::Playing,
            GamePhase::GameOver => {}
        }
    }

    // Don't tick if paused or game over
    if state.phase != GamePhase::Playing {
        return;
    }

    let dt = dt.clamp(0.0, state.manager.tuning().world.max_dt);
    let mut events = std::mem::take(&mut state.queued_events);

    let mut input = input.clone();
    if input.idle_mode {
        autopilot(state, &mut input);
    }

    if input.skip_wave {
        state
            .waves
            .skip_wave(&mut state.manager, &mut state.rng, &mut events);
    }

    apply_input(state, &input, &mut events);

    state.manager.update(dt, &mut state.rng, &mut events);
    state
        .collisions
        .update(&mut state.manager, &mut state.rng, &mut events);
    let mut settled = settle(state, &mut events, 0);

    state.scoring.update_combo(dt, &mut events);
    if state.phase == GamePhase::Playing {
        state
            .waves
            .update(dt, &mut state.manager, &mut state.rng, &mut events);
    }
    settled = settle(state, &mut events, settled);
    debug_assert_eq!(settled, events.len());

    state.time += dt;
    state.time_ticks += 1;

    state.events.dispatch(&events);
    state.last_events = events;
}

/// Steer, thrust and fire the player's ship
fn apply_input(state: &mut GameState, input: &TickInput, events: &mut Vec<GameEvent>) {
    let (pools, tuning) = state.manager.parts_mut();
    let Some(ship) = pools.ships.get_active_mut(state.ship) else {
        return;
    };

    if let Some(rotation) = input.target_rotation {
        ship.target_rotation = rotation;
    }
    ship.thrusting = input.thrust;

    let shot = if input.fire {
        ship.try_fire(&tuning.ship, &tuning.bullets)
    } else {
        None
    };
    if let Some(shot) = shot {
        state.manager.spawn::<Bullet>(shot);
        events.push(GameEvent::BulletFired {
            owner: BulletOwner::Player,
            position: shot.position,
        });
    }
}

/// Feed every event from `from` onward to the systems that react to events.
///
/// Reactions may push more events; those are settled too. Returns the number
/// of events settled.
fn settle(state: &mut GameState, events: &mut Vec<GameEvent>, from: usize) -> usize {
    let mut i = from;
    while i < events.len() {
        let event = events[i].clone();
        state.scoring.observe(&event, events);
        state.waves.observe(&event);
        if let GameEvent::ShipDestroyed { .. } = event {
            game_over(state, events);
        }
        i += 1;
    }
    i
}

/// End the run and record it on the leaderboard
fn game_over(state: &mut GameState, events: &mut Vec<GameEvent>) {
    if state.phase == GamePhase::GameOver {
        return;
    }
    state.phase = GamePhase::GameOver;

    let score = state.scoring.score();
    let wave = state.waves.current_wave();
    let rank = state.leaderboard.add_score(HighScoreEntry {
        score,
        wave,
        seed: state.seed,
        time: state.time,
    });
    match rank {
        Some(rank) => log::info!("Game over: score {} on wave {} (rank {})", score, wave, rank),
        None => log::info!("Game over: score {} on wave {}", score, wave),
    }
    events.push(GameEvent::GameOver { score, wave });
}

/// Demo AI: turn toward the nearest asteroid (leading it), shoot when lined
/// up, close in when far away.
fn autopilot(state: &GameState, input: &mut TickInput) {
    let Some(ship) = state.ship() else {
        return;
    };
    let origin = ship.body.position;

    let Some(asteroid) = nearest_asteroid(state, origin) else {
        input.thrust = false;
        return;
    };

    let bullet_speed = state.manager.tuning().bullets.speed;
    let aim = lead_target(origin, asteroid.body.position, asteroid.body.velocity, bullet_speed);
    let to_aim = aim - origin;
    if to_aim.length_squared() < f32::EPSILON {
        input.fire = true;
        return;
    }

    let heading = angle_of(to_aim);
    input.target_rotation = Some(heading);
    input.fire = shortest_angle_delta(ship.body.rotation, heading).abs() < AUTOPILOT_FIRE_ARC;
    input.thrust = to_aim.length() > AUTOPILOT_CLOSE_IN;
}

/// Nearest active asteroid to `from`
pub fn nearest_asteroid(state: &GameState, from: Vec2) -> Option<&Asteroid> {
    state
        .manager
        .asteroids()
        .iter()
        .map(|(_, a)| a)
        .min_by(|a, b| {
            let da = a.body.position.distance_squared(from);
            let db = b.body.position.distance_squared(from);
            da.total_cmp(&db)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FRAME_DT;
    use crate::sim::asteroid::{AsteroidSize, AsteroidSpawn};
    use crate::sim::bullet::BulletSpawn;
    use crate::sim::entity::EntityKind;
    use crate::sim::events::EventKind;
    use crate::sim::wave::WavePhase;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn run_ticks(state: &mut GameState, input: &TickInput, ticks: usize) -> Vec<GameEvent> {
        let mut all = Vec::new();
        for _ in 0..ticks {
            tick(state, input, FRAME_DT);
            all.extend(state.last_events.iter().cloned());
        }
        all
    }

    #[test]
    fn test_tick_pause() {
        let mut state = GameState::new(12345);
        tick(&mut state, &TickInput::default(), FRAME_DT);
        assert_eq!(state.time_ticks, 1);

        let input = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut state, &input, FRAME_DT);
        assert_eq!(state.phase, GamePhase::Paused);
        tick(&mut state, &TickInput::default(), FRAME_DT);
        assert_eq!(state.time_ticks, 1);

        // Unpause
        tick(&mut state, &input, FRAME_DT);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.time_ticks, 2);
    }

    #[test]
    fn test_dt_is_clamped() {
        let mut state = GameState::new(5);
        tick(&mut state, &TickInput::default(), 1.0);
        assert!((state.time - 0.033).abs() < 1e-6);
    }

    #[test]
    fn test_determinism() {
        // Two states with same seed should produce identical results
        let mut state1 = GameState::new(99999);
        let mut state2 = GameState::new(99999);
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };

        let events1 = run_ticks(&mut state1, &input, 600);
        let events2 = run_ticks(&mut state2, &input, 600);

        assert_eq!(events1, events2);
        assert_eq!(state1.score(), state2.score());
        assert_eq!(state1.wave(), state2.wave());
        let positions = |s: &GameState| -> Vec<Vec2> {
            s.manager.asteroids().iter().map(|(_, a)| a.body.position).collect()
        };
        assert_eq!(positions(&state1), positions(&state2));
    }

    #[test]
    fn test_fire_spawns_player_bullet() {
        let mut state = GameState::new(1);
        let input = TickInput {
            target_rotation: Some(0.0),
            fire: true,
            ..Default::default()
        };
        tick(&mut state, &input, FRAME_DT);
        assert!(state.last_events.iter().any(|e| matches!(
            e,
            GameEvent::BulletFired {
                owner: BulletOwner::Player,
                ..
            }
        )));
        assert_eq!(state.manager.count(EntityKind::Bullet), 1);

        // Cooldown blocks the next shot
        tick(&mut state, &input, FRAME_DT);
        assert_eq!(state.manager.count(EntityKind::Bullet), 1);
    }

    #[test]
    fn test_idle_mode_shoots() {
        let mut state = GameState::new(2024);
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        let events = run_ticks(&mut state, &input, 180);
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::BulletFired {
                owner: BulletOwner::Player,
                ..
            }
        )));
    }

    #[test]
    fn test_bus_receives_startup_and_tick_events() {
        let mut state = GameState::new(3);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        state.events.subscribe(EventKind::WaveStarted, move |e| {
            sink.borrow_mut().push(e.clone());
        });

        tick(&mut state, &TickInput::default(), FRAME_DT);
        assert_eq!(
            *seen.borrow(),
            vec![GameEvent::WaveStarted {
                wave: 1,
                asteroids: 3,
                enemies: 0
            }]
        );
    }

    #[test]
    fn test_ship_destroyed_ends_run() {
        let mut state = GameState::new(8);
        let ship = state.manager.get_mut(state.ship).unwrap();
        ship.invulnerable = false;
        ship.invuln_time = 0.0;
        ship.shield = 0.0;
        ship.health = 1.0;
        state.manager.spawn::<Asteroid>(AsteroidSpawn {
            size: AsteroidSize::Large,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            spin: 0.0,
        });

        tick(&mut state, &TickInput::default(), FRAME_DT);
        assert!(state.is_game_over());
        assert!(state.ship().is_none());
        assert!(state
            .last_events
            .iter()
            .any(|e| matches!(e, GameEvent::ShipDestroyed { .. })));
        assert!(state
            .last_events
            .contains(&GameEvent::GameOver { score: 0, wave: 1 }));

        // Frozen until restarted
        let ticks = state.time_ticks;
        tick(&mut state, &TickInput::default(), FRAME_DT);
        assert_eq!(state.time_ticks, ticks);

        state.restart();
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.ship().is_some());
    }

    #[test]
    fn test_skip_wave_input() {
        let mut state = GameState::new(77);
        let input = TickInput {
            skip_wave: true,
            ..Default::default()
        };
        tick(&mut state, &input, FRAME_DT);
        assert_eq!(state.wave(), 2);
        assert_eq!(state.score(), 0);
        assert_eq!(state.manager.count(EntityKind::Asteroid), 5);
    }

    #[test]
    fn test_wave_one_to_wave_two() {
        let mut state = GameState::new(2468);
        assert_eq!(state.manager.count(EntityKind::Asteroid), 3);

        let mut events = Vec::new();
        let mut guard = 0;
        while state.manager.count(EntityKind::Asteroid) > 0 {
            guard += 1;
            assert!(guard < 500, "asteroids never cleared");
            if let Some(target) = nearest_asteroid(&state, Vec2::ZERO).map(|a| a.body.position) {
                let shot = BulletSpawn::player(target, Vec2::ZERO, state.manager.tuning());
                state.manager.spawn::<Bullet>(shot);
            }
            tick(&mut state, &TickInput::default(), FRAME_DT);
            events.extend(state.last_events.iter().cloned());
        }

        assert_eq!(state.waves.phase(), WavePhase::Complete);
        assert!(events.contains(&GameEvent::WaveComplete {
            wave: 1,
            perfect: true
        }));
        assert!(state.score() > 0);

        events.extend(run_ticks(&mut state, &TickInput::default(), 130));
        assert_eq!(state.wave(), 2);
        assert_eq!(state.waves.phase(), WavePhase::Active);
        assert_eq!(state.manager.count(EntityKind::Asteroid), 5);
        assert!(events.contains(&GameEvent::WaveStarted {
            wave: 2,
            asteroids: 5,
            enemies: 0
        }));
    }
}
