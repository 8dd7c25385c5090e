//! Starshard headless runner
//!
//! Plays one run on autopilot and prints a summary.
//!
//! Usage: `starshard [seed] [tuning.json]`
//!
//! Set `STARSHARD_HIGHSCORE` to a file path to keep the high score between runs,
//! and `STARSHARD_LEADERBOARD` to keep the top-10 table of finished runs.

use std::cell::RefCell;
use std::rc::Rc;

use starshard::consts::FRAME_DT;
use starshard::highscores::{HighScores, format_duration};
use starshard::persistence::{HighScoreStore, JsonFileStore, MemoryStore};
use starshard::sim::{BulletOwner, EventKind, GameEvent, GameState, TickInput, tick};
use starshard::{SimResult, Tuning};

/// Longest run the runner simulates (seconds)
const MAX_RUN_SECONDS: f32 = 600.0;

#[derive(Debug, Default)]
struct Summary {
    asteroids: u32,
    enemies: u32,
    pickups: u32,
    shots: u32,
    hits_taken: u32,
    waves_cleared: u32,
    perfect_waves: u32,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> SimResult<()> {
    let mut args = std::env::args().skip(1);
    let seed = match args.next() {
        Some(arg) => arg.parse().unwrap_or_else(|_| {
            log::warn!("Seed '{}' is not a number, using 0", arg);
            0
        }),
        None => 0,
    };
    let tuning = match args.next() {
        Some(path) => Tuning::load(path)?,
        None => Tuning::default(),
    };
    let store: Box<dyn HighScoreStore> = match std::env::var("STARSHARD_HIGHSCORE") {
        Ok(path) => Box::new(JsonFileStore::new(path)),
        Err(_) => Box::new(MemoryStore::new()),
    };

    let board_path = std::env::var("STARSHARD_LEADERBOARD").ok();

    log::info!("Starshard (headless) starting, seed {}", seed);
    let mut state = GameState::with_tuning(seed, tuning, store);
    if let Some(path) = &board_path {
        state.leaderboard = HighScores::load(path)?;
    }

    let summary = Rc::new(RefCell::new(Summary::default()));
    let counter = summary.clone();
    state.events.subscribe_all(move |event| {
        let mut s = counter.borrow_mut();
        match event {
            GameEvent::AsteroidDestroyed { by_player: true, .. } => s.asteroids += 1,
            GameEvent::EnemyDestroyed { by_player: true, .. } => s.enemies += 1,
            GameEvent::PickupCollected { .. } => s.pickups += 1,
            GameEvent::ShipDamaged { .. } => s.hits_taken += 1,
            GameEvent::WaveComplete { perfect, .. } => {
                s.waves_cleared += 1;
                if *perfect {
                    s.perfect_waves += 1;
                }
            }
            _ => {}
        }
    });
    let shots = summary.clone();
    state.events.subscribe(EventKind::BulletFired, move |event| {
        if matches!(
            event,
            GameEvent::BulletFired {
                owner: BulletOwner::Player,
                ..
            }
        ) {
            shots.borrow_mut().shots += 1;
        }
    });
    state.events.subscribe(EventKind::WaveStarted, |event| {
        if let GameEvent::WaveStarted {
            wave,
            asteroids,
            enemies,
        } = event
        {
            println!("wave {:>2}: {} asteroids, {} enemies", wave, asteroids, enemies);
        }
    });

    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };
    while !state.is_game_over() && state.time < MAX_RUN_SECONDS {
        tick(&mut state, &input, FRAME_DT);
    }

    let s = summary.borrow();
    println!();
    println!("seed        {}", state.seed);
    println!("survived    {}", format_duration(state.time));
    println!("wave        {}", state.wave());
    println!("score       {}", state.score());
    println!("high score  {}", state.scoring.high_score());
    println!("asteroids   {}", s.asteroids);
    println!("enemies     {}", s.enemies);
    println!("pickups     {}", s.pickups);
    println!("shots       {}", s.shots);
    println!("hits taken  {}", s.hits_taken);
    println!("waves       {} cleared ({} perfect)", s.waves_cleared, s.perfect_waves);
    if !state.is_game_over() {
        println!("(stopped after {} simulated seconds)", MAX_RUN_SECONDS);
    }
    if let Some(best) = state.leaderboard.top_score() {
        println!("board best  {} ({} runs)", best, state.leaderboard.entries.len());
    }
    if let Some(path) = &board_path {
        state.leaderboard.save(path)?;
    }
    Ok(())
}
