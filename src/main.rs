//! Planetoids entry point
//!
//! Handles platform-specific initialization, reports the audio status and runs
//! a headless demo with an autopilot at the controls.

use planetoids::audio::{AudioStatus, open_device};
use planetoids::consts::*;
use planetoids::game::Command;
use planetoids::sim::{EntityKind, GameEvent, GamePhase, Snapshot};
use planetoids::{Game, Settings, heading_of, toroidal_delta};

/// Heading error (radians) inside which the autopilot opens fire
const AIM_TOLERANCE: f32 = 0.15;
/// Ticks between autopilot shots
const FIRE_INTERVAL: u64 = 10;
/// Closer than this and the autopilot bails out through hyperspace
const PANIC_DISTANCE: f32 = 45.0;

/// Steer toward the nearest asteroid and shoot it; jump away when cornered
fn autopilot(game: &mut Game, snap: &Snapshot, tick: u64) {
    let Some(ship) = snap.entities.iter().find(|e| e.kind == EntityKind::Ship) else {
        return;
    };

    let nearest = snap
        .entities
        .iter()
        .filter(|e| e.alive && matches!(e.kind, EntityKind::Asteroid(_) | EntityKind::Alien))
        .map(|e| (toroidal_delta(ship.pos, e.pos), e.radius))
        .min_by(|a, b| a.0.length().total_cmp(&b.0.length()));

    game.release(Command::RotateLeft);
    game.release(Command::RotateRight);
    game.release(Command::Thrust);

    let Some((delta, radius)) = nearest else {
        return;
    };

    let error = (heading_of(delta) - ship.heading + std::f32::consts::PI)
        .rem_euclid(std::f32::consts::TAU)
        - std::f32::consts::PI;
    if error > AIM_TOLERANCE {
        game.press(Command::RotateRight);
    } else if error < -AIM_TOLERANCE {
        game.press(Command::RotateLeft);
    } else if tick % FIRE_INTERVAL == 0 {
        game.press(Command::Fire);
    }

    let gap = delta.length() - radius - ship.radius;
    if gap < PANIC_DISTANCE && !snap.invulnerable && snap.hyperspace_cooldown_secs == 0.0 {
        game.press(Command::Hyperspace);
    } else if gap > 250.0 && snap.fuel > 0.0 {
        game.press(Command::Thrust);
    }
}

fn log_event(event: &GameEvent) {
    match event {
        GameEvent::LevelStarted { level, asteroids } => {
            log::info!("Level {level} begins with {asteroids} asteroids")
        }
        GameEvent::ShipDamaged { kind, health, .. } => {
            log::info!("Ship took {kind:?}, health now {health}")
        }
        GameEvent::Hyperspace { malfunction: true } => log::info!("Hyperspace malfunction!"),
        GameEvent::GameOver { score } => log::info!("GAME OVER - final score {score}"),
        other => log::trace!("{other:?}"),
    }
}

/// Drive the game for `ticks` fixed steps. Returns the final snapshot.
fn run_demo(game: &mut Game, ticks: u64, mut pace: impl FnMut()) -> Snapshot {
    game.press(Command::Start);
    for t in 0..ticks {
        let snap = game.snapshot();
        if snap.phase == GamePhase::GameOver {
            break;
        }
        autopilot(game, &snap, t);

        for event in game.step() {
            log_event(&event);
        }
        pace();
    }
    game.press(Command::Quit);
    game.snapshot()
}

fn report(status: &AudioStatus) {
    let line = status.status_line();
    println!("{line}");
    match status {
        AudioStatus::Ready => log::info!("{line}"),
        AudioStatus::Unavailable(_) => log::warn!("{line}"),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Planetoids (native) starting...");

    let settings = Settings::load();
    let (device, status) = open_device(&settings);
    report(&status);

    let seed = settings.seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    });
    log::info!("Seed: {seed}");

    let mut game = Game::new(seed, device);
    let ticks = (settings.demo_seconds * TICK_HZ as f32).round() as u64;
    let frame = std::time::Duration::from_secs_f32(SIM_DT);
    let final_state = run_demo(&mut game, ticks, || std::thread::sleep(frame));

    log::info!(
        "Demo finished: level {}, score {}, health {}",
        final_state.level,
        final_state.score,
        final_state.health
    );
    match serde_json::to_string(&final_state) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Could not serialize snapshot: {e}"),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Planetoids (wasm) starting...");

    let settings = Settings::load();
    let (device, status) = open_device(&settings);
    report(&status);

    let seed = settings.seed.unwrap_or_else(|| {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now() as u64)
            .unwrap_or(0)
    });

    let mut game = Game::new(seed, device);
    let ticks = (settings.demo_seconds * TICK_HZ as f32).round() as u64;
    let final_state = run_demo(&mut game, ticks, || {});
    log::info!(
        "Demo finished: level {}, score {}",
        final_state.level,
        final_state.score
    );
}
