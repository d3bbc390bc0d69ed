//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically.

use std::collections::HashSet;

use glam::Vec2;
use rand::Rng;

use super::collision::{Contact, EntityRef, detect_contacts};
use super::damage::{
    DamageEvent, DamageOutcome, apply_damage, decay_flash, refresh_condition, roll_malfunction,
};
use super::entity::AsteroidSize;
use super::state::{
    ALIEN_SCORE, EDGE_MARGIN, GameEvent, GamePhase, GameState, alien_spawn_interval,
};
use crate::audio::SoundEffect;
use crate::consts::*;

/// Hyperspace recharge time (3 seconds)
pub const HYPERSPACE_COOLDOWN_TICKS: u64 = 3 * TICKS_PER_SEC;

/// Input commands for a single tick (deterministic)
///
/// `fire`, `hyperspace`, `pause` and `start` are one-shots; the session clears
/// them after the first substep that sees them. The rest are held.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickInput {
    pub rotate_left: bool,
    pub rotate_right: bool,
    pub thrust: bool,
    pub fire: bool,
    pub hyperspace: bool,
    /// Pause toggle
    pub pause: bool,
    /// Start or restart a run
    pub start: bool,
}

impl TickInput {
    /// Drop the edge-triggered commands once a tick has consumed them
    pub fn clear_one_shots(&mut self) {
        self.fire = false;
        self.hyperspace = false;
        self.pause = false;
        self.start = false;
    }
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if input.start && matches!(state.phase, GamePhase::Attract | GamePhase::GameOver) {
        log::info!("Starting run (seed {})", state.seed);
        state.start_run();
        return;
    }

    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                return;
            }
            GamePhase::Paused => state.phase = GamePhase::Playing,
            _ => {}
        }
    }

    // Nothing moves outside of play; final state stays queryable
    if state.phase != GamePhase::Playing {
        return;
    }

    state.time_ticks += 1;
    let now = state.time_ticks;

    state.reap();

    apply_ship_input(state, input, dt, now);
    if state.ship.is_destroyed() {
        game_over(state);
        return;
    }

    advance_entities(state, dt);

    refresh_condition(&mut state.ship, now);
    decay_flash(&mut state.ship, dt);

    let contacts = detect_contacts(state);
    resolve_contacts(state, &contacts, now);

    if state.ship.is_destroyed() {
        game_over(state);
        return;
    }

    update_alien_spawner(state, dt);

    if state.asteroids_remaining() == 0 {
        state.level += 1;
        state.start_level();
    }

    state.normalize_order();
}

fn apply_ship_input(state: &mut GameState, input: &TickInput, dt: f32, now: u64) {
    // Recharge before reading input so a jump waits exactly the full cooldown
    state.ship.recharge_hyperspace();

    let turn = f32::from(u8::from(input.rotate_right)) - f32::from(u8::from(input.rotate_left));
    if turn != 0.0 {
        state.ship.rotate(turn, dt);
    }

    if input.thrust {
        state.ship.thrust(dt);
    }

    if input.fire {
        let id = state.next_entity_id();
        let bullet = state.ship.fire(id);
        state.bullets.push(bullet);
        state.events.push(GameEvent::Sound(SoundEffect::Shoot));
    }

    if input.hyperspace && state.ship.hyperspace_cooldown == 0 {
        hyperspace_jump(state, now);
    }
}

fn hyperspace_jump(state: &mut GameState, now: u64) {
    let dest = Vec2::new(
        state
            .rng
            .random_range(EDGE_MARGIN..SCREEN_WIDTH - EDGE_MARGIN),
        state
            .rng
            .random_range(EDGE_MARGIN..SCREEN_HEIGHT - EDGE_MARGIN),
    );
    state.ship.body.pos = dest;
    state.ship.body.vel = Vec2::ZERO;
    state.ship.hyperspace_cooldown = HYPERSPACE_COOLDOWN_TICKS;

    let malfunction = roll_malfunction(&mut state.rng);
    state.events.push(GameEvent::Hyperspace { malfunction });
    if !malfunction {
        return;
    }

    log::info!("Hyperspace malfunction at tick {}", now);
    let event = DamageEvent::hyperspace_malfunction(&state.ship);
    damage_ship(state, &event, now);
}

/// Run a hit through the damage machine and report it. Returns whether it registered.
fn damage_ship(state: &mut GameState, event: &DamageEvent, now: u64) -> bool {
    let outcome = apply_damage(&mut state.ship, event, now);
    if !outcome.accepted() {
        return false;
    }

    state.events.push(GameEvent::Sound(event.kind.sound()));
    state.events.push(GameEvent::ShipDamaged {
        kind: event.kind,
        amount: event.amount,
        health: state.ship.health,
    });
    if outcome == DamageOutcome::Destroyed {
        log::info!("Ship destroyed by {:?}", event.kind);
        state.events.push(GameEvent::ShipDestroyed { kind: event.kind });
    } else {
        log::debug!("Ship hit by {:?}, health {}", event.kind, state.ship.health);
    }
    true
}

fn advance_entities(state: &mut GameState, dt: f32) {
    state.ship.update(dt);

    for asteroid in &mut state.asteroids {
        asteroid.update(dt);
    }

    let ship_id = state.ship.id;
    let ship_pos = state.ship.body.pos;
    for i in 0..state.aliens.len() {
        // Targets are looked up by id each tick
        let target = state.aliens[i].target.filter(|&id| id == ship_id).map(|_| ship_pos);

        if let Some(pos) = target {
            state.aliens[i].steer(pos, dt);
        }
        state.aliens[i].update(dt);

        let Some(pos) = target else { continue };
        if state.aliens[i].fire_timer <= 0.0 {
            let id = state.next_entity_id();
            if let Some(bullet) = state.aliens[i].try_fire(id, pos, &mut state.rng) {
                state.bullets.push(bullet);
            }
        }
    }

    for bullet in &mut state.bullets {
        bullet.update(dt);
    }
}

/// Apply contacts in detection order. An entity consumed by an earlier contact
/// takes no further part this tick.
fn resolve_contacts(state: &mut GameState, contacts: &[Contact], now: u64) {
    let mut consumed: HashSet<EntityRef> = HashSet::new();

    for contact in contacts {
        if contact.participants().iter().any(|p| consumed.contains(p)) {
            continue;
        }

        match *contact {
            Contact::ShipStruck { ship, cause, kind } => {
                let event = DamageEvent::new(kind, ship);
                if !damage_ship(state, &event, now) {
                    continue;
                }
                if state.ship.is_destroyed() {
                    consumed.insert(EntityRef::Ship(ship));
                }
                // Aliens and their shots are spent on impact; asteroids keep going
                if matches!(cause, EntityRef::Alien(_) | EntityRef::Bullet(..)) {
                    kill(state, cause);
                    consumed.insert(cause);
                }
            }
            Contact::AsteroidShot { asteroid, .. } => {
                let Some(index) = state.asteroids.iter().position(|a| a.id == asteroid) else {
                    continue;
                };
                for p in contact.participants() {
                    kill(state, p);
                }
                consumed.extend(contact.participants());

                let size = state.asteroids[index].size;
                state.score += size.score();
                state.events.push(GameEvent::Sound(explosion_for(size)));
                let fragments = state.split_asteroid(index);
                state.events.push(GameEvent::AsteroidDestroyed { size, fragments });
                log::debug!("Asteroid {} ({:?}) destroyed, {} fragments", asteroid, size, fragments);
            }
            Contact::AlienShot { alien, .. } => {
                for p in contact.participants() {
                    kill(state, p);
                }
                consumed.extend(contact.participants());

                state.score += ALIEN_SCORE;
                state.events.push(GameEvent::Sound(SoundEffect::ExplosionAlien));
                state.events.push(GameEvent::AlienDestroyed);
                log::debug!("Alien {} shot down", alien);
            }
        }
    }
}

fn explosion_for(size: AsteroidSize) -> SoundEffect {
    match size {
        AsteroidSize::Small => SoundEffect::ExplosionSmall,
        AsteroidSize::Medium => SoundEffect::ExplosionMedium,
        AsteroidSize::Large => SoundEffect::ExplosionLarge,
    }
}

/// Mark an entity dead; it is removed at the start of the next tick
fn kill(state: &mut GameState, entity: EntityRef) {
    match entity {
        EntityRef::Ship(_) => state.ship.body.alive = false,
        EntityRef::Asteroid(id) => {
            if let Some(a) = state.asteroids.iter_mut().find(|a| a.id == id) {
                a.body.alive = false;
            }
        }
        EntityRef::Alien(id) => {
            if let Some(a) = state.aliens.iter_mut().find(|a| a.id == id) {
                a.body.alive = false;
            }
        }
        EntityRef::Bullet(id, _) => {
            if let Some(b) = state.bullets.iter_mut().find(|b| b.id == id) {
                b.body.alive = false;
            }
        }
    }
}

fn update_alien_spawner(state: &mut GameState, dt: f32) {
    state.alien_spawn_timer += dt;
    if state.alien_spawn_timer >= alien_spawn_interval(state.level) {
        state.alien_spawn_timer = 0.0;
        state.spawn_alien();
    }
}

fn game_over(state: &mut GameState) {
    state.phase = GamePhase::GameOver;
    state.normalize_order();
    log::info!("Game over: level {}, score {}", state.level, state.score);
    state.events.push(GameEvent::GameOver { score: state.score });
}
