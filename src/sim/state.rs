//! Game state and core simulation types
//!
//! The entity registry lives here. Entity vectors stay sorted by id so that
//! iteration (and therefore collision resolution) is deterministic.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::audio::SoundEffect;
use crate::consts::*;

use super::damage::{DamageKind, FlashColor, INVULNERABILITY_TICKS, ShipCondition};
use super::entity::{
    AlienShip, Asteroid, AsteroidSize, Bullet, BulletOwner, SHIP_MAX_FUEL, SHIP_MAX_HEALTH, Ship,
    random_edge_point,
};

/// Large asteroids in the first wave
pub const BASE_WAVE_SIZE: usize = 5;
/// Asteroids never spawn closer than this to the ship
pub const SAFE_SPAWN_DISTANCE: f32 = 100.0;
/// Margin kept from the screen edge when placing asteroids and hyperspace exits
pub const EDGE_MARGIN: f32 = 50.0;
/// Alien spawn interval on level 1 (seconds)
pub const ALIEN_SPAWN_BASE: f32 = 20.0;
/// Interval shrinks by this much per level (seconds)
pub const ALIEN_SPAWN_STEP: f32 = 2.0;
pub const ALIEN_SPAWN_MIN: f32 = 8.0;
/// Points for shooting down an alien
pub const ALIEN_SCORE: u64 = 500;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GamePhase {
    /// Title screen, waiting for start
    Attract,
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Ship destroyed; final score is frozen
    GameOver,
}

/// Things that happened during a tick, for audio, HUD and logging.
///
/// Drained by the session after every tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    Sound(SoundEffect),
    ShipDamaged {
        kind: DamageKind,
        amount: i32,
        health: i32,
    },
    ShipDestroyed {
        kind: DamageKind,
    },
    AsteroidDestroyed {
        size: AsteroidSize,
        fragments: usize,
    },
    AlienDestroyed,
    AlienSpawned,
    Hyperspace {
        malfunction: bool,
    },
    LevelStarted {
        level: u32,
        asteroids: usize,
    },
    GameOver {
        score: u64,
    },
}

/// Number of large asteroids for a level (never shrinks)
pub fn wave_size(level: u32) -> usize {
    BASE_WAVE_SIZE + level.saturating_sub(1) as usize
}

/// Seconds between alien spawns on a level
pub fn alien_spawn_interval(level: u32) -> f32 {
    let steps = level.saturating_sub(1) as f32;
    (ALIEN_SPAWN_BASE - ALIEN_SPAWN_STEP * steps).max(ALIEN_SPAWN_MIN)
}

/// Screen centre, where the ship starts every level
pub fn screen_center() -> Vec2 {
    Vec2::new(SCREEN_WIDTH / 2.0, SCREEN_HEIGHT / 2.0)
}

/// Complete game state (deterministic for a given seed and input sequence)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    /// Current level (1-based, 0 before the first run)
    pub level: u32,
    pub score: u64,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub phase: GamePhase,
    pub ship: Ship,
    /// Sorted by id
    pub asteroids: Vec<Asteroid>,
    /// Sorted by id
    pub aliens: Vec<AlienShip>,
    /// Sorted by id
    pub bullets: Vec<Bullet>,
    /// Seconds since the last alien spawn
    pub alien_spawn_timer: f32,
    /// Asteroid count of the most recent wave
    pub last_wave_size: usize,
    /// Events produced since the last drain
    pub events: Vec<GameEvent>,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// Create a new game state with the given seed, sitting in attract mode
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            level: 0,
            score: 0,
            time_ticks: 0,
            phase: GamePhase::Attract,
            ship: Ship::new(1, screen_center()),
            asteroids: Vec::new(),
            aliens: Vec::new(),
            bullets: Vec::new(),
            alien_spawn_timer: 0.0,
            last_wave_size: 0,
            events: Vec::new(),
            next_id: 2,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Begin a fresh run from level 1
    pub fn start_run(&mut self) {
        self.score = 0;
        self.level = 1;
        self.last_wave_size = 0;
        self.phase = GamePhase::Playing;
        self.start_level();
    }

    /// Reset the ship and field for `self.level` and spawn its wave
    pub fn start_level(&mut self) {
        let ship_id = self.ship.id;
        self.ship = Ship::new(ship_id, screen_center());
        self.ship.condition = ShipCondition::Invulnerable {
            until: self.time_ticks + INVULNERABILITY_TICKS,
        };

        self.bullets.clear();
        self.aliens.clear();
        self.asteroids.clear();
        self.alien_spawn_timer = 0.0;

        let count = wave_size(self.level).max(self.last_wave_size);
        for _ in 0..count {
            let pos = self.random_spawn_point();
            let id = self.next_entity_id();
            let asteroid = Asteroid::random(id, AsteroidSize::Large, pos, &mut self.rng);
            self.asteroids.push(asteroid);
        }
        self.last_wave_size = count;

        log::info!("Level {}: {} asteroids", self.level, count);
        self.events.push(GameEvent::LevelStarted {
            level: self.level,
            asteroids: count,
        });
    }

    /// Random point inside the edge margin, at least `SAFE_SPAWN_DISTANCE` from the ship
    fn random_spawn_point(&mut self) -> Vec2 {
        loop {
            let pos = Vec2::new(
                self.rng.random_range(EDGE_MARGIN..SCREEN_WIDTH - EDGE_MARGIN),
                self.rng.random_range(EDGE_MARGIN..SCREEN_HEIGHT - EDGE_MARGIN),
            );
            if pos.distance(self.ship.body.pos) > SAFE_SPAWN_DISTANCE {
                return pos;
            }
        }
    }

    /// Break the asteroid at `index` and add its fragments. Returns the fragment count.
    pub fn split_asteroid(&mut self, index: usize) -> usize {
        let next_id = &mut self.next_id;
        let fragments = self.asteroids[index].split(&mut self.rng, || {
            let id = *next_id;
            *next_id += 1;
            id
        });
        let count = fragments.len();
        self.asteroids.extend(fragments);
        count
    }

    /// Bring in a new alien at a random edge, hunting the ship
    pub fn spawn_alien(&mut self) {
        let id = self.next_entity_id();
        let pos = random_edge_point(&mut self.rng);
        let alien = AlienShip::new(id, pos, Some(self.ship.id), &mut self.rng);
        log::debug!("Alien {} spawned at ({:.0}, {:.0})", id, pos.x, pos.y);
        self.aliens.push(alien);
        self.events.push(GameEvent::AlienSpawned);
    }

    /// Number of asteroids still in play
    pub fn asteroids_remaining(&self) -> usize {
        self.asteroids.iter().filter(|a| a.body.alive).count()
    }

    /// Drop entities that died during the previous tick
    pub fn reap(&mut self) {
        self.asteroids.retain(|a| a.body.alive);
        self.aliens.retain(|a| a.body.alive);
        self.bullets.retain(|b| b.body.alive);
    }

    /// Ensure entities are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.asteroids.sort_by_key(|a| a.id);
        self.aliens.sort_by_key(|a| a.id);
        self.bullets.sort_by_key(|b| b.id);
    }

    /// Take every event produced since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Render/HUD view of the current state
    pub fn snapshot(&self) -> Snapshot {
        let ship = &self.ship;
        let mut entities = Vec::with_capacity(
            1 + self.asteroids.len() + self.aliens.len() + self.bullets.len(),
        );
        entities.push(EntitySnapshot::new(EntityKind::Ship, ship.id, &ship.body));
        entities.extend(
            self.asteroids
                .iter()
                .map(|a| EntitySnapshot::new(EntityKind::Asteroid(a.size), a.id, &a.body)),
        );
        entities.extend(
            self.aliens
                .iter()
                .map(|a| EntitySnapshot::new(EntityKind::Alien, a.id, &a.body)),
        );
        entities.extend(
            self.bullets
                .iter()
                .map(|b| EntitySnapshot::new(EntityKind::Bullet(b.owner), b.id, &b.body)),
        );

        Snapshot {
            phase: self.phase,
            level: self.level,
            score: self.score,
            health: ship.health,
            max_health: SHIP_MAX_HEALTH,
            fuel: ship.fuel,
            fuel_fraction: ship.fuel / SHIP_MAX_FUEL,
            flash_color: ship.flash_color,
            flash_intensity: ship.flash_intensity,
            flash_tint: ship.flash_color.tint(ship.flash_intensity),
            invulnerable: matches!(ship.condition, ShipCondition::Invulnerable { until } if until > self.time_ticks),
            hyperspace_cooldown_secs: ship.hyperspace_cooldown as f32 / TICK_HZ as f32,
            entities,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntityKind {
    Ship,
    Asteroid(AsteroidSize),
    Alien,
    Bullet(BulletOwner),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySnapshot {
    pub kind: EntityKind,
    pub id: u32,
    pub pos: Vec2,
    pub heading: f32,
    pub radius: f32,
    pub alive: bool,
}

impl EntitySnapshot {
    fn new(kind: EntityKind, id: u32, body: &super::entity::Body) -> Self {
        Self {
            kind,
            id,
            pos: body.pos,
            heading: body.heading,
            radius: body.radius,
            alive: body.alive,
        }
    }
}

/// Everything the renderer and HUD need for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub level: u32,
    pub score: u64,
    pub health: i32,
    pub max_health: i32,
    pub fuel: f32,
    pub fuel_fraction: f32,
    pub flash_color: FlashColor,
    pub flash_intensity: f32,
    /// Ship colour with the flash applied
    pub flash_tint: [u8; 3],
    /// Renderer blinks the ship while this is set
    pub invulnerable: bool,
    pub hyperspace_cooldown_secs: f32,
    pub entities: Vec<EntitySnapshot>,
}
