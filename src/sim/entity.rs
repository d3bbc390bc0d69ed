//! Entity types
//!
//! Every entity carries a [`Body`] (position, velocity, heading, radius, alive flag)
//! plus its own per-type state. Entities are owned by `GameState`; dead ones are
//! reaped at the start of the following tick.

use glam::Vec2;
use rand::Rng;
use serde::Serialize;

use crate::consts::*;
use crate::{heading_vector, wrap_position};

use super::damage::{FlashColor, ShipCondition};

// === Ship ===
pub const SHIP_RADIUS: f32 = 8.0;
/// Thrust acceleration (pixels/s²)
pub const SHIP_THRUST: f32 = 200.0;
/// Rotation speed (radians/s, 300°/s)
pub const SHIP_ROTATION_SPEED: f32 = 300.0 * std::f32::consts::PI / 180.0;
pub const SHIP_MAX_SPEED: f32 = 300.0;
/// Velocity multiplier applied every tick
pub const SHIP_DRAG: f32 = 0.98;
pub const SHIP_MAX_FUEL: f32 = 1000.0;
/// Fuel burned per second at full thrust
pub const SHIP_FUEL_BURN: f32 = 50.0;
pub const SHIP_MAX_HEALTH: i32 = 3;

// === Bullets ===
pub const BULLET_RADIUS: f32 = 2.0;
pub const BULLET_SPEED: f32 = 400.0;
/// Bullet lifetime (seconds)
pub const BULLET_TTL: f32 = 2.0;

// === Asteroids ===
pub const ASTEROID_MIN_SPEED: f32 = 20.0;
pub const ASTEROID_MAX_SPEED: f32 = 80.0;
/// Max spin (radians/s, 180°/s)
pub const ASTEROID_MAX_SPIN: f32 = std::f32::consts::PI;
/// Speed range of the kick each fragment gets on a split
pub const SPLIT_KICK_MIN: f32 = 40.0;
pub const SPLIT_KICK_MAX: f32 = 120.0;
/// Fragments slower than this are pushed up to it
pub const SPLIT_MIN_SPEED: f32 = 20.0;

// === Aliens ===
pub const ALIEN_RADIUS: f32 = 12.0;
pub const ALIEN_SPEED: f32 = 75.0;
/// How quickly an alien's velocity swings toward its target (1/s)
pub const ALIEN_STEER_RATE: f32 = 1.5;
pub const ALIEN_FIRE_MIN: f32 = 1.5;
pub const ALIEN_FIRE_MAX: f32 = 3.0;
/// Aim error (radians, ±30°)
pub const ALIEN_AIM_ERROR: f32 = std::f32::consts::PI / 6.0;

/// Shared physical state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Radians, 0 = up, clockwise positive
    pub heading: f32,
    pub radius: f32,
    pub alive: bool,
}

impl Body {
    pub fn new(pos: Vec2, vel: Vec2, radius: f32) -> Self {
        Self {
            pos,
            vel,
            heading: 0.0,
            radius,
            alive: true,
        }
    }

    /// Advance position by velocity and wrap onto the playfield
    pub fn integrate(&mut self, dt: f32) {
        self.pos = wrap_position(self.pos + self.vel * dt);
    }

    /// Circle overlap test (touching counts)
    pub fn overlaps(&self, other: &Body) -> bool {
        let reach = self.radius + other.radius;
        self.pos.distance_squared(other.pos) <= reach * reach
    }
}

/// Random velocity with speed in `[min, max)` and uniform direction
pub fn random_velocity(rng: &mut impl Rng, min: f32, max: f32) -> Vec2 {
    let speed = rng.random_range(min..max);
    let angle = rng.random_range(0.0..std::f32::consts::TAU);
    heading_vector(angle) * speed
}

/// The player's ship
#[derive(Debug, Clone, Serialize)]
pub struct Ship {
    pub id: u32,
    pub body: Body,
    pub health: i32,
    pub fuel: f32,
    pub condition: ShipCondition,
    pub flash_color: FlashColor,
    /// 1.0 right after a hit, decays to 0
    pub flash_intensity: f32,
    /// Ticks until hyperspace can be used again
    pub hyperspace_cooldown: u64,
}

impl Ship {
    pub fn new(id: u32, pos: Vec2) -> Self {
        Self {
            id,
            body: Body::new(pos, Vec2::ZERO, SHIP_RADIUS),
            health: SHIP_MAX_HEALTH,
            fuel: SHIP_MAX_FUEL,
            condition: ShipCondition::Vulnerable,
            flash_color: FlashColor::None,
            flash_intensity: 0.0,
            hyperspace_cooldown: 0,
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.condition == ShipCondition::Destroyed
    }

    /// Turn by `direction` (-1 left, +1 right)
    pub fn rotate(&mut self, direction: f32, dt: f32) {
        self.body.heading = (self.body.heading + direction * SHIP_ROTATION_SPEED * dt)
            .rem_euclid(std::f32::consts::TAU);
    }

    /// Accelerate along the heading, burning fuel. Does nothing on an empty tank.
    pub fn thrust(&mut self, dt: f32) {
        if self.fuel <= 0.0 {
            return;
        }
        self.body.vel += heading_vector(self.body.heading) * SHIP_THRUST * dt;
        self.body.vel = self.body.vel.clamp_length_max(SHIP_MAX_SPEED);
        self.fuel = (self.fuel - SHIP_FUEL_BURN * dt).max(0.0);
    }

    /// Integrate and apply drag
    pub fn update(&mut self, dt: f32) {
        self.body.integrate(dt);
        self.body.vel *= SHIP_DRAG;
    }

    /// Count down one tick of hyperspace recharge
    pub fn recharge_hyperspace(&mut self) {
        self.hyperspace_cooldown = self.hyperspace_cooldown.saturating_sub(1);
    }

    /// Fire a player bullet from the nose
    pub fn fire(&self, id: u32) -> Bullet {
        Bullet::new(id, BulletOwner::Player, self.body.pos, self.body.heading)
    }
}

/// Asteroid size classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AsteroidSize {
    Small,
    Medium,
    Large,
}

impl AsteroidSize {
    fn tier(self) -> u8 {
        match self {
            AsteroidSize::Small => 1,
            AsteroidSize::Medium => 2,
            AsteroidSize::Large => 3,
        }
    }

    pub fn radius(self) -> f32 {
        10.0 + f32::from(self.tier()) * 8.0
    }

    /// Size of the fragments this asteroid breaks into
    pub fn smaller(self) -> Option<AsteroidSize> {
        match self {
            AsteroidSize::Large => Some(AsteroidSize::Medium),
            AsteroidSize::Medium => Some(AsteroidSize::Small),
            AsteroidSize::Small => None,
        }
    }

    /// Points for shooting one down
    pub fn score(self) -> u64 {
        match self {
            AsteroidSize::Large => 20,
            AsteroidSize::Medium => 50,
            AsteroidSize::Small => 100,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Asteroid {
    pub id: u32,
    pub body: Body,
    pub size: AsteroidSize,
    /// Radians per second
    pub spin: f32,
}

impl Asteroid {
    pub fn new(id: u32, size: AsteroidSize, pos: Vec2, vel: Vec2, spin: f32) -> Self {
        Self {
            id,
            body: Body::new(pos, vel, size.radius()),
            size,
            spin,
        }
    }

    /// A freshly spawned asteroid drifting in a random direction
    pub fn random(id: u32, size: AsteroidSize, pos: Vec2, rng: &mut impl Rng) -> Self {
        let vel = random_velocity(rng, ASTEROID_MIN_SPEED, ASTEROID_MAX_SPEED);
        let spin = rng.random_range(-ASTEROID_MAX_SPIN..ASTEROID_MAX_SPIN);
        Self::new(id, size, pos, vel, spin)
    }

    pub fn update(&mut self, dt: f32) {
        self.body.integrate(dt);
        self.body.heading = (self.body.heading + self.spin * dt).rem_euclid(std::f32::consts::TAU);
    }

    /// Break into 2-3 fragments of the next size down.
    ///
    /// Fragments start at this asteroid's position with its velocity plus a random
    /// kick. Small asteroids yield nothing. `next_id` allocates entity ids.
    pub fn split(
        &self,
        rng: &mut impl Rng,
        mut next_id: impl FnMut() -> u32,
    ) -> Vec<Asteroid> {
        let Some(child_size) = self.size.smaller() else {
            return Vec::new();
        };

        let count = rng.random_range(2..=3);
        (0..count)
            .map(|_| {
                let kick = random_velocity(rng, SPLIT_KICK_MIN, SPLIT_KICK_MAX);
                let mut vel = self.body.vel + kick;
                if vel.length() < SPLIT_MIN_SPEED {
                    vel = kick.normalize_or_zero() * SPLIT_MIN_SPEED;
                }
                let spin = rng.random_range(-ASTEROID_MAX_SPIN..ASTEROID_MAX_SPIN);
                Asteroid::new(next_id(), child_size, self.body.pos, vel, spin)
            })
            .collect()
    }
}

/// Hostile saucer that hunts the ship
#[derive(Debug, Clone, Serialize)]
pub struct AlienShip {
    pub id: u32,
    pub body: Body,
    /// Id of the ship being hunted; looked up each tick, never owned
    pub target: Option<u32>,
    /// Seconds until the next shot
    pub fire_timer: f32,
}

impl AlienShip {
    pub fn new(id: u32, pos: Vec2, target: Option<u32>, rng: &mut impl Rng) -> Self {
        Self {
            id,
            body: Body::new(pos, random_velocity(rng, ALIEN_SPEED * 0.5, ALIEN_SPEED), ALIEN_RADIUS),
            target,
            fire_timer: rng.random_range(ALIEN_FIRE_MIN..ALIEN_FIRE_MAX),
        }
    }

    /// Swing velocity toward `target_pos` (shortest way around the wrap)
    pub fn steer(&mut self, target_pos: Vec2, dt: f32) {
        let to_target = crate::toroidal_delta(self.body.pos, target_pos);
        let desired = to_target.normalize_or_zero() * ALIEN_SPEED;
        let blend = (ALIEN_STEER_RATE * dt).min(1.0);
        self.body.vel = self.body.vel.lerp(desired, blend);
        if self.body.vel != Vec2::ZERO {
            self.body.heading = crate::heading_of(self.body.vel);
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.body.integrate(dt);
        self.fire_timer -= dt;
    }

    /// Fire at `target_pos` with some inaccuracy, if the shot timer has run out
    pub fn try_fire(&mut self, id: u32, target_pos: Vec2, rng: &mut impl Rng) -> Option<Bullet> {
        if self.fire_timer > 0.0 {
            return None;
        }
        self.fire_timer = rng.random_range(ALIEN_FIRE_MIN..ALIEN_FIRE_MAX);
        let aim = crate::heading_of(crate::toroidal_delta(self.body.pos, target_pos))
            + rng.random_range(-ALIEN_AIM_ERROR..ALIEN_AIM_ERROR);
        Some(Bullet::new(id, BulletOwner::Alien, self.body.pos, aim))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BulletOwner {
    Player,
    Alien,
}

#[derive(Debug, Clone, Serialize)]
pub struct Bullet {
    pub id: u32,
    pub body: Body,
    pub owner: BulletOwner,
    /// Seconds left before the bullet fizzles
    pub ttl: f32,
}

impl Bullet {
    pub fn new(id: u32, owner: BulletOwner, pos: Vec2, heading: f32) -> Self {
        let mut body = Body::new(pos, heading_vector(heading) * BULLET_SPEED, BULLET_RADIUS);
        body.heading = heading;
        Self {
            id,
            body,
            owner,
            ttl: BULLET_TTL,
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.body.integrate(dt);
        self.ttl -= dt;
        if self.ttl <= 0.0 {
            self.body.alive = false;
        }
    }
}

/// Where a new alien appears: a random point on a random screen edge
pub fn random_edge_point(rng: &mut impl Rng) -> Vec2 {
    let x = rng.random_range(0.0..SCREEN_WIDTH);
    let y = rng.random_range(0.0..SCREEN_HEIGHT);
    match rng.random_range(0..4) {
        0 => Vec2::new(x, 0.0),
        1 => Vec2::new(SCREEN_WIDTH - 1.0, y),
        2 => Vec2::new(x, SCREEN_HEIGHT - 1.0),
        _ => Vec2::new(0.0, y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_body_wraps() {
        let mut body = Body::new(Vec2::new(795.0, 5.0), Vec2::new(600.0, -600.0), 4.0);
        body.integrate(SIM_DT);
        assert!(body.pos.x < 20.0);
        assert!(body.pos.y > 590.0);
    }

    #[test]
    fn test_overlap_is_inclusive() {
        let a = Body::new(Vec2::new(0.0, 0.0), Vec2::ZERO, 5.0);
        let b = Body::new(Vec2::new(10.0, 0.0), Vec2::ZERO, 5.0);
        let c = Body::new(Vec2::new(10.5, 0.0), Vec2::ZERO, 5.0);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_overlap_does_not_reach_across_wrap_edge() {
        let ship = Body::new(Vec2::new(2.0, 300.0), Vec2::ZERO, SHIP_RADIUS);
        let rock = Body::new(Vec2::new(797.0, 300.0), Vec2::ZERO, AsteroidSize::Small.radius());
        assert!(!ship.overlaps(&rock));
    }

    #[test]
    fn test_thrust_burns_fuel_and_stops_when_empty() {
        let mut ship = Ship::new(1, Vec2::new(400.0, 300.0));
        ship.thrust(SIM_DT);
        assert!(ship.body.vel.y < 0.0, "heading 0 thrusts up the screen");
        assert!((ship.fuel - (SHIP_MAX_FUEL - SHIP_FUEL_BURN * SIM_DT)).abs() < 1e-3);

        ship.fuel = 0.0;
        let before = ship.body.vel;
        ship.thrust(SIM_DT);
        assert_eq!(ship.body.vel, before);
        assert_eq!(ship.fuel, 0.0);
        assert!(!ship.is_destroyed());
    }

    #[test]
    fn test_ship_speed_is_capped() {
        let mut ship = Ship::new(1, Vec2::new(400.0, 300.0));
        for _ in 0..600 {
            ship.thrust(SIM_DT);
        }
        assert!(ship.body.vel.length() <= SHIP_MAX_SPEED + 1e-3);
    }

    #[test]
    fn test_large_splits_into_mediums() {
        let mut rng = Pcg32::seed_from_u64(7);
        let parent = Asteroid::new(
            1,
            AsteroidSize::Large,
            Vec2::new(100.0, 100.0),
            Vec2::new(30.0, 0.0),
            0.0,
        );
        let mut next = 10;
        let children = parent.split(&mut rng, || {
            next += 1;
            next
        });
        assert!((2..=3).contains(&children.len()));
        for child in &children {
            assert_eq!(child.size, AsteroidSize::Medium);
            assert_eq!(child.body.pos, parent.body.pos);
            assert!(child.body.vel.length() > 0.0);
            assert_ne!(child.body.vel, parent.body.vel);
        }
    }

    #[test]
    fn test_small_does_not_split() {
        let mut rng = Pcg32::seed_from_u64(7);
        let small = Asteroid::random(1, AsteroidSize::Small, Vec2::ZERO, &mut rng);
        assert!(small.split(&mut rng, || 99).is_empty());
    }

    #[test]
    fn test_bullet_expires() {
        let mut bullet = Bullet::new(1, BulletOwner::Player, Vec2::new(400.0, 300.0), 0.0);
        let ticks = (BULLET_TTL / SIM_DT).ceil() as usize + 1;
        for _ in 0..ticks {
            bullet.update(SIM_DT);
        }
        assert!(!bullet.body.alive);
    }

    #[test]
    fn test_alien_turns_toward_target() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut alien = AlienShip::new(1, Vec2::new(100.0, 300.0), Some(0), &mut rng);
        let target = Vec2::new(400.0, 300.0);
        for _ in 0..120 {
            alien.steer(target, SIM_DT);
        }
        assert!(alien.body.vel.x > 0.0);
        assert!(alien.body.vel.length() <= ALIEN_SPEED + 1e-2);
    }
}
